//! Case-insensitive key identifiers and modifier names.

use std::fmt;

/// A key identifier, normalized to lowercase.
///
/// All key comparisons in the crate go through `KeyId`, so `"ArrowUp"`,
/// `"arrowup"` and `"ARROWUP"` name the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(String);

impl KeyId {
    /// Create a key identifier from any spelling of the key name.
    pub fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for KeyId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for KeyId {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Modifier keys a binding can place requirements on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Control,
    Shift,
    Alt,
    Meta,
    /// A name that is not a known modifier. It is never considered held.
    Other(String),
}

impl Modifier {
    /// Parse a modifier name like "Control", "ctrl" or "Cmd".
    ///
    /// Unknown names are kept as [`Modifier::Other`] rather than rejected.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "CONTROL" | "CTRL" => Modifier::Control,
            "SHIFT" => Modifier::Shift,
            "ALT" | "OPTION" => Modifier::Alt,
            "META" | "SUPER" | "CMD" | "COMMAND" => Modifier::Meta,
            _ => Modifier::Other(s.trim().to_string()),
        }
    }

    /// The held-key identifier of the modifier key itself.
    pub fn key(&self) -> Option<KeyId> {
        match self {
            Modifier::Control => Some(KeyId::new("Control")),
            Modifier::Shift => Some(KeyId::new("Shift")),
            Modifier::Alt => Some(KeyId::new("Alt")),
            Modifier::Meta => Some(KeyId::new("Meta")),
            Modifier::Other(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Modifier::Other(_))
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Control => write!(f, "Control"),
            Modifier::Shift => write!(f, "Shift"),
            Modifier::Alt => write!(f, "Alt"),
            Modifier::Meta => write!(f, "Meta"),
            Modifier::Other(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id_case_insensitive() {
        assert_eq!(KeyId::new("ArrowUp"), KeyId::new("ARROWUP"));
        assert_eq!(KeyId::new("s"), KeyId::from("S"));
        assert_eq!(KeyId::new("ArrowUp").as_str(), "arrowup");
    }

    #[test]
    fn test_key_id_empty() {
        assert!(KeyId::new("").is_empty());
        assert!(!KeyId::new(" ").is_empty());
    }

    #[test]
    fn test_parse_modifier_aliases() {
        assert_eq!(Modifier::parse("Control"), Modifier::Control);
        assert_eq!(Modifier::parse("ctrl"), Modifier::Control);
        assert_eq!(Modifier::parse("SHIFT"), Modifier::Shift);
        assert_eq!(Modifier::parse("Option"), Modifier::Alt);
        assert_eq!(Modifier::parse("cmd"), Modifier::Meta);
        assert_eq!(Modifier::parse("Super"), Modifier::Meta);
    }

    #[test]
    fn test_parse_unknown_modifier() {
        let modifier = Modifier::parse("Hyper");
        assert_eq!(modifier, Modifier::Other("Hyper".to_string()));
        assert!(!modifier.is_known());
        assert_eq!(modifier.key(), None);
    }

    #[test]
    fn test_modifier_key() {
        assert_eq!(Modifier::Control.key(), Some(KeyId::new("control")));
        assert_eq!(Modifier::Meta.key(), Some(KeyId::new("Meta")));
    }

    #[test]
    fn test_display() {
        assert_eq!(Modifier::Control.to_string(), "Control");
        assert_eq!(KeyId::new("ArrowLeft").to_string(), "arrowleft");
    }
}

//! Binding definitions: which keys and modifiers trigger which callback.

use crate::error::BindingError;
use crate::event::KeyEvent;
use crate::key::{KeyId, Modifier};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Callback invoked when a binding matches.
pub type Callback = Box<dyn FnMut(&KeyEvent) + Send>;

/// Descriptor for a binding, before validation.
///
/// Every field except `keys` has a default, so a binding table can be
/// deserialized from a sparse configuration:
///
/// ```
/// use hotkey_bindings::BindingConfig;
///
/// let config: BindingConfig = serde_json::from_str(
///     r#"{ "keys": ["s"], "modifiers": { "Control": true }, "preventDefault": true }"#,
/// ).unwrap();
/// assert!(config.prevent_default);
/// assert!(!config.trigger_on_any_key);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingConfig {
    pub keys: Vec<String>,
    #[serde(default)]
    pub trigger_on_any_key: bool,
    #[serde(default, deserialize_with = "deserialize_modifiers")]
    pub modifiers: BTreeMap<String, bool>,
    #[serde(default)]
    pub prevent_default: bool,
    #[serde(default, alias = "enableKeyRepeatOnHold")]
    pub repeat_on_hold: bool,
}

impl BindingConfig {
    /// Create a descriptor for the given keys with all options at their defaults.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Fire when any one of the keys is held instead of all of them.
    pub fn trigger_on_any_key(mut self, enabled: bool) -> Self {
        self.trigger_on_any_key = enabled;
        self
    }

    /// Require the named modifier to be held (`true`) or released (`false`).
    ///
    /// Aliases share one entry, so `modifier("ctrl", ..)` replaces an earlier
    /// `modifier("Control", ..)`.
    pub fn modifier(mut self, name: &str, required: bool) -> Self {
        self.modifiers.insert(modifier_name(name), required);
        self
    }

    pub fn prevent_default(mut self, enabled: bool) -> Self {
        self.prevent_default = enabled;
        self
    }

    /// Fire on every native repeat while the key stays held.
    pub fn repeat_on_hold(mut self, enabled: bool) -> Self {
        self.repeat_on_hold = enabled;
        self
    }

    /// Validate the descriptor and attach its callback.
    pub fn build<F>(self, callback: F) -> Result<Binding, BindingError>
    where
        F: FnMut(&KeyEvent) + Send + 'static,
    {
        Binding::from_config(self, Box::new(callback))
    }
}

impl fmt::Display for BindingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self
            .modifiers
            .iter()
            .filter(|(_, required)| **required)
            .map(|(name, _)| Modifier::parse(name).to_string())
            .collect();
        parts.extend(self.keys.iter().cloned());
        write!(f, "{}", parts.join("+"))
    }
}

/// Canonical spelling of a modifier name, so aliases share one map entry.
fn modifier_name(name: &str) -> String {
    Modifier::parse(name).to_string()
}

fn deserialize_modifiers<'de, D>(deserializer: D) -> Result<BTreeMap<String, bool>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ModifiersVisitor;

    impl<'de> Visitor<'de> for ModifiersVisitor {
        type Value = BTreeMap<String, bool>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "a map of modifier names to booleans")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut modifiers = BTreeMap::new();
            while let Some((name, required)) = map.next_entry::<String, bool>()? {
                modifiers.insert(modifier_name(&name), required);
            }
            Ok(modifiers)
        }
    }

    deserializer.deserialize_map(ModifiersVisitor)
}

/// A validated, immutable binding.
pub struct Binding {
    keys: Vec<KeyId>,
    modifiers: Vec<(Modifier, bool)>,
    trigger_on_any_key: bool,
    prevent_default: bool,
    repeat_on_hold: bool,
    label: String,
    callback: Callback,
}

impl Binding {
    /// Create a binding that fires when all `keys` are held.
    pub fn new<I, S, F>(keys: I, callback: F) -> Result<Self, BindingError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnMut(&KeyEvent) + Send + 'static,
    {
        BindingConfig::new(keys).build(callback)
    }

    pub fn from_config(config: BindingConfig, callback: Callback) -> Result<Self, BindingError> {
        if config.keys.is_empty() {
            return Err(BindingError::EmptyKeys);
        }

        let label = config.to_string();
        let mut keys: Vec<KeyId> = Vec::with_capacity(config.keys.len());
        for name in &config.keys {
            let key = KeyId::new(name);
            if key.is_empty() {
                return Err(BindingError::InvalidBinding(format!(
                    "blank key name in \"{}\"",
                    label
                )));
            }
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        let mut modifiers: Vec<(Modifier, bool)> = Vec::with_capacity(config.modifiers.len());
        for (name, required) in &config.modifiers {
            let modifier = Modifier::parse(name);
            let seen = modifiers
                .iter()
                .find(|(seen, _)| *seen == modifier)
                .map(|(_, seen_required)| *seen_required);
            match seen {
                Some(seen_required) if seen_required != *required => {
                    return Err(BindingError::InvalidBinding(format!(
                        "conflicting requirements for {} in \"{}\"",
                        modifier, label
                    )));
                }
                Some(_) => {}
                None => modifiers.push((modifier, *required)),
            }
        }

        Ok(Self {
            keys,
            modifiers,
            trigger_on_any_key: config.trigger_on_any_key,
            prevent_default: config.prevent_default,
            repeat_on_hold: config.repeat_on_hold,
            label,
            callback,
        })
    }

    pub fn keys(&self) -> &[KeyId] {
        &self.keys
    }

    pub fn modifiers(&self) -> &[(Modifier, bool)] {
        &self.modifiers
    }

    pub fn contains_key(&self, key: &KeyId) -> bool {
        self.keys.contains(key)
    }

    pub fn triggers_on_any_key(&self) -> bool {
        self.trigger_on_any_key
    }

    pub fn prevents_default(&self) -> bool {
        self.prevent_default
    }

    pub fn repeats_on_hold(&self) -> bool {
        self.repeat_on_hold
    }

    pub(crate) fn fire(&mut self, event: &KeyEvent) {
        (self.callback)(event)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("keys", &self.keys)
            .field("modifiers", &self.modifiers)
            .field("trigger_on_any_key", &self.trigger_on_any_key)
            .field("prevent_default", &self.prevent_default)
            .field("repeat_on_hold", &self.repeat_on_hold)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Parse a binding string like "Control+S" or "a+b" into a descriptor.
///
/// Leading parts that name a modifier become required modifiers, every other
/// part becomes a key. The last part is always a key, so "Shift" alone binds
/// the Shift key itself. A trailing "++" binds the plus key.
pub fn parse_binding(s: &str) -> Result<BindingConfig, BindingError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(BindingError::EmptyKeys);
    }

    let (body, plus_key) = if s == "+" {
        ("", true)
    } else if let Some(body) = s.strip_suffix("++") {
        (body, true)
    } else {
        (s, false)
    };

    let mut parts: Vec<&str> = if body.is_empty() {
        Vec::new()
    } else {
        body.split('+').map(str::trim).collect()
    };
    if parts.iter().any(|part| part.is_empty()) {
        return Err(BindingError::InvalidBinding(format!("empty part in \"{}\"", s)));
    }
    if plus_key {
        parts.push("+");
    }

    let mut config = BindingConfig::default();
    let last = parts.len() - 1;
    for (idx, part) in parts.iter().enumerate() {
        let modifier = Modifier::parse(part);
        if idx != last && modifier.is_known() {
            config.modifiers.insert(modifier_name(part), true);
        } else {
            config.keys.push(part.to_string());
        }
    }

    Ok(config)
}

//! Keyboard notifications delivered to the matcher.

use crate::key::KeyId;

/// Raw modifier flags reported by the event source alongside a key press.
///
/// Matching reads modifier state from the held keys; these flags are only
/// carried through to callbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierFlags {
    pub control: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

/// A single key press or release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    key: KeyId,
    modifiers: ModifierFlags,
    repeat: bool,
    default_prevented: bool,
}

impl KeyEvent {
    /// Create an event for the given key with no modifier flags set.
    pub fn new(key: &str) -> Self {
        Self {
            key: KeyId::new(key),
            modifiers: ModifierFlags::default(),
            repeat: false,
            default_prevented: false,
        }
    }

    pub fn with_modifiers(mut self, modifiers: ModifierFlags) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Mark this event as a native auto-repeat notification.
    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn key(&self) -> &KeyId {
        &self.key
    }

    pub fn modifiers(&self) -> ModifierFlags {
        self.modifiers
    }

    pub fn is_repeat(&self) -> bool {
        self.repeat
    }

    /// Ask the host not to perform its default action for this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Notifications an event source delivers to the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    /// Keyboard focus moved away; key-up notifications may have been missed.
    FocusLost,
}

impl InputEvent {
    pub fn key_down(key: &str) -> Self {
        InputEvent::KeyDown(KeyEvent::new(key))
    }

    pub fn key_up(key: &str) -> Self {
        InputEvent::KeyUp(KeyEvent::new(key))
    }

    /// Whether any binding asked to suppress the default action.
    pub fn default_prevented(&self) -> bool {
        match self {
            InputEvent::KeyDown(event) | InputEvent::KeyUp(event) => event.default_prevented(),
            InputEvent::FocusLost => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_key_is_normalized() {
        let event = KeyEvent::new("ArrowRight");
        assert_eq!(event.key().as_str(), "arrowright");
        assert!(!event.is_repeat());
    }

    #[test]
    fn test_prevent_default() {
        let mut event = InputEvent::key_down("s");
        assert!(!event.default_prevented());
        if let InputEvent::KeyDown(ref mut e) = event {
            e.prevent_default();
        }
        assert!(event.default_prevented());
        assert!(!InputEvent::FocusLost.default_prevented());
    }
}

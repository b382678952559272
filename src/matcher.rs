//! Held-key tracking and binding evaluation.

use crate::binding::{Binding, BindingConfig};
use crate::error::BindingError;
use crate::event::{InputEvent, KeyEvent};
use crate::key::{KeyId, Modifier};
use std::collections::HashSet;

/// Tracks which keys are held and fires the bindings they satisfy.
///
/// The matcher does no I/O. An event source feeds it key-down, key-up and
/// focus-loss notifications; every callback runs synchronously inside the
/// handler that received the notification, in registration order.
#[derive(Debug)]
pub struct BindingMatcher {
    bindings: Vec<Binding>,
    held: HashSet<KeyId>,
    attached: bool,
}

impl Default for BindingMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingMatcher {
    /// Create an attached matcher with no bindings.
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            held: HashSet::new(),
            attached: true,
        }
    }

    pub fn with_bindings<I>(bindings: I) -> Self
    where
        I: IntoIterator<Item = Binding>,
    {
        let mut matcher = Self::new();
        matcher.bindings.extend(bindings);
        matcher
    }

    /// Validate a descriptor and register it after the existing bindings.
    pub fn register<F>(&mut self, config: BindingConfig, callback: F) -> Result<(), BindingError>
    where
        F: FnMut(&KeyEvent) + Send + 'static,
    {
        let binding = config.build(callback)?;
        self.add_binding(binding);
        Ok(())
    }

    pub fn add_binding(&mut self, binding: Binding) {
        log::debug!("Registered binding {}", binding);
        self.bindings.push(binding);
    }

    /// Replace the registered bindings. Held keys are kept.
    pub fn set_bindings<I>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = Binding>,
    {
        self.bindings = bindings.into_iter().collect();
        log::debug!("Bindings replaced: {} registered", self.bindings.len());
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.contains(&KeyId::new(key))
    }

    pub fn held_keys(&self) -> impl Iterator<Item = &KeyId> {
        self.held.iter()
    }

    /// Whether a modifier is currently held, judged from the held keys.
    ///
    /// Unrecognized modifier names are never held.
    pub fn modifier_held(&self, modifier: &Modifier) -> bool {
        modifier
            .key()
            .map(|key| self.held.contains(&key))
            .unwrap_or(false)
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Start accepting notifications.
    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Stop accepting notifications and forget all held keys.
    ///
    /// No callback runs for events delivered after this returns, until the
    /// matcher is attached again.
    pub fn detach(&mut self) {
        self.attached = false;
        self.held.clear();
    }

    /// Dispatch a notification to the matching handler.
    ///
    /// Returns the number of callbacks fired.
    pub fn handle(&mut self, event: &mut InputEvent) -> usize {
        match event {
            InputEvent::KeyDown(event) => self.on_key_down(event),
            InputEvent::KeyUp(event) => {
                self.on_key_up(event);
                0
            }
            InputEvent::FocusLost => {
                self.on_focus_loss();
                0
            }
        }
    }

    /// Handle a key press, including native auto-repeat.
    ///
    /// Returns the number of callbacks fired.
    pub fn on_key_down(&mut self, event: &mut KeyEvent) -> usize {
        if !self.attached {
            return 0;
        }
        let key = event.key().clone();

        // Suppression applies on repeats too, whether or not the binding fires.
        if self
            .bindings
            .iter()
            .any(|binding| binding.prevents_default() && binding.contains_key(&key))
        {
            log::debug!("Suppressing default action for {}", key);
            event.prevent_default();
        }

        let was_held = !self.held.insert(key);

        let held = &self.held;
        let mut fired = 0;
        for binding in self.bindings.iter_mut() {
            if was_held && !binding.repeats_on_hold() {
                continue;
            }
            if binding_matches(binding, held) {
                log::debug!("Binding {} fired on {}", binding, event.key());
                binding.fire(event);
                fired += 1;
            }
        }
        fired
    }

    pub fn on_key_up(&mut self, event: &KeyEvent) {
        if !self.attached {
            return;
        }
        self.held.remove(event.key());
    }

    /// Forget every held key. Used when key-up notifications may have been lost.
    pub fn on_focus_loss(&mut self) {
        if !self.held.is_empty() {
            log::debug!("Focus lost, releasing {} held key(s)", self.held.len());
        }
        self.held.clear();
    }
}

fn binding_matches(binding: &Binding, held: &HashSet<KeyId>) -> bool {
    let modifiers_ok = binding.modifiers().iter().all(|(modifier, required)| {
        let is_held = modifier
            .key()
            .map(|key| held.contains(&key))
            .unwrap_or(false);
        is_held == *required
    });
    if !modifiers_ok {
        return false;
    }

    if binding.triggers_on_any_key() {
        binding.keys().iter().any(|key| held.contains(key))
    } else {
        binding.keys().iter().all(|key| held.contains(key))
    }
}

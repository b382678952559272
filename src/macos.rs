//! macOS event source using rdev.

use crate::event::{InputEvent, KeyEvent, ModifierFlags};
use crate::listener::SharedMatcher;
use anyhow::{Context, Result};
use rdev::{listen, Event, EventType};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Name an rdev key the way bindings refer to it.
///
/// Letter and digit keys drop their `Key`/`Num` prefix, so `KeyA` is `a`.
pub(crate) fn key_name(key: rdev::Key) -> String {
    let name = match key {
        rdev::Key::ControlLeft | rdev::Key::ControlRight => "Control",
        rdev::Key::ShiftLeft | rdev::Key::ShiftRight => "Shift",
        rdev::Key::Alt | rdev::Key::AltGr => "Alt",
        rdev::Key::MetaLeft | rdev::Key::MetaRight => "Meta",
        rdev::Key::UpArrow => "ArrowUp",
        rdev::Key::DownArrow => "ArrowDown",
        rdev::Key::LeftArrow => "ArrowLeft",
        rdev::Key::RightArrow => "ArrowRight",
        rdev::Key::Return => "Enter",
        _ => {
            let raw = format!("{:?}", key);
            let short = raw
                .strip_prefix("Key")
                .or_else(|| raw.strip_prefix("Num"))
                .filter(|rest| rest.len() == 1)
                .unwrap_or(&raw);
            return short.to_lowercase();
        }
    };
    name.to_string()
}

fn track_modifier(mods: &mut ModifierFlags, key: rdev::Key, down: bool) {
    match key {
        rdev::Key::ShiftLeft | rdev::Key::ShiftRight => mods.shift = down,
        rdev::Key::ControlLeft | rdev::Key::ControlRight => mods.control = down,
        rdev::Key::Alt | rdev::Key::AltGr => mods.alt = down,
        rdev::Key::MetaLeft | rdev::Key::MetaRight => mods.meta = down,
        _ => {}
    }
}

/// Keyboard event source backed by the system event tap.
#[derive(Default)]
pub struct KeyboardSource;

impl KeyboardSource {
    pub fn new() -> Self {
        Self
    }

    /// Start feeding keyboard events to `matcher` from a background thread.
    ///
    /// rdev cannot be unhooked; after the listener stops, events are dropped
    /// before they reach the matcher.
    pub(crate) fn start(self, matcher: SharedMatcher, running: Arc<AtomicBool>) -> Result<()> {
        thread::Builder::new()
            .name("hotkey-bindings-rdev".to_string())
            .spawn(move || run_source(matcher, running))
            .context("Failed to spawn keyboard thread")?;
        Ok(())
    }
}

fn run_source(matcher: SharedMatcher, running: Arc<AtomicBool>) {
    let mut current_mods = ModifierFlags::default();
    let callback_matcher = matcher.clone();
    let callback_running = Arc::clone(&running);

    let callback = move |event: Event| {
        if !callback_running.load(Ordering::Relaxed) {
            return;
        }
        let mut input = match event.event_type {
            EventType::KeyPress(key) => {
                track_modifier(&mut current_mods, key, true);
                InputEvent::KeyDown(KeyEvent::new(&key_name(key)).with_modifiers(current_mods))
            }
            EventType::KeyRelease(key) => {
                track_modifier(&mut current_mods, key, false);
                InputEvent::KeyUp(KeyEvent::new(&key_name(key)).with_modifiers(current_mods))
            }
            _ => return,
        };
        callback_matcher.dispatch(&callback_running, &mut input);
    };

    if let Err(e) = listen(callback) {
        log::error!("Error listening to keyboard events: {:?}", e);
        matcher.stop(&running);
    }
}

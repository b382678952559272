//! Linux event source using evdev.

use crate::event::{InputEvent, KeyEvent, ModifierFlags};
use crate::listener::SharedMatcher;
use anyhow::{anyhow, Context, Result};
use evdev::Device;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use std::os::fd::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Name an evdev key the way bindings refer to it.
///
/// Left and right variants of a modifier share one name. Other keys use the
/// evdev name without its `KEY_` prefix, so `KEY_A` is `a` and `KEY_F8` is `f8`.
pub(crate) fn key_name(key: evdev::Key) -> String {
    let name = match key {
        evdev::Key::KEY_LEFTCTRL | evdev::Key::KEY_RIGHTCTRL => "Control",
        evdev::Key::KEY_LEFTSHIFT | evdev::Key::KEY_RIGHTSHIFT => "Shift",
        evdev::Key::KEY_LEFTALT | evdev::Key::KEY_RIGHTALT => "Alt",
        evdev::Key::KEY_LEFTMETA | evdev::Key::KEY_RIGHTMETA => "Meta",
        evdev::Key::KEY_UP => "ArrowUp",
        evdev::Key::KEY_DOWN => "ArrowDown",
        evdev::Key::KEY_LEFT => "ArrowLeft",
        evdev::Key::KEY_RIGHT => "ArrowRight",
        evdev::Key::KEY_ESC => "Escape",
        evdev::Key::KEY_BACKSPACE => "Backspace",
        evdev::Key::KEY_PAGEUP => "PageUp",
        evdev::Key::KEY_PAGEDOWN => "PageDown",
        evdev::Key::KEY_CAPSLOCK => "CapsLock",
        evdev::Key::KEY_SCROLLLOCK => "ScrollLock",
        _ => {
            let raw = format!("{:?}", key);
            return raw.strip_prefix("KEY_").unwrap_or(&raw).to_lowercase();
        }
    };
    name.to_string()
}

/// Find all keyboard devices in /dev/input.
pub fn find_keyboards() -> Result<Vec<Device>> {
    let mut keyboards = Vec::new();

    for entry in std::fs::read_dir("/dev/input").context("Failed to read /dev/input")? {
        let entry = entry?;
        let path = entry.path();

        if !path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false)
        {
            continue;
        }

        if let Ok(device) = Device::open(&path) {
            if device
                .supported_keys()
                .map(|keys| keys.contains(evdev::Key::KEY_A))
                .unwrap_or(false)
            {
                log::debug!("Found keyboard: {:?} at {:?}", device.name(), path);
                keyboards.push(device);
            }
        }
    }

    if keyboards.is_empty() {
        Err(anyhow!(
            "No keyboards found. Make sure you're in the 'input' group or running as root."
        ))
    } else {
        Ok(keyboards)
    }
}

fn set_nonblocking(keyboards: &[Device]) -> Result<()> {
    for device in keyboards {
        let fd = device.as_raw_fd();
        let flags = fcntl(fd, FcntlArg::F_GETFL).context("Failed to get fd flags")?;
        let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
        fcntl(fd, FcntlArg::F_SETFL(flags)).context("Failed to set non-blocking")?;
    }
    Ok(())
}

fn is_would_block(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(libc::EAGAIN) || e.raw_os_error() == Some(libc::EWOULDBLOCK)
}

/// Discard events queued before the devices were (re)opened.
fn drain_events(keyboards: &mut [Device]) {
    for device in keyboards.iter_mut() {
        let device_name = device.name().map(String::from);
        loop {
            match device.fetch_events() {
                Ok(events) => {
                    let count = events.count();
                    if count == 0 {
                        break;
                    }
                    log::debug!("Drained {} stale events from {:?}", count, device_name);
                }
                Err(e) => {
                    if !is_would_block(&e) {
                        log::debug!("Error draining events from {:?}: {}", device_name, e);
                    }
                    break;
                }
            }
        }
    }
}

fn track_modifier(mods: &mut ModifierFlags, key: evdev::Key, down: bool) {
    match key {
        evdev::Key::KEY_LEFTSHIFT | evdev::Key::KEY_RIGHTSHIFT => mods.shift = down,
        evdev::Key::KEY_LEFTCTRL | evdev::Key::KEY_RIGHTCTRL => mods.control = down,
        evdev::Key::KEY_LEFTALT | evdev::Key::KEY_RIGHTALT => mods.alt = down,
        evdev::Key::KEY_LEFTMETA | evdev::Key::KEY_RIGHTMETA => mods.meta = down,
        _ => {}
    }
}

/// Translate a raw evdev key transition. Value 1 is a press, 2 an auto-repeat, 0 a release.
fn translate(key: evdev::Key, value: i32, mods: &mut ModifierFlags) -> Option<InputEvent> {
    match value {
        1 | 2 => {
            track_modifier(mods, key, true);
            let event = KeyEvent::new(&key_name(key))
                .with_modifiers(*mods)
                .with_repeat(value == 2);
            Some(InputEvent::KeyDown(event))
        }
        0 => {
            track_modifier(mods, key, false);
            Some(InputEvent::KeyUp(
                KeyEvent::new(&key_name(key)).with_modifiers(*mods),
            ))
        }
        _ => None,
    }
}

/// Record a polling pass that hit read errors.
///
/// The first failing pass yields a focus-loss, since releases on the failed
/// device are lost, and forgets the tracked modifiers. Later passes yield
/// nothing until a rescan clears `had_error`.
fn read_failure(
    any_error: bool,
    had_error: &mut bool,
    mods: &mut ModifierFlags,
) -> Option<InputEvent> {
    if !any_error || *had_error {
        return None;
    }
    *had_error = true;
    *mods = ModifierFlags::default();
    Some(InputEvent::FocusLost)
}

/// Keyboard event source reading every keyboard under /dev/input.
pub struct KeyboardSource {
    keyboards: Vec<Device>,
}

impl KeyboardSource {
    pub fn new(keyboards: Vec<Device>) -> Self {
        Self { keyboards }
    }

    /// Start feeding keyboard events to `matcher` from a background thread.
    pub(crate) fn start(self, matcher: SharedMatcher, running: Arc<AtomicBool>) -> Result<()> {
        set_nonblocking(&self.keyboards)?;
        let keyboards = self.keyboards;
        thread::Builder::new()
            .name("hotkey-bindings-evdev".to_string())
            .spawn(move || run_source(keyboards, matcher, running))
            .context("Failed to spawn keyboard thread")?;
        Ok(())
    }
}

fn run_source(mut keyboards: Vec<Device>, matcher: SharedMatcher, running: Arc<AtomicBool>) {
    let mut current_mods = ModifierFlags::default();
    let mut last_rescan = Instant::now();
    let mut had_error = false;

    const RESCAN_INTERVAL: Duration = Duration::from_secs(3);

    while running.load(Ordering::Relaxed) {
        if had_error && last_rescan.elapsed() >= RESCAN_INTERVAL {
            log::info!("Keyboard error detected, rescanning devices...");
            match find_keyboards() {
                Ok(mut new_keyboards) => {
                    // Bluetooth keyboards need a moment after reconnecting.
                    thread::sleep(Duration::from_millis(100));

                    match set_nonblocking(&new_keyboards) {
                        Ok(()) => {
                            log::info!(
                                "Keyboards reconnected: found {} device(s)",
                                new_keyboards.len()
                            );
                            drain_events(&mut new_keyboards);
                            keyboards.clear();
                            keyboards = new_keyboards;
                            current_mods = ModifierFlags::default();
                            had_error = false;
                        }
                        Err(e) => {
                            log::warn!("Failed to set non-blocking on new keyboards: {}", e);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Failed to rescan keyboards: {}", e);
                }
            }
            last_rescan = Instant::now();
        }

        let mut any_error = false;

        for device in keyboards.iter_mut() {
            match device.fetch_events() {
                Ok(events) => {
                    for event in events {
                        if let evdev::InputEventKind::Key(key) = event.kind() {
                            if let Some(mut input) = translate(key, event.value(), &mut current_mods)
                            {
                                matcher.dispatch(&running, &mut input);
                            }
                        }
                    }
                }
                Err(e) => {
                    if !is_would_block(&e) {
                        log::debug!("Keyboard read error: {}", e);
                        any_error = true;
                    }
                }
            }
        }

        if let Some(mut focus_lost) = read_failure(any_error, &mut had_error, &mut current_mods)
        {
            matcher.dispatch(&running, &mut focus_lost);
        }

        thread::sleep(Duration::from_millis(10));
    }

    log::debug!("Keyboard source stopped");
}

//! End-to-end scenarios through the public matcher API.

use hotkey_bindings::{parse_binding, BindingConfig, BindingError, BindingMatcher, InputEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn counting(matcher: &mut BindingMatcher, config: BindingConfig) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    matcher
        .register(config, move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    count
}

fn press(matcher: &mut BindingMatcher, key: &str) -> InputEvent {
    let mut event = InputEvent::key_down(key);
    matcher.handle(&mut event);
    event
}

fn release(matcher: &mut BindingMatcher, key: &str) {
    matcher.handle(&mut InputEvent::key_up(key));
}

#[test]
fn test_arrow_keys_trigger_on_any() {
    let mut matcher = BindingMatcher::new();
    let count = counting(
        &mut matcher,
        BindingConfig::new(["ArrowRight", "ArrowLeft"]).trigger_on_any_key(true),
    );

    press(&mut matcher, "ArrowRight");
    assert_eq!(count.load(Ordering::SeqCst), 1);
    release(&mut matcher, "ArrowRight");

    press(&mut matcher, "ArrowLeft");
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_control_s_saves_and_suppresses() {
    let mut matcher = BindingMatcher::new();
    let count = counting(
        &mut matcher,
        BindingConfig::new(["s"])
            .modifier("Control", true)
            .prevent_default(true),
    );

    press(&mut matcher, "s");
    assert_eq!(count.load(Ordering::SeqCst), 0);
    release(&mut matcher, "s");

    press(&mut matcher, "Control");
    let event = press(&mut matcher, "s");
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(event.default_prevented());
    release(&mut matcher, "s");

    // Shift is not named by the binding, so it doesn't block it.
    press(&mut matcher, "Shift");
    let event = press(&mut matcher, "S");
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert!(event.default_prevented());
}

#[test]
fn test_arrow_up_repeat_on_hold() {
    let json = r#"[
        { "keys": ["ArrowUp"], "enableKeyRepeatOnHold": true },
        { "keys": ["ArrowUp"] }
    ]"#;
    let configs: Vec<BindingConfig> = serde_json::from_str(json).unwrap();
    let mut matcher = BindingMatcher::new();
    let mut counts = Vec::new();
    for config in configs {
        counts.push(counting(&mut matcher, config));
    }

    let repeats = 5;
    for _ in 0..repeats {
        let mut event = InputEvent::key_down("ArrowUp");
        if let InputEvent::KeyDown(ref mut e) = event {
            *e = e.clone().with_repeat(true);
        }
        matcher.handle(&mut event);
    }
    assert_eq!(counts[0].load(Ordering::SeqCst), repeats);
    assert_eq!(counts[1].load(Ordering::SeqCst), 1);
}

#[test]
fn test_focus_loss_makes_next_press_fresh() {
    let mut matcher = BindingMatcher::new();
    let count = counting(&mut matcher, BindingConfig::new(["Tab"]));

    press(&mut matcher, "Tab");
    press(&mut matcher, "Tab");
    assert_eq!(count.load(Ordering::SeqCst), 1);

    matcher.handle(&mut InputEvent::FocusLost);
    assert!(!matcher.is_held("Tab"));

    press(&mut matcher, "Tab");
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_parsed_bindings_fire_in_registration_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut matcher = BindingMatcher::new();
    for (label, spec) in [("plain", "k"), ("ctrl", "Control+k"), ("again", "k")] {
        let order = Arc::clone(&order);
        matcher
            .register(parse_binding(spec).unwrap(), move |_| {
                order.lock().unwrap().push(label)
            })
            .unwrap();
    }

    press(&mut matcher, "Control");
    press(&mut matcher, "K");
    assert_eq!(*order.lock().unwrap(), vec!["plain", "ctrl", "again"]);
}

#[test]
fn test_empty_binding_fails_at_registration() {
    let mut matcher = BindingMatcher::new();
    let config: BindingConfig = serde_json::from_str(r#"{ "keys": [] }"#).unwrap();
    assert_eq!(
        matcher.register(config, |_| {}).unwrap_err(),
        BindingError::EmptyKeys
    );
    assert_eq!(parse_binding("  ").unwrap_err(), BindingError::EmptyKeys);
}

#[test]
fn test_independent_matchers_do_not_share_state() {
    let mut first = BindingMatcher::new();
    let mut second = BindingMatcher::new();
    let first_count = counting(&mut first, BindingConfig::new(["a", "b"]));
    let second_count = counting(&mut second, BindingConfig::new(["a", "b"]));

    press(&mut first, "a");
    press(&mut second, "b");
    assert_eq!(first_count.load(Ordering::SeqCst), 0);
    assert_eq!(second_count.load(Ordering::SeqCst), 0);

    press(&mut first, "b");
    assert_eq!(first_count.load(Ordering::SeqCst), 1);
    assert_eq!(second_count.load(Ordering::SeqCst), 0);
}

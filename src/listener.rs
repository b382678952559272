//! Platform-agnostic listener builder and lifecycle handle.

use crate::binding::Binding;
use crate::event::InputEvent;
use crate::matcher::BindingMatcher;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Matcher shared between the host and a background event source.
#[derive(Debug, Clone)]
pub(crate) struct SharedMatcher(Arc<Mutex<BindingMatcher>>);

impl SharedMatcher {
    pub(crate) fn new(matcher: BindingMatcher) -> Self {
        Self(Arc::new(Mutex::new(matcher)))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, BindingMatcher> {
        // A panicking callback leaves only plain data behind.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deliver a notification unless the listener has been stopped.
    pub(crate) fn dispatch(&self, running: &AtomicBool, event: &mut InputEvent) -> usize {
        let mut matcher = self.lock();
        if !running.load(Ordering::SeqCst) {
            return 0;
        }
        let fired = matcher.handle(event);
        if event.default_prevented() {
            // Raw device sources cannot swallow the key; record the request.
            log::debug!("Default action suppression requested for {:?}", event);
        }
        fired
    }

    /// Mark the listener stopped and detach the matcher.
    pub(crate) fn stop(&self, running: &AtomicBool) {
        let mut matcher = self.lock();
        running.store(false, Ordering::SeqCst);
        matcher.detach();
    }
}

/// Builder for creating a binding listener.
#[derive(Default)]
pub struct BindingListenerBuilder {
    bindings: Vec<Binding>,
}

impl BindingListenerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding. Bindings are evaluated in the order they are added.
    pub fn add_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Build the listener.
    #[cfg(target_os = "linux")]
    pub fn build(self) -> Result<BindingListener> {
        let keyboards = crate::linux::find_keyboards()?;
        Ok(BindingListener {
            matcher: BindingMatcher::with_bindings(self.bindings),
            inner: crate::linux::KeyboardSource::new(keyboards),
        })
    }

    /// Build the listener.
    #[cfg(target_os = "macos")]
    pub fn build(self) -> Result<BindingListener> {
        Ok(BindingListener {
            matcher: BindingMatcher::with_bindings(self.bindings),
            inner: crate::macos::KeyboardSource::new(),
        })
    }

    /// Build the listener (unsupported platform stub).
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    pub fn build(self) -> Result<BindingListener> {
        anyhow::bail!("Keyboard listening is not supported on this platform")
    }
}

/// A binding listener that feeds a background keyboard source into a matcher.
pub struct BindingListener {
    matcher: BindingMatcher,
    #[cfg(target_os = "linux")]
    inner: crate::linux::KeyboardSource,
    #[cfg(target_os = "macos")]
    inner: crate::macos::KeyboardSource,
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    inner: (),
}

impl BindingListener {
    /// Attach the matcher and start reading keyboard events in a background thread.
    ///
    /// Callbacks run on that thread. The listener is detached when the
    /// returned handle is stopped or dropped.
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    pub fn start(self) -> Result<BindingListenerHandle> {
        let mut matcher = self.matcher;
        matcher.attach();
        let handle = BindingListenerHandle::new(SharedMatcher::new(matcher));
        if let Err(e) = self
            .inner
            .start(handle.matcher.clone(), Arc::clone(&handle.running))
        {
            handle.stop();
            return Err(e);
        }
        Ok(handle)
    }

    /// Start listening (unsupported platform stub).
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    pub fn start(self) -> Result<BindingListenerHandle> {
        let _ = self.inner;
        anyhow::bail!("Keyboard listening is not supported on this platform")
    }
}

/// Handle for a running binding listener.
///
/// Stopping the handle detaches the matcher synchronously: once [`stop`]
/// returns, no further callback is invoked. Dropping the handle stops it.
///
/// # Example
///
/// ```no_run
/// use hotkey_bindings::{parse_binding, BindingListenerBuilder};
///
/// let save = parse_binding("Control+S")
///     .unwrap()
///     .build(|_| println!("save"))
///     .unwrap();
/// let handle = BindingListenerBuilder::new()
///     .add_binding(save)
///     .build()
///     .unwrap()
///     .start()
///     .unwrap();
///
/// std::thread::sleep(std::time::Duration::from_secs(10));
/// handle.stop();
/// ```
///
/// [`stop`]: BindingListenerHandle::stop
pub struct BindingListenerHandle {
    running: Arc<AtomicBool>,
    matcher: SharedMatcher,
}

impl BindingListenerHandle {
    pub(crate) fn new(matcher: SharedMatcher) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            matcher,
        }
    }

    /// Check if the listener is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run `f` with exclusive access to the matcher, e.g. to replace bindings.
    ///
    /// Must not be called from inside a binding callback.
    pub fn with_matcher<R>(&self, f: impl FnOnce(&mut BindingMatcher) -> R) -> R {
        f(&mut self.matcher.lock())
    }

    /// Manually stop the listener.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        self.matcher.stop(&self.running);
    }
}

impl Drop for BindingListenerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingConfig;
    use std::sync::atomic::AtomicUsize;

    fn handle_with_counter() -> (BindingListenerHandle, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let binding = BindingConfig::new(["F8"])
            .build(move |_| {
                inner.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let matcher = BindingMatcher::with_bindings(vec![binding]);
        (BindingListenerHandle::new(SharedMatcher::new(matcher)), count)
    }

    #[test]
    fn test_dispatch_while_running() {
        let (handle, count) = handle_with_counter();
        let fired = handle
            .matcher
            .dispatch(&handle.running, &mut InputEvent::key_down("f8"));
        assert_eq!(fired, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(handle.is_running());
    }

    #[test]
    fn test_stop_detaches_and_clears() {
        let (handle, count) = handle_with_counter();
        let source = handle.matcher.clone();
        let running = Arc::clone(&handle.running);

        source.dispatch(&running, &mut InputEvent::key_down("Shift"));
        handle.stop();
        assert!(!handle.is_running());
        assert!(!handle.with_matcher(|m| m.is_attached()));
        assert_eq!(handle.with_matcher(|m| m.held_keys().count()), 0);

        assert_eq!(source.dispatch(&running, &mut InputEvent::key_down("F8")), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_stops_listener() {
        let (handle, count) = handle_with_counter();
        let source = handle.matcher.clone();
        let running = Arc::clone(&handle.running);
        drop(handle);

        assert!(!running.load(Ordering::SeqCst));
        assert_eq!(source.dispatch(&running, &mut InputEvent::key_down("F8")), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_with_matcher_replaces_bindings() {
        let (handle, _count) = handle_with_counter();
        handle.with_matcher(|m| m.set_bindings(Vec::new()));
        assert!(handle.with_matcher(|m| m.is_empty()));
    }
}

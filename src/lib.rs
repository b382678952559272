//! Keyboard bindings: map held keys and modifiers to callbacks.
//!
//! A [`BindingMatcher`] tracks which keys are held and, on every key press,
//! fires the bindings that the held keys satisfy. It does no I/O of its own;
//! feed it notifications from any source, or use [`BindingListenerBuilder`]
//! to read the system keyboard directly.
//!
//! # Features
//!
//! - **Key combinations** - A binding fires when all its keys are held, or any
//!   one of them with `trigger_on_any_key`
//! - **Modifier requirements** - Require Control/Shift/Alt/Meta held or released;
//!   modifiers a binding doesn't name are unconstrained
//! - **Repeat-on-hold** - Fire on every native auto-repeat instead of once per press
//! - **Default-action suppression** - Flag events whose default action should be skipped
//! - **Case-insensitive keys** - `"S"` and `"s"` are the same key
//! - **Automatic cleanup** - The listener detaches when its handle is dropped
//!
//! # Example
//!
//! ```
//! use hotkey_bindings::{parse_binding, BindingMatcher, KeyEvent};
//!
//! fn main() -> Result<(), hotkey_bindings::BindingError> {
//!     let mut matcher = BindingMatcher::new();
//!     matcher.register(parse_binding("Control+S")?.prevent_default(true), |_| {
//!         println!("save");
//!     })?;
//!
//!     matcher.on_key_down(&mut KeyEvent::new("Control"));
//!     let mut event = KeyEvent::new("s");
//!     assert_eq!(matcher.on_key_down(&mut event), 1);
//!     assert!(event.default_prevented());
//!     Ok(())
//! }
//! ```
//!
//! # Linux Requirements
//!
//! On Linux, the listener reads `/dev/input/event*` devices. The user must be
//! root or a member of the `input` group.

mod binding;
mod error;
mod event;
mod key;
mod listener;
mod matcher;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

pub use binding::{parse_binding, Binding, BindingConfig, Callback};
pub use error::BindingError;
pub use event::{InputEvent, KeyEvent, ModifierFlags};
pub use key::{KeyId, Modifier};
pub use listener::{BindingListener, BindingListenerBuilder, BindingListenerHandle};
pub use matcher::BindingMatcher;

#[cfg(target_os = "linux")]
pub use linux::find_keyboards;

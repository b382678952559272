//! Errors raised while registering bindings.

/// Configuration error, returned synchronously from every registration path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("Binding must name at least one key")]
    EmptyKeys,

    #[error("Invalid binding: {0}")]
    InvalidBinding(String),
}

//! Error types for window construction and native backends

use thiserror::Error;

/// Errors surfaced while building or realizing a window.
///
/// These are environment conditions: once `create_window` fails the window
/// does not exist and nothing may be done with it.
#[derive(Debug, Error)]
pub enum WindowError {
    /// The platform could not create a native view
    #[error("failed to create native view: {0}")]
    ViewCreation(String),
    /// The native view exists but could not be realized (mapped to an OS window)
    #[error("failed to realize native view: {0}")]
    Realize(String),
    /// The host supplied a parent handle that cannot be used
    #[error("invalid parent window handle {0:#x}")]
    InvalidParent(usize),
    /// The native handle type is not supported on this platform
    #[error("unsupported native handle: {0}")]
    UnsupportedHandle(String),
    /// No graphics context could be obtained for the view
    #[error("graphics context unavailable: {0}")]
    GraphicsContext(String),
    /// The window id does not name a live window
    #[error("unknown window")]
    UnknownWindow,
}

pub type Result<T> = std::result::Result<T, WindowError>;

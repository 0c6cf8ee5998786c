use thiserror::Error;

/// Unified result type for the parlor crate.
pub type Result<T> = std::result::Result<T, UiError>;

/// Errors surfaced by the session runtime.
///
/// Region mutation and dispatch are deliberately infallible: every update
/// record routes somewhere (unrecognised tags are a defined no-op), so the
/// only failure modes left are the terminal backend, the engine bus, and a
/// screen too small to hold the fixed plan.
#[derive(Debug, Error)]
pub enum UiError {
    #[error("terminal {width}x{height} is below the minimum of {min_width}x{min_height}")]
    SizeTooSmall {
        width: u16,
        height: u16,
        min_width: u16,
        min_height: u16,
    },
    #[error("engine bus closed")]
    BusClosed,
    #[error("terminal backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

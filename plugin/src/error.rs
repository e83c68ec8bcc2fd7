use thiserror::Error;

/// Errors surfaced by the plugin's setup paths.
///
/// Per-tick work never fails: absent bodies and vanished shells are skipped
/// or repaired in place.
#[derive(Debug, Error)]
pub enum LetMeOutError {
    /// A controller is already registered under this modifier key.
    #[error("controller already installed for modifier {0}")]
    DuplicateController(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LetMeOutError>;

//! Crate error type for the fallible edges (save files, settings files).
//!
//! The simulation itself never fails; see `sim`.

/// Errors surfaced by persistence and configuration loading.
#[derive(thiserror::Error, Debug)]
pub enum RecoilError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Save file has the wrong size for a save record
    #[error("Corrupt save: expected {expected} bytes, found {found}")]
    CorruptSave { expected: usize, found: usize },
}

/// Result type used by the fallible parts of the crate.
pub type RecoilResult<T> = Result<T, RecoilError>;

//! Error types for the leekcal pipeline.

use thiserror::Error;

/// Errors that can occur while building the feed.
///
/// Per-record problems (one unparseable block, one event missing a required
/// field) are deliberately *not* represented here: those are logged and the
/// record is dropped, never failing the run. These variants cover failures
/// that affect the whole input or the whole output artifact.
#[derive(Error, Debug)]
pub enum LeekCalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown timezone: {0}")]
    Timezone(String),

    #[error("Structural parse error: {0}")]
    StructuralParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for leekcal operations.
pub type LeekCalResult<T> = Result<T, LeekCalError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MelodygenError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Stale candidate: {0}")]
    StaleCandidate(String),

    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error("Session busy: {0}")]
    SessionBusy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MIDI error: {0}")]
    Midi(#[from] midly::Error),
}

pub type Result<T> = std::result::Result<T, MelodygenError>;

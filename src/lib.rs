//! Interactive evolutionary melody generation.
//!
//! A population of candidate melodies evolves under key/scale/tempo
//! constraints, driven by a human listener rating one showcase melody per
//! round. Two operations cover the whole protocol: create a session for a
//! config and get the first candidate, then rate a candidate to get the
//! next one. Candidates are returned as Standard MIDI File bytes with the
//! session and candidate ids alongside.
//!
//! ```no_run
//! use melodygen::{GenerationConfig, SessionStore};
//!
//! let store = SessionStore::new();
//! let first = store.create(GenerationConfig::default())?;
//! // ...play first.midi for the listener...
//! let next = store.rate(first.session_id, first.candidate_id, 4)?;
//! # Ok::<(), melodygen::MelodygenError>(())
//! ```

pub mod codec;
pub mod config;
pub mod engines;
pub mod error;
pub mod session;
pub mod theory;

pub use config::GenerationConfig;
pub use error::{MelodygenError, Result};
pub use session::store::{GeneratedCandidate, SessionStore};

//! Genome representation for melody evolution.
//!
//! A genome is a fixed-length sequence of genes, one per bar slot. Pitches
//! are stored as scale degree indices rather than raw MIDI values, so any
//! genome the operators can produce is in-scale by construction.
//!
//! Genome length is `bars * notes_per_bar` and never changes for the life of
//! a session; only gene contents vary across generations.

use crate::error::{MelodygenError, Result};
use crate::theory::Scale;
use serde::{Deserialize, Serialize};

/// Velocity assigned to freshly initialized notes.
pub const DEFAULT_VELOCITY: u8 = 100;

/// Note length as a fraction of one bar slot. Nothing lasts longer than its
/// slot, which keeps note-offs from colliding with the next attack of the
/// same pitch in the encoded MIDI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteDuration {
    Quarter,
    Half,
    Full,
}

impl NoteDuration {
    /// The allowed duration set for initialization and mutation.
    pub const ALL: [NoteDuration; 3] = [NoteDuration::Quarter, NoteDuration::Half, NoteDuration::Full];

    pub fn ticks(self, slot_ticks: u32) -> u32 {
        match self {
            NoteDuration::Quarter => slot_ticks / 4,
            NoteDuration::Half => slot_ticks / 2,
            NoteDuration::Full => slot_ticks,
        }
    }
}

/// A gene's pitch: silence, or an absolute scale degree index in
/// `0..scale.degree_span()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenePitch {
    Rest,
    Degree(u8),
}

impl GenePitch {
    pub fn is_rest(self) -> bool {
        matches!(self, GenePitch::Rest)
    }
}

/// One bar slot of a melody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    pub pitch: GenePitch,
    pub duration: NoteDuration,
    pub velocity: u8,
}

/// A genome is a sequence of genes that deterministically maps to a melody.
///
/// Linear fixed-length genomes keep the operators trivial: crossover is bar
/// slicing and mutation is per-gene resampling, and neither can produce a
/// structurally invalid melody.
pub type Genome = Vec<Gene>;

/// Check the genome invariants: exact length, and every non-rest pitch
/// inside the scale's degree span. Violations indicate an operator bug and
/// surface as `InternalInvariant`.
pub fn validate_genome(genome: &Genome, scale: &Scale, expected_len: usize) -> Result<()> {
    if genome.len() != expected_len {
        return Err(MelodygenError::InternalInvariant(format!(
            "genome length {} does not match the session's fixed length {}",
            genome.len(),
            expected_len
        )));
    }
    for (slot, gene) in genome.iter().enumerate() {
        if let GenePitch::Degree(degree) = gene.pitch {
            if degree as usize >= scale.degree_span() {
                return Err(MelodygenError::InternalInvariant(format!(
                    "gene {} has degree {} outside the scale span {}",
                    slot,
                    degree,
                    scale.degree_span()
                )));
            }
        }
    }
    Ok(())
}

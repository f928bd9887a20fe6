//! One evolutionary run and its candidate protocol.
//!
//! A session owns the engine, the single outstanding candidate awaiting a
//! rating, and the append-only rating history. Rating the outstanding
//! candidate is the only way the generation counter advances.

pub mod store;

use crate::codec;
use crate::config::GenerationConfig;
use crate::engines::generation::SteadyStateEngine;
use crate::error::{MelodygenError, Result};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// The identity of a showcased genome. Issued exactly once, consumed (rated)
/// at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub id: Uuid,
    pub generation: u64,
}

impl Candidate {
    fn issue(generation: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            generation,
        }
    }
}

/// Write-once record of one rating.
#[derive(Debug, Clone, Copy)]
pub struct RatingEvent {
    pub candidate: Uuid,
    pub score: u8,
    pub at: DateTime<Utc>,
}

pub struct Session {
    id: Uuid,
    config: GenerationConfig,
    engine: SteadyStateEngine,
    outstanding: Candidate,
    history: Vec<RatingEvent>,
    last_activity: Instant,
}

impl Session {
    /// Validate the config, seed the population, and surface the
    /// generation-0 candidate.
    pub fn new(config: GenerationConfig) -> Result<Self> {
        config.validate()?;
        let engine = SteadyStateEngine::new(&config);
        let id = Uuid::new_v4();
        let outstanding = Candidate::issue(0);
        log::info!(
            "session {id}: created ({} {}, {} bars x {} notes, population {})",
            config.key,
            config.scale,
            config.bars,
            config.notes_per_bar,
            config.population
        );
        Ok(Self {
            id,
            config,
            engine,
            outstanding,
            history: Vec::new(),
            last_activity: Instant::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.engine.generation()
    }

    pub fn outstanding(&self) -> &Candidate {
        &self.outstanding
    }

    pub fn history(&self) -> &[RatingEvent] {
        &self.history
    }

    /// Rate the outstanding candidate and advance one round. Validation
    /// failures leave every piece of session state untouched; the previous
    /// candidate remains outstanding and ratable.
    pub fn rate(&mut self, candidate_id: Uuid, rating: i64) -> Result<()> {
        if !(0..=5).contains(&rating) {
            return Err(MelodygenError::Configuration(format!(
                "rating must be between 0 and 5, got {rating}"
            )));
        }
        if candidate_id != self.outstanding.id {
            return Err(MelodygenError::StaleCandidate(format!(
                "candidate {candidate_id} is not the outstanding candidate of session {}",
                self.id
            )));
        }

        self.engine.rate_and_advance(rating as f64)?;

        self.history.push(RatingEvent {
            candidate: candidate_id,
            score: rating as u8,
            at: Utc::now(),
        });
        self.outstanding = Candidate::issue(self.engine.generation());
        self.last_activity = Instant::now();
        log::debug!(
            "session {}: rated {candidate_id} at {rating}, now at generation {}",
            self.id,
            self.engine.generation()
        );
        Ok(())
    }

    /// Encode the current showcase genome for the caller.
    pub fn encoded_showcase(&self) -> Result<Vec<u8>> {
        codec::encode(
            self.engine.showcase_genome(),
            self.engine.scale(),
            self.config.tempo,
            self.config.notes_per_bar,
        )
    }

    pub fn idle_duration(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::{Key, ScaleKind};

    fn config() -> GenerationConfig {
        GenerationConfig {
            key: Key::C,
            scale: ScaleKind::Major,
            bars: 2,
            notes_per_bar: 4,
            population: 4,
            seed: Some(7),
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn new_session_has_generation_zero_candidate() {
        let session = Session::new(config()).unwrap();
        assert_eq!(session.generation(), 0);
        assert_eq!(session.outstanding().generation, 0);
        assert!(session.history().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let bad = GenerationConfig {
            population: 0,
            ..config()
        };
        assert!(matches!(
            Session::new(bad),
            Err(MelodygenError::Configuration(_))
        ));
    }

    #[test]
    fn rating_advances_and_reissues() {
        let mut session = Session::new(config()).unwrap();
        let first = *session.outstanding();
        session.rate(first.id, 4).unwrap();
        assert_eq!(session.generation(), 1);
        assert_ne!(session.outstanding().id, first.id);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].score, 4);
    }

    #[test]
    fn out_of_range_rating_changes_nothing() {
        let mut session = Session::new(config()).unwrap();
        let candidate = session.outstanding().id;
        for bad in [-1i64, 6, 100] {
            assert!(matches!(
                session.rate(candidate, bad),
                Err(MelodygenError::Configuration(_))
            ));
        }
        assert_eq!(session.generation(), 0);
        assert_eq!(session.outstanding().id, candidate);
        // Still ratable after the failed attempts.
        session.rate(candidate, 5).unwrap();
    }

    #[test]
    fn double_rating_is_stale() {
        let mut session = Session::new(config()).unwrap();
        let candidate = session.outstanding().id;
        session.rate(candidate, 3).unwrap();
        assert!(matches!(
            session.rate(candidate, 3),
            Err(MelodygenError::StaleCandidate(_))
        ));
        assert_eq!(session.generation(), 1);
    }
}

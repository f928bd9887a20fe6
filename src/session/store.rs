//! Keyed in-memory session store.
//!
//! Requests are served concurrently across sessions but strictly serialized
//! within one: each session sits behind its own mutex, and the map shard
//! lock is never held across a round.

use crate::config::GenerationConfig;
use crate::error::{MelodygenError, Result};
use crate::session::Session;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// What a caller gets back from `create` and `rate`: the encoded showcase
/// plus the identifiers to convey out of band.
#[derive(Debug, Clone)]
pub struct GeneratedCandidate {
    pub session_id: Uuid,
    pub candidate_id: Uuid,
    pub generation: u64,
    pub midi: Vec<u8>,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, Arc<Mutex<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Create a session for a config and return its first candidate.
    pub fn create(&self, config: GenerationConfig) -> Result<GeneratedCandidate> {
        let session = Session::new(config)?;
        let session_id = session.id();
        let midi = session.encoded_showcase()?;
        let candidate = *session.outstanding();

        self.sessions
            .insert(session_id, Arc::new(Mutex::new(session)));
        log::info!(
            "store: session {session_id} created, {} active",
            self.sessions.len()
        );

        Ok(GeneratedCandidate {
            session_id,
            candidate_id: candidate.id,
            generation: candidate.generation,
            midi,
        })
    }

    /// Rate a session's outstanding candidate and return the next one.
    pub fn rate(
        &self,
        session_id: Uuid,
        candidate_id: Uuid,
        rating: i64,
    ) -> Result<GeneratedCandidate> {
        let session = self.lookup(session_id)?;
        let mut session = session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        session.rate(candidate_id, rating)?;
        let midi = session.encoded_showcase()?;
        let candidate = *session.outstanding();

        Ok(GeneratedCandidate {
            session_id,
            candidate_id: candidate.id,
            generation: candidate.generation,
            midi,
        })
    }

    /// Atomically remove a session. Fails with `SessionBusy` while a round
    /// on it is in flight.
    pub fn destroy(&self, session_id: Uuid) -> Result<()> {
        let removed = self
            .sessions
            .remove_if(&session_id, |_, session| session.try_lock().is_ok());
        match removed {
            Some(_) => {
                log::info!("store: session {session_id} destroyed");
                Ok(())
            }
            None if self.sessions.contains_key(&session_id) => Err(MelodygenError::SessionBusy(
                format!("session {session_id} has a round in flight"),
            )),
            None => Err(MelodygenError::NotFound(format!(
                "unknown session {session_id}"
            ))),
        }
    }

    /// Evict sessions idle longer than `max_idle`, skipping any with a
    /// round in flight. Returns how many were removed.
    pub fn cleanup(&self, max_idle: Duration) -> usize {
        let mut stale = Vec::new();
        for entry in self.sessions.iter() {
            if let Ok(session) = entry.value().try_lock() {
                if session.idle_duration() > max_idle {
                    stale.push(*entry.key());
                }
            }
        }

        let mut removed = 0;
        for id in stale {
            let gone = self.sessions.remove_if(&id, |_, session| {
                session
                    .try_lock()
                    .map(|s| s.idle_duration() > max_idle)
                    .unwrap_or(false)
            });
            if gone.is_some() {
                log::info!("store: evicted idle session {id}");
                removed += 1;
            }
        }
        removed
    }

    fn lookup(&self, session_id: Uuid) -> Result<Arc<Mutex<Session>>> {
        self.sessions
            .get(&session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| MelodygenError::NotFound(format!("unknown session {session_id}")))
    }
}

//! Per-session generation configuration.
//!
//! Every field is validated at the session store boundary before anything
//! reaches the engine; the engine itself assumes a valid config.

use crate::error::{MelodygenError, Result};
use crate::theory::{Key, ScaleKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub key: Key,
    pub scale: ScaleKind,
    pub bars: usize,
    pub notes_per_bar: usize,
    /// Beats per minute.
    pub tempo: u32,
    /// Initial population size.
    pub population: usize,
    /// Offspring produced per rating round. The first becomes the next
    /// showcase; the rest join the population.
    pub steps: usize,
    /// Whether genomes may contain rests.
    pub pauses: bool,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
    /// Probability that an initialized gene is a rest (ignored when
    /// `pauses` is false).
    pub rest_probability: f64,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            key: Key::C,
            scale: ScaleKind::Major,
            bars: 8,
            notes_per_bar: 4,
            tempo: 120,
            population: 10,
            steps: 1,
            pauses: true,
            mutation_rate: 0.125,
            rest_probability: 0.3,
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Fixed genome length for the session's lifetime.
    pub fn genome_len(&self) -> usize {
        self.bars * self.notes_per_bar
    }

    pub fn validate(&self) -> Result<()> {
        if self.bars < 1 {
            return Err(MelodygenError::Configuration(
                "bars must be at least 1".to_string(),
            ));
        }
        if self.notes_per_bar < 1 {
            return Err(MelodygenError::Configuration(
                "notes_per_bar must be at least 1".to_string(),
            ));
        }
        // Keeps one bar slot at 30+ MIDI ticks so slot arithmetic stays
        // within the codec's 1-tick round-trip tolerance.
        if self.notes_per_bar > 64 {
            return Err(MelodygenError::Configuration(
                "notes_per_bar must be at most 64".to_string(),
            ));
        }
        if !(20..=300).contains(&self.tempo) {
            return Err(MelodygenError::Configuration(format!(
                "tempo must be between 20 and 300 bpm, got {}",
                self.tempo
            )));
        }
        if self.population < 1 {
            return Err(MelodygenError::Configuration(
                "population must be at least 1".to_string(),
            ));
        }
        if self.steps < 1 {
            return Err(MelodygenError::Configuration(
                "steps must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(MelodygenError::Configuration(
                "mutation_rate must be between 0 and 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.rest_probability) {
            return Err(MelodygenError::Configuration(
                "rest_probability must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        GenerationConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_bars() {
        let config = GenerationConfig {
            bars: 0,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MelodygenError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_absurd_tempo() {
        let config = GenerationConfig {
            tempo: 1000,
            ..GenerationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_population() {
        let config = GenerationConfig {
            population: 0,
            ..GenerationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_transport_spellings() {
        let config: GenerationConfig = serde_json::from_str(
            r#"{"key": "F#", "scale": "minorBlues", "bars": 4, "notes_per_bar": 4,
                "tempo": 120, "population": 10, "steps": 1, "pauses": false}"#,
        )
        .unwrap();
        assert_eq!(config.key, Key::FSharp);
        assert_eq!(config.scale, ScaleKind::MinorBlues);
        assert!(!config.pauses);
        config.validate().unwrap();
    }
}

//! Keys, scales and pitch quantization.
//!
//! A `Scale` is the set of pitch classes reachable from a key through a named
//! mode. Genomes store pitches as scale degree indices, so everything the
//! variation operators produce is in-scale by construction; `quantize` exists
//! for mapping arbitrary MIDI pitches back onto the scale.

use crate::error::{MelodygenError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest octave a genome degree can land in (octave 4 starts at MIDI 60).
pub const BASE_OCTAVE: u8 = 4;

/// How many octaves of scale degrees a genome may use.
pub const DEGREE_SPAN_OCTAVES: usize = 2;

/// The 12 pitch classes, spelled with sharps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
}

impl Key {
    pub const ALL: [Key; 12] = [
        Key::C,
        Key::CSharp,
        Key::D,
        Key::DSharp,
        Key::E,
        Key::F,
        Key::FSharp,
        Key::G,
        Key::GSharp,
        Key::A,
        Key::ASharp,
        Key::B,
    ];

    /// Semitones above C.
    pub fn pitch_class(self) -> u8 {
        match self {
            Key::C => 0,
            Key::CSharp => 1,
            Key::D => 2,
            Key::DSharp => 3,
            Key::E => 4,
            Key::F => 5,
            Key::FSharp => 6,
            Key::G => 7,
            Key::GSharp => 8,
            Key::A => 9,
            Key::ASharp => 10,
            Key::B => 11,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Key::C => "C",
            Key::CSharp => "C#",
            Key::D => "D",
            Key::DSharp => "D#",
            Key::E => "E",
            Key::F => "F",
            Key::FSharp => "F#",
            Key::G => "G",
            Key::GSharp => "G#",
            Key::A => "A",
            Key::ASharp => "A#",
            Key::B => "B",
        };
        f.write_str(name)
    }
}

impl FromStr for Key {
    type Err = MelodygenError;

    fn from_str(s: &str) -> Result<Self> {
        Key::ALL
            .iter()
            .copied()
            .find(|k| k.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| MelodygenError::Configuration(format!("unknown key: {s:?}")))
    }
}

/// The named modes a session may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleKind {
    Major,
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    #[serde(alias = "majorBlues")]
    MajorBlues,
    #[serde(alias = "minorBlues")]
    MinorBlues,
}

impl ScaleKind {
    pub const ALL: [ScaleKind; 8] = [
        ScaleKind::Major,
        ScaleKind::Minor,
        ScaleKind::Dorian,
        ScaleKind::Phrygian,
        ScaleKind::Lydian,
        ScaleKind::Mixolydian,
        ScaleKind::MajorBlues,
        ScaleKind::MinorBlues,
    ];

    /// Semitone offsets from the key, one per scale degree.
    pub fn offsets(self) -> &'static [u8] {
        match self {
            ScaleKind::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleKind::Minor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleKind::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleKind::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleKind::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleKind::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            // Hexatonic blues scales: P1 M2 m3 M3 P5 M6 / P1 m3 P4 d5 P5 m7
            ScaleKind::MajorBlues => &[0, 2, 3, 4, 7, 9],
            ScaleKind::MinorBlues => &[0, 3, 5, 6, 7, 10],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleKind::Major => "major",
            ScaleKind::Minor => "minor",
            ScaleKind::Dorian => "dorian",
            ScaleKind::Phrygian => "phrygian",
            ScaleKind::Lydian => "lydian",
            ScaleKind::Mixolydian => "mixolydian",
            ScaleKind::MajorBlues => "major-blues",
            ScaleKind::MinorBlues => "minor-blues",
        }
    }
}

impl fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScaleKind {
    type Err = MelodygenError;

    fn from_str(s: &str) -> Result<Self> {
        // Accept both the kebab-case spelling and the legacy camelCase one.
        match s {
            "majorBlues" => return Ok(ScaleKind::MajorBlues),
            "minorBlues" => return Ok(ScaleKind::MinorBlues),
            _ => {}
        }
        ScaleKind::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| MelodygenError::Configuration(format!("unknown scale: {s:?}")))
    }
}

/// A concrete (key, mode) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    pub key: Key,
    pub kind: ScaleKind,
}

impl Scale {
    pub fn new(key: Key, kind: ScaleKind) -> Self {
        Self { key, kind }
    }

    pub fn offsets(&self) -> &'static [u8] {
        self.kind.offsets()
    }

    /// Number of degrees in one octave of the scale.
    pub fn degree_count(&self) -> usize {
        self.offsets().len()
    }

    /// Number of distinct degree indices a genome may use.
    pub fn degree_span(&self) -> usize {
        self.degree_count() * DEGREE_SPAN_OCTAVES
    }

    /// Whether a MIDI pitch lands on a scale member (pitch-class test).
    pub fn contains(&self, pitch: u8) -> bool {
        let rel = (pitch as i32 - self.key.pitch_class() as i32).rem_euclid(12) as u8;
        self.offsets().contains(&rel)
    }

    /// Map an absolute degree index to a MIDI pitch. Degrees beyond one
    /// octave of the scale carry into the next octave.
    pub fn degree_to_midi(&self, degree: u8) -> u8 {
        let n = self.degree_count();
        let octave = degree as usize / n;
        let offset = self.offsets()[degree as usize % n];
        12 * (BASE_OCTAVE + 1) + self.key.pitch_class() + offset + 12 * octave as u8
    }

    /// Map an arbitrary pitch to the nearest scale member, ties broken
    /// toward the lower pitch.
    pub fn quantize(&self, raw: i32) -> u8 {
        let raw = raw.clamp(0, 127);
        let mut best: u8 = 0;
        let mut best_dist = i32::MAX;
        for pitch in 0u8..=127 {
            if !self.contains(pitch) {
                continue;
            }
            let dist = (pitch as i32 - raw).abs();
            if dist < best_dist {
                best = pitch;
                best_dist = dist;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_scale_offsets() {
        let scale = Scale::new(Key::C, ScaleKind::Major);
        assert_eq!(scale.offsets(), &[0, 2, 4, 5, 7, 9, 11]);
        assert_eq!(scale.degree_count(), 7);
        assert_eq!(scale.degree_span(), 14);
    }

    #[test]
    fn degree_to_midi_carries_octaves() {
        let scale = Scale::new(Key::C, ScaleKind::Major);
        assert_eq!(scale.degree_to_midi(0), 60); // C4
        assert_eq!(scale.degree_to_midi(4), 67); // G4
        assert_eq!(scale.degree_to_midi(7), 72); // C5
        assert_eq!(scale.degree_to_midi(13), 83); // B5
    }

    #[test]
    fn contains_is_pitch_class_based() {
        let scale = Scale::new(Key::D, ScaleKind::Minor);
        assert!(scale.contains(62)); // D4
        assert!(scale.contains(50)); // D3
        assert!(!scale.contains(63)); // D#4 not in D minor
    }

    #[test]
    fn quantize_snaps_to_nearest_member() {
        let scale = Scale::new(Key::C, ScaleKind::Major);
        assert_eq!(scale.quantize(60), 60); // already in scale
        assert_eq!(scale.quantize(61), 60); // C# ties between C and D, lower wins
        assert_eq!(scale.quantize(66), 65); // F# ties between F and G, lower wins
        assert_eq!(scale.quantize(63), 62); // D# ties between D and E, lower wins
    }

    #[test]
    fn quantize_clamps_out_of_range_input() {
        let scale = Scale::new(Key::C, ScaleKind::Major);
        assert!(scale.contains(scale.quantize(-10)));
        assert!(scale.contains(scale.quantize(500)));
    }

    #[test]
    fn key_and_scale_parse() {
        assert_eq!("F#".parse::<Key>().unwrap(), Key::FSharp);
        assert_eq!("major-blues".parse::<ScaleKind>().unwrap(), ScaleKind::MajorBlues);
        assert_eq!("minorBlues".parse::<ScaleKind>().unwrap(), ScaleKind::MinorBlues);
        assert!("H".parse::<Key>().is_err());
        assert!("chromatic".parse::<ScaleKind>().is_err());
    }
}

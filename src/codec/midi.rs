//! Genome <-> Standard MIDI File codec.
//!
//! Encoding lays genes out sequentially in time: each bar spans four quarter
//! notes and slot `i` of a bar starts at `(i * bar_ticks) / notes_per_bar`.
//! A rest gene advances time without emitting events. Output is SMF Format 1
//! with a tempo track and a single melody track.
//!
//! Decoding is the inverse for non-rest events and exists for callers and
//! tests; the engine never reads it.

use crate::engines::generation::genome::{GenePitch, Genome};
use crate::error::Result;
use crate::theory::Scale;
use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use std::collections::HashMap;

pub const TICKS_PER_QUARTER: u16 = 480;

/// Ticks in one 4/4 bar.
const TICKS_PER_BAR: u32 = 4 * TICKS_PER_QUARTER as u32;

/// Ticks in one bar slot (floor; onsets are computed per slot so the
/// accumulated error never exceeds one tick).
pub fn slot_ticks(notes_per_bar: usize) -> u32 {
    TICKS_PER_BAR / notes_per_bar as u32
}

/// Absolute onset tick of a genome slot.
pub fn slot_onset_ticks(slot: usize, notes_per_bar: usize) -> u32 {
    let bar = (slot / notes_per_bar) as u32;
    let pos = (slot % notes_per_bar) as u32;
    bar * TICKS_PER_BAR + (pos * TICKS_PER_BAR) / notes_per_bar as u32
}

/// A decoded note with absolute timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub onset_ticks: u32,
    pub pitch: u8,
    pub duration_ticks: u32,
    pub velocity: u8,
}

/// The note timeline recovered from an encoded artifact.
#[derive(Debug, Clone)]
pub struct DecodedTimeline {
    pub tempo_bpm: u32,
    pub events: Vec<NoteEvent>,
}

/// Encode a genome as SMF bytes. Deterministic for a given input.
pub fn encode(
    genome: &Genome,
    scale: &Scale,
    tempo_bpm: u32,
    notes_per_bar: usize,
) -> Result<Vec<u8>> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let mut tempo_track: Track<'static> = Vec::new();
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(60_000_000 / tempo_bpm))),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    // Collect absolute-tick events, then sort with note-offs ahead of
    // note-ons at the same tick so a Full-length note never swallows the
    // following attack.
    let mut events: Vec<(u32, bool, u8, u8)> = Vec::new();
    let ticks = slot_ticks(notes_per_bar);
    for (slot, gene) in genome.iter().enumerate() {
        if let GenePitch::Degree(degree) = gene.pitch {
            let onset = slot_onset_ticks(slot, notes_per_bar);
            let pitch = scale.degree_to_midi(degree);
            events.push((onset, true, pitch, gene.velocity));
            events.push((onset + gene.duration.ticks(ticks), false, pitch, 0));
        }
    }
    events.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut melody_track: Track<'static> = Vec::new();
    melody_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::ProgramChange {
                program: u7::new(0),
            },
        },
    });

    let mut last_tick = 0u32;
    for (tick, is_on, pitch, velocity) in events {
        let message = if is_on {
            MidiMessage::NoteOn {
                key: u7::new(pitch),
                vel: u7::new(velocity),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(pitch),
                vel: u7::new(0),
            }
        };
        melody_track.push(TrackEvent {
            delta: u28::new(tick - last_tick),
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message,
            },
        });
        last_tick = tick;
    }

    melody_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(melody_track);

    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Decode SMF bytes back into an ordered note timeline.
pub fn decode(bytes: &[u8]) -> Result<DecodedTimeline> {
    let smf = Smf::parse(bytes)?;

    let mut tempo_bpm = 120u32;
    let mut events = Vec::new();

    for track in &smf.tracks {
        let mut tick = 0u32;
        // FIFO of sounding onsets per pitch; pairs each NoteOn with the
        // next NoteOff of the same pitch.
        let mut sounding: HashMap<u8, Vec<(u32, u8)>> = HashMap::new();

        for event in track {
            tick += event.delta.as_int();
            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(us_per_quarter)) => {
                    let us = us_per_quarter.as_int();
                    tempo_bpm = (60_000_000 + us / 2) / us;
                }
                TrackEventKind::Midi { message, .. } => match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        sounding
                            .entry(key.as_int())
                            .or_default()
                            .push((tick, vel.as_int()));
                    }
                    MidiMessage::NoteOff { key, .. } | MidiMessage::NoteOn { key, .. } => {
                        let queue = sounding.entry(key.as_int()).or_default();
                        if !queue.is_empty() {
                            let (onset, velocity) = queue.remove(0);
                            events.push(NoteEvent {
                                onset_ticks: onset,
                                pitch: key.as_int(),
                                duration_ticks: tick - onset,
                                velocity,
                            });
                        }
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }

    events.sort_by(|a, b| a.onset_ticks.cmp(&b.onset_ticks).then(a.pitch.cmp(&b.pitch)));
    Ok(DecodedTimeline { tempo_bpm, events })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::genome::{Gene, NoteDuration, DEFAULT_VELOCITY};
    use crate::theory::{Key, ScaleKind};

    fn gene(pitch: GenePitch, duration: NoteDuration) -> Gene {
        Gene {
            pitch,
            duration,
            velocity: DEFAULT_VELOCITY,
        }
    }

    #[test]
    fn slot_arithmetic_is_bar_aligned() {
        assert_eq!(slot_onset_ticks(0, 4), 0);
        assert_eq!(slot_onset_ticks(1, 4), 480);
        assert_eq!(slot_onset_ticks(4, 4), 1920); // second bar
        assert_eq!(slot_onset_ticks(5, 4), 2400);
    }

    #[test]
    fn encode_emits_tempo_and_melody_tracks() {
        let scale = Scale::new(Key::C, ScaleKind::Major);
        let genome = vec![
            gene(GenePitch::Degree(0), NoteDuration::Full),
            gene(GenePitch::Rest, NoteDuration::Full),
            gene(GenePitch::Degree(4), NoteDuration::Half),
            gene(GenePitch::Degree(2), NoteDuration::Full),
        ];
        let bytes = encode(&genome, &scale, 120, 4).unwrap();

        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.tracks.len(), 2);
    }

    #[test]
    fn rest_advances_time_without_events() {
        let scale = Scale::new(Key::C, ScaleKind::Major);
        let genome = vec![
            gene(GenePitch::Degree(0), NoteDuration::Full),
            gene(GenePitch::Rest, NoteDuration::Full),
            gene(GenePitch::Degree(0), NoteDuration::Full),
        ];
        let bytes = encode(&genome, &scale, 120, 4).unwrap();
        let timeline = decode(&bytes).unwrap();

        assert_eq!(timeline.events.len(), 2);
        assert_eq!(timeline.events[0].onset_ticks, 0);
        // Slot 1 is silent; the second note starts at slot 2.
        assert_eq!(timeline.events[1].onset_ticks, 960);
    }

    #[test]
    fn tempo_survives_the_round_trip() {
        let scale = Scale::new(Key::A, ScaleKind::Minor);
        let genome = vec![gene(GenePitch::Degree(3), NoteDuration::Full)];
        for bpm in [60, 120, 128, 240] {
            let bytes = encode(&genome, &scale, bpm, 4).unwrap();
            assert_eq!(decode(&bytes).unwrap().tempo_bpm, bpm);
        }
    }
}

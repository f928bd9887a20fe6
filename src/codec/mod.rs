pub mod midi;

pub use midi::{
    decode, encode, slot_onset_ticks, slot_ticks, DecodedTimeline, NoteEvent, TICKS_PER_QUARTER,
};

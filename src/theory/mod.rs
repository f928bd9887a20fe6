pub mod scale;

pub use scale::{Key, Scale, ScaleKind};

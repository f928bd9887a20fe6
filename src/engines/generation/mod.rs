pub mod evolution_engine;
pub mod genome;
pub mod operators;

pub use evolution_engine::{Individual, SteadyStateEngine};
pub use genome::{Gene, GenePitch, Genome, NoteDuration};

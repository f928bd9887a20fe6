//! Population initialization, selection, crossover and mutation.
//!
//! All operators are pure functions of their inputs and an independent
//! random source; they never read session state.

use crate::engines::generation::genome::{Gene, GenePitch, Genome, NoteDuration, DEFAULT_VELOCITY};
use crate::theory::Scale;
use rand::seq::SliceRandom;
use rand::Rng;

/// Draw a single constraint-satisfying gene.
fn random_gene<R: Rng>(scale: &Scale, rest_probability: f64, rng: &mut R) -> Gene {
    let pitch = if rest_probability > 0.0 && rng.gen::<f64>() < rest_probability {
        GenePitch::Rest
    } else {
        GenePitch::Degree(rng.gen_range(0..scale.degree_span()) as u8)
    };
    let duration = *NoteDuration::ALL
        .choose(rng)
        .unwrap_or(&NoteDuration::Full);
    Gene {
        pitch,
        duration,
        velocity: DEFAULT_VELOCITY,
    }
}

/// Generate a random genome of the given fixed length.
pub fn random_genome<R: Rng>(
    length: usize,
    scale: &Scale,
    rest_probability: f64,
    rng: &mut R,
) -> Genome {
    (0..length)
        .map(|_| random_gene(scale, rest_probability, rng))
        .collect()
}

/// Seed a first generation. Runs exactly once per session.
pub fn seed_population<R: Rng>(
    size: usize,
    genome_length: usize,
    scale: &Scale,
    rest_probability: f64,
    rng: &mut R,
) -> Vec<Genome> {
    (0..size)
        .map(|_| random_genome(genome_length, scale, rest_probability, rng))
        .collect()
}

/// Roulette wheel selection over `(index, fitness)` pairs: probability
/// proportional to fitness. A non-positive total falls back to a uniform
/// pick.
pub fn roulette_selection<R: Rng>(rated: &[(usize, f64)], rng: &mut R) -> usize {
    let total_fitness: f64 = rated.iter().map(|(_, f)| f.max(0.0)).sum();

    if total_fitness <= 0.0 {
        return rated[rng.gen_range(0..rated.len())].0;
    }

    let mut spin = rng.gen::<f64>() * total_fitness;

    for (idx, fitness) in rated {
        spin -= fitness.max(0.0);
        if spin <= 0.0 {
            return *idx;
        }
    }

    rated[rated.len() - 1].0
}

/// Bar-aligned crossover: recombine two equal-length parents at one or two
/// cut points that never split a bar. With fewer than two bars there is no
/// interior boundary and the operator degrades to cloning the first parent.
pub fn bar_crossover<R: Rng>(
    parent_a: &Genome,
    parent_b: &Genome,
    notes_per_bar: usize,
    rng: &mut R,
) -> Genome {
    let len = parent_a.len();
    let bars = len / notes_per_bar;
    if bars < 2 || parent_b.len() != len {
        return parent_a.clone();
    }

    let two_cuts = bars >= 3 && rng.gen_bool(0.5);

    let mut child = parent_a.clone();
    if two_cuts {
        let first = rng.gen_range(1..bars - 1);
        let second = rng.gen_range(first + 1..bars);
        let (lo, hi) = (first * notes_per_bar, second * notes_per_bar);
        child[lo..hi].copy_from_slice(&parent_b[lo..hi]);
    } else {
        let cut = rng.gen_range(1..bars) * notes_per_bar;
        child[cut..].copy_from_slice(&parent_b[cut..]);
    }

    child
}

/// Which gene aspect a mutation resamples.
#[derive(Clone, Copy)]
enum MutationKind {
    Pitch,
    RestToggle,
    Duration,
}

/// Mutate genes in place with a per-gene probability. Never changes genome
/// length and never produces an out-of-scale pitch.
pub fn mutate<R: Rng>(
    genome: &mut Genome,
    scale: &Scale,
    mutation_rate: f64,
    pauses: bool,
    rng: &mut R,
) {
    let kinds: &[MutationKind] = if pauses {
        &[MutationKind::Pitch, MutationKind::RestToggle, MutationKind::Duration]
    } else {
        &[MutationKind::Pitch, MutationKind::Duration]
    };

    let span = scale.degree_span();

    for gene in genome.iter_mut() {
        if rng.gen::<f64>() >= mutation_rate {
            continue;
        }

        match *kinds.choose(rng).unwrap_or(&MutationKind::Pitch) {
            MutationKind::Pitch => match gene.pitch {
                GenePitch::Degree(degree) => {
                    // Jitter within +-2 scale degrees, clamped to the span.
                    let jitter = rng.gen_range(-2i32..=2);
                    let shifted = (degree as i32 + jitter).clamp(0, span as i32 - 1);
                    gene.pitch = GenePitch::Degree(shifted as u8);
                }
                GenePitch::Rest => {
                    gene.pitch = GenePitch::Degree(rng.gen_range(0..span) as u8);
                }
            },
            MutationKind::RestToggle => {
                gene.pitch = match gene.pitch {
                    GenePitch::Rest => GenePitch::Degree(rng.gen_range(0..span) as u8),
                    GenePitch::Degree(_) => GenePitch::Rest,
                };
            }
            MutationKind::Duration => {
                gene.duration = *NoteDuration::ALL
                    .choose(rng)
                    .unwrap_or(&NoteDuration::Full);
            }
        }
    }
}

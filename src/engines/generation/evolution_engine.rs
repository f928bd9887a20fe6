//! Steady-state evolutionary engine.
//!
//! Fitness arrives one scalar at a time from a human listener, so the loop
//! is steady-state: each round rates the single showcase genome, selects two
//! parents, breeds `steps` offspring, and replaces the worst population
//! member. The first offspring of the round becomes the next showcase.

use crate::config::GenerationConfig;
use crate::engines::generation::genome::{validate_genome, Genome};
use crate::engines::generation::operators::{
    bar_crossover, mutate, roulette_selection, seed_population,
};
use crate::error::Result;
use crate::theory::Scale;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

/// One population member. `fitness` is `None` until the genome has been
/// showcased and rated; `inserted_at` orders members by age for replacement
/// tie-breaks.
#[derive(Debug, Clone)]
pub struct Individual {
    pub genome: Genome,
    pub fitness: Option<f64>,
    inserted_at: u64,
}

pub struct SteadyStateEngine {
    scale: Scale,
    genome_len: usize,
    notes_per_bar: usize,
    mutation_rate: f64,
    pauses: bool,
    steps: usize,
    population: Vec<Individual>,
    showcase: usize,
    generation: u64,
    insert_seq: u64,
    rng: StdRng,
}

impl SteadyStateEngine {
    /// Build an engine and seed its population. The config must already be
    /// validated. The generation-0 showcase is the first seeded member.
    pub fn new(config: &GenerationConfig) -> Self {
        let scale = Scale::new(config.key, config.scale);
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let genome_len = config.genome_len();
        let rest_probability = if config.pauses {
            config.rest_probability
        } else {
            0.0
        };

        let genomes = seed_population(
            config.population,
            genome_len,
            &scale,
            rest_probability,
            &mut rng,
        );
        let population: Vec<Individual> = genomes
            .into_iter()
            .enumerate()
            .map(|(i, genome)| Individual {
                genome,
                fitness: None,
                inserted_at: i as u64,
            })
            .collect();
        let insert_seq = population.len() as u64;

        Self {
            scale,
            genome_len,
            notes_per_bar: config.notes_per_bar,
            mutation_rate: config.mutation_rate,
            pauses: config.pauses,
            steps: config.steps,
            population,
            showcase: 0,
            generation: 0,
            insert_seq,
            rng,
        }
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn showcase_genome(&self) -> &Genome {
        &self.population[self.showcase].genome
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Highest fitness recorded in the current population, if any member has
    /// been rated.
    pub fn max_fitness(&self) -> Option<f64> {
        self.population
            .iter()
            .filter_map(|ind| ind.fitness)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    }

    /// Run one evolutionary round for a rating of the current showcase.
    ///
    /// On any failure the population, showcase and generation counter are
    /// left exactly as they were.
    pub fn rate_and_advance(&mut self, score: f64) -> Result<()> {
        let previous_fitness = self.population[self.showcase].fitness;
        self.population[self.showcase].fitness = Some(score);

        let (parent_a, parent_b) = self.select_parents();

        let mut offspring: Vec<Genome> = Vec::with_capacity(self.steps);
        for _ in 0..self.steps {
            let mut child = bar_crossover(
                &self.population[parent_a].genome,
                &self.population[parent_b].genome,
                self.notes_per_bar,
                &mut self.rng,
            );
            mutate(
                &mut child,
                &self.scale,
                self.mutation_rate,
                self.pauses,
                &mut self.rng,
            );
            if let Err(e) = validate_genome(&child, &self.scale, self.genome_len) {
                self.population[self.showcase].fitness = previous_fitness;
                log::error!("variation produced an invalid genome: {e}");
                return Err(e);
            }
            offspring.push(child);
        }

        // Commit point: nothing below can fail.
        let worst = self.worst_index();
        let mut offspring = offspring.into_iter();
        if let Some(first) = offspring.next() {
            self.population[worst] = Individual {
                genome: first,
                fitness: None,
                inserted_at: self.next_seq(),
            };
            self.showcase = worst;
        }
        for extra in offspring {
            let inserted_at = self.next_seq();
            self.population.push(Individual {
                genome: extra,
                fitness: None,
                inserted_at,
            });
        }

        self.generation += 1;
        log::debug!(
            "round complete: generation {}, population {}, max fitness {:?}",
            self.generation,
            self.population.len(),
            self.max_fitness()
        );
        Ok(())
    }

    /// Fitness-proportionate selection over rated members; with fewer than
    /// two rated members, uniform selection over the whole population. A
    /// population of one selects itself twice and reproduction degrades to
    /// mutation-only cloning.
    fn select_parents(&mut self) -> (usize, usize) {
        let rated: Vec<(usize, f64)> = self
            .population
            .iter()
            .enumerate()
            .filter_map(|(i, ind)| ind.fitness.map(|f| (i, f)))
            .collect();

        if rated.len() >= 2 {
            (
                roulette_selection(&rated, &mut self.rng),
                roulette_selection(&rated, &mut self.rng),
            )
        } else {
            let n = self.population.len();
            (self.rng.gen_range(0..n), self.rng.gen_range(0..n))
        }
    }

    /// Index of the member the next offspring replaces: lowest known
    /// fitness, with unrated members below every rating and ties broken by
    /// oldest insertion.
    fn worst_index(&self) -> usize {
        self.population
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let fa = a.fitness.unwrap_or(f64::NEG_INFINITY);
                let fb = b.fitness.unwrap_or(f64::NEG_INFINITY);
                fa.partial_cmp(&fb)
                    .unwrap_or(Ordering::Equal)
                    .then(a.inserted_at.cmp(&b.inserted_at))
            })
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.insert_seq;
        self.insert_seq += 1;
        seq
    }
}

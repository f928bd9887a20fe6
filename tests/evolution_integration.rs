use melodygen::engines::generation::genome::validate_genome;
use melodygen::engines::generation::{GenePitch, SteadyStateEngine};
use melodygen::theory::{Key, Scale, ScaleKind};
use melodygen::GenerationConfig;

fn base_config() -> GenerationConfig {
    GenerationConfig {
        key: Key::C,
        scale: ScaleKind::Major,
        bars: 4,
        notes_per_bar: 4,
        tempo: 120,
        population: 10,
        steps: 1,
        pauses: false,
        seed: Some(42),
        ..GenerationConfig::default()
    }
}

#[test]
fn every_generation_keeps_the_fixed_genome_length() {
    let mut engine = SteadyStateEngine::new(&base_config());

    for round in 0..30 {
        engine.rate_and_advance((round % 6) as f64).unwrap();
        for ind in engine.population() {
            assert_eq!(ind.genome.len(), 16);
        }
    }
}

#[test]
fn every_pitch_stays_in_scale_across_generations() {
    for kind in [ScaleKind::Major, ScaleKind::MinorBlues, ScaleKind::Phrygian] {
        let config = GenerationConfig {
            scale: kind,
            pauses: true,
            ..base_config()
        };
        let scale = Scale::new(config.key, config.scale);
        let mut engine = SteadyStateEngine::new(&config);

        for round in 0..20 {
            engine.rate_and_advance((round % 6) as f64).unwrap();
            for ind in engine.population() {
                validate_genome(&ind.genome, &scale, 16).unwrap();
                for gene in &ind.genome {
                    if let GenePitch::Degree(d) = gene.pitch {
                        assert!(scale.contains(scale.degree_to_midi(d)));
                    }
                }
            }
        }
    }
}

#[test]
fn c_major_no_pauses_scenario() {
    let config = base_config();
    let scale = Scale::new(config.key, config.scale);
    let engine = SteadyStateEngine::new(&config);

    let showcase = engine.showcase_genome();
    assert_eq!(showcase.len(), 16);
    let major_pitch_classes = [0u8, 2, 4, 5, 7, 9, 11];
    for gene in showcase {
        match gene.pitch {
            GenePitch::Rest => panic!("pauses disabled but genome contains a rest"),
            GenePitch::Degree(d) => {
                let pc = scale.degree_to_midi(d) % 12;
                assert!(
                    major_pitch_classes.contains(&pc),
                    "pitch class {pc} not in C major"
                );
            }
        }
    }
}

#[test]
fn top_ratings_never_lower_the_population_maximum() {
    let mut engine = SteadyStateEngine::new(&base_config());
    let mut previous_max = f64::NEG_INFINITY;

    for round in 0..3 {
        engine.rate_and_advance(5.0).unwrap();
        assert_eq!(engine.generation(), round + 1);
        let max = engine.max_fitness().unwrap();
        assert!(
            max >= previous_max,
            "max fitness dropped from {previous_max} to {max}"
        );
        previous_max = max;
    }
    assert_eq!(previous_max, 5.0);
}

#[test]
fn identical_seeds_reproduce_the_run() {
    let make = || {
        let mut engine = SteadyStateEngine::new(&base_config());
        for score in [3.0, 5.0, 1.0, 4.0] {
            engine.rate_and_advance(score).unwrap();
        }
        engine.showcase_genome().clone()
    };
    assert_eq!(make(), make());
}

#[test]
fn steps_insert_extra_members_per_round() {
    let config = GenerationConfig {
        steps: 4,
        population: 6,
        ..base_config()
    };
    let mut engine = SteadyStateEngine::new(&config);
    engine.rate_and_advance(5.0).unwrap();
    assert_eq!(engine.population().len(), 9);
    assert_eq!(engine.generation(), 1);
}

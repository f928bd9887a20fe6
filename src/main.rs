//! Interactive rating loop: writes each candidate to a .mid file, reads a
//! 0-5 rating from stdin, and submits it for the next candidate.

use anyhow::{bail, Context};
use melodygen::{GenerationConfig, SessionStore};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = parse_args(std::env::args().skip(1))?;
    let store = SessionStore::new();

    let out_dir = PathBuf::from(format!("out/{}", chrono::Utc::now().timestamp()));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut current = store.create(config)?;
    let stdin = io::stdin();

    loop {
        let path = out_dir.join(format!("candidate-{}.mid", current.generation));
        std::fs::write(&path, &current.midi)?;
        println!(
            "generation {} -> {} (candidate {})",
            current.generation,
            path.display(),
            current.candidate_id
        );

        print!("Rating (0-5, empty to quit): ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let rating: i64 = match line.parse() {
            Ok(r) => r,
            Err(_) => {
                println!("please enter a whole number between 0 and 5");
                continue;
            }
        };

        match store.rate(current.session_id, current.candidate_id, rating) {
            Ok(next) => current = next,
            Err(e) => println!("rating rejected: {e}"),
        }
    }

    store.destroy(current.session_id)?;
    Ok(())
}

/// Parse `name=value` overrides of the default config, e.g.
/// `key=D scale=dorian bars=4 tempo=100 pauses=false seed=42`.
fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<GenerationConfig> {
    let mut config = GenerationConfig::default();

    for arg in args {
        let Some((name, value)) = arg.split_once('=') else {
            bail!("expected name=value, got {arg:?}");
        };
        match name {
            "key" => config.key = value.parse()?,
            "scale" => config.scale = value.parse()?,
            "bars" => config.bars = value.parse()?,
            "notes_per_bar" => config.notes_per_bar = value.parse()?,
            "tempo" => config.tempo = value.parse()?,
            "population" => config.population = value.parse()?,
            "steps" => config.steps = value.parse()?,
            "pauses" => config.pauses = value.parse()?,
            "mutation_rate" => config.mutation_rate = value.parse()?,
            "rest_probability" => config.rest_probability = value.parse()?,
            "seed" => config.seed = Some(value.parse()?),
            other => bail!("unknown option {other:?}"),
        }
    }

    config.validate()?;
    Ok(config)
}

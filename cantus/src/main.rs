// Cantus CLI entry point.
//
// Generates a score from a JSON configuration (or the built-in demo) and
// prints each part's automaton and note/rest statistics.
//
// Usage:
//   cargo run -p cantus -- [config.json] [--seed N] [--quiet]
//
// --seed N overrides every part's seed (part index is added so parts
// still differ from each other). --quiet suppresses the grid renderings.

use cantus::config::ScoreConfig;
use cantus::score::compose_score;
use std::path::Path;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let config_path = args.get(1).filter(|s| !s.starts_with("--")).cloned();
    let seed_override: Option<u64> = parse_flag(&args, "--seed");
    let quiet = args.iter().any(|a| a == "--quiet");

    println!("=== Cantus ===");

    // Load configuration
    println!("[1/3] Loading configuration...");
    let mut config = match &config_path {
        Some(path) => match ScoreConfig::load(Path::new(path)) {
            Ok(config) => {
                println!("  Loaded {path}.");
                config
            }
            Err(e) => {
                eprintln!("  Error loading {path}: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("  No configuration given; using the built-in demo.");
            ScoreConfig::demo()
        }
    };

    if let Some(base) = seed_override {
        for (i, part) in config.parts.iter_mut().enumerate() {
            part.seed = Some(base.wrapping_add(i as u64));
        }
        println!("  Seed override: {base}");
    }

    // Generate
    println!("[2/3] Composing {} part(s)...", config.parts.len());
    let score = match compose_score(&config) {
        Ok(score) => score,
        Err(e) => {
            eprintln!("  Error: {e}");
            std::process::exit(1);
        }
    };

    for part in &score.parts {
        let stats = part.grid.stats();
        println!(
            "  {}: {} states, {}x{} grid, {} live cells",
            part.name,
            part.grid.num_states(),
            stats.generations,
            stats.length,
            stats.live
        );
        if !quiet {
            print!("{}", part.grid.summary());
        }
    }

    // Report
    println!("[3/3] Score: \"{}\" by {}", score.title, score.composer);
    println!("  Tempo: {} BPM", score.tempo_bpm);
    for part in &score.parts {
        let quarters = part.duration_quarters();
        let seconds = quarters * 60.0 / f64::from(score.tempo_bpm);
        println!(
            "  * {}: {} notes, {} rests, {:.1} quarter notes (~{:.0}s)",
            part.name,
            part.note_count(),
            part.rest_count(),
            quarters,
            seconds
        );
    }
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

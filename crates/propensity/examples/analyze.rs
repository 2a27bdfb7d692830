//! Example: Rank the questions of a survey export by predictive power.
//!
//! Usage:
//!   cargo run --example analyze -- <file_path> [config.json]
//!
//! Without a config file, target questions are detected from the headers.

use std::env;
use std::path::Path;

use propensity::{KeywordCategorizer, Propensity, PropensityConfig};

fn main() -> propensity::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example analyze -- <file_path> [config.json]");
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    if !path.exists() {
        eprintln!("Error: File not found: {}", path.display());
        std::process::exit(1);
    }

    let config = match args.get(2) {
        Some(config_path) => PropensityConfig::from_json_file(config_path)?,
        None => PropensityConfig::default(),
    };

    let report = Propensity::with_config(config)
        .with_categorizer(KeywordCategorizer::new())
        .analyze_file(path)?;

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("Propensity Analysis: {}", path.display());
    println!("{}", separator);
    println!();

    if let Some(source) = &report.source {
        println!("## Source");
        println!("  Format: {}", source.format);
        println!("  Rows: {}", source.row_count);
        println!("  Columns: {}", source.column_count);
        println!();
    }

    println!("## Targets");
    for (name, weight) in &report.target_weights {
        println!("  {:40} weight={:.2}", name, weight);
    }
    println!();

    println!(
        "## Respondents: {} scored, {} skipped ({:?})",
        report.respondent_count,
        report.skipped_rows.len(),
        report.status
    );
    println!();

    for (bucket, predictors) in report.predictors_by_bucket() {
        println!("## {} ({})", bucket, predictors.len());
        for p in predictors.iter().take(5) {
            println!(
                "  r={:+.3} n={:<5} [{}] {}",
                p.correlation, p.sample_size, p.index, p.long_name
            );
        }
        println!();
    }

    println!("## Distribution");
    for (label, count) in &report.distribution.categories {
        println!("  {:28} {}", label, count);
    }
    println!();
    for (range, count) in &report.distribution.score_ranges {
        println!("  {:28} {}", range, count);
    }
    if let Some(avg) = report.distribution.average_score {
        println!("  Average score: {:.2}", avg);
    }
    println!("{}", separator);

    Ok(())
}

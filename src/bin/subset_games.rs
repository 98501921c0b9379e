//! Cut the full games table down to the games played after a cutoff and
//! save the result as Parquet.
//!
//! ```bash
//! subset_games --input data/scrabble_games.csv --output data/scrabble_201617.parquet
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use scrabble_drills::data::filter::subset_after;
use scrabble_drills::data::loader::load_file;
use scrabble_drills::data::writer::write_parquet;
use scrabble_drills::drills::{extract_years, parse_datetime, year_counts};

#[derive(Parser)]
#[command(name = "subset_games")]
#[command(about = "Keep only the games played after a cutoff", long_about = None)]
struct Cli {
    /// Full games table (.parquet, .csv or .json)
    #[arg(short, long)]
    input: PathBuf,

    /// Parquet file to write
    #[arg(short, long)]
    output: PathBuf,

    /// Keep games strictly after this moment (e.g. 2016, 2016-06-01)
    #[arg(long, default_value = "2016")]
    after: String,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let cutoff = parse_datetime(&cli.after)
        .with_context(|| format!("'{}' is not a date", cli.after))?;

    let full = load_file(&cli.input)?;
    let subset = subset_after(&full, cutoff)?;
    info!(
        "Kept {} of {} games played after {cutoff}",
        subset.len(),
        full.len()
    );

    write_parquet(&subset, &cli.output)?;

    for (year, count) in year_counts(&extract_years(&subset.dates())) {
        println!("{year}: {count}");
    }
    println!("Wrote {} games to {}", subset.len(), cli.output.display());
    Ok(())
}

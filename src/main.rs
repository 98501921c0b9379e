use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use scrabble_drills::data::loader::load_file;
use scrabble_drills::{Expectations, run_drills};

#[derive(Parser)]
#[command(name = "scrabble-drills")]
#[command(about = "Run the column drills over a Scrabble games table", long_about = None)]
struct Cli {
    /// Games table (.parquet, .csv or .json)
    #[arg(default_value = "data/scrabble_201617.parquet")]
    dataset: PathBuf,

    /// JSON file overriding the reference values
    #[arg(short, long)]
    expect: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let expectations = Expectations::load(cli.expect.as_deref())?;
    let dataset = load_file(&cli.dataset)?;

    let report = run_drills(&dataset, &expectations)
        .with_context(|| format!("drills over {}", cli.dataset.display()))?;
    info!("All drills passed");
    println!("{report}");
    Ok(())
}

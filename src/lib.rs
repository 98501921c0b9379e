//! Column derivation drills over a table of Scrabble game results.
//!
//! A dataset is loaded once ([`data::loader::load_file`]) and four pure
//! derivations run over it ([`drills`]); [`report::run_drills`] checks each
//! against [`config::Expectations`].

pub mod config;
pub mod data;
pub mod drills;
pub mod error;
pub mod report;

pub use config::Expectations;
pub use data::model::{Game, GameDataset, RatingColumn};
pub use error::DrillError;
pub use report::{DrillReport, run_drills};

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

/// Reference values the drills are checked against.
///
/// The defaults describe the 2016–2017 games subset. Any field left out of a
/// JSON override keeps its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Expectations {
    /// Quantile of `loseroldrating` used as the classification threshold.
    pub quantile: f64,
    /// Number of games whose loser rating is at or above the threshold.
    pub loser_rating_at_or_above: usize,
    /// Sum of `winneroldrating - loseroldrating` over every game.
    pub rating_difference_total: f64,
    /// Games per year, checked only when present.
    pub year_counts: Option<BTreeMap<String, usize>>,
}

impl Default for Expectations {
    fn default() -> Self {
        Self {
            quantile: 0.95,
            loser_rating_at_or_above: 2379,
            rating_difference_total: 4_093_066.0,
            year_counts: None,
        }
    }
}

impl Expectations {
    /// Read an override file; `None` gives the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading expectations from {}", path.display()))?;
        let expectations: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing expectations in {}", path.display()))?;
        info!("Using expectations from {}", path.display());
        Ok(expectations)
    }
}

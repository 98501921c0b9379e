use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use log::{debug, info};

use crate::config::Expectations;
use crate::data::model::{GameDataset, RatingColumn};
use crate::drills::{
    YEAR_WIDTH, classify_at_or_above, extract_years, pairwise_difference, percentile,
    to_datetimes, year_counts,
};
use crate::error::{DrillError, Result};

/// Largest gap tolerated between the computed and expected difference total.
const TOTAL_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DrillReport – what a passing run found
// ---------------------------------------------------------------------------

/// Outcome of a run where every check passed.
#[derive(Debug, Clone, PartialEq)]
pub struct DrillReport {
    pub games: usize,
    pub year_counts: BTreeMap<String, usize>,
    /// Earliest and latest converted date/time.
    pub date_range: Option<(NaiveDateTime, NaiveDateTime)>,
    pub quantile: f64,
    pub threshold: f64,
    pub at_or_above: usize,
    pub rating_difference_total: f64,
}

impl fmt::Display for DrillReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Games loaded: {}", self.games)?;
        writeln!(f)?;
        writeln!(f, "Games per year:")?;
        for (year, count) in &self.year_counts {
            writeln!(f, "  {year}: {count}")?;
        }
        writeln!(f, "Correct. The year list matches the loop-built reference.")?;
        writeln!(f)?;
        if let Some((first, last)) = self.date_range {
            writeln!(f, "Dates span {first} to {last}")?;
        }
        writeln!(f, "Correct. All of the dates are now date/time values.")?;
        writeln!(f)?;
        writeln!(
            f,
            "The {} quantile of loser ratings is {}",
            self.quantile, self.threshold
        )?;
        writeln!(
            f,
            "{} games have a loser rating at or above it",
            self.at_or_above
        )?;
        writeln!(f, "Correct")?;
        writeln!(f)?;
        writeln!(
            f,
            "Total winner - loser rating difference: {}",
            self.rating_difference_total
        )?;
        write!(f, "Correct! Nice job.")
    }
}

// ---------------------------------------------------------------------------
// Running the drills
// ---------------------------------------------------------------------------

fn mismatch(
    drill: &'static str,
    expected: impl fmt::Display,
    actual: impl fmt::Display,
) -> DrillError {
    DrillError::Mismatch {
        drill,
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// Run all four drills over the dataset and check each one.
///
/// Stops at the first failure.
pub fn run_drills(dataset: &GameDataset, expected: &Expectations) -> Result<DrillReport> {
    let dates = dataset.dates();

    // -- datetimes -- (first, so a bad date surfaces as an input error)
    let datetimes = to_datetimes(&dates)?;
    if datetimes.len() != dates.len() {
        return Err(mismatch("datetime conversion length", dates.len(), datetimes.len()));
    }
    let date_range = datetimes
        .iter()
        .min()
        .zip(datetimes.iter().max())
        .map(|(first, last)| (*first, *last));
    debug!("Datetime conversion passed over {} games", datetimes.len());

    // -- years --
    let years = extract_years(&dates);
    let mut reference = Vec::with_capacity(dates.len());
    for date in &dates {
        reference.push(date.chars().take(YEAR_WIDTH).collect::<String>());
    }
    if years.len() != reference.len() {
        return Err(mismatch("year extraction length", reference.len(), years.len()));
    }
    if let Some(row) = years.iter().zip(&reference).position(|(a, b)| a != b) {
        return Err(mismatch("year extraction", &reference[row], &years[row]));
    }
    let counts = year_counts(&years);
    if let Some(want) = &expected.year_counts {
        if *want != counts {
            return Err(mismatch("games per year", format!("{want:?}"), format!("{counts:?}")));
        }
    }
    debug!("Year extraction passed over {} games", years.len());

    // -- threshold --
    let loser_ratings = dataset.ratings(RatingColumn::LoserOld);
    let threshold = percentile(&loser_ratings, expected.quantile)?;
    let flags = classify_at_or_above(&loser_ratings, threshold);
    let at_or_above = flags.iter().filter(|&&flag| flag).count();
    info!(
        "Quantile {} of {} is {threshold}; {at_or_above} games at or above",
        expected.quantile,
        RatingColumn::LoserOld.name()
    );
    if at_or_above != expected.loser_rating_at_or_above {
        return Err(mismatch(
            "threshold classification",
            expected.loser_rating_at_or_above,
            at_or_above,
        ));
    }

    // -- difference --
    let winners = dataset.required_ratings(RatingColumn::WinnerOld)?;
    let losers = dataset.required_ratings(RatingColumn::LoserOld)?;
    let differences = pairwise_difference(&winners, &losers);
    let total: f64 = differences.iter().sum();
    info!("Rating difference total over {} pairs is {total}", differences.len());
    if (total - expected.rating_difference_total).abs() > TOTAL_TOLERANCE {
        return Err(mismatch(
            "pairwise difference total",
            expected.rating_difference_total,
            total,
        ));
    }

    Ok(DrillReport {
        games: dataset.len(),
        year_counts: counts,
        date_range,
        quantile: expected.quantile,
        threshold,
        at_or_above,
        rating_difference_total: total,
    })
}

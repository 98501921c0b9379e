//! The four column derivations and the statistics they lean on.
//!
//! Every function here is pure: same input, same output, and the input is
//! never modified.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{DrillError, Result};

/// Number of leading characters of a date string that make up its year.
pub const YEAR_WIDTH: usize = 4;

// ---------------------------------------------------------------------------
// Year extraction
// ---------------------------------------------------------------------------

/// The first [`YEAR_WIDTH`] characters of a date string. Shorter strings are
/// returned whole.
pub fn year_of(date: &str) -> &str {
    match date.char_indices().nth(YEAR_WIDTH) {
        Some((end, _)) => &date[..end],
        None => date,
    }
}

/// Year prefix of every date, in order.
pub fn extract_years<S: AsRef<str>>(dates: &[S]) -> Vec<String> {
    dates.iter().map(|d| year_of(d.as_ref()).to_string()).collect()
}

/// Games per year, sorted by year.
pub fn year_counts<S: AsRef<str>>(years: &[S]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for year in years {
        *counts.entry(year.as_ref().to_string()).or_insert(0) += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Datetime conversion
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a date string into a date/time. Dates without a time part land on
/// midnight, a bare year on January 1st, and offsets are converted to UTC.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    if s.len() == YEAR_WIDTH && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = s.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0);
    }
    None
}

/// Convert every date string, stopping at the first one that won't parse.
pub fn to_datetimes<S: AsRef<str>>(dates: &[S]) -> Result<Vec<NaiveDateTime>> {
    dates
        .iter()
        .enumerate()
        .map(|(row, d)| {
            parse_datetime(d.as_ref()).ok_or_else(|| DrillError::UnparseableDate {
                row,
                value: d.as_ref().to_string(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Percentile + threshold classification
// ---------------------------------------------------------------------------

/// Linear-interpolation percentile over the present values of a column.
///
/// With the present values sorted as `v` and `h = (n - 1) * q`, the result is
/// `v[floor(h)] + (h - floor(h)) * (v[floor(h) + 1] - v[floor(h)])`.
/// Missing and NaN cells are skipped.
pub fn percentile(values: &[Option<f64>], q: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(DrillError::InvalidQuantile(q));
    }
    let mut sorted: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| !v.is_nan())
        .collect();
    if sorted.is_empty() {
        return Err(DrillError::NoValues);
    }
    sorted.sort_by(f64::total_cmp);

    let rank = (sorted.len() - 1) as f64 * q;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = rank - lower as f64;
    Ok(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// Whether a rating sits at or above the threshold. Missing ratings never do.
pub fn is_at_or_above(rating: Option<f64>, threshold: f64) -> bool {
    matches!(rating, Some(r) if r >= threshold)
}

/// Classify every rating against the threshold, in order.
pub fn classify_at_or_above(ratings: &[Option<f64>], threshold: f64) -> Vec<bool> {
    ratings
        .iter()
        .map(|&r| is_at_or_above(r, threshold))
        .collect()
}

// ---------------------------------------------------------------------------
// Pairwise difference
// ---------------------------------------------------------------------------

/// `winners[i] - losers[i]` for each position both sequences share.
///
/// Pairing is by index only. When the inputs differ in length the result
/// stops at the shorter one; the surplus of the longer input is ignored.
pub fn pairwise_difference(winners: &[f64], losers: &[f64]) -> Vec<f64> {
    winners
        .iter()
        .zip(losers)
        .map(|(w, l)| w - l)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn test_year_of() {
        assert_eq!(year_of("2016-01-02"), "2016");
        assert_eq!(year_of("2017-12-31 23:59:59"), "2017");
        assert_eq!(year_of("201"), "201");
        assert_eq!(year_of(""), "");
        assert_eq!(year_of("éèàç-01"), "éèàç");
    }

    #[test]
    fn test_extract_years_preserves_order_and_length() {
        let dates = vec!["2017-01-01", "2016-05-05", "2016-06-06"];
        let years = extract_years(&dates);

        assert_eq!(years, vec!["2017", "2016", "2016"]);
        for (year, date) in years.iter().zip(&dates) {
            assert_eq!(year.as_str(), &date[..4]);
        }
    }

    #[test]
    fn test_year_counts() {
        let counts = year_counts(&["2017", "2016", "2016"]);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["2016"], 2);
        assert_eq!(counts["2017"], 1);
        assert_eq!(counts.keys().next().map(String::as_str), Some("2016"));
    }

    #[test]
    fn test_empty_inputs_give_empty_outputs() {
        let none: Vec<&str> = Vec::new();
        assert!(extract_years(&none).is_empty());
        assert!(to_datetimes(&none).unwrap().is_empty());
        assert!(year_counts(&none).is_empty());
        assert!(classify_at_or_above(&[], 1.0).is_empty());
        assert!(pairwise_difference(&[], &[]).is_empty());
    }

    #[test]
    fn test_parse_datetime_layouts() {
        let midnight = |y, m, d| {
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };

        assert_eq!(parse_datetime("2016-01-02"), Some(midnight(2016, 1, 2)));
        assert_eq!(parse_datetime("2016/01/02"), Some(midnight(2016, 1, 2)));
        assert_eq!(parse_datetime("01/02/2016"), Some(midnight(2016, 1, 2)));
        assert_eq!(parse_datetime("2016"), Some(midnight(2016, 1, 1)));

        let with_time = parse_datetime("2016-01-02 13:45:10").unwrap();
        assert_eq!((with_time.hour(), with_time.minute(), with_time.second()), (13, 45, 10));

        let iso = parse_datetime("2016-01-02T13:45:10.500").unwrap();
        assert_eq!(iso.day(), 2);
        assert_eq!(iso.and_utc().timestamp_subsec_millis(), 500);

        let offset = parse_datetime("2016-01-02T01:00:00+02:00").unwrap();
        assert_eq!(offset, midnight(2016, 1, 1).with_hour(23).unwrap());

        assert_eq!(parse_datetime("not a date"), None);
        assert_eq!(parse_datetime("2016-13-01"), None);
    }

    #[test]
    fn test_to_datetimes_reports_first_bad_row() {
        let dates = ["2016-01-02", "2016-02-30", "garbage"];
        match to_datetimes(&dates) {
            Err(DrillError::UnparseableDate { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "2016-02-30");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_to_datetimes_same_length() {
        let dates = ["2016-01-02", "2017-03-04 10:00:00"];
        let converted = to_datetimes(&dates).unwrap();
        assert_eq!(converted.len(), dates.len());
        assert_eq!(converted[1].year(), 2017);
    }

    #[test]
    fn test_percentile_linear_interpolation() {
        let values = [Some(4.0), Some(1.0), Some(3.0), Some(2.0)];
        assert_eq!(percentile(&values, 0.5).unwrap(), 2.5);
        assert!((percentile(&values, 0.95).unwrap() - 3.85).abs() < 1e-12);
        assert_eq!(percentile(&values, 0.0).unwrap(), 1.0);
        assert_eq!(percentile(&values, 1.0).unwrap(), 4.0);
    }

    #[test]
    fn test_percentile_skips_missing() {
        let values = [Some(10.0), None, Some(20.0), Some(f64::NAN)];
        assert_eq!(percentile(&values, 0.5).unwrap(), 15.0);
        assert_eq!(percentile(&[Some(7.0)], 0.95).unwrap(), 7.0);
    }

    #[test]
    fn test_percentile_errors() {
        assert!(matches!(
            percentile(&[None, None], 0.5),
            Err(DrillError::NoValues)
        ));
        assert!(matches!(
            percentile(&[Some(1.0)], 1.5),
            Err(DrillError::InvalidQuantile(q)) if q == 1.5
        ));
    }

    #[test]
    fn test_classification_ties_are_true() {
        let ratings = [Some(1500.0), Some(1800.0), Some(1799.9), None, Some(2000.0)];
        let flags = classify_at_or_above(&ratings, 1800.0);

        assert_eq!(flags, vec![false, true, false, false, true]);
        assert_eq!(flags.iter().filter(|&&f| f).count(), 2);
    }

    #[test]
    fn test_classification_against_own_percentile() {
        let ratings: Vec<Option<f64>> = (1..=100).map(|r| Some(r as f64)).collect();
        let threshold = percentile(&ratings, 0.95).unwrap();
        let flags = classify_at_or_above(&ratings, threshold);

        // threshold is 95.05, so 96..=100 pass
        assert_eq!(flags.iter().filter(|&&f| f).count(), 5);
        for (flag, rating) in flags.iter().zip(&ratings) {
            assert_eq!(*flag, rating.unwrap() >= threshold);
        }
    }

    #[test]
    fn test_pairwise_difference() {
        let diff = pairwise_difference(&[1500.0, 1600.0, 1400.0], &[1400.0, 1650.0, 1400.0]);
        assert_eq!(diff, vec![100.0, -50.0, 0.0]);
        assert_eq!(diff.iter().sum::<f64>(), 50.0);
    }

    #[test]
    fn test_pairwise_difference_truncates_to_shorter() {
        assert_eq!(pairwise_difference(&[10.0, 20.0, 30.0], &[1.0]), vec![9.0]);
        assert_eq!(pairwise_difference(&[10.0], &[1.0, 2.0, 3.0]), vec![9.0]);
    }

    #[test]
    fn test_drills_are_idempotent() {
        let dates = ["2016-01-02", "2017-03-04"];
        let ratings = [Some(1.0), Some(5.0), Some(3.0)];

        assert_eq!(extract_years(&dates), extract_years(&dates));
        assert_eq!(to_datetimes(&dates).unwrap(), to_datetimes(&dates).unwrap());
        let t = percentile(&ratings, 0.95).unwrap();
        assert_eq!(t.to_bits(), percentile(&ratings, 0.95).unwrap().to_bits());
        assert_eq!(classify_at_or_above(&ratings, t), classify_at_or_above(&ratings, t));
    }
}

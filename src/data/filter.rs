use chrono::NaiveDateTime;

use super::model::GameDataset;
use crate::drills::parse_datetime;
use crate::error::{DrillError, Result};

// ---------------------------------------------------------------------------
// Date cutoff: which games were played strictly after a moment
// ---------------------------------------------------------------------------

/// Return indices of games played strictly after `cutoff`, in row order.
///
/// A date that does not parse is an error rather than a silent drop.
pub fn games_after(dataset: &GameDataset, cutoff: NaiveDateTime) -> Result<Vec<usize>> {
    let mut kept = Vec::new();
    for (row, game) in dataset.games.iter().enumerate() {
        let played = parse_datetime(&game.date).ok_or_else(|| DrillError::UnparseableDate {
            row,
            value: game.date.clone(),
        })?;
        if played > cutoff {
            kept.push(row);
        }
    }
    Ok(kept)
}

/// The games played strictly after `cutoff`.
pub fn subset_after(dataset: &GameDataset, cutoff: NaiveDateTime) -> Result<GameDataset> {
    let indices = games_after(dataset, cutoff)?;
    Ok(dataset.select(&indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{dataset, game};

    fn cutoff(s: &str) -> NaiveDateTime {
        parse_datetime(s).unwrap()
    }

    #[test]
    fn test_cutoff_is_strict() {
        let ds = dataset(vec![
            game("2015-12-31", None, None),
            game("2016-01-01", None, None),
            game("2016-01-01 00:00:01", None, None),
            game("2017-06-01", None, None),
            game("2014-01-01", None, None),
        ]);

        assert_eq!(games_after(&ds, cutoff("2016")).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_subset_keeps_rows_and_columns() {
        let ds = dataset(vec![
            game("2017-01-05", Some(1.0), Some(2.0)),
            game("2010-01-05", Some(3.0), Some(4.0)),
            game("2016-03-05", Some(5.0), Some(6.0)),
        ]);

        let subset = subset_after(&ds, cutoff("2016")).unwrap();
        assert_eq!(subset.dates(), vec!["2017-01-05", "2016-03-05"]);
        assert_eq!(subset.games[1].winner_old_rating, Some(5.0));
        assert_eq!(subset.column_names, ds.column_names);
    }

    #[test]
    fn test_bad_date_is_an_error() {
        let ds = dataset(vec![game("2017-01-05", None, None), game("n/a", None, None)]);
        assert!(matches!(
            games_after(&ds, cutoff("2016")),
            Err(DrillError::UnparseableDate { row: 1, .. })
        ));
    }
}

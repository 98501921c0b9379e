use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DrillError, Result};

pub const DATE_COLUMN: &str = "date";
pub const WINNER_OLD_RATING_COLUMN: &str = "winneroldrating";
pub const LOSER_OLD_RATING_COLUMN: &str = "loseroldrating";

/// Columns every dataset must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = [
    DATE_COLUMN,
    WINNER_OLD_RATING_COLUMN,
    LOSER_OLD_RATING_COLUMN,
];

// ---------------------------------------------------------------------------
// CellValue – a single cell in a column the drills don't read
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring common Pandas dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Native date/timestamp rendered as ISO-8601 text.
    Date(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Game – one row of the source table
// ---------------------------------------------------------------------------

/// A single game result.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    /// The `date` column as text.
    pub date: String,
    /// Winner's rating before the game.
    pub winner_old_rating: Option<f64>,
    /// Loser's rating before the game.
    pub loser_old_rating: Option<f64>,
    /// Every other column: column_name → value.
    pub extra: BTreeMap<String, CellValue>,
}

/// The two rating columns the drills read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingColumn {
    WinnerOld,
    LoserOld,
}

impl RatingColumn {
    pub fn name(self) -> &'static str {
        match self {
            RatingColumn::WinnerOld => WINNER_OLD_RATING_COLUMN,
            RatingColumn::LoserOld => LOSER_OLD_RATING_COLUMN,
        }
    }

    fn get(self, game: &Game) -> Option<f64> {
        match self {
            RatingColumn::WinnerOld => game.winner_old_rating,
            RatingColumn::LoserOld => game.loser_old_rating,
        }
    }
}

// ---------------------------------------------------------------------------
// GameDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset. Never mutated once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct GameDataset {
    /// All games (rows), in file order.
    pub games: Vec<Game>,
    /// Column names in source order, required columns included.
    pub column_names: Vec<String>,
}

impl GameDataset {
    pub fn new(games: Vec<Game>, column_names: Vec<String>) -> Self {
        GameDataset {
            games,
            column_names,
        }
    }

    /// Number of games.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// The `date` column, in row order.
    pub fn dates(&self) -> Vec<&str> {
        self.games.iter().map(|g| g.date.as_str()).collect()
    }

    /// A rating column with missing cells kept as `None`.
    pub fn ratings(&self, column: RatingColumn) -> Vec<Option<f64>> {
        self.games.iter().map(|g| column.get(g)).collect()
    }

    /// A rating column that must be complete; the first gap is an error.
    pub fn required_ratings(&self, column: RatingColumn) -> Result<Vec<f64>> {
        self.games
            .iter()
            .enumerate()
            .map(|(row, g)| {
                column.get(g).ok_or(DrillError::MissingRating {
                    column: column.name(),
                    row,
                })
            })
            .collect()
    }

    /// A new dataset holding the given rows, in the given order.
    pub fn select(&self, indices: &[usize]) -> GameDataset {
        GameDataset {
            games: indices
                .iter()
                .filter_map(|&i| self.games.get(i).cloned())
                .collect(),
            column_names: self.column_names.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn game(date: &str, winner: Option<f64>, loser: Option<f64>) -> Game {
        Game {
            date: date.to_string(),
            winner_old_rating: winner,
            loser_old_rating: loser,
            extra: BTreeMap::new(),
        }
    }

    pub(crate) fn dataset(games: Vec<Game>) -> GameDataset {
        GameDataset::new(
            games,
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        )
    }

    #[test]
    fn test_columns_in_row_order() {
        let ds = dataset(vec![
            game("2016-01-02", Some(1500.0), Some(1400.0)),
            game("2017-03-04", Some(1200.0), None),
        ]);

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dates(), vec!["2016-01-02", "2017-03-04"]);
        assert_eq!(
            ds.ratings(RatingColumn::LoserOld),
            vec![Some(1400.0), None]
        );
        assert_eq!(
            ds.ratings(RatingColumn::WinnerOld),
            vec![Some(1500.0), Some(1200.0)]
        );
    }

    #[test]
    fn test_required_ratings_reports_first_gap() {
        let ds = dataset(vec![
            game("2016-01-02", Some(1500.0), Some(1400.0)),
            game("2016-01-03", Some(1500.0), None),
            game("2016-01-04", Some(1500.0), None),
        ]);

        match ds.required_ratings(RatingColumn::LoserOld) {
            Err(DrillError::MissingRating { column, row }) => {
                assert_eq!(column, "loseroldrating");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(
            ds.required_ratings(RatingColumn::WinnerOld).unwrap(),
            vec![1500.0; 3]
        );
    }

    #[test]
    fn test_select_keeps_order_and_skips_out_of_range() {
        let ds = dataset(vec![
            game("2016-01-01", None, None),
            game("2016-01-02", None, None),
            game("2016-01-03", None, None),
        ]);

        let picked = ds.select(&[2, 0, 9]);
        assert_eq!(picked.dates(), vec!["2016-01-03", "2016-01-01"]);
        assert_eq!(picked.column_names, ds.column_names);
    }

    #[test]
    fn test_cell_value_as_f64() {
        assert_eq!(CellValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(CellValue::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(CellValue::String("x".into()).as_f64(), None);
        assert_eq!(CellValue::Null.to_string(), "<null>");
    }
}

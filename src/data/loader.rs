use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Date32Array, Date64Array, Float32Array,
    Float64Array, Int32Array, Int64Array, StringArray, TimestampMicrosecondArray,
    TimestampMillisecondArray, TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{DateTime, NaiveDateTime, NaiveTime};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{
    CellValue, DATE_COLUMN, Game, GameDataset, LOSER_OLD_RATING_COLUMN, REQUIRED_COLUMNS,
    WINNER_OLD_RATING_COLUMN,
};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a game dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per game (recommended, `df.to_parquet()`)
/// * `.json`    – `[{ "date": ..., "winneroldrating": ..., ... }, ...]`
/// * `.csv`     – header row with column names
///
/// The `date`, `winneroldrating` and `loseroldrating` columns are required;
/// a file with no rows is rejected.
pub fn load_file(path: &Path) -> Result<GameDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    if dataset.is_empty() {
        bail!("{} contains no games", path.display());
    }
    info!(
        "Loaded {} games ({} columns) from {}",
        dataset.len(),
        dataset.column_names.len(),
        path.display()
    );
    Ok(dataset)
}

/// Render a date/time as ISO-8601 text, dropping the time part when it is
/// midnight.
pub fn render_datetime(dt: NaiveDateTime) -> String {
    if dt.time() == NaiveTime::default() {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn check_required(columns: &[String], source: &str) -> Result<()> {
    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|c| c == required) {
            bail!("{source} missing '{required}' column");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "gameid": 1,
///     "date": "2016-01-02",
///     "winneroldrating": 1568,
///     "loseroldrating": 1405
///   },
///   ...
/// ]
/// ```
///
/// A numeric `date` is read as epoch milliseconds, which is what Pandas
/// writes for datetime columns.
fn load_json(path: &Path) -> Result<GameDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut column_names: Vec<String> = Vec::new();
    let mut games = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        for key in obj.keys() {
            if !column_names.contains(key) {
                column_names.push(key.clone());
            }
        }

        let date = json_date(obj.get(DATE_COLUMN), i)?;
        let winner_old_rating =
            json_rating(obj.get(WINNER_OLD_RATING_COLUMN), i, WINNER_OLD_RATING_COLUMN)?;
        let loser_old_rating =
            json_rating(obj.get(LOSER_OLD_RATING_COLUMN), i, LOSER_OLD_RATING_COLUMN)?;

        let extra = obj
            .iter()
            .filter(|(key, _)| !REQUIRED_COLUMNS.contains(&key.as_str()))
            .map(|(key, val)| (key.clone(), json_to_cell(val)))
            .collect();

        games.push(Game {
            date,
            winner_old_rating,
            loser_old_rating,
            extra,
        });
    }

    if !games.is_empty() {
        check_required(&column_names, "JSON records")?;
    }
    Ok(GameDataset::new(games, column_names))
}

fn json_date(val: Option<&JsonValue>, row: usize) -> Result<String> {
    match val {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(JsonValue::Number(n)) => {
            let millis = n
                .as_i64()
                .with_context(|| format!("Row {row}: date {n} is not an integer timestamp"))?;
            let dt = DateTime::from_timestamp_millis(millis)
                .with_context(|| format!("Row {row}: date {millis} is out of range"))?;
            Ok(render_datetime(dt.naive_utc()))
        }
        Some(other) => bail!("Row {row}: date must be a string or timestamp, got {other}"),
        None => bail!("Row {row}: missing '{DATE_COLUMN}'"),
    }
}

fn json_rating(val: Option<&JsonValue>, row: usize, col: &str) -> Result<Option<f64>> {
    match val {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .with_context(|| format!("Row {row}, {col}: {v} is not a number")),
    }
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one game per row.
/// Empty rating cells are read as missing.
fn load_csv(path: &Path) -> Result<GameDataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    check_required(&headers, "CSV")?;
    let position = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);
    let date_idx = position(DATE_COLUMN);
    let winner_idx = position(WINNER_OLD_RATING_COLUMN);
    let loser_idx = position(LOSER_OLD_RATING_COLUMN);

    let mut games = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let date = record.get(date_idx).unwrap_or("").to_string();
        let winner_old_rating =
            parse_rating(record.get(winner_idx).unwrap_or(""), row_no, WINNER_OLD_RATING_COLUMN)?;
        let loser_old_rating =
            parse_rating(record.get(loser_idx).unwrap_or(""), row_no, LOSER_OLD_RATING_COLUMN)?;

        let mut extra = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if col_idx == date_idx || col_idx == winner_idx || col_idx == loser_idx {
                continue;
            }
            if let Some(col_name) = headers.get(col_idx) {
                extra.insert(col_name.clone(), guess_cell_type(value));
            }
        }

        games.push(Game {
            date,
            winner_old_rating,
            loser_old_rating,
            extra,
        });
    }

    debug!("CSV columns: {}", headers.join(", "));
    Ok(GameDataset::new(games, headers))
}

fn parse_rating(s: &str, row: usize, col: &str) -> Result<Option<f64>> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    s.parse::<f64>()
        .map(Some)
        .with_context(|| format!("Row {row}, {col}: '{s}' is not a number"))
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    match s {
        "true" | "True" => CellValue::Bool(true),
        "false" | "False" => CellValue::Bool(false),
        _ => CellValue::String(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of games.
///
/// Expected schema:
/// - `date`: Utf8, Date32, Date64 or Timestamp
/// - `winneroldrating`, `loseroldrating`: Int32, Int64, Float32 or Float64
/// - Any other columns are carried along as cells (strings, ints, floats, bools)
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<GameDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    check_required(&column_names, "Parquet file")?;

    let reader = builder.build().context("building parquet reader")?;
    let mut games = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let n_rows = batch.num_rows();

        let index_of = |name: &str| {
            schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))
        };
        let date_col = batch.column(index_of(DATE_COLUMN)?);
        let winner_col = batch.column(index_of(WINNER_OLD_RATING_COLUMN)?);
        let loser_col = batch.column(index_of(LOSER_OLD_RATING_COLUMN)?);

        let extra_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| !REQUIRED_COLUMNS.contains(&f.name().as_str()))
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        let row_offset = games.len();
        for row in 0..n_rows {
            let global_row = row_offset + row;
            let date = extract_date_text(date_col, row)
                .with_context(|| format!("Row {global_row}: failed to read '{DATE_COLUMN}'"))?;
            let winner_old_rating = extract_rating(winner_col, row).with_context(|| {
                format!("Row {global_row}: failed to read '{WINNER_OLD_RATING_COLUMN}'")
            })?;
            let loser_old_rating = extract_rating(loser_col, row).with_context(|| {
                format!("Row {global_row}: failed to read '{LOSER_OLD_RATING_COLUMN}'")
            })?;

            let mut extra = BTreeMap::new();
            for (col_idx, col_name) in &extra_cols {
                extra.insert(col_name.clone(), extract_cell_value(batch.column(*col_idx), row));
            }

            games.push(Game {
                date,
                winner_old_rating,
                loser_old_rating,
                extra,
            });
        }
    }

    Ok(GameDataset::new(games, column_names))
}

// -- Parquet / Arrow helpers --

/// Read the date cell as text; native temporal types are rendered to ISO-8601.
fn extract_date_text(col: &ArrayRef, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null date");
    }
    if let Some(s) = col.as_string_opt::<i32>() {
        return Ok(s.value(row).to_string());
    }
    if let Some(s) = col.as_string_opt::<i64>() {
        return Ok(s.value(row).to_string());
    }
    temporal_at(col, row)
        .map(render_datetime)
        .with_context(|| format!("date column has unsupported type {:?}", col.data_type()))
}

/// Temporal value at `row`, or `None` for non-temporal columns.
fn temporal_at(col: &ArrayRef, row: usize) -> Option<NaiveDateTime> {
    let any = col.as_any();
    match col.data_type() {
        DataType::Date32 => any
            .downcast_ref::<Date32Array>()?
            .value_as_date(row)
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        DataType::Date64 => any.downcast_ref::<Date64Array>()?.value_as_datetime(row),
        DataType::Timestamp(TimeUnit::Second, _) => {
            any.downcast_ref::<TimestampSecondArray>()?.value_as_datetime(row)
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            any.downcast_ref::<TimestampMillisecondArray>()?.value_as_datetime(row)
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            any.downcast_ref::<TimestampMicrosecondArray>()?.value_as_datetime(row)
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            any.downcast_ref::<TimestampNanosecondArray>()?.value_as_datetime(row)
        }
        _ => None,
    }
}

/// Read a numeric rating cell; null is a missing rating.
fn extract_rating(col: &ArrayRef, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Int32 => any.downcast_ref::<Int32Array>().map(|a| a.value(row) as f64),
        DataType::Int64 => any.downcast_ref::<Int64Array>().map(|a| a.value(row) as f64),
        DataType::Float32 => any.downcast_ref::<Float32Array>().map(|a| a.value(row) as f64),
        DataType::Float64 => any.downcast_ref::<Float64Array>().map(|a| a.value(row)),
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    let value = value.context("column type does not match its array")?;
    // Pandas stores missing float ratings as NaN rather than null.
    Ok(if value.is_nan() { None } else { Some(value) })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell_value(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    let cell = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| CellValue::String(s.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|s| CellValue::String(s.value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            temporal_at(col, row).map(|dt| CellValue::Date(render_datetime(dt)))
        }
        _ => None,
    };
    cell.unwrap_or_else(|| CellValue::String(format!("{:?}", col.data_type())))
}

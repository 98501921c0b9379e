use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;

use super::model::{
    CellValue, DATE_COLUMN, GameDataset, LOSER_OLD_RATING_COLUMN, WINNER_OLD_RATING_COLUMN,
};

static NULL_CELL: CellValue = CellValue::Null;

/// Arrow type for a column of loosely-typed cells.
fn infer_type<'a>(cells: impl Iterator<Item = &'a CellValue>) -> DataType {
    let mut inferred: Option<DataType> = None;
    for cell in cells {
        let this = match cell {
            CellValue::Null => continue,
            CellValue::Integer(_) => DataType::Int64,
            CellValue::Float(_) => DataType::Float64,
            CellValue::Bool(_) => DataType::Boolean,
            CellValue::String(_) | CellValue::Date(_) => return DataType::Utf8,
        };
        inferred = Some(match (inferred, this) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(DataType::Int64), DataType::Float64)
            | (Some(DataType::Float64), DataType::Int64) => DataType::Float64,
            _ => return DataType::Utf8,
        });
    }
    inferred.unwrap_or(DataType::Utf8)
}

fn cell_array(cells: &[&CellValue], data_type: &DataType) -> ArrayRef {
    match data_type {
        DataType::Int64 => Arc::new(Int64Array::from(
            cells
                .iter()
                .map(|c| match c {
                    CellValue::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            cells.iter().map(|c| c.as_f64()).collect::<Vec<_>>(),
        )),
        DataType::Boolean => Arc::new(BooleanArray::from(
            cells
                .iter()
                .map(|c| match c {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            cells
                .iter()
                .map(|c| match c {
                    CellValue::Null => None,
                    other => Some(other.to_string()),
                })
                .collect::<Vec<_>>(),
        )),
    }
}

/// Write the dataset to a Parquet file, columns in source order.
///
/// `date` is written as text and the rating columns as nullable Float64;
/// other columns get the narrowest Arrow type their cells agree on.
pub fn write_parquet(dataset: &GameDataset, path: &Path) -> Result<()> {
    let mut fields = Vec::with_capacity(dataset.column_names.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(dataset.column_names.len());

    for name in &dataset.column_names {
        let (field, array): (Field, ArrayRef) = match name.as_str() {
            DATE_COLUMN => (
                Field::new(name, DataType::Utf8, false),
                Arc::new(StringArray::from(dataset.dates())),
            ),
            WINNER_OLD_RATING_COLUMN | LOSER_OLD_RATING_COLUMN => {
                let values: Vec<Option<f64>> = dataset
                    .games
                    .iter()
                    .map(|g| {
                        if name == WINNER_OLD_RATING_COLUMN {
                            g.winner_old_rating
                        } else {
                            g.loser_old_rating
                        }
                    })
                    .collect();
                (
                    Field::new(name, DataType::Float64, true),
                    Arc::new(Float64Array::from(values)),
                )
            }
            _ => {
                let cells: Vec<&CellValue> = dataset
                    .games
                    .iter()
                    .map(|g| g.extra.get(name).unwrap_or(&NULL_CELL))
                    .collect();
                let data_type = infer_type(cells.iter().copied());
                let array = cell_array(&cells, &data_type);
                (Field::new(name, data_type, true), array)
            }
        };
        fields.push(field);
        columns.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    info!("Wrote {} games to {}", dataset.len(), path.display());
    Ok(())
}

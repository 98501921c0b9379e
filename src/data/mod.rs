/// Data layer: game records, loading, subsetting, and writing.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → GameDataset, check required columns
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ GameDataset │  Vec<Game>, source column order
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date cutoff → subset of games
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  GameDataset → .parquet
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;

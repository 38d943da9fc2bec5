/// Data layer: core types, schema validation, loading, and filtering.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SampleDataset (headers validated)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ SampleDataset │  Vec<Sample>, column index, RESULT_ columns
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply metadata predicates → filtered indices
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;

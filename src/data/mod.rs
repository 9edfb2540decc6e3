/// Data layer: core types, retrieval, flattening and filtering.
///
/// Architecture:
/// ```text
///  GET /data/relationships/   (or a local .json / .csv snapshot)
///        │
///        ▼
///   ┌──────────┐
///   │  source   │  HTTP fetch → JSON text
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  flatten nested objects → RelationshipTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ RelationshipTable │  ordered columns, rectangular rows
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  accepted values per column → derived table
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
pub mod source;

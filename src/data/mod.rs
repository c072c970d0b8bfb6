/// Data layer: core types, loading, filtering, and chart shaping.
///
/// Architecture:
/// ```text
///  .csv / .parquet        geo_areas_order.csv
///        │                        │
///        ▼                        ▼
///   ┌──────────┐  normalize  ┌──────────┐
///   │  loader   │───────────▶│  model    │  Dataset, GeoOrdering
///   └──────────┘             └──────────┘
///                                 │  Arc (shared, read-only)
///                                 ▼
///                           ┌──────────┐
///                           │  filter   │  Selection → options / subsets
///                           └──────────┘
///                                 │
///                                 ▼
///                           ┌──────────┐
///                           │  series   │  subset → map / line / bar data
///                           └──────────┘
/// ```

pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod series;

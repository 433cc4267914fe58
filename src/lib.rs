// 🐝 Bee Colony Loss Wrangle - Core Library
// Exposes every pipeline stage for use in the CLI and tests

pub mod cleaner;
pub mod config;
pub mod error;
pub mod loader;
pub mod merge;
pub mod pipeline;
pub mod records;
pub mod reference;

// Re-export commonly used types
pub use cleaner::clean_loss_table;
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use loader::extract_raw_table;
pub use merge::merge_loss_tables;
pub use pipeline::{
    run, write_merged_csv, write_merged_json, MERGED_CSV_FILE, MERGED_JSON_FILE,
};
pub use records::{
    normalize_state, AnsiEntry, CanonicalRow, GeoEntry, LossRecord, MergedRecord,
};
pub use reference::{load_ansi_table, load_geo_table};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

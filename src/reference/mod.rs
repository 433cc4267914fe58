// 🗺️ Reference Tables - Small state lookups joined onto the loss data

pub mod ansi;
pub mod geo;

pub use ansi::load_ansi_table;
pub use geo::load_geo_table;

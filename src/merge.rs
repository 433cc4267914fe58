// 🔗 Merger - Left-join the cleaned loss table with the reference tables
// Join key is the normalized state name. Every cleaned row survives the
// joins; rows without a reference match keep null reference fields, and
// the misses are reported instead of silently propagating nulls.

use std::collections::{BTreeSet, HashMap};

use log::warn;

use crate::cleaner::clean_loss_table;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::records::MergedRecord;
use crate::reference::{load_ansi_table, load_geo_table};

const STAGE: &str = "merger";

/// Produce the final analysis-ready table.
///
/// The cleaned loss table is recomputed from the intermediate file rather
/// than reused from a prior call; a stale or partial earlier stage then
/// fails here instead of leaking into the joined output.
pub fn merge_loss_tables(cfg: &PipelineConfig) -> Result<Vec<MergedRecord>, PipelineError> {
    let cleaned = clean_loss_table(cfg)?;

    let ansi_by_state: HashMap<String, String> = load_ansi_table(cfg)?
        .into_iter()
        .map(|entry| (entry.state, entry.ansi))
        .collect();

    let coords_by_state: HashMap<String, (f64, f64)> = load_geo_table(cfg)?
        .into_iter()
        .map(|entry| (entry.state, (entry.latitude, entry.longitude)))
        .collect();

    let mut missing_ansi = BTreeSet::new();
    let mut missing_geo = BTreeSet::new();

    let merged: Vec<MergedRecord> = cleaned
        .into_iter()
        .map(|record| {
            let ansi = ansi_by_state.get(&record.state).cloned();
            if ansi.is_none() {
                missing_ansi.insert(record.state.clone());
            }

            let coords = coords_by_state.get(&record.state).copied();
            if coords.is_none() {
                missing_geo.insert(record.state.clone());
            }

            MergedRecord::from_parts(record, ansi, coords)
        })
        .collect();

    if !missing_ansi.is_empty() {
        warn!(
            "{STAGE}: no ANSI code for: {}",
            missing_ansi.into_iter().collect::<Vec<_>>().join(", ")
        );
    }
    if !missing_geo.is_empty() {
        warn!(
            "{STAGE}: no centroid coordinates for: {}",
            missing_geo.into_iter().collect::<Vec<_>>().join(", ")
        );
    }

    Ok(merged)
}

// ============================================================================
// TESTS
// ============================================================================

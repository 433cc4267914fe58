// 🐝 Pipeline Entry Point - Raw survey file to analysis-ready dataset
// One call regenerates the intermediate table and runs the merge, so a
// caller starting from only the raw file gets the final dataset. The
// individual stage functions stay available for partial runs.

use std::path::Path;

use log::info;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::loader::extract_raw_table;
use crate::merge::merge_loss_tables;
use crate::records::MergedRecord;

const STAGE: &str = "pipeline";

/// Default filename for the merged CSV output.
pub const MERGED_CSV_FILE: &str = "bee_colony_loss_merged.csv";

/// Default filename for the merged JSON output.
pub const MERGED_JSON_FILE: &str = "bee_colony_loss_merged.json";

/// Run the whole pipeline: canonicalize the raw table (rewriting the
/// intermediate file), then clean and merge. This is the one-call entry
/// point; after the intermediate file exists, `merge_loss_tables` alone is
/// enough to rebuild the final dataset.
pub fn run(cfg: &PipelineConfig) -> Result<Vec<MergedRecord>, PipelineError> {
    let canonical = extract_raw_table(cfg)?;
    info!("{STAGE}: {} canonical rows", canonical.len());

    let merged = merge_loss_tables(cfg)?;
    info!("{STAGE}: {} merged rows", merged.len());

    Ok(merged)
}

/// Write the merged dataset as CSV.
pub fn write_merged_csv(records: &[MergedRecord], path: &Path) -> Result<(), PipelineError> {
    let file = path.display().to_string();
    let mut writer = csv::Writer::from_path(path).map_err(|source| PipelineError::Csv {
        stage: STAGE,
        file: file.clone(),
        source,
    })?;

    for record in records {
        writer.serialize(record).map_err(|source| PipelineError::Csv {
            stage: STAGE,
            file: file.clone(),
            source,
        })?;
    }

    writer.flush().map_err(|source| PipelineError::Io {
        stage: STAGE,
        file,
        source,
    })
}

/// Write the merged dataset as pretty-printed JSON.
pub fn write_merged_json(records: &[MergedRecord], path: &Path) -> Result<(), PipelineError> {
    let file = path.display().to_string();
    let bytes = serde_json::to_vec_pretty(records).map_err(|e| PipelineError::Io {
        stage: STAGE,
        file: file.clone(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;

    std::fs::write(path, bytes).map_err(|source| PipelineError::Io {
        stage: STAGE,
        file,
        source,
    })
}

// ============================================================================
// TESTS
// ============================================================================

// 📥 Raw Loss Loader - Canonicalize the published survey table
// Drops the statistical-estimation columns, discards the alias header row,
// renames the 11 surviving columns positionally, and persists the result
// as the intermediate table the cleaner re-reads.

use std::collections::HashSet;

use log::info;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::records::{CanonicalRow, CANONICAL_COLUMNS};

const STAGE: &str = "raw_loss_loader";

/// The published table repeats its header as the first data row, in an
/// alternate naming scheme. That row is not an observation and is always
/// discarded.
pub const ALIAS_HEADER_ROWS: usize = 1;

/// Statistical-accounting columns shipped with the survey that the
/// pipeline does not use: bootstrap/GLM estimates, confidence intervals,
/// standard errors, and the "at risk" colony tally. The odd spellings are
/// verbatim from the published file.
pub const DROPPED_COLUMNS: [&str; 18] = [
    "Column name as written in R Script",
    "State abbreviation",
    "Method of tallying multi-states operations (included in all states, excluded from all states, exlusively multi-states)",
    "Bootstrap replication",
    "Bootstrap method",
    "Bootstrap estimate of the Total Loss (weigthed average)",
    "Boostrap-based 95% confidence interval(low) of the weighted average loss",
    "Boostrap-based 95% confidence interval(high) of the weighted average loss",
    "Bootstrap estimate of the Average Loss (unweigthed average)",
    "Boostrap-based 95% confidence interval(low) of the unweighted average loss",
    "Boostrap-based 95% confidence interval(high) of the unweighted average loss",
    "glm-based 95% confidence interval(low) of the weighted average loss",
    "glm-based 95% confidence interval(high) of the weighted average loss",
    "standard deviation of operational losses",
    "standard error of the unweithed average estimate",
    "glm-based 95% confidence interval(low) of the unweighted average loss",
    "glm-based 95% confidence interval(high) of the unweighted average loss",
    "Total number of colonies \"at risk\" (colonies at the start, new colonies added, without colonies sold or given away)",
];

/// Read the raw loss table, canonicalize it, write the intermediate file
/// (overwriting any prior version), and return the rows.
pub fn extract_raw_table(cfg: &PipelineConfig) -> Result<Vec<CanonicalRow>, PipelineError> {
    let raw_path = cfg.raw_loss_path();
    if !raw_path.exists() {
        return Err(PipelineError::MissingFile {
            stage: STAGE,
            path: raw_path,
        });
    }

    let file_name = cfg.raw_loss_file.clone();
    let mut reader = csv::Reader::from_path(&raw_path).map_err(|source| PipelineError::Csv {
        stage: STAGE,
        file: file_name.clone(),
        source,
    })?;

    let headers = reader
        .headers()
        .map_err(|source| PipelineError::Csv {
            stage: STAGE,
            file: file_name.clone(),
            source,
        })?
        .clone();

    // The drop set is validated explicitly: the original assumed the schema
    // silently, which hides upstream format changes until a filter
    // downstream returns garbage.
    let mut drop_indices = HashSet::new();
    for name in DROPPED_COLUMNS {
        match headers.iter().position(|h| h == name) {
            Some(idx) => {
                drop_indices.insert(idx);
            }
            None => {
                return Err(PipelineError::SchemaMismatch {
                    stage: STAGE,
                    file: file_name,
                    detail: format!("expected column not present: {name:?}"),
                });
            }
        }
    }

    let kept: Vec<usize> = (0..headers.len())
        .filter(|idx| !drop_indices.contains(idx))
        .collect();
    if kept.len() != CANONICAL_COLUMNS.len() {
        return Err(PipelineError::SchemaMismatch {
            stage: STAGE,
            file: file_name,
            detail: format!(
                "expected {} columns after dropping estimation columns, found {}",
                CANONICAL_COLUMNS.len(),
                kept.len()
            ),
        });
    }

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|source| PipelineError::Csv {
            stage: STAGE,
            file: file_name.clone(),
            source,
        })?;

        // Alias header row: not data, always discarded.
        if row_idx < ALIAS_HEADER_ROWS {
            continue;
        }

        let get = |i: usize| record.get(kept[i]).unwrap_or("").to_string();
        rows.push(CanonicalRow {
            state: get(0),
            year: get(1),
            season: get(2),
            beekeepers: get(3),
            total_loss: get(4),
            average_loss: get(5),
            starting_colonies: get(6),
            colonies_lost: get(7),
            ending_colonies: get(8),
            beekeepers_exclusive_to_state: get(9),
            colonies_exclusive_to_state: get(10),
        });
    }

    write_intermediate(cfg, &rows)?;
    info!(
        "{STAGE}: canonicalized {} rows into {}",
        rows.len(),
        cfg.intermediate_file
    );

    Ok(rows)
}

/// Persist the canonical rows. The first field is an auto-generated index
/// column, an artifact of the original export that the cleaner drops on
/// reload.
fn write_intermediate(cfg: &PipelineConfig, rows: &[CanonicalRow]) -> Result<(), PipelineError> {
    let out_path = cfg.intermediate_path();
    let file_name = cfg.intermediate_file.clone();

    let mut writer = csv::Writer::from_path(&out_path).map_err(|source| PipelineError::Csv {
        stage: STAGE,
        file: file_name.clone(),
        source,
    })?;

    let mut header = vec![""];
    header.extend(CANONICAL_COLUMNS);
    writer.write_record(&header).map_err(|source| PipelineError::Csv {
        stage: STAGE,
        file: file_name.clone(),
        source,
    })?;

    for (idx, row) in rows.iter().enumerate() {
        let mut fields = vec![idx.to_string()];
        fields.extend(row.fields().iter().map(|f| f.to_string()));
        writer.write_record(&fields).map_err(|source| PipelineError::Csv {
            stage: STAGE,
            file: file_name.clone(),
            source,
        })?;
    }

    writer.flush().map_err(|source| PipelineError::Io {
        stage: STAGE,
        file: file_name,
        source,
    })?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

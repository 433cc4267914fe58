// State → ANSI code reference, from the pipe-delimited Census export.
// The export carries the code under "STATE" and the name under
// "STATE_NAME"; here those become "ansi" and "state", and the extraneous
// columns (postal abbreviation, geographic entity code) are dropped.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::records::{normalize_state, AnsiEntry};

const STAGE: &str = "ansi_reference";

/// Load the state/ANSI reference table, one entry per state or territory.
pub fn load_ansi_table(cfg: &PipelineConfig) -> Result<Vec<AnsiEntry>, PipelineError> {
    let path = cfg.ansi_path();
    if !path.exists() {
        return Err(PipelineError::MissingFile {
            stage: STAGE,
            path,
        });
    }

    let file_name = cfg.ansi_file.clone();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .from_path(&path)
        .map_err(|source| PipelineError::Csv {
            stage: STAGE,
            file: file_name.clone(),
            source,
        })?;

    // Column names are matched case-insensitively; the export ships them
    // uppercase.
    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| PipelineError::Csv {
            stage: STAGE,
            file: file_name.clone(),
            source,
        })?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let code_idx = column_index(&headers, "state", &file_name)?;
    let name_idx = column_index(&headers, "state_name", &file_name)?;

    // stusab and statens are dropped by simply not projecting them.
    let mut entries = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| PipelineError::Csv {
            stage: STAGE,
            file: file_name.clone(),
            source,
        })?;

        entries.push(AnsiEntry {
            state: normalize_state(record.get(name_idx).unwrap_or("")),
            ansi: record.get(code_idx).unwrap_or("").trim().to_string(),
        });
    }

    Ok(entries)
}

fn column_index(
    headers: &[String],
    name: &str,
    file: &str,
) -> Result<usize, PipelineError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| PipelineError::SchemaMismatch {
            stage: STAGE,
            file: file.to_string(),
            detail: format!("expected column not present: {name:?}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_ansi_fixture(dir: &std::path::Path, content: &str) {
        fs::write(dir.join(crate::config::DEFAULT_ANSI_FILE), content).unwrap();
    }

    #[test]
    fn test_load_ansi_normalizes_and_projects() {
        let tmp = TempDir::new().unwrap();
        write_ansi_fixture(
            tmp.path(),
            "STATE|STUSAB|STATE_NAME|STATENS\n\
             01|AL|Alabama|01779775\n\
             36|NY|New York|01779796\n\
             66|GU|Guam|01802705\n",
        );
        let cfg = PipelineConfig::new(tmp.path());

        let entries = load_ansi_table(&cfg).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].state, "alabama");
        assert_eq!(entries[0].ansi, "01");
        assert_eq!(entries[1].state, "new_york");
        assert_eq!(entries[1].ansi, "36");
    }

    #[test]
    fn test_load_ansi_preserves_leading_zeros() {
        let tmp = TempDir::new().unwrap();
        write_ansi_fixture(
            tmp.path(),
            "STATE|STUSAB|STATE_NAME|STATENS\n01|AL|Alabama|01779775\n",
        );
        let cfg = PipelineConfig::new(tmp.path());

        let entries = load_ansi_table(&cfg).unwrap();

        assert_eq!(entries[0].ansi, "01");
    }

    #[test]
    fn test_load_ansi_missing_name_column() {
        let tmp = TempDir::new().unwrap();
        write_ansi_fixture(tmp.path(), "STATE|STUSAB|STATENS\n01|AL|01779775\n");
        let cfg = PipelineConfig::new(tmp.path());

        let err = load_ansi_table(&cfg).unwrap_err();

        match err {
            PipelineError::SchemaMismatch { detail, .. } => {
                assert!(detail.contains("state_name"));
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_load_ansi_missing_file() {
        let tmp = TempDir::new().unwrap();
        let cfg = PipelineConfig::new(tmp.path());

        let err = load_ansi_table(&cfg).unwrap_err();

        assert!(matches!(err, PipelineError::MissingFile { stage: "ansi_reference", .. }));
    }
}

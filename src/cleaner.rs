// 🧹 Loss Cleaner - Type coercion, filtering, dedup, derived metrics
// Reloads the intermediate table written by the loader (never invokes the
// loader itself), applies the cleaning steps in a fixed order, and returns
// typed records satisfying the cleaned-table invariants.

use std::collections::HashSet;

use log::warn;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::records::{
    normalize_state, parse_float, parse_int, CanonicalRow, LossRecord, CANONICAL_COLUMNS,
};

const STAGE: &str = "loss_cleaner";

/// Minimum responding beekeepers for an observation to be statistically
/// usable. Rows at or below this are survey noise.
pub const MIN_BEEKEEPERS: i64 = 10;

/// Aggregate pseudo-states in the survey that are not individual states.
pub const EXCLUDED_STATES: [&str; 2] = ["multistates", "non_continental_usa"];

/// Load the intermediate table and produce cleaned loss records.
///
/// Steps, in order: drop the artifact index column; sort by year
/// descending then state ascending; drop rows with any null field;
/// normalize state and season text; keep beekeepers > MIN_BEEKEEPERS;
/// drop exact-duplicate rows; coerce numeric fields; keep only the
/// "annual" season; drop aggregate pseudo-states; derive
/// colonies_net_gain and beekeeper_colony_ratio.
pub fn clean_loss_table(cfg: &PipelineConfig) -> Result<Vec<LossRecord>, PipelineError> {
    let mut rows = read_intermediate(cfg)?;

    // Sort by year descending, state ascending. The sort key is lenient on
    // unparseable years; strict coercion surfaces those rows below.
    rows.sort_by(|a, b| {
        year_sort_key(&b.year)
            .cmp(&year_sort_key(&a.year))
            .then_with(|| a.state.cmp(&b.state))
    });

    // Drop rows with any null field.
    let before = rows.len();
    rows.retain(|row| !row.has_null_field());
    warn_if_emptied("null-field drop", before, rows.len());

    // Normalize text: state becomes the join key, season lowercases.
    for row in &mut rows {
        row.state = normalize_state(&row.state);
        row.season = row.season.trim().to_lowercase();
    }

    // Keep observations with a usable respondent count. The parsed value is
    // carried along so coercion below does not re-parse it.
    let before = rows.len();
    let mut surviving: Vec<(CanonicalRow, i64)> = Vec::with_capacity(rows.len());
    for row in rows {
        let beekeepers = parse_int(STAGE, "beekeepers", &row.beekeepers)?;
        if beekeepers > MIN_BEEKEEPERS {
            surviving.push((row, beekeepers));
        }
    }
    warn_if_emptied("beekeepers filter", before, surviving.len());

    // Drop exact-duplicate rows, keeping first occurrence.
    let mut seen = HashSet::new();
    surviving.retain(|(row, _)| seen.insert(row.clone()));

    // Coerce the remaining text fields to their target types. Failures are
    // surfaced as typed errors instead of propagating as downstream nulls.
    let mut records = Vec::with_capacity(surviving.len());
    for (row, beekeepers) in surviving {
        let year = parse_int(STAGE, "year", &row.year)?;
        let total_loss = parse_float(STAGE, "total_loss", &row.total_loss)?;
        let average_loss = parse_float(STAGE, "average_loss", &row.average_loss)?;
        let starting_colonies = parse_int(STAGE, "starting_colonies", &row.starting_colonies)?;
        let colonies_lost = parse_int(STAGE, "colonies_lost", &row.colonies_lost)?;
        let ending_colonies = parse_int(STAGE, "ending_colonies", &row.ending_colonies)?;
        let beekeepers_exclusive_to_state = parse_int(
            STAGE,
            "beekeepers_exclusive_to_state",
            &row.beekeepers_exclusive_to_state,
        )?;
        let colonies_exclusive_to_state = parse_int(
            STAGE,
            "colonies_exclusive_to_state",
            &row.colonies_exclusive_to_state,
        )?;

        records.push(LossRecord {
            state: row.state,
            year,
            season: row.season,
            beekeepers,
            total_loss,
            average_loss,
            starting_colonies,
            colonies_lost,
            ending_colonies,
            beekeepers_exclusive_to_state,
            colonies_exclusive_to_state,
            colonies_net_gain: ending_colonies - starting_colonies,
            // Finite: beekeepers > MIN_BEEKEEPERS was enforced above.
            beekeeper_colony_ratio: ending_colonies as f64 / beekeepers as f64,
        });
    }

    // Full-year aggregates only.
    let before = records.len();
    records.retain(|r| r.season == "annual");
    warn_if_emptied("season filter", before, records.len());

    // Drop the aggregate pseudo-states.
    let before = records.len();
    records.retain(|r| !EXCLUDED_STATES.contains(&r.state.as_str()));
    warn_if_emptied("pseudo-state filter", before, records.len());

    Ok(records)
}

/// Read the intermediate table, dropping the artifact index column the
/// loader writes as the first field.
fn read_intermediate(cfg: &PipelineConfig) -> Result<Vec<CanonicalRow>, PipelineError> {
    let path = cfg.intermediate_path();
    if !path.exists() {
        return Err(PipelineError::MissingFile {
            stage: STAGE,
            path,
        });
    }

    let file_name = cfg.intermediate_file.clone();
    let mut reader = csv::Reader::from_path(&path).map_err(|source| PipelineError::Csv {
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

    // First column is the unnamed index artifact; the rest must be the
    // canonical schema, in order.
    let named_ok = headers.len() == CANONICAL_COLUMNS.len() + 1
        && headers.iter().skip(1).eq(CANONICAL_COLUMNS);
    if !named_ok {
        return Err(PipelineError::SchemaMismatch {
            stage: STAGE,
            file: file_name,
            detail: format!(
                "expected index column followed by {:?}, found {:?}",
                CANONICAL_COLUMNS,
                headers.iter().collect::<Vec<_>>()
            ),
        });
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| PipelineError::Csv {
            stage: STAGE,
            file: file_name.clone(),
            source,
        })?;

        // Offset by one: field 0 is the index artifact.
        let get = |i: usize| record.get(i + 1).unwrap_or("").to_string();
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

    Ok(rows)
}

fn year_sort_key(year: &str) -> i64 {
    year.trim().parse().unwrap_or(i64::MIN)
}

fn warn_if_emptied(step: &str, before: usize, after: usize) {
    if before > 0 && after == 0 {
        warn!("{STAGE}: {step} left no rows; check the source table for drift");
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_intermediate_fixture(dir: &Path, rows: &[[&str; 11]]) {
        let mut writer = csv::Writer::from_path(
            dir.join(crate::config::DEFAULT_INTERMEDIATE_FILE),
        )
        .unwrap();
        let mut header = vec![""];
        header.extend(CANONICAL_COLUMNS);
        writer.write_record(&header).unwrap();
        for (idx, row) in rows.iter().enumerate() {
            let mut fields = vec![idx.to_string()];
            fields.extend(row.iter().map(|f| f.to_string()));
            writer.write_record(&fields).unwrap();
        }
        writer.flush().unwrap();
    }

    fn standard_fixture() -> Vec<[&'static str; 11]> {
        vec![
            // Cleaned survivors
            [
                "New York", "2021", "Annual", "500", "30.5", "28.1", "1000", "300", "900",
                "480", "950",
            ],
            [
                "Alabama", "2022", "Annual", "120", "25.0", "22.4", "800", "200", "850", "110",
                "790",
            ],
            // Exact duplicate of the Alabama row
            [
                "Alabama", "2022", "Annual", "120", "25.0", "22.4", "800", "200", "850", "110",
                "790",
            ],
            [
                "Guam", "2022", "Annual", "60", "40.0", "35.0", "200", "80", "150", "55", "140",
            ],
            // Too few respondents
            [
                "Wyoming", "2022", "Annual", "5", "33.3", "31.0", "90", "30", "70", "5", "60",
            ],
            // Partial-year survey window
            [
                "California", "2022", "Winter", "900", "18.2", "17.5", "5000", "900", "4600",
                "850", "4400",
            ],
            // Aggregate pseudo-states
            [
                "Multistates", "2022", "Annual", "800", "29.9", "27.3", "9000", "2700", "7100",
                "0", "0",
            ],
            [
                "Non Continental USA", "2022", "Annual", "90", "22.0", "21.0", "700", "150",
                "600", "85", "580",
            ],
            // Null field
            [
                "Ohio", "2022", "Annual", "", "26.0", "24.0", "600", "160", "520", "100", "500",
            ],
        ]
    }

    #[test]
    fn test_clean_enforces_row_invariants() {
        let tmp = TempDir::new().unwrap();
        write_intermediate_fixture(tmp.path(), &standard_fixture());
        let cfg = PipelineConfig::new(tmp.path());

        let records = clean_loss_table(&cfg).unwrap();

        assert!(!records.is_empty());
        for record in &records {
            assert!(record.beekeepers > MIN_BEEKEEPERS);
            assert_eq!(record.season, "annual");
            assert!(!EXCLUDED_STATES.contains(&record.state.as_str()));
            assert_eq!(record.state, normalize_state(&record.state));
        }

        // No duplicate rows survive.
        let mut seen = std::collections::HashSet::new();
        for record in &records {
            assert!(seen.insert((record.state.clone(), record.year, record.season.clone())));
        }
    }

    #[test]
    fn test_clean_drops_expected_rows() {
        let tmp = TempDir::new().unwrap();
        write_intermediate_fixture(tmp.path(), &standard_fixture());
        let cfg = PipelineConfig::new(tmp.path());

        let records = clean_loss_table(&cfg).unwrap();
        let states: Vec<&str> = records.iter().map(|r| r.state.as_str()).collect();

        assert_eq!(states, vec!["alabama", "guam", "new_york"]);
    }

    #[test]
    fn test_clean_sorts_year_desc_then_state_asc() {
        let tmp = TempDir::new().unwrap();
        write_intermediate_fixture(tmp.path(), &standard_fixture());
        let cfg = PipelineConfig::new(tmp.path());

        let records = clean_loss_table(&cfg).unwrap();

        assert_eq!(records[0].year, 2022);
        assert_eq!(records[0].state, "alabama");
        assert_eq!(records[1].year, 2022);
        assert_eq!(records[1].state, "guam");
        assert_eq!(records[2].year, 2021);
        assert_eq!(records[2].state, "new_york");
    }

    #[test]
    fn test_clean_normalizes_text_and_coerces_types() {
        let tmp = TempDir::new().unwrap();
        write_intermediate_fixture(tmp.path(), &standard_fixture());
        let cfg = PipelineConfig::new(tmp.path());

        let records = clean_loss_table(&cfg).unwrap();
        let ny = records.iter().find(|r| r.state == "new_york").unwrap();

        assert_eq!(ny.year, 2021);
        assert_eq!(ny.season, "annual");
        assert_eq!(ny.beekeepers, 500);
        assert_relative_eq!(ny.total_loss, 30.5);
        assert_relative_eq!(ny.average_loss, 28.1);
        assert_eq!(ny.ending_colonies, 900);
        assert_eq!(ny.colonies_lost, 300);
    }

    #[test]
    fn test_clean_derives_net_gain_and_ratio() {
        let tmp = TempDir::new().unwrap();
        write_intermediate_fixture(tmp.path(), &standard_fixture());
        let cfg = PipelineConfig::new(tmp.path());

        let records = clean_loss_table(&cfg).unwrap();

        for record in &records {
            assert_eq!(
                record.colonies_net_gain,
                record.ending_colonies - record.starting_colonies
            );
            assert_relative_eq!(
                record.beekeeper_colony_ratio,
                record.ending_colonies as f64 / record.beekeepers as f64
            );
        }

        let ny = records.iter().find(|r| r.state == "new_york").unwrap();
        assert_eq!(ny.colonies_net_gain, -100);
        assert_relative_eq!(ny.beekeeper_colony_ratio, 1.8);
    }

    #[test]
    fn test_clean_surfaces_type_coercion_errors() {
        let tmp = TempDir::new().unwrap();
        write_intermediate_fixture(
            tmp.path(),
            &[[
                "Vermont", "2022", "Annual", "40", "thirty", "28.0", "300", "90", "250", "38",
                "240",
            ]],
        );
        let cfg = PipelineConfig::new(tmp.path());

        let err = clean_loss_table(&cfg).unwrap_err();

        match err {
            PipelineError::TypeCoercion { field, value, .. } => {
                assert_eq!(field, "total_loss");
                assert_eq!(value, "thirty");
            }
            other => panic!("expected TypeCoercion, got {other:?}"),
        }
    }

    #[test]
    fn test_clean_missing_intermediate_file() {
        let tmp = TempDir::new().unwrap();
        let cfg = PipelineConfig::new(tmp.path());

        let err = clean_loss_table(&cfg).unwrap_err();

        match err {
            PipelineError::MissingFile { stage, .. } => assert_eq!(stage, "loss_cleaner"),
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn test_clean_rejects_header_drift() {
        let tmp = TempDir::new().unwrap();
        let mut writer = csv::Writer::from_path(
            tmp.path().join(crate::config::DEFAULT_INTERMEDIATE_FILE),
        )
        .unwrap();
        // No index artifact, and a renamed column.
        writer
            .write_record(["state", "yr", "season"])
            .unwrap();
        writer.flush().unwrap();
        let cfg = PipelineConfig::new(tmp.path());

        let err = clean_loss_table(&cfg).unwrap_err();

        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_clean_filtering_everything_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        write_intermediate_fixture(
            tmp.path(),
            &[[
                "Wyoming", "2022", "Annual", "5", "33.3", "31.0", "90", "30", "70", "5", "60",
            ]],
        );
        let cfg = PipelineConfig::new(tmp.path());

        let records = clean_loss_table(&cfg).unwrap();

        assert!(records.is_empty());
    }
}

// State centroid coordinates. The export has an unlabeled leading index
// column (discarded) and names the state under "name"; only
// {state, latitude, longitude} survive the projection.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::records::{normalize_state, parse_float, GeoEntry};

const STAGE: &str = "geo_reference";

/// Load the state centroid reference table.
pub fn load_geo_table(cfg: &PipelineConfig) -> Result<Vec<GeoEntry>, PipelineError> {
    let path = cfg.geo_path();
    if !path.exists() {
        return Err(PipelineError::MissingFile {
            stage: STAGE,
            path,
        });
    }

    let file_name = cfg.geo_file.clone();
    let mut reader = csv::Reader::from_path(&path).map_err(|source| PipelineError::Csv {
        stage: STAGE,
        file: file_name.clone(),
        source,
    })?;

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

    // Projecting by name also discards the unlabeled index column.
    let name_idx = column_index(&headers, "name", &file_name)?;
    let lat_idx = column_index(&headers, "latitude", &file_name)?;
    let lon_idx = column_index(&headers, "longitude", &file_name)?;

    let mut entries = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| PipelineError::Csv {
            stage: STAGE,
            file: file_name.clone(),
            source,
        })?;

        entries.push(GeoEntry {
            state: normalize_state(record.get(name_idx).unwrap_or("")),
            latitude: parse_float(STAGE, "latitude", record.get(lat_idx).unwrap_or(""))?,
            longitude: parse_float(STAGE, "longitude", record.get(lon_idx).unwrap_or(""))?,
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
    use approx::assert_relative_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write_geo_fixture(dir: &std::path::Path, content: &str) {
        fs::write(dir.join(crate::config::DEFAULT_GEO_FILE), content).unwrap();
    }

    #[test]
    fn test_load_geo_projects_and_normalizes() {
        let tmp = TempDir::new().unwrap();
        write_geo_fixture(
            tmp.path(),
            ",name,latitude,longitude\n\
             0,Alabama,32.7794,-86.8287\n\
             1,New York,42.9538,-75.5268\n",
        );
        let cfg = PipelineConfig::new(tmp.path());

        let entries = load_geo_table(&cfg).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].state, "alabama");
        assert_relative_eq!(entries[0].latitude, 32.7794);
        assert_relative_eq!(entries[0].longitude, -86.8287);
        assert_eq!(entries[1].state, "new_york");
    }

    #[test]
    fn test_load_geo_surfaces_coordinate_coercion_errors() {
        let tmp = TempDir::new().unwrap();
        write_geo_fixture(tmp.path(), ",name,latitude,longitude\n0,Alabama,north,-86.8\n");
        let cfg = PipelineConfig::new(tmp.path());

        let err = load_geo_table(&cfg).unwrap_err();

        match err {
            PipelineError::TypeCoercion { field, value, .. } => {
                assert_eq!(field, "latitude");
                assert_eq!(value, "north");
            }
            other => panic!("expected TypeCoercion, got {other:?}"),
        }
    }

    #[test]
    fn test_load_geo_missing_columns() {
        let tmp = TempDir::new().unwrap();
        write_geo_fixture(tmp.path(), ",name,lat,lon\n0,Alabama,32.7,-86.8\n");
        let cfg = PipelineConfig::new(tmp.path());

        let err = load_geo_table(&cfg).unwrap_err();

        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_load_geo_missing_file() {
        let tmp = TempDir::new().unwrap();
        let cfg = PipelineConfig::new(tmp.path());

        let err = load_geo_table(&cfg).unwrap_err();

        assert!(matches!(err, PipelineError::MissingFile { stage: "geo_reference", .. }));
    }
}

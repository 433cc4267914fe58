// 📋 Record Types - Canonical schema shared by every pipeline stage
// The raw survey table flows through three shapes: text-only canonical
// rows (intermediate file), typed loss records (cleaned), and merged
// records carrying the reference joins.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Canonical column names of the intermediate table, in positional order.
/// The loader renames the surviving raw columns to exactly this set.
pub const CANONICAL_COLUMNS: [&str; 11] = [
    "state",
    "year",
    "season",
    "beekeepers",
    "total_loss",
    "average_loss",
    "starting_colonies",
    "colonies_lost",
    "ending_colonies",
    "beekeepers_exclusive_to_state",
    "colonies_exclusive_to_state",
];

// ============================================================================
// CANONICAL ROW (text fields, pre-coercion)
// ============================================================================

/// One row of the canonicalized intermediate table. All fields are still
/// text at this point; the cleaner owns type coercion. Equality and hashing
/// over the full field set back exact-duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub state: String,
    pub year: String,
    pub season: String,
    pub beekeepers: String,
    pub total_loss: String,
    pub average_loss: String,
    pub starting_colonies: String,
    pub colonies_lost: String,
    pub ending_colonies: String,
    pub beekeepers_exclusive_to_state: String,
    pub colonies_exclusive_to_state: String,
}

impl CanonicalRow {
    /// Field values in canonical column order.
    pub fn fields(&self) -> [&str; 11] {
        [
            &self.state,
            &self.year,
            &self.season,
            &self.beekeepers,
            &self.total_loss,
            &self.average_loss,
            &self.starting_colonies,
            &self.colonies_lost,
            &self.ending_colonies,
            &self.beekeepers_exclusive_to_state,
            &self.colonies_exclusive_to_state,
        ]
    }

    /// True when any field is null-like (empty or a survey NA marker).
    pub fn has_null_field(&self) -> bool {
        self.fields().iter().any(|f| is_null(f))
    }
}

// ============================================================================
// TYPED RECORDS
// ============================================================================

/// One cleaned (state, year, season) observation with derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossRecord {
    pub state: String,
    pub year: i64,
    pub season: String,
    pub beekeepers: i64,
    /// Weighted total loss, percent.
    pub total_loss: f64,
    /// Unweighted average loss, percent.
    pub average_loss: f64,
    pub starting_colonies: i64,
    pub colonies_lost: i64,
    pub ending_colonies: i64,
    pub beekeepers_exclusive_to_state: i64,
    pub colonies_exclusive_to_state: i64,
    /// ending_colonies - starting_colonies; negative for a net loss.
    pub colonies_net_gain: i64,
    /// ending_colonies / beekeepers. Always finite: beekeepers > 10 is
    /// enforced before this is computed.
    pub beekeeper_colony_ratio: f64,
}

/// State name → ANSI code. The code stays textual to preserve leading
/// zeros ("01" is Alabama).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsiEntry {
    pub state: String,
    pub ansi: String,
}

/// State name → centroid coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoEntry {
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Final analysis-ready row: a cleaned loss record plus the reference
/// fields, which stay `None` when the state key had no match (left-join
/// semantics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub state: String,
    pub year: i64,
    pub season: String,
    pub beekeepers: i64,
    pub total_loss: f64,
    pub average_loss: f64,
    pub starting_colonies: i64,
    pub colonies_lost: i64,
    pub ending_colonies: i64,
    pub beekeepers_exclusive_to_state: i64,
    pub colonies_exclusive_to_state: i64,
    pub colonies_net_gain: i64,
    pub beekeeper_colony_ratio: f64,
    pub ansi: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl MergedRecord {
    pub fn from_parts(
        loss: LossRecord,
        ansi: Option<String>,
        coords: Option<(f64, f64)>,
    ) -> Self {
        MergedRecord {
            state: loss.state,
            year: loss.year,
            season: loss.season,
            beekeepers: loss.beekeepers,
            total_loss: loss.total_loss,
            average_loss: loss.average_loss,
            starting_colonies: loss.starting_colonies,
            colonies_lost: loss.colonies_lost,
            ending_colonies: loss.ending_colonies,
            beekeepers_exclusive_to_state: loss.beekeepers_exclusive_to_state,
            colonies_exclusive_to_state: loss.colonies_exclusive_to_state,
            colonies_net_gain: loss.colonies_net_gain,
            beekeeper_colony_ratio: loss.beekeeper_colony_ratio,
            ansi,
            latitude: coords.map(|(lat, _)| lat),
            longitude: coords.map(|(_, lon)| lon),
        }
    }
}

// ============================================================================
// TEXT NORMALIZATION & COERCION HELPERS
// ============================================================================

/// Normalize a state name into the join key: lowercase, spaces replaced
/// with underscores. Idempotent — normalizing a normalized key is a no-op.
pub fn normalize_state(state: &str) -> String {
    state.trim().to_lowercase().replace(' ', "_")
}

/// Null markers the survey export uses for missing observations. Mirrors
/// what the original dataframe load treated as NaN.
pub fn is_null(value: &str) -> bool {
    matches!(value.trim(), "" | "NA" | "N/A" | "NaN" | "null")
}

/// Coerce a text field to an integer. Accepts float-formatted text
/// ("500.0") by truncation, since the survey export sometimes carries
/// integral counts with a decimal point.
pub fn parse_int(
    stage: &'static str,
    field: &'static str,
    value: &str,
) -> Result<i64, PipelineError> {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(f.trunc() as i64),
        _ => Err(PipelineError::TypeCoercion {
            stage,
            field,
            value: value.to_string(),
            target: "integer",
        }),
    }
}

/// Coerce a text field to a float.
pub fn parse_float(
    stage: &'static str,
    field: &'static str,
    value: &str,
) -> Result<f64, PipelineError> {
    value.trim().parse::<f64>().map_err(|_| PipelineError::TypeCoercion {
        stage,
        field,
        value: value.to_string(),
        target: "float",
    })
}

// ============================================================================
// TESTS
// ============================================================================

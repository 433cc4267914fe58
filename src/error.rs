// ⚠️ Pipeline Errors - Typed failure taxonomy for every stage
// Each variant names the stage and the file/column that failed, so a
// caller never has to chase a downstream null-propagation failure.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A source file (or the intermediate file) was absent when a stage
    /// needed it. Re-running after restoring the file is the only recovery.
    #[error("{stage}: required file not found: {path}")]
    MissingFile { stage: &'static str, path: PathBuf },

    /// An expected column was not present, or the column count did not
    /// match at rename time.
    #[error("{stage}: schema mismatch in {file}: {detail}")]
    SchemaMismatch {
        stage: &'static str,
        file: String,
        detail: String,
    },

    /// A field value could not be converted to its target numeric type.
    #[error("{stage}: cannot coerce {field} value {value:?} to {target}")]
    TypeCoercion {
        stage: &'static str,
        field: &'static str,
        value: String,
        target: &'static str,
    },

    /// A filter step yielded zero rows. The pipeline itself only warns on
    /// this (the dataset legitimately shrinks), but callers that treat
    /// upstream data drift as fatal can match on it.
    #[error("{stage}: {step} produced an empty table")]
    EmptyResult { stage: &'static str, step: &'static str },

    /// Malformed CSV content (bad quoting, ragged rows).
    #[error("{stage}: failed to read {file}")]
    Csv {
        stage: &'static str,
        file: String,
        #[source]
        source: csv::Error,
    },

    /// I/O failure while writing a derived table.
    #[error("{stage}: failed to write {file}")]
    Io {
        stage: &'static str,
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Which stage produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::MissingFile { stage, .. }
            | PipelineError::SchemaMismatch { stage, .. }
            | PipelineError::TypeCoercion { stage, .. }
            | PipelineError::EmptyResult { stage, .. }
            | PipelineError::Csv { stage, .. }
            | PipelineError::Io { stage, .. } => stage,
        }
    }
}

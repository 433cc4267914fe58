// 🔧 Pipeline Configuration - Explicit file locations with survey defaults
// The source notebook hard-coded every filename into the working
// directory; here the paths are configuration, with the original literal
// names preserved as defaults so a default run is behaviorally identical.

use std::path::{Path, PathBuf};

/// Default raw table as published by the Bee Informed Partnership survey.
pub const DEFAULT_RAW_LOSS_FILE: &str =
    "BeeInformed_States_Loss_Table_by_Year_public_ready_2022.csv";

/// Default name of the canonicalized intermediate table.
pub const DEFAULT_INTERMEDIATE_FILE: &str = "bee_colony_loss.csv";

/// Default state → ANSI code reference (pipe-delimited Census export).
pub const DEFAULT_ANSI_FILE: &str = "state_ansi.txt";

/// Default state → centroid coordinates reference.
pub const DEFAULT_GEO_FILE: &str = "state_geocords.csv";

/// File locations for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the three source files; derived files land here too.
    pub data_dir: PathBuf,

    /// Raw colony-loss table (read-only input).
    pub raw_loss_file: String,

    /// Canonicalized table written by the loader, re-read by the cleaner.
    pub intermediate_file: String,

    /// State/ANSI reference table.
    pub ansi_file: String,

    /// State centroid reference table.
    pub geo_file: String,
}

impl PipelineConfig {
    /// Config with default filenames rooted at `data_dir`.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        PipelineConfig {
            data_dir: data_dir.as_ref().to_path_buf(),
            raw_loss_file: DEFAULT_RAW_LOSS_FILE.to_string(),
            intermediate_file: DEFAULT_INTERMEDIATE_FILE.to_string(),
            ansi_file: DEFAULT_ANSI_FILE.to_string(),
            geo_file: DEFAULT_GEO_FILE.to_string(),
        }
    }

    pub fn raw_loss_path(&self) -> PathBuf {
        self.data_dir.join(&self.raw_loss_file)
    }

    pub fn intermediate_path(&self) -> PathBuf {
        self.data_dir.join(&self.intermediate_file)
    }

    pub fn ansi_path(&self) -> PathBuf {
        self.data_dir.join(&self.ansi_file)
    }

    pub fn geo_path(&self) -> PathBuf {
        self.data_dir.join(&self.geo_file)
    }
}

impl Default for PipelineConfig {
    /// Matches the original behavior: all files in the working directory.
    fn default() -> Self {
        PipelineConfig::new(".")
    }
}

//! Pipeline configuration.
//!
//! # Example
//!
//! ```
//! use lob_midprice::{PipelineConfig, SeriesFormat};
//!
//! let config = PipelineConfig::default()
//!     .with_depth(10)
//!     .with_format(SeriesFormat::Json);
//!
//! assert_eq!(config.depth, 10);
//! assert!(config.validate().is_ok());
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LobError, Result};
use crate::render::SeriesFormat;

/// Default number of levels per side.
pub const DEFAULT_DEPTH: usize = 5;

/// Configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Levels per side requested from the reconstruction call.
    ///
    /// Passed through unchecked; a zero depth fails at derivation time.
    pub depth: usize,

    /// Output format for the mid-price series.
    pub format: SeriesFormat,

    /// Directory for per-input outputs. `None` writes to stdout.
    pub output_dir: Option<PathBuf>,

    /// Accepted input file extensions (without dot). Empty accepts anything.
    pub input_extensions: Vec<String>,

    /// Worker threads for batch runs. `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            format: SeriesFormat::Csv,
            output_dir: None,
            input_extensions: Vec::new(),
            threads: None,
        }
    }
}

impl PipelineConfig {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_format(mut self, format: SeriesFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_input_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_extensions = extensions
            .into_iter()
            .map(|e| {
                let e: String = e.into();
                e.trim_start_matches('.').to_string()
            })
            .collect();
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Validate the configuration.
    ///
    /// Checks the output directory and thread count; depth is left to the
    /// reconstruction call.
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.output_dir {
            if !dir.exists() {
                return Err(LobError::Config(format!(
                    "output path {} does not exist",
                    dir.display()
                )));
            }
            if !dir.is_dir() {
                return Err(LobError::Config(format!(
                    "output path {} is not a directory",
                    dir.display()
                )));
            }
        }
        if self.threads == Some(0) {
            return Err(LobError::Config("threads must be > 0".to_string()));
        }
        Ok(())
    }

    /// Resolve and check an input path.
    ///
    /// Returns the canonical path. A missing file is `FileNotFound`; a
    /// directory or a file with an unaccepted extension is `InvalidInput`.
    pub fn validate_input(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let resolved = std::fs::canonicalize(path).map_err(|e| LobError::io(path, e))?;

        if !resolved.is_file() {
            return Err(LobError::InvalidInput {
                path: resolved,
                reason: "not a regular file".to_string(),
            });
        }

        if !self.input_extensions.is_empty() {
            let ext = resolved.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !self.input_extensions.iter().any(|accepted| accepted == ext) {
                return Err(LobError::InvalidInput {
                    reason: format!(
                        "extension '{ext}' not in accepted list {:?}",
                        self.input_extensions
                    ),
                    path: resolved,
                });
            }
        }

        Ok(resolved)
    }

    /// Save configuration to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| LobError::io(path, e))
    }

    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| LobError::io(path, e))?;
        serde_json::from_str(&json)
            .map_err(|e| LobError::Config(format!("{}: {e}", path.display())))
    }
}

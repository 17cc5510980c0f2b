//! The mid-price pipeline.
//!
//! ```text
//! path, depth ──reconstruct──▶ LobMatrix ──mid_price_series──▶ MidPriceSeries ──▶ sink
//! ```
//!
//! A single run is synchronous and performs no recovery: whatever the
//! reconstruction call, the derivation or the output writer returns is
//! handed back to the caller. Batch runs fan out over files with rayon and
//! collect one result per input.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use ahash::AHashMap;
use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::error::{LobError, Result};
use crate::features::{mid_price_series, MidPriceSeries};
use crate::loader::{temp_path_for, IO_BUFFER_SIZE};
use crate::render::render_series;
use crate::source::{Reconstruct, SourceMetadata};
use crate::statistics::{RunningStats, SeriesSummary};

/// Result of running one input through the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub input: PathBuf,
    pub metadata: SourceMetadata,
    /// Shape of the reconstructed LOB matrix
    pub shape: (usize, usize),
    pub series: MidPriceSeries,
    pub summary: SeriesSummary,
}

/// Per-file outcome of a batch run.
#[derive(Debug, Clone)]
pub struct FileStat {
    pub rows: usize,
    /// Where the series was written, if an output directory is configured
    pub output: Option<PathBuf>,
    pub summary: SeriesSummary,
}

/// Outcome of a batch run, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: IndexMap<PathBuf, Result<FileStat>>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&PathBuf, &FileStat)> {
        self.results
            .iter()
            .filter_map(|(path, r)| r.as_ref().ok().map(|stat| (path, stat)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&PathBuf, &LobError)> {
        self.results
            .iter()
            .filter_map(|(path, r)| r.as_ref().err().map(|err| (path, err)))
    }

    /// True when every input succeeded.
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    /// Mid-price statistics over all successful inputs.
    pub fn combined_mid_price(&self) -> RunningStats {
        self.succeeded()
            .fold(RunningStats::new(), |mut acc, (_, stat)| {
                acc.merge(&stat.summary.mid_price);
                acc
            })
    }
}

/// Reconstruct → derive → render.
///
/// # Example
///
/// ```
/// use lob_midprice::{LobMatrix, Pipeline, PipelineConfig, VecReconstructor};
///
/// let lob = LobMatrix::from_rows(1, vec![
///     vec![0, 10, 5, 12, 5],
///     vec![1, 10, 5, 13, 5],
///     vec![2, 11, 5, 12, 5],
/// ]).unwrap();
/// let source = VecReconstructor::new().with_matrix("day.qsh", lob);
///
/// let pipeline = Pipeline::new(source, PipelineConfig::new(1));
/// let out = pipeline.run("day.qsh").unwrap();
/// assert_eq!(out.series.mid_price, vec![11.0, 11.5, 11.5]);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline<R> {
    reconstructor: R,
    config: PipelineConfig,
}

impl<R: Reconstruct> Pipeline<R> {
    pub fn new(reconstructor: R, config: PipelineConfig) -> Self {
        Self {
            reconstructor,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn reconstructor(&self) -> &R {
        &self.reconstructor
    }

    /// Run one input: reconstruct at the configured depth and derive the
    /// mid-price series.
    pub fn run(&self, path: impl AsRef<Path>) -> Result<PipelineOutput> {
        let path = path.as_ref();
        let metadata = self.reconstructor.metadata(path);
        let start = Instant::now();

        let matrix = self.reconstructor.reconstruct(path, self.config.depth)?;
        log::debug!(
            "Reconstructed {}: shape={:?} in {:.3}s",
            path.display(),
            matrix.shape(),
            start.elapsed().as_secs_f64()
        );

        let series = mid_price_series(&matrix)?;
        let summary = SeriesSummary::from_series(&series);

        log::info!(
            "{} [{}]: {}",
            path.display(),
            metadata.instrument.as_deref().unwrap_or("?"),
            summary.summary()
        );

        Ok(PipelineOutput {
            input: path.to_path_buf(),
            metadata,
            shape: matrix.shape(),
            series,
            summary,
        })
    }

    /// Write the series of `output` to `writer` in the configured format.
    pub fn render<W: Write>(&self, output: &PipelineOutput, writer: W) -> Result<()> {
        render_series(&output.series, self.config.format, writer)
    }

    /// Output file for `input`: `<output_dir>/<base>.mid.<ext>`.
    ///
    /// `<base>` is the input file name without its last extension (and
    /// without `.zst`). `None` without an output directory.
    pub fn output_path_for(&self, input: &Path) -> Option<PathBuf> {
        let dir = self.config.output_dir.as_ref()?;
        let name = input.file_name()?.to_str()?;
        let name = name.strip_suffix(".zst").unwrap_or(name);
        let base = name.rsplit_once('.').map_or(name, |(base, _)| base);
        Some(dir.join(format!(
            "{base}.mid.{}",
            self.config.format.extension()
        )))
    }

    /// Write `output` into the output directory.
    ///
    /// Returns the written path, or `None` when no output directory is set.
    pub fn write_output(&self, output: &PipelineOutput) -> Result<Option<PathBuf>> {
        let Some(target) = self.output_path_for(&output.input) else {
            return Ok(None);
        };

        let temp_path = temp_path_for(&target);
        let result = File::create(&temp_path)
            .map_err(|e| LobError::io(&temp_path, e))
            .and_then(|file| {
                let mut writer = BufWriter::with_capacity(IO_BUFFER_SIZE, file);
                self.render(output, &mut writer)?;
                writer.flush().map_err(|e| LobError::io(&temp_path, e))
            })
            .and_then(|_| fs::rename(&temp_path, &target).map_err(|e| LobError::io(&target, e)));

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        log::debug!("Wrote {}", target.display());
        Ok(Some(target))
    }

    /// Inputs whose output file would be shared with another input, each
    /// mapped to the `InvalidInput` it fails with.
    ///
    /// `/d1/SBER.json` and `/d2/SBER.json` (or `a.json` and `a.json.zst`)
    /// both map to `SBER.mid.csv`; none of them is written.
    fn output_collisions(&self, inputs: &[PathBuf]) -> AHashMap<PathBuf, LobError> {
        let mut by_target: IndexMap<PathBuf, Vec<&PathBuf>> = IndexMap::new();
        for input in inputs {
            if let Some(target) = self.output_path_for(input) {
                by_target.entry(target).or_default().push(input);
            }
        }

        let mut collisions = AHashMap::new();
        for (target, sharing) in by_target.into_iter().filter(|(_, s)| s.len() > 1) {
            let names = sharing
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            log::warn!("{} would be written by {names}", target.display());
            for input in sharing {
                collisions.insert(
                    input.clone(),
                    LobError::InvalidInput {
                        path: input.clone(),
                        reason: format!("output {} is shared by {names}", target.display()),
                    },
                );
            }
        }
        collisions
    }

    fn process(&self, input: &Path) -> Result<FileStat> {
        let output = self.run(input)?;
        let written = self.write_output(&output)?;
        Ok(FileStat {
            rows: output.series.len(),
            output: written,
            summary: output.summary,
        })
    }
}

impl<R: Reconstruct + Sync> Pipeline<R> {
    /// Run every input in parallel, writing outputs when an output
    /// directory is configured.
    ///
    /// Duplicate inputs are processed once. Distinct inputs that would
    /// write the same output file all fail with `InvalidInput` and are not
    /// processed. Per-file failures are reported in the `BatchReport`; only
    /// an invalid thread-pool setup fails the whole call.
    pub fn run_batch<I, P>(&self, inputs: I) -> Result<BatchReport>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let inputs: Vec<PathBuf> = inputs
            .into_iter()
            .map(Into::into)
            .collect::<IndexSet<PathBuf>>()
            .into_iter()
            .collect();

        log::info!(
            "Processing {} input(s) at depth {}",
            inputs.len(),
            self.config.depth
        );

        let collisions = self.output_collisions(&inputs);

        let work = || {
            inputs
                .par_iter()
                .map(|input| {
                    let result = match collisions.get(input) {
                        Some(err) => Err(err.clone()),
                        None => self.process(input),
                    };
                    if let Err(e) = &result {
                        log::error!("{}: {e}", input.display());
                    }
                    (input.clone(), result)
                })
                .collect::<Vec<_>>()
        };

        let results = match self.config.threads {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| LobError::Config(format!("failed to build thread pool: {e}")))?
                .install(work),
            None => work(),
        };

        Ok(BatchReport {
            results: results.into_iter().collect(),
        })
    }
}

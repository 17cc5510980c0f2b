//! Reconstruction contract and in-memory sources.
//!
//! The order-book reconstruction itself belongs to an external library. This
//! module pins down the only interface the pipeline consumes:
//!
//! ```text
//! reconstruct(file_path, depth) -> LobMatrix
//! ```
//!
//! # Design Goals
//!
//! - **Opaque collaborator**: the pipeline never looks inside the log format
//! - **Pass-through failures**: errors from the collaborator reach the caller unmodified
//! - **Testable**: `VecReconstructor` stands in for the real library in tests
//!
//! # Plugging in a reconstruction library
//!
//! ```
//! use std::path::Path;
//! use lob_midprice::source::{FnReconstructor, Reconstruct};
//! use lob_midprice::{LobMatrix, Result};
//!
//! fn external_lob(_path: &Path, depth: usize) -> Result<LobMatrix> {
//!     // call into the reconstruction library here
//!     LobMatrix::new(depth)
//! }
//!
//! let source = FnReconstructor::new(external_lob);
//! let lob = source.reconstruct(Path::new("Si-3.20.2020-03-17.OrdLog.qsh"), 5).unwrap();
//! assert_eq!(lob.n_cols(), 21);
//! ```

use std::path::{Path, PathBuf};

use ahash::AHashMap;

use crate::error::{LobError, Result};
use crate::types::LobMatrix;

// ============================================================================
// Source Metadata
// ============================================================================

/// Metadata about an input file.
///
/// Used for logging and for naming output files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMetadata {
    /// Instrument code (e.g., "Si-3.20", "SBER")
    pub instrument: Option<String>,

    /// Trading date in YYYY-MM-DD format
    pub date: Option<String>,

    /// Stream kind embedded in the file name (e.g., "OrdLog", "Quotes")
    pub stream: Option<String>,

    /// Original file path
    pub file_path: Option<PathBuf>,

    /// Provider name (e.g., "memory", "dump")
    pub provider: Option<String>,

    /// File size in bytes (if applicable)
    pub file_size: Option<u64>,
}

impl SourceMetadata {
    /// Create new empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the instrument.
    pub fn with_instrument(mut self, instrument: impl Into<String>) -> Self {
        self.instrument = Some(instrument.into());
        self
    }

    /// Set the date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Set the file path.
    pub fn with_file_path(mut self, path: impl AsRef<Path>) -> Self {
        self.file_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the provider.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Extract metadata from a file path.
    ///
    /// Recognised file name patterns:
    /// - `Si-3.20.2020-03-17.OrdLog.qsh` → instrument="Si-3.20", date="2020-03-17", stream="OrdLog"
    /// - `SBER.2020-03-17.json.zst` → instrument="SBER", date="2020-03-17"
    /// - `SBER.json` → instrument="SBER"
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut metadata = Self::new().with_file_path(path);

        if let Ok(meta) = std::fs::metadata(path) {
            metadata.file_size = Some(meta.len());
        }

        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            return metadata;
        };

        let mut base = filename;
        for ext in [".zst", ".json", ".qsh"] {
            base = base.strip_suffix(ext).unwrap_or(base);
        }

        // trailing alphabetic component is the stream kind
        if let Some((rest, stream)) = base.rsplit_once('.') {
            if !stream.is_empty() && stream.chars().all(|c| c.is_ascii_alphabetic()) {
                metadata.stream = Some(stream.to_string());
                base = rest;
            }
        }

        // then an optional `.YYYY-MM-DD` suffix
        if let Some((rest, date)) = base.rsplit_once('.') {
            if looks_like_date(date) && !rest.is_empty() {
                metadata.date = Some(date.to_string());
                base = rest;
            }
        }

        if !base.is_empty() {
            metadata.instrument = Some(base.to_string());
        }

        metadata
    }
}

fn looks_like_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

// ============================================================================
// Reconstruction Trait
// ============================================================================

/// The order-book reconstruction call.
///
/// Implementations turn a file path and a depth into a LOB matrix of shape
/// `(events, 1 + 4 * depth)`.
///
/// # Implementation Notes
///
/// - A missing input must fail with `LobError::FileNotFound`, never yield an
///   empty matrix
/// - Depth validation is the implementation's business; callers do not guard it
/// - No side effects beyond reading the input
pub trait Reconstruct {
    /// Reconstruct the LOB snapshot matrix for `path` with `depth` levels per side.
    fn reconstruct(&self, path: &Path, depth: usize) -> Result<LobMatrix>;

    /// Metadata about `path`.
    ///
    /// Defaults to what can be parsed from the file name.
    fn metadata(&self, path: &Path) -> SourceMetadata {
        SourceMetadata::from_path(path)
    }
}

impl<R: Reconstruct + ?Sized> Reconstruct for &R {
    fn reconstruct(&self, path: &Path, depth: usize) -> Result<LobMatrix> {
        (**self).reconstruct(path, depth)
    }

    fn metadata(&self, path: &Path) -> SourceMetadata {
        (**self).metadata(path)
    }
}

impl<R: Reconstruct + ?Sized> Reconstruct for Box<R> {
    fn reconstruct(&self, path: &Path, depth: usize) -> Result<LobMatrix> {
        (**self).reconstruct(path, depth)
    }

    fn metadata(&self, path: &Path) -> SourceMetadata {
        (**self).metadata(path)
    }
}

// ============================================================================
// Function Adapter
// ============================================================================

/// Adapts a plain function or closure to `Reconstruct`.
///
/// This is where an external reconstruction library is wired in.
#[derive(Debug, Clone)]
pub struct FnReconstructor<F> {
    f: F,
    provider: String,
}

impl<F> FnReconstructor<F>
where
    F: Fn(&Path, usize) -> Result<LobMatrix>,
{
    /// Wrap `f`.
    pub fn new(f: F) -> Self {
        Self {
            f,
            provider: "external".to_string(),
        }
    }

    /// Set the provider name reported in metadata.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }
}

impl<F> Reconstruct for FnReconstructor<F>
where
    F: Fn(&Path, usize) -> Result<LobMatrix>,
{
    fn reconstruct(&self, path: &Path, depth: usize) -> Result<LobMatrix> {
        (self.f)(path, depth)
    }

    fn metadata(&self, path: &Path) -> SourceMetadata {
        SourceMetadata::from_path(path).with_provider(self.provider.clone())
    }
}

// ============================================================================
// Vector Source (for testing)
// ============================================================================

/// In-memory reconstructor keyed by path.
///
/// Each registered matrix is served at any depth up to its own; deeper
/// requests fail with `DepthExceeded`, unknown paths with `FileNotFound`.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use lob_midprice::source::{Reconstruct, VecReconstructor};
/// use lob_midprice::LobMatrix;
///
/// let m = LobMatrix::from_rows(1, vec![vec![0, 10, 5, 12, 5]]).unwrap();
/// let source = VecReconstructor::new().with_matrix("day1.qsh", m);
///
/// let lob = source.reconstruct(Path::new("day1.qsh"), 1).unwrap();
/// assert_eq!(lob.n_rows(), 1);
/// assert!(source.reconstruct(Path::new("day2.qsh"), 1).unwrap_err().is_not_found());
/// ```
#[derive(Debug, Clone, Default)]
pub struct VecReconstructor {
    matrices: AHashMap<PathBuf, LobMatrix>,
}

impl VecReconstructor {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `matrix` under `path`.
    pub fn with_matrix(mut self, path: impl Into<PathBuf>, matrix: LobMatrix) -> Self {
        self.insert(path, matrix);
        self
    }

    /// Register `matrix` under `path`, replacing any previous one.
    pub fn insert(&mut self, path: impl Into<PathBuf>, matrix: LobMatrix) -> Option<LobMatrix> {
        self.matrices.insert(path.into(), matrix)
    }

    /// Number of registered inputs.
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }
}

impl Reconstruct for VecReconstructor {
    fn reconstruct(&self, path: &Path, depth: usize) -> Result<LobMatrix> {
        self.matrices
            .get(path)
            .ok_or_else(|| LobError::FileNotFound(path.to_path_buf()))?
            .truncate_depth(depth)
    }

    fn metadata(&self, path: &Path) -> SourceMetadata {
        SourceMetadata::from_path(path).with_provider("memory")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn depth2() -> LobMatrix {
        LobMatrix::from_rows(2, vec![vec![0, 10, 5, 12, 5, 9, 1, 13, 2]]).unwrap()
    }

    #[test]
    fn test_source_metadata_builder() {
        let meta = SourceMetadata::new()
            .with_instrument("Si-3.20")
            .with_date("2020-03-17")
            .with_provider("memory");

        assert_eq!(meta.instrument.as_deref(), Some("Si-3.20"));
        assert_eq!(meta.date.as_deref(), Some("2020-03-17"));
        assert_eq!(meta.provider.as_deref(), Some("memory"));
    }

    #[test]
    fn test_source_metadata_from_path() {
        let meta = SourceMetadata::from_path("/data/zerich/Si-3.20.2020-03-17.OrdLog.qsh");
        assert_eq!(meta.instrument.as_deref(), Some("Si-3.20"));
        assert_eq!(meta.date.as_deref(), Some("2020-03-17"));
        assert_eq!(meta.stream.as_deref(), Some("OrdLog"));

        let meta = SourceMetadata::from_path("/data/USD000UTSTOM.2020-03-17.Quotes.qsh");
        assert_eq!(meta.instrument.as_deref(), Some("USD000UTSTOM"));
        assert_eq!(meta.stream.as_deref(), Some("Quotes"));

        let meta = SourceMetadata::from_path("SBER.2020-03-17.json.zst");
        assert_eq!(meta.instrument.as_deref(), Some("SBER"));
        assert_eq!(meta.date.as_deref(), Some("2020-03-17"));
        assert!(meta.stream.is_none());

        // dotted instrument without date
        let meta = SourceMetadata::from_path("Si-3.20.json");
        assert_eq!(meta.instrument.as_deref(), Some("Si-3.20"));
        assert!(meta.date.is_none());
        assert!(meta.file_size.is_none());
    }

    #[test]
    fn test_vec_reconstructor_truncates_depth() {
        let source = VecReconstructor::new().with_matrix("a.qsh", depth2());
        assert_eq!(source.len(), 1);

        let lob = source.reconstruct(Path::new("a.qsh"), 1).unwrap();
        assert_eq!(lob.shape(), (1, 5));
        assert_eq!(lob.row(0), Some(&[0, 10, 5, 12, 5][..]));
    }

    #[test]
    fn test_vec_reconstructor_errors() {
        let source = VecReconstructor::new().with_matrix("a.qsh", depth2());

        let err = source.reconstruct(Path::new("b.qsh"), 1).unwrap_err();
        assert_eq!(err, LobError::FileNotFound(PathBuf::from("b.qsh")));

        let err = source.reconstruct(Path::new("a.qsh"), 3).unwrap_err();
        assert!(matches!(err, LobError::DepthExceeded { requested: 3, recorded: 2 }));
    }

    #[test]
    fn test_vec_reconstructor_metadata() {
        let source = VecReconstructor::new();
        let meta = source.metadata(Path::new("SBER.2020-03-17.OrdLog.qsh"));
        assert_eq!(meta.provider.as_deref(), Some("memory"));
        assert_eq!(meta.instrument.as_deref(), Some("SBER"));
    }

    #[test]
    fn test_fn_reconstructor_passes_errors_through() {
        let source = FnReconstructor::new(|path: &Path, _depth| {
            Err(LobError::malformed(path, "truncated log"))
        })
        .with_provider("stub");

        let err = source.reconstruct(Path::new("x.qsh"), 5).unwrap_err();
        assert_eq!(err, LobError::malformed("x.qsh", "truncated log"));
        assert_eq!(source.metadata(Path::new("x.qsh")).provider.as_deref(), Some("stub"));
    }

    #[test]
    fn test_boxed_reconstructor() {
        let boxed: Box<dyn Reconstruct> =
            Box::new(VecReconstructor::new().with_matrix("a.qsh", depth2()));
        assert_eq!(boxed.reconstruct(Path::new("a.qsh"), 2).unwrap().depth(), 2);
    }
}

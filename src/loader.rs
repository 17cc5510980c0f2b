//! LOB dump loading.
//!
//! The reconstruction library can export the matrices it builds as JSON
//! documents of the form `{"depth": D, "rows": [[...], ...]}`. This module
//! reads such exports back as a `Reconstruct` implementation, with:
//! - Automatic zstd decompression for `*.zst` files (`compression` feature)
//! - Large I/O buffer (1MB)
//! - Depth selection by column prefix (any depth up to the recorded one)
//!
//! # Example
//!
//! ```ignore
//! use lob_midprice::{DumpReconstructor, Reconstruct};
//!
//! let loader = DumpReconstructor::new();
//! let lob = loader.reconstruct("data/Si-3.20.2020-03-17.json.zst".as_ref(), 5)?;
//! println!("{:?}", lob.shape());
//! ```

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{LobError, Result};
use crate::source::{Reconstruct, SourceMetadata};
use crate::types::LobMatrix;

/// I/O buffer size for dump reading and writing.
pub const IO_BUFFER_SIZE: usize = 1024 * 1024; // 1 MB

/// zstd level used when writing compressed dumps.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Whether `path` names a zstd-compressed dump.
pub fn is_compressed(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "zst")
}

/// Reconstructor backed by LOB dumps on disk.
///
/// # Errors
///
/// - `FileNotFound` if the dump does not exist
/// - `MalformedInput` if the content is not a valid dump
/// - `DepthExceeded` if more levels are requested than were exported
#[derive(Debug, Clone, Default)]
pub struct DumpReconstructor {
    _private: (),
}

impl DumpReconstructor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reconstruct for DumpReconstructor {
    fn reconstruct(&self, path: &Path, depth: usize) -> Result<LobMatrix> {
        let matrix = read_dump(path)?;
        log::debug!(
            "Loaded dump {}: shape={:?}, recorded depth={}, requested depth={}",
            path.display(),
            matrix.shape(),
            matrix.depth(),
            depth
        );
        matrix.truncate_depth(depth)
    }

    fn metadata(&self, path: &Path) -> SourceMetadata {
        SourceMetadata::from_path(path).with_provider("dump")
    }
}

/// Read a full LOB dump at its recorded depth.
pub fn read_dump(path: impl AsRef<Path>) -> Result<LobMatrix> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| LobError::io(path, e))?;
    let reader = BufReader::with_capacity(IO_BUFFER_SIZE, file);

    if is_compressed(path) {
        decode_compressed(path, reader)
    } else {
        decode(path, reader)
    }
}

fn decode<R: Read>(path: &Path, reader: R) -> Result<LobMatrix> {
    serde_json::from_reader(reader).map_err(|e| LobError::malformed(path, e.to_string()))
}

#[cfg(feature = "compression")]
fn decode_compressed<R: std::io::BufRead>(path: &Path, reader: R) -> Result<LobMatrix> {
    let decoder = zstd::stream::read::Decoder::with_buffer(reader)
        .map_err(|e| LobError::malformed(path, format!("zstd: {e}")))?;
    decode(path, decoder)
}

#[cfg(not(feature = "compression"))]
fn decode_compressed<R: std::io::BufRead>(path: &Path, _reader: R) -> Result<LobMatrix> {
    Err(LobError::malformed(
        path,
        "compressed dumps require the `compression` feature",
    ))
}

/// Temporary sibling of `path` for atomic writes: the full file name plus `.tmp`.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `matrix` as a dump at `path`, zstd-compressed when the name ends in `.zst`.
///
/// Writes to a temporary sibling first and renames it into place.
pub fn write_dump(path: impl AsRef<Path>, matrix: &LobMatrix) -> Result<()> {
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    let result = write_dump_to(&temp_path, is_compressed(path), matrix)
        .and_then(|_| fs::rename(&temp_path, path).map_err(|e| LobError::io(path, e)));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_dump_to(path: &Path, compress: bool, matrix: &LobMatrix) -> Result<()> {
    let file = File::create(path).map_err(|e| LobError::io(path, e))?;
    let writer = BufWriter::with_capacity(IO_BUFFER_SIZE, file);

    if compress {
        encode_compressed(path, writer, matrix)
    } else {
        encode(path, writer, matrix)
    }
}

fn encode<W: Write>(path: &Path, mut writer: W, matrix: &LobMatrix) -> Result<()> {
    serde_json::to_writer(&mut writer, matrix)
        .map_err(|e| LobError::Output(format!("failed to encode {}: {e}", path.display())))?;
    writer.flush().map_err(|e| LobError::io(path, e))
}

#[cfg(feature = "compression")]
fn encode_compressed<W: Write>(path: &Path, writer: W, matrix: &LobMatrix) -> Result<()> {
    let mut encoder = zstd::stream::write::Encoder::new(writer, DEFAULT_COMPRESSION_LEVEL)
        .map_err(|e| LobError::io(path, e))?;
    serde_json::to_writer(&mut encoder, matrix)
        .map_err(|e| LobError::Output(format!("failed to encode {}: {e}", path.display())))?;
    encoder
        .finish()
        .and_then(|mut w| w.flush())
        .map_err(|e| LobError::io(path, e))
}

#[cfg(not(feature = "compression"))]
fn encode_compressed<W: Write>(path: &Path, _writer: W, _matrix: &LobMatrix) -> Result<()> {
    Err(LobError::Output(format!(
        "cannot write {}: compressed dumps require the `compression` feature",
        path.display()
    )))
}

//! # lob-midprice
//!
//! Limit-order-book snapshot matrices to mid-price series.
//!
//! The order-book reconstruction (log parsing, book state, depth
//! aggregation) is an external collaborator behind the [`Reconstruct`]
//! trait. This crate owns the pipeline around it:
//!
//! 1. **Input resolution**: a file path and a depth
//! 2. **Reconstruction call**: `reconstruct(path, depth) -> LobMatrix`
//! 3. **Feature derivation**: `mid = (bid1_price + ask1_price) / 2`
//! 4. **Visualization**: the series is written chart-ready (CSV/JSON)
//!
//! ## LOB matrix layout
//!
//! One row per snapshot, `1 + 4 * depth` columns:
//!
//! ```text
//! [timestamp, bid1_price, bid1_size, ask1_price, ask1_size, bid2_price, ...]
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use lob_midprice::{mid_prices, LobMatrix};
//!
//! let lob = LobMatrix::from_rows(1, vec![
//!     vec![0, 10, 5, 12, 5],
//!     vec![1, 10, 5, 13, 5],
//!     vec![2, 11, 5, 12, 5],
//! ]).unwrap();
//!
//! assert_eq!(mid_prices(&lob).unwrap(), vec![11.0, 11.5, 11.5]);
//! ```
//!
//! ### From a LOB dump on disk
//!
//! ```ignore
//! use lob_midprice::{DumpReconstructor, Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(DumpReconstructor::new(), PipelineConfig::new(5));
//! let out = pipeline.run("data/Si-3.20.2020-03-17.json.zst")?;
//! pipeline.render(&out, std::io::stdout().lock())?;
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | `LobMatrix`, column layout constants |
//! | [`source`] | `Reconstruct` contract, `VecReconstructor`, `FnReconstructor` |
//! | [`loader`] | `DumpReconstructor` for exported matrices (JSON, zstd) |
//! | [`features`] | Mid-price derivation |
//! | [`statistics`] | `RunningStats`, `SeriesSummary` |
//! | [`render`] | Chart-ready CSV/JSON output |
//! | [`config`] | `PipelineConfig` |
//! | [`pipeline`] | `Pipeline`, batch runs |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `compression` | ✅ | zstd-compressed dumps (`*.zst`) |

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod features;
pub mod loader;
pub mod pipeline;
pub mod render;
pub mod source;
pub mod statistics;
pub mod types;

// Re-exports - Core types
pub use error::{LobError, Result};
pub use types::{
    row_width, LevelQuote, LobMatrix, MatrixDump, Price, Side, Timestamp, Volume,
    BEST_ASK_PRICE_COLUMN, BEST_BID_PRICE_COLUMN, COLUMNS_PER_LEVEL, TIMESTAMP_COLUMN,
};

// Re-exports - Reconstruction
pub use loader::{read_dump, write_dump, DumpReconstructor};
pub use source::{FnReconstructor, Reconstruct, SourceMetadata, VecReconstructor};

// Re-exports - Features and output
pub use features::{mid_price_series, mid_prices, MidPriceSeries};
pub use render::{render_series, CsvSink, JsonSink, SeriesFormat, SeriesSink};
pub use statistics::{RunningStats, SeriesSummary};

// Re-exports - Pipeline
pub use config::{PipelineConfig, DEFAULT_DEPTH};
pub use pipeline::{BatchReport, FileStat, Pipeline, PipelineOutput};

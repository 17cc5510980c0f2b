//! Chart-ready output of mid-price series.
//!
//! Drawing the chart is left to whatever consumes these files; this module
//! only writes the line series in a form a charting tool reads directly:
//!
//! - CSV: `timestamp,mid_price` header, one row per snapshot
//! - JSON: `{"timestamps": [...], "mid_price": [...]}`

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LobError, Result};
use crate::features::MidPriceSeries;
use crate::types::Timestamp;

/// Output format for the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesFormat {
    #[default]
    Csv,
    Json,
}

impl SeriesFormat {
    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            SeriesFormat::Csv => "csv",
            SeriesFormat::Json => "json",
        }
    }
}

impl fmt::Display for SeriesFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SeriesFormat {
    type Err = LobError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(SeriesFormat::Csv),
            "json" => Ok(SeriesFormat::Json),
            other => Err(LobError::Config(format!(
                "unknown output format '{other}' (expected csv or json)"
            ))),
        }
    }
}

/// Receiver of a finished mid-price series.
///
/// Implemented by the file writers below; a plotting backend implements it
/// to draw the line chart.
pub trait SeriesSink {
    fn render(&mut self, series: &MidPriceSeries) -> Result<()>;
}

#[derive(Serialize)]
struct SeriesRow {
    timestamp: Timestamp,
    mid_price: f64,
}

const CSV_HEADER: [&str; 2] = ["timestamp", "mid_price"];

/// CSV writer.
///
/// The header is written once per sink, before the first rendered series,
/// even if that series is empty.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().has_headers(false).from_writer(writer),
            header_written: false,
        }
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| LobError::Output(format!("failed to flush CSV output: {}", e.error())))
    }
}

impl<W: Write> SeriesSink for CsvSink<W> {
    fn render(&mut self, series: &MidPriceSeries) -> Result<()> {
        if !self.header_written {
            self.writer.write_record(CSV_HEADER)?;
            self.header_written = true;
        }
        for (timestamp, mid_price) in series.iter() {
            self.writer.serialize(SeriesRow {
                timestamp,
                mid_price,
            })?;
        }
        self.writer
            .flush()
            .map_err(|e| LobError::Output(format!("failed to flush CSV output: {e}")))
    }
}

/// JSON writer.
pub struct JsonSink<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
        }
    }

    /// Pretty-print the document.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SeriesSink for JsonSink<W> {
    fn render(&mut self, series: &MidPriceSeries) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, series)?;
        } else {
            serde_json::to_writer(&mut self.writer, series)?;
        }
        self.writer
            .write_all(b"\n")
            .and_then(|_| self.writer.flush())
            .map_err(|e| LobError::Output(format!("failed to write JSON output: {e}")))
    }
}

/// Write `series` to `writer` in `format`.
pub fn render_series<W: Write>(series: &MidPriceSeries, format: SeriesFormat, writer: W) -> Result<()> {
    match format {
        SeriesFormat::Csv => CsvSink::new(writer).render(series),
        SeriesFormat::Json => JsonSink::new(writer).render(series),
    }
}

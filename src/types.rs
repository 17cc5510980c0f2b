//! Core data types for LOB snapshot matrices.
//!
//! A LOB matrix is the output of the reconstruction call: one row per
//! snapshot event, laid out level-major:
//!
//! ```text
//! [timestamp, bid1_price, bid1_size, ask1_price, ask1_size, bid2_price, ...]
//! ```
//!
//! Storage is a single row-major `Vec<i64>`, so a depth-`d` prefix of every
//! row is itself a valid depth-`d` row.

use serde::{Deserialize, Serialize};

use crate::error::{LobError, Result};

/// Snapshot timestamp (Unix milliseconds, as emitted by the reconstruction library)
pub type Timestamp = i64;

/// Price in exchange points/ticks
pub type Price = i64;

/// Aggregated level size in lots
pub type Volume = i64;

/// Columns emitted per price level: bid price, bid size, ask price, ask size.
pub const COLUMNS_PER_LEVEL: usize = 4;

/// Column holding the snapshot timestamp.
pub const TIMESTAMP_COLUMN: usize = 0;

/// Column holding the best bid price.
pub const BEST_BID_PRICE_COLUMN: usize = 1;

/// Column holding the best ask price.
pub const BEST_ASK_PRICE_COLUMN: usize = 3;

/// Row width of a matrix with `depth` levels per side.
///
/// `None` when `1 + 4 * depth` does not fit in a `usize`.
#[inline(always)]
pub fn row_width(depth: usize) -> Option<usize> {
    COLUMNS_PER_LEVEL.checked_mul(depth)?.checked_add(1)
}

fn checked_width(depth: usize) -> Result<usize> {
    row_width(depth).ok_or(LobError::DepthOverflow { depth })
}

/// Book side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy side
    Bid,
    /// Sell side
    Ask,
}

impl Side {
    /// Column offset of this side's price within a level block.
    #[inline(always)]
    fn price_offset(self) -> usize {
        match self {
            Side::Bid => 0,
            Side::Ask => 2,
        }
    }
}

/// Both sides of one price level in one snapshot row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelQuote {
    pub bid_price: Price,
    pub bid_size: Volume,
    pub ask_price: Price,
    pub ask_size: Volume,
}

/// Two-dimensional LOB snapshot matrix of shape `(rows, 1 + 4 * depth)`.
///
/// # Example
///
/// ```
/// use lob_midprice::LobMatrix;
///
/// let m = LobMatrix::from_rows(1, vec![
///     vec![0, 10, 5, 12, 5],
///     vec![1, 10, 5, 13, 5],
/// ]).unwrap();
///
/// assert_eq!(m.shape(), (2, 5));
/// assert_eq!(m.get(1, 3), Some(13));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MatrixDump", into = "MatrixDump")]
pub struct LobMatrix {
    depth: usize,
    width: usize,
    rows: usize,
    data: Vec<i64>,
}

impl LobMatrix {
    /// Create an empty matrix for `depth` levels per side.
    ///
    /// # Errors
    ///
    /// `DepthOverflow` if the row width for `depth` does not fit in a `usize`.
    pub fn new(depth: usize) -> Result<Self> {
        Ok(Self {
            depth,
            width: checked_width(depth)?,
            rows: 0,
            data: Vec::new(),
        })
    }

    /// Create an empty matrix with room for `rows` snapshots.
    ///
    /// # Errors
    ///
    /// `DepthOverflow` if the row width or the total capacity overflows.
    pub fn with_capacity(depth: usize, rows: usize) -> Result<Self> {
        let width = checked_width(depth)?;
        let capacity = rows
            .checked_mul(width)
            .ok_or(LobError::DepthOverflow { depth })?;
        Ok(Self {
            depth,
            width,
            rows: 0,
            data: Vec::with_capacity(capacity),
        })
    }

    /// Build a matrix from flat row-major data.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if `data.len()` is not a multiple of the row width.
    pub fn from_shape_vec(depth: usize, data: Vec<i64>) -> Result<Self> {
        let width = checked_width(depth)?;
        if data.len() % width != 0 {
            return Err(LobError::ShapeMismatch {
                depth,
                width,
                len: data.len(),
            });
        }
        Ok(Self {
            depth,
            width,
            rows: data.len() / width,
            data,
        })
    }

    /// Build a matrix from individual rows.
    ///
    /// Every row is checked against the width before anything is allocated,
    /// so an untrusted `depth` cannot size the buffer.
    pub fn from_rows(depth: usize, rows: Vec<Vec<i64>>) -> Result<Self> {
        let width = checked_width(depth)?;
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(LobError::ShapeMismatch {
                depth,
                width,
                len: bad.len(),
            });
        }
        Ok(Self {
            depth,
            width,
            rows: rows.len(),
            data: rows.concat(),
        })
    }

    /// Append one snapshot row.
    pub fn push_row(&mut self, row: &[i64]) -> Result<()> {
        let width = self.n_cols();
        if row.len() != width {
            return Err(LobError::ShapeMismatch {
                depth: self.depth,
                width,
                len: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        self.rows += 1;
        Ok(())
    }

    /// Levels per side.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of snapshot rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (`1 + 4 * depth`).
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.width
    }

    /// `(rows, columns)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.n_cols())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Flat row-major view.
    #[inline]
    pub fn as_slice(&self) -> &[i64] {
        &self.data
    }

    /// Consume into flat row-major data.
    pub fn into_vec(self) -> Vec<i64> {
        self.data
    }

    /// Row `i`, if present.
    #[inline]
    pub fn row(&self, i: usize) -> Option<&[i64]> {
        let width = self.n_cols();
        let start = i.checked_mul(width)?;
        self.data.get(start..start + width)
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[i64]> + '_ {
        self.data.chunks_exact(self.n_cols())
    }

    /// Element at `(row, column)`.
    #[inline]
    pub fn get(&self, row: usize, column: usize) -> Option<i64> {
        if column >= self.n_cols() {
            return None;
        }
        self.row(row).map(|r| r[column])
    }

    /// Copy out one column.
    ///
    /// # Errors
    ///
    /// `ColumnOutOfRange` if `column >= n_cols()`.
    pub fn column(&self, column: usize) -> Result<Vec<i64>> {
        self.check_column(column)?;
        Ok(self.rows().map(|r| r[column]).collect())
    }

    /// Timestamp column.
    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.rows().map(|r| r[TIMESTAMP_COLUMN]).collect()
    }

    /// Fail with `ColumnOutOfRange` unless `column` exists.
    #[inline]
    pub fn check_column(&self, column: usize) -> Result<()> {
        if column >= self.n_cols() {
            return Err(LobError::ColumnOutOfRange {
                column,
                columns: self.n_cols(),
            });
        }
        Ok(())
    }

    /// Price and size at `level` (0 = best) on `side` in row `row`.
    pub fn quote(&self, row: usize, side: Side, level: usize) -> Option<(Price, Volume)> {
        if level >= self.depth {
            return None;
        }
        let col = 1 + level * COLUMNS_PER_LEVEL + side.price_offset();
        let r = self.row(row)?;
        Some((r[col], r[col + 1]))
    }

    /// Both sides of `level` in row `row`.
    pub fn level(&self, row: usize, level: usize) -> Option<LevelQuote> {
        let (bid_price, bid_size) = self.quote(row, Side::Bid, level)?;
        let (ask_price, ask_size) = self.quote(row, Side::Ask, level)?;
        Some(LevelQuote {
            bid_price,
            bid_size,
            ask_price,
            ask_size,
        })
    }

    /// Keep the first `depth` levels of every row.
    ///
    /// # Errors
    ///
    /// `DepthExceeded` if `depth > self.depth()`.
    pub fn truncate_depth(&self, depth: usize) -> Result<LobMatrix> {
        if depth > self.depth {
            return Err(LobError::DepthExceeded {
                requested: depth,
                recorded: self.depth,
            });
        }
        if depth == self.depth {
            return Ok(self.clone());
        }

        let mut out = LobMatrix::with_capacity(depth, self.rows)?;
        for r in self.rows() {
            out.data.extend_from_slice(&r[..out.width]);
        }
        out.rows = self.rows;
        Ok(out)
    }
}

/// Serialized form of a `LobMatrix`: `{"depth": D, "rows": [[...], ...]}`.
///
/// This is the export layout the reconstruction library writes and the
/// layout `loader` reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixDump {
    pub depth: usize,
    pub rows: Vec<Vec<i64>>,
}

impl TryFrom<MatrixDump> for LobMatrix {
    type Error = LobError;

    fn try_from(dump: MatrixDump) -> Result<Self> {
        LobMatrix::from_rows(dump.depth, dump.rows)
    }
}

impl From<LobMatrix> for MatrixDump {
    fn from(matrix: LobMatrix) -> Self {
        MatrixDump {
            depth: matrix.depth,
            rows: matrix.rows().map(<[i64]>::to_vec).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LobMatrix {
        // depth 2
        LobMatrix::from_rows(
            2,
            vec![
                vec![100, 10, 5, 12, 7, 9, 3, 13, 4],
                vec![101, 11, 6, 12, 8, 10, 2, 14, 1],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_row_width() {
        assert_eq!(row_width(0), Some(1));
        assert_eq!(row_width(1), Some(5));
        assert_eq!(row_width(5), Some(21));
        assert_eq!(row_width(usize::MAX / 4 + 1), None);
    }

    #[test]
    fn test_overflowing_depth_is_rejected() {
        let depth = 1 << (usize::BITS - 2);
        let overflow = LobError::DepthOverflow { depth };

        assert_eq!(LobMatrix::new(depth).unwrap_err(), overflow);
        assert_eq!(LobMatrix::with_capacity(depth, 1).unwrap_err(), overflow);
        assert_eq!(LobMatrix::from_rows(depth, vec![vec![0]]).unwrap_err(), overflow);
        assert_eq!(LobMatrix::from_shape_vec(depth, vec![0]).unwrap_err(), overflow);

        // width fits but the row count does not
        assert!(LobMatrix::with_capacity(usize::MAX / 8, 16).is_err());
    }

    #[test]
    fn test_from_rows_rejects_wide_depth_with_short_rows() {
        let err = LobMatrix::from_rows(1 << 20, vec![vec![0]]).unwrap_err();
        assert!(matches!(err, LobError::ShapeMismatch { len: 1, .. }));
    }

    #[test]
    fn test_from_shape_vec_rejects_ragged_data() {
        let err = LobMatrix::from_shape_vec(1, vec![0, 1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            LobError::ShapeMismatch {
                depth: 1,
                width: 5,
                len: 4
            }
        );
    }

    #[test]
    fn test_from_shape_vec_shape() {
        let m = LobMatrix::from_shape_vec(1, (0..15).collect()).unwrap();
        assert_eq!(m.shape(), (3, 5));
        assert_eq!(m.row(2), Some(&[10, 11, 12, 13, 14][..]));
        assert_eq!(m.row(3), None);
    }

    #[test]
    fn test_push_row_wrong_width() {
        let mut m = LobMatrix::new(1).unwrap();
        assert!(m.push_row(&[0, 1, 2]).is_err());
        assert!(m.is_empty());
        m.push_row(&[0, 1, 2, 3, 4]).unwrap();
        assert_eq!(m.n_rows(), 1);
    }

    #[test]
    fn test_accessors() {
        let m = sample();
        assert_eq!(m.depth(), 2);
        assert_eq!(m.get(0, 0), Some(100));
        assert_eq!(m.get(0, 9), None);
        assert_eq!(m.timestamps(), vec![100, 101]);
        assert_eq!(m.column(BEST_ASK_PRICE_COLUMN).unwrap(), vec![12, 12]);
        assert!(m.column(9).is_err());
    }

    #[test]
    fn test_level_quotes() {
        let m = sample();
        assert_eq!(m.quote(0, Side::Bid, 1), Some((9, 3)));
        assert_eq!(m.quote(1, Side::Ask, 1), Some((14, 1)));
        assert_eq!(m.quote(0, Side::Ask, 2), None);
        assert_eq!(
            m.level(1, 0),
            Some(LevelQuote {
                bid_price: 11,
                bid_size: 6,
                ask_price: 12,
                ask_size: 8
            })
        );
    }

    #[test]
    fn test_truncate_depth_keeps_prefix() {
        let m = sample().truncate_depth(1).unwrap();
        assert_eq!(m.shape(), (2, 5));
        assert_eq!(m.row(0), Some(&[100, 10, 5, 12, 7][..]));

        let degenerate = sample().truncate_depth(0).unwrap();
        assert_eq!(degenerate.shape(), (2, 1));
        assert_eq!(degenerate.timestamps(), vec![100, 101]);
    }

    #[test]
    fn test_truncate_depth_exceeded() {
        let err = sample().truncate_depth(3).unwrap_err();
        assert_eq!(
            err,
            LobError::DepthExceeded {
                requested: 3,
                recorded: 2
            }
        );
    }

    #[test]
    fn test_serde_uses_dump_layout() {
        let m = LobMatrix::from_rows(1, vec![vec![0, 10, 5, 12, 5]]).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"depth":1,"rows":[[0,10,5,12,5]]}"#);

        let back: LobMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);

        let bad = serde_json::from_str::<LobMatrix>(r#"{"depth":1,"rows":[[0,1]]}"#);
        assert!(bad.is_err());
    }
}

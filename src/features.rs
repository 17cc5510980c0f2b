//! Feature derivation from LOB matrices.
//!
//! The only derived feature is the mid-price:
//!
//! ```text
//! mid[i] = (M[i, 1] + M[i, 3]) / 2
//! ```
//!
//! There is no guard on depth: a degenerate matrix (depth 0, one column)
//! fails here with `ColumnOutOfRange`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{LobMatrix, Timestamp, BEST_ASK_PRICE_COLUMN, BEST_BID_PRICE_COLUMN};

/// Mid-price of one snapshot row.
#[inline(always)]
pub fn mid_price(best_bid: i64, best_ask: i64) -> f64 {
    (best_bid as f64 + best_ask as f64) * 0.5
}

/// Mid-price for every row of `matrix`.
///
/// # Errors
///
/// `ColumnOutOfRange` when the matrix has no best-ask column.
pub fn mid_prices(matrix: &LobMatrix) -> Result<Vec<f64>> {
    matrix.check_column(BEST_BID_PRICE_COLUMN)?;
    matrix.check_column(BEST_ASK_PRICE_COLUMN)?;

    Ok(matrix
        .rows()
        .map(|r| mid_price(r[BEST_BID_PRICE_COLUMN], r[BEST_ASK_PRICE_COLUMN]))
        .collect())
}

/// Mid-price series aligned with the snapshot timestamps.
pub fn mid_price_series(matrix: &LobMatrix) -> Result<MidPriceSeries> {
    let mid_price = mid_prices(matrix)?;
    Ok(MidPriceSeries {
        timestamps: matrix.timestamps(),
        mid_price,
    })
}

/// Timestamps and mid-prices, one entry per snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MidPriceSeries {
    pub timestamps: Vec<Timestamp>,
    pub mid_price: Vec<f64>,
}

impl MidPriceSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.mid_price.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mid_price.is_empty()
    }

    /// `(timestamp, mid_price)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.mid_price.iter().copied())
    }

    /// First timestamp, if any.
    pub fn first_timestamp(&self) -> Option<Timestamp> {
        self.timestamps.first().copied()
    }

    /// Last timestamp, if any.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.timestamps.last().copied()
    }
}

//! Mid-price from a reconstructed LOB, handed to a chart.
//!
//! Run with:
//! ```bash
//! cargo run --example plot_mid_price -- data/zerich/Si-3.20.2020-03-17.json.zst > mid.csv
//! ```
//!
//! The CSV on stdout is a `timestamp,mid_price` line series ready for any
//! plotting tool.

use std::path::PathBuf;

use lob_midprice::{
    mid_prices, render_series, DumpReconstructor, MidPriceSeries, Reconstruct, SeriesFormat,
};

fn main() -> lob_midprice::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let file = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("../data/zerich/Si-3.20.2020-03-17.json.zst"));
    let depth = 5;

    let lob = DumpReconstructor::new().reconstruct(&file, depth)?;
    log::info!("LOB matrix shape: {:?}", lob.shape());

    let timestamp = lob.timestamps();
    let mid_price = mid_prices(&lob)?;

    let series = MidPriceSeries {
        timestamps: timestamp,
        mid_price,
    };
    render_series(&series, SeriesFormat::Csv, std::io::stdout().lock())
}

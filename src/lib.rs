//! Daily stock price dashboard backend.
//!
//! Loads a daily series from the Alpha Vantage `TIME_SERIES_DAILY` endpoint or
//! a CSV export, restricts it to a date window, and derives the moving
//! averages, daily change and cumulative return shown next to the raw table.

pub mod alpha_vantage;
pub mod config;
pub mod csv_source;
pub mod dashboard;
pub mod error;
pub mod report;
pub mod series;
pub mod transform;

pub use alpha_vantage::{AlphaVantageClient, parse_daily_response};
pub use config::Config;
pub use csv_source::PriceTable;
pub use dashboard::{
    Dashboard, DashboardRequest, DashboardView, Panel, PanelData, Source, build_view,
};
pub use error::{DashboardError, Result};
pub use report::{OutputFormat, write_report};
pub use series::{DateRange, PriceRow, PriceSeries};
pub use transform::{Column, DerivedRow, DerivedSeries, derive};

use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::alpha_vantage::AlphaVantageClient;
use crate::config::Config;
use crate::csv_source::PriceTable;
use crate::error::{DashboardError, Result};
use crate::series::{DateRange, PriceSeries};
use crate::transform::{Column, DerivedSeries, derive};

/// Where the price series comes from.
#[derive(Debug, Clone)]
pub enum Source {
    Remote {
        symbol: String,
    },
    /// `path: None` reads the configured default file; `column: None` picks
    /// the first value column.
    File {
        path: Option<PathBuf>,
        column: Option<String>,
    },
}

/// One user interaction: a source plus an optional date window.
#[derive(Debug, Clone)]
pub struct DashboardRequest {
    pub source: Source,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Chart panels the presentation layer may draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Panel {
    ClosingPrice,
    Volume,
    MovingAverages,
    Candlestick,
    DailyChange,
    CumulativeReturn,
    RawData,
}

impl Panel {
    pub fn title(&self) -> &'static str {
        match self {
            Panel::ClosingPrice => "Closing Price Over Time",
            Panel::Volume => "Daily Trading Volume",
            Panel::MovingAverages => "Moving Averages (20-day & 50-day)",
            Panel::Candlestick => "Candlestick Chart",
            Panel::DailyChange => "Daily % Change in Price",
            Panel::CumulativeReturn => "Cumulative Return Over Time",
            Panel::RawData => "Raw Data",
        }
    }

    fn columns(&self, derived: &DerivedSeries) -> Vec<Column> {
        match self {
            Panel::ClosingPrice => vec![Column::Close],
            Panel::Volume => vec![Column::Volume],
            Panel::MovingAverages => vec![Column::Close, Column::Ma20, Column::Ma50],
            Panel::Candlestick => vec![Column::Open, Column::High, Column::Low, Column::Close],
            Panel::DailyChange => vec![Column::PctChange],
            Panel::CumulativeReturn => vec![Column::CumulativeReturn],
            Panel::RawData => derived.columns(),
        }
    }
}

/// Columnar data for one panel, keyed by date.
#[derive(Debug, Clone, Serialize)]
pub struct PanelData {
    pub panel: Panel,
    pub title: &'static str,
    pub dates: Vec<NaiveDate>,
    pub series: Vec<(Column, Vec<Option<f64>>)>,
}

/// Everything one render needs.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub available: DateRange,
    pub selected: DateRange,
    pub derived: DerivedSeries,
}

impl DashboardView {
    /// Panels supported by the data, in display order.
    pub fn panels(&self) -> Vec<Panel> {
        let mut panels = vec![Panel::ClosingPrice];
        if self.derived.has_volume() {
            panels.push(Panel::Volume);
        }
        panels.push(Panel::MovingAverages);
        if self.derived.has_ohlc() {
            panels.push(Panel::Candlestick);
        }
        panels.extend([Panel::DailyChange, Panel::CumulativeReturn, Panel::RawData]);
        panels
    }

    pub fn panel_data(&self, panel: Panel) -> PanelData {
        PanelData {
            panel,
            title: panel.title(),
            dates: self.derived.dates(),
            series: panel
                .columns(&self.derived)
                .into_iter()
                .map(|c| (c, self.derived.column(c)))
                .collect(),
        }
    }
}

/// Filter `series` to the requested bounds and derive the display columns.
/// A missing bound falls back to the series' own first or last date.
pub fn build_view(
    series: &PriceSeries,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<DashboardView> {
    let available = series.span().ok_or_else(|| {
        DashboardError::MalformedInput("the loaded series has no rows".to_string())
    })?;
    let selected = DateRange::new(
        start.unwrap_or(available.start),
        end.unwrap_or(available.end),
    );

    let derived = derive(series, selected)?;
    Ok(DashboardView {
        available,
        selected,
        derived,
    })
}

pub struct Dashboard {
    client: AlphaVantageClient,
    default_file: PathBuf,
    skip_rows: usize,
}

impl Dashboard {
    pub fn new(client: AlphaVantageClient, default_file: PathBuf, skip_rows: usize) -> Self {
        Self {
            client,
            default_file,
            skip_rows,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let av = &config.alpha_vantage;
        let mut client = AlphaVantageClient::new(&av.api_key).with_base_url(&av.base_url);
        if let Some(secs) = av.timeout_secs {
            client = client.with_timeout(Duration::from_secs(secs))?;
        }
        Ok(Self::new(
            client,
            config.file.default_path.clone(),
            config.file.skip_rows,
        ))
    }

    /// Load the raw series for `source`.
    pub async fn load(&self, source: &Source) -> Result<PriceSeries> {
        match source {
            Source::Remote { symbol } => self.client.fetch_daily(symbol).await,
            Source::File { path, column } => {
                let table = self.table(path.as_ref())?;
                let column = match column {
                    Some(c) => c.clone(),
                    None => table.columns().first().cloned().ok_or_else(|| {
                        DashboardError::MalformedInput("no value columns".to_string())
                    })?,
                };
                info!(%column, "selected column");
                table.select(&column)
            }
        }
    }

    /// Read a price table from `path`, or from the default file.
    pub fn table(&self, path: Option<&PathBuf>) -> Result<PriceTable> {
        PriceTable::from_path(path.unwrap_or(&self.default_file), self.skip_rows)
    }

    /// Load, filter and derive for one request.
    pub async fn run(&self, request: &DashboardRequest) -> Result<DashboardView> {
        let series = self.load(&request.source).await?;
        let view = build_view(&series, request.start, request.end)?;
        info!(
            available = %view.available,
            selected = %view.selected,
            rows = view.derived.len(),
            "built dashboard view"
        );
        Ok(view)
    }
}

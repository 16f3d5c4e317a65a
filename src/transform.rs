use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{DashboardError, Result};
use crate::series::{DateRange, PriceRow, PriceSeries};

pub const SHORT_WINDOW: usize = 20;
pub const LONG_WINDOW: usize = 50;

/// Columns of the derived table, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
    Ma20,
    Ma50,
    PctChange,
    CumulativeReturn,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
        Column::Ma20,
        Column::Ma50,
        Column::PctChange,
        Column::CumulativeReturn,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Column::Open => "Open",
            Column::High => "High",
            Column::Low => "Low",
            Column::Close => "Close",
            Column::Volume => "Volume",
            Column::Ma20 => "MA20",
            Column::Ma50 => "MA50",
            Column::PctChange => "Daily Change %",
            Column::CumulativeReturn => "Cumulative Return",
        }
    }
}

/// A filtered row plus its derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRow {
    #[serde(flatten)]
    pub price: PriceRow,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    pub pct_change: Option<f64>,
    pub cumulative_return: f64,
}

impl DerivedRow {
    pub fn value(&self, column: Column) -> Option<f64> {
        match column {
            Column::Open => self.price.open,
            Column::High => self.price.high,
            Column::Low => self.price.low,
            Column::Close => Some(self.price.close),
            Column::Volume => self.price.volume.map(|v| v as f64),
            Column::Ma20 => self.ma20,
            Column::Ma50 => self.ma50,
            Column::PctChange => self.pct_change,
            Column::CumulativeReturn => Some(self.cumulative_return),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSeries {
    pub range: DateRange,
    pub rows: Vec<DerivedRow>,
    has_volume: bool,
    has_ohlc: bool,
}

impl DerivedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_volume(&self) -> bool {
        self.has_volume
    }

    pub fn has_ohlc(&self) -> bool {
        self.has_ohlc
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.price.date).collect()
    }

    pub fn column(&self, column: Column) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.value(column)).collect()
    }

    /// Columns with data in this series. Open/high/low and volume are
    /// dropped for close-only sources.
    pub fn columns(&self) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|c| match c {
                Column::Open | Column::High | Column::Low => self.has_ohlc,
                Column::Volume => self.has_volume,
                _ => true,
            })
            .collect()
    }
}

/// Keep rows whose date lies in `range`, inclusive on both ends.
pub fn filter_range(series: &PriceSeries, range: DateRange) -> Result<PriceSeries> {
    let filtered = series.restrict(range);
    if filtered.is_empty() {
        return Err(DashboardError::EmptyRange {
            start: range.start,
            end: range.end,
        });
    }
    Ok(filtered)
}

/// Trailing simple moving average.
///
/// Entry `i` is the mean of `values[i + 1 - window ..= i]`; the first
/// `window - 1` entries are `None`. A zero window yields all `None`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 || window > values.len() {
        return vec![None; values.len()];
    }

    let mut sma = Vec::with_capacity(values.len());
    sma.resize(window - 1, None);

    let mut sum: f64 = values.iter().take(window).sum();
    sma.push(Some(sum / window as f64));

    for i in window..values.len() {
        sum = sum - values[i - window] + values[i];
        sma.push(Some(sum / window as f64));
    }

    sma
}

/// Fractional change versus the previous value.
///
/// Undefined for the first value and wherever the previous value is zero or
/// not finite.
pub fn daily_returns(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);

    for pair in values.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        let ret = if prev == 0.0 || !prev.is_finite() || !cur.is_finite() {
            None
        } else {
            Some(cur / prev - 1.0)
        };
        out.push(ret);
    }

    out
}

/// Percentage change versus the previous value: `(cur / prev - 1) * 100`.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    daily_returns(values)
        .into_iter()
        .map(|r| r.map(|r| r * 100.0))
        .collect()
}

/// Running product of `1 + r`, seeded at 1.0.
///
/// An undefined step leaves the product where it was, so one bad row does
/// not blank out the rest of the series.
pub fn cumulative_return(returns: &[Option<f64>]) -> Vec<f64> {
    let mut product = 1.0;
    returns
        .iter()
        .map(|r| {
            if let Some(r) = r {
                product *= 1.0 + r;
            }
            product
        })
        .collect()
}

/// Filter `series` to `range` and compute every derived column over the
/// filtered rows.
pub fn derive(series: &PriceSeries, range: DateRange) -> Result<DerivedSeries> {
    let filtered = filter_range(series, range)?;
    let closes = filtered.closes();

    let ma20 = rolling_mean(&closes, SHORT_WINDOW);
    let ma50 = rolling_mean(&closes, LONG_WINDOW);
    let returns = daily_returns(&closes);
    let cumulative = cumulative_return(&returns);

    let rows = filtered
        .rows()
        .iter()
        .enumerate()
        .map(|(i, price)| DerivedRow {
            price: price.clone(),
            ma20: ma20[i],
            ma50: ma50[i],
            pct_change: returns[i].map(|r| r * 100.0),
            cumulative_return: cumulative[i],
        })
        .collect();

    Ok(DerivedSeries {
        range,
        rows,
        has_volume: filtered.has_volume(),
        has_ohlc: filtered.has_ohlc(),
    })
}

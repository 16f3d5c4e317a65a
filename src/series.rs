use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::error::{DashboardError, Result};

/// One trading day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
}

impl PriceRow {
    /// A row carrying only a closing value, as produced by file mode.
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    /// A full OHLCV row, as produced by the remote feed.
    pub fn ohlcv(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close,
            volume: Some(volume),
        }
    }

    pub fn has_ohlc(&self) -> bool {
        self.open.is_some() && self.high.is_some() && self.low.is_some()
    }
}

/// Closed calendar interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Inclusive on both bounds.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

/// Daily rows ordered by strictly increasing date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    rows: Vec<PriceRow>,
}

impl PriceSeries {
    /// Build a series from rows in any order.
    ///
    /// Rows are sorted by date. Duplicate dates and closes that are negative
    /// or not finite are rejected.
    pub fn from_rows(mut rows: Vec<PriceRow>) -> Result<Self> {
        rows.sort_by_key(|r| r.date);

        for pair in rows.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(DashboardError::MalformedInput(format!(
                    "duplicate date {}",
                    pair[0].date
                )));
            }
        }

        if let Some(bad) = rows.iter().find(|r| !r.close.is_finite() || r.close < 0.0) {
            return Err(DashboardError::MalformedInput(format!(
                "invalid close {} on {}",
                bad.close, bad.date
            )));
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }

    /// First and last date, or `None` for an empty series.
    pub fn span(&self) -> Option<DateRange> {
        match (self.rows.first(), self.rows.last()) {
            (Some(first), Some(last)) => Some(DateRange::new(first.date, last.date)),
            _ => None,
        }
    }

    /// True when every row carries a volume.
    pub fn has_volume(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|r| r.volume.is_some())
    }

    /// True when every row carries open, high and low.
    pub fn has_ohlc(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(PriceRow::has_ohlc)
    }

    /// Rows whose date lies in `range`. The result keeps the ordering
    /// invariant, so it is built directly.
    pub(crate) fn restrict(&self, range: DateRange) -> PriceSeries {
        PriceSeries {
            rows: self
                .rows
                .iter()
                .filter(|r| range.contains(r.date))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_from_rows_sorts_by_date() {
        let series = PriceSeries::from_rows(vec![
            PriceRow::close_only(day(5), 3.0),
            PriceRow::close_only(day(1), 1.0),
            PriceRow::close_only(day(3), 2.0),
        ])
        .unwrap();

        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
        assert_eq!(series.span(), Some(DateRange::new(day(1), day(5))));
    }

    #[test]
    fn test_from_rows_rejects_duplicate_dates() {
        let err = PriceSeries::from_rows(vec![
            PriceRow::close_only(day(2), 1.0),
            PriceRow::close_only(day(2), 1.5),
        ])
        .unwrap_err();
        assert!(matches!(err, DashboardError::MalformedInput(_)));
    }

    #[test]
    fn test_from_rows_rejects_bad_close() {
        for close in [f64::NAN, f64::INFINITY, -1.0] {
            let err =
                PriceSeries::from_rows(vec![PriceRow::close_only(day(1), close)]).unwrap_err();
            assert!(matches!(err, DashboardError::MalformedInput(_)));
        }
    }

    #[test]
    fn test_zero_close_is_allowed() {
        let series = PriceSeries::from_rows(vec![PriceRow::close_only(day(1), 0.0)]).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_ohlc_and_volume_flags() {
        let full = PriceSeries::from_rows(vec![
            PriceRow::ohlcv(day(1), 1.0, 2.0, 0.5, 1.5, 100),
            PriceRow::ohlcv(day(2), 1.5, 2.5, 1.0, 2.0, 200),
        ])
        .unwrap();
        assert!(full.has_ohlc());
        assert!(full.has_volume());

        let close = PriceSeries::from_rows(vec![PriceRow::close_only(day(1), 1.0)]).unwrap();
        assert!(!close.has_ohlc());
        assert!(!close.has_volume());

        assert!(!PriceSeries::default().has_volume());
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = DateRange::new(day(2), day(4));
        assert!(range.contains(day(2)));
        assert!(range.contains(day(4)));
        assert!(!range.contains(day(1)));
        assert!(!range.contains(day(5)));
        assert_eq!(range.to_string(), "2024-03-02 → 2024-03-04");
    }
}

//! Close-series loading from CSV exports.
//!
//! Layout: a number of metadata lines, a header line, then one row per day.
//! The first column is the date; every other column is a candidate series.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{DashboardError, Result};
use crate::series::{PriceRow, PriceSeries};

/// Date column header after loading.
pub const DATE_COLUMN: &str = "Date";

/// Parsed CSV with a typed date column and untyped value columns.
#[derive(Debug, Clone)]
pub struct PriceTable {
    columns: Vec<String>,
    dates: Vec<NaiveDate>,
    cells: Vec<Vec<String>>,
}

impl PriceTable {
    /// Read a table, skipping `skip_rows` leading metadata lines.
    pub fn from_reader<R: Read>(reader: R, skip_rows: usize) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        let mut discard = String::new();
        for _ in 0..skip_rows {
            discard.clear();
            reader
                .read_line(&mut discard)
                .map_err(|e| DashboardError::MalformedInput(e.to_string()))?;
        }

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| DashboardError::MalformedInput(e.to_string()))?
            .clone();
        if headers.len() < 2 {
            return Err(DashboardError::MalformedInput(
                "expected a date column and at least one value column".to_string(),
            ));
        }
        let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut dates = Vec::new();
        let mut cells = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| DashboardError::MalformedInput(e.to_string()))?;
            // header is line 1 after the skipped metadata
            let line = skip_rows + idx + 2;

            let raw_date = record.get(0).unwrap_or("");
            let date = parse_calendar_date(raw_date).ok_or_else(|| {
                DashboardError::MalformedInput(format!(
                    "invalid date {:?} on line {}",
                    raw_date, line
                ))
            })?;

            dates.push(date);
            cells.push(
                (1..=columns.len())
                    .map(|i| record.get(i).unwrap_or("").to_string())
                    .collect(),
            );
        }

        Ok(Self {
            columns,
            dates,
            cells,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P, skip_rows: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DashboardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "reading price table");
        Self::from_reader(file, skip_rows)
    }

    /// Selectable value columns, in file order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Turn one column into a close-only series; all other columns are
    /// dropped. Blank cells are skipped.
    pub fn select(&self, column: &str) -> Result<PriceSeries> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DashboardError::MalformedInput(format!("unknown column {:?}", column)))?;

        let mut rows = Vec::with_capacity(self.dates.len());
        let mut skipped = 0usize;
        for (date, cells) in self.dates.iter().zip(&self.cells) {
            let raw = cells[idx].as_str();
            if raw.is_empty() {
                skipped += 1;
                continue;
            }
            let close = raw.parse::<f64>().map_err(|_| {
                DashboardError::MalformedInput(format!(
                    "column {:?} is not numeric: {:?} on {}",
                    column, raw, date
                ))
            })?;
            rows.push(PriceRow::close_only(*date, close));
        }

        if skipped > 0 {
            debug!(column, skipped, "skipped blank cells");
        }

        PriceSeries::from_rows(rows)
    }
}

/// Parse a calendar date, dropping any time-of-day or offset.
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    // Compact YYYYMMDD
    if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        let year = s[..4].parse().ok()?;
        let month = s[4..6].parse().ok()?;
        let day = s[6..].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.date_naive());
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
    for fmt in date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EXPORT: &str = "\
exported by broker,,
Date,AAPL,MSFT
2024-01-04,181.9,367.9
2024-01-02,185.6,370.8
2024-01-03,184.2,370.6
";

    #[test]
    fn test_columns_skip_metadata_and_date() {
        let table = PriceTable::from_reader(EXPORT.as_bytes(), 1).unwrap();
        assert_eq!(table.columns(), &["AAPL".to_string(), "MSFT".to_string()]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_select_renames_to_close_and_sorts() {
        let table = PriceTable::from_reader(EXPORT.as_bytes(), 1).unwrap();
        let series = table.select("MSFT").unwrap();
        assert_eq!(series.closes(), vec![370.8, 370.6, 367.9]);
        assert!(!series.has_ohlc());
        assert!(!series.has_volume());
        assert_eq!(
            series.span().unwrap().start,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_non_numeric_column_is_malformed() {
        let data = "meta\nDate,Ticker\n2024-01-02,abc\n";
        let table = PriceTable::from_reader(data.as_bytes(), 1).unwrap();
        let err = table.select("Ticker").unwrap_err();
        assert!(matches!(err, DashboardError::MalformedInput(_)));
    }

    #[test]
    fn test_unknown_column_is_malformed() {
        let table = PriceTable::from_reader(EXPORT.as_bytes(), 1).unwrap();
        let err = table.select("TSLA").unwrap_err();
        assert!(matches!(err, DashboardError::MalformedInput(_)));
    }

    #[test]
    fn test_bad_date_is_malformed() {
        let data = "meta\nDate,AAPL\nyesterday,1.0\n";
        let err = PriceTable::from_reader(data.as_bytes(), 1).unwrap_err();
        match err {
            DashboardError::MalformedInput(msg) => assert!(msg.contains("line 3")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_blank_cells_are_skipped() {
        let data = "meta\nDate,AAPL,MSFT\n2024-01-02,1.0,\n2024-01-03,,2.0\n2024-01-04,3.0,4.0\n";
        let table = PriceTable::from_reader(data.as_bytes(), 1).unwrap();
        assert_eq!(table.select("AAPL").unwrap().closes(), vec![1.0, 3.0]);
        assert_eq!(table.select("MSFT").unwrap().closes(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_single_column_file_is_malformed() {
        let data = "meta\nDate\n2024-01-02\n";
        let err = PriceTable::from_reader(data.as_bytes(), 1).unwrap_err();
        assert!(matches!(err, DashboardError::MalformedInput(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", EXPORT).unwrap();

        let table = PriceTable::from_path(file.path(), 1).unwrap();
        assert_eq!(table.select("AAPL").unwrap().len(), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PriceTable::from_path("/definitely/not/here.csv", 1).unwrap_err();
        assert!(matches!(err, DashboardError::Io { .. }));
    }

    #[test]
    fn test_parse_calendar_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        for s in [
            "2024-03-15",
            "2024/03/15",
            "03/15/2024",
            "15-03-2024",
            "20240315",
            "2024-03-15 16:00:00",
            "2024-03-15T09:30:00",
            "2024-03-15 00:00:00-04:00",
        ] {
            assert_eq!(parse_calendar_date(s), Some(expected), "format {}", s);
        }
        assert_eq!(parse_calendar_date("20241315"), None);
        assert_eq!(parse_calendar_date(""), None);
    }
}

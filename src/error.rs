use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end the current dashboard request.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The quote source returned nothing usable: bad symbol, exhausted quota,
    /// transport failure or an unexpected payload.
    #[error("failed to fetch data: {0}")]
    SourceUnavailable(String),

    /// A file or column could not be parsed as a dated price series.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Data exists, but none of it falls inside the requested window.
    #[error("no data in the selected date range {start} → {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DashboardError {
    /// Empty ranges are reported to the user as a warning, not a failure.
    pub fn is_warning(&self) -> bool {
        matches!(self, DashboardError::EmptyRange { .. })
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_empty_range_is_warning() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(DashboardError::EmptyRange { start: d, end: d }.is_warning());
        assert!(!DashboardError::SourceUnavailable("x".into()).is_warning());
        assert!(!DashboardError::MalformedInput("x".into()).is_warning());
    }

    #[test]
    fn test_empty_range_message_names_bounds() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let msg = DashboardError::EmptyRange { start, end }.to_string();
        assert!(msg.contains("2024-01-02"));
        assert!(msg.contains("2024-02-01"));
    }
}

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DashboardError, Result};
use crate::series::{PriceRow, PriceSeries};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

#[derive(Debug, Deserialize)]
pub struct DailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    pub time_series: Option<HashMap<String, DailyBar>>,
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Information")]
    pub information: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DailyBar {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}

pub struct AlphaVantageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Replace the HTTP client with one that gives up after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;
        Ok(self)
    }

    /// Fetch the full daily history for `symbol`.
    ///
    /// One request, no retry. Anything short of a parsable
    /// `Time Series (Daily)` payload is `SourceUnavailable`.
    pub async fn fetch_daily(&self, symbol: &str) -> Result<PriceSeries> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(DashboardError::SourceUnavailable(
                "no stock symbol given".to_string(),
            ));
        }

        info!(%symbol, "fetching daily series");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol.as_str()),
                ("outputsize", "full"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(DashboardError::SourceUnavailable(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(transport_error)?;
        debug!(bytes = body.len(), "received response");

        let series = parse_daily_response(&body)?;
        info!(%symbol, rows = series.len(), "loaded daily series");
        Ok(series)
    }
}

/// The request URL carries the API key, so it is stripped from the message.
fn transport_error(e: reqwest::Error) -> DashboardError {
    DashboardError::SourceUnavailable(e.without_url().to_string())
}

/// Reshape a `TIME_SERIES_DAILY` JSON body into a sorted series.
pub fn parse_daily_response(body: &str) -> Result<PriceSeries> {
    let response: DailyResponse = serde_json::from_str(body)
        .map_err(|e| DashboardError::SourceUnavailable(format!("invalid JSON response: {}", e)))?;

    let Some(time_series) = response.time_series else {
        let reason = response
            .error_message
            .or(response.note)
            .or(response.information)
            .unwrap_or_else(|| "response has no \"Time Series (Daily)\" data".to_string());
        return Err(DashboardError::SourceUnavailable(reason));
    };

    let rows = time_series
        .iter()
        .map(|(date, bar)| bar_to_row(date, bar))
        .collect::<Result<Vec<_>>>()?;

    PriceSeries::from_rows(rows).map_err(|e| DashboardError::SourceUnavailable(e.to_string()))
}

fn bar_to_row(date: &str, bar: &DailyBar) -> Result<PriceRow> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| DashboardError::SourceUnavailable(format!("invalid date {:?}", date)))?;

    let field = |name: &str, raw: &str| -> Result<f64> {
        raw.trim().parse::<f64>().map_err(|_| {
            DashboardError::SourceUnavailable(format!("invalid {} {:?} on {}", name, raw, date))
        })
    };

    let volume = field("volume", &bar.volume)?;
    if !volume.is_finite() || volume < 0.0 {
        return Err(DashboardError::SourceUnavailable(format!(
            "invalid volume {:?} on {}",
            bar.volume, date
        )));
    }

    Ok(PriceRow::ohlcv(
        day,
        field("open", &bar.open)?,
        field("high", &bar.high)?,
        field("low", &bar.low)?,
        field("close", &bar.close)?,
        volume.round() as u64,
    ))
}

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gateway/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance upstream source.
//!
//! This crate provides a Yahoo Finance provider that implements the
//! [`DataProvider`] and [`MarketDataSource`] traits from `gateway-core`.
//!
//! # Features
//!
//! - Ticker info (price, names, dividend summary) from the quoteSummary API
//! - Historical bars and dividend events from the chart API
//! - Option expirations and chains from the options API
//!
//! # Example
//!
//! ```no_run
//! use gateway_yahoo::YahooProvider;
//! use gateway_core::{MarketDataSource, Symbol};
//!
//! # async fn example() -> gateway_core::Result<()> {
//! let provider = YahooProvider::new()?;
//! let symbol = Symbol::new("AAPL");
//!
//! let df = provider.history(&symbol, "1mo", "1d").await?;
//! println!("Fetched {} rows", df.height());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use gateway_core::provider::TIMESTAMP_COLUMN;
use gateway_core::{
    DataError, DataProvider, DividendEvent, MarketDataSource, OptionChainData, OptionContract,
    Result, Symbol, TickerInfo,
};
use polars::prelude::*;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Yahoo Finance chart API base URL.
const CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance quote summary API base URL.
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Yahoo Finance options API base URL.
const OPTIONS_API_URL: &str = "https://query2.finance.yahoo.com/v7/finance/options";

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "Yahoo Finance";

/// Yahoo Finance data provider.
///
/// Implements [`DataProvider`] and [`MarketDataSource`]. Every trait call
/// maps to a single HTTP request.
#[derive(Debug, Clone)]
pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider with default settings.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DataError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(client))
    }

    /// Create a new Yahoo Finance provider with a custom HTTP client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build the chart API URL for a symbol, range and interval.
    ///
    /// Dividend events are always requested alongside the bars.
    fn chart_url(symbol: &Symbol, range: &str, interval: &str) -> String {
        format!(
            "{}/{}?range={}&interval={}&events=div",
            CHART_API_URL,
            symbol.as_str(),
            range,
            interval
        )
    }

    fn quote_summary_url(symbol: &Symbol) -> String {
        format!(
            "{}/{}?modules=price,summaryDetail,quoteType",
            QUOTE_SUMMARY_URL,
            symbol.as_str()
        )
    }

    fn options_url(symbol: &Symbol, expiration: Option<NaiveDate>) -> String {
        let base = format!("{}/{}", OPTIONS_API_URL, symbol.as_str());
        match expiration {
            Some(date) => format!("{base}?date={}", midnight_utc(date)),
            None => base,
        }
    }

    /// GET a URL and decode the JSON body, classifying HTTP failures.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, symbol: &Symbol) -> Result<T> {
        debug!("Fetching: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited {
                provider: PROVIDER_NAME.to_string(),
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }

        if !status.is_success() {
            return Err(DataError::Network(format!("HTTP {status} for {symbol}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DataError::Parse(e.to_string()))
    }

    async fn fetch_chart(&self, symbol: &Symbol, range: &str, interval: &str) -> Result<ChartData> {
        let url = Self::chart_url(symbol, range, interval);
        let response: ChartResponse = self.get_json(&url, symbol).await?;
        first_result(symbol, response.chart.result, response.chart.error)
    }

    async fn fetch_options(
        &self,
        symbol: &Symbol,
        expiration: Option<NaiveDate>,
    ) -> Result<OptionsData> {
        let url = Self::options_url(symbol, expiration);
        let response: OptionsResponse = self.get_json(&url, symbol).await?;
        first_result(
            symbol,
            response.option_chain.result,
            response.option_chain.error,
        )
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Yahoo Finance quotes, history, option chains and dividends"
    }
}

#[async_trait]
impl MarketDataSource for YahooProvider {
    async fn ticker_info(&self, symbol: &Symbol) -> Result<TickerInfo> {
        let url = Self::quote_summary_url(symbol);
        let response: QuoteSummaryResponse = self.get_json(&url, symbol).await?;
        let data = first_result(
            symbol,
            response.quote_summary.result,
            response.quote_summary.error,
        )?;
        Ok(data.into_ticker_info())
    }

    async fn history(&self, symbol: &Symbol, period: &str, interval: &str) -> Result<DataFrame> {
        let data = self.fetch_chart(symbol, period, interval).await?;
        history_frame(data)
    }

    async fn option_expirations(&self, symbol: &Symbol) -> Result<Vec<NaiveDate>> {
        let data = self.fetch_options(symbol, None).await?;
        Ok(data
            .expiration_dates
            .iter()
            .filter_map(|&ts| DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.date_naive())
            .collect())
    }

    async fn option_chain(
        &self,
        symbol: &Symbol,
        expiration: NaiveDate,
    ) -> Result<OptionChainData> {
        let data = self.fetch_options(symbol, Some(expiration)).await?;
        let block = data.options.into_iter().next().unwrap_or_default();
        Ok(OptionChainData {
            calls: block.calls,
            puts: block.puts,
        })
    }

    async fn dividends(&self, symbol: &Symbol, period: &str) -> Result<Vec<DividendEvent>> {
        let data = self.fetch_chart(symbol, period, "1d").await?;
        Ok(dividend_events(data))
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
        .unwrap_or(0)
}

/// Unwraps the single result of a Yahoo envelope, mapping API-level errors.
fn first_result<T>(symbol: &Symbol, result: Option<Vec<T>>, error: Option<ApiError>) -> Result<T> {
    if let Some(error) = error {
        if error.code == "Not Found" {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }
        return Err(DataError::Other(format!(
            "{}: {}",
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))
}

/// Parse chart data into a bar frame. Missing bars stay null.
fn history_frame(data: ChartData) -> Result<DataFrame> {
    let timestamps = data.timestamp.unwrap_or_default();
    let len = timestamps.len();
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .unwrap_or_default();

    DataFrame::new(vec![
        Column::new(TIMESTAMP_COLUMN.into(), timestamps),
        Column::new("open".into(), fit(quote.open, len)),
        Column::new("high".into(), fit(quote.high, len)),
        Column::new("low".into(), fit(quote.low, len)),
        Column::new("close".into(), fit(quote.close, len)),
        Column::new("volume".into(), fit(quote.volume, len)),
    ])
    .map_err(|e| DataError::Parse(e.to_string()))
}

/// Pads or truncates an indicator series to the timestamp count.
fn fit<T>(mut values: Vec<Option<T>>, len: usize) -> Vec<Option<T>> {
    values.resize_with(len, || None);
    values
}

/// Dividend events from chart data, oldest first.
fn dividend_events(data: ChartData) -> Vec<DividendEvent> {
    let mut events: Vec<DividendEvent> = data
        .events
        .map(|events| events.dividends)
        .unwrap_or_default()
        .into_values()
        .filter_map(|div| {
            DateTime::from_timestamp(div.date, 0).map(|date| DividendEvent::new(date, div.amount))
        })
        .collect();
    events.sort_by_key(|event| event.date);
    events
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: Option<String>,
}

/// Chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Indicators,
    events: Option<ChartEvents>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, DividendData>,
}

#[derive(Debug, Deserialize)]
struct DividendData {
    amount: f64,
    date: i64,
}

/// Quote Summary API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryResult,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    result: Option<Vec<QuoteSummaryData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryData {
    #[serde(default)]
    price: PriceModule,
    #[serde(default)]
    summary_detail: SummaryDetail,
}

impl QuoteSummaryData {
    fn into_ticker_info(self) -> TickerInfo {
        let price = self.price;
        let detail = self.summary_detail;

        TickerInfo {
            regular_market_price: number(price.regular_market_price),
            regular_market_time: seconds(price.regular_market_time),
            previous_close: number(detail.previous_close)
                .or_else(|| number(price.regular_market_previous_close)),
            market_cap: number(price.market_cap),
            currency: price.currency,
            short_name: price.short_name,
            long_name: price.long_name,
            exchange: price.exchange,
            quote_type: price.quote_type,
            dividend_rate: number(detail.dividend_rate),
            dividend_yield: number(detail.dividend_yield),
            ex_dividend_date: seconds(detail.ex_dividend_date),
            payout_ratio: number(detail.payout_ratio),
            five_year_avg_dividend_yield: number(detail.five_year_avg_dividend_yield),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PriceModule {
    regular_market_price: Option<Numeric>,
    regular_market_time: Option<Numeric>,
    regular_market_previous_close: Option<Numeric>,
    market_cap: Option<Numeric>,
    currency: Option<String>,
    short_name: Option<String>,
    long_name: Option<String>,
    exchange: Option<String>,
    quote_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SummaryDetail {
    previous_close: Option<Numeric>,
    dividend_rate: Option<Numeric>,
    dividend_yield: Option<Numeric>,
    ex_dividend_date: Option<Numeric>,
    payout_ratio: Option<Numeric>,
    five_year_avg_dividend_yield: Option<Numeric>,
}

/// Yahoo reports numbers either bare or as `{"raw": .., "fmt": ..}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Plain(f64),
    Formatted {
        #[serde(default)]
        raw: Option<f64>,
    },
}

impl Numeric {
    const fn value(&self) -> Option<f64> {
        match self {
            Self::Plain(v) => Some(*v),
            Self::Formatted { raw } => *raw,
        }
    }
}

fn number(value: Option<Numeric>) -> Option<f64> {
    value.as_ref().and_then(Numeric::value)
}

fn seconds(value: Option<Numeric>) -> Option<i64> {
    number(value).map(|v| v as i64)
}

/// Options API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResponse {
    option_chain: OptionsResult,
}

#[derive(Debug, Deserialize)]
struct OptionsResult {
    result: Option<Vec<OptionsData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsData {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<OptionsBlock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OptionsBlock {
    calls: Vec<OptionContract>,
    puts: Vec<OptionContract>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart_response(value: serde_json::Value) -> ChartResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_build_urls() {
        let symbol = Symbol::new("aapl");

        let url = YahooProvider::chart_url(&symbol, "30d", "1d");
        assert!(url.contains("/AAPL?"));
        assert!(url.contains("range=30d"));
        assert!(url.contains("interval=1d"));
        assert!(url.contains("events=div"));

        assert!(YahooProvider::quote_summary_url(&symbol).contains("modules=price,summaryDetail"));

        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        assert_eq!(
            YahooProvider::options_url(&symbol, Some(date)),
            format!("{OPTIONS_API_URL}/AAPL?date=1718928000")
        );
        assert_eq!(
            YahooProvider::options_url(&symbol, None),
            format!("{OPTIONS_API_URL}/AAPL")
        );
    }

    #[test]
    fn test_parse_history_frame() {
        let response = chart_response(json!({
            "chart": {
                "result": [{
                    "meta": {"currency": "USD", "symbol": "AAPL"},
                    "timestamp": [1_704_153_600, 1_704_240_000],
                    "indicators": {"quote": [{
                        "open": [150.0, 151.0],
                        "high": [152.0, 153.0],
                        "low": [149.0, null],
                        "close": [151.0, 152.0],
                        "volume": [1_000_000]
                    }]}
                }],
                "error": null
            }
        }));

        let data = first_result(&Symbol::new("AAPL"), response.chart.result, None).unwrap();
        let df = history_frame(data).unwrap();

        assert_eq!(df.height(), 2);
        let volume = df.column("volume").unwrap().u64().unwrap();
        assert_eq!(volume.get(0), Some(1_000_000));
        assert_eq!(volume.get(1), None);
        assert_eq!(df.column("low").unwrap().f64().unwrap().get(1), None);
    }

    #[test]
    fn test_parse_dividend_events() {
        let response = chart_response(json!({
            "chart": {
                "result": [{
                    "timestamp": [1_707_955_200],
                    "indicators": {"quote": [{}]},
                    "events": {"dividends": {
                        "1707955200": {"amount": 0.24, "date": 1_707_955_200},
                        "1699545600": {"amount": 0.24, "date": 1_699_545_600}
                    }}
                }],
                "error": null
            }
        }));

        let data = first_result(&Symbol::new("AAPL"), response.chart.result, None).unwrap();
        let events = dividend_events(data);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].date.timestamp(), 1_699_545_600);
        assert_eq!(events[1].amount, 0.24);
    }

    #[test]
    fn test_api_error_not_found() {
        let response = chart_response(json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }));

        let err = first_result(
            &Symbol::new("ZZZZ"),
            response.chart.result,
            response.chart.error,
        )
        .unwrap_err();
        assert_eq!(err, DataError::SymbolNotFound("ZZZZ".to_string()));
    }

    #[test]
    fn test_parse_quote_summary() {
        let response: QuoteSummaryResponse = serde_json::from_value(json!({
            "quoteSummary": {
                "result": [{
                    "price": {
                        "regularMarketPrice": {"raw": 190.5, "fmt": "190.50"},
                        "regularMarketTime": 1_718_913_601,
                        "marketCap": {"raw": 2.9e12, "fmt": "2.9T"},
                        "currency": "USD",
                        "shortName": "Apple Inc.",
                        "exchange": "NMS",
                        "quoteType": "EQUITY"
                    },
                    "summaryDetail": {
                        "previousClose": {"raw": 189.0},
                        "dividendRate": {"raw": 1.0},
                        "exDividendDate": {"raw": 1_715_299_200},
                        "payoutRatio": {}
                    }
                }],
                "error": null
            }
        }))
        .unwrap();

        let info = first_result(&Symbol::new("AAPL"), response.quote_summary.result, None)
            .unwrap()
            .into_ticker_info();

        assert_eq!(info.regular_market_price, Some(190.5));
        assert_eq!(info.regular_market_time, Some(1_718_913_601));
        assert_eq!(info.previous_close, Some(189.0));
        assert_eq!(info.short_name.as_deref(), Some("Apple Inc."));
        assert_eq!(info.ex_dividend_date, Some(1_715_299_200));
        assert_eq!(info.payout_ratio, None);
        assert_eq!(info.long_name, None);
    }

    #[test]
    fn test_parse_options() {
        let response: OptionsResponse = serde_json::from_value(json!({
            "optionChain": {
                "result": [{
                    "expirationDates": [1_718_928_000, 1_721_347_200],
                    "options": [{
                        "calls": [{"contractSymbol": "AAPL240621C00100000", "strike": 100.0}],
                        "puts": []
                    }]
                }],
                "error": null
            }
        }))
        .unwrap();

        let data = first_result(&Symbol::new("AAPL"), response.option_chain.result, None).unwrap();
        assert_eq!(data.expiration_dates.len(), 2);
        assert_eq!(data.options[0].calls[0].strike(), Some(100.0));
        assert!(data.options[0].puts.is_empty());
    }

    #[test]
    fn test_provider_info() {
        let provider = YahooProvider::new().unwrap();
        assert_eq!(provider.name(), "Yahoo Finance");
        assert!(!provider.description().is_empty());
    }
}

//! Shaping of raw upstream data into canonical payloads.
//!
//! Every function here is pure: no cache, limiter or network access.

use chrono::{NaiveDate, TimeZone, Utc};
use gateway_core::payload::{
    ChartIndicators, ChartMeta, ChartQuote, ChartSeries, DividendInfo, DividendRecord,
    OptionChainResult,
};
use gateway_core::provider::TIMESTAMP_COLUMN;
use gateway_core::{
    ChartPayload, DataError, DividendEvent, DividendsPayload, OptionChainData,
    OptionChainPayload, QuotePayload, Result, SearchQuote, SearchResults, Symbol, TickerInfo,
};
use polars::prelude::{DataFrame, DataType};

/// Currency reported in chart metadata when upstream has none.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Expiration date format accepted from callers.
pub const EXPIRATION_FORMAT: &str = "%Y-%m-%d";

/// Builds a quote payload. Absent upstream fields stay `None`.
///
/// `symbol` is echoed as the caller wrote it.
#[must_use]
pub fn quote_payload(symbol: &str, info: TickerInfo) -> QuotePayload {
    QuotePayload {
        symbol: symbol.to_string(),
        regular_market_price: info.regular_market_price,
        regular_market_time: info.regular_market_time,
        previous_close: info.previous_close,
        market_cap: info.market_cap,
        currency: info.currency,
    }
}

/// Builds a chart-envelope payload from history bars and ticker info.
pub fn chart_payload(symbol: &str, info: &TickerInfo, bars: &DataFrame) -> Result<ChartPayload> {
    let timestamp = timestamp_column(bars)?;
    let quote = ChartQuote {
        close: f64_column(bars, "close")?,
        open: f64_column(bars, "open")?,
        high: f64_column(bars, "high")?,
        low: f64_column(bars, "low")?,
        volume: u64_column(bars, "volume")?,
    };

    Ok(ChartPayload::new(ChartSeries {
        meta: ChartMeta {
            currency: info
                .currency
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            symbol: symbol.to_string(),
            regular_market_price: info.regular_market_price,
            previous_close: info.previous_close,
        },
        timestamp,
        indicators: ChartIndicators { quote: vec![quote] },
    }))
}

fn timestamp_column(bars: &DataFrame) -> Result<Vec<i64>> {
    let column = bars
        .column(TIMESTAMP_COLUMN)
        .and_then(|c| c.cast(&DataType::Int64))
        .map_err(|e| DataError::Parse(e.to_string()))?;
    let values = column.i64().map_err(|e| DataError::Parse(e.to_string()))?;

    values
        .into_iter()
        .collect::<Option<Vec<i64>>>()
        .ok_or_else(|| DataError::Parse("History contains a bar without timestamp".to_string()))
}

fn f64_column(bars: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = bars
        .column(name)
        .and_then(|c| c.cast(&DataType::Float64))
        .map_err(|e| DataError::Parse(e.to_string()))?;
    let values = column.f64().map_err(|e| DataError::Parse(e.to_string()))?;
    Ok(values.into_iter().collect())
}

fn u64_column(bars: &DataFrame, name: &str) -> Result<Vec<Option<u64>>> {
    let column = bars
        .column(name)
        .and_then(|c| c.cast(&DataType::UInt64))
        .map_err(|e| DataError::Parse(e.to_string()))?;
    let values = column.u64().map_err(|e| DataError::Parse(e.to_string()))?;
    Ok(values.into_iter().collect())
}

/// Picks the expiration to fetch.
///
/// A requested `YYYY-MM-DD` date that is available wins; anything else,
/// including an unparseable or unknown date, falls back to the first
/// available expiration. Returns `None` only if nothing is available.
#[must_use]
pub fn select_expiration(available: &[NaiveDate], requested: Option<&str>) -> Option<NaiveDate> {
    requested
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), EXPIRATION_FORMAT).ok())
        .filter(|date| available.contains(date))
        .or_else(|| available.first().copied())
}

/// Unix timestamp (seconds) of midnight UTC on `date`.
#[must_use]
pub fn date_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
        .unwrap_or(0)
}

/// Builds an option chain payload.
#[must_use]
pub fn option_chain_payload(expirations: &[NaiveDate], chain: OptionChainData) -> OptionChainPayload {
    let mut strikes: Vec<f64> = chain
        .calls
        .iter()
        .chain(chain.puts.iter())
        .filter_map(|contract| contract.strike())
        .filter(|strike| strike.is_finite())
        .collect();
    strikes.sort_by(f64::total_cmp);
    strikes.dedup();

    OptionChainPayload::new(OptionChainResult {
        expiration_dates: expirations.iter().copied().map(date_timestamp).collect(),
        strikes,
        calls: chain.calls,
        puts: chain.puts,
    })
}

/// Builds a dividends payload. An empty history is not an error.
#[must_use]
pub fn dividends_payload(
    symbol: &str,
    info: &TickerInfo,
    events: Vec<DividendEvent>,
) -> DividendsPayload {
    let mut history: Vec<DividendRecord> = events
        .into_iter()
        .map(|event| DividendRecord {
            date: event.date.format(EXPIRATION_FORMAT).to_string(),
            timestamp: event.date.timestamp(),
            amount: event.amount,
        })
        .collect();
    history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let message = if history.is_empty() {
        "No dividend history found for this symbol".to_string()
    } else {
        format!("Found {} dividend records", history.len())
    };

    DividendsPayload {
        info: DividendInfo {
            symbol: symbol.to_string(),
            dividend_rate: info.dividend_rate,
            dividend_yield: info.dividend_yield,
            ex_dividend_date: info.ex_dividend_date,
            payout_ratio: info.payout_ratio,
            five_year_avg_dividend_yield: info.five_year_avg_dividend_yield,
        },
        history,
        message,
    }
}

/// Why a search candidate was left out of the results.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterReason {
    /// The info lookup for the candidate failed.
    InfoFailed(DataError),
    /// The candidate has no short name.
    MissingShortName,
}

/// A search candidate that was filtered out rather than failed.
#[derive(Clone, Debug, PartialEq)]
pub struct FilteredTicker {
    /// The candidate symbol.
    pub symbol: Symbol,
    /// Why it was dropped.
    pub reason: FilterReason,
}

/// Search hits plus the candidates that were filtered out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchOutcome {
    /// Hits, in candidate order.
    pub results: SearchResults,
    /// Dropped candidates, in candidate order.
    pub filtered: Vec<FilteredTicker>,
}

/// Turns per-candidate info lookups into search hits.
#[must_use]
pub fn search_outcome(candidates: Vec<(Symbol, Result<TickerInfo>)>) -> SearchOutcome {
    let mut outcome = SearchOutcome::default();

    for (symbol, info) in candidates {
        match info {
            Ok(info) => match info.short_name {
                Some(shortname) => outcome.results.0.push(SearchQuote {
                    symbol: symbol.to_string(),
                    shortname,
                    longname: info.long_name,
                    exchange: info.exchange,
                    quote_type: info.quote_type,
                }),
                None => outcome.filtered.push(FilteredTicker {
                    symbol,
                    reason: FilterReason::MissingShortName,
                }),
            },
            Err(e) => outcome.filtered.push(FilteredTicker {
                symbol,
                reason: FilterReason::InfoFailed(e),
            }),
        }
    }

    outcome
}

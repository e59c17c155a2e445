//! Canonical response payloads.
//!
//! These are the shapes cached per category and handed to the presentation
//! layer. Field names serialize exactly as the gateway's clients expect them.

use serde::{Deserialize, Serialize};

use crate::types::OptionContract;

/// Quote payload: `{symbol, regularMarketPrice, regularMarketTime, previousClose, marketCap, currency}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePayload {
    /// Normalized symbol.
    pub symbol: String,
    /// Last traded price.
    pub regular_market_price: Option<f64>,
    /// Time of the last trade (Unix seconds).
    pub regular_market_time: Option<i64>,
    /// Previous session close.
    pub previous_close: Option<f64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Trading currency.
    pub currency: Option<String>,
}

/// Historical payload, mirroring a chart-result envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartPayload {
    /// The chart envelope.
    pub chart: ChartEnvelope,
}

impl ChartPayload {
    /// Wraps a single series in the envelope.
    #[must_use]
    pub fn new(series: ChartSeries) -> Self {
        Self {
            chart: ChartEnvelope {
                result: vec![series],
            },
        }
    }

    /// The first (and only) series.
    #[must_use]
    pub fn series(&self) -> Option<&ChartSeries> {
        self.chart.result.first()
    }
}

/// `chart` object of a [`ChartPayload`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartEnvelope {
    /// Result list; always holds exactly one series.
    pub result: Vec<ChartSeries>,
}

/// One symbol's historical series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Series metadata.
    pub meta: ChartMeta,
    /// Bar timestamps (Unix seconds).
    pub timestamp: Vec<i64>,
    /// Price and volume sequences aligned with `timestamp`.
    pub indicators: ChartIndicators,
}

/// Metadata of a [`ChartSeries`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    /// Trading currency, `"USD"` when upstream has none.
    pub currency: String,
    /// Normalized symbol.
    pub symbol: String,
    /// Last traded price.
    pub regular_market_price: Option<f64>,
    /// Previous session close.
    pub previous_close: Option<f64>,
}

/// `indicators` object of a [`ChartSeries`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartIndicators {
    /// Single-element list holding the bar values.
    pub quote: Vec<ChartQuote>,
}

/// Equal-length bar sequences.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartQuote {
    /// Close prices.
    pub close: Vec<Option<f64>>,
    /// Open prices.
    pub open: Vec<Option<f64>>,
    /// High prices.
    pub high: Vec<Option<f64>>,
    /// Low prices.
    pub low: Vec<Option<f64>>,
    /// Volumes.
    pub volume: Vec<Option<u64>>,
}

/// Options payload: `{optionChain: {result: [...]}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChainPayload {
    /// The option chain envelope.
    pub option_chain: OptionChainEnvelope,
}

impl OptionChainPayload {
    /// Wraps a single chain in the envelope.
    #[must_use]
    pub fn new(chain: OptionChainResult) -> Self {
        Self {
            option_chain: OptionChainEnvelope {
                result: vec![chain],
            },
        }
    }

    /// The first (and only) chain.
    #[must_use]
    pub fn chain(&self) -> Option<&OptionChainResult> {
        self.option_chain.result.first()
    }
}

/// `optionChain` object of an [`OptionChainPayload`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptionChainEnvelope {
    /// Result list; always holds exactly one chain.
    pub result: Vec<OptionChainResult>,
}

/// Option chain for the selected expiration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChainResult {
    /// Every available expiration (Unix seconds).
    pub expiration_dates: Vec<i64>,
    /// Union of call and put strikes, ascending and deduplicated.
    pub strikes: Vec<f64>,
    /// Call contracts.
    pub calls: Vec<OptionContract>,
    /// Put contracts.
    pub puts: Vec<OptionContract>,
}

/// Dividends payload: `{info, history, message}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DividendsPayload {
    /// Summary dividend information.
    pub info: DividendInfo,
    /// Payments, most recent first.
    pub history: Vec<DividendRecord>,
    /// Human-readable record count or "no history" notice.
    pub message: String,
}

/// Summary dividend information for a symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendInfo {
    /// Normalized symbol.
    pub symbol: String,
    /// Annual dividend rate.
    pub dividend_rate: Option<f64>,
    /// Dividend yield.
    pub dividend_yield: Option<f64>,
    /// Most recent ex-dividend date (Unix seconds).
    pub ex_dividend_date: Option<i64>,
    /// Payout ratio.
    pub payout_ratio: Option<f64>,
    /// Five year average dividend yield.
    pub five_year_avg_dividend_yield: Option<f64>,
}

/// One entry of a dividend history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DividendRecord {
    /// Payment date as `YYYY-MM-DD`.
    pub date: String,
    /// Payment time (Unix seconds).
    pub timestamp: i64,
    /// Amount per share.
    pub amount: f64,
}

/// One search hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchQuote {
    /// Ticker symbol.
    pub symbol: String,
    /// Short display name.
    pub shortname: String,
    /// Full name.
    pub longname: Option<String>,
    /// Exchange code.
    pub exchange: Option<String>,
    /// Instrument type.
    #[serde(rename = "quoteType")]
    pub quote_type: Option<String>,
}

/// Search payload: ordered search hits.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResults(pub Vec<SearchQuote>);

impl SearchResults {
    /// Number of hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the hits in order.
    pub fn iter(&self) -> std::slice::Iter<'_, SearchQuote> {
        self.0.iter()
    }
}

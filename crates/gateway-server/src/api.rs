use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use gateway::{
    BatchResult, DEFAULT_DIVIDEND_PERIOD, DEFAULT_HISTORY_INTERVAL, DEFAULT_HISTORY_PERIOD,
    DataError, GatewayStatus, MarketDataGateway, SearchResults,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::ApiResult;

type AppState = Arc<MarketDataGateway>;

pub(crate) fn app_router(gateway: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/quote", get(quote))
        .route("/historical", get(historical))
        .route("/search", get(search))
        .route("/options", get(options))
        .route("/dividends", get(dividends))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

/// A single symbol or a comma-separated batch. `symbol` wins when both are given.
enum Target {
    Single(String),
    Batch(Vec<String>),
}

impl Target {
    fn from_params(symbol: Option<String>, symbols: Option<String>) -> ApiResult<Self> {
        if let Some(symbol) = symbol.filter(|s| !s.is_empty()) {
            return Ok(Self::Single(symbol));
        }
        match symbols.filter(|s| !s.is_empty()) {
            Some(list) => Ok(Self::Batch(list.split(',').map(str::to_string).collect())),
            None => Err(DataError::missing_symbol().into()),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn stats(State(gateway): State<AppState>) -> Json<GatewayStatus> {
    Json(gateway.status().await)
}

#[derive(Deserialize)]
struct SymbolQuery {
    symbol: Option<String>,
    symbols: Option<String>,
}

#[derive(Serialize)]
struct QuotesResponse<P> {
    quotes: P,
}

async fn quote(
    State(gateway): State<AppState>,
    Query(params): Query<SymbolQuery>,
) -> ApiResult<Response> {
    match Target::from_params(params.symbol, params.symbols)? {
        Target::Single(symbol) => Ok(Json(gateway.quote(&symbol).await?).into_response()),
        Target::Batch(symbols) => {
            let quotes: BatchResult<_> = gateway.quotes(&symbols).await;
            Ok(Json(QuotesResponse { quotes }).into_response())
        }
    }
}

#[derive(Deserialize)]
struct HistoricalQuery {
    symbol: Option<String>,
    symbols: Option<String>,
    period: Option<String>,
    interval: Option<String>,
}

#[derive(Serialize)]
struct ChartsResponse<P> {
    charts: P,
}

async fn historical(
    State(gateway): State<AppState>,
    Query(params): Query<HistoricalQuery>,
) -> ApiResult<Response> {
    let period = params.period.as_deref().unwrap_or(DEFAULT_HISTORY_PERIOD);
    let interval = params
        .interval
        .as_deref()
        .unwrap_or(DEFAULT_HISTORY_INTERVAL);

    match Target::from_params(params.symbol, params.symbols)? {
        Target::Single(symbol) => {
            let chart = gateway.historical(&symbol, period, interval).await?;
            Ok(Json(chart).into_response())
        }
        Target::Batch(symbols) => {
            let charts = gateway.historical_batch(&symbols, period, interval).await;
            Ok(Json(ChartsResponse { charts }).into_response())
        }
    }
}

#[derive(Deserialize)]
struct SearchQuery {
    query: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    quotes: SearchResults,
}

async fn search(
    State(gateway): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let query = params.query.unwrap_or_default();
    let quotes = gateway.search(&query).await?;
    Ok(Json(SearchResponse { quotes }))
}

#[derive(Deserialize)]
struct OptionsQuery {
    symbol: Option<String>,
    expiration: Option<String>,
}

async fn options(
    State(gateway): State<AppState>,
    Query(params): Query<OptionsQuery>,
) -> ApiResult<Response> {
    let symbol = params.symbol.unwrap_or_default();
    let chain = gateway
        .options(&symbol, params.expiration.as_deref())
        .await?;
    Ok(Json(chain).into_response())
}

#[derive(Deserialize)]
struct DividendsQuery {
    symbol: Option<String>,
    symbols: Option<String>,
    period: Option<String>,
}

#[derive(Serialize)]
struct DividendsResponse<P> {
    dividends: P,
}

async fn dividends(
    State(gateway): State<AppState>,
    Query(params): Query<DividendsQuery>,
) -> ApiResult<Response> {
    let period = params.period.as_deref().unwrap_or(DEFAULT_DIVIDEND_PERIOD);

    match Target::from_params(params.symbol, params.symbols)? {
        Target::Single(symbol) => Ok(Json(gateway.dividends(&symbol, period).await?).into_response()),
        Target::Batch(symbols) => {
            let dividends = gateway.dividends_batch(&symbols, period).await;
            Ok(Json(DividendsResponse { dividends }).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::{DateTime, NaiveDate};
    use gateway::{
        DataProvider, DividendEvent, GatewayConfig, MarketDataSource, OptionChainData, Result,
        Symbol, TickerInfo,
    };
    use polars::prelude::DataFrame;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// `BAD` fails every call and `NOOPT` lists no option expirations.
    #[derive(Debug, Default)]
    struct FakeSource {
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn check(&self, symbol: &Symbol) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol.as_str() == "BAD" {
                return Err(DataError::Network(format!("HTTP 500 for {symbol}")));
            }
            Ok(())
        }
    }

    impl DataProvider for FakeSource {
        fn name(&self) -> &str {
            "Fake"
        }

        fn description(&self) -> &str {
            "In-memory test source"
        }
    }

    #[async_trait]
    impl MarketDataSource for FakeSource {
        async fn ticker_info(&self, symbol: &Symbol) -> Result<TickerInfo> {
            self.check(symbol)?;
            Ok(TickerInfo {
                regular_market_price: Some(42.0),
                short_name: Some(format!("{symbol} Corp")),
                ..Default::default()
            })
        }

        async fn history(&self, symbol: &Symbol, _: &str, _: &str) -> Result<DataFrame> {
            self.check(symbol)?;
            Err(DataError::Parse("history is not served by this source".into()))
        }

        async fn option_expirations(&self, symbol: &Symbol) -> Result<Vec<NaiveDate>> {
            self.check(symbol)?;
            if symbol.as_str() == "NOOPT" {
                return Ok(vec![]);
            }
            Ok(NaiveDate::from_ymd_opt(2024, 6, 21).into_iter().collect())
        }

        async fn option_chain(&self, symbol: &Symbol, _: NaiveDate) -> Result<OptionChainData> {
            self.check(symbol)?;
            Ok(OptionChainData::default())
        }

        async fn dividends(&self, symbol: &Symbol, _: &str) -> Result<Vec<DividendEvent>> {
            self.check(symbol)?;
            Ok(DateTime::from_timestamp(1_707_955_200, 0)
                .map(|date| DividendEvent::new(date, 0.5))
                .into_iter()
                .collect())
        }
    }

    fn router() -> Router {
        let gateway = MarketDataGateway::new(
            Arc::new(FakeSource::default()),
            &GatewayConfig::default(),
        )
        .unwrap();
        app_router(Arc::new(gateway))
    }

    async fn call(router: &Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_quote_single_and_batch() {
        let router = router();

        let (status, body) = call(&router, "/quote?symbol=nvda").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "nvda");
        assert_eq!(body["regularMarketPrice"], 42.0);
        assert_eq!(body["marketCap"], Value::Null);

        let (status, body) = call(&router, "/quote?symbols=AAPL,BAD,MSFT").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["quotes"]["AAPL"]["symbol"], "AAPL");
        assert_eq!(body["quotes"]["MSFT"]["symbol"], "MSFT");
        assert_eq!(
            body["quotes"]["BAD"],
            json!({"error": "Network error: HTTP 500 for BAD"})
        );
    }

    #[tokio::test]
    async fn test_symbol_takes_precedence_over_symbols() {
        let (status, body) = call(&router(), "/quote?symbol=MSFT&symbols=AAPL,BAD").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "MSFT");
    }

    #[tokio::test]
    async fn test_missing_parameters() {
        let router = router();
        for uri in ["/quote", "/historical?symbol=", "/dividends", "/options"] {
            let (status, body) = call(&router, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, json!({"error": "Symbol parameter is required"}));
        }

        let (status, body) = call(&router, "/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Query parameter is required"}));
    }

    #[tokio::test]
    async fn test_options_without_expirations_is_404() {
        let router = router();

        let (status, body) = call(&router, "/options?symbol=NOOPT").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No options available for NOOPT");

        let (status, body) = call(&router, "/options?symbol=AAPL&expiration=2030-01-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["optionChain"]["result"][0]["expirationDates"],
            json!([1_718_928_000])
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_is_500() {
        let (status, body) = call(&router(), "/historical?symbol=AAPL").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("Parse error"));
    }

    #[tokio::test]
    async fn test_dividends_and_search() {
        let router = router();

        let (status, body) = call(&router, "/dividends?symbols=KO,BAD&period=1y").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dividends"]["KO"]["message"], "Found 1 dividend records");
        assert_eq!(body["dividends"]["KO"]["history"][0]["date"], "2024-02-15");
        assert!(body["dividends"]["BAD"]["error"].is_string());

        let (status, body) = call(&router, "/search?query=aapl,bad").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"quotes": [{
                "symbol": "AAPL",
                "shortname": "AAPL Corp",
                "longname": null,
                "exchange": null,
                "quoteType": null
            }]})
        );
    }

    #[tokio::test]
    async fn test_stats_report_cache_activity() {
        let router = router();
        call(&router, "/quote?symbol=AAPL").await;
        call(&router, "/quote?symbol=aapl").await;

        let (status, body) = call(&router, "/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["cacheHits"], 1);
        assert_eq!(body["stats"]["cacheMisses"], 1);
        assert_eq!(body["caches"]["quote"], 1);
        assert_eq!(body["rateLimitInWindow"], 1);
    }
}

//! Price comparison service and HTTP handlers

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use swapc_core::{AggregationError, AggregationResult, AppConfig, PairRequest, POPULAR_SYMBOLS};
use swapc_price_feed::{
    build_sources, http_client, Freshness, PriceAggregator, ResultCache, StaticResolver,
    TokenListResolver, TokenResolver,
};

use crate::conversions::{failure_views, CompareResponse, DashboardResponse, DataSource};

/// Aggregator and result cache shared by all handlers
#[derive(Clone)]
pub struct PriceService {
    aggregator: Arc<PriceAggregator>,
    cache: Arc<ResultCache>,
}

impl PriceService {
    pub fn new(aggregator: PriceAggregator, cache: ResultCache) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            cache: Arc::new(cache),
        }
    }

    /// Wire sources, resolver, aggregator and cache from settings
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = http_client(&config.sources)?;
        let sources = build_sources(&config.sources, client.clone());

        let resolver: Arc<dyn TokenResolver> = match &config.resolver.token_list_url {
            Some(url) => {
                let timeout = config
                    .resolver
                    .timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(Duration::from_secs(5));
                Arc::new(TokenListResolver::new(client, url.clone(), timeout))
            }
            None => Arc::new(StaticResolver),
        };

        let aggregator = PriceAggregator::builder()
            .config(config.aggregator.clone())
            .sources(sources)
            .resolver(resolver)
            .build()?;

        info!(
            "Registered {} price sources: {}",
            aggregator.source_names().len(),
            aggregator.source_names().join(", ")
        );

        Ok(Self::new(aggregator, ResultCache::new(config.cache.ttl())))
    }

    pub fn aggregator(&self) -> &PriceAggregator {
        &self.aggregator
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Compare prices for a pair through the cache
    pub async fn compare(
        &self,
        pair: &PairRequest,
    ) -> Result<(AggregationResult, Freshness), AggregationError> {
        self.cache
            .get_or_compute_tracked(pair, || self.aggregator.compare(pair))
            .await
    }

    /// Dashboard view. A failed refresh falls back to the last expired
    /// result for the pair when there is one.
    pub async fn dashboard(&self, pair: &PairRequest) -> Result<DashboardResponse, AggregationError> {
        match self.compare(pair).await {
            Ok((result, Freshness::Cached)) => Ok(DashboardResponse::new(&result, DataSource::Cache, None)),
            Ok((result, Freshness::Computed)) => Ok(DashboardResponse::new(&result, DataSource::Live, None)),
            Err(e) => match self.cache.get_stale(pair) {
                Some((result, age)) => {
                    warn!("Serving stale {} prices ({:?} old): {}", pair, age, e);
                    Ok(DashboardResponse::new(&result, DataSource::Stale, Some(age)))
                }
                None => Err(e),
            },
        }
    }
}

/// Build the HTTP router
pub fn router(service: PriceService) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "OK" }))
        .route("/api/prices/compare", get(compare_query).post(compare_body))
        .route("/api/prices/dashboard", get(dashboard))
        .route("/api/stats", get(stats))
        .with_state(service)
}

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    MissingParameters { message: &'static str, example: Value },

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

fn popular_tokens_tip() -> String {
    format!("Try popular tokens: {}", POPULAR_SYMBOLS.join(", "))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::MissingParameters { message, example } => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": message, "example": example }),
            ),
            ApiError::Aggregation(AggregationError::UnknownSymbol { detail, .. }) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "error": self.to_string(),
                    "detail": detail,
                    "tip": popular_tokens_tip(),
                }),
            ),
            ApiError::Aggregation(e @ AggregationError::NoValidQuotes { rejected, .. }) => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "success": false,
                    "error": e.to_string(),
                    "failures": failure_views(e.failures()),
                    "rejected": rejected,
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// `tokenA` / `tokenB`, from the query string or a JSON body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairParams {
    #[serde(default)]
    pub token_a: Option<String>,
    #[serde(default)]
    pub token_b: Option<String>,
}

impl PairParams {
    fn into_request(self) -> Option<PairRequest> {
        let present = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        match (present(self.token_a), present(self.token_b)) {
            (Some(a), Some(b)) => Some(PairRequest::new(a, b)),
            _ => None,
        }
    }
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "SwapC DEX price aggregator",
        "endpoints": {
            "GET /api/prices/compare": "Compare prices across all DEXes",
            "POST /api/prices/compare": "Compare prices across all DEXes",
            "GET /api/prices/dashboard": "Dashboard view with best/worst flags",
            "GET /api/stats": "Aggregator and cache counters",
            "GET /health": "Liveness probe",
        },
        "popularPairs": {
            "SOL/USDC": "/api/prices/compare?tokenA=SOL&tokenB=USDC",
            "ETH/USDC": "/api/prices/compare?tokenA=ETH&tokenB=USDC",
            "BTC/USDC": "/api/prices/compare?tokenA=BTC&tokenB=USDC",
            "USDC/USDT": "/api/prices/compare?tokenA=USDC&tokenB=USDT",
        },
    }))
}

async fn compare_query(
    State(service): State<PriceService>,
    Query(params): Query<PairParams>,
) -> Result<Json<CompareResponse>, ApiError> {
    let pair = params.into_request().ok_or_else(|| ApiError::MissingParameters {
        message: "Both tokenA and tokenB query parameters are required",
        example: json!("/api/prices/compare?tokenA=SOL&tokenB=USDC"),
    })?;

    compare(&service, &pair).await
}

async fn compare_body(
    State(service): State<PriceService>,
    Json(params): Json<PairParams>,
) -> Result<Json<CompareResponse>, ApiError> {
    let pair = params.into_request().ok_or_else(|| ApiError::MissingParameters {
        message: "Both tokenA and tokenB are required in JSON body",
        example: json!({ "tokenA": "SOL", "tokenB": "USDC" }),
    })?;

    compare(&service, &pair).await
}

async fn compare(service: &PriceService, pair: &PairRequest) -> Result<Json<CompareResponse>, ApiError> {
    let (result, freshness) = service.compare(pair).await?;
    Ok(Json(CompareResponse::new(&result, freshness == Freshness::Cached)))
}

async fn dashboard(State(service): State<PriceService>, Query(params): Query<PairParams>) -> Response {
    let pair = PairRequest::new(
        params.token_a.unwrap_or_else(|| "SOL".to_string()),
        params.token_b.unwrap_or_else(|| "USDC".to_string()),
    );

    match service.dashboard(&pair).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => {
            let status = match e {
                AggregationError::UnknownSymbol { .. } => StatusCode::BAD_REQUEST,
                AggregationError::NoValidQuotes { .. } => StatusCode::BAD_GATEWAY,
            };
            let body = json!({
                "success": false,
                "error": e.to_string(),
                "prices": [],
                "source": "error",
                "failures": failure_views(e.failures()),
            });
            (status, Json(body)).into_response()
        }
    }
}

async fn stats(State(service): State<PriceService>) -> Json<Value> {
    let aggregator = service.aggregator().stats();
    let cache = service.cache().stats();

    Json(json!({
        "sources": service.aggregator().source_names(),
        "aggregator": {
            "sourceCount": aggregator.source_count,
            "comparisons": aggregator.comparisons,
            "failedComparisons": aggregator.failed_comparisons,
            "graceWindows": aggregator.grace_windows,
            "sourceFailures": aggregator.source_failures,
            "rejectedQuotes": aggregator.rejected_quotes,
        },
        "cache": {
            "ttlMs": u64::try_from(service.cache().ttl().as_millis()).unwrap_or(u64::MAX),
            "entries": cache.entry_count,
            "fresh": cache.fresh_count,
            "hits": cache.hits,
            "misses": cache.misses,
        },
    }))
}

//! HTTP API
//!
//! | Route | Auth | Description |
//! |-------|------|-------------|
//! | `GET /health` | - | Liveness |
//! | `/api/orders` | bearer | Order lifecycle |
//! | `/api/products` | bearer (reads by id are public) | Product catalogue |

pub mod health;
pub mod orders;
pub mod products;

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use http::{HeaderName, HeaderValue, Method, StatusCode, header};
use serde::Deserialize;
use shared::paging::Paging;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::{Config, ServerState};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Raw list query; out-of-range values fall back to default paging
#[derive(Debug, Default, Deserialize)]
pub struct PagingParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub query: Option<String>,
}

impl From<PagingParams> for Paging {
    fn from(params: PagingParams) -> Self {
        Paging::from_raw(
            params.page.as_deref(),
            params.limit.as_deref(),
            params.query.as_deref(),
        )
    }
}

/// Build the application router with all middleware and state
pub fn router(state: ServerState) -> Router {
    let config = state.config.clone();
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health::health_check))
        .merge(orders::router())
        .merge(products::router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_millis(config.request_timeout_ms),
        ))
        .layer(GlobalConcurrencyLimitLayer::new(config.max_connections))
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match config
        .allow_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => base.allow_origin(origin),
        None if config.is_development() => base.allow_origin(Any),
        None => base,
    }
}

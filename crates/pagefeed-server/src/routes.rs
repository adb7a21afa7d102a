//! HTTP surface: `/parse/<target>` and `/health`.

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, RawQuery, State},
    response::Json as AxumJson,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use pagefeed::RawParams;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::response::FeedResponse;
use crate::service::FeedService;

/// Build the application router around a service.
pub fn router(service: FeedService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/parse/*target", get(handle_parse))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(Arc::new(service))
}

/// Bind `config.addr` and serve until the process is stopped.
pub async fn serve(config: &ServerConfig) -> ServerResult<()> {
    let app = router(FeedService::new(config)?);
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;

    tracing::info!("Pagefeed listening on {}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Repeated query keys keep their first value. A target the router cannot
/// decode still gets the JSON error envelope.
async fn handle_parse(
    State(service): State<Arc<FeedService>>,
    target: Result<Path<String>, PathRejection>,
    RawQuery(query): RawQuery,
) -> FeedResponse {
    let params = RawParams::from_query(query.as_deref().unwrap_or_default());
    match target {
        Ok(Path(target)) => {
            tracing::debug!("GET /parse/{target} {params:?}");
            service.handle(&target, &params).await
        }
        Err(rejection) => {
            service.reject(&ServerError::invalid_target("", rejection.body_text()), &params)
        }
    }
}

async fn handle_health() -> AxumJson<serde_json::Value> {
    AxumJson(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

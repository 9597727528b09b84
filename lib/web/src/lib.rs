use anyhow::Context;
use axum::http::HeaderValue;
use axum::{routing::get, Router};
use cohort_query_engine::{CohortEngine, HttpGraphClient, VocabularyRegistry};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod attributes;
mod config;
mod error;
mod query;
mod state;

use crate::attributes::create_attributes_routes;
use crate::query::create_query_routes;
pub use config::ServerConfig;
pub use error::CohortServerError;
pub use state::AppState;

const WELCOME_MESSAGE: &str = "Welcome to the Neurobagel REST API! \
    Send cohort queries to /query and browse controlled terms under /attributes.";

/// Connects to the graph and serves the API until the server is shut down.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let client = HttpGraphClient::new(&config.graph)?;
    info!("Sending queries to the graph at {}", client.url());

    let vocabularies = VocabularyRegistry::load(&config.vocab_dir);
    let engine = CohortEngine::new(
        Arc::new(client),
        config.context,
        vocabularies,
        config.return_aggregate,
    );

    let app = create_router(AppState { engine });
    let app = match cors_layer(&config.allowed_origins)? {
        Some(cors) => app.layer(cors),
        None => app,
    };

    let listener = tokio::net::TcpListener::bind(config.bind.as_str())
        .await
        .with_context(|| format!("Could not bind to {}", config.bind))?;
    info!("Listening on {}", listener.local_addr()?);
    Ok(axum::serve(listener, app).await?)
}

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { WELCOME_MESSAGE }))
        .merge(create_query_routes())
        .merge(create_attributes_routes())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

/// Builds the CORS layer for `allowed_origins`, or `None` if no origin is allowed.
pub fn cors_layer(allowed_origins: &[String]) -> anyhow::Result<Option<CorsLayer>> {
    if allowed_origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins = allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("Invalid allowed origin '{origin}'"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(Any)
            .allow_headers(Any),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_origins_no_cors() {
        assert!(cors_layer(&[]).unwrap().is_none());
    }

    #[test]
    fn wildcard_and_listed_origins() {
        assert!(cors_layer(&["*".to_owned()]).unwrap().is_some());
        assert!(cors_layer(&["http://localhost:3000".to_owned()])
            .unwrap()
            .is_some());
    }

    #[test]
    fn invalid_origin_is_rejected() {
        assert!(cors_layer(&["http://local\nhost".to_owned()]).is_err());
    }
}

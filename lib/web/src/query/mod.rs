use crate::error::CohortServerError;
use crate::query::cohort_query_params::CohortQueryParams;
use crate::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use cohort_query_model::DatasetMatch;
use tracing::info;

mod cohort_query_params;

pub fn create_query_routes() -> Router<AppState> {
    Router::new()
        .route("/query", get(handle_query_get))
        .route("/query/", get(handle_query_get))
}

async fn handle_query_get(
    State(state): State<AppState>,
    CohortQueryParams(query): CohortQueryParams,
) -> Result<Json<Vec<DatasetMatch>>, CohortServerError> {
    let datasets = state.engine.query_cohorts(&query).await?;
    info!("Query matched subjects in {} datasets", datasets.len());
    Ok(Json(datasets))
}

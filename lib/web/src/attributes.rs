use crate::error::CohortServerError;
use crate::AppState;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use cohort_query_model::{ControlledTerm, TermsResponse, VocabularyResponse};

pub fn create_attributes_routes() -> Router<AppState> {
    Router::new()
        .route("/attributes", get(handle_attributes_get))
        .route("/attributes/", get(handle_attributes_get))
        .route("/attributes/{data_element}", get(handle_terms_get))
        .route("/attributes/{data_element}/vocab", get(handle_vocab_get))
}

/// Lists the data elements that are controlled terms.
async fn handle_attributes_get(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, CohortServerError> {
    Ok(Json(state.engine.controlled_term_attributes().await?))
}

/// Lists the terms used for `data_element` in the graph.
async fn handle_terms_get(
    State(state): State<AppState>,
    Path(data_element): Path<String>,
) -> Result<Json<TermsResponse>, CohortServerError> {
    let data_element = parse_data_element(&data_element)?;
    Ok(Json(state.engine.terms(&data_element).await?))
}

async fn handle_vocab_get(
    State(state): State<AppState>,
    Path(data_element): Path<String>,
) -> Result<Json<VocabularyResponse>, CohortServerError> {
    let data_element = parse_data_element(&data_element)?;
    state
        .engine
        .vocabulary(&data_element)
        .map(Json)
        .ok_or_else(|| CohortServerError::UnknownVocabulary(data_element.into()))
}

fn parse_data_element(value: &str) -> Result<ControlledTerm, CohortServerError> {
    value
        .parse::<ControlledTerm>()
        .map_err(|e| CohortServerError::InvalidRequest(e.to_string()))
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cohort_query_engine::{EngineError, GraphError};
use serde::Serialize;
use tracing::error;

#[derive(thiserror::Error, Debug)]
pub enum CohortServerError {
    /// The request parameters could not be turned into a valid query.
    #[error("{0}")]
    InvalidRequest(String),
    #[error("No vocabulary is available for '{0}'")]
    UnknownVocabulary(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Serialize)]
struct ErrorDetail {
    detail: String,
}

impl CohortServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            CohortServerError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CohortServerError::UnknownVocabulary(_) => StatusCode::NOT_FOUND,
            CohortServerError::Engine(EngineError::Graph(GraphError::Upstream {
                status, ..
            })) => StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            CohortServerError::Engine(EngineError::Graph(GraphError::Timeout)) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            CohortServerError::Engine(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for CohortServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let CohortServerError::Engine(engine_error) = &self {
            error!("Request failed with {status}: {engine_error}");
        }

        let detail = ErrorDetail {
            detail: self.to_string(),
        };
        (status, Json(detail)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_is_forwarded() {
        let error = CohortServerError::from(EngineError::Graph(GraphError::Upstream {
            status: 401,
            reason: "Unauthorized".to_owned(),
            body: "Invalid credentials".to_owned(),
        }));
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(error.to_string(), "Unauthorized: Invalid credentials");
    }

    #[test]
    fn result_errors_are_bad_gateway() {
        let error = CohortServerError::from(EngineError::MissingDatasetSize(
            "http://neurobagel.org/vocab/ds1".to_owned(),
        ));
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
    }
}

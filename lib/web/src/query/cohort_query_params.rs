use crate::error::CohortServerError;
use crate::AppState;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::RequestPartsExt;
use cohort_query_model::{parse_bool_flag, CohortQuery};
use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;

/// The query string as sent by the client. Values are parsed in a second step so that every
/// malformed parameter yields a descriptive error.
#[derive(Deserialize)]
struct CohortQueryParamsRaw {
    #[serde(default)]
    min_age: Option<String>,
    #[serde(default)]
    max_age: Option<String>,
    #[serde(default)]
    sex: Option<String>,
    #[serde(default)]
    diagnosis: Option<String>,
    #[serde(default)]
    is_control: Option<String>,
    #[serde(default)]
    min_num_imaging_sessions: Option<String>,
    #[serde(default)]
    min_num_phenotypic_sessions: Option<String>,
    #[serde(default)]
    assessment: Option<String>,
    #[serde(default)]
    image_modal: Option<String>,
}

/// A validated [CohortQuery] extracted from the query string.
pub struct CohortQueryParams(pub CohortQuery);

impl FromRequestParts<AppState> for CohortQueryParams {
    type Rejection = CohortServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw_params = parts
            .extract::<Query<CohortQueryParamsRaw>>()
            .await
            .map_err(|e| CohortServerError::InvalidRequest(e.body_text()))?
            .0;

        let is_control = present(raw_params.is_control)
            .map(|value| {
                parse_bool_flag(&value).ok_or_else(|| {
                    CohortServerError::InvalidRequest(format!(
                        "Invalid value for 'is_control': '{value}' is not a boolean."
                    ))
                })
            })
            .transpose()?;

        let query = CohortQuery {
            min_age: parse_param("min_age", raw_params.min_age)?,
            max_age: parse_param("max_age", raw_params.max_age)?,
            sex: parse_param("sex", raw_params.sex)?,
            diagnosis: parse_param("diagnosis", raw_params.diagnosis)?,
            is_control,
            min_num_imaging_sessions: parse_param(
                "min_num_imaging_sessions",
                raw_params.min_num_imaging_sessions,
            )?,
            min_num_phenotypic_sessions: parse_param(
                "min_num_phenotypic_sessions",
                raw_params.min_num_phenotypic_sessions,
            )?,
            assessment: parse_param("assessment", raw_params.assessment)?,
            image_modal: parse_param("image_modal", raw_params.image_modal)?,
        };

        query
            .validate()
            .map(CohortQueryParams)
            .map_err(|e| CohortServerError::InvalidRequest(e.to_string()))
    }
}

/// Blank parameters are treated as absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_param<T>(name: &str, value: Option<String>) -> Result<Option<T>, CohortServerError>
where
    T: FromStr,
    T::Err: Display,
{
    present(value)
        .map(|value| {
            value.trim().parse().map_err(|e| {
                CohortServerError::InvalidRequest(format!("Invalid value for '{name}': {e}"))
            })
        })
        .transpose()
}

use crate::ControlledTerm;

/// The criteria a subject must satisfy to be part of a cohort.
///
/// Every criterion is optional. A query without any criteria matches all subjects in the graph.
/// Use [CohortQuery::validate] before handing a query to the engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CohortQuery {
    pub min_age: Option<f64>,
    pub max_age: Option<f64>,
    pub sex: Option<ControlledTerm>,
    pub diagnosis: Option<ControlledTerm>,
    /// Whether the subject must (or must not) be a healthy control.
    pub is_control: Option<bool>,
    pub min_num_imaging_sessions: Option<u32>,
    pub min_num_phenotypic_sessions: Option<u32>,
    pub assessment: Option<ControlledTerm>,
    pub image_modal: Option<ControlledTerm>,
}

impl CohortQuery {
    /// Checks the constraints between the individual criteria.
    pub fn validate(self) -> Result<Self, QueryValidationError> {
        for (name, age) in [("min_age", self.min_age), ("max_age", self.max_age)] {
            if let Some(age) = age {
                if !age.is_finite() || age < 0.0 {
                    return Err(QueryValidationError::InvalidAge { name, value: age });
                }
            }
        }

        if let (Some(min_age), Some(max_age)) = (self.min_age, self.max_age) {
            if min_age > max_age {
                return Err(QueryValidationError::InvertedAgeRange { min_age, max_age });
            }
        }

        if self.is_control == Some(true) && self.diagnosis.is_some() {
            return Err(QueryValidationError::ControlWithDiagnosis);
        }

        Ok(self)
    }
}

/// Parses a boolean query parameter.
///
/// Accepts the usual spellings of truth values (`true`, `1`, `yes`, `on`, ...) in any case.
pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Raised if the criteria of a [CohortQuery] contradict each other.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryValidationError {
    #[error("'{name}' must be a non-negative number, got {value}.")]
    InvalidAge { name: &'static str, value: f64 },
    #[error("'min_age' ({min_age}) must be less than or equal to 'max_age' ({max_age}).")]
    InvertedAgeRange { min_age: f64, max_age: f64 },
    #[error("Subjects cannot both be healthy controls and have a diagnosis.")]
    ControlWithDiagnosis,
}

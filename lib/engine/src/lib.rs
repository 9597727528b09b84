mod aggregate;
pub mod client;
mod engine;
pub mod error;
pub mod results;
pub mod sparql;
pub mod terms;
pub mod vocab;

pub use aggregate::aggregate_datasets;
pub use client::{GraphClient, GraphConfig, GraphError, HttpGraphClient};
pub use engine::CohortEngine;
pub use error::EngineError;
pub use results::{BindingRow, ResultsError};
pub use vocab::{Vocabulary, VocabularyError, VocabularyRegistry};

use crate::client::GraphError;
use crate::results::ResultsError;

/// An error raised while answering a request with the help of the graph.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Communication with the graph failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// The graph answered with something that is not a valid result set.
    #[error(transparent)]
    Results(#[from] ResultsError),
    #[error("The graph did not report the number of subjects of dataset '{0}'")]
    MissingDatasetSize(String),
    #[error("The graph returned a result without a value for '{0}'")]
    MissingVariable(&'static str),
    #[error("The graph returned an invalid value for '{variable}': '{value}'")]
    InvalidValue {
        variable: &'static str,
        value: String,
    },
}

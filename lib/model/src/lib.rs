//! Data model shared by the cohort query engine and its web frontend.
//!
//! This crate holds everything that does not talk to the graph: the namespace context used to
//! compact term IRIs, validated controlled terms, validated cohort queries, and the JSON shapes
//! returned to clients.

mod context;
mod query;
mod response;
mod term;

pub use context::NamespaceContext;
pub use query::{parse_bool_flag, CohortQuery, QueryValidationError};
pub use response::{
    DatasetMatch, SessionRecord, SubjectData, TermEntry, TermsResponse, VocabularyResponse,
};
pub use term::{ControlledTerm, TermParseError};

/// Prefixed names of the data elements and classes this service knows about.
pub mod vocab {
    /// The class of all controlled-term data elements.
    pub const CONTROLLED_TERM: &str = "nb:ControlledTerm";
    /// The assessment data element.
    pub const ASSESSMENT: &str = "nb:Assessment";
    /// The diagnosis data element.
    pub const DIAGNOSIS: &str = "nb:Diagnosis";
    /// The subject group that marks healthy controls.
    pub const HEALTHY_CONTROL: &str = "ncit:C94342";
}

use cohort_query_engine::GraphConfig;
use cohort_query_model::NamespaceContext;
use std::path::PathBuf;

/// Holds the configuration for a cohort query web server.
pub struct ServerConfig {
    /// The IP address or DNS name and the port that the socket binds to.
    pub bind: String,
    /// How to reach the graph that holds the harmonized datasets.
    pub graph: GraphConfig,
    /// Whether only aggregate results are returned, hiding subject-level data.
    pub return_aggregate: bool,
    /// Origins allowed to make cross-origin requests.
    ///
    /// `*` allows any origin. If empty, CORS is disabled.
    pub allowed_origins: Vec<String>,
    /// Directory containing the vocabulary lookup files.
    pub vocab_dir: PathBuf,
    pub context: NamespaceContext,
}

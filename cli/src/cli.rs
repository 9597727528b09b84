use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use cohort_query_engine::vocab::COGNITIVE_ATLAS_TASKS_URL;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "cohort-query")]
/// Cohort query API for harmonized neuroimaging datasets stored in a graph
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the cohort query HTTP server
    Serve {
        /// Host and port to listen to
        #[arg(
            short,
            long,
            env = "NB_API_BIND",
            default_value = "127.0.0.1:8000",
            value_hint = ValueHint::Hostname
        )]
        bind: String,
        /// Host name or IP address of the graph database
        #[arg(long, env = "NB_GRAPH_ADDRESS", default_value = "127.0.0.1")]
        graph_address: String,
        /// Port of the graph database
        #[arg(long, env = "NB_GRAPH_PORT", default_value_t = 5820)]
        graph_port: u16,
        /// Path of the SPARQL query endpoint of the graph database
        #[arg(long, env = "NB_GRAPH_DB", default_value = "test_data/query")]
        graph_db: String,
        /// User name for authenticating with the graph database
        #[arg(long, env = "NB_GRAPH_USERNAME")]
        graph_username: Option<String>,
        /// Password for authenticating with the graph database
        #[arg(long, env = "NB_GRAPH_PASSWORD", hide_env_values = true)]
        graph_password: Option<String>,
        /// Seconds to wait for an answer of the graph database
        #[arg(long, env = "NB_GRAPH_TIMEOUT_SECS", default_value_t = 5)]
        graph_timeout_secs: u64,
        /// Only return aggregate results, hiding subject-level data
        #[arg(
            long,
            env = "NB_RETURN_AGG",
            default_value_t = true,
            action = ArgAction::Set,
            value_parser = BoolishValueParser::new()
        )]
        return_agg: bool,
        /// Origins allowed to send cross-origin requests, separated by spaces
        ///
        /// Use `*` to allow any origin. CORS is disabled if no origin is given.
        #[arg(long, env = "NB_API_ALLOWED_ORIGINS", default_value = "")]
        allowed_origins: String,
        /// Directory containing the vocabulary lookup files
        #[arg(long, env = "NB_VOCAB_DIR", default_value = "vocab", value_hint = ValueHint::DirPath)]
        vocab_dir: PathBuf,
        /// JSON file mapping additional namespace prefixes to their IRIs
        #[arg(long, env = "NB_CONTEXT_FILE", value_hint = ValueHint::FilePath)]
        context_file: Option<PathBuf>,
    },
    /// Download the Cognitive Atlas task names used to label assessments
    FetchVocab {
        /// File to write the term labels to
        #[arg(
            short,
            long,
            default_value = "vocab/cogatlas_task-names.json",
            value_hint = ValueHint::FilePath
        )]
        output: PathBuf,
        /// URL of the Cognitive Atlas task list
        #[arg(long, default_value = COGNITIVE_ATLAS_TASKS_URL, value_hint = ValueHint::Url)]
        url: String,
    },
}

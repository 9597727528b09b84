use crate::cli::{Args, Command};
use anyhow::{bail, Context};
use clap::Parser;
use cohort_query_engine::vocab::fetch_cognitive_atlas_tasks;
use cohort_query_engine::GraphConfig;
use cohort_query_model::NamespaceContext;
use cohort_query_web::ServerConfig;
use oxrdf::NamedNode;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cohort_query=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    let matches = Args::parse();
    match matches.command {
        Command::Serve {
            bind,
            graph_address,
            graph_port,
            graph_db,
            graph_username,
            graph_password,
            graph_timeout_secs,
            return_agg,
            allowed_origins,
            vocab_dir,
            context_file,
        } => {
            let mut context = NamespaceContext::default();
            if let Some(context_file) = context_file {
                context.extend(read_context_file(&context_file)?);
            }

            cohort_query_web::serve(ServerConfig {
                bind,
                graph: GraphConfig {
                    address: graph_address,
                    port: graph_port,
                    database: graph_db,
                    username: graph_username,
                    password: graph_password,
                    timeout: Duration::from_secs(graph_timeout_secs),
                },
                return_aggregate: return_agg,
                allowed_origins: allowed_origins
                    .split_whitespace()
                    .map(str::to_owned)
                    .collect(),
                vocab_dir,
                context,
            })
            .await
        }
        Command::FetchVocab { output, url } => {
            let count = fetch_cognitive_atlas_tasks(&url, &output).await?;
            info!("Wrote {count} term labels to {}", output.display());
            Ok(())
        }
    }
}

/// Reads a JSON object that maps namespace prefixes to namespace IRIs.
///
/// Prefixes must consist of letters only, the same as the prefixes of controlled terms.
fn read_context_file(path: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    let content = fs::read(path)
        .with_context(|| format!("Could not read context file {}", path.display()))?;
    let namespaces: BTreeMap<String, String> =
        serde_json::from_slice(&content).with_context(|| {
            format!(
                "Context file {} must map namespace prefixes to IRIs",
                path.display()
            )
        })?;

    for (prefix, iri) in &namespaces {
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            bail!(
                "Invalid namespace prefix '{prefix}' in context file {}",
                path.display()
            );
        }
        NamedNode::new(iri).with_context(|| {
            format!(
                "Invalid IRI '{iri}' for prefix '{prefix}' in context file {}",
                path.display()
            )
        })?;
    }
    Ok(namespaces)
}

#[cfg(test)]
#[allow(
    clippy::panic_in_result_fn,
    reason = "Tests assert inside functions that return a Result"
)]
mod tests {
    use super::*;
    use anyhow::Result;
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use assert_fs::NamedTempFile;
    use predicates::prelude::*;

    fn cli_command() -> Command {
        let mut command = Command::new(env!("CARGO"));
        command
            .arg("run")
            .arg("--bin")
            .arg("cohort-query")
            .arg("--");
        command
    }

    #[test]
    fn cli_help() {
        cli_command()
            .assert()
            .failure()
            .stderr(predicate::str::contains("cohort-query"));
    }

    #[test]
    fn cli_serve_help_lists_environment() {
        cli_command()
            .arg("serve")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("NB_GRAPH_ADDRESS"))
            .stdout(predicate::str::contains("NB_RETURN_AGG"));
    }

    #[test]
    fn cli_serve_rejects_missing_context_file() {
        cli_command()
            .arg("serve")
            .arg("--context-file")
            .arg("/nonexistent/context.json")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Could not read context file"));
    }

    #[test]
    fn context_file_is_read() -> Result<()> {
        let file = NamedTempFile::new("context.json")?;
        file.write_str(r#"{"cko": "https://www.coolknownontology.org/task/id/"}"#)?;
        let namespaces = read_context_file(file.path())?;
        assert_eq!(
            namespaces.get("cko").map(String::as_str),
            Some("https://www.coolknownontology.org/task/id/")
        );
        Ok(())
    }

    #[test]
    fn malformed_context_file_is_rejected() -> Result<()> {
        let file = NamedTempFile::new("context.json")?;
        file.write_str(r#"["cko"]"#)?;
        assert!(read_context_file(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn context_prefix_must_be_letters() -> Result<()> {
        let file = NamedTempFile::new("context.json")?;
        file.write_str(r#"{"bad prefix": "https://example.com/"}"#)?;
        let error = read_context_file(file.path()).unwrap_err();
        assert!(
            error.to_string().contains("Invalid namespace prefix 'bad prefix'"),
            "{error}"
        );
        Ok(())
    }

    #[test]
    fn context_iri_must_be_valid() -> Result<()> {
        let file = NamedTempFile::new("context.json")?;
        file.write_str(r#"{"cko": "http://example.com/>"}"#)?;
        let error = read_context_file(file.path()).unwrap_err();
        assert!(
            error.to_string().contains("Invalid IRI 'http://example.com/>'"),
            "{error}"
        );
        Ok(())
    }

    #[test]
    fn clap_debug() {
        use clap::CommandFactory;

        Args::command().debug_assert()
    }
}

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use tracing::error;
use url::Url;

const SPARQL_QUERY_MEDIA_TYPE: &str = "application/sparql-query";
const SPARQL_RESULTS_JSON_MEDIA_TYPE: &str = "application/sparql-results+json";

/// A remote graph that evaluates SPARQL queries.
///
/// Implementations return the raw body of a successful response; decoding the results is left to
/// [parse_bindings](crate::results::parse_bindings).
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Sends `query` to the graph.
    async fn post_query(&self, query: &str) -> Result<Vec<u8>, GraphError>;
}

/// Holds the connection settings of the graph database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphConfig {
    /// The host name or IP address of the graph.
    pub address: String,
    pub port: u16,
    /// The path of the query endpoint, relative to the host (e.g., `test_data/query`).
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// How long to wait for the graph before giving up.
    pub timeout: Duration,
}

impl GraphConfig {
    /// The URL of the SPARQL query endpoint.
    pub fn query_url(&self) -> Result<Url, GraphError> {
        let url = format!(
            "http://{}:{}/{}",
            self.address,
            self.port,
            self.database.trim_start_matches('/')
        );
        Url::parse(&url).map_err(|source| GraphError::InvalidUrl { url, source })
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_owned(),
            port: 5820,
            database: "test_data/query".to_owned(),
            username: None,
            password: None,
            timeout: Duration::from_secs(5),
        }
    }
}

/// A [GraphClient] that talks to the graph via the SPARQL 1.1 protocol.
#[derive(Clone, Debug)]
pub struct HttpGraphClient {
    client: Client,
    url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl HttpGraphClient {
    /// Creates a new client for the graph described by `config`.
    pub fn new(config: &GraphConfig) -> Result<Self, GraphError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GraphError::Request)?;
        Ok(Self {
            client,
            url: config.query_url()?,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl GraphClient for HttpGraphClient {
    async fn post_query(&self, query: &str) -> Result<Vec<u8>, GraphError> {
        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, SPARQL_QUERY_MEDIA_TYPE)
            .header(ACCEPT, SPARQL_RESULTS_JSON_MEDIA_TYPE)
            .body(query.to_owned());
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }

        let response = request.send().await.map_err(GraphError::from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    error!(
                        "Could not read the error response of the graph at {}: {e}",
                        self.url
                    );
                    String::new()
                }
            };
            error!("The graph at {} responded with {status}: {body}", self.url);
            return Err(GraphError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_owned(),
                body,
            });
        }

        let body = response.bytes().await.map_err(GraphError::from_reqwest)?;
        Ok(body.to_vec())
    }
}

/// An error raised while communicating with the graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Timed out while waiting for a response from the graph")]
    Timeout,
    /// The graph answered, but not with a success status.
    #[error("{reason}: {body}")]
    Upstream {
        status: u16,
        reason: String,
        body: String,
    },
    #[error("Could not reach the graph: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Invalid graph endpoint '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl GraphError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(error)
        }
    }
}

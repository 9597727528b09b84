use oxrdf::Term;
use sparesults::{
    QueryResultsFormat, QueryResultsParseError, QueryResultsParser, QuerySolution,
    ReaderQueryResultsParserOutput,
};
use std::collections::BTreeMap;

/// A single solution of a SELECT query, flattened to the plain values of its bindings.
///
/// IRIs are represented by the IRI itself and literals by their lexical form. Unbound variables
/// are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingRow {
    values: BTreeMap<String, String>,
}

impl BindingRow {
    /// Returns the value bound to `variable`.
    pub fn get(&self, variable: &str) -> Option<&str> {
        self.values.get(variable).map(String::as_str)
    }

    /// Creates a row from `(variable, value)` pairs.
    pub fn from_pairs<V, T>(pairs: impl IntoIterator<Item = (V, T)>) -> Self
    where
        V: Into<String>,
        T: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(variable, value)| (variable.into(), value.into()))
                .collect(),
        }
    }
}

impl From<QuerySolution> for BindingRow {
    fn from(solution: QuerySolution) -> Self {
        Self {
            values: solution
                .iter()
                .map(|(variable, term)| (variable.as_str().to_owned(), plain_value(term)))
                .collect(),
        }
    }
}

fn plain_value(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_owned(),
        Term::Literal(literal) => literal.value().to_owned(),
        other => other.to_string(),
    }
}

/// Parses a [SPARQL 1.1 Query Results JSON](https://www.w3.org/TR/sparql11-results-json/)
/// document into flat rows.
pub fn parse_bindings(body: &[u8]) -> Result<Vec<BindingRow>, ResultsError> {
    match QueryResultsParser::from_format(QueryResultsFormat::Json).for_reader(body)? {
        ReaderQueryResultsParserOutput::Solutions(solutions) => solutions
            .map(|solution| solution.map(BindingRow::from).map_err(ResultsError::from))
            .collect(),
        ReaderQueryResultsParserOutput::Boolean(_) => Err(ResultsError::UnexpectedBoolean),
    }
}

/// An error raised while reading the results returned by the graph.
#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    #[error("Could not parse the results returned by the graph: {0}")]
    Parsing(#[from] QueryResultsParseError),
    #[error("The graph returned a boolean result where solutions were expected")]
    UnexpectedBoolean,
}

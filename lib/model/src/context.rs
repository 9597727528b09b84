use std::collections::BTreeMap;

const RDFS_PREFIX: &str = "rdfs";
const RDFS_NAMESPACE: &str = "http://www.w3.org/2000/01/rdf-schema#";

/// Maps prefixes to the namespace IRIs of the vocabularies recognized by the service.
///
/// The context is used in both directions: its entries make up the prologue of every generated
/// SPARQL query, and term IRIs returned from the graph are compacted against it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceContext {
    namespaces: BTreeMap<String, String>,
}

impl NamespaceContext {
    /// Creates a context from `(prefix, namespace)` pairs.
    pub fn from_pairs<P, N>(pairs: impl IntoIterator<Item = (P, N)>) -> Self
    where
        P: Into<String>,
        N: Into<String>,
    {
        Self {
            namespaces: pairs
                .into_iter()
                .map(|(prefix, namespace)| (prefix.into(), namespace.into()))
                .collect(),
        }
    }

    /// Adds all entries of `other`, replacing existing prefixes.
    pub fn extend(&mut self, other: impl IntoIterator<Item = (String, String)>) {
        self.namespaces.extend(other);
    }

    /// Returns the namespace IRI bound to `prefix`.
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// Iterates over all `(prefix, namespace)` pairs in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.namespaces
            .iter()
            .map(|(prefix, namespace)| (prefix.as_str(), namespace.as_str()))
    }

    /// Replaces the namespace of `iri` with its prefix.
    ///
    /// If several namespaces match, the longest one wins. Returns `None` if `iri` is not part of
    /// any recognized namespace.
    pub fn compact(&self, iri: &str) -> Option<String> {
        self.longest_match(iri)
            .map(|(prefix, namespace)| format!("{prefix}:{}", &iri[namespace.len()..]))
    }

    /// Like [Self::compact] but returns `iri` unchanged if no namespace matches.
    pub fn compact_or_keep(&self, iri: &str) -> String {
        self.compact(iri).unwrap_or_else(|| iri.to_owned())
    }

    /// Renders the `PREFIX` declarations that start every generated query.
    pub fn prologue(&self) -> String {
        let rdfs = (!self.namespaces.contains_key(RDFS_PREFIX))
            .then_some((RDFS_PREFIX, RDFS_NAMESPACE));
        rdfs.into_iter()
            .chain(self.iter())
            .map(|(prefix, namespace)| format!("PREFIX {prefix}: <{namespace}>\n"))
            .collect()
    }

    fn longest_match(&self, iri: &str) -> Option<(&str, &str)> {
        self.iter()
            .filter(|(_, namespace)| iri.starts_with(namespace))
            .max_by_key(|(_, namespace)| namespace.len())
    }
}

impl Default for NamespaceContext {
    fn default() -> Self {
        Self::from_pairs([
            ("cogatlas", "https://www.cognitiveatlas.org/task/id/"),
            ("nb", "http://neurobagel.org/vocab/"),
            ("nbg", "http://neurobagel.org/graph/"),
            ("ncit", "http://ncicb.nci.nih.gov/xml/owl/EVS/Thesaurus.owl#"),
            ("nidm", "http://purl.org/nidash/nidm#"),
            ("snomed", "http://purl.bioontology.org/ontology/SNOMEDCT/"),
        ])
    }
}

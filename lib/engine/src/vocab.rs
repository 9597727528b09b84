//! Static lookup files that map the identifiers of controlled terms to human-readable labels.

use cohort_query_model::{vocab, NamespaceContext, VocabularyResponse};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The Cognitive Atlas endpoint that lists all tasks.
pub const COGNITIVE_ATLAS_TASKS_URL: &str =
    "https://www.cognitiveatlas.org/api/v-alpha/task?format=json";

/// Describes where the labels of a data element's vocabulary are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VocabularySource {
    pub data_element: &'static str,
    pub name: &'static str,
    pub namespace_prefix: &'static str,
    pub file_name: &'static str,
}

/// The vocabularies that are loaded from the vocabulary directory.
pub const VOCABULARY_SOURCES: [VocabularySource; 2] = [
    VocabularySource {
        data_element: vocab::ASSESSMENT,
        name: "Cognitive Atlas Tasks",
        namespace_prefix: "cogatlas",
        file_name: "cogatlas_task-names.json",
    },
    VocabularySource {
        data_element: vocab::DIAGNOSIS,
        name: "SNOMED CT",
        namespace_prefix: "snomed",
        file_name: "snomedct_disorder_term-labels.json",
    },
];

/// The labels of all terms of one vocabulary, keyed by the local name of the term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vocabulary {
    pub name: String,
    pub namespace_prefix: String,
    pub term_labels: BTreeMap<String, String>,
}

impl Vocabulary {
    /// Reads the term labels of `source` from `dir`.
    ///
    /// The file must contain a single JSON object that maps term identifiers to labels.
    pub fn read(dir: &Path, source: &VocabularySource) -> Result<Self, VocabularyError> {
        let path = dir.join(source.file_name);
        let content = fs::read(&path).map_err(|error| VocabularyError::Io {
            path: path.clone(),
            source: error,
        })?;
        let term_labels = serde_json::from_slice(&content)
            .map_err(|error| VocabularyError::Json { path, source: error })?;
        Ok(Self {
            name: source.name.to_owned(),
            namespace_prefix: source.namespace_prefix.to_owned(),
            term_labels,
        })
    }

    /// Returns the label of the prefixed term `term`, if it belongs to this vocabulary.
    pub fn label(&self, term: &str) -> Option<&str> {
        let (prefix, id) = term.split_once(':')?;
        if prefix != self.namespace_prefix {
            return None;
        }
        self.term_labels.get(id).map(String::as_str)
    }

    /// Describes this vocabulary, resolving its namespace against `context`.
    pub fn to_response(&self, context: &NamespaceContext) -> VocabularyResponse {
        VocabularyResponse {
            vocabulary_name: self.name.clone(),
            namespace_url: context
                .namespace(&self.namespace_prefix)
                .unwrap_or_default()
                .to_owned(),
            namespace_prefix: self.namespace_prefix.clone(),
            term_labels: self.term_labels.clone(),
        }
    }
}

/// Maps prefixed data elements (e.g., `nb:Assessment`) to their [Vocabulary].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VocabularyRegistry {
    vocabularies: BTreeMap<String, Vocabulary>,
}

impl VocabularyRegistry {
    /// Loads all [VOCABULARY_SOURCES] from `dir`.
    ///
    /// Vocabularies whose file cannot be read are skipped. Their terms are still listed, just
    /// without labels.
    pub fn load(dir: &Path) -> Self {
        let mut registry = Self::default();
        for source in &VOCABULARY_SOURCES {
            match Vocabulary::read(dir, source) {
                Ok(vocabulary) => {
                    info!(
                        "Loaded {} labels for {} ({})",
                        vocabulary.term_labels.len(),
                        source.data_element,
                        source.name
                    );
                    registry.insert(source.data_element, vocabulary);
                }
                Err(error) => warn!("Skipping vocabulary of {}: {error}", source.data_element),
            }
        }
        registry
    }

    pub fn insert(&mut self, data_element: impl Into<String>, vocabulary: Vocabulary) {
        self.vocabularies.insert(data_element.into(), vocabulary);
    }

    pub fn get(&self, data_element: &str) -> Option<&Vocabulary> {
        self.vocabularies.get(data_element)
    }

    pub fn len(&self) -> usize {
        self.vocabularies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabularies.is_empty()
    }
}

#[derive(Deserialize)]
struct CognitiveAtlasTask {
    id: String,
    name: String,
}

/// Downloads all Cognitive Atlas tasks from `url` and stores them as a label lookup file at
/// `output`.
///
/// Returns the number of stored labels.
pub async fn fetch_cognitive_atlas_tasks(
    url: &str,
    output: &Path,
) -> Result<usize, VocabularyError> {
    let download_error = |error| VocabularyError::Download {
        url: url.to_owned(),
        source: error,
    };

    let response = reqwest::get(url).await.map_err(download_error)?;
    if !response.status().is_success() {
        return Err(VocabularyError::DownloadStatus {
            url: url.to_owned(),
            status: response.status().as_u16(),
        });
    }
    let body = response.bytes().await.map_err(download_error)?;

    let tasks: Vec<CognitiveAtlasTask> =
        serde_json::from_slice(&body).map_err(|error| VocabularyError::Json {
            path: PathBuf::from(url),
            source: error,
        })?;
    let term_labels = tasks
        .into_iter()
        .map(|task| (task.id, task.name))
        .collect::<BTreeMap<_, _>>();

    write_term_labels(output, &term_labels)?;
    Ok(term_labels.len())
}

fn write_term_labels(
    output: &Path,
    term_labels: &BTreeMap<String, String>,
) -> Result<(), VocabularyError> {
    let io_error = |error| VocabularyError::Io {
        path: output.to_path_buf(),
        source: error,
    };

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let content = serde_json::to_vec_pretty(term_labels).map_err(|error| VocabularyError::Json {
        path: output.to_path_buf(),
        source: error,
    })?;
    fs::write(output, content).map_err(io_error)
}

/// An error raised while reading or fetching a vocabulary.
#[derive(Debug, thiserror::Error)]
pub enum VocabularyError {
    #[error("Could not access vocabulary file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{}' is not a valid vocabulary: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Could not download vocabulary from '{url}': {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Downloading vocabulary from '{url}' failed with status {status}")]
    DownloadStatus { url: String, status: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    fn cognitive_atlas() -> Vocabulary {
        Vocabulary {
            name: "Cognitive Atlas Tasks".to_owned(),
            namespace_prefix: "cogatlas".to_owned(),
            term_labels: BTreeMap::from([(
                "tsk_U9gDp8utahAfO".to_owned(),
                "Pittsburgh Stress Battery".to_owned(),
            )]),
        }
    }

    #[test]
    fn label_lookup() {
        let vocabulary = cognitive_atlas();
        assert_eq!(
            vocabulary.label("cogatlas:tsk_U9gDp8utahAfO"),
            Some("Pittsburgh Stress Battery")
        );
        assert_eq!(vocabulary.label("cogatlas:not_found_id"), None);
        assert_eq!(vocabulary.label("snomed:tsk_U9gDp8utahAfO"), None);
        assert_eq!(vocabulary.label("tsk_U9gDp8utahAfO"), None);
    }

    #[test]
    fn response_resolves_namespace() {
        let response = cognitive_atlas().to_response(&NamespaceContext::default());
        assert_eq!(response.vocabulary_name, "Cognitive Atlas Tasks");
        assert_eq!(
            response.namespace_url,
            "https://www.cognitiveatlas.org/task/id/"
        );
        assert_eq!(response.namespace_prefix, "cogatlas");
        assert_eq!(response.term_labels.len(), 1);
    }

    #[test]
    fn load_skips_missing_files() {
        let dir = TempDir::new().unwrap();
        dir.child("cogatlas_task-names.json")
            .write_str(r#"{"tsk_p7cabUkVvQPBS": "Generalized Self-Efficacy Scale"}"#)
            .unwrap();

        let registry = VocabularyRegistry::load(dir.path());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry
                .get("nb:Assessment")
                .and_then(|vocabulary| vocabulary.label("cogatlas:tsk_p7cabUkVvQPBS")),
            Some("Generalized Self-Efficacy Scale")
        );
        assert!(registry.get("nb:Diagnosis").is_none());
    }

    #[test]
    fn read_rejects_malformed_file() {
        let dir = TempDir::new().unwrap();
        dir.child("snomedct_disorder_term-labels.json")
            .write_str(r#"["not", "an", "object"]"#)
            .unwrap();

        let error = Vocabulary::read(dir.path(), &VOCABULARY_SOURCES[1]).unwrap_err();
        assert!(matches!(error, VocabularyError::Json { .. }));
    }

    #[test]
    fn written_labels_can_be_read_back() {
        let dir = TempDir::new().unwrap();
        let labels = BTreeMap::from([("tsk_1".to_owned(), "Task One".to_owned())]);
        write_term_labels(&dir.path().join("nested/cogatlas_task-names.json"), &labels).unwrap();

        let vocabulary =
            Vocabulary::read(&dir.path().join("nested"), &VOCABULARY_SOURCES[0]).unwrap();
        assert_eq!(vocabulary.term_labels, labels);
    }
}

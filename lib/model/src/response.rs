use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// The aggregated match of a cohort query within a single dataset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetMatch {
    pub dataset_uuid: String,
    pub dataset_name: String,
    /// Only set if every matching record of the dataset carries the same portal link.
    pub dataset_portal_uri: Option<String>,
    pub dataset_total_subjects: u64,
    pub records_protected: bool,
    pub num_matching_subjects: usize,
    pub subject_data: SubjectData,
    pub image_modals: Vec<String>,
}

/// The subject-level part of a [DatasetMatch].
#[derive(Clone, Debug, PartialEq)]
pub enum SubjectData {
    /// The service only returns aggregates. Serialized as the string `"protected"`.
    Protected,
    /// One record per matching session.
    Sessions(Vec<SessionRecord>),
}

impl Serialize for SubjectData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SubjectData::Protected => serializer.serialize_str("protected"),
            SubjectData::Sessions(sessions) => sessions.serialize(serializer),
        }
    }
}

/// A single session of a matching subject.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionRecord {
    pub sub_id: Option<String>,
    pub session_id: Option<String>,
    pub session_type: Option<String>,
    pub num_matching_phenotypic_sessions: Option<u32>,
    pub num_matching_imaging_sessions: Option<u32>,
    pub age: Option<f64>,
    pub sex: Option<String>,
    pub diagnosis: Vec<String>,
    pub subject_group: Option<String>,
    pub assessment: Vec<String>,
    pub image_modal: Vec<String>,
    pub session_file_path: Option<String>,
}

/// A controlled term found in the graph, together with its label if one is known.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    #[serde(rename = "TermURL")]
    pub term_url: String,
    #[serde(rename = "Label")]
    pub label: Option<String>,
}

/// All instances of one data element, keyed by the prefixed data element.
pub type TermsResponse = BTreeMap<String, Vec<TermEntry>>;

/// Describes the vocabulary used for a data element, including all known term labels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyResponse {
    pub vocabulary_name: String,
    pub namespace_url: String,
    pub namespace_prefix: String,
    pub term_labels: BTreeMap<String, String>,
}

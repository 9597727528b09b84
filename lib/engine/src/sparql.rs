//! Builders for the SPARQL queries sent to the graph.
//!
//! All queries start with the prologue of the [NamespaceContext], so controlled terms can be
//! interpolated as prefixed names.

use cohort_query_model::{vocab, CohortQuery, ControlledTerm, NamespaceContext};
use itertools::Itertools;
use oxrdf::NamedNode;

/// Names of the variables bound by the generated queries.
pub mod var {
    pub const DATASET_UUID: &str = "dataset_uuid";
    pub const DATASET_NAME: &str = "dataset_name";
    pub const DATASET_PORTAL_URI: &str = "dataset_portal_uri";
    pub const SUB_ID: &str = "sub_id";
    pub const AGE: &str = "age";
    pub const SEX: &str = "sex";
    pub const DIAGNOSIS: &str = "diagnosis";
    pub const SUBJECT_GROUP: &str = "subject_group";
    pub const NUM_MATCHING_PHENOTYPIC_SESSIONS: &str = "num_matching_phenotypic_sessions";
    pub const NUM_MATCHING_IMAGING_SESSIONS: &str = "num_matching_imaging_sessions";
    pub const SESSION_ID: &str = "session_id";
    pub const SESSION_TYPE: &str = "session_type";
    pub const ASSESSMENT: &str = "assessment";
    pub const IMAGE_MODAL: &str = "image_modal";
    pub const SESSION_FILE_PATH: &str = "session_file_path";
    pub const TOTAL_SUBJECTS: &str = "total_subjects";
    pub const ATTRIBUTE: &str = "attribute";
    pub const TERM_URL: &str = "termURL";
}

/// Separator used to concatenate the modalities of a subject in aggregate queries.
pub const MODALITY_SEPARATOR: &str = ", ";

/// Creates the query that finds all sessions of subjects matching `query`.
///
/// If `return_aggregate` is set, the subject-level query is wrapped such that only dataset and
/// subject identifiers, together with the concatenated imaging modalities, leave the graph.
pub fn cohort_query(
    query: &CohortQuery,
    context: &NamespaceContext,
    return_aggregate: bool,
) -> String {
    let filters = subject_filters(query)
        .into_iter()
        .map(|filter| format!("    {filter}\n"))
        .collect::<String>();

    let subject_query = format!(
        "SELECT DISTINCT ?dataset_uuid ?dataset_name ?dataset_portal_uri ?sub_id ?age ?sex
?diagnosis ?subject_group ?num_matching_phenotypic_sessions ?num_matching_imaging_sessions
?session_id ?session_type ?assessment ?image_modal ?session_file_path
WHERE {{
    ?dataset_uuid a nb:Dataset;
        nb:hasLabel ?dataset_name;
        nb:hasSamples ?subject.
    ?subject a nb:Subject;
        nb:hasLabel ?sub_id;
        nb:hasSession ?session.
    ?session nb:hasLabel ?session_id.
    ?session a ?session_type.
    OPTIONAL {{
        ?session nb:hasAcquisition/nb:hasContrastType ?image_modal.
    }}
    OPTIONAL {{?session nb:hasFilePath ?session_file_path.}}
    OPTIONAL {{?dataset_uuid nb:hasPortalURI ?dataset_portal_uri.}}
    OPTIONAL {{?subject nb:hasAge ?age.}}
    OPTIONAL {{?subject nb:hasSex ?sex.}}
    OPTIONAL {{?subject nb:hasDiagnosis ?diagnosis.}}
    OPTIONAL {{?subject nb:isSubjectGroup ?subject_group.}}
    OPTIONAL {{?subject nb:hasAssessment ?assessment.}}
    OPTIONAL {{
        SELECT ?subject (COUNT(DISTINCT ?phenotypic_session) AS ?num_matching_phenotypic_sessions)
        WHERE {{
            ?subject nb:hasSession ?phenotypic_session.
            ?phenotypic_session a nb:PhenotypicSession.
        }} GROUP BY ?subject
    }}
    OPTIONAL {{
        SELECT ?subject (COUNT(DISTINCT ?imaging_session) AS ?num_matching_imaging_sessions)
        WHERE {{
            ?subject nb:hasSession ?imaging_session.
            ?imaging_session a nb:ImagingSession.
        }} GROUP BY ?subject
    }}
{filters}}}
"
    );

    let body = if return_aggregate {
        format!(
            r#"SELECT ?dataset_uuid ?dataset_name ?dataset_portal_uri ?sub_id (GROUP_CONCAT(DISTINCT ?image_modal; SEPARATOR="{MODALITY_SEPARATOR}") AS ?image_modal)
WHERE {{
{subject_query}}}
GROUP BY ?dataset_uuid ?dataset_name ?dataset_portal_uri ?sub_id
"#
        )
    } else {
        subject_query
    };

    format!("{}{body}", context.prologue())
}

/// One `FILTER` clause for each criterion set in `query`.
fn subject_filters(query: &CohortQuery) -> Vec<String> {
    let mut filters = Vec::new();
    if let Some(min_age) = query.min_age {
        filters.push(format!("FILTER (?age >= {min_age})."));
    }
    if let Some(max_age) = query.max_age {
        filters.push(format!("FILTER (?age <= {max_age})."));
    }
    if let Some(sex) = &query.sex {
        filters.push(term_filter(var::SEX, sex));
    }
    if let Some(diagnosis) = &query.diagnosis {
        filters.push(term_filter(var::DIAGNOSIS, diagnosis));
    }
    if let Some(is_control) = query.is_control {
        let operator = if is_control { "=" } else { "!=" };
        filters.push(format!(
            "FILTER (?{} {operator} {}).",
            var::SUBJECT_GROUP,
            vocab::HEALTHY_CONTROL
        ));
    }
    if let Some(min_sessions) = query.min_num_phenotypic_sessions {
        filters.push(session_count_filter(
            var::NUM_MATCHING_PHENOTYPIC_SESSIONS,
            min_sessions,
        ));
    }
    if let Some(min_sessions) = query.min_num_imaging_sessions {
        filters.push(session_count_filter(
            var::NUM_MATCHING_IMAGING_SESSIONS,
            min_sessions,
        ));
    }
    if let Some(assessment) = &query.assessment {
        filters.push(term_filter(var::ASSESSMENT, assessment));
    }
    if let Some(image_modal) = &query.image_modal {
        filters.push(term_filter(var::IMAGE_MODAL, image_modal));
    }
    filters
}

/// Subjects without sessions of the counted kind have no count bound.
fn session_count_filter(variable: &str, min_sessions: u32) -> String {
    format!("FILTER (COALESCE(?{variable}, 0) >= {min_sessions}).")
}

fn term_filter(variable: &str, term: &ControlledTerm) -> String {
    format!("FILTER (?{variable} = {term}).")
}

/// Creates the query that counts all subjects of the given datasets.
pub fn dataset_size_query(dataset_uuids: &[NamedNode], context: &NamespaceContext) -> String {
    let values = dataset_uuids.iter().join(" ");
    format!(
        "{}SELECT ?dataset_uuid (COUNT(DISTINCT ?subject) AS ?total_subjects)
WHERE {{
    VALUES ?dataset_uuid {{ {values} }}
    ?dataset_uuid nb:hasSamples ?subject.
    ?subject a nb:Subject.
}} GROUP BY ?dataset_uuid
",
        context.prologue()
    )
}

/// Creates the query that lists all data elements that are controlled terms.
pub fn controlled_term_attributes_query(context: &NamespaceContext) -> String {
    format!(
        "{}SELECT DISTINCT ?attribute
WHERE {{
    ?attribute rdfs:subClassOf {}.
}}
",
        context.prologue(),
        vocab::CONTROLLED_TERM
    )
}

/// Creates the query that lists all instances of the data element `data_element`.
pub fn term_instances_query(data_element: &ControlledTerm, context: &NamespaceContext) -> String {
    format!(
        "{}SELECT DISTINCT ?termURL
WHERE {{
    ?termURL a {data_element}.
    {data_element} rdfs:subClassOf {}.
}}
",
        context.prologue(),
        vocab::CONTROLLED_TERM
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(value: &str) -> ControlledTerm {
        value.parse().unwrap()
    }

    #[test]
    fn unfiltered_query_has_no_filters() {
        let query = cohort_query(&CohortQuery::default(), &NamespaceContext::default(), false);
        assert!(query.starts_with("PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n"));
        assert!(query.contains("PREFIX nb: <http://neurobagel.org/vocab/>\n"));
        assert!(!query.contains("FILTER"));
        assert!(!query.contains("GROUP_CONCAT"));
    }

    #[test]
    fn every_criterion_adds_a_filter() {
        let query = CohortQuery {
            min_age: Some(30.5),
            max_age: Some(60.0),
            sex: Some(term("snomed:248153007")),
            diagnosis: Some(term("snomed:35489007")),
            is_control: Some(false),
            min_num_imaging_sessions: Some(2),
            min_num_phenotypic_sessions: Some(1),
            assessment: Some(term("cogatlas:tsk_U9gDp8utahAfO")),
            image_modal: Some(term("nidm:T1Weighted")),
        };
        let sparql = cohort_query(&query, &NamespaceContext::default(), false);

        for filter in [
            "FILTER (?age >= 30.5).",
            "FILTER (?age <= 60).",
            "FILTER (?sex = snomed:248153007).",
            "FILTER (?diagnosis = snomed:35489007).",
            "FILTER (?subject_group != ncit:C94342).",
            "FILTER (COALESCE(?num_matching_phenotypic_sessions, 0) >= 1).",
            "FILTER (COALESCE(?num_matching_imaging_sessions, 0) >= 2).",
            "FILTER (?assessment = cogatlas:tsk_U9gDp8utahAfO).",
            "FILTER (?image_modal = nidm:T1Weighted).",
        ] {
            assert!(sparql.contains(filter), "missing {filter} in {sparql}");
        }
    }

    #[test]
    fn healthy_controls_filter() {
        let query = CohortQuery {
            is_control: Some(true),
            ..CohortQuery::default()
        };
        let sparql = cohort_query(&query, &NamespaceContext::default(), false);
        assert!(sparql.contains("FILTER (?subject_group = ncit:C94342)."));
    }

    #[test]
    fn aggregate_query_wraps_subject_query() {
        let sparql = cohort_query(&CohortQuery::default(), &NamespaceContext::default(), true);
        assert!(sparql.contains(r#"(GROUP_CONCAT(DISTINCT ?image_modal; SEPARATOR=", ") AS ?image_modal)"#));
        assert!(sparql.contains("GROUP BY ?dataset_uuid ?dataset_name ?dataset_portal_uri ?sub_id"));
        assert_eq!(sparql.matches("PREFIX nb:").count(), 1);
    }

    #[test]
    fn dataset_sizes_use_values_clause() {
        let sparql = dataset_size_query(
            &[
                NamedNode::new_unchecked("http://neurobagel.org/vocab/ds1234"),
                NamedNode::new_unchecked("http://neurobagel.org/vocab/ds2345"),
            ],
            &NamespaceContext::default(),
        );
        assert!(sparql.contains(
            "VALUES ?dataset_uuid { <http://neurobagel.org/vocab/ds1234> <http://neurobagel.org/vocab/ds2345> }"
        ));
        assert!(sparql.contains("(COUNT(DISTINCT ?subject) AS ?total_subjects)"));
    }

    #[test]
    fn term_instances_of_data_element() {
        let sparql = term_instances_query(&term("nb:Assessment"), &NamespaceContext::default());
        assert!(sparql.contains("?termURL a nb:Assessment."));
        assert!(sparql.contains("nb:Assessment rdfs:subClassOf nb:ControlledTerm."));
    }

    #[test]
    fn generated_queries_parse() {
        let context = NamespaceContext::default();
        let query = CohortQuery {
            min_age: Some(30.5),
            sex: Some(term("snomed:248153007")),
            min_num_imaging_sessions: Some(1),
            assessment: Some(term("cogatlas:tsk_U9gDp8utahAfO")),
            image_modal: Some(term("nidm:T1.Weighted%20x")),
            ..CohortQuery::default()
        };
        let queries = [
            cohort_query(&query, &context, false),
            cohort_query(&query, &context, true),
            dataset_size_query(
                &[NamedNode::new_unchecked("http://neurobagel.org/vocab/ds1234")],
                &context,
            ),
            controlled_term_attributes_query(&context),
            term_instances_query(&term("nb:Assessment"), &context),
        ];
        for sparql in queries {
            let parsed = oxigraph::sparql::Query::parse(&sparql, None);
            assert!(parsed.is_ok(), "{parsed:?} for {sparql}");
        }
    }

    #[test]
    fn controlled_term_attributes() {
        let sparql = controlled_term_attributes_query(&NamespaceContext::default());
        assert!(sparql.contains("SELECT DISTINCT ?attribute"));
        assert!(sparql.contains("?attribute rdfs:subClassOf nb:ControlledTerm."));
    }
}

//! Post-processing of controlled terms found in the graph.

use crate::results::BindingRow;
use crate::sparql::var;
use crate::vocab::Vocabulary;
use cohort_query_model::{ControlledTerm, NamespaceContext, TermEntry, TermsResponse};
use tracing::warn;

/// Compacts the IRIs of all data elements that are controlled terms.
///
/// Attributes outside the recognized namespaces are kept as full IRIs.
pub fn controlled_term_attributes(rows: &[BindingRow], context: &NamespaceContext) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(var::ATTRIBUTE))
        .map(|iri| context.compact_or_keep(iri))
        .collect()
}

/// Turns the instances of `data_element` into prefixed terms with optional labels.
///
/// Terms from unrecognized namespaces are dropped. Labels are looked up in `vocabulary`; a term
/// that is not part of it gets no label.
pub fn resolve_terms(
    data_element: &ControlledTerm,
    rows: &[BindingRow],
    context: &NamespaceContext,
    vocabulary: Option<&Vocabulary>,
) -> TermsResponse {
    let terms = rows
        .iter()
        .filter_map(|row| row.get(var::TERM_URL))
        .filter_map(|iri| {
            let Some(term_url) = context.compact(iri) else {
                warn!(
                    "The controlled term {iri} was found in the graph but does not come from a \
                     vocabulary recognized by Neurobagel. This term will be ignored."
                );
                return None;
            };
            let label = vocabulary
                .and_then(|vocabulary| vocabulary.label(&term_url))
                .map(str::to_owned);
            Some(TermEntry { term_url, label })
        })
        .collect();

    TermsResponse::from([(data_element.to_string(), terms)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn term_rows(iris: &[&str]) -> Vec<BindingRow> {
        iris.iter()
            .map(|iri| BindingRow::from_pairs([("termURL", *iri)]))
            .collect()
    }

    #[test]
    fn terms_with_vocabulary_lookup() {
        let vocabulary = Vocabulary {
            name: "Cognitive Atlas Tasks".to_owned(),
            namespace_prefix: "cogatlas".to_owned(),
            term_labels: BTreeMap::from([(
                "tsk_U9gDp8utahAfO".to_owned(),
                "Pittsburgh Stress Battery".to_owned(),
            )]),
        };
        let rows = term_rows(&[
            "https://www.cognitiveatlas.org/task/id/tsk_U9gDp8utahAfO",
            "https://www.cognitiveatlas.org/task/id/not_found_id",
            "https://www.notanatlas.org/task/id/tsk_alz5hjlUXp4WY",
        ]);

        let response = resolve_terms(
            &"nb:Assessment".parse().unwrap(),
            &rows,
            &NamespaceContext::default(),
            Some(&vocabulary),
        );

        assert_eq!(
            response,
            TermsResponse::from([(
                "nb:Assessment".to_owned(),
                vec![
                    TermEntry {
                        term_url: "cogatlas:tsk_U9gDp8utahAfO".to_owned(),
                        label: Some("Pittsburgh Stress Battery".to_owned()),
                    },
                    TermEntry {
                        term_url: "cogatlas:not_found_id".to_owned(),
                        label: None,
                    },
                ]
            )])
        );
    }

    #[test]
    fn terms_without_vocabulary_lookup() {
        let context = NamespaceContext::from_pairs([
            ("cko", "https://www.coolknownontology.org/task/id/"),
            ("ako", "https://www.awesomeknownontology.org/vocab/"),
        ]);
        let rows = term_rows(&[
            "https://www.coolknownontology.org/task/id/trm_123",
            "https://www.coolknownontology.org/task/id/trm_234",
        ]);

        let response = resolve_terms(&"nb:SomeClass".parse().unwrap(), &rows, &context, None);
        assert_eq!(
            response["nb:SomeClass"],
            vec![
                TermEntry {
                    term_url: "cko:trm_123".to_owned(),
                    label: None,
                },
                TermEntry {
                    term_url: "cko:trm_234".to_owned(),
                    label: None,
                },
            ]
        );
    }

    #[test]
    fn no_instances() {
        let response = resolve_terms(
            &"nb:Diagnosis".parse().unwrap(),
            &[],
            &NamespaceContext::default(),
            None,
        );
        assert_eq!(response["nb:Diagnosis"], Vec::new());
    }

    #[test]
    fn attributes_are_compacted() {
        let rows = [
            "http://neurobagel.org/vocab/ControlledTerm1",
            "http://neurobagel.org/vocab/ControlledTerm2",
            "http://example.com/Unknown",
        ]
        .map(|iri| BindingRow::from_pairs([("attribute", iri)]));

        assert_eq!(
            controlled_term_attributes(&rows, &NamespaceContext::default()),
            vec![
                "nb:ControlledTerm1".to_owned(),
                "nb:ControlledTerm2".to_owned(),
                "http://example.com/Unknown".to_owned(),
            ]
        );
    }
}

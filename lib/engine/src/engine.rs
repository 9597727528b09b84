use crate::aggregate::{aggregate_datasets, parse_value};
use crate::client::GraphClient;
use crate::error::EngineError;
use crate::results::{parse_bindings, BindingRow};
use crate::sparql::{self, var};
use crate::terms::{controlled_term_attributes, resolve_terms};
use crate::vocab::VocabularyRegistry;
use cohort_query_model::{
    CohortQuery, ControlledTerm, DatasetMatch, NamespaceContext, TermsResponse,
    VocabularyResponse,
};
use itertools::Itertools;
use oxrdf::NamedNode;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Answers cohort and vocabulary requests by querying the graph.
///
/// Cloning an engine is cheap, as all state is shared.
#[derive(Clone)]
pub struct CohortEngine {
    client: Arc<dyn GraphClient>,
    context: Arc<NamespaceContext>,
    vocabularies: Arc<VocabularyRegistry>,
    return_aggregate: bool,
}

impl CohortEngine {
    pub fn new(
        client: Arc<dyn GraphClient>,
        context: NamespaceContext,
        vocabularies: VocabularyRegistry,
        return_aggregate: bool,
    ) -> Self {
        Self {
            client,
            context: Arc::new(context),
            vocabularies: Arc::new(vocabularies),
            return_aggregate,
        }
    }

    pub fn context(&self) -> &NamespaceContext {
        &self.context
    }

    /// Whether subject-level data is withheld from cohort results.
    pub fn returns_aggregates(&self) -> bool {
        self.return_aggregate
    }

    /// Finds all datasets with subjects that match `query`.
    pub async fn query_cohorts(
        &self,
        query: &CohortQuery,
    ) -> Result<Vec<DatasetMatch>, EngineError> {
        let rows = self
            .select(&sparql::cohort_query(
                query,
                &self.context,
                self.return_aggregate,
            ))
            .await?;

        let dataset_uuids = rows
            .iter()
            .filter_map(|row| row.get(var::DATASET_UUID))
            .unique()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let dataset_sizes = self.dataset_sizes(&dataset_uuids).await?;

        aggregate_datasets(&rows, &dataset_sizes, self.return_aggregate)
    }

    /// Counts the subjects of each dataset in `dataset_uuids`.
    pub async fn dataset_sizes(
        &self,
        dataset_uuids: &[String],
    ) -> Result<BTreeMap<String, u64>, EngineError> {
        if dataset_uuids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let nodes = dataset_uuids
            .iter()
            .map(|uuid| {
                NamedNode::new(uuid).map_err(|_| EngineError::InvalidValue {
                    variable: var::DATASET_UUID,
                    value: uuid.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.select(&sparql::dataset_size_query(&nodes, &self.context))
            .await?
            .iter()
            .map(|row| {
                let uuid = row
                    .get(var::DATASET_UUID)
                    .ok_or(EngineError::MissingVariable(var::DATASET_UUID))?;
                let total = row
                    .get(var::TOTAL_SUBJECTS)
                    .ok_or(EngineError::MissingVariable(var::TOTAL_SUBJECTS))?;
                Ok((uuid.to_owned(), parse_value(var::TOTAL_SUBJECTS, total)?))
            })
            .collect()
    }

    /// Lists all data elements that are controlled terms.
    pub async fn controlled_term_attributes(&self) -> Result<Vec<String>, EngineError> {
        let rows = self
            .select(&sparql::controlled_term_attributes_query(&self.context))
            .await?;
        Ok(controlled_term_attributes(&rows, &self.context))
    }

    /// Lists the instances of `data_element` found in the graph, labelled where possible.
    pub async fn terms(
        &self,
        data_element: &ControlledTerm,
    ) -> Result<TermsResponse, EngineError> {
        let rows = self
            .select(&sparql::term_instances_query(data_element, &self.context))
            .await?;
        Ok(resolve_terms(
            data_element,
            &rows,
            &self.context,
            self.vocabularies.get(data_element.as_str()),
        ))
    }

    /// Describes the vocabulary of `data_element`, if one was loaded.
    pub fn vocabulary(&self, data_element: &ControlledTerm) -> Option<VocabularyResponse> {
        self.vocabularies
            .get(data_element.as_str())
            .map(|vocabulary| vocabulary.to_response(&self.context))
    }

    async fn select(&self, query: &str) -> Result<Vec<BindingRow>, EngineError> {
        debug!("Sending query to the graph:\n{query}");
        let body = self.client.post_query(query).await?;
        Ok(parse_bindings(&body)?)
    }
}

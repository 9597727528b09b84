//! Groups the flat session rows returned by the graph into per-dataset matches.

use crate::error::EngineError;
use crate::results::BindingRow;
use crate::sparql::{var, MODALITY_SEPARATOR};
use cohort_query_model::{DatasetMatch, SessionRecord, SubjectData};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::str::FromStr;

type DatasetKey<'rows> = (&'rows str, &'rows str);
type SessionKey<'rows> = (&'rows str, &'rows str, &'rows str);

/// Aggregates `rows` by dataset.
///
/// Datasets are ordered by uuid and name. Rows without a dataset uuid or name are ignored.
/// `dataset_sizes` must hold the total number of subjects of every dataset in `rows`. If
/// `return_aggregate` is set, no subject-level data is included in the response.
pub fn aggregate_datasets(
    rows: &[BindingRow],
    dataset_sizes: &BTreeMap<String, u64>,
    return_aggregate: bool,
) -> Result<Vec<DatasetMatch>, EngineError> {
    let mut datasets: BTreeMap<DatasetKey<'_>, Vec<&BindingRow>> = BTreeMap::new();
    for row in rows {
        if let (Some(uuid), Some(name)) = (row.get(var::DATASET_UUID), row.get(var::DATASET_NAME))
        {
            datasets.entry((uuid, name)).or_default().push(row);
        }
    }

    datasets
        .into_iter()
        .map(|((uuid, name), group)| {
            let dataset_total_subjects = dataset_sizes
                .get(uuid)
                .copied()
                .ok_or_else(|| EngineError::MissingDatasetSize(uuid.to_owned()))?;
            let subject_data = if return_aggregate {
                SubjectData::Protected
            } else {
                SubjectData::Sessions(session_records(&group)?)
            };

            Ok(DatasetMatch {
                dataset_uuid: uuid.to_owned(),
                dataset_name: name.to_owned(),
                dataset_portal_uri: portal_uri(&group),
                dataset_total_subjects,
                records_protected: return_aggregate,
                num_matching_subjects: group
                    .iter()
                    .filter_map(|row| row.get(var::SUB_ID))
                    .unique()
                    .count(),
                subject_data,
                image_modals: image_modals(&group, return_aggregate),
            })
        })
        .collect()
}

/// The portal link is only reported if all rows agree on having one.
fn portal_uri(group: &[&BindingRow]) -> Option<String> {
    let uris = group
        .iter()
        .map(|row| row.get(var::DATASET_PORTAL_URI))
        .collect::<Option<Vec<_>>>()?;
    uris.first().map(|uri| (*uri).to_owned())
}

fn image_modals(group: &[&BindingRow], return_aggregate: bool) -> Vec<String> {
    group
        .iter()
        .filter_map(|row| row.get(var::IMAGE_MODAL))
        .flat_map(|value| {
            if return_aggregate {
                value.split(MODALITY_SEPARATOR).collect::<Vec<_>>()
            } else {
                vec![value]
            }
        })
        .filter(|modality| !modality.is_empty())
        .unique()
        .map(str::to_owned)
        .collect()
}

fn session_records(group: &[&BindingRow]) -> Result<Vec<SessionRecord>, EngineError> {
    let mut sessions: BTreeMap<SessionKey<'_>, Vec<&BindingRow>> = BTreeMap::new();
    for &row in group {
        if let (Some(sub_id), Some(session_id), Some(session_type)) = (
            row.get(var::SUB_ID),
            row.get(var::SESSION_ID),
            row.get(var::SESSION_TYPE),
        ) {
            sessions
                .entry((sub_id, session_id, session_type))
                .or_default()
                .push(row);
        }
    }

    sessions
        .into_iter()
        .map(|((sub_id, session_id, session_type), rows)| {
            Ok(SessionRecord {
                sub_id: Some(sub_id.to_owned()),
                session_id: Some(session_id.to_owned()),
                session_type: Some(session_type.to_owned()),
                num_matching_phenotypic_sessions: first_parsed(
                    &rows,
                    var::NUM_MATCHING_PHENOTYPIC_SESSIONS,
                )?,
                num_matching_imaging_sessions: first_parsed(
                    &rows,
                    var::NUM_MATCHING_IMAGING_SESSIONS,
                )?,
                age: first_parsed(&rows, var::AGE)?,
                sex: first(&rows, var::SEX),
                diagnosis: distinct(&rows, var::DIAGNOSIS),
                subject_group: first(&rows, var::SUBJECT_GROUP),
                assessment: distinct(&rows, var::ASSESSMENT),
                image_modal: distinct(&rows, var::IMAGE_MODAL),
                session_file_path: first(&rows, var::SESSION_FILE_PATH),
            })
        })
        .collect()
}

/// The first bound value of `variable`.
fn first(rows: &[&BindingRow], variable: &str) -> Option<String> {
    rows.iter()
        .find_map(|row| row.get(variable))
        .map(str::to_owned)
}

fn first_parsed<T: FromStr>(
    rows: &[&BindingRow],
    variable: &'static str,
) -> Result<Option<T>, EngineError> {
    rows.iter()
        .find_map(|row| row.get(variable))
        .map(|value| parse_value(variable, value))
        .transpose()
}

/// All distinct bound values of `variable` in order of appearance.
fn distinct(rows: &[&BindingRow], variable: &str) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(variable))
        .unique()
        .map(str::to_owned)
        .collect()
}

pub(crate) fn parse_value<T: FromStr>(
    variable: &'static str,
    value: &str,
) -> Result<T, EngineError> {
    value.parse().map_err(|_| EngineError::InvalidValue {
        variable,
        value: value.to_owned(),
    })
}

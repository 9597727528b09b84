use cohort_query_engine::CohortEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: CohortEngine,
}

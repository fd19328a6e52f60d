//! Retried tasks must replace their rows, never duplicate them.

use std::sync::Arc;

use temblor_calc::{
    EventBasedCalculator, JobConfig, MemStore, RealizationGroup, SerialExecutor, TaskExecutor,
};
use temblor_core::{GroundShakingModel, GroupOrdinal, StoreError, TaskError};
use temblor_test_utils::{single_realization, single_rupture_source, site_grid, FlatGsim};

fn one_group() -> Vec<RealizationGroup> {
    let gsim: Arc<dyn GroundShakingModel> = Arc::new(FlatGsim::deterministic(0.25, 18.0));
    vec![RealizationGroup {
        ordinal: GroupOrdinal(0),
        sources: vec![Arc::new(single_rupture_source("s1", 0.0, 0.0))],
        realizations: vec![single_realization(0, gsim)],
    }]
}

/// An executor that runs every task twice, simulating a retry after a
/// lost completion acknowledgement.
struct RetryingExecutor;

impl TaskExecutor for RetryingExecutor {
    fn run(
        &self,
        tasks: &[temblor_calc::TaskUnit],
        f: &temblor_calc::executor::TaskFn<'_>,
    ) -> Vec<Result<temblor_calc::TaskOutcome, TaskError>> {
        tasks
            .iter()
            .map(|unit| {
                let _first = f(unit)?;
                f(unit)
            })
            .collect()
    }
}

#[test]
fn double_execution_leaves_rows_identical_to_single() {
    let config = JobConfig {
        ses_per_logic_tree_path: 3,
        ..JobConfig::default()
    };

    let once = MemStore::new();
    let mut calc =
        EventBasedCalculator::new(config.clone(), one_group(), site_grid(2, 0.05), &once).unwrap();
    calc.pre_execute().unwrap();
    calc.execute(&SerialExecutor).unwrap();

    let twice = MemStore::new();
    let mut calc =
        EventBasedCalculator::new(config, one_group(), site_grid(2, 0.05), &twice).unwrap();
    calc.pre_execute().unwrap();
    calc.execute(&RetryingExecutor).unwrap();

    assert_eq!(once.rupture_rows(), twice.rupture_rows());
    assert_eq!(once.all_gmf_rows(), twice.all_gmf_rows());
}

#[test]
fn retry_without_upsert_fails_loudly() {
    let store = MemStore::without_upsert();
    let mut calc = EventBasedCalculator::new(
        JobConfig::default(),
        one_group(),
        site_grid(2, 0.05),
        &store,
    )
    .unwrap();
    calc.pre_execute().unwrap();
    let err = calc.execute(&RetryingExecutor).unwrap_err();
    assert!(matches!(
        err,
        temblor_calc::RunError::Task(TaskError::Store(StoreError::DuplicateRupture(_)))
    ));
}

#[test]
fn single_run_never_trips_the_duplicate_guard() {
    // Correct partitioning writes disjoint keys; with upsert disabled a
    // clean single execution must still succeed.
    let store = MemStore::without_upsert();
    let config = JobConfig {
        ses_per_logic_tree_path: 4,
        block_size: 1,
        ..JobConfig::default()
    };
    let mut calc =
        EventBasedCalculator::new(config, one_group(), site_grid(2, 0.05), &store).unwrap();
    calc.pre_execute().unwrap();
    calc.execute(&SerialExecutor).unwrap();
    assert_eq!(store.rupture_count(), 4);
}

//! The event-based run driver.
//!
//! [`EventBasedCalculator`] walks the run state machine
//! `Initialized → Partitioned → TasksRunning → AllTasksCompleted →
//! Done`. `pre_execute` instantiates and prepares the secondary-peril
//! models, registers the SES containers with the store, and partitions
//! the realization groups into task units; `execute` dispatches the
//! units through a [`TaskExecutor`] and fails the run on the first task
//! failure.
//!
//! [`compute_ses_and_gmfs`] is the task body. Its control flow is the
//! reproducibility contract in code form: per source, one SES seed
//! stream and one salted ground-motion seed stream, both derived from
//! the source's partition seed, consumed in SES-then-occurrence order.
//! Everything a task writes is keyed deterministically, so a retried
//! task re-derives identical rows.

use std::error::Error;
use std::fmt;

use temblor_core::{
    ConfigError, Imt, SesOrdinal, SiteCollection, SiteError, TaskError,
};
use temblor_sep::{instantiate, PerilParams, SecondaryPeril};

use crate::collector::GmfCollector;
use crate::executor::{CancelToken, TaskExecutor, TaskOutcome, TaskStats};
use crate::gmf::{CorrelationModel, GmfParams, MIN_TRUNCATION_LEVEL};
use crate::partition::{partition, RealizationGroup, TaskUnit};
use crate::sampler::RuptureSampler;
use crate::seed::{SeedStream, GMF_STREAM_SALT};
use crate::store::{HazardStore, SesRuptureRow};

/// Stochastic draws per rupture occurrence. One occurrence is one
/// simulated field; resampling the same occurrence is not a thing this
/// engine does.
pub const DEFAULT_GMF_REALIZATIONS: u32 = 1;

// ── Configuration ──────────────────────────────────────────────────

/// Validated run configuration.
///
/// Everything here is read-only during execution and shared by every
/// task. Parsing job files is an upstream concern; this type only
/// checks internal consistency.
#[derive(Clone, Debug)]
pub struct JobConfig {
    /// Master random seed the whole run derives from.
    pub master_seed: u64,
    /// Investigation-time window of one SES, in years.
    pub investigation_time: f64,
    /// Number of stochastic event sets per logic-tree path.
    pub ses_per_logic_tree_path: u32,
    /// Maximum source-to-site distance in km; `None` disables filtering.
    pub max_site_distance_km: Option<f64>,
    /// Sources per task unit.
    pub block_size: usize,
    /// Requested primary intensity measures.
    pub imts: Vec<Imt>,
    /// Ground-motion simulation parameters.
    pub gmf_params: GmfParams,
    /// Whether ground-motion fields are computed at all. When false the
    /// run produces only SES rupture rows.
    pub ground_motion_fields: bool,
    /// Secondary-peril model names to instantiate.
    pub peril_names: Vec<String>,
    /// Named parameters per peril model.
    pub peril_params: PerilParams,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            master_seed: 42,
            investigation_time: 50.0,
            ses_per_logic_tree_path: 1,
            max_site_distance_km: None,
            block_size: 1,
            imts: vec![Imt::Pga],
            gmf_params: GmfParams::default(),
            ground_motion_fields: true,
            peril_names: Vec::new(),
            peril_params: PerilParams::new(),
        }
    }
}

impl JobConfig {
    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// A [`ConfigError`] naming the first offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::BadBlockSize(self.block_size));
        }
        if self.investigation_time <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "investigation_time",
                reason: format!("must be positive, got {}", self.investigation_time),
            });
        }
        if self.ses_per_logic_tree_path == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "ses_per_logic_tree_path",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(d) = self.max_site_distance_km {
            if d <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name: "max_site_distance_km",
                    reason: format!("must be positive, got {d}"),
                });
            }
        }
        if let Some(t) = self.gmf_params.truncation_level {
            if t < MIN_TRUNCATION_LEVEL {
                return Err(ConfigError::InvalidParameter {
                    name: "truncation_level",
                    reason: format!("must be at least {MIN_TRUNCATION_LEVEL}, got {t}"),
                });
            }
        }
        if let CorrelationModel::ExponentialDecay { range_km } = self.gmf_params.correlation {
            if range_km <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name: "correlation_range_km",
                    reason: format!("must be positive, got {range_km}"),
                });
            }
        }
        if self.ground_motion_fields {
            if self.imts.is_empty() {
                return Err(ConfigError::NoImts);
            }
            if let Some(imt) = self.imts.iter().find(|imt| !imt.is_primary()) {
                return Err(ConfigError::NotAPrimaryImt(*imt));
            }
        }
        Ok(())
    }
}

// ── Run state and errors ───────────────────────────────────────────

/// Phase of a calculator run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Built and validated, nothing dispatched.
    Initialized,
    /// SES containers registered, task units derived.
    Partitioned,
    /// Tasks handed to the executor.
    TasksRunning,
    /// Every task reported back successfully.
    AllTasksCompleted,
    /// Run finished.
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initialized => "Initialized",
            Self::Partitioned => "Partitioned",
            Self::TasksRunning => "TasksRunning",
            Self::AllTasksCompleted => "AllTasksCompleted",
            Self::Done => "Done",
        };
        write!(f, "{s}")
    }
}

/// Run-level failure.
#[derive(Clone, Debug, PartialEq)]
pub enum RunError {
    /// Bad configuration detected before or during the run.
    Config(ConfigError),
    /// A peril model failed to prepare the site collection.
    Site(SiteError),
    /// A task unit failed.
    Task(TaskError),
    /// A phase method was called out of state-machine order.
    OutOfOrder {
        /// State the method requires.
        expected: RunState,
        /// State the run is actually in.
        actual: RunState,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::Site(e) => write!(f, "site preparation failed: {e}"),
            Self::Task(e) => write!(f, "task failed: {e}"),
            Self::OutOfOrder { expected, actual } => {
                write!(f, "run is in state {actual}, expected {expected}")
            }
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Site(e) => Some(e),
            Self::Task(e) => Some(e),
            Self::OutOfOrder { .. } => None,
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<SiteError> for RunError {
    fn from(e: SiteError) -> Self {
        Self::Site(e)
    }
}

impl From<TaskError> for RunError {
    fn from(e: TaskError) -> Self {
        Self::Task(e)
    }
}

// ── Calculator ─────────────────────────────────────────────────────

/// Run-level driver for event-based hazard simulation.
pub struct EventBasedCalculator<'a> {
    config: JobConfig,
    groups: Vec<RealizationGroup>,
    sites: SiteCollection,
    store: &'a dyn HazardStore,
    perils: Vec<Box<dyn SecondaryPeril>>,
    tasks: Vec<TaskUnit>,
    state: RunState,
    cancel: CancelToken,
}

impl<'a> EventBasedCalculator<'a> {
    /// Build a calculator over validated inputs.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when the configuration is inconsistent or any
    /// group has no realizations.
    pub fn new(
        config: JobConfig,
        groups: Vec<RealizationGroup>,
        sites: SiteCollection,
        store: &'a dyn HazardStore,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if groups.iter().all(|g| g.realizations.is_empty()) {
            return Err(ConfigError::NoRealizations);
        }
        Ok(Self {
            config,
            groups,
            sites,
            store,
            perils: Vec::new(),
            tasks: Vec::new(),
            state: RunState::Initialized,
            cancel: CancelToken::new(),
        })
    }

    /// Current phase of the run.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Token for cooperative cancellation of in-flight tasks.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Task units derived by [`EventBasedCalculator::pre_execute`].
    pub fn tasks(&self) -> &[TaskUnit] {
        &self.tasks
    }

    fn require(&self, expected: RunState) -> Result<(), RunError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RunError::OutOfOrder {
                expected,
                actual: self.state,
            })
        }
    }

    /// Instantiate peril models, register SES containers, partition.
    ///
    /// Fails fast on unknown peril names or parameters so a
    /// misconfigured run never dispatches a single task.
    ///
    /// # Errors
    ///
    /// Configuration or site-preparation failures, or calling out of
    /// state order.
    pub fn pre_execute(&mut self) -> Result<(), RunError> {
        self.require(RunState::Initialized)?;
        self.perils = instantiate(&self.config.peril_names, &self.config.peril_params)?;
        for model in &self.perils {
            model.prepare(&mut self.sites)?;
        }
        for group in &self.groups {
            for ses in 1..=self.config.ses_per_logic_tree_path {
                self.store
                    .put_ses(group.ordinal, SesOrdinal(ses), self.config.investigation_time)
                    .map_err(TaskError::Store)?;
            }
        }
        self.tasks = partition(&self.groups, self.config.block_size, self.config.master_seed);
        self.state = RunState::Partitioned;
        Ok(())
    }

    /// Dispatch every task unit and collect the outcomes.
    ///
    /// The run aborts on the first failed task; outcomes of tasks that
    /// completed before the failure are discarded with it.
    ///
    /// # Errors
    ///
    /// The first task failure, or calling out of state order.
    pub fn execute(&mut self, executor: &dyn TaskExecutor) -> Result<Vec<TaskOutcome>, RunError> {
        self.require(RunState::Partitioned)?;
        self.state = RunState::TasksRunning;
        let ctx = TaskContext {
            config: &self.config,
            sites: &self.sites,
            perils: &self.perils,
            store: self.store,
            cancel: &self.cancel,
        };
        let results = executor.run(&self.tasks, &|unit| compute_ses_and_gmfs(unit, &ctx));
        let mut outcomes = Vec::with_capacity(results.len());
        for result in results {
            outcomes.push(result.map_err(RunError::Task)?);
        }
        self.state = RunState::AllTasksCompleted;
        // Hazard-curve post-processing happens downstream of the store.
        self.state = RunState::Done;
        Ok(outcomes)
    }
}

/// Read-only context shared by every task of a run.
struct TaskContext<'a> {
    config: &'a JobConfig,
    sites: &'a SiteCollection,
    perils: &'a [Box<dyn SecondaryPeril>],
    store: &'a dyn HazardStore,
    cancel: &'a CancelToken,
}

/// Task body: sample SES occurrences for each of the unit's sources,
/// simulate their ground-motion fields, and flush the accumulation.
///
/// Per source: the two seed streams are derived from the source's
/// partition seed, the SES stream feeding one occurrence-RNG seed per
/// event set and the salted stream one ground-motion seed per emitted
/// occurrence. Draw order is sources, then event sets, then survivors,
/// and is the same no matter how sources were batched into units.
///
/// Cancellation is observed between occurrences; a cancelled task
/// discards its collector and flushes nothing.
fn compute_ses_and_gmfs(unit: &TaskUnit, ctx: &TaskContext<'_>) -> Result<TaskOutcome, TaskError> {
    let mut collector = GmfCollector::new();
    let mut stats = TaskStats::default();

    for (source, src_seed) in &unit.src_seeds {
        let Some(sampler) =
            RuptureSampler::prepare(source, ctx.sites, ctx.config.max_site_distance_km)
        else {
            stats.sources_skipped += 1;
            continue;
        };
        let mut ses_seeds = SeedStream::new(*src_seed);
        let mut gmf_seeds = SeedStream::salted(*src_seed, GMF_STREAM_SALT);

        for ses in 1..=ctx.config.ses_per_logic_tree_path {
            let ses_seed = ses_seeds.next_seed();
            let occurrences = sampler.sample_ses(
                unit.group,
                SesOrdinal(ses),
                ses_seed,
                &mut gmf_seeds,
                ctx.config.investigation_time,
            );
            for occ in occurrences {
                if ctx.cancel.is_cancelled() {
                    collector.discard();
                    return Err(TaskError::Cancelled);
                }
                let (rupture, subset) = sampler.survivor(occ.survivor);
                let seq = ctx.store.put_rupture(SesRuptureRow {
                    tag: occ.tag,
                    magnitude: rupture.magnitude,
                    hypocenter: (
                        rupture.hypocenter.lon,
                        rupture.hypocenter.lat,
                        rupture.hypocenter.depth,
                    ),
                })?;
                stats.ruptures += 1;
                if ctx.config.ground_motion_fields {
                    collector.calc_gmf(
                        rupture,
                        seq,
                        ctx.sites,
                        subset,
                        &unit.realizations,
                        &ctx.config.imts,
                        occ.gmf_seed,
                        &ctx.config.gmf_params,
                        ctx.perils,
                    )?;
                }
            }
        }
    }

    let flushed = collector.flush(ctx.store, unit.task_no)?;
    stats.gmf_rows = flushed as u32;
    Ok(TaskOutcome {
        task_no: unit.task_no,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use temblor_core::{GroupOrdinal, RealizationId};
    use temblor_test_utils::{
        peril_site_collection, single_realization, single_rupture_source, FlatGsim,
    };

    use crate::executor::SerialExecutor;
    use crate::store::MemStore;

    fn one_group() -> Vec<RealizationGroup> {
        let gsim: Arc<dyn temblor_core::GroundShakingModel> =
            Arc::new(FlatGsim::deterministic(0.25, 18.0));
        vec![RealizationGroup {
            ordinal: GroupOrdinal(0),
            sources: vec![Arc::new(single_rupture_source("s1", 0.0, 0.0))],
            realizations: vec![single_realization(0, gsim)],
        }]
    }

    // ---- validation ----

    #[test]
    fn zero_block_size_is_rejected() {
        let config = JobConfig {
            block_size: 0,
            ..JobConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadBlockSize(0))
        ));
    }

    #[test]
    fn gmfs_without_imts_are_rejected() {
        let config = JobConfig {
            imts: Vec::new(),
            ..JobConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoImts)));
    }

    #[test]
    fn derived_imts_cannot_be_requested() {
        let config = JobConfig {
            imts: vec![Imt::Pga, Imt::LiqProb],
            ..JobConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotAPrimaryImt(Imt::LiqProb))
        ));
    }

    #[test]
    fn tiny_truncation_level_is_rejected() {
        let config = JobConfig {
            gmf_params: GmfParams {
                truncation_level: Some(0.1),
                correlation: CorrelationModel::None,
            },
            ..JobConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "truncation_level",
                ..
            })
        ));
    }

    #[test]
    fn non_positive_correlation_range_is_rejected() {
        let config = JobConfig {
            gmf_params: GmfParams {
                truncation_level: Some(3.0),
                correlation: CorrelationModel::ExponentialDecay { range_km: 0.0 },
            },
            ..JobConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "correlation_range_km",
                ..
            })
        ));
    }

    #[test]
    fn no_realizations_is_rejected_at_construction() {
        let store = MemStore::new();
        let mut groups = one_group();
        groups[0].realizations.clear();
        assert!(matches!(
            EventBasedCalculator::new(
                JobConfig::default(),
                groups,
                peril_site_collection(),
                &store
            ),
            Err(ConfigError::NoRealizations)
        ));
    }

    // ---- state machine ----

    #[test]
    fn execute_before_pre_execute_is_out_of_order() {
        let store = MemStore::new();
        let mut calc = EventBasedCalculator::new(
            JobConfig::default(),
            one_group(),
            peril_site_collection(),
            &store,
        )
        .unwrap();
        assert_eq!(calc.state(), RunState::Initialized);
        assert!(matches!(
            calc.execute(&SerialExecutor),
            Err(RunError::OutOfOrder {
                expected: RunState::Partitioned,
                actual: RunState::Initialized,
            })
        ));
    }

    #[test]
    fn run_walks_the_state_machine() {
        let store = MemStore::new();
        let mut calc = EventBasedCalculator::new(
            JobConfig::default(),
            one_group(),
            peril_site_collection(),
            &store,
        )
        .unwrap();
        calc.pre_execute().unwrap();
        assert_eq!(calc.state(), RunState::Partitioned);
        assert_eq!(calc.tasks().len(), 1);
        let outcomes = calc.execute(&SerialExecutor).unwrap();
        assert_eq!(calc.state(), RunState::Done);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].stats.ruptures, 1);
    }

    #[test]
    fn pre_execute_registers_ses_containers() {
        let store = MemStore::new();
        let config = JobConfig {
            ses_per_logic_tree_path: 3,
            ..JobConfig::default()
        };
        let mut calc =
            EventBasedCalculator::new(config, one_group(), peril_site_collection(), &store)
                .unwrap();
        calc.pre_execute().unwrap();
        // 3 SES containers for the single group; execute produces one
        // rupture per SES (degenerate occurrence).
        let outcomes = calc.execute(&SerialExecutor).unwrap();
        assert_eq!(outcomes[0].stats.ruptures, 3);
        assert_eq!(store.rupture_count(), 3);
    }

    #[test]
    fn unknown_peril_fails_before_any_task() {
        let store = MemStore::new();
        let config = JobConfig {
            peril_names: vec!["NotAModel".to_string()],
            ..JobConfig::default()
        };
        let mut calc =
            EventBasedCalculator::new(config, one_group(), peril_site_collection(), &store)
                .unwrap();
        assert!(matches!(
            calc.pre_execute(),
            Err(RunError::Config(ConfigError::UnknownPeril(_)))
        ));
        assert_eq!(store.rupture_count(), 0);
    }

    // ---- cancellation ----

    #[test]
    fn cancelled_run_flushes_nothing() {
        let store = MemStore::new();
        let mut calc = EventBasedCalculator::new(
            JobConfig::default(),
            one_group(),
            peril_site_collection(),
            &store,
        )
        .unwrap();
        calc.pre_execute().unwrap();
        calc.cancel_token().cancel();
        assert!(matches!(
            calc.execute(&SerialExecutor),
            Err(RunError::Task(TaskError::Cancelled))
        ));
        assert_eq!(store.gmf_row_count(), 0);
    }

    // ---- gmf flag ----

    #[test]
    fn disabled_gmfs_still_record_ruptures() {
        let store = MemStore::new();
        let config = JobConfig {
            ground_motion_fields: false,
            imts: Vec::new(),
            ..JobConfig::default()
        };
        let mut calc =
            EventBasedCalculator::new(config, one_group(), peril_site_collection(), &store)
                .unwrap();
        calc.pre_execute().unwrap();
        let outcomes = calc.execute(&SerialExecutor).unwrap();
        assert_eq!(outcomes[0].stats.ruptures, 1);
        assert_eq!(outcomes[0].stats.gmf_rows, 0);
        assert_eq!(store.gmf_row_count(), 0);
        assert_eq!(store.rupture_count(), 1);
    }

    #[test]
    fn peril_run_produces_derived_rows() {
        let store = MemStore::new();
        let config = JobConfig {
            peril_names: vec!["HazusLiquefaction".to_string()],
            ..JobConfig::default()
        };
        let mut calc =
            EventBasedCalculator::new(config, one_group(), peril_site_collection(), &store)
                .unwrap();
        calc.pre_execute().unwrap();
        calc.execute(&SerialExecutor).unwrap();
        let rows = store.gmf_rows_for(RealizationId(0));
        assert!(rows.iter().any(|r| r.imt == Imt::LiqProb));
        assert!(rows.iter().any(|r| r.imt == Imt::Pga));
    }
}

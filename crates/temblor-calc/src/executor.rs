//! The task-execution boundary.
//!
//! The engine defines what a task IS (a pure function of a
//! [`TaskUnit`]) and leaves scheduling to a [`TaskExecutor`]. Tasks are
//! embarrassingly parallel: they write disjoint key sets to the store
//! and never read each other's output, so an executor only needs
//! "run these, tell me how each one ended". Two implementations ship:
//! [`SerialExecutor`] for tests and small runs, and
//! [`ThreadPoolExecutor`], a fixed pool of scoped worker threads fed
//! from a crossbeam channel.
//!
//! Cancellation is cooperative. The shared [`CancelToken`] is checked
//! by the task body between ruptures; a cancelled task discards its
//! accumulation and reports [`TaskError::Cancelled`] without flushing,
//! so a partial task never becomes visible in the store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use temblor_core::{TaskError, TaskNo};

use crate::partition::TaskUnit;

/// Counters reported by a completed task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskStats {
    /// Rupture occurrences persisted.
    pub ruptures: u32,
    /// GMF rows flushed.
    pub gmf_rows: u32,
    /// Sources skipped by the distance filters.
    pub sources_skipped: u32,
}

/// Completion record of one task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Which task completed.
    pub task_no: TaskNo,
    /// What it produced.
    pub stats: TaskStats,
}

/// Shared cooperative cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every task holding this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True once [`CancelToken::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// The task body signature executors dispatch.
pub type TaskFn<'a> = dyn Fn(&TaskUnit) -> Result<TaskOutcome, TaskError> + Sync + 'a;

/// Scheduling boundary: run every task, report per-task results in
/// task order.
pub trait TaskExecutor {
    /// Run `f` over every unit. The returned vector is parallel to
    /// `tasks` regardless of completion order.
    fn run(&self, tasks: &[TaskUnit], f: &TaskFn<'_>) -> Vec<Result<TaskOutcome, TaskError>>;
}

/// Runs tasks one after another on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialExecutor;

impl TaskExecutor for SerialExecutor {
    fn run(&self, tasks: &[TaskUnit], f: &TaskFn<'_>) -> Vec<Result<TaskOutcome, TaskError>> {
        tasks.iter().map(f).collect()
    }
}

/// Fixed-size scoped thread pool fed from a bounded channel.
#[derive(Clone, Copy, Debug)]
pub struct ThreadPoolExecutor {
    workers: usize,
}

impl ThreadPoolExecutor {
    /// Pool with `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }
}

impl TaskExecutor for ThreadPoolExecutor {
    fn run(&self, tasks: &[TaskUnit], f: &TaskFn<'_>) -> Vec<Result<TaskOutcome, TaskError>> {
        if tasks.is_empty() {
            return Vec::new();
        }
        let (task_tx, task_rx) = crossbeam_channel::bounded::<(usize, &TaskUnit)>(tasks.len());
        let (result_tx, result_rx) = crossbeam_channel::bounded(tasks.len());
        // Queue everything up front; the channel is sized to hold it.
        for item in tasks.iter().enumerate() {
            task_tx
                .send(item)
                .unwrap_or_else(|_| unreachable!("bounded to task count"));
        }
        drop(task_tx);

        let mut results: Vec<Option<Result<TaskOutcome, TaskError>>> =
            tasks.iter().map(|_| None).collect();
        std::thread::scope(|s| {
            for _ in 0..self.workers.min(tasks.len()) {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                s.spawn(move || {
                    // Runs until the queue drains (sender dropped above).
                    while let Ok((idx, unit)) = task_rx.recv() {
                        if result_tx.send((idx, f(unit))).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);
            while let Ok((idx, result)) = result_rx.recv() {
                results[idx] = Some(result);
            }
        });
        results
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| unreachable!("worker replied for every task")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::{partition, RealizationGroup};
    use indexmap::IndexMap;
    use std::sync::atomic::AtomicU32;
    use temblor_core::{GroupOrdinal, Realization, RealizationId};
    use temblor_test_utils::single_rupture_source;

    fn some_tasks(n: usize) -> Vec<TaskUnit> {
        let group = RealizationGroup {
            ordinal: GroupOrdinal(0),
            sources: (0..n)
                .map(|i| Arc::new(single_rupture_source(&format!("s{i}"), 0.0, 0.0)))
                .collect(),
            realizations: vec![Realization {
                id: RealizationId(0),
                weight: 1.0,
                gsims: IndexMap::new(),
            }],
        };
        partition(&[group], 1, 42)
    }

    fn ok_body(unit: &TaskUnit) -> Result<TaskOutcome, TaskError> {
        Ok(TaskOutcome {
            task_no: unit.task_no,
            stats: TaskStats::default(),
        })
    }

    #[test]
    fn serial_preserves_task_order() {
        let tasks = some_tasks(4);
        let results = SerialExecutor.run(&tasks, &ok_body);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.as_ref().unwrap().task_no, TaskNo(i as u32));
        }
    }

    #[test]
    fn pool_runs_every_task_and_preserves_order() {
        let tasks = some_tasks(9);
        let ran = AtomicU32::new(0);
        let results = ThreadPoolExecutor::new(3).run(&tasks, &|unit| {
            ran.fetch_add(1, Ordering::Relaxed);
            ok_body(unit)
        });
        assert_eq!(ran.load(Ordering::Relaxed), 9);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.as_ref().unwrap().task_no, TaskNo(i as u32));
        }
    }

    #[test]
    fn pool_reports_per_task_failures() {
        let tasks = some_tasks(3);
        let results = ThreadPoolExecutor::new(2).run(&tasks, &|unit| {
            if unit.task_no == TaskNo(1) {
                Err(TaskError::Cancelled)
            } else {
                ok_body(unit)
            }
        });
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(TaskError::Cancelled)));
        assert!(results[2].is_ok());
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn empty_task_list_is_a_no_op() {
        assert!(ThreadPoolExecutor::new(4).run(&[], &ok_body).is_empty());
    }
}

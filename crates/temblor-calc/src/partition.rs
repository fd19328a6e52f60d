//! Splitting a run into independent task units.
//!
//! Each realization group carries an ordered source list. The
//! partitioner walks that list once, drawing one derived seed per
//! source from a per-group [`SeedStream`] seeded off the master seed,
//! then chops the seeded list into blocks. Seeds are assigned before
//! blocking, so the (source, seed) pairing depends only on the master
//! seed and the source order: re-batching with a different block size
//! moves work between tasks but never changes what any source
//! simulates. Permuting the source list DOES change the assignment,
//! which is why source order is run metadata.

use std::sync::Arc;

use temblor_core::{GroupOrdinal, Realization, SeismicSource, TaskNo};

use crate::seed::SeedStream;

/// One logic-tree realization group: an ordered source list plus the
/// realizations that sample it.
#[derive(Clone, Debug)]
pub struct RealizationGroup {
    /// Group ordinal, part of every rupture tag this group produces.
    pub ordinal: GroupOrdinal,
    /// Sources in stable, documented order.
    pub sources: Vec<Arc<SeismicSource>>,
    /// Realizations applied to every source of the group.
    pub realizations: Vec<Realization>,
}

/// Immutable unit of parallel dispatch.
#[derive(Clone, Debug)]
pub struct TaskUnit {
    /// Task ordinal, unique within the run.
    pub task_no: TaskNo,
    /// Realization group the task's sources belong to.
    pub group: GroupOrdinal,
    /// The task's sources, each with its derived seed.
    pub src_seeds: Vec<(Arc<SeismicSource>, u64)>,
    /// Realizations of the owning group (shared read-only).
    pub realizations: Vec<Realization>,
}

/// Derive per-source seeds and split every group into task units of at
/// most `block_size` sources.
///
/// Task ordinals are assigned in emission order across groups. The
/// caller validates `block_size >= 1` up front; a zero reaching here is
/// clamped to 1 rather than looping forever.
pub fn partition(groups: &[RealizationGroup], block_size: usize, master_seed: u64) -> Vec<TaskUnit> {
    let block_size = block_size.max(1);
    let mut tasks = Vec::new();
    let mut task_no = 0u32;
    for group in groups {
        let mut seeds = SeedStream::salted(master_seed, u64::from(group.ordinal.0));
        let seeded: Vec<(Arc<SeismicSource>, u64)> = group
            .sources
            .iter()
            .map(|src| (Arc::clone(src), seeds.next_seed()))
            .collect();
        for block in seeded.chunks(block_size) {
            tasks.push(TaskUnit {
                task_no: TaskNo(task_no),
                group: group.ordinal,
                src_seeds: block.to_vec(),
                realizations: group.realizations.clone(),
            });
            task_no += 1;
        }
    }
    tasks
}

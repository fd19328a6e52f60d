//! The persistence collaborator contract and an in-memory store.
//!
//! The engine never talks to a database directly; it hands batches of
//! SES-rupture rows and GMF rows to a [`HazardStore`]. The contract is
//! keyed, idempotent upsert: a retried task re-derives the same keys and
//! replaces its own rows instead of appending duplicates. A store that
//! cannot replace by key must reject the duplicate loudly — silent
//! duplication is the one failure mode the design forbids.
//!
//! [`MemStore`] is the reference implementation used by tests and small
//! in-process runs. Cross-task totals are a downstream concern: readers
//! aggregate persisted rows by realization, the engine never does.

use std::sync::Mutex;

use indexmap::IndexMap;

use temblor_core::{
    GroupOrdinal, Imt, RealizationId, RuptureSeq, RuptureTag, SesOrdinal, SiteId, StoreError,
    TaskNo,
};

/// One persisted rupture occurrence.
#[derive(Clone, Debug, PartialEq)]
pub struct SesRuptureRow {
    /// Deterministic occurrence tag (the upsert key).
    pub tag: RuptureTag,
    /// Moment magnitude.
    pub magnitude: f64,
    /// Hypocenter (lon, lat, depth).
    pub hypocenter: (f64, f64, f64),
}

/// Key of one aggregated GMF row.
pub type GmfKey = (RealizationId, Imt, SiteId);

/// One aggregated ground-motion row: every nonzero value recorded at
/// one (realization, IMT, site) by one task, with the parallel list of
/// contributing rupture sequence numbers.
#[derive(Clone, Debug, PartialEq)]
pub struct GmfRow {
    /// Task that produced the row (part of the upsert key).
    pub task_no: TaskNo,
    /// Realization the values belong to.
    pub rlz: RealizationId,
    /// Intensity measure of the values.
    pub imt: Imt,
    /// Site the values were simulated at.
    pub site: SiteId,
    /// Nonzero ground-motion values in arrival order.
    pub gmvs: Vec<f64>,
    /// Contributing rupture per value, parallel to `gmvs`.
    pub rupture_seqs: Vec<RuptureSeq>,
}

/// The persistence collaborator.
///
/// # Contract
///
/// - Writes are keyed; with upsert support, rewriting a key replaces the
///   row (idempotent retry). Without it, a duplicate key MUST surface as
///   a [`StoreError`] rather than silently appending.
/// - Implementations accept concurrent bulk writes from many tasks
///   (`Send + Sync`); tasks write disjoint key sets under correct
///   partitioning.
pub trait HazardStore: Send + Sync {
    /// Register one stochastic event set container before execution.
    fn put_ses(
        &self,
        group: GroupOrdinal,
        ses: SesOrdinal,
        investigation_time: f64,
    ) -> Result<(), StoreError>;

    /// Persist one rupture occurrence, returning its sequence number.
    ///
    /// The sequence number is stable under retry: re-inserting the same
    /// tag returns the number allocated the first time.
    fn put_rupture(&self, row: SesRuptureRow) -> Result<RuptureSeq, StoreError>;

    /// Persist one task's aggregated GMF rows as a batch.
    fn put_gmf_rows(&self, rows: Vec<GmfRow>) -> Result<(), StoreError>;

    /// All GMF rows recorded for one realization, for downstream
    /// aggregation.
    fn gmf_rows_for(&self, rlz: RealizationId) -> Vec<GmfRow>;
}

// ── MemStore ───────────────────────────────────────────────────────

#[derive(Default)]
struct MemStoreInner {
    ses: IndexMap<(GroupOrdinal, SesOrdinal), f64>,
    ruptures: IndexMap<RuptureTag, (RuptureSeq, SesRuptureRow)>,
    gmf: IndexMap<(TaskNo, GmfKey), GmfRow>,
    next_seq: u64,
}

/// In-memory reference store.
///
/// Construct with [`MemStore::new`] for the normal idempotent-upsert
/// behavior, or [`MemStore::without_upsert`] to model a collaborator
/// that cannot replace by key (every duplicate write then fails, which
/// is how a retry against such a store must behave).
pub struct MemStore {
    inner: Mutex<MemStoreInner>,
    upsert: bool,
}

impl MemStore {
    /// Store with idempotent replace-by-key.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemStoreInner::default()),
            upsert: true,
        }
    }

    /// Store that rejects duplicate keys instead of replacing.
    pub fn without_upsert() -> Self {
        Self {
            inner: Mutex::new(MemStoreInner::default()),
            upsert: false,
        }
    }

    /// Number of stored rupture rows.
    pub fn rupture_count(&self) -> usize {
        self.inner.lock().unwrap().ruptures.len()
    }

    /// Number of stored GMF rows.
    pub fn gmf_row_count(&self) -> usize {
        self.inner.lock().unwrap().gmf.len()
    }

    /// All rupture rows in insertion order.
    pub fn rupture_rows(&self) -> Vec<SesRuptureRow> {
        self.inner
            .lock()
            .unwrap()
            .ruptures
            .values()
            .map(|(_, row)| row.clone())
            .collect()
    }

    /// All GMF rows in insertion order.
    pub fn all_gmf_rows(&self) -> Vec<GmfRow> {
        self.inner
            .lock()
            .unwrap()
            .gmf
            .values()
            .cloned()
            .collect()
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HazardStore for MemStore {
    fn put_ses(
        &self,
        group: GroupOrdinal,
        ses: SesOrdinal,
        investigation_time: f64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.ses.insert((group, ses), investigation_time);
        Ok(())
    }

    fn put_rupture(&self, row: SesRuptureRow) -> Result<RuptureSeq, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some((seq, existing)) = inner.ruptures.get_mut(&row.tag) {
            if !self.upsert {
                return Err(StoreError::DuplicateRupture(row.tag));
            }
            let seq = *seq;
            *existing = row;
            return Ok(seq);
        }
        inner.next_seq += 1;
        let seq = RuptureSeq(inner.next_seq);
        inner.ruptures.insert(row.tag.clone(), (seq, row));
        Ok(seq)
    }

    fn put_gmf_rows(&self, rows: Vec<GmfRow>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        for row in rows {
            let key = (row.task_no, (row.rlz, row.imt, row.site));
            if inner.gmf.contains_key(&key) && !self.upsert {
                return Err(StoreError::DuplicateGmfRow {
                    task_no: row.task_no,
                    key: format!("(rlz={}, imt={}, site={})", row.rlz, row.imt, row.site),
                });
            }
            inner.gmf.insert(key, row);
        }
        Ok(())
    }

    fn gmf_rows_for(&self, rlz: RealizationId) -> Vec<GmfRow> {
        self.inner
            .lock()
            .unwrap()
            .gmf
            .values()
            .filter(|row| row.rlz == rlz)
            .cloned()
            .collect()
    }
}

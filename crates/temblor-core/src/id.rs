//! Strongly-typed identifiers and the deterministic rupture tag.

use std::fmt;

/// Identifies a site within a [`SiteCollection`](crate::site::SiteCollection).
///
/// Sites are loaded once per job and assigned sequential IDs; `SiteId(n)`
/// corresponds to the n-th site in load order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(pub u32);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SiteId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies one logic-tree realization (a full combination of branch
/// choices, associating one ground-shaking model per tectonic region).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RealizationId(pub u32);

impl fmt::Display for RealizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RealizationId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Ordinal of a realization group (one source-model logic-tree path).
///
/// All realizations sharing a source-model path form one group; the group
/// owns the stochastic event sets its tasks append to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupOrdinal(pub u32);

impl fmt::Display for GroupOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for GroupOrdinal {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Ordinal of one stochastic event set within a realization group.
///
/// SES ordinals are 1-based, matching the persisted row convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SesOrdinal(pub u32);

impl fmt::Display for SesOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SesOrdinal {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Ordinal of a task unit within a run, assigned at partition time.
///
/// Used to key persisted GMF rows so a retried task replaces its own rows
/// rather than appending duplicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskNo(pub u32);

impl fmt::Display for TaskNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TaskNo {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Persisted-rupture sequence number allocated by the hazard store.
///
/// Stable across idempotent retries: re-inserting a rupture row with the
/// same [`RuptureTag`] yields the same sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuptureSeq(pub u64);

impl fmt::Display for RuptureSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RuptureSeq {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

// ── RuptureTag ─────────────────────────────────────────────────────

/// Deterministic, collision-free label for one rupture occurrence.
///
/// Encodes the realization-group ordinal, SES ordinal, source identifier,
/// rupture enumeration index within the source, and occurrence index.
/// Rendered as `smlt=GG|ses=SSSS|src=ID|i=IIII-JJ`, which matches the
/// persisted tag convention and is unique across a whole run: a rupture
/// occurrence belongs to exactly one (source, SES) pair and the two inner
/// indices are enumeration positions within it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuptureTag {
    /// Realization-group (source-model path) ordinal.
    pub group: GroupOrdinal,
    /// Stochastic event set ordinal (1-based).
    pub ses: SesOrdinal,
    /// Identifier of the source that produced the rupture.
    pub source_id: String,
    /// Enumeration index of the rupture within its source.
    pub rupture_index: u32,
    /// Occurrence index within the sampled occurrence count.
    pub occurrence_index: u32,
}

impl RuptureTag {
    /// Build a tag from its parts.
    pub fn new(
        group: GroupOrdinal,
        ses: SesOrdinal,
        source_id: impl Into<String>,
        rupture_index: u32,
        occurrence_index: u32,
    ) -> Self {
        Self {
            group,
            ses,
            source_id: source_id.into(),
            rupture_index,
            occurrence_index,
        }
    }
}

impl fmt::Display for RuptureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "smlt={:02}|ses={:04}|src={}|i={:04}-{:02}",
            self.group.0, self.ses.0, self.source_id, self.rupture_index, self.occurrence_index
        )
    }
}

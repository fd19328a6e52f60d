//! Rupture occurrence sampling for one source.
//!
//! A [`RuptureSampler`] is built once per source inside a task. Building
//! it runs the two distance filters up front: the cheap source-level
//! filter against the whole site collection, then a per-rupture
//! refinement of the surviving subset. A source whose filters leave
//! nothing is a normal silent skip ([`RuptureSampler::prepare`] returns
//! `None`), never an error.
//!
//! Sampling one SES consumes the occurrence RNG in a fixed order, one
//! draw sequence per surviving rupture in enumeration order. That order
//! is the reproducibility contract: the emitted tags and the ground-
//! motion seeds attached to them depend only on the source's derived
//! seed and the run configuration, never on which task the source
//! landed in.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use smallvec::SmallVec;

use temblor_core::{
    FilteredSites, GroupOrdinal, Rupture, RuptureTag, SeismicSource, SesOrdinal, SiteCollection,
};

use crate::seed::SeedStream;

/// One sampled rupture occurrence, ready for ground-motion simulation.
#[derive(Clone, Debug)]
pub struct SampledOccurrence {
    /// Index into the sampler's surviving ruptures.
    pub survivor: usize,
    /// Deterministic occurrence tag (the persistence key).
    pub tag: RuptureTag,
    /// Seed for this occurrence's ground-motion field.
    pub gmf_seed: u64,
}

struct Survivor {
    /// Index of the rupture in the source's enumeration order.
    rupture_index: u32,
    subset: FilteredSites,
}

/// Per-source occurrence sampler with its distance filters resolved.
pub struct RuptureSampler<'a> {
    source: &'a SeismicSource,
    survivors: Vec<Survivor>,
}

impl<'a> RuptureSampler<'a> {
    /// Run both distance filters for `source`.
    ///
    /// Returns `None` when no site is within range of the source, or
    /// when every candidate rupture loses all its sites to the
    /// per-rupture refinement. Either way the source contributes
    /// nothing to the run.
    pub fn prepare(
        source: &'a SeismicSource,
        sites: &SiteCollection,
        max_km: Option<f64>,
    ) -> Option<Self> {
        let source_subset = source.filter_sites_by_distance(sites, max_km)?;
        let survivors: Vec<Survivor> = source
            .iter_ruptures()
            .enumerate()
            .filter_map(|(i, rupture)| {
                rupture
                    .filter_sites_by_distance(sites, &source_subset, max_km)
                    .map(|subset| Survivor {
                        rupture_index: i as u32,
                        subset,
                    })
            })
            .collect();
        if survivors.is_empty() {
            return None;
        }
        Some(Self { source, survivors })
    }

    /// The source this sampler was prepared for.
    pub fn source(&self) -> &SeismicSource {
        self.source
    }

    /// Number of ruptures that survived both filters.
    pub fn survivor_count(&self) -> usize {
        self.survivors.len()
    }

    /// The rupture and filtered site subset behind a survivor index.
    pub fn survivor(&self, idx: usize) -> (&Rupture, &FilteredSites) {
        let s = &self.survivors[idx];
        let rupture = self
            .source
            .iter_ruptures()
            .nth(s.rupture_index as usize)
            .unwrap_or_else(|| unreachable!("survivor index out of enumeration range"));
        (rupture, &s.subset)
    }

    /// Sample one stochastic event set.
    ///
    /// `ses_seed` seeds the occurrence RNG for this SES; `gmf_seeds` is
    /// the source's salted ground-motion seed stream, advanced once per
    /// emitted occurrence. Both consume in survivor enumeration order.
    /// Zero occurrences for a rupture is a normal outcome and emits
    /// nothing.
    pub fn sample_ses(
        &self,
        group: GroupOrdinal,
        ses: SesOrdinal,
        ses_seed: u64,
        gmf_seeds: &mut SeedStream,
        investigation_time: f64,
    ) -> SmallVec<[SampledOccurrence; 4]> {
        let mut rng = ChaCha8Rng::seed_from_u64(ses_seed);
        let mut out = SmallVec::new();
        for (idx, survivor) in self.survivors.iter().enumerate() {
            let (rupture, _) = self.survivor(idx);
            let n_occ = rupture.sample_number_of_occurrences(investigation_time, &mut rng);
            for occ in 0..n_occ {
                out.push(SampledOccurrence {
                    survivor: idx,
                    tag: RuptureTag::new(group, ses, &self.source.id, survivor.rupture_index, occ),
                    gmf_seed: gmf_seeds.next_seed(),
                });
            }
        }
        out
    }
}

//! Per-task accumulation of ground-motion values.
//!
//! A [`GmfCollector`] lives for the duration of one task. Every rupture
//! occurrence the task processes contributes one simulated field per
//! realization; the collector folds these into rows keyed by
//! `(realization, IMT, site)`, dropping exact zeros so that sites a
//! silent model left untouched never reach the store. At the end of the
//! task [`GmfCollector::flush`] hands the rows to the store in one
//! batch; a cancelled task calls [`GmfCollector::discard`] instead and
//! nothing it accumulated becomes visible.

use indexmap::IndexMap;

use temblor_core::{
    ConfigError, FilteredSites, Imt, Realization, RealizationId, Rupture, RuptureSeq,
    SiteCollection, StoreError, TaskNo,
};
use temblor_sep::SecondaryPeril;

use crate::gmf::{self, GmfParams};
use crate::store::{GmfKey, GmfRow, HazardStore};

/// Accumulates nonzero ground-motion values across the occurrences of
/// one task.
#[derive(Debug, Default)]
pub struct GmfCollector {
    acc: IndexMap<GmfKey, (Vec<f64>, Vec<RuptureSeq>)>,
}

impl GmfCollector {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct `(realization, IMT, site)` keys accumulated.
    pub fn len(&self) -> usize {
        self.acc.len()
    }

    /// True when nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.acc.is_empty()
    }

    /// Fold one simulated field into the accumulator.
    ///
    /// `values` is parallel to `subset`'s site indices. Exact zeros are
    /// dropped; everything else is appended together with the rupture's
    /// sequence number so downstream readers can attribute each value.
    pub fn add(
        &mut self,
        rlz: RealizationId,
        imt: Imt,
        seq: RuptureSeq,
        sites: &SiteCollection,
        subset: &FilteredSites,
        values: &[f64],
    ) {
        for (site, &gmv) in subset.iter(sites).zip(values) {
            if gmv == 0.0 {
                continue;
            }
            let entry = self.acc.entry((rlz, imt, site.id)).or_default();
            entry.0.push(gmv);
            entry.1.push(seq);
        }
    }

    /// Simulate one occurrence under every realization and fold the
    /// fields in, running the secondary-peril models on each
    /// realization's shaking.
    ///
    /// Each realization must carry a ground-shaking model for the
    /// rupture's tectonic region; a gap is a configuration error, not a
    /// silent skip. Peril output columns go through the same zero-drop
    /// accumulation as the primary fields, recorded under the
    /// realization whose shaking they were derived from.
    #[allow(clippy::too_many_arguments)]
    pub fn calc_gmf(
        &mut self,
        rupture: &Rupture,
        seq: RuptureSeq,
        sites: &SiteCollection,
        subset: &FilteredSites,
        realizations: &[Realization],
        imts: &[Imt],
        gmf_seed: u64,
        params: &GmfParams,
        perils: &[Box<dyn SecondaryPeril>],
    ) -> Result<(), ConfigError> {
        for rlz in realizations {
            let gsim = rlz
                .gsim_for(rupture.region)
                .ok_or(ConfigError::MissingGsim {
                    region: rupture.region,
                })?;
            let fields =
                gmf::ground_motion_field(rupture, sites, subset, gsim.as_ref(), imts, gmf_seed, params);
            for (imt, values) in &fields {
                self.add(rlz.id, *imt, seq, sites, subset, values);
            }
            if !perils.is_empty() {
                let pairs: Vec<(Imt, &[f64])> = fields
                    .iter()
                    .map(|(imt, values)| (*imt, values.as_slice()))
                    .collect();
                for model in perils {
                    for out in model.compute(rupture.magnitude, &pairs, sites, subset)? {
                        self.add(rlz.id, out.imt, seq, sites, subset, &out.values);
                    }
                }
            }
        }
        Ok(())
    }

    /// Write the accumulated rows to the store as one batch and reset.
    pub fn flush(&mut self, store: &dyn HazardStore, task_no: TaskNo) -> Result<usize, StoreError> {
        let rows: Vec<GmfRow> = self
            .acc
            .drain(..)
            .map(|((rlz, imt, site), (gmvs, rupture_seqs))| GmfRow {
                task_no,
                rlz,
                imt,
                site,
                gmvs,
                rupture_seqs,
            })
            .collect();
        let n = rows.len();
        store.put_gmf_rows(rows)?;
        Ok(n)
    }

    /// Drop everything accumulated without touching the store.
    pub fn discard(&mut self) {
        self.acc.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::store::MemStore;
    use temblor_core::SiteId;
    use temblor_test_utils::{peril_site_collection, single_realization, single_rupture_source};

    fn subset_of(sites: &SiteCollection) -> FilteredSites {
        FilteredSites::from_indices((0..sites.len()).collect()).unwrap()
    }

    // ---- add ----

    #[test]
    fn zeros_are_dropped() {
        let sites = peril_site_collection();
        let subset = subset_of(&sites);
        let mut c = GmfCollector::new();
        c.add(
            RealizationId(0),
            Imt::Pga,
            RuptureSeq(1),
            &sites,
            &subset,
            &[0.0, 0.3, 0.0],
        );
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn values_append_per_key_in_arrival_order() {
        let sites = peril_site_collection();
        let subset = subset_of(&sites);
        let mut c = GmfCollector::new();
        c.add(
            RealizationId(0),
            Imt::Pga,
            RuptureSeq(1),
            &sites,
            &subset,
            &[0.1, 0.2, 0.3],
        );
        c.add(
            RealizationId(0),
            Imt::Pga,
            RuptureSeq(2),
            &sites,
            &subset,
            &[0.4, 0.0, 0.0],
        );
        let store = MemStore::new();
        c.flush(&store, TaskNo(0)).unwrap();
        let rows = store.gmf_rows_for(RealizationId(0));
        let first = rows
            .iter()
            .find(|r| r.site == SiteId(0))
            .expect("row for site 0");
        assert_eq!(first.gmvs, vec![0.1, 0.4]);
        assert_eq!(first.rupture_seqs, vec![RuptureSeq(1), RuptureSeq(2)]);
    }

    // ---- calc_gmf ----

    #[test]
    fn missing_gsim_is_a_config_error() {
        let sites = peril_site_collection();
        let subset = subset_of(&sites);
        let source = single_rupture_source("s1", 0.0, 0.0);
        let rupture = source.iter_ruptures().next().unwrap();
        // A realization with no model for any region.
        let rlz = Realization {
            id: RealizationId(0),
            weight: 1.0,
            gsims: IndexMap::new(),
        };
        let mut c = GmfCollector::new();
        let err = c
            .calc_gmf(
                rupture,
                RuptureSeq(1),
                &sites,
                &subset,
                &[rlz],
                &[Imt::Pga],
                42,
                &GmfParams::default(),
                &[],
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingGsim { .. }));
    }

    #[test]
    fn calc_gmf_accumulates_every_realization() {
        let sites = peril_site_collection();
        let subset = subset_of(&sites);
        let source = single_rupture_source("s1", 0.0, 0.0);
        let rupture = source.iter_ruptures().next().unwrap();
        let gsim: Arc<dyn temblor_core::GroundShakingModel> =
            Arc::new(temblor_test_utils::FlatGsim::deterministic(0.2, 0.1));
        let rlzs = vec![
            single_realization(0, gsim.clone()),
            single_realization(1, gsim),
        ];
        let mut c = GmfCollector::new();
        c.calc_gmf(
            rupture,
            RuptureSeq(1),
            &sites,
            &subset,
            &rlzs,
            &[Imt::Pga],
            42,
            &GmfParams::default(),
            &[],
        )
        .unwrap();
        // One key per (rlz, imt, site): 2 rlz x 1 imt x 3 sites.
        assert_eq!(c.len(), 6);
    }

    #[test]
    fn peril_outputs_share_the_accumulation_path() {
        let sites = peril_site_collection();
        let subset = subset_of(&sites);
        let source = single_rupture_source("s1", 0.0, 0.0);
        let rupture = source.iter_ruptures().next().unwrap();
        let gsim: Arc<dyn temblor_core::GroundShakingModel> =
            Arc::new(temblor_test_utils::FlatGsim::deterministic(0.3, 20.0));
        let rlzs = vec![single_realization(0, gsim)];
        let perils = temblor_sep::instantiate(
            &["HazusLiquefaction".to_string()],
            &temblor_sep::PerilParams::new(),
        )
        .unwrap();
        let mut c = GmfCollector::new();
        c.calc_gmf(
            rupture,
            RuptureSeq(1),
            &sites,
            &subset,
            &rlzs,
            &[Imt::Pga],
            42,
            &GmfParams::default(),
            &perils,
        )
        .unwrap();
        // Pga rows plus LiqProb rows for sites with nonzero probability.
        let has_liq = c
            .acc
            .keys()
            .any(|(_, imt, _)| *imt == Imt::LiqProb);
        assert!(has_liq, "expected liquefaction rows");
    }

    // ---- flush / discard ----

    #[test]
    fn flush_resets_the_accumulator() {
        let sites = peril_site_collection();
        let subset = subset_of(&sites);
        let mut c = GmfCollector::new();
        c.add(
            RealizationId(0),
            Imt::Pgv,
            RuptureSeq(1),
            &sites,
            &subset,
            &[1.0, 2.0, 3.0],
        );
        let store = MemStore::new();
        let n = c.flush(&store, TaskNo(3)).unwrap();
        assert_eq!(n, 3);
        assert!(c.is_empty());
        assert_eq!(store.gmf_row_count(), 3);
    }

    #[test]
    fn discard_leaves_store_untouched() {
        let sites = peril_site_collection();
        let subset = subset_of(&sites);
        let mut c = GmfCollector::new();
        c.add(
            RealizationId(0),
            Imt::Pga,
            RuptureSeq(1),
            &sites,
            &subset,
            &[0.5, 0.5, 0.5],
        );
        c.discard();
        assert!(c.is_empty());
        let store = MemStore::new();
        assert_eq!(c.flush(&store, TaskNo(0)).unwrap(), 0);
        assert_eq!(store.gmf_row_count(), 0);
    }
}

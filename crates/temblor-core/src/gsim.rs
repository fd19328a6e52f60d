//! Ground-shaking models and logic-tree realizations.
//!
//! A [`GroundShakingModel`] is a pure function from (rupture, site, IMT)
//! to log-space mean and standard deviations. The physical formulas live
//! behind this trait; the engine only needs determinism and thread-safe
//! sharing. A [`Realization`] binds one model per tectonic region with a
//! logic-tree weight.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::id::RealizationId;
use crate::imt::Imt;
use crate::site::Site;
use crate::source::{Rupture, TectonicRegion};

/// Log-space ground-motion prediction for one (rupture, site, IMT).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GsimOutput {
    /// Mean of ln(ground motion).
    pub mean: f64,
    /// Inter-event (between-rupture) standard deviation of ln(gm).
    pub inter_sigma: f64,
    /// Intra-event (within-rupture, site-to-site) standard deviation.
    pub intra_sigma: f64,
}

/// A ground-shaking intensity model.
///
/// # Contract
///
/// `mean_and_stddevs` MUST be a pure function: the same inputs always
/// produce the same output. Implementations are shared read-only across
/// all concurrent tasks, hence `Send + Sync`.
pub trait GroundShakingModel: Send + Sync {
    /// Model name for diagnostics.
    fn name(&self) -> &str;

    /// Predict ln-space mean and standard deviations for one site.
    fn mean_and_stddevs(&self, rupture: &Rupture, site: &Site, imt: Imt) -> GsimOutput;
}

/// One logic-tree realization: a weighted assignment of one
/// ground-shaking model per tectonic region.
///
/// Immutable and read by every task; the per-region map iterates in
/// insertion order so diagnostics are stable.
#[derive(Clone)]
pub struct Realization {
    /// Realization identifier.
    pub id: RealizationId,
    /// Logic-tree weight of this realization.
    pub weight: f64,
    /// Ground-shaking model per tectonic region.
    pub gsims: IndexMap<TectonicRegion, Arc<dyn GroundShakingModel>>,
}

impl Realization {
    /// Build a realization from per-region model assignments.
    pub fn new(
        id: RealizationId,
        weight: f64,
        gsims: IndexMap<TectonicRegion, Arc<dyn GroundShakingModel>>,
    ) -> Self {
        Self { id, weight, gsims }
    }

    /// The model applied to ruptures of the given region, if assigned.
    pub fn gsim_for(&self, region: TectonicRegion) -> Option<&Arc<dyn GroundShakingModel>> {
        self.gsims.get(&region)
    }
}

impl std::fmt::Debug for Realization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Realization")
            .field("id", &self.id)
            .field("weight", &self.weight)
            .field(
                "gsims",
                &self
                    .gsims
                    .iter()
                    .map(|(trt, g)| (*trt, g.name().to_string()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

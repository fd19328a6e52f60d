//! Reusable hazard-model test fixtures.
//!
//! Canned sources, site collections, and two deterministic
//! ground-shaking models:
//!
//! - [`FlatGsim`] — distance-independent medians per IMT, configurable
//!   sigmas. With both sigmas zero its output is exactly the median,
//!   which makes end-to-end assertions closed-form.
//! - [`SilentGsim`] — predicts a median of exactly zero (ln-mean of
//!   negative infinity), for exercising the zero-contribution drop
//!   policy downstream.

use std::sync::Arc;

use indexmap::IndexMap;

use temblor_core::{
    GroundShakingModel, GsimOutput, Hypocenter, Imt, OccurrenceDistribution, Realization,
    RealizationId, Rupture, SeismicSource, Site, SiteCollection, SiteId, TectonicRegion,
};

/// Distance-independent ground-shaking model.
///
/// Returns a fixed median per IMT class (PGA in g, PGV in cm/s, SA
/// follows PGA) regardless of rupture or site, with configurable
/// inter/intra-event sigmas.
#[derive(Clone, Debug)]
pub struct FlatGsim {
    /// Median PGA (g).
    pub median_pga: f64,
    /// Median PGV (cm/s).
    pub median_pgv: f64,
    /// Inter-event standard deviation of ln(gm).
    pub inter_sigma: f64,
    /// Intra-event standard deviation of ln(gm).
    pub intra_sigma: f64,
}

impl FlatGsim {
    /// A fully deterministic model: fixed medians, zero sigmas.
    pub fn deterministic(median_pga: f64, median_pgv: f64) -> Self {
        Self {
            median_pga,
            median_pgv,
            inter_sigma: 0.0,
            intra_sigma: 0.0,
        }
    }
}

impl GroundShakingModel for FlatGsim {
    fn name(&self) -> &str {
        "FlatGsim"
    }

    fn mean_and_stddevs(&self, _rupture: &Rupture, _site: &Site, imt: Imt) -> GsimOutput {
        let median = match imt {
            Imt::Pgv => self.median_pgv,
            _ => self.median_pga,
        };
        GsimOutput {
            mean: median.ln(),
            inter_sigma: self.inter_sigma,
            intra_sigma: self.intra_sigma,
        }
    }
}

/// A model that predicts exactly zero ground motion everywhere.
///
/// `exp(-inf) == 0.0`, so every simulated value is a legitimate numeric
/// zero — the case the aggregation layer must drop.
#[derive(Clone, Copy, Debug)]
pub struct SilentGsim;

impl GroundShakingModel for SilentGsim {
    fn name(&self) -> &str {
        "SilentGsim"
    }

    fn mean_and_stddevs(&self, _rupture: &Rupture, _site: &Site, _imt: Imt) -> GsimOutput {
        GsimOutput {
            mean: f64::NEG_INFINITY,
            inter_sigma: 0.0,
            intra_sigma: 0.0,
        }
    }
}

/// A source with a single magnitude-6.5 rupture that occurs exactly
/// once per stochastic event set (degenerate occurrence distribution).
pub fn single_rupture_source(id: &str, lon: f64, lat: f64) -> SeismicSource {
    SeismicSource::new(
        id,
        TectonicRegion::ActiveShallowCrust,
        (lon, lat),
        vec![Rupture {
            magnitude: 6.5,
            hypocenter: Hypocenter {
                lon,
                lat,
                depth: 10.0,
            },
            region: TectonicRegion::ActiveShallowCrust,
            occurrence: OccurrenceDistribution::Fixed { count: 1 },
        }],
    )
}

/// A source with `n_ruptures` Poisson ruptures of increasing magnitude.
pub fn poisson_source(id: &str, lon: f64, lat: f64, annual_rate: f64, n_ruptures: u32) -> SeismicSource {
    let ruptures = (0..n_ruptures)
        .map(|i| Rupture {
            magnitude: 5.0 + 0.2 * f64::from(i),
            hypocenter: Hypocenter {
                lon,
                lat: lat + 0.01 * f64::from(i),
                depth: 10.0,
            },
            region: TectonicRegion::ActiveShallowCrust,
            occurrence: OccurrenceDistribution::Poisson { annual_rate },
        })
        .collect();
    SeismicSource::new(id, TectonicRegion::ActiveShallowCrust, (lon, lat), ruptures)
}

/// `n` sites spaced `spacing_deg` apart along the equator.
pub fn site_grid(n: u32, spacing_deg: f64) -> SiteCollection {
    SiteCollection::new(
        (0..n)
            .map(|i| Site::new(SiteId(i), f64::from(i) * spacing_deg, 0.0))
            .collect(),
    )
}

/// A three-site collection with the full secondary-peril attribute set
/// populated (wet, susceptible, sloped terrain).
pub fn peril_site_collection() -> SiteCollection {
    let mut a = Site::new(SiteId(0), 0.0, 0.0);
    a.vs30 = 250.0;
    a.slope = 20.0;
    a.gwd = 1.0;
    a.cti = 6.5;
    a.tri = 2.0;
    a.dw = 0.5;
    a.dc = 5.0;
    a.dr = 1.0;
    a.zwb = 3.0;
    a.precip = 1400.0;
    a.liq_susc = temblor_core::LiqSusceptibility::High;

    let mut b = Site::new(SiteId(1), 0.05, 0.0);
    b.vs30 = 400.0;
    b.slope = 35.0;
    b.cohesion = 8.0;
    b.liq_susc = temblor_core::LiqSusceptibility::Low;

    // Site c keeps the neutral defaults: flat, dry, not susceptible.
    let c = Site::new(SiteId(2), 0.1, 0.0);

    SiteCollection::new(vec![a, b, c])
}

/// One realization applying `gsim` to every tectonic region.
pub fn single_realization(id: u32, gsim: Arc<dyn GroundShakingModel>) -> Realization {
    let mut gsims: IndexMap<TectonicRegion, Arc<dyn GroundShakingModel>> = IndexMap::new();
    for region in [
        TectonicRegion::ActiveShallowCrust,
        TectonicRegion::StableContinental,
        TectonicRegion::SubductionInterface,
        TectonicRegion::SubductionIntraslab,
    ] {
        gsims.insert(region, Arc::clone(&gsim));
    }
    Realization::new(RealizationId(id), 1.0, gsims)
}

//! Ground-motion field computation for one rupture.
//!
//! One stochastic realization per rupture: for each requested IMT the
//! evaluator draws one inter-event residual, an optional shared spatial
//! residual, and one site residual per surviving site, then exponentiates
//! `mean + tau * eta + phi * xi` into physical units. Re-seeding with the
//! same rupture seed reproduces bit-identical output.
//!
//! A value of exactly zero is a legitimate numeric output (a model may
//! predict a zero median); the caller treats it as "no contribution" and
//! excludes it from aggregation.

use indexmap::IndexMap;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use temblor_core::site::haversine_km;
use temblor_core::{FilteredSites, GroundShakingModel, Imt, Rupture, SiteCollection};

/// Spatial correlation applied to intra-event residuals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CorrelationModel {
    /// Independent site residuals.
    None,
    /// Exponential-decay correlation with the rupture hypocenter:
    /// a site at distance `d` mixes a shared residual with its own in
    /// proportion `rho = exp(-3 d / range_km)`.
    ExponentialDecay {
        /// Correlation range in kilometres (rho drops to 5% at range).
        range_km: f64,
    },
}

/// Lowest accepted symmetric truncation level, in standard deviations.
///
/// Rejection sampling keeps roughly `erf(level / sqrt(2))` of its
/// draws, so below this floor almost every draw is discarded.
/// [`JobConfig::validate`](crate::calculator::JobConfig::validate)
/// refuses smaller levels.
pub const MIN_TRUNCATION_LEVEL: f64 = 0.2;

/// Simulation parameters shared by every GMF evaluation in a run.
#[derive(Clone, Copy, Debug)]
pub struct GmfParams {
    /// Symmetric truncation of the standard-normal residuals, in
    /// standard deviations. `None` leaves the tails unbounded.
    pub truncation_level: Option<f64>,
    /// Spatial correlation model for intra-event residuals.
    pub correlation: CorrelationModel,
}

impl Default for GmfParams {
    fn default() -> Self {
        Self {
            truncation_level: Some(3.0),
            correlation: CorrelationModel::None,
        }
    }
}

/// Standard-normal draw via Box-Muller, avoiding the `rand_distr`
/// dependency.
fn standard_normal(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-300); // avoid ln(0)
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Truncated standard-normal draw by rejection.
///
/// Rejection keeps the draw on the ChaCha stream without inverse-CDF
/// tables. Levels below [`MIN_TRUNCATION_LEVEL`] would reject heavily;
/// run configuration refuses them before any sampling starts.
fn truncated_normal(rng: &mut ChaCha8Rng, truncation: Option<f64>) -> f64 {
    match truncation {
        None => standard_normal(rng),
        Some(level) => loop {
            let z = standard_normal(rng);
            if z.abs() <= level {
                return z;
            }
        },
    }
}

/// Compute the ground-motion field of one rupture over a filtered site
/// subset.
///
/// Returns, per requested IMT in request order, a vector of values
/// aligned with `subset`. The draw order is fixed and documented: per
/// IMT, one inter-event residual, then (for correlated runs) one shared
/// spatial residual, then one residual per site in subset order —
/// changing this order is a reproducibility break.
pub fn ground_motion_field(
    rupture: &Rupture,
    sites: &SiteCollection,
    subset: &FilteredSites,
    gsim: &dyn GroundShakingModel,
    imts: &[Imt],
    seed: u64,
    params: &GmfParams,
) -> IndexMap<Imt, Vec<f64>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = IndexMap::with_capacity(imts.len());

    for &imt in imts {
        let eta = truncated_normal(&mut rng, params.truncation_level);
        let chi = match params.correlation {
            CorrelationModel::None => 0.0,
            CorrelationModel::ExponentialDecay { .. } => {
                truncated_normal(&mut rng, params.truncation_level)
            }
        };

        let mut values = Vec::with_capacity(subset.len());
        for site in subset.iter(sites) {
            let prediction = gsim.mean_and_stddevs(rupture, site, imt);
            let own = truncated_normal(&mut rng, params.truncation_level);
            let xi = match params.correlation {
                CorrelationModel::None => own,
                CorrelationModel::ExponentialDecay { range_km } => {
                    let d = haversine_km(
                        rupture.hypocenter.lon,
                        rupture.hypocenter.lat,
                        site.lon,
                        site.lat,
                    );
                    let rho = (-3.0 * d / range_km).exp();
                    rho.sqrt() * chi + (1.0 - rho).sqrt() * own
                }
            };
            let ln_gm =
                prediction.mean + prediction.inter_sigma * eta + prediction.intra_sigma * xi;
            values.push(ln_gm.exp());
        }
        out.insert(imt, values);
    }
    out
}

//! Secondary-peril models for the Temblor hazard engine.
//!
//! A secondary peril is a hazard derived from ground motion rather than
//! simulated directly: liquefaction probability, lateral spreading,
//! Newmark landslide displacement. Each model implements the
//! [`SecondaryPeril`] trait:
//!
//! 1. a constructor taking named parameters with defaults, validated
//!    against the model's recognized-options set;
//! 2. a [`prepare`](SecondaryPeril::prepare) step that may derive and
//!    cache per-site attributes once, before simulation starts;
//! 3. a [`compute`](SecondaryPeril::compute) step invoked once per
//!    rupture with whatever (IMT, ground-motion) pairs the run produced.
//!
//! Models are instantiated by name through the explicit
//! [`registry`] table built at process start; an unregistered name or an
//! unrecognized parameter fails fast before simulation. A model whose
//! single required IMT is absent from a call contributes nothing (silent
//! no-op); models whose contract makes two IMTs jointly mandatory raise
//! [`ConfigError::MandatoryImtMissing`] instead.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod conditioned;
pub mod hazus;
pub mod landslide;
pub mod liquefaction;
pub mod newmark;
pub mod registry;
pub mod zhu;

mod params;

pub use conditioned::{AllstadtEtAl2022Liquefaction, RashidianBaise2020Liquefaction};
pub use hazus::{HazusDeformation, HazusLiquefaction};
pub use newmark::NewmarkDisplacement;
pub use params::{ParamValue, PerilParams};
pub use registry::{instantiate, supported_models};
pub use zhu::{
    AkhlagiEtAl2021LiquefactionA, Bozzoni2021LiquefactionEurope,
    ZhuEtAl2015LiquefactionGeneral, ZhuEtAl2017LiquefactionCoastal,
    ZhuEtAl2017LiquefactionGeneral,
};

use temblor_core::{ConfigError, FilteredSites, Imt, SiteCollection, SiteError};

/// One output column produced by a peril model for one rupture.
///
/// `values` is aligned with the filtered site subset the model was
/// invoked with (one value per surviving site, in subset order).
#[derive(Clone, Debug, PartialEq)]
pub struct PerilOutput {
    /// The IMT-like name of the output column.
    pub imt: Imt,
    /// Per-site values, aligned with the filtered subset.
    pub values: Vec<f64>,
}

/// A pluggable secondary-hazard model.
///
/// # Contract
///
/// - `compute()` MUST be deterministic and side-effect free; all cached
///   state is written by `prepare()` before simulation starts.
/// - Every returned [`PerilOutput`] declares an IMT from `outputs()` and
///   carries exactly one value per site in the subset.
/// - Implementations are shared read-only across tasks (`Send + Sync`).
pub trait SecondaryPeril: Send + Sync {
    /// Registry name of the model.
    fn name(&self) -> &str;

    /// Output columns this model produces, validated as IMT names at
    /// construction time.
    fn outputs(&self) -> &[Imt];

    /// Derive and cache per-site attributes before simulation.
    ///
    /// Called exactly once, in the pre-execute phase, on the shared site
    /// collection. The default does nothing.
    ///
    /// # Errors
    ///
    /// Fails only on a column-management conflict, which indicates a
    /// misconfigured job (e.g. two models caching the same column name).
    fn prepare(&self, sites: &mut SiteCollection) -> Result<(), SiteError> {
        let _ = sites;
        Ok(())
    }

    /// Evaluate the model for one rupture.
    ///
    /// `imt_gmf` holds the (IMT, per-site ground motion) pairs available
    /// for this rupture, each aligned with `subset`. A model that does
    /// not find its required IMT returns an empty vector.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MandatoryImtMissing`] for models whose contract
    /// declares two IMTs jointly mandatory when either is absent.
    fn compute(
        &self,
        magnitude: f64,
        imt_gmf: &[(Imt, &[f64])],
        sites: &SiteCollection,
        subset: &FilteredSites,
    ) -> Result<Vec<PerilOutput>, ConfigError>;
}

impl std::fmt::Debug for dyn SecondaryPeril {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondaryPeril")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Parse a model's declared output names, failing registration on any
/// name that is not a valid IMT.
pub(crate) fn parse_outputs(model: &str, names: &[&str]) -> Result<Vec<Imt>, ConfigError> {
    names
        .iter()
        .map(|n| {
            Imt::from_string(n).map_err(|source| ConfigError::InvalidPerilOutput {
                model: model.to_string(),
                source,
            })
        })
        .collect()
}

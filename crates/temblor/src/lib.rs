//! Temblor: an event-based probabilistic seismic hazard simulation engine.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Temblor sub-crates. For most users, adding `temblor` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use temblor::prelude::*;
//! use temblor::types::{GroupOrdinal, Hypocenter, OccurrenceDistribution, Rupture};
//!
//! // A minimal ground-shaking model predicting a flat 0.2 g median
//! // with no aleatory variability.
//! struct FlatPga;
//! impl GroundShakingModel for FlatPga {
//!     fn name(&self) -> &str { "flat_pga" }
//!     fn mean_and_stddevs(&self, _r: &Rupture, _s: &Site, _imt: Imt) -> GsimOutput {
//!         GsimOutput { mean: (0.2f64).ln(), inter_sigma: 0.0, intra_sigma: 0.0 }
//!     }
//! }
//!
//! // One scenario rupture, one site, one logic-tree realization.
//! let rupture = Rupture {
//!     magnitude: 6.5,
//!     hypocenter: Hypocenter { lon: 0.0, lat: 0.0, depth: 10.0 },
//!     region: TectonicRegion::ActiveShallowCrust,
//!     occurrence: OccurrenceDistribution::Fixed { count: 1 },
//! };
//! let source = Arc::new(SeismicSource::new(
//!     "s1",
//!     TectonicRegion::ActiveShallowCrust,
//!     (0.0, 0.0),
//!     vec![rupture],
//! ));
//! let gsim: Arc<dyn GroundShakingModel> = Arc::new(FlatPga);
//! let rlz = Realization::new(
//!     RealizationId(0),
//!     1.0,
//!     [(TectonicRegion::ActiveShallowCrust, gsim)].into_iter().collect(),
//! );
//! let group = RealizationGroup {
//!     ordinal: GroupOrdinal(0),
//!     sources: vec![source],
//!     realizations: vec![rlz],
//! };
//! let sites = SiteCollection::new(vec![Site::new(SiteId(0), 0.1, 0.1)]);
//!
//! let store = MemStore::new();
//! let mut calc =
//!     EventBasedCalculator::new(JobConfig::default(), vec![group], sites, &store).unwrap();
//! calc.pre_execute().unwrap();
//! let outcomes = calc.execute(&SerialExecutor).unwrap();
//! assert_eq!(outcomes.len(), 1);
//! assert_eq!(store.rupture_count(), 1);
//! assert_eq!(store.gmf_row_count(), 1);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `temblor-core` | IDs, sources, sites, IMTs, models, error types |
//! | [`sep`] | `temblor-sep` | Secondary-peril models (liquefaction, landslide) |
//! | [`calc`] | `temblor-calc` | Event-based calculator, seeding, partitioning, storage |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`temblor-core`).
///
/// Contains seismic sources and ruptures, site collections, intensity
/// measure types, the [`types::GroundShakingModel`] trait, logic-tree
/// realizations, and the shared error types.
pub use temblor_core as types;

/// Secondary-peril models (`temblor-sep`).
///
/// Liquefaction and landslide models conditioned on ground shaking,
/// instantiated by registry name via [`sep::instantiate`]. The
/// [`sep::SecondaryPeril`] trait is the extension point for
/// user-defined models.
pub use temblor_sep as sep;

/// Event-based hazard calculation (`temblor-calc`).
///
/// [`calc::EventBasedCalculator`] drives the full pipeline: deterministic
/// seeding, task partitioning, stochastic event set sampling,
/// ground-motion field simulation, and batched persistence behind the
/// [`calc::HazardStore`] trait.
pub use temblor_calc as calc;

/// Common imports for typical Temblor usage.
///
/// ```rust
/// use temblor::prelude::*;
/// ```
///
/// This imports the most frequently used types: the calculator and its
/// configuration, executors, the store trait, core model traits, and the
/// secondary-peril registry.
pub mod prelude {
    // Core types and traits
    pub use temblor_core::{
        GroundShakingModel, GsimOutput, Imt, Realization, RealizationId, SeismicSource, Site,
        SiteCollection, SiteId, TectonicRegion,
    };

    // Errors
    pub use temblor_core::{ConfigError, SiteError, StoreError, TaskError};

    // Calculator
    pub use temblor_calc::{
        EventBasedCalculator, GmfParams, JobConfig, RealizationGroup, RunError, RunState,
    };

    // Execution
    pub use temblor_calc::{
        CancelToken, SerialExecutor, TaskExecutor, TaskOutcome, ThreadPoolExecutor,
    };

    // Storage
    pub use temblor_calc::{GmfRow, HazardStore, MemStore, SesRuptureRow};

    // Secondary perils
    pub use temblor_sep::{instantiate, supported_models, PerilParams, SecondaryPeril};
}

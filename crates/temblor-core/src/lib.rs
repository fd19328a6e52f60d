//! Core types for the Temblor event-based seismic hazard engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! fundamental abstractions shared across the workspace: strongly-typed
//! identifiers and the deterministic rupture tag, intensity measure types,
//! the site collection with distance filtering, seismic sources and
//! ruptures with occurrence sampling, the ground-shaking-model trait, and
//! the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod gsim;
pub mod id;
pub mod imt;
pub mod site;
pub mod source;

pub use error::{ConfigError, StoreError, TaskError};
pub use gsim::{GroundShakingModel, GsimOutput, Realization};
pub use id::{
    GroupOrdinal, RealizationId, RuptureSeq, RuptureTag, SesOrdinal, SiteId, TaskNo,
};
pub use imt::{Imt, ImtError};
pub use site::{FilteredSites, LiqSusceptibility, Site, SiteCollection, SiteError};
pub use source::{
    Hypocenter, OccurrenceDistribution, Rupture, SeismicSource, TectonicRegion,
};

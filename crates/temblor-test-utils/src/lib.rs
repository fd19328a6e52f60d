//! Shared test fixtures for the Temblor workspace.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod fixtures;

pub use fixtures::{
    peril_site_collection, poisson_source, single_realization, single_rupture_source, site_grid,
    FlatGsim, SilentGsim,
};

//! Seismic sources, ruptures, and occurrence sampling.
//!
//! A [`SeismicSource`] owns its candidate ruptures and is immutable once
//! loaded; tasks share sources read-only. A [`Rupture`] is one modeled
//! slip event (geometry, magnitude) plus the distribution from which its
//! per-SES occurrence count is drawn. Occurrence sampling is the only
//! stochastic operation here and runs on a caller-supplied seeded RNG,
//! which is what makes sampling independent of task partitioning: the
//! draw depends only on the source's derived seed and the call order
//! within that source.

use rand::Rng;

use crate::site::{FilteredSites, SiteCollection};

/// Tectonic region classification of a source.
///
/// Determines which ground-shaking model a realization applies to the
/// ruptures of that source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TectonicRegion {
    /// Active shallow crustal seismicity.
    ActiveShallowCrust,
    /// Stable continental regions.
    StableContinental,
    /// Subduction interface events.
    SubductionInterface,
    /// Intraslab (in-slab subduction) events.
    SubductionIntraslab,
}

impl std::fmt::Display for TectonicRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ActiveShallowCrust => "Active Shallow Crust",
            Self::StableContinental => "Stable Continental",
            Self::SubductionInterface => "Subduction Interface",
            Self::SubductionIntraslab => "Subduction Intraslab",
        };
        write!(f, "{s}")
    }
}

/// Rupture hypocenter: longitude, latitude (degrees) and depth (km).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hypocenter {
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Depth below surface in kilometres.
    pub depth: f64,
}

/// Distribution of the number of times a rupture occurs within one
/// stochastic event set (one investigation-time window).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OccurrenceDistribution {
    /// Poisson occurrence with the given annual rate; the SES draw uses
    /// `rate * investigation_time` as its expectation.
    Poisson {
        /// Mean annual occurrence rate (1/yr).
        annual_rate: f64,
    },
    /// Degenerate distribution: the rupture occurs exactly `count` times
    /// per SES. Used by scenario-style sources and tests.
    Fixed {
        /// Occurrence count per SES.
        count: u32,
    },
}

/// One modeled earthquake slip event produced by a source.
#[derive(Clone, Debug)]
pub struct Rupture {
    /// Moment magnitude.
    pub magnitude: f64,
    /// Hypocenter location.
    pub hypocenter: Hypocenter,
    /// Tectonic region inherited from the owning source.
    pub region: TectonicRegion,
    /// Occurrence-count distribution per SES.
    pub occurrence: OccurrenceDistribution,
}

impl Rupture {
    /// Sample the number of times this rupture occurs in one SES.
    ///
    /// Poisson sampling uses Knuth's product-of-uniforms method on the
    /// caller's RNG stream, keeping every draw on the pinned deterministic
    /// generator. Zero is a normal outcome, not an error.
    pub fn sample_number_of_occurrences<R: Rng>(
        &self,
        investigation_time: f64,
        rng: &mut R,
    ) -> u32 {
        match self.occurrence {
            OccurrenceDistribution::Fixed { count } => count,
            OccurrenceDistribution::Poisson { annual_rate } => {
                let lambda = annual_rate * investigation_time;
                if lambda <= 0.0 {
                    return 0;
                }
                let limit = (-lambda).exp();
                let mut n = 0u32;
                let mut p = 1.0f64;
                loop {
                    p *= rng.gen::<f64>();
                    if p <= limit {
                        return n;
                    }
                    n += 1;
                }
            }
        }
    }

    /// Narrow a source-filtered site subset to the sites within
    /// `max_km` of this rupture's hypocenter.
    ///
    /// `None` means the rupture affects no site and is discarded.
    pub fn filter_sites_by_distance(
        &self,
        sites: &SiteCollection,
        subset: &FilteredSites,
        max_km: Option<f64>,
    ) -> Option<FilteredSites> {
        subset.refine_by_distance(sites, self.hypocenter.lon, self.hypocenter.lat, max_km)
    }
}

/// An area/fault/point seismic source.
///
/// Owns its candidate ruptures and a representative location used for the
/// cheap source-level distance filter. Immutable after load.
#[derive(Clone, Debug)]
pub struct SeismicSource {
    /// Stable source identifier, part of every rupture tag.
    pub id: String,
    /// Tectonic region of every rupture this source generates.
    pub region: TectonicRegion,
    /// Representative location (lon, lat) for source-level filtering.
    pub location: (f64, f64),
    /// Candidate ruptures in enumeration order.
    ruptures: Vec<Rupture>,
}

impl SeismicSource {
    /// Build a source from its candidate ruptures.
    pub fn new(
        id: impl Into<String>,
        region: TectonicRegion,
        location: (f64, f64),
        ruptures: Vec<Rupture>,
    ) -> Self {
        Self {
            id: id.into(),
            region,
            location,
            ruptures,
        }
    }

    /// Candidate ruptures in stable enumeration order.
    ///
    /// The position of a rupture in this iteration is its index in the
    /// deterministic rupture tag.
    pub fn iter_ruptures(&self) -> impl Iterator<Item = &Rupture> {
        self.ruptures.iter()
    }

    /// Number of candidate ruptures.
    pub fn rupture_count(&self) -> usize {
        self.ruptures.len()
    }

    /// Sites within `max_km` of the source's representative location.
    ///
    /// `None` means the whole source is out of range and contributes
    /// nothing to the run (a silent skip).
    pub fn filter_sites_by_distance(
        &self,
        sites: &SiteCollection,
        max_km: Option<f64>,
    ) -> Option<FilteredSites> {
        sites.filter_by_distance(self.location.0, self.location.1, max_km)
    }
}

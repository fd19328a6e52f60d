//! Sites, the site collection, and distance filtering.
//!
//! A [`SiteCollection`] is loaded once per job and shared read-only across
//! all concurrent tasks. Per-task work operates on a [`FilteredSites`]
//! subset selected by great-circle distance, first to the source extent and
//! then to each rupture. Secondary-peril models may cache derived per-site
//! attributes as named extra columns before simulation starts (the only
//! mutation the collection ever sees, and it happens pre-execution).

use std::error::Error;
use std::fmt;

use indexmap::IndexMap;

use crate::id::SiteId;

/// Mean earth radius in kilometres, used by the haversine distance.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// HAZUS-style liquefaction susceptibility category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LiqSusceptibility {
    /// No susceptibility; the HAZUS conditional probability is zero.
    #[default]
    None,
    /// Very low susceptibility.
    VeryLow,
    /// Low susceptibility.
    Low,
    /// Moderate susceptibility.
    Moderate,
    /// High susceptibility.
    High,
    /// Very high susceptibility.
    VeryHigh,
}

/// One geographic site with the physical attributes consumed by
/// ground-shaking and secondary-peril models.
///
/// All attributes are plain values; units follow the conventional hazard
/// inputs (vs30 in m/s, slope in degrees, depths and distances in metres
/// or kilometres as named, precipitation in mm/yr).
#[derive(Clone, Debug)]
pub struct Site {
    /// Sequential site identifier.
    pub id: SiteId,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Time-averaged shear-wave velocity in the top 30 m (m/s).
    pub vs30: f64,
    /// Ground slope (degrees).
    pub slope: f64,
    /// Groundwater depth (m).
    pub gwd: f64,
    /// Compound topographic index (wetness proxy).
    pub cti: f64,
    /// Topographic roughness index.
    pub tri: f64,
    /// Distance to the nearest water body (km).
    pub dw: f64,
    /// Distance to the coast (km).
    pub dc: f64,
    /// Distance to the nearest river (km).
    pub dr: f64,
    /// Depth to the water body bottom (m).
    pub zwb: f64,
    /// Mean annual precipitation (mm).
    pub precip: f64,
    /// Liquefaction susceptibility category.
    pub liq_susc: LiqSusceptibility,
    /// Soil cohesion at mid-depth (kPa).
    pub cohesion: f64,
    /// Soil friction angle at mid-depth (degrees).
    pub friction_angle: f64,
    /// Degree of soil saturation (0..1).
    pub saturation: f64,
    /// Dry soil density (kg/m^3).
    pub dry_density: f64,
}

impl Site {
    /// A site at the given location with neutral physical attributes.
    ///
    /// Fixture-friendly: callers set only the attributes their models read.
    pub fn new(id: SiteId, lon: f64, lat: f64) -> Self {
        Self {
            id,
            lon,
            lat,
            vs30: 760.0,
            slope: 0.0,
            gwd: 5.0,
            cti: 0.0,
            tri: 0.0,
            dw: 10.0,
            dc: 50.0,
            dr: 10.0,
            zwb: 10.0,
            precip: 500.0,
            liq_susc: LiqSusceptibility::None,
            cohesion: 20.0,
            friction_angle: 30.0,
            saturation: 0.3,
            dry_density: 1500.0,
        }
    }
}

// ── SiteCollection ─────────────────────────────────────────────────

/// Errors from site-collection column management.
#[derive(Clone, Debug, PartialEq)]
pub enum SiteError {
    /// A derived column's length does not match the collection length.
    ColumnLengthMismatch {
        /// Name of the offending column.
        name: String,
        /// Provided column length.
        got: usize,
        /// Number of sites in the collection.
        expected: usize,
    },
    /// A derived column with this name already exists.
    DuplicateColumn(String),
}

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColumnLengthMismatch { name, got, expected } => write!(
                f,
                "column '{name}' has {got} values for {expected} sites"
            ),
            Self::DuplicateColumn(name) => write!(f, "column '{name}' already exists"),
        }
    }
}

impl Error for SiteError {}

/// Ordered collection of sites, shared read-only across tasks.
///
/// Extra columns hold per-site values derived once before simulation
/// (e.g. a static factor of safety cached by a landslide model's
/// `prepare` step); they are keyed by name and iterate in insertion
/// order.
#[derive(Clone, Debug, Default)]
pub struct SiteCollection {
    sites: Vec<Site>,
    extra: IndexMap<String, Vec<f64>>,
}

impl SiteCollection {
    /// Build a collection from sites in load order.
    pub fn new(sites: Vec<Site>) -> Self {
        Self {
            sites,
            extra: IndexMap::new(),
        }
    }

    /// Number of sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Site at a positional index.
    pub fn get(&self, index: usize) -> Option<&Site> {
        self.sites.get(index)
    }

    /// Iterate over all sites in order.
    pub fn iter(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter()
    }

    /// Add a derived per-site column.
    ///
    /// # Errors
    ///
    /// Fails if the name is already taken or the length does not match
    /// the number of sites.
    pub fn add_col(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), SiteError> {
        let name = name.into();
        if self.extra.contains_key(&name) {
            return Err(SiteError::DuplicateColumn(name));
        }
        if values.len() != self.sites.len() {
            return Err(SiteError::ColumnLengthMismatch {
                name,
                got: values.len(),
                expected: self.sites.len(),
            });
        }
        self.extra.insert(name, values);
        Ok(())
    }

    /// A derived column by name, if present.
    pub fn col(&self, name: &str) -> Option<&[f64]> {
        self.extra.get(name).map(Vec::as_slice)
    }

    /// Filter sites by great-circle distance to a point.
    ///
    /// Returns `None` when no site is within `max_km` — the normal
    /// "nothing in range" outcome, not an error. `max_km = None` keeps
    /// every site.
    pub fn filter_by_distance(
        &self,
        lon: f64,
        lat: f64,
        max_km: Option<f64>,
    ) -> Option<FilteredSites> {
        let indices: Vec<usize> = match max_km {
            None => (0..self.sites.len()).collect(),
            Some(max) => self
                .sites
                .iter()
                .enumerate()
                .filter(|(_, s)| haversine_km(lon, lat, s.lon, s.lat) <= max)
                .map(|(i, _)| i)
                .collect(),
        };
        FilteredSites::from_indices(indices)
    }
}

// ── FilteredSites ──────────────────────────────────────────────────

/// Indices of the sites surviving a distance filter, in collection order.
///
/// Always non-empty: filters that leave nothing return `None` instead,
/// so downstream code never sees a zero-length subset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilteredSites {
    indices: Vec<usize>,
}

impl FilteredSites {
    /// Wrap a set of surviving indices; `None` if empty.
    pub fn from_indices(indices: Vec<usize>) -> Option<Self> {
        if indices.is_empty() {
            None
        } else {
            Some(Self { indices })
        }
    }

    /// Number of surviving sites.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the subset is empty (never true by construction).
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The surviving positional indices into the parent collection.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Iterate over the surviving sites of `sites`.
    pub fn iter<'a>(&'a self, sites: &'a SiteCollection) -> impl Iterator<Item = &'a Site> + 'a {
        self.indices.iter().filter_map(|&i| sites.get(i))
    }

    /// Narrow this subset by distance to another point.
    ///
    /// Used for the rupture-level filter, which operates on the sites that
    /// already survived the source-level filter. Returns `None` when
    /// nothing survives.
    pub fn refine_by_distance(
        &self,
        sites: &SiteCollection,
        lon: f64,
        lat: f64,
        max_km: Option<f64>,
    ) -> Option<FilteredSites> {
        let indices: Vec<usize> = match max_km {
            None => self.indices.clone(),
            Some(max) => self
                .indices
                .iter()
                .copied()
                .filter(|&i| {
                    sites
                        .get(i)
                        .map(|s| haversine_km(lon, lat, s.lon, s.lat) <= max)
                        .unwrap_or(false)
                })
                .collect(),
        };
        FilteredSites::from_indices(indices)
    }
}

/// Great-circle distance between two lon/lat points in kilometres.
pub fn haversine_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lon1, lat1) = (lon1.to_radians(), lat1.to_radians());
    let (lon2, lat2) = (lon2.to_radians(), lat2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: u32) -> SiteCollection {
        // Sites spaced ~11 km apart along a meridian.
        SiteCollection::new(
            (0..n)
                .map(|i| Site::new(SiteId(i), 0.0, f64::from(i) * 0.1))
                .collect(),
        )
    }

    // ---------------------------------------------------------------
    // Distance math
    // ---------------------------------------------------------------

    #[test]
    fn haversine_zero_for_same_point() {
        assert_eq!(haversine_km(12.5, 42.0, 12.5, 42.0), 0.0);
    }

    #[test]
    fn haversine_one_degree_latitude() {
        let d = haversine_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }

    // ---------------------------------------------------------------
    // Filtering
    // ---------------------------------------------------------------

    #[test]
    fn filter_none_keeps_everything() {
        let sites = grid(5);
        let f = sites.filter_by_distance(0.0, 0.0, None).unwrap();
        assert_eq!(f.len(), 5);
        assert_eq!(f.indices(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn filter_excludes_distant_sites() {
        let sites = grid(5);
        // ~11.1 km per 0.1 degree: a 25 km radius keeps sites 0..=2.
        let f = sites.filter_by_distance(0.0, 0.0, Some(25.0)).unwrap();
        assert_eq!(f.indices(), &[0, 1, 2]);
    }

    #[test]
    fn filter_with_nothing_in_range_is_none() {
        let sites = grid(5);
        assert!(sites.filter_by_distance(90.0, 0.0, Some(10.0)).is_none());
    }

    #[test]
    fn refine_narrows_a_subset() {
        let sites = grid(10);
        let wide = sites.filter_by_distance(0.0, 0.0, Some(60.0)).unwrap();
        let narrow = wide
            .refine_by_distance(&sites, 0.0, 0.0, Some(15.0))
            .unwrap();
        assert_eq!(narrow.indices(), &[0, 1]);
        assert!(wide
            .refine_by_distance(&sites, 90.0, 0.0, Some(1.0))
            .is_none());
    }

    // ---------------------------------------------------------------
    // Derived columns
    // ---------------------------------------------------------------

    #[test]
    fn add_col_round_trips() {
        let mut sites = grid(3);
        sites.add_col("Fs", vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(sites.col("Fs"), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(sites.col("missing"), None);
    }

    #[test]
    fn add_col_rejects_bad_length_and_duplicates() {
        let mut sites = grid(3);
        assert!(matches!(
            sites.add_col("Fs", vec![1.0]),
            Err(SiteError::ColumnLengthMismatch { .. })
        ));
        sites.add_col("Fs", vec![0.0; 3]).unwrap();
        assert!(matches!(
            sites.add_col("Fs", vec![0.0; 3]),
            Err(SiteError::DuplicateColumn(_))
        ));
    }

    // ---------------------------------------------------------------
    // Property tests
    // ---------------------------------------------------------------

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn haversine_is_a_metric(
            lon1 in -180.0f64..180.0,
            lat1 in -85.0f64..85.0,
            lon2 in -180.0f64..180.0,
            lat2 in -85.0f64..85.0,
        ) {
            let d = haversine_km(lon1, lat1, lon2, lat2);
            prop_assert!(d >= 0.0);
            // Symmetric
            let r = haversine_km(lon2, lat2, lon1, lat1);
            prop_assert!((d - r).abs() < 1e-6);
            // Reflexive
            prop_assert!(haversine_km(lon1, lat1, lon1, lat1) < 1e-9);
            // Bounded by half the great circle
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }

        #[test]
        fn refine_is_monotone(max_wide in 20.0f64..200.0, max_narrow in 1.0f64..20.0) {
            let sites = grid(20);
            if let Some(wide) = sites.filter_by_distance(0.0, 0.0, Some(max_wide)) {
                let narrow = wide.refine_by_distance(&sites, 0.0, 0.0, Some(max_narrow));
                if let Some(narrow) = narrow {
                    prop_assert!(narrow.len() <= wide.len());
                    for i in narrow.indices() {
                        prop_assert!(wide.indices().contains(i));
                    }
                }
            }
        }
    }
}

//! Newmark landslide displacement model.

use temblor_core::{ConfigError, FilteredSites, Imt, SiteCollection, SiteError};

use crate::landslide::{
    newmark_critical_accel, newmark_displ_from_pga_mag, prob_failure_given_displacement,
    static_factor_of_safety,
};
use crate::params::{ModelParams, PerilParams};
use crate::{parse_outputs, PerilOutput, SecondaryPeril};

/// Derived column holding the static factor of safety.
const COL_FS: &str = "Fs";
/// Derived column holding the Newmark critical acceleration (g).
const COL_CRIT_ACCEL: &str = "crit_accel";

/// Newmark rigid-block landslide displacement from PGA.
///
/// `prepare` caches the static factor of safety and the critical
/// acceleration as derived site columns; `compute` needs only the PGA
/// field and emits displacement (`Disp`, metres) and the probability of
/// slope failure given that displacement (`DispProb`).
#[derive(Clone, Debug)]
pub struct NewmarkDisplacement {
    c1: f64,
    c2: f64,
    c3: f64,
    c4: f64,
    crit_accel_threshold: f64,
    outputs: Vec<Imt>,
}

impl NewmarkDisplacement {
    /// Registry name.
    pub const NAME: &'static str = "NewmarkDisplacement";

    const RECOGNIZED: &'static [&'static str] = &["c1", "c2", "c3", "c4", "crit_accel_threshold"];

    /// Build from named parameters (Jibson regression defaults).
    ///
    /// # Errors
    ///
    /// Unknown or mistyped parameters fail fast with a [`ConfigError`].
    pub fn from_params(params: &PerilParams) -> Result<Self, ConfigError> {
        let p = ModelParams::new(Self::NAME, params, Self::RECOGNIZED)?;
        Ok(Self {
            c1: p.num("c1", -2.71)?,
            c2: p.num("c2", 2.335)?,
            c3: p.num("c3", -1.478)?,
            c4: p.num("c4", 0.424)?,
            crit_accel_threshold: p.num("crit_accel_threshold", 0.05)?,
            outputs: parse_outputs(Self::NAME, &["Disp", "DispProb"])?,
        })
    }
}

impl SecondaryPeril for NewmarkDisplacement {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn outputs(&self) -> &[Imt] {
        &self.outputs
    }

    fn prepare(&self, sites: &mut SiteCollection) -> Result<(), SiteError> {
        let fs: Vec<f64> = sites
            .iter()
            .map(|s| {
                static_factor_of_safety(
                    s.slope,
                    s.cohesion,
                    s.friction_angle,
                    s.saturation,
                    s.dry_density,
                )
            })
            .collect();
        let crit: Vec<f64> = fs
            .iter()
            .zip(sites.iter())
            .map(|(&fs, s)| newmark_critical_accel(fs, s.slope))
            .collect();
        sites.add_col(COL_FS, fs)?;
        sites.add_col(COL_CRIT_ACCEL, crit)?;
        Ok(())
    }

    fn compute(
        &self,
        magnitude: f64,
        imt_gmf: &[(Imt, &[f64])],
        sites: &SiteCollection,
        subset: &FilteredSites,
    ) -> Result<Vec<PerilOutput>, ConfigError> {
        let crit_accel = sites
            .col(COL_CRIT_ACCEL)
            .ok_or(ConfigError::PerilNotPrepared {
                model: Self::NAME.to_string(),
                column: COL_CRIT_ACCEL,
            })?;
        let mut out = Vec::new();
        for (imt, gmf) in imt_gmf {
            if *imt != Imt::Pga {
                continue;
            }
            let disp: Vec<f64> = subset
                .indices()
                .iter()
                .zip(gmf.iter())
                .map(|(&site_idx, &pga)| {
                    newmark_displ_from_pga_mag(
                        pga,
                        crit_accel[site_idx],
                        magnitude,
                        self.c1,
                        self.c2,
                        self.c3,
                        self.c4,
                        self.crit_accel_threshold,
                    )
                })
                .collect();
            let prob: Vec<f64> = disp
                .iter()
                .map(|&d| prob_failure_given_displacement(d))
                .collect();
            out.push(PerilOutput {
                imt: Imt::Disp,
                values: disp,
            });
            out.push(PerilOutput {
                imt: Imt::DispProb,
                values: prob,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use temblor_core::{Site, SiteId};

    fn sloped_sites() -> SiteCollection {
        let mut a = Site::new(SiteId(0), 0.0, 0.0);
        a.slope = 25.0;
        a.cohesion = 10.0;
        let mut b = Site::new(SiteId(1), 0.0, 0.1);
        b.slope = 0.0;
        SiteCollection::new(vec![a, b])
    }

    #[test]
    fn prepare_caches_stability_columns() {
        let model = NewmarkDisplacement::from_params(&PerilParams::new()).unwrap();
        let mut sites = sloped_sites();
        model.prepare(&mut sites).unwrap();
        let fs = sites.col("Fs").unwrap();
        let crit = sites.col("crit_accel").unwrap();
        assert_eq!(fs.len(), 2);
        // The flat site must be more stable than the sloped one.
        assert!(fs[1] > fs[0]);
        assert!(crit.iter().all(|&a| a >= 0.0));
    }

    #[test]
    fn compute_without_prepare_is_a_config_error() {
        let model = NewmarkDisplacement::from_params(&PerilParams::new()).unwrap();
        let sites = sloped_sites();
        let subset = sites.filter_by_distance(0.0, 0.0, None).unwrap();
        let gmf = vec![0.4, 0.4];
        let err = model
            .compute(7.0, &[(Imt::Pga, &gmf)], &sites, &subset)
            .unwrap_err();
        assert!(matches!(err, ConfigError::PerilNotPrepared { .. }));
    }

    #[test]
    fn compute_emits_displacement_and_probability() {
        let model = NewmarkDisplacement::from_params(&PerilParams::new()).unwrap();
        let mut sites = sloped_sites();
        model.prepare(&mut sites).unwrap();
        let subset = sites.filter_by_distance(0.0, 0.0, None).unwrap();
        let gmf = vec![0.6, 0.6];
        let out = model
            .compute(7.0, &[(Imt::Pga, &gmf)], &sites, &subset)
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].imt, Imt::Disp);
        assert_eq!(out[1].imt, Imt::DispProb);
        assert_eq!(out[0].values.len(), subset.len());
        // Flat terrain never slides.
        assert_eq!(out[0].values[1], 0.0);
    }

    #[test]
    fn skips_silently_without_pga() {
        let model = NewmarkDisplacement::from_params(&PerilParams::new()).unwrap();
        let mut sites = sloped_sites();
        model.prepare(&mut sites).unwrap();
        let subset = sites.filter_by_distance(0.0, 0.0, None).unwrap();
        let gmf = vec![10.0, 10.0];
        let out = model
            .compute(7.0, &[(Imt::Pgv, &gmf)], &sites, &subset)
            .unwrap();
        assert!(out.is_empty());
    }
}

//! Geospatial logistic-regression liquefaction models.
//!
//! The Zhu-family models and their regional relatives predict a
//! liquefaction probability from one ground-motion measure plus static
//! site proxies (vs30, wetness, distances to water). Each struct wraps
//! one calibrated coefficient set from [`crate::liquefaction`]; all
//! coefficients are overridable job parameters.

use temblor_core::{ConfigError, FilteredSites, Imt, SiteCollection};

use crate::liquefaction::{
    akhlagi_etal_2021_model_a, bozzoni_etal_2021_europe, zhu_etal_2015_general,
    zhu_etal_2017_coastal, zhu_etal_2017_general, Akhlagi2021Coeffs, Bozzoni2021Coeffs,
    Zhu2015Coeffs, Zhu2017CoastalCoeffs, Zhu2017GeneralCoeffs,
};
use crate::params::{ModelParams, PerilParams};
use crate::{parse_outputs, PerilOutput, SecondaryPeril};

/// Zhu et al. (2015) general liquefaction probability from PGA.
#[derive(Clone, Debug)]
pub struct ZhuEtAl2015LiquefactionGeneral {
    coeffs: Zhu2015Coeffs,
    outputs: Vec<Imt>,
}

impl ZhuEtAl2015LiquefactionGeneral {
    /// Registry name.
    pub const NAME: &'static str = "ZhuEtAl2015LiquefactionGeneral";

    const RECOGNIZED: &'static [&'static str] =
        &["intercept", "pgam_coeff", "cti_coeff", "vs30_coeff"];

    /// Build from named parameters (published 2015 calibration defaults).
    ///
    /// # Errors
    ///
    /// Unknown or mistyped parameters fail fast with a [`ConfigError`].
    pub fn from_params(params: &PerilParams) -> Result<Self, ConfigError> {
        let p = ModelParams::new(Self::NAME, params, Self::RECOGNIZED)?;
        Ok(Self {
            coeffs: Zhu2015Coeffs {
                intercept: p.num("intercept", 24.1)?,
                pgam_coeff: p.num("pgam_coeff", 2.067)?,
                cti_coeff: p.num("cti_coeff", 0.355)?,
                vs30_coeff: p.num("vs30_coeff", -4.784)?,
            },
            outputs: parse_outputs(Self::NAME, &["LiqProb"])?,
        })
    }
}

impl SecondaryPeril for ZhuEtAl2015LiquefactionGeneral {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn outputs(&self) -> &[Imt] {
        &self.outputs
    }

    fn compute(
        &self,
        magnitude: f64,
        imt_gmf: &[(Imt, &[f64])],
        sites: &SiteCollection,
        subset: &FilteredSites,
    ) -> Result<Vec<PerilOutput>, ConfigError> {
        let mut out = Vec::new();
        for (imt, gmf) in imt_gmf {
            if *imt != Imt::Pga {
                continue;
            }
            let values = subset
                .iter(sites)
                .zip(gmf.iter())
                .map(|(site, &pga)| {
                    zhu_etal_2015_general(pga, magnitude, site.cti, site.vs30, &self.coeffs)
                })
                .collect();
            out.push(PerilOutput {
                imt: Imt::LiqProb,
                values,
            });
        }
        Ok(out)
    }
}

/// Zhu et al. (2017) general liquefaction probability from PGV.
#[derive(Clone, Debug)]
pub struct ZhuEtAl2017LiquefactionGeneral {
    coeffs: Zhu2017GeneralCoeffs,
    outputs: Vec<Imt>,
}

impl ZhuEtAl2017LiquefactionGeneral {
    /// Registry name.
    pub const NAME: &'static str = "ZhuEtAl2017LiquefactionGeneral";

    const RECOGNIZED: &'static [&'static str] = &[
        "intercept",
        "pgv_scaling_factor",
        "pgv_coeff",
        "vs30_coeff",
        "dw_coeff",
        "wtd_coeff",
        "precip_coeff",
    ];

    /// Build from named parameters (published 2017 calibration defaults).
    ///
    /// # Errors
    ///
    /// Unknown or mistyped parameters fail fast with a [`ConfigError`].
    pub fn from_params(params: &PerilParams) -> Result<Self, ConfigError> {
        let p = ModelParams::new(Self::NAME, params, Self::RECOGNIZED)?;
        Ok(Self {
            coeffs: Zhu2017GeneralCoeffs {
                intercept: p.num("intercept", 8.801)?,
                pgv_scaling_factor: p.num("pgv_scaling_factor", 1.0)?,
                pgv_coeff: p.num("pgv_coeff", 0.334)?,
                vs30_coeff: p.num("vs30_coeff", -1.918)?,
                dw_coeff: p.num("dw_coeff", -0.2054)?,
                wtd_coeff: p.num("wtd_coeff", -0.0333)?,
                precip_coeff: p.num("precip_coeff", 0.0005408)?,
            },
            outputs: parse_outputs(Self::NAME, &["LiqProb"])?,
        })
    }
}

impl SecondaryPeril for ZhuEtAl2017LiquefactionGeneral {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn outputs(&self) -> &[Imt] {
        &self.outputs
    }

    fn compute(
        &self,
        _magnitude: f64,
        imt_gmf: &[(Imt, &[f64])],
        sites: &SiteCollection,
        subset: &FilteredSites,
    ) -> Result<Vec<PerilOutput>, ConfigError> {
        let mut out = Vec::new();
        for (imt, gmf) in imt_gmf {
            if *imt != Imt::Pgv {
                continue;
            }
            let values = subset
                .iter(sites)
                .zip(gmf.iter())
                .map(|(site, &pgv)| {
                    zhu_etal_2017_general(
                        pgv,
                        site.vs30,
                        site.dw,
                        site.gwd,
                        site.precip,
                        &self.coeffs,
                    )
                })
                .collect();
            out.push(PerilOutput {
                imt: Imt::LiqProb,
                values,
            });
        }
        Ok(out)
    }
}

/// Zhu et al. (2017) coastal liquefaction probability from PGV.
#[derive(Clone, Debug)]
pub struct ZhuEtAl2017LiquefactionCoastal {
    coeffs: Zhu2017CoastalCoeffs,
    outputs: Vec<Imt>,
}

impl ZhuEtAl2017LiquefactionCoastal {
    /// Registry name.
    pub const NAME: &'static str = "ZhuEtAl2017LiquefactionCoastal";

    const RECOGNIZED: &'static [&'static str] = &[
        "intercept",
        "pgv_coeff",
        "vs30_coeff",
        "dr_coeff",
        "dc_coeff",
        "dcdr_coeff",
        "precip_coeff",
    ];

    /// Build from named parameters (published coastal calibration).
    ///
    /// # Errors
    ///
    /// Unknown or mistyped parameters fail fast with a [`ConfigError`].
    pub fn from_params(params: &PerilParams) -> Result<Self, ConfigError> {
        let p = ModelParams::new(Self::NAME, params, Self::RECOGNIZED)?;
        Ok(Self {
            coeffs: Zhu2017CoastalCoeffs {
                intercept: p.num("intercept", 12.435)?,
                pgv_coeff: p.num("pgv_coeff", 0.301)?,
                vs30_coeff: p.num("vs30_coeff", -2.615)?,
                dr_coeff: p.num("dr_coeff", 0.0666)?,
                dc_coeff: p.num("dc_coeff", -0.0287)?,
                dcdr_coeff: p.num("dcdr_coeff", -0.0369)?,
                precip_coeff: p.num("precip_coeff", 0.0005556)?,
            },
            outputs: parse_outputs(Self::NAME, &["LiqProb"])?,
        })
    }
}

impl SecondaryPeril for ZhuEtAl2017LiquefactionCoastal {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn outputs(&self) -> &[Imt] {
        &self.outputs
    }

    fn compute(
        &self,
        _magnitude: f64,
        imt_gmf: &[(Imt, &[f64])],
        sites: &SiteCollection,
        subset: &FilteredSites,
    ) -> Result<Vec<PerilOutput>, ConfigError> {
        let mut out = Vec::new();
        for (imt, gmf) in imt_gmf {
            if *imt != Imt::Pgv {
                continue;
            }
            let values = subset
                .iter(sites)
                .zip(gmf.iter())
                .map(|(site, &pgv)| {
                    zhu_etal_2017_coastal(
                        pgv,
                        site.vs30,
                        site.dr,
                        site.dc,
                        site.precip,
                        &self.coeffs,
                    )
                })
                .collect();
            out.push(PerilOutput {
                imt: Imt::LiqProb,
                values,
            });
        }
        Ok(out)
    }
}

/// Akhlagi et al. (2021) model A liquefaction probability from PGV.
#[derive(Clone, Debug)]
pub struct AkhlagiEtAl2021LiquefactionA {
    coeffs: Akhlagi2021Coeffs,
    outputs: Vec<Imt>,
}

impl AkhlagiEtAl2021LiquefactionA {
    /// Registry name.
    pub const NAME: &'static str = "AkhlagiEtAl2021LiquefactionA";

    const RECOGNIZED: &'static [&'static str] = &[
        "intercept",
        "pgv_coeff",
        "tri_coeff",
        "dc_coeff",
        "dr_coeff",
        "zwb_coeff",
    ];

    /// Build from named parameters.
    ///
    /// # Errors
    ///
    /// Unknown or mistyped parameters fail fast with a [`ConfigError`].
    pub fn from_params(params: &PerilParams) -> Result<Self, ConfigError> {
        let p = ModelParams::new(Self::NAME, params, Self::RECOGNIZED)?;
        Ok(Self {
            coeffs: Akhlagi2021Coeffs {
                intercept: p.num("intercept", 4.925)?,
                pgv_coeff: p.num("pgv_coeff", 0.694)?,
                tri_coeff: p.num("tri_coeff", -0.459)?,
                dc_coeff: p.num("dc_coeff", -0.403)?,
                dr_coeff: p.num("dr_coeff", -0.309)?,
                zwb_coeff: p.num("zwb_coeff", -0.164)?,
            },
            outputs: parse_outputs(Self::NAME, &["LiqProb"])?,
        })
    }
}

impl SecondaryPeril for AkhlagiEtAl2021LiquefactionA {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn outputs(&self) -> &[Imt] {
        &self.outputs
    }

    fn compute(
        &self,
        _magnitude: f64,
        imt_gmf: &[(Imt, &[f64])],
        sites: &SiteCollection,
        subset: &FilteredSites,
    ) -> Result<Vec<PerilOutput>, ConfigError> {
        let mut out = Vec::new();
        for (imt, gmf) in imt_gmf {
            if *imt != Imt::Pgv {
                continue;
            }
            let values = subset
                .iter(sites)
                .zip(gmf.iter())
                .map(|(site, &pgv)| {
                    akhlagi_etal_2021_model_a(
                        pgv,
                        site.tri,
                        site.dc,
                        site.dr,
                        site.zwb,
                        &self.coeffs,
                    )
                })
                .collect();
            out.push(PerilOutput {
                imt: Imt::LiqProb,
                values,
            });
        }
        Ok(out)
    }
}

/// Bozzoni et al. (2021) liquefaction probability calibrated for Europe.
#[derive(Clone, Debug)]
pub struct Bozzoni2021LiquefactionEurope {
    coeffs: Bozzoni2021Coeffs,
    outputs: Vec<Imt>,
}

impl Bozzoni2021LiquefactionEurope {
    /// Registry name.
    pub const NAME: &'static str = "Bozzoni2021LiquefactionEurope";

    const RECOGNIZED: &'static [&'static str] =
        &["intercept", "pgam_coeff", "cti_coeff", "vs30_coeff"];

    /// Build from named parameters.
    ///
    /// # Errors
    ///
    /// Unknown or mistyped parameters fail fast with a [`ConfigError`].
    pub fn from_params(params: &PerilParams) -> Result<Self, ConfigError> {
        let p = ModelParams::new(Self::NAME, params, Self::RECOGNIZED)?;
        Ok(Self {
            coeffs: Bozzoni2021Coeffs {
                intercept: p.num("intercept", -11.489)?,
                pgam_coeff: p.num("pgam_coeff", 3.864)?,
                cti_coeff: p.num("cti_coeff", 2.328)?,
                vs30_coeff: p.num("vs30_coeff", -0.091)?,
            },
            outputs: parse_outputs(Self::NAME, &["LiqProb"])?,
        })
    }
}

impl SecondaryPeril for Bozzoni2021LiquefactionEurope {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn outputs(&self) -> &[Imt] {
        &self.outputs
    }

    fn compute(
        &self,
        magnitude: f64,
        imt_gmf: &[(Imt, &[f64])],
        sites: &SiteCollection,
        subset: &FilteredSites,
    ) -> Result<Vec<PerilOutput>, ConfigError> {
        let mut out = Vec::new();
        for (imt, gmf) in imt_gmf {
            if *imt != Imt::Pga {
                continue;
            }
            let values = subset
                .iter(sites)
                .zip(gmf.iter())
                .map(|(site, &pga)| {
                    bozzoni_etal_2021_europe(pga, magnitude, site.cti, site.vs30, &self.coeffs)
                })
                .collect();
            out.push(PerilOutput {
                imt: Imt::LiqProb,
                values,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use temblor_core::{Site, SiteId};

    fn wet_sites() -> SiteCollection {
        let mut a = Site::new(SiteId(0), 0.0, 0.0);
        a.vs30 = 250.0;
        a.cti = 6.0;
        a.gwd = 1.0;
        a.dw = 0.5;
        a.precip = 1200.0;
        SiteCollection::new(vec![a])
    }

    #[test]
    fn zhu_2015_emits_probability_for_pga() {
        let model = ZhuEtAl2015LiquefactionGeneral::from_params(&PerilParams::new()).unwrap();
        let sites = wet_sites();
        let subset = sites.filter_by_distance(0.0, 0.0, None).unwrap();
        let gmf = vec![0.4];
        let out = model
            .compute(7.5, &[(Imt::Pga, &gmf)], &sites, &subset)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].imt, Imt::LiqProb);
        assert!((0.0..=1.0).contains(&out[0].values[0]));
    }

    #[test]
    fn pgv_models_skip_pga_only_calls() {
        let sites = wet_sites();
        let subset = sites.filter_by_distance(0.0, 0.0, None).unwrap();
        let gmf = vec![0.4];
        let imt_gmf = [(Imt::Pga, gmf.as_slice())];

        let general = ZhuEtAl2017LiquefactionGeneral::from_params(&PerilParams::new()).unwrap();
        assert!(general.compute(7.0, &imt_gmf, &sites, &subset).unwrap().is_empty());

        let coastal = ZhuEtAl2017LiquefactionCoastal::from_params(&PerilParams::new()).unwrap();
        assert!(coastal.compute(7.0, &imt_gmf, &sites, &subset).unwrap().is_empty());

        let akhlagi = AkhlagiEtAl2021LiquefactionA::from_params(&PerilParams::new()).unwrap();
        assert!(akhlagi.compute(7.0, &imt_gmf, &sites, &subset).unwrap().is_empty());
    }

    #[test]
    fn zhu_2017_general_emits_for_pgv() {
        let model = ZhuEtAl2017LiquefactionGeneral::from_params(&PerilParams::new()).unwrap();
        let sites = wet_sites();
        let subset = sites.filter_by_distance(0.0, 0.0, None).unwrap();
        let gmf = vec![35.0];
        let out = model
            .compute(7.0, &[(Imt::Pgv, &gmf)], &sites, &subset)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].values[0] > 0.0);
    }

    #[test]
    fn zhu_2017_general_default_coefficients() {
        // The conditioned modifications trade these two; the plain
        // general model keeps the 2017 calibration.
        let model = ZhuEtAl2017LiquefactionGeneral::from_params(&PerilParams::new()).unwrap();
        assert_eq!(model.coeffs.dw_coeff, -0.2054);
        assert_eq!(model.coeffs.wtd_coeff, -0.0333);
    }
}

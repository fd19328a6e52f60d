//! Liquefaction models conditioned on both PGA and PGV.
//!
//! Unlike the single-measure models, these two declare PGA and PGV
//! jointly mandatory: the PGA gate and the PGV predictor are both part
//! of the published model, so running with only one available is a
//! configuration error, raised per rupture rather than silently skipped.

use temblor_core::{ConfigError, FilteredSites, Imt, SiteCollection};

use crate::liquefaction::{allstadt_etal_2022, rashidian_baise_2020, Zhu2017GeneralCoeffs};
use crate::params::{ModelParams, PerilParams};
use crate::{parse_outputs, PerilOutput, SecondaryPeril};

const RECOGNIZED_RASHIDIAN: &[&str] = &[
    "intercept",
    "pgv_scaling_factor",
    "pgv_coeff",
    "vs30_coeff",
    "dw_coeff",
    "wtd_coeff",
    "precip_coeff",
];

// No pgv_scaling_factor: Allstadt et al. replace the PGV scaling with
// the magnitude weighting, so the knob does not exist on this model.
const RECOGNIZED_ALLSTADT: &[&str] = &[
    "intercept",
    "pgv_coeff",
    "vs30_coeff",
    "dw_coeff",
    "wtd_coeff",
    "precip_coeff",
];

/// Default coefficients shared by the two conditioned modifications.
///
/// Relative to the plain Zhu et al. (2017) general calibration the
/// distance-to-water and water-table terms trade coefficients: both
/// modifications put -0.0333 on `dw` and -0.2054 on `wtd`.
fn coeffs_from(p: &ModelParams<'_>) -> Result<Zhu2017GeneralCoeffs, ConfigError> {
    Ok(Zhu2017GeneralCoeffs {
        intercept: p.num("intercept", 8.801)?,
        pgv_scaling_factor: p.num("pgv_scaling_factor", 1.0)?,
        pgv_coeff: p.num("pgv_coeff", 0.334)?,
        vs30_coeff: p.num("vs30_coeff", -1.918)?,
        dw_coeff: p.num("dw_coeff", -0.0333)?,
        wtd_coeff: p.num("wtd_coeff", -0.2054)?,
        precip_coeff: p.num("precip_coeff", 0.0005408)?,
    })
}

/// Pull the mandatory PGA and PGV vectors out of the available pairs.
///
/// # Errors
///
/// [`ConfigError::MandatoryImtMissing`] naming the first absent measure.
fn mandatory_pga_pgv<'a>(
    model: &str,
    imt_gmf: &[(Imt, &'a [f64])],
) -> Result<(&'a [f64], &'a [f64]), ConfigError> {
    let mut pga = None;
    let mut pgv = None;
    for (imt, gmf) in imt_gmf {
        match imt {
            Imt::Pga => pga = Some(*gmf),
            Imt::Pgv => pgv = Some(*gmf),
            _ => {}
        }
    }
    let missing = |imt| ConfigError::MandatoryImtMissing {
        model: model.to_string(),
        imt,
    };
    Ok((
        pga.ok_or_else(|| missing(Imt::Pga))?,
        pgv.ok_or_else(|| missing(Imt::Pgv))?,
    ))
}

/// Rashidian & Baise (2020): Zhu 2017 general gated on PGA with a PGV
/// saturation cap. Requires both PGA and PGV.
#[derive(Clone, Debug)]
pub struct RashidianBaise2020Liquefaction {
    coeffs: Zhu2017GeneralCoeffs,
    outputs: Vec<Imt>,
}

impl RashidianBaise2020Liquefaction {
    /// Registry name.
    pub const NAME: &'static str = "RashidianBaise2020Liquefaction";

    /// Build from named parameters.
    ///
    /// # Errors
    ///
    /// Unknown or mistyped parameters fail fast with a [`ConfigError`].
    pub fn from_params(params: &PerilParams) -> Result<Self, ConfigError> {
        let p = ModelParams::new(Self::NAME, params, RECOGNIZED_RASHIDIAN)?;
        Ok(Self {
            coeffs: coeffs_from(&p)?,
            outputs: parse_outputs(Self::NAME, &["LiqProb"])?,
        })
    }
}

impl SecondaryPeril for RashidianBaise2020Liquefaction {
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
        let (pga, pgv) = mandatory_pga_pgv(Self::NAME, imt_gmf)?;
        let values = subset
            .iter(sites)
            .zip(pga.iter().zip(pgv.iter()))
            .map(|(site, (&pga, &pgv))| {
                rashidian_baise_2020(
                    pga,
                    pgv,
                    site.vs30,
                    site.dw,
                    site.gwd,
                    site.precip,
                    &self.coeffs,
                )
            })
            .collect();
        Ok(vec![PerilOutput {
            imt: Imt::LiqProb,
            values,
        }])
    }
}

/// Allstadt et al. (2022): Rashidian & Baise with magnitude-weighted
/// PGV. Requires both PGA and PGV.
#[derive(Clone, Debug)]
pub struct AllstadtEtAl2022Liquefaction {
    coeffs: Zhu2017GeneralCoeffs,
    outputs: Vec<Imt>,
}

impl AllstadtEtAl2022Liquefaction {
    /// Registry name.
    pub const NAME: &'static str = "AllstadtEtAl2022Liquefaction";

    /// Build from named parameters.
    ///
    /// # Errors
    ///
    /// Unknown or mistyped parameters fail fast with a [`ConfigError`].
    pub fn from_params(params: &PerilParams) -> Result<Self, ConfigError> {
        let p = ModelParams::new(Self::NAME, params, RECOGNIZED_ALLSTADT)?;
        Ok(Self {
            coeffs: coeffs_from(&p)?,
            outputs: parse_outputs(Self::NAME, &["LiqProb"])?,
        })
    }
}

impl SecondaryPeril for AllstadtEtAl2022Liquefaction {
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
        let (pga, pgv) = mandatory_pga_pgv(Self::NAME, imt_gmf)?;
        let values = subset
            .iter(sites)
            .zip(pga.iter().zip(pgv.iter()))
            .map(|(site, (&pga, &pgv))| {
                allstadt_etal_2022(
                    pga,
                    pgv,
                    magnitude,
                    site.vs30,
                    site.dw,
                    site.gwd,
                    site.precip,
                    &self.coeffs,
                )
            })
            .collect();
        Ok(vec![PerilOutput {
            imt: Imt::LiqProb,
            values,
        }])
    }
}

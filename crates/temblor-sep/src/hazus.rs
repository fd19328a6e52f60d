//! HAZUS liquefaction probability and permanent ground deformation.

use temblor_core::{ConfigError, FilteredSites, Imt, SiteCollection};

use crate::liquefaction::{
    hazus_lateral_spreading_displacement, hazus_liquefaction_probability,
    hazus_vertical_settlement,
};
use crate::params::{ModelParams, PerilParams};
use crate::{parse_outputs, PerilOutput, SecondaryPeril};

/// HAZUS liquefaction probability from PGA.
#[derive(Clone, Debug)]
pub struct HazusLiquefaction {
    map_proportion: bool,
    outputs: Vec<Imt>,
}

impl HazusLiquefaction {
    /// Registry name.
    pub const NAME: &'static str = "HazusLiquefaction";

    const RECOGNIZED: &'static [&'static str] = &["map_proportion_flag"];

    /// Build from named parameters.
    ///
    /// `map_proportion_flag` (default 1) scales the probability by the
    /// susceptible proportion of the map unit; pass 0 to disable.
    ///
    /// # Errors
    ///
    /// Unknown or mistyped parameters fail fast with a [`ConfigError`].
    pub fn from_params(params: &PerilParams) -> Result<Self, ConfigError> {
        let p = ModelParams::new(Self::NAME, params, Self::RECOGNIZED)?;
        Ok(Self {
            map_proportion: p.num("map_proportion_flag", 1.0)? != 0.0,
            outputs: parse_outputs(Self::NAME, &["LiqProb"])?,
        })
    }
}

impl SecondaryPeril for HazusLiquefaction {
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
            let values: Vec<f64> = subset
                .iter(sites)
                .zip(gmf.iter())
                .map(|(site, &pga)| {
                    hazus_liquefaction_probability(
                        pga,
                        magnitude,
                        site.liq_susc,
                        site.gwd,
                        self.map_proportion,
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

/// HAZUS permanent ground deformation from PGA.
///
/// Combines lateral spreading with vertical settlement into either the
/// per-site maximum (`PGDMax`, the default) or the geometric mean
/// (`PGDGeomMean`), selected by the `deformation_component` parameter.
/// Results come out in metres unless `return_unit` is set to `in`.
#[derive(Clone, Debug)]
pub struct HazusDeformation {
    component: Imt,
    unit_scale: f64,
    outputs: Vec<Imt>,
}

impl HazusDeformation {
    /// Registry name.
    pub const NAME: &'static str = "HazusDeformation";

    const RECOGNIZED: &'static [&'static str] = &["return_unit", "deformation_component"];

    /// Build from named parameters.
    ///
    /// # Errors
    ///
    /// Fails fast on an unknown parameter, a `deformation_component`
    /// that is not `PGDMax` or `PGDGeomMean`, or a `return_unit` that
    /// is not `m` or `in`.
    pub fn from_params(params: &PerilParams) -> Result<Self, ConfigError> {
        let p = ModelParams::new(Self::NAME, params, Self::RECOGNIZED)?;
        let unit = p.str("return_unit", "m")?;
        let unit_scale = match unit.as_str() {
            "m" => 1.0,
            "in" => 1.0 / 0.0254,
            _ => {
                return Err(ConfigError::InvalidPerilParam {
                    model: Self::NAME.to_string(),
                    param: "return_unit".to_string(),
                    reason: format!("expected m or in, got {unit}"),
                })
            }
        };
        let component_name = p.str("deformation_component", "PGDMax")?;
        let outputs = parse_outputs(Self::NAME, &[component_name.as_str()])?;
        let component = outputs[0];
        if component != Imt::PgdMax && component != Imt::PgdGeomMean {
            return Err(ConfigError::InvalidPerilParam {
                model: Self::NAME.to_string(),
                param: "deformation_component".to_string(),
                reason: format!("expected PGDMax or PGDGeomMean, got {component_name}"),
            });
        }
        Ok(Self {
            component,
            unit_scale,
            outputs,
        })
    }

    fn combine(&self, lateral: f64, vertical: f64) -> f64 {
        match self.component {
            Imt::PgdGeomMean => (lateral * vertical).max(0.0).sqrt(),
            _ => lateral.max(vertical),
        }
    }
}

impl SecondaryPeril for HazusDeformation {
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
            let values: Vec<f64> = subset
                .iter(sites)
                .zip(gmf.iter())
                .map(|(site, &pga)| {
                    let lateral =
                        hazus_lateral_spreading_displacement(magnitude, pga, site.liq_susc);
                    let vertical = hazus_vertical_settlement(site.liq_susc);
                    self.unit_scale * self.combine(lateral, vertical)
                })
                .collect();
            out.push(PerilOutput {
                imt: self.component,
                values,
            });
        }
        Ok(out)
    }
}

//! Explicit name → constructor registry for secondary-peril models.
//!
//! The table is a plain match built at compile time; there is no runtime
//! class discovery. Instantiation validates everything up front
//! (names, parameter keys, parameter types, declared output IMTs), so
//! configuration errors surface before any simulation work starts.

use temblor_core::ConfigError;

use crate::conditioned::{AllstadtEtAl2022Liquefaction, RashidianBaise2020Liquefaction};
use crate::hazus::{HazusDeformation, HazusLiquefaction};
use crate::newmark::NewmarkDisplacement;
use crate::params::PerilParams;
use crate::zhu::{
    AkhlagiEtAl2021LiquefactionA, Bozzoni2021LiquefactionEurope, ZhuEtAl2015LiquefactionGeneral,
    ZhuEtAl2017LiquefactionCoastal, ZhuEtAl2017LiquefactionGeneral,
};
use crate::SecondaryPeril;

/// Names of every registered model, in registry order.
pub fn supported_models() -> &'static [&'static str] {
    &[
        NewmarkDisplacement::NAME,
        HazusLiquefaction::NAME,
        HazusDeformation::NAME,
        ZhuEtAl2015LiquefactionGeneral::NAME,
        ZhuEtAl2017LiquefactionGeneral::NAME,
        ZhuEtAl2017LiquefactionCoastal::NAME,
        RashidianBaise2020Liquefaction::NAME,
        AllstadtEtAl2022Liquefaction::NAME,
        AkhlagiEtAl2021LiquefactionA::NAME,
        Bozzoni2021LiquefactionEurope::NAME,
    ]
}

fn build(name: &str, params: &PerilParams) -> Result<Box<dyn SecondaryPeril>, ConfigError> {
    Ok(match name {
        NewmarkDisplacement::NAME => Box::new(NewmarkDisplacement::from_params(params)?),
        HazusLiquefaction::NAME => Box::new(HazusLiquefaction::from_params(params)?),
        HazusDeformation::NAME => Box::new(HazusDeformation::from_params(params)?),
        ZhuEtAl2015LiquefactionGeneral::NAME => {
            Box::new(ZhuEtAl2015LiquefactionGeneral::from_params(params)?)
        }
        ZhuEtAl2017LiquefactionGeneral::NAME => {
            Box::new(ZhuEtAl2017LiquefactionGeneral::from_params(params)?)
        }
        ZhuEtAl2017LiquefactionCoastal::NAME => {
            Box::new(ZhuEtAl2017LiquefactionCoastal::from_params(params)?)
        }
        RashidianBaise2020Liquefaction::NAME => {
            Box::new(RashidianBaise2020Liquefaction::from_params(params)?)
        }
        AllstadtEtAl2022Liquefaction::NAME => {
            Box::new(AllstadtEtAl2022Liquefaction::from_params(params)?)
        }
        AkhlagiEtAl2021LiquefactionA::NAME => {
            Box::new(AkhlagiEtAl2021LiquefactionA::from_params(params)?)
        }
        Bozzoni2021LiquefactionEurope::NAME => {
            Box::new(Bozzoni2021LiquefactionEurope::from_params(params)?)
        }
        other => return Err(ConfigError::UnknownPeril(other.to_string())),
    })
}

/// Instantiate the requested models by name.
///
/// # Errors
///
/// Fails fast on the first unknown model name, unrecognized parameter,
/// mistyped parameter, or invalid declared output.
pub fn instantiate(
    names: &[String],
    params: &PerilParams,
) -> Result<Vec<Box<dyn SecondaryPeril>>, ConfigError> {
    names.iter().map(|name| build(name, params)).collect()
}

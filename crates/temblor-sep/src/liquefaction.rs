//! Liquefaction probability and deformation functions.
//!
//! Pure per-site functions shared by the model structs in this crate.
//! Coefficients always arrive as arguments so the model constructors can
//! override the published defaults from job parameters.
//!
//! The logistic-regression family (Zhu et al., Rashidian & Baise,
//! Allstadt et al., Akhlagi et al., Bozzoni et al.) all reduce to
//! `p = 1 / (1 + exp(-X))` over a model-specific linear predictor `X`.

use temblor_core::LiqSusceptibility;

/// Standard logistic function.
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Magnitude-scaled PGA used by the Zhu 2015 / Bozzoni 2021 predictors:
/// `pga * mag^2.56 / 10^2.24`.
pub fn magnitude_scaled_pga(pga: f64, mag: f64) -> f64 {
    pga * mag.powf(2.56) / 10f64.powf(2.24)
}

// ── HAZUS ──────────────────────────────────────────────────────────

/// Peak ground acceleration (g) below which HAZUS assigns zero
/// liquefaction probability, per susceptibility category.
pub fn hazus_pga_threshold(susc: LiqSusceptibility) -> f64 {
    match susc {
        LiqSusceptibility::None => f64::INFINITY,
        LiqSusceptibility::VeryLow => 0.26,
        LiqSusceptibility::Low => 0.21,
        LiqSusceptibility::Moderate => 0.15,
        LiqSusceptibility::High => 0.12,
        LiqSusceptibility::VeryHigh => 0.09,
    }
}

/// Proportion of a map unit susceptible to liquefaction, per category.
fn hazus_map_proportion(susc: LiqSusceptibility) -> f64 {
    match susc {
        LiqSusceptibility::None => 0.0,
        LiqSusceptibility::VeryLow => 0.02,
        LiqSusceptibility::Low => 0.05,
        LiqSusceptibility::Moderate => 0.10,
        LiqSusceptibility::High => 0.20,
        LiqSusceptibility::VeryHigh => 0.25,
    }
}

/// Conditional liquefaction probability given PGA, before the magnitude
/// and groundwater corrections (linear in PGA, clamped to [0, 1]).
fn hazus_conditional_probability(pga: f64, susc: LiqSusceptibility) -> f64 {
    let (slope, intercept) = match susc {
        LiqSusceptibility::None => return 0.0,
        LiqSusceptibility::VeryLow => (4.16, 1.08),
        LiqSusceptibility::Low => (5.57, 1.18),
        LiqSusceptibility::Moderate => (6.67, 1.0),
        LiqSusceptibility::High => (7.67, 0.92),
        LiqSusceptibility::VeryHigh => (9.09, 0.82),
    };
    (slope * pga - intercept).clamp(0.0, 1.0)
}

/// HAZUS liquefaction probability for one site.
///
/// Combines the conditional probability given PGA with the moment
/// magnitude correction `Km`, the groundwater-depth correction `Kw`
/// (depth in metres, converted to feet internally), and optionally the
/// susceptible map proportion.
pub fn hazus_liquefaction_probability(
    pga: f64,
    mag: f64,
    susc: LiqSusceptibility,
    groundwater_depth: f64,
    map_proportion: bool,
) -> f64 {
    if pga < hazus_pga_threshold(susc) {
        return 0.0;
    }
    let p_cond = hazus_conditional_probability(pga, susc);
    let km = 0.0027 * mag.powi(3) - 0.0267 * mag.powi(2) - 0.2055 * mag + 2.9188;
    let kw = 0.022 * (groundwater_depth * 3.2808) + 0.93;
    let mut p = p_cond / (km * kw);
    if map_proportion {
        p *= hazus_map_proportion(susc);
    }
    p.clamp(0.0, 1.0)
}

/// Expected HAZUS lateral spreading displacement in metres.
///
/// Displacement scales with `pga / pga_threshold` through the HAZUS
/// piecewise-linear ratio curve (in inches) and the magnitude factor
/// `K_delta`.
pub fn hazus_lateral_spreading_displacement(
    mag: f64,
    pga: f64,
    susc: LiqSusceptibility,
) -> f64 {
    let threshold = hazus_pga_threshold(susc);
    if !threshold.is_finite() {
        return 0.0;
    }
    let r = pga / threshold;
    let inches = if r <= 1.0 {
        0.0
    } else if r <= 2.0 {
        12.0 * r - 12.0
    } else if r <= 3.0 {
        18.0 * r - 24.0
    } else {
        70.0 * r - 180.0
    };
    let k_delta = 0.0086 * mag.powi(3) - 0.0914 * mag.powi(2) + 0.4698 * mag - 0.9835;
    (k_delta * inches * 0.0254).max(0.0)
}

/// Expected HAZUS vertical settlement in metres, per category.
pub fn hazus_vertical_settlement(susc: LiqSusceptibility) -> f64 {
    let inches = match susc {
        LiqSusceptibility::None | LiqSusceptibility::VeryLow => 0.0,
        LiqSusceptibility::Low => 1.0,
        LiqSusceptibility::Moderate => 2.0,
        LiqSusceptibility::High => 6.0,
        LiqSusceptibility::VeryHigh => 12.0,
    };
    inches * 0.0254
}

// ── Logistic-regression family ─────────────────────────────────────

/// Coefficients of the Zhu et al. (2015) general model.
#[derive(Clone, Copy, Debug)]
pub struct Zhu2015Coeffs {
    /// Linear-predictor intercept.
    pub intercept: f64,
    /// Coefficient of ln(magnitude-scaled PGA).
    pub pgam_coeff: f64,
    /// Coefficient of the compound topographic index.
    pub cti_coeff: f64,
    /// Coefficient of ln(vs30).
    pub vs30_coeff: f64,
}

/// Zhu et al. (2015) general liquefaction probability from PGA.
pub fn zhu_etal_2015_general(pga: f64, mag: f64, cti: f64, vs30: f64, c: &Zhu2015Coeffs) -> f64 {
    if pga <= 0.0 || vs30 <= 0.0 {
        return 0.0;
    }
    let x = c.intercept
        + c.pgam_coeff * magnitude_scaled_pga(pga, mag).ln()
        + c.cti_coeff * cti
        + c.vs30_coeff * vs30.ln();
    logistic(x)
}

/// Coefficients of the Zhu et al. (2017) general model.
#[derive(Clone, Copy, Debug)]
pub struct Zhu2017GeneralCoeffs {
    /// Linear-predictor intercept.
    pub intercept: f64,
    /// Multiplier applied to PGV before taking its log.
    pub pgv_scaling_factor: f64,
    /// Coefficient of ln(PGV).
    pub pgv_coeff: f64,
    /// Coefficient of ln(vs30).
    pub vs30_coeff: f64,
    /// Coefficient of distance to the nearest water body (km).
    pub dw_coeff: f64,
    /// Coefficient of the water-table depth (m).
    pub wtd_coeff: f64,
    /// Coefficient of mean annual precipitation (mm).
    pub precip_coeff: f64,
}

/// Zhu et al. (2017) general liquefaction probability from PGV.
pub fn zhu_etal_2017_general(
    pgv: f64,
    vs30: f64,
    dw: f64,
    wtd: f64,
    precip: f64,
    c: &Zhu2017GeneralCoeffs,
) -> f64 {
    let pgv = pgv * c.pgv_scaling_factor;
    if pgv <= 0.0 || vs30 <= 0.0 {
        return 0.0;
    }
    let x = c.intercept
        + c.pgv_coeff * pgv.ln()
        + c.vs30_coeff * vs30.ln()
        + c.dw_coeff * dw
        + c.wtd_coeff * wtd
        + c.precip_coeff * precip;
    logistic(x)
}

/// Coefficients of the Zhu et al. (2017) coastal model.
#[derive(Clone, Copy, Debug)]
pub struct Zhu2017CoastalCoeffs {
    /// Linear-predictor intercept.
    pub intercept: f64,
    /// Coefficient of ln(PGV).
    pub pgv_coeff: f64,
    /// Coefficient of ln(vs30).
    pub vs30_coeff: f64,
    /// Coefficient of distance to the nearest river (km).
    pub dr_coeff: f64,
    /// Coefficient of distance to the coast (km).
    pub dc_coeff: f64,
    /// Coefficient of the river-coast interaction term (dr * dc).
    pub dcdr_coeff: f64,
    /// Coefficient of mean annual precipitation (mm).
    pub precip_coeff: f64,
}

/// Zhu et al. (2017) coastal liquefaction probability from PGV.
pub fn zhu_etal_2017_coastal(
    pgv: f64,
    vs30: f64,
    dr: f64,
    dc: f64,
    precip: f64,
    c: &Zhu2017CoastalCoeffs,
) -> f64 {
    if pgv <= 0.0 || vs30 <= 0.0 {
        return 0.0;
    }
    let x = c.intercept
        + c.pgv_coeff * pgv.ln()
        + c.vs30_coeff * vs30.ln()
        + c.dr_coeff * dr
        + c.dc_coeff * dc
        + c.dcdr_coeff * dr * dc
        + c.precip_coeff * precip;
    logistic(x)
}

/// PGV saturation cap (cm/s) applied by the Rashidian & Baise (2020)
/// and Allstadt et al. (2022) modifications.
pub const PGV_CAP_CM_S: f64 = 150.0;

/// PGA gate (g) below which the conditioned models report zero
/// probability.
pub const PGA_GATE_G: f64 = 0.1;

/// Rashidian & Baise (2020): Zhu 2017 general conditioned on PGA.
///
/// PGV saturates at [`PGV_CAP_CM_S`]; sites with `pga` below
/// [`PGA_GATE_G`] cannot liquefy and report zero.
pub fn rashidian_baise_2020(
    pga: f64,
    pgv: f64,
    vs30: f64,
    dw: f64,
    wtd: f64,
    precip: f64,
    c: &Zhu2017GeneralCoeffs,
) -> f64 {
    if pga < PGA_GATE_G {
        return 0.0;
    }
    zhu_etal_2017_general(pgv.min(PGV_CAP_CM_S), vs30, dw, wtd, precip, c)
}

/// Allstadt et al. (2022): Rashidian & Baise with magnitude-weighted PGV.
///
/// PGV is de-weighted for small magnitudes through a logistic ramp
/// centred at Mw 6 before the capped Zhu 2017 predictor is applied.
pub fn allstadt_etal_2022(
    pga: f64,
    pgv: f64,
    mag: f64,
    vs30: f64,
    dw: f64,
    wtd: f64,
    precip: f64,
    c: &Zhu2017GeneralCoeffs,
) -> f64 {
    if pga < PGA_GATE_G {
        return 0.0;
    }
    let pgv_weighted = pgv / (1.0 + (-2.0 * (mag - 6.0)).exp());
    zhu_etal_2017_general(pgv_weighted.min(PGV_CAP_CM_S), vs30, dw, wtd, precip, c)
}

/// Coefficients of the Akhlagi et al. (2021) model A.
#[derive(Clone, Copy, Debug)]
pub struct Akhlagi2021Coeffs {
    /// Linear-predictor intercept.
    pub intercept: f64,
    /// Coefficient of ln(PGV).
    pub pgv_coeff: f64,
    /// Coefficient of sqrt(topographic roughness index).
    pub tri_coeff: f64,
    /// Coefficient of ln(distance to coast + 1).
    pub dc_coeff: f64,
    /// Coefficient of ln(distance to river + 1).
    pub dr_coeff: f64,
    /// Coefficient of sqrt(water body depth).
    pub zwb_coeff: f64,
}

/// Akhlagi et al. (2021) model A liquefaction probability from PGV.
pub fn akhlagi_etal_2021_model_a(
    pgv: f64,
    tri: f64,
    dc: f64,
    dr: f64,
    zwb: f64,
    c: &Akhlagi2021Coeffs,
) -> f64 {
    if pgv <= 0.0 {
        return 0.0;
    }
    let x = c.intercept
        + c.pgv_coeff * pgv.ln()
        + c.tri_coeff * tri.max(0.0).sqrt()
        + c.dc_coeff * (dc + 1.0).ln()
        + c.dr_coeff * (dr + 1.0).ln()
        + c.zwb_coeff * zwb.max(0.0).sqrt();
    logistic(x)
}

/// Coefficients of the Bozzoni et al. (2021) European model.
#[derive(Clone, Copy, Debug)]
pub struct Bozzoni2021Coeffs {
    /// Linear-predictor intercept.
    pub intercept: f64,
    /// Coefficient of ln(magnitude-scaled PGA).
    pub pgam_coeff: f64,
    /// Coefficient of the compound topographic index.
    pub cti_coeff: f64,
    /// Coefficient of ln(vs30).
    pub vs30_coeff: f64,
}

/// Bozzoni et al. (2021) liquefaction probability calibrated for Europe.
pub fn bozzoni_etal_2021_europe(
    pga: f64,
    mag: f64,
    cti: f64,
    vs30: f64,
    c: &Bozzoni2021Coeffs,
) -> f64 {
    if pga <= 0.0 || vs30 <= 0.0 {
        return 0.0;
    }
    let x = c.intercept
        + c.pgam_coeff * magnitude_scaled_pga(pga, mag).ln()
        + c.cti_coeff * cti
        + c.vs30_coeff * vs30.ln();
    logistic(x)
}

//! Slope-stability and Newmark displacement functions.
//!
//! Pure per-site functions backing [`NewmarkDisplacement`](crate::NewmarkDisplacement).
//! The static factor of safety and the critical acceleration depend only
//! on site attributes, so the model caches them as derived columns in its
//! `prepare` step and `compute` touches only the ground motion.

/// Gravitational acceleration (m/s^2).
const G: f64 = 9.81;

/// Unit weight of water (kN/m^3).
const GAMMA_W: f64 = 9.81;

/// Assumed failure-slab thickness (m) for the infinite-slope model.
const SLAB_THICKNESS_M: f64 = 2.5;

/// Minimum slope angle (degrees) used in the stability terms.
///
/// Flat cells would otherwise divide by zero; clamping makes them come
/// out with a very large factor of safety, i.e. stable, which is the
/// intended result.
const MIN_SLOPE_DEG: f64 = 0.05;

/// Static factor of safety of an infinite slope.
///
/// `slope` in degrees, `cohesion` in kPa, `friction_angle` in degrees,
/// `saturation` as the saturated fraction of the slab (0..1),
/// `dry_density` in kg/m^3. Values above 1 indicate a statically stable
/// slope.
pub fn static_factor_of_safety(
    slope: f64,
    cohesion: f64,
    friction_angle: f64,
    saturation: f64,
    dry_density: f64,
) -> f64 {
    let alpha = slope.max(MIN_SLOPE_DEG).to_radians();
    let phi = friction_angle.to_radians();
    let gamma = dry_density * G / 1000.0; // kN/m^3
    let cohesion_term = cohesion / (gamma * SLAB_THICKNESS_M * alpha.sin());
    let friction_term = phi.tan() / alpha.tan();
    let pore_pressure_term = saturation * GAMMA_W * phi.tan() / (gamma * alpha.tan());
    cohesion_term + friction_term - pore_pressure_term
}

/// Newmark critical acceleration in g.
///
/// The horizontal acceleration required to initiate sliding:
/// `(Fs - 1) * sin(slope)`, floored at zero for slopes already at or
/// past static failure.
pub fn newmark_critical_accel(factor_of_safety: f64, slope: f64) -> f64 {
    ((factor_of_safety - 1.0) * slope.max(MIN_SLOPE_DEG).to_radians().sin()).max(0.0)
}

/// Newmark displacement (m) from PGA and moment magnitude.
///
/// Jibson-style regression:
/// `log10(Dn_cm) = c1 + log10((1 - r)^c2 * r^c3) + c4 * mag` with
/// `r = crit_accel / pga`. Ruptures whose shaking does not exceed the
/// critical acceleration (`r >= 1`) produce zero displacement, as do
/// slopes whose critical acceleration falls below `crit_accel_threshold`
/// (treated as numerically unstable flat terrain rather than failures).
#[allow(clippy::too_many_arguments)]
pub fn newmark_displ_from_pga_mag(
    pga: f64,
    crit_accel: f64,
    mag: f64,
    c1: f64,
    c2: f64,
    c3: f64,
    c4: f64,
    crit_accel_threshold: f64,
) -> f64 {
    if pga <= 0.0 || crit_accel < crit_accel_threshold {
        return 0.0;
    }
    let r = crit_accel / pga;
    if r >= 1.0 {
        return 0.0;
    }
    let log_dn = c1 + ((1.0 - r).powf(c2) * r.powf(c3)).log10() + c4 * mag;
    10f64.powf(log_dn) / 100.0 // cm -> m
}

/// Probability of slope failure given a Newmark displacement (m).
///
/// Jibson et al. (2000) calibration: `0.335 * (1 - exp(-0.048 * Dn_cm^1.565))`.
pub fn prob_failure_given_displacement(displacement: f64) -> f64 {
    let dn_cm = displacement * 100.0;
    if dn_cm <= 0.0 {
        return 0.0;
    }
    0.335 * (1.0 - (-0.048 * dn_cm.powf(1.565)).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_terrain_is_stable() {
        let fs = static_factor_of_safety(0.0, 20.0, 30.0, 0.3, 1500.0);
        assert!(fs > 10.0, "flat terrain should come out very stable, got {fs}");
    }

    #[test]
    fn steeper_slopes_are_less_stable() {
        let gentle = static_factor_of_safety(10.0, 20.0, 30.0, 0.3, 1500.0);
        let steep = static_factor_of_safety(40.0, 20.0, 30.0, 0.3, 1500.0);
        assert!(steep < gentle);
    }

    #[test]
    fn critical_accel_floors_at_zero() {
        assert_eq!(newmark_critical_accel(0.8, 30.0), 0.0);
        assert!(newmark_critical_accel(1.5, 30.0) > 0.0);
    }

    #[test]
    fn no_displacement_below_critical_accel() {
        let d = newmark_displ_from_pga_mag(0.1, 0.2, 7.0, -2.71, 2.335, -1.478, 0.424, 0.05);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn displacement_grows_with_shaking() {
        let d1 = newmark_displ_from_pga_mag(0.3, 0.1, 7.0, -2.71, 2.335, -1.478, 0.424, 0.05);
        let d2 = newmark_displ_from_pga_mag(0.6, 0.1, 7.0, -2.71, 2.335, -1.478, 0.424, 0.05);
        assert!(d2 > d1);
        assert!(d1 > 0.0);
    }

    #[test]
    fn failure_probability_saturates_at_0_335() {
        assert_eq!(prob_failure_given_displacement(0.0), 0.0);
        let p = prob_failure_given_displacement(10.0);
        assert!(p > 0.33 && p <= 0.335);
    }
}

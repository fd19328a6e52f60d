//! Intensity measure types.
//!
//! An IMT names a shaking metric: the primary measures produced by
//! ground-shaking models (PGA, PGV, spectral acceleration) and the
//! IMT-like output columns declared by secondary-peril models
//! (liquefaction probability, Newmark displacement, permanent ground
//! deformation). Secondary-peril output names are validated through
//! [`Imt::from_string`] at registry-construction time, so a misdeclared
//! output is a startup failure rather than a runtime surprise.

use std::error::Error;
use std::fmt;

/// A named intensity measure.
///
/// Spectral acceleration stores its period in integer milliseconds so the
/// type stays `Eq + Hash` and usable as an accumulator key; `SA(0.5)`
/// round-trips exactly for any period with millisecond resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Imt {
    /// Peak ground acceleration (g).
    Pga,
    /// Peak ground velocity (cm/s).
    Pgv,
    /// Spectral acceleration at a period, stored in milliseconds.
    Sa {
        /// Oscillator period in milliseconds.
        period_ms: u32,
    },
    /// Liquefaction probability (secondary peril output).
    LiqProb,
    /// Liquefaction occurrence class (secondary peril output).
    LiqOccur,
    /// Newmark landslide displacement, metres (secondary peril output).
    Disp,
    /// Probability of slope failure given displacement (secondary output).
    DispProb,
    /// Maximum permanent ground deformation (secondary peril output).
    PgdMax,
    /// Geometric-mean permanent ground deformation (secondary output).
    PgdGeomMean,
}

impl Imt {
    /// Spectral acceleration from a period in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ImtError::InvalidPeriod`] if the period is not finite,
    /// not positive, or loses precision below one millisecond.
    pub fn sa(period: f64) -> Result<Self, ImtError> {
        if !period.is_finite() || period <= 0.0 {
            return Err(ImtError::InvalidPeriod(period));
        }
        let ms = period * 1000.0;
        if ms > u32::MAX as f64 || (ms - ms.round()).abs() > 1e-6 {
            return Err(ImtError::InvalidPeriod(period));
        }
        Ok(Self::Sa {
            period_ms: ms.round() as u32,
        })
    }

    /// Oscillator period in seconds, for `SA` members only.
    pub fn period(&self) -> Option<f64> {
        match self {
            Self::Sa { period_ms } => Some(f64::from(*period_ms) / 1000.0),
            _ => None,
        }
    }

    /// Whether this measure is produced by a ground-shaking model
    /// (as opposed to a secondary-peril output column).
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Pga | Self::Pgv | Self::Sa { .. })
    }

    /// Parse an IMT from its canonical string form.
    ///
    /// Accepts `PGA`, `PGV`, `SA(<period>)` and the secondary-peril output
    /// names (`LiqProb`, `LiqOccur`, `Disp`, `DispProb`, `PGDMax`,
    /// `PGDGeomMean`).
    ///
    /// # Errors
    ///
    /// Returns [`ImtError::Unrecognized`] for any other string and
    /// [`ImtError::InvalidPeriod`] for a malformed SA period.
    pub fn from_string(s: &str) -> Result<Self, ImtError> {
        match s {
            "PGA" => Ok(Self::Pga),
            "PGV" => Ok(Self::Pgv),
            "LiqProb" => Ok(Self::LiqProb),
            "LiqOccur" => Ok(Self::LiqOccur),
            "Disp" => Ok(Self::Disp),
            "DispProb" => Ok(Self::DispProb),
            "PGDMax" => Ok(Self::PgdMax),
            "PGDGeomMean" => Ok(Self::PgdGeomMean),
            _ => {
                let inner = s
                    .strip_prefix("SA(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .ok_or_else(|| ImtError::Unrecognized(s.to_string()))?;
                let period: f64 = inner
                    .parse()
                    .map_err(|_| ImtError::Unrecognized(s.to_string()))?;
                Self::sa(period)
            }
        }
    }
}

impl fmt::Display for Imt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pga => write!(f, "PGA"),
            Self::Pgv => write!(f, "PGV"),
            Self::Sa { period_ms } => {
                write!(f, "SA({})", f64::from(*period_ms) / 1000.0)
            }
            Self::LiqProb => write!(f, "LiqProb"),
            Self::LiqOccur => write!(f, "LiqOccur"),
            Self::Disp => write!(f, "Disp"),
            Self::DispProb => write!(f, "DispProb"),
            Self::PgdMax => write!(f, "PGDMax"),
            Self::PgdGeomMean => write!(f, "PGDGeomMean"),
        }
    }
}

/// Errors from IMT parsing and construction.
#[derive(Clone, Debug, PartialEq)]
pub enum ImtError {
    /// The string does not name a recognized intensity measure.
    Unrecognized(String),
    /// The SA period is non-finite, non-positive, or below millisecond
    /// resolution.
    InvalidPeriod(f64),
}

impl fmt::Display for ImtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(s) => write!(f, "unrecognized intensity measure '{s}'"),
            Self::InvalidPeriod(p) => write!(f, "invalid SA period {p}"),
        }
    }
}

impl Error for ImtError {}

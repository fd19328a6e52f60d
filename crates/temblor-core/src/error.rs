//! Error types for the Temblor hazard engine.
//!
//! The taxonomy separates fatal configuration errors (surfaced before or
//! at the point of use, never downgraded) from data-unavailability
//! conditions, which are not errors at all: a source with no sites in
//! range, a rupture with no surviving sites, or a zero occurrence draw
//! is a silent skip expressed as `Option::None` / an empty result in the
//! relevant API, and never appears here.

use std::error::Error;
use std::fmt;

use crate::id::{RuptureTag, TaskNo};
use crate::imt::{Imt, ImtError};
use crate::source::TectonicRegion;

/// Fatal configuration errors, raised before or at the start of
/// simulation and aborting the whole task unit.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A requested secondary-peril model name is not in the registry.
    UnknownPeril(String),
    /// A peril parameter name is not recognized by its model.
    UnknownPerilParam {
        /// Model the parameter was addressed to.
        model: String,
        /// The unrecognized parameter name.
        param: String,
    },
    /// A peril parameter has the wrong type or an out-of-range value.
    InvalidPerilParam {
        /// Model the parameter belongs to.
        model: String,
        /// Parameter name.
        param: String,
        /// What was wrong with it.
        reason: String,
    },
    /// A peril model declared an output that is not a valid IMT name.
    InvalidPerilOutput {
        /// Model with the bad declaration.
        model: String,
        /// The underlying parse failure.
        source: ImtError,
    },
    /// A peril model requires an IMT the run does not compute.
    ///
    /// Only raised by models whose contract makes two IMTs jointly
    /// mandatory; single-IMT models silently skip instead.
    MandatoryImtMissing {
        /// Model that raised.
        model: String,
        /// The missing measure.
        imt: Imt,
    },
    /// A requested IMT is not a primary (ground-shaking) measure.
    NotAPrimaryImt(Imt),
    /// A peril model's `compute` ran without its `prepare` step, so a
    /// cached site column is missing.
    PerilNotPrepared {
        /// Model whose cached column is absent.
        model: String,
        /// Name of the missing derived column.
        column: &'static str,
    },
    /// A realization has no ground-shaking model for a region that
    /// appears in the source model.
    MissingGsim {
        /// The uncovered tectonic region.
        region: TectonicRegion,
    },
    /// The task block size must be at least 1.
    BadBlockSize(usize),
    /// The job requests no intensity measures while ground-motion
    /// fields are enabled.
    NoImts,
    /// The job has no logic-tree realizations.
    NoRealizations,
    /// A scalar job parameter is out of its valid range.
    InvalidParameter {
        /// Parameter name as it appears in the job configuration.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPeril(name) => {
                write!(f, "unknown secondary-peril model '{name}'")
            }
            Self::UnknownPerilParam { model, param } => {
                write!(f, "model '{model}' has no parameter '{param}'")
            }
            Self::InvalidPerilParam { model, param, reason } => {
                write!(f, "bad parameter '{param}' for model '{model}': {reason}")
            }
            Self::InvalidPerilOutput { model, source } => {
                write!(f, "model '{model}' declares an invalid output: {source}")
            }
            Self::MandatoryImtMissing { model, imt } => {
                write!(f, "model '{model}' requires {imt}, which the run does not compute")
            }
            Self::NotAPrimaryImt(imt) => {
                write!(f, "{imt} is not a primary intensity measure")
            }
            Self::PerilNotPrepared { model, column } => {
                write!(f, "model '{model}' ran without prepare(): column '{column}' missing")
            }
            Self::MissingGsim { region } => {
                write!(f, "no ground-shaking model assigned for region '{region}'")
            }
            Self::BadBlockSize(n) => write!(f, "task block size must be >= 1, got {n}"),
            Self::NoImts => write!(f, "ground-motion fields enabled but no IMTs requested"),
            Self::NoRealizations => write!(f, "job has no logic-tree realizations"),
            Self::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter '{name}': {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPerilOutput { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors from the persistence collaborator.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreError {
    /// A rupture row with this tag already exists and the store cannot
    /// replace by key — a retried task would silently duplicate rows.
    DuplicateRupture(RuptureTag),
    /// A GMF row with this key already exists without replace-by-key
    /// support.
    DuplicateGmfRow {
        /// Task that wrote the row.
        task_no: TaskNo,
        /// Row key description for diagnostics.
        key: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRupture(tag) => {
                write!(f, "rupture '{tag}' already stored and upsert is disabled")
            }
            Self::DuplicateGmfRow { task_no, key } => {
                write!(f, "gmf row {key} from task {task_no} already stored and upsert is disabled")
            }
        }
    }
}

impl Error for StoreError {}

/// Failure of one task unit.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskError {
    /// A fatal configuration error detected inside the task.
    Config(ConfigError),
    /// The persistence collaborator rejected a write.
    Store(StoreError),
    /// The task observed a cancellation request and discarded its
    /// accumulation without flushing.
    Cancelled,
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::Cancelled => write!(f, "task cancelled before completion"),
        }
    }
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Cancelled => None,
        }
    }
}

impl From<ConfigError> for TaskError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StoreError> for TaskError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{GroupOrdinal, SesOrdinal};

    #[test]
    fn display_messages_name_the_offender() {
        let e = ConfigError::UnknownPeril("NotAModel".into());
        assert!(e.to_string().contains("NotAModel"));

        let e = StoreError::DuplicateRupture(RuptureTag::new(
            GroupOrdinal(0),
            SesOrdinal(1),
            "srcX",
            0,
            0,
        ));
        assert!(e.to_string().contains("srcX"));
    }

    #[test]
    fn task_error_chains_its_source() {
        let e = TaskError::from(ConfigError::NoImts);
        assert!(e.source().is_some());
    }
}

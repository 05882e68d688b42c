//! Error types.
//!
//! Two layers:
//!
//! - `AgeModelError`: typed failures raised by the age-model core (model
//!   construction, correlation, evaluation). Raised where detected and
//!   propagated unchanged.
//! - `AppError`: what the binary reports. Carries a process exit code:
//!   2 = configuration/input, 3 = insufficient data, 4 = internal invariant.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgeModelError {
    #[error("nearest-sample lookup against an empty height list")]
    EmptyInput,

    #[error("{context}: need at least 2 control points, found {found}")]
    InsufficientControlPoints { context: String, found: usize },

    #[error("reference section '{reference}' has no age model; build the reference model first")]
    ReferenceNotBuilt { reference: String },

    #[error(
        "control point heights must be strictly increasing: point {index} has height {height} after {previous}"
    )]
    NonMonotonicControlPoints {
        index: usize,
        previous: f64,
        height: f64,
    },

    #[error("height {height} falls outside the model domain [{lower}, {upper}]")]
    OutOfDomain { height: f64, lower: f64, upper: f64 },

    #[error("unknown section '{0}'")]
    UnknownSection(String),

    #[error("marker '{marker}' in section '{section}' has neither an event height nor a sample height")]
    MissingEventHeight { section: String, marker: String },

    #[error("section '{section}': {source}")]
    Section {
        section: String,
        #[source]
        source: Box<AgeModelError>,
    },
}

impl AgeModelError {
    /// Attach the name of the section whose build failed.
    ///
    /// Already-wrapped errors are left alone so the innermost section wins.
    pub fn in_section(self, section: &str) -> Self {
        match self {
            AgeModelError::Section { .. } => self,
            other => AgeModelError::Section {
                section: section.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, with any section wrappers removed.
    pub fn root(&self) -> &AgeModelError {
        match self {
            AgeModelError::Section { source, .. } => source.root(),
            other => other,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<AgeModelError> for AppError {
    fn from(err: AgeModelError) -> Self {
        let exit_code = match err.root() {
            AgeModelError::InsufficientControlPoints { .. } | AgeModelError::ReferenceNotBuilt { .. } => 3,
            AgeModelError::OutOfDomain { .. } => 4,
            AgeModelError::EmptyInput
            | AgeModelError::NonMonotonicControlPoints { .. }
            | AgeModelError::UnknownSection(_)
            | AgeModelError::MissingEventHeight { .. }
            | AgeModelError::Section { .. } => 2,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

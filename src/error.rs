//! Error types for cross section splines and event generation.
//!
//! Each concern gets its own enum so callers can tell a physical outcome
//! (no channel can interact) apart from a failed computation or bad input.

use std::path::PathBuf;

use thiserror::Error;

use crate::interaction::InteractionChannel;

/// Errors raised when a spline is built or evaluated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SplineError {
    #[error("energy {energy} is outside the spline domain [{min}, {max}]")]
    OutOfDomain { energy: f64, min: f64, max: f64 },

    #[error("no spline has been built for channel {channel}")]
    NotFound { channel: String },

    #[error("invalid spline knots: {reason}")]
    InvalidKnots { reason: String },
}

/// Errors raised by a cross section integrator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum XSecError {
    #[error("failed to build spline for {channel}: {reason}")]
    BuildFailure { channel: String, reason: String },

    #[error("invalid energy {energy} for {algorithm}")]
    InvalidEnergy { algorithm: String, energy: f64 },

    #[error("integration failed in {algorithm}: {reason}")]
    Integration { algorithm: String, reason: String },
}

impl XSecError {
    /// Wrap any integrator failure as a build failure of `channel`.
    pub fn build_failure(channel: &InteractionChannel, reason: impl ToString) -> Self {
        XSecError::BuildFailure {
            channel: channel.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised while selecting the interaction channel that fires.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectionError {
    #[error("driver has not been configured with an initial state")]
    NotConfigured,

    #[error("no viable channel at E = {energy} GeV (total weight {total_weight})")]
    NoViableChannel { energy: f64, total_weight: f64 },

    #[error(transparent)]
    Spline(#[from] SplineError),

    #[error(transparent)]
    Build(#[from] XSecError),
}

/// Errors raised when a path length list is mutated with bad values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathLengthError {
    #[error("scale factor {scale} for material {pdg} must be non-negative")]
    InvalidScale { pdg: i32, scale: f64 },

    #[error("path length {value} for material {pdg} must be finite and non-negative")]
    NegativePathLength { pdg: i32, value: f64 },
}

/// Errors raised while reading or writing XML / JSON files.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML error in {path}: {reason}")]
    Xml { path: PathBuf, reason: String },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid content in {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Errors raised while building a geometry or tracing a ray through it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("ray direction must be a non-zero finite vector")]
    InvalidDirection,

    #[error("slab {index}: {reason}")]
    InvalidSlab { index: usize, reason: String },

    #[error("geometry has no slabs")]
    Empty,
}

/// Configuration errors: bad command line input or unresolvable channel setup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unspecified neutrino PDG code list")]
    MissingNeutrinoList,

    #[error("no geometry file or target PDG code list was specified")]
    MissingTargets,

    #[error("both a geometry file and a target PDG code list were specified")]
    ConflictingTargets,

    #[error("empty neutrino PDG code list")]
    EmptyNeutrinoList,

    #[error("empty target PDG code list")]
    EmptyTargetList,

    #[error("invalid PDG code '{0}'")]
    InvalidPdgCode(String),

    #[error("unknown cross section algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("unknown event generator list '{0}'")]
    UnknownGeneratorList(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ConfigError {
    /// Process exit code used by the command line utilities.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::EmptyNeutrinoList => 2,
            ConfigError::EmptyTargetList => 3,
            _ => 1,
        }
    }
}

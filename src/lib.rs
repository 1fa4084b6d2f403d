// Core modules
mod error;
mod utilities;
mod xml_io;

pub mod baryon_res;
pub mod config;
pub mod driver;
pub mod fragmentation;
pub mod generators;
pub mod geometry;
pub mod interaction;
pub mod job_env;
pub mod make_splines;
pub mod multiplicity;
pub mod path_length;
pub mod pdg;
pub mod rein_sehgal;
pub mod spline;
pub mod spline_cache;
pub mod xsec;
pub mod xsec_models;

pub use baryon_res::{BaryonResList, BaryonResonance};
pub use config::RunConfig;
pub use driver::{DriverState, EventGeneratorDriver, SplineReport, WeightTable};
pub use error::{
    ConfigError, GeometryError, PathLengthError, PersistenceError, SelectionError, SplineError,
    XSecError,
};
pub use fragmentation::{collins_spiller, peterson, FragmentationFunction, FragmentationModel};
pub use generators::{GeneratorList, GeneratorSpec};
pub use geometry::{GeometryAnalyzer, Slab, SlabGeometry};
pub use interaction::{
    AlgorithmId, InitialState, InteractionChannel, InteractionType, Process, ScatteringType,
};
pub use job_env::JobEnvSnapshot;
pub use multiplicity::Multiplicity;
pub use path_length::PathLengthList;
pub use spline::{Knot, KnotPolicy, KnotSpacing, Spline};
pub use spline_cache::SplineCache;
pub use utilities::{integrate_midpoint, interpolate_linear, linear_grid, log_grid};
pub use xsec::{AlgorithmConfig, AlgorithmRegistry, XSecIntegrator};

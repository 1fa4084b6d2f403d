//! The `gmkspl` job: build cross section splines for every (probe, target)
//! pair requested on the command line and write them to an XML file.
//!
//! ```text
//! gmkspl -p 14,-14 -t 1000260560
//! gmkspl -p 14,-14 -f detector.json -o spl.xml -e 50
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::config::RunConfig;
use crate::driver::EventGeneratorDriver;
use crate::error::{ConfigError, PersistenceError, SelectionError, XSecError};
use crate::generators::GeneratorList;
use crate::geometry::{GeometryAnalyzer, SlabGeometry};
use crate::interaction::{InitialState, InteractionChannel};
use crate::pdg;
use crate::xsec::AlgorithmRegistry;

pub const DEFAULT_OUTPUT_FILE: &str = "xsec_splines.xml";

pub const USAGE: &str = "gmkspl -p nupdg <-t tgtpdg, -f geomfile> [-o output_xml] \
                         [-n nknots] [-e max_energy] [--generators list]";

/// Raw command line of `gmkspl`. Turn it into validated options with
/// [`MakeSplinesArgs::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Parser)]
#[command(name = "gmkspl")]
#[command(about = "Build cross section splines and save them as XML", long_about = None)]
pub struct MakeSplinesArgs {
    /// Comma separated list of neutrino PDG codes
    #[arg(short = 'p', allow_hyphen_values = true)]
    pub neutrinos: Option<String>,

    /// Comma separated list of target PDG codes (10LZZZAAAI)
    #[arg(short = 't', allow_hyphen_values = true)]
    pub targets: Option<String>,

    /// JSON slab geometry whose materials are used as targets
    #[arg(short = 'f')]
    pub geometry: Option<PathBuf>,

    /// Output XML file [default: xsec_splines.xml]
    #[arg(short = 'o')]
    pub output: Option<PathBuf>,

    /// Knots per spline [default: 15 per decade, at least 30]
    #[arg(short = 'n', allow_negative_numbers = true)]
    pub n_knots: Option<i64>,

    /// Maximum spline energy in GeV [default: top of the validity range]
    #[arg(short = 'e', allow_negative_numbers = true)]
    pub max_energy: Option<f64>,

    /// Event generator list [default: $GEVGL or Default]
    #[arg(long)]
    pub generators: Option<String>,
}

/// Where target materials come from.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetSource {
    PdgCodes(Vec<i32>),
    Geometry(PathBuf),
}

/// Validated `gmkspl` options.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineJobOptions {
    pub neutrinos: Vec<i32>,
    pub targets: TargetSource,
    pub output: PathBuf,
    pub n_knots: Option<usize>,
    pub max_energy: Option<f64>,
    pub generator_list: String,
}

fn parse_codes(list: &str) -> Result<Vec<i32>, ConfigError> {
    pdg::parse_pdg_list(list).map_err(ConfigError::InvalidPdgCode)
}

impl MakeSplinesArgs {
    /// Validate the command line. `default_generators` is used when
    /// `--generators` was not given.
    pub fn resolve(&self, default_generators: &str) -> Result<SplineJobOptions, ConfigError> {
        let nu_list = self
            .neutrinos
            .as_deref()
            .ok_or(ConfigError::MissingNeutrinoList)?;

        let targets = match (self.targets.as_deref(), self.geometry.as_ref()) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingTargets),
            (None, None) => return Err(ConfigError::MissingTargets),
            (Some(list), None) => TargetSource::PdgCodes(parse_codes(list)?),
            (None, Some(path)) => TargetSource::Geometry(path.clone()),
        };

        let neutrinos = parse_codes(nu_list)?;
        if neutrinos.is_empty() {
            return Err(ConfigError::EmptyNeutrinoList);
        }
        if let Some(&bad) = neutrinos.iter().find(|&&c| !pdg::is_neutral_lepton(c)) {
            return Err(ConfigError::InvalidPdgCode(format!("{} is not a neutrino", bad)));
        }
        if matches!(&targets, TargetSource::PdgCodes(codes) if codes.is_empty()) {
            return Err(ConfigError::EmptyTargetList);
        }

        // zero or negative values select the defaults
        let n_knots = match self.n_knots {
            Some(1) => {
                return Err(ConfigError::InvalidArgument(
                    "a spline needs at least 2 knots".to_string(),
                ))
            }
            Some(n) if n > 1 => Some(n as usize),
            _ => None,
        };
        let max_energy = self.max_energy.filter(|&e| e > 0.0);

        Ok(SplineJobOptions {
            neutrinos,
            targets,
            output: self
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
            n_knots,
            max_energy,
            generator_list: self
                .generators
                .clone()
                .unwrap_or_else(|| default_generators.to_string()),
        })
    }
}

/// Failure of a spline job after its options were accepted.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("no spline could be built: all {failed} channels failed")]
    NothingBuilt { failed: usize },
}

impl JobError {
    pub fn exit_code(&self) -> i32 {
        match self {
            JobError::Config(e) => e.exit_code(),
            JobError::Persistence(_)
            | JobError::Selection(_)
            | JobError::NothingBuilt { .. } => 4,
        }
    }
}

/// What a finished job did.
#[derive(Debug, Default)]
pub struct JobSummary {
    pub splines_built: usize,
    pub splines_written: usize,
    pub failures: Vec<(InteractionChannel, XSecError)>,
}

fn target_codes(source: &TargetSource) -> Result<Vec<i32>, JobError> {
    let codes = match source {
        TargetSource::PdgCodes(codes) => codes.clone(),
        TargetSource::Geometry(path) => SlabGeometry::from_json_file(path)?.target_materials(),
    };
    if codes.is_empty() {
        return Err(ConfigError::EmptyTargetList.into());
    }
    Ok(codes)
}

/// Build the splines for every requested initial state and save the cache.
pub fn run(options: &SplineJobOptions, config: &RunConfig) -> Result<JobSummary, JobError> {
    let targets = target_codes(&options.targets)?;
    log::info!("Neutrinos: {:?}", options.neutrinos);
    log::info!("Targets: {:?}", targets);

    let cache = Arc::new(config.new_cache());
    let preloaded = config.preload(&cache)?;
    if preloaded > 0 {
        log::info!("Preloaded {} splines", preloaded);
    }
    let registry = Arc::new(AlgorithmRegistry::with_builtin_models());
    let generators = GeneratorList::from_name(&options.generator_list)?;

    let mut summary = JobSummary::default();
    for &nu in &options.neutrinos {
        for &target in &targets {
            let mut driver = EventGeneratorDriver::new(
                Arc::clone(&cache),
                Arc::clone(&registry),
                generators.clone(),
            )
            .with_knot_policy(config.knot_policy);
            driver.configure(InitialState::new(target, nu))?;
            let report = driver.create_splines(options.n_knots, options.max_energy)?;
            summary.splines_built += report.built;
            summary.failures.extend(report.failures);
        }
    }

    if cache.is_empty() && !summary.failures.is_empty() {
        return Err(JobError::NothingBuilt {
            failed: summary.failures.len(),
        });
    }

    cache.save_to_file(&options.output)?;
    summary.splines_written = cache.len();
    log::info!(
        "Wrote {} splines to {} ({} built, {} failed)",
        summary.splines_written,
        options.output.display(),
        summary.splines_built,
        summary.failures.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> MakeSplinesArgs {
        let mut argv = vec!["gmkspl"];
        argv.extend_from_slice(args);
        MakeSplinesArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_resolve_defaults() {
        let options = parse(&["-p", "14,-14", "-t", "1000260560"])
            .resolve("Default")
            .unwrap();
        assert_eq!(options.neutrinos, vec![14, -14]);
        assert_eq!(options.targets, TargetSource::PdgCodes(vec![1000260560]));
        assert_eq!(options.output, PathBuf::from(DEFAULT_OUTPUT_FILE));
        assert_eq!(options.n_knots, None);
        assert_eq!(options.max_energy, None);
        assert_eq!(options.generator_list, "Default");
    }

    #[test]
    fn test_resolve_overrides() {
        let options = parse(&[
            "-p", "-12", "-f", "det.json", "-o", "out.xml", "-n", "40", "-e", "25.5",
            "--generators", "DIS",
        ])
        .resolve("Default")
        .unwrap();
        assert_eq!(options.neutrinos, vec![-12]);
        assert_eq!(options.targets, TargetSource::Geometry(PathBuf::from("det.json")));
        assert_eq!(options.output, PathBuf::from("out.xml"));
        assert_eq!(options.n_knots, Some(40));
        assert_eq!(options.max_energy, Some(25.5));
        assert_eq!(options.generator_list, "DIS");
    }

    #[test]
    fn test_negative_knots_and_energy_mean_default() {
        let options = parse(&["-p", "14", "-t", "1000010010", "-n", "-1", "-e", "-1"])
            .resolve("CC")
            .unwrap();
        assert_eq!(options.n_knots, None);
        assert_eq!(options.max_energy, None);
        assert_eq!(options.generator_list, "CC");
    }

    #[test]
    fn test_resolve_errors() {
        let cases = vec![
            (vec!["-t", "1000260560"], ConfigError::MissingNeutrinoList),
            (vec!["-p", "14"], ConfigError::MissingTargets),
            (
                vec!["-p", "14", "-t", "1000260560", "-f", "g.json"],
                ConfigError::ConflictingTargets,
            ),
            (vec!["-p", ",", "-t", "1000260560"], ConfigError::EmptyNeutrinoList),
            (vec!["-p", "14", "-t", ""], ConfigError::EmptyTargetList),
        ];
        for (args, expected) in cases {
            assert_eq!(parse(&args).resolve("Default"), Err(expected));
        }
        assert!(matches!(
            parse(&["-p", "14,x", "-t", "1000260560"]).resolve("Default"),
            Err(ConfigError::InvalidPdgCode(_))
        ));
        assert!(matches!(
            parse(&["-p", "2212", "-t", "1000260560"]).resolve("Default"),
            Err(ConfigError::InvalidPdgCode(_))
        ));
    }

    #[test]
    fn test_job_error_exit_codes() {
        assert_eq!(JobError::from(ConfigError::EmptyTargetList).exit_code(), 3);
        let io = PersistenceError::Io {
            path: PathBuf::from("x"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(JobError::from(io).exit_code(), 4);
        assert_eq!(JobError::NothingBuilt { failed: 2 }.exit_code(), 4);
    }

    #[test]
    fn test_energy_cap_below_every_model_fails_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let options = parse(&[
            "-p", "14", "-t", "1000010010", "-e", "0.005", "--generators", "QEL",
        ])
        .resolve("Default")
        .unwrap();
        let options = SplineJobOptions {
            output: dir.path().join("spl.xml"),
            ..options
        };
        let err = run(&options, &RunConfig::default()).unwrap_err();
        assert!(matches!(err, JobError::NothingBuilt { failed } if failed > 0));
        assert_eq!(err.exit_code(), 4);
        assert!(!options.output.exists());
    }
}

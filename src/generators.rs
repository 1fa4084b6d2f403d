use std::fmt;

use crate::error::ConfigError;
use crate::interaction::{
    AlgorithmId, InitialState, InteractionChannel, InteractionType, Process, ScatteringType,
};
use crate::pdg;
use crate::rein_sehgal::DFR_ALGORITHM;
use crate::xsec_models::{DIS_ALGORITHM, QEL_ALGORITHM, RES_ALGORITHM};

pub const DEFAULT_GENERATOR_LIST: &str = "Default";
const DEFAULT_CONFIG: &str = "Default";

/// One registered event generator: a process together with the cross
/// section algorithm that computes it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSpec {
    pub name: String,
    pub process: Process,
    pub algorithm: AlgorithmId,
}

impl GeneratorSpec {
    pub fn new(process: Process, algorithm: AlgorithmId) -> Self {
        Self {
            name: process.to_string(),
            process,
            algorithm,
        }
    }

    /// Channels this generator contributes for `init_state`.
    ///
    /// Weak processes need a neutrino probe. Nucleon-level processes expand
    /// into one channel per nucleon species present in the target; coherent
    /// scattering gives a single channel off the whole nucleus.
    pub fn channels(&self, init_state: InitialState) -> Vec<InteractionChannel> {
        if !pdg::is_neutral_lepton(init_state.probe) {
            return Vec::new();
        }
        if self.process.scattering.is_nucleus_level() {
            return vec![InteractionChannel::new(
                init_state,
                None,
                self.process,
                self.algorithm.clone(),
            )];
        }
        init_state
            .hit_nucleons()
            .into_iter()
            .map(|nucleon| {
                InteractionChannel::new(
                    init_state,
                    Some(nucleon),
                    self.process,
                    self.algorithm.clone(),
                )
            })
            .collect()
    }
}

/// Ordered table of event generators used to build the channel list of a
/// driver. Order is preserved in the resolved channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratorList {
    name: String,
    generators: Vec<GeneratorSpec>,
}

fn algorithm_for(scattering: ScatteringType) -> &'static str {
    match scattering {
        ScatteringType::QuasiElastic => QEL_ALGORITHM,
        ScatteringType::Resonant => RES_ALGORITHM,
        ScatteringType::DeepInelastic => DIS_ALGORITHM,
        ScatteringType::Coherent | ScatteringType::Diffractive => DFR_ALGORITHM,
    }
}

fn builtin_specs(
    scatterings: &[ScatteringType],
    interactions: &[InteractionType],
) -> Vec<GeneratorSpec> {
    let mut specs = Vec::with_capacity(scatterings.len() * interactions.len());
    for &scattering in scatterings {
        for &interaction in interactions {
            specs.push(GeneratorSpec::new(
                Process::new(scattering, interaction),
                AlgorithmId::new(algorithm_for(scattering), DEFAULT_CONFIG),
            ));
        }
    }
    specs
}

impl GeneratorList {
    pub fn new(name: impl Into<String>, generators: Vec<GeneratorSpec>) -> Self {
        Self {
            name: name.into(),
            generators,
        }
    }

    /// Names accepted by [`GeneratorList::from_name`].
    pub fn builtin_names() -> &'static [&'static str] {
        &["Default", "CC", "NC", "QEL", "RES", "DIS", "DFR"]
    }

    /// One of the built-in generator lists.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        use InteractionType::*;
        use ScatteringType::*;

        let all_scattering = [QuasiElastic, Resonant, DeepInelastic, Diffractive];
        let both_currents = [ChargedCurrent, NeutralCurrent];

        let generators = match name {
            "Default" => builtin_specs(&all_scattering, &both_currents),
            "CC" => builtin_specs(&all_scattering, &[ChargedCurrent]),
            "NC" => builtin_specs(&all_scattering, &[NeutralCurrent]),
            "QEL" => builtin_specs(&[QuasiElastic], &both_currents),
            "RES" => builtin_specs(&[Resonant], &both_currents),
            "DIS" => builtin_specs(&[DeepInelastic], &both_currents),
            "DFR" => builtin_specs(&[Diffractive], &both_currents),
            other => return Err(ConfigError::UnknownGeneratorList(other.to_string())),
        };
        Ok(Self::new(name, generators))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&mut self, spec: GeneratorSpec) {
        self.generators.push(spec);
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratorSpec> {
        self.generators.iter()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl fmt::Display for GeneratorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generator list '{}':", self.name)?;
        for spec in &self.generators {
            writeln!(f, "  {:<8} -> {}", spec.name, spec.algorithm)?;
        }
        Ok(())
    }
}

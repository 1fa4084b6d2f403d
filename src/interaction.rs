use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::pdg;

/// Scattering mode of an interaction channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScatteringType {
    QuasiElastic,
    Resonant,
    DeepInelastic,
    Coherent,
    Diffractive,
}

impl ScatteringType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScatteringType::QuasiElastic => "QEL",
            ScatteringType::Resonant => "RES",
            ScatteringType::DeepInelastic => "DIS",
            ScatteringType::Coherent => "COH",
            ScatteringType::Diffractive => "DFR",
        }
    }

    /// Coherent scattering happens off the whole nucleus, so it has no hit
    /// nucleon.
    pub fn is_nucleus_level(&self) -> bool {
        matches!(self, ScatteringType::Coherent)
    }
}

/// Weak current exchanged in the interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InteractionType {
    ChargedCurrent,
    NeutralCurrent,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::ChargedCurrent => "CC",
            InteractionType::NeutralCurrent => "NC",
        }
    }
}

/// Process type of a channel, e.g. `DIS-CC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Process {
    pub scattering: ScatteringType,
    pub interaction: InteractionType,
}

impl Process {
    pub fn new(scattering: ScatteringType, interaction: InteractionType) -> Self {
        Self {
            scattering,
            interaction,
        }
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.scattering.as_str(), self.interaction.as_str())
    }
}

impl FromStr for Process {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scat, int) = s
            .split_once('-')
            .ok_or_else(|| format!("malformed process tag '{}'", s))?;
        let scattering = match scat {
            "QEL" => ScatteringType::QuasiElastic,
            "RES" => ScatteringType::Resonant,
            "DIS" => ScatteringType::DeepInelastic,
            "COH" => ScatteringType::Coherent,
            "DFR" => ScatteringType::Diffractive,
            other => return Err(format!("unknown scattering type '{}'", other)),
        };
        let interaction = match int {
            "CC" => InteractionType::ChargedCurrent,
            "NC" => InteractionType::NeutralCurrent,
            other => return Err(format!("unknown interaction type '{}'", other)),
        };
        Ok(Process::new(scattering, interaction))
    }
}

// Process is written to files as its tag.
impl Serialize for Process {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Process {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// Probe and target of an interaction, before a process is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InitialState {
    pub probe: i32,
    pub target: i32,
}

impl InitialState {
    pub fn new(target: i32, probe: i32) -> Self {
        Self { probe, target }
    }

    /// Hit nucleons actually present in the target (protons first).
    pub fn hit_nucleons(&self) -> Vec<i32> {
        let mut nucleons = Vec::with_capacity(2);
        if pdg::target_z(self.target).unwrap_or(0) > 0 {
            nucleons.push(pdg::PDG_PROTON);
        }
        if pdg::target_n(self.target).unwrap_or(0) > 0 {
            nucleons.push(pdg::PDG_NEUTRON);
        }
        nucleons
    }
}

impl fmt::Display for InitialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} + {}",
            pdg::particle_name(self.probe),
            pdg::particle_name(self.target)
        )
    }
}

/// Cross section algorithm name plus its configuration string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlgorithmId {
    pub name: String,
    pub config: String,
}

impl AlgorithmId {
    pub fn new(name: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: config.into(),
        }
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.config)
    }
}

/// A single interaction pathway with its own cross section function.
///
/// This is the key of the spline cache: two channels are the same only when
/// probe, target, hit nucleon, process and algorithm configuration all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InteractionChannel {
    pub probe: i32,
    pub target: i32,
    /// Struck nucleon for nucleon-level processes, `None` for coherent ones.
    pub hit_nucleon: Option<i32>,
    pub process: Process,
    pub algorithm: AlgorithmId,
}

impl InteractionChannel {
    pub fn new(
        init_state: InitialState,
        hit_nucleon: Option<i32>,
        process: Process,
        algorithm: AlgorithmId,
    ) -> Self {
        Self {
            probe: init_state.probe,
            target: init_state.target,
            hit_nucleon,
            process,
            algorithm,
        }
    }

    pub fn initial_state(&self) -> InitialState {
        InitialState::new(self.target, self.probe)
    }

    /// Number of scattering centres in the target for this channel.
    ///
    /// Z for a struck proton, N for a struck neutron and 1 when the whole
    /// nucleus (or a free nucleon) scatters.
    pub fn scattering_centers(&self) -> f64 {
        match self.hit_nucleon {
            Some(pdg::PDG_PROTON) => pdg::target_z(self.target).unwrap_or(0) as f64,
            Some(pdg::PDG_NEUTRON) => pdg::target_n(self.target).unwrap_or(0) as f64,
            _ => 1.0,
        }
    }
}

impl fmt::Display for InteractionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nu:{};tgt:{}", self.probe, self.target)?;
        if let Some(n) = self.hit_nucleon {
            write!(f, ";N:{}", n)?;
        }
        write!(f, ";proc:{};alg:{}", self.process, self.algorithm)
    }
}

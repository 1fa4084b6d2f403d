// Built-in integrated cross section models.
//
// These are smooth parametrisations with the right thresholds and rough
// magnitudes; they exist so splines can be built and channels selected end to
// end. Energies are in GeV and cross sections in cm^2 per scattering centre.
use std::sync::Arc;

use crate::baryon_res::BaryonResList;
use crate::error::{ConfigError, XSecError};
use crate::interaction::{InteractionChannel, InteractionType, ScatteringType};
use crate::pdg::{self, NUCLEON_MASS};
use crate::xsec::{AlgorithmConfig, AlgorithmRegistry, XSecIntegrator};

pub const QEL_ALGORITHM: &str = "genie::LlewellynSmithQELXSec";
pub const RES_ALGORITHM: &str = "genie::ReinSehgalRESXSec";
pub const DIS_ALGORITHM: &str = "genie::BodekYangDISXSec";

const DEFAULT_VALIDITY: (f64, f64) = (0.01, 100.0);
const DEFAULT_RESONANCES: &str = "P33(1232),S11(1535),D13(1520),S11(1650),D13(1700),D15(1675),S31(1620),D33(1700),P11(1440),P33(1600),P13(1720),F15(1680),P31(1910),P33(1920),F35(1905),F37(1950),P11(1710),F17(1970)";

/// Mass (GeV) of the outgoing lepton for a given probe and current.
fn final_lepton_mass(probe: i32, interaction: InteractionType) -> f64 {
    if interaction == InteractionType::NeutralCurrent {
        return 0.0;
    }
    match probe.abs() {
        pdg::PDG_NU_E => 0.000_511,
        pdg::PDG_NU_MU => 0.105_658,
        pdg::PDG_NU_TAU => 1.776_86,
        _ => 0.0,
    }
}

/// Probe energy needed to produce a hadronic system of mass `w` off a nucleon
/// at rest together with the final state lepton.
fn threshold_energy(w: f64, lepton_mass: f64) -> f64 {
    let m = NUCLEON_MASS;
    (((w + lepton_mass).powi(2) - m * m) / (2.0 * m)).max(0.0)
}

fn check_energy(algorithm: &str, energy: f64) -> Result<(), XSecError> {
    if !energy.is_finite() || energy < 0.0 {
        return Err(XSecError::InvalidEnergy {
            algorithm: algorithm.to_string(),
            energy,
        });
    }
    Ok(())
}

/// Quasi-elastic scattering, saturating above threshold.
#[derive(Debug, Clone)]
pub struct QuasiElasticXSec {
    pub sigma_max: f64,
    pub energy_scale: f64,
    pub anti_nu_factor: f64,
    pub nc_factor: f64,
}

impl QuasiElasticXSec {
    pub fn from_config(config: &AlgorithmConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            sigma_max: config.get_f64_or("SigmaMax", 1.0e-38)?,
            energy_scale: config.get_f64_or("EnergyScale", 0.5)?,
            anti_nu_factor: config.get_f64_or("AntiNuFactor", 0.6)?,
            nc_factor: config.get_f64_or("NCFactor", 0.2)?,
        })
    }
}

impl XSecIntegrator for QuasiElasticXSec {
    fn name(&self) -> &str {
        QEL_ALGORITHM
    }

    fn validity_range(&self) -> (f64, f64) {
        DEFAULT_VALIDITY
    }

    fn is_valid_channel(&self, channel: &InteractionChannel) -> bool {
        if channel.process.scattering != ScatteringType::QuasiElastic {
            return false;
        }
        match (channel.process.interaction, channel.hit_nucleon) {
            // charge conservation: nu n -> l- p, nubar p -> l+ n
            (InteractionType::ChargedCurrent, Some(n)) => {
                if pdg::is_neutrino(channel.probe) {
                    n == pdg::PDG_NEUTRON
                } else {
                    n == pdg::PDG_PROTON
                }
            }
            (InteractionType::NeutralCurrent, Some(_)) => true,
            (_, None) => false,
        }
    }

    fn integrate(&self, channel: &InteractionChannel, energy: f64) -> Result<f64, XSecError> {
        check_energy(self.name(), energy)?;
        let ml = final_lepton_mass(channel.probe, channel.process.interaction);
        let threshold = ml + ml * ml / (2.0 * NUCLEON_MASS);
        if energy <= threshold {
            return Ok(0.0);
        }
        let mut xsec = self.sigma_max * (1.0 - (-(energy - threshold) / self.energy_scale).exp());
        if pdg::is_anti_neutrino(channel.probe) {
            xsec *= self.anti_nu_factor;
        }
        if channel.process.interaction == InteractionType::NeutralCurrent {
            xsec *= self.nc_factor;
        }
        Ok(xsec)
    }
}

/// Resonance production summed over a list of baryon resonances.
#[derive(Debug, Clone)]
pub struct ResonanceXSec {
    pub resonances: BaryonResList,
    pub sigma_scale: f64,
    pub nc_factor: f64,
}

impl ResonanceXSec {
    pub fn from_config(config: &AlgorithmConfig) -> Result<Self, ConfigError> {
        let mut resonances = BaryonResList::new();
        resonances
            .decode_from_name_list(config.get("ResonanceNameList").unwrap_or(DEFAULT_RESONANCES), ",")
            .map_err(ConfigError::InvalidArgument)?;
        Ok(Self {
            resonances,
            sigma_scale: config.get_f64_or("SigmaScale", 0.5e-38)?,
            nc_factor: config.get_f64_or("NCFactor", 0.25)?,
        })
    }
}

impl XSecIntegrator for ResonanceXSec {
    fn name(&self) -> &str {
        RES_ALGORITHM
    }

    fn validity_range(&self) -> (f64, f64) {
        DEFAULT_VALIDITY
    }

    fn is_valid_channel(&self, channel: &InteractionChannel) -> bool {
        channel.process.scattering == ScatteringType::Resonant && channel.hit_nucleon.is_some()
    }

    fn integrate(&self, channel: &InteractionChannel, energy: f64) -> Result<f64, XSecError> {
        check_energy(self.name(), energy)?;
        let ml = final_lepton_mass(channel.probe, channel.process.interaction);
        let mut xsec = 0.0;
        for res in self.resonances.iter() {
            let threshold = threshold_energy(res.mass(), ml);
            if energy <= threshold {
                continue;
            }
            let weight = if res.is_delta() { 1.0 } else { 0.3 };
            xsec += weight * (1.0 - (-(energy - threshold) / (4.0 * res.width())).exp());
        }
        xsec *= self.sigma_scale / self.resonances.n_resonances().max(1) as f64;
        if channel.process.interaction == InteractionType::NeutralCurrent {
            xsec *= self.nc_factor;
        }
        Ok(xsec)
    }
}

/// Deep-inelastic scattering, linear in energy above the W cut.
#[derive(Debug, Clone)]
pub struct DeepInelasticXSec {
    pub w_cut: f64,
    pub nu_slope: f64,
    pub anti_nu_slope: f64,
    pub nc_factor: f64,
}

impl DeepInelasticXSec {
    pub fn from_config(config: &AlgorithmConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            w_cut: config.get_f64_or("Wcut", 1.7)?,
            nu_slope: config.get_f64_or("NuSlope", 0.677e-38)?,
            anti_nu_slope: config.get_f64_or("AntiNuSlope", 0.334e-38)?,
            nc_factor: config.get_f64_or("NCFactor", 0.3)?,
        })
    }
}

impl XSecIntegrator for DeepInelasticXSec {
    fn name(&self) -> &str {
        DIS_ALGORITHM
    }

    fn validity_range(&self) -> (f64, f64) {
        DEFAULT_VALIDITY
    }

    fn is_valid_channel(&self, channel: &InteractionChannel) -> bool {
        channel.process.scattering == ScatteringType::DeepInelastic && channel.hit_nucleon.is_some()
    }

    fn integrate(&self, channel: &InteractionChannel, energy: f64) -> Result<f64, XSecError> {
        check_energy(self.name(), energy)?;
        let ml = final_lepton_mass(channel.probe, channel.process.interaction);
        let threshold = threshold_energy(self.w_cut, ml);
        if energy <= threshold {
            return Ok(0.0);
        }
        let slope = if pdg::is_anti_neutrino(channel.probe) {
            self.anti_nu_slope
        } else {
            self.nu_slope
        };
        let mut xsec = slope * (energy - threshold);
        if channel.process.interaction == InteractionType::NeutralCurrent {
            xsec *= self.nc_factor;
        }
        Ok(xsec)
    }
}

pub fn register_builtin_models(registry: &mut AlgorithmRegistry) {
    registry.register(QEL_ALGORITHM, |cfg: &AlgorithmConfig| {
        Ok(Arc::new(QuasiElasticXSec::from_config(cfg)?) as Arc<dyn XSecIntegrator>)
    });
    registry.register(RES_ALGORITHM, |cfg: &AlgorithmConfig| {
        Ok(Arc::new(ResonanceXSec::from_config(cfg)?) as Arc<dyn XSecIntegrator>)
    });
    registry.register(DIS_ALGORITHM, |cfg: &AlgorithmConfig| {
        Ok(Arc::new(DeepInelasticXSec::from_config(cfg)?) as Arc<dyn XSecIntegrator>)
    });
}

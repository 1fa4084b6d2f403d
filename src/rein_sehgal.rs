//! Rein-Sehgal diffractive pion production off nucleons.
//!
//! The differential cross section is
//!
//! ```text
//! d3sigma/dxdydt = GF^2 M / (16 pi^3) * E * fpi^2 * (1 - y) * (Ma^2 / (Ma^2 + Q^2))^2
//!                  * sigma_tot(pi N)^2 * exp(-b t)
//! ```
//!
//! with `Q^2 = 2 x y M E` and the pi-N total cross section from a Regge
//! parametrisation. The `t` dependence is integrated analytically and `x`, `y`
//! with a nested midpoint rule. The result is per nucleon; the driver applies
//! the number of scattering centres.

use std::f64::consts::PI;
use std::sync::Arc;

use crate::error::{ConfigError, XSecError};
use crate::interaction::{InteractionChannel, InteractionType, ScatteringType};
use crate::pdg::{NUCLEON_MASS, PION_MASS};
use crate::utilities::integrate_midpoint;
use crate::xsec::{AlgorithmConfig, AlgorithmRegistry, XSecIntegrator};

pub const DFR_ALGORITHM: &str = "genie::ReinDFRPXSec";

/// Fermi constant squared, GeV^-4.
const GF2: f64 = 1.166_378_7e-5 * 1.166_378_7e-5;
/// One millibarn in natural units, GeV^-2.
const MILLIBARN: f64 = 2.568_19;
/// Conversion of GeV^-2 to cm^2.
const GEV_M2_TO_CM2: f64 = 0.389_379e-27;

#[derive(Debug, Clone)]
pub struct ReinDfrXSec {
    /// Axial mass (GeV) in the propagator.
    pub ma: f64,
    /// Slope (GeV^-2) of the exponential t fall-off.
    pub beta: f64,
    /// Upper edge of the t integration (GeV^2).
    pub t_max: f64,
    /// Ratio of neutral to charged current strength.
    pub nc_factor: f64,
    /// Midpoint panels per integration variable.
    pub n_panels: usize,
}

impl ReinDfrXSec {
    pub fn from_config(config: &AlgorithmConfig) -> Result<Self, ConfigError> {
        let n_panels = config.get_f64_or("NumPanels", 40.0)?;
        if n_panels < 1.0 {
            return Err(ConfigError::InvalidArgument(format!(
                "NumPanels must be at least 1, got {}",
                n_panels
            )));
        }
        Ok(Self {
            ma: config.get_f64_or("Ma", 1.0)?,
            beta: config.get_f64_or("beta", 7.0)?,
            t_max: config.get_f64_or("tmax", 1.0)?,
            nc_factor: config.get_f64_or("NCFactor", 0.5)?,
            n_panels: n_panels as usize,
        })
    }

    /// d2sigma/dxdy (GeV^-2) after integrating over t.
    pub fn d2xsec_dxdy(&self, energy: f64, x: f64, y: f64) -> f64 {
        let m = NUCLEON_MASS;
        let epi = y * energy;
        if epi <= PION_MASS {
            return 0.0;
        }
        let q2 = 2.0 * x * y * m * energy;
        let gf = GF2 * m / (16.0 * PI.powi(3));
        let fp = 0.93 * PION_MASS;
        let ma2 = self.ma * self.ma;
        let propagator = (ma2 / (ma2 + q2)).powi(2);
        let sigma_tot = 12.0 * (2.0 + 1.0 / epi.sqrt()) * MILLIBARN;
        let t_integral = if self.beta > 0.0 {
            (1.0 - (-self.beta * self.t_max).exp()) / self.beta
        } else {
            self.t_max
        };
        gf * energy * fp * fp * (1.0 - y) * propagator * sigma_tot * sigma_tot * t_integral
    }
}

impl XSecIntegrator for ReinDfrXSec {
    fn name(&self) -> &str {
        DFR_ALGORITHM
    }

    fn validity_range(&self) -> (f64, f64) {
        (0.01, 100.0)
    }

    fn is_valid_channel(&self, channel: &InteractionChannel) -> bool {
        channel.process.scattering == ScatteringType::Diffractive && channel.hit_nucleon.is_some()
    }

    fn integrate(&self, channel: &InteractionChannel, energy: f64) -> Result<f64, XSecError> {
        if !energy.is_finite() || energy < 0.0 {
            return Err(XSecError::InvalidEnergy {
                algorithm: DFR_ALGORITHM.to_string(),
                energy,
            });
        }
        if energy <= PION_MASS {
            return Ok(0.0);
        }
        let y_min = PION_MASS / energy;
        let n = self.n_panels;
        let xsec = integrate_midpoint(
            |x| integrate_midpoint(|y| self.d2xsec_dxdy(energy, x, y), y_min, 1.0, n),
            0.0,
            1.0,
            n,
        );
        if !xsec.is_finite() {
            return Err(XSecError::Integration {
                algorithm: DFR_ALGORITHM.to_string(),
                reason: format!("non-finite integral at E = {}", energy),
            });
        }
        let mut xsec = xsec * GEV_M2_TO_CM2;
        if channel.process.interaction == InteractionType::NeutralCurrent {
            xsec *= self.nc_factor;
        }
        Ok(xsec)
    }
}

pub fn register(registry: &mut AlgorithmRegistry) {
    registry.register(DFR_ALGORITHM, |cfg: &AlgorithmConfig| {
        Ok(Arc::new(ReinDfrXSec::from_config(cfg)?) as Arc<dyn XSecIntegrator>)
    });
}

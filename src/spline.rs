use serde::{Deserialize, Serialize};

use crate::error::SplineError;
use crate::utilities::{interpolate_linear, linear_grid, log_grid};

/// One (energy, cross section) sample point of a spline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Knot {
    #[serde(rename = "E")]
    pub energy: f64,
    #[serde(rename = "xsec")]
    pub value: f64,
}

impl Knot {
    pub fn new(energy: f64, value: f64) -> Self {
        Self { energy, value }
    }
}

/// Interpolated tabulation of a cross section over an energy domain.
///
/// Knots are kept in strictly increasing energy order. Evaluation is piecewise
/// linear between neighbouring knots, so the curve passes exactly through
/// every knot and the result depends only on the knot data. Energies outside
/// `[energy_min, energy_max]` are rejected rather than extrapolated.
#[derive(Debug, Clone, PartialEq)]
pub struct Spline {
    energies: Vec<f64>,
    values: Vec<f64>,
}

impl Spline {
    /// Build a spline from knots. At least two knots with finite values and
    /// strictly increasing energies are required.
    pub fn from_knots(knots: &[Knot]) -> Result<Self, SplineError> {
        if knots.len() < 2 {
            return Err(SplineError::InvalidKnots {
                reason: format!("need at least 2 knots, got {}", knots.len()),
            });
        }
        for (i, k) in knots.iter().enumerate() {
            if !k.energy.is_finite() || !k.value.is_finite() {
                return Err(SplineError::InvalidKnots {
                    reason: format!("knot {} is not finite ({}, {})", i, k.energy, k.value),
                });
            }
            if i > 0 && k.energy <= knots[i - 1].energy {
                return Err(SplineError::InvalidKnots {
                    reason: format!(
                        "knot energies must increase strictly ({} after {})",
                        k.energy,
                        knots[i - 1].energy
                    ),
                });
            }
        }
        Ok(Self {
            energies: knots.iter().map(|k| k.energy).collect(),
            values: knots.iter().map(|k| k.value).collect(),
        })
    }

    pub fn energy_min(&self) -> f64 {
        self.energies[0]
    }

    pub fn energy_max(&self) -> f64 {
        self.energies[self.energies.len() - 1]
    }

    pub fn n_knots(&self) -> usize {
        self.energies.len()
    }

    pub fn knots(&self) -> Vec<Knot> {
        self.energies
            .iter()
            .zip(&self.values)
            .map(|(&e, &v)| Knot::new(e, v))
            .collect()
    }

    pub fn contains(&self, energy: f64) -> bool {
        energy >= self.energy_min() && energy <= self.energy_max()
    }

    /// Cross section at `energy`.
    #[inline]
    pub fn evaluate(&self, energy: f64) -> Result<f64, SplineError> {
        interpolate_linear(&self.energies, &self.values, energy).ok_or(SplineError::OutOfDomain {
            energy,
            min: self.energy_min(),
            max: self.energy_max(),
        })
    }
}

/// How knot energies are distributed over the spline domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KnotSpacing {
    #[default]
    Logarithmic,
    Linear,
}

impl KnotSpacing {
    /// Knot energies over `[min, max]`. Logarithmic spacing falls back to
    /// linear when the domain does not start above zero.
    pub fn grid(&self, min: f64, max: f64, n: usize) -> Vec<f64> {
        match self {
            KnotSpacing::Logarithmic if min > 0.0 => log_grid(min, max, n),
            _ => linear_grid(min, max, n),
        }
    }
}

/// Default number of knots for a spline domain: `knots_per_decade` per decade
/// of energy, never fewer than `min_knots`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnotPolicy {
    pub knots_per_decade: f64,
    pub min_knots: usize,
}

impl Default for KnotPolicy {
    fn default() -> Self {
        Self {
            knots_per_decade: 15.0,
            min_knots: 30,
        }
    }
}

impl KnotPolicy {
    pub fn n_knots(&self, energy_min: f64, energy_max: f64) -> usize {
        let per_decade = if energy_min > 0.0 && energy_max > energy_min {
            let decades = (energy_max / energy_min).log10();
            (self.knots_per_decade * decades - 1e-9).ceil() as usize
        } else {
            0
        };
        per_decade.max(self.min_knots).max(2)
    }
}

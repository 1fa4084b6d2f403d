//! Heavy quark fragmentation functions D(z), where `z` is the fraction of the
//! quark momentum carried by the hadron. Both are defined on the open
//! interval (0, 1).

use rand::Rng;

/// Peterson fragmentation function with normalisation `n` and shape
/// parameter `epsilon`.
pub fn peterson(z: f64, n: f64, epsilon: f64) -> f64 {
    let d = 1.0 - 1.0 / z - epsilon / (1.0 - z);
    n / (z * d * d)
}

/// Collins-Spiller fragmentation function with normalisation `n` and shape
/// parameter `epsilon`.
pub fn collins_spiller(z: f64, n: f64, epsilon: f64) -> f64 {
    let d = 1.0 - 1.0 / z - epsilon / (1.0 - z);
    n * ((1.0 - z) / z + epsilon * (2.0 - z) / (1.0 - z)) * (1.0 + z).powi(2) / (d * d)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentationModel {
    Peterson,
    CollinsSpiller,
}

// Grid used to locate the maximum for rejection sampling.
const MAX_SCAN_POINTS: usize = 2000;
const ENVELOPE_MARGIN: f64 = 1.1;
const MAX_SAMPLING_ATTEMPTS: usize = 100_000;

/// A fragmentation function with fixed parameters that can be evaluated and
/// sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentationFunction {
    pub model: FragmentationModel,
    pub norm: f64,
    pub epsilon: f64,
    envelope: f64,
}

impl FragmentationFunction {
    pub fn new(model: FragmentationModel, norm: f64, epsilon: f64) -> Self {
        let mut f = Self {
            model,
            norm,
            epsilon,
            envelope: 0.0,
        };
        let step = 1.0 / MAX_SCAN_POINTS as f64;
        let max = (1..MAX_SCAN_POINTS)
            .map(|i| f.evaluate(step * i as f64))
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max);
        f.envelope = ENVELOPE_MARGIN * max;
        f
    }

    pub fn peterson(norm: f64, epsilon: f64) -> Self {
        Self::new(FragmentationModel::Peterson, norm, epsilon)
    }

    pub fn collins_spiller(norm: f64, epsilon: f64) -> Self {
        Self::new(FragmentationModel::CollinsSpiller, norm, epsilon)
    }

    /// D(z); zero outside (0, 1).
    pub fn evaluate(&self, z: f64) -> f64 {
        if !(z > 0.0 && z < 1.0) {
            return 0.0;
        }
        match self.model {
            FragmentationModel::Peterson => peterson(z, self.norm, self.epsilon),
            FragmentationModel::CollinsSpiller => collins_spiller(z, self.norm, self.epsilon),
        }
    }

    /// Draw z from D(z) by rejection against a flat envelope. Returns `None`
    /// if the function is not positive anywhere or no sample was accepted.
    pub fn sample_z<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<f64> {
        if !(self.envelope > 0.0 && self.envelope.is_finite()) {
            return None;
        }
        for _ in 0..MAX_SAMPLING_ATTEMPTS {
            let z: f64 = rng.gen();
            if z <= 0.0 {
                continue;
            }
            if rng.gen::<f64>() * self.envelope < self.evaluate(z) {
                return Some(z);
            }
        }
        log::warn!(
            "No z accepted from {:?} fragmentation after {} attempts",
            self.model,
            MAX_SAMPLING_ATTEMPTS
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_positive_inside_unit_interval() {
        for i in 1..100 {
            let z = i as f64 / 100.0;
            assert!(peterson(z, 1.0, 0.05) > 0.0);
            assert!(collins_spiller(z, 1.0, 0.05) > 0.0);
        }
    }

    #[test]
    fn test_peterson_known_value() {
        // z = 0.5, eps = 0.5: 1 - 2 - 1 = -2, D = 1 / (0.5 * 4)
        assert!((peterson(0.5, 1.0, 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_outside_domain() {
        let f = FragmentationFunction::peterson(1.0, 0.05);
        assert_eq!(f.evaluate(0.0), 0.0);
        assert_eq!(f.evaluate(1.0), 0.0);
        assert_eq!(f.evaluate(-0.5), 0.0);
    }

    #[test]
    fn test_sample_z_peaks_high_for_small_epsilon() {
        let f = FragmentationFunction::peterson(1.0, 0.01);
        let mut rng = StdRng::seed_from_u64(42);
        let samples: Vec<f64> = (0..2000).map(|_| f.sample_z(&mut rng).unwrap()).collect();
        assert!(samples.iter().all(|&z| z > 0.0 && z < 1.0));
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!(mean > 0.6, "mean z {}", mean);
    }

    #[test]
    fn test_sample_z_collins_spiller() {
        let f = FragmentationFunction::collins_spiller(1.0, 0.1);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let z = f.sample_z(&mut rng).unwrap();
            assert!(z > 0.0 && z < 1.0);
        }
    }

    #[test]
    fn test_zero_norm_cannot_sample() {
        let f = FragmentationFunction::peterson(0.0, 0.05);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(f.sample_z(&mut rng), None);
    }
}

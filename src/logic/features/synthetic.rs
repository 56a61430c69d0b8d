//! Synthetic Behaviour Generator
//!
//! Demo dataset of user spending/activity profiles: a majority "normal"
//! cluster and a minority "anomalous" cluster with wider variance, plus
//! unit Gaussian noise. Fully determined by `(n, seed)`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::vector::{Dataset, FeatureVector};
use crate::error::DetectionResult;

/// Gaussian cluster with independent per-feature variance
#[derive(Debug, Clone)]
pub struct BehaviorProfile {
    pub mean: Vec<f64>,
    pub variance: Vec<f64>,
}

impl BehaviorProfile {
    /// Typical spending pattern
    pub fn normal() -> Self {
        Self {
            mean: vec![50.0, 30.0, 20.0, 10.0, 5.0],
            variance: vec![100.0, 50.0, 25.0, 10.0, 5.0],
        }
    }

    /// Unusual spending pattern (potential fraud)
    pub fn anomalous() -> Self {
        Self {
            mean: vec![200.0, 150.0, 100.0, 80.0, 50.0],
            variance: vec![500.0, 300.0, 200.0, 100.0, 50.0],
        }
    }

    fn sample(&self, rng: &mut StdRng) -> Vec<f64> {
        self.mean
            .iter()
            .zip(&self.variance)
            .map(|(m, v)| m + v.sqrt() * standard_normal(rng))
            .collect()
    }
}

/// Generated data plus the indices drawn from the anomalous profile
#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    pub data: Dataset,
    pub anomalous: Vec<usize>,
}

impl SyntheticDataset {
    pub fn is_anomalous(&self, index: usize) -> bool {
        self.anomalous.binary_search(&index).is_ok()
    }
}

/// Generator settings
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub samples: usize,
    pub anomaly_fraction: f64,
    pub noise_std: f64,
    pub seed: u64,
    pub normal: BehaviorProfile,
    pub anomalous: BehaviorProfile,
}

impl SyntheticConfig {
    pub fn new(samples: usize, seed: u64) -> Self {
        Self {
            samples,
            anomaly_fraction: 0.2,
            noise_std: 1.0,
            seed,
            normal: BehaviorProfile::normal(),
            anomalous: BehaviorProfile::anomalous(),
        }
    }

    /// Rows are ordered normal, anomalous, then normal padding up to `samples`.
    /// Fails only if the two profiles disagree on dimensionality.
    pub fn generate(&self) -> DetectionResult<SyntheticDataset> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let n_anomalous = (self.samples as f64 * self.anomaly_fraction).floor() as usize;
        let n_normal =
            ((self.samples as f64 * (1.0 - self.anomaly_fraction)).floor() as usize)
                .min(self.samples - n_anomalous.min(self.samples));

        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(self.samples);
        for _ in 0..n_normal {
            rows.push(self.normal.sample(&mut rng));
        }
        for _ in 0..n_anomalous.min(self.samples) {
            rows.push(self.anomalous.sample(&mut rng));
        }
        let anomalous: Vec<usize> = (n_normal..rows.len()).collect();

        for row in rows.iter_mut() {
            for value in row.iter_mut() {
                *value += self.noise_std * standard_normal(&mut rng);
            }
        }

        while rows.len() < self.samples {
            rows.push(self.normal.sample(&mut rng));
        }

        Ok(SyntheticDataset {
            data: Dataset::new(rows.into_iter().map(FeatureVector::new).collect())?,
            anomalous,
        })
    }
}

/// Default demo dataset: 80% normal, 20% anomalous, 5 features
pub fn generate_behavior_dataset(samples: usize, seed: u64) -> DetectionResult<SyntheticDataset> {
    SyntheticConfig::new(samples, seed).generate()
}

/// Standard normal via Box-Muller
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-300);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

//! Detection Configuration
//!
//! Tunables for one pipeline run. Loaded from environment variables by the
//! binary, or built in code by library callers.

use std::env;

use crate::constants::*;
use crate::error::{DetectionError, DetectionResult};

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Expected outlier fraction (ν), in (0, 1]
    pub nu: f64,

    /// Added to every kernel diagonal entry
    pub regularization: f64,

    /// Seed for synthetic data and the fallback heuristic
    pub seed: u64,

    /// Synthetic dataset size when no dataset is supplied
    pub sample_count: usize,

    /// Rotation angle clamp for the circuit encoding
    pub angle_clamp: f64,

    /// Largest register the simulator accepts
    pub max_qubits: usize,

    /// SMO stopping tolerance
    pub solver_tolerance: f64,

    /// SMO iteration cap
    pub max_solver_iterations: usize,

    /// Attach the regularized kernel matrix to successful results
    pub include_kernel_matrix: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            nu: DEFAULT_NU,
            regularization: DEFAULT_REGULARIZATION,
            seed: DEFAULT_SEED,
            sample_count: DEFAULT_SAMPLE_COUNT,
            angle_clamp: DEFAULT_ANGLE_CLAMP,
            max_qubits: DEFAULT_MAX_QUBITS,
            solver_tolerance: DEFAULT_SOLVER_TOLERANCE,
            max_solver_iterations: DEFAULT_MAX_SOLVER_ITERATIONS,
            include_kernel_matrix: false,
        }
    }
}

impl DetectionConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            nu: env_parse(ENV_NU).unwrap_or(defaults.nu),

            regularization: env_parse(ENV_REGULARIZATION)
                .unwrap_or(defaults.regularization),

            seed: env_parse(ENV_SEED).unwrap_or(defaults.seed),

            sample_count: env_parse(ENV_SAMPLES).unwrap_or(defaults.sample_count),

            max_qubits: env_parse(ENV_MAX_QUBITS).unwrap_or(defaults.max_qubits),

            include_kernel_matrix: env::var(ENV_INCLUDE_KERNEL)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.include_kernel_matrix),

            ..defaults
        }
    }

    /// Builder-style ν override
    pub fn with_nu(mut self, nu: f64) -> Self {
        self.nu = nu;
        self
    }

    /// Builder-style seed override
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check ranges. Called by `Pipeline::new`.
    pub fn validate(&self) -> DetectionResult<()> {
        if !(self.nu > 0.0 && self.nu <= 1.0) {
            return Err(DetectionError::InvalidConfig(format!(
                "nu must be in (0, 1], got {}",
                self.nu
            )));
        }
        if !self.regularization.is_finite() || self.regularization < 0.0 {
            return Err(DetectionError::InvalidConfig(format!(
                "regularization must be finite and >= 0, got {}",
                self.regularization
            )));
        }
        if self.sample_count == 0 {
            return Err(DetectionError::InvalidConfig("sample_count must be >= 1".into()));
        }
        if self.max_qubits == 0 {
            return Err(DetectionError::InvalidConfig("max_qubits must be >= 1".into()));
        }
        if !self.angle_clamp.is_finite() || self.angle_clamp <= 0.0 {
            return Err(DetectionError::InvalidConfig(format!(
                "angle_clamp must be finite and > 0, got {}",
                self.angle_clamp
            )));
        }
        if !self.solver_tolerance.is_finite() || self.solver_tolerance <= 0.0 {
            return Err(DetectionError::InvalidConfig(format!(
                "solver_tolerance must be finite and > 0, got {}",
                self.solver_tolerance
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring unparsable {}={:?}, using default", key, raw);
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

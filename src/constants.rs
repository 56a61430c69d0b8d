//! Central Configuration Constants
//!
//! Single source of truth for all detection defaults.
//! The ν and regularization values are demo constants tuned for the
//! synthetic behaviour dataset; override them through `DetectionConfig`.

use std::f64::consts::TAU;

/// Expected outlier fraction (ν) for the one-class SVM
pub const DEFAULT_NU: f64 = 0.3;

/// Added to every kernel diagonal entry before classification
pub const DEFAULT_REGULARIZATION: f64 = 1e-6;

/// Seed for the synthetic dataset and the fallback heuristic
pub const DEFAULT_SEED: u64 = 42;

/// Sample count for the synthetic demo dataset
pub const DEFAULT_SAMPLE_COUNT: usize = 15;

/// Dimensionality after PCA (one qubit per component)
pub const TARGET_DIMENSIONS: usize = 3;

/// Rotation angles are clamped to `[-ANGLE_CLAMP, ANGLE_CLAMP]`
pub const DEFAULT_ANGLE_CLAMP: f64 = TAU;

/// Upper bound on the simulated register (2^n amplitudes are allocated)
pub const DEFAULT_MAX_QUBITS: usize = 16;

/// SMO stopping tolerance (libsvm default)
pub const DEFAULT_SOLVER_TOLERANCE: f64 = 1e-3;

/// SMO iteration cap
pub const DEFAULT_MAX_SOLVER_ITERATIONS: usize = 100_000;

/// Fallback heuristic scores are drawn from `[-FALLBACK_SCORE_RANGE, FALLBACK_SCORE_RANGE)`
pub const FALLBACK_SCORE_RANGE: f64 = 2.0;

/// Fallback heuristic flags samples scoring below this cutoff
pub const FALLBACK_ANOMALY_CUTOFF: f64 = -1.0;

// ============================================
// Method labels reported in AnomalyResult
// ============================================

pub const METHOD_QUANTUM: &str = "Quantum-Enhanced One-Class SVM";
pub const METHOD_CLASSICAL_KERNEL: &str = "Classical-Kernel One-Class SVM";
pub const METHOD_FALLBACK: &str = "Classical Fallback";

// ============================================
// Environment variable names
// ============================================

pub const ENV_NU: &str = "QAD_NU";
pub const ENV_REGULARIZATION: &str = "QAD_REGULARIZATION";
pub const ENV_SEED: &str = "QAD_SEED";
pub const ENV_SAMPLES: &str = "QAD_SAMPLES";
pub const ENV_MAX_QUBITS: &str = "QAD_MAX_QUBITS";
pub const ENV_INCLUDE_KERNEL: &str = "QAD_INCLUDE_KERNEL";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Quantum Anomaly";

//! Similarity Kernels
//!
//! Two strategies with one signature:
//! - `QuantumKernel`: |⟨0…0|ψ(x, y)⟩|² of a simulated encoding circuit
//! - `ClassicalKernel`: Gaussian RBF `exp(-‖x-y‖² / 2)`
//!
//! `FallbackKernel` pairs a primary with the classical strategy and tags
//! each value with the strategy that produced it.

use serde::{Deserialize, Serialize};

use super::circuit::{Circuit, CircuitSimulator, StatevectorSimulator};
use crate::constants::DEFAULT_ANGLE_CLAMP;
use crate::error::KernelError;

/// Which strategy produced a similarity value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityStrategy {
    Primary,
    Fallback,
}

/// Similarity value tagged with its producing strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityOutcome {
    pub value: f64,
    pub strategy: SimilarityStrategy,
}

impl SimilarityOutcome {
    pub fn used_fallback(&self) -> bool {
        self.strategy == SimilarityStrategy::Fallback
    }
}

/// Pairwise similarity capability (higher = more similar)
pub trait SimilarityKernel {
    fn similarity(&self, x: &[f64], y: &[f64]) -> Result<f64, KernelError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

impl<K: SimilarityKernel + ?Sized> SimilarityKernel for &K {
    fn similarity(&self, x: &[f64], y: &[f64]) -> Result<f64, KernelError> {
        (**self).similarity(x, y)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

fn check_dims(x: &[f64], y: &[f64]) -> Result<(), KernelError> {
    if x.len() != y.len() {
        return Err(KernelError::DimensionMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    Ok(())
}

// ============================================================================
// QUANTUM KERNEL
// ============================================================================

/// Simulated-circuit kernel.
///
/// One qubit per feature. Each qubit gets `Ry(|x_k - y_k|)` (clamped to
/// the configured range), then a controlled-Z joins every pair of qubits.
/// The result is the probability of measuring all zeros, in `[0, 1]`.
/// Encoding the absolute difference builds the same circuit for `(x, y)`
/// and `(y, x)`, so the kernel is exactly symmetric.
#[derive(Debug, Clone)]
pub struct QuantumKernel<S: CircuitSimulator = StatevectorSimulator> {
    simulator: S,
    angle_clamp: f64,
}

impl QuantumKernel<StatevectorSimulator> {
    pub fn new(max_qubits: usize, angle_clamp: f64) -> Self {
        Self::with_simulator(StatevectorSimulator::new(max_qubits), angle_clamp)
    }
}

impl Default for QuantumKernel<StatevectorSimulator> {
    fn default() -> Self {
        Self::with_simulator(StatevectorSimulator::default(), DEFAULT_ANGLE_CLAMP)
    }
}

impl<S: CircuitSimulator> QuantumKernel<S> {
    pub fn with_simulator(simulator: S, angle_clamp: f64) -> Self {
        Self {
            simulator,
            angle_clamp,
        }
    }

    /// Encoding circuit for a feature pair
    pub fn circuit(&self, x: &[f64], y: &[f64]) -> Result<Circuit, KernelError> {
        check_dims(x, y)?;
        let qubits = x.len();

        let mut circuit = Circuit::new(qubits);
        for (qubit, (a, b)) in x.iter().zip(y).enumerate() {
            // NaN must reach the simulator, so no f64::min here
            let diff = (a - b).abs();
            let angle = if diff > self.angle_clamp { self.angle_clamp } else { diff };
            circuit.ry(qubit, angle);
        }
        for a in 0..qubits {
            for b in (a + 1)..qubits {
                circuit.cz(a, b);
            }
        }
        Ok(circuit)
    }
}

impl<S: CircuitSimulator> SimilarityKernel for QuantumKernel<S> {
    fn similarity(&self, x: &[f64], y: &[f64]) -> Result<f64, KernelError> {
        let circuit = self.circuit(x, y)?;
        let state = self.simulator.simulate(&circuit)?;
        let amplitude = state
            .first()
            .copied()
            .ok_or_else(|| KernelError::Other("simulator returned an empty state".into()))?;
        Ok(amplitude * amplitude)
    }

    fn name(&self) -> &'static str {
        "quantum"
    }
}

// ============================================================================
// CLASSICAL KERNEL
// ============================================================================

/// Gaussian RBF kernel, `exp(-‖x-y‖² / 2)`
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicalKernel;

impl ClassicalKernel {
    /// RBF over the common prefix of both vectors. Never fails.
    pub fn rbf(x: &[f64], y: &[f64]) -> f64 {
        let sq_dist: f64 = x.iter().zip(y).map(|(a, b)| (a - b) * (a - b)).sum();
        (-sq_dist / 2.0).exp()
    }
}

impl SimilarityKernel for ClassicalKernel {
    fn similarity(&self, x: &[f64], y: &[f64]) -> Result<f64, KernelError> {
        check_dims(x, y)?;
        Ok(Self::rbf(x, y))
    }

    fn name(&self) -> &'static str {
        "classical"
    }
}

// ============================================================================
// FALLBACK COMBINATOR
// ============================================================================

/// Primary strategy with per-pair classical fallback
#[derive(Debug, Clone, Default)]
pub struct FallbackKernel<P: SimilarityKernel = QuantumKernel> {
    primary: P,
}

impl<P: SimilarityKernel> FallbackKernel<P> {
    pub fn new(primary: P) -> Self {
        Self { primary }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// Never fails: a primary error is logged and replaced by the RBF value
    pub fn evaluate(&self, x: &[f64], y: &[f64]) -> SimilarityOutcome {
        match self.primary.similarity(x, y) {
            Ok(value) => SimilarityOutcome {
                value,
                strategy: SimilarityStrategy::Primary,
            },
            Err(e) => {
                log::debug!("{} kernel failed ({}), using classical fallback", self.primary.name(), e);
                SimilarityOutcome {
                    value: ClassicalKernel::rbf(x, y),
                    strategy: SimilarityStrategy::Fallback,
                }
            }
        }
    }
}

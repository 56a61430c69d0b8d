//! Kernel Module - Pairwise similarity and kernel matrices
//!
//! - `circuit` - statevector simulation capability
//! - `similarity` - quantum / classical strategies + per-pair fallback
//! - `matrix` - symmetric matrix construction, regularization, validation

pub mod circuit;
pub mod similarity;
pub mod matrix;

// Re-export common types
pub use circuit::{Circuit, CircuitSimulator, Gate, StatevectorSimulator};
pub use similarity::{
    ClassicalKernel, FallbackKernel, QuantumKernel, SimilarityKernel, SimilarityOutcome,
    SimilarityStrategy,
};
pub use matrix::{KernelBuild, KernelMatrix, KernelMatrixBuilder, KernelStats};

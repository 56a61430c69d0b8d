//! Error handling
//!
//! Three layers:
//! - `SimulationError` - the circuit simulator refused or failed a circuit
//! - `KernelError` - one similarity pair failed (recovered by the fallback kernel)
//! - `DetectionError` - a whole pipeline stage failed (recovered by the fallback heuristic)

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type DetectionResult<T> = Result<T, DetectionError>;

/// Circuit simulation failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("circuit has no qubits")]
    EmptyRegister,

    #[error("circuit needs {requested} qubits, simulator limit is {limit}")]
    TooManyQubits { requested: usize, limit: usize },

    #[error("gate targets qubit {qubit} on a {qubits}-qubit register")]
    QubitOutOfRange { qubit: usize, qubits: usize },

    #[error("controlled-Z needs two distinct qubits, got {0} twice")]
    DuplicateQubit(usize),

    #[error("rotation angle on qubit {qubit} is not finite")]
    NonFiniteAngle { qubit: usize },
}

/// Failure of a single similarity evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("feature dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("{0}")]
    Other(String),
}

/// Pipeline stage that raised an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Setup,
    Preprocessing,
    KernelMatrix,
    Classification,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Setup => "setup",
            PipelineStage::Preprocessing => "preprocessing",
            PipelineStage::KernelMatrix => "kernel matrix",
            PipelineStage::Classification => "classification",
        };
        f.write_str(name)
    }
}

/// Stage-level failures. Any of these sends the pipeline to its fallback path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    // Dataset / preprocessing errors
    #[error("dataset is empty")]
    EmptyDataset,

    #[error("row {index} has {actual} features, expected {expected}")]
    RaggedDataset { index: usize, expected: usize, actual: usize },

    #[error("need at least {required} features per sample, got {actual}")]
    InsufficientDimensions { required: usize, actual: usize },

    #[error("feature ({row}, {col}) is not finite")]
    NonFiniteFeature { row: usize, col: usize },

    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    // Kernel matrix errors
    #[error("kernel matrix must be square, got {rows}x{cols}")]
    MatrixShape { rows: usize, cols: usize },

    #[error("invalid kernel matrix: entry ({row}, {col}) = {value}")]
    MatrixValidation { row: usize, col: usize, value: f64 },

    // Classifier errors
    #[error("classifier fit failed: {0}")]
    ClassifierFit(String),

    // Setup errors
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DetectionError {
    /// Stage this error aborts
    pub fn stage(&self) -> PipelineStage {
        match self {
            DetectionError::EmptyDataset
            | DetectionError::RaggedDataset { .. }
            | DetectionError::InsufficientDimensions { .. }
            | DetectionError::NonFiniteFeature { .. }
            | DetectionError::Preprocessing(_) => PipelineStage::Preprocessing,
            DetectionError::MatrixShape { .. } | DetectionError::MatrixValidation { .. } => {
                PipelineStage::KernelMatrix
            }
            DetectionError::ClassifierFit(_) => PipelineStage::Classification,
            DetectionError::InvalidConfig(_) => PipelineStage::Setup,
        }
    }
}

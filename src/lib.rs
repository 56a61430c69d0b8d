//! Quantum Anomaly Core
//!
//! Classifies behaviour vectors as normal or anomalous with a one-class SVM
//! over a kernel matrix. Kernel entries come from a simulated 3-qubit
//! encoding circuit, with a Gaussian RBF fallback per pair and a seeded
//! heuristic fallback for the whole run.
//!
//! ```no_run
//! use quantum_anomaly_core::run_anomaly_detection;
//!
//! let result = run_anomaly_detection(None);
//! println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! ```

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{DetectionError, DetectionResult, KernelError, PipelineStage, SimulationError};
pub use logic::config::DetectionConfig;
pub use logic::features::{Dataset, FeatureVector};
pub use logic::pipeline::{
    run_anomaly_detection, run_anomaly_detection_with, AnomalyResult, Pipeline, PipelineState,
};

//! Model Module - One-class classification on precomputed kernels
//!
//! `ocsvm` is the solver, `classifier` maps its output to anomaly flags.

pub mod ocsvm;
pub mod classifier;

// Re-export common types
pub use ocsvm::{FitSummary, Label, OneClassSvm};
pub use classifier::{AnomalyClassifier, Classification};

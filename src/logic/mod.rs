//! Logic Module - Detection engine
//!
//! Data flow:
//! raw data → `features` (PCA + angle scaling) → `kernel` (similarity
//! matrix) → `model` (one-class SVM) → `pipeline` (result assembly)

pub mod config;
pub mod features;
pub mod kernel;
pub mod model;
pub mod pipeline;

#[cfg(test)]
mod tests;

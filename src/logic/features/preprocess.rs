//! Feature Preprocessor
//!
//! Raw behaviour vectors → 3 principal components → rotation angles in
//! `[0, 2π]`. The projection is fit on the batch it transforms.

use std::f64::consts::TAU;

use ndarray::Array2;

use super::pca::{DimensionReducer, Pca};
use super::vector::Dataset;
use crate::constants::TARGET_DIMENSIONS;
use crate::error::{DetectionError, DetectionResult};

pub struct FeaturePreprocessor<R: DimensionReducer = Pca> {
    reducer: R,
    target_dims: usize,
}

impl FeaturePreprocessor<Pca> {
    pub fn new() -> Self {
        Self::with_reducer(Pca)
    }
}

impl Default for FeaturePreprocessor<Pca> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: DimensionReducer> FeaturePreprocessor<R> {
    pub fn with_reducer(reducer: R) -> Self {
        Self {
            reducer,
            target_dims: TARGET_DIMENSIONS,
        }
    }

    pub fn target_dims(&self) -> usize {
        self.target_dims
    }

    /// Reduce and rescale a dataset
    pub fn fit_transform(&self, data: &Dataset) -> DetectionResult<Dataset> {
        if data.is_empty() {
            return Err(DetectionError::EmptyDataset);
        }
        if data.dim() < self.target_dims {
            return Err(DetectionError::InsufficientDimensions {
                required: self.target_dims,
                actual: data.dim(),
            });
        }
        if let Some((row, col)) = data.first_non_finite() {
            return Err(DetectionError::NonFiniteFeature { row, col });
        }

        let reduced = self.reducer.fit_transform(&data.to_array(), self.target_dims)?;
        if reduced.dim() != (data.len(), self.target_dims) {
            return Err(DetectionError::Preprocessing(format!(
                "reducer returned shape {:?}, expected ({}, {})",
                reduced.dim(),
                data.len(),
                self.target_dims
            )));
        }

        let scaled = rescale_to_angles(&reduced);
        log::debug!(
            "Preprocessed {} samples: {} -> {} features",
            data.len(),
            data.dim(),
            self.target_dims
        );
        Ok(Dataset::from_array(&scaled))
    }
}

/// Affine map of every coordinate into `[0, 2π]` using the global min/max.
/// Constant input maps to all zeros.
pub fn rescale_to_angles(values: &Array2<f64>) -> Array2<f64> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if max > min {
        let range = max - min;
        values.mapv(|v| ((v - min) / range) * TAU)
    } else {
        Array2::zeros(values.raw_dim())
    }
}

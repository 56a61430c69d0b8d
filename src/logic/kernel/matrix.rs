//! Kernel Matrix
//!
//! Symmetric N×N similarity matrix. Only pairs `i <= j` are evaluated;
//! each value is written to `[i][j]` and `[j][i]` together.

use ndarray::Array2;
use serde::Serialize;

use super::similarity::{FallbackKernel, QuantumKernel, SimilarityKernel};
use crate::constants::DEFAULT_REGULARIZATION;
use crate::error::{DetectionError, DetectionResult};
use crate::logic::features::Dataset;

/// Square similarity matrix
#[derive(Debug, Clone, PartialEq)]
pub struct KernelMatrix {
    values: Array2<f64>,
}

impl KernelMatrix {
    /// Wrap an existing square array
    pub fn from_array(values: Array2<f64>) -> DetectionResult<Self> {
        let (rows, cols) = values.dim();
        if rows != cols {
            return Err(DetectionError::MatrixShape { rows, cols });
        }
        Ok(Self { values })
    }

    fn zeros(n: usize) -> Self {
        Self {
            values: Array2::zeros((n, n)),
        }
    }

    /// Number of samples
    pub fn size(&self) -> usize {
        self.values.nrows()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get((i, j)).copied()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_array(self) -> Array2<f64> {
        self.values
    }

    pub fn diagonal(&self) -> Vec<f64> {
        self.values.diag().to_vec()
    }

    /// Row-major nested vectors (for JSON output)
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.outer_iter().map(|row| row.to_vec()).collect()
    }

    /// Exact symmetry check
    pub fn is_symmetric(&self) -> bool {
        let n = self.size();
        (0..n).all(|i| (i + 1..n).all(|j| self.values[[i, j]] == self.values[[j, i]]))
    }

    /// Add `epsilon` to every diagonal entry
    pub fn regularize(&mut self, epsilon: f64) {
        self.values.diag_mut().mapv_inplace(|v| v + epsilon);
    }

    /// Reject NaN / ±Inf entries
    pub fn validate(&self) -> DetectionResult<()> {
        match self
            .values
            .indexed_iter()
            .find(|(_, v)| !v.is_finite())
        {
            Some(((row, col), &value)) => Err(DetectionError::MatrixValidation { row, col, value }),
            None => Ok(()),
        }
    }

    fn set_pair(&mut self, i: usize, j: usize, value: f64) {
        self.values[[i, j]] = value;
        self.values[[j, i]] = value;
    }
}

/// Builder output
#[derive(Debug, Clone)]
pub struct KernelBuild {
    pub matrix: KernelMatrix,
    /// Pairs (i <= j) answered by the fallback strategy
    pub fallback_count: usize,
    /// Pairs evaluated, N(N+1)/2
    pub pair_count: usize,
}

impl KernelBuild {
    pub fn stats(&self) -> KernelStats {
        KernelStats {
            size: self.matrix.size(),
            pair_count: self.pair_count,
            fallback_count: self.fallback_count,
            fallback_rate: if self.pair_count > 0 {
                self.fallback_count as f64 / self.pair_count as f64
            } else {
                0.0
            },
        }
    }

    /// Every pair came from the fallback strategy
    pub fn fully_classical(&self) -> bool {
        self.pair_count > 0 && self.fallback_count == self.pair_count
    }
}

/// Kernel build statistics
#[derive(Debug, Clone, Serialize)]
pub struct KernelStats {
    pub size: usize,
    pub pair_count: usize,
    pub fallback_count: usize,
    pub fallback_rate: f64,
}

/// Builds, regularizes and validates kernel matrices
#[derive(Debug, Clone)]
pub struct KernelMatrixBuilder<K: SimilarityKernel = QuantumKernel> {
    kernel: FallbackKernel<K>,
    regularization: f64,
}

impl Default for KernelMatrixBuilder<QuantumKernel> {
    fn default() -> Self {
        Self::new(QuantumKernel::default())
    }
}

impl<K: SimilarityKernel> KernelMatrixBuilder<K> {
    pub fn new(primary: K) -> Self {
        Self {
            kernel: FallbackKernel::new(primary),
            regularization: DEFAULT_REGULARIZATION,
        }
    }

    pub fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }

    pub fn regularization(&self) -> f64 {
        self.regularization
    }

    /// Evaluate all pairs, regularize the diagonal, then validate
    pub fn build(&self, data: &Dataset) -> DetectionResult<KernelBuild> {
        self.finish(self.evaluate(data))
    }

    /// Evaluate every pair `i <= j`. The matrix is neither regularized nor
    /// validated yet.
    pub fn evaluate(&self, data: &Dataset) -> KernelBuild {
        let n = data.len();
        let mut matrix = KernelMatrix::zeros(n);
        let mut fallback_count = 0;
        let mut pair_count = 0;

        for i in 0..n {
            let x = data.rows()[i].as_slice();
            for j in i..n {
                let outcome = self.kernel.evaluate(x, data.rows()[j].as_slice());
                if outcome.used_fallback() {
                    fallback_count += 1;
                }
                matrix.set_pair(i, j, outcome.value);
                pair_count += 1;
            }
        }

        if fallback_count > 0 {
            log::warn!(
                "{} of {} {} kernel evaluations failed, used classical fallback",
                fallback_count,
                pair_count,
                self.kernel.primary().name()
            );
        }

        KernelBuild {
            matrix,
            fallback_count,
            pair_count,
        }
    }

    /// Regularize the diagonal of an evaluated matrix, then reject NaN / ±Inf
    pub fn finish(&self, mut build: KernelBuild) -> DetectionResult<KernelBuild> {
        build.matrix.regularize(self.regularization);
        build.matrix.validate()?;

        let n = build.matrix.size();
        log::debug!(
            "Kernel matrix {}x{} diagonal head: {:?}",
            n,
            n,
            &build.matrix.diagonal()[..n.min(3)]
        );
        Ok(build)
    }
}

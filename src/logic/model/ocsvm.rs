//! One-Class SVM on a precomputed kernel
//!
//! ν-formulation solved with SMO (second-order working-set selection, as in
//! libsvm). Dual:
//!
//! ```text
//! min ½ αᵀKα   s.t.  0 ≤ αᵢ ≤ 1,  Σαᵢ = ν·l
//! ```
//!
//! Decision function: `f(x) = Σ αᵢ K(x, xᵢ) - ρ`. Positive means inlier.
//! No kernel-scale parameter is needed because the kernel is precomputed.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_SOLVER_ITERATIONS, DEFAULT_SOLVER_TOLERANCE};
use crate::error::{DetectionError, DetectionResult};

/// Floor for non-positive curvature in the pair update
const TAU: f64 = 1e-12;

/// Symmetry tolerance for `fit`
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Per-sample label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Inlier,
    Outlier,
}

impl Label {
    pub fn from_decision(value: f64) -> Self {
        if value > 0.0 {
            Label::Inlier
        } else {
            Label::Outlier
        }
    }
}

/// Solver summary
#[derive(Debug, Clone, Serialize)]
pub struct FitSummary {
    pub iterations: usize,
    pub converged: bool,
    pub support_vectors: usize,
    pub bounded_support_vectors: usize,
    pub rho: f64,
}

#[derive(Debug, Clone)]
struct FittedModel {
    alpha: Array1<f64>,
    rho: f64,
}

/// One-class SVM (`kernel = precomputed`)
#[derive(Debug, Clone)]
pub struct OneClassSvm {
    nu: f64,
    tolerance: f64,
    max_iterations: usize,
    model: Option<FittedModel>,
}

impl OneClassSvm {
    pub fn new(nu: f64) -> Self {
        Self {
            nu,
            tolerance: DEFAULT_SOLVER_TOLERANCE,
            max_iterations: DEFAULT_MAX_SOLVER_ITERATIONS,
            model: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Dual coefficients of the fitted model
    pub fn alpha(&self) -> Option<&Array1<f64>> {
        self.model.as_ref().map(|m| &m.alpha)
    }

    pub fn rho(&self) -> Option<f64> {
        self.model.as_ref().map(|m| m.rho)
    }

    /// Fit on the training Gram matrix (l × l)
    pub fn fit(&mut self, kernel: &Array2<f64>) -> DetectionResult<FitSummary> {
        check_gram(kernel)?;
        if !(self.nu > 0.0 && self.nu <= 1.0) {
            return Err(DetectionError::ClassifierFit(format!(
                "nu must be in (0, 1], got {}",
                self.nu
            )));
        }

        let l = kernel.nrows();
        let q_diag: Vec<f64> = kernel.diag().to_vec();

        // Feasible start: first ⌊νl⌋ at the upper bound, remainder on the next
        let nu_l = self.nu * l as f64;
        let full = (nu_l.floor() as usize).min(l);
        let mut alpha = Array1::<f64>::zeros(l);
        for a in alpha.iter_mut().take(full) {
            *a = 1.0;
        }
        if full < l {
            alpha[full] = nu_l - full as f64;
        }

        let mut gradient = kernel.dot(&alpha);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            let Some((i, j)) = self.select_working_set(kernel, &q_diag, &alpha, &gradient) else {
                converged = true;
                break;
            };
            iterations += 1;

            let old_i = alpha[i];
            let old_j = alpha[j];

            let mut quad = q_diag[i] + q_diag[j] - 2.0 * kernel[[i, j]];
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (gradient[i] - gradient[j]) / quad;
            let sum = old_i + old_j;
            let mut new_i = old_i - delta;
            let mut new_j = old_j + delta;

            // Project back onto the box while keeping αᵢ + αⱼ fixed
            if sum > 1.0 {
                if new_i > 1.0 {
                    new_i = 1.0;
                    new_j = sum - 1.0;
                }
                if new_j > 1.0 {
                    new_j = 1.0;
                    new_i = sum - 1.0;
                }
            } else {
                if new_j < 0.0 {
                    new_j = 0.0;
                    new_i = sum;
                }
                if new_i < 0.0 {
                    new_i = 0.0;
                    new_j = sum;
                }
            }

            alpha[i] = new_i;
            alpha[j] = new_j;

            let d_i = new_i - old_i;
            let d_j = new_j - old_j;
            for k in 0..l {
                gradient[k] += kernel[[k, i]] * d_i + kernel[[k, j]] * d_j;
            }
        }

        if !converged {
            log::warn!(
                "One-class SVM hit the iteration cap ({}) before converging",
                self.max_iterations
            );
        }

        let rho = compute_rho(&alpha, &gradient);
        if !rho.is_finite() {
            return Err(DetectionError::ClassifierFit(format!("offset rho is {}", rho)));
        }

        let support_vectors = alpha.iter().filter(|a| **a > 0.0).count();
        let bounded_support_vectors = alpha.iter().filter(|a| **a >= 1.0).count();
        log::debug!(
            "OCSVM fit: {} iterations, {} SVs ({} bounded), rho={:.6}",
            iterations,
            support_vectors,
            bounded_support_vectors,
            rho
        );

        self.model = Some(FittedModel { alpha, rho });

        Ok(FitSummary {
            iterations,
            converged,
            support_vectors,
            bounded_support_vectors,
            rho,
        })
    }

    /// `kernel` is n_test × l (rows: samples to score, cols: training samples)
    pub fn decision_function(&self, kernel: &Array2<f64>) -> DetectionResult<Array1<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| DetectionError::ClassifierFit("model is not fitted".into()))?;
        if kernel.ncols() != model.alpha.len() {
            return Err(DetectionError::ClassifierFit(format!(
                "kernel has {} columns, model was fitted on {} samples",
                kernel.ncols(),
                model.alpha.len()
            )));
        }
        Ok(kernel.dot(&model.alpha) - model.rho)
    }

    pub fn predict(&self, kernel: &Array2<f64>) -> DetectionResult<Vec<Label>> {
        Ok(self
            .decision_function(kernel)?
            .iter()
            .map(|v| Label::from_decision(*v))
            .collect())
    }

    /// Maximal violating pair with second-order selection for `j`.
    /// `None` once the KKT gap is below tolerance.
    fn select_working_set(
        &self,
        kernel: &Array2<f64>,
        q_diag: &[f64],
        alpha: &Array1<f64>,
        gradient: &Array1<f64>,
    ) -> Option<(usize, usize)> {
        let l = alpha.len();

        let mut g_max = f64::NEG_INFINITY;
        let mut i_sel = None;
        for t in 0..l {
            if alpha[t] < 1.0 && -gradient[t] >= g_max {
                g_max = -gradient[t];
                i_sel = Some(t);
            }
        }
        let i = i_sel?;

        let mut g_max2 = f64::NEG_INFINITY;
        let mut obj_min = f64::INFINITY;
        let mut j_sel = None;
        for t in 0..l {
            if alpha[t] <= 0.0 {
                continue;
            }
            g_max2 = g_max2.max(gradient[t]);
            let grad_diff = g_max + gradient[t];
            if grad_diff > 0.0 {
                let mut quad = q_diag[i] + q_diag[t] - 2.0 * kernel[[i, t]];
                if quad <= 0.0 {
                    quad = TAU;
                }
                let obj = -(grad_diff * grad_diff) / quad;
                if obj <= obj_min {
                    obj_min = obj;
                    j_sel = Some(t);
                }
            }
        }

        if g_max + g_max2 < self.tolerance {
            return None;
        }
        j_sel.map(|j| (i, j))
    }
}

/// Offset from free support vectors, or the midpoint of the feasible
/// interval when every αᵢ sits on a bound.
fn compute_rho(alpha: &Array1<f64>, gradient: &Array1<f64>) -> f64 {
    let mut upper = f64::INFINITY;
    let mut lower = f64::NEG_INFINITY;
    let mut free_sum = 0.0;
    let mut free_count = 0usize;

    for (a, g) in alpha.iter().zip(gradient.iter()) {
        if *a >= 1.0 {
            lower = lower.max(*g);
        } else if *a <= 0.0 {
            upper = upper.min(*g);
        } else {
            free_sum += g;
            free_count += 1;
        }
    }

    if free_count > 0 {
        free_sum / free_count as f64
    } else if upper.is_finite() && lower.is_finite() {
        (upper + lower) / 2.0
    } else if lower.is_finite() {
        lower
    } else {
        upper
    }
}

fn check_gram(kernel: &Array2<f64>) -> DetectionResult<()> {
    let (rows, cols) = kernel.dim();
    if rows == 0 {
        return Err(DetectionError::ClassifierFit("kernel matrix is empty".into()));
    }
    if rows != cols {
        return Err(DetectionError::ClassifierFit(format!(
            "kernel matrix must be square, got {}x{}",
            rows, cols
        )));
    }
    if let Some(((i, j), v)) = kernel.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(DetectionError::ClassifierFit(format!(
            "kernel entry ({}, {}) is {}",
            i, j, v
        )));
    }
    if let Some(i) = (0..rows).find(|&i| kernel[[i, i]] <= 0.0) {
        return Err(DetectionError::ClassifierFit(format!(
            "kernel diagonal ({}, {}) = {} is not positive",
            i,
            i,
            kernel[[i, i]]
        )));
    }
    for i in 0..rows {
        for j in (i + 1)..cols {
            if (kernel[[i, j]] - kernel[[j, i]]).abs() > SYMMETRY_TOLERANCE {
                return Err(DetectionError::ClassifierFit(format!(
                    "kernel is not symmetric at ({}, {})",
                    i, j
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn rbf_gram(points: &[f64]) -> Array2<f64> {
        let n = points.len();
        Array2::from_shape_fn((n, n), |(i, j)| {
            let d = points[i] - points[j];
            (-d * d / 2.0).exp()
        })
    }

    #[test]
    fn test_dual_constraints_hold() {
        let gram = rbf_gram(&[0.0, 0.1, 0.2, -0.1, 0.15, 5.0, 0.05, -0.2, 0.12, 0.3]);
        let mut svm = OneClassSvm::new(0.3);
        let summary = svm.fit(&gram).unwrap();
        assert!(summary.converged);

        let alpha = svm.alpha().unwrap();
        assert!(alpha.iter().all(|a| (0.0..=1.0).contains(a)));
        assert!((alpha.sum() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_isolated_point_is_outlier() {
        let gram = rbf_gram(&[0.0, 0.1, 0.2, -0.1, 0.15, 5.0, 0.05, -0.2, 0.12, 0.3]);
        let mut svm = OneClassSvm::new(0.3);
        svm.fit(&gram).unwrap();

        let scores = svm.decision_function(&gram).unwrap();
        let labels = svm.predict(&gram).unwrap();
        assert_eq!(labels[5], Label::Outlier);
        let min_index = scores
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(min_index, 5);
    }

    #[test]
    fn test_outlier_fraction_bounded_by_nu() {
        // ν upper-bounds the fraction of bounded SVs (training outliers with f < 0)
        let points: Vec<f64> = (0..20).map(|i| (i as f64 * 0.37).sin() * 2.0).collect();
        let gram = rbf_gram(&points);
        let mut svm = OneClassSvm::new(0.3);
        let summary = svm.fit(&gram).unwrap();
        assert!(summary.bounded_support_vectors as f64 <= 0.3 * 20.0 + 1e-9);
        assert!(summary.support_vectors as f64 >= 0.3 * 20.0 - 1e-9);
    }

    #[test]
    fn test_decision_requires_fit() {
        let svm = OneClassSvm::new(0.5);
        assert!(svm.decision_function(&array![[1.0]]).is_err());
    }

    #[test]
    fn test_rejects_invalid_gram() {
        let mut svm = OneClassSvm::new(0.3);
        assert!(svm.fit(&Array2::zeros((0, 0))).is_err());
        assert!(svm.fit(&array![[1.0, f64::NAN], [f64::NAN, 1.0]]).is_err());
        assert!(svm.fit(&array![[1.0, 0.2], [0.5, 1.0]]).is_err());
        assert!(svm.fit(&array![[0.0, 0.0], [0.0, 1.0]]).is_err());
        assert!(svm.fit(&array![[1.0, 0.5, 0.2], [0.5, 1.0, 0.3]]).is_err());
        assert!(!svm.is_fitted());
    }

    #[test]
    fn test_rejects_bad_nu() {
        let gram = rbf_gram(&[0.0, 1.0]);
        assert!(OneClassSvm::new(0.0).fit(&gram).is_err());
        assert!(OneClassSvm::new(1.2).fit(&gram).is_err());
    }

    #[test]
    fn test_nu_one_all_bounded() {
        let gram = rbf_gram(&[0.0, 1.0, 2.0]);
        let mut svm = OneClassSvm::new(1.0);
        let summary = svm.fit(&gram).unwrap();
        assert_eq!(summary.bounded_support_vectors, 3);
        assert!(summary.rho.is_finite());
    }

    #[test]
    fn test_label_convention() {
        assert_eq!(Label::from_decision(0.1), Label::Inlier);
        assert_eq!(Label::from_decision(0.0), Label::Outlier);
    }
}

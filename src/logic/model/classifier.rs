//! Anomaly Classifier
//!
//! Maps one-class SVM output onto per-sample anomaly flags and scores.
//! Scores are the raw decision values (more negative = more anomalous).

use serde::Serialize;

use super::ocsvm::{FitSummary, Label, OneClassSvm};
use crate::constants::{DEFAULT_MAX_SOLVER_ITERATIONS, DEFAULT_NU, DEFAULT_SOLVER_TOLERANCE};
use crate::error::DetectionResult;
use crate::logic::kernel::KernelMatrix;

/// Classification output, indexed like the dataset
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    /// Anomalous sample indices, ascending
    pub anomalies: Vec<usize>,
    /// Decision value per sample
    pub scores: Vec<f64>,
    pub labels: Vec<Label>,
    /// `None` when the single-sample policy skipped fitting
    pub fit: Option<FitSummary>,
}

#[derive(Debug, Clone)]
pub struct AnomalyClassifier {
    nu: f64,
    tolerance: f64,
    max_iterations: usize,
}

impl Default for AnomalyClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_NU)
    }
}

impl AnomalyClassifier {
    pub fn new(nu: f64) -> Self {
        Self {
            nu,
            tolerance: DEFAULT_SOLVER_TOLERANCE,
            max_iterations: DEFAULT_MAX_SOLVER_ITERATIONS,
        }
    }

    pub fn with_solver(mut self, tolerance: f64, max_iterations: usize) -> Self {
        self.tolerance = tolerance;
        self.max_iterations = max_iterations;
        self
    }

    pub fn nu(&self) -> f64 {
        self.nu
    }

    /// Fit on the matrix and score the same samples.
    ///
    /// A single sample is never anomalous and scores 0.0: there is nothing
    /// to compare it against.
    pub fn classify(&self, matrix: &KernelMatrix) -> DetectionResult<Classification> {
        let gram = matrix.as_array();

        if matrix.size() == 1 {
            log::info!("Single sample: skipping fit, reporting as normal");
            return Ok(Classification {
                anomalies: Vec::new(),
                scores: vec![0.0],
                labels: vec![Label::Inlier],
                fit: None,
            });
        }

        let mut svm = OneClassSvm::new(self.nu)
            .with_tolerance(self.tolerance)
            .with_max_iterations(self.max_iterations);
        let summary = svm.fit(gram)?;

        let scores = svm.decision_function(gram)?.to_vec();
        let labels: Vec<Label> = scores.iter().map(|s| Label::from_decision(*s)).collect();
        let anomalies: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == Label::Outlier)
            .map(|(i, _)| i)
            .collect();

        log::info!("Found {} anomalies out of {} samples", anomalies.len(), scores.len());

        Ok(Classification {
            anomalies,
            scores,
            labels,
            fit: Some(summary),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectionError;
    use ndarray::{array, Array2};

    #[test]
    fn test_single_sample_policy() {
        let matrix = KernelMatrix::from_array(array![[1.0 + 1e-6]]).unwrap();
        let result = AnomalyClassifier::default().classify(&matrix).unwrap();
        assert!(result.anomalies.is_empty());
        assert_eq!(result.scores, vec![0.0]);
        assert!(result.fit.is_none());
    }

    #[test]
    fn test_anomalies_ascending_and_match_labels() {
        let points = [
            0.0, 3.0, 0.1, 0.2, -4.0, 0.05, 0.15, 0.12, 6.0, -0.1, 0.02, 0.08, -0.05, 0.18, 0.22,
            -0.15, 0.11, 0.07, 0.03, 0.25,
        ];
        let n = points.len();
        let gram = Array2::from_shape_fn((n, n), |(i, j)| {
            let d: f64 = points[i] - points[j];
            (-d * d / 2.0).exp()
        });
        let matrix = KernelMatrix::from_array(gram).unwrap();
        let result = AnomalyClassifier::default().classify(&matrix).unwrap();

        assert_eq!(result.scores.len(), n);
        assert!(result.anomalies.windows(2).all(|w| w[0] < w[1]));
        for (i, label) in result.labels.iter().enumerate() {
            assert_eq!(*label == Label::Outlier, result.anomalies.contains(&i));
        }
        for far in [1, 4, 8] {
            assert!(result.anomalies.contains(&far), "index {} should be anomalous", far);
        }
    }

    #[test]
    fn test_invalid_matrix_is_fit_failure() {
        let matrix = KernelMatrix::from_array(array![[-1.0, 0.0], [0.0, 1.0]]).unwrap();
        assert!(matches!(
            AnomalyClassifier::default().classify(&matrix),
            Err(DetectionError::ClassifierFit(_))
        ));
    }
}

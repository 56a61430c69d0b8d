//! End-to-end tests for the detection pipeline
//!
//! Runs the stages together on the seeded behaviour dataset and checks
//! the fallback paths.

use std::f64::consts::TAU;

use crate::constants::*;
use crate::error::{DetectionError, KernelError, PipelineStage};
use crate::logic::config::DetectionConfig;
use crate::logic::features::{generate_behavior_dataset, Dataset, FeaturePreprocessor};
use crate::logic::kernel::{ClassicalKernel, KernelMatrixBuilder, SimilarityKernel};
use crate::logic::model::AnomalyClassifier;
use crate::logic::pipeline::{
    fallback_scores, run_anomaly_detection, run_anomaly_detection_with, Pipeline, PipelineState,
};

struct AlwaysFails;

impl SimilarityKernel for AlwaysFails {
    fn similarity(&self, _: &[f64], _: &[f64]) -> Result<f64, KernelError> {
        Err(KernelError::Other("simulator offline".into()))
    }

    fn name(&self) -> &'static str {
        "always-fails"
    }
}

struct NanKernel;

impl SimilarityKernel for NanKernel {
    fn similarity(&self, _: &[f64], _: &[f64]) -> Result<f64, KernelError> {
        Ok(f64::NAN)
    }

    fn name(&self) -> &'static str {
        "nan"
    }
}

/// NaN on the diagonal, failure everywhere else
struct FailsOffDiagonal;

impl SimilarityKernel for FailsOffDiagonal {
    fn similarity(&self, x: &[f64], y: &[f64]) -> Result<f64, KernelError> {
        if x == y {
            Ok(f64::NAN)
        } else {
            Err(KernelError::Other("simulator offline".into()))
        }
    }

    fn name(&self) -> &'static str {
        "fails-off-diagonal"
    }
}

fn low_dimensional_dataset() -> Dataset {
    Dataset::from_rows(vec![vec![1.0, 2.0], vec![2.0, 3.0], vec![3.0, 1.0], vec![0.0, 0.5]]).unwrap()
}

/// 15 × 5 demo data → 15 × 3 angles → 15 × 15 kernel → anomalies from the
/// minority cluster with the lowest scores
#[test]
fn test_demo_scenario_stage_by_stage() {
    let synth = generate_behavior_dataset(15, DEFAULT_SEED).unwrap();
    assert_eq!(synth.anomalous, vec![12, 13, 14]);

    let reduced = FeaturePreprocessor::new().fit_transform(&synth.data).unwrap();
    assert_eq!(reduced.len(), 15);
    assert_eq!(reduced.dim(), 3);
    for row in reduced.iter() {
        assert!(row.as_slice().iter().all(|v| (0.0..=TAU).contains(v)));
    }

    let build = KernelMatrixBuilder::default().build(&reduced).unwrap();
    assert_eq!(build.matrix.size(), 15);
    assert!(build.matrix.is_symmetric());
    assert_eq!(build.fallback_count, 0);

    let result = AnomalyClassifier::default().classify(&build.matrix).unwrap();
    assert_eq!(result.scores.len(), 15);

    let normal_avg = (0..12).map(|i| result.scores[i]).sum::<f64>() / 12.0;
    let anomalous_avg = synth.anomalous.iter().map(|&i| result.scores[i]).sum::<f64>() / 3.0;
    assert!(anomalous_avg < normal_avg);

    let flagged: Vec<usize> = result
        .anomalies
        .iter()
        .copied()
        .filter(|i| synth.is_anomalous(*i))
        .collect();
    assert!(!flagged.is_empty(), "no anomalous-cluster sample flagged: {:?}", result.anomalies);
    for i in flagged {
        assert!(result.scores[i] < normal_avg);
    }
}

#[test]
fn test_default_entry_point_succeeds() {
    let result = run_anomaly_detection(None);
    assert!(result.success, "unexpected fallback: {:?}", result.error);
    assert_eq!(result.method, METHOD_QUANTUM);
    assert_eq!(result.samples, DEFAULT_SAMPLE_COUNT);
    assert_eq!(result.quantum_errors, 0);
    assert_eq!(result.state, PipelineState::Done);
    assert!(result.is_well_formed());
    assert!(!result.anomalies.is_empty());
    assert!(result.kernel_matrix.is_none());
}

#[test]
fn test_preprocessing_is_deterministic() {
    let synth = generate_behavior_dataset(15, 11).unwrap();
    let first = FeaturePreprocessor::new().fit_transform(&synth.data).unwrap();
    let second = FeaturePreprocessor::new().fit_transform(&synth.data).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_same_input_same_result() {
    let synth = generate_behavior_dataset(15, 5).unwrap();
    let a = run_anomaly_detection(Some(&synth.data));
    let b = run_anomaly_detection(Some(&synth.data));
    assert_eq!(a.anomalies, b.anomalies);
    assert_eq!(a.scores, b.scores);
}

#[test]
fn test_single_vector_run() {
    let data = Dataset::from_rows(vec![vec![12.0, 3.0, 7.5, 1.0, 0.2]]).unwrap();
    let mut pipeline = Pipeline::new(DetectionConfig::default()).unwrap();
    let result = pipeline.run(&data);

    assert!(result.success);
    assert_eq!(result.scores, vec![0.0]);
    assert!(result.anomalies.is_empty());
    assert_eq!(result.quantum_errors, 0);
    assert_eq!(
        pipeline.history(),
        &[
            PipelineState::Ready,
            PipelineState::Preprocessing,
            PipelineState::BuildingKernel,
            PipelineState::Classifying,
            PipelineState::Done,
        ]
    );
}

#[test]
fn test_low_dimensional_input_falls_back() {
    let data = low_dimensional_dataset();
    let mut pipeline = Pipeline::new(DetectionConfig::default()).unwrap();
    let result = pipeline.run(&data);

    assert!(!result.success);
    assert_eq!(result.method, METHOD_FALLBACK);
    assert_eq!(result.failed_stage, Some(PipelineStage::Preprocessing));
    assert!(result.error.as_deref().unwrap_or("").contains("at least 3 features"));
    assert_eq!(result.samples, 4);
    assert!(result.is_well_formed());
    assert_eq!(pipeline.state(), PipelineState::FallbackComplete);
    assert_eq!(
        pipeline.history(),
        &[
            PipelineState::Ready,
            PipelineState::Preprocessing,
            PipelineState::Failed,
            PipelineState::FallbackComplete,
        ]
    );
}

#[test]
fn test_empty_dataset_gives_empty_fallback() {
    let result = run_anomaly_detection(Some(&Dataset::default()));
    assert!(!result.success);
    assert_eq!(result.method, METHOD_FALLBACK);
    assert_eq!(result.samples, 0);
    assert!(result.scores.is_empty());
    assert!(result.anomalies.is_empty());
    assert_eq!(result.error, Some(DetectionError::EmptyDataset.to_string()));
    assert!(result.is_well_formed());
}

#[test]
fn test_invalid_config_with_empty_dataset_stays_empty() {
    let config = DetectionConfig::default().with_nu(2.0);
    let result = run_anomaly_detection_with(&config, Some(&Dataset::default()));
    assert_eq!(result.failed_stage, Some(PipelineStage::Setup));
    assert!(result.scores.is_empty());
    assert!(result.is_well_formed());
}

#[test]
fn test_fallback_heuristic_contract() {
    let a = fallback_scores(40, 9);
    let b = fallback_scores(40, 9);
    assert_eq!(a.scores, b.scores);
    assert!(a
        .scores
        .iter()
        .all(|s| (-FALLBACK_SCORE_RANGE..FALLBACK_SCORE_RANGE).contains(s)));
    for (i, score) in a.scores.iter().enumerate() {
        assert_eq!(a.anomalies.contains(&i), *score < FALLBACK_ANOMALY_CUTOFF);
    }
    assert!(a.anomalies.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_forced_kernel_failure_counts_every_pair() {
    let synth = generate_behavior_dataset(15, DEFAULT_SEED).unwrap();
    let n = synth.data.len();

    let mut forced = Pipeline::with_kernel(DetectionConfig::default(), AlwaysFails).unwrap();
    let forced_result = forced.run(&synth.data);
    let mut classical = Pipeline::with_kernel(DetectionConfig::default(), ClassicalKernel).unwrap();
    let classical_result = classical.run(&synth.data);

    assert!(forced_result.success);
    assert_eq!(forced_result.quantum_errors, n * (n + 1) / 2);
    assert_eq!(forced_result.method, METHOD_CLASSICAL_KERNEL);
    assert_eq!(classical_result.quantum_errors, 0);
    for (a, b) in forced_result.scores.iter().zip(&classical_result.scores) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn test_invalid_matrix_aborts_to_fallback() {
    let synth = generate_behavior_dataset(15, DEFAULT_SEED).unwrap();
    let mut pipeline = Pipeline::with_kernel(DetectionConfig::default(), NanKernel).unwrap();
    let result = pipeline.run(&synth.data);

    assert!(!result.success);
    assert_eq!(result.failed_stage, Some(PipelineStage::KernelMatrix));
    assert!(result.error.as_deref().unwrap_or("").contains("invalid kernel matrix"));
    assert_eq!(result.scores.len(), 15);
    assert!(result.is_well_formed());
    assert_eq!(
        pipeline.history(),
        &[
            PipelineState::Ready,
            PipelineState::Preprocessing,
            PipelineState::BuildingKernel,
            PipelineState::Failed,
            PipelineState::FallbackComplete,
        ]
    );
}

#[test]
fn test_validation_failure_keeps_fallback_count() {
    let synth = generate_behavior_dataset(15, DEFAULT_SEED).unwrap();
    let n = synth.data.len();
    let mut pipeline = Pipeline::with_kernel(DetectionConfig::default(), FailsOffDiagonal).unwrap();
    let result = pipeline.run(&synth.data);

    assert!(!result.success);
    assert_eq!(result.failed_stage, Some(PipelineStage::KernelMatrix));
    assert_eq!(result.quantum_errors, n * (n - 1) / 2);
    assert!(result.is_well_formed());
}

#[test]
fn test_invalid_config_falls_back() {
    let config = DetectionConfig::default().with_nu(0.0);
    let result = run_anomaly_detection_with(&config, None);
    assert!(!result.success);
    assert_eq!(result.failed_stage, Some(PipelineStage::Setup));
    assert_eq!(result.scores.len(), DEFAULT_SAMPLE_COUNT);
    assert!(result.state.is_terminal());
}

#[test]
fn test_kernel_matrix_attached_on_request() {
    let config = DetectionConfig {
        include_kernel_matrix: true,
        ..Default::default()
    };
    let result = run_anomaly_detection_with(&config, None);
    let matrix = result.kernel_matrix.expect("kernel matrix requested");
    assert_eq!(matrix.len(), DEFAULT_SAMPLE_COUNT);
    assert!(matrix.iter().all(|row| row.len() == DEFAULT_SAMPLE_COUNT));
}

#[test]
fn test_result_json_shape() {
    let result = run_anomaly_detection(None);
    let json = serde_json::to_value(&result).unwrap();
    for key in ["anomalies", "scores", "method", "quantum_errors", "success"] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    assert!(json.get("error").is_none());
    assert!(json.get("failed_stage").is_none());
    assert_eq!(json["state"], "done");

    let fallback = run_anomaly_detection(Some(&low_dimensional_dataset()));
    let json = serde_json::to_value(&fallback).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["error"].is_string());
    assert_eq!(json["failed_stage"], "preprocessing");
    assert_eq!(json["state"], "fallback_complete");
}

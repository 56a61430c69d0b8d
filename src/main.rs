//! Quantum Anomaly - CLI entry point
//!
//! Usage: `quantum-anomaly [dataset.json]`
//!
//! The dataset file is a JSON array of equal-length number arrays. Without
//! it, the seeded synthetic behaviour dataset is used. The result is
//! printed to stdout as JSON.

use std::path::Path;
use std::process::ExitCode;

use quantum_anomaly_core::constants::{APP_NAME, APP_VERSION};
use quantum_anomaly_core::logic::kernel::{QuantumKernel, SimilarityKernel};
use quantum_anomaly_core::{run_anomaly_detection_with, Dataset, DetectionConfig};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    dotenvy::dotenv().ok();

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    let config = DetectionConfig::from_env();
    log::debug!("Config: {:?}", config);

    kernel_self_check(&config);

    let dataset = match std::env::args().nth(1) {
        Some(path) => match load_dataset(Path::new(&path)) {
            Ok(data) => {
                log::info!("Loaded {} samples x {} features from {}", data.len(), data.dim(), path);
                Some(data)
            }
            Err(e) => {
                log::error!("Cannot load dataset {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let result = run_anomaly_detection_with(&config, dataset.as_ref());

    if result.success {
        log::info!("Anomaly detection completed ({})", result.method);
        log::info!("Anomaly indices: {:?}", result.anomalies);
    } else {
        log::warn!(
            "Anomaly detection used fallback method: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    match serde_json::to_string_pretty(&result) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Cannot serialize result: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Evaluate the circuit kernel on a fixed pair before the real run
fn kernel_self_check(config: &DetectionConfig) {
    let kernel = QuantumKernel::new(config.max_qubits, config.angle_clamp);
    match kernel.similarity(&[0.1, 0.2, 0.3], &[0.4, 0.5, 0.6]) {
        Ok(value) => log::info!("Quantum kernel self-check passed: k = {:.6}", value),
        Err(e) => log::warn!("Quantum kernel self-check failed: {} - pairs will use the classical kernel", e),
    }
}

fn load_dataset(path: &Path) -> Result<Dataset, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

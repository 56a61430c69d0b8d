//! Features Module - Dataset types and preprocessing
//!
//! - `vector` - `FeatureVector` / `Dataset`
//! - `pca` - principal component projection
//! - `preprocess` - PCA to 3 components + angle rescaling
//! - `synthetic` - seeded demo behaviour data

pub mod vector;
pub mod pca;
pub mod preprocess;
pub mod synthetic;

// Re-export common types
pub use vector::{Dataset, FeatureVector};
pub use pca::{DimensionReducer, Pca, PcaModel};
pub use preprocess::{rescale_to_angles, FeaturePreprocessor};
pub use synthetic::{generate_behavior_dataset, BehaviorProfile, SyntheticConfig, SyntheticDataset};

//! Feature Vector & Dataset - Core data structures for the detector
//!
//! A `Dataset` is an ordered list of equal-length `FeatureVector`s.
//! Row order is the sample index reported in `AnomalyResult`.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{DetectionError, DetectionResult};

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// Immutable behaviour vector
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Number of features
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

// ============================================================================
// DATASET
// ============================================================================

/// Ordered collection of vectors sharing one dimensionality
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    rows: Vec<FeatureVector>,
}

impl Dataset {
    /// Build from vectors. Fails if any row's length differs from the first.
    pub fn new(rows: Vec<FeatureVector>) -> DetectionResult<Self> {
        if let Some(first) = rows.first() {
            let expected = first.dim();
            if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.dim() != expected) {
                return Err(DetectionError::RaggedDataset {
                    index,
                    expected,
                    actual: row.dim(),
                });
            }
        }
        Ok(Self { rows })
    }

    /// Build from raw rows
    pub fn from_rows(rows: Vec<Vec<f64>>) -> DetectionResult<Self> {
        Self::new(rows.into_iter().map(FeatureVector::new).collect())
    }

    /// Build from an `n × d` array (always rectangular)
    pub fn from_array(array: &Array2<f64>) -> Self {
        Self {
            rows: array
                .outer_iter()
                .map(|row| FeatureVector::new(row.to_vec()))
                .collect(),
        }
    }

    /// Copy into an `n × d` array
    pub fn to_array(&self) -> Array2<f64> {
        let n = self.len();
        let d = self.dim();
        Array2::from_shape_fn((n, d), |(i, j)| self.rows[i].as_slice()[j])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Features per row (0 for an empty dataset)
    pub fn dim(&self) -> usize {
        self.rows.first().map(FeatureVector::dim).unwrap_or(0)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureVector> {
        self.rows.iter()
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    /// First non-finite coordinate, as (row, col)
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        self.rows.iter().enumerate().find_map(|(i, row)| {
            row.as_slice()
                .iter()
                .position(|v| !v.is_finite())
                .map(|j| (i, j))
        })
    }
}

impl<'de> Deserialize<'de> for Dataset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let rows = Vec::<Vec<f64>>::deserialize(deserializer)?;
        Dataset::from_rows(rows).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a FeatureVector;
    type IntoIter = std::slice::Iter<'a, FeatureVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

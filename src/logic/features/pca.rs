//! Principal Component Analysis
//!
//! Covariance eigendecomposition with a cyclic Jacobi solver. Feature
//! counts here are tiny (5 behaviour features), so an O(d³) dense solver
//! is plenty.

use ndarray::{Array1, Array2, Axis};

use crate::error::{DetectionError, DetectionResult};

/// Linear dimensionality reduction capability
pub trait DimensionReducer {
    /// Fit on `data` (n × d) and project it onto `k` components (n × k)
    fn fit_transform(&self, data: &Array2<f64>, k: usize) -> DetectionResult<Array2<f64>>;
}

/// Fitted projection
#[derive(Debug, Clone)]
pub struct PcaModel {
    /// Column means of the fitted data
    pub mean: Array1<f64>,
    /// d × k, columns are principal axes sorted by variance (descending)
    pub components: Array2<f64>,
    /// Variance captured by each component
    pub explained_variance: Vec<f64>,
    /// Share of total variance captured by each component
    pub explained_variance_ratio: Vec<f64>,
}

impl PcaModel {
    pub fn transform(&self, data: &Array2<f64>) -> DetectionResult<Array2<f64>> {
        if data.ncols() != self.mean.len() {
            return Err(DetectionError::Preprocessing(format!(
                "PCA fitted on {} features, got {}",
                self.mean.len(),
                data.ncols()
            )));
        }
        let centered = data - &self.mean;
        Ok(centered.dot(&self.components))
    }
}

/// PCA reducer (stateless, fits per call)
#[derive(Debug, Clone, Copy, Default)]
pub struct Pca;

impl Pca {
    pub fn fit(&self, data: &Array2<f64>, k: usize) -> DetectionResult<PcaModel> {
        let (n, d) = data.dim();
        if n == 0 {
            return Err(DetectionError::EmptyDataset);
        }
        if k == 0 || k > d {
            return Err(DetectionError::InsufficientDimensions { required: k, actual: d });
        }

        let mean = data
            .mean_axis(Axis(0))
            .ok_or(DetectionError::EmptyDataset)?;
        let centered = data - &mean;

        // Sample covariance (n - 1), a single row yields the zero matrix
        let denom = n.saturating_sub(1).max(1) as f64;
        let covariance = centered.t().dot(&centered) / denom;

        let mut a: Vec<f64> = covariance.iter().copied().collect();
        let mut eigvals = vec![0.0; d];
        let mut eigvecs = vec![0.0; d * d];
        jacobi_eigen_symmetric(&mut a, d, &mut eigvals, &mut eigvecs);

        // Descending by variance
        let mut order: Vec<usize> = (0..d).collect();
        order.sort_by(|&x, &y| {
            eigvals[y]
                .partial_cmp(&eigvals[x])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut components = Array2::<f64>::zeros((d, k));
        for (col, &src) in order.iter().take(k).enumerate() {
            // Deterministic sign: largest-magnitude loading is positive
            let pivot = (0..d)
                .max_by(|&r1, &r2| {
                    eigvecs[r1 * d + src]
                        .abs()
                        .partial_cmp(&eigvecs[r2 * d + src].abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(0);
            let sign = if eigvecs[pivot * d + src] < 0.0 { -1.0 } else { 1.0 };
            for row in 0..d {
                components[[row, col]] = sign * eigvecs[row * d + src];
            }
        }

        let explained_variance: Vec<f64> = order
            .iter()
            .take(k)
            .map(|&i| eigvals[i].max(0.0))
            .collect();
        let total: f64 = eigvals.iter().map(|v| v.max(0.0)).sum();
        let explained_variance_ratio = explained_variance
            .iter()
            .map(|v| if total > 0.0 { v / total } else { 0.0 })
            .collect();

        Ok(PcaModel {
            mean,
            components,
            explained_variance,
            explained_variance_ratio,
        })
    }
}

impl DimensionReducer for Pca {
    fn fit_transform(&self, data: &Array2<f64>, k: usize) -> DetectionResult<Array2<f64>> {
        let model = self.fit(data, k)?;
        log::debug!(
            "PCA explained variance ratio: {:?}",
            model.explained_variance_ratio
        );
        model.transform(data)
    }
}

/// Cyclic Jacobi eigendecomposition of a symmetric d×d matrix.
///
/// `a` is row-major and destroyed (its diagonal ends up holding the
/// eigenvalues). `v_out` receives eigenvectors as columns.
fn jacobi_eigen_symmetric(a: &mut [f64], n: usize, eigvals_out: &mut [f64], v_out: &mut [f64]) {
    const MAX_SWEEPS: usize = 50;
    const TOL: f64 = 1e-14;

    for i in 0..n {
        for j in 0..n {
            v_out[i * n + j] = if i == j { 1.0 } else { 0.0 };
        }
    }

    // Convergence is judged relative to the matrix scale
    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(f64::MIN_POSITIVE);

    for _ in 0..MAX_SWEEPS {
        let mut max_off = 0.0_f64;
        for p in 0..n {
            for q in (p + 1)..n {
                max_off = max_off.max(a[p * n + q].abs());
            }
        }
        if max_off <= TOL * scale {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p * n + q];
                if apq == 0.0 {
                    continue;
                }

                let app = a[p * n + p];
                let aqq = a[q * n + q];
                let diff = aqq - app;

                let t = if diff.abs() < 1e-300 {
                    apq.signum()
                } else {
                    let tau = diff / (2.0 * apq);
                    if tau >= 0.0 {
                        1.0 / (tau + (1.0 + tau * tau).sqrt())
                    } else {
                        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
                    }
                };

                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;
                let rot = s / (1.0 + c);

                a[p * n + p] -= t * apq;
                a[q * n + q] += t * apq;
                a[p * n + q] = 0.0;
                a[q * n + p] = 0.0;

                for r in 0..n {
                    if r == p || r == q {
                        continue;
                    }
                    let arp = a[r * n + p];
                    let arq = a[r * n + q];
                    a[r * n + p] = arp - s * (arq + rot * arp);
                    a[p * n + r] = a[r * n + p];
                    a[r * n + q] = arq + s * (arp - rot * arq);
                    a[q * n + r] = a[r * n + q];
                }

                for r in 0..n {
                    let vrp = v_out[r * n + p];
                    let vrq = v_out[r * n + q];
                    v_out[r * n + p] = vrp - s * (vrq + rot * vrp);
                    v_out[r * n + q] = vrq + s * (vrp - rot * vrq);
                }
            }
        }
    }

    for i in 0..n {
        eigvals_out[i] = a[i * n + i];
    }
}

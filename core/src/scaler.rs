//! Per-column standardization (zero mean, unit population variance).
//!
//! Fitted fresh on every run; nothing here is persisted.

use ndarray::{Array1, Array2, Axis};

#[derive(Debug, Clone)]
pub struct StandardScaler {
    pub means: Array1<f64>,
    /// Divisor per column: the population standard deviation, or 1.0 for
    /// a degenerate column so it scales to all zeros.
    pub scales: Array1<f64>,
    /// Columns whose standard deviation fell below the variance floor.
    pub degenerate: Vec<usize>,
}

impl StandardScaler {
    /// Fit on `features` (one row per customer). Requires at least one row.
    pub fn fit(features: &Array2<f64>, variance_floor: f64) -> Self {
        let n = features.nrows().max(1) as f64;
        let means = features.sum_axis(Axis(0)) / n;

        let mut scales = Array1::ones(features.ncols());
        let mut degenerate = Vec::new();
        for (col, column) in features.axis_iter(Axis(1)).enumerate() {
            let mean = means[col];
            let variance = column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            let std_dev = variance.sqrt();
            if std_dev.is_finite() && std_dev >= variance_floor {
                scales[col] = std_dev;
            } else {
                degenerate.push(col);
            }
        }

        Self { means, scales, degenerate }
    }

    pub fn transform(&self, features: &Array2<f64>) -> Array2<f64> {
        let mut scaled = features.clone();
        for mut row in scaled.axis_iter_mut(Axis(0)) {
            for (col, value) in row.iter_mut().enumerate() {
                *value = if self.degenerate.contains(&col) {
                    0.0
                } else {
                    (*value - self.means[col]) / self.scales[col]
                };
            }
        }
        scaled
    }

    pub fn fit_transform(features: &Array2<f64>, variance_floor: f64) -> (Self, Array2<f64>) {
        let scaler = Self::fit(features, variance_floor);
        let scaled = scaler.transform(features);
        (scaler, scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn columns_have_zero_mean_unit_variance() {
        let raw = array![
            [5_000.0, 0.1, 0.0, 0.6],
            [15_000.0, 0.3, 0.2, 0.7],
            [50_000.0, 0.5, 0.4, 0.9],
            [120_000.0, 0.8, 0.7, 1.0],
        ];
        let (_, scaled) = StandardScaler::fit_transform(&raw, 1e-12);
        for column in scaled.axis_iter(Axis(1)) {
            let mean = column.sum() / 4.0;
            let var = column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 4.0;
            assert!(mean.abs() < 1e-9, "column mean {mean} not ~0");
            assert!((var - 1.0).abs() < 1e-9, "column variance {var} not ~1");
        }
    }

    #[test]
    fn constant_column_scales_to_zero_without_dividing() {
        let raw = array![
            [5_000.0, 0.1, 0.0, 0.9],
            [15_000.0, 0.3, 0.2, 0.9],
            [50_000.0, 0.5, 0.4, 0.9],
            [120_000.0, 0.8, 0.7, 0.9],
        ];
        let (scaler, scaled) = StandardScaler::fit_transform(&raw, 1e-12);
        assert_eq!(scaler.degenerate, vec![3]);
        assert!(scaled.column(3).iter().all(|&x| x == 0.0));
        assert!(scaled.iter().all(|x| x.is_finite()));
    }
}

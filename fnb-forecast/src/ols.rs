//! Ordinary least squares on the three sales covariates.
//!
//! Fits `y = b0 + b1·visitors + b2·temperature + b3·precipitation`. The
//! features and target are centered on their means and the features scaled
//! to unit spread before the 3×3 normal equations are solved by Gaussian
//! elimination with partial pivoting. A feature that is constant, or a
//! linear combination of the features before it, gets a zero coefficient
//! instead of failing the fit.

use serde::Serialize;
use thiserror::Error;

const N_FEATURES: usize = 3;
const PIVOT_TOLERANCE: f64 = 1e-9;

/// Covariates of one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Features {
    pub visitors: f64,
    pub temperature: f64,
    pub precipitation: f64,
}

impl Features {
    pub fn new(visitors: f64, temperature: f64, precipitation: f64) -> Self {
        Self {
            visitors,
            temperature,
            precipitation,
        }
    }

    fn as_array(&self) -> [f64; N_FEATURES] {
        [self.visitors, self.temperature, self.precipitation]
    }

    pub fn is_finite(&self) -> bool {
        self.as_array().iter().all(|v| v.is_finite())
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum FitError {
    #[error("no observations to fit")]
    Empty,
    #[error("{features} feature rows but {targets} targets")]
    LengthMismatch { features: usize, targets: usize },
    #[error("non-finite value in observation {0}")]
    NonFinite(usize),
}

/// A fitted linear model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearModel {
    pub intercept: f64,
    /// Visitors, temperature, precipitation.
    pub coefficients: [f64; N_FEATURES],
    pub r_squared: f64,
    pub n_observations: usize,
}

impl LinearModel {
    pub fn fit(features: &[Features], targets: &[f64]) -> Result<Self, FitError> {
        if features.len() != targets.len() {
            return Err(FitError::LengthMismatch {
                features: features.len(),
                targets: targets.len(),
            });
        }
        if features.is_empty() {
            return Err(FitError::Empty);
        }
        for (i, (x, y)) in features.iter().zip(targets).enumerate() {
            if !x.is_finite() || !y.is_finite() {
                return Err(FitError::NonFinite(i));
            }
        }

        let n = features.len() as f64;
        let rows: Vec<[f64; N_FEATURES]> = features.iter().map(Features::as_array).collect();

        let mut x_mean = [0.0; N_FEATURES];
        for row in &rows {
            for (m, v) in x_mean.iter_mut().zip(row) {
                *m += v / n;
            }
        }
        let y_mean = targets.iter().sum::<f64>() / n;

        let mut x_scale = [0.0; N_FEATURES];
        for row in &rows {
            for j in 0..N_FEATURES {
                x_scale[j] += (row[j] - x_mean[j]).powi(2) / n;
            }
        }
        for s in x_scale.iter_mut() {
            *s = s.sqrt();
        }

        // normal equations of the centered, scaled problem (a = Z'Z / n, b = Z'y / n)
        let mut gram = [[0.0; N_FEATURES]; N_FEATURES];
        let mut rhs = [0.0; N_FEATURES];
        for (row, y) in rows.iter().zip(targets) {
            let z = standardize(row, &x_mean, &x_scale);
            for i in 0..N_FEATURES {
                for j in 0..N_FEATURES {
                    gram[i][j] += z[i] * z[j] / n;
                }
                rhs[i] += z[i] * (y - y_mean) / n;
            }
        }

        let scaled = solve_normal_equations(gram, rhs);
        let mut coefficients = [0.0; N_FEATURES];
        for j in 0..N_FEATURES {
            if x_scale[j] > 0.0 {
                coefficients[j] = scaled[j] / x_scale[j];
            }
        }
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(b, m)| b * m)
                .sum::<f64>();

        let mut model = LinearModel {
            intercept,
            coefficients,
            r_squared: 0.0,
            n_observations: features.len(),
        };

        let ss_tot: f64 = targets.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = features
            .iter()
            .zip(targets)
            .map(|(x, y)| (y - model.predict(x)).powi(2))
            .sum();
        model.r_squared = if ss_tot > 1e-10 {
            1.0 - ss_res / ss_tot
        } else {
            1.0
        };
        Ok(model)
    }

    pub fn predict(&self, features: &Features) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.as_array())
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }
}

fn standardize(
    row: &[f64; N_FEATURES],
    mean: &[f64; N_FEATURES],
    scale: &[f64; N_FEATURES],
) -> [f64; N_FEATURES] {
    let mut z = [0.0; N_FEATURES];
    for j in 0..N_FEATURES {
        if scale[j] > 0.0 {
            z[j] = (row[j] - mean[j]) / scale[j];
        }
    }
    z
}

/// Solve `a·x = b`, leaving the unknowns of vanishing pivots at zero.
fn solve_normal_equations(
    mut a: [[f64; N_FEATURES]; N_FEATURES],
    mut b: [f64; N_FEATURES],
) -> [f64; N_FEATURES] {
    let mut pivots: Vec<(usize, usize)> = Vec::with_capacity(N_FEATURES);
    let mut row = 0;
    for col in 0..N_FEATURES {
        if row == N_FEATURES {
            break;
        }
        let Some((pivot_row, pivot_abs)) = (row..N_FEATURES)
            .map(|r| (r, a[r][col].abs()))
            .max_by(|x, y| x.1.total_cmp(&y.1))
        else {
            break;
        };
        if pivot_abs <= PIVOT_TOLERANCE {
            continue;
        }
        a.swap(row, pivot_row);
        b.swap(row, pivot_row);
        for r in row + 1..N_FEATURES {
            let factor = a[r][col] / a[row][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..N_FEATURES {
                a[r][c] -= factor * a[row][c];
            }
            b[r] -= factor * b[row];
        }
        pivots.push((row, col));
        row += 1;
    }

    let mut solution = [0.0; N_FEATURES];
    for &(r, c) in pivots.iter().rev() {
        let tail: f64 = (c + 1..N_FEATURES).map(|k| a[r][k] * solution[k]).sum();
        solution[c] = (b[r] - tail) / a[r][c];
    }
    solution
}

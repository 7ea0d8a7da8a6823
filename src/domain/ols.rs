//! Ordinary least squares polynomial regression.
//!
//! Solves the normal equations (XᵀX)β = Xᵀy with Gaussian elimination and
//! partial pivoting. Degrees stay small (≤ 3) and the time index is scaled
//! to [0, 1] by the caller, which keeps the system well conditioned.

const PIVOT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct PolyFit {
    /// β₀ + β₁t + β₂t² + ...
    pub coefficients: Vec<f64>,
    /// Sum of squared residuals.
    pub sse: f64,
    pub n: usize,
}

impl PolyFit {
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn params(&self) -> usize {
        self.coefficients.len()
    }

    pub fn predict(&self, t: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * t + c)
    }

    /// sqrt(SSE / (n - p)).
    pub fn residual_std_error(&self) -> f64 {
        let dof = self.n.saturating_sub(self.params()).max(1);
        (self.sse / dof as f64).sqrt()
    }

    /// Bayesian information criterion n·ln(SSE/n) + p·ln(n).
    pub fn bic(&self) -> f64 {
        let n = self.n as f64;
        let mse = (self.sse / n).max(f64::MIN_POSITIVE);
        n * mse.ln() + self.params() as f64 * n.ln()
    }
}

/// Fits a polynomial of `degree` to (t, y). Returns `None` when there are
/// not more points than parameters or the system is singular.
pub fn fit_polynomial(t: &[f64], y: &[f64], degree: usize) -> Option<PolyFit> {
    let n = t.len().min(y.len());
    let p = degree + 1;
    if n <= p {
        return None;
    }

    // Power sums Σ t^k for k in 0..=2·degree and moments Σ y·t^k.
    let mut power_sums = vec![0.0; 2 * degree + 1];
    let mut moments = vec![0.0; p];
    for (&ti, &yi) in t.iter().zip(y).take(n) {
        let mut pow = 1.0;
        for (k, sum) in power_sums.iter_mut().enumerate() {
            *sum += pow;
            if k < p {
                moments[k] += yi * pow;
            }
            pow *= ti;
        }
    }

    let normal: Vec<Vec<f64>> = (0..p)
        .map(|row| (0..p).map(|col| power_sums[row + col]).collect())
        .collect();

    let coefficients = solve(normal, moments)?;
    let fit = PolyFit {
        coefficients,
        sse: 0.0,
        n,
    };
    let sse = t
        .iter()
        .zip(y)
        .take(n)
        .map(|(&ti, &yi)| {
            let r = yi - fit.predict(ti);
            r * r
        })
        .sum();

    Some(PolyFit { sse, ..fit })
}

fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < PIVOT_EPSILON {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 / (n - 1) as f64).collect()
    }

    #[test]
    fn recovers_exact_line() {
        let t = grid(20);
        let y: Vec<f64> = t.iter().map(|&x| 3.0 + 2.0 * x).collect();
        let fit = fit_polynomial(&t, &y, 1).unwrap();
        assert_relative_eq!(fit.coefficients[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(fit.coefficients[1], 2.0, epsilon = 1e-9);
        assert!(fit.sse < 1e-18);
    }

    #[test]
    fn recovers_exact_cubic() {
        let t = grid(40);
        let y: Vec<f64> = t.iter().map(|&x| 1.0 - x + 0.5 * x * x + 2.0 * x.powi(3)).collect();
        let fit = fit_polynomial(&t, &y, 3).unwrap();
        assert_eq!(fit.degree(), 3);
        assert_relative_eq!(fit.predict(0.5), 1.0 - 0.5 + 0.125 + 0.25, epsilon = 1e-8);
    }

    #[test]
    fn too_few_points() {
        let t = grid(3);
        assert!(fit_polynomial(&t, &[1.0, 2.0, 3.0], 2).is_none());
    }

    #[test]
    fn singular_design_is_rejected() {
        let t = vec![0.5; 10];
        let y: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert!(fit_polynomial(&t, &y, 1).is_none());
    }

    #[test]
    fn residual_error_uses_degrees_of_freedom() {
        let fit = PolyFit {
            coefficients: vec![0.0, 1.0],
            sse: 8.0,
            n: 10,
        };
        assert_relative_eq!(fit.residual_std_error(), 1.0);
    }
}

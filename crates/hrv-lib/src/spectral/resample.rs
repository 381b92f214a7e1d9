//! Cubic-spline resampling of RR intervals onto a uniform time grid.

use crate::error::{HrvError, Result};
use crate::signal::RRSeries;
use crate::spectral::axis::uniform_time_axis;
use std::cmp::Ordering;

/// Interpolating cubic spline with not-a-knot end conditions.
///
/// Evaluation outside the knot range extrapolates with the first or last
/// polynomial piece.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivative at each knot
    m: Vec<f64>,
}

impl CubicSpline {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(HrvError::ShapeMismatch {
                rri: y.len(),
                trr: x.len(),
            });
        }
        let n = x.len();
        if n < 4 {
            return Err(HrvError::NoData(format!(
                "cubic interpolation needs at least 4 points, got {n}"
            )));
        }
        if let Some(i) = x
            .windows(2)
            .position(|w| w[1].partial_cmp(&w[0]) != Some(Ordering::Greater))
        {
            return Err(HrvError::Shape(format!(
                "knots must be strictly increasing (index {})",
                i + 1
            )));
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

        // Interior equations for m[1..n-1], with the not-a-knot rows folded
        // into the first and last so the system stays tridiagonal.
        let size = n - 2;
        let mut sub = vec![0.0; size];
        let mut diag = vec![0.0; size];
        let mut sup = vec![0.0; size];
        let mut rhs = vec![0.0; size];
        for k in 0..size {
            let i = k + 1;
            sub[k] = h[i - 1];
            diag[k] = 2.0 * (h[i - 1] + h[i]);
            sup[k] = h[i];
            rhs[k] = 6.0 * (slope[i] - slope[i - 1]);
        }
        let (h0, h1) = (h[0], h[1]);
        diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
        sup[0] = (h1 - h0) * (h1 + h0) / h1;
        let (ha, hb) = (h[n - 3], h[n - 2]);
        sub[size - 1] = (ha - hb) * (ha + hb) / ha;
        diag[size - 1] = (ha + hb) * (2.0 * ha + hb) / ha;

        let interior = solve_tridiagonal(&sub, &diag, &sup, &rhs)?;

        let mut m = vec![0.0; n];
        m[1..n - 1].copy_from_slice(&interior);
        m[0] = ((h0 + h1) * m[1] - h0 * m[2]) / h1;
        m[n - 1] = ((ha + hb) * m[n - 2] - hb * m[n - 3]) / ha;

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }

    pub fn eval(&self, t: f64) -> f64 {
        let n = self.x.len();
        let j = self
            .x
            .partition_point(|&xi| xi <= t)
            .saturating_sub(1)
            .min(n - 2);
        let (x0, x1) = (self.x[j], self.x[j + 1]);
        let h = x1 - x0;
        let (a, b) = (x1 - t, t - x0);
        self.m[j] * a.powi(3) / (6.0 * h)
            + self.m[j + 1] * b.powi(3) / (6.0 * h)
            + (self.y[j] / h - self.m[j] * h / 6.0) * a
            + (self.y[j + 1] / h - self.m[j + 1] * h / 6.0) * b
    }

    pub fn eval_many(&self, ts: &[f64]) -> Vec<f64> {
        ts.iter().map(|&t| self.eval(t)).collect()
    }
}

/// Thomas algorithm; `sub[0]` and `sup[last]` are ignored.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Result<Vec<f64>> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];
    let mut denom = diag[0];
    if denom.abs() < f64::EPSILON {
        return Err(HrvError::NoData("singular spline system".into()));
    }
    c[0] = sup[0] / denom;
    d[0] = rhs[0] / denom;
    for i in 1..n {
        denom = diag[i] - sub[i] * c[i - 1];
        if denom.abs() < f64::EPSILON {
            return Err(HrvError::NoData("singular spline system".into()));
        }
        c[i] = sup[i] / denom;
        d[i] = (rhs[i] - sub[i] * d[i - 1]) / denom;
    }
    let mut out = vec![0.0; n];
    out[n - 1] = d[n - 1];
    for i in (0..n - 1).rev() {
        out[i] = d[i] - c[i] * out[i + 1];
    }
    Ok(out)
}

/// Interpolate `series` at `fs` Hz over `[trr[0], trr[-1])`.
///
/// Returns the uniform time axis and the resampled intervals.
pub fn resample_uniform(series: &RRSeries, fs: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    let spline = CubicSpline::new(&series.trr, &series.rri)?;
    let t_uni = uniform_time_axis(series.start(), series.end(), fs);
    let rri_uni = spline.eval_many(&t_uni);
    Ok((t_uni, rri_uni))
}

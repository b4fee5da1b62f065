use serde::Serialize;

/// Straight line `y = slope · x + intercept` fitted to a calibration series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CalibrationResult {
    pub slope: f64,
    pub intercept: f64,
}

impl CalibrationResult {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least-squares fit of `y` against `x`.
///
/// Pairs are matched by position. With fewer than two pairs, or when every
/// `x` is identical, the fit is degenerate and `(0, 0)` is returned.
pub fn linear_fit(x: &[f64], y: &[f64]) -> CalibrationResult {
    let n = x.len().min(y.len());
    if n < 2 {
        return CalibrationResult::default();
    }

    let (sum_x, sum_y, sum_xy, sum_x2) = x.iter().zip(y).fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sx2), (&xi, &yi)| (sx + xi, sy + yi, sxy + xi * yi, sx2 + xi * xi),
    );
    let n = n as f64;

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return CalibrationResult::default();
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    CalibrationResult { slope, intercept }
}

//! Numerical integration over sampled curves.
//!
//! Both rules accept non-uniform spacing and integrate the points in the
//! order given. Fewer than two points integrate to zero.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Integration rule applied to emission spectra.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationMethod {
    #[default]
    Simpson,
    Trapezoid,
}

impl IntegrationMethod {
    pub fn integrate(self, x: &[f64], f: &[f64]) -> f64 {
        match self {
            IntegrationMethod::Simpson => simpson_nonuniform(x, f),
            IntegrationMethod::Trapezoid => trapezoid(x, f),
        }
    }

    /// Name shown in reports.
    pub const fn display_name(self) -> &'static str {
        match self {
            IntegrationMethod::Simpson => "Simpson's method",
            IntegrationMethod::Trapezoid => "Trapezoidal method",
        }
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for IntegrationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simpson" => Ok(IntegrationMethod::Simpson),
            "trapezoid" | "trapezoidal" => Ok(IntegrationMethod::Trapezoid),
            other => Err(format!("unknown integration method '{other}'")),
        }
    }
}

/// Trapezoidal rule: Σ (x[i+1] − x[i]) · (f[i+1] + f[i]) / 2.
pub fn trapezoid(x: &[f64], f: &[f64]) -> f64 {
    let n = x.len().min(f.len());
    if n < 2 {
        return 0.0;
    }
    (0..n - 1)
        .map(|i| (x[i + 1] - x[i]) * (f[i + 1] + f[i]) / 2.0)
        .sum()
}

/// Composite Simpson's rule generalised to unequal interval widths.
///
/// Each pair of intervals is integrated with the quadratic through its three
/// points. An odd number of intervals gets an end correction over the last
/// three points. A lone interval has no quadratic stencil and falls back to
/// the trapezoidal rule.
pub fn simpson_nonuniform(x: &[f64], f: &[f64]) -> f64 {
    let len = x.len().min(f.len());
    if len < 2 {
        return 0.0;
    }
    let n = len - 1;
    if n == 1 {
        return trapezoid(x, f);
    }

    let h: Vec<f64> = x.windows(2).take(n).map(|w| w[1] - w[0]).collect();

    let mut result = 0.0;
    for i in (1..n).step_by(2) {
        let (h0, h1) = (h[i - 1], h[i]);
        let hph = h1 + h0;
        let hdh = h1 / h0;
        let hmh = h1 * h0;
        result += (hph / 6.0)
            * ((2.0 - hdh) * f[i - 1] + (hph * hph / hmh) * f[i] + (2.0 - 1.0 / hdh) * f[i + 1]);
    }

    if n % 2 == 1 {
        let (h0, h1) = (h[n - 2], h[n - 1]);
        result += f[n] * (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * (h0 + h1));
        result += f[n - 1] * (h1 * h1 + 3.0 * h1 * h0) / (6.0 * h0);
        result -= f[n - 2] * h1 * h1 * h1 / (6.0 * h0 * (h0 + h1));
    }

    result
}

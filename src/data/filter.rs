use serde::Serialize;

use super::model::Spectrum;

// ---------------------------------------------------------------------------
// Wavelength window applied before integration
// ---------------------------------------------------------------------------

/// Trim window as entered by the user.
///
/// Bounds are kept as raw text and validated on use: when either bound is not
/// a finite number the window is ignored and spectra pass through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrimSettings {
    pub enabled: bool,
    pub min: String,
    pub max: String,
}

impl Default for TrimSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            min: "0".to_string(),
            max: "1000".to_string(),
        }
    }
}

impl TrimSettings {
    pub fn new(enabled: bool, min: impl Into<String>, max: impl Into<String>) -> Self {
        Self {
            enabled,
            min: min.into(),
            max: max.into(),
        }
    }

    /// Parsed `(min, max)` bounds, or `None` when either is not a finite number.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        Some((parse_bound(&self.min)?, parse_bound(&self.max)?))
    }

    /// The window actually applied: enabled and with valid bounds.
    pub fn active_bounds(&self) -> Option<(f64, f64)> {
        if self.enabled {
            self.bounds()
        } else {
            None
        }
    }
}

fn parse_bound(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Keep only points with `min <= wavelength <= max`, preserving order.
pub fn trim_to(spectrum: &Spectrum, min: f64, max: f64) -> Spectrum {
    let kept = spectrum
        .points()
        .filter(|&(wl, _)| min <= wl && wl <= max);
    let trimmed = Spectrum::from_points(kept);
    match spectrum.source() {
        Some(src) => trimmed.with_source(src),
        None => trimmed,
    }
}

/// Apply `settings` to a spectrum.
///
/// Disabled trimming or unparseable bounds return a copy of the input.
pub fn trim(spectrum: &Spectrum, settings: &TrimSettings) -> Spectrum {
    match settings.active_bounds() {
        Some((min, max)) => trim_to(spectrum, min, max),
        None => spectrum.clone(),
    }
}

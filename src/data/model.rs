use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FileRole – how a raw file is interpreted
// ---------------------------------------------------------------------------

/// The kind of measurement a spectral file holds.
///
/// The role decides the delimiter priority, the minimum number of fields per
/// line and which columns carry wavelength and intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    /// Fluorimeter export: wavelength in field 0, intensity in field 5.
    Emission,
    /// Spectrophotometer export: wavelength in field 0, optical density in field 1.
    Absorption,
}

impl FileRole {
    /// Delimiters probed on each line, highest priority first.
    pub const fn delimiters(self) -> &'static [char] {
        match self {
            FileRole::Emission => &[';', ',', '\t', ' '],
            FileRole::Absorption => &[',', ';', '\t', ' '],
        }
    }

    /// Minimum number of non-empty fields a line needs.
    pub const fn min_fields(self) -> usize {
        match self {
            FileRole::Emission => 6,
            FileRole::Absorption => 2,
        }
    }

    /// Field index holding the intensity value (wavelength is always field 0).
    pub const fn intensity_field(self) -> usize {
        match self {
            FileRole::Emission => 5,
            FileRole::Absorption => 1,
        }
    }

    /// File extension used by the instrument exports.
    pub const fn extension(self) -> &'static str {
        match self {
            FileRole::Emission => "tit",
            FileRole::Absorption => "txt",
        }
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileRole::Emission => write!(f, "emission"),
            FileRole::Absorption => write!(f, "absorption"),
        }
    }
}

// ---------------------------------------------------------------------------
// GroupRole – sample vs. reference standard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Sample,
    Standard,
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupRole::Sample => write!(f, "sample"),
            GroupRole::Standard => write!(f, "standard"),
        }
    }
}

// ---------------------------------------------------------------------------
// Spectrum – one parsed file
// ---------------------------------------------------------------------------

/// A single spectrum: (wavelength, intensity) pairs in the order they were
/// read. The points are never re-sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    wavelengths: Vec<f64>,
    intensities: Vec<f64>,
    source: Option<PathBuf>,
}

impl Spectrum {
    /// Build a spectrum from (wavelength, intensity) pairs.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (wavelengths, intensities) = points.into_iter().unzip();
        Spectrum {
            wavelengths,
            intensities,
            source: None,
        }
    }

    /// Attach the file the spectrum was read from.
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Iterate over (wavelength, intensity) pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelengths
            .iter()
            .copied()
            .zip(self.intensities.iter().copied())
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    /// Whether the spectrum has no points.
    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// Short label for diagnostics: the file name when known.
    pub fn label(&self) -> String {
        self.source
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "<memory>".to_string())
    }
}

// ---------------------------------------------------------------------------
// SpectrumGroup – all measurements of one role
// ---------------------------------------------------------------------------

/// Emission and absorption spectra for one group plus the values derived
/// from them during a run.
///
/// The derived lists are only ever replaced wholesale by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct SpectrumGroup {
    pub emission: Vec<Spectrum>,
    pub absorption: Vec<Spectrum>,
    peaks: Vec<f64>,
    integrals_simpson: Vec<f64>,
    integrals_trapezoid: Vec<f64>,
}

impl SpectrumGroup {
    pub fn new(emission: Vec<Spectrum>, absorption: Vec<Spectrum>) -> Self {
        SpectrumGroup {
            emission,
            absorption,
            ..Default::default()
        }
    }

    /// Absorbance at the excitation wavelength, one per absorption spectrum.
    pub fn peaks(&self) -> &[f64] {
        &self.peaks
    }

    pub fn integrals_simpson(&self) -> &[f64] {
        &self.integrals_simpson
    }

    pub fn integrals_trapezoid(&self) -> &[f64] {
        &self.integrals_trapezoid
    }

    pub fn has_emission(&self) -> bool {
        !self.emission.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.emission.is_empty() && self.absorption.is_empty()
    }

    pub(crate) fn set_peaks(&mut self, peaks: Vec<f64>) {
        self.peaks = peaks;
    }

    pub(crate) fn set_integrals(&mut self, simpson: Vec<f64>, trapezoid: Vec<f64>) {
        self.integrals_simpson = simpson;
        self.integrals_trapezoid = trapezoid;
    }

    /// Drop every derived value; the next run recomputes them.
    pub(crate) fn clear_derived(&mut self) {
        self.peaks.clear();
        self.integrals_simpson.clear();
        self.integrals_trapezoid.clear();
    }
}

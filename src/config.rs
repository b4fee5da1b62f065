//! TOML run configuration.
//!
//! ```toml
//! [run]
//! excitation_wavelength = 365
//! method = "simpson"
//!
//! [trim]
//! enabled = true
//! min = 420
//! max = 700
//!
//! [standard]
//! quantum_yield = 4.2
//! same_solvent = false
//! sample_solvent = "ethanol"
//! standard_solvent = "water"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::analysis::integrate::IntegrationMethod;
use crate::analysis::quantum_yield::Solvent;
use crate::data::filter::TrimSettings;
use crate::state::RunParameters;

/// Top-level run configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub trim: TrimSection,
    #[serde(default)]
    pub standard: StandardParameters,
    #[serde(default)]
    pub output: OutputConfig,
}

/// A value that may be written as a TOML number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    pub fn to_text(&self) -> String {
        match self {
            NumberOrText::Number(v) => v.to_string(),
            NumberOrText::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RunSection {
    #[serde(default = "default_wavelength")]
    pub excitation_wavelength: NumberOrText,
    #[serde(default)]
    pub method: IntegrationMethod,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            excitation_wavelength: default_wavelength(),
            method: IntegrationMethod::default(),
        }
    }
}

fn default_wavelength() -> NumberOrText {
    NumberOrText::Number(365.0)
}

#[derive(Debug, Deserialize)]
pub struct TrimSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_trim_min")]
    pub min: NumberOrText,
    #[serde(default = "default_trim_max")]
    pub max: NumberOrText,
}

impl Default for TrimSection {
    fn default() -> Self {
        Self {
            enabled: false,
            min: default_trim_min(),
            max: default_trim_max(),
        }
    }
}

fn default_trim_min() -> NumberOrText {
    NumberOrText::Number(0.0)
}
fn default_trim_max() -> NumberOrText {
    NumberOrText::Number(1000.0)
}

/// Parameters of the reference standard. Anything left out is treated as a
/// declined request when the quantum yield is evaluated.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StandardParameters {
    /// Known quantum yield of the standard, in percent.
    pub quantum_yield: Option<f64>,
    pub same_solvent: Option<bool>,
    pub sample_solvent: Option<Solvent>,
    pub standard_solvent: Option<Solvent>,
    /// Used when `sample_solvent = "other"`.
    pub sample_refractive_index: Option<f64>,
    /// Used when `standard_solvent = "other"`.
    pub standard_refractive_index: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Write the report as JSON to this path.
    pub json: Option<PathBuf>,
    /// Write the calibration points as CSV to this path.
    pub csv: Option<PathBuf>,
}

impl RunConfig {
    /// Run parameters described by the `[run]` and `[trim]` sections.
    pub fn run_parameters(&self) -> RunParameters {
        RunParameters {
            excitation_wavelength: self.run.excitation_wavelength.to_text(),
            method: self.run.method,
            trim: TrimSettings::new(
                self.trim.enabled,
                self.trim.min.to_text(),
                self.trim.max.to_text(),
            ),
        }
    }
}

/// Parse a configuration from TOML text.
pub fn parse_config(text: &str) -> Result<RunConfig> {
    toml::from_str(text).context("parsing run configuration")
}

/// Load and parse a TOML configuration file.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse_config(&text).with_context(|| format!("in {}", path.display()))
}

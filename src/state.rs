use std::fmt;

use serde::Serialize;

use crate::analysis::integrate::IntegrationMethod;
use crate::analysis::quantum_yield::QuantumYieldResult;
use crate::analysis::regression::CalibrationResult;
use crate::data::filter::TrimSettings;
use crate::data::model::{GroupRole, SpectrumGroup};
use crate::pipeline::PipelineError;

// ---------------------------------------------------------------------------
// Run parameters
// ---------------------------------------------------------------------------

/// User-entered settings for one analysis run.
///
/// The excitation wavelength is stored as typed and validated when the
/// pipeline runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunParameters {
    pub excitation_wavelength: String,
    pub method: IntegrationMethod,
    pub trim: TrimSettings,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            excitation_wavelength: "365".to_string(),
            method: IntegrationMethod::Simpson,
            trim: TrimSettings::default(),
        }
    }
}

impl RunParameters {
    /// Excitation wavelength in nm, `None` when the text is not a finite number.
    pub fn wavelength(&self) -> Option<f64> {
        self.excitation_wavelength
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

// ---------------------------------------------------------------------------
// Pipeline state
// ---------------------------------------------------------------------------

/// Where a session is in the analysis pipeline.
///
/// Stages only move forward; `Failed` is terminal for the run that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Parsed,
    PeaksExtracted,
    Integrated,
    Calibrated,
    QuantumYieldEvaluated,
    Reported,
    Failed { stage: Stage, reason: PipelineError },
}

/// A pipeline step that can move the session forward or fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PeakExtraction,
    Integration,
    Calibration,
    QuantumYield,
}

impl Stage {
    /// State the session enters when this stage succeeds.
    pub fn reached(self) -> PipelineState {
        match self {
            Stage::PeakExtraction => PipelineState::PeaksExtracted,
            Stage::Integration => PipelineState::Integrated,
            Stage::Calibration => PipelineState::Calibrated,
            Stage::QuantumYield => PipelineState::QuantumYieldEvaluated,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::PeakExtraction => write!(f, "peak extraction"),
            Stage::Integration => write!(f, "integration"),
            Stage::Calibration => write!(f, "calibration"),
            Stage::QuantumYield => write!(f, "quantum yield"),
        }
    }
}

/// Calibration lines computed for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibrations {
    pub sample: CalibrationResult,
    /// Present only when the standard group had enough data.
    pub standard: Option<CalibrationResult>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// All state of one analysis run: the two groups, the run parameters and
/// whatever the pipeline has committed so far.
#[derive(Debug, Clone)]
pub struct Session {
    sample: SpectrumGroup,
    standard: SpectrumGroup,
    params: RunParameters,
    pub(crate) state: PipelineState,
    pub(crate) calibrations: Option<Calibrations>,
    pub(crate) quantum_yield: Option<QuantumYieldResult>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(RunParameters::default())
    }
}

impl Session {
    pub fn new(params: RunParameters) -> Self {
        Self {
            sample: SpectrumGroup::default(),
            standard: SpectrumGroup::default(),
            params,
            state: PipelineState::Idle,
            calibrations: None,
            quantum_yield: None,
        }
    }

    /// Install the spectra for one group and mark the session as parsed.
    pub fn set_group(&mut self, role: GroupRole, group: SpectrumGroup) {
        log::info!(
            "{role}: {} emission, {} absorption spectra",
            group.emission.len(),
            group.absorption.len()
        );
        *self.group_mut(role) = group;
        self.invalidate();
        self.state = PipelineState::Parsed;
    }

    /// Replace the run parameters. Derived values are dropped since they
    /// depend on wavelength, method and trim window.
    pub fn set_parameters(&mut self, params: RunParameters) {
        if params != self.params {
            self.params = params;
            self.invalidate();
        }
    }

    pub fn parameters(&self) -> &RunParameters {
        &self.params
    }

    pub fn group(&self, role: GroupRole) -> &SpectrumGroup {
        match role {
            GroupRole::Sample => &self.sample,
            GroupRole::Standard => &self.standard,
        }
    }

    pub(crate) fn group_mut(&mut self, role: GroupRole) -> &mut SpectrumGroup {
        match role {
            GroupRole::Sample => &mut self.sample,
            GroupRole::Standard => &mut self.standard,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn calibrations(&self) -> Option<&Calibrations> {
        self.calibrations.as_ref()
    }

    pub fn quantum_yield(&self) -> Option<&QuantumYieldResult> {
        self.quantum_yield.as_ref()
    }

    fn invalidate(&mut self) {
        self.sample.clear_derived();
        self.standard.clear_derived();
        self.calibrations = None;
        self.quantum_yield = None;
    }
}

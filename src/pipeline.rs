//! Analysis pipeline over a [`Session`].
//!
//! ```text
//!  Idle ─► Parsed ─► PeaksExtracted ─► Integrated ─► Calibrated
//!                                                        │
//!                      Reported ◄─ QuantumYieldEvaluated ◄┘
//! ```
//!
//! Each stage computes into locals and commits into the session only once it
//! has succeeded, so a failing stage leaves earlier results in place.

use thiserror::Error;

use crate::analysis::integrate::IntegrationMethod;
use crate::analysis::peak::extract_peaks;
use crate::analysis::quantum_yield::{
    evaluate_quantum_yield, NotComputedReason, ParameterProvider, QuantumYieldResult,
};
use crate::analysis::regression::{linear_fit, CalibrationResult};
use crate::data::filter::{trim, TrimSettings};
use crate::data::model::{GroupRole, Spectrum, SpectrumGroup};
use crate::report::Report;
use crate::state::{Calibrations, PipelineState, Session, Stage};

/// Reasons a run stops before producing a report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("no sample data: load at least one sample emission spectrum")]
    NoSampleData,

    #[error("invalid excitation wavelength '{0}'")]
    InvalidWavelength(String),

    #[error(
        "insufficient data for regression: {peaks} absorbance peaks, {integrals} emission integrals"
    )]
    InsufficientData { peaks: usize, integrals: usize },

    #[error("integral of {0} is not a finite number; check for repeated wavelengths")]
    NonFiniteIntegral(String),
}

// ---------------------------------------------------------------------------
// Stage computations (pure)
// ---------------------------------------------------------------------------

/// Simpson and trapezoid integrals for every emission spectrum with at least
/// two points inside the trim window.
///
/// Fails when either rule gives a non-finite value, which happens when two
/// consecutive points share a wavelength.
pub fn integrate_group(
    spectra: &[Spectrum],
    settings: &TrimSettings,
) -> Result<(Vec<f64>, Vec<f64>), PipelineError> {
    let mut simpson = Vec::with_capacity(spectra.len());
    let mut trapezoid = Vec::with_capacity(spectra.len());
    for sp in spectra {
        let trimmed = trim(sp, settings);
        if trimmed.len() < 2 {
            log::warn!(
                "Skipping {}: {} point(s) left after trimming",
                sp.label(),
                trimmed.len()
            );
            continue;
        }
        let (x, f) = (trimmed.wavelengths(), trimmed.intensities());
        let s = IntegrationMethod::Simpson.integrate(x, f);
        let t = IntegrationMethod::Trapezoid.integrate(x, f);
        if !(s.is_finite() && t.is_finite()) {
            return Err(PipelineError::NonFiniteIntegral(sp.label()));
        }
        simpson.push(s);
        trapezoid.push(t);
    }
    Ok((simpson, trapezoid))
}

fn active_integrals(group: &SpectrumGroup, method: IntegrationMethod) -> &[f64] {
    match method {
        IntegrationMethod::Simpson => group.integrals_simpson(),
        IntegrationMethod::Trapezoid => group.integrals_trapezoid(),
    }
}

/// Fit a group's calibration when peaks and integrals pair up (≥2 pairs).
fn calibrate(
    group: &SpectrumGroup,
    method: IntegrationMethod,
) -> Result<CalibrationResult, PipelineError> {
    let peaks = group.peaks();
    let integrals = active_integrals(group, method);
    if peaks.len() != integrals.len() || peaks.len() < 2 {
        return Err(PipelineError::InsufficientData {
            peaks: peaks.len(),
            integrals: integrals.len(),
        });
    }
    Ok(linear_fit(peaks, integrals))
}

// ---------------------------------------------------------------------------
// Stage transitions
// ---------------------------------------------------------------------------

fn extract_peaks_stage(session: &mut Session) -> Result<f64, PipelineError> {
    if !session.group(GroupRole::Sample).has_emission() {
        return Err(PipelineError::NoSampleData);
    }
    let params = session.parameters();
    let hv = params
        .wavelength()
        .ok_or_else(|| PipelineError::InvalidWavelength(params.excitation_wavelength.clone()))?;

    let sample = extract_peaks(&session.group(GroupRole::Sample).absorption, hv);
    let standard = extract_peaks(&session.group(GroupRole::Standard).absorption, hv);

    session.group_mut(GroupRole::Sample).set_peaks(sample);
    session.group_mut(GroupRole::Standard).set_peaks(standard);
    Ok(hv)
}

fn integrate_stage(session: &mut Session) -> Result<(), PipelineError> {
    let settings = session.parameters().trim.clone();
    if settings.enabled && settings.bounds().is_none() {
        log::warn!(
            "Trim bounds '{}'..'{}' are not numbers; integrating full spectra",
            settings.min,
            settings.max
        );
    }

    let (sample_s, sample_t) =
        integrate_group(&session.group(GroupRole::Sample).emission, &settings)?;
    let (standard_s, standard_t) =
        integrate_group(&session.group(GroupRole::Standard).emission, &settings)?;

    session.group_mut(GroupRole::Sample).set_integrals(sample_s, sample_t);
    session.group_mut(GroupRole::Standard).set_integrals(standard_s, standard_t);
    Ok(())
}

fn calibrate_stage(session: &mut Session) -> Result<Calibrations, PipelineError> {
    let method = session.parameters().method;
    let sample = calibrate(session.group(GroupRole::Sample), method)?;

    let standard_group = session.group(GroupRole::Standard);
    let standard = if standard_group.is_empty() {
        None
    } else {
        match calibrate(standard_group, method) {
            Ok(fit) => Some(fit),
            Err(e) => {
                log::warn!("Standard not calibrated: {e}");
                None
            }
        }
    };

    let calibrations = Calibrations { sample, standard };
    session.calibrations = Some(calibrations);
    Ok(calibrations)
}

fn quantum_yield_stage<P: ParameterProvider + ?Sized>(
    session: &mut Session,
    calibrations: &Calibrations,
    provider: &mut P,
) -> QuantumYieldResult {
    let result = match calibrations.standard {
        None => QuantumYieldResult::not_computed(NotComputedReason::NoStandardCalibration),
        Some(standard) if standard.slope == 0.0 => {
            QuantumYieldResult::not_computed(NotComputedReason::ZeroStandardSlope)
        }
        Some(standard) => {
            evaluate_quantum_yield(provider, calibrations.sample.slope, standard.slope)
        }
    };
    session.quantum_yield = Some(result.clone());
    result
}

/// Run one stage; on success move `session` past it, otherwise record which
/// stage failed and why.
fn advance<T>(
    session: &mut Session,
    stage: Stage,
    work: impl FnOnce(&mut Session) -> Result<T, PipelineError>,
) -> Result<T, PipelineError> {
    match work(session) {
        Ok(value) => {
            let next = stage.reached();
            log::info!("Pipeline stage reached: {next:?}");
            session.state = next;
            Ok(value)
        }
        Err(e) => {
            log::error!("Pipeline failed during {stage}: {e}");
            session.state = PipelineState::Failed {
                stage,
                reason: e.clone(),
            };
            Err(e)
        }
    }
}

/// Run the full analysis on the spectra loaded into `session`.
///
/// `provider` is consulted only when a standard calibration with non-zero
/// slope exists. Its cancellation leaves the quantum yield "not computed"
/// while calibrations are still reported.
pub fn run<P: ParameterProvider + ?Sized>(
    session: &mut Session,
    provider: &mut P,
) -> Result<Report, PipelineError> {
    // Every run starts from the parsed spectra; derived values are rebuilt.
    session.state = PipelineState::Parsed;
    session.calibrations = None;
    session.quantum_yield = None;

    let hv = advance(session, Stage::PeakExtraction, extract_peaks_stage)?;
    advance(session, Stage::Integration, integrate_stage)?;
    let calibrations = advance(session, Stage::Calibration, calibrate_stage)?;
    let quantum_yield = advance(session, Stage::QuantumYield, |s| {
        Ok(quantum_yield_stage(s, &calibrations, provider))
    })?;

    let report = Report::new(hv, session, &calibrations, quantum_yield);
    session.state = PipelineState::Reported;
    Ok(report)
}

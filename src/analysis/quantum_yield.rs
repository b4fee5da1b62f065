//! Relative fluorescence quantum yield.
//!
//! The sample is compared against a reference standard of known quantum
//! yield. The ratio of calibration slopes (integrated emission per unit
//! absorbance) is scaled by the squared ratio of solvent refractive indices:
//!
//! ```text
//! QY = QY_std · (slope_sample / slope_std) · (n_sample / n_std)²
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::model::GroupRole;

// ---------------------------------------------------------------------------
// Solvents
// ---------------------------------------------------------------------------

/// Solvents with a tabulated refractive index, plus a free-form entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solvent {
    Water,
    Ethanol,
    Methanol,
    Dichloromethane,
    /// Any other solvent; the refractive index must be supplied separately.
    Other,
}

impl Solvent {
    pub const ALL: [Solvent; 5] = [
        Solvent::Water,
        Solvent::Ethanol,
        Solvent::Methanol,
        Solvent::Dichloromethane,
        Solvent::Other,
    ];

    /// Tabulated refractive index, `None` for [`Solvent::Other`].
    pub const fn refractive_index(self) -> Option<f64> {
        match self {
            Solvent::Water => Some(1.348),
            Solvent::Ethanol => Some(1.3688),
            Solvent::Methanol => Some(1.3284),
            Solvent::Dichloromethane => Some(1.439),
            Solvent::Other => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Solvent::Water => "Water",
            Solvent::Ethanol => "Ethanol",
            Solvent::Methanol => "Methanol",
            Solvent::Dichloromethane => "Dichloromethane",
            Solvent::Other => "Other",
        }
    }
}

impl fmt::Display for Solvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Solvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Solvent::ALL
            .into_iter()
            .find(|solvent| solvent.name().eq_ignore_ascii_case(wanted))
            .or_else(|| wanted.eq_ignore_ascii_case("another").then_some(Solvent::Other))
            .ok_or_else(|| format!("unknown solvent '{wanted}'"))
    }
}

// ---------------------------------------------------------------------------
// External parameters
// ---------------------------------------------------------------------------

/// Supplies the parameters a quantum yield needs beyond the calibrations.
///
/// Every request answers with a value or `None` when the user cancels.
pub trait ParameterProvider {
    /// Known quantum yield of the standard, in percent.
    fn standard_quantum_yield(&mut self) -> Option<f64>;

    /// Whether sample and standard were measured in the same solvent.
    fn same_solvent(&mut self) -> Option<bool>;

    /// Solvent used for the given group.
    fn solvent(&mut self, role: GroupRole) -> Option<Solvent>;

    /// Refractive index for a group whose solvent is [`Solvent::Other`].
    fn custom_refractive_index(&mut self, role: GroupRole) -> Option<f64>;
}

/// Why no quantum yield was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotComputedReason {
    /// No standard group, or too few standard measurements to calibrate.
    NoStandardCalibration,
    /// The standard calibration has zero slope.
    ZeroStandardSlope,
    /// The parameter provider declined a request.
    Cancelled,
    /// A supplied parameter was out of range.
    InvalidParameter(String),
}

impl fmt::Display for NotComputedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotComputedReason::NoStandardCalibration => write!(f, "no standard calibration"),
            NotComputedReason::ZeroStandardSlope => write!(f, "standard slope is zero"),
            NotComputedReason::Cancelled => write!(f, "cancelled"),
            NotComputedReason::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuantumYieldResult {
    Computed {
        percent: f64,
    },
    NotComputed {
        reason: NotComputedReason,
    },
}

impl QuantumYieldResult {
    pub fn percent(&self) -> Option<f64> {
        match self {
            QuantumYieldResult::Computed { percent } => Some(*percent),
            QuantumYieldResult::NotComputed { .. } => None,
        }
    }

    pub(crate) fn not_computed(reason: NotComputedReason) -> Self {
        QuantumYieldResult::NotComputed { reason }
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Quantum yield in percent. A zero standard slope yields 0.
pub fn compute_quantum_yield(
    qy_standard_percent: f64,
    slope_sample: f64,
    slope_standard: f64,
    n_sample: f64,
    n_standard: f64,
) -> f64 {
    if slope_standard == 0.0 {
        return 0.0;
    }
    let n_ratio = n_sample / n_standard;
    qy_standard_percent * (slope_sample / slope_standard) * n_ratio * n_ratio
}

fn refractive_index<P: ParameterProvider + ?Sized>(
    provider: &mut P,
    role: GroupRole,
) -> Result<f64, NotComputedReason> {
    let solvent = provider.solvent(role).ok_or(NotComputedReason::Cancelled)?;
    if let Some(n) = solvent.refractive_index() {
        return Ok(n);
    }
    let n = provider
        .custom_refractive_index(role)
        .ok_or(NotComputedReason::Cancelled)?;
    if n.is_finite() && n > 0.0 {
        Ok(n)
    } else {
        Err(NotComputedReason::InvalidParameter(format!(
            "refractive index of the {role} must be positive, got {n}"
        )))
    }
}

fn gather_and_compute<P: ParameterProvider + ?Sized>(
    provider: &mut P,
    slope_sample: f64,
    slope_standard: f64,
) -> Result<f64, NotComputedReason> {
    if !(slope_sample.is_finite() && slope_standard.is_finite()) {
        return Err(NotComputedReason::InvalidParameter(format!(
            "calibration slopes must be finite, got {slope_sample} and {slope_standard}"
        )));
    }
    let qy_standard = provider
        .standard_quantum_yield()
        .ok_or(NotComputedReason::Cancelled)?;
    if !(0.0..=100.0).contains(&qy_standard) {
        return Err(NotComputedReason::InvalidParameter(format!(
            "standard quantum yield must lie in 0–100 %, got {qy_standard}"
        )));
    }

    let same = provider.same_solvent().ok_or(NotComputedReason::Cancelled)?;
    let (n_sample, n_standard) = if same {
        (1.0, 1.0)
    } else {
        let n_sample = refractive_index(provider, GroupRole::Sample)?;
        let n_standard = refractive_index(provider, GroupRole::Standard)?;
        (n_sample, n_standard)
    };
    log::debug!("Refractive indices: sample {n_sample}, standard {n_standard}");

    let qy = compute_quantum_yield(
        qy_standard,
        slope_sample,
        slope_standard,
        n_sample,
        n_standard,
    );
    if qy.is_finite() {
        Ok(qy)
    } else {
        Err(NotComputedReason::InvalidParameter(format!(
            "quantum yield is not a finite number ({qy})"
        )))
    }
}

/// Ask `provider` for the standard's parameters and compute the quantum yield.
///
/// Requests are made in order: standard quantum yield, same-solvent
/// declaration, then sample and standard solvents when they differ. Any
/// cancellation ends the evaluation with [`NotComputedReason::Cancelled`].
pub fn evaluate_quantum_yield<P: ParameterProvider + ?Sized>(
    provider: &mut P,
    slope_sample: f64,
    slope_standard: f64,
) -> QuantumYieldResult {
    match gather_and_compute(provider, slope_sample, slope_standard) {
        Ok(percent) => QuantumYieldResult::Computed { percent },
        Err(reason) => {
            log::info!("Quantum yield not computed: {reason}");
            QuantumYieldResult::not_computed(reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Scripted provider; `None` fields behave as a cancelled prompt.
    #[derive(Default)]
    struct Scripted {
        qy: Option<f64>,
        same: Option<bool>,
        sample: Option<Solvent>,
        standard: Option<Solvent>,
        custom: Option<f64>,
        calls: Vec<&'static str>,
    }

    impl ParameterProvider for Scripted {
        fn standard_quantum_yield(&mut self) -> Option<f64> {
            self.calls.push("qy");
            self.qy
        }
        fn same_solvent(&mut self) -> Option<bool> {
            self.calls.push("same");
            self.same
        }
        fn solvent(&mut self, role: GroupRole) -> Option<Solvent> {
            self.calls.push("solvent");
            match role {
                GroupRole::Sample => self.sample,
                GroupRole::Standard => self.standard,
            }
        }
        fn custom_refractive_index(&mut self, _role: GroupRole) -> Option<f64> {
            self.calls.push("custom");
            self.custom
        }
    }

    #[test]
    fn formula_reference_value() {
        assert_relative_eq!(compute_quantum_yield(10.0, 2.0, 1.0, 1.0, 1.0), 20.0);
    }

    #[test]
    fn refractive_index_correction_is_squared() {
        let qy = compute_quantum_yield(50.0, 1.0, 1.0, 1.3688, 1.348);
        assert_relative_eq!(qy, 50.0 * (1.3688f64 / 1.348).powi(2), epsilon = 1e-12);
    }

    #[test]
    fn zero_standard_slope_gives_zero() {
        assert_eq!(compute_quantum_yield(10.0, 2.0, 0.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn same_solvent_uses_unit_indices() {
        let mut p = Scripted {
            qy: Some(10.0),
            same: Some(true),
            ..Default::default()
        };
        let result = evaluate_quantum_yield(&mut p, 2.0, 1.0);
        assert_eq!(result.percent(), Some(20.0));
        assert_eq!(p.calls, vec!["qy", "same"]);
    }

    #[test]
    fn tabulated_solvents_are_looked_up() {
        let mut p = Scripted {
            qy: Some(4.2),
            same: Some(false),
            sample: Some(Solvent::Ethanol),
            standard: Some(Solvent::Water),
            ..Default::default()
        };
        let percent = evaluate_quantum_yield(&mut p, 3.0, 1.5).percent().unwrap();
        assert_relative_eq!(percent, 4.2 * 2.0 * (1.3688f64 / 1.348).powi(2), epsilon = 1e-12);
    }

    #[test]
    fn other_solvent_asks_for_custom_index() {
        let mut p = Scripted {
            qy: Some(10.0),
            same: Some(false),
            sample: Some(Solvent::Other),
            standard: Some(Solvent::Other),
            custom: Some(1.5),
            ..Default::default()
        };
        let result = evaluate_quantum_yield(&mut p, 1.0, 1.0);
        assert_relative_eq!(result.percent().unwrap(), 10.0);
        assert_eq!(p.calls, vec!["qy", "same", "solvent", "custom", "solvent", "custom"]);
    }

    #[test]
    fn cancellation_at_any_step_is_not_computed() {
        let mut p = Scripted::default();
        assert_eq!(
            evaluate_quantum_yield(&mut p, 1.0, 1.0),
            QuantumYieldResult::not_computed(NotComputedReason::Cancelled)
        );

        let mut p = Scripted {
            qy: Some(10.0),
            same: Some(false),
            sample: Some(Solvent::Water),
            ..Default::default()
        };
        assert_eq!(
            evaluate_quantum_yield(&mut p, 1.0, 1.0),
            QuantumYieldResult::not_computed(NotComputedReason::Cancelled)
        );
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let mut p = Scripted {
            qy: Some(120.0),
            same: Some(true),
            ..Default::default()
        };
        assert!(matches!(
            evaluate_quantum_yield(&mut p, 1.0, 1.0),
            QuantumYieldResult::NotComputed {
                reason: NotComputedReason::InvalidParameter(_)
            }
        ));

        let mut p = Scripted {
            qy: Some(10.0),
            same: Some(false),
            sample: Some(Solvent::Other),
            custom: Some(-1.0),
            ..Default::default()
        };
        assert!(evaluate_quantum_yield(&mut p, 1.0, 1.0).percent().is_none());
    }

    #[test]
    fn non_finite_slopes_are_not_computed() {
        for (sample, standard) in [(f64::NAN, 1.0), (1.0, f64::NAN), (f64::INFINITY, 1.0)] {
            let mut p = Scripted {
                qy: Some(10.0),
                same: Some(true),
                ..Default::default()
            };
            assert!(matches!(
                evaluate_quantum_yield(&mut p, sample, standard),
                QuantumYieldResult::NotComputed {
                    reason: NotComputedReason::InvalidParameter(_)
                }
            ));
            // Rejected before any parameter is requested.
            assert!(p.calls.is_empty());
        }
    }

    #[test]
    fn solvent_names_parse_case_insensitively() {
        assert_eq!("water".parse(), Ok(Solvent::Water));
        assert_eq!(" DICHLOROMETHANE ".parse(), Ok(Solvent::Dichloromethane));
        assert_eq!("another".parse(), Ok(Solvent::Other));
        assert!("benzene".parse::<Solvent>().is_err());
    }
}

use std::fmt;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analysis::integrate::IntegrationMethod;
use crate::analysis::quantum_yield::QuantumYieldResult;
use crate::analysis::regression::CalibrationResult;
use crate::data::filter::TrimSettings;
use crate::data::model::{GroupRole, SpectrumGroup};
use crate::state::{Calibrations, Session};

/// Decimal places kept for regression coefficients.
pub const COEFFICIENT_DECIMALS: i32 = 6;
/// Decimal places kept for the quantum yield percentage.
pub const QUANTUM_YIELD_DECIMALS: i32 = 2;

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

// ---------------------------------------------------------------------------
// Report structure
// ---------------------------------------------------------------------------

/// Wavelength window of a run with trimming enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrimWindow {
    Applied { min: f64, max: f64 },
    /// The bounds as entered; full spectra were integrated.
    Ignored { min: String, max: String },
}

impl TrimWindow {
    fn from_settings(settings: &TrimSettings) -> Option<Self> {
        if !settings.enabled {
            return None;
        }
        Some(match settings.bounds() {
            Some((min, max)) => TrimWindow::Applied { min, max },
            None => TrimWindow::Ignored {
                min: settings.min.clone(),
                max: settings.max.clone(),
            },
        })
    }
}

/// One (absorbance, integral) pair that entered a calibration fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationPoint {
    pub absorbance: f64,
    pub integral: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    /// Regression line, coefficients rounded to six decimals.
    pub calibration: CalibrationResult,
    pub points: Vec<CalibrationPoint>,
}

impl GroupSummary {
    fn new(group: &SpectrumGroup, method: IntegrationMethod, fit: CalibrationResult) -> Self {
        let integrals = match method {
            IntegrationMethod::Simpson => group.integrals_simpson(),
            IntegrationMethod::Trapezoid => group.integrals_trapezoid(),
        };
        let points = group
            .peaks()
            .iter()
            .zip(integrals)
            .map(|(&absorbance, &integral)| CalibrationPoint {
                absorbance,
                integral,
            })
            .collect();
        GroupSummary {
            calibration: CalibrationResult {
                slope: round_to(fit.slope, COEFFICIENT_DECIMALS),
                intercept: round_to(fit.intercept, COEFFICIENT_DECIMALS),
            },
            points,
        }
    }
}

/// Everything a run produced, ready for display or export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub excitation_wavelength: f64,
    pub method: IntegrationMethod,
    /// Present only when trimming was enabled.
    pub trim: Option<TrimWindow>,
    pub sample: GroupSummary,
    /// Present only when the standard group could be calibrated.
    pub standard: Option<GroupSummary>,
    /// Percentage rounded to two decimals, or why it is missing.
    pub quantum_yield: QuantumYieldResult,
}

impl Report {
    pub(crate) fn new(
        excitation_wavelength: f64,
        session: &Session,
        calibrations: &Calibrations,
        quantum_yield: QuantumYieldResult,
    ) -> Self {
        let params = session.parameters();
        let method = params.method;
        let quantum_yield = match quantum_yield {
            QuantumYieldResult::Computed { percent } => QuantumYieldResult::Computed {
                percent: round_to(percent, QUANTUM_YIELD_DECIMALS),
            },
            other => other,
        };

        Report {
            excitation_wavelength,
            method,
            trim: TrimWindow::from_settings(&params.trim),
            sample: GroupSummary::new(
                session.group(GroupRole::Sample),
                method,
                calibrations.sample,
            ),
            standard: calibrations
                .standard
                .map(|fit| GroupSummary::new(session.group(GroupRole::Standard), method, fit)),
            quantum_yield,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing report")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
    }

    /// Write the calibration points of both groups as CSV.
    pub fn write_calibration_csv<W: Write>(&self, writer: W) -> Result<()> {
        #[derive(Serialize)]
        struct Row {
            group: GroupRole,
            index: usize,
            absorbance: f64,
            integral: f64,
            fitted: f64,
        }

        let mut wtr = csv::Writer::from_writer(writer);
        let groups = [
            (GroupRole::Sample, Some(&self.sample)),
            (GroupRole::Standard, self.standard.as_ref()),
        ];
        for (role, summary) in groups {
            let Some(summary) = summary else { continue };
            for (index, point) in summary.points.iter().enumerate() {
                wtr.serialize(Row {
                    group: role,
                    index,
                    absorbance: point.absorbance,
                    integral: point.integral,
                    fitted: summary.calibration.predict(point.absorbance),
                })
                .context("writing calibration row")?;
            }
        }
        wtr.flush().context("flushing calibration CSV")?;
        Ok(())
    }

    pub fn write_calibration_csv_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        self.write_calibration_csv(file)
    }
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

fn write_group(f: &mut fmt::Formatter<'_>, title: &str, summary: &GroupSummary) -> fmt::Result {
    let CalibrationResult { slope, intercept } = summary.calibration;
    writeln!(f, "{title}:")?;
    writeln!(f, "Regression equation: y = {slope:.6}x + {intercept:.6}")?;
    writeln!(f, "Slope coefficient: {slope:.6}")?;
    writeln!(f)
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== CALCULATION RESULTS ===")?;
        writeln!(f)?;
        writeln!(f, "Excitation wavelength: {} nm", self.excitation_wavelength)?;
        writeln!(f, "Integration method: {}", self.method)?;
        match &self.trim {
            Some(TrimWindow::Applied { min, max }) => {
                writeln!(f, "Data trimming: {min} - {max} nm")?;
            }
            Some(TrimWindow::Ignored { min, max }) => {
                writeln!(f, "Data trimming: ignored, bounds '{min}' - '{max}' are not numbers")?;
            }
            None => {}
        }
        writeln!(f)?;

        write_group(f, "SAMPLE", &self.sample)?;
        if let Some(standard) = &self.standard {
            write_group(f, "STANDARD", standard)?;
        }

        writeln!(f, "QUANTUM YIELD:")?;
        match &self.quantum_yield {
            QuantumYieldResult::Computed { percent } => writeln!(f, "QY = {percent:.2} %"),
            QuantumYieldResult::NotComputed { reason } => writeln!(f, "not computed ({reason})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::quantum_yield::NotComputedReason;

    fn report() -> Report {
        Report {
            excitation_wavelength: 365.0,
            method: IntegrationMethod::Simpson,
            trim: Some(TrimWindow::Applied {
                min: 400.0,
                max: 700.0,
            }),
            sample: GroupSummary {
                calibration: CalibrationResult {
                    slope: 800.0,
                    intercept: 0.5,
                },
                points: vec![
                    CalibrationPoint {
                        absorbance: 0.1,
                        integral: 80.0,
                    },
                    CalibrationPoint {
                        absorbance: 0.2,
                        integral: 160.0,
                    },
                ],
            },
            standard: None,
            quantum_yield: QuantumYieldResult::Computed { percent: 20.0 },
        }
    }

    #[test]
    fn rounding_helper() {
        assert_eq!(round_to(1.23456789, 6), 1.234568);
        assert_eq!(round_to(19.999999, 2), 20.0);
        assert_eq!(round_to(-0.125, 2), -0.13);
    }

    #[test]
    fn text_matches_results_panel() {
        let text = report().to_string();
        assert!(text.contains("Excitation wavelength: 365 nm"));
        assert!(text.contains("Integration method: Simpson's method"));
        assert!(text.contains("Data trimming: 400 - 700 nm"));
        assert!(text.contains("Regression equation: y = 800.000000x + 0.500000"));
        assert!(text.contains("QY = 20.00 %"));
        assert!(!text.contains("STANDARD"));
    }

    #[test]
    fn ignored_trim_window_is_reported() {
        let mut r = report();
        r.trim = TrimWindow::from_settings(&TrimSettings::new(true, "abc", "700"));
        let text = r.to_string();
        assert!(text.contains("Data trimming: ignored, bounds 'abc' - '700' are not numbers"));

        let json: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        assert_eq!(json["trim"]["status"], "ignored");
        assert_eq!(json["trim"]["min"], "abc");

        assert_eq!(TrimWindow::from_settings(&TrimSettings::new(false, "abc", "700")), None);
    }

    #[test]
    fn text_reports_missing_quantum_yield() {
        let mut r = report();
        r.quantum_yield = QuantumYieldResult::NotComputed {
            reason: NotComputedReason::Cancelled,
        };
        assert!(r.to_string().contains("not computed (cancelled)"));
    }

    #[test]
    fn json_export() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();
        assert_eq!(json["method"], "simpson");
        assert_eq!(json["quantum_yield"]["status"], "computed");
        assert_eq!(json["quantum_yield"]["percent"], 20.0);
        assert_eq!(json["sample"]["calibration"]["slope"], 800.0);
        assert!(json["standard"].is_null());
    }

    #[test]
    fn csv_export() {
        let mut buf = Vec::new();
        report().write_calibration_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("group,index,absorbance,integral,fitted"));
        assert_eq!(lines.next(), Some("sample,0,0.1,80.0,80.5"));
        assert_eq!(lines.count(), 1);
    }
}

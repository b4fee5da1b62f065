use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use tempfile::TempDir;

use qyield::analysis::integrate::IntegrationMethod;
use qyield::analysis::quantum_yield::{NotComputedReason, QuantumYieldResult, Solvent};
use qyield::config::{parse_config, StandardParameters};
use qyield::data::loader::{load_group_folder, Diagnostic};
use qyield::data::model::GroupRole;
use qyield::pipeline::{self, PipelineError};
use qyield::state::{PipelineState, RunParameters, Session, Stage};

const SHAPE: [f64; 5] = [1.0, 2.0, 3.0, 2.0, 1.0];

/// Emission export: six `;` fields, intensity in the last one. Integrates to
/// `80 * scale` over 400..440 nm with either method.
fn emission_text(scale: f64) -> String {
    let mut text = String::from("# wl;ex;slit;gain;time;counts\n");
    for (i, v) in SHAPE.iter().enumerate() {
        let wl = 400.0 + 10.0 * i as f64;
        text.push_str(&format!("{wl};365;5;1;0.1;{}\n", v * scale));
    }
    text
}

/// Absorption export peaking at 365 nm with the given absorbance.
fn absorption_text(absorbance: f64) -> String {
    format!(
        "Wavelength (nm),Abs\n360,{}\n365,{absorbance}\n370,{}\n",
        absorbance / 2.0,
        absorbance / 2.0
    )
}

fn write_group(dir: &Path, scales: &[f64], absorbances: &[f64]) {
    fs::create_dir_all(dir).unwrap();
    for (i, (scale, od)) in scales.iter().zip(absorbances).enumerate() {
        fs::write(dir.join(format!("m{}.tit", i + 1)), emission_text(*scale)).unwrap();
        fs::write(dir.join(format!("m{}.txt", i + 1)), absorption_text(*od)).unwrap();
    }
}

fn fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_group(&tmp.path().join("sample"), &[1.0, 2.0], &[0.1, 0.2]);
    write_group(&tmp.path().join("standard"), &[0.5, 1.0], &[0.1, 0.2]);
    tmp
}

fn session(root: &Path, params: RunParameters) -> Session {
    let mut session = Session::new(params);
    for (role, name) in [(GroupRole::Sample, "sample"), (GroupRole::Standard, "standard")] {
        let loaded = load_group_folder(&root.join(name)).unwrap();
        assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);
        session.set_group(role, loaded.group);
    }
    session
}

fn same_solvent_standard(qy: f64) -> StandardParameters {
    StandardParameters {
        quantum_yield: Some(qy),
        same_solvent: Some(true),
        ..Default::default()
    }
}

#[test]
fn folders_to_quantum_yield() {
    let tmp = fixture();
    let mut session = session(tmp.path(), RunParameters::default());
    let mut provider = same_solvent_standard(10.0);

    let report = pipeline::run(&mut session, &mut provider).unwrap();

    assert_eq!(session.state(), &PipelineState::Reported);
    assert_relative_eq!(report.excitation_wavelength, 365.0);
    assert_relative_eq!(report.sample.calibration.slope, 800.0, epsilon = 1e-6);
    assert_relative_eq!(report.sample.calibration.intercept, 0.0, epsilon = 1e-6);
    let standard = report.standard.as_ref().unwrap();
    assert_relative_eq!(standard.calibration.slope, 400.0, epsilon = 1e-6);
    assert_eq!(report.quantum_yield.percent(), Some(20.0));

    let points: Vec<(f64, f64)> = report
        .sample
        .points
        .iter()
        .map(|p| (p.absorbance, p.integral))
        .collect();
    assert_eq!(points.len(), 2);
    assert_relative_eq!(points[0].0, 0.1);
    assert_relative_eq!(points[1].1, 160.0, epsilon = 1e-9);
}

#[test]
fn text_and_json_reports() {
    let tmp = fixture();
    let mut session = session(tmp.path(), RunParameters::default());
    let report = pipeline::run(&mut session, &mut same_solvent_standard(10.0)).unwrap();

    let text = report.to_string();
    assert!(text.starts_with("=== CALCULATION RESULTS ==="));
    assert!(text.contains("Excitation wavelength: 365 nm"));
    assert!(text.contains("Integration method: Simpson's method"));
    assert!(text.contains("Slope coefficient: 800.000000"));
    assert!(text.contains("QY = 20.00 %"));
    assert!(!text.contains("Data trimming"));

    let json_path = tmp.path().join("report.json");
    report.write_json(&json_path).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["method"], "simpson");
    assert_eq!(value["quantum_yield"]["status"], "computed");
    assert_eq!(value["quantum_yield"]["percent"], 20.0);

    let csv_path = tmp.path().join("calibration.csv");
    report.write_calibration_csv_file(&csv_path).unwrap();
    let mut rdr = csv::Reader::from_path(&csv_path).unwrap();
    assert_eq!(rdr.records().count(), 4);
}

#[test]
fn trapezoid_method_and_config() {
    let tmp = fixture();
    let cfg = parse_config(
        r#"
        [run]
        excitation_wavelength = 365
        method = "trapezoid"

        [standard]
        quantum_yield = 10
        same_solvent = false
        sample_solvent = "water"
        standard_solvent = "other"
        standard_refractive_index = 1.348
        "#,
    )
    .unwrap();

    let mut session = session(tmp.path(), cfg.run_parameters());
    let mut provider = cfg.standard.clone();
    let report = pipeline::run(&mut session, &mut provider).unwrap();

    assert_eq!(report.method, IntegrationMethod::Trapezoid);
    assert_relative_eq!(report.sample.calibration.slope, 800.0, epsilon = 1e-6);
    assert_eq!(provider.sample_solvent, Some(Solvent::Water));
    assert_eq!(report.quantum_yield.percent(), Some(20.0));
}

#[test]
fn trimming_window_shows_in_report() {
    let tmp = fixture();
    let mut params = RunParameters::default();
    params.trim.enabled = true;
    params.trim.min = "410".into();
    params.trim.max = "430".into();

    let mut session = session(tmp.path(), params);
    let report = pipeline::run(&mut session, &mut same_solvent_standard(10.0)).unwrap();

    // 410..430 keeps [2, 3, 2]: Simpson gives 160/3 per unit scale.
    assert_relative_eq!(report.sample.points[0].integral, 160.0 / 3.0, epsilon = 1e-9);
    assert_relative_eq!(report.sample.calibration.slope, 1600.0 / 3.0, epsilon = 1e-5);
    assert!(report.to_string().contains("Data trimming: 410 - 430 nm"));
    assert_eq!(report.quantum_yield.percent(), Some(20.0));
}

#[test]
fn missing_standard_still_reports_sample() {
    let tmp = fixture();
    let mut session = Session::new(RunParameters::default());
    let loaded = load_group_folder(&tmp.path().join("sample")).unwrap();
    session.set_group(GroupRole::Sample, loaded.group);

    let report = pipeline::run(&mut session, &mut StandardParameters::default()).unwrap();

    assert!(report.standard.is_none());
    assert_eq!(
        report.quantum_yield,
        QuantumYieldResult::NotComputed {
            reason: NotComputedReason::NoStandardCalibration
        }
    );
    assert!(report.to_string().contains("not computed (no standard calibration)"));
}

#[test]
fn cancelled_parameters_keep_calibrations() {
    let tmp = fixture();
    let mut session = session(tmp.path(), RunParameters::default());

    let report = pipeline::run(&mut session, &mut StandardParameters::default()).unwrap();

    assert_eq!(
        report.quantum_yield,
        QuantumYieldResult::NotComputed {
            reason: NotComputedReason::Cancelled
        }
    );
    assert!(session.calibrations().unwrap().standard.is_some());
}

#[test]
fn empty_sample_folder_fails() {
    let tmp = TempDir::new().unwrap();
    let mut session = Session::new(RunParameters::default());
    let loaded = load_group_folder(tmp.path()).unwrap();
    session.set_group(GroupRole::Sample, loaded.group);

    let err = pipeline::run(&mut session, &mut same_solvent_standard(10.0)).unwrap_err();
    assert_eq!(err, PipelineError::NoSampleData);
    assert_eq!(
        session.state(),
        &PipelineState::Failed {
            stage: Stage::PeakExtraction,
            reason: PipelineError::NoSampleData,
        }
    );
}

#[test]
fn unpaired_files_are_reported_but_loaded() {
    let tmp = fixture();
    let dir = tmp.path().join("sample");
    fs::write(dir.join("extra.tit"), emission_text(3.0)).unwrap();

    let loaded = load_group_folder(&dir).unwrap();
    assert_eq!(loaded.group.emission.len(), 3);
    assert_eq!(loaded.group.absorption.len(), 2);
    assert!(matches!(
        loaded.diagnostics.as_slice(),
        [Diagnostic::Unpaired { .. }]
    ));
}

#[test]
fn repeated_wavelength_stops_the_run() {
    let tmp = fixture();
    let path = tmp.path().join("sample").join("m2.tit");
    // Repeat the 400 nm point right after the header line.
    let text = emission_text(2.0).replacen('\n', "\n400;365;5;1;0.1;2\n", 1);
    fs::write(&path, text).unwrap();

    let mut session = session(tmp.path(), RunParameters::default());
    let err = pipeline::run(&mut session, &mut same_solvent_standard(10.0)).unwrap_err();

    assert_eq!(err, PipelineError::NonFiniteIntegral("m2.tit".into()));
    assert!(matches!(
        session.state(),
        PipelineState::Failed {
            stage: Stage::Integration,
            ..
        }
    ));
    assert!(session.quantum_yield().is_none());
}

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use qyield::analysis::integrate::IntegrationMethod;
use qyield::analysis::quantum_yield::Solvent;
use qyield::config::{self, RunConfig};
use qyield::data::loader::{load_group_folder, read_spectrum_file};
use qyield::data::model::{FileRole, GroupRole};
use qyield::pipeline;
use qyield::prompt::TerminalPrompt;
use qyield::state::Session;

#[derive(Parser)]
#[command(name = "qyield")]
#[command(about = "Relative fluorescence quantum yield from emission/absorption spectra")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate sample (and standard) folders and compute the quantum yield.
    Run(RunArgs),
    /// Parse a single spectral file and print what was read.
    Inspect {
        file: PathBuf,
        #[arg(short, long, value_enum)]
        role: FileRole,
    },
    /// List the solvents with tabulated refractive indices.
    Solvents,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Folder with the sample's .tit/.txt files.
    #[arg(long)]
    sample: PathBuf,
    /// Folder with the reference standard's .tit/.txt files.
    #[arg(long)]
    standard: Option<PathBuf>,
    /// TOML run configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Excitation wavelength in nm (overrides the config file).
    #[arg(short, long)]
    wavelength: Option<String>,
    /// Integration method (overrides the config file).
    #[arg(short, long, value_enum)]
    method: Option<IntegrationMethod>,
    /// Lower trim bound in nm; enables trimming together with --trim-max.
    #[arg(long, requires = "trim_max")]
    trim_min: Option<String>,
    /// Upper trim bound in nm.
    #[arg(long, requires = "trim_min")]
    trim_max: Option<String>,
    /// Ask for the standard's parameters on the terminal.
    #[arg(short, long)]
    interactive: bool,
    /// Write the report as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
    /// Write the calibration points as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Inspect { file, role } => inspect(&file, role),
        Commands::Solvents => {
            for solvent in Solvent::ALL {
                match solvent.refractive_index() {
                    Some(n) => println!("{:<16} n = {n}", solvent.name()),
                    None => println!("{:<16} (enter refractive index)", solvent.name()),
                }
            }
            Ok(())
        }
    }
}

fn load_into(session: &mut Session, role: GroupRole, dir: &Path) -> Result<()> {
    let loaded = load_group_folder(dir).with_context(|| format!("loading {role} data"))?;
    for diagnostic in &loaded.diagnostics {
        eprintln!("warning: {diagnostic}");
    }
    session.set_group(role, loaded.group);
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let cfg = match &args.config {
        Some(path) => config::load_config(path)?,
        None => RunConfig::default(),
    };

    let mut params = cfg.run_parameters();
    if let Some(wl) = args.wavelength {
        params.excitation_wavelength = wl;
    }
    if let Some(method) = args.method {
        params.method = method;
    }
    if let (Some(min), Some(max)) = (args.trim_min, args.trim_max) {
        params.trim.enabled = true;
        params.trim.min = min;
        params.trim.max = max;
    }

    let mut session = Session::new(params);
    load_into(&mut session, GroupRole::Sample, &args.sample)?;
    if let Some(dir) = &args.standard {
        load_into(&mut session, GroupRole::Standard, dir)?;
    }

    let outcome = if args.interactive {
        let stdin = io::stdin();
        let mut prompt = TerminalPrompt::new(stdin.lock(), io::stderr());
        pipeline::run(&mut session, &mut prompt)
    } else {
        let mut standard = cfg.standard.clone();
        pipeline::run(&mut session, &mut standard)
    };
    let report = outcome.context("calculation failed")?;

    println!("{report}");

    if let Some(path) = args.json.as_ref().or(cfg.output.json.as_ref()) {
        report.write_json(path)?;
        log::info!("Report written to {}", path.display());
    }
    if let Some(path) = args.csv.as_ref().or(cfg.output.csv.as_ref()) {
        report.write_calibration_csv_file(path)?;
        log::info!("Calibration table written to {}", path.display());
    }
    Ok(())
}

fn inspect(file: &Path, role: FileRole) -> Result<()> {
    let parsed = read_spectrum_file(file, role)?;
    if parsed.is_empty() {
        bail!(
            "{} contains no numeric data in the expected {role} format",
            file.display()
        );
    }
    let sp = &parsed.spectrum;
    println!("{}: {} points, {} lines skipped", sp.label(), sp.len(), parsed.skipped_lines);
    for (wl, intensity) in sp.points() {
        println!("{wl}\t{intensity}");
    }
    Ok(())
}

//! Write a synthetic sample/standard data set in the instrument export
//! formats: `.tit` emission files (semicolon separated, six columns) and
//! `.txt` absorption files (comma separated).
//!
//! ```sh
//! cargo run --bin generate_sample -- demo_data
//! qyield run --sample demo_data/sample --standard demo_data/standard
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// A fluorophore: absorption band, emission band and relative brightness.
struct Dye {
    name: &'static str,
    absorption: (f64, f64),
    emission: (f64, f64),
    brightness: f64,
}

const EXCITATION_NM: f64 = 365.0;

fn write_group(dir: &Path, dye: &Dye, absorbances: &[f64], rng: &mut SimpleRng) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    // Absorption: 300–500 nm, 1 nm step. Emission: 380–700 nm, 2 nm step.
    let abs_axis: Vec<f64> = (0..=200).map(|i| 300.0 + i as f64).collect();
    let em_axis: Vec<f64> = (0..=160).map(|i| 380.0 + 2.0 * i as f64).collect();

    for (idx, &od) in absorbances.iter().enumerate() {
        let stem = format!("{}_{}", dye.name, idx + 1);
        let (mu_a, sigma_a) = dye.absorption;
        // Scale so the band reads `od` at the excitation wavelength.
        let peak = od / gaussian(EXCITATION_NM, mu_a, sigma_a, 1.0);

        let mut txt = String::from("Wavelength (nm),Abs\n");
        for &wl in &abs_axis {
            let a = gaussian(wl, mu_a, sigma_a, peak) + rng.gauss(0.0, 0.0005);
            writeln!(txt, "{wl:.1},{a:.5}")?;
        }
        fs::write(dir.join(format!("{stem}.txt")), txt)?;

        let (mu_e, sigma_e) = dye.emission;
        let mut tit = String::from("# nm;ex;slit;gain;time;intensity\n");
        for &wl in &em_axis {
            let i = gaussian(wl, mu_e, sigma_e, dye.brightness * od) + rng.gauss(0.0, 2.0);
            writeln!(tit, "{wl:.1};{EXCITATION_NM};5;1;0.1;{i:.3}")?;
        }
        fs::write(dir.join(format!("{stem}.tit")), tit)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let out = std::env::args().nth(1).unwrap_or_else(|| "demo_data".to_string());
    let out = Path::new(&out);
    let mut rng = SimpleRng::new(42);

    let sample = Dye {
        name: "sample",
        absorption: (360.0, 25.0),
        emission: (460.0, 30.0),
        brightness: 60_000.0,
    };
    let standard = Dye {
        name: "quinine",
        absorption: (350.0, 20.0),
        emission: (450.0, 35.0),
        brightness: 100_000.0,
    };
    let absorbances = [0.02, 0.04, 0.06, 0.08, 0.10];

    write_group(&out.join("sample"), &sample, &absorbances, &mut rng)?;
    write_group(&out.join("standard"), &standard, &absorbances, &mut rng)?;

    println!(
        "Wrote {} sample and {} standard measurements to {}",
        absorbances.len(),
        absorbances.len(),
        out.display()
    );
    Ok(())
}

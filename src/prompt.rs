//! Parameter providers for the quantum yield stage.
//!
//! [`StandardParameters`] answers from configuration; [`TerminalPrompt`]
//! asks on a line-oriented terminal.

use std::io::{BufRead, Write};

use crate::analysis::quantum_yield::{ParameterProvider, Solvent};
use crate::config::StandardParameters;
use crate::data::model::GroupRole;

// ---------------------------------------------------------------------------
// Configuration-backed provider
// ---------------------------------------------------------------------------

impl ParameterProvider for StandardParameters {
    fn standard_quantum_yield(&mut self) -> Option<f64> {
        self.quantum_yield
    }

    fn same_solvent(&mut self) -> Option<bool> {
        self.same_solvent
    }

    fn solvent(&mut self, role: GroupRole) -> Option<Solvent> {
        match role {
            GroupRole::Sample => self.sample_solvent,
            GroupRole::Standard => self.standard_solvent,
        }
    }

    fn custom_refractive_index(&mut self, role: GroupRole) -> Option<f64> {
        match role {
            GroupRole::Sample => self.sample_refractive_index,
            GroupRole::Standard => self.standard_refractive_index,
        }
    }
}

// ---------------------------------------------------------------------------
// Interactive terminal provider
// ---------------------------------------------------------------------------

const DEFAULT_STANDARD_QY: f64 = 4.2;
const DEFAULT_REFRACTIVE_INDEX: f64 = 1.3333;

/// Prompts on `output` and reads answers from `input`.
///
/// An empty answer accepts the shown default, `q` or end of input cancels,
/// anything unparseable is asked again.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask until `parse` accepts the answer. `None` on cancel or I/O failure.
    fn ask<T>(
        &mut self,
        question: &str,
        default: Option<&str>,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        loop {
            let shown = match default {
                Some(d) => format!("{question} [{d}]: "),
                None => format!("{question}: "),
            };
            self.output.write_all(shown.as_bytes()).ok()?;
            self.output.flush().ok()?;

            let mut line = String::new();
            if self.input.read_line(&mut line).ok()? == 0 {
                return None;
            }
            let answer = line.trim();
            if answer.eq_ignore_ascii_case("q") {
                return None;
            }
            let answer = match (answer.is_empty(), default) {
                (true, Some(d)) => d,
                _ => answer,
            };
            match parse(answer) {
                Some(value) => return Some(value),
                None => {
                    log::debug!("Rejected answer '{answer}'");
                    writeln!(
                        self.output,
                        "Invalid answer '{answer}', try again (q to cancel)."
                    )
                    .ok()?;
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> ParameterProvider for TerminalPrompt<R, W> {
    fn standard_quantum_yield(&mut self) -> Option<f64> {
        let default = DEFAULT_STANDARD_QY.to_string();
        self.ask("Enter standard quantum yield (%)", Some(&default), |s| {
            s.parse::<f64>().ok().filter(|v| (0.0..=100.0).contains(v))
        })
    }

    fn same_solvent(&mut self) -> Option<bool> {
        self.ask("Sample and standard in the same solvent? (y/n)", Some("y"), |s| {
            match s.to_ascii_lowercase().as_str() {
                "y" | "yes" => Some(true),
                "n" | "no" => Some(false),
                _ => None,
            }
        })
    }

    fn solvent(&mut self, role: GroupRole) -> Option<Solvent> {
        let choices: Vec<&str> = Solvent::ALL.iter().map(|s| s.name()).collect();
        let question = format!("Choose a solvent for the {role} ({})", choices.join("/"));
        self.ask(&question, Some(Solvent::Water.name()), |s| s.parse().ok())
    }

    fn custom_refractive_index(&mut self, role: GroupRole) -> Option<f64> {
        let default = DEFAULT_REFRACTIVE_INDEX.to_string();
        let question = format!("Enter the refractive index of the {role}");
        self.ask(&question, Some(&default), |s| {
            s.parse::<f64>().ok().filter(|v| *v > 0.0 && *v <= 20.0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::quantum_yield::evaluate_quantum_yield;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    fn prompt(script: &str) -> TerminalPrompt<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalPrompt::new(Cursor::new(script.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn defaults_and_retries() {
        let mut p = prompt("150\n\nmaybe\nn\nethanol\nOther\n1.5\n");
        assert_eq!(p.standard_quantum_yield(), Some(4.2));
        assert_eq!(p.same_solvent(), Some(false));
        assert_eq!(p.solvent(GroupRole::Sample), Some(Solvent::Ethanol));
        assert_eq!(p.solvent(GroupRole::Standard), Some(Solvent::Other));
        assert_eq!(p.custom_refractive_index(GroupRole::Standard), Some(1.5));

        let shown = String::from_utf8(p.output).unwrap();
        assert!(shown.contains("Invalid answer '150'"));
        assert!(shown.contains("Invalid answer 'maybe'"));
    }

    #[test]
    fn q_and_eof_cancel() {
        let mut p = prompt("q\n");
        assert_eq!(p.standard_quantum_yield(), None);
        assert_eq!(p.same_solvent(), None);
    }

    #[test]
    fn drives_quantum_yield_evaluation() {
        let mut p = prompt("10\ny\n");
        let result = evaluate_quantum_yield(&mut p, 2.0, 1.0);
        assert_relative_eq!(result.percent().unwrap(), 20.0);
    }

    #[test]
    fn configured_parameters_answer_directly() {
        let mut params = StandardParameters {
            quantum_yield: Some(50.0),
            same_solvent: Some(false),
            sample_solvent: Some(Solvent::Methanol),
            standard_solvent: Some(Solvent::Other),
            sample_refractive_index: None,
            standard_refractive_index: Some(1.3284),
        };
        let result = evaluate_quantum_yield(&mut params, 1.0, 1.0);
        assert_relative_eq!(result.percent().unwrap(), 50.0, epsilon = 1e-12);

        params.quantum_yield = None;
        assert!(evaluate_quantum_yield(&mut params, 1.0, 1.0).percent().is_none());
    }
}

/// Numerical core: everything between parsed spectra and a quantum yield.
///
/// ```text
///  absorption ──► peak ─────────┐
///                               ├─► regression ──► quantum_yield
///  emission ───► integrate ─────┘
/// ```

pub mod integrate;
pub mod peak;
pub mod quantum_yield;
pub mod regression;

/// Data layer: core types, file parsing, and wavelength trimming.
///
/// Architecture:
/// ```text
///  .tit (emission) / .txt (absorption)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  probe delimiters per line → Spectrum
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ SpectrumGroup  │  emission + absorption spectra, derived values
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  optional inclusive wavelength window
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;

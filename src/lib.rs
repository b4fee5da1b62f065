//! Fluorescence quantum yield from paired emission/absorption spectra.
//!
//! Spectra are read from instrument exports ([`data::loader`]), absorbance at
//! the excitation wavelength and integrated emission are computed per
//! measurement ([`analysis`]), calibration lines are fitted for a sample and
//! a reference standard, and the two slopes give the relative quantum yield.
//! [`pipeline::run`] drives the whole sequence over a [`state::Session`].

pub mod analysis;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod state;

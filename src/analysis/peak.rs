use crate::data::model::Spectrum;

/// Intensity of the point whose wavelength is closest to `target`.
///
/// Ties go to the first point encountered. Points with a NaN wavelength are
/// never chosen. Returns `None` when no point qualifies.
pub fn extract_peak(spectrum: &Spectrum, target: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for (wl, intensity) in spectrum.points() {
        let diff = (wl - target).abs();
        if !diff.is_nan() && best.map_or(true, |(min_diff, _)| diff < min_diff) {
            best = Some((diff, intensity));
        }
    }
    best.map(|(_, intensity)| intensity)
}

/// Peak for each spectrum in order; empty spectra contribute nothing.
pub fn extract_peaks(spectra: &[Spectrum], target: f64) -> Vec<f64> {
    spectra
        .iter()
        .filter_map(|sp| {
            let peak = extract_peak(sp, target);
            if peak.is_none() {
                log::warn!("No absorbance peak in {}: no usable points", sp.label());
            }
            peak
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absorption() -> Spectrum {
        Spectrum::from_points([(350.0, 0.05), (360.0, 0.08), (365.0, 0.10), (370.0, 0.09)])
    }

    #[test]
    fn exact_wavelength_returns_exact_intensity() {
        assert_eq!(extract_peak(&absorption(), 365.0), Some(0.10));
    }

    #[test]
    fn nearest_point_wins() {
        assert_eq!(extract_peak(&absorption(), 361.0), Some(0.08));
        assert_eq!(extract_peak(&absorption(), 1000.0), Some(0.09));
    }

    #[test]
    fn first_point_wins_ties() {
        // 355 is equidistant from 350 and 360.
        assert_eq!(extract_peak(&absorption(), 355.0), Some(0.05));
        let unsorted = Spectrum::from_points([(370.0, 1.0), (360.0, 2.0)]);
        assert_eq!(extract_peak(&unsorted, 365.0), Some(1.0));
    }

    #[test]
    fn nan_wavelength_never_wins() {
        let sp = Spectrum::from_points([(f64::NAN, 9.0), (360.0, 0.08), (f64::NAN, 7.0)]);
        assert_eq!(extract_peak(&sp, 365.0), Some(0.08));
        let only_nan = Spectrum::from_points([(f64::NAN, 9.0)]);
        assert_eq!(extract_peak(&only_nan, 365.0), None);
    }

    #[test]
    fn empty_spectrum_has_no_peak() {
        assert_eq!(extract_peak(&Spectrum::default(), 365.0), None);
        let peaks = extract_peaks(&[absorption(), Spectrum::default(), absorption()], 365.0);
        assert_eq!(peaks, vec![0.10, 0.10]);
    }
}

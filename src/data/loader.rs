use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::model::{FileRole, Spectrum, SpectrumGroup};

/// Errors raised while reading spectral files from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

// ---------------------------------------------------------------------------
// Tolerant numeric parsing
// ---------------------------------------------------------------------------

/// Parse a field that may carry units, stray whitespace or other decoration.
///
/// Everything except ASCII digits, `.`, `-`, `e` and `E` is dropped before
/// parsing, so `" 12.3nm"` becomes `12.3`. Returns `None` when the residue is
/// empty or not a valid number.
pub fn robust_float(field: &str) -> Option<f64> {
    let cleaned: String = field
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E'))
        .collect();
    cleaned.parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Line-level parsing
// ---------------------------------------------------------------------------

/// Split `line` on `delimiter`, trimming and dropping empty tokens.
fn split_fields(line: &str, delimiter: char) -> Vec<&str> {
    line.split(delimiter)
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .collect()
}

/// Extract one (wavelength, intensity) point from a data line.
///
/// Delimiters are probed in the role's priority order; the first one that is
/// present, yields enough fields and whose required fields both parse wins.
/// Returns the delimiter used along with the point.
pub fn parse_line(line: &str, role: FileRole) -> Option<(char, f64, f64)> {
    role.delimiters()
        .iter()
        .filter(|d| line.contains(**d))
        .find_map(|&delimiter| {
            let fields = split_fields(line, delimiter);
            if fields.len() < role.min_fields() {
                return None;
            }
            let wavelength = robust_float(fields[0])?;
            let intensity = robust_float(fields[role.intensity_field()])?;
            Some((delimiter, wavelength, intensity))
        })
}

// ---------------------------------------------------------------------------
// File-level parsing
// ---------------------------------------------------------------------------

/// Result of parsing one file's text.
#[derive(Debug, Clone)]
pub struct ParsedSpectrum {
    pub spectrum: Spectrum,
    /// Data lines that yielded no point (blank and comment lines excluded).
    pub skipped_lines: usize,
}

impl ParsedSpectrum {
    /// True when no line produced a usable point.
    pub fn is_empty(&self) -> bool {
        self.spectrum.is_empty()
    }
}

/// Parse the full text of a spectral file.
///
/// Blank lines and `#` comments are ignored. Lines that cannot be parsed are
/// counted and skipped; they never abort the file.
pub fn parse_spectrum(text: &str, role: FileRole) -> ParsedSpectrum {
    let mut points = Vec::new();
    let mut skipped_lines = 0;

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(line, role) {
            Some((_, wavelength, intensity)) => points.push((wavelength, intensity)),
            None => {
                log::debug!("{role} line {}: no numeric data in '{line}'", line_no + 1);
                skipped_lines += 1;
            }
        }
    }

    ParsedSpectrum {
        spectrum: Spectrum::from_points(points),
        skipped_lines,
    }
}

/// Read and parse a single spectral file.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, since
/// instrument exports are frequently written in a legacy code page.
pub fn read_spectrum_file(path: &Path, role: FileRole) -> Result<ParsedSpectrum, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let mut parsed = parse_spectrum(&text, role);
    parsed.spectrum = parsed.spectrum.with_source(path);

    if parsed.is_empty() {
        log::warn!(
            "File {} contains no numeric data in the expected {role} format",
            path.display()
        );
    } else {
        log::debug!(
            "Read {} points from {} ({} lines skipped)",
            parsed.spectrum.len(),
            path.display(),
            parsed.skipped_lines
        );
    }
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Folder loading
// ---------------------------------------------------------------------------

/// A non-fatal problem found while loading a group folder.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The file could not be read at all.
    Unreadable { path: PathBuf, message: String },
    /// The file was read but no line yielded a point.
    NoUsableData { path: PathBuf },
    /// A file whose base name has no partner of the other role.
    Unpaired { path: PathBuf, role: FileRole },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::Unreadable { path, message } => {
                write!(f, "error reading {}: {message}", path.display())
            }
            Diagnostic::NoUsableData { path } => write!(
                f,
                "{} contains no numeric data in the expected format",
                path.display()
            ),
            Diagnostic::Unpaired { path, role } => write!(
                f,
                "{role} file {} has no companion with the same base name",
                path.display()
            ),
        }
    }
}

/// A group loaded from disk together with the problems met on the way.
#[derive(Debug, Clone, Default)]
pub struct LoadedGroup {
    pub group: SpectrumGroup,
    pub diagnostics: Vec<Diagnostic>,
}

/// Recursively collect files below `dir`. Symbolic links to directories
/// are not followed.
fn walk_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if entry.file_type().map_err(io_err)?.is_dir() {
            walk_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

fn role_of(path: &Path) -> Option<FileRole> {
    let ext = path.extension()?.to_str()?;
    [FileRole::Emission, FileRole::Absorption]
        .into_iter()
        .find(|role| ext == role.extension())
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Load every emission (`.tit`) and absorption (`.txt`) file below `dir`.
///
/// Files are processed in sorted path order so the resulting spectrum lists
/// are stable between runs. Unreadable or empty files are reported as
/// diagnostics and left out of the group.
pub fn load_group_folder(dir: &Path) -> Result<LoadedGroup, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    walk_files(dir, &mut files)?;
    files.sort();

    let mut loaded = LoadedGroup::default();
    let mut stems = [BTreeSet::new(), BTreeSet::new()];
    let mut tagged = Vec::new();

    for path in files {
        let Some(role) = role_of(&path) else {
            continue;
        };
        let slot = role as usize;
        stems[slot].insert(stem_of(&path));
        tagged.push((path.clone(), role));

        match read_spectrum_file(&path, role) {
            Ok(parsed) if parsed.is_empty() => {
                loaded.diagnostics.push(Diagnostic::NoUsableData { path });
            }
            Ok(parsed) => match role {
                FileRole::Emission => loaded.group.emission.push(parsed.spectrum),
                FileRole::Absorption => loaded.group.absorption.push(parsed.spectrum),
            },
            Err(e) => {
                log::warn!("{e}");
                loaded.diagnostics.push(Diagnostic::Unreadable {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }

    // Pairing is advisory: report orphans, keep everything that parsed.
    for (path, role) in tagged {
        let other = 1 - role as usize;
        if !stems[other].contains(&stem_of(&path)) {
            log::warn!("Unpaired {role} file {}", path.display());
            loaded.diagnostics.push(Diagnostic::Unpaired { path, role });
        }
    }

    log::info!(
        "Loaded {} emission and {} absorption spectra from {}",
        loaded.group.emission.len(),
        loaded.group.absorption.len(),
        dir.display()
    );
    Ok(loaded)
}

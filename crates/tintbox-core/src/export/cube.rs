//! 3D LUT baking, application, and Resolve `.cube` file I/O.
//!
//! ```text
//! # comment
//! TITLE "Look"
//! LUT_3D_SIZE 33
//! DOMAIN_MIN 0.0 0.0 0.0
//! DOMAIN_MAX 1.0 1.0 1.0
//! 0.000000 0.000000 0.000000
//! ...
//! ```
//!
//! Data lines run red-fastest, then green, then blue. [`Lut3D`] stores its
//! entries in the same order.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::composite::GradeKernel;
use crate::settings::{ColorSettings, EffectSettings};

/// Smallest grid that can be interpolated.
pub const MIN_LUT_SIZE: usize = 2;
/// Largest grid accepted on read or bake.
pub const MAX_LUT_SIZE: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum LutError {
    #[error("LUT size {0} outside {MIN_LUT_SIZE}..={MAX_LUT_SIZE}")]
    InvalidSize(usize),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("expected {expected} entries, found {found}")]
    EntryCount { expected: usize, found: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A 3D lookup table sampled with trilinear interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3D {
    /// Grid points per axis.
    pub size: usize,
    /// `size³` entries, red-fastest.
    pub data: Vec<[f32; 3]>,
    pub domain_min: [f32; 3],
    pub domain_max: [f32; 3],
}

impl Lut3D {
    /// The identity table.
    pub fn identity(size: usize) -> Result<Self, LutError> {
        Self::from_fn(size, |rgb| rgb)
    }

    /// Sample the position-independent grade at every grid point.
    ///
    /// Vignette, grain and chromatic aberration depend on pixel position and
    /// cannot be expressed in a LUT, so they are not baked.
    pub fn bake(settings: &ColorSettings, size: usize) -> Result<Self, LutError> {
        let kernel = GradeKernel::new(settings, &EffectSettings::NONE, 0);
        Self::from_fn(size, |rgb| kernel.grade_color(rgb))
    }

    fn from_fn(size: usize, f: impl Fn([f32; 3]) -> [f32; 3]) -> Result<Self, LutError> {
        check_size(size)?;
        let scale = 1.0 / (size - 1) as f32;
        let mut data = Vec::with_capacity(size * size * size);
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    data.push(f([r as f32 * scale, g as f32 * scale, b as f32 * scale]));
                }
            }
        }
        Ok(Self {
            size,
            data,
            domain_min: [0.0; 3],
            domain_max: [1.0; 3],
        })
    }

    #[inline]
    fn at(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        self.data[r + self.size * (g + self.size * b)]
    }

    /// Look up one color with trilinear interpolation. Inputs outside the
    /// domain are clamped to it.
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let max = (self.size - 1) as f32;
        let mut idx = [0usize; 3];
        let mut frac = [0.0f32; 3];
        for c in 0..3 {
            let span = self.domain_max[c] - self.domain_min[c];
            let t = if span > 0.0 {
                (rgb[c] - self.domain_min[c]) / span
            } else {
                0.0
            };
            let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) } * max;
            let i = (t.floor() as usize).min(self.size - 2);
            idx[c] = i;
            frac[c] = t - i as f32;
        }
        let [r, g, b] = idx;
        let [fr, fg, fb] = frac;

        let lerp = |a: [f32; 3], b: [f32; 3], t: f32| {
            [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t, a[2] + (b[2] - a[2]) * t]
        };
        let c00 = lerp(self.at(r, g, b), self.at(r + 1, g, b), fr);
        let c10 = lerp(self.at(r, g + 1, b), self.at(r + 1, g + 1, b), fr);
        let c01 = lerp(self.at(r, g, b + 1), self.at(r + 1, g, b + 1), fr);
        let c11 = lerp(self.at(r, g + 1, b + 1), self.at(r + 1, g + 1, b + 1), fr);
        let c0 = lerp(c00, c10, fg);
        let c1 = lerp(c01, c11, fg);
        lerp(c0, c1, fb)
    }

    /// Read a `.cube` file from disk.
    pub fn load_cube(path: &Path) -> Result<Self, LutError> {
        let file = File::open(path)?;
        Self::parse_cube(BufReader::new(file))
    }

    /// Parse `.cube` text. Only 3D tables are accepted.
    pub fn parse_cube<R: BufRead>(reader: R) -> Result<Self, LutError> {
        let mut size: Option<usize> = None;
        let mut domain_min = [0.0; 3];
        let mut domain_max = [1.0; 3];
        let mut data = Vec::new();

        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            let line_no = n + 1;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(head) = parts.next() else {
                continue;
            };
            match head {
                "TITLE" => {}
                "LUT_3D_SIZE" => {
                    let value = parts.next().unwrap_or_default();
                    let parsed: usize = value.parse().map_err(|_| LutError::Parse {
                        line: line_no,
                        message: format!("invalid size '{value}'"),
                    })?;
                    check_size(parsed)?;
                    data.reserve(parsed * parsed * parsed);
                    size = Some(parsed);
                }
                "LUT_1D_SIZE" => {
                    return Err(LutError::Parse {
                        line: line_no,
                        message: "expected a 3D LUT, found 1D".into(),
                    });
                }
                "DOMAIN_MIN" => domain_min = parse_triple(parts, line_no)?,
                "DOMAIN_MAX" => domain_max = parse_triple(parts, line_no)?,
                _ => data.push(parse_triple(line.split_whitespace(), line_no)?),
            }
        }

        let size = size.ok_or_else(|| LutError::Parse {
            line: 0,
            message: "missing LUT_3D_SIZE".into(),
        })?;
        let expected = size * size * size;
        if data.len() != expected {
            return Err(LutError::EntryCount {
                expected,
                found: data.len(),
            });
        }
        Ok(Self {
            size,
            data,
            domain_min,
            domain_max,
        })
    }

    /// Write a `.cube` file to disk.
    pub fn save_cube(&self, path: &Path, title: &str) -> Result<(), LutError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_cube(&mut writer, title)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_cube<W: Write>(&self, writer: &mut W, title: &str) -> Result<(), LutError> {
        writeln!(writer, "# Generated by tintbox")?;
        writeln!(writer, "TITLE \"{}\"", title.replace('"', "'"))?;
        writeln!(writer, "LUT_3D_SIZE {}", self.size)?;
        if self.domain_min != [0.0; 3] || self.domain_max != [1.0; 3] {
            let [a, b, c] = self.domain_min;
            writeln!(writer, "DOMAIN_MIN {a} {b} {c}")?;
            let [a, b, c] = self.domain_max;
            writeln!(writer, "DOMAIN_MAX {a} {b} {c}")?;
        }
        writeln!(writer)?;
        for rgb in &self.data {
            writeln!(writer, "{:.6} {:.6} {:.6}", rgb[0], rgb[1], rgb[2])?;
        }
        Ok(())
    }
}

fn check_size(size: usize) -> Result<(), LutError> {
    if (MIN_LUT_SIZE..=MAX_LUT_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(LutError::InvalidSize(size))
    }
}

fn parse_triple<'a>(
    mut parts: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<[f32; 3], LutError> {
    let mut out = [0.0; 3];
    for v in &mut out {
        let token = parts.next().ok_or_else(|| LutError::Parse {
            line,
            message: "expected three values".into(),
        })?;
        *v = token.parse().map_err(|_| LutError::Parse {
            line,
            message: format!("invalid number '{token}'"),
        })?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::grade_pixel;
    use crate::settings::Rgb;
    use std::io::Cursor;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_identity_apply_is_passthrough() {
        let lut = Lut3D::identity(17).unwrap();
        for rgb in [[0.0, 0.0, 0.0], [0.25, 0.5, 0.75], [1.0, 0.3, 0.9]] {
            let out = lut.apply(rgb);
            for c in 0..3 {
                assert!((out[c] - rgb[c]).abs() < EPSILON, "{rgb:?} -> {out:?}");
            }
        }
    }

    #[test]
    fn test_bake_matches_grade_at_grid_points() {
        let settings = ColorSettings::NEUTRAL
            .with_contrast(1.3)
            .with_white_balance(0.2, 0.1)
            .with_gain(Rgb::new(1.1, 1.0, 0.8));
        let lut = Lut3D::bake(&settings, 5).unwrap();
        let rgb = [0.25, 0.75, 0.5];
        let expected = grade_pixel(rgb, &settings);
        let out = lut.apply(rgb);
        for c in 0..3 {
            assert!((out[c] - expected[c]).abs() < EPSILON);
        }
    }

    #[test]
    fn test_rejects_degenerate_size() {
        assert!(matches!(Lut3D::identity(1), Err(LutError::InvalidSize(1))));
        assert!(matches!(
            Lut3D::bake(&ColorSettings::NEUTRAL, 1000),
            Err(LutError::InvalidSize(1000))
        ));
    }

    #[test]
    fn test_parse_red_fastest_order() {
        let text = "\
# test
TITLE \"Swap\"
LUT_3D_SIZE 2

0 0 0
1 0 0
0 1 0
1 1 0
0 0 1
1 0 1
0 1 1
1 1 1
";
        let lut = Lut3D::parse_cube(Cursor::new(text)).unwrap();
        assert_eq!(lut.size, 2);
        assert_eq!(lut.apply([1.0, 0.0, 0.0]), [1.0, 0.0, 0.0]);
        assert_eq!(lut.apply([0.0, 0.0, 1.0]), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_parse_reports_bad_lines() {
        let err = Lut3D::parse_cube(Cursor::new("LUT_3D_SIZE 2\n0 0 x\n")).unwrap_err();
        assert!(matches!(err, LutError::Parse { line: 2, .. }), "{err}");

        let err = Lut3D::parse_cube(Cursor::new("LUT_3D_SIZE 2\n0 0 0\n")).unwrap_err();
        assert!(matches!(err, LutError::EntryCount { expected: 8, found: 1 }));

        let err = Lut3D::parse_cube(Cursor::new("LUT_1D_SIZE 4\n")).unwrap_err();
        assert!(matches!(err, LutError::Parse { .. }));
    }

    #[test]
    fn test_cube_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("look.cube");
        let lut = Lut3D::bake(&ColorSettings::NEUTRAL.with_saturation(0.4), 9).unwrap();
        lut.save_cube(&path, "Desaturated").unwrap();

        let loaded = Lut3D::load_cube(&path).unwrap();
        assert_eq!(loaded.size, 9);
        for (a, b) in loaded.data.iter().zip(&lut.data) {
            for c in 0..3 {
                assert!((a[c] - b[c]).abs() < 1e-6);
            }
        }
    }
}

//! ATI `.cal` calibration files.
//!
//! Only two things are read from the file body, by substring search (first
//! occurrence wins):
//!
//! ```text
//! CalFileVersion="1.1"
//! <UserAxis Name="Fx" values="v1 v2 v3 v4 v5 v6">   (and Fy, Fz, Tx, Ty, Tz)
//! ```
//!
//! Everything else in the file is ignored.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use mecha_common::consts::{ATI_CAL_FILE_VERSION, ATI_CHANNELS};
use mecha_common::types::Axis;
use thiserror::Error;

/// Row names in matrix order.
pub const USER_AXES: [&str; 6] = ["Fx", "Fy", "Fz", "Tx", "Ty", "Tz"];

/// Calibration load failures.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// File does not exist
    #[error("Calibration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// File exists but could not be read
    #[error("Unable to read calibration file {}: {source}", .path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// `CalFileVersion` missing or not supported
    #[error("Unsupported CalFileVersion {0:?}")]
    UnsupportedVersion(String),

    /// A `UserAxis` element is absent
    #[error("Missing UserAxis {0}")]
    MissingAxis(&'static str),

    /// A `values` attribute does not hold exactly six numbers
    #[error("Malformed values for UserAxis {axis}: {reason}")]
    MalformedValues {
        /// Axis name
        axis: &'static str,
        /// What was wrong
        reason: String,
    },
}

/// 6×6 strain-gauge-to-load matrix, rows Fx, Fy, Fz, Tx, Ty, Tz.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AtiCalibration {
    matrix: [[f64; ATI_CHANNELS]; 6],
}

impl AtiCalibration {
    /// Calibration from explicit rows.
    pub const fn from_rows(matrix: [[f64; ATI_CHANNELS]; 6]) -> Self {
        Self { matrix }
    }

    /// Gauge `i` maps one-to-one onto load `i`.
    pub fn identity() -> Self {
        let mut matrix = [[0.0; ATI_CHANNELS]; 6];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { matrix }
    }

    /// All six rows.
    pub fn rows(&self) -> &[[f64; ATI_CHANNELS]; 6] {
        &self.matrix
    }

    /// Row producing the force along `axis`.
    #[inline]
    pub fn force_row(&self, axis: Axis) -> &[f64; ATI_CHANNELS] {
        &self.matrix[axis.index()]
    }

    /// Row producing the torque about `axis`.
    #[inline]
    pub fn torque_row(&self, axis: Axis) -> &[f64; ATI_CHANNELS] {
        &self.matrix[3 + axis.index()]
    }

    /// Read and parse an ATI calibration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CalibrationError> {
        let path = path.as_ref();
        let body = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => CalibrationError::FileNotFound(path.to_path_buf()),
            _ => CalibrationError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        body.parse()
    }
}

impl FromStr for AtiCalibration {
    type Err = CalibrationError;

    fn from_str(body: &str) -> Result<Self, Self::Err> {
        let version = attribute(body, "CalFileVersion=").unwrap_or_default();
        if version != ATI_CAL_FILE_VERSION {
            return Err(CalibrationError::UnsupportedVersion(version.to_string()));
        }

        let mut matrix = [[0.0; ATI_CHANNELS]; 6];
        for (row, axis) in matrix.iter_mut().zip(USER_AXES) {
            let key = format!("<UserAxis Name=\"{axis}\" values=");
            let values = attribute(body, &key).ok_or(CalibrationError::MissingAxis(axis))?;
            *row = parse_row(axis, values)?;
        }
        Ok(Self { matrix })
    }
}

/// Quoted value that directly follows the first occurrence of `key`.
fn attribute<'a>(body: &'a str, key: &str) -> Option<&'a str> {
    let start = body.find(key)? + key.len();
    let rest = body[start..].strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn parse_row(axis: &'static str, values: &str) -> Result<[f64; ATI_CHANNELS], CalibrationError> {
    let malformed = |reason: String| CalibrationError::MalformedValues { axis, reason };

    let mut parsed: heapless::Vec<f64, ATI_CHANNELS> = heapless::Vec::new();
    for token in values.split_whitespace() {
        let value: f64 = token
            .parse()
            .map_err(|_| malformed(format!("{token:?} is not a number")))?;
        parsed
            .push(value)
            .map_err(|_| malformed(format!("more than {ATI_CHANNELS} values")))?;
    }
    if parsed.len() != ATI_CHANNELS {
        return Err(malformed(format!(
            "expected {ATI_CHANNELS} values, found {}",
            parsed.len()
        )));
    }

    let mut row = [0.0; ATI_CHANNELS];
    row.copy_from_slice(&parsed);
    Ok(row)
}

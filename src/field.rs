//! Space-time displacement maps captured by the ultrasound scanner.
//!
//! A map is a dense 3-D array over (time frame, lateral position, axial
//! position) together with the acquisition constants: seconds per frame and
//! millimetres per sample index along each spatial axis. The constants come
//! from the acquisition setup, never from the data itself.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::PhantomError;

/// Spatial axis along which the shear wave front is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationAxis {
    /// Axis A of the map, sampled every `axis_a_spacing_mm`.
    Lateral,
    /// Axis B of the map, sampled every `axis_b_spacing_mm`.
    Axial,
}

/// Immutable displacement map with known sampling intervals.
///
/// Data is stored frame-major: index `(t, i, j)` maps to
/// `t * axis_a * axis_b + i * axis_b + j`, so a single frame is a contiguous
/// `axis_a * axis_b` slice.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementField {
    data: Vec<f64>,
    shape: [usize; 3],
    frame_interval_s: f64,
    axis_a_spacing_mm: f64,
    axis_b_spacing_mm: f64,
}

impl DisplacementField {
    pub fn new(
        data: Vec<f64>,
        shape: [usize; 3],
        frame_interval_s: f64,
        axis_a_spacing_mm: f64,
        axis_b_spacing_mm: f64,
    ) -> Result<Self, PhantomError> {
        if data.is_empty() {
            return Err(PhantomError::MissingData {
                context: "displacement map contains no samples".to_string(),
            });
        }

        if shape.iter().any(|&extent| extent == 0) {
            return Err(PhantomError::InvalidConfig(format!(
                "displacement map extents must all be positive, got {shape:?}"
            )));
        }

        let expected = shape[0]
            .checked_mul(shape[1])
            .and_then(|extent| extent.checked_mul(shape[2]))
            .ok_or_else(|| {
                PhantomError::InvalidConfig(format!(
                    "displacement map shape {shape:?} overflows the sample count"
                ))
            })?;
        if data.len() != expected {
            return Err(PhantomError::LengthMismatch {
                context: "displacement map samples",
                expected,
                got: data.len(),
            });
        }

        if frame_interval_s <= 0.0 || axis_a_spacing_mm <= 0.0 || axis_b_spacing_mm <= 0.0 {
            return Err(PhantomError::InvalidConfig(
                "frame interval and axis spacings must be positive".to_string(),
            ));
        }

        Ok(Self {
            data,
            shape,
            frame_interval_s,
            axis_a_spacing_mm,
            axis_b_spacing_mm,
        })
    }

    /// Load a map from the raw capture format: a 24-byte header of three
    /// little-endian `u64` extents (frames, axis A, axis B) followed by the
    /// samples as little-endian `f64`, frame-major.
    pub fn from_raw_file(
        path: &Path,
        frame_interval_s: f64,
        axis_a_spacing_mm: f64,
        axis_b_spacing_mm: f64,
    ) -> Result<Self, PhantomError> {
        let bytes = fs::read(path)?;
        if bytes.len() < 24 {
            return Err(PhantomError::MissingData {
                context: format!("{} is too short to hold a shape header", path.display()),
            });
        }

        let (header, body) = bytes.split_at(24);
        let mut extents = [0_usize; 3];
        for (axis, chunk) in header.chunks_exact(8).enumerate() {
            let mut raw = [0_u8; 8];
            raw.copy_from_slice(chunk);
            extents[axis] = u64::from_le_bytes(raw) as usize;
        }

        if body.len() % 8 != 0 {
            return Err(PhantomError::MissingData {
                context: format!("{} holds a truncated sample payload", path.display()),
            });
        }

        let data: Vec<f64> = body
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0_u8; 8];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            })
            .collect();

        Self::new(
            data,
            extents,
            frame_interval_s,
            axis_a_spacing_mm,
            axis_b_spacing_mm,
        )
    }

    /// Reject maps whose shape differs from the acquisition's declared shape.
    pub fn ensure_shape(&self, expected: [usize; 3]) -> Result<(), PhantomError> {
        if self.shape == expected {
            Ok(())
        } else {
            Err(PhantomError::ShapeMismatch {
                expected,
                got: self.shape,
            })
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn frames(&self) -> usize {
        self.shape[0]
    }

    pub fn frame_interval_s(&self) -> f64 {
        self.frame_interval_s
    }

    pub fn frame_rate_hz(&self) -> f64 {
        1.0 / self.frame_interval_s
    }

    pub fn axis_len(&self, axis: PropagationAxis) -> usize {
        match axis {
            PropagationAxis::Lateral => self.shape[1],
            PropagationAxis::Axial => self.shape[2],
        }
    }

    pub fn spacing_mm(&self, axis: PropagationAxis) -> f64 {
        match axis {
            PropagationAxis::Lateral => self.axis_a_spacing_mm,
            PropagationAxis::Axial => self.axis_b_spacing_mm,
        }
    }

    /// Physical extent of axis A in millimetres.
    pub fn lateral_extent_mm(&self) -> f64 {
        self.shape[1] as f64 * self.axis_a_spacing_mm
    }

    /// Physical extent of axis B in millimetres.
    pub fn axial_extent_mm(&self) -> f64 {
        self.shape[2] as f64 * self.axis_b_spacing_mm
    }

    #[inline]
    pub fn at(&self, frame: usize, i: usize, j: usize) -> f64 {
        self.data[(frame * self.shape[1] + i) * self.shape[2] + j]
    }

    /// One frame as a contiguous (axis A x axis B) slice, row-major in axis A.
    pub fn frame(&self, frame: usize) -> Result<&[f64], PhantomError> {
        if frame >= self.shape[0] {
            return Err(PhantomError::FrameOutOfRange {
                frame,
                frames: self.shape[0],
            });
        }

        let len = self.shape[1] * self.shape[2];
        let start = frame * len;
        Ok(&self.data[start..start + len])
    }
}

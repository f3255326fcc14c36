use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::compression::ColumnPair;
use crate::field::PropagationAxis;
use crate::matcher::ReferenceEntry;
use crate::PhantomError;

/// Runtime configuration for one analysis batch.
///
/// The acquisition constants are properties of the scanner setup, not of the
/// data, and must be supplied per batch. Defaults reproduce the phantom
/// acquisition this tool was written for: 10 kHz frame rate, 0.2977 mm
/// lateral and 0.1885 mm axial sampling, 900 kg/m^3 gel density and a
/// (162, 128, 148) capture shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Seconds between consecutive frames
    pub frame_interval_s: f64,
    /// Millimetres per sample along axis A (lateral)
    pub lateral_spacing_mm: f64,
    /// Millimetres per sample along axis B (axial)
    pub axial_spacing_mm: f64,
    /// Phantom material density [kg/m^3]
    pub density_kg_m3: f64,
    /// Declared capture shape (frames, axis A, axis B); loaded maps that
    /// differ are rejected, never silently analysed
    pub expected_shape: [usize; 3],
    /// Spatial axis the wave front is tracked along
    pub propagation_axis: PropagationAxis,
    /// Absolute modulus tolerance for reference matching [Pa]
    pub modulus_tolerance_pa: f64,
    /// Absolute speed tolerance for reference matching [mm/s]
    pub speed_tolerance_mm_s: f64,
    /// Frame rendered as a heatmap for each loaded map
    pub preview_frame: usize,
    /// Displacement maps to analyse
    pub phantoms: Vec<PhantomInput>,
    /// Known-good phantoms, scanned in order during matching
    pub references: Vec<ReferenceEntry>,
    /// Optional compression stress-strain table
    pub compression: Option<CompressionInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhantomInput {
    pub label: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionInput {
    pub path: PathBuf,
    pub channels: Vec<ColumnPair>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_interval_s: 1.0e-4,
            lateral_spacing_mm: 0.2977,
            axial_spacing_mm: 0.1885,
            density_kg_m3: 900.0,
            expected_shape: [162, 128, 148],
            propagation_axis: PropagationAxis::Lateral,
            modulus_tolerance_pa: 5_000.0,
            speed_tolerance_mm_s: 200.0,
            preview_frame: 0,
            phantoms: Vec::new(),
            references: vec![
                ReferenceEntry {
                    label: "P_A".to_string(),
                    modulus_pa: 100_000.0,
                    speed_mm_s: 6_000.0,
                },
                ReferenceEntry {
                    label: "P_B".to_string(),
                    modulus_pa: 220_000.0,
                    speed_mm_s: 9_000.0,
                },
                ReferenceEntry {
                    label: "P_C".to_string(),
                    modulus_pa: 37_000.0,
                    speed_mm_s: 3_700.0,
                },
            ],
            compression: None,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), PhantomError> {
        let positive = |value: f64, name: &str| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(PhantomError::InvalidConfig(format!(
                    "{name} must be finite and positive, got {value}"
                )))
            }
        };

        positive(self.frame_interval_s, "frame_interval_s")?;
        positive(self.lateral_spacing_mm, "lateral_spacing_mm")?;
        positive(self.axial_spacing_mm, "axial_spacing_mm")?;
        positive(self.density_kg_m3, "density_kg_m3")?;
        positive(self.modulus_tolerance_pa, "modulus_tolerance_pa")?;
        positive(self.speed_tolerance_mm_s, "speed_tolerance_mm_s")?;

        if self.expected_shape.iter().any(|&extent| extent == 0) {
            return Err(PhantomError::InvalidConfig(format!(
                "expected_shape extents must all be positive, got {:?}",
                self.expected_shape
            )));
        }

        if self.preview_frame >= self.expected_shape[0] {
            return Err(PhantomError::InvalidConfig(format!(
                "preview_frame {} is outside the {}-frame capture",
                self.preview_frame, self.expected_shape[0]
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn nonpositive_constants_are_rejected() {
        let mut config = AnalysisConfig::default();
        config.density_kg_m3 = 0.0;
        assert!(matches!(
            config.validate(),
            Err(PhantomError::InvalidConfig(_))
        ));

        let mut config = AnalysisConfig::default();
        config.frame_interval_s = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn preview_frame_must_fit_the_capture() {
        let mut config = AnalysisConfig::default();
        config.preview_frame = 162;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = AnalysisConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back.expected_shape, [162, 128, 148]);
        assert_eq!(back.references.len(), 3);
        assert_eq!(back.propagation_axis, PropagationAxis::Lateral);
    }
}

//! Stiffness estimation for elastic tissue-mimicking phantoms.
//!
//! Two independent modalities are supported: shear-wave elastography, where
//! Young's modulus follows from the propagation speed of the wave peak across
//! a displacement map, and direct compression, where it is the slope of the
//! stress-strain curve. Shear-wave results are cross-checked against a
//! reference table of known phantoms.

pub mod compression;
pub mod config;
pub mod field;
pub mod matcher;
pub mod output;
pub mod speed;
pub mod tracker;

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub use config::{AnalysisConfig, CompressionInput, PhantomInput};
pub use field::{DisplacementField, PropagationAxis};
pub use matcher::{Correspondence, MatchOutcome, ReferenceEntry};
pub use output::{create_timestamped_run_dir, Summary};
pub use tracker::PeakTimeProfile;

#[derive(Debug, Error)]
pub enum PhantomError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("missing data: {context}")]
    MissingData { context: String },
    #[error("{context} length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: [usize; 3],
        got: [usize; 3],
    },
    #[error("degenerate input: {context}")]
    DegenerateInput { context: String },
    #[error("frame {frame} is out of range for a {frames}-frame map")]
    FrameOutOfRange { frame: usize, frames: usize },
    #[error("failed to render {path}: {message}")]
    Plot { path: PathBuf, message: String },
}

/// Shear-wave estimate for one phantom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhantomResult {
    pub label: String,
    pub wave_speed_mm_s: f64,
    pub youngs_modulus_pa: f64,
}

/// Track the wave peak, estimate its speed and convert to Young's modulus
/// for a single loaded map. Pure: identical inputs give identical results.
pub fn analyze_phantom(
    label: &str,
    field: &DisplacementField,
    config: &AnalysisConfig,
) -> Result<PhantomResult, PhantomError> {
    let profile = tracker::peak_time_profile(field, config.propagation_axis);
    let wave_speed_mm_s = speed::wave_speed(&profile, field.spacing_mm(config.propagation_axis))?;
    let youngs_modulus_pa = speed::youngs_modulus(wave_speed_mm_s, config.density_kg_m3);

    Ok(PhantomResult {
        label: label.to_string(),
        wave_speed_mm_s,
        youngs_modulus_pa,
    })
}

struct PhantomAnalysis {
    geometry: output::FieldGeometry,
    result: PhantomResult,
    preview_plot: PathBuf,
}

/// Run the whole batch: load and analyse every configured map, match results
/// against the reference table, optionally estimate compression stiffness,
/// and write the report files under a fresh run directory.
///
/// One phantom's failure (missing file, wrong shape, degenerate profile) is
/// recorded and never aborts the others.
pub fn run_analysis(config: &AnalysisConfig, output_base: &Path) -> Result<Summary, PhantomError> {
    config.validate()?;
    let run_dir = create_timestamped_run_dir(output_base)?;

    let mut geometries = Vec::new();
    let mut results = Vec::new();
    let mut failures = Vec::new();
    let mut plots = Vec::new();

    for input in &config.phantoms {
        match process_phantom(input, config, &run_dir) {
            Ok(analysis) => {
                geometries.push(analysis.geometry);
                results.push(analysis.result);
                plots.push(analysis.preview_plot);
            }
            Err(error) => failures.push(output::PhantomFailure {
                label: input.label.clone(),
                error: error.to_string(),
            }),
        }
    }

    let outcomes = matcher::match_references(
        &results,
        &config.references,
        config.modulus_tolerance_pa,
        config.speed_tolerance_mm_s,
    );

    let mut compression_moduli = Vec::new();
    if let Some(input) = &config.compression {
        // A broken table only loses the compression channel, not the batch.
        match compression::load_stress_strain(&input.path, &input.channels) {
            Ok(series_list) => {
                for series in &series_list {
                    match compression::compression_modulus(series) {
                        Ok(youngs_modulus_pa) => {
                            let plot = run_dir.join(format!("strain_stress_{}.png", series.label));
                            output::plot_strain_stress(series, &plot)?;
                            plots.push(plot);
                            compression_moduli.push(output::CompressionModulus {
                                label: series.label.clone(),
                                youngs_modulus_pa,
                            });
                        }
                        Err(error) => failures.push(output::PhantomFailure {
                            label: series.label.clone(),
                            error: error.to_string(),
                        }),
                    }
                }
            }
            Err(error) => failures.push(output::PhantomFailure {
                label: "compression".to_string(),
                error: error.to_string(),
            }),
        }
    }

    let files = output::OutputFiles {
        output_dir: run_dir.clone(),
        results_csv: run_dir.join("results.csv"),
        correspondences_csv: run_dir.join("correspondences.csv"),
        summary_json: run_dir.join("summary.json"),
        plots,
    };

    output::write_results_csv(&files.results_csv, &results)?;
    output::write_correspondences_csv(&files.correspondences_csv, &outcomes)?;

    let summary = Summary {
        config: config.clone(),
        geometries,
        results,
        failures,
        outcomes,
        compression_moduli,
        outputs: files,
    };

    output::write_summary_json(&summary.outputs.summary_json, &summary)?;
    Ok(summary)
}

fn process_phantom(
    input: &PhantomInput,
    config: &AnalysisConfig,
    run_dir: &Path,
) -> Result<PhantomAnalysis, PhantomError> {
    let field = DisplacementField::from_raw_file(
        &input.path,
        config.frame_interval_s,
        config.lateral_spacing_mm,
        config.axial_spacing_mm,
    )?;
    field.ensure_shape(config.expected_shape)?;

    let preview_plot = run_dir.join(format!("frame_{}_{}.png", config.preview_frame, input.label));
    output::plot_frame(&field, config.preview_frame, &input.label, &preview_plot)?;

    let geometry = output::FieldGeometry {
        label: input.label.clone(),
        frames: field.frames(),
        lateral_positions: field.axis_len(PropagationAxis::Lateral),
        axial_positions: field.axis_len(PropagationAxis::Axial),
        lateral_extent_mm: field.lateral_extent_mm(),
        axial_extent_mm: field.axial_extent_mm(),
        frame_rate_hz: field.frame_rate_hz(),
    };

    let result = analyze_phantom(&input.label, &field, config)?;

    Ok(PhantomAnalysis {
        geometry,
        result,
        preview_plot,
    })
}

//! Report files for an analysis run: CSV tables, a JSON summary and
//! plotters renderings, all under a timestamped run directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use csv::Writer;
use plotters::prelude::*;
use serde::Serialize;

use crate::compression::StressStrainSeries;
use crate::config::AnalysisConfig;
use crate::field::DisplacementField;
use crate::matcher::MatchOutcome;
use crate::{PhantomError, PhantomResult};

/// Why one phantom's pipeline stopped; the rest of the batch continues.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhantomFailure {
    pub label: String,
    pub error: String,
}

/// Physical geometry of one loaded capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldGeometry {
    pub label: String,
    pub frames: usize,
    pub lateral_positions: usize,
    pub axial_positions: usize,
    pub lateral_extent_mm: f64,
    pub axial_extent_mm: f64,
    pub frame_rate_hz: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionModulus {
    pub label: String,
    pub youngs_modulus_pa: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputFiles {
    pub output_dir: PathBuf,
    pub results_csv: PathBuf,
    pub correspondences_csv: PathBuf,
    pub summary_json: PathBuf,
    pub plots: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub config: AnalysisConfig,
    pub geometries: Vec<FieldGeometry>,
    pub results: Vec<PhantomResult>,
    pub failures: Vec<PhantomFailure>,
    pub outcomes: Vec<MatchOutcome>,
    pub compression_moduli: Vec<CompressionModulus>,
    pub outputs: OutputFiles,
}

pub fn create_timestamped_run_dir(base_dir: &Path) -> Result<PathBuf, PhantomError> {
    fs::create_dir_all(base_dir)?;

    let timestamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();
    let mut run_dir = base_dir.join(&timestamp);
    let mut counter = 1_u32;

    while run_dir.exists() {
        run_dir = base_dir.join(format!("{timestamp}-{counter:02}"));
        counter += 1;
    }

    fs::create_dir_all(&run_dir)?;
    Ok(run_dir)
}

fn fmt_f64(value: f64) -> String {
    format!("{value:.6}")
}

pub fn write_results_csv(path: &Path, results: &[PhantomResult]) -> Result<(), PhantomError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(["label", "wave_speed_mm_s", "youngs_modulus_pa"])?;

    for result in results {
        writer.write_record([
            result.label.clone(),
            fmt_f64(result.wave_speed_mm_s),
            fmt_f64(result.youngs_modulus_pa),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Every outcome gets a row; unmatched results carry an empty reference
/// column so they stay visible in the table.
pub fn write_correspondences_csv(path: &Path, outcomes: &[MatchOutcome]) -> Result<(), PhantomError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record([
        "result_label",
        "outcome",
        "reference_label",
        "youngs_modulus_pa",
        "wave_speed_mm_s",
    ])?;

    for outcome in outcomes {
        match outcome {
            MatchOutcome::Matched(correspondence) => writer.write_record([
                correspondence.result_label.clone(),
                "matched".to_string(),
                correspondence.reference_label.clone(),
                fmt_f64(correspondence.modulus_pa),
                fmt_f64(correspondence.speed_mm_s),
            ])?,
            MatchOutcome::Unmatched { result_label } => writer.write_record([
                result_label.clone(),
                "unmatched".to_string(),
                String::new(),
                String::new(),
                String::new(),
            ])?,
        }
    }

    writer.flush()?;
    Ok(())
}

pub fn write_summary_json(path: &Path, summary: &Summary) -> Result<(), PhantomError> {
    let payload = serde_json::to_string_pretty(summary)?;
    fs::write(path, payload)?;
    Ok(())
}

pub fn plot_strain_stress(series: &StressStrainSeries, path: &Path) -> Result<(), PhantomError> {
    let root = BitMapBackend::new(path, (960, 640)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|error| plot_error(path, &error))?;

    let max_strain = series.strain.iter().copied().fold(0.0_f64, f64::max).max(1.0e-9);
    let max_stress = series.stress.iter().copied().fold(0.0_f64, f64::max).max(1.0e-9);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Stress vs Strain - {}", series.label),
            ("sans-serif", 30).into_font(),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0.0..max_strain, 0.0..max_stress)
        .map_err(|error| plot_error(path, &error))?;

    chart
        .configure_mesh()
        .x_desc("Strain [-]")
        .y_desc("Stress [Pa]")
        .draw()
        .map_err(|error| plot_error(path, &error))?;

    chart
        .draw_series(LineSeries::new(
            series
                .strain
                .iter()
                .zip(&series.stress)
                .map(|(&strain, &stress)| (strain, stress)),
            &BLUE,
        ))
        .map_err(|error| plot_error(path, &error))?;

    root.present().map_err(|error| plot_error(path, &error))?;
    Ok(())
}

/// Render one frame of a displacement map as a heatmap, axis A down the
/// vertical, axis B across the horizontal.
pub fn plot_frame(
    field: &DisplacementField,
    frame: usize,
    label: &str,
    path: &Path,
) -> Result<(), PhantomError> {
    let samples = field.frame(frame)?;
    let [_, rows, cols] = field.shape();

    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    let root = BitMapBackend::new(path, (960, 720)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|error| plot_error(path, &error))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Frame {frame} - {label}"),
            ("sans-serif", 30).into_font(),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0..cols as i32, 0..rows as i32)
        .map_err(|error| plot_error(path, &error))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Axis B index")
        .y_desc("Axis A index")
        .draw()
        .map_err(|error| plot_error(path, &error))?;

    let mut cells = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let value = samples[row * cols + col];
            let t = if span > 0.0 { (value - min) / span } else { 0.5 };
            cells.push(Rectangle::new(
                [
                    (col as i32, row as i32),
                    (col as i32 + 1, row as i32 + 1),
                ],
                heat_color(t).filled(),
            ));
        }
    }

    chart
        .draw_series(cells)
        .map_err(|error| plot_error(path, &error))?;

    root.present().map_err(|error| plot_error(path, &error))?;
    Ok(())
}

// Blue through green to red over [0, 1].
fn heat_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let red = (255.0 * t) as u8;
    let green = (255.0 * (1.0 - (2.0 * t - 1.0).abs())) as u8;
    let blue = (255.0 * (1.0 - t)) as u8;
    RGBColor(red, green, blue)
}

fn plot_error(path: &Path, error: &dyn std::fmt::Display) -> PhantomError {
    PhantomError::Plot {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use swe_phantom::{run_analysis, AnalysisConfig, MatchOutcome};

#[derive(Debug, Parser)]
#[command(version, about = "Phantom stiffness estimation from shear-wave and compression data")]
struct Cli {
    /// JSON analysis configuration; defaults are used when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output base directory for run reports
    #[arg(long, default_value = "output-swe-phantom")]
    output: PathBuf,

    /// Override the material density [kg/m^3]
    #[arg(long)]
    density: Option<f64>,

    /// Override the frame interval [s]
    #[arg(long)]
    frame_interval: Option<f64>,

    /// Override the frame rendered as a preview heatmap
    #[arg(long)]
    preview_frame: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str::<AnalysisConfig>(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(v) = cli.density {
        config.density_kg_m3 = v;
    }
    if let Some(v) = cli.frame_interval {
        config.frame_interval_s = v;
    }
    if let Some(v) = cli.preview_frame {
        config.preview_frame = v;
    }

    let summary = run_analysis(&config, &cli.output)?;

    for geometry in &summary.geometries {
        println!(
            "{}: {} frames at {:.0} fps, {:.2} mm lateral x {:.2} mm axial",
            geometry.label,
            geometry.frames,
            geometry.frame_rate_hz,
            geometry.lateral_extent_mm,
            geometry.axial_extent_mm
        );
    }

    for result in &summary.results {
        println!(
            "{}: wave speed {:.2} mm/s | Young's modulus {:.2} Pa",
            result.label, result.wave_speed_mm_s, result.youngs_modulus_pa
        );
    }

    for modulus in &summary.compression_moduli {
        println!(
            "{} (compression): Young's modulus {:.2} Pa",
            modulus.label, modulus.youngs_modulus_pa
        );
    }

    for outcome in &summary.outcomes {
        match outcome {
            MatchOutcome::Matched(correspondence) => println!(
                "{} corresponds to reference {}",
                correspondence.result_label, correspondence.reference_label
            ),
            MatchOutcome::Unmatched { result_label } => {
                println!("{result_label} matched no reference");
            }
        }
    }

    for failure in &summary.failures {
        eprintln!("{} failed: {}", failure.label, failure.error);
    }

    println!("Run directory: {}", summary.outputs.output_dir.display());
    println!("Results: {}", summary.outputs.results_csv.display());
    println!(
        "Correspondences: {}",
        summary.outputs.correspondences_csv.display()
    );
    println!("Summary: {}", summary.outputs.summary_json.display());

    Ok(())
}

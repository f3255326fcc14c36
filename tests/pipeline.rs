use std::fs;
use std::path::{Path, PathBuf};

use swe_phantom::{
    run_analysis, AnalysisConfig, CompressionInput, MatchOutcome, PhantomInput, ReferenceEntry,
};
use swe_phantom::compression::ColumnPair;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir).unwrap();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Raw capture format: three little-endian u64 extents, then the samples as
/// little-endian f64, frame-major.
fn write_raw_capture(path: &Path, shape: [usize; 3], value: impl Fn(usize, usize, usize) -> f64) {
    let mut bytes = Vec::new();
    for extent in shape {
        bytes.extend_from_slice(&(extent as u64).to_le_bytes());
    }
    for t in 0..shape[0] {
        for i in 0..shape[1] {
            for j in 0..shape[2] {
                bytes.extend_from_slice(&value(t, i, j).to_le_bytes());
            }
        }
    }
    fs::write(path, bytes).unwrap();
}

fn test_config(dir: &Path) -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.expected_shape = [12, 8, 4];
    config.preview_frame = 0;
    config.references = vec![
        ReferenceEntry {
            label: "REF_FAST".to_string(),
            modulus_pa: 3.0 * 900.0 * 2.977 * 2.977,
            speed_mm_s: 2_977.0,
        },
        ReferenceEntry {
            label: "REF_OTHER".to_string(),
            modulus_pa: 500_000.0,
            speed_mm_s: 20_000.0,
        },
    ];
    config.phantoms = vec![
        PhantomInput {
            label: "sweep".to_string(),
            path: dir.join("sweep.dsp"),
        },
        PhantomInput {
            label: "flat".to_string(),
            path: dir.join("flat.dsp"),
        },
        PhantomInput {
            label: "wrong-shape".to_string(),
            path: dir.join("wrong_shape.dsp"),
        },
        PhantomInput {
            label: "absent".to_string(),
            path: dir.join("does_not_exist.dsp"),
        },
    ];
    config
}

#[test]
fn batch_isolates_per_phantom_failures_and_writes_reports() {
    let dir = scratch_dir("pipeline-batch");

    // Peak sweeps one lateral position per frame: 0.2977 mm / 0.1 ms.
    write_raw_capture(&dir.join("sweep.dsp"), [12, 8, 4], |t, i, _| {
        if t == i {
            1.0
        } else {
            0.0
        }
    });
    // Constant displacement: every peak lands on frame zero.
    write_raw_capture(&dir.join("flat.dsp"), [12, 8, 4], |_, _, _| 1.0);
    // Valid capture, wrong declared shape.
    write_raw_capture(&dir.join("wrong_shape.dsp"), [6, 8, 4], |t, _, _| t as f64);

    let config = test_config(&dir);
    let summary = run_analysis(&config, &dir.join("out")).unwrap();

    assert_eq!(summary.results.len(), 1);
    let result = &summary.results[0];
    assert_eq!(result.label, "sweep");
    assert!((result.wave_speed_mm_s - 2_977.0).abs() < 1.0e-9);

    let failed: Vec<&str> = summary
        .failures
        .iter()
        .map(|failure| failure.label.as_str())
        .collect();
    assert_eq!(failed, vec!["flat", "wrong-shape", "absent"]);
    assert!(summary.failures[0].error.contains("degenerate"));
    assert!(summary.failures[1].error.contains("shape mismatch"));

    assert_eq!(summary.outcomes.len(), 1);
    match &summary.outcomes[0] {
        MatchOutcome::Matched(correspondence) => {
            assert_eq!(correspondence.reference_label, "REF_FAST");
            assert_eq!(correspondence.result_label, "sweep");
        }
        MatchOutcome::Unmatched { .. } => panic!("sweep should match REF_FAST"),
    }

    assert!(summary.outputs.results_csv.is_file());
    assert!(summary.outputs.correspondences_csv.is_file());
    assert!(summary.outputs.summary_json.is_file());
    assert!(summary.outputs.plots.iter().all(|plot| plot.is_file()));

    let correspondences = fs::read_to_string(&summary.outputs.correspondences_csv).unwrap();
    assert!(correspondences.contains("sweep,matched,REF_FAST"));
}

#[test]
fn unmatched_results_stay_visible_in_the_report() {
    let dir = scratch_dir("pipeline-unmatched");

    write_raw_capture(&dir.join("sweep.dsp"), [12, 8, 4], |t, i, _| {
        if t == i {
            1.0
        } else {
            0.0
        }
    });

    let mut config = test_config(&dir);
    config.phantoms.truncate(1);
    // No reference is anywhere near 2977 mm/s.
    config.references = vec![ReferenceEntry {
        label: "REF_OTHER".to_string(),
        modulus_pa: 500_000.0,
        speed_mm_s: 20_000.0,
    }];

    let summary = run_analysis(&config, &dir.join("out")).unwrap();

    assert_eq!(
        summary.outcomes,
        vec![MatchOutcome::Unmatched {
            result_label: "sweep".to_string()
        }]
    );
    let correspondences = fs::read_to_string(&summary.outputs.correspondences_csv).unwrap();
    assert!(correspondences.contains("sweep,unmatched,,,"));
}

#[test]
fn compression_channel_flows_into_the_summary() {
    let dir = scratch_dir("pipeline-compression");

    let csv_path = dir.join("stress_strain.csv");
    fs::write(
        &csv_path,
        "P_1,P_1.1\n0.00,0.0\n0.01,1050.0\n0.02,\n0.03,3150.0\n",
    )
    .unwrap();

    let mut config = test_config(&dir);
    config.phantoms.clear();
    config.compression = Some(CompressionInput {
        path: csv_path,
        channels: vec![ColumnPair {
            label: "P1".to_string(),
            strain_column: "P_1".to_string(),
            stress_column: "P_1.1".to_string(),
        }],
    });

    let summary = run_analysis(&config, &dir.join("out")).unwrap();

    assert!(summary.results.is_empty());
    assert_eq!(summary.compression_moduli.len(), 1);
    let modulus = &summary.compression_moduli[0];
    assert_eq!(modulus.label, "P1");
    assert!((modulus.youngs_modulus_pa - 105_000.0).abs() < 1.0e-6);
}

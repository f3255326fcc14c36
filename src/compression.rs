//! Compression stress-strain stiffness estimation.
//!
//! The companion measurement to the shear-wave pipeline: each phantom has a
//! pair of CSV columns (strain, stress) recorded during direct compression,
//! and Young's modulus is the least-squares slope of stress against strain.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::PhantomError;

/// Names of the strain and stress columns holding one phantom's curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnPair {
    pub label: String,
    pub strain_column: String,
    pub stress_column: String,
}

/// One phantom's compression curve after incomplete rows are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct StressStrainSeries {
    pub label: String,
    pub strain: Vec<f64>,
    pub stress: Vec<f64>,
}

pub fn load_stress_strain(
    path: &Path,
    pairs: &[ColumnPair],
) -> Result<Vec<StressStrainSeries>, PhantomError> {
    let reader = csv::Reader::from_path(path)?;
    read_stress_strain(reader, pairs)
}

/// Rows where either cell is absent or non-numeric are dropped, so the two
/// vectors of each series stay aligned and fully numeric.
pub fn read_stress_strain<R: Read>(
    mut reader: csv::Reader<R>,
    pairs: &[ColumnPair],
) -> Result<Vec<StressStrainSeries>, PhantomError> {
    let headers = reader.headers()?.clone();
    let column_index = |name: &str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| PhantomError::MissingData {
                context: format!("column '{name}' not present in the stress-strain table"),
            })
    };

    let mut indices = Vec::with_capacity(pairs.len());
    for pair in pairs {
        indices.push((
            column_index(&pair.strain_column)?,
            column_index(&pair.stress_column)?,
        ));
    }

    let mut series: Vec<StressStrainSeries> = pairs
        .iter()
        .map(|pair| StressStrainSeries {
            label: pair.label.clone(),
            strain: Vec::new(),
            stress: Vec::new(),
        })
        .collect();

    for record in reader.records() {
        let record = record?;
        for (slot, &(strain_idx, stress_idx)) in series.iter_mut().zip(&indices) {
            let strain = record.get(strain_idx).and_then(parse_cell);
            let stress = record.get(stress_idx).and_then(parse_cell);
            if let (Some(strain), Some(stress)) = (strain, stress) {
                slot.strain.push(strain);
                slot.stress.push(stress);
            }
        }
    }

    Ok(series)
}

fn parse_cell(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Young's modulus in Pa as the least-squares slope of stress over strain.
pub fn compression_modulus(series: &StressStrainSeries) -> Result<f64, PhantomError> {
    let n = series.strain.len();
    if n == 0 {
        return Err(PhantomError::MissingData {
            context: format!("no complete stress-strain rows for {}", series.label),
        });
    }
    if n < 2 {
        return Err(PhantomError::DegenerateInput {
            context: format!("{} has a single stress-strain row", series.label),
        });
    }

    let count = n as f64;
    let strain_mean = series.strain.iter().sum::<f64>() / count;
    let stress_mean = series.stress.iter().sum::<f64>() / count;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (&strain, &stress) in series.strain.iter().zip(&series.stress) {
        covariance += (strain - strain_mean) * (stress - stress_mean);
        variance += (strain - strain_mean) * (strain - strain_mean);
    }

    if variance == 0.0 {
        return Err(PhantomError::DegenerateInput {
            context: format!("{} has zero strain variance", series.label),
        });
    }

    Ok(covariance / variance)
}

//! Peak arrival-time tracking across the wave propagation axis.

use crate::field::{DisplacementField, PropagationAxis};

/// Arrival time of the wave peak at each position along the propagation
/// axis. Entry `i` belongs to spatial index `i`; times are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakTimeProfile {
    times_s: Vec<f64>,
}

impl PeakTimeProfile {
    pub fn new(times_s: Vec<f64>) -> Self {
        Self { times_s }
    }

    pub fn len(&self) -> usize {
        self.times_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times_s.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.times_s
    }
}

/// Track the peak arrival time at every position along `axis`.
///
/// For each position the displacement is averaged over the remaining spatial
/// axis per frame, giving one mean-displacement time series; the arrival time
/// is the frame index of its maximum times the frame interval. Ties are broken
/// toward the earliest frame, so the result is deterministic for flat traces.
pub fn peak_time_profile(field: &DisplacementField, axis: PropagationAxis) -> PeakTimeProfile {
    let positions = field.axis_len(axis);
    let mut times_s = Vec::with_capacity(positions);

    for position in 0..positions {
        let mut peak_frame = 0_usize;
        let mut peak_mean = f64::NEG_INFINITY;

        for frame in 0..field.frames() {
            let mean = mean_over_remaining_axis(field, axis, frame, position);
            if mean > peak_mean {
                peak_mean = mean;
                peak_frame = frame;
            }
        }

        times_s.push(peak_frame as f64 * field.frame_interval_s());
    }

    PeakTimeProfile::new(times_s)
}

fn mean_over_remaining_axis(
    field: &DisplacementField,
    axis: PropagationAxis,
    frame: usize,
    position: usize,
) -> f64 {
    let (remaining, sum) = match axis {
        PropagationAxis::Lateral => {
            let remaining = field.shape()[2];
            let sum: f64 = (0..remaining).map(|j| field.at(frame, position, j)).sum();
            (remaining, sum)
        }
        PropagationAxis::Axial => {
            let remaining = field.shape()[1];
            let sum: f64 = (0..remaining).map(|i| field.at(frame, i, position)).sum();
            (remaining, sum)
        }
    };

    sum / remaining as f64
}

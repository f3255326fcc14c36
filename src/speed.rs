//! Wave speed estimation and conversion to Young's modulus.

use crate::tracker::PeakTimeProfile;
use crate::PhantomError;

/// Estimate the shear-wave speed in mm/s by time of flight.
///
/// Only the first and last profile entries are used: the wave is assumed to
/// travel `(len - 1) * spacing_mm` millimetres in the peak-time difference
/// between the two extreme positions. This two-point estimate is a known
/// limitation; a least-squares slope over the whole profile would be more
/// robust but yields different numbers, so it is deliberately not used here.
///
/// Profiles with fewer than two entries, or with identical first and last
/// peak times, have no measurable travel time and are rejected as degenerate
/// rather than producing an infinite speed.
pub fn wave_speed(profile: &PeakTimeProfile, spacing_mm: f64) -> Result<f64, PhantomError> {
    let times_s = profile.as_slice();

    let (first, last) = match (times_s.first(), times_s.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(PhantomError::DegenerateInput {
                context: "peak-time profile is empty".to_string(),
            })
        }
    };

    let distance_mm = (times_s.len() - 1) as f64 * spacing_mm;
    let elapsed_s = last - first;

    if elapsed_s == 0.0 {
        return Err(PhantomError::DegenerateInput {
            context: "no measurable peak-time difference between the first and last positions"
                .to_string(),
        });
    }

    Ok(distance_mm / elapsed_s)
}

/// Young's modulus in Pa for a linear, isotropic, incompressible medium.
///
/// `speed_mm_s` MUST be in mm/s, as produced by [`wave_speed`]; it is
/// converted to m/s exactly once before applying E = 3 rho v^2. Passing a
/// speed already in m/s corrupts the modulus by a factor of 10^6.
pub fn youngs_modulus(speed_mm_s: f64, density_kg_m3: f64) -> f64 {
    let speed_m_s = speed_mm_s / 1_000.0;
    3.0 * density_kg_m3 * speed_m_s * speed_m_s
}

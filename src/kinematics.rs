//! Per-joint kinematic extractors over a skeleton clip.
//!
//! All extractors skip frames where the joint is absent. Consecutive-pair quantities
//! (speeds, velocities) pair each observation with the previous *observed* one, so a gap
//! in tracking stretches `dt` instead of breaking the series.

use crate::geometry::Vec3;
use crate::skeleton::{joint_at, SkeletonClip};

/// Lower bound on the time step between two observations.
pub const MIN_DT: f64 = 1e-6;

fn pairwise<'a>(
    clip: &'a SkeletonClip,
    key: &'a str,
) -> impl Iterator<Item = ((f64, Vec3), (f64, Vec3))> + 'a {
    let mut prev: Option<(f64, Vec3)> = None;
    clip.observations(key).filter_map(move |cur| {
        let pair = prev.map(|p| (p, cur));
        prev = Some(cur);
        pair
    })
}

/// Instantaneous speeds of `key`, one per consecutive pair of observations.
pub fn speed_series(clip: &SkeletonClip, key: &str) -> Vec<f64> {
    pairwise(clip, key)
        .map(|((t0, p0), (t1, p1))| (p1 - p0).magnitude() / (t1 - t0).max(MIN_DT))
        .collect()
}

/// Signed x-velocity of `key`, one per consecutive pair of observations.
pub fn x_velocity_series(clip: &SkeletonClip, key: &str) -> Vec<f64> {
    pairwise(clip, key)
        .map(|((t0, p0), (t1, p1))| (p1.x() - p0.x()) / (t1 - t0).max(MIN_DT))
        .collect()
}

/// Displacement from the first to the last observation of `key`.
pub fn start_end_delta(clip: &SkeletonClip, key: &str) -> Option<Vec3> {
    let mut seen = clip.observations(key).map(|(_, p)| p);
    let first = seen.next()?;
    let last = seen.last().unwrap_or(first);
    Some(last - first)
}

/// Every observed position of `key`, in clip order.
pub fn joint_series(clip: &SkeletonClip, key: &str) -> Vec<Vec3> {
    clip.observations(key).map(|(_, p)| p).collect()
}

/// Mean y of `key` across observations.
pub fn average_joint_y(clip: &SkeletonClip, key: &str) -> Option<f64> {
    let ys: Vec<f64> = clip.observations(key).map(|(_, p)| p.y()).collect();
    (!ys.is_empty()).then(|| mean(&ys))
}

/// Mean `|x_a - x_b|` over frames where both joints are present.
///
/// Screen-space horizontal separation only; depth and height are ignored.
pub fn average_separation(clip: &SkeletonClip, key_a: &str, key_b: &str) -> Option<f64> {
    let seps: Vec<f64> = clip
        .frames()
        .iter()
        .filter_map(|f| Some((joint_at(f, key_a)?.x() - joint_at(f, key_b)?.x()).abs()))
        .collect();
    (!seps.is_empty()).then(|| mean(&seps))
}

/// Mean Euclidean distance from `key` to a fixed point.
pub fn average_distance_to(clip: &SkeletonClip, key: &str, point: Vec3) -> Option<f64> {
    let dists: Vec<f64> = clip
        .observations(key)
        .map(|(_, p)| (p - point).magnitude())
        .collect();
    (!dists.is_empty()).then(|| mean(&dists))
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample standard deviation (n - 1). 0 for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.max(0.0).sqrt()
}

/// Number of sign changes. Exact zeros are skipped and do not reset the running sign.
pub fn zero_crossings(values: &[f64]) -> usize {
    let mut prev = 0.0_f64;
    let mut count = 0;
    for &v in values {
        if v == 0.0 || v.is_nan() {
            continue;
        }
        let sign = v.signum();
        if prev != 0.0 && sign != prev {
            count += 1;
        }
        prev = sign;
    }
    count
}

/// Nearest-rank percentile over an ascending slice: `sorted[floor(q * (n - 1))]`.
///
/// Falls back to the mean with fewer than two samples.
pub fn percentile_nearest_rank(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() < 2 {
        return mean(sorted);
    }
    let idx = (q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

//! Chunked normalization and tolerance checks.
//!
//! A conditional table stored row-major has one contiguous chunk per
//! assignment of its conditioning axes. These helpers sum, rescale and
//! check those chunks so that normalization logic lives in one place.

/// Sum consecutive chunks of `width` values.
///
/// A trailing partial chunk is summed as well. `width == 0` yields nothing.
pub fn chunk_sums<'a, I>(values: I, width: usize) -> Vec<f64>
where
    I: IntoIterator<Item = &'a f64>,
{
    if width == 0 {
        return Vec::new();
    }
    let mut sums = Vec::new();
    let mut acc = 0.0;
    let mut filled = 0;
    for v in values {
        acc += *v;
        filled += 1;
        if filled == width {
            sums.push(acc);
            acc = 0.0;
            filled = 0;
        }
    }
    if filled > 0 {
        sums.push(acc);
    }
    sums
}

/// Divide each chunk of `width` values by its sum, in place.
///
/// Chunks whose sum is exactly zero are left unchanged. Returns the number
/// of such zero-mass chunks.
pub fn normalize_chunks(values: &mut [f64], width: usize) -> usize {
    if width == 0 {
        return 0;
    }
    let mut zero_mass = 0;
    for chunk in values.chunks_mut(width) {
        let sum: f64 = chunk.iter().sum();
        if sum == 0.0 {
            zero_mass += 1;
            continue;
        }
        for v in chunk.iter_mut() {
            *v /= sum;
        }
    }
    zero_mass
}

/// Largest distance from 1.0 among chunk sums, ignoring zero-mass chunks.
///
/// Returns 0.0 when every chunk is either normalized or empty of mass.
pub fn max_chunk_deviation(sums: &[f64]) -> f64 {
    sums.iter()
        .filter(|s| **s != 0.0)
        .map(|s| (s - 1.0).abs())
        .fold(0.0, f64::max)
}

/// Absolute-tolerance comparison that never treats NaN as equal.
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    (a - b).abs() <= tol
}

/// Quotient with the 0/0 = 0 convention.
///
/// Returns `None` when a non-zero numerator meets a zero denominator.
pub fn checked_ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        if num == 0.0 {
            Some(0.0)
        } else {
            None
        }
    } else {
        Some(num / den)
    }
}

// SPDX-License-Identifier: LGPL-3.0-or-later

//! Horizontal (reduction) operations on f64 buffers.

use multiversion::multiversion;

/// Sum of squares.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn sqr_sum(src: &[f64]) -> f64 {
    src.iter().map(|x| x * x).sum()
}

/// Root mean square (RMS).
pub fn rms(src: &[f64]) -> f64 {
    if src.is_empty() {
        return 0.0;
    }
    (sqr_sum(src) / src.len() as f64).sqrt()
}

/// Find the maximum absolute value (peak amplitude).
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn abs_max(src: &[f64]) -> f64 {
    src.iter().map(|x| x.abs()).fold(0.0f64, f64::max)
}

/// Largest absolute element-wise difference over the common length.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn abs_diff_max(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f64, f64::max)
}

/// RMS of the element-wise difference over the common length.
pub fn diff_rms(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();
    (sum / n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_rms() {
        // RMS of [1, -1, 1, -1] = 1.0
        assert_approx_eq!(f64, rms(&[1.0, -1.0, 1.0, -1.0]), 1.0, ulps = 4);
    }

    #[test]
    fn test_abs_max() {
        assert_approx_eq!(f64, abs_max(&[1.0, -5.0, 3.0, -2.0]), 5.0, ulps = 2);
    }

    #[test]
    fn test_abs_diff_max() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.5, 1.0, 3.0, 100.0];
        assert_approx_eq!(f64, abs_diff_max(&a, &b), 1.0, ulps = 2);
    }

    #[test]
    fn test_diff_rms() {
        assert_approx_eq!(f64, diff_rms(&[1.0, 1.0], &[0.0, 2.0]), 1.0, ulps = 2);
    }

    #[test]
    fn test_empty_buffers() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(abs_max(&[]), 0.0);
        assert_eq!(abs_diff_max(&[], &[1.0]), 0.0);
        assert_eq!(diff_rms(&[], &[]), 0.0);
    }
}

// SPDX-License-Identifier: LGPL-3.0-or-later

//! Weighted accumulation of band outputs.
//!
//! Bands are summed one at a time in a fixed order so the result is
//! reproducible regardless of how the band outputs were produced.

use multiversion::multiversion;

/// Add-mix a weighted source into `dst`: `dst[i] += src[i]*k`.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn mix_add(dst: &mut [f64], src: &[f64], k: f64) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d += *s * k;
    }
}

/// Copy a weighted source into `dst`: `dst[i] = src[i]*k`.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn mix_copy(dst: &mut [f64], src: &[f64], k: f64) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d = *s * k;
    }
}

/// Sum `sources` into `dst` with per-source gains, in slice order.
///
/// `dst` is overwritten; sources must be as long as `dst`. Sources beyond
/// `gains.len()` are ignored, and an empty source list leaves `dst` zeroed.
pub fn mix_sum(dst: &mut [f64], sources: &[&[f64]], gains: &[f64]) {
    let mut pairs = sources.iter().zip(gains.iter());
    match pairs.next() {
        Some((src, &k)) => mix_copy(dst, src, k),
        None => dst.fill(0.0),
    }
    for (src, &k) in pairs {
        mix_add(dst, src, k);
    }
}

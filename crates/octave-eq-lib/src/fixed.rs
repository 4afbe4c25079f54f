// SPDX-License-Identifier: LGPL-3.0-or-later

//! Q31 conversion helpers.
//!
//! Float to Q31 conversion rounds half to even. Conversions that would not
//! fit in 32 bits return `None` instead of saturating, so callers can report
//! the offending value.

use crate::types::Q31_SCALE;

/// Convert a value already expressed in Q31 units (`x * 2^31`) to `i32`.
///
/// Returns `None` if the rounded magnitude is `2^31` or larger, or if the
/// value is not finite. `-2^31` is rejected too, so every accepted value
/// satisfies `|q| < 2^31`.
#[inline]
pub fn round_to_q31(scaled: f64) -> Option<i32> {
    if !scaled.is_finite() {
        return None;
    }
    let r = scaled.round_ties_even();
    if r.abs() >= Q31_SCALE {
        return None;
    }
    Some(r as i32)
}

/// Convert a float in `(-1, 1)` to Q31, dividing by `2^shift` first.
#[inline]
pub fn float_to_q31(x: f64, shift: u32) -> Option<i32> {
    round_to_q31(x / pow2(shift) * Q31_SCALE)
}

/// Convert a Q31 value back to float, multiplying by `2^shift`.
#[inline]
pub fn q31_to_float(q: i32, shift: u32) -> f64 {
    q as f64 / Q31_SCALE * pow2(shift)
}

/// Convert a buffer to Q31. Returns the index and value of the first sample
/// that cannot be represented.
pub fn float_to_q31_buf(dst: &mut [i32], src: &[f64], shift: u32) -> Result<(), (usize, f64)> {
    for (i, (d, &s)) in dst.iter_mut().zip(src.iter()).enumerate() {
        *d = float_to_q31(s, shift).ok_or((i, s))?;
    }
    Ok(())
}

/// Convert a Q31 buffer back to float.
pub fn q31_to_float_buf(dst: &mut [f64], src: &[i32], shift: u32) {
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = q31_to_float(s, shift);
    }
}

/// `2^shift` as a float.
#[inline]
pub fn pow2(shift: u32) -> f64 {
    (shift as f64).exp2()
}

/// High half of a 32x64 multiply: `(y * a) >> 32`, floor-rounded.
///
/// This is the product a 32x64 biquad forms between a Q63 output register
/// and a Q31 coefficient; the result is in the same Q62 units as a plain
/// Q31 x Q31 product.
#[inline]
pub fn mul_32x64(y: i64, a: i32) -> i64 {
    ((y as i128 * a as i128) >> 32) as i64
}

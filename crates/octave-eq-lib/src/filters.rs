// SPDX-License-Identifier: LGPL-3.0-or-later

//! Direct-form-I biquad cascade processing.
//!
//! One cascade algorithm, parameterised over an [`Arithmetic`] domain:
//!
//! - [`FloatArithmetic`]: f64 recurrence, no rounding beyond native
//!   arithmetic. Non-finite outputs are reported.
//! - [`Q31Arithmetic`]: 32x32 multiplies into a wide accumulator, then an
//!   arithmetic right shift by `31 - post_shift`. This is the classic
//!   fixed-point DF-I biquad; the shift restores the `2^post_shift` the
//!   coefficients were divided by when they were quantized.
//! - [`Q31ExtendedArithmetic`]: 32x64 variant that keeps the output history
//!   in Q63, which lowers the noise floor of low-frequency, high-Q sections.
//!
//! The cascade is processed section by section over the whole buffer
//! (section-major), which is exactly equivalent to running every section
//! per sample. Fixed-point results that would not fit their register are
//! reported instead of wrapped.

use crate::fixed::mul_32x64;
use crate::types::{Biquad, Df1State, Q31_FRAC_BITS};

/// Largest post shift a Q31 kernel accepts.
pub const MAX_POST_SHIFT: u32 = Q31_FRAC_BITS;

/// A per-sample arithmetic failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fault {
    /// The float recurrence produced NaN or infinity.
    NonFinite(f64),
    /// A fixed-point result did not fit its register.
    Overflow(i128),
}

/// A cascade processing failure with its location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CascadeFault {
    /// The number of state blocks differs from the number of sections.
    StateMismatch { stages: usize, states: usize },
    /// Source and destination buffers differ in length.
    BufferMismatch { src: usize, dst: usize },
    /// Arithmetic failure at `stage`, `sample`.
    Sample {
        stage: usize,
        sample: usize,
        fault: Fault,
    },
}

/// Numeric domain of a biquad cascade.
pub trait Arithmetic {
    /// Sample (and input register) type.
    type Sample: Copy + Default;
    /// Coefficient type.
    type Coeff: Copy;
    /// Output register type.
    type Feedback: Copy + Default;

    /// Run one section for one sample and advance its registers.
    fn accumulate(
        &self,
        x: Self::Sample,
        c: &Biquad<Self::Coeff>,
        d: &mut Df1State<Self::Sample, Self::Feedback>,
    ) -> Result<Self::Sample, Fault>;
}

/// State block type for an arithmetic domain.
pub type StateOf<A> = Df1State<<A as Arithmetic>::Sample, <A as Arithmetic>::Feedback>;

/// Floating-point domain. Coefficients use the standard (subtracting)
/// denominator convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatArithmetic;

impl Arithmetic for FloatArithmetic {
    type Sample = f64;
    type Coeff = f64;
    type Feedback = f64;

    #[inline]
    fn accumulate(
        &self,
        x: f64,
        c: &Biquad<f64>,
        d: &mut Df1State<f64, f64>,
    ) -> Result<f64, Fault> {
        let y = c.b0 * x + c.b1 * d.x1 + c.b2 * d.x2 - c.a1 * d.y1 - c.a2 * d.y2;
        if !y.is_finite() {
            return Err(Fault::NonFinite(y));
        }
        d.push(x, y);
        Ok(y)
    }
}

/// Q31 domain with 32-bit output history.
///
/// Coefficients are Q31 with pre-negated feedback terms.
#[derive(Debug, Clone, Copy)]
pub struct Q31Arithmetic {
    post_shift: u32,
}

impl Q31Arithmetic {
    /// Create the domain for coefficients scaled down by `2^post_shift`.
    ///
    /// # Panics
    ///
    /// Panics if `post_shift > MAX_POST_SHIFT`.
    pub fn new(post_shift: u32) -> Self {
        assert!(post_shift <= MAX_POST_SHIFT, "post shift {post_shift} out of range");
        Self { post_shift }
    }

    pub fn post_shift(&self) -> u32 {
        self.post_shift
    }
}

impl Arithmetic for Q31Arithmetic {
    type Sample = i32;
    type Coeff = i32;
    type Feedback = i32;

    #[inline]
    fn accumulate(
        &self,
        x: i32,
        c: &Biquad<i32>,
        d: &mut Df1State<i32, i32>,
    ) -> Result<i32, Fault> {
        let acc = c.b0 as i128 * x as i128
            + c.b1 as i128 * d.x1 as i128
            + c.b2 as i128 * d.x2 as i128
            + c.a1 as i128 * d.y1 as i128
            + c.a2 as i128 * d.y2 as i128;
        if i64::try_from(acc).is_err() {
            return Err(Fault::Overflow(acc));
        }
        let shifted = acc >> (Q31_FRAC_BITS - self.post_shift);
        let y = i32::try_from(shifted).map_err(|_| Fault::Overflow(shifted))?;
        d.push(x, y);
        Ok(y)
    }
}

/// Q31 domain with Q63 output history (32x64 multiplies on feedback).
#[derive(Debug, Clone, Copy)]
pub struct Q31ExtendedArithmetic {
    post_shift: u32,
}

impl Q31ExtendedArithmetic {
    /// Create the domain for coefficients scaled down by `2^post_shift`.
    ///
    /// # Panics
    ///
    /// Panics if `post_shift > MAX_POST_SHIFT`.
    pub fn new(post_shift: u32) -> Self {
        assert!(post_shift <= MAX_POST_SHIFT, "post shift {post_shift} out of range");
        Self { post_shift }
    }

    pub fn post_shift(&self) -> u32 {
        self.post_shift
    }
}

impl Arithmetic for Q31ExtendedArithmetic {
    type Sample = i32;
    type Coeff = i32;
    type Feedback = i64;

    #[inline]
    fn accumulate(
        &self,
        x: i32,
        c: &Biquad<i32>,
        d: &mut Df1State<i32, i64>,
    ) -> Result<i32, Fault> {
        // Q62 accumulator: Q31*Q31 feedforward plus (Q63*Q31) >> 32 feedback
        let acc = c.b0 as i128 * x as i128
            + c.b1 as i128 * d.x1 as i128
            + c.b2 as i128 * d.x2 as i128
            + mul_32x64(d.y1, c.a1) as i128
            + mul_32x64(d.y2, c.a2) as i128;
        if i64::try_from(acc).is_err() {
            return Err(Fault::Overflow(acc));
        }
        // Q62 -> Q63, restoring the coefficient scale on the way
        let widened = acc << (self.post_shift + 1);
        let y63 = i64::try_from(widened).map_err(|_| Fault::Overflow(widened))?;
        d.push(x, y63);
        Ok((y63 >> 32) as i32)
    }
}

/// Process `src` through a cascade of sections into `dst`.
///
/// `state` holds one register block per section and is advanced in place;
/// callers reset it between independent runs. On failure `dst` holds a
/// partially processed buffer and must be discarded.
pub fn cascade_process<A: Arithmetic>(
    arith: &A,
    stages: &[Biquad<A::Coeff>],
    state: &mut [StateOf<A>],
    dst: &mut [A::Sample],
    src: &[A::Sample],
) -> Result<(), CascadeFault> {
    if dst.len() != src.len() {
        return Err(CascadeFault::BufferMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    dst.copy_from_slice(src);
    cascade_process_inplace(arith, stages, state, dst)
}

/// Process a buffer through a cascade in place.
pub fn cascade_process_inplace<A: Arithmetic>(
    arith: &A,
    stages: &[Biquad<A::Coeff>],
    state: &mut [StateOf<A>],
    buf: &mut [A::Sample],
) -> Result<(), CascadeFault> {
    if stages.len() != state.len() {
        return Err(CascadeFault::StateMismatch {
            stages: stages.len(),
            states: state.len(),
        });
    }

    for (stage, (c, d)) in stages.iter().zip(state.iter_mut()).enumerate() {
        for (sample, s) in buf.iter_mut().enumerate() {
            *s = arith
                .accumulate(*s, c, d)
                .map_err(|fault| CascadeFault::Sample {
                    stage,
                    sample,
                    fault,
                })?;
        }
    }
    Ok(())
}

/// Zero every register block.
pub fn reset_state<X: Copy + Default, Y: Copy + Default>(state: &mut [Df1State<X, Y>]) {
    for d in state.iter_mut() {
        d.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::{float_to_q31, q31_to_float};
    use float_cmp::assert_approx_eq;

    /// Butterworth lowpass section (fc=1000Hz, fs=48000Hz), standard signs.
    fn lowpass_1k() -> Biquad<f64> {
        let w0 = 2.0 * std::f64::consts::PI * 1000.0 / 48000.0;
        let alpha = w0.sin() / (2.0 * std::f64::consts::FRAC_1_SQRT_2);
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;
        Biquad {
            b0: (1.0 - cos_w0) / 2.0 / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: (1.0 - cos_w0) / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Quantize a float section the way a Q31 engine expects it.
    fn to_q31(c: &Biquad<f64>, shift: u32) -> Biquad<i32> {
        let q = |v: f64| float_to_q31(v, shift).unwrap();
        Biquad {
            b0: q(c.b0),
            b1: q(c.b1),
            b2: q(c.b2),
            a1: q(-c.a1),
            a2: q(-c.a2),
        }
    }

    #[test]
    fn test_float_impulse_response() {
        let c = [lowpass_1k()];
        let mut state = [Df1State::default()];
        let mut impulse = vec![0.0; 64];
        impulse[0] = 1.0;
        let mut out = vec![0.0; 64];

        cascade_process(&FloatArithmetic, &c, &mut state, &mut out, &impulse).unwrap();

        assert_approx_eq!(f64, out[0], c[0].b0, ulps = 2);
        assert!(out[63].abs() < out[1].abs());
    }

    #[test]
    fn test_float_dc_gain() {
        let c = [lowpass_1k(), lowpass_1k()];
        let mut state = [Df1State::default(); 2];
        let dc = vec![1.0; 4096];
        let mut out = vec![0.0; 4096];

        cascade_process(&FloatArithmetic, &c, &mut state, &mut out, &dc).unwrap();
        assert_approx_eq!(f64, out[4095], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_float_identity_passthrough() {
        let c = [Biquad::identity(); 4];
        let mut state = [Df1State::default(); 4];
        let src = [1.0, -0.5, 0.25, 0.8];
        let mut dst = [0.0; 4];
        cascade_process(&FloatArithmetic, &c, &mut state, &mut dst, &src).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn test_empty_cascade_copies() {
        let mut state: [Df1State<f64, f64>; 0] = [];
        let src = [0.3, 0.1];
        let mut dst = [0.0; 2];
        cascade_process(&FloatArithmetic, &[], &mut state, &mut dst, &src).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn test_float_nan_is_reported() {
        let c = [Biquad::identity(), Biquad::identity()];
        let mut state = [Df1State::default(); 2];
        let src = [0.0, 1.0, f64::NAN, 0.0];
        let mut dst = [0.0; 4];
        let err = cascade_process(&FloatArithmetic, &c, &mut state, &mut dst, &src).unwrap_err();
        match err {
            CascadeFault::Sample {
                stage: 0,
                sample: 2,
                fault: Fault::NonFinite(v),
            } => assert!(v.is_nan()),
            other => panic!("unexpected fault {other:?}"),
        }
    }

    #[test]
    fn test_unstable_float_section_blows_up() {
        // Pole at z = 2
        let c = [Biquad {
            a1: -2.0,
            ..Biquad::identity()
        }];
        let mut state = [Df1State::default()];
        let mut buf = vec![0.0; 2048];
        buf[0] = 1.0;
        let err = cascade_process_inplace(&FloatArithmetic, &c, &mut state, &mut buf).unwrap_err();
        assert!(matches!(
            err,
            CascadeFault::Sample {
                stage: 0,
                fault: Fault::NonFinite(_),
                ..
            }
        ));
    }

    #[test]
    fn test_state_mismatch() {
        let c = [Biquad::identity(); 3];
        let mut state = [Df1State::default(); 2];
        let mut buf = [0.0; 4];
        assert_eq!(
            cascade_process_inplace(&FloatArithmetic, &c, &mut state, &mut buf),
            Err(CascadeFault::StateMismatch {
                stages: 3,
                states: 2
            })
        );
    }

    #[test]
    fn test_buffer_mismatch() {
        let c = [Biquad::identity()];
        let mut state = [Df1State::default()];
        let mut dst = [0.0; 3];
        assert_eq!(
            cascade_process(&FloatArithmetic, &c, &mut state, &mut dst, &[0.0; 4]),
            Err(CascadeFault::BufferMismatch { src: 4, dst: 3 })
        );
    }

    #[test]
    fn test_q31_identity_with_post_shift() {
        // b0 = 1 scaled by 1/16 and restored by the post shift
        let shift = 4;
        let c = [Biquad {
            b0: 1 << (31 - shift),
            b1: 0,
            b2: 0,
            a1: 0,
            a2: 0,
        }];
        let src = [123_456_789, -987_654_321, 0, 1, -1];
        let mut dst = [0; 5];
        let mut state = [Df1State::default()];
        cascade_process(&Q31Arithmetic::new(shift), &c, &mut state, &mut dst, &src).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn test_q31_shift_truncates_toward_negative_infinity() {
        // b0 = 0.5 with no scaling: -1 * 0.5 -> -0.5 LSB, floors to -1
        let c = [Biquad {
            b0: 1 << 30,
            b1: 0,
            b2: 0,
            a1: 0,
            a2: 0,
        }];
        let mut state = [Df1State::default()];
        let mut buf = [-1, 1, 3];
        cascade_process_inplace(&Q31Arithmetic::new(0), &c, &mut state, &mut buf).unwrap();
        assert_eq!(buf, [-1, 0, 1]);
    }

    #[test]
    fn test_q31_overflow_is_reported() {
        // Gain of 8 on a large input cannot fit in Q31
        let shift = 4;
        let c = [Biquad {
            b0: 1 << 30,
            b1: 0,
            b2: 0,
            a1: 0,
            a2: 0,
        }];
        let mut state = [Df1State::default()];
        let mut buf = [1 << 20, 1 << 29];
        let err = cascade_process_inplace(&Q31Arithmetic::new(shift), &c, &mut state, &mut buf)
            .unwrap_err();
        assert!(matches!(
            err,
            CascadeFault::Sample {
                stage: 0,
                sample: 1,
                fault: Fault::Overflow(_)
            }
        ));
    }

    #[test]
    fn test_q31_tracks_float_lowpass() {
        let shift = 2;
        let fc = lowpass_1k();
        let qc = [to_q31(&fc, shift)];
        let src: Vec<f64> = (0..512).map(|i| 0.2 * (i as f64 * 0.05).sin()).collect();
        let qsrc: Vec<i32> = src.iter().map(|&x| float_to_q31(x, 0).unwrap()).collect();

        let mut fout = vec![0.0; src.len()];
        let mut qout = vec![0; src.len()];
        let mut fstate = [Df1State::default()];
        let mut qstate = [Df1State::default()];
        cascade_process(&FloatArithmetic, &[fc], &mut fstate, &mut fout, &src).unwrap();
        cascade_process(&Q31Arithmetic::new(shift), &qc, &mut qstate, &mut qout, &qsrc).unwrap();

        for (i, (&f, &q)) in fout.iter().zip(qout.iter()).enumerate() {
            let q = q31_to_float(q, 0);
            assert!((f - q).abs() < 1e-6, "sample {i}: float {f} vs q31 {q}");
        }
    }

    #[test]
    fn test_extended_matches_standard_on_feedforward_section() {
        // Without feedback both kernels shift the same Q62 accumulator
        let shift = 3;
        let c = [Biquad {
            b0: 0x0800_0000,
            b1: -0x0400_0000,
            b2: 0x0123_4567,
            a1: 0,
            a2: 0,
        }];
        let src: Vec<i32> = (0..64).map(|i| (i * 7_654_321) % 400_000_000 - 200_000_000).collect();
        let mut a = vec![0; 64];
        let mut b = vec![0; 64];
        let mut sa = [Df1State::default()];
        let mut sb = [Df1State::default()];
        cascade_process(&Q31Arithmetic::new(shift), &c, &mut sa, &mut a, &src).unwrap();
        cascade_process(&Q31ExtendedArithmetic::new(shift), &c, &mut sb, &mut b, &src).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reset_state() {
        let mut state = [Df1State { x1: 1.0, x2: 2.0, y1: 3.0, y2: 4.0 }; 3];
        reset_state(&mut state);
        assert!(state.iter().all(|d| *d == Df1State::default()));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_post_shift_limit() {
        let _ = Q31Arithmetic::new(MAX_POST_SHIFT + 1);
    }
}

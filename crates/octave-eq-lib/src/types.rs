// SPDX-License-Identifier: LGPL-3.0-or-later

//! Core data types for the cascade kernels.
//!
//! The same coefficient and state layouts are shared by the floating-point
//! and the Q31 domains; only the scalar types differ.

/// Number of fractional bits in a Q31 value.
pub const Q31_FRAC_BITS: u32 = 31;

/// `2^31` as a float, the Q31 scale.
pub const Q31_SCALE: f64 = 2_147_483_648.0;

/// Number of coefficients per second-order section.
pub const COEFFS_PER_STAGE: usize = 5;

/// Coefficients for a single second-order section.
///
/// The meaning of `a1`/`a2` depends on the arithmetic domain:
///
/// - **Float** sections use the standard denominator convention
///   `1 + a1*z^-1 + a2*z^-2`, so the recurrence subtracts:
///   ```text
///     y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
///   ```
/// - **Q31** sections store the feedback terms **pre-negated**
///   (`a1_q = -a1`, `a2_q = -a2`), the layout a fixed-point DSP engine
///   consumes, so the accumulator only ever adds:
///   ```text
///     acc = b0*x[n] + b1*x[n-1] + b2*x[n-2] + a1_q*y[n-1] + a2_q*y[n-2]
///   ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct Biquad<T> {
    pub b0: T,
    pub b1: T,
    pub b2: T,
    pub a1: T,
    pub a2: T,
}

impl<T: Copy> Biquad<T> {
    /// Coefficients in engine order: `[b0, b1, b2, a1, a2]`.
    pub fn to_array(&self) -> [T; COEFFS_PER_STAGE] {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
    }

    /// Build a section from engine-ordered coefficients.
    pub fn from_array(c: [T; COEFFS_PER_STAGE]) -> Self {
        Self {
            b0: c[0],
            b1: c[1],
            b2: c[2],
            a1: c[3],
            a2: c[4],
        }
    }
}

impl Biquad<f64> {
    /// Identity section (`b0 = 1`, everything else zero).
    pub fn identity() -> Self {
        Self {
            b0: 1.0,
            ..Self::default()
        }
    }

    /// Returns `true` if both poles lie strictly inside the unit circle.
    ///
    /// For `1 + a1*z^-1 + a2*z^-2` the stability triangle is
    /// `|a2| < 1` and `|a1| < 1 + a2`.
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }

    /// Returns `true` if every coefficient is finite.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|c| c.is_finite())
    }
}

/// Direct-form-I delay registers for one section.
///
/// `x1`/`x2` hold the previous two inputs, `y1`/`y2` the previous two
/// outputs. Input and output registers may have different widths: the
/// extended Q31 kernel keeps its output history in Q63.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Df1State<X, Y> {
    pub x1: X,
    pub x2: X,
    pub y1: Y,
    pub y2: Y,
}

impl<X: Copy + Default, Y: Copy + Default> Df1State<X, Y> {
    /// Reset the delay memory to zero (clear filter state).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Shift the registers after a sample has been produced.
    #[inline]
    pub fn push(&mut self, x: X, y: Y) {
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
    }
}

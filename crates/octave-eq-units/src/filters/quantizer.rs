// SPDX-License-Identifier: LGPL-3.0-or-later

//! Q31 quantization of float cascades.
//!
//! Every coefficient is divided by `2^s` before conversion so the feedback
//! terms (close to 2 for low, narrow bands) fit in `[-1, 1)`. The Q31
//! engines restore the scale by shifting each accumulator right by
//! `31 - s` instead of 31. Feedback terms are stored negated, so the
//! engine only ever adds products.

use log::debug;
use octave_eq_lib::fixed::{pow2, q31_to_float, round_to_q31};
use octave_eq_lib::types::{Biquad, COEFFS_PER_STAGE, Q31_SCALE};

use crate::config::EqualizerConfig;
use crate::consts::MAX_SCALE_SHIFT;
use crate::error::{EqError, Result};
use crate::filters::sos::SosCascade;

/// Coefficient names in engine order.
pub const COEFF_NAMES: [&str; COEFFS_PER_STAGE] = ["b0", "b1", "b2", "a1", "a2"];

/// Quantized cascade for one band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPointCascade {
    band: usize,
    stages: Vec<Biquad<i32>>,
    post_shift: u32,
}

impl FixedPointCascade {
    pub fn band(&self) -> usize {
        self.band
    }

    /// Q31 sections with pre-negated feedback terms.
    pub fn stages(&self) -> &[Biquad<i32>] {
        &self.stages
    }

    /// Right shift deficit the engine applies (`s`).
    pub fn post_shift(&self) -> u32 {
        self.post_shift
    }

    pub fn order(&self) -> usize {
        self.stages.len()
    }

    /// Flat `[b0, b1, b2, a1, a2]` per stage, the layout a DSP biquad
    /// initialiser consumes.
    pub fn coefficients(&self) -> Vec<i32> {
        self.stages.iter().flat_map(Biquad::to_array).collect()
    }

    /// Rebuild the float cascade these coefficients represent.
    pub fn dequantize(&self) -> SosCascade {
        let s = self.post_shift;
        let stages = self
            .stages
            .iter()
            .map(|q| Biquad {
                b0: q31_to_float(q.b0, s),
                b1: q31_to_float(q.b1, s),
                b2: q31_to_float(q.b2, s),
                a1: -q31_to_float(q.a1, s),
                a2: -q31_to_float(q.a2, s),
            })
            .collect();
        SosCascade::new(self.band, stages)
    }
}

/// Converts float cascades to Q31 with a fixed scale shift.
#[derive(Debug, Clone, Copy)]
pub struct FixedPointQuantizer {
    scale_shift: u32,
}

impl FixedPointQuantizer {
    /// Create a quantizer dividing coefficients by `2^scale_shift`.
    pub fn new(scale_shift: u32) -> Result<Self> {
        if scale_shift > MAX_SCALE_SHIFT {
            return Err(EqError::configuration(format!(
                "scale shift {scale_shift} exceeds {MAX_SCALE_SHIFT}"
            )));
        }
        Ok(Self { scale_shift })
    }

    pub fn from_config(config: &EqualizerConfig) -> Result<Self> {
        Self::new(config.scale_shift)
    }

    pub fn scale_shift(&self) -> u32 {
        self.scale_shift
    }

    /// Quantize every stage of `cascade`.
    ///
    /// A coefficient whose scaled value rounds to `|q| >= 2^31` is a
    /// [`EqError::QuantizationOverflow`]; the reported value is the scaled
    /// coefficient in float units (feedback terms negated).
    pub fn quantize(&self, cascade: &SosCascade) -> Result<FixedPointCascade> {
        let band = cascade.band();
        let scale = pow2(self.scale_shift);

        let stages = cascade
            .stages()
            .iter()
            .enumerate()
            .map(|(stage, c)| -> Result<Biquad<i32>> {
                let engine_order = [c.b0, c.b1, c.b2, -c.a1, -c.a2];
                let mut q = [0i32; COEFFS_PER_STAGE];
                for (i, &v) in engine_order.iter().enumerate() {
                    let scaled = v / scale;
                    q[i] = round_to_q31(scaled * Q31_SCALE).ok_or(EqError::QuantizationOverflow {
                        band,
                        stage,
                        coefficient: COEFF_NAMES[i],
                        value: scaled,
                    })?;
                }
                debug!("band {band} stage {stage} q31: {q:?} (shift {})", self.scale_shift);
                Ok(Biquad::from_array(q))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FixedPointCascade {
            band,
            stages,
            post_shift: self.scale_shift,
        })
    }
}

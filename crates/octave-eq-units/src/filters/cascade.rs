// SPDX-License-Identifier: LGPL-3.0-or-later

//! Per-band cascade engines.
//!
//! An engine owns one band's coefficients and the direct-form-I registers
//! for every section. Both engines take and return f64 samples; the fixed
//! engine frames the buffer into Q31 (divided by `2^h` for headroom),
//! runs the integer kernel and scales the result back.
//!
//! Registers persist across [`CascadeEngine::process`] calls and are
//! zeroed by [`CascadeEngine::reset`]; [`CascadeEngine::run`] does both for
//! one independent buffer.

use octave_eq_lib::filters::{
    CascadeFault, Fault, FloatArithmetic, MAX_POST_SHIFT, Q31Arithmetic, Q31ExtendedArithmetic,
    StateOf, cascade_process, cascade_process_inplace, reset_state,
};
use octave_eq_lib::fixed::{float_to_q31_buf, q31_to_float_buf};
use octave_eq_lib::types::{Biquad, Df1State};
use serde::{Deserialize, Serialize};

use crate::consts::MAX_INPUT_HEADROOM_SHIFT;
use crate::error::{EqError, Result};
use crate::filters::quantizer::FixedPointCascade;
use crate::filters::sos::SosCascade;

/// Applies one band's cascade to sample buffers.
pub trait CascadeEngine {
    /// Band the engine filters.
    fn band(&self) -> usize;

    /// Zero every register.
    fn reset(&mut self);

    /// Filter `src` into `dst`, continuing from the current registers.
    fn process(&mut self, dst: &mut [f64], src: &[f64]) -> Result<()>;

    /// Filter one buffer from zeroed registers.
    fn run(&mut self, src: &[f64]) -> Result<Vec<f64>> {
        self.reset();
        let mut out = vec![0.0; src.len()];
        self.process(&mut out, src)?;
        Ok(out)
    }
}

/// Map a kernel fault to a pipeline error for `band`.
fn fault_to_error(band: usize, fault: CascadeFault) -> EqError {
    match fault {
        CascadeFault::StateMismatch { stages, states } => EqError::internal(format!(
            "band {band}: {stages} sections but {states} state blocks"
        )),
        CascadeFault::BufferMismatch { src, dst } => EqError::internal(format!(
            "band {band}: input has {src} samples, output {dst}"
        )),
        CascadeFault::Sample {
            stage,
            sample,
            fault,
        } => EqError::NumericalInstability {
            band,
            stage,
            sample,
            value: match fault {
                Fault::NonFinite(v) => v,
                Fault::Overflow(raw) => raw as f64,
            },
        },
    }
}

/// Reference f64 engine.
#[derive(Debug, Clone)]
pub struct FloatCascadeEngine {
    band: usize,
    stages: Vec<Biquad<f64>>,
    state: Vec<StateOf<FloatArithmetic>>,
}

impl FloatCascadeEngine {
    pub fn new(cascade: &SosCascade) -> Self {
        Self {
            band: cascade.band(),
            stages: cascade.stages().to_vec(),
            state: vec![Df1State::default(); cascade.order()],
        }
    }

    pub fn stages(&self) -> &[Biquad<f64>] {
        &self.stages
    }
}

impl CascadeEngine for FloatCascadeEngine {
    fn band(&self) -> usize {
        self.band
    }

    fn reset(&mut self) {
        reset_state(&mut self.state);
    }

    fn process(&mut self, dst: &mut [f64], src: &[f64]) -> Result<()> {
        cascade_process(&FloatArithmetic, &self.stages, &mut self.state, dst, src)
            .map_err(|f| fault_to_error(self.band, f))
    }
}

/// Q31 kernel variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixedKernel {
    /// 32x32 multiplies, Q31 output history.
    Standard,
    /// 32x64 multiplies, Q63 output history.
    Extended,
}

#[derive(Debug, Clone)]
enum FixedState {
    Standard(Q31Arithmetic, Vec<StateOf<Q31Arithmetic>>),
    Extended(Q31ExtendedArithmetic, Vec<StateOf<Q31ExtendedArithmetic>>),
}

/// Fixed-point engine reproducing a DSP's DF-I biquad arithmetic.
#[derive(Debug, Clone)]
pub struct FixedCascadeEngine {
    band: usize,
    stages: Vec<Biquad<i32>>,
    state: FixedState,
    input_shift: u32,
    scratch: Vec<i32>,
}

impl FixedCascadeEngine {
    /// Create an engine for `cascade`, pre-scaling input by `2^input_shift`.
    pub fn new(cascade: &FixedPointCascade, kernel: FixedKernel, input_shift: u32) -> Result<Self> {
        if input_shift > MAX_INPUT_HEADROOM_SHIFT {
            return Err(EqError::configuration(format!(
                "input headroom shift {input_shift} exceeds {MAX_INPUT_HEADROOM_SHIFT}"
            )));
        }
        let shift = cascade.post_shift();
        if shift > MAX_POST_SHIFT {
            return Err(EqError::configuration(format!(
                "post shift {shift} cannot be restored by a Q31 engine"
            )));
        }
        let n = cascade.order();
        let state = match kernel {
            FixedKernel::Standard => {
                FixedState::Standard(Q31Arithmetic::new(shift), vec![Df1State::default(); n])
            }
            FixedKernel::Extended => FixedState::Extended(
                Q31ExtendedArithmetic::new(shift),
                vec![Df1State::default(); n],
            ),
        };
        Ok(Self {
            band: cascade.band(),
            stages: cascade.stages().to_vec(),
            state,
            input_shift,
            scratch: Vec::new(),
        })
    }

    pub fn kernel(&self) -> FixedKernel {
        match self.state {
            FixedState::Standard(..) => FixedKernel::Standard,
            FixedState::Extended(..) => FixedKernel::Extended,
        }
    }

    pub fn input_shift(&self) -> u32 {
        self.input_shift
    }

    pub fn stages(&self) -> &[Biquad<i32>] {
        &self.stages
    }

    /// Run the integer kernel over an already framed Q31 buffer in place.
    pub fn process_q31(&mut self, buf: &mut [i32]) -> Result<()> {
        let result = match &mut self.state {
            FixedState::Standard(arith, state) => {
                cascade_process_inplace(&*arith, &self.stages, state, buf)
            }
            FixedState::Extended(arith, state) => {
                cascade_process_inplace(&*arith, &self.stages, state, buf)
            }
        };
        result.map_err(|f| fault_to_error(self.band, f))
    }
}

impl CascadeEngine for FixedCascadeEngine {
    fn band(&self) -> usize {
        self.band
    }

    fn reset(&mut self) {
        match &mut self.state {
            FixedState::Standard(_, state) => reset_state(state),
            FixedState::Extended(_, state) => reset_state(state),
        }
    }

    fn process(&mut self, dst: &mut [f64], src: &[f64]) -> Result<()> {
        if dst.len() != src.len() {
            return Err(EqError::internal(format!(
                "band {}: input has {} samples, output {}",
                self.band,
                src.len(),
                dst.len()
            )));
        }
        let mut buf = std::mem::take(&mut self.scratch);
        buf.clear();
        buf.resize(src.len(), 0);

        let h = self.input_shift;
        let framed = float_to_q31_buf(&mut buf, src, h).map_err(|(i, v)| {
            EqError::configuration(format!(
                "input sample {i} = {v} cannot be represented in Q31 after a headroom shift of {h}"
            ))
        });
        let result = framed.and_then(|()| self.process_q31(&mut buf));
        if result.is_ok() {
            q31_to_float_buf(dst, &buf, h);
        }
        self.scratch = buf;
        result
    }
}

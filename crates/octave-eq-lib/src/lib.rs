// SPDX-License-Identifier: LGPL-3.0-or-later

//! # octave-eq-lib
//!
//! Low-level kernels for the octave equalizer.
//!
//! This crate provides the sample-level operations used by
//! `octave-eq-units` to build the filter bank. It includes:
//!
//! - **Filters**: one direct-form-I biquad cascade, generic over the
//!   arithmetic domain (f64, Q31 32x32, Q31 32x64)
//! - **Fixed point**: Q31 conversion and wide multiply helpers
//! - **Mixing**: deterministic weighted accumulation
//! - **Math**: horizontal reductions (RMS, peak, difference norms)
//!
//! ## Design
//!
//! Buffer-processing functions use runtime SIMD dispatch via the
//! `multiversion` crate. Each annotated function is compiled for
//! AVX2+FMA, AVX, SSE4.1, and NEON targets; the best variant is
//! selected automatically at startup. The cascade kernel itself is a
//! sample-serial recurrence and is left to the compiler.

pub mod filters;
pub mod fixed;
pub mod math;
pub mod mix;
pub mod types;

// SPDX-License-Identifier: LGPL-3.0-or-later

//! # octave-eq-units
//!
//! Octave-band Butterworth equalizer built on [`octave_eq_lib`].
//!
//! A signal is split into octave bands centred on `base * 2^k`, each band
//! filtered by a cascade of second-order sections, and the bands summed
//! back with per-band gains. Every band is run twice: once in f64 as the
//! reference and once in Q31 fixed point the way a 32-bit DSP would run it,
//! so the two can be compared sample by sample.
//!
//! - **Planning**: octave centres and log-midpoint edges
//! - **Design**: digital Butterworth bandpass cascades
//! - **Quantization**: scaled Q31 coefficients
//! - **Engines**: float and fixed-point cascades, a filter bank and a mixer
//! - **Export**: band tables and C coefficient tables
//!
//! The [`OctaveEqualizer`](filters::equalizer::OctaveEqualizer) runs the
//! whole pipeline from an [`EqualizerConfig`](config::EqualizerConfig).

pub mod config;
pub mod consts;
pub mod error;
pub mod export;
pub mod filters;
pub mod signal;
pub mod units;

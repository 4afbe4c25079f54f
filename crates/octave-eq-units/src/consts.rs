// SPDX-License-Identifier: LGPL-3.0-or-later

//! Default settings and numeric limits.
//!
//! The defaults describe the reference device: six octave bands from
//! 100 Hz at 16 kHz, third-order cascades, coefficients divided by 16.

// Band layout

/// Centre of the first filtered band (Hz).
pub const DEFAULT_BASE_FREQUENCY: f64 = 100.0;

/// Number of filtered bands.
pub const DEFAULT_BAND_COUNT: usize = 6;

/// Sample rate (Hz).
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Number of second-order sections per band.
pub const DEFAULT_CASCADE_ORDER: usize = 3;

/// Ratio between adjacent band centres.
pub const OCTAVE_RATIO: f64 = 2.0;

// Fixed-point scaling

/// Coefficient scale exponent (`2^4 = 16`).
pub const DEFAULT_SCALE_SHIFT: u32 = 4;

/// Largest coefficient scale exponent a Q31 engine can restore.
pub const MAX_SCALE_SHIFT: u32 = 31;

/// Input pre-scale exponent for the fixed path (`2^2 = 4`).
pub const DEFAULT_INPUT_HEADROOM_SHIFT: u32 = 2;

/// Largest input pre-scale exponent.
pub const MAX_INPUT_HEADROOM_SHIFT: u32 = 30;

/// Number of low bands run on the 32x64 kernel.
pub const DEFAULT_EXTENDED_PRECISION_BANDS: usize = 0;

/// Band centre above which the 32x64 kernel buys no useful precision (Hz).
pub const EXTENDED_PRECISION_HINT_HZ: f64 = 1000.0;

// Test signal

/// Tones of the default test signal as `(frequency Hz, amplitude)`.
pub const DEFAULT_TONES: [(f64, f64); 2] = [(80.0, 1.0), (2000.0, 0.25)];

/// Duration of the default test signal (seconds).
pub const DEFAULT_TONE_DURATION: f64 = 0.5;

/// Longest test signal a tone source renders (seconds).
pub const MAX_TONE_DURATION: f64 = 3600.0;

/// Frequency response points for diagnostics.
pub const DEFAULT_RESPONSE_POINTS: usize = 512;

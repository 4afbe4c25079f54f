// SPDX-License-Identifier: LGPL-3.0-or-later

//! Unit conversion functions.
//!
//! Time, frequency and gain conversions used by the planner, the designer
//! and the reports.

/// Convert sample count to seconds.
///
/// # Arguments
/// * `sr` - Sample rate in Hz
/// * `samples` - Number of samples
///
/// # Returns
/// Time in seconds
#[inline]
pub fn samples_to_seconds(sr: f64, samples: f64) -> f64 {
    samples / sr
}

/// Convert seconds to a (fractional) sample count.
#[inline]
pub fn seconds_to_samples(sr: f64, time: f64) -> f64 {
    time * sr
}

/// Nyquist frequency for a sample rate.
#[inline]
pub fn nyquist(sr: f64) -> f64 {
    sr / 2.0
}

/// Normalise a frequency by Nyquist (`1.0` is Nyquist).
#[inline]
pub fn normalized_frequency(sr: f64, freq: f64) -> f64 {
    freq / nyquist(sr)
}

/// Geometric mean of two frequencies, the log-midpoint between them.
///
/// Computed as `10^(log10(f1) + (log10(f2) - log10(f1)) / 2)`.
#[inline]
pub fn log_midpoint(f1: f64, f2: f64) -> f64 {
    let l1 = f1.log10();
    10f64.powf(l1 + (f2.log10() - l1) / 2.0)
}

/// Convert decibels to linear gain (amplitude ratio).
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    (db * (std::f64::consts::LN_10 / 20.0)).exp()
}

/// Convert linear gain to decibels. Zero gain gives `-inf`.
#[inline]
pub fn gain_to_db(gain: f64) -> f64 {
    20.0 * gain.log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_samples_time_conversion() {
        let sr = 16000.0;

        // 8000 samples at 16kHz = 0.5 second
        assert!((samples_to_seconds(sr, 8000.0) - 0.5).abs() < EPSILON);
        assert!((seconds_to_samples(sr, 0.5) - 8000.0).abs() < EPSILON);

        // Roundtrip
        let time = 2.5;
        let samples = seconds_to_samples(sr, time);
        assert!((samples_to_seconds(sr, samples) - time).abs() < EPSILON);
    }

    #[test]
    fn test_normalized_frequency() {
        assert!((nyquist(16000.0) - 8000.0).abs() < EPSILON);
        assert!((normalized_frequency(16000.0, 2000.0) - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_log_midpoint() {
        assert!((log_midpoint(50.0, 100.0) - 50.0 * 2f64.sqrt()).abs() < 1e-9);
        assert!((log_midpoint(1600.0, 3200.0) - (1600.0f64 * 3200.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_db_gain_conversion() {
        assert!((db_to_gain(0.0) - 1.0).abs() < EPSILON);
        assert!((db_to_gain(20.0) - 10.0).abs() < 1e-9);
        assert!((gain_to_db(0.1) + 20.0).abs() < 1e-9);

        // Roundtrip
        let db = -6.0;
        assert!((gain_to_db(db_to_gain(db)) - db).abs() < 1e-9);
    }
}

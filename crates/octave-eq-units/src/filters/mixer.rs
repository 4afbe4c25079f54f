// SPDX-License-Identifier: LGPL-3.0-or-later

//! Weighted recombination of band outputs.
//!
//! Bands are accumulated strictly in band order, lowest first, so the
//! floating-point sum is reproducible. No clipping or normalisation is
//! applied.

use octave_eq_lib::mix::mix_sum;

use crate::error::{EqError, Result};
use crate::signal::Signal;

/// Sums band signals with one gain per band.
#[derive(Debug, Clone, PartialEq)]
pub struct BandMixer {
    gains: Vec<f64>,
}

impl BandMixer {
    pub fn new(gains: Vec<f64>) -> Self {
        Self { gains }
    }

    /// Mixer with unit gain for `bands` bands.
    pub fn unity(bands: usize) -> Self {
        Self::new(vec![1.0; bands])
    }

    pub fn gains(&self) -> &[f64] {
        &self.gains
    }

    /// Mix raw sample buffers of equal length.
    pub fn mix_samples(&self, bands: &[&[f64]]) -> Result<Vec<f64>> {
        if bands.len() != self.gains.len() {
            return Err(EqError::internal(format!(
                "{} bands to mix with {} gains",
                bands.len(),
                self.gains.len()
            )));
        }
        let len = bands.first().map_or(0, |b| b.len());
        if let Some(i) = bands.iter().position(|b| b.len() != len) {
            return Err(EqError::internal(format!(
                "band {} has {} samples, expected {len}",
                i + 1,
                bands[i].len()
            )));
        }
        let mut out = vec![0.0; len];
        mix_sum(&mut out, bands, &self.gains);
        Ok(out)
    }

    /// Mix band signals sharing one sample rate.
    pub fn mix(&self, bands: &[Signal]) -> Result<Signal> {
        let Some(first) = bands.first() else {
            return Err(EqError::internal("no bands to mix"));
        };
        let rate = first.sample_rate();
        if let Some(b) = bands.iter().find(|b| b.sample_rate() != rate) {
            return Err(EqError::internal(format!(
                "band sample rate {} differs from {rate}",
                b.sample_rate()
            )));
        }
        let buffers: Vec<&[f64]> = bands.iter().map(Signal::samples).collect();
        Ok(Signal::new(self.mix_samples(&buffers)?, rate))
    }
}

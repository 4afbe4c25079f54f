// SPDX-License-Identifier: LGPL-3.0-or-later

//! Equalizer configuration.
//!
//! One explicit configuration value is passed to the planner, the designer,
//! the quantizer and the engines; nothing is read from global state.
//! Configurations can be loaded from JSON using kebab-case keys, with every
//! omitted key taking its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_BAND_COUNT, DEFAULT_BASE_FREQUENCY, DEFAULT_CASCADE_ORDER,
    DEFAULT_EXTENDED_PRECISION_BANDS, DEFAULT_INPUT_HEADROOM_SHIFT, DEFAULT_SAMPLE_RATE,
    DEFAULT_SCALE_SHIFT, MAX_INPUT_HEADROOM_SHIFT, MAX_SCALE_SHIFT,
};
use crate::error::{EqError, Result};
use crate::filters::planner::BandPlanner;

/// Settings for an [`OctaveEqualizer`](crate::filters::equalizer::OctaveEqualizer).
///
/// # Examples
///
/// ```
/// use octave_eq_units::config::EqualizerConfig;
///
/// let mut config = EqualizerConfig::default();
/// config.set_band_count(4).set_scale_shift(3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EqualizerConfig {
    /// Centre of the first filtered band in Hz.
    pub base_frequency: f64,
    /// Number of filtered octave bands.
    pub band_count: usize,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Second-order sections per band.
    pub cascade_order: usize,
    /// Coefficients are divided by `2^scale_shift` before Q31 conversion.
    pub scale_shift: u32,
    /// Per-band mix gains; `None` means unity for every band.
    pub per_band_gain: Option<Vec<f64>>,
    /// Fixed-path input is divided by `2^input_headroom_shift`.
    pub input_headroom_shift: u32,
    /// Number of lowest bands filtered with the 32x64 kernel.
    pub extended_precision_bands: usize,
}

impl Default for EqualizerConfig {
    fn default() -> Self {
        Self {
            base_frequency: DEFAULT_BASE_FREQUENCY,
            band_count: DEFAULT_BAND_COUNT,
            sample_rate: DEFAULT_SAMPLE_RATE,
            cascade_order: DEFAULT_CASCADE_ORDER,
            scale_shift: DEFAULT_SCALE_SHIFT,
            per_band_gain: None,
            input_headroom_shift: DEFAULT_INPUT_HEADROOM_SHIFT,
            extended_precision_bands: DEFAULT_EXTENDED_PRECISION_BANDS,
        }
    }
}

impl EqualizerConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EqError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| EqError::internal(e.to_string()))
    }

    pub fn set_base_frequency(&mut self, freq: f64) -> &mut Self {
        self.base_frequency = freq;
        self
    }

    pub fn set_band_count(&mut self, count: usize) -> &mut Self {
        self.band_count = count;
        self
    }

    pub fn set_sample_rate(&mut self, sr: u32) -> &mut Self {
        self.sample_rate = sr;
        self
    }

    pub fn set_cascade_order(&mut self, order: usize) -> &mut Self {
        self.cascade_order = order;
        self
    }

    pub fn set_scale_shift(&mut self, shift: u32) -> &mut Self {
        self.scale_shift = shift;
        self
    }

    /// Set per-band mix gains (one per filtered band, lowest first).
    pub fn set_per_band_gain(&mut self, gains: Vec<f64>) -> &mut Self {
        self.per_band_gain = Some(gains);
        self
    }

    pub fn set_input_headroom_shift(&mut self, shift: u32) -> &mut Self {
        self.input_headroom_shift = shift;
        self
    }

    pub fn set_extended_precision_bands(&mut self, count: usize) -> &mut Self {
        self.extended_precision_bands = count;
        self
    }

    /// Mix gains resolved to one value per band.
    pub fn gains(&self) -> Vec<f64> {
        match &self.per_band_gain {
            Some(g) => g.clone(),
            None => vec![1.0; self.band_count],
        }
    }

    /// Check every field against its documented range.
    ///
    /// Frequency layout against Nyquist is checked by the band planner.
    pub fn validate(&self) -> Result<()> {
        if !self.base_frequency.is_finite() || self.base_frequency <= 0.0 {
            return Err(EqError::configuration(format!(
                "base frequency must be positive, got {}",
                self.base_frequency
            )));
        }
        if self.band_count == 0 {
            return Err(EqError::configuration("band count must be at least 1"));
        }
        if self.sample_rate == 0 {
            return Err(EqError::configuration("sample rate must be positive"));
        }
        BandPlanner::from_config(self).top_edge()?;
        if self.cascade_order == 0 {
            return Err(EqError::configuration("cascade order must be at least 1"));
        }
        if self.scale_shift > MAX_SCALE_SHIFT {
            return Err(EqError::configuration(format!(
                "scale shift {} exceeds {MAX_SCALE_SHIFT}",
                self.scale_shift
            )));
        }
        if self.input_headroom_shift > MAX_INPUT_HEADROOM_SHIFT {
            return Err(EqError::configuration(format!(
                "input headroom shift {} exceeds {MAX_INPUT_HEADROOM_SHIFT}",
                self.input_headroom_shift
            )));
        }
        if self.extended_precision_bands > self.band_count {
            return Err(EqError::configuration(format!(
                "{} extended precision bands requested but only {} bands exist",
                self.extended_precision_bands, self.band_count
            )));
        }
        if let Some(gains) = &self.per_band_gain {
            if gains.len() != self.band_count {
                return Err(EqError::configuration(format!(
                    "{} band gains given for {} bands",
                    gains.len(),
                    self.band_count
                )));
            }
            if let Some(i) = gains.iter().position(|g| !g.is_finite()) {
                return Err(EqError::configuration(format!(
                    "gain of band {} is not finite",
                    i + 1
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = EqualizerConfig::default();
        assert_eq!(c.base_frequency, 100.0);
        assert_eq!(c.band_count, 6);
        assert_eq!(c.sample_rate, 16000);
        assert_eq!(c.cascade_order, 3);
        assert_eq!(c.scale_shift, 4);
        assert_eq!(c.input_headroom_shift, 2);
        assert_eq!(c.extended_precision_bands, 0);
        assert_eq!(c.gains(), vec![1.0; 6]);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_setters_chain() {
        let mut c = EqualizerConfig::default();
        c.set_base_frequency(125.0)
            .set_band_count(3)
            .set_per_band_gain(vec![0.5, 1.0, 2.0])
            .set_extended_precision_bands(1);
        assert!(c.validate().is_ok());
        assert_eq!(c.gains(), vec![0.5, 1.0, 2.0]);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let cases: Vec<Box<dyn Fn(&mut EqualizerConfig)>> = vec![
            Box::new(|c| {
                c.set_base_frequency(0.0);
            }),
            Box::new(|c| {
                c.set_base_frequency(f64::NAN);
            }),
            Box::new(|c| {
                c.set_band_count(0);
            }),
            Box::new(|c| {
                c.set_sample_rate(0);
            }),
            Box::new(|c| {
                c.set_band_count(7);
            }),
            Box::new(|c| {
                c.set_band_count(2000);
            }),
            Box::new(|c| {
                c.set_cascade_order(0);
            }),
            Box::new(|c| {
                c.set_scale_shift(32);
            }),
            Box::new(|c| {
                c.set_input_headroom_shift(31);
            }),
            Box::new(|c| {
                c.set_extended_precision_bands(7);
            }),
            Box::new(|c| {
                c.set_per_band_gain(vec![1.0; 5]);
            }),
            Box::new(|c| {
                c.set_per_band_gain(vec![1.0, 1.0, f64::INFINITY, 1.0, 1.0, 1.0]);
            }),
        ];
        for (i, mutate) in cases.iter().enumerate() {
            let mut c = EqualizerConfig::default();
            mutate(&mut c);
            assert!(
                matches!(c.validate(), Err(EqError::Configuration { .. })),
                "case {i} should be rejected"
            );
        }
    }

    #[test]
    fn test_json_kebab_case_with_defaults() {
        let c = EqualizerConfig::from_json(
            r#"{ "band-count": 4, "scale-shift": 3, "per-band-gain": [1, 0.5, 0.5, 1] }"#,
        )
        .unwrap();
        assert_eq!(c.band_count, 4);
        assert_eq!(c.scale_shift, 3);
        assert_eq!(c.sample_rate, 16000);
        assert_eq!(c.gains(), vec![1.0, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_json_unknown_key_rejected() {
        let err = EqualizerConfig::from_json(r#"{ "bands": 4 }"#).unwrap_err();
        assert!(matches!(err, EqError::Configuration { .. }));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut c = EqualizerConfig::default();
        c.set_extended_precision_bands(3);
        let text = c.to_json().unwrap();
        assert!(text.contains("extended-precision-bands"));
        assert_eq!(EqualizerConfig::from_json(&text).unwrap(), c);
    }
}

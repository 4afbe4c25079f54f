// SPDX-License-Identifier: LGPL-3.0-or-later

//! Buffered signals and the source/sink seams around the equalizer.
//!
//! The equalizer never reads or writes audio itself. A [`SignalSource`]
//! hands it a fully buffered [`Signal`] and [`SignalSink`]s receive the
//! outputs. [`ToneSource`] and [`MemorySink`] are the in-process
//! implementations used by the command line tool and the tests.

use std::f64::consts::PI;
use std::str::FromStr;

use octave_eq_lib::math::horizontal::{abs_max, rms};
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_SAMPLE_RATE, DEFAULT_TONE_DURATION, DEFAULT_TONES, MAX_TONE_DURATION};
use crate::error::{EqError, Result};
use crate::units::{samples_to_seconds, seconds_to_samples};

/// A mono, fully buffered signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl Signal {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        samples_to_seconds(f64::from(self.sample_rate), self.samples.len() as f64)
    }

    pub fn rms(&self) -> f64 {
        rms(&self.samples)
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f64 {
        abs_max(&self.samples)
    }
}

/// Produces the signal to equalize.
pub trait SignalSource {
    fn read_signal(&mut self) -> Result<Signal>;
}

/// Accepts an equalized signal.
///
/// Values may exceed `[-1, 1]`; clipping is up to the sink.
pub trait SignalSink {
    fn write_signal(&mut self, signal: &Signal) -> Result<()>;
}

/// One sinusoid of a [`ToneSource`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency: f64,
    pub amplitude: f64,
}

impl Tone {
    pub fn new(frequency: f64, amplitude: f64) -> Self {
        Self {
            frequency,
            amplitude,
        }
    }
}

impl FromStr for Tone {
    type Err = EqError;

    /// Parse `FREQ:AMP`, or just `FREQ` for unit amplitude.
    fn from_str(s: &str) -> Result<Self> {
        let parse = |v: &str, what: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| EqError::configuration(format!("invalid tone {what} '{v}': {e}")))
        };
        match s.split_once(':') {
            Some((f, a)) => Ok(Self::new(parse(f, "frequency")?, parse(a, "amplitude")?)),
            None => Ok(Self::new(parse(s, "frequency")?, 1.0)),
        }
    }
}

/// Sum of sinusoids over a fixed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSource {
    tones: Vec<Tone>,
    duration: f64,
    sample_rate: u32,
}

impl Default for ToneSource {
    /// 80 Hz at full scale plus 2000 Hz at a quarter, 0.5 s at 16 kHz.
    fn default() -> Self {
        Self {
            tones: DEFAULT_TONES
                .iter()
                .map(|&(f, a)| Tone::new(f, a))
                .collect(),
            duration: DEFAULT_TONE_DURATION,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl ToneSource {
    /// An empty (silent) source.
    pub fn new(sample_rate: u32, duration: f64) -> Self {
        Self {
            tones: Vec::new(),
            duration,
            sample_rate,
        }
    }

    pub fn add_tone(&mut self, frequency: f64, amplitude: f64) -> &mut Self {
        self.tones.push(Tone::new(frequency, amplitude));
        self
    }

    /// Replace the tone list.
    pub fn set_tones(&mut self, tones: Vec<Tone>) -> &mut Self {
        self.tones = tones;
        self
    }

    pub fn set_duration(&mut self, duration: f64) -> &mut Self {
        self.duration = duration;
        self
    }

    pub fn set_sample_rate(&mut self, sr: u32) -> &mut Self {
        self.sample_rate = sr;
        self
    }

    pub fn tones(&self) -> &[Tone] {
        &self.tones
    }

    /// Render the tones into a signal.
    pub fn generate(&self) -> Result<Signal> {
        if self.sample_rate == 0 {
            return Err(EqError::configuration("tone sample rate must be positive"));
        }
        if !(0.0..=MAX_TONE_DURATION).contains(&self.duration) {
            return Err(EqError::configuration(format!(
                "tone duration {} s outside 0..={MAX_TONE_DURATION} s",
                self.duration
            )));
        }
        if let Some(t) = self
            .tones
            .iter()
            .find(|t| !t.frequency.is_finite() || !t.amplitude.is_finite())
        {
            return Err(EqError::configuration(format!(
                "invalid tone {} Hz at {}",
                t.frequency, t.amplitude
            )));
        }

        let sr = f64::from(self.sample_rate);
        let len = seconds_to_samples(sr, self.duration).round() as usize;
        let samples: Vec<f64> = (0..len)
            .map(|n| {
                let t = n as f64 / sr;
                self.tones
                    .iter()
                    .map(|tone| tone.amplitude * (2.0 * PI * tone.frequency * t).sin())
                    .sum::<f64>()
            })
            .collect();
        Ok(Signal::new(samples, self.sample_rate))
    }
}

impl SignalSource for ToneSource {
    fn read_signal(&mut self) -> Result<Signal> {
        self.generate()
    }
}

/// Keeps every signal it receives.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    signals: Vec<Signal>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Most recently written signal.
    pub fn last(&self) -> Option<&Signal> {
        self.signals.last()
    }

    pub fn into_signals(self) -> Vec<Signal> {
        self.signals
    }
}

impl SignalSink for MemorySink {
    fn write_signal(&mut self, signal: &Signal) -> Result<()> {
        self.signals.push(signal.clone());
        Ok(())
    }
}

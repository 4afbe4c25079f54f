// SPDX-License-Identifier: LGPL-3.0-or-later

//! Octave equalizer pipeline.
//!
//! [`OctaveEqualizer::new`] does all design-time work up front: it validates
//! the configuration, plans the bands, designs and quantizes every band, and
//! builds the filter bank. Any failure surfaces there, before a single
//! sample is filtered. [`OctaveEqualizer::process`] then filters a signal on
//! both paths and mixes each path back into one signal.

use log::{info, warn};
use octave_eq_lib::math::horizontal::{abs_diff_max, diff_rms};

use super::bank::{BandChannel, FilterBank};
use super::butterworth::BandpassDesigner;
use super::cascade::FixedKernel;
use super::mixer::BandMixer;
use super::planner::{BandPlan, BandPlanner};
use super::quantizer::{FixedPointCascade, FixedPointQuantizer};
use super::sos::SosCascade;
use crate::config::EqualizerConfig;
use crate::consts::EXTENDED_PRECISION_HINT_HZ;
use crate::error::{EqError, Result};
use crate::signal::{Signal, SignalSink, SignalSource};

/// Outputs of one equalizer run.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualizerOutput {
    /// Mix of the float bands.
    pub float_path: Signal,
    /// Mix of the fixed-point bands.
    pub fixed_path: Signal,
    /// Float output of every band, lowest first.
    pub float_bands: Vec<Signal>,
    /// Fixed-point output of every band, lowest first.
    pub fixed_bands: Vec<Signal>,
}

impl EqualizerOutput {
    pub fn band_count(&self) -> usize {
        self.float_bands.len()
    }

    /// Largest sample-wise difference between the two mixed paths.
    pub fn max_abs_difference(&self) -> f64 {
        abs_diff_max(self.float_path.samples(), self.fixed_path.samples())
    }

    /// RMS of the difference between the two mixed paths.
    pub fn rms_difference(&self) -> f64 {
        diff_rms(self.float_path.samples(), self.fixed_path.samples())
    }

    /// Largest sample-wise difference between the paths of one band.
    ///
    /// `band` is the 1-based band index; `None` if no such band exists.
    pub fn band_difference(&self, band: usize) -> Option<f64> {
        let i = band.checked_sub(1)?;
        let f = self.float_bands.get(i)?;
        let x = self.fixed_bands.get(i)?;
        Some(abs_diff_max(f.samples(), x.samples()))
    }

    /// [`band_difference`](Self::band_difference) for every band in order.
    pub fn band_differences(&self) -> Vec<f64> {
        self.float_bands
            .iter()
            .zip(&self.fixed_bands)
            .map(|(f, x)| abs_diff_max(f.samples(), x.samples()))
            .collect()
    }
}

/// Octave-band filter bank with a float reference path and a Q31 path.
///
/// # Examples
///
/// ```
/// use octave_eq_units::config::EqualizerConfig;
/// use octave_eq_units::filters::equalizer::OctaveEqualizer;
/// use octave_eq_units::signal::ToneSource;
///
/// let mut eq = OctaveEqualizer::new(EqualizerConfig::default()).unwrap();
/// let signal = ToneSource::default().generate().unwrap();
/// let out = eq.process(&signal).unwrap();
/// assert_eq!(out.band_count(), 6);
/// assert!(out.max_abs_difference() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct OctaveEqualizer {
    config: EqualizerConfig,
    plan: BandPlan,
    float_cascades: Vec<SosCascade>,
    fixed_cascades: Vec<FixedPointCascade>,
    bank: FilterBank,
    mixer: BandMixer,
}

impl OctaveEqualizer {
    /// Plan, design and quantize every band of `config`.
    pub fn new(config: EqualizerConfig) -> Result<Self> {
        config.validate()?;
        let plan = BandPlanner::from_config(&config).plan()?;
        let designer = BandpassDesigner::from_config(&config);
        let quantizer = FixedPointQuantizer::from_config(&config)?;

        let float_cascades = plan
            .bands()
            .iter()
            .map(|b| designer.design_band(b))
            .collect::<Result<Vec<_>>>()?;
        let fixed_cascades = float_cascades
            .iter()
            .map(|c| quantizer.quantize(c))
            .collect::<Result<Vec<_>>>()?;

        let extended = config.extended_precision_bands;
        if let Some(b) = plan.bands()[..extended]
            .iter()
            .find(|b| b.center > EXTENDED_PRECISION_HINT_HZ)
        {
            warn!(
                "extended precision requested up to band {extended}, but band {} is centred at \
                 {:.1} Hz where the standard kernel is accurate enough",
                b.index, b.center
            );
        }
        if config.input_headroom_shift == 0 {
            warn!("no input headroom: full-scale input will be rejected by the fixed path");
        }

        let channels = plan
            .bands()
            .iter()
            .zip(float_cascades.iter().zip(&fixed_cascades))
            .enumerate()
            .map(|(i, (band, (float, fixed)))| {
                let kernel = if i < extended {
                    FixedKernel::Extended
                } else {
                    FixedKernel::Standard
                };
                BandChannel::new(*band, float, fixed, kernel, config.input_headroom_shift)
            })
            .collect::<Result<Vec<_>>>()?;
        let bank = FilterBank::new(config.sample_rate, channels)?;
        let mixer = BandMixer::new(config.gains());

        info!(
            "designed {} bands of order {} at {} Hz (scale shift {}, {} extended)",
            plan.len(),
            config.cascade_order,
            config.sample_rate,
            config.scale_shift,
            extended
        );

        Ok(Self {
            config,
            plan,
            float_cascades,
            fixed_cascades,
            bank,
            mixer,
        })
    }

    pub fn config(&self) -> &EqualizerConfig {
        &self.config
    }

    pub fn plan(&self) -> &BandPlan {
        &self.plan
    }

    /// Float cascades, lowest band first.
    pub fn float_cascades(&self) -> &[SosCascade] {
        &self.float_cascades
    }

    /// Quantized cascades, lowest band first.
    pub fn fixed_cascades(&self) -> &[FixedPointCascade] {
        &self.fixed_cascades
    }

    pub fn bank(&self) -> &FilterBank {
        &self.bank
    }

    /// Filter `signal` through every band on both paths and mix each path.
    pub fn process(&mut self, signal: &Signal) -> Result<EqualizerOutput> {
        if signal.sample_rate() != self.config.sample_rate {
            return Err(EqError::configuration(format!(
                "signal sample rate {} Hz differs from the configured {} Hz",
                signal.sample_rate(),
                self.config.sample_rate
            )));
        }
        let bands = self.bank.process(signal)?;
        let float_path = self.mixer.mix(&bands.float_bands)?;
        let fixed_path = self.mixer.mix(&bands.fixed_bands)?;

        let output = EqualizerOutput {
            float_path,
            fixed_path,
            float_bands: bands.float_bands,
            fixed_bands: bands.fixed_bands,
        };
        info!(
            "processed {} samples: float rms {:.6}, fixed rms {:.6}, max difference {:.3e}",
            signal.len(),
            output.float_path.rms(),
            output.fixed_path.rms(),
            output.max_abs_difference()
        );
        Ok(output)
    }

    /// Read one signal from `source`, process it and hand each mixed path to
    /// its sink.
    pub fn run<S, F, X>(
        &mut self,
        source: &mut S,
        float_sink: &mut F,
        fixed_sink: &mut X,
    ) -> Result<EqualizerOutput>
    where
        S: SignalSource + ?Sized,
        F: SignalSink + ?Sized,
        X: SignalSink + ?Sized,
    {
        let signal = source.read_signal()?;
        let output = self.process(&signal)?;
        float_sink.write_signal(&output.float_path)?;
        fixed_sink.write_signal(&output.fixed_path)?;
        Ok(output)
    }
}

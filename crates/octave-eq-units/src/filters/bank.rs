// SPDX-License-Identifier: LGPL-3.0-or-later

//! Filter bank: one float and one fixed-point engine per band.
//!
//! Channels are stored in band order and each owns its registers, so bands
//! can be filtered in any order (or in parallel with the `parallel`
//! feature) and still be handed to the mixer in band order.

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{EqError, Result};
use crate::filters::cascade::{CascadeEngine, FixedCascadeEngine, FixedKernel, FloatCascadeEngine};
use crate::filters::planner::Band;
use crate::filters::quantizer::FixedPointCascade;
use crate::filters::sos::SosCascade;
use crate::signal::Signal;

/// Both engines for one band.
#[derive(Debug, Clone)]
pub struct BandChannel {
    band: Band,
    float: FloatCascadeEngine,
    fixed: FixedCascadeEngine,
}

impl BandChannel {
    /// Build the engines for `band`.
    pub fn new(
        band: Band,
        float: &SosCascade,
        fixed: &FixedPointCascade,
        kernel: FixedKernel,
        input_shift: u32,
    ) -> Result<Self> {
        if float.band() != band.index || fixed.band() != band.index {
            return Err(EqError::internal(format!(
                "band {} given cascades for bands {} and {}",
                band.index,
                float.band(),
                fixed.band()
            )));
        }
        Ok(Self {
            band,
            float: FloatCascadeEngine::new(float),
            fixed: FixedCascadeEngine::new(fixed, kernel, input_shift)?,
        })
    }

    pub fn band(&self) -> &Band {
        &self.band
    }

    pub fn kernel(&self) -> FixedKernel {
        self.fixed.kernel()
    }

    /// Filter one buffer on both paths from zeroed registers.
    fn run(&mut self, samples: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        let float = self.float.run(samples)?;
        let fixed = self.fixed.run(samples)?;
        debug!("band {} filtered {} samples", self.band.index, samples.len());
        Ok((float, fixed))
    }
}

/// Per-band outputs of both paths, in band order.
#[derive(Debug, Clone, PartialEq)]
pub struct BankOutput {
    pub float_bands: Vec<Signal>,
    pub fixed_bands: Vec<Signal>,
}

/// Arena of band channels.
#[derive(Debug, Clone)]
pub struct FilterBank {
    channels: Vec<BandChannel>,
    sample_rate: u32,
}

impl FilterBank {
    /// Create a bank from channels given in band order.
    pub fn new(sample_rate: u32, channels: Vec<BandChannel>) -> Result<Self> {
        if let Some(w) = channels.windows(2).find(|w| w[0].band.index >= w[1].band.index) {
            return Err(EqError::internal(format!(
                "bank channels out of order: band {} before band {}",
                w[0].band.index, w[1].band.index
            )));
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> &[BandChannel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Filter `signal` through every band on both paths.
    ///
    /// Registers are zeroed first. The first failing band, in band order,
    /// aborts the run.
    pub fn process(&mut self, signal: &Signal) -> Result<BankOutput> {
        if signal.sample_rate() != self.sample_rate {
            return Err(EqError::configuration(format!(
                "signal sample rate {} Hz differs from the bank's {} Hz",
                signal.sample_rate(),
                self.sample_rate
            )));
        }
        let samples = signal.samples();

        #[cfg(feature = "parallel")]
        let results: Vec<(Vec<f64>, Vec<f64>)> = {
            let all: Vec<Result<(Vec<f64>, Vec<f64>)>> = self
                .channels
                .par_iter_mut()
                .map(|c| c.run(samples))
                .collect();
            all.into_iter().collect::<Result<_>>()?
        };

        #[cfg(not(feature = "parallel"))]
        let results: Vec<(Vec<f64>, Vec<f64>)> = self
            .channels
            .iter_mut()
            .map(|c| c.run(samples))
            .collect::<Result<_>>()?;

        let (float_bands, fixed_bands) = results
            .into_iter()
            .map(|(f, x)| {
                (
                    Signal::new(f, self.sample_rate),
                    Signal::new(x, self.sample_rate),
                )
            })
            .unzip();
        Ok(BankOutput {
            float_bands,
            fixed_bands,
        })
    }
}

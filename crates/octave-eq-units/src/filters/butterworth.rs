// SPDX-License-Identifier: LGPL-3.0-or-later

//! Digital Butterworth bandpass design as a cascade of second-order
//! sections.
//!
//! Butterworth filters are maximally flat in the passband. A bandpass of
//! order N has 2N poles and is factored into N sections, with a -3 dB
//! response at both edges.
//!
//! The design goes through the analog prototype:
//!
//! 1. lowpass prototype poles at `-exp(j*pi*m/(2N))`, `m = -N+1, -N+3, ..., N-1`
//! 2. edge pre-warping for a bilinear transform at `fs = 2`
//!    (`w = 4*tan(pi*wn/2)`, `wn` normalised by Nyquist)
//! 3. lowpass to bandpass: each pole `p` becomes
//!    `p*bw/2 +- sqrt((p*bw/2)^2 - w0^2)`, with N zeros at the origin
//! 4. bilinear transform and nearest-pairing factorisation

use std::f64::consts::PI;

use log::debug;
use num_complex::Complex64;

use crate::config::EqualizerConfig;
use crate::error::{EqError, Result};
use crate::filters::planner::Band;
use crate::filters::sos::{SosCascade, Zpk};
use crate::units::{normalized_frequency, nyquist};

/// Sampling frequency the normalised design is carried out at.
const DESIGN_FS: f64 = 2.0;

/// Designs Butterworth bandpass cascades for one sample rate and order.
///
/// # Examples
///
/// ```
/// use octave_eq_units::filters::butterworth::BandpassDesigner;
///
/// let designer = BandpassDesigner::new(16000.0, 3);
/// let cascade = designer.design(1, 70.7, 141.4).unwrap();
/// assert_eq!(cascade.order(), 3);
/// assert!(cascade.is_stable());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BandpassDesigner {
    sample_rate: f64,
    order: usize,
}

impl BandpassDesigner {
    pub fn new(sample_rate: f64, order: usize) -> Self {
        Self { sample_rate, order }
    }

    pub fn from_config(config: &EqualizerConfig) -> Self {
        Self::new(f64::from(config.sample_rate), config.cascade_order)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of sections per designed cascade.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Design the cascade for a planned band.
    pub fn design_band(&self, band: &Band) -> Result<SosCascade> {
        self.design(band.index, band.low_edge, band.high_edge)
    }

    /// Design a bandpass between `low_edge` and `high_edge` (Hz).
    ///
    /// `band` only labels the result and any error.
    pub fn design(&self, band: usize, low_edge: f64, high_edge: f64) -> Result<SosCascade> {
        self.check_inputs(band, low_edge, high_edge)?;

        let n = self.order;
        let warp = |edge: f64| {
            let wn = normalized_frequency(self.sample_rate, edge);
            2.0 * DESIGN_FS * (PI * wn / DESIGN_FS).tan()
        };
        let w_lo = warp(low_edge);
        let w_hi = warp(high_edge);

        let analog = lowpass_to_bandpass(&butterworth_prototype(n), w_hi - w_lo, (w_lo * w_hi).sqrt());
        let digital = analog.bilinear(DESIGN_FS);
        let cascade = SosCascade::from_zpk(band, &digital)?;

        if cascade.order() != n {
            return Err(EqError::design(
                band,
                format!("expected {n} sections, factorisation gave {}", cascade.order()),
            ));
        }
        for (stage, c) in cascade.stages().iter().enumerate() {
            if !c.is_finite() {
                return Err(EqError::design(
                    band,
                    format!("stage {stage} has non-finite coefficients"),
                ));
            }
            if !c.is_stable() {
                return Err(EqError::design(
                    band,
                    format!("stage {stage} has poles on or outside the unit circle"),
                ));
            }
            debug!(
                "band {band} stage {stage}: b = [{:.12e}, {:.12e}, {:.12e}], a = [1, {:.12e}, {:.12e}]",
                c.b0, c.b1, c.b2, c.a1, c.a2
            );
        }

        Ok(cascade)
    }

    fn check_inputs(&self, band: usize, low_edge: f64, high_edge: f64) -> Result<()> {
        if self.order == 0 {
            return Err(EqError::design(band, "order must be at least 1"));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(EqError::design(
                band,
                format!("invalid sample rate {}", self.sample_rate),
            ));
        }
        if !low_edge.is_finite() || !high_edge.is_finite() || low_edge <= 0.0 {
            return Err(EqError::design(
                band,
                format!("invalid edges {low_edge}..{high_edge} Hz"),
            ));
        }
        if low_edge >= high_edge {
            return Err(EqError::design(
                band,
                format!("low edge {low_edge} Hz is not below high edge {high_edge} Hz"),
            ));
        }
        let nyq = nyquist(self.sample_rate);
        if high_edge >= nyq {
            return Err(EqError::design(
                band,
                format!("high edge {high_edge} Hz reaches Nyquist ({nyq} Hz)"),
            ));
        }
        Ok(())
    }
}

/// Analog Butterworth lowpass prototype of order `n` (unit cutoff).
fn butterworth_prototype(n: usize) -> Zpk {
    let poles = (0..n)
        .map(|k| {
            let m = 2.0 * k as f64 - (n as f64 - 1.0);
            -Complex64::from_polar(1.0, PI * m / (2.0 * n as f64))
        })
        .collect();
    Zpk::new(Vec::new(), poles, 1.0)
}

/// Transform a lowpass prototype to a bandpass of width `bw` centred on `w0`.
fn lowpass_to_bandpass(proto: &Zpk, bw: f64, w0: f64) -> Zpk {
    let degree = proto.poles.len().saturating_sub(proto.zeros.len());
    let w0_sq = Complex64::from(w0 * w0);
    let split = |roots: &[Complex64]| -> Vec<Complex64> {
        let scaled: Vec<Complex64> = roots.iter().map(|&r| r * (bw / 2.0)).collect();
        let upper = scaled.iter().map(|&r| r + (r * r - w0_sq).sqrt());
        let lower = scaled.iter().map(|&r| r - (r * r - w0_sq).sqrt());
        upper.chain(lower).collect()
    };

    let mut zeros = split(&proto.zeros);
    zeros.extend(std::iter::repeat_n(Complex64::new(0.0, 0.0), degree));
    let poles = split(&proto.poles);
    let gain = proto.gain * bw.powi(degree as i32);
    Zpk::new(zeros, poles, gain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::planner::BandPlanner;
    use crate::units::gain_to_db;

    const SR: f64 = 16000.0;

    #[test]
    fn test_prototype_poles_on_unit_circle() {
        for n in 1..=6 {
            let proto = butterworth_prototype(n);
            assert_eq!(proto.poles.len(), n);
            for p in &proto.poles {
                assert!((p.norm() - 1.0).abs() < 1e-12);
                assert!(p.re < 0.0, "Order {n}: pole {p} not in left half-plane");
            }
        }
        // First order: the single pole sits at -1
        let p = butterworth_prototype(1).poles[0];
        assert!((p.re + 1.0).abs() < 1e-15 && p.im.abs() < 1e-15);
    }

    #[test]
    fn test_edges_at_minus_3db() {
        for order in 1..=6 {
            let designer = BandpassDesigner::new(SR, order);
            let cascade = designer.design(1, 400.0, 800.0).unwrap();
            for edge in [400.0, 800.0] {
                let mag_db = gain_to_db(cascade.magnitude_at(edge, SR));
                assert!(
                    (mag_db - (-3.0103)).abs() < 0.01,
                    "Order {order} edge {edge} Hz: expected ~-3dB, got {mag_db:.4}dB"
                );
            }
        }
    }

    #[test]
    fn test_flat_passband_and_stopband() {
        let cascade = BandpassDesigner::new(SR, 3)
            .design(3, 282.842712, 565.685425)
            .unwrap();
        let mid_db = gain_to_db(cascade.magnitude_at(400.0, SR));
        assert!(mid_db.abs() < 0.05, "centre gain {mid_db:.4}dB");

        // Two octaves away the third-order band is far down
        for f in [100.0, 1600.0] {
            let db = gain_to_db(cascade.magnitude_at(f, SR));
            assert!(db < -30.0, "{f} Hz only {db:.1}dB down");
        }
        // Zeros at DC and Nyquist
        assert!(cascade.magnitude_at(0.0, SR) < 1e-9);
        assert!(cascade.magnitude_at(SR / 2.0, SR) < 1e-9);
    }

    #[test]
    fn test_every_reference_band_is_stable() {
        let plan = BandPlanner::new(100.0, 6, SR).plan().unwrap();
        let designer = BandpassDesigner::new(SR, 3);
        for band in plan.bands() {
            let cascade = designer.design_band(band).unwrap();
            assert_eq!(cascade.band(), band.index);
            assert_eq!(cascade.order(), 3);
            assert!(cascade.is_stable(), "band {} unstable", band.index);
            for c in cascade.stages() {
                // Poles strictly inside: |p|^2 = a2 for complex pairs
                assert!(c.a2 < 1.0 && c.a2 > 0.0);
            }
        }
    }

    #[test]
    fn test_lowest_band_section_shape() {
        // Worst poles sit near z = +1, so the last section gets both zeros there
        let cascade = BandpassDesigner::new(SR, 3)
            .design(1, 70.710678, 141.421356)
            .unwrap();
        let s = cascade.stages();
        assert_eq!([s[2].b0, s[2].b1, s[2].b2], [1.0, -2.0, 1.0]);
        assert_eq!([s[1].b0, s[1].b1, s[1].b2], [1.0, 0.0, -1.0]);
        let k = s[0].b0;
        assert!(k > 0.0 && k < 1e-5, "gain {k}");
        assert_eq!(s[0].b1, 2.0 * k);
        assert_eq!(s[0].b2, k);
        // Low-frequency feedback term close to -2
        assert!(s.iter().all(|c| c.a1 < -1.9));
    }

    #[test]
    fn test_design_errors() {
        let designer = BandpassDesigner::new(SR, 3);
        for (lo, hi) in [
            (800.0, 400.0),
            (400.0, 400.0),
            (0.0, 400.0),
            (-10.0, 400.0),
            (400.0, 8000.0),
            (400.0, 9000.0),
            (f64::NAN, 400.0),
        ] {
            let err = designer.design(2, lo, hi).unwrap_err();
            assert!(
                matches!(err, EqError::Design { band: 2, .. }),
                "({lo}, {hi}) gave {err:?}"
            );
        }

        let err = BandpassDesigner::new(SR, 0).design(5, 400.0, 800.0).unwrap_err();
        assert!(matches!(err, EqError::Design { band: 5, .. }));
    }

    #[test]
    fn test_frequency_response_shape() {
        let cascade = BandpassDesigner::new(SR, 3).design(1, 400.0, 800.0).unwrap();
        let resp = cascade.frequency_response(SR, 256);
        assert_eq!(resp.len(), 256);
        assert_eq!(resp[0].0, 0.0);
        let (peak_f, _) = resp
            .iter()
            .map(|(f, h)| (*f, h.norm()))
            .fold((0.0, 0.0), |acc, x| if x.1 > acc.1 { x } else { acc });
        assert!((400.0..=800.0).contains(&peak_f), "peak at {peak_f} Hz");
    }
}

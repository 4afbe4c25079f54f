// SPDX-License-Identifier: LGPL-3.0-or-later

//! Zero-pole-gain systems and their factorisation into second-order
//! sections.
//!
//! Pairing follows the "nearest" strategy: the pole closest to the unit
//! circle is taken first and given the zeros nearest to it, and sections
//! are filled from last to first so the most resonant section runs last.
//! The overall gain is folded into the first section's numerator.

use std::f64::consts::PI;

use num_complex::Complex64;
use octave_eq_lib::types::Biquad;

use crate::error::{EqError, Result};
use crate::units::nyquist;

/// Relative tolerance below which an imaginary part counts as zero.
const REAL_TOLERANCE: f64 = 100.0 * f64::EPSILON;

/// A system in zero-pole-gain form.
#[derive(Debug, Clone, PartialEq)]
pub struct Zpk {
    pub zeros: Vec<Complex64>,
    pub poles: Vec<Complex64>,
    pub gain: f64,
}

impl Zpk {
    pub fn new(zeros: Vec<Complex64>, poles: Vec<Complex64>, gain: f64) -> Self {
        Self { zeros, poles, gain }
    }

    /// Map an analog system to the z-plane with the bilinear transform.
    ///
    /// `fs` is the sampling frequency the analog frequencies were warped
    /// for. Zeros at infinity land at `z = -1`.
    pub fn bilinear(&self, fs: f64) -> Zpk {
        let fs2 = Complex64::from(2.0 * fs);
        let degree = self.poles.len().saturating_sub(self.zeros.len());

        let mut zeros: Vec<Complex64> = self.zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
        zeros.extend(std::iter::repeat_n(Complex64::new(-1.0, 0.0), degree));
        let poles = self.poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();

        let num: Complex64 = self.zeros.iter().map(|&z| fs2 - z).product();
        let den: Complex64 = self.poles.iter().map(|&p| fs2 - p).product();
        let gain = self.gain * (num / den).re;

        Zpk { zeros, poles, gain }
    }

    /// Factor into second-order sections using nearest pairing.
    ///
    /// Complex roots must come in conjugate pairs. Returns `None` when
    /// they do not.
    pub fn to_sos(&self) -> Option<Vec<Biquad<f64>>> {
        let mut zeros = self.zeros.clone();
        let mut poles = self.poles.clone();
        let origin = Complex64::new(0.0, 0.0);

        if poles.len() < zeros.len() {
            poles.resize(zeros.len(), origin);
        }
        if zeros.len() < poles.len() {
            zeros.resize(poles.len(), origin);
        }
        let n_sections = poles.len().div_ceil(2);
        if poles.len() % 2 == 1 {
            poles.push(origin);
            zeros.push(origin);
        }

        let mut p = split_conjugates(&poles)?;
        let mut z = split_conjugates(&zeros)?;
        let mut sections = vec![Biquad::default(); n_sections];

        for section in sections.iter_mut().rev() {
            // Worst remaining pole: closest to the unit circle
            let p1_idx = p
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    (1.0 - a.norm()).abs().total_cmp(&(1.0 - b.norm()).abs())
                })
                .map(|(i, _)| i)?;
            let p1 = p.remove(p1_idx);
            let real_poles_left = p.iter().filter(|c| is_real(c)).count();
            let real_zeros_left = z.iter().filter(|c| is_real(c)).count();

            *section = if is_real(&p1) && real_poles_left == 0 {
                // Last real pole: one real zero, padded with the origin
                let z1 = z.remove(nearest(&z, p1, RootKind::Real)?);
                from_roots(&[z1, origin], &[p1, origin])
            } else if p.len() + 1 == z.len()
                && !is_real(&p1)
                && real_poles_left == 1
                && real_zeros_left == 1
            {
                // Keep the last real zero for the last real pole
                let z1 = z.remove(nearest(&z, p1, RootKind::Complex)?);
                from_roots(&[z1, z1.conj()], &[p1, p1.conj()])
            } else {
                let p2 = if is_real(&p1) {
                    let idx = p
                        .iter()
                        .enumerate()
                        .filter(|(_, c)| is_real(c))
                        .min_by(|(_, a), (_, b)| {
                            (a.norm() - 1.0).abs().total_cmp(&(b.norm() - 1.0).abs())
                        })
                        .map(|(i, _)| i)?;
                    p.remove(idx)
                } else {
                    p1.conj()
                };

                match nearest(&z, p1, RootKind::Any) {
                    None => from_roots(&[], &[p1, p2]),
                    Some(z1_idx) => {
                        let z1 = z.remove(z1_idx);
                        if !is_real(&z1) {
                            from_roots(&[z1, z1.conj()], &[p1, p2])
                        } else if z.is_empty() {
                            from_roots(&[z1], &[p1, p2])
                        } else {
                            let z2 = z.remove(nearest(&z, p1, RootKind::Real)?);
                            from_roots(&[z1, z2], &[p1, p2])
                        }
                    }
                }
            };
        }

        if !p.is_empty() || !z.is_empty() {
            return None;
        }
        if let Some(first) = sections.first_mut() {
            first.b0 *= self.gain;
            first.b1 *= self.gain;
            first.b2 *= self.gain;
        }
        Some(sections)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootKind {
    Real,
    Complex,
    Any,
}

fn is_real(c: &Complex64) -> bool {
    c.im.abs() <= REAL_TOLERANCE * c.norm()
}

/// Index of the root of the requested kind nearest to `to`.
fn nearest(roots: &[Complex64], to: Complex64, kind: RootKind) -> Option<usize> {
    roots
        .iter()
        .enumerate()
        .filter(|(_, r)| match kind {
            RootKind::Real => is_real(r),
            RootKind::Complex => !is_real(r),
            RootKind::Any => true,
        })
        .min_by(|(_, a), (_, b)| (*a - to).norm().total_cmp(&(*b - to).norm()))
        .map(|(i, _)| i)
}

/// Keep one root per conjugate pair (positive imaginary part) followed by
/// the real roots, each group sorted by real part.
fn split_conjugates(roots: &[Complex64]) -> Option<Vec<Complex64>> {
    let mut real = Vec::new();
    let mut upper = Vec::new();
    let mut lower = 0usize;
    for r in roots {
        if is_real(r) {
            real.push(Complex64::new(r.re, 0.0));
        } else if r.im > 0.0 {
            upper.push(*r);
        } else {
            lower += 1;
        }
    }
    if upper.len() != lower {
        return None;
    }
    upper.sort_by(|a, b| a.re.total_cmp(&b.re).then(a.im.total_cmp(&b.im)));
    real.sort_by(|a, b| a.re.total_cmp(&b.re));
    upper.extend(real);
    Some(upper)
}

/// Monic real polynomial with the given (at most two) roots, right aligned
/// into three taps.
fn poly3(roots: &[Complex64]) -> [f64; 3] {
    match roots {
        [] => [0.0, 0.0, 1.0],
        [r] => [0.0, 1.0, -r.re],
        [r1, r2] => [1.0, -(r1 + r2).re, (r1 * r2).re],
        _ => [f64::NAN; 3],
    }
}

fn from_roots(zeros: &[Complex64], poles: &[Complex64]) -> Biquad<f64> {
    let [b0, b1, b2] = poly3(zeros);
    let [_, a1, a2] = poly3(poles);
    Biquad { b0, b1, b2, a1, a2 }
}

/// Cascade of float sections designed for one band.
///
/// Sections use the standard denominator `1 + a1*z^-1 + a2*z^-2`.
#[derive(Debug, Clone, PartialEq)]
pub struct SosCascade {
    band: usize,
    stages: Vec<Biquad<f64>>,
}

impl SosCascade {
    pub fn new(band: usize, stages: Vec<Biquad<f64>>) -> Self {
        Self { band, stages }
    }

    /// Factor a digital zero-pole-gain system for `band`.
    pub fn from_zpk(band: usize, zpk: &Zpk) -> Result<Self> {
        let stages = zpk
            .to_sos()
            .ok_or_else(|| EqError::design(band, "roots are not in conjugate pairs"))?;
        Ok(Self { band, stages })
    }

    pub fn band(&self) -> usize {
        self.band
    }

    pub fn stages(&self) -> &[Biquad<f64>] {
        &self.stages
    }

    /// Number of sections.
    pub fn order(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if every section has its poles inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.stages.iter().all(Biquad::is_stable)
    }

    /// Complex response at `freq` Hz.
    pub fn response_at(&self, freq: f64, sample_rate: f64) -> Complex64 {
        let w = 2.0 * PI * freq / sample_rate;
        let z1 = Complex64::from_polar(1.0, -w);
        let z2 = z1 * z1;
        self.stages
            .iter()
            .map(|c| (c.b0 + z1 * c.b1 + z2 * c.b2) / (1.0 + z1 * c.a1 + z2 * c.a2))
            .product()
    }

    /// Magnitude response at `freq` Hz.
    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        self.response_at(freq, sample_rate).norm()
    }

    /// Response at `points` frequencies evenly spaced over `[0, Nyquist)`,
    /// as `(frequency Hz, response)` pairs.
    pub fn frequency_response(&self, sample_rate: f64, points: usize) -> Vec<(f64, Complex64)> {
        let nyq = nyquist(sample_rate);
        (0..points)
            .map(|k| {
                let f = nyq * k as f64 / points as f64;
                (f, self.response_at(f, sample_rate))
            })
            .collect()
    }
}

// SPDX-License-Identifier: LGPL-3.0-or-later
//
// A/B tests: compare the Q31 path of every band against the f64 reference
// path on the same input.
//
// The float path runs the unquantized f64 design and the fixed path its Q31
// quantization, so the differences come from coefficient rounding and
// fixed-point arithmetic. Sample-wise they must stay below 1e-3 on every
// band and on the mix.

use std::f64::consts::PI;

use octave_eq_units::config::EqualizerConfig;
use octave_eq_units::filters::cascade::{
    CascadeEngine, FixedCascadeEngine, FixedKernel, FloatCascadeEngine,
};
use octave_eq_units::filters::equalizer::OctaveEqualizer;
use octave_eq_units::signal::{Signal, ToneSource};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

const SR: u32 = 16000;
const TOLERANCE: f64 = 1e-3;

fn noise(len: usize, amplitude: f64, seed: u64) -> Signal {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let samples = (0..len)
        .map(|_| rng.gen_range(-amplitude..amplitude))
        .collect();
    Signal::new(samples, SR)
}

fn sine(freq: f64, amplitude: f64, len: usize) -> Signal {
    let samples = (0..len)
        .map(|n| amplitude * (2.0 * PI * freq * n as f64 / f64::from(SR)).sin())
        .collect();
    Signal::new(samples, SR)
}

fn assert_paths_agree(config: EqualizerConfig, signal: &Signal) {
    let mut eq = OctaveEqualizer::new(config).unwrap();
    let out = eq.process(signal).unwrap();
    for (i, d) in out.band_differences().iter().enumerate() {
        assert!(*d < TOLERANCE, "band {}: max difference {d}", i + 1);
    }
    assert!(
        out.max_abs_difference() < TOLERANCE,
        "mix: max difference {}",
        out.max_abs_difference()
    );
}

#[test]
fn ab_default_tones() {
    let signal = ToneSource::default().generate().unwrap();
    assert_paths_agree(EqualizerConfig::default(), &signal);
}

#[test]
fn ab_default_tones_extended_kernel() {
    let mut config = EqualizerConfig::default();
    config.set_extended_precision_bands(3);
    let signal = ToneSource::default().generate().unwrap();
    assert_paths_agree(config, &signal);
}

#[test]
fn ab_white_noise() {
    let signal = noise(SR as usize, 0.9, 0x5EED);
    assert_paths_agree(EqualizerConfig::default(), &signal);
}

#[test]
fn ab_band_centre_sweep() {
    for k in 0..6 {
        let freq = 100.0 * f64::from(1u32 << k);
        assert_paths_agree(EqualizerConfig::default(), &sine(freq, 0.9, 8000));
    }
}

#[test]
fn ab_alternate_layouts() {
    let layouts = [
        (125.0, 5, 16000, 2, 3),
        (250.0, 7, 48000, 3, 4),
        (250.0, 3, 16000, 4, 2),
    ];
    for (base, bands, sr, order, shift) in layouts {
        let mut config = EqualizerConfig::default();
        config
            .set_base_frequency(base)
            .set_band_count(bands)
            .set_sample_rate(sr)
            .set_cascade_order(order)
            .set_scale_shift(shift);
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(sr) + bands as u64);
        let samples = (0..8000).map(|_| rng.gen_range(-0.5..0.5)).collect();
        assert_paths_agree(config, &Signal::new(samples, sr));
    }
}

#[test]
fn ab_extended_kernel_is_closer_to_float() {
    let config = EqualizerConfig::default();
    let eq = OctaveEqualizer::new(config).unwrap();
    let signal = noise(8000, 0.5, 7);

    // Comparing against the dequantized cascade leaves only kernel
    // arithmetic in the difference. Band 1 has the poles closest to z = 1.
    let float = &eq.float_cascades()[0];
    let fixed = &eq.fixed_cascades()[0];
    let reference = FloatCascadeEngine::new(float)
        .run(signal.samples())
        .unwrap();
    let dequantized = FloatCascadeEngine::new(&fixed.dequantize())
        .run(signal.samples())
        .unwrap();

    let err = |kernel| {
        let out = FixedCascadeEngine::new(fixed, kernel, 2)
            .unwrap()
            .run(signal.samples())
            .unwrap();
        out.iter()
            .zip(&dequantized)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f64, f64::max)
    };
    let standard = err(FixedKernel::Standard);
    let extended = err(FixedKernel::Extended);
    assert!(extended < standard, "extended {extended} vs standard {standard}");

    let drift = reference
        .iter()
        .zip(&dequantized)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f64, f64::max);
    assert!(drift < TOLERANCE, "coefficient rounding drift {drift}");
}

// SPDX-License-Identifier: LGPL-3.0-or-later

//! `octave-eq`: run the octave equalizer on a tone signal and compare the
//! float and Q31 paths.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use octave_eq_units::config::EqualizerConfig;
use octave_eq_units::consts::DEFAULT_RESPONSE_POINTS;
use octave_eq_units::export::{band_table, q31_table, response_csv};
use octave_eq_units::filters::equalizer::{EqualizerOutput, OctaveEqualizer};
use octave_eq_units::signal::{MemorySink, Tone, ToneSource};
use octave_eq_units::units::db_to_gain;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file; command line options override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Centre of the first band in Hz
    #[arg(short, long)]
    base_frequency: Option<f64>,

    /// Number of octave bands
    #[arg(short = 'n', long)]
    bands: Option<usize>,

    /// Sample rate in Hz
    #[arg(short = 'r', long)]
    sample_rate: Option<u32>,

    /// Second-order sections per band
    #[arg(short, long)]
    order: Option<usize>,

    /// Coefficients are divided by 2^SHIFT before Q31 conversion
    #[arg(long, value_name = "SHIFT")]
    scale_shift: Option<u32>,

    /// Fixed-path input is divided by 2^SHIFT
    #[arg(long, value_name = "SHIFT")]
    headroom_shift: Option<u32>,

    /// Number of lowest bands run with the 32x64 kernel
    #[arg(long, value_name = "COUNT")]
    extended_bands: Option<usize>,

    /// Mix gain per band, lowest first (repeat once per band)
    #[arg(short, long = "gain", value_name = "GAIN", allow_negative_numbers = true)]
    gains: Vec<f64>,

    /// Mix gain per band in dB, lowest first (repeat once per band)
    #[arg(
        long = "gain-db",
        value_name = "DB",
        allow_negative_numbers = true,
        conflicts_with = "gains"
    )]
    gains_db: Vec<f64>,

    /// Input tone as FREQ:AMP (repeatable; default 80:1 and 2000:0.25)
    #[arg(short, long = "tone", value_name = "FREQ:AMP")]
    tones: Vec<Tone>,

    /// Input duration in seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Print the Q31 coefficient table as a C initialiser
    #[arg(long)]
    print_coefficients: bool,

    /// Name of the C coefficient array
    #[arg(long, default_value = "octave_eq_coeffs")]
    array_name: String,

    /// Print the magnitude response of every band as CSV and exit
    #[arg(long, value_name = "POINTS", num_args = 0..=1)]
    response: Option<Option<usize>>,

    /// Print the comparison report as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn equalizer_config(&self) -> Result<EqualizerConfig> {
        let mut config = match &self.config {
            Some(path) => EqualizerConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => EqualizerConfig::default(),
        };
        if let Some(v) = self.base_frequency {
            config.set_base_frequency(v);
        }
        if let Some(v) = self.bands {
            config.set_band_count(v);
        }
        if let Some(v) = self.sample_rate {
            config.set_sample_rate(v);
        }
        if let Some(v) = self.order {
            config.set_cascade_order(v);
        }
        if let Some(v) = self.scale_shift {
            config.set_scale_shift(v);
        }
        if let Some(v) = self.headroom_shift {
            config.set_input_headroom_shift(v);
        }
        if let Some(v) = self.extended_bands {
            config.set_extended_precision_bands(v);
        }
        if !self.gains.is_empty() {
            config.set_per_band_gain(self.gains.clone());
        } else if !self.gains_db.is_empty() {
            config.set_per_band_gain(self.gains_db.iter().copied().map(db_to_gain).collect());
        }
        Ok(config)
    }

    fn tone_source(&self, sample_rate: u32) -> ToneSource {
        let mut source = ToneSource::default();
        source.set_sample_rate(sample_rate);
        if !self.tones.is_empty() {
            source.set_tones(self.tones.clone());
        }
        if let Some(d) = self.duration {
            source.set_duration(d);
        }
        source
    }
}

fn print_report(out: &EqualizerOutput) {
    println!("band   float rms    fixed rms    max difference");
    let diffs = out.band_differences();
    for (i, (f, x)) in out.float_bands.iter().zip(&out.fixed_bands).enumerate() {
        println!(
            "{:>4}   {:>9.6}    {:>9.6}    {:.3e}",
            i + 1,
            f.rms(),
            x.rms(),
            diffs[i]
        );
    }
    println!(
        " mix   {:>9.6}    {:>9.6}    {:.3e}",
        out.float_path.rms(),
        out.fixed_path.rms(),
        out.max_abs_difference()
    );
    println!(
        "peaks: float {:.6}, fixed {:.6}; rms difference {:.3e}",
        out.float_path.peak(),
        out.fixed_path.peak(),
        out.rms_difference()
    );
}

fn json_report(eq: &OctaveEqualizer, out: &EqualizerOutput) -> serde_json::Value {
    let bands: Vec<serde_json::Value> = eq
        .plan()
        .bands()
        .iter()
        .zip(out.float_bands.iter().zip(&out.fixed_bands))
        .map(|(band, (f, x))| {
            json!({
                "band": band,
                "float-rms": f.rms(),
                "fixed-rms": x.rms(),
                "max-difference": out.band_difference(band.index),
            })
        })
        .collect();
    json!({
        "config": eq.config(),
        "bands": bands,
        "mix": {
            "float-rms": out.float_path.rms(),
            "fixed-rms": out.fixed_path.rms(),
            "float-peak": out.float_path.peak(),
            "fixed-peak": out.fixed_path.peak(),
            "max-difference": out.max_abs_difference(),
            "rms-difference": out.rms_difference(),
        },
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = args.equalizer_config()?;
    let mut eq = OctaveEqualizer::new(config).context("designing the equalizer")?;
    if let Some(points) = args.response {
        let sr = f64::from(eq.config().sample_rate);
        print!(
            "{}",
            response_csv(eq.float_cascades(), sr, points.unwrap_or(DEFAULT_RESPONSE_POINTS))
        );
        return Ok(());
    }
    let mut source = args.tone_source(eq.config().sample_rate);
    let mut float_sink = MemorySink::new();
    let mut fixed_sink = MemorySink::new();
    let out = eq
        .run(&mut source, &mut float_sink, &mut fixed_sink)
        .context("running the equalizer")?;
    info!(
        "{} tones, {} samples per path",
        source.tones().len(),
        out.float_path.len()
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&json_report(&eq, &out))?);
        return Ok(());
    }

    print!("{}", band_table(eq.plan()));
    if args.print_coefficients {
        println!();
        print!("{}", q31_table(&args.array_name, eq.plan(), eq.fixed_cascades()));
    }
    println!();
    print_report(&out);
    Ok(())
}

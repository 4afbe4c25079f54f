// SPDX-License-Identifier: LGPL-3.0-or-later

//! Text renderings of a band plan and its Q31 coefficients.

use crate::filters::planner::BandPlan;
use crate::filters::quantizer::{COEFF_NAMES, FixedPointCascade};
use crate::filters::sos::SosCascade;
use crate::units::gain_to_db;

/// Magnitudes below this are printed as its level in dB.
const RESPONSE_FLOOR: f64 = 1e-10;

/// Human readable band table, omitted band first.
pub fn band_table(plan: &BandPlan) -> String {
    let mut out = String::from("band   centre (Hz)   low edge (Hz)   high edge (Hz)\n");
    out.push_str(&format!(
        "{:>4}   {:>11.2}   {:>13}   {:>14}\n",
        0,
        plan.omitted_center(),
        "-",
        "-"
    ));
    for b in plan.bands() {
        out.push_str(&format!(
            "{:>4}   {:>11.2}   {:>13.2}   {:>14.2}\n",
            b.index, b.center, b.low_edge, b.high_edge
        ));
    }
    out
}

/// C initialiser for a `q31_t` coefficient table named `name`.
///
/// One block per band, each headed by a comment naming its edges, five
/// values (`b0, b1, b2, a1, a2`) per stage with the feedback terms already
/// negated.
pub fn q31_table(name: &str, plan: &BandPlan, cascades: &[FixedPointCascade]) -> String {
    let stages: usize = cascades.iter().map(FixedPointCascade::order).sum();
    let mut out = format!(
        "/* {}, post shift {} */\n",
        COEFF_NAMES.join(", "),
        cascades.first().map_or(0, FixedPointCascade::post_shift)
    );
    out.push_str(&format!(
        "const q31_t {name}[{}] = {{\n",
        stages * COEFF_NAMES.len()
    ));
    for cascade in cascades {
        let header = match plan.bands().iter().find(|b| b.index == cascade.band()) {
            Some(b) => format!(
                "    /* band {}: {:.2} - {:.2} Hz */\n",
                b.index, b.low_edge, b.high_edge
            ),
            None => format!("    /* band {} */\n", cascade.band()),
        };
        out.push_str(&header);
        for stage in cascade.stages() {
            let values: Vec<String> = stage.to_array().iter().map(i32::to_string).collect();
            out.push_str(&format!("    {},\n", values.join(", ")));
        }
    }
    out.push_str("};\n");
    out
}

/// Magnitude response of every cascade in dB as CSV.
///
/// One row per frequency, `points` frequencies evenly spaced over
/// `[0, Nyquist)`, one column per band.
pub fn response_csv(cascades: &[SosCascade], sample_rate: f64, points: usize) -> String {
    let mut out = String::from("frequency");
    for c in cascades {
        out.push_str(&format!(",band{}", c.band()));
    }
    out.push('\n');

    let responses: Vec<_> = cascades
        .iter()
        .map(|c| c.frequency_response(sample_rate, points))
        .collect();
    let Some(first) = responses.first() else {
        return out;
    };
    for (i, (freq, _)) in first.iter().enumerate() {
        out.push_str(&format!("{freq:.3}"));
        for r in &responses {
            let db = gain_to_db(r[i].1.norm().max(RESPONSE_FLOOR));
            out.push_str(&format!(",{db:.3}"));
        }
        out.push('\n');
    }
    out
}

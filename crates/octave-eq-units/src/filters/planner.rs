// SPDX-License-Identifier: LGPL-3.0-or-later

//! Octave band planning.
//!
//! For `n` bands the planner lays out `n + 1` octave centres
//! `base * 2^i`, `i = -1..n`. The lowest centre sits below the first band
//! and only anchors its lower edge; it is never filtered. Edges are the
//! log-midpoints of adjacent centres, and the top band's upper edge is the
//! log-midpoint between its centre and the next octave (`c_n * sqrt(2)`).

use log::debug;
use serde::Serialize;

use crate::config::EqualizerConfig;
use crate::consts::OCTAVE_RATIO;
use crate::error::{EqError, Result};
use crate::units::{log_midpoint, nyquist};

/// One filtered octave band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    /// Band number, `1..=n`.
    pub index: usize,
    pub center: f64,
    pub low_edge: f64,
    pub high_edge: f64,
}

impl Band {
    /// Bandwidth in Hz.
    pub fn width(&self) -> f64 {
        self.high_edge - self.low_edge
    }

    /// Returns `true` if `freq` lies inside the band edges.
    pub fn contains(&self, freq: f64) -> bool {
        freq >= self.low_edge && freq < self.high_edge
    }
}

/// Immutable result of band planning.
#[derive(Debug, Clone, PartialEq)]
pub struct BandPlan {
    centers: Vec<f64>,
    edges: Vec<f64>,
    top_edge: f64,
    bands: Vec<Band>,
    sample_rate: f64,
}

impl BandPlan {
    /// All `n + 1` octave centres, the omitted one first.
    pub fn centers(&self) -> &[f64] {
        &self.centers
    }

    /// The `n` edges between consecutive centres.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Upper edge of the highest band.
    pub fn top_edge(&self) -> f64 {
        self.top_edge
    }

    /// Filtered bands in index order.
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// The sub-audio centre that only anchors the first edge.
    pub fn omitted_center(&self) -> f64 {
        self.centers[0]
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn nyquist(&self) -> f64 {
        nyquist(self.sample_rate)
    }

    /// Number of filtered bands.
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

/// Lays out octave bands from a base frequency.
#[derive(Debug, Clone, Copy)]
pub struct BandPlanner {
    base_frequency: f64,
    band_count: usize,
    sample_rate: f64,
}

impl BandPlanner {
    pub fn new(base_frequency: f64, band_count: usize, sample_rate: f64) -> Self {
        Self {
            base_frequency,
            band_count,
            sample_rate,
        }
    }

    pub fn from_config(config: &EqualizerConfig) -> Self {
        Self::new(
            config.base_frequency,
            config.band_count,
            f64::from(config.sample_rate),
        )
    }

    /// Upper edge of the highest band, `base * 2^(n-1) * sqrt(2)`.
    ///
    /// Fails with a configuration error unless the edge is finite and
    /// below Nyquist. Nothing is allocated, so band counts of any size are
    /// rejected cheaply.
    pub fn top_edge(&self) -> Result<f64> {
        let n = i32::try_from(self.band_count).map_err(|_| {
            EqError::configuration(format!("band count {} is out of range", self.band_count))
        })?;
        let top_center = self.base_frequency * OCTAVE_RATIO.powi(n - 1);
        let top_edge = log_midpoint(top_center, top_center * OCTAVE_RATIO);

        let nyq = nyquist(self.sample_rate);
        if !top_edge.is_finite() || top_edge >= nyq {
            return Err(EqError::configuration(format!(
                "top band edge {top_edge:.1} Hz reaches Nyquist ({nyq:.1} Hz)"
            )));
        }
        Ok(top_edge)
    }

    /// Compute centres, edges and bands.
    ///
    /// Fails with a configuration error if the base frequency is not a
    /// positive number, no bands are requested, or the top band reaches
    /// Nyquist.
    pub fn plan(&self) -> Result<BandPlan> {
        let base = self.base_frequency;
        let n = self.band_count;
        if !base.is_finite() || base <= 0.0 {
            return Err(EqError::configuration(format!(
                "base frequency must be positive, got {base}"
            )));
        }
        if n == 0 {
            return Err(EqError::configuration("band count must be at least 1"));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(EqError::configuration(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }

        let top_edge = self.top_edge()?;
        let centers: Vec<f64> = (-1..n as i32)
            .map(|i| base * OCTAVE_RATIO.powi(i))
            .collect();
        let edges: Vec<f64> = centers
            .windows(2)
            .map(|w| log_midpoint(w[0], w[1]))
            .collect();

        let bands: Vec<Band> = (1..=n)
            .map(|index| Band {
                index,
                center: centers[index],
                low_edge: edges[index - 1],
                high_edge: if index == n { top_edge } else { edges[index] },
            })
            .collect();

        debug!("band 0 omitted: centre {:.2} Hz", centers[0]);
        for b in &bands {
            debug!(
                "band {}: centre {:.2} Hz, edges {:.2}..{:.2} Hz",
                b.index, b.center, b.low_edge, b.high_edge
            );
        }

        Ok(BandPlan {
            centers,
            edges,
            top_edge,
            bands,
            sample_rate: self.sample_rate,
        })
    }
}

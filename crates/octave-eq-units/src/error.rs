// SPDX-License-Identifier: LGPL-3.0-or-later

//! Error type shared by every stage of the equalizer pipeline.
//!
//! Errors are never recovered by substituting defaults: the first failure
//! aborts the run and carries enough location data (band, stage, sample)
//! to find the offending value.

use thiserror::Error;

/// Result alias for the equalizer pipeline.
pub type Result<T> = std::result::Result<T, EqError>;

/// Failure raised while planning, designing, quantizing or filtering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EqError {
    /// Invalid configuration or input that does not match it.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// A band could not be turned into a stable cascade.
    #[error("design error in band {band}: {reason}")]
    Design { band: usize, reason: String },

    /// A scaled coefficient does not fit in Q31.
    #[error(
        "quantization overflow in band {band}, stage {stage}, coefficient {coefficient}: \
         {value} does not fit Q31"
    )]
    QuantizationOverflow {
        band: usize,
        stage: usize,
        coefficient: &'static str,
        value: f64,
    },

    /// Filtering produced a value the arithmetic cannot represent.
    #[error("numerical instability in band {band}, stage {stage}, sample {sample}: {value}")]
    NumericalInstability {
        band: usize,
        stage: usize,
        sample: usize,
        value: f64,
    },

    /// Broken internal invariant (mismatched lengths and the like).
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl EqError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn design(band: usize, reason: impl Into<String>) -> Self {
        Self::Design {
            band,
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Band index the error is attributed to, if any.
    pub fn band(&self) -> Option<usize> {
        match self {
            Self::Design { band, .. }
            | Self::QuantizationOverflow { band, .. }
            | Self::NumericalInstability { band, .. } => Some(*band),
            Self::Configuration { .. } | Self::Internal { .. } => None,
        }
    }
}

impl From<serde_json::Error> for EqError {
    fn from(e: serde_json::Error) -> Self {
        Self::configuration(format!("invalid configuration file: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_location() {
        let e = EqError::NumericalInstability {
            band: 2,
            stage: 1,
            sample: 40,
            value: f64::INFINITY,
        };
        assert_eq!(
            e.to_string(),
            "numerical instability in band 2, stage 1, sample 40: inf"
        );

        let e = EqError::QuantizationOverflow {
            band: 1,
            stage: 0,
            coefficient: "a1",
            value: 1.98,
        };
        assert!(e.to_string().contains("coefficient a1"));
    }

    #[test]
    fn test_band_attribution() {
        assert_eq!(EqError::design(3, "bad").band(), Some(3));
        assert_eq!(EqError::configuration("bad").band(), None);
        assert_eq!(EqError::internal("bad").band(), None);
    }

    #[test]
    fn test_json_error_is_configuration() {
        let err: EqError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, EqError::Configuration { .. }));
    }
}

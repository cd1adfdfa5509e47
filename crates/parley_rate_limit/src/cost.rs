//! Pluggable cost estimation.

use parley_core::CostBasis;
use serde::{Deserialize, Serialize};

/// Estimates the cost units a request will consume.
///
/// Implemented for [`CostModel`] and for any `Fn(&CostBasis) -> f64`, so an
/// endpoint with unusual pricing can register a closure.
///
/// # Example
///
/// ```
/// use parley_core::CostBasis;
/// use parley_rate_limit::CostEstimator;
///
/// let per_word = |basis: &CostBasis| (basis.characters / 5) as f64;
/// assert_eq!(per_word.estimate(&CostBasis::characters(50)), 10.0);
/// ```
pub trait CostEstimator: Send + Sync {
    /// Estimated cost of a request of the given size.
    fn estimate(&self, basis: &CostBasis) -> f64;
}

impl<F> CostEstimator for F
where
    F: Fn(&CostBasis) -> f64 + Send + Sync,
{
    fn estimate(&self, basis: &CostBasis) -> f64 {
        self(basis)
    }
}

/// Linear cost model configured per endpoint.
///
/// `cost = max(minimum, per_request + per_character * characters
/// + per_message * messages + per_audio_kilobyte * audio_kb)`
///
/// # Example
///
/// ```toml
/// [rate_limits.openai.speech.cost]
/// per_request = 0
/// per_character = 1
/// minimum = 10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostModel {
    /// Fixed cost charged for every request
    pub per_request: f64,
    /// Cost per text character
    pub per_character: f64,
    /// Cost per conversation message
    pub per_message: f64,
    /// Cost per kilobyte of audio
    pub per_audio_kilobyte: f64,
    /// Lower bound on the estimate
    pub minimum: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            per_request: 1.0,
            per_character: 0.0,
            per_message: 0.0,
            per_audio_kilobyte: 0.0,
            minimum: 0.0,
        }
    }
}

impl CostModel {
    /// Model charging `units` per request regardless of size.
    pub fn flat(units: f64) -> Self {
        Self {
            per_request: units,
            ..Self::zero()
        }
    }

    /// Model charging `rate` per character.
    pub fn per_character(rate: f64) -> Self {
        Self {
            per_character: rate,
            ..Self::zero()
        }
    }

    /// Model charging `rate` per kilobyte of audio.
    pub fn per_audio_kilobyte(rate: f64) -> Self {
        Self {
            per_audio_kilobyte: rate,
            ..Self::zero()
        }
    }

    /// Set the lower bound on the estimate.
    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = minimum;
        self
    }

    fn zero() -> Self {
        Self {
            per_request: 0.0,
            per_character: 0.0,
            per_message: 0.0,
            per_audio_kilobyte: 0.0,
            minimum: 0.0,
        }
    }
}

impl CostEstimator for CostModel {
    fn estimate(&self, basis: &CostBasis) -> f64 {
        let audio_kb = basis.audio_bytes as f64 / 1024.0;
        let linear = self.per_request
            + self.per_character * basis.characters as f64
            + self.per_message * basis.messages as f64
            + self.per_audio_kilobyte * audio_kb;
        linear.max(self.minimum).max(0.0)
    }
}

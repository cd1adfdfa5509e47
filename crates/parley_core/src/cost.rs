//! Inputs to per-endpoint cost estimation.

use serde::{Deserialize, Serialize};

/// Measurable size of a request, fed to an endpoint's cost estimator.
///
/// The rate limiter never sees payloads, only this summary. Speech synthesis
/// is typically metered by characters, transcription by audio size and
/// conversation by message length.
///
/// # Examples
///
/// ```
/// use parley_core::CostBasis;
///
/// let basis = CostBasis::conversation(3, 240);
/// assert_eq!(basis.messages, 3);
/// assert_eq!(basis.characters, 240);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CostBasis {
    /// Number of text characters in the request.
    pub characters: usize,
    /// Number of messages (conversation turns) in the request.
    pub messages: usize,
    /// Size of any audio payload in bytes.
    pub audio_bytes: usize,
}

impl CostBasis {
    /// A text-only request.
    pub fn characters(characters: usize) -> Self {
        Self {
            characters,
            ..Default::default()
        }
    }

    /// A conversation request with `messages` turns totalling `characters`.
    pub fn conversation(messages: usize, characters: usize) -> Self {
        Self {
            characters,
            messages,
            audio_bytes: 0,
        }
    }

    /// An audio upload.
    pub fn audio(audio_bytes: usize) -> Self {
        Self {
            audio_bytes,
            ..Default::default()
        }
    }
}

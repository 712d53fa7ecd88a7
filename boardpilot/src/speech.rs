//! Speech synthesis and recognition seams.
//!
//! The core never talks to an audio stack directly. Front ends plug in
//! whatever they have; [`Unavailable`] is the default and makes every call
//! fail with [`SpeechError::NotSupported`].

use thiserror::Error;

use crate::localization::Language;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech is not supported on this system")]
    NotSupported,
    #[error("{0}")]
    Failed(String),
}

pub trait SpeechSynthesizer: Send + Sync {
    fn is_available(&self) -> bool;

    /// Speak `text` using the voice for `language`.
    fn speak(&self, text: &str, language: Language) -> Result<(), SpeechError>;
}

pub trait SpeechRecognizer: Send + Sync {
    fn is_available(&self) -> bool;

    /// Capture one utterance and return its transcript.
    fn listen(&self, language: Language) -> Result<String, SpeechError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl SpeechSynthesizer for Unavailable {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&self, _text: &str, _language: Language) -> Result<(), SpeechError> {
        Err(SpeechError::NotSupported)
    }
}

impl SpeechRecognizer for Unavailable {
    fn is_available(&self) -> bool {
        false
    }

    fn listen(&self, _language: Language) -> Result<String, SpeechError> {
        Err(SpeechError::NotSupported)
    }
}

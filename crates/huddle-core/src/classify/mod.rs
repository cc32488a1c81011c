//! Text-classifier capability.
//!
//! Snap free text is turned into structured `{done, to_do, blockers,
//! suggested_rag}` fields either by an external classifier service or by
//! the deterministic keyword fallback. The fallback also absorbs every
//! classifier failure: snap creation never hard-fails because the
//! classifier is slow, unreachable, or returns garbage.

mod fallback;
mod http;

pub use fallback::KeywordClassifier;
pub use http::HttpClassifier;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Rag;

/// Structured output of a classification pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub done: String,
    pub to_do: String,
    pub blockers: String,
    pub suggested_rag: Rag,
}

/// Failures of the external classifier. All variants are recovered via the
/// fallback and never surface to snap authors.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classifier request timed out")]
    Timeout,
    #[error("classifier transport failure: {0}")]
    Transport(String),
    #[error("classifier returned malformed output: {0}")]
    Malformed(String),
}

/// Turns raw standup text into structured fields.
pub trait TextClassifier: Send + Sync {
    /// Classify `raw_text` recorded against the card named `card_title`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClassifyError`] when the classification cannot be
    /// produced; callers are expected to degrade to [`KeywordClassifier`].
    fn classify(&self, raw_text: &str, card_title: &str) -> Result<Classification, ClassifyError>;
}

/// Classify with the primary classifier when available, degrading to the
/// keyword fallback on any failure. Infallible by construction.
#[must_use]
pub fn classify_resilient(
    primary: Option<&dyn TextClassifier>,
    raw_text: &str,
    card_title: &str,
) -> Classification {
    if let Some(classifier) = primary {
        match classifier.classify(raw_text, card_title) {
            Ok(classification) => return classification,
            Err(error) => {
                tracing::warn!(
                    card_title,
                    error = %error,
                    "classifier degraded, using keyword fallback"
                );
            }
        }
    }

    KeywordClassifier::parse(raw_text)
}

#[cfg(test)]
mod tests {
    use super::{classify_resilient, ClassifyError, Classification, TextClassifier};
    use crate::model::Rag;

    struct FailingClassifier;

    impl TextClassifier for FailingClassifier {
        fn classify(&self, _: &str, _: &str) -> Result<Classification, ClassifyError> {
            Err(ClassifyError::Timeout)
        }
    }

    struct EchoClassifier;

    impl TextClassifier for EchoClassifier {
        fn classify(&self, raw: &str, _: &str) -> Result<Classification, ClassifyError> {
            Ok(Classification {
                done: raw.to_string(),
                to_do: String::new(),
                blockers: String::new(),
                suggested_rag: Rag::Green,
            })
        }
    }

    #[test]
    fn primary_wins_when_healthy() {
        let result = classify_resilient(Some(&EchoClassifier), "shipped the parser", "Parser");
        assert_eq!(result.done, "shipped the parser");
        assert_eq!(result.suggested_rag, Rag::Green);
    }

    #[test]
    fn failure_degrades_to_fallback() {
        let result = classify_resilient(Some(&FailingClassifier), "finished the parser", "Parser");
        assert!(result.done.contains("finished the parser"));
    }

    #[test]
    fn no_primary_uses_fallback_directly() {
        let result = classify_resilient(None, "blocked on credentials", "Auth");
        assert_eq!(result.suggested_rag, Rag::Red);
        assert!(!result.blockers.is_empty());
    }
}

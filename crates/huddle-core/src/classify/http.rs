use std::time::Duration;

use serde::Deserialize;

use super::{Classification, ClassifyError, TextClassifier};
use crate::model::Rag;

/// HTTP classifier client with a hard per-request timeout.
///
/// POSTs `{"text": ..., "card_title": ...}` and expects the classification
/// JSON back. Any transport error, timeout, or undecodable body becomes a
/// [`ClassifyError`] for the caller to degrade on.
pub struct HttpClassifier {
    agent: ureq::Agent,
    url: String,
}

#[derive(Debug, Deserialize)]
struct WireClassification {
    #[serde(default)]
    done: String,
    #[serde(default, alias = "toDo")]
    to_do: String,
    #[serde(default)]
    blockers: String,
    #[serde(alias = "suggestedRag")]
    suggested_rag: Option<Rag>,
}

impl HttpClassifier {
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout(timeout)
            .build();
        Self {
            agent,
            url: url.into(),
        }
    }
}

impl TextClassifier for HttpClassifier {
    fn classify(&self, raw_text: &str, card_title: &str) -> Result<Classification, ClassifyError> {
        let response = self
            .agent
            .post(&self.url)
            .send_json(serde_json::json!({
                "text": raw_text,
                "card_title": card_title,
            }))
            .map_err(|error| match error {
                ureq::Error::Transport(transport)
                    if matches!(transport.kind(), ureq::ErrorKind::Io) =>
                {
                    ClassifyError::Timeout
                }
                other => ClassifyError::Transport(other.to_string()),
            })?;

        let wire: WireClassification = response
            .into_json()
            .map_err(|error| ClassifyError::Malformed(error.to_string()))?;

        Ok(Classification {
            done: wire.done,
            to_do: wire.to_do,
            blockers: wire.blockers,
            // A reply missing the RAG field defaults to amber.
            suggested_rag: wire.suggested_rag.unwrap_or(Rag::Amber),
        })
    }
}

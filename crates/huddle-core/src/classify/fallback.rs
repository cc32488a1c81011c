use super::Classification;
use crate::model::Rag;

const DONE_WORDS: &[&str] = &["completed", "finished", "done"];
const TODO_WORDS: &[&str] = &["working on", "next", "will", "tomorrow"];
const BLOCKER_WORDS: &[&str] = &["blocked", "waiting", "issue", "problem"];

const RED_WORDS: &[&str] = &["blocked", "critical", "stuck"];
const AMBER_WORDS: &[&str] = &["issue", "delay", "waiting"];

/// Deterministic keyword parser used when no external classifier is
/// configured or the external one fails.
///
/// The raw text is split into segments (newlines and sentence boundaries);
/// each segment lands in the first bucket whose keyword list matches it,
/// checked completion-first, then planning, then blocker. When nothing
/// matches anywhere, the whole text is treated as a progress report and
/// lands in `done`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    /// Parse `raw_text` into structured fields. Never fails.
    #[must_use]
    pub fn parse(raw_text: &str) -> Classification {
        let mut done = Vec::new();
        let mut to_do = Vec::new();
        let mut blockers = Vec::new();

        for segment in segments(raw_text) {
            let lower = segment.to_ascii_lowercase();
            if contains_any(&lower, DONE_WORDS) {
                done.push(segment);
            } else if contains_any(&lower, TODO_WORDS) {
                to_do.push(segment);
            } else if contains_any(&lower, BLOCKER_WORDS) {
                blockers.push(segment);
            }
        }

        if done.is_empty() && to_do.is_empty() && blockers.is_empty() {
            let trimmed = raw_text.trim();
            if !trimmed.is_empty() {
                done.push(trimmed.to_string());
            }
        }

        Classification {
            done: done.join(". "),
            to_do: to_do.join(". "),
            blockers: blockers.join(". "),
            suggested_rag: suggest_rag(raw_text),
        }
    }
}

impl super::TextClassifier for KeywordClassifier {
    fn classify(
        &self,
        raw_text: &str,
        _card_title: &str,
    ) -> Result<Classification, super::ClassifyError> {
        Ok(Self::parse(raw_text))
    }
}

fn suggest_rag(raw_text: &str) -> Rag {
    let lower = raw_text.to_ascii_lowercase();
    if contains_any(&lower, RED_WORDS) {
        Rag::Red
    } else if contains_any(&lower, AMBER_WORDS) {
        Rag::Amber
    } else {
        Rag::Green
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn segments(raw_text: &str) -> Vec<String> {
    raw_text
        .split(['\n', '.', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::KeywordClassifier;
    use crate::model::Rag;

    fn parse(text: &str) -> super::Classification {
        KeywordClassifier::parse(text)
    }

    #[test]
    fn completion_words_populate_done() {
        let c = parse("Completed login page");
        assert_eq!(c.done, "Completed login page");
        assert!(c.to_do.is_empty());
        assert!(c.blockers.is_empty());
        assert_eq!(c.suggested_rag, Rag::Green);
    }

    #[test]
    fn segments_route_to_separate_buckets() {
        let c = parse("Finished the API client. Will start the UI tomorrow. Blocked on staging access");
        assert!(c.done.contains("Finished the API client"));
        assert!(c.to_do.contains("Will start the UI tomorrow"));
        assert!(c.blockers.contains("Blocked on staging access"));
        assert_eq!(c.suggested_rag, Rag::Red);
    }

    #[test]
    fn mixed_segment_routes_by_completion_first() {
        // One segment carrying both a completion and a blocker word: the
        // completion bucket wins.
        let c = parse("Completed integration but blocked on review");
        assert_eq!(c.done, "Completed integration but blocked on review");
        assert!(c.to_do.is_empty());
        assert!(c.blockers.is_empty());
        assert_eq!(c.suggested_rag, Rag::Red);
    }

    #[test]
    fn unmatched_text_defaults_into_done() {
        let c = parse("refactoring the cache layer");
        assert_eq!(c.done, "refactoring the cache layer");
        assert!(c.to_do.is_empty());
        assert!(c.blockers.is_empty());
    }

    #[test]
    fn amber_words_yield_amber() {
        let c = parse("Minor delay syncing with design");
        assert_eq!(c.suggested_rag, Rag::Amber);
    }

    #[test]
    fn red_wins_over_amber() {
        let c = parse("Stuck waiting on vendor fix");
        assert_eq!(c.suggested_rag, Rag::Red);
    }

    #[test]
    fn empty_text_yields_empty_fields() {
        let c = parse("   ");
        assert!(c.done.is_empty());
        assert!(c.to_do.is_empty());
        assert!(c.blockers.is_empty());
        assert_eq!(c.suggested_rag, Rag::Green);
    }

    #[test]
    fn parse_is_deterministic() {
        let text = "Completed ingest; waiting on schema review";
        assert_eq!(parse(text), parse(text));
    }
}

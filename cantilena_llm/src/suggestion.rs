// JSON suggestions embedded in free text.
//
// Models wrap their JSON in prose or code fences often enough that the
// answer is never parsed directly. `extract_json_object` first tries the
// span from the first '{' to the last '}'; when that span does not parse it
// scans for the first balanced object (string-literal aware) that does.
//
// `Suggestion<T>` is the tagged outcome every consumer matches on. A service
// error, a missing object, or an object of the wrong shape all become
// `Fallback { reason }`; none of them is raised as an error.

use crate::service::{CompletionRequest, TextSuggestionService};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Parsed suggestion or the reason the caller must fall back.
#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion<T> {
    Parsed(T),
    Fallback { reason: String },
}

impl<T> Suggestion<T> {
    pub fn fallback(reason: impl Into<String>) -> Self {
        Suggestion::Fallback {
            reason: reason.into(),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Suggestion::Parsed(_))
    }

    pub fn parsed(self) -> Option<T> {
        match self {
            Suggestion::Parsed(value) => Some(value),
            Suggestion::Fallback { .. } => None,
        }
    }

    /// Keep a parsed value only if `check` accepts it.
    pub fn validate(self, check: impl FnOnce(&T) -> Result<(), String>) -> Self {
        match self {
            Suggestion::Parsed(value) => match check(&value) {
                Ok(()) => Suggestion::Parsed(value),
                Err(reason) => Suggestion::Fallback { reason },
            },
            fallback => fallback,
        }
    }
}

fn parses_as_object(candidate: &str) -> bool {
    matches!(
        serde_json::from_str::<serde_json::Value>(candidate),
        Ok(serde_json::Value::Object(_))
    )
}

/// End index (exclusive) of the balanced object starting at `start`.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Locate one JSON object inside `text`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let first = text.find('{')?;
    let last = text.rfind('}')?;
    if last > first {
        let greedy = &text[first..=last];
        if parses_as_object(greedy) {
            return Some(greedy);
        }
    }

    for (start, _) in text.match_indices('{') {
        if let Some(end) = balanced_end(text, start) {
            let candidate = &text[start..end];
            if parses_as_object(candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Extract and deserialize a suggestion from free text.
pub fn parse_suggestion<T: DeserializeOwned>(text: &str) -> Suggestion<T> {
    let Some(json) = extract_json_object(text) else {
        return Suggestion::fallback("no JSON object in response");
    };
    match serde_json::from_str::<T>(json) {
        Ok(value) => Suggestion::Parsed(value),
        Err(e) => Suggestion::fallback(format!("unexpected JSON shape: {e}")),
    }
}

/// Ask `service` and parse the answer. Service failures become fallbacks.
pub fn request_suggestion<T, S>(service: &S, request: &CompletionRequest) -> Suggestion<T>
where
    T: DeserializeOwned,
    S: TextSuggestionService + ?Sized,
{
    let suggestion = match service.complete(request) {
        Ok(text) => parse_suggestion(&text),
        Err(e) => Suggestion::fallback(e.to_string()),
    };
    match &suggestion {
        Suggestion::Parsed(_) => debug!(service = service.name(), "Suggestion parsed"),
        Suggestion::Fallback { reason } => {
            warn!(service = service.name(), %reason, "Suggestion unusable, falling back")
        }
    }
    suggestion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{LlmError, NoSuggestions};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Tempo {
        tempo: u32,
    }

    struct Canned(&'static str);

    impl TextSuggestionService for Canned {
        fn name(&self) -> &str {
            "canned"
        }
        fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_extract_from_prose_and_fences() {
        let text = "Sure! Here you go:\n```json\n{\"tempo\": 90}\n```\nEnjoy.";
        assert_eq!(extract_json_object(text), Some("{\"tempo\": 90}"));
    }

    #[test]
    fn test_extract_nested_object() {
        let text = r#"{"a": {"b": [1, 2]}, "c": "}"}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn test_balanced_scan_when_greedy_span_fails() {
        let text = r#"first {"tempo": 72} then {oops}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"tempo": 72}"#));
    }

    #[test]
    fn test_no_object() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
        assert_eq!(extract_json_object("[1, 2, 3]"), None);
    }

    #[test]
    fn test_parse_suggestion_outcomes() {
        assert_eq!(
            parse_suggestion::<Tempo>("{\"tempo\": 120}"),
            Suggestion::Parsed(Tempo { tempo: 120 })
        );
        assert!(!parse_suggestion::<Tempo>("{\"speed\": 1}").is_parsed());
        assert!(!parse_suggestion::<Tempo>("").is_parsed());
    }

    #[test]
    fn test_validate_turns_rejects_into_fallback() {
        let s = Suggestion::Parsed(Tempo { tempo: 10 })
            .validate(|t| if t.tempo >= 40 { Ok(()) } else { Err("too slow".into()) });
        assert_eq!(s, Suggestion::fallback("too slow"));
    }

    #[test]
    fn test_request_suggestion_never_errors() {
        let parsed: Suggestion<Tempo> =
            request_suggestion(&Canned("ok {\"tempo\": 99}"), &CompletionRequest::new("p"));
        assert_eq!(parsed.parsed(), Some(Tempo { tempo: 99 }));

        let down: Suggestion<Tempo> =
            request_suggestion(&NoSuggestions::default(), &CompletionRequest::new("p"));
        assert!(matches!(down, Suggestion::Fallback { ref reason } if reason.contains("unavailable")));
    }
}

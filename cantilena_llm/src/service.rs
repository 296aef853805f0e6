// Suggestion service interface.

use thiserror::Error;

/// One completion call: a user prompt, an optional system prompt and a
/// sampling temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            temperature: 1.0,
        }
    }

    pub fn with_system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Errors from a suggestion service.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("suggestion service unavailable: {0}")]
    Unavailable(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timeout")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Something that answers a prompt with free text.
pub trait TextSuggestionService {
    /// Short name for logs.
    fn name(&self) -> &str;

    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

impl<T: TextSuggestionService + ?Sized> TextSuggestionService for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        (**self).complete(request)
    }
}

impl<T: TextSuggestionService + ?Sized> TextSuggestionService for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        (**self).complete(request)
    }
}

/// Service used when no endpoint is configured. Every call fails with
/// `Unavailable`, which the callers turn into rule-based fallbacks.
#[derive(Debug, Clone, Default)]
pub struct NoSuggestions {
    reason: String,
}

impl NoSuggestions {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl TextSuggestionService for NoSuggestions {
    fn name(&self) -> &str {
        "none"
    }

    fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        let reason = if self.reason.is_empty() {
            "no suggestion service configured".to_string()
        } else {
            self.reason.clone()
        };
        Err(LlmError::Unavailable(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = CompletionRequest::new("hi")
            .with_system("be brief")
            .with_temperature(0.5);
        assert_eq!(req.prompt, "hi");
        assert_eq!(req.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(req.temperature, 0.5);
    }

    #[test]
    fn test_no_suggestions_is_unavailable() {
        let service = NoSuggestions::new("LLM_API_KEY not set");
        let err = service.complete(&CompletionRequest::new("x")).unwrap_err();
        assert!(matches!(err, LlmError::Unavailable(ref r) if r == "LLM_API_KEY not set"));
        let boxed: Box<dyn TextSuggestionService> = Box::new(NoSuggestions::default());
        assert!(boxed.complete(&CompletionRequest::new("x")).is_err());
    }
}

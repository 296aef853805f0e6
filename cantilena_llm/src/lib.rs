// Cantilena text-suggestion service.
//
// The composer asks a chat-completions model for musical suggestions (mood,
// key, notes, chord progressions) and reads the answer as free text that
// should contain one JSON object. Nothing downstream trusts the answer: a
// suggestion either parses into the expected shape or degrades to a
// `Suggestion::Fallback` carrying the reason, and the caller substitutes
// rule-based defaults.
//
// Architecture:
// - service.rs: `TextSuggestionService` trait, `CompletionRequest`,
//   `LlmError`, and `NoSuggestions` (the offline stand-in)
// - client.rs: `ChatCompletionsClient`, a blocking OpenAI-compatible client
// - suggestion.rs: JSON extraction from free text and the tagged
//   `Suggestion<T>` result
//
// All calls are synchronous. There are no retries; a failed request is one
// fallback.

pub mod client;
pub mod service;
pub mod suggestion;

pub use client::ChatCompletionsClient;
pub use service::{CompletionRequest, LlmError, NoSuggestions, TextSuggestionService};
pub use suggestion::{Suggestion, extract_json_object, parse_suggestion, request_suggestion};

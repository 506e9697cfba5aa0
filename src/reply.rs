//! Coercion of free-form model output into the `{answer}` envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Shown whenever there is no usable answer.
pub const ANSWER_PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResultEnvelope {
    /// Answer text, always a string.
    #[schema(example = "4")]
    pub answer: String,
}

impl ResultEnvelope {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }

    /// Envelope returned when the model output could not be interpreted.
    pub fn degraded() -> Self {
        Self::new(ANSWER_PLACEHOLDER)
    }

    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self::new(coerce_answer(object.get("answer")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply {
    Parsed(Map<String, Value>),
    Unparseable,
}

impl ParsedReply {
    pub fn into_envelope(self) -> Option<ResultEnvelope> {
        match self {
            ParsedReply::Parsed(object) => Some(ResultEnvelope::from_object(&object)),
            ParsedReply::Unparseable => None,
        }
    }
}

/// Strict parse first, then the span from the first `{` to the last `}`.
pub fn parse_model_reply(raw: &str) -> ParsedReply {
    let text = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return as_object(value);
    }
    match outer_braces(text) {
        Some(candidate) => match serde_json::from_str::<Value>(candidate) {
            Ok(value) => as_object(value),
            Err(_) => ParsedReply::Unparseable,
        },
        None => ParsedReply::Unparseable,
    }
}

fn outer_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn as_object(value: Value) -> ParsedReply {
    match value {
        Value::Object(object) => ParsedReply::Parsed(object),
        _ => ParsedReply::Unparseable,
    }
}

/// Renders any JSON value as answer text; absent and `null` become the placeholder.
pub fn coerce_answer(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => ANSWER_PLACEHOLDER.to_string(),
        Some(value) => stringify(value),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answer_of(raw: &str) -> Option<String> {
        parse_model_reply(raw)
            .into_envelope()
            .map(|envelope| envelope.answer)
    }

    #[test]
    fn strict_json_object() {
        assert_eq!(answer_of(r#"{"answer":"42"}"#).as_deref(), Some("42"));
    }

    #[test]
    fn object_embedded_in_chatter() {
        assert_eq!(
            answer_of(r#"Sure! {"answer":"42"} thanks"#).as_deref(),
            Some("42")
        );
    }

    #[test]
    fn fenced_markdown_reply() {
        let raw = "```json\n{\"answer\": \"Paris\"}\n```";
        assert_eq!(answer_of(raw).as_deref(), Some("Paris"));
    }

    #[test]
    fn plain_text_is_unparseable() {
        assert_eq!(parse_model_reply("not json at all"), ParsedReply::Unparseable);
        assert_eq!(parse_model_reply(""), ParsedReply::Unparseable);
    }

    #[test]
    fn reversed_braces_are_unparseable() {
        assert_eq!(parse_model_reply("} nothing {"), ParsedReply::Unparseable);
    }

    #[test]
    fn greedy_span_over_two_objects_is_unparseable() {
        assert_eq!(
            parse_model_reply(r#"{"answer":"a"} or {"answer":"b"}"#),
            ParsedReply::Unparseable
        );
    }

    #[test]
    fn non_object_values_are_unparseable() {
        for raw in ["42", "\"text\"", "null", "true", "[1,2]"] {
            assert_eq!(parse_model_reply(raw), ParsedReply::Unparseable, "{raw}");
        }
    }

    #[test]
    fn missing_answer_uses_placeholder() {
        assert_eq!(answer_of(r#"{"foo":1}"#).as_deref(), Some(ANSWER_PLACEHOLDER));
        assert_eq!(
            answer_of(r#"{"answer":null}"#).as_deref(),
            Some(ANSWER_PLACEHOLDER)
        );
    }

    #[test]
    fn non_string_answers_are_stringified() {
        assert_eq!(coerce_answer(Some(&json!(42))), "42");
        assert_eq!(coerce_answer(Some(&json!(2.5))), "2.5");
        assert_eq!(coerce_answer(Some(&json!(false))), "false");
        assert_eq!(coerce_answer(Some(&json!(["a", 1, null]))), "a,1,");
        assert_eq!(coerce_answer(Some(&json!({"k": "v"}))), r#"{"k":"v"}"#);
    }

    #[test]
    fn degraded_envelope_shape() {
        let body = serde_json::to_value(ResultEnvelope::degraded()).unwrap();
        assert_eq!(body, json!({ "answer": "—" }));
    }
}

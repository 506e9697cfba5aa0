use crate::completion::{ChatMessage, CompletionClient, CompletionError, GenerationParams};
use crate::prompt::PromptTemplate;
use crate::reply::{ResultEnvelope, parse_model_reply};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub const SYSTEM_INSTRUCTION: &str = "You must output ONLY raw JSON. No markdown. No extra text.";
pub const MIN_TEXT_CHARS: usize = 3;
pub const TOO_SHORT_MESSAGE: &str = "Text is too short.";

/// Turns user text into an answer envelope with exactly one model call.
#[derive(Clone)]
pub struct Resolver {
    template: Arc<PromptTemplate>,
    client: Arc<dyn CompletionClient>,
    params: GenerationParams,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Answered(ResultEnvelope),
    /// The model replied with something that is not a JSON object.
    Degraded(ResultEnvelope),
}

impl Resolution {
    pub fn envelope(&self) -> &ResultEnvelope {
        match self {
            Resolution::Answered(envelope) | Resolution::Degraded(envelope) => envelope,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Resolution::Degraded(_))
    }
}

#[derive(Debug)]
pub enum ResolveError {
    TooShort,
    Completion(CompletionError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::TooShort => f.write_str(TOO_SHORT_MESSAGE),
            ResolveError::Completion(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::TooShort => None,
            ResolveError::Completion(err) => Some(err),
        }
    }
}

impl From<CompletionError> for ResolveError {
    fn from(value: CompletionError) -> Self {
        ResolveError::Completion(value)
    }
}

impl Resolver {
    pub fn new(
        template: PromptTemplate,
        client: Arc<dyn CompletionClient>,
        params: GenerationParams,
    ) -> Self {
        Self {
            template: Arc::new(template),
            client,
            params,
        }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn messages_for(&self, text: &str) -> [ChatMessage; 2] {
        [
            ChatMessage::system(SYSTEM_INSTRUCTION),
            ChatMessage::user(self.template.render(text)),
        ]
    }

    pub async fn resolve(&self, text: &str) -> Result<Resolution, ResolveError> {
        let text = text.trim();
        let chars = text.chars().count();
        if chars < MIN_TEXT_CHARS {
            return Err(ResolveError::TooShort);
        }

        let messages = self.messages_for(text);
        let started = Instant::now();
        let reply = self.client.complete(&messages, self.params).await?;
        debug!(
            input_chars = chars,
            reply_chars = reply.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model replied"
        );

        match parse_model_reply(&reply).into_envelope() {
            Some(envelope) => Ok(Resolution::Answered(envelope)),
            None => {
                warn!(reply_chars = reply.chars().count(), "Model reply was not a JSON object");
                Ok(Resolution::Degraded(ResultEnvelope::degraded()))
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{ScriptedClient, resolver_with};
    use super::*;
    use crate::completion::Role;

    #[tokio::test]
    async fn short_text_is_rejected_before_calling_model() {
        let client = ScriptedClient::replying(r#"{"answer":"x"}"#);
        let resolver = resolver_with(client.clone());
        for text in ["", "a", "  ab  ", "\n\t"] {
            let err = resolver.resolve(text).await.unwrap_err();
            assert!(matches!(err, ResolveError::TooShort));
            assert_eq!(err.to_string(), "Text is too short.");
        }
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn sends_system_instruction_and_rendered_prompt() {
        let client = ScriptedClient::replying(r#"{"answer":"4"}"#);
        let resolver = resolver_with(client.clone());
        let resolution = resolver.resolve("  what is 2 + 2?  ").await.unwrap();
        assert_eq!(resolution, Resolution::Answered(ResultEnvelope::new("4")));

        let seen = client.seen.lock();
        let (messages, params) = &seen[0];
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, SYSTEM_INSTRUCTION);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Explain: what is 2 + 2?");
        assert_eq!(params.max_tokens, 500);
    }

    #[tokio::test]
    async fn embedded_object_is_extracted() {
        let resolver = resolver_with(ScriptedClient::replying(r#"Sure! {"answer":"42"} thanks"#));
        let resolution = resolver.resolve("meaning of life").await.unwrap();
        assert_eq!(resolution.envelope().answer, "42");
        assert!(!resolution.is_degraded());
    }

    #[tokio::test]
    async fn unparseable_reply_degrades() {
        let resolver = resolver_with(ScriptedClient::replying("not json at all"));
        let resolution = resolver.resolve("some question").await.unwrap();
        assert!(resolution.is_degraded());
        assert_eq!(resolution.envelope().answer, "—");
    }

    #[tokio::test]
    async fn object_without_answer_is_not_degraded() {
        let resolver = resolver_with(ScriptedClient::replying(r#"{"foo":1}"#));
        let resolution = resolver.resolve("some question").await.unwrap();
        assert_eq!(resolution, Resolution::Answered(ResultEnvelope::new("—")));
    }

    #[tokio::test]
    async fn completion_failure_surfaces_message() {
        let resolver = resolver_with(ScriptedClient::failing(429, "rate limited"));
        let err = resolver.resolve("some question").await.unwrap_err();
        assert!(matches!(err, ResolveError::Completion(_)));
        assert!(err.to_string().contains("rate limited"));
    }
}

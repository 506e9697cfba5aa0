//! Option/Alt + click lookups answered by a hosted language model.
//!
//! The crate has two halves that meet at `POST /ask`:
//!
//! * [`capture`] is the page client. It qualifies the click, extracts a
//!   bounded text sample, dispatches the request and makes sure only the
//!   newest reply ever reaches the tooltip.
//! * [`resolver`] and [`web`] are the server. They render the prompt, call the
//!   model once and coerce whatever comes back into `{ "answer": string }`.

pub mod capture;
pub mod completion;
pub mod config;
pub mod prompt;
pub mod reply;
pub mod resolver;
pub mod web;

pub use completion::{
    ChatMessage, CompletionClient, CompletionError, GenerationParams, GroqClient, Role,
};
pub use config::ServerConfig;
pub use prompt::{PromptError, PromptTemplate};
pub use reply::{ANSWER_PLACEHOLDER, ParsedReply, ResultEnvelope, coerce_answer, parse_model_reply};
pub use resolver::{Resolution, ResolveError, Resolver};

//! Text generation for Ugglan.
//!
//! `OpenAiCompatibleClient` talks to any provider that speaks the OpenAI
//! chat-completions format. `TextGenerator` is the seam the wizards use: it turns a
//! system instruction and a user message into trimmed text, bounded by a timeout.

mod generator;
pub mod openai_compatible;

pub use generator::{CompletionOptions, TextGenerator};
pub use openai_compatible::{OpenAiCompatibleBuilder, OpenAiCompatibleClient};
pub use ugglan_core::{LlmRequest, LlmResponse, Message, ResponseFormat, Role};

use ugglan_core::Runnable;

pub trait Llm: Runnable<LlmRequest, LlmResponse> + Send + Sync {}

impl<T> Llm for T where T: Runnable<LlmRequest, LlmResponse> + Send + Sync {}

mod error;
mod llm;
mod output_parsers;
mod runnable;

pub use error::UgglanError;
pub use llm::{LlmRequest, LlmResponse, Message, ResponseFormat, Role};
pub use output_parsers::{strip_code_fences, JsonOutputParser};
pub use runnable::Runnable;

pub type Value = serde_json::Value;

//! HTTP surface for the Ugglan wizards.
//!
//! Each endpoint accepts `POST` with a JSON body and answers with JSON. Failures are
//! rendered as `{"error": "..."}` with a status derived from the underlying error.

mod config;
mod error;
mod extract;
mod routes;

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use extract::JsonBody;
pub use routes::{router, AppState};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("datastore api error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("no row in '{table}' matching {key}")]
    NotFound { table: String, key: String },
}

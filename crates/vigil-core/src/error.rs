use thiserror::Error;

pub type VigilResult<T> = Result<T, VigilError>;

#[derive(Error, Debug)]
pub enum VigilError {
    /// Task id unknown or past its retention window. Never retried.
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Orchestration error: {0}")]
    Orchestration(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

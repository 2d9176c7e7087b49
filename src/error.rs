use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse failed for {path}: {message}")]
    ParseFailed { path: String, message: String },

    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing environment variable {var}")]
    MissingCredential { var: &'static str },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("engine error: {0}")]
    Engine(#[from] mead_engine::EngineError),

    #[error("ledger error: {0}")]
    Ledger(#[from] ingest_common::LedgerError),

    #[error("repository error: {0}")]
    Repository(#[from] invenio::RepoError),

    #[error("registry error: {0}")]
    Registry(#[from] datacite::RegistryError),

    #[error("media error: {0}")]
    Media(#[from] datacite::MediaError),
}

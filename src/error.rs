use thiserror::Error;

/// Errors raised while building a `QuestionStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no drill items found in data source")]
    EmptyData,
}

/// Errors raised by a `ProgressGateway` while loading or saving progress.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
    #[error("failed to encode progress: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors raised by `SessionController` transitions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown session '{0}'")]
    UnknownGroup(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors raised while fetching the drill data source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request to {url} failed with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Top-level error for CLI commands.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

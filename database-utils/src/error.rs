use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("PostgreSQL error: {0}")]
    PostgreSQL(#[from] tokio_postgres::Error),

    #[error("Error building TLS connector: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Unable to read password: {0}")]
    PasswordPrompt(String),

    #[error("Connection task exited: {0}")]
    ConnectionTask(#[from] tokio::task::JoinError),

    #[error("Expected a single integer value from `{query}`, got {got}")]
    UnexpectedResult { query: String, got: String },
}

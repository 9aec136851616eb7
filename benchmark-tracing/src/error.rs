use tracing_subscriber::filter::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse filter: {0}")]
    Parse(#[from] ParseError),
    #[error("failed to install global subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainwatchError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("News provider error: {0}")]
    NewsProvider(String),

    #[error("Scoring provider error: {0}")]
    ScoringProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BazarrError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bazarr API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Unexpected response from Bazarr: {0}")]
    InvalidResponse(String),

    #[error("Episode {0} has no series id")]
    MissingSeriesId(i64),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BazarrError>;

use thiserror::Error;

/// Everything that can go wrong while processing a single ticker. None of these abort a run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("unexpected page structure: {0}")]
    Parse(String),
    #[error("unreadable value: {0}")]
    Format(String),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ScrapeError {
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Fetch(_) => "fetch",
            ScrapeError::Parse(_) => "parse",
            ScrapeError::Format(_) => "format",
            ScrapeError::Storage(_) => "storage",
        }
    }
}

impl From<reqwest::Error> for ScrapeError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return ScrapeError::Fetch(format!("request timed out: {}", error));
        }
        ScrapeError::Fetch(error.to_string())
    }
}

impl From<serde_json::Error> for ScrapeError {
    fn from(error: serde_json::Error) -> Self {
        ScrapeError::Fetch(format!("unexpected response shape: {}", error))
    }
}

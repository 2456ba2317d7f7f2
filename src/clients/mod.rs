use async_trait::async_trait;

use crate::model::movie::MovieRecord;

pub mod omdb_client;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("no API key configured for the movie information service")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service answered with HTTP status {0}")]
    Status(u16),
    #[error("could not decode the service response: {0}")]
    Decode(String),
    #[error("{0}")]
    Rejected(String),
}

/// Source of canonical movie data, queried by title.
#[async_trait]
pub trait MovieLookup: Send + Sync {
    async fn lookup(&self, title: &str) -> Result<MovieRecord, LookupError>;
}

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;

use crate::{
    clients::{LookupError, MovieLookup},
    model::movie::{parse_rating, MovieRecord, NOT_AVAILABLE},
};

pub const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com/";

#[derive(Debug, Clone)]
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, LookupError> {
        let user_agent = header::HeaderValue::from_static(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        Ok(Self {
            client: Client::builder().user_agent(user_agent).build()?,
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    async fn fetch(&self, title: &str, api_key: &str) -> Result<OmdbResponse, LookupError> {
        log::debug!("Querying {} for title '{}'", self.base_url, title);
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("t", title), ("apikey", api_key)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(LookupError::Status(resp.status().as_u16()));
        }

        resp.json::<OmdbResponse>().await.map_err(|e| {
            if e.is_decode() {
                LookupError::Decode(e.to_string())
            } else {
                LookupError::Transport(e)
            }
        })
    }
}

#[async_trait]
impl MovieLookup for OmdbClient {
    async fn lookup(&self, title: &str) -> Result<MovieRecord, LookupError> {
        let api_key = self.api_key.as_deref().ok_or(LookupError::MissingApiKey)?;
        let response = self.fetch(title, api_key).await?;
        response.into_record()
    }
}

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "imdbRating")]
    rating: Option<String>,
    #[serde(rename = "Actors")]
    actors: Option<String>,
    #[serde(rename = "Poster")]
    poster: Option<String>,
}

impl OmdbResponse {
    fn into_record(self) -> Result<MovieRecord, LookupError> {
        if !self.response.eq_ignore_ascii_case("true") {
            return Err(LookupError::Rejected(
                self.error.unwrap_or_else(|| "Movie not found!".to_string()),
            ));
        }

        let title = match self.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => return Err(LookupError::Decode("response has no title".to_string())),
        };

        Ok(MovieRecord::new(
            title,
            self.year.unwrap_or_default(),
            self.rating.as_deref().and_then(parse_rating),
            self.actors.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            self.poster,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{Read, Write},
        net::TcpListener,
        path::Path,
        thread,
    };

    use super::*;
    use crate::{
        matching::fuzzy_resolver::MatchThresholds,
        model::catalog::Catalog,
        persisters::{json_storage::JsonStorage, MovieStorage},
        service::collection_service::{CollectionError, CollectionService},
    };

    #[test]
    fn converts_successful_response() {
        let body = r#"{
            "Title": "Inception", "Year": "2010", "imdbRating": "8.8",
            "Actors": "Leonardo DiCaprio, Joseph Gordon-Levitt",
            "Poster": "https://example.com/inception.jpg", "Response": "True"
        }"#;

        let movie = serde_json::from_str::<OmdbResponse>(body)
            .unwrap()
            .into_record()
            .unwrap();

        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.rating, Some(8.8));
        assert_eq!(
            movie.poster.as_deref(),
            Some("https://example.com/inception.jpg")
        );
    }

    #[test]
    fn placeholders_become_absent_fields() {
        let body = r#"{"Title": "Obscure", "Year": "1971", "imdbRating": "N/A", "Poster": "N/A", "Response": "True"}"#;

        let movie = serde_json::from_str::<OmdbResponse>(body)
            .unwrap()
            .into_record()
            .unwrap();

        assert_eq!(movie.rating, None);
        assert_eq!(movie.poster, None);
        assert_eq!(movie.actors, NOT_AVAILABLE);
    }

    #[test]
    fn failure_response_carries_service_reason() {
        let body = r#"{"Response": "False", "Error": "Movie not found!"}"#;

        let err = serde_json::from_str::<OmdbResponse>(body)
            .unwrap()
            .into_record()
            .unwrap_err();

        assert_eq!(err.to_string(), "Movie not found!");
    }

    const SERVER_ERROR: &str =
        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    /// Answers `connections` requests with the given raw HTTP response.
    fn serve(response: &'static str, connections: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for _ in 0..connections {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/", addr)
    }

    fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/", addr)
    }

    fn service_with_client(client: OmdbClient, data_file: &Path) -> CollectionService {
        let storage = JsonStorage::new(data_file);
        let catalog = Catalog::from_records(vec![MovieRecord::new(
            "Heat",
            "1995",
            Some(8.3),
            "Al Pacino",
            None,
        )]);
        storage.replace_all(&catalog).unwrap();
        CollectionService::new(
            catalog,
            Box::new(storage),
            Box::new(client),
            MatchThresholds::default(),
        )
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let client = OmdbClient::new(closed_port_url(), Some("key".to_string())).unwrap();

        let err = client.lookup("Inception").await.unwrap_err();

        assert!(matches!(err, LookupError::Transport(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn server_error_is_a_status_error() {
        let url = serve(SERVER_ERROR, 1);
        let client = OmdbClient::new(url, Some("key".to_string())).unwrap();

        let err = client.lookup("Inception").await.unwrap_err();

        assert!(matches!(err, LookupError::Status(500)), "got {:?}", err);
    }

    #[tokio::test]
    async fn failed_requests_leave_the_collection_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let data_file = dir.path().join("data.json");
        for url in [closed_port_url(), serve(SERVER_ERROR, 2)] {
            let client = OmdbClient::new(url, Some("key".to_string())).unwrap();
            let mut service = service_with_client(client, &data_file);
            let before = service.catalog().clone();

            let add = service.add("Inception").await.unwrap_err();
            let update = service.update("Heat").await.unwrap_err();

            assert!(matches!(add, CollectionError::LookupFailed { .. }), "got {:?}", add);
            assert!(
                matches!(update, CollectionError::LookupFailed { .. }),
                "got {:?}",
                update
            );
            assert_eq!(*service.catalog(), before);
            assert_eq!(JsonStorage::new(&data_file).load().unwrap(), before);
        }
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_a_request() {
        let client = OmdbClient::new("http://127.0.0.1:9/", None).unwrap();

        let err = client.lookup("Inception").await.unwrap_err();

        assert!(matches!(err, LookupError::MissingApiKey));
    }
}

//! HTTP client for the GBIF occurrence search endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::FetchError;
use crate::fetcher::{OccurrencePage, OccurrenceSource, PageRequest};

pub const GBIF_OCCURRENCE_SEARCH: &str = "https://api.gbif.org/v1/occurrence/search";

const USER_AGENT: &str = "species_checker/1.0";

#[derive(Debug, Clone)]
pub struct GbifConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Upper bound on a single page request, connect to body.
    pub timeout: Duration,
}

impl Default for GbifConfig {
    fn default() -> Self {
        Self {
            base_url: GBIF_OCCURRENCE_SEARCH.to_string(),
            user_agent: USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Occurrence search client. Cheap to clone; clones share a connection pool.
#[derive(Debug, Clone)]
pub struct GbifClient {
    client: reqwest::Client,
    base_url: String,
}

impl GbifClient {
    /// Create a client for the given search endpoint.
    ///
    /// `base_url` is the full search path, e.g.
    /// `https://api.gbif.org/v1/occurrence/search` (no trailing slash needed).
    pub fn new(config: GbifConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl OccurrenceSource for GbifClient {
    /// Any status other than 200 is an error, as is a body that is not a
    /// search response.
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<OccurrencePage, FetchError> {
        debug!(
            url = %self.base_url,
            scientific_name = request.scientific_name,
            offset = request.offset,
            "requesting occurrence page"
        );
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("scientificName", request.scientific_name.to_string()),
                ("limit", request.limit.to_string()),
                ("offset", request.offset.to_string()),
                ("hasCoordinate", request.has_coordinate.to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::fetcher::{OccurrenceFetcher, PAGE_SIZE, StopReason};

    /// Serve one canned response per connection, in order, and return the
    /// request lines that arrived.
    async fn serve(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut request_lines = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 16 * 1024];
                let mut read = 0;
                loop {
                    let n = stream.read(&mut buf[read..]).await.unwrap();
                    read += n;
                    if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let head = String::from_utf8_lossy(&buf[..read]).to_string();
                request_lines.push(head.lines().next().unwrap_or_default().to_string());

                let reason = if status == 200 { "OK" } else { "Error" };
                let resp = format!(
                    "HTTP/1.1 {status} {reason}\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(resp.as_bytes()).await.unwrap();
                stream.shutdown().await.ok();
            }
            request_lines
        });
        (format!("http://{addr}/v1/occurrence/search"), handle)
    }

    fn client(base_url: String) -> GbifClient {
        GbifClient::new(GbifConfig {
            base_url,
            timeout: Duration::from_secs(5),
            ..GbifConfig::default()
        })
        .unwrap()
    }

    fn full_page_json() -> String {
        let results: Vec<serde_json::Value> = (0..PAGE_SIZE)
            .map(|i| {
                serde_json::json!({
                    "key": i,
                    "decimalLatitude": 60.0 + i as f64 / 1000.0,
                    "decimalLongitude": 24.9,
                })
            })
            .collect();
        serde_json::json!({ "offset": 0, "limit": PAGE_SIZE, "results": results }).to_string()
    }

    #[test]
    fn default_config() {
        let config = GbifConfig::default();
        assert_eq!(config.base_url, "https://api.gbif.org/v1/occurrence/search");
        assert_eq!(config.user_agent, "species_checker/1.0");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = client("http://localhost:8080/search/".into());
        assert_eq!(client.base_url(), "http://localhost:8080/search");
    }

    #[tokio::test]
    async fn pages_until_server_error() {
        let (url, server) = serve(vec![
            (200, full_page_json()),
            (500, "internal error".to_string()),
        ])
        .await;
        let fetcher = OccurrenceFetcher::new(client(url));
        let fetch = fetcher.fetch("Salmo trutta").await;
        let lines = server.await.unwrap();

        assert_eq!(fetch.points.len(), PAGE_SIZE);
        assert_eq!(fetch.requests, 2);
        assert!(matches!(
            fetch.stop,
            StopReason::Upstream {
                offset: 300,
                error: FetchError::Server { status: 500, .. }
            }
        ));
        assert!(lines[0].starts_with("GET /v1/occurrence/search?"));
        assert!(lines[0].contains("scientificName=Salmo+trutta"));
        assert!(lines[0].contains("limit=300&offset=0&hasCoordinate=true"));
        assert!(lines[1].contains("offset=300"));
    }

    #[tokio::test]
    async fn malformed_json_ends_pagination() {
        let (url, server) = serve(vec![(200, "<html>".to_string())]).await;
        let fetcher = OccurrenceFetcher::new(client(url));
        let fetch = fetcher.fetch("Lota lota").await;
        server.await.unwrap();

        assert!(fetch.points.is_empty());
        assert!(matches!(
            fetch.stop,
            StopReason::Upstream {
                error: FetchError::Json(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn connection_refused_ends_pagination() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = OccurrenceFetcher::new(client(format!("http://{addr}/search")));
        let fetch = fetcher.fetch("Esox lucius").await;
        assert!(fetch.points.is_empty());
        assert_eq!(fetch.requests, 1);
        assert!(matches!(
            fetch.stop,
            StopReason::Upstream {
                error: FetchError::Http(_),
                ..
            }
        ));
    }
}

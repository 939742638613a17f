// src/immich/mod.rs
pub mod types;

pub use types::{Asset, PersonRef, PhotoSource};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;

use crate::config::Config;
use crate::error::{FlashbackError, Result};
use crate::windows::DateWindow;

const API_KEY_HEADER: &str = "x-api-key";

/// UTC, millisecond precision, trailing `Z`: `2025-06-20T23:59:59.999Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRandomRequest {
    pub taken_before: String,
    pub taken_after: String,
    pub person_ids: Vec<String>,
    #[serde(rename = "type")]
    pub asset_type: &'static str,
}

impl SearchRandomRequest {
    pub fn new(window: &DateWindow, person_id: &str) -> Self {
        Self {
            taken_before: format_timestamp(&window.end),
            taken_after: format_timestamp(&window.start),
            person_ids: vec![person_id.to_string()],
            asset_type: "IMAGE",
        }
    }
}

/// HTTP client for the Immich REST API.
#[derive(Clone)]
pub struct ImmichClient {
    base_url: String,
    api_token: String,
    client: Client,
}

impl ImmichClient {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            client: Client::new(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.immich_base_url.clone(), cfg.immich_api_token.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn remote(what: impl Into<String>) -> impl FnOnce(reqwest::Error) -> FlashbackError {
    let what = what.into();
    move |source| FlashbackError::RemoteRequestFailed { what, source }
}

#[async_trait]
impl PhotoSource for ImmichClient {
    async fn search_random(&self, window: &DateWindow, person_id: &str) -> Result<Vec<Asset>> {
        let body = SearchRandomRequest::new(window, person_id);
        let what = format!("search person={person_id} year={}", window.year());

        let assets = self
            .client
            .post(self.url("/api/search/random"))
            .header(API_KEY_HEADER, &self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(remote(what.clone()))?
            .error_for_status()
            .map_err(remote(what.clone()))?
            .json::<Vec<Asset>>()
            .await
            .map_err(remote(what))?;
        Ok(assets)
    }

    async fn download_original(&self, asset_id: &str) -> Result<Vec<u8>> {
        let what = format!("download asset={asset_id}");
        let bytes = self
            .client
            .get(self.url(&format!("/api/assets/{asset_id}/original")))
            .header(API_KEY_HEADER, &self.api_token)
            .send()
            .await
            .map_err(remote(what.clone()))?
            .error_for_status()
            .map_err(remote(what.clone()))?
            .bytes()
            .await
            .map_err(remote(what))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers one connection with `response` and hands back the request head.
    async fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 4096];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            String::from_utf8_lossy(&head).to_lowercase()
        });
        (base, handle)
    }

    const SERVER_ERROR: &str =
        "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";

    #[test]
    fn request_body_uses_immich_field_names_and_millis() {
        let window = DateWindow::ending_on(NaiveDate::from_ymd_opt(2025, 6, 20).unwrap());
        let body = serde_json::to_value(SearchRandomRequest::new(&window, "p1")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "takenBefore": "2025-06-20T23:59:59.999Z",
                "takenAfter": "2025-06-13T00:00:00.000Z",
                "personIds": ["p1"],
                "type": "IMAGE",
            })
        );
    }

    #[test]
    fn asset_parses_from_search_response() {
        let raw = r#"[{
            "id": "a1",
            "fileCreatedAt": "2021-06-18T14:03:11.000Z",
            "type": "IMAGE",
            "people": [{"id": "p1", "name": "Ada Lovelace", "birthDate": null}]
        }, {
            "id": "a2",
            "fileCreatedAt": "2021-06-19T09:00:00Z"
        }]"#;
        let assets: Vec<Asset> = serde_json::from_str(raw).unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].people[0].first_name(), "Ada");
        assert!(assets[0].has_person("p1"));
        assert!(assets[1].people.is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = ImmichClient::new("https://photos.example.org/", "tok");
        assert_eq!(
            c.url("/api/search/random"),
            "https://photos.example.org/api/search/random"
        );
    }

    #[tokio::test]
    async fn download_sends_api_key_and_returns_body() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-length: 4\r\nconnection: close\r\n\r\nJPEG",
        )
        .await;
        let client = ImmichClient::new(format!("{base}/"), "tok");

        let bytes = client.download_original("a1").await.unwrap();
        assert_eq!(bytes, b"JPEG");

        let head = server.await.unwrap();
        assert!(head.starts_with("get /api/assets/a1/original http/1.1"), "{head}");
        assert!(head.contains("x-api-key: tok"), "{head}");
    }

    #[tokio::test]
    async fn download_server_error_is_a_remote_failure() {
        let (base, server) = serve_once(SERVER_ERROR).await;
        let client = ImmichClient::new(base, "tok");

        let err = client.download_original("a1").await.unwrap_err();
        assert!(
            matches!(&err, FlashbackError::RemoteRequestFailed { what, .. } if what.contains("a1")),
            "{err:?}"
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn search_server_error_is_a_remote_failure() {
        let (base, server) = serve_once(SERVER_ERROR).await;
        let client = ImmichClient::new(base, "tok");
        let window = DateWindow::ending_on(NaiveDate::from_ymd_opt(2025, 6, 20).unwrap());

        let err = client.search_random(&window, "p1").await.unwrap_err();
        assert!(
            matches!(err, FlashbackError::RemoteRequestFailed { .. }),
            "{err:?}"
        );

        let head = server.await.unwrap();
        assert!(head.starts_with("post /api/search/random http/1.1"), "{head}");
        assert!(head.contains("x-api-key: tok"), "{head}");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_remote_failure() {
        let client = ImmichClient::new("http://127.0.0.1:1", "tok");
        let err = client.download_original("a1").await.unwrap_err();
        assert!(matches!(err, FlashbackError::RemoteRequestFailed { .. }));
    }
}

pub mod error;
pub mod types;

pub use error::{KommoError, Result};
pub use types::{CreatedAtFilter, EmbeddedTag, Lead, LeadEmbedded, LeadsPageQuery, Tag};

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use types::{LeadsResponse, TagsResponse};

const TAGS_PATH: &str = "/api/v4/leads/tags";
const LEADS_PATH: &str = "/api/v4/leads";

/// Per-request timeout for every upstream call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct KommoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for KommoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KommoClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl KommoClient {
    /// Client for an account subdomain such as `acme.kommo.com`. A scheme
    /// prefix or trailing slash on `domain` is tolerated.
    pub fn new(domain: &str, api_key: &str) -> Result<Self> {
        let host = normalize_domain(domain);
        if host.is_empty() {
            return Err(KommoError::InvalidDomain(domain.to_string()));
        }
        Self::with_base_url(&format!("https://{host}"), api_key)
    }

    /// Client against an explicit base URL (proxies, local stubs).
    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the account's lead tag catalog.
    pub async fn tags(&self) -> Result<Vec<Tag>> {
        let url = format!("{}{}", self.base_url, TAGS_PATH);
        let resp: Option<TagsResponse> = self.get_json(&url, &[]).await?;
        let tags = resp
            .and_then(|r| r.embedded)
            .map(|e| e.tags)
            .unwrap_or_default();

        tracing::debug!(count = tags.len(), "Fetched Kommo tag catalog");
        Ok(tags)
    }

    /// Fetch a single page of leads with their tags embedded.
    pub async fn leads_page(&self, query: &LeadsPageQuery) -> Result<Vec<Lead>> {
        let url = format!("{}{}", self.base_url, LEADS_PATH);
        let resp: Option<LeadsResponse> = self.get_json(&url, &query.to_pairs()).await?;
        let leads = resp
            .and_then(|r| r.embedded)
            .map(|e| e.leads)
            .unwrap_or_default();

        tracing::debug!(page = query.page, count = leads.len(), "Fetched Kommo lead page");
        Ok(leads)
    }

    /// GET with bearer auth. `Ok(None)` means the API answered 204 No Content,
    /// which Kommo uses for empty result sets.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(KommoError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.bytes().await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

/// Strip scheme and trailing slashes from a user-supplied account domain.
pub fn normalize_domain(domain: &str) -> String {
    let trimmed = domain.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_domain_strips_scheme_and_slash() {
        assert_eq!(normalize_domain("https://acme.kommo.com/"), "acme.kommo.com");
        assert_eq!(normalize_domain("http://acme.kommo.com"), "acme.kommo.com");
        assert_eq!(normalize_domain("acme.kommo.com"), "acme.kommo.com");
        assert_eq!(normalize_domain("  acme.kommo.com//  "), "acme.kommo.com");
    }

    #[test]
    fn new_rejects_empty_domain() {
        let err = KommoClient::new("https://", "key").unwrap_err();
        assert!(matches!(err, KommoError::InvalidDomain(_)));
    }

    #[test]
    fn new_builds_https_base_url() {
        let client = KommoClient::new("http://acme.kommo.com/", "key").unwrap();
        assert_eq!(client.base_url(), "https://acme.kommo.com");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client = KommoClient::new("acme.kommo.com", "super-secret").unwrap();
        assert!(!format!("{client:?}").contains("super-secret"));
    }

    // -----------------------------------------------------------------------
    // Wire behaviour against a local one-shot HTTP server
    // -----------------------------------------------------------------------

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer a single request with a canned response. The join handle yields
    /// the raw request head as received.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&head).into_owned()
        });

        (base_url, handle)
    }

    #[tokio::test]
    async fn leads_page_sends_query_and_bearer_auth() {
        let body = r#"{"_embedded":{"leads":[{"id":7,"_embedded":{"tags":[{"id":1},{"id":1}]}}]}}"#;
        let (base_url, server) = serve_once("200 OK", body).await;
        let client = KommoClient::with_base_url(&base_url, "secret-token").unwrap();

        let leads = client
            .leads_page(&LeadsPageQuery {
                page: 2,
                limit: 50,
                created_at: Some(CreatedAtFilter { from: 100, to: 200 }),
            })
            .await
            .unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].tag_ids().len(), 1);

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert_eq!(
            request_line,
            "GET /api/v4/leads?with=tags&limit=50&page=2\
             &filter%5Bcreated_at%5D%5Bfrom%5D=100&filter%5Bcreated_at%5D%5Bto%5D=200 HTTP/1.1"
        );
        assert!(
            request.to_ascii_lowercase().contains("authorization: bearer secret-token"),
            "missing bearer auth in:\n{request}"
        );
    }

    #[tokio::test]
    async fn unfiltered_leads_page_omits_created_at() {
        let (base_url, server) = serve_once("200 OK", r#"{"_embedded":{"leads":[]}}"#).await;
        let client = KommoClient::with_base_url(&base_url, "key").unwrap();

        let leads = client
            .leads_page(&LeadsPageQuery {
                page: 1,
                limit: 50,
                created_at: None,
            })
            .await
            .unwrap();
        assert!(leads.is_empty());

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/v4/leads?with=tags&limit=50&page=1 HTTP/1.1"));
    }

    #[tokio::test]
    async fn no_content_is_an_empty_lead_page() {
        let (base_url, server) = serve_once("204 No Content", "").await;
        let client = KommoClient::with_base_url(&base_url, "key").unwrap();

        let leads = client
            .leads_page(&LeadsPageQuery {
                page: 3,
                limit: 50,
                created_at: None,
            })
            .await
            .unwrap();
        assert_eq!(leads, Vec::<Lead>::new());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn no_content_is_an_empty_catalog() {
        let (base_url, server) = serve_once("204 No Content", "").await;
        let client = KommoClient::with_base_url(&base_url, "key").unwrap();

        assert!(client.tags().await.unwrap().is_empty());
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/v4/leads/tags HTTP/1.1"));
    }

    #[tokio::test]
    async fn non_success_status_keeps_body() {
        let body = r#"{"title":"Unauthorized","status":401}"#;
        let (base_url, server) = serve_once("401 Unauthorized", body).await;
        let client = KommoClient::with_base_url(&base_url, "expired").unwrap();

        let err = client.tags().await.unwrap_err();
        match err {
            KommoError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, body);
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let (base_url, server) = serve_once("200 OK", "<html>maintenance</html>").await;
        let client = KommoClient::with_base_url(&base_url, "key").unwrap();

        let err = client.tags().await.unwrap_err();
        assert!(matches!(err, KommoError::Parse(_)), "got {err:?}");
        server.await.unwrap();
    }
}

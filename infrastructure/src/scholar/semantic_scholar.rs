//! Semantic Scholar Graph API client
//!
//! Implements [`ScholarSearchPort`]: paper search with open-access PDF links,
//! and size-capped PDF downloads.

use crate::config::FileHarvestConfig;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use xpcs_application::{PaperHit, ScholarError, ScholarSearchPort};
use xpcs_domain::truncate;

/// Largest PDF body accepted by [`SemanticScholarClient::download_pdf`].
pub const MAX_PDF_BYTES: usize = 50 * 1024 * 1024;

const SEARCH_FIELDS: &str = "title,year,authors,openAccessPdf,url";
const MANUAL_SEARCH_BASE: &str = "https://www.semanticscholar.org/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<ApiPaper>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPaper {
    #[serde(default)]
    title: String,
    year: Option<u16>,
    #[serde(default)]
    authors: Vec<ApiAuthor>,
    open_access_pdf: Option<ApiOpenAccessPdf>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiOpenAccessPdf {
    url: Option<String>,
}

impl From<ApiPaper> for PaperHit {
    fn from(paper: ApiPaper) -> Self {
        PaperHit {
            title: paper.title,
            year: paper.year,
            authors: paper.authors.into_iter().filter_map(|a| a.name).collect(),
            pdf_url: paper
                .open_access_pdf
                .and_then(|p| p.url)
                .filter(|u| !u.trim().is_empty()),
            landing_url: paper.url,
        }
    }
}

pub struct SemanticScholarClient {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    max_pdf_bytes: usize,
}

impl SemanticScholarClient {
    pub fn new(api_base: impl Into<String>, user_agent: &str) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            api_base: api_base.into(),
            api_key: None,
            max_pdf_bytes: MAX_PDF_BYTES,
        }
    }

    pub fn from_config(config: &FileHarvestConfig) -> Self {
        let client = Self::new(&config.api_base, &config.user_agent);
        match config.api_key() {
            Some(key) => client.with_api_key(key),
            None => client,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_max_pdf_bytes(mut self, limit: usize) -> Self {
        self.max_pdf_bytes = limit;
        self
    }

    fn search_url(&self, query: &str, limit: usize) -> Result<Url, ScholarError> {
        let base = format!("{}/graph/v1/paper/search", self.api_base.trim_end_matches('/'));
        let limit = limit.max(1).to_string();
        Url::parse_with_params(
            &base,
            &[
                ("query", query),
                ("limit", limit.as_str()),
                ("fields", SEARCH_FIELDS),
            ],
        )
        .map_err(|e| ScholarError::InvalidResponse(format!("bad search URL {base}: {e}")))
    }
}

fn transport_error(e: reqwest::Error) -> ScholarError {
    if e.is_timeout() {
        ScholarError::Timeout
    } else {
        ScholarError::Connection(e.to_string())
    }
}

async fn status_error(response: reqwest::Response) -> ScholarError {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ScholarError::RateLimited;
    }
    let body = response.text().await.unwrap_or_default();
    ScholarError::Http {
        status: status.as_u16(),
        message: truncate(body.trim(), 200),
    }
}

#[async_trait]
impl ScholarSearchPort for SemanticScholarClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PaperHit>, ScholarError> {
        let url = self.search_url(query, limit)?;
        debug!("Semantic Scholar search: {}", truncate(query, 80));

        let mut request = self.http.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }
        let response = request.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ScholarError::InvalidResponse(e.to_string()))?;
        Ok(body.data.into_iter().map(PaperHit::from).collect())
    }

    async fn download_pdf(&self, url: &str) -> Result<Vec<u8>, ScholarError> {
        let mut response = self.http.get(url).send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let limit = self.max_pdf_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(ScholarError::TooLarge { limit });
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
            if bytes.len() + chunk.len() > limit {
                return Err(ScholarError::TooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }
        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }

    fn manual_search_url(&self, query: &str) -> String {
        Url::parse_with_params(MANUAL_SEARCH_BASE, &[("q", query)])
            .map(String::from)
            .unwrap_or_else(|_| MANUAL_SEARCH_BASE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TITLE: &str = "Atomic-scale relaxation dynamics and aging in a metallic glass probed by X-ray photon correlation spectroscopy";

    fn client(server: &MockServer) -> SemanticScholarClient {
        SemanticScholarClient::new(server.uri(), "xpcs-test")
    }

    #[tokio::test]
    async fn test_search_maps_open_access_pdf() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/graph/v1/paper/search"))
            .and(query_param("query", TITLE))
            .and(query_param("limit", "5"))
            .and(query_param("fields", SEARCH_FIELDS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 2,
                "offset": 0,
                "data": [
                    {
                        "paperId": "a1",
                        "title": TITLE,
                        "year": 2012,
                        "authors": [{"authorId": "1", "name": "B. Ruta"}, {"authorId": "2", "name": "Y. Chushkin"}],
                        "openAccessPdf": {"url": "https://arxiv.org/pdf/1205.0000.pdf", "status": "GREEN"},
                        "url": "https://www.semanticscholar.org/paper/a1"
                    },
                    {"paperId": "b2", "title": "Unrelated", "year": null, "authors": [], "openAccessPdf": null, "url": null}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let hits = client(&server).search(TITLE, 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].year, Some(2012));
        assert_eq!(hits[0].authors, vec!["B. Ruta", "Y. Chushkin"]);
        assert_eq!(hits[0].pdf_url.as_deref(), Some("https://arxiv.org/pdf/1205.0000.pdf"));
        assert_eq!(hits[1].pdf_url, None);
        assert_eq!(hits[1].landing_url, None);
    }

    #[tokio::test]
    async fn test_api_key_header_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("x-api-key", "s2-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let hits = client(&server)
            .with_api_key("s2-key")
            .search("speckle", 3)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        let err = client(&server).search("speckle", 3).await.unwrap_err();
        assert_eq!(err, ScholarError::RateLimited);
    }

    #[tokio::test]
    async fn test_download_pdf_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/ruta.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.5\n...".to_vec()))
            .mount(&server)
            .await;
        let bytes = client(&server)
            .download_pdf(&format!("{}/files/ruta.pdf", server.uri()))
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_download_size_cap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 2048]))
            .mount(&server)
            .await;
        let err = client(&server)
            .with_max_pdf_bytes(1024)
            .download_pdf(&format!("{}/big.pdf", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err, ScholarError::TooLarge { limit: 1024 });
    }

    #[tokio::test]
    async fn test_download_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;
        let err = client(&server)
            .download_pdf(&format!("{}/missing.pdf", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ScholarError::Http { status: 404, .. }));
    }

    #[test]
    fn test_manual_search_url_is_encoded() {
        let client = SemanticScholarClient::new("http://unused", "xpcs-test");
        let url = client.manual_search_url("Laponite: gel or glass?");
        assert!(url.starts_with("https://www.semanticscholar.org/search?q="));
        assert!(url.contains("Laponite%3A+gel+or+glass%3F"));
    }
}

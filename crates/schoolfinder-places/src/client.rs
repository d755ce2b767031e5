use async_trait::async_trait;
use tracing::debug;

use schoolfinder_core::{Page, PageRequest, RecordSource, SourceError};

/// Client for a running directory server's `/api/places` endpoint.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: crate::http_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(token) = &request.token {
            params.push(("pagetoken", token.as_str()));
        }
        if let Some(query) = &request.query {
            params.push(("query", query.as_str()));
        }

        let response = self
            .client
            .get(format!("{}/api/places", self.base_url))
            .query(&params)
            .send()
            .await
            .map_err(crate::transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::from_status(status.as_u16(), body));
        }

        let page: Page = response.json().await.map_err(crate::transport_error)?;
        debug!(returned = page.results.len(), has_more = page.has_more(), "page received");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolfinder_core::PageToken;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn decodes_page_and_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/places"))
            .and(query_param("pagetoken", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{
                    "id": "gmap-11",
                    "name": "Corona School",
                    "coordinates": { "lat": 6.5, "lng": 3.4 },
                    "address": { "street": "1 Road", "lga": "Ikeja", "state": "Lagos" },
                    "rating": "4.1"
                }],
                "next_page_token": "20"
            })))
            .mount(&server)
            .await;

        let source = HttpSource::new(format!("{}/", server.uri()));
        let page = source
            .fetch_page(&PageRequest::after(PageToken::from_raw("10")))
            .await
            .unwrap();
        assert_eq!(page.results[0].id.as_str(), "gmap-11");
        assert!((page.results[0].rating - 4.1).abs() < 1e-9);
        assert_eq!(page.next_page_token.unwrap().as_str(), "20");
    }

    #[tokio::test]
    async fn bad_token_response_is_invalid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error":"invalid page token: zz","kind":"invalid_token"}"#),
            )
            .mount(&server)
            .await;

        let source = HttpSource::new(server.uri());
        let err = source
            .fetch_page(&PageRequest::after(PageToken::from_raw("zz")))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = HttpSource::new(server.uri())
            .fetch_page(&PageRequest::first())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_unavailable() {
        let err = HttpSource::new("http://127.0.0.1:1")
            .fetch_page(&PageRequest::first())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
        assert!(err.is_retryable());
    }
}

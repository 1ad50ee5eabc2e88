//! Async HTTP client wrapping reqwest.
//!
//! Form posts only. Redirects and timeouts are left to reqwest; there is no
//! retry, so a failed request surfaces immediately.

use std::time::Duration;

use crate::config::EnquiryConfig;
use crate::types::{EnquiryError, EnquiryResult};

/// Response to a form post, with the body fully read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as UTF-8.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client shared by both lookup stages.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &EnquiryConfig) -> EnquiryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }

    /// POST url-encoded form fields, preserving their order, and read the
    /// whole body before returning so the connection is released.
    pub async fn post_form(
        &self,
        url: &str,
        form_fields: &[(String, String)],
    ) -> EnquiryResult<HttpResponse> {
        tracing::debug!("POST {url} ({} form fields)", form_fields.len());

        let r = self.client.post(url).form(form_fields).send().await?;
        let status = r.status().as_u16();
        let final_url = r.url().to_string();
        let bytes = r.bytes().await?;

        let body = String::from_utf8(bytes.to_vec()).map_err(|e| {
            EnquiryError::Parse(format!("response from {final_url} is not valid UTF-8: {e}"))
        })?;

        let response = HttpResponse {
            url: url.to_string(),
            final_url,
            status,
            body,
        };

        if !response.is_success() {
            // Rate limiting and maintenance pages still render HTML; the
            // layout decides whether the page is usable.
            tracing::warn!(
                "{} answered with HTTP {} (final URL {})",
                response.url,
                response.status,
                response.final_url
            );
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new(&EnquiryConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_success_range() {
        let mut resp = HttpResponse {
            url: "https://example.com".to_string(),
            final_url: "https://example.com".to_string(),
            status: 200,
            body: String::new(),
        };
        assert!(resp.is_success());
        resp.status = 429;
        assert!(!resp.is_success());
    }

    #[tokio::test]
    async fn test_error_status_keeps_body_and_urls() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ConfirmVehicle"))
            .respond_with(
                ResponseTemplate::new(503).set_body_string("<html><h1>Maintenance</h1></html>"),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new(&EnquiryConfig::default()).unwrap();
        let url = format!("{}/ConfirmVehicle", server.uri());
        let fields = vec![("Vrm".to_string(), "AB12CDE".to_string())];
        let resp = client.post_form(&url, &fields).await.unwrap();

        assert_eq!(resp.status, 503);
        assert!(!resp.is_success());
        assert_eq!(resp.url, url);
        assert_eq!(resp.final_url, url);
        assert!(resp.body.contains("Maintenance"));
    }
}

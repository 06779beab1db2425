//! Client for a Resend-compatible transactional email HTTP API.
//!
//! - Endpoint: `POST {base_url}/emails`
//! - Authentication: `Authorization: Bearer <key>`
//! - Body: `{"from", "to": [...], "subject", "html", "text"}`

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::EmailError;

/// Request body of `POST /emails`.
#[derive(Debug, Serialize)]
pub(crate) struct SendEmailRequest<'a> {
    pub from: &'a str,
    pub to: Vec<&'a str>,
    pub subject: &'a str,
    pub html: &'a str,
    pub text: &'a str,
}

/// Response body of `POST /emails`.
#[derive(Debug, Deserialize)]
pub(crate) struct SendEmailResponse {
    pub id: String,
}

/// Email API client.
#[derive(Clone)]
pub struct EmailApiClient {
    inner: Arc<EmailApiClientInner>,
}

struct EmailApiClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl EmailApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(base_url: &str, api_key: &SecretString) -> Result<Self, EmailError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", api_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| EmailError::Api(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            inner: Arc::new(EmailApiClientInner {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Submit one message. Returns the provider's message id.
    pub(crate) async fn send(&self, request: &SendEmailRequest<'_>) -> Result<String, EmailError> {
        let url = format!("{}/emails", self.inner.base_url);
        let response = self.inner.client.post(&url).json(request).send().await?;

        let status = response.status();
        if status.is_success() {
            let body: SendEmailResponse = response
                .json()
                .await
                .map_err(|e| EmailError::Api(format!("Failed to parse response: {e}")))?;
            return Ok(body.id);
        }

        Err(Self::parse_error(response).await)
    }

    async fn parse_error(response: reqwest::Response) -> EmailError {
        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return EmailError::Api("unauthorized: invalid API key".to_string());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        EmailError::Api(format!("{status} - {message}"))
    }
}

impl std::fmt::Debug for EmailApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn request() -> SendEmailRequest<'static> {
        SendEmailRequest {
            from: "Vitrine <noreply@vitrine-immo.fr>",
            to: vec!["paul.durand@example.fr"],
            subject: "Your site is live",
            html: "<p>Hello</p>",
            text: "Hello",
        }
    }

    #[tokio::test]
    async fn test_send_posts_json_with_bearer_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("Authorization", "Bearer re_test_key"))
            .and(body_json(json!({
                "from": "Vitrine <noreply@vitrine-immo.fr>",
                "to": ["paul.durand@example.fr"],
                "subject": "Your site is live",
                "html": "<p>Hello</p>",
                "text": "Hello",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "msg_123"})))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            EmailApiClient::new(&server.uri(), &SecretString::from("re_test_key")).unwrap();
        let id = client.send(&request()).await.unwrap();

        assert_eq!(id, "msg_123");
    }

    #[tokio::test]
    async fn test_send_reports_api_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(
                ResponseTemplate::new(422).set_body_string("invalid `to` field"),
            )
            .mount(&server)
            .await;

        let client =
            EmailApiClient::new(&server.uri(), &SecretString::from("re_test_key")).unwrap();
        let err = client.send(&request()).await.unwrap_err();

        assert!(matches!(err, EmailError::Api(ref msg) if msg.contains("422")));
    }

    #[tokio::test]
    async fn test_send_maps_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = EmailApiClient::new(&server.uri(), &SecretString::from("bad")).unwrap();
        let err = client.send(&request()).await.unwrap_err();

        assert!(matches!(err, EmailError::Api(ref msg) if msg.contains("unauthorized")));
    }
}

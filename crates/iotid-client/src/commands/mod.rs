/*!
 * Command implementations
 */

pub mod ca;
pub mod device;
pub mod enroll;
pub mod org;

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::types::ErrorResponse;

/// Thin HTTP client for one iotid listener
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        }
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode a JSON success body
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        response
            .json()
            .await
            .context("Failed to decode server response")
    }

    /// Send, turning non-2xx responses into errors
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            anyhow::bail!("{}", describe_error(status.as_u16(), &error_text));
        }

        Ok(response)
    }
}

/// Render an error body as `CODE: message (HTTP status)`
fn describe_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error) => format!("{}: {} (HTTP {})", error.code, error.message, status),
        Err(_) if body.is_empty() => format!("Request failed with HTTP {}", status),
        Err(_) => format!("Request failed with HTTP {}: {}", status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_error_envelope() {
        let body = r#"{"code":"ALREADY_ENROLLED","message":"Device already enrolled: 42"}"#;
        assert_eq!(
            describe_error(409, body),
            "ALREADY_ENROLLED: Device already enrolled: 42 (HTTP 409)"
        );
    }

    #[test]
    fn test_describe_error_plain_body() {
        assert_eq!(describe_error(502, ""), "Request failed with HTTP 502");
        assert_eq!(
            describe_error(500, "boom"),
            "Request failed with HTTP 500: boom"
        );
    }
}

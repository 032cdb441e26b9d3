//! Authenticated JSON client shared by the Slides and Drive clients.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::auth::AccessToken;
use crate::error::{ApiError, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP client sending bearer-authenticated JSON requests.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    token: AccessToken,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client using the default timeout.
    pub fn new(token: AccessToken) -> Result<Self> {
        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT)?,
            token,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` and decode the JSON response.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self.send(self.client.get(url).query(query))?;
        Ok(response.json()?)
    }

    /// POST a JSON body to `url` and decode the JSON response.
    pub fn post_json<B, T>(&self, url: &str, query: &[(&str, &str)], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.client.post(url).query(query).json(body))?;
        Ok(response.json()?)
    }

    /// PATCH a JSON body to `url` and decode the JSON response.
    pub fn patch_json<B, T>(&self, url: &str, query: &[(&str, &str)], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.client.patch(url).query(query).json(body))?;
        Ok(response.json()?)
    }

    /// DELETE `url`, ignoring any response body.
    pub fn delete(&self, url: &str) -> Result<()> {
        self.send(self.client.delete(url))?;
        Ok(())
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.bearer_auth(self.token.secret()).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response);
            log::debug!("Request failed with {}: {}", status, body);
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(response)
    }
}

/// Body of a failed response; a body that cannot be read counts as empty.
pub(crate) fn read_error_body(response: Response) -> String {
    response.text().unwrap_or_else(|e| {
        log::debug!("Could not read error response body: {}", e);
        String::new()
    })
}

fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Pull `error.message` out of a Google error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{json_response, serve_once};

    #[test]
    fn test_error_message_from_google_envelope() {
        let body = r#"{"error": {"code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED"}}"#;
        assert_eq!(error_message(body), "The caller does not have permission");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(""), "Unknown error");
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_server_error_uses_google_message() {
        let (url, server) = serve_once(json_response(
            "404 Not Found",
            r#"{"error": {"code": 404, "message": "Requested entity was not found."}}"#,
        ));
        let client = ApiClient::new(AccessToken::new("ya29.test").unwrap()).unwrap();

        let err = client
            .get_json::<serde_json::Value>(&format!("{}/v1/x", url), &[])
            .unwrap_err();

        assert!(matches!(
            err,
            ApiError::Server { status: 404, ref message } if message == "Requested entity was not found."
        ));
        let request = server.join().unwrap();
        assert!(request.starts_with("GET /v1/x "));
        assert!(request
            .to_ascii_lowercase()
            .contains("authorization: bearer ya29.test"));
    }

    #[test]
    fn test_unreadable_error_body_still_reports_status() {
        // body promised by Content-Length never arrives
        let (url, server) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial"
                .to_string(),
        );
        let client = ApiClient::new(AccessToken::new("t").unwrap()).unwrap();

        let err = client.delete(&url).unwrap_err();

        assert!(matches!(
            err,
            ApiError::Server { status: 500, ref message } if message == "Unknown error"
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_with_timeout() {
        let client = ApiClient::new(AccessToken::new("t").unwrap())
            .unwrap()
            .with_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }
}

//! OAuth access tokens.
//!
//! A token is minted from a service-account JSON key (signed JWT assertion
//! exchanged at the key's token endpoint), passed explicitly, read from the
//! environment, or obtained from the `gcloud` CLI. The token must carry the
//! `drive` and `presentations` scopes for the calls made by this crate.

use std::fmt;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::http::{read_error_body, DEFAULT_TIMEOUT};

/// Environment variable consulted by [`AccessToken::from_env`].
pub const TOKEN_ENV_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// OAuth scopes the token needs.
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/presentations",
];

/// Google's OAuth token endpoint, used when a key file names none.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of a signed assertion; Google accepts at most one hour.
const ASSERTION_LIFETIME: Duration = Duration::from_secs(3600);

/// The parts of a service-account JSON key needed to mint tokens.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    private_key: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Load a key file downloaded from the Cloud console.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// RS256-signed assertion requesting `scopes`, issued at `issued_at`
    /// (seconds since the epoch).
    pub fn assertion(&self, scopes: &[&str], issued_at: u64) -> Result<String> {
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: scopes.join(" "),
            aud: self.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME.as_secs(),
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(&header, &claims, &key)?)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Error body of the OAuth token endpoint.
#[derive(Debug, Deserialize)]
struct OAuthError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn oauth_error_message(body: &str) -> String {
    match serde_json::from_str::<OAuthError>(body) {
        Ok(OAuthError {
            error,
            error_description: Some(description),
        }) => format!("{}: {}", error, description),
        Ok(OAuthError { error, .. }) => error,
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn token_request_form(assertion: &str) -> [(&'static str, &str); 2] {
    [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)]
}

fn unix_now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|e| ApiError::Auth(format!("system clock is before the epoch: {}", e)))
}

/// A bearer token. The value is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a token, rejecting empty input.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(ApiError::Auth("access token is empty".to_string()));
        }
        Ok(Self(token))
    }

    /// Read the token from `GOOGLE_OAUTH_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV_VAR)
            .map_err(|_| ApiError::Auth(format!("{} is not set", TOKEN_ENV_VAR)))?;
        Self::new(token)
    }

    /// Mint a token from the service-account key at `path`.
    pub fn from_service_account_file(path: impl AsRef<Path>, scopes: &[&str]) -> Result<Self> {
        let key = ServiceAccountKey::from_file(path)?;
        Self::from_service_account(&key, scopes, DEFAULT_TIMEOUT)
    }

    /// Exchange a signed assertion for an access token at the key's token endpoint.
    pub fn from_service_account(
        key: &ServiceAccountKey,
        scopes: &[&str],
        timeout: Duration,
    ) -> Result<Self> {
        let assertion = key.assertion(scopes, unix_now()?)?;

        log::debug!(
            "Requesting access token for {} from {}",
            key.client_email,
            key.token_uri
        );
        let client = Client::builder().timeout(timeout).build()?;
        let response = client
            .post(&key.token_uri)
            .form(&token_request_form(&assertion))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response);
            return Err(ApiError::Auth(format!(
                "token request for {} failed ({}): {}",
                key.client_email,
                status.as_u16(),
                oauth_error_message(&body)
            )));
        }

        let token: TokenResponse = response.json()?;
        Self::new(token.access_token)
    }

    /// Ask `gcloud auth print-access-token` for a token, optionally
    /// impersonating a service account.
    pub fn from_gcloud(impersonate_service_account: Option<&str>) -> Result<Self> {
        let mut command = Command::new("gcloud");
        command.args(gcloud_args(impersonate_service_account));

        log::debug!("Requesting access token from gcloud");
        let output = command.output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApiError::Auth(format!(
                "gcloud auth print-access-token failed: {}",
                stderr.trim()
            )));
        }

        Self::new(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// The raw token, for the `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

fn gcloud_args(impersonate_service_account: Option<&str>) -> Vec<String> {
    let mut args = vec!["auth".to_string(), "print-access-token".to_string()];
    if let Some(account) = impersonate_service_account {
        args.push(format!("--impersonate-service-account={}", account));
        args.push(format!("--scopes={}", DEFAULT_SCOPES.join(",")));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{json_response, serve_once};
    use jsonwebtoken::{DecodingKey, Validation};

    const KEY_JSON: &str = include_str!("../testdata/service_account.json");
    const PUBLIC_KEY_PEM: &str = include_str!("../testdata/service_account.pub.pem");

    fn decode_claims(assertion: &str, audience: &str) -> AssertionClaims {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);
        validation.set_issuer(&["slides-bot@slides-test.iam.gserviceaccount.com"]);
        let key = DecodingKey::from_rsa_pem(PUBLIC_KEY_PEM.as_bytes()).unwrap();
        jsonwebtoken::decode::<AssertionClaims>(assertion, &key, &validation)
            .unwrap()
            .claims
    }

    #[test]
    fn test_service_account_key_from_json() {
        let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        assert_eq!(key.client_email, "slides-bot@slides-test.iam.gserviceaccount.com");
        assert_eq!(key.private_key_id.as_deref(), Some("0123456789abcdef"));
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert!(!format!("{:?}", key).contains("PRIVATE KEY"));
    }

    #[test]
    fn test_service_account_key_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "a@b.iam.gserviceaccount.com", "private_key": "x"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(key.private_key_id, None);
    }

    #[test]
    fn test_service_account_key_missing_file() {
        let err = ServiceAccountKey::from_file("testdata/does-not-exist.json").unwrap_err();
        assert!(matches!(err, ApiError::Io(_)));
    }

    #[test]
    fn test_assertion_claims() {
        let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        let issued_at = unix_now().unwrap();

        let assertion = key.assertion(DEFAULT_SCOPES, issued_at).unwrap();

        let header = jsonwebtoken::decode_header(&assertion).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("0123456789abcdef"));
        assert_eq!(
            decode_claims(&assertion, DEFAULT_TOKEN_URI),
            AssertionClaims {
                iss: "slides-bot@slides-test.iam.gserviceaccount.com".to_string(),
                scope: "https://www.googleapis.com/auth/drive https://www.googleapis.com/auth/presentations"
                    .to_string(),
                aud: DEFAULT_TOKEN_URI.to_string(),
                iat: issued_at,
                exp: issued_at + 3600,
            }
        );
    }

    #[test]
    fn test_assertion_rejects_bad_private_key() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "a@b.iam.gserviceaccount.com", "private_key": "not a pem"}"#,
        )
        .unwrap();
        assert!(matches!(key.assertion(DEFAULT_SCOPES, 0), Err(ApiError::Jwt(_))));
    }

    #[test]
    fn test_token_request_form() {
        assert_eq!(
            token_request_form("a.b.c"),
            [
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", "a.b.c"),
            ]
        );
    }

    #[test]
    fn test_from_service_account_exchanges_assertion() {
        let (url, server) = serve_once(json_response(
            "200 OK",
            r#"{"access_token": "ya29.minted", "expires_in": 3599, "token_type": "Bearer"}"#,
        ));
        let mut key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        key.token_uri = format!("{}/token", url);

        let token =
            AccessToken::from_service_account(&key, DEFAULT_SCOPES, Duration::from_secs(5)).unwrap();

        assert_eq!(token.secret(), "ya29.minted");
        let request = server.join().unwrap();
        assert!(request.starts_with("POST /token "));
        let body = request.split("\r\n\r\n").nth(1).unwrap();
        assert!(body.starts_with(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer&assertion="
        ));
        let assertion = body.split("assertion=").nth(1).unwrap();
        let claims = decode_claims(assertion, &key.token_uri);
        assert_eq!(claims.aud, key.token_uri);
    }

    #[test]
    fn test_from_service_account_reports_oauth_error() {
        let (url, server) = serve_once(json_response(
            "400 Bad Request",
            r#"{"error": "invalid_grant", "error_description": "Invalid JWT Signature."}"#,
        ));
        let mut key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        key.token_uri = url;

        let err = AccessToken::from_service_account(&key, DEFAULT_SCOPES, Duration::from_secs(5))
            .unwrap_err();

        match err {
            ApiError::Auth(message) => {
                assert!(message.contains("(400)"));
                assert!(message.ends_with("invalid_grant: Invalid JWT Signature."));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_oauth_error_message_fallbacks() {
        assert_eq!(oauth_error_message(r#"{"error": "invalid_scope"}"#), "invalid_scope");
        assert_eq!(oauth_error_message(""), "Unknown error");
        assert_eq!(oauth_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_new_trims_and_rejects_empty() {
        assert_eq!(AccessToken::new("  ya29.abc\n").unwrap().secret(), "ya29.abc");
        assert!(matches!(AccessToken::new(" \n"), Err(ApiError::Auth(_))));
    }

    #[test]
    fn test_debug_hides_secret() {
        let token = AccessToken::new("ya29.secret").unwrap();
        assert_eq!(format!("{:?}", token), "AccessToken(***)");
    }

    #[test]
    fn test_gcloud_args() {
        assert_eq!(gcloud_args(None), vec!["auth", "print-access-token"]);
        assert_eq!(
            gcloud_args(Some("bot@project.iam.gserviceaccount.com")),
            vec![
                "auth",
                "print-access-token",
                "--impersonate-service-account=bot@project.iam.gserviceaccount.com",
                "--scopes=https://www.googleapis.com/auth/drive,https://www.googleapis.com/auth/presentations",
            ]
        );
    }
}

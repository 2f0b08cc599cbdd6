//! Password-grant login against the Salesforce OAuth token endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AuthError;
use crate::session::{CrmSession, Credentials};

/// Establishes CRM sessions.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for a session.
    async fn login(&self, credentials: &Credentials) -> Result<CrmSession, AuthError>;
}

/// OAuth 2.0 username-password flow.
pub struct SalesforceAuthenticator {
    client: Client,
    login_url: String,
}

impl SalesforceAuthenticator {
    pub fn new(login_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            login_url: login_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    instance_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

#[async_trait]
impl Authenticator for SalesforceAuthenticator {
    async fn login(&self, credentials: &Credentials) -> Result<CrmSession, AuthError> {
        let url = format!("{}/services/oauth2/token", self.login_url);

        // The security token, when set, is appended to the password.
        let mut password = credentials.password.expose_secret().to_string();
        if let Some(token) = &credentials.security_token {
            password.push_str(token.expose_secret());
        }

        let form = [
            ("grant_type", "password"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.expose_secret()),
            ("username", credentials.username.as_str()),
            ("password", password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenError>(&body) {
                Ok(err) if !err.error_description.is_empty() => {
                    format!("{}: {}", err.error, err.error_description)
                }
                Ok(err) if !err.error.is_empty() => err.error,
                _ => format!("HTTP {}: {}", status, body),
            };
            warn!(username = %credentials.username, status = %status, "Login rejected");
            return Err(AuthError::InvalidLogin(message));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;

        info!(username = %credentials.username, instance = %token.instance_url, "Logged in");
        Ok(CrmSession::new(token.instance_url, token.access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials(security_token: Option<&str>) -> Credentials {
        Credentials {
            username: "ops@example.com".to_string(),
            password: SecretString::from("hunter2"),
            security_token: security_token.map(SecretString::from),
            client_id: "client".to_string(),
            client_secret: SecretString::from("secret"),
        }
    }

    #[tokio::test]
    async fn test_login_success_appends_security_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("password=hunter2XYZ"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "00Dxx!token",
                "instance_url": "https://acme.my.salesforce.com",
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let auth = SalesforceAuthenticator::new(server.uri(), Duration::from_secs(5)).unwrap();
        let session = auth.login(&credentials(Some("XYZ"))).await.unwrap();
        assert_eq!(session.instance_url, "https://acme.my.salesforce.com");
        assert_eq!(session.access_token.expose_secret(), "00Dxx!token");
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "authentication failure"
            })))
            .mount(&server)
            .await;

        let auth = SalesforceAuthenticator::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = auth.login(&credentials(None)).await.unwrap_err();
        match err {
            AuthError::InvalidLogin(message) => {
                assert_eq!(message, "invalid_grant: authentication failure")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

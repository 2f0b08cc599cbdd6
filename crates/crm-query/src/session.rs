//! CRM session handle and login credentials.

use secrecy::SecretString;

use crm_types::SalesforceSettings;

use crate::error::AuthError;

/// An authenticated CRM session. Dropping it is the whole of logout.
#[derive(Debug, Clone)]
pub struct CrmSession {
    /// Base URL of the org's instance (e.g. "https://acme.my.salesforce.com")
    pub instance_url: String,

    /// Bearer token
    pub access_token: SecretString,
}

impl CrmSession {
    /// Create a session handle.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            access_token: SecretString::from(access_token.into()),
        }
    }
}

/// Password-grant credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub security_token: Option<SecretString>,
    pub client_id: String,
    pub client_secret: SecretString,
}

impl Credentials {
    /// Collect credentials from settings.
    pub fn from_settings(settings: &SalesforceSettings) -> Result<Self, AuthError> {
        fn required(value: &Option<String>, name: &str) -> Result<String, AuthError> {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AuthError::MissingCredentials(format!("salesforce.{} is not set", name)))
        }

        Ok(Self {
            username: required(&settings.username, "username")?,
            password: SecretString::from(required(&settings.password, "password")?),
            security_token: settings
                .security_token
                .clone()
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
            client_id: required(&settings.client_id, "client_id")?,
            client_secret: SecretString::from(required(&settings.client_secret, "client_secret")?),
        })
    }
}

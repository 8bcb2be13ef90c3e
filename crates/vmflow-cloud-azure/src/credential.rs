//! Service principal credentials
//!
//! Reads the four identifying values from the environment and exchanges the
//! client secret for a bearer token with the Microsoft identity platform
//! (OAuth2 client-credentials grant).

use crate::error::{AzureError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const TENANT_ID_ENV: &str = "AZURE_TENANT_ID";
pub const CLIENT_ID_ENV: &str = "AZURE_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "AZURE_CLIENT_SECRET";
pub const SUBSCRIPTION_ID_ENV: &str = "AZURE_SUBSCRIPTION_ID";
pub const AUTHORITY_HOST_ENV: &str = "AZURE_AUTHORITY_HOST";

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Tokens this close to expiry are refreshed before use
const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Source of bearer tokens for ARM requests
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Return a token valid for at least the next few minutes
    async fn token(&self) -> Result<String>;
}

/// Identity values read from the process environment
#[derive(Clone)]
pub struct EnvironmentCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
}

impl EnvironmentCredentials {
    /// Read `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET` and
    /// `AZURE_SUBSCRIPTION_ID`. Empty values count as missing.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            tenant_id: required_env(TENANT_ID_ENV)?,
            client_id: required_env(CLIENT_ID_ENV)?,
            client_secret: required_env(CLIENT_SECRET_ENV)?,
            subscription_id: required_env(SUBSCRIPTION_ID_ENV)?,
        })
    }
}

impl std::fmt::Debug for EnvironmentCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentCredentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(AzureError::MissingEnvVar(name.to_string())),
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    secret: String,
    expires_at: Instant,
}

/// Client-secret credential with an in-memory token cache
pub struct ClientSecretCredential {
    client: reqwest::Client,
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    cache: Mutex<Option<CachedToken>>,
}

impl ClientSecretCredential {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        let authority_host = std::env::var(AUTHORITY_HOST_ENV)
            .ok()
            .map(|h| h.trim_end_matches('/').to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());

        Self {
            client: reqwest::Client::new(),
            authority_host,
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn from_credentials(credentials: &EnvironmentCredentials) -> Self {
        Self::new(
            &credentials.tenant_id,
            &credentials.client_id,
            &credentials.client_secret,
        )
    }

    /// Override the identity platform host (sovereign clouds, tests)
    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = host.into().trim_end_matches('/').to_string();
        self
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.tenant_id
        )
    }

    async fn request_token(&self) -> Result<CachedToken> {
        tracing::debug!("Requesting management token for client {}", self.client_id);

        let response = self
            .client
            .post(self.token_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", MANAGEMENT_SCOPE),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => format!("{}: {}", err.error, err.error_description),
                Err(_) => format!("HTTP {}", status.as_u16()),
            };
            return Err(AzureError::AuthenticationFailed(message));
        }

        let token: TokenResponse = response.json().await?;
        if token.access_token.is_empty() {
            return Err(AzureError::AuthenticationFailed(
                "identity platform returned an empty access token".to_string(),
            ));
        }

        Ok(CachedToken {
            secret: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self) -> Result<String> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.expires_at > Instant::now() + REFRESH_MARGIN {
                return Ok(cached.secret.clone());
            }
            tracing::debug!("Cached token is about to expire, refreshing");
        }

        let fresh = self.request_token().await?;
        let secret = fresh.secret.clone();
        *cache = Some(fresh);
        Ok(secret)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn all_vars(value: Option<&str>) -> Vec<(&'static str, Option<&str>)> {
        vec![
            (TENANT_ID_ENV, value),
            (CLIENT_ID_ENV, value),
            (CLIENT_SECRET_ENV, value),
            (SUBSCRIPTION_ID_ENV, value),
        ]
    }

    #[test]
    #[serial]
    fn test_from_env() {
        temp_env::with_vars(all_vars(Some("value")), || {
            let creds = EnvironmentCredentials::from_env().unwrap();
            assert_eq!(creds.tenant_id, "value");
            assert_eq!(creds.subscription_id, "value");
            assert!(!format!("{:?}", creds).contains("client_secret: \"value\""));
        });
    }

    #[test]
    #[serial]
    fn test_from_env_reports_first_missing_variable() {
        temp_env::with_vars(all_vars(None), || {
            let err = EnvironmentCredentials::from_env().unwrap_err();
            assert_eq!(err.to_string(), "Missing environment variable 'AZURE_TENANT_ID'");
        });

        let mut vars = all_vars(Some("value"));
        vars[3] = (SUBSCRIPTION_ID_ENV, Some(""));
        temp_env::with_vars(vars, || {
            let err = EnvironmentCredentials::from_env().unwrap_err();
            assert!(matches!(err, AzureError::MissingEnvVar(ref name) if name == SUBSCRIPTION_ID_ENV));
        });
    }

    #[test]
    #[serial]
    fn test_authority_host_from_env_drops_trailing_slash() {
        temp_env::with_var(AUTHORITY_HOST_ENV, Some("https://login.microsoftonline.us/"), || {
            let credential = ClientSecretCredential::new("tenant-1", "client-1", "secret");
            assert_eq!(
                credential.token_url(),
                "https://login.microsoftonline.us/tenant-1/oauth2/v2.0/token"
            );
        });
    }

    #[tokio::test]
    async fn test_token_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "token-abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = ClientSecretCredential::new("tenant-1", "client-1", "secret")
            .with_authority_host(server.uri());

        assert_eq!(credential.token().await.unwrap(), "token-abc");
        assert_eq!(credential.token().await.unwrap(), "token-abc");
    }

    #[tokio::test]
    async fn test_short_lived_token_is_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "expires_in": 60,
                "access_token": "short"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let credential = ClientSecretCredential::new("tenant-1", "client-1", "secret")
            .with_authority_host(server.uri());

        credential.token().await.unwrap();
        credential.token().await.unwrap();
    }

    #[tokio::test]
    async fn test_token_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })))
            .mount(&server)
            .await;

        let credential = ClientSecretCredential::new("tenant-1", "client-1", "wrong")
            .with_authority_host(server.uri());

        let err = credential.token().await.unwrap_err();
        assert!(matches!(err, AzureError::AuthenticationFailed(_)));
        assert!(err.to_string().contains("invalid_client"));
    }
}

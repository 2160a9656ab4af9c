// =============================================================================
// SERVICE ACCOUNT AUTHENTICATION
// =============================================================================
//
// Exchanges a signed JWT for an OAuth2 access token, the flow Google uses for
// server-to-server calls:
//
// 1. Build claims (issuer = service account email, requested scopes,
//    audience = token endpoint, one hour lifetime).
// 2. Sign them with the key's RSA private key (RS256).
// 3. POST the assertion to the token endpoint and receive a bearer token.
//
// The token is cached and reused until shortly before it expires.

use super::GoogleApiError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

/// Key file read when no environment variable points elsewhere.
pub const DEFAULT_KEY_FILE: &str = "serviceAccountKey.json";

/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Where the service account key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    KeyFile(PathBuf),
    InlineJson(String),
}

impl CredentialSource {
    /// `GOOGLE_SERVICE_ACCOUNT_KEY` (path) first, then
    /// `GOOGLE_SERVICE_ACCOUNT_JSON` (content), then the default key file.
    pub fn from_env() -> Self {
        if let Ok(path) = std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY") {
            return Self::KeyFile(PathBuf::from(path));
        }

        if let Ok(json) = std::env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
            return Self::InlineJson(json);
        }

        Self::KeyFile(PathBuf::from(DEFAULT_KEY_FILE))
    }
}

// Never prints inline key material.
impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyFile(path) => write!(f, "{}", path.display()),
            Self::InlineJson(_) => write!(f, "GOOGLE_SERVICE_ACCOUNT_JSON"),
        }
    }
}

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    /// The service account email (used as issuer in JWT).
    client_email: String,

    /// The private key in PEM format.
    private_key: String,

    /// The token URI (where to exchange JWT for access token).
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    /// Space-separated scopes.
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Cached access token with expiration.
struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

/// Authenticator that handles OAuth2 with service account credentials.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    scope: String,
    client: Client,
    cached_token: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Creates an authenticator from a JSON key file path.
    pub async fn from_file(path: &Path, scopes: &[&str]) -> Result<Self, GoogleApiError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content, scopes)
    }

    /// Creates an authenticator from JSON key content.
    pub fn from_json(json: &str, scopes: &[&str]) -> Result<Self, GoogleApiError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)?;
        Ok(Self {
            credentials,
            scope: scopes.join(" "),
            client: Client::new(),
            cached_token: RwLock::new(None),
        })
    }

    pub async fn from_source(
        source: &CredentialSource,
        scopes: &[&str],
    ) -> Result<Self, GoogleApiError> {
        match source {
            CredentialSource::KeyFile(path) => Self::from_file(path, scopes).await,
            CredentialSource::InlineJson(json) => Self::from_json(json, scopes),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    /// Gets a valid access token, refreshing if necessary.
    pub async fn get_access_token(&self) -> Result<String, GoogleApiError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > SystemTime::now() + EXPIRY_MARGIN {
                    return Ok(token.token.clone());
                }
            }
        }

        let response = self.fetch_new_token().await?;
        let token = response.access_token.clone();

        let mut cached = self.cached_token.write().await;
        *cached = Some(CachedToken {
            token: response.access_token,
            expires_at: SystemTime::now() + Duration::from_secs(response.expires_in),
        });

        Ok(token)
    }

    fn signed_assertion(&self, now: u64) -> Result<String, GoogleApiError> {
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }

    async fn fetch_new_token(&self) -> Result<TokenResponse, GoogleApiError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let jwt = self.signed_assertion(now)?;

        tracing::debug!("Requesting access token for {}", self.credentials.client_email);

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await?;
            return Err(GoogleApiError::TokenExchange {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

// =============================================================================
// GOOGLE MODULE
// =============================================================================
//
// Google Drive and Google Sheets implementations of the filing ports.
//
// **Authentication:**
// Both clients share one service-account authenticator. Create a service
// account, download its JSON key, and share the call log spreadsheet and the
// date folders with the service account email.
//
// **Environment Variables:**
// - `GOOGLE_SERVICE_ACCOUNT_KEY` - Path to the service account JSON file
//   (defaults to `serviceAccountKey.json` in the working directory)
// - `GOOGLE_SERVICE_ACCOUNT_JSON` - The JSON content directly (for deployment)

pub mod drive_client;
pub mod service_account;
pub mod sheets_client;

pub use drive_client::DriveApiClient;
pub use service_account::{CredentialSource, ServiceAccountAuth};
pub use sheets_client::SheetsApiClient;

use crate::core::filing::ServiceError;
use reqwest::Response;
use serde::de::DeserializeOwned;

/// Scopes requested for the access token: read/write Drive and Sheets.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/spreadsheets",
];

#[derive(Debug, thiserror::Error)]
pub enum GoogleApiError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JWT: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("System clock: {0}")]
    Clock(#[from] std::time::SystemTimeError),
    #[error("Token exchange failed ({status}): {message}")]
    TokenExchange { status: u16, message: String },
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<GoogleApiError> for ServiceError {
    fn from(err: GoogleApiError) -> Self {
        match err {
            GoogleApiError::Http(e) if e.is_decode() => ServiceError::Decode(e.to_string()),
            GoogleApiError::Http(e) => ServiceError::Transport(e.to_string()),
            GoogleApiError::Json(e) => ServiceError::Decode(e.to_string()),
            GoogleApiError::Api { status, message } => ServiceError::Api { status, message },
            GoogleApiError::InvalidUrl(url) => ServiceError::Transport(url),
            other @ (GoogleApiError::Io(_)
            | GoogleApiError::Jwt(_)
            | GoogleApiError::Clock(_)
            | GoogleApiError::TokenExchange { .. }) => ServiceError::Auth(other.to_string()),
        }
    }
}

/// Decodes a successful JSON response, or turns an error status into
/// `GoogleApiError::Api` carrying the response body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
) -> Result<T, GoogleApiError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(GoogleApiError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response.json().await?)
}

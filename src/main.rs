// This is the entry point of the call record filer.
//
// **Architecture Overview:**
// - `core/` = The filing workflow and the ports it talks through
// - `infra/` = Implementations of those ports (Google Drive, Google Sheets)
//
// This file's job is to:
// 1. Load configuration
// 2. Authenticate and build the API clients (dependency injection)
// 3. Run the batch once and report how it went

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::filing::{FilingConfig, RecordProcessor};
use crate::infra::google::{
    CredentialSource, DriveApiClient, ServiceAccountAuth, SheetsApiClient, SCOPES,
};
use anyhow::Context;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Error in call record filing: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = FilingConfig::from_env();
    let credentials = CredentialSource::from_env();

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // One authenticator is shared by both clients so they reuse the token.

    let auth = ServiceAccountAuth::from_source(&credentials, SCOPES)
        .await
        .with_context(|| format!("Failed to load service account key from {}", credentials))?;
    tracing::info!("Authenticating as {}", auth.client_email());
    let auth = Arc::new(auth);

    let drive = DriveApiClient::new(Arc::clone(&auth));
    let sheets = SheetsApiClient::new(auth);

    let processor = RecordProcessor::new(drive, sheets, config);
    processor.run().await?;

    Ok(())
}

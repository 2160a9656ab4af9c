// Google Sheets v4 implementation of SheetSource.

use super::{read_json, GoogleApiError, ServiceAccountAuth};
use crate::core::filing::filing_ports::{ServiceError, SheetSource};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::Arc;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Response of `spreadsheets.values.get`. The API leaves `values` out
/// entirely when the range is empty.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

pub struct SheetsApiClient {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
    api_url: String,
}

impl SheetsApiClient {
    pub fn new(auth: Arc<ServiceAccountAuth>) -> Self {
        Self {
            client: Client::new(),
            auth,
            api_url: SHEETS_API_URL.to_string(),
        }
    }

    /// `{api}/{spreadsheet_id}/values/{range}` with each segment escaped.
    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url, GoogleApiError> {
        let mut url =
            Url::parse(&self.api_url).map_err(|e| GoogleApiError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| GoogleApiError::InvalidUrl(self.api_url.clone()))?
            .extend([spreadsheet_id, "values", range]);
        Ok(url)
    }

    async fn fetch_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, GoogleApiError> {
        let token = self.auth.get_access_token().await?;
        let url = self.values_url(spreadsheet_id, range)?;

        let response = self.client.get(url).bearer_auth(&token).send().await?;
        let value_range: ValueRange = read_json(response).await?;

        tracing::info!(
            rows = value_range.values.len(),
            "Read call log range {}",
            range
        );
        Ok(value_range.values)
    }
}

#[async_trait]
impl SheetSource for SheetsApiClient {
    async fn read_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, ServiceError> {
        Ok(self.fetch_values(spreadsheet_id, range).await?)
    }
}

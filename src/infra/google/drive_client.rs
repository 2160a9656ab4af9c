// Google Drive v3 implementation of DriveStorage.
//
// Listings follow `nextPageToken` so callers always see the full result set.
// File content is sent with a `multipart/related` upload: a JSON metadata
// part followed by the media part.

use super::{read_json, GoogleApiError, ServiceAccountAuth};
use crate::core::filing::filing_ports::{
    DriveItem, DriveStorage, FileQuery, FolderQuery, ServiceError, FOLDER_MIME_TYPE,
};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, parents)";
const PAGE_SIZE: &str = "1000";
const BOUNDARY_BASE: &str = "call_record_filer_part";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<ApiFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    parents: Vec<String>,
}

impl From<ApiFile> for DriveItem {
    fn from(file: ApiFile) -> Self {
        DriveItem {
            id: file.id,
            name: file.name,
            parents: file.parents,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// Minimal Drive REST client. It exposes only the calls the filing job needs.
pub struct DriveApiClient {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
    api_url: String,
    upload_url: String,
}

impl DriveApiClient {
    pub fn new(auth: Arc<ServiceAccountAuth>) -> Self {
        Self {
            client: Client::new(),
            auth,
            api_url: DRIVE_API_URL.to_string(),
            upload_url: DRIVE_UPLOAD_URL.to_string(),
        }
    }

    async fn list(&self, q: &str) -> Result<Vec<DriveItem>, GoogleApiError> {
        let token = self.auth.get_access_token().await?;
        let url = format!("{}/files", self.api_url);
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).bearer_auth(&token).query(&[
                ("q", q),
                ("fields", LIST_FIELDS),
                ("pageSize", PAGE_SIZE),
            ]);
            if let Some(page) = &page_token {
                request = request.query(&[("pageToken", page.as_str())]);
            }

            let list: FileList = read_json(request.send().await?).await?;
            items.extend(list.files.into_iter().map(DriveItem::from));

            match list.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        tracing::debug!(query = q, results = items.len(), "Drive listing");
        Ok(items)
    }

    async fn create_folder_inner(&self, name: &str, parent: &str) -> Result<String, GoogleApiError> {
        let token = self.auth.get_access_token().await?;
        let metadata = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent],
        });

        let response = self
            .client
            .post(format!("{}/files", self.api_url))
            .bearer_auth(&token)
            .query(&[("fields", "id")])
            .json(&metadata)
            .send()
            .await?;

        let created: CreatedFile = read_json(response).await?;
        Ok(created.id)
    }

    async fn create_file_inner(
        &self,
        name: &str,
        parent: &str,
        mime_type: &str,
        content: &str,
    ) -> Result<String, GoogleApiError> {
        let token = self.auth.get_access_token().await?;
        let metadata = json!({
            "name": name,
            "parents": [parent],
        });
        let boundary = boundary_for(content);
        let body = multipart_related_body(&boundary, &metadata.to_string(), mime_type, content);

        let response = self
            .client
            .post(format!("{}/files", self.upload_url))
            .bearer_auth(&token)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await?;

        let created: CreatedFile = read_json(response).await?;
        Ok(created.id)
    }

    async fn update_parents_inner(
        &self,
        file_id: &str,
        add_parent: &str,
        remove_parent: &str,
    ) -> Result<(), GoogleApiError> {
        let token = self.auth.get_access_token().await?;

        let response = self
            .client
            .patch(format!("{}/files/{}", self.api_url, file_id))
            .bearer_auth(&token)
            .query(&[
                ("addParents", add_parent),
                ("removeParents", remove_parent),
                ("fields", "id, parents"),
            ])
            .json(&json!({}))
            .send()
            .await?;

        let _: serde_json::Value = read_json(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DriveStorage for DriveApiClient {
    async fn list_folders(&self, query: &FolderQuery) -> Result<Vec<DriveItem>, ServiceError> {
        Ok(self.list(&folder_query(query)).await?)
    }

    async fn create_folder(&self, name: &str, parent: &str) -> Result<String, ServiceError> {
        Ok(self.create_folder_inner(name, parent).await?)
    }

    async fn create_file(
        &self,
        name: &str,
        parent: &str,
        mime_type: &str,
        content: &str,
    ) -> Result<String, ServiceError> {
        Ok(self
            .create_file_inner(name, parent, mime_type, content)
            .await?)
    }

    async fn list_files(&self, query: &FileQuery) -> Result<Vec<DriveItem>, ServiceError> {
        Ok(self.list(&file_query(query)).await?)
    }

    async fn update_parents(
        &self,
        file_id: &str,
        add_parent: &str,
        remove_parent: &str,
    ) -> Result<(), ServiceError> {
        Ok(self
            .update_parents_inner(file_id, add_parent, remove_parent)
            .await?)
    }
}

// =============================================================================
// QUERY AND BODY BUILDERS
// =============================================================================

/// Escapes a value for use inside a single-quoted Drive query literal.
fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn folder_query(query: &FolderQuery) -> String {
    let mut q = format!("mimeType = '{}' and trashed = false", FOLDER_MIME_TYPE);
    if let Some(parent) = &query.parent {
        q.push_str(&format!(" and '{}' in parents", escape_literal(parent)));
    }
    if let Some(name) = &query.name {
        q.push_str(&format!(" and name = '{}'", escape_literal(name)));
    }
    q
}

fn file_query(query: &FileQuery) -> String {
    format!(
        "mimeType = '{}' and name = '{}' and '{}' in parents",
        escape_literal(&query.mime_type),
        escape_literal(&query.name),
        escape_literal(&query.parent)
    )
}

/// A boundary string that does not occur in the content.
fn boundary_for(content: &str) -> String {
    let mut boundary = BOUNDARY_BASE.to_string();
    while content.contains(&boundary) {
        boundary.push('_');
    }
    boundary
}

fn multipart_related_body(boundary: &str, metadata: &str, mime_type: &str, content: &str) -> String {
    format!(
        "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n--{b}\r\nContent-Type: {mime_type}\r\n\r\n{content}\r\n--{b}--\r\n",
        b = boundary,
        metadata = metadata,
        mime_type = mime_type,
        content = content,
    )
}

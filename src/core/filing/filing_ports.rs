// Ports for the two external services the filing job talks to.
//
// The core only knows "a tabular source of rows" and "a hierarchical drive of
// folders and files". The Google implementations live in infra/google, and
// the unit tests plug in the in-memory fakes from infra/memory.

use async_trait::async_trait;
use thiserror::Error;

/// Mime type the drive uses to mark an item as a folder.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Mime type of the uploaded call record files.
pub const TEXT_MIME_TYPE: &str = "text/plain";

// ============================================================================
// ERRORS
// ============================================================================

/// Failure reported by either external service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

// ============================================================================
// DRIVE
// ============================================================================

/// A folder or file as returned by a drive listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    pub parents: Vec<String>,
}

/// Predicate for folder listings. Folders are always filtered to the folder
/// mime type and to items that are not trashed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderQuery {
    pub name: Option<String>,
    pub parent: Option<String>,
}

impl FolderQuery {
    /// Every non-trashed folder visible to the account.
    pub fn all() -> Self {
        Self::default()
    }

    /// Non-trashed folders with exactly this name directly under `parent`.
    pub fn named_in(name: &str, parent: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            parent: Some(parent.to_string()),
        }
    }
}

/// Predicate for file listings: exact name, mime type and direct parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuery {
    pub mime_type: String,
    pub name: String,
    pub parent: String,
}

/// The folder and file operations needed by the filing workflow.
#[async_trait]
pub trait DriveStorage: Send + Sync {
    /// List folders matching the query. Implementations return the complete
    /// result set, following pagination themselves.
    async fn list_folders(&self, query: &FolderQuery) -> Result<Vec<DriveItem>, ServiceError>;

    /// Create a folder under `parent` and return its id.
    async fn create_folder(&self, name: &str, parent: &str) -> Result<String, ServiceError>;

    /// Create a file with the given content under `parent` and return its id.
    async fn create_file(
        &self,
        name: &str,
        parent: &str,
        mime_type: &str,
        content: &str,
    ) -> Result<String, ServiceError>;

    /// List files matching the query.
    async fn list_files(&self, query: &FileQuery) -> Result<Vec<DriveItem>, ServiceError>;

    /// Re-parent a file: add `add_parent`, remove `remove_parent`.
    async fn update_parents(
        &self,
        file_id: &str,
        add_parent: &str,
        remove_parent: &str,
    ) -> Result<(), ServiceError>;
}

// ============================================================================
// SPREADSHEET
// ============================================================================

/// Read-only access to a range of spreadsheet cells.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Rows of the range in sheet order, each row an ordered list of cell
    /// texts. Trailing empty cells may be missing, as the API omits them.
    async fn read_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, ServiceError>;
}

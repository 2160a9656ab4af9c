// In-memory implementation of DriveStorage.
//
// Behaves like a tiny drive: folders and files with parents, a trashed flag,
// listing in creation order. Every call is recorded so tests can assert on
// exactly what the workflow asked the drive to do.

use crate::core::filing::filing_ports::{
    DriveItem, DriveStorage, FileQuery, FolderQuery, ServiceError, FOLDER_MIME_TYPE,
};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// The operations of the drive port, used to inject failures.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum DriveOp {
    ListFolders,
    CreateFolder,
    CreateFile,
    ListFiles,
    UpdateParents,
}

/// One recorded call against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveCall {
    ListFolders(FolderQuery),
    CreateFolder {
        name: String,
        parent: String,
    },
    CreateFile {
        name: String,
        parent: String,
        mime_type: String,
        content: String,
    },
    ListFiles(FileQuery),
    UpdateParents {
        file_id: String,
        add_parent: String,
        remove_parent: String,
    },
}

impl DriveCall {
    pub fn op(&self) -> DriveOp {
        match self {
            DriveCall::ListFolders(_) => DriveOp::ListFolders,
            DriveCall::CreateFolder { .. } => DriveOp::CreateFolder,
            DriveCall::CreateFile { .. } => DriveOp::CreateFile,
            DriveCall::ListFiles(_) => DriveOp::ListFiles,
            DriveCall::UpdateParents { .. } => DriveOp::UpdateParents,
        }
    }
}

/// A folder or file held by the fake.
#[derive(Debug, Clone)]
pub struct StoredItem {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub parents: Vec<String>,
    pub trashed: bool,
    pub content: Option<String>,
    seq: u64,
}

impl StoredItem {
    fn to_drive_item(&self) -> DriveItem {
        DriveItem {
            id: self.id.clone(),
            name: self.name.clone(),
            parents: self.parents.clone(),
        }
    }

    fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

#[derive(Default)]
struct DriveState {
    items: DashMap<String, StoredItem>,
    next_seq: AtomicU64,
    failing: DashSet<DriveOp>,
    calls: Mutex<Vec<DriveCall>>,
}

/// Cheap to clone; clones share the same drive.
#[derive(Clone, Default)]
pub struct InMemoryDrive {
    state: Arc<DriveState>,
}

impl InMemoryDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a folder without recording a call. Returns its id.
    pub fn add_folder(&self, name: &str, parent: Option<&str>) -> String {
        self.insert(name, FOLDER_MIME_TYPE, parent, None, false)
    }

    /// Seed a folder that sits in the trash.
    pub fn add_trashed_folder(&self, name: &str, parent: Option<&str>) -> String {
        self.insert(name, FOLDER_MIME_TYPE, parent, None, true)
    }

    /// Seed a file without recording a call. Returns its id.
    pub fn add_file(&self, name: &str, parent: &str, mime_type: &str, content: &str) -> String {
        self.insert(name, mime_type, Some(parent), Some(content), false)
    }

    /// Make every later call of this kind fail with a transport error.
    pub fn fail(&self, op: DriveOp) {
        self.state.failing.insert(op);
    }

    pub fn calls(&self) -> Vec<DriveCall> {
        self.state
            .calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, op: DriveOp) -> usize {
        self.calls().iter().filter(|c| c.op() == op).count()
    }

    /// Non-folder items directly under `parent`, in creation order.
    pub fn files_in(&self, parent: &str) -> Vec<StoredItem> {
        self.sorted(|item| !item.is_folder() && item.parents.iter().any(|p| p == parent))
    }

    /// Folders directly under `parent`, in creation order.
    pub fn folders_in(&self, parent: &str) -> Vec<StoredItem> {
        self.sorted(|item| item.is_folder() && item.parents.iter().any(|p| p == parent))
    }

    fn insert(
        &self,
        name: &str,
        mime_type: &str,
        parent: Option<&str>,
        content: Option<&str>,
        trashed: bool,
    ) -> String {
        let seq = self.state.next_seq.fetch_add(1, Ordering::SeqCst);
        let id = format!("id-{}", seq);
        self.state.items.insert(
            id.clone(),
            StoredItem {
                id: id.clone(),
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                parents: parent.map(|p| vec![p.to_string()]).unwrap_or_default(),
                trashed,
                content: content.map(str::to_string),
                seq,
            },
        );
        id
    }

    fn sorted(&self, keep: impl Fn(&StoredItem) -> bool) -> Vec<StoredItem> {
        let mut items: Vec<StoredItem> = self
            .state
            .items
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by_key(|item| item.seq);
        items
    }

    fn record(&self, call: DriveCall) -> Result<(), ServiceError> {
        let op = call.op();
        if let Ok(mut calls) = self.state.calls.lock() {
            calls.push(call);
        }

        if self.state.failing.contains(&op) {
            return Err(ServiceError::Transport(format!("{:?} unavailable", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl DriveStorage for InMemoryDrive {
    async fn list_folders(&self, query: &FolderQuery) -> Result<Vec<DriveItem>, ServiceError> {
        self.record(DriveCall::ListFolders(query.clone()))?;

        Ok(self
            .sorted(|item| {
                item.is_folder()
                    && !item.trashed
                    && query.name.as_ref().map_or(true, |n| &item.name == n)
                    && query
                        .parent
                        .as_ref()
                        .map_or(true, |p| item.parents.contains(p))
            })
            .iter()
            .map(StoredItem::to_drive_item)
            .collect())
    }

    async fn create_folder(&self, name: &str, parent: &str) -> Result<String, ServiceError> {
        self.record(DriveCall::CreateFolder {
            name: name.to_string(),
            parent: parent.to_string(),
        })?;

        Ok(self.add_folder(name, Some(parent)))
    }

    async fn create_file(
        &self,
        name: &str,
        parent: &str,
        mime_type: &str,
        content: &str,
    ) -> Result<String, ServiceError> {
        self.record(DriveCall::CreateFile {
            name: name.to_string(),
            parent: parent.to_string(),
            mime_type: mime_type.to_string(),
            content: content.to_string(),
        })?;

        Ok(self.add_file(name, parent, mime_type, content))
    }

    async fn list_files(&self, query: &FileQuery) -> Result<Vec<DriveItem>, ServiceError> {
        self.record(DriveCall::ListFiles(query.clone()))?;

        Ok(self
            .sorted(|item| {
                item.mime_type == query.mime_type
                    && item.name == query.name
                    && item.parents.contains(&query.parent)
            })
            .iter()
            .map(StoredItem::to_drive_item)
            .collect())
    }

    async fn update_parents(
        &self,
        file_id: &str,
        add_parent: &str,
        remove_parent: &str,
    ) -> Result<(), ServiceError> {
        self.record(DriveCall::UpdateParents {
            file_id: file_id.to_string(),
            add_parent: add_parent.to_string(),
            remove_parent: remove_parent.to_string(),
        })?;

        let mut item = self.state.items.get_mut(file_id).ok_or_else(|| ServiceError::Api {
            status: 404,
            message: format!("File not found: {}", file_id),
        })?;
        item.parents.retain(|p| p != remove_parent);
        if !item.parents.iter().any(|p| p == add_parent) {
            item.parents.push(add_parent.to_string());
        }
        Ok(())
    }
}

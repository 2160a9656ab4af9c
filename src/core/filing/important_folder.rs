// Finds or creates the "important" child folder of a day folder.

use super::filing_ports::{DriveStorage, FolderQuery, ServiceError};

pub struct ImportantFolders<'a, D: DriveStorage> {
    drive: &'a D,
    folder_name: &'a str,
}

impl<'a, D: DriveStorage> ImportantFolders<'a, D> {
    pub fn new(drive: &'a D, folder_name: &'a str) -> Self {
        Self { drive, folder_name }
    }

    /// Returns the id of the important folder under `day_folder_id`,
    /// creating it when none exists. The lookup is repeated on every call;
    /// with several matches the first one listed is used.
    pub async fn ensure(&self, day_folder_id: &str) -> Result<String, ServiceError> {
        let existing = self
            .drive
            .list_folders(&FolderQuery::named_in(self.folder_name, day_folder_id))
            .await?;

        if let Some(folder) = existing.into_iter().next() {
            tracing::debug!(folder_id = %folder.id, "Important folder already exists.");
            return Ok(folder.id);
        }

        let folder_id = self
            .drive
            .create_folder(self.folder_name, day_folder_id)
            .await?;
        tracing::info!("Created \"{}\" folder with ID: {}", self.folder_name, folder_id);

        Ok(folder_id)
    }
}

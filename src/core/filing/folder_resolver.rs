// Folder resolution: one listing of every live folder, matched by exact name
// against the expected year, month and day names.

use super::filing_config::FolderNames;
use super::filing_models::FolderIdMap;
use super::filing_ports::{DriveItem, DriveStorage, FolderQuery, ServiceError};
use std::collections::HashMap;

pub struct FolderResolver<'a, D: DriveStorage> {
    drive: &'a D,
    names: &'a FolderNames,
}

impl<'a, D: DriveStorage> FolderResolver<'a, D> {
    pub fn new(drive: &'a D, names: &'a FolderNames) -> Self {
        Self { drive, names }
    }

    /// Builds the folder id map from a single folder listing.
    ///
    /// Names that match no folder are simply absent. When several folders
    /// carry the same expected name, the one listed last wins.
    pub async fn resolve(&self) -> Result<FolderIdMap, ServiceError> {
        let folders = self.drive.list_folders(&FolderQuery::all()).await?;

        if folders.is_empty() {
            tracing::error!("No folders found.");
            return Ok(FolderIdMap::default());
        }

        let map = FolderIdMap {
            years: match_names("year", &self.names.years, &folders),
            months: match_names("month", &self.names.months, &folders),
            days: match_names("day", &self.names.days, &folders),
        };

        tracing::info!(
            folders = folders.len(),
            years = map.years.len(),
            months = map.months.len(),
            days = map.days.len(),
            "Resolved date folders"
        );

        Ok(map)
    }
}

fn match_names(kind: &str, expected: &[String], folders: &[DriveItem]) -> HashMap<String, String> {
    let mut ids = HashMap::new();

    for folder in folders {
        if !expected.iter().any(|name| name == &folder.name) {
            continue;
        }

        if let Some(previous) = ids.insert(folder.name.clone(), folder.id.clone()) {
            tracing::warn!(
                "Several {} folders are named '{}'; using {} over {}",
                kind,
                folder.name,
                folder.id,
                previous
            );
        }
    }

    ids
}

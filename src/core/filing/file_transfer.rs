// Uploading call record files and moving them between folders.

use super::filing_ports::{DriveStorage, FileQuery, ServiceError, TEXT_MIME_TYPE};

/// Result of a relocation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocateOutcome {
    Moved { file_id: String },
    /// No text file with that name sits in the source folder.
    NotFound,
}

pub struct FileTransfer<'a, D: DriveStorage> {
    drive: &'a D,
}

impl<'a, D: DriveStorage> FileTransfer<'a, D> {
    pub fn new(drive: &'a D) -> Self {
        Self { drive }
    }

    /// Creates a plain-text file under `folder_id` and returns its id.
    ///
    /// There is no existence check: uploading the same name twice leaves two
    /// files behind.
    pub async fn upload(
        &self,
        folder_id: &str,
        content: &str,
        file_name: &str,
    ) -> Result<String, ServiceError> {
        tracing::debug!(folder_id, file_name, "Uploading file");

        let file_id = self
            .drive
            .create_file(file_name, folder_id, TEXT_MIME_TYPE, content)
            .await?;

        tracing::info!("File uploaded successfully: {}", file_name);
        Ok(file_id)
    }

    /// Moves the first text file named `file_name` from `source_folder_id`
    /// to `dest_folder_id`.
    pub async fn relocate(
        &self,
        source_folder_id: &str,
        dest_folder_id: &str,
        file_name: &str,
    ) -> Result<RelocateOutcome, ServiceError> {
        let query = FileQuery {
            mime_type: TEXT_MIME_TYPE.to_string(),
            name: file_name.to_string(),
            parent: source_folder_id.to_string(),
        };

        let Some(file) = self.drive.list_files(&query).await?.into_iter().next() else {
            tracing::warn!(
                "File {} not found in source folder {}.",
                file_name,
                source_folder_id
            );
            return Ok(RelocateOutcome::NotFound);
        };

        self.drive
            .update_parents(&file.id, dest_folder_id, source_folder_id)
            .await?;

        tracing::info!(
            "File {} moved to important folder with ID: {}",
            file_name,
            dest_folder_id
        );
        Ok(RelocateOutcome::Moved { file_id: file.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::{DriveCall, DriveOp, InMemoryDrive};

    #[tokio::test]
    async fn upload_creates_a_text_file_in_the_folder() {
        let drive = InMemoryDrive::new();
        let day = drive.add_folder("15", None);

        let id = FileTransfer::new(&drive)
            .upload(&day, "Date: 2024-07-15\n", "P100.txt")
            .await
            .unwrap();

        let files = drive.files_in(&day);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, id);
        assert_eq!(files[0].name, "P100.txt");
        assert_eq!(files[0].mime_type, "text/plain");
        assert_eq!(files[0].content.as_deref(), Some("Date: 2024-07-15\n"));
    }

    #[tokio::test]
    async fn uploading_twice_duplicates_the_file() {
        let drive = InMemoryDrive::new();
        let day = drive.add_folder("15", None);
        let transfer = FileTransfer::new(&drive);

        transfer.upload(&day, "x", "P100.txt").await.unwrap();
        transfer.upload(&day, "x", "P100.txt").await.unwrap();

        assert_eq!(drive.files_in(&day).len(), 2);
    }

    #[tokio::test]
    async fn relocate_reparents_the_file() {
        let drive = InMemoryDrive::new();
        let day = drive.add_folder("15", None);
        let important = drive.add_folder("important", Some(&day));
        let file = drive.add_file("P100.txt", &day, "text/plain", "x");

        let outcome = FileTransfer::new(&drive)
            .relocate(&day, &important, "P100.txt")
            .await
            .unwrap();

        assert_eq!(outcome, RelocateOutcome::Moved { file_id: file.clone() });
        assert!(drive.files_in(&day).is_empty());
        assert_eq!(drive.files_in(&important)[0].parents, vec![important.clone()]);
        assert!(drive.calls().contains(&DriveCall::UpdateParents {
            file_id: file,
            add_parent: important,
            remove_parent: day,
        }));
    }

    #[tokio::test]
    async fn relocate_of_a_missing_file_is_a_no_op() {
        let drive = InMemoryDrive::new();
        let day = drive.add_folder("15", None);
        let important = drive.add_folder("important", Some(&day));
        drive.add_file("other.txt", &day, "text/plain", "x");

        let outcome = FileTransfer::new(&drive)
            .relocate(&day, &important, "P100.txt")
            .await
            .unwrap();

        assert_eq!(outcome, RelocateOutcome::NotFound);
        assert_eq!(drive.count(DriveOp::UpdateParents), 0);
    }

    #[tokio::test]
    async fn relocate_ignores_files_of_other_types() {
        let drive = InMemoryDrive::new();
        let day = drive.add_folder("15", None);
        let important = drive.add_folder("important", Some(&day));
        drive.add_file("P100.txt", &day, "application/pdf", "x");

        let outcome = FileTransfer::new(&drive)
            .relocate(&day, &important, "P100.txt")
            .await
            .unwrap();

        assert_eq!(outcome, RelocateOutcome::NotFound);
    }

    #[tokio::test]
    async fn only_the_first_duplicate_is_moved() {
        let drive = InMemoryDrive::new();
        let day = drive.add_folder("15", None);
        let important = drive.add_folder("important", Some(&day));
        let first = drive.add_file("P100.txt", &day, "text/plain", "x");
        let second = drive.add_file("P100.txt", &day, "text/plain", "x");

        FileTransfer::new(&drive)
            .relocate(&day, &important, "P100.txt")
            .await
            .unwrap();

        assert_eq!(drive.files_in(&important)[0].id, first);
        assert_eq!(drive.files_in(&day)[0].id, second);
    }
}

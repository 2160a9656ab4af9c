// The filing workflow: read the call log and file each row into its day
// folder, moving flagged records into the day's "important" folder.
//
// Rows are processed strictly one after another. A failure while filing one
// row is logged and recorded in the report, and the next row is processed.
// Only the two up-front reads (folder listing, spreadsheet) can fail the run.

use super::file_transfer::{FileTransfer, RelocateOutcome};
use super::filing_config::FilingConfig;
use super::filing_models::{BatchReport, CallRecord, DateKey, FolderIdMap, RowOutcome, SkipReason};
use super::filing_ports::{DriveStorage, ServiceError, SheetSource};
use super::folder_resolver::FolderResolver;
use super::important_folder::ImportantFolders;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilingError {
    #[error("Drive error: {0}")]
    Drive(ServiceError),

    #[error("Spreadsheet error: {0}")]
    Sheet(ServiceError),
}

pub struct RecordProcessor<D: DriveStorage, S: SheetSource> {
    drive: D,
    sheets: S,
    config: FilingConfig,
}

impl<D: DriveStorage, S: SheetSource> RecordProcessor<D, S> {
    pub fn new(drive: D, sheets: S, config: FilingConfig) -> Self {
        Self {
            drive,
            sheets,
            config,
        }
    }

    /// Runs the whole batch once.
    pub async fn run(&self) -> Result<BatchReport, FilingError> {
        let mut report = BatchReport::default();

        let folders = FolderResolver::new(&self.drive, &self.config.folder_names)
            .resolve()
            .await
            .map_err(FilingError::Drive)?;

        if folders.is_empty() {
            tracing::error!("No folder IDs found.");
            return Ok(report);
        }

        let rows = self
            .sheets
            .read_rows(&self.config.spreadsheet_id, &self.config.range)
            .await
            .map_err(FilingError::Sheet)?;

        if rows.is_empty() {
            tracing::info!("No data found.");
            return Ok(report);
        }

        // The first row holds the column titles.
        for (index, row) in rows.iter().enumerate().skip(1) {
            let record = CallRecord::from_row(row);
            let outcome = self.process_record(&record, &folders).await;

            match &outcome {
                RowOutcome::Skipped(reason) => {
                    tracing::error!(row = index + 1, "Skipping row: {}", reason)
                }
                RowOutcome::Failed { file_name, error } => {
                    tracing::error!(row = index + 1, "Error uploading file {}: {}", file_name, error)
                }
                RowOutcome::Filed { .. } => {}
            }

            report.record(outcome);
        }

        tracing::info!("Call record filing finished: {}", report);
        Ok(report)
    }

    async fn process_record(&self, record: &CallRecord, folders: &FolderIdMap) -> RowOutcome {
        let Some(timestamp) = record.timestamp() else {
            return RowOutcome::Skipped(SkipReason::UnparseableTimestamp {
                date: record.date.clone(),
                time: record.time.clone(),
            });
        };
        let key = DateKey::from_timestamp(&timestamp);

        tracing::debug!("Parsed Date: {}", record.date);
        tracing::debug!("Year: {}, Month: {}, Day: {}", key.year, key.month, key.day);

        let (Some(day_folder_id), Some(_month_folder_id)) =
            (folders.day(&key.day), folders.month(&key.month))
        else {
            return RowOutcome::Skipped(SkipReason::MissingFolder {
                key: key.to_string(),
            });
        };

        let important_folder_id =
            match ImportantFolders::new(&self.drive, &self.config.important_folder_name)
                .ensure(day_folder_id)
                .await
            {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::error!("Error ensuring important folder: {}", e);
                    None
                }
            };

        let file_name = record.file_name(&key);
        let content = record.render_text();
        let transfer = FileTransfer::new(&self.drive);

        let file_id = match transfer.upload(day_folder_id, &content, &file_name).await {
            Ok(id) => id,
            Err(e) => {
                return RowOutcome::Failed {
                    file_name,
                    error: e.to_string(),
                }
            }
        };

        let mut important = false;
        if record.is_important(&content) {
            match important_folder_id {
                Some(dest) => match transfer.relocate(day_folder_id, &dest, &file_name).await {
                    Ok(RelocateOutcome::Moved { .. }) => important = true,
                    Ok(RelocateOutcome::NotFound) => {}
                    Err(e) => tracing::error!("Error moving file {}: {}", file_name, e),
                },
                None => tracing::warn!(
                    "Leaving {} in the day folder; no important folder is available",
                    file_name
                ),
            }
        }

        RowOutcome::Filed {
            file_name,
            file_id,
            important,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::{DriveCall, DriveOp, InMemoryDrive, InMemorySheet};

    const HEADER: &[&str] = &[
        "Date",
        "Time",
        "Caller Name",
        "From",
        "To",
        "Patient ID",
        "Reason",
        "Handled By",
        "Outcome",
    ];

    const JANE_DOE: &[&str] = &[
        "2024-07-15",
        "10:30:00",
        "Jane Doe",
        "5551234",
        "6009999",
        "P100",
        "follow-up",
        "Alice",
        "resolved",
    ];

    const JANE_DOE_FILE: &str = "P100-6009999-5551234-2024-07-15T10:30:00.000Z.txt";

    struct Tree {
        drive: InMemoryDrive,
        day_15: String,
        day_18: String,
    }

    /// 2024/07/15 and 2024/07/18.
    fn july_tree() -> Tree {
        let drive = InMemoryDrive::new();
        let year = drive.add_folder("2024", None);
        let month = drive.add_folder("07", Some(&year));
        let day_15 = drive.add_folder("15", Some(&month));
        let day_18 = drive.add_folder("18", Some(&month));
        Tree {
            drive,
            day_15,
            day_18,
        }
    }

    fn processor(
        drive: &InMemoryDrive,
        sheet: &InMemorySheet,
    ) -> RecordProcessor<InMemoryDrive, InMemorySheet> {
        RecordProcessor::new(drive.clone(), sheet.clone(), FilingConfig::default())
    }

    fn uploads(drive: &InMemoryDrive) -> Vec<(String, String)> {
        drive
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                DriveCall::CreateFile { name, parent, .. } => Some((name, parent)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn files_the_example_row_into_important() {
        let tree = july_tree();
        let sheet = InMemorySheet::from_cells(&[HEADER, JANE_DOE]);

        let report = processor(&tree.drive, &sheet).run().await.unwrap();

        assert_eq!(
            uploads(&tree.drive),
            vec![(JANE_DOE_FILE.to_string(), tree.day_15.clone())]
        );

        let important = tree.drive.folders_in(&tree.day_15);
        assert_eq!(important.len(), 1);
        assert_eq!(important[0].name, "important");

        assert!(tree.drive.files_in(&tree.day_15).is_empty());
        let moved = tree.drive.files_in(&important[0].id);
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].name, JANE_DOE_FILE);
        assert!(moved[0]
            .content
            .as_deref()
            .unwrap()
            .contains("Patient Called from: 5551234"));

        assert_eq!(report.filed(), 1);
        assert_eq!(report.important(), 1);
    }

    #[tokio::test]
    async fn header_row_is_never_filed() {
        let tree = july_tree();
        let header_like_data: &[&str] = &[
            "2024-07-18",
            "08:00:00",
            "Header",
            "1",
            "2",
            "H0",
            "x",
            "y",
            "z",
        ];
        let sheet = InMemorySheet::from_cells(&[header_like_data, JANE_DOE]);

        let report = processor(&tree.drive, &sheet).run().await.unwrap();

        assert_eq!(report.rows(), 1);
        assert_eq!(uploads(&tree.drive).len(), 1);
        assert!(tree.drive.folders_in(&tree.day_18).is_empty());
    }

    #[tokio::test]
    async fn rows_without_a_month_folder_are_skipped() {
        let tree = july_tree();
        let september: &[&str] = &[
            "2024-09-15",
            "10:30:00",
            "John Roe",
            "5550000",
            "6009999",
            "P200",
            "refill",
            "Bob",
            "done",
        ];
        let sheet = InMemorySheet::from_cells(&[HEADER, september]);

        let report = processor(&tree.drive, &sheet).run().await.unwrap();

        assert!(uploads(&tree.drive).is_empty());
        assert_eq!(tree.drive.count(DriveOp::UpdateParents), 0);
        assert_eq!(tree.drive.count(DriveOp::CreateFolder), 0);
        assert_eq!(
            report.outcomes,
            vec![RowOutcome::Skipped(SkipReason::MissingFolder {
                key: "2024/09/15".to_string()
            })]
        );
    }

    #[tokio::test]
    async fn invalid_month_thirteen_is_skipped() {
        let tree = july_tree();
        let bad: &[&str] = &["2024-13-15", "10:30:00", "X", "1", "2", "P9"];
        let sheet = InMemorySheet::from_cells(&[HEADER, bad, JANE_DOE]);

        let report = processor(&tree.drive, &sheet).run().await.unwrap();

        assert_eq!(report.skipped(), 1);
        assert_eq!(report.filed(), 1);
        assert_eq!(
            uploads(&tree.drive),
            vec![(JANE_DOE_FILE.to_string(), tree.day_15.clone())]
        );
    }

    #[tokio::test]
    async fn rows_without_a_day_folder_are_skipped() {
        let tree = july_tree();
        let unknown_day: &[&str] = &["2024-07-20", "10:30:00", "X", "1", "2", "P9"];
        let sheet = InMemorySheet::from_cells(&[HEADER, unknown_day]);

        let report = processor(&tree.drive, &sheet).run().await.unwrap();

        assert_eq!(report.skipped(), 1);
        assert!(uploads(&tree.drive).is_empty());
    }

    #[tokio::test]
    async fn every_uploaded_file_is_moved() {
        let tree = july_tree();
        let second: &[&str] = &[
            "2024-07-18",
            "14:00",
            "Sam Poe",
            "5559876",
            "6009999",
            "P300",
        ];
        let sheet = InMemorySheet::from_cells(&[HEADER, JANE_DOE, second]);

        let report = processor(&tree.drive, &sheet).run().await.unwrap();

        assert_eq!(tree.drive.count(DriveOp::CreateFile), 2);
        assert_eq!(tree.drive.count(DriveOp::UpdateParents), 2);
        assert_eq!(report.important(), 2);
        assert_eq!(
            uploads(&tree.drive)[1].0,
            "P300-6009999-5559876-2024-07-18T14:00:00.000Z.txt"
        );
    }

    #[tokio::test]
    async fn important_folder_is_created_once_per_day() {
        let tree = july_tree();
        let later_call: &[&str] = &[
            "2024-07-15",
            "16:45:00",
            "Jane Doe",
            "5551234",
            "6009999",
            "P100",
            "callback",
            "Alice",
            "resolved",
        ];
        let sheet = InMemorySheet::from_cells(&[HEADER, JANE_DOE, later_call]);

        processor(&tree.drive, &sheet).run().await.unwrap();

        assert_eq!(tree.drive.count(DriveOp::CreateFolder), 1);
        let important = tree.drive.folders_in(&tree.day_15);
        assert_eq!(tree.drive.files_in(&important[0].id).len(), 2);
    }

    #[tokio::test]
    async fn running_twice_duplicates_every_file() {
        let tree = july_tree();
        let sheet = InMemorySheet::from_cells(&[HEADER, JANE_DOE]);
        let processor = processor(&tree.drive, &sheet);

        processor.run().await.unwrap();
        processor.run().await.unwrap();

        let important = tree.drive.folders_in(&tree.day_15);
        let files = tree.drive.files_in(&important[0].id);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.name == JANE_DOE_FILE));
    }

    #[tokio::test]
    async fn empty_folder_map_stops_before_reading_the_sheet() {
        let drive = InMemoryDrive::new();
        drive.add_folder("unrelated", None);
        let sheet = InMemorySheet::from_cells(&[HEADER, JANE_DOE]);

        let report = processor(&drive, &sheet).run().await.unwrap();

        assert_eq!(report.rows(), 0);
        assert_eq!(sheet.reads(), 0);
        assert_eq!(drive.count(DriveOp::CreateFile), 0);
    }

    #[tokio::test]
    async fn empty_sheet_files_nothing() {
        let tree = july_tree();
        let sheet = InMemorySheet::new(vec![]);

        let report = processor(&tree.drive, &sheet).run().await.unwrap();

        assert_eq!(report.rows(), 0);
        assert_eq!(sheet.reads(), 1);
    }

    #[tokio::test]
    async fn upload_failures_do_not_stop_the_batch() {
        let tree = july_tree();
        tree.drive.fail(DriveOp::CreateFile);
        let second: &[&str] = &["2024-07-18", "09:00:00", "A", "1", "2", "P2"];
        let sheet = InMemorySheet::from_cells(&[HEADER, JANE_DOE, second]);

        let report = processor(&tree.drive, &sheet).run().await.unwrap();

        assert_eq!(report.failed(), 2);
        assert_eq!(tree.drive.count(DriveOp::CreateFile), 2);
        assert_eq!(tree.drive.count(DriveOp::ListFiles), 0);
    }

    #[tokio::test]
    async fn missing_important_folder_leaves_the_file_in_the_day() {
        let tree = july_tree();
        tree.drive.fail(DriveOp::CreateFolder);
        let sheet = InMemorySheet::from_cells(&[HEADER, JANE_DOE]);

        let report = processor(&tree.drive, &sheet).run().await.unwrap();

        assert_eq!(tree.drive.files_in(&tree.day_15).len(), 1);
        assert_eq!(tree.drive.count(DriveOp::UpdateParents), 0);
        assert_eq!(report.filed(), 1);
        assert_eq!(report.important(), 0);
    }

    #[tokio::test]
    async fn move_failures_keep_the_file_filed() {
        let tree = july_tree();
        tree.drive.fail(DriveOp::UpdateParents);
        let sheet = InMemorySheet::from_cells(&[HEADER, JANE_DOE]);

        let report = processor(&tree.drive, &sheet).run().await.unwrap();

        assert_eq!(report.filed(), 1);
        assert_eq!(report.important(), 0);
        assert_eq!(tree.drive.files_in(&tree.day_15).len(), 1);
    }

    #[tokio::test]
    async fn file_lookup_failures_leave_the_file_in_the_day() {
        let tree = july_tree();
        tree.drive.fail(DriveOp::ListFiles);
        let sheet = InMemorySheet::from_cells(&[HEADER, JANE_DOE]);

        let report = processor(&tree.drive, &sheet).run().await.unwrap();

        assert!(matches!(
            report.outcomes.as_slice(),
            [RowOutcome::Filed {
                important: false,
                ..
            }]
        ));
        assert_eq!(tree.drive.count(DriveOp::UpdateParents), 0);
        let left = tree.drive.files_in(&tree.day_15);
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, JANE_DOE_FILE);
    }

    #[tokio::test]
    async fn reads_the_configured_spreadsheet_and_range() {
        let tree = july_tree();
        let sheet = InMemorySheet::from_cells(&[HEADER, JANE_DOE]);
        let config = FilingConfig {
            spreadsheet_id: "call-log-2024".to_string(),
            range: "Calls!A2:I".to_string(),
            ..FilingConfig::default()
        };

        RecordProcessor::new(tree.drive.clone(), sheet.clone(), config)
            .run()
            .await
            .unwrap();

        assert_eq!(
            sheet.requests(),
            vec![("call-log-2024".to_string(), "Calls!A2:I".to_string())]
        );
    }

    #[tokio::test]
    async fn default_config_reads_the_call_log_sheet() {
        let tree = july_tree();
        let sheet = InMemorySheet::from_cells(&[HEADER, JANE_DOE]);

        processor(&tree.drive, &sheet).run().await.unwrap();

        assert_eq!(
            sheet.requests(),
            vec![(
                "1viQIc8FS2fZQJvAFqz8DWBEd04xuvNj-Nt0ufS1PEC0".to_string(),
                "Sheet1!A:K".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn unparseable_timestamps_are_skipped() {
        let tree = july_tree();
        let bad: &[&str] = &["someday", "", "X"];
        let sheet = InMemorySheet::from_cells(&[HEADER, bad]);

        let report = processor(&tree.drive, &sheet).run().await.unwrap();

        assert_eq!(
            report.outcomes,
            vec![RowOutcome::Skipped(SkipReason::UnparseableTimestamp {
                date: "someday".to_string(),
                time: String::new(),
            })]
        );
        assert!(uploads(&tree.drive).is_empty());
    }

    #[tokio::test]
    async fn folder_listing_failures_fail_the_run() {
        let tree = july_tree();
        tree.drive.fail(DriveOp::ListFolders);
        let sheet = InMemorySheet::from_cells(&[HEADER, JANE_DOE]);

        let result = processor(&tree.drive, &sheet).run().await;

        assert!(matches!(result, Err(FilingError::Drive(_))));
        assert_eq!(sheet.reads(), 0);
    }

    #[tokio::test]
    async fn sheet_failures_fail_the_run() {
        let tree = july_tree();
        let sheet = InMemorySheet::from_cells(&[HEADER, JANE_DOE]);
        sheet.fail();

        let result = processor(&tree.drive, &sheet).run().await;

        assert!(matches!(result, Err(FilingError::Sheet(_))));
        assert_eq!(tree.drive.count(DriveOp::CreateFile), 0);
    }
}

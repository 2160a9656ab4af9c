// Domain types for filing call records into date folders.
//
// A row of the call log becomes a CallRecord; its date and time become a
// DateKey, which picks the day and month folders out of the FolderIdMap.

use chrono::{Datelike, NaiveDateTime};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// CALL RECORD
// ============================================================================

/// One logged phone call, as read from the spreadsheet.
///
/// Every field is kept as the raw cell text. Cells missing from a short row
/// are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRecord {
    pub date: String,
    pub time: String,
    pub caller_name: String,
    /// Number the patient called from.
    pub patient_number: String,
    /// Clinic number the patient called.
    pub clinic_number: String,
    pub patient_id: String,
    pub reason: String,
    pub handled_by: String,
    pub outcome: String,
}

/// Accepted shapes of the combined `{date}T{time}` string.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

impl CallRecord {
    /// Reads the first nine cells of a row in column order. Extra columns
    /// are ignored.
    pub fn from_row(row: &[String]) -> Self {
        let cell = |index: usize| row.get(index).cloned().unwrap_or_default();

        Self {
            date: cell(0),
            time: cell(1),
            caller_name: cell(2),
            patient_number: cell(3),
            clinic_number: cell(4),
            patient_id: cell(5),
            reason: cell(6),
            handled_by: cell(7),
            outcome: cell(8),
        }
    }

    /// Date and time joined with a `T` and read as UTC.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let combined = format!("{}T{}", self.date.trim(), self.time.trim());
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(&combined, format).ok())
    }

    /// `{patient_id}-{clinic_number}-{patient_number}-{iso_timestamp}.txt`
    pub fn file_name(&self, key: &DateKey) -> String {
        format!(
            "{}-{}-{}-{}.txt",
            self.patient_id, self.clinic_number, self.patient_number, key.iso
        )
    }

    /// Plain-text rendering written into the uploaded file.
    pub fn render_text(&self) -> String {
        format!(
            "Date: {}\nTime: {}\nCaller Name: {}\nPatient Called from: {}\nClinic_mobile:{}\nPatient ID: {}\nReason for Call: {}\nHandled By: {}\nCall Outcome: {}\n",
            self.date,
            self.time,
            self.caller_name,
            self.patient_number,
            self.clinic_number,
            self.patient_id,
            self.reason,
            self.handled_by,
            self.outcome,
        )
    }

    /// A record is important when its rendered text mentions the number the
    /// patient called from.
    pub fn is_important(&self, rendered: &str) -> bool {
        rendered.contains(self.patient_number.as_str())
    }
}

// ============================================================================
// DATE KEY
// ============================================================================

/// Folder keys derived from a record's timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateKey {
    /// Four-digit year, e.g. `2024`.
    pub year: String,
    /// Zero-padded month, e.g. `07`.
    pub month: String,
    /// Zero-padded day of month, e.g. `15`.
    pub day: String,
    /// ISO-8601 with milliseconds and a `Z` suffix.
    pub iso: String,
}

impl DateKey {
    pub fn from_timestamp(timestamp: &NaiveDateTime) -> Self {
        Self {
            year: format!("{:04}", timestamp.year()),
            month: format!("{:02}", timestamp.month()),
            day: format!("{:02}", timestamp.day()),
            iso: timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        }
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.year, self.month, self.day)
    }
}

// ============================================================================
// FOLDER ID MAP
// ============================================================================

/// Folder ids keyed by expected folder name, one namespace per date component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderIdMap {
    pub years: HashMap<String, String>,
    pub months: HashMap<String, String>,
    pub days: HashMap<String, String>,
}

impl FolderIdMap {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.years.len() + self.months.len() + self.days.len()
    }

    pub fn month(&self, month: &str) -> Option<&str> {
        self.months.get(month).map(String::as_str)
    }

    pub fn day(&self, day: &str) -> Option<&str> {
        self.days.get(day).map(String::as_str)
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Why a row was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Date and time did not form a timestamp.
    UnparseableTimestamp { date: String, time: String },
    /// The day or month folder for the record's date was not resolved.
    MissingFolder { key: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnparseableTimestamp { date, time } => {
                write!(f, "could not parse timestamp from '{}' '{}'", date, time)
            }
            SkipReason::MissingFolder { key } => write!(f, "folder ID for {} not found", key),
        }
    }
}

/// What happened to one spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// The file was uploaded to the day folder. `important` says whether it
    /// was also moved into the important folder.
    Filed {
        file_name: String,
        file_id: String,
        important: bool,
    },
    Skipped(SkipReason),
    /// The upload itself failed.
    Failed { file_name: String, error: String },
}

/// Tally of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<RowOutcome>,
}

impl BatchReport {
    pub fn record(&mut self, outcome: RowOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn rows(&self) -> usize {
        self.outcomes.len()
    }

    pub fn filed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::Filed { .. }))
            .count()
    }

    pub fn important(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::Filed { important: true, .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::Skipped(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::Failed { .. }))
            .count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} row(s): {} filed ({} important), {} skipped, {} failed",
            self.rows(),
            self.filed(),
            self.important(),
            self.skipped(),
            self.failed()
        )
    }
}

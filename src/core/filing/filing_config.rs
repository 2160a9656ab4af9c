// Fixed identifiers of the filing job, gathered in one place so the resolver
// and processor can be built against fabricated sheets and folder trees.

/// Spreadsheet holding the call log.
pub const DEFAULT_SPREADSHEET_ID: &str = "1viQIc8FS2fZQJvAFqz8DWBEd04xuvNj-Nt0ufS1PEC0";

/// Columns A through K of the first sheet.
pub const DEFAULT_RANGE: &str = "Sheet1!A:K";

/// Name of the per-day child folder that flagged records are moved into.
pub const IMPORTANT_FOLDER_NAME: &str = "important";

const DEFAULT_YEAR_FOLDERS: &[&str] = &["2023", "2024"];
const DEFAULT_MONTH_FOLDERS: &[&str] = &["07", "08", "09"];
const DEFAULT_DAY_FOLDERS: &[&str] = &["02", "15", "18"];

/// Expected folder names, one list per date component.
///
/// Months and days are kept apart so a folder called `07` is never mistaken
/// for the other component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNames {
    pub years: Vec<String>,
    pub months: Vec<String>,
    pub days: Vec<String>,
}

impl Default for FolderNames {
    fn default() -> Self {
        Self {
            years: to_owned_list(DEFAULT_YEAR_FOLDERS),
            months: to_owned_list(DEFAULT_MONTH_FOLDERS),
            days: to_owned_list(DEFAULT_DAY_FOLDERS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingConfig {
    pub spreadsheet_id: String,
    pub range: String,
    pub folder_names: FolderNames,
    pub important_folder_name: String,
}

impl Default for FilingConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_string(),
            range: DEFAULT_RANGE.to_string(),
            folder_names: FolderNames::default(),
            important_folder_name: IMPORTANT_FOLDER_NAME.to_string(),
        }
    }
}

impl FilingConfig {
    /// Defaults, with any of these environment variables taking precedence:
    ///
    /// - `CALL_LOG_SPREADSHEET_ID`
    /// - `CALL_LOG_RANGE`
    /// - `CALL_LOG_YEAR_FOLDERS`, `CALL_LOG_MONTH_FOLDERS`, `CALL_LOG_DAY_FOLDERS`
    ///   (comma-separated names)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let folder_names = FolderNames {
            years: name_list_var("CALL_LOG_YEAR_FOLDERS").unwrap_or(defaults.folder_names.years),
            months: name_list_var("CALL_LOG_MONTH_FOLDERS")
                .unwrap_or(defaults.folder_names.months),
            days: name_list_var("CALL_LOG_DAY_FOLDERS").unwrap_or(defaults.folder_names.days),
        };

        Self {
            spreadsheet_id: std::env::var("CALL_LOG_SPREADSHEET_ID")
                .unwrap_or(defaults.spreadsheet_id),
            range: std::env::var("CALL_LOG_RANGE").unwrap_or(defaults.range),
            folder_names,
            important_folder_name: defaults.important_folder_name,
        }
    }
}

fn name_list_var(key: &str) -> Option<Vec<String>> {
    std::env::var(key)
        .ok()
        .map(|value| parse_name_list(&value))
        .filter(|names| !names.is_empty())
}

/// Splits a comma-separated list of folder names, dropping blanks.
pub fn parse_name_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_owned_list(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

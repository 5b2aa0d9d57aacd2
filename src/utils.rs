use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

fn app_name(profile: Profile) -> &'static str {
    match profile {
        Profile::Dev => "taskdeck-dev",
        Profile::Prod => "taskdeck",
    }
}

/// Get the configuration directory path for taskdeck
/// If profile is Dev, uses "taskdeck-dev" instead of "taskdeck"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "taskdeck", app_name(profile))
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path for taskdeck
/// If profile is Dev, uses "taskdeck-dev" instead of "taskdeck"
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "taskdeck", app_name(profile))
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<chrono::NaiveDate, chrono::ParseError> {
    chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
}

/// Get the current date as an ISO 8601 string (YYYY-MM-DD)
pub fn get_current_date_string() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Current UTC time as the TEXT timestamp format used throughout the store
pub fn now_string() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_parse_in_iso_form_only() {
        assert!(parse_date("2026-08-05").is_ok());
        assert!(parse_date("05/08/2026").is_err());
        assert!(parse_date("tomorrow").is_err());
    }

    #[test]
    fn timestamps_sort_lexicographically() {
        // The whole store relies on TEXT timestamps ordering correctly
        assert!("2026-08-05 09:00:00" < "2026-08-05 10:00:00");
        assert!("2025-12-31 23:59:59" < "2026-01-01 00:00:00");
    }
}

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task status. The text forms ("Pending", "In Progress", "Completed") are
/// what gets stored, so the store can never hold a fourth value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Pending,
    InProgress,
    Completed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Pending, Status::InProgress, Status::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Status::Pending),
            "In Progress" => Ok(Status::InProgress),
            "Completed" => Ok(Status::Completed),
            other => Err(format!("Unknown status: {}", other)),
        }
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Task priority, High / Medium / Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Priority::High),
            "Medium" => Ok(Priority::Medium),
            "Low" => Ok(Priority::Low),
            other => Err(format!("Unknown priority: {}", other)),
        }
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub name: String,
    pub assigned_to: String,
    pub deadline: Option<String>, // ISO 8601: YYYY-MM-DD
    pub status: Status,
    pub description: Option<String>,
    pub priority: Priority,
    pub created_at: String,
}

impl Task {
    /// New tasks always start out Pending.
    pub fn new(name: String, assigned_to: String, priority: Priority) -> Self {
        Self {
            id: None,
            name,
            assigned_to,
            deadline: None,
            status: Status::Pending,
            description: None,
            priority,
            created_at: crate::utils::now_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Option<i64>,
    pub task_id: i64,
    pub username: String,
    pub comment: String,
    pub timestamp: String,
}

impl Comment {
    pub fn new(task_id: i64, username: String, comment: String) -> Self {
        Self {
            id: None,
            task_id,
            username,
            comment,
            timestamp: crate::utils::now_string(),
        }
    }
}

/// One row of the append-only activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Option<i64>,
    pub username: String,
    pub action: String,
    pub timestamp: String,
}

impl ActivityEntry {
    pub fn new(username: String, action: String) -> Self {
        Self {
            id: None,
            username,
            action,
            timestamp: crate::utils::now_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert!("Done".parse::<Status>().is_err());
    }

    #[test]
    fn priority_round_trips_through_text() {
        for priority in Priority::ALL {
            assert_eq!(priority.as_str().parse::<Priority>().unwrap(), priority);
        }
        assert!("Urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn new_tasks_are_pending() {
        let task = Task::new("Fix bug".into(), "alice".into(), Priority::High);
        assert_eq!(task.status, Status::Pending);
        assert!(task.id.is_none());
        assert!(!task.created_at.is_empty());
    }
}

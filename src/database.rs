use rusqlite::Connection;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{ActivityEntry, Comment, Priority, Status, Task, User};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        // Open or create the database
        let conn = Connection::open(&db_path)?;

        let db = Database { conn };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Open an in-memory database with the full schema, for tests
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema (tables and indexes)
    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                username        TEXT PRIMARY KEY,
                password_hash   TEXT NOT NULL,
                role            TEXT NOT NULL,
                email           TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                task_id         INTEGER PRIMARY KEY AUTOINCREMENT,
                task_name       TEXT NOT NULL,
                assigned_to     TEXT NOT NULL,
                deadline        TEXT,
                status          TEXT NOT NULL DEFAULT 'Pending',
                description     TEXT,
                priority        TEXT NOT NULL,
                created_at      TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS comments (
                comment_id      INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id         INTEGER NOT NULL,
                username        TEXT NOT NULL,
                comment         TEXT NOT NULL,
                timestamp       TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS activity (
                log_id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL,
                action          TEXT NOT NULL,
                timestamp       TEXT NOT NULL
            )",
            [],
        )?;

        // Create indexes
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_assigned_to ON tasks(assigned_to)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_comments_task_id ON comments(task_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_activity_timestamp ON activity(timestamp)",
            [],
        )?;

        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Insert a user. Fails if the username is already taken.
    pub fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO users (username, password_hash, role, email)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![user.username, user.password_hash, user.role, user.email],
        )?;
        Ok(())
    }

    fn row_to_user(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
        Ok(User {
            username: row.get(0)?,
            password_hash: row.get(1)?,
            role: row.get(2)?,
            email: row.get(3)?,
        })
    }

    /// Look up a single user by username
    pub fn get_user(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT username, password_hash, role, email
             FROM users WHERE username = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![username], Self::row_to_user);

        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e)),
        }
    }

    /// Get all users ordered by username ASC
    pub fn get_all_users(&self) -> Result<Vec<User>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT username, password_hash, role, email
             FROM users ORDER BY username ASC",
        )?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Replace a user's stored password hash
    pub fn update_password_hash(&self, username: &str, hash: &str) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE users SET password_hash = ?1 WHERE username = ?2",
            rusqlite::params![hash, username],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Insert a task into the database and return its ID
    pub fn insert_task(&self, task: &Task) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO tasks (task_name, assigned_to, deadline, status, description, priority, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                task.name,
                task.assigned_to,
                task.deadline,
                task.status,
                task.description,
                task.priority,
                task.created_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Helper function to map a row to a Task
    fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
        Ok(Task {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            assigned_to: row.get(2)?,
            deadline: row.get(3)?,
            status: row.get(4)?,
            description: row.get(5)?,
            priority: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    /// Get all tasks ordered by task_id ASC
    pub fn get_all_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT task_id, task_name, assigned_to, deadline, status, description, priority, created_at
             FROM tasks ORDER BY task_id ASC",
        )?;
        let tasks = stmt
            .query_map([], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    /// Get a single task by ID
    pub fn get_task(&self, id: i64) -> Result<Option<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT task_id, task_name, assigned_to, deadline, status, description, priority, created_at
             FROM tasks WHERE task_id = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![id], Self::row_to_task);

        match result {
            Ok(task) => Ok(Some(task)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e)),
        }
    }

    /// Get all tasks assigned to a user, ordered by task_id ASC
    pub fn get_tasks_for_assignee(&self, username: &str) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT task_id, task_name, assigned_to, deadline, status, description, priority, created_at
             FROM tasks WHERE assigned_to = ?1 ORDER BY task_id ASC",
        )?;
        let tasks = stmt
            .query_map(rusqlite::params![username], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    /// Set a task's status. Any status may move to any other status.
    /// Returns the number of rows changed; an unknown ID changes zero rows
    /// and is not an error.
    pub fn update_task_status(&self, id: i64, status: Status) -> Result<usize, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE tasks SET status = ?1 WHERE task_id = ?2",
            rusqlite::params![status, id],
        )?;
        tx.commit()?;
        Ok(changed)
    }

    /// Insert a comment and return its ID
    pub fn insert_comment(&self, comment: &Comment) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO comments (task_id, username, comment, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                comment.task_id,
                comment.username,
                comment.comment,
                comment.timestamp
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn row_to_comment(row: &rusqlite::Row) -> Result<Comment, rusqlite::Error> {
        Ok(Comment {
            id: Some(row.get(0)?),
            task_id: row.get(1)?,
            username: row.get(2)?,
            comment: row.get(3)?,
            timestamp: row.get(4)?,
        })
    }

    /// Get all comments for a task in insertion order (timestamp ASC,
    /// comment_id as tiebreak for same-second inserts)
    pub fn get_comments_for_task(&self, task_id: i64) -> Result<Vec<Comment>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT comment_id, task_id, username, comment, timestamp
             FROM comments WHERE task_id = ?1 ORDER BY timestamp ASC, comment_id ASC",
        )?;
        let comments = stmt
            .query_map(rusqlite::params![task_id], Self::row_to_comment)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    /// Append an entry to the activity log and return its ID
    pub fn insert_activity(&self, entry: &ActivityEntry) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO activity (username, action, timestamp)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![entry.username, entry.action, entry.timestamp],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get the most recent activity entries, newest first
    pub fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityEntry>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT log_id, username, action, timestamp
             FROM activity ORDER BY timestamp DESC, log_id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(rusqlite::params![limit], |row| {
                Ok(ActivityEntry {
                    id: Some(row.get(0)?),
                    username: row.get(1)?,
                    action: row.get(2)?,
                    timestamp: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Count tasks per status
    pub fn status_counts(&self) -> Result<Vec<(Status, i64)>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT status, COUNT(*) FROM tasks GROUP BY status",
        )?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    /// Count tasks per (priority, status) pair
    pub fn priority_status_counts(&self) -> Result<Vec<(Priority, Status, i64)>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT priority, status, COUNT(*) FROM tasks GROUP BY priority, status",
        )?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_task(db: &Database, name: &str, assignee: &str, priority: Priority) -> i64 {
        let task = Task::new(name.to_string(), assignee.to_string(), priority);
        db.insert_task(&task).unwrap()
    }

    #[test]
    fn created_tasks_get_fresh_monotonic_ids_and_start_pending() {
        let db = Database::open_in_memory().unwrap();

        let first = seed_task(&db, "Fix bug", "alice", Priority::High);
        let second = seed_task(&db, "Write docs", "bob", Priority::Low);
        assert!(second > first);

        let task = db.get_task(first).unwrap().unwrap();
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.assigned_to, "alice");
        assert!(!task.created_at.is_empty());
    }

    #[test]
    fn any_status_can_move_to_any_status() {
        let db = Database::open_in_memory().unwrap();
        let id = seed_task(&db, "Fix bug", "alice", Priority::High);

        // Completed back to Pending included; there is no transition graph.
        for status in [
            Status::Completed,
            Status::Pending,
            Status::InProgress,
            Status::Completed,
        ] {
            let changed = db.update_task_status(id, status).unwrap();
            assert_eq!(changed, 1);
            assert_eq!(db.get_task(id).unwrap().unwrap().status, status);
        }
    }

    #[test]
    fn updating_a_nonexistent_task_changes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let id = seed_task(&db, "Fix bug", "alice", Priority::High);

        let changed = db.update_task_status(9999, Status::Completed).unwrap();
        assert_eq!(changed, 0);
        assert_eq!(db.get_all_tasks().unwrap().len(), 1);
        assert_eq!(db.get_task(id).unwrap().unwrap().status, Status::Pending);
    }

    #[test]
    fn tasks_can_be_listed_by_assignee() {
        let db = Database::open_in_memory().unwrap();
        seed_task(&db, "Fix bug", "alice", Priority::High);
        seed_task(&db, "Write docs", "bob", Priority::Low);
        seed_task(&db, "Review PR", "alice", Priority::Medium);

        let alices = db.get_tasks_for_assignee("alice").unwrap();
        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|t| t.assigned_to == "alice"));
        assert_eq!(db.get_tasks_for_assignee("carol").unwrap().len(), 0);
    }

    #[test]
    fn comments_come_back_in_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        let id = seed_task(&db, "Fix bug", "alice", Priority::High);

        for text in ["first", "second", "third"] {
            let comment = Comment::new(id, "alice".to_string(), text.to_string());
            db.insert_comment(&comment).unwrap();
        }

        let comments = db.get_comments_for_task(id).unwrap();
        let texts: Vec<&str> = comments.iter().map(|c| c.comment.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
        assert!(comments.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn recent_activity_is_newest_first_and_limited() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..5 {
            let entry = ActivityEntry::new("alice".to_string(), format!("action {}", i));
            db.insert_activity(&entry).unwrap();
        }

        let recent = db.recent_activity(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].action, "action 4");
        assert_eq!(recent[2].action, "action 2");
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let db = Database::open_in_memory().unwrap();
        let user = User {
            username: "alice".to_string(),
            password_hash: "x".to_string(),
            role: "member".to_string(),
            email: "alice@example.com".to_string(),
        };
        db.insert_user(&user).unwrap();
        assert!(db.insert_user(&user).is_err());
    }

    #[test]
    fn schema_creation_is_idempotent_across_reopens() {
        let path = std::env::temp_dir().join(format!(
            "taskdeck-test-{}.db",
            std::process::id()
        ));
        let path_str = path.to_str().unwrap();
        std::fs::remove_file(&path).ok();

        {
            let db = Database::new(path_str).unwrap();
            seed_task(&db, "Fix bug", "alice", Priority::High);
        }
        {
            let db = Database::new(path_str).unwrap();
            assert_eq!(db.get_all_tasks().unwrap().len(), 1);
        }

        std::fs::remove_file(&path).ok();
    }
}

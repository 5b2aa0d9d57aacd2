use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::analytics;
use crate::auth::{self, AuthError, Session};
use crate::database::{Database, DatabaseError};
use crate::models::{ActivityEntry, Comment, Priority, Status, Task};
use crate::utils::parse_date;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "Team task tracking with a SQLite store")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    /// Username for commands that act on behalf of a user
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password matching --user
    #[arg(short, long)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision a user account (operator action, no session needed)
    AddUser {
        /// Username, unique across the store
        username: String,
        /// Initial password
        password: String,
        /// Role label shown on the dashboard
        #[arg(long, default_value = "member")]
        role: String,
        /// Contact email
        #[arg(long)]
        email: String,
    },
    /// Verify the credentials given via --user/--password
    Login,
    /// Create a new task (starts out Pending)
    AddTask {
        /// Task name
        name: String,
        /// Assignee username (defaults to the logged-in user)
        #[arg(long)]
        assign: Option<String>,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Free-form description
        #[arg(long)]
        description: Option<String>,
        /// High, Medium or Low
        #[arg(long, default_value = "Medium")]
        priority: String,
    },
    /// List tasks, optionally narrowed to one assignee or one ID
    ListTasks {
        /// Only tasks assigned to this user
        #[arg(long)]
        assignee: Option<String>,
        /// Only the task with this ID
        #[arg(long)]
        id: Option<i64>,
    },
    /// Move a task to a new status (any status to any status)
    UpdateStatus {
        /// Task ID
        task_id: i64,
        /// Pending, "In Progress" or Completed
        status: String,
    },
    /// Attach a comment to a task
    Comment {
        /// Task ID
        task_id: i64,
        /// Comment text
        text: String,
    },
    /// Show a task's comments in insertion order
    Comments {
        /// Task ID
        task_id: i64,
    },
    /// Show the most recent activity-log entries
    Activity {
        /// How many entries to show
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show task counts by status and by priority x status
    Stats,
    /// List user profiles
    Users,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("{0}")]
    InvalidValue(String),
    // One message for missing credentials, unknown user and wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,
}

/// Authenticate the --user/--password pair, or fail with the generic
/// credentials message
pub fn require_session(
    user: Option<&str>,
    password: Option<&str>,
    db: &Database,
) -> Result<Session, CliError> {
    let (Some(user), Some(password)) = (user, password) else {
        return Err(CliError::InvalidCredentials);
    };
    auth::authenticate(db, user, password)?.ok_or(CliError::InvalidCredentials)
}

/// Handle the add-user command
pub fn handle_add_user(
    username: String,
    password: String,
    role: String,
    email: String,
    db: &Database,
) -> Result<(), CliError> {
    auth::create_user(db, &username, &password, &role, &email)?;
    println!("User '{}' created (role: {})", username, role);
    Ok(())
}

/// Handle the login command
pub fn handle_login(session: &Session) -> Result<(), CliError> {
    println!(
        "Logged in as {} (role: {}, email: {})",
        session.username, session.role, session.email
    );
    Ok(())
}

/// Handle the add-task command
pub fn handle_add_task(
    session: &Session,
    name: String,
    assign: Option<String>,
    due: Option<String>,
    description: Option<String>,
    priority: String,
    db: &Database,
) -> Result<(), CliError> {
    let priority: Priority = priority
        .parse()
        .map_err(CliError::InvalidValue)?;

    // Parse deadline if provided
    let deadline = if let Some(due_str) = due {
        parse_date(&due_str).map_err(|e| {
            CliError::DateParseError(format!("Invalid date format '{}': {}", due_str, e))
        })?;
        Some(due_str)
    } else {
        None
    };

    let assigned_to = assign.unwrap_or_else(|| session.username.clone());
    let mut task = Task::new(name, assigned_to, priority);
    task.deadline = deadline;
    task.description = description;

    let id = db.insert_task(&task)?;
    db.insert_activity(&ActivityEntry::new(
        session.username.clone(),
        format!("created task {}", id),
    ))?;
    println!("Task created successfully (ID: {})", id);

    Ok(())
}

fn print_task(task: &Task) {
    let id = task.id.unwrap_or(0);
    let deadline = task.deadline.as_deref().unwrap_or("-");
    println!(
        "#{} {} [{}] ({}) -> {} due {}",
        id, task.name, task.status, task.priority, task.assigned_to, deadline
    );
    if let Some(description) = &task.description {
        println!("    {}", description);
    }
}

/// Handle the list-tasks command
pub fn handle_list_tasks(
    assignee: Option<String>,
    id: Option<i64>,
    db: &Database,
) -> Result<(), CliError> {
    if let Some(id) = id {
        match db.get_task(id)? {
            Some(task) => print_task(&task),
            None => println!("No task with ID {}", id),
        }
        return Ok(());
    }

    let tasks = match assignee {
        Some(username) => db.get_tasks_for_assignee(&username)?,
        None => db.get_all_tasks()?,
    };

    if tasks.is_empty() {
        println!("No tasks");
    }
    for task in &tasks {
        print_task(task);
    }

    Ok(())
}

/// Handle the update-status command
pub fn handle_update_status(
    session: &Session,
    task_id: i64,
    status: String,
    db: &Database,
) -> Result<(), CliError> {
    let status: Status = status.parse().map_err(CliError::InvalidValue)?;

    let changed = db.update_task_status(task_id, status)?;
    if changed == 0 {
        // Unknown ID is a no-op, not an error
        println!("No task with ID {}; nothing updated", task_id);
        return Ok(());
    }

    db.insert_activity(&ActivityEntry::new(
        session.username.clone(),
        format!("moved task {} to {}", task_id, status),
    ))?;
    println!("Task {} moved to {}", task_id, status);

    Ok(())
}

/// Handle the comment command
pub fn handle_comment(
    session: &Session,
    task_id: i64,
    text: String,
    db: &Database,
) -> Result<(), CliError> {
    let comment = Comment::new(task_id, session.username.clone(), text);
    let id = db.insert_comment(&comment)?;
    db.insert_activity(&ActivityEntry::new(
        session.username.clone(),
        format!("commented on task {}", task_id),
    ))?;
    println!("Comment posted (ID: {})", id);

    Ok(())
}

/// Handle the comments command
pub fn handle_comments(task_id: i64, db: &Database) -> Result<(), CliError> {
    let comments = db.get_comments_for_task(task_id)?;
    if comments.is_empty() {
        println!("No comments on task {}", task_id);
    }
    for comment in &comments {
        println!("[{}] {}: {}", comment.timestamp, comment.username, comment.comment);
    }

    Ok(())
}

/// Handle the activity command
pub fn handle_activity(limit: u32, db: &Database) -> Result<(), CliError> {
    let entries = db.recent_activity(limit)?;
    if entries.is_empty() {
        println!("No activity recorded");
    }
    for entry in &entries {
        println!("[{}] {}: {}", entry.timestamp, entry.username, entry.action);
    }

    Ok(())
}

/// Handle the stats command
pub fn handle_stats(db: &Database) -> Result<(), CliError> {
    println!("Tasks by status:");
    for row in analytics::status_distribution(db)? {
        println!("  {:<12} {}", row.status.as_str(), row.count);
    }

    println!("Tasks by priority and status:");
    for row in analytics::priority_status_breakdown(db)? {
        if row.count > 0 {
            println!(
                "  {:<8} {:<12} {}",
                row.priority.as_str(),
                row.status.as_str(),
                row.count
            );
        }
    }

    Ok(())
}

/// Handle the users command
pub fn handle_users(db: &Database) -> Result<(), CliError> {
    let users = db.get_all_users()?;
    if users.is_empty() {
        println!("No users");
    }
    for user in &users {
        // Password hashes stay out of the listing
        println!("{} (role: {}, email: {})", user.username, user.role, user.email);
    }

    Ok(())
}

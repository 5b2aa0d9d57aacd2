pub mod analytics;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod models;
pub mod utils;

pub use auth::Session;
pub use config::Config;
pub use database::Database;
pub use models::{ActivityEntry, Comment, Priority, Status, Task, User};
pub use utils::Profile;

use clap::Parser;
use color_eyre::Result;
use taskdeck::{
    cli::{self, Cli, Commands},
    Config, Database, Profile,
};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    // Load configuration with the determined profile
    // Note: --config option is parsed but not yet used to override config path
    let config = Config::load_with_profile(profile)?;

    // Initialize database
    let db_path = config.get_database_path();
    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?,
    )?;

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::AddUser {
            username,
            password,
            role,
            email,
        } => {
            cli::handle_add_user(username, password, role, email, &db)?;
        }
        Commands::Login => {
            let session = cli::require_session(cli.user.as_deref(), cli.password.as_deref(), &db)?;
            cli::handle_login(&session)?;
        }
        Commands::AddTask {
            name,
            assign,
            due,
            description,
            priority,
        } => {
            let session = cli::require_session(cli.user.as_deref(), cli.password.as_deref(), &db)?;
            cli::handle_add_task(&session, name, assign, due, description, priority, &db)?;
        }
        Commands::ListTasks { assignee, id } => {
            cli::require_session(cli.user.as_deref(), cli.password.as_deref(), &db)?;
            cli::handle_list_tasks(assignee, id, &db)?;
        }
        Commands::UpdateStatus { task_id, status } => {
            let session = cli::require_session(cli.user.as_deref(), cli.password.as_deref(), &db)?;
            cli::handle_update_status(&session, task_id, status, &db)?;
        }
        Commands::Comment { task_id, text } => {
            let session = cli::require_session(cli.user.as_deref(), cli.password.as_deref(), &db)?;
            cli::handle_comment(&session, task_id, text, &db)?;
        }
        Commands::Comments { task_id } => {
            cli::require_session(cli.user.as_deref(), cli.password.as_deref(), &db)?;
            cli::handle_comments(task_id, &db)?;
        }
        Commands::Activity { limit } => {
            cli::require_session(cli.user.as_deref(), cli.password.as_deref(), &db)?;
            cli::handle_activity(limit.unwrap_or(config.activity_display_limit), &db)?;
        }
        Commands::Stats => {
            cli::require_session(cli.user.as_deref(), cli.password.as_deref(), &db)?;
            cli::handle_stats(&db)?;
        }
        Commands::Users => {
            cli::require_session(cli.user.as_deref(), cli.password.as_deref(), &db)?;
            cli::handle_users(&db)?;
        }
    }

    Ok(())
}

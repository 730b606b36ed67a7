use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tt", about = concat!("tasktrack v", env!("CARGO_PKG_VERSION"), " - team task tracker"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different directory (the one holding .tasktrack/)
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,

    /// Account email for commands that change tasks
    #[arg(long, global = true, env = "TASKTRACK_EMAIL")]
    pub email: Option<String>,

    /// Account password
    #[arg(long, global = true, env = "TASKTRACK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a .tasktrack/ store in the current directory
    Init(InitArgs),
    /// List tasks grouped the way the list view shows them
    List(ListArgs),
    /// Show task details
    Show(ShowArgs),
    /// Search task titles by regex
    Search(SearchArgs),
    /// Create a task
    Add(AddArgs),
    /// Update several fields of a task
    Edit(EditArgs),
    /// Quick-edit a single field
    Set(SetArgs),
    /// Permanently delete a task
    Delete(DeleteArgs),
    /// Show members and reference sets
    Refs,
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Add a team member: --member <id> "name" (repeatable)
    #[arg(long, num_args = 2, value_names = ["ID", "NAME"], action = clap::ArgAction::Append)]
    pub member: Vec<String>,
    /// Create an admin account with this email (uses --password)
    #[arg(long, value_name = "EMAIL")]
    pub admin: Option<String>,
    /// Reinitialize even if .tasktrack/ already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Tab to show: all, unassigned, or a member id
    #[arg(long, default_value = "all")]
    pub tab: String,
    /// Hide tasks whose status is finished
    #[arg(long)]
    pub hide_finished: bool,
    /// Show finished tasks even when `[ui] hide_finished` is set
    #[arg(long, conflicts_with = "hide_finished")]
    pub show_finished: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Task ID to show
    pub id: String,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Regex pattern to search for (case-insensitive)
    pub pattern: String,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

/// Field values shared by `add` and `edit`. Reference fields accept an id
/// or a display name.
#[derive(Args, Default)]
pub struct TaskFieldArgs {
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long = "issue", value_name = "URL")]
    pub git_issue_url: Option<String>,
    /// Member id or name; "-" for unassigned
    #[arg(long)]
    pub assignee: Option<String>,
    /// YYYY-MM-DD; "-" clears
    #[arg(long)]
    pub start: Option<String>,
    /// YYYY-MM-DD; "-" clears
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub product: Option<String>,
    #[arg(long = "type", value_name = "TYPE")]
    pub task_type: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    #[command(flatten)]
    pub fields: TaskFieldArgs,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: String,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    #[command(flatten)]
    pub fields: TaskFieldArgs,
}

#[derive(Args)]
pub struct SetArgs {
    /// Task ID
    pub id: String,
    /// priority, assignee, status, start or due
    pub field: String,
    /// New value; "-" clears a date or unassigns
    pub value: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Task ID to delete
    pub id: String,
    /// Confirm the deletion
    #[arg(long)]
    pub yes: bool,
}

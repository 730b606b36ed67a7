mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::auth::{AuthProvider, LocalAuth};
use crate::io::backend::{self, StoreError, TaskGateway};
use crate::io::config_io;
use crate::io::store::{self, JsonStore, STORE_DIR};
use crate::model::{
    Actor, AppConfig, Gesture, Member, RefKind, ReferenceCache, Task, can_mutate,
};
use crate::ops::quick_edit::{CommitOutcome, QuickEdit, QuickField, QuickValue};
use crate::ops::search;
use crate::ops::task_ops::{self, TaskDraft};
use crate::ops::view::{self, AssigneeTab, ViewRules, ViewState};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Environment variable naming the store directory
pub const DIR_ENV: &str = "TASKTRACK_DIR";

/// Value that clears an optional field on the command line
const CLEAR: &str = "-";

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli, cmd: Commands) -> CmdResult {
    let json = cli.json;
    let store_dir = resolve_store_dir(cli.dir.as_deref())?;
    let credentials = Credentials {
        email: cli.email,
        password: cli.password,
    };

    let session = Session::open(&store_dir)?;
    match cmd {
        // Init is handled in main.rs before store discovery
        Commands::Init(_) => Ok(()),
        Commands::List(args) => cmd_list(&session, args, json),
        Commands::Show(args) => cmd_show(&session, args, json),
        Commands::Search(args) => cmd_search(&session, args, json),
        Commands::Refs => cmd_refs(&session, json),
        Commands::Add(args) => cmd_add(&session, &credentials, args, json),
        Commands::Edit(args) => cmd_edit(&session, &credentials, args),
        Commands::Set(args) => cmd_set(&session, &credentials, args),
        Commands::Delete(args) => cmd_delete(&session, &credentials, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Locate the store: `-C` directory, then `$TASKTRACK_DIR`, then the
/// working directory, walking up in each case.
pub fn resolve_store_dir(dir_override: Option<&str>) -> Result<PathBuf, StoreError> {
    let start = match dir_override {
        Some(dir) => PathBuf::from(dir),
        None => match std::env::var_os(DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()?,
        },
    };
    if start.file_name().is_some_and(|n| n == STORE_DIR) && start.is_dir() {
        return Ok(start);
    }
    store::discover_store(&start)
}

/// Everything a command reads once at startup
struct Session {
    store: JsonStore,
    config: AppConfig,
    tasks: Vec<Task>,
    members: Vec<Member>,
    refs: ReferenceCache,
}

impl Session {
    fn open(store_dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let store = JsonStore::open(store_dir)?;
        let config = config_io::read_config(store.dir())?;
        let tasks = store.load_tasks()?;
        let members = backend::load_members(&store);
        let refs = backend::load_reference_cache(&store);
        Ok(Session {
            store,
            config,
            tasks,
            members,
            refs,
        })
    }

    fn rules(&self) -> ViewRules {
        ViewRules {
            roster: self.config.roster.order.clone(),
            ordering: self.config.ordering.clone(),
        }
    }

    fn display(&self) -> DisplayContext<'_> {
        DisplayContext {
            members: &self.members,
            refs: &self.refs,
            ordering: &self.config.ordering,
            today: Local::now().date_naive(),
        }
    }

    /// Find a task by full id or unique id prefix
    fn find_task(&self, input: &str) -> Result<&Task, String> {
        if let Some(task) = self.tasks.iter().find(|t| t.id == input) {
            return Ok(task);
        }
        let matches: Vec<&Task> = self.tasks.iter().filter(|t| t.id.starts_with(input)).collect();
        match matches.as_slice() {
            [task] => Ok(*task),
            [] => Err(format!("task not found: {}", input)),
            _ => Err(format!("ambiguous task id '{}' matches {} tasks", input, matches.len())),
        }
    }

    fn member_id(&self, input: &str) -> Result<String, String> {
        self.members
            .iter()
            .find(|m| m.id == input || m.display_name == input)
            .map(|m| m.id.clone())
            .ok_or_else(|| format!("unknown member: {}", input))
    }

    fn ref_id(&self, kind: RefKind, input: &str) -> Result<String, String> {
        self.refs
            .set(kind)
            .resolve(input)
            .map(|e| e.id.clone())
            .ok_or_else(|| format!("unknown {}: {}", kind.label(), input))
    }
}

struct Credentials {
    email: Option<String>,
    password: Option<String>,
}

/// Sign in with the given credentials and require an admin for `gesture`.
fn require_admin(
    store_dir: &Path,
    credentials: &Credentials,
    gesture: Gesture,
) -> Result<Actor, Box<dyn std::error::Error>> {
    let actor = match (&credentials.email, &credentials.password) {
        (Some(email), Some(password)) => Some(LocalAuth::new(store_dir).sign_in(email, password)?),
        (Some(_), None) => return Err("--password is required with --email".into()),
        _ => None,
    };
    if !can_mutate(actor.as_ref()) {
        tracing::info!(?gesture, "gesture refused");
        return Err(gesture.denied_message().into());
    }
    actor.ok_or_else(|| gesture.denied_message().into())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn parse_tab(session: &Session, input: &str) -> Result<AssigneeTab, String> {
    match input {
        "all" => Ok(AssigneeTab::All),
        "unassigned" => Ok(AssigneeTab::Unassigned),
        other => session.member_id(other).map(AssigneeTab::Member),
    }
}

fn tab_label(tab: &AssigneeTab) -> String {
    match tab {
        AssigneeTab::All => "all".into(),
        AssigneeTab::Unassigned => "unassigned".into(),
        AssigneeTab::Member(id) => id.clone(),
    }
}

/// Copy command-line field flags into a draft
fn apply_field_args(session: &Session, draft: &mut TaskDraft, fields: TaskFieldArgs) -> Result<(), String> {
    let text = |v: String| if v == CLEAR { String::new() } else { v };
    if let Some(v) = fields.description {
        draft.description = text(v);
    }
    if let Some(v) = fields.git_issue_url {
        draft.git_issue_url = text(v);
    }
    if let Some(v) = fields.notes {
        draft.notes = text(v);
    }
    if let Some(v) = fields.start {
        draft.start_date = text(v);
    }
    if let Some(v) = fields.due {
        draft.due_date = text(v);
    }
    if let Some(v) = fields.assignee {
        draft.assignee_id = if v == CLEAR {
            None
        } else {
            Some(session.member_id(&v)?)
        };
    }
    if let Some(v) = fields.priority {
        draft.priority = session.ref_id(RefKind::Priority, &v)?;
    }
    if let Some(v) = fields.status {
        draft.status = session.ref_id(RefKind::Status, &v)?;
    }
    if let Some(v) = fields.product {
        draft.product = session.ref_id(RefKind::Product, &v)?;
    }
    if let Some(v) = fields.task_type {
        draft.task_type = session.ref_id(RefKind::TaskType, &v)?;
    }
    Ok(())
}

/// Parse a quick-edit value for `field`
fn parse_quick_value(session: &Session, field: QuickField, input: &str) -> Result<QuickValue, String> {
    let date = |name| -> Result<Option<NaiveDate>, String> {
        if input == CLEAR {
            Ok(None)
        } else {
            task_ops::parse_date(name, input).map_err(|e| e.to_string())
        }
    };
    Ok(match field {
        QuickField::Priority => QuickValue::Priority(session.ref_id(RefKind::Priority, input)?),
        QuickField::Status => QuickValue::Status(session.ref_id(RefKind::Status, input)?),
        QuickField::Assignee => QuickValue::Assignee(if input == CLEAR {
            None
        } else {
            Some(session.member_id(input)?)
        }),
        QuickField::StartDate => QuickValue::StartDate(date("start_date")?),
        QuickField::DueDate => QuickValue::DueDate(date("due_date")?),
    })
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(session: &Session, args: ListArgs, json: bool) -> CmdResult {
    let state = ViewState {
        active_tab: parse_tab(session, &args.tab)?,
        hide_completed_and_stopped: !args.show_finished
            && (args.hide_finished || session.config.ui.hide_finished),
        ..Default::default()
    };
    let rules = session.rules();
    let groups = view::derive_groups(&session.tasks, &session.members, &session.refs, &rules, &state);
    let ctx = session.display();

    if json {
        let out = ListJson {
            tab: tab_label(&state.active_tab),
            hide_finished: state.hide_completed_and_stopped,
            groups: groups.iter().map(|g| group_to_json(g, &ctx)).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_lines(&format_group_listing(&groups, &ctx));
    }
    Ok(())
}

fn cmd_show(session: &Session, args: ShowArgs, json: bool) -> CmdResult {
    let task = session.find_task(&args.id)?;
    let ctx = session.display();
    if json {
        println!("{}", serde_json::to_string_pretty(&task_to_json(task, &ctx))?);
    } else {
        print_lines(&format_task_detail(task, &ctx));
    }
    Ok(())
}

fn cmd_search(session: &Session, args: SearchArgs, json: bool) -> CmdResult {
    let re = search::build_regex(&args.pattern)?;
    let hits = search::search_titles(&session.tasks, &re);
    let ctx = session.display();
    if json {
        let out: Vec<SearchHitJson> = hits
            .iter()
            .filter_map(|h| session.find_task(&h.task_id).ok())
            .map(|t| SearchHitJson {
                task_id: t.id.clone(),
                title: t.title.clone(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for hit in &hits {
            if let Ok(task) = session.find_task(&hit.task_id) {
                println!("{}", format_task_line(task, &ctx));
            }
        }
    }
    Ok(())
}

fn cmd_refs(session: &Session, json: bool) -> CmdResult {
    if json {
        let out = refs_to_json(&session.members, &session.refs);
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_lines(&format_refs(&session.members, &session.refs));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(session: &Session, credentials: &Credentials, args: AddArgs, json: bool) -> CmdResult {
    require_admin(session.store.dir(), credentials, Gesture::Create)?;
    let mut draft = TaskDraft::blank(&session.refs, &session.config.defaults);
    draft.title = args.title;
    apply_field_args(session, &mut draft, args.fields)?;
    let valid = draft.validate()?;
    let id = session.store.create_task(&valid.task)?;

    if json {
        let out = CreatedJson {
            id,
            warnings: valid.warnings,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for w in &valid.warnings {
            eprintln!("warning: {}", w);
        }
        println!("{}", id);
    }
    Ok(())
}

fn cmd_edit(session: &Session, credentials: &Credentials, args: EditArgs) -> CmdResult {
    require_admin(session.store.dir(), credentials, Gesture::Edit)?;
    let task = session.find_task(&args.id)?;
    let mut draft = TaskDraft::from_task(task);
    if let Some(title) = args.title {
        draft.title = title;
    }
    apply_field_args(session, &mut draft, args.fields)?;
    let (patch, warnings) = draft.to_patch()?;
    for w in &warnings {
        eprintln!("warning: {}", w);
    }
    session.store.update_task(&task.id, &patch)?;
    println!("{}", short_id(&task.id));
    Ok(())
}

fn cmd_set(session: &Session, credentials: &Credentials, args: SetArgs) -> CmdResult {
    let field = QuickField::parse(&args.field).ok_or_else(|| {
        format!(
            "unknown field '{}' (expected: priority, assignee, status, start, due)",
            args.field
        )
    })?;
    let actor = require_admin(session.store.dir(), credentials, Gesture::Edit)?;
    let task = session.find_task(&args.id)?;
    let value = parse_quick_value(session, field, &args.value)?;

    let mut editing = QuickEdit::default();
    editing.begin(Some(&actor), &task.id, field)?;
    match editing.commit(task, value, &session.store)? {
        CommitOutcome::Committed => println!("{} {} updated", short_id(&task.id), field.label()),
        CommitOutcome::Unchanged => println!("{} unchanged", short_id(&task.id)),
        CommitOutcome::Rejected(r) => return Err(r.message().into()),
        CommitOutcome::Failed(msg) => return Err(msg.into()),
    }
    Ok(())
}

fn cmd_delete(session: &Session, credentials: &Credentials, args: DeleteArgs) -> CmdResult {
    require_admin(session.store.dir(), credentials, Gesture::Delete)?;
    let task = session.find_task(&args.id)?;
    if !args.yes {
        return Err(format!(
            "refusing to delete '{}' without --yes (deletion cannot be undone)",
            task.title
        )
        .into());
    }
    session.store.delete_task(&task.id)?;
    println!("deleted {}", short_id(&task.id));
    Ok(())
}

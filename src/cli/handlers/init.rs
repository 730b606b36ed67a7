use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::commands::InitArgs;
use crate::io::auth::{self, Account, hash_password};
use crate::io::config_io::CONFIG_FILE;
use crate::io::store::{self, JsonStore, MEMBERS_FILE, STORE_DIR, TASKS_FILE};
use crate::model::{Member, RefKind, Role, Task};

const CONFIG_TEMPLATE: &str = r##"[app]
title = "工作追蹤"

# Member ids in the order their groups appear in the "all" tab.
# Members not listed follow in members.json order.
[roster]
order = [{roster}]

# --- Ordering ---
# Status and priority names in display order. Unknown names sort last.
#
# [ordering]
# statuses = ["進行中", "評估中", "待Merge", "測試中", "待安排", "追蹤", "已完成"]
# priorities = ["緊急", "優先", "一般", "低", "擱置"]
# finished_statuses = ["已完成", "停止"]

# Names of the priority and status a new task starts with.
[defaults]
priority = "一般"
status = "待安排"

[ui]
hide_finished = false
#
# [ui.colors]
# background = "#0C001B"
# text = "#A09BFE"
# text_bright = "#FFFFFF"
# highlight = "#FB4196"
# dim = "#5A5580"
# red = "#FF4444"
# yellow = "#FFD700"
# green = "#44FF88"
# cyan = "#44DDFF"
"##;

/// Validate that a member id is lowercase alphanumeric with hyphens only.
fn validate_member_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("member id cannot be empty".to_string());
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(format!(
            "invalid member id \"{}\": use lowercase with hyphens (e.g. \"amy-chen\")",
            id
        ));
    }
    Ok(())
}

/// Parse --member pairs from the flat Vec<String> produced by clap.
fn parse_member_pairs(args: &[String]) -> Vec<Member> {
    args.chunks(2)
        .filter_map(|chunk| match chunk {
            [id, name] => Some(Member::new(id, name)),
            _ => None,
        })
        .collect()
}

fn render_config(members: &[Member]) -> String {
    let roster = members
        .iter()
        .map(|m| format!("\"{}\"", m.id))
        .collect::<Vec<_>>()
        .join(", ");
    CONFIG_TEMPLATE.replace("{roster}", &roster)
}

/// Create `.tasktrack/` under `root`. The admin account, if requested,
/// needs a password.
pub fn cmd_init(
    args: InitArgs,
    root: Option<&Path>,
    password: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let root: PathBuf = match root {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let dir = root.join(STORE_DIR);

    if dir.is_dir() && !args.force {
        return Err(format!("store already exists in {} (use --force to reinitialize)", dir.display()).into());
    }
    let admin = match (&args.admin, password) {
        (Some(email), Some(pw)) => Some((email.clone(), pw)),
        (Some(_), None) => return Err("--admin needs --password".into()),
        (None, _) => None,
    };

    let members = parse_member_pairs(&args.member);
    let mut seen = std::collections::HashSet::new();
    for m in &members {
        validate_member_id(&m.id)?;
        if !seen.insert(m.id.as_str()) {
            return Err(format!("duplicate member id \"{}\"", m.id).into());
        }
    }

    fs::create_dir_all(&dir)?;
    fs::write(dir.join(CONFIG_FILE), render_config(&members))?;

    let store = JsonStore::open(&dir)?;
    for kind in RefKind::ALL {
        store.write_refs(kind, &store::default_references(kind))?;
    }
    // Reinitializing keeps existing tasks and, unless new ones are given, members
    if !members.is_empty() || !dir.join(MEMBERS_FILE).exists() {
        store.write_doc(MEMBERS_FILE, &members)?;
    }
    if !dir.join(TASKS_FILE).exists() {
        store.write_doc(TASKS_FILE, &Vec::<Task>::new())?;
    }

    if let Some((email, pw)) = admin {
        auth::upsert_account(
            &dir.join(auth::ACCOUNTS_FILE),
            Account {
                email: email.clone(),
                password_sha256: hash_password(pw),
                role: Role::Admin,
                uid: uuid::Uuid::new_v4().to_string(),
                display_name: None,
            },
        )?;
        println!("  admin: {}", email);
    }

    tracing::info!(dir = %dir.display(), members = members.len(), "store initialized");
    println!("Initialized tasktrack store in {}", dir.display());
    for m in &members {
        println!("  member: {} ({})", m.display_name, m.id);
    }
    Ok(())
}

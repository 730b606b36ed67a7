use std::rc::Rc;

use chrono::NaiveDate;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use tempfile::TempDir;

use crate::io::auth::{ACCOUNTS_FILE, Account, AuthProvider, LocalAuth, hash_password, upsert_account};
use crate::io::memory::MemoryStore;
use crate::io::state::UiState;
use crate::model::{AppConfig, Member, RefEntry, RefKind, Role, Task};
use crate::tui::app::App;
use crate::tui::render;
use crate::util::unicode;

pub const TERM_W: u16 = 120;
pub const TERM_H: u16 = 24;

pub const ADMIN_EMAIL: &str = "boss@example.com";
pub const VIEWER_EMAIL: &str = "viewer@example.com";
pub const PASSWORD: &str = "hunter2";

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            // Cells hidden behind a wide character are skipped
            let mut s = String::new();
            let mut skip = 0usize;
            for cell in row {
                if skip > 0 {
                    skip -= 1;
                    continue;
                }
                s.push_str(cell.symbol());
                skip = unicode::display_width(cell.symbol()).saturating_sub(1);
            }
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

pub fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

pub fn task(id: &str, title: &str, assignee: Option<&str>, priority: &str, status: &str) -> Task {
    Task {
        id: id.into(),
        title: title.into(),
        description: None,
        git_issue_url: None,
        assignee_id: assignee.map(String::from),
        start_date: None,
        due_date: None,
        priority: priority.into(),
        status: status.into(),
        product: "xq".into(),
        task_type: "spec".into(),
        notes: None,
        created_at: None,
        updated_at: None,
    }
}

/// Two members with two tasks each, one unassigned task and one whose
/// assignee is not a member.
pub fn sample_tasks() -> Vec<Task> {
    let mut ship = task("t-amy-1", "Ship release", Some("m1"), "p-normal", "s-active");
    ship.start_date = date(2025, 3, 1);
    ship.due_date = date(2025, 3, 20);
    ship.notes = Some("needs sign-off".into());
    vec![
        ship,
        task("t-amy-2", "Fix login page", Some("m1"), "p-urgent", "s-todo"),
        task("t-bo-1", "Write docs", Some("m2"), "p-high", "s-active"),
        task("t-bo-2", "Old cleanup", Some("m2"), "p-low", "s-done"),
        task("t-none-1", "Triage inbox", None, "p-normal", "s-todo"),
        task("t-ghost", "Dangling", Some("m9"), "p-normal", "s-todo"),
    ]
}

pub fn sample_store(tasks: Vec<Task>) -> MemoryStore {
    let store = MemoryStore::with_tasks(tasks);
    store.set_members(vec![Member::new("m1", "Amy"), Member::new("m2", "Bo")]);
    store.set_refs(
        RefKind::Priority,
        vec![
            RefEntry::new("p-urgent", "緊急", 1),
            RefEntry::new("p-high", "優先", 2),
            RefEntry::new("p-normal", "一般", 3),
            RefEntry::new("p-low", "低", 4),
        ],
    );
    store.set_refs(
        RefKind::Status,
        vec![
            RefEntry::new("s-active", "進行中", 1),
            RefEntry::new("s-todo", "待安排", 5),
            RefEntry::new("s-done", "已完成", 7),
            RefEntry::new("s-stop", "停止", 8),
        ],
    );
    store.set_refs(RefKind::Product, vec![RefEntry::new("xq", "XQ", 1)]);
    store.set_refs(
        RefKind::TaskType,
        vec![RefEntry::new("spec", "規格", 1), RefEntry::new("bug", "Bug", 2)],
    );
    store
}

fn account(email: &str, role: Role) -> Account {
    Account {
        email: email.into(),
        password_sha256: hash_password(PASSWORD),
        role,
        uid: format!("uid-{}", email),
        display_name: None,
    }
}

/// An App wired to an in-memory store and a throwaway accounts file
pub struct Harness {
    pub app: App,
    pub store: Rc<MemoryStore>,
    pub auth: Rc<LocalAuth>,
    _tmp: TempDir,
}

impl Harness {
    /// Sample data, signed in with `role` (or anonymous)
    pub fn new(role: Option<Role>) -> Self {
        Self::with_state(role, None)
    }

    pub fn with_state(role: Option<Role>, saved: Option<UiState>) -> Self {
        Self::build(sample_tasks(), role, saved)
    }

    pub fn with_tasks(tasks: Vec<Task>, role: Option<Role>) -> Self {
        Self::build(tasks, role, None)
    }

    fn build(tasks: Vec<Task>, role: Option<Role>, saved: Option<UiState>) -> Self {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(ACCOUNTS_FILE);
        upsert_account(&path, account(ADMIN_EMAIL, Role::Admin)).unwrap();
        upsert_account(&path, account(VIEWER_EMAIL, Role::Viewer)).unwrap();

        let auth = Rc::new(LocalAuth::new(tmp.path()));
        match role {
            Some(Role::Admin) => {
                auth.sign_in(ADMIN_EMAIL, PASSWORD).unwrap();
            }
            Some(Role::Viewer) => {
                auth.sign_in(VIEWER_EMAIL, PASSWORD).unwrap();
            }
            None => {}
        }

        let store = Rc::new(sample_store(tasks));
        let mut app = App::new(store.clone(), auth.clone(), AppConfig::default(), saved);
        app.today = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        Harness {
            app,
            store,
            auth,
            _tmp: tmp,
        }
    }

    /// Put the cursor on a task by id
    pub fn select(&mut self, id: &str) {
        let pos = self
            .app
            .visible_tasks()
            .iter()
            .position(|t| t.id == id)
            .unwrap_or_else(|| panic!("{id} is not visible"));
        self.app.cursor = pos;
    }

    /// Highlight the picker option with this label
    pub fn pick(&mut self, label: &str) {
        let picker = self.app.picker.as_mut().expect("picker open");
        picker.cursor = picker
            .options
            .iter()
            .position(|o| o.label == label)
            .unwrap_or_else(|| panic!("no option {label}"));
    }

    pub fn flash_text(&self) -> Option<String> {
        self.app.flash.as_ref().map(|f| f.text.clone())
    }

    pub fn render(&mut self) -> String {
        self.render_sized(TERM_W, TERM_H)
    }

    pub fn render_sized(&mut self, w: u16, h: u16) -> String {
        let app = &mut self.app;
        render_to_string(w, h, |frame, _| render::render(frame, app))
    }
}

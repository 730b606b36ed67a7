use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use regex::Regex;

use crate::cli::handlers::resolve_store_dir;
use crate::io::auth::{AuthProvider, AuthWatch, LocalAuth};
use crate::io::backend::{self, Backend};
use crate::io::feed::{FeedEvent, FeedSubscription};
use crate::io::state::{self, UiState};
use crate::io::store::JsonStore;
use crate::io::{config_io, logging};
use crate::model::{Actor, AppConfig, Gesture, Member, RefKind, ReferenceCache, Task, can_mutate};
use crate::ops::lookup;
use crate::ops::quick_edit::{CommitOutcome, QuickEdit, QuickEditError, QuickField, QuickValue};
use crate::ops::search;
use crate::ops::task_ops::{self, DraftField, TaskDraft};
use crate::ops::view::{self, AssigneeTab, TaskGroup, ViewRules, ViewState};

use super::input;
use super::render;
use super::text_input::TextInput;
use super::theme::Theme;

/// How long a transient banner stays up
pub const FLASH_TTL: Duration = Duration::from_secs(4);

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Choosing a value for a select cell
    Picker,
    /// Typing a date for a date cell
    DateInput,
    /// Full create/edit form
    Form,
    /// Delete confirmation
    Confirm,
    Login,
    Detail,
    Search,
    Help,
}

/// One choice in a quick-edit picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOption {
    pub value: QuickValue,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct PickerState {
    pub field: QuickField,
    pub options: Vec<PickerOption>,
    pub cursor: usize,
}

/// Full-form state. `input` mirrors the focused text field.
#[derive(Debug, Clone)]
pub struct FormState {
    pub draft: TaskDraft,
    pub focus: usize,
    pub input: TextInput,
    pub error: Option<String>,
}

impl FormState {
    fn new(draft: TaskDraft) -> Self {
        let input = TextInput::new(draft.text(DraftField::ALL[0]));
        FormState {
            draft,
            focus: 0,
            input,
            error: None,
        }
    }

    pub fn field(&self) -> DraftField {
        DraftField::ALL[self.focus]
    }

    /// Write the edit buffer back into the draft
    fn store_input(&mut self) {
        let text = self.input.text.clone();
        if let Some(slot) = self.draft.text_mut(self.field()) {
            *slot = text;
        }
    }

    /// Move focus to another field, keeping what was typed
    pub fn focus_step(&mut self, forward: bool) {
        self.store_input();
        let len = DraftField::ALL.len();
        self.focus = if forward {
            (self.focus + 1) % len
        } else {
            (self.focus + len - 1) % len
        };
        self.input = TextInput::new(self.draft.text(self.field()));
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginState {
    pub email: TextInput,
    pub password: TextInput,
    pub on_password: bool,
    pub error: Option<String>,
}

/// Transient banner message
#[derive(Debug, Clone)]
pub struct Flash {
    pub text: String,
    pub error: bool,
    pub at: Instant,
}

/// Main application state
pub struct App {
    store: Rc<dyn Backend>,
    auth: Rc<dyn AuthProvider>,
    feed: Option<FeedSubscription>,
    auth_watch: AuthWatch,
    /// Where UI state is persisted; `None` disables persistence
    state_dir: Option<PathBuf>,
    pub config: AppConfig,
    pub rules: ViewRules,
    pub theme: Theme,
    pub tasks: Vec<Task>,
    pub members: Vec<Member>,
    pub refs: ReferenceCache,
    pub actor: Option<Actor>,
    pub ui: UiState,
    pub mode: Mode,
    pub should_quit: bool,
    /// No snapshot has arrived yet
    pub loading: bool,
    pub today: NaiveDate,
    /// Index into the visible task list
    pub cursor: usize,
    /// First visible table row
    pub scroll: usize,
    /// Index into `QuickField::ALL`
    pub column: usize,
    pub picker: Option<PickerState>,
    pub date_input: Option<TextInput>,
    pub form: Option<FormState>,
    pub confirm_delete: Option<String>,
    pub login: Option<LoginState>,
    pub detail: Option<String>,
    pub search_input: TextInput,
    /// Position while browsing search history with Up/Down
    pub history_pos: Option<usize>,
    /// Persistent feed failure, cleared by the next good push
    pub feed_error: Option<String>,
    pub flash: Option<Flash>,
}

impl App {
    pub fn new(
        store: Rc<dyn Backend>,
        auth: Rc<dyn AuthProvider>,
        config: AppConfig,
        saved: Option<UiState>,
    ) -> Self {
        let refs = backend::load_reference_cache(store.references());
        let members = backend::load_members(store.references());
        let auth_watch = auth.on_auth_changed();
        let actor = auth.current_actor();
        let (feed, feed_error) = match store.subscribe_tasks() {
            Ok(sub) => (Some(sub), None),
            Err(e) => {
                tracing::error!(error = %e, "could not open task feed");
                (None, Some(e.to_string()))
            }
        };
        let ui = saved.unwrap_or_else(|| UiState {
            view: ViewState {
                hide_completed_and_stopped: config.ui.hide_finished,
                ..ViewState::default()
            },
            ..UiState::default()
        });
        let rules = ViewRules {
            roster: config.roster.order.clone(),
            ordering: config.ordering.clone(),
        };
        let theme = Theme::from_config(&config.ui);

        let mut app = App {
            store,
            auth,
            feed,
            auth_watch,
            state_dir: None,
            config,
            rules,
            theme,
            tasks: Vec::new(),
            members,
            refs,
            actor,
            ui,
            mode: Mode::Navigate,
            should_quit: false,
            loading: true,
            today: Local::now().date_naive(),
            cursor: 0,
            scroll: 0,
            column: 0,
            picker: None,
            date_input: None,
            form: None,
            confirm_delete: None,
            login: None,
            detail: None,
            search_input: TextInput::default(),
            history_pos: None,
            feed_error,
            flash: None,
        };
        app.poll_feed();
        app
    }

    pub fn with_state_dir(mut self, dir: &Path) -> Self {
        self.state_dir = Some(dir.to_path_buf());
        self
    }

    // -----------------------------------------------------------------------
    // Feed and auth
    // -----------------------------------------------------------------------

    /// Apply pending pushes and auth changes; expire the transient banner
    pub fn tick(&mut self) {
        self.poll_feed();
        self.poll_auth();
        if self.flash.as_ref().is_some_and(|f| f.at.elapsed() >= FLASH_TTL) {
            self.flash = None;
        }
    }

    pub fn poll_feed(&mut self) {
        let events = match &self.feed {
            Some(feed) => feed.poll(),
            None => return,
        };
        for event in events {
            self.apply_feed_event(event);
        }
    }

    /// Each snapshot fully replaces the task and member sets
    pub fn apply_feed_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Snapshot { tasks, members } => {
                tracing::debug!(tasks = tasks.len(), members = members.len(), "feed snapshot");
                self.tasks = tasks;
                self.members = members;
                self.loading = false;
                self.feed_error = None;
                self.drop_stale_edit();
                self.clamp_cursor();
            }
            FeedEvent::Error(message) => {
                tracing::warn!(%message, "feed error");
                self.feed_error = Some(message);
            }
        }
    }

    /// A cell whose task vanished from the feed loses focus
    fn drop_stale_edit(&mut self) {
        if let QuickEdit::Editing { task_id, .. } = &self.ui.view.editing
            && !self.tasks.iter().any(|t| &t.id == task_id)
        {
            self.cancel_quick_edit();
        }
        if let Some(id) = &self.detail
            && !self.tasks.iter().any(|t| &t.id == id)
        {
            self.close_detail();
        }
    }

    pub fn poll_auth(&mut self) {
        let Some(change) = self.auth_watch.poll() else {
            return;
        };
        self.actor = change;
        if !can_mutate(self.actor.as_ref()) {
            self.drop_mutating_ui();
        }
    }

    /// Close everything that would end in a gateway call
    fn drop_mutating_ui(&mut self) {
        if !self.ui.view.editing.is_idle() {
            self.cancel_quick_edit();
        }
        if self.form.take().is_some() || self.confirm_delete.take().is_some() {
            self.mode = Mode::Navigate;
        }
    }

    pub fn stop_feed(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.unsubscribe();
        }
    }

    // -----------------------------------------------------------------------
    // Derived view
    // -----------------------------------------------------------------------

    pub fn groups(&self) -> Vec<TaskGroup<'_>> {
        view::derive_groups(&self.tasks, &self.members, &self.refs, &self.rules, &self.ui.view)
    }

    /// Tasks in display order, headings skipped
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.groups().into_iter().flat_map(|g| g.tasks).collect()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.visible_tasks().get(self.cursor).copied()
    }

    pub fn tabs(&self) -> Vec<AssigneeTab> {
        view::tabs(&self.members, &self.rules)
    }

    pub fn tab_label(&self, tab: &AssigneeTab) -> String {
        match tab {
            AssigneeTab::All => "全部".into(),
            AssigneeTab::Unassigned => lookup::UNASSIGNED_LABEL.into(),
            AssigneeTab::Member(id) => lookup::assignee_label(&self.members, Some(id.as_str())).into(),
        }
    }

    pub fn column_field(&self) -> QuickField {
        QuickField::ALL[self.column.min(QuickField::ALL.len() - 1)]
    }

    fn clamp_cursor(&mut self) {
        let len = self.visible_tasks().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Search pattern to highlight: live input while searching, otherwise the last search
    pub fn active_search_re(&self) -> Option<Regex> {
        let pattern = match self.mode {
            Mode::Search if !self.search_input.is_empty() => self.search_input.text.as_str(),
            Mode::Search => return None,
            _ => self.ui.last_search.as_deref()?,
        };
        search::build_regex(pattern).ok()
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.visible_tasks().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
    }

    pub fn move_column(&mut self, delta: isize) {
        let last = QuickField::ALL.len() - 1;
        self.column = self.column.saturating_add_signed(delta).min(last);
    }

    pub fn select_tab(&mut self, tab: AssigneeTab) {
        if self.ui.view.active_tab == tab {
            return;
        }
        tracing::debug!(?tab, "tab selected");
        self.ui.view.active_tab = tab;
        self.ui.view.editing.blur();
        self.cursor = 0;
        self.scroll = 0;
    }

    pub fn select_tab_index(&mut self, idx: usize) {
        if let Some(tab) = self.tabs().into_iter().nth(idx) {
            self.select_tab(tab);
        }
    }

    pub fn cycle_tab(&mut self, forward: bool) {
        let tabs = self.tabs();
        let pos = tabs
            .iter()
            .position(|t| *t == self.ui.view.active_tab)
            .unwrap_or(0);
        let next = if forward {
            (pos + 1) % tabs.len()
        } else {
            (pos + tabs.len() - 1) % tabs.len()
        };
        self.select_tab(tabs[next].clone());
    }

    pub fn toggle_hide_finished(&mut self) {
        self.ui.view.hide_completed_and_stopped = !self.ui.view.hide_completed_and_stopped;
        self.clamp_cursor();
    }

    pub fn flash_info(&mut self, text: impl Into<String>) {
        self.flash = Some(Flash {
            text: text.into(),
            error: false,
            at: Instant::now(),
        });
    }

    pub fn flash_error(&mut self, text: impl Into<String>) {
        self.flash = Some(Flash {
            text: text.into(),
            error: true,
            at: Instant::now(),
        });
    }

    /// Esc in the list: drop the transient banner, then the search highlight
    pub fn dismiss(&mut self) {
        if self.flash.take().is_none() {
            self.ui.last_search = None;
        }
    }

    // -----------------------------------------------------------------------
    // Quick edit
    // -----------------------------------------------------------------------

    /// Start editing the selected cell
    pub fn begin_quick_edit(&mut self) {
        let Some(task) = self.selected_task().cloned() else {
            return;
        };
        let field = self.column_field();
        if let Err(e) = self.ui.view.editing.begin(self.actor.as_ref(), &task.id, field) {
            match e {
                QuickEditError::NotAuthorized => self.flash_error(Gesture::Edit.denied_message()),
                other => self.flash_error(other.to_string()),
            }
            return;
        }
        if field.is_date() {
            let current = match field {
                QuickField::StartDate => task.start_date,
                _ => task.due_date,
            };
            let text = current.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
            self.date_input = Some(TextInput::new(&text));
            self.mode = Mode::DateInput;
        } else {
            self.picker = Some(self.build_picker(field, &task));
            self.mode = Mode::Picker;
        }
    }

    fn build_picker(&self, field: QuickField, task: &Task) -> PickerState {
        let refs = |kind: RefKind, wrap: fn(String) -> QuickValue| -> Vec<PickerOption> {
            self.refs
                .set(kind)
                .iter()
                .map(|e| PickerOption {
                    value: wrap(e.id.clone()),
                    label: e.name.clone(),
                })
                .collect()
        };
        let options = match field {
            QuickField::Priority => refs(RefKind::Priority, QuickValue::Priority),
            QuickField::Status => refs(RefKind::Status, QuickValue::Status),
            _ => {
                let mut options = vec![PickerOption {
                    value: QuickValue::Assignee(None),
                    label: lookup::UNASSIGNED_LABEL.into(),
                }];
                options.extend(self.members.iter().map(|m| PickerOption {
                    value: QuickValue::Assignee(Some(m.id.clone())),
                    label: m.display_name.clone(),
                }));
                options
            }
        };
        let current = QuickValue::current(field, task);
        let cursor = options.iter().position(|o| o.value == current).unwrap_or(0);
        PickerState {
            field,
            options,
            cursor,
        }
    }

    /// Commit the highlighted picker option
    pub fn commit_picker(&mut self) {
        let Some(value) = self
            .picker
            .as_ref()
            .and_then(|p| p.options.get(p.cursor))
            .map(|o| o.value.clone())
        else {
            self.cancel_quick_edit();
            return;
        };
        self.commit_quick_edit(value);
    }

    /// Parse and commit the date buffer. A bad date keeps the buffer open.
    pub fn commit_date_input(&mut self) {
        let (Some(field), Some(input)) = (self.ui.view.editing.editing_field(), &self.date_input)
        else {
            self.cancel_quick_edit();
            return;
        };
        let name = match field {
            QuickField::StartDate => "start_date",
            _ => "due_date",
        };
        match task_ops::parse_date(name, &input.text) {
            Ok(date) => {
                let value = match field {
                    QuickField::StartDate => QuickValue::StartDate(date),
                    _ => QuickValue::DueDate(date),
                };
                self.commit_quick_edit(value);
            }
            Err(e) => self.flash_error(e.to_string()),
        }
    }

    fn commit_quick_edit(&mut self, value: QuickValue) {
        let task = match &self.ui.view.editing {
            QuickEdit::Editing { task_id, .. } => self.tasks.iter().find(|t| &t.id == task_id).cloned(),
            QuickEdit::Idle => None,
        };
        self.picker = None;
        self.date_input = None;
        self.mode = Mode::Navigate;
        let Some(task) = task else {
            self.ui.view.editing.blur();
            return;
        };

        match self.ui.view.editing.commit(&task, value, self.store.gateway()) {
            Ok(CommitOutcome::Unchanged) => {}
            Ok(CommitOutcome::Committed) => self.poll_feed(),
            Ok(CommitOutcome::Rejected(rejection)) => self.flash_error(rejection.message()),
            Ok(CommitOutcome::Failed(message)) => self.flash_error(message),
            Err(e) => self.flash_error(e.to_string()),
        }
    }

    /// Focus left the cell
    pub fn cancel_quick_edit(&mut self) {
        self.ui.view.editing.blur();
        self.picker = None;
        self.date_input = None;
        if matches!(self.mode, Mode::Picker | Mode::DateInput) {
            self.mode = Mode::Navigate;
        }
    }

    // -----------------------------------------------------------------------
    // Full form
    // -----------------------------------------------------------------------

    fn gate(&mut self, gesture: Gesture) -> bool {
        if can_mutate(self.actor.as_ref()) {
            return true;
        }
        tracing::info!(?gesture, "gesture refused");
        self.flash_error(gesture.denied_message());
        false
    }

    pub fn open_create_form(&mut self) {
        if !self.gate(Gesture::Create) {
            return;
        }
        self.ui.view.editing.blur();
        let mut draft = TaskDraft::blank(&self.refs, &self.config.defaults);
        if let AssigneeTab::Member(id) = &self.ui.view.active_tab {
            draft.assignee_id = Some(id.clone());
        }
        self.form = Some(FormState::new(draft));
        self.mode = Mode::Form;
    }

    pub fn open_edit_form(&mut self) {
        if !self.gate(Gesture::Edit) {
            return;
        }
        let Some(task) = self.selected_task() else {
            return;
        };
        let draft = TaskDraft::from_task(task);
        self.ui.view.editing.blur();
        self.form = Some(FormState::new(draft));
        self.mode = Mode::Form;
    }

    /// Step the focused select field of the form
    pub fn cycle_form_field(&mut self, forward: bool) {
        let Some(form) = &mut self.form else {
            return;
        };
        let field = form.field();
        form.draft.cycle(field, &self.refs, &self.members, forward);
    }

    /// Create or update from the form. Failures keep the form open.
    pub fn submit_form(&mut self) {
        let Some(form) = &mut self.form else {
            return;
        };
        form.store_input();
        let draft = form.draft.clone();

        let result = match &draft.task_id {
            None => draft.validate().map(|valid| {
                let created = self.store.gateway().create_task(&valid.task);
                (created.map(Some), valid.warnings)
            }),
            Some(id) => draft.to_patch().map(|(patch, warnings)| {
                let updated = self.store.gateway().update_task(id, &patch);
                (updated.map(|()| None), warnings)
            }),
        };

        match result {
            Err(e) => {
                if let Some(form) = &mut self.form {
                    form.error = Some(e.to_string());
                }
            }
            Ok((Err(e), _)) => {
                tracing::warn!(error = %e, "form submit failed");
                if let Some(form) = &mut self.form {
                    form.error = Some(e.to_string());
                }
                self.flash_error(e.to_string());
            }
            Ok((Ok(created), warnings)) => {
                self.form = None;
                self.mode = Mode::Navigate;
                self.poll_feed();
                let mut message = match created {
                    Some(id) => {
                        self.select_task(&id);
                        format!("已建立任務：{}", draft.title.trim())
                    }
                    None => format!("已更新任務：{}", draft.title.trim()),
                };
                for w in warnings {
                    message.push_str(&format!("（{}）", w));
                }
                self.flash_info(message);
            }
        }
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
        self.mode = Mode::Navigate;
    }

    fn select_task(&mut self, id: &str) {
        let pos = self.visible_tasks().iter().position(|t| t.id == id);
        if let Some(pos) = pos {
            self.cursor = pos;
        }
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    pub fn request_delete(&mut self) {
        if !self.gate(Gesture::Delete) {
            return;
        }
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else {
            return;
        };
        self.ui.view.editing.blur();
        self.confirm_delete = Some(id);
        self.mode = Mode::Confirm;
    }

    /// Answer the delete confirmation. It closes whatever the outcome.
    pub fn resolve_delete(&mut self, confirmed: bool) {
        let id = self.confirm_delete.take();
        self.mode = Mode::Navigate;
        let Some(id) = id.filter(|_| confirmed) else {
            return;
        };
        match self.store.gateway().delete_task(&id) {
            Ok(()) => {
                self.flash_info("已刪除任務");
                self.poll_feed();
            }
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "delete failed");
                self.flash_error(e.to_string());
            }
        }
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    pub fn open_login(&mut self) {
        self.login = Some(LoginState::default());
        self.mode = Mode::Login;
    }

    pub fn submit_login(&mut self) {
        let Some(login) = &mut self.login else {
            return;
        };
        match self.auth.sign_in(&login.email.text, &login.password.text) {
            Ok(actor) => {
                self.login = None;
                self.mode = Mode::Navigate;
                self.poll_auth();
                self.flash_info(format!("已登入：{}", actor.label()));
            }
            Err(e) => {
                login.password.clear();
                login.error = Some(e.to_string());
            }
        }
    }

    pub fn cancel_login(&mut self) {
        self.login = None;
        self.mode = Mode::Navigate;
    }

    pub fn sign_out(&mut self) {
        if self.actor.is_none() {
            return;
        }
        self.auth.sign_out();
        self.poll_auth();
        self.flash_info("已登出");
    }

    // -----------------------------------------------------------------------
    // Detail, search, help
    // -----------------------------------------------------------------------

    pub fn open_detail(&mut self) {
        if let Some(id) = self.selected_task().map(|t| t.id.clone()) {
            self.detail = Some(id);
            self.mode = Mode::Detail;
        }
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
        if self.mode == Mode::Detail {
            self.mode = Mode::Navigate;
        }
    }

    pub fn detail_task(&self) -> Option<&Task> {
        let id = self.detail.as_deref()?;
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn start_search(&mut self) {
        self.search_input.clear();
        self.history_pos = None;
        self.mode = Mode::Search;
    }

    /// Step through earlier searches (older when `older` is true)
    pub fn browse_history(&mut self, older: bool) {
        let len = self.ui.search_history.len();
        if len == 0 {
            return;
        }
        let next = match (self.history_pos, older) {
            (None, true) => Some(0),
            (None, false) => None,
            (Some(i), true) => Some((i + 1).min(len - 1)),
            (Some(0), false) => None,
            (Some(i), false) => Some(i - 1),
        };
        self.history_pos = next;
        match next {
            Some(i) => {
                let pattern = self.ui.search_history[i].clone();
                self.search_input.set(&pattern);
            }
            None => self.search_input.clear(),
        }
    }

    /// Run the typed search: remember it and jump to the next matching row
    pub fn execute_search(&mut self) {
        self.mode = Mode::Navigate;
        let pattern = self.search_input.text.trim().to_string();
        if pattern.is_empty() {
            self.ui.last_search = None;
            return;
        }
        let re = match search::build_regex(&pattern) {
            Ok(re) => re,
            Err(e) => {
                self.flash_error(e.to_string());
                return;
            }
        };
        self.ui.remember_search(&pattern);
        let visible = self.visible_tasks();
        let hits = search::search_titles(visible.iter().copied(), &re);
        if hits.is_empty() {
            self.flash_info("沒有符合的任務");
            return;
        }
        let len = visible.len();
        let next = (1..=len)
            .map(|step| (self.cursor + step) % len)
            .find(|&i| hits.iter().any(|h| h.task_id == visible[i].id));
        let count = hits.len();
        if let Some(i) = next {
            self.cursor = i;
        }
        self.flash_info(format!("找到 {} 筆", count));
    }

    pub fn cancel_search(&mut self) {
        self.search_input.clear();
        self.mode = Mode::Navigate;
    }

    pub fn toggle_help(&mut self) {
        self.mode = if self.mode == Mode::Help {
            Mode::Navigate
        } else {
            Mode::Help
        };
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn save_ui_state(&self) {
        let Some(dir) = &self.state_dir else {
            return;
        };
        let mut ui = self.ui.clone();
        ui.view.editing = QuickEdit::Idle;
        if let Err(e) = state::write_ui_state(dir, &ui) {
            tracing::warn!(error = %e, "could not save UI state");
        }
    }
}

/// Run the TUI application
pub fn run(dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let store_dir = resolve_store_dir(dir)?;
    let _log_guard = logging::init_tui_logging(&store_dir);

    let store = JsonStore::open(&store_dir)?;
    let config = config_io::read_config(store.dir())?;
    let auth = LocalAuth::new(store.dir());
    let saved = state::read_ui_state(store.dir());
    let mut app = App::new(Rc::new(store), Rc::new(auth), config, saved).with_state_dir(&store_dir);
    tracing::info!(dir = %store_dir.display(), "tui started");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    app.save_ui_state();
    app.stop_feed();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut save_counter = 0u32;
    loop {
        app.today = Local::now().date_naive();
        app.tick();
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input::handle_key(app, key);
                    // Debounced state save: every ~5 key presses
                    save_counter += 1;
                    if save_counter >= 5 {
                        app.save_ui_state();
                        save_counter = 0;
                    }
                }
                Event::Paste(text) => input::handle_paste(app, &text),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

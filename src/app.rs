//! Dashboard state and the reducer that drives it.
//!
//! [`AppState::update`] is the only place state changes. It takes one [`AppEvent`] and
//! returns the [`Command`]s the runtime should execute; it never performs I/O itself.
//!
//! Fetches cascade down the panes: a selected workflow fetches its runs, the first
//! run's jobs are fetched next, then the first job's log, which also (re)starts log
//! polling. Every fetch carries a per-level sequence number and the id it was issued
//! for; a result whose sequence is not the latest for its level, or whose id no longer
//! matches the current selection, is discarded.

use crate::events::AppEvent;
use crate::gh::client::Repository;
use crate::gh::parser;
use crate::input::{self, Action, InputContext, InputMode};
use crate::list::FilteredList;
use crate::text_input::{InputOutcome, TextInput};
use chrono::{DateTime, Utc};
use crossterm::event::KeyEvent;
use std::time::Duration;

// UI constants
pub const FLASH_TTL: Duration = Duration::from_secs(3);
pub const SPINNER_FRAME_COUNT: usize = 8;
pub const FILTER_CHAR_LIMIT: usize = 50;

// Log view constants
pub const LOG_MAX_LINES: usize = 2000;
/// Lines taken by the fullscreen log's borders and the status bar.
const FULLSCREEN_CHROME_LINES: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    InProgress,
    Queued,
    Requested,
    Waiting,
    Pending,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    StartupFailure,
    Stale,
    Neutral,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub id: u64,
    pub number: u64,
    pub name: String,
    pub branch: String,
    pub actor: String,
    pub event: String,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    pub created_at: DateTime<Utc>,
    pub url: String,
}

impl Run {
    /// Not yet finished, so it can still be cancelled.
    pub fn is_running(&self) -> bool {
        matches!(
            self.status,
            RunStatus::InProgress
                | RunStatus::Queued
                | RunStatus::Waiting
                | RunStatus::Pending
                | RunStatus::Requested
        )
    }

    pub fn is_failed(&self) -> bool {
        self.status == RunStatus::Completed && self.conclusion == Some(Conclusion::Failure)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: u64,
    pub name: String,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    pub url: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub number: u64,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
}

fn workflow_fields(workflow: &Workflow) -> Vec<&str> {
    vec![workflow.name.as_str()]
}

fn run_fields(run: &Run) -> Vec<&str> {
    vec![run.branch.as_str(), run.actor.as_str()]
}

fn job_fields(job: &Job) -> Vec<&str> {
    vec![job.name.as_str()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Workflows,
    Runs,
    Logs,
}

impl Pane {
    pub fn next(self) -> Self {
        match self {
            Self::Workflows => Self::Runs,
            Self::Runs => Self::Logs,
            Self::Logs => Self::Workflows,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Workflows => Self::Logs,
            Self::Runs => Self::Workflows,
            Self::Logs => Self::Runs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunAction {
    Cancel,
    Rerun,
    RerunFailed,
}

impl RunAction {
    pub fn success_message(self) -> &'static str {
        match self {
            Self::Cancel => "Run cancelled",
            Self::Rerun => "Rerun triggered",
            Self::RerunFailed => "Rerun of failed jobs triggered",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cancel => "Cancel",
            Self::Rerun => "Rerun",
            Self::RerunFailed => "Rerun failed jobs",
        }
    }
}

/// A mutating action waiting for the user to confirm it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub action: RunAction,
    pub run_id: u64,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Filtering(TextInput),
    Confirming(PendingAction),
    FullscreenLog,
}

impl Mode {
    pub fn input_mode(&self) -> InputMode {
        match self {
            Self::Normal => InputMode::Normal,
            Self::Filtering(_) => InputMode::Filtering,
            Self::Confirming(_) => InputMode::Confirming,
            Self::FullscreenLog => InputMode::FullscreenLog,
        }
    }
}

/// The one status-bar message. Setting either kind replaces the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Error(String),
    /// Clears itself when `FlashExpired(id)` arrives for the same id.
    Flash { text: String, id: u64 },
}

/// Side effects requested by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchWorkflows,
    FetchRuns { workflow_id: u64, seq: u64 },
    FetchJobs { run_id: u64, seq: u64 },
    FetchLogs { job_id: u64, seq: u64 },
    /// Replace any running poll session with one tailing `job_id`.
    StartLogPolling { job_id: u64, seq: u64 },
    StopLogPolling,
    RunAction { action: RunAction, run_id: u64 },
    CopyToClipboard(String),
    ExpireFlash { id: u64, after: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSession {
    pub job_id: u64,
    pub seq: u64,
}

/// Tail of the selected job's log plus its scroll position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogView {
    job_id: Option<u64>,
    lines: Vec<String>,
    truncated: bool,
    loaded: bool,
    scroll: usize,
    /// Stick to the bottom as new content arrives.
    follow: bool,
}

impl Default for LogView {
    fn default() -> Self {
        Self {
            job_id: None,
            lines: Vec::new(),
            truncated: false,
            loaded: false,
            scroll: 0,
            follow: true,
        }
    }
}

impl LogView {
    pub fn job_id(&self) -> Option<u64> {
        self.job_id
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    fn reset(&mut self, job_id: Option<u64>) {
        *self = Self {
            job_id,
            ..Self::default()
        };
    }

    fn set_content(&mut self, raw: &str) {
        let (text, truncated) = parser::process_log_output(raw, LOG_MAX_LINES);
        self.lines = text.lines().map(str::to_string).collect();
        self.truncated = truncated;
        self.loaded = true;
    }

    /// First visible line for a viewport `height` lines tall.
    pub fn offset(&self, height: usize) -> usize {
        let max = self.lines.len().saturating_sub(height);
        if self.follow {
            max
        } else {
            self.scroll.min(max)
        }
    }

    fn scroll_up(&mut self, amount: usize, height: usize) {
        self.scroll = self.offset(height).saturating_sub(amount);
        self.follow = false;
    }

    fn scroll_down(&mut self, amount: usize, height: usize) {
        let max = self.lines.len().saturating_sub(height);
        self.scroll = (self.offset(height) + amount).min(max);
        self.follow = self.scroll >= max;
    }

    fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.follow = false;
    }

    fn scroll_to_bottom(&mut self) {
        self.follow = true;
    }
}

/// Immutable configuration set at startup.
pub struct AppConfig {
    pub repo: Repository,
}

/// Read-only view handed to the renderer each frame.
pub struct Snapshot<'a> {
    pub focused: Pane,
    pub mode: &'a Mode,
    pub show_help: bool,
    pub workflows: &'a FilteredList<Workflow>,
    pub runs: &'a FilteredList<Run>,
    pub jobs: &'a FilteredList<Job>,
    pub log: &'a LogView,
    pub status: Option<&'a StatusMessage>,
    pub loading: bool,
    pub spinner_frame: usize,
}

pub struct AppState {
    pub config: AppConfig,

    workflows: FilteredList<Workflow>,
    runs: FilteredList<Run>,
    jobs: FilteredList<Job>,
    log: LogView,
    /// Workflow the runs list was loaded for; a different owner resets the selection.
    runs_owner: Option<u64>,
    /// Run the jobs list was loaded for.
    jobs_owner: Option<u64>,

    // Latest issued sequence per cascade level
    runs_seq: u64,
    jobs_seq: u64,
    logs_seq: u64,
    log_session: Option<LogSession>,
    /// A poll tick has delivered for the current session; the one-shot fetch is older.
    log_tail_polled: bool,

    focused: Pane,
    mode: Mode,
    show_help: bool,
    status: Option<StatusMessage>,
    next_flash_id: u64,

    viewport: (u16, u16),
    spinner_frame: usize,
    loading_count: u16,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(repo: Repository) -> Self {
        Self {
            config: AppConfig { repo },
            workflows: FilteredList::new(workflow_fields),
            runs: FilteredList::new(run_fields),
            jobs: FilteredList::new(job_fields),
            log: LogView::default(),
            runs_owner: None,
            jobs_owner: None,
            runs_seq: 0,
            jobs_seq: 0,
            logs_seq: 0,
            log_session: None,
            log_tail_polled: false,
            focused: Pane::Workflows,
            mode: Mode::Normal,
            show_help: false,
            status: None,
            next_flash_id: 0,
            viewport: (80, 24),
            spinner_frame: 0,
            loading_count: 0,
            should_quit: false,
        }
    }

    /// Commands to run once at startup.
    pub fn init(&mut self) -> Vec<Command> {
        self.begin_loading();
        vec![Command::FetchWorkflows]
    }

    pub fn update(&mut self, event: AppEvent) -> Vec<Command> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize { width, height } => {
                self.viewport = (width, height);
                Vec::new()
            }
            AppEvent::Tick => {
                self.advance_spinner();
                Vec::new()
            }
            AppEvent::WorkflowsLoaded(result) => self.on_workflows_loaded(result),
            AppEvent::RunsLoaded {
                workflow_id,
                seq,
                result,
            } => self.on_runs_loaded(workflow_id, seq, result),
            AppEvent::JobsLoaded {
                run_id,
                seq,
                result,
            } => self.on_jobs_loaded(run_id, seq, result),
            AppEvent::LogsLoaded {
                job_id,
                seq,
                polled,
                result,
            } => {
                self.on_logs_loaded(job_id, seq, polled, result);
                Vec::new()
            }
            AppEvent::ActionFinished {
                action,
                run_id,
                result,
            } => self.on_action_finished(action, run_id, result),
            AppEvent::ClipboardResult(result) => match result {
                Ok(()) => vec![self.flash("Copied URL")],
                Err(e) => {
                    self.set_error(format!("Copy failed: {e}"));
                    Vec::new()
                }
            },
            AppEvent::FlashExpired(id) => {
                if matches!(&self.status, Some(StatusMessage::Flash { id: current, .. }) if *current == id)
                {
                    self.status = None;
                }
                Vec::new()
            }
            AppEvent::Error(msg) => {
                self.set_error(msg);
                Vec::new()
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let ctx = InputContext {
            mode: self.mode.input_mode(),
        };
        let action = input::map_key(key, &ctx);
        self.handle_action(action)
    }

    fn handle_action(&mut self, action: Action) -> Vec<Command> {
        let normal = self.mode == Mode::Normal;
        let fullscreen = self.mode == Mode::FullscreenLog;
        let page = self.log_page_height();
        match action {
            Action::None => Vec::new(),
            Action::Quit => {
                self.should_quit = true;
                Vec::new()
            }
            Action::Back => {
                self.back();
                Vec::new()
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                Vec::new()
            }
            Action::MoveUp if normal => self.move_selection(false),
            Action::MoveDown if normal => self.move_selection(true),
            Action::FocusNext if normal => {
                self.focused = self.focused.next();
                Vec::new()
            }
            Action::FocusPrev if normal => {
                self.focused = self.focused.prev();
                Vec::new()
            }
            Action::StartFilter if normal => {
                let current = self.focused_filter().to_string();
                self.mode = Mode::Filtering(TextInput::with_value(&current, FILTER_CHAR_LIMIT));
                Vec::new()
            }
            Action::FilterKey(key) => self.filter_key(key),
            Action::CancelRun if normal => {
                self.request_cancel();
                Vec::new()
            }
            Action::Rerun if normal => self.rerun(false),
            Action::RerunFailed if normal => self.rerun(true),
            Action::ConfirmAccept => self.resolve_confirmation(true),
            Action::ConfirmReject => self.resolve_confirmation(false),
            Action::ToggleFullscreen if normal && self.focused == Pane::Logs => {
                self.mode = Mode::FullscreenLog;
                Vec::new()
            }
            Action::ToggleFullscreen if fullscreen => {
                self.mode = Mode::Normal;
                Vec::new()
            }
            Action::ScrollUp if fullscreen => {
                self.log.scroll_up(1, page);
                Vec::new()
            }
            Action::ScrollDown if fullscreen => {
                self.log.scroll_down(1, page);
                Vec::new()
            }
            Action::PageUp if fullscreen => {
                self.log.scroll_up(page, page);
                Vec::new()
            }
            Action::PageDown if fullscreen => {
                self.log.scroll_down(page, page);
                Vec::new()
            }
            Action::ScrollToTop if fullscreen => {
                self.log.scroll_to_top();
                Vec::new()
            }
            Action::ScrollToBottom if fullscreen => {
                self.log.scroll_to_bottom();
                Vec::new()
            }
            Action::CopyUrl if normal => self.copy_url(),
            Action::Refresh if normal => self.refresh(),
            _ => Vec::new(),
        }
    }

    /// Escape: help first, then fullscreen, then a visible error.
    fn back(&mut self) {
        if self.show_help {
            self.show_help = false;
        } else if self.mode == Mode::FullscreenLog {
            self.mode = Mode::Normal;
        } else if matches!(self.status, Some(StatusMessage::Error(_))) {
            self.status = None;
        }
    }

    fn move_selection(&mut self, down: bool) -> Vec<Command> {
        let moved = match (self.focused, down) {
            (Pane::Workflows, true) => self.workflows.select_next(),
            (Pane::Workflows, false) => self.workflows.select_prev(),
            (Pane::Runs, true) => self.runs.select_next(),
            (Pane::Runs, false) => self.runs.select_prev(),
            (Pane::Logs, true) => self.jobs.select_next(),
            (Pane::Logs, false) => self.jobs.select_prev(),
        };
        if !moved {
            return Vec::new();
        }
        self.cascade_from(self.focused)
    }

    fn cascade_from(&mut self, pane: Pane) -> Vec<Command> {
        match pane {
            Pane::Workflows => self.select_workflow(),
            Pane::Runs => self.select_run(),
            Pane::Logs => self.select_job(),
        }
    }

    // --- Filtering ---

    fn focused_filter(&self) -> &str {
        match self.focused {
            Pane::Workflows => self.workflows.filter(),
            Pane::Runs => self.runs.filter(),
            Pane::Logs => self.jobs.filter(),
        }
    }

    fn filter_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let Mode::Filtering(input) = &mut self.mode else {
            return Vec::new();
        };
        match input.handle_key(key) {
            InputOutcome::Commit => {
                let text = input.value().to_string();
                self.mode = Mode::Normal;
                self.apply_filter(&text)
            }
            InputOutcome::Cancel => {
                self.mode = Mode::Normal;
                self.apply_filter("")
            }
            InputOutcome::Changed | InputOutcome::Ignored => Vec::new(),
        }
    }

    /// Filter the focused pane's list. Cascades only if the selected item changed; a
    /// filter that hides every item tears down everything below the pane.
    fn apply_filter(&mut self, text: &str) -> Vec<Command> {
        let (before, after) = match self.focused {
            Pane::Workflows => {
                let before = self.selected_workflow_id();
                self.workflows.set_filter(text);
                (before, self.selected_workflow_id())
            }
            Pane::Runs => {
                let before = self.selected_run_id();
                self.runs.set_filter(text);
                (before, self.selected_run_id())
            }
            Pane::Logs => {
                let before = self.selected_job_id();
                self.jobs.set_filter(text);
                (before, self.selected_job_id())
            }
        };
        tracing::debug!(pane = ?self.focused, filter = text, "filter applied");
        match (before, after) {
            (Some(_), None) => match self.focused {
                Pane::Workflows => self.clear_runs(),
                Pane::Runs => self.clear_jobs(),
                Pane::Logs => self.end_log_session(),
            },
            (_, Some(_)) if after != before => self.cascade_from(self.focused),
            _ => Vec::new(),
        }
    }

    // --- Mutating actions ---

    fn request_cancel(&mut self) {
        if self.focused != Pane::Runs {
            return;
        }
        let Some(run) = self.runs.selected().filter(|r| r.is_running()) else {
            return;
        };
        let pending = PendingAction {
            action: RunAction::Cancel,
            run_id: run.id,
            prompt: format!("Cancel run #{} on {}?", run.number, run.branch),
        };
        self.mode = Mode::Confirming(pending);
    }

    fn rerun(&mut self, failed_only: bool) -> Vec<Command> {
        if self.focused != Pane::Runs {
            return Vec::new();
        }
        let Some(run) = self.runs.selected() else {
            return Vec::new();
        };
        let action = if failed_only {
            if !run.is_failed() {
                return Vec::new();
            }
            RunAction::RerunFailed
        } else {
            RunAction::Rerun
        };
        vec![Command::RunAction {
            action,
            run_id: run.id,
        }]
    }

    fn resolve_confirmation(&mut self, accept: bool) -> Vec<Command> {
        match std::mem::take(&mut self.mode) {
            Mode::Confirming(pending) if accept => vec![Command::RunAction {
                action: pending.action,
                run_id: pending.run_id,
            }],
            Mode::Confirming(_) => Vec::new(),
            other => {
                self.mode = other;
                Vec::new()
            }
        }
    }

    fn on_action_finished(
        &mut self,
        action: RunAction,
        run_id: u64,
        result: Result<(), String>,
    ) -> Vec<Command> {
        match result {
            Ok(()) => {
                tracing::debug!(?action, run_id, "action succeeded, refreshing runs");
                let mut commands = vec![self.flash(action.success_message())];
                commands.extend(self.select_workflow());
                commands
            }
            Err(e) => {
                self.set_error(format!("{} failed: {e}", action.label()));
                Vec::new()
            }
        }
    }

    fn copy_url(&mut self) -> Vec<Command> {
        let url = match self.focused {
            Pane::Runs => self.runs.selected().map(|r| r.url.clone()),
            Pane::Logs => self.jobs.selected().map(|j| j.url.clone()),
            Pane::Workflows => None,
        };
        match url {
            Some(url) if !url.is_empty() => vec![Command::CopyToClipboard(url)],
            _ => Vec::new(),
        }
    }

    fn refresh(&mut self) -> Vec<Command> {
        if self.selected_workflow_id().is_some() {
            self.select_workflow()
        } else {
            self.begin_loading();
            vec![Command::FetchWorkflows]
        }
    }

    // --- Cascade ---

    pub fn selected_workflow_id(&self) -> Option<u64> {
        self.workflows.selected().map(|w| w.id)
    }

    pub fn selected_run_id(&self) -> Option<u64> {
        self.runs.selected().map(|r| r.id)
    }

    pub fn selected_job_id(&self) -> Option<u64> {
        self.jobs.selected().map(|j| j.id)
    }

    fn select_workflow(&mut self) -> Vec<Command> {
        let Some(workflow_id) = self.selected_workflow_id() else {
            return Vec::new();
        };
        self.runs_seq += 1;
        // a jobs fetch for the previous workflow's run is now pointless
        self.jobs_seq += 1;
        self.begin_loading();
        tracing::debug!(workflow_id, seq = self.runs_seq, "fetching runs");
        vec![Command::FetchRuns {
            workflow_id,
            seq: self.runs_seq,
        }]
    }

    fn select_run(&mut self) -> Vec<Command> {
        let Some(run_id) = self.selected_run_id() else {
            return Vec::new();
        };
        self.jobs_seq += 1;
        self.begin_loading();
        tracing::debug!(run_id, seq = self.jobs_seq, "fetching jobs");
        vec![Command::FetchJobs {
            run_id,
            seq: self.jobs_seq,
        }]
    }

    fn select_job(&mut self) -> Vec<Command> {
        let Some(job_id) = self.selected_job_id() else {
            return self.end_log_session();
        };
        self.logs_seq += 1;
        let seq = self.logs_seq;
        if self.log.job_id() != Some(job_id) {
            self.log.reset(Some(job_id));
        }
        self.log_session = Some(LogSession { job_id, seq });
        self.log_tail_polled = false;
        self.begin_loading();
        tracing::debug!(job_id, seq, "fetching logs");
        vec![
            Command::FetchLogs { job_id, seq },
            Command::StartLogPolling { job_id, seq },
        ]
    }

    fn clear_runs(&mut self) -> Vec<Command> {
        self.runs_seq += 1;
        self.runs.set_items(Vec::new());
        self.runs_owner = None;
        self.clear_jobs()
    }

    fn clear_jobs(&mut self) -> Vec<Command> {
        self.jobs_seq += 1;
        self.jobs.set_items(Vec::new());
        self.jobs_owner = None;
        self.end_log_session()
    }

    fn end_log_session(&mut self) -> Vec<Command> {
        self.logs_seq += 1;
        self.log.reset(None);
        self.log_tail_polled = false;
        if self.log_session.take().is_some() {
            vec![Command::StopLogPolling]
        } else {
            Vec::new()
        }
    }

    fn on_workflows_loaded(&mut self, result: Result<Vec<Workflow>, String>) -> Vec<Command> {
        self.end_loading();
        match result {
            Ok(workflows) => {
                let before = self.selected_workflow_id();
                self.workflows.set_items(workflows);
                match self.selected_workflow_id() {
                    None => self.clear_runs(),
                    Some(id) if Some(id) == before && self.runs_owner == Some(id) => Vec::new(),
                    Some(_) => self.select_workflow(),
                }
            }
            Err(e) => {
                self.set_error(e);
                Vec::new()
            }
        }
    }

    fn on_runs_loaded(
        &mut self,
        workflow_id: u64,
        seq: u64,
        result: Result<Vec<Run>, String>,
    ) -> Vec<Command> {
        self.end_loading();
        if seq != self.runs_seq || self.selected_workflow_id() != Some(workflow_id) {
            tracing::debug!(workflow_id, seq, latest = self.runs_seq, "discarding stale runs");
            return Vec::new();
        }
        let runs = match result {
            Ok(runs) => runs,
            Err(e) => {
                self.set_error(e);
                return Vec::new();
            }
        };
        self.runs.set_items(runs);
        if self.runs_owner != Some(workflow_id) {
            self.runs.select_first();
            self.runs_owner = Some(workflow_id);
        }
        if self.runs.selected().is_some() {
            self.select_run()
        } else {
            self.clear_jobs()
        }
    }

    fn on_jobs_loaded(
        &mut self,
        run_id: u64,
        seq: u64,
        result: Result<Vec<Job>, String>,
    ) -> Vec<Command> {
        self.end_loading();
        if seq != self.jobs_seq || self.selected_run_id() != Some(run_id) {
            tracing::debug!(run_id, seq, latest = self.jobs_seq, "discarding stale jobs");
            return Vec::new();
        }
        let jobs = match result {
            Ok(jobs) => jobs,
            Err(e) => {
                self.set_error(e);
                return Vec::new();
            }
        };
        self.jobs.set_items(jobs);
        if self.jobs_owner != Some(run_id) {
            self.jobs.select_first();
            self.jobs_owner = Some(run_id);
        }
        self.select_job()
    }

    fn on_logs_loaded(&mut self, job_id: u64, seq: u64, polled: bool, result: Result<String, String>) {
        if !polled {
            self.end_loading();
        }
        let current = self.log_session == Some(LogSession { job_id, seq });
        if !current || seq != self.logs_seq || self.selected_job_id() != Some(job_id) {
            tracing::debug!(job_id, seq, latest = self.logs_seq, polled, "discarding stale logs");
            return;
        }
        if polled {
            self.log_tail_polled = true;
        } else if self.log_tail_polled {
            tracing::debug!(job_id, seq, "initial log fetch overtaken by poll, discarding");
            return;
        }
        match result {
            Ok(text) => self.log.set_content(&text),
            Err(e) => self.set_error(e),
        }
    }

    // --- Status line ---

    pub fn set_error(&mut self, msg: String) {
        tracing::debug!(error = %msg, "error surfaced");
        self.status = Some(StatusMessage::Error(msg));
    }

    fn flash(&mut self, text: &str) -> Command {
        self.next_flash_id += 1;
        let id = self.next_flash_id;
        self.status = Some(StatusMessage::Flash {
            text: text.to_string(),
            id,
        });
        Command::ExpireFlash {
            id,
            after: FLASH_TTL,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            Some(StatusMessage::Error(msg)) => Some(msg),
            _ => None,
        }
    }

    pub fn flash_message(&self) -> Option<&str> {
        match &self.status {
            Some(StatusMessage::Flash { text, .. }) => Some(text),
            _ => None,
        }
    }

    // --- Misc accessors ---

    fn begin_loading(&mut self) {
        self.loading_count = self.loading_count.saturating_add(1);
    }

    fn end_loading(&mut self) {
        self.loading_count = self.loading_count.saturating_sub(1);
    }

    pub fn is_loading(&self) -> bool {
        self.loading_count > 0
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
    }

    fn log_page_height(&self) -> usize {
        usize::from(self.viewport.1.saturating_sub(FULLSCREEN_CHROME_LINES).max(1))
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn focused(&self) -> Pane {
        self.focused
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn workflows(&self) -> &FilteredList<Workflow> {
        &self.workflows
    }

    pub fn runs(&self) -> &FilteredList<Run> {
        &self.runs
    }

    pub fn jobs(&self) -> &FilteredList<Job> {
        &self.jobs
    }

    pub fn log(&self) -> &LogView {
        &self.log
    }

    pub fn log_session(&self) -> Option<LogSession> {
        self.log_session
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            focused: self.focused,
            mode: &self.mode,
            show_help: self.show_help,
            workflows: &self.workflows,
            runs: &self.runs,
            jobs: &self.jobs,
            log: &self.log,
            status: self.status.as_ref(),
            loading: self.is_loading(),
            spinner_frame: self.spinner_frame,
        }
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use color_eyre::eyre::{eyre, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use ghd::app::{AppState, Conclusion, Job, Run, RunStatus, Workflow};
use ghd::events::AppEvent;
use ghd::gh::client::{ActionsClient, Repository};
use ghd::poller::PollPolicy;
use ghd::runtime::Runtime;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const CI: u64 = 1;
pub const DEPLOY: u64 = 2;
pub const RELEASE: u64 = 3;

pub fn press(code: KeyCode) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    }
}

pub fn ctrl(c: char) -> KeyEvent {
    KeyEvent {
        code: KeyCode::Char(c),
        modifiers: KeyModifiers::CONTROL,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    }
}

pub fn repo() -> Repository {
    Repository::new("test", "repo")
}

pub fn workflow(id: u64, name: &str) -> Workflow {
    Workflow {
        id,
        name: name.to_string(),
        path: format!(".github/workflows/{}.yml", name.to_lowercase()),
        enabled: true,
    }
}

pub fn default_workflows() -> Vec<Workflow> {
    vec![
        workflow(CI, "CI"),
        workflow(DEPLOY, "Deploy"),
        workflow(RELEASE, "Release"),
    ]
}

pub fn run(id: u64, branch: &str, actor: &str) -> Run {
    Run {
        id,
        number: id,
        name: "CI".to_string(),
        branch: branch.to_string(),
        actor: actor.to_string(),
        event: "push".to_string(),
        status: RunStatus::Completed,
        conclusion: Some(Conclusion::Success),
        created_at: Utc::now(),
        url: format!("https://github.com/test/repo/actions/runs/{id}"),
    }
}

pub fn run_in_progress(id: u64, branch: &str) -> Run {
    Run {
        status: RunStatus::InProgress,
        conclusion: None,
        ..run(id, branch, "user1")
    }
}

pub fn run_failed(id: u64, branch: &str) -> Run {
    Run {
        conclusion: Some(Conclusion::Failure),
        ..run(id, branch, "user1")
    }
}

pub fn default_runs() -> Vec<Run> {
    vec![
        run(100, "main", "user1"),
        run(101, "feature/test", "user2"),
        run(102, "fix/bug", "user1"),
        run(103, "main", "user3"),
    ]
}

pub fn job(id: u64, name: &str) -> Job {
    Job {
        id,
        name: name.to_string(),
        status: RunStatus::Completed,
        conclusion: Some(Conclusion::Success),
        url: format!("https://github.com/test/repo/actions/runs/100/job/{id}"),
        steps: Vec::new(),
    }
}

pub fn default_jobs() -> Vec<Job> {
    vec![job(1001, "build"), job(1002, "test"), job(1003, "lint")]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    FetchWorkflows,
    FetchRuns(u64),
    FetchJobs(u64),
    FetchLogs(u64),
    CancelRun(u64),
    RerunWorkflow(u64),
    RerunFailedJobs(u64),
}

/// In-memory [`ActionsClient`] that records every call.
pub struct MockClient {
    pub workflows: Mutex<Vec<Workflow>>,
    pub runs: Mutex<HashMap<u64, Vec<Run>>>,
    pub jobs: Mutex<HashMap<u64, Vec<Job>>>,
    pub logs: Mutex<HashMap<u64, String>>,
    /// Per-job delay before a log fetch returns.
    pub log_delays: Mutex<HashMap<u64, Duration>>,
    pub jobs_error: Mutex<Option<String>>,
    pub action_error: Mutex<Option<String>>,
    pub quota: AtomicU32,
    pub calls: Mutex<Vec<Call>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            workflows: Mutex::new(Vec::new()),
            runs: Mutex::new(HashMap::new()),
            jobs: Mutex::new(HashMap::new()),
            logs: Mutex::new(HashMap::new()),
            log_delays: Mutex::new(HashMap::new()),
            jobs_error: Mutex::new(None),
            action_error: Mutex::new(None),
            quota: AtomicU32::new(5000),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Three workflows; CI has four runs; run 100 has three jobs, each with a log.
    pub fn populated() -> Self {
        let client = Self::new();
        *client.workflows.lock().unwrap() = default_workflows();
        client.set_runs(CI, default_runs());
        client.set_jobs(100, default_jobs());
        for (id, name) in [(1001, "build"), (1002, "test"), (1003, "lint")] {
            client.set_log(id, &format!("{name} line 1\n{name} line 2"));
        }
        client
    }

    pub fn set_runs(&self, workflow_id: u64, runs: Vec<Run>) {
        self.runs.lock().unwrap().insert(workflow_id, runs);
    }

    pub fn set_jobs(&self, run_id: u64, jobs: Vec<Job>) {
        self.jobs.lock().unwrap().insert(run_id, jobs);
    }

    pub fn set_log(&self, job_id: u64, text: &str) {
        self.logs.lock().unwrap().insert(job_id, text.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn action_result(&self) -> Result<()> {
        match self.action_error.lock().unwrap().clone() {
            Some(e) => Err(eyre!(e)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ActionsClient for MockClient {
    async fn fetch_workflows(&self, _repo: &Repository) -> Result<Vec<Workflow>> {
        self.record(Call::FetchWorkflows);
        Ok(self.workflows.lock().unwrap().clone())
    }

    async fn fetch_runs(&self, _repo: &Repository, workflow_id: u64) -> Result<Vec<Run>> {
        self.record(Call::FetchRuns(workflow_id));
        Ok(self
            .runs
            .lock()
            .unwrap()
            .get(&workflow_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_jobs(&self, _repo: &Repository, run_id: u64) -> Result<Vec<Job>> {
        self.record(Call::FetchJobs(run_id));
        if let Some(e) = self.jobs_error.lock().unwrap().clone() {
            return Err(eyre!(e));
        }
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .get(&run_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_logs(&self, _repo: &Repository, job_id: u64) -> Result<String> {
        self.record(Call::FetchLogs(job_id));
        let delay = self.log_delays.lock().unwrap().get(&job_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.logs
            .lock()
            .unwrap()
            .get(&job_id)
            .cloned()
            .ok_or_else(|| eyre!("HTTP 404: log not found"))
    }

    async fn cancel_run(&self, _repo: &Repository, run_id: u64) -> Result<()> {
        self.record(Call::CancelRun(run_id));
        self.action_result()
    }

    async fn rerun_workflow(&self, _repo: &Repository, run_id: u64) -> Result<()> {
        self.record(Call::RerunWorkflow(run_id));
        self.action_result()
    }

    async fn rerun_failed_jobs(&self, _repo: &Repository, run_id: u64) -> Result<()> {
        self.record(Call::RerunFailedJobs(run_id));
        self.action_result()
    }

    fn remaining_quota(&self) -> u32 {
        self.quota.load(Ordering::Relaxed)
    }
}

/// State machine plus runtime wired to a [`MockClient`], driven by hand.
pub struct Harness {
    pub state: AppState,
    pub runtime: Runtime,
    pub client: Arc<MockClient>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl Harness {
    pub fn new(client: MockClient) -> Self {
        let client = Arc::new(client);
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = Runtime::new(client.clone(), repo(), tx, PollPolicy::default());
        Self {
            state: AppState::new(repo()),
            runtime,
            client,
            rx,
        }
    }

    /// Run `init` and settle the startup cascade.
    pub async fn started(client: MockClient) -> Self {
        let mut h = Self::new(client);
        let commands = h.state.init();
        h.runtime.execute(commands);
        h.settle().await;
        h
    }

    pub fn dispatch(&mut self, event: AppEvent) {
        let commands = self.state.update(event);
        self.runtime.execute(commands);
    }

    pub fn key(&mut self, key: KeyEvent) {
        self.dispatch(AppEvent::Key(key));
    }

    pub fn press(&mut self, code: KeyCode) {
        self.key(press(code));
    }

    pub fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyCode::Char(c));
        }
    }

    /// Feed events back until none arrives for 50ms.
    pub async fn settle(&mut self) {
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(50), self.rx.recv()).await
        {
            self.dispatch(event);
        }
    }

    /// Let `duration` of (paused) time pass, then settle.
    pub async fn advance(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
        self.settle().await;
    }
}

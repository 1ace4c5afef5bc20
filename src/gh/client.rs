use crate::app::{Job, Run, Workflow};
use async_trait::async_trait;
use color_eyre::eyre::Result;
use std::fmt;
use std::str::FromStr;

/// Repository identity in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for Repository {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || format!("Invalid repository '{s}': expected owner/repo");
        let (owner, name) = s.split_once('/').ok_or_else(invalid)?;
        let valid_part = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid_part(owner) || !valid_part(name) {
            return Err(invalid());
        }
        Ok(Self::new(owner, name))
    }
}

/// Read and mutate GitHub Actions state for one repository.
///
/// All fetches are one-shot; periodic behavior lives in the log poller. Errors carry
/// a user-facing message and are shown verbatim in the status bar.
#[async_trait]
pub trait ActionsClient: Send + Sync {
    async fn fetch_workflows(&self, repo: &Repository) -> Result<Vec<Workflow>>;
    /// Most recent runs first.
    async fn fetch_runs(&self, repo: &Repository, workflow_id: u64) -> Result<Vec<Run>>;
    async fn fetch_jobs(&self, repo: &Repository, run_id: u64) -> Result<Vec<Job>>;
    async fn fetch_logs(&self, repo: &Repository, job_id: u64) -> Result<String>;
    async fn cancel_run(&self, repo: &Repository, run_id: u64) -> Result<()>;
    async fn rerun_workflow(&self, repo: &Repository, run_id: u64) -> Result<()>;
    async fn rerun_failed_jobs(&self, repo: &Repository, run_id: u64) -> Result<()>;
    /// Last observed remaining request quota. Never blocks.
    fn remaining_quota(&self) -> u32;
}

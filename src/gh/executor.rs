use crate::app::{Job, Run, Workflow};
use crate::gh::client::{ActionsClient, Repository};
use crate::gh::parser;
use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::process::Command;

const GH_TIMEOUT: Duration = Duration::from_secs(30);
const CLIPBOARD_TIMEOUT: Duration = Duration::from_secs(10);
const LOG_SIZE_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

/// Authenticated REST quota; assumed until the first response says otherwise.
pub const DEFAULT_QUOTA: u32 = 5000;
/// Minimum gap between `rate_limit` lookups for responses that carry no quota header.
const QUOTA_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// [`ActionsClient`] backed by the `gh` CLI's `api` subcommand.
pub struct GhClient {
    limit: usize,
    quota: AtomicU32,
    last_quota_sync: Mutex<Option<Instant>>,
}

impl GhClient {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            quota: AtomicU32::new(DEFAULT_QUOTA),
            last_quota_sync: Mutex::new(None),
        }
    }

    pub async fn check_available() -> Result<()> {
        run_gh(&["auth", "status"]).await.map(|_| ())
    }

    pub async fn detect_repo() -> Result<Repository> {
        let output = run_gh(&[
            "repo",
            "view",
            "--json",
            "nameWithOwner",
            "-q",
            ".nameWithOwner",
        ])
        .await?;
        let repo = output.trim();
        if repo.is_empty() {
            return Err(eyre!("Could not detect repository. Use --repo flag."));
        }
        repo.parse().map_err(|e: String| eyre!(e))
    }

    /// Refresh the quota from the `rate_limit` endpoint, which does not count against it.
    pub async fn sync_quota(&self) -> Result<u32> {
        let body = run_gh(&["api", "rate_limit"]).await?;
        let remaining = parser::parse_rate_limit_body(&body)?;
        self.quota.store(remaining, Ordering::Relaxed);
        if let Ok(mut last) = self.last_quota_sync.lock() {
            *last = Some(Instant::now());
        }
        Ok(remaining)
    }

    /// Issue a REST call with `--include` so the quota header can be recorded.
    async fn api(&self, method: &str, path: &str) -> Result<String> {
        let raw = run_gh(&["api", "--include", "--method", method, path]).await?;
        let (headers, body) = parser::split_http_response(&raw)?;
        match parser::last_rate_limit_remaining(&headers) {
            Some(remaining) => {
                self.quota.store(remaining, Ordering::Relaxed);
                tracing::trace!(remaining, "quota updated");
            }
            // log downloads end at blob storage, which reports no quota
            None if self.quota_sync_due() => {
                if let Err(e) = self.sync_quota().await {
                    tracing::debug!("quota sync failed: {e}");
                }
            }
            None => {}
        }
        Ok(body.to_string())
    }

    /// Claims the next `rate_limit` lookup if the last one is old enough.
    fn quota_sync_due(&self) -> bool {
        let Ok(mut last) = self.last_quota_sync.lock() else {
            return false;
        };
        if last.is_some_and(|at| at.elapsed() < QUOTA_SYNC_INTERVAL) {
            return false;
        }
        *last = Some(Instant::now());
        true
    }
}

#[async_trait]
impl ActionsClient for GhClient {
    async fn fetch_workflows(&self, repo: &Repository) -> Result<Vec<Workflow>> {
        let body = self
            .api("GET", &format!("repos/{repo}/actions/workflows?per_page=100"))
            .await?;
        parser::parse_workflows(&body)
    }

    async fn fetch_runs(&self, repo: &Repository, workflow_id: u64) -> Result<Vec<Run>> {
        let path = format!(
            "repos/{repo}/actions/workflows/{workflow_id}/runs?per_page={}",
            self.limit
        );
        let body = self.api("GET", &path).await?;
        parser::parse_runs(&body)
    }

    async fn fetch_jobs(&self, repo: &Repository, run_id: u64) -> Result<Vec<Job>> {
        let body = self
            .api("GET", &format!("repos/{repo}/actions/runs/{run_id}/jobs"))
            .await?;
        parser::parse_jobs(&body)
    }

    async fn fetch_logs(&self, repo: &Repository, job_id: u64) -> Result<String> {
        let log = self
            .api("GET", &format!("repos/{repo}/actions/jobs/{job_id}/logs"))
            .await?;
        check_log_size(&log)?;
        Ok(log)
    }

    async fn cancel_run(&self, repo: &Repository, run_id: u64) -> Result<()> {
        self.api("POST", &format!("repos/{repo}/actions/runs/{run_id}/cancel"))
            .await?;
        Ok(())
    }

    async fn rerun_workflow(&self, repo: &Repository, run_id: u64) -> Result<()> {
        self.api("POST", &format!("repos/{repo}/actions/runs/{run_id}/rerun"))
            .await?;
        Ok(())
    }

    async fn rerun_failed_jobs(&self, repo: &Repository, run_id: u64) -> Result<()> {
        self.api(
            "POST",
            &format!("repos/{repo}/actions/runs/{run_id}/rerun-failed-jobs"),
        )
        .await?;
        Ok(())
    }

    fn remaining_quota(&self) -> u32 {
        self.quota.load(Ordering::Relaxed)
    }
}

async fn run_gh(args: &[&str]) -> Result<String> {
    let start = std::time::Instant::now();
    let output = tokio::time::timeout(GH_TIMEOUT, Command::new("gh").args(args).output())
        .await
        .map_err(|_| eyre!("gh command timed out after {}s", GH_TIMEOUT.as_secs()))?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                eyre!("gh CLI not found. Install it from https://cli.github.com/")
            } else {
                eyre!("Failed to run gh: {}", e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(args = ?args, stderr = %stderr.trim(), "gh command failed");
        return Err(eyre!("{}", classify_gh_error(&stderr)));
    }

    tracing::debug!(
        args = ?args,
        elapsed_ms = start.elapsed().as_millis(),
        "gh command completed"
    );
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn check_log_size(log: &str) -> Result<()> {
    if log.len() > LOG_SIZE_LIMIT {
        return Err(eyre!(
            "Log output too large ({:.1} MB, max {} MB)",
            log.len() as f64 / (1024.0 * 1024.0),
            LOG_SIZE_LIMIT / (1024 * 1024)
        ));
    }
    Ok(())
}

pub async fn copy_to_clipboard(text: &str) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let candidates: &[(&str, &[&str])] = if cfg!(target_os = "macos") {
        &[("pbcopy", &[])]
    } else if cfg!(target_os = "windows") {
        &[("clip.exe", &[])]
    } else {
        // WSL first, then Wayland, then X11
        &[
            ("clip.exe", &[]),
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
        ]
    };

    for (cmd, args) in candidates {
        let Ok(mut child) = Command::new(cmd)
            .args(*args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
        else {
            continue;
        };

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| eyre!("Failed to write to clipboard: {e}"))?;
        }
        let status = tokio::time::timeout(CLIPBOARD_TIMEOUT, child.wait())
            .await
            .map_err(|_| {
                eyre!(
                    "clipboard command timed out after {}s",
                    CLIPBOARD_TIMEOUT.as_secs()
                )
            })??;
        if status.success() {
            return Ok(());
        }
    }

    Err(eyre!(
        "No clipboard tool found. Install xclip, wl-copy, or use WSL with clip.exe"
    ))
}

pub fn classify_gh_error(stderr: &str) -> String {
    if stderr.contains("not logged") || stderr.contains("auth login") {
        "Not authenticated with gh. Run `gh auth login` first.".to_string()
    } else if stderr.contains("not a git repository") || stderr.contains("could not determine") {
        "Not in a GitHub repository. Use --repo flag or cd into a repo.".to_string()
    } else if stderr.contains("rate limit") {
        "GitHub API rate limit exceeded. Polling will slow down.".to_string()
    } else if stderr.contains("HTTP 404") {
        "Not found (HTTP 404). Check the repository name and your access.".to_string()
    } else {
        let trimmed = stderr.trim();
        if trimmed.is_empty() {
            "gh command failed".to_string()
        } else {
            format!("gh command failed: {trimmed}")
        }
    }
}

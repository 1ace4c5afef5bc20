use crate::app::{Conclusion, Job, Run, RunStatus, Step, Workflow};
use chrono::{DateTime, Utc};
use color_eyre::eyre::{eyre, Result};
use serde::Deserialize;

#[derive(Deserialize)]
struct WorkflowsResponse {
    workflows: Vec<RawWorkflow>,
}

#[derive(Deserialize)]
struct RawWorkflow {
    id: u64,
    name: String,
    #[serde(default)]
    path: String,
    state: String,
}

impl From<RawWorkflow> for Workflow {
    fn from(raw: RawWorkflow) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            path: raw.path,
            enabled: raw.state == "active",
        }
    }
}

#[derive(Deserialize)]
struct RunsResponse {
    workflow_runs: Vec<RawRun>,
}

#[derive(Deserialize)]
struct RawActor {
    login: String,
}

#[derive(Deserialize)]
struct RawRun {
    id: u64,
    #[serde(default)]
    run_number: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    head_branch: Option<String>,
    #[serde(default)]
    actor: Option<RawActor>,
    #[serde(default)]
    event: String,
    status: Option<RunStatus>,
    conclusion: Option<Conclusion>,
    created_at: DateTime<Utc>,
    html_url: String,
}

impl From<RawRun> for Run {
    fn from(raw: RawRun) -> Self {
        Self {
            id: raw.id,
            number: raw.run_number,
            name: raw.name.unwrap_or_default(),
            branch: raw.head_branch.unwrap_or_default(),
            actor: raw.actor.map(|a| a.login).unwrap_or_default(),
            event: raw.event,
            status: raw.status.unwrap_or(RunStatus::Unknown),
            conclusion: raw.conclusion,
            created_at: raw.created_at,
            url: raw.html_url,
        }
    }
}

#[derive(Deserialize)]
struct JobsResponse {
    jobs: Vec<RawJob>,
}

#[derive(Deserialize)]
struct RawJob {
    id: u64,
    name: String,
    status: RunStatus,
    conclusion: Option<Conclusion>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Deserialize)]
struct RawStep {
    name: String,
    number: u64,
    status: RunStatus,
    conclusion: Option<Conclusion>,
}

impl From<RawJob> for Job {
    fn from(raw: RawJob) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            status: raw.status,
            conclusion: raw.conclusion,
            url: raw.html_url.unwrap_or_default(),
            steps: raw
                .steps
                .into_iter()
                .map(|s| Step {
                    name: s.name,
                    number: s.number,
                    status: s.status,
                    conclusion: s.conclusion,
                })
                .collect(),
        }
    }
}

pub fn parse_workflows(json: &str) -> Result<Vec<Workflow>> {
    let resp: WorkflowsResponse = serde_json::from_str(json)?;
    Ok(resp.workflows.into_iter().map(Workflow::from).collect())
}

pub fn parse_runs(json: &str) -> Result<Vec<Run>> {
    let resp: RunsResponse = serde_json::from_str(json)?;
    Ok(resp.workflow_runs.into_iter().map(Run::from).collect())
}

pub fn parse_jobs(json: &str) -> Result<Vec<Job>> {
    let resp: JobsResponse = serde_json::from_str(json)?;
    Ok(resp.jobs.into_iter().map(Job::from).collect())
}

/// Split `gh api --include` output into its header blocks and the body.
///
/// Redirects and interim responses each contribute a status line + headers block;
/// blocks come back in the order they were received.
pub fn split_http_response(raw: &str) -> Result<(Vec<&str>, &str)> {
    if !raw.starts_with("HTTP/") {
        return Err(eyre!("Unexpected gh api output: missing HTTP status line"));
    }
    let mut blocks = Vec::new();
    let mut rest = raw;
    loop {
        // whichever blank line comes first ends the headers
        let crlf = rest.find("\r\n\r\n").map(|i| (i, 4));
        let lf = rest.find("\n\n").map(|i| (i, 2));
        let split = match (crlf, lf) {
            (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
            (a, b) => a.or(b),
        };
        let Some((i, sep)) = split else {
            blocks.push(rest);
            return Ok((blocks, ""));
        };
        let (headers, body) = (&rest[..i], &rest[i + sep..]);
        blocks.push(headers);
        if body.starts_with("HTTP/") && is_interim_status(headers) {
            rest = body;
        } else {
            return Ok((blocks, body));
        }
    }
}

/// 1xx and 3xx responses are followed by another response in the same output.
fn is_interim_status(headers: &str) -> bool {
    headers
        .split_whitespace()
        .nth(1)
        .is_some_and(|code| code.starts_with('1') || code.starts_with('3'))
}

/// The most recent `X-RateLimit-Remaining` across all header blocks.
pub fn last_rate_limit_remaining(blocks: &[&str]) -> Option<u32> {
    blocks
        .iter()
        .rev()
        .find_map(|headers| parse_rate_limit_remaining(headers))
}

/// Value of the `X-RateLimit-Remaining` header, if present and numeric.
pub fn parse_rate_limit_remaining(headers: &str) -> Option<u32> {
    headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("x-ratelimit-remaining") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

#[derive(Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Deserialize)]
struct RateLimitResources {
    core: RateLimitBucket,
}

#[derive(Deserialize)]
struct RateLimitBucket {
    remaining: u32,
}

/// Remaining core quota from the `rate_limit` endpoint body.
pub fn parse_rate_limit_body(json: &str) -> Result<u32> {
    let resp: RateLimitResponse = serde_json::from_str(json)?;
    Ok(resp.resources.core.remaining)
}

/// Takes the last `max_lines` lines from raw log output.
/// Returns `(text, was_truncated)`.
pub fn process_log_output(raw: &str, max_lines: usize) -> (String, bool) {
    let lines: Vec<&str> = raw.lines().collect();
    if lines.len() > max_lines {
        (lines[lines.len() - max_lines..].join("\n"), true)
    } else {
        (lines.join("\n"), false)
    }
}

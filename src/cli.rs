use clap::Parser;

pub const MAX_LIMIT: usize = 100;
pub const MAX_INTERVAL_SECS: u64 = 3600;

#[derive(Parser, Debug)]
#[command(name = "ghd", version, about = "GitHub Actions dashboard TUI")]
pub struct Cli {
    /// Repository in owner/repo format (auto-detected from cwd)
    #[arg(short, long, value_parser = validate_repo_format)]
    pub repo: Option<String>,

    /// Maximum number of runs fetched per workflow
    #[arg(short, long, default_value_t = 30, value_parser = parse_limit)]
    pub limit: usize,

    /// Log tail interval in seconds while the API quota is healthy
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..=MAX_INTERVAL_SECS))]
    pub interval: u64,

    /// Enable verbose logging to $XDG_STATE_HOME/ghd/debug.log
    #[arg(short, long)]
    pub verbose: bool,
}

/// Validates `owner/repo` and returns it trimmed.
pub fn validate_repo_format(repo: &str) -> Result<String, String> {
    let repo = repo.trim();
    let mut parts = repo.split('/');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) => !owner.is_empty() && !name.is_empty(),
        _ => false,
    };
    if !valid || repo.contains(char::is_whitespace) {
        return Err(format!(
            "Invalid repository format '{repo}'. Expected 'owner/repo' (e.g. 'cli/cli')."
        ));
    }
    Ok(repo.to_string())
}

fn parse_limit(value: &str) -> Result<usize, String> {
    let limit: usize = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if limit == 0 || limit > MAX_LIMIT {
        return Err(format!("limit must be between 1 and {MAX_LIMIT}"));
    }
    Ok(limit)
}

mod fixtures;

use crossterm::event::KeyCode;
use fixtures::*;
use ghd::app::{Mode, Pane, RunAction};
use ghd::events::AppEvent;
use pretty_assertions::assert_eq;
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn screen(h: &Harness, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal
        .draw(|f| ghd::tui::render::render(f, &h.state.snapshot()))
        .unwrap();
    let buffer = terminal.backend().buffer().clone();
    let mut text = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            text.push_str(buffer.cell((x, y)).unwrap().symbol());
        }
        text.push('\n');
    }
    text
}

fn last_row(screen: &str) -> &str {
    screen.lines().last().unwrap_or_default()
}

// ========== Cascade ==========

#[tokio::test(start_paused = true)]
async fn startup_cascades_to_first_item_at_each_level() {
    let h = Harness::started(MockClient::populated()).await;

    assert_eq!(
        h.client.calls(),
        vec![
            Call::FetchWorkflows,
            Call::FetchRuns(CI),
            Call::FetchJobs(100),
            Call::FetchLogs(1001),
        ]
    );
    assert_eq!(h.state.selected_workflow_id(), Some(CI));
    assert_eq!(h.state.selected_run_id(), Some(100));
    assert_eq!(h.state.selected_job_id(), Some(1001));
    assert_eq!(h.state.log().lines(), ["build line 1", "build line 2"]);
    assert!(!h.state.is_loading());

    let session = h.runtime.poll_session().expect("poll session");
    assert_eq!(session.job_id, 1001);
    assert!(h.runtime.is_polling());
}

#[tokio::test(start_paused = true)]
async fn selecting_a_run_fetches_only_its_jobs() {
    let client = MockClient::populated();
    client.set_jobs(101, vec![job(2001, "e2e")]);
    client.set_log(2001, "e2e output");
    let mut h = Harness::started(client).await;
    h.client.clear_calls();

    h.press(KeyCode::Tab);
    h.press(KeyCode::Char('j'));
    h.settle().await;

    assert_eq!(
        h.client.calls(),
        vec![Call::FetchJobs(101), Call::FetchLogs(2001)]
    );
    assert_eq!(h.state.log().lines(), ["e2e output"]);
    assert_eq!(h.runtime.poll_session().map(|s| s.job_id), Some(2001));
}

#[tokio::test(start_paused = true)]
async fn switching_to_workflow_without_runs_clears_everything_below() {
    let mut h = Harness::started(MockClient::populated()).await;

    h.press(KeyCode::Char('j'));
    h.settle().await;

    assert_eq!(h.state.selected_workflow_id(), Some(DEPLOY));
    assert!(h.state.runs().is_empty());
    assert!(h.state.jobs().is_empty());
    assert!(h.state.log().lines().is_empty());
    assert_eq!(h.runtime.poll_session(), None);
    assert!(!h.runtime.is_polling());
}

#[tokio::test(start_paused = true)]
async fn jobs_failure_keeps_runs_and_reports_error() {
    let client = MockClient::populated();
    *client.jobs_error.lock().unwrap() = Some("HTTP 502: bad gateway".into());
    let h = Harness::started(client).await;

    assert_eq!(h.state.error_message(), Some("HTTP 502: bad gateway"));
    assert_eq!(h.state.runs().len(), 4);
    assert_eq!(h.client.count(Call::FetchLogs(1001)), 0);
    assert!(!h.state.is_loading());
}

#[tokio::test(start_paused = true)]
async fn refresh_refetches_runs_and_keeps_selection() {
    let mut h = Harness::started(MockClient::populated()).await;
    h.press(KeyCode::Tab);
    h.press(KeyCode::Char('j'));
    h.settle().await;
    h.client.clear_calls();

    h.key(ctrl('r'));
    h.settle().await;

    assert_eq!(h.client.calls()[..2], [Call::FetchRuns(CI), Call::FetchJobs(101)]);
    assert_eq!(h.state.selected_run_id(), Some(101));
}

// ========== Stale results ==========

#[tokio::test(start_paused = true)]
async fn slow_log_for_previous_job_is_discarded() {
    let client = MockClient::populated();
    client
        .log_delays
        .lock()
        .unwrap()
        .insert(1001, Duration::from_millis(500));
    let mut h = Harness::started(client).await;
    assert!(!h.state.log().is_loaded(), "job 1001 log still in flight");

    h.press(KeyCode::BackTab);
    assert_eq!(h.state.focused(), Pane::Logs);
    h.press(KeyCode::Char('j'));
    h.settle().await;
    assert_eq!(h.state.log().lines(), ["test line 1", "test line 2"]);

    // the slow job 1001 result lands now
    h.advance(Duration::from_secs(1)).await;
    assert_eq!(h.state.selected_job_id(), Some(1002));
    assert_eq!(h.state.log().lines(), ["test line 1", "test line 2"]);
    assert_eq!(h.state.error_message(), None);
    assert!(!h.state.is_loading());
}

// ========== Log polling ==========

#[tokio::test(start_paused = true)]
async fn poller_refreshes_log_tail() {
    let mut h = Harness::started(MockClient::populated()).await;
    h.client.set_log(1001, "build line 1\nbuild line 2\nbuild line 3");

    h.advance(Duration::from_millis(2100)).await;

    assert_eq!(h.client.count(Call::FetchLogs(1001)), 2);
    assert_eq!(h.state.log().lines().len(), 3);
    assert!(!h.state.is_loading(), "polls do not show the spinner");
}

#[tokio::test(start_paused = true)]
async fn low_quota_slows_polling() {
    let client = MockClient::populated();
    client.quota.store(50, Ordering::Relaxed);
    let mut h = Harness::started(client).await;

    let session = h.runtime.poll_session().expect("poll session");
    assert_eq!(session.interval, Duration::from_secs(60));

    h.advance(Duration::from_secs(10)).await;
    assert_eq!(h.client.count(Call::FetchLogs(1001)), 1);
}

#[tokio::test(start_paused = true)]
async fn only_one_poll_session_at_a_time() {
    let mut h = Harness::started(MockClient::populated()).await;
    h.press(KeyCode::BackTab);
    h.press(KeyCode::Char('j'));
    h.press(KeyCode::Char('j'));
    h.settle().await;
    h.client.clear_calls();

    h.advance(Duration::from_millis(2100)).await;

    assert_eq!(h.client.calls(), vec![Call::FetchLogs(1003)]);
}

#[tokio::test(start_paused = true)]
async fn empty_jobs_stop_polling() {
    let client = MockClient::populated();
    client.set_jobs(101, Vec::new());
    let mut h = Harness::started(client).await;

    h.press(KeyCode::Tab);
    h.press(KeyCode::Char('j'));
    h.settle().await;
    assert_eq!(h.runtime.poll_session(), None);

    h.client.clear_calls();
    h.advance(Duration::from_secs(5)).await;
    assert!(h.client.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn poll_failure_surfaces_error_and_keeps_polling() {
    let mut h = Harness::started(MockClient::populated()).await;
    h.client.logs.lock().unwrap().remove(&1001);

    h.advance(Duration::from_millis(2100)).await;
    assert_eq!(h.state.error_message(), Some("HTTP 404: log not found"));

    h.client.set_log(1001, "back");
    h.advance(Duration::from_secs(2)).await;
    assert_eq!(h.state.log().lines(), ["back"]);
}

// ========== Actions ==========

#[tokio::test(start_paused = true)]
async fn cancel_requires_confirmation() {
    let client = MockClient::populated();
    client.set_runs(CI, vec![run_in_progress(200, "main")]);
    client.set_jobs(200, default_jobs());
    let mut h = Harness::started(client).await;

    h.press(KeyCode::Tab);
    h.press(KeyCode::Char('c'));
    assert!(matches!(h.state.mode(), Mode::Confirming(p) if p.action == RunAction::Cancel));

    h.press(KeyCode::Char('n'));
    h.settle().await;
    assert_eq!(*h.state.mode(), Mode::Normal);
    assert_eq!(h.client.count(Call::CancelRun(200)), 0);

    h.press(KeyCode::Char('c'));
    h.press(KeyCode::Char('y'));
    h.settle().await;

    assert_eq!(h.client.count(Call::CancelRun(200)), 1);
    assert_eq!(h.state.flash_message(), Some("Run cancelled"));
    assert_eq!(h.client.count(Call::FetchRuns(CI)), 2);
}

#[tokio::test(start_paused = true)]
async fn flash_clears_after_ttl() {
    let client = MockClient::populated();
    client.set_runs(CI, vec![run_in_progress(200, "main")]);
    let mut h = Harness::started(client).await;

    h.press(KeyCode::Tab);
    h.press(KeyCode::Char('r'));
    h.settle().await;
    assert_eq!(h.state.flash_message(), Some("Rerun triggered"));

    h.advance(Duration::from_secs(1)).await;
    assert_eq!(h.state.flash_message(), Some("Rerun triggered"));

    h.advance(Duration::from_secs(3)).await;
    assert_eq!(h.state.status(), None);
}

#[tokio::test(start_paused = true)]
async fn rerun_failed_jobs_only_for_failed_run() {
    let client = MockClient::populated();
    client.set_runs(CI, vec![run(300, "main", "user1"), run_failed(301, "dev")]);
    let mut h = Harness::started(client).await;

    h.press(KeyCode::Tab);
    h.press(KeyCode::Char('R'));
    h.press(KeyCode::Char('j'));
    h.press(KeyCode::Char('R'));
    h.settle().await;

    assert_eq!(h.client.count(Call::RerunFailedJobs(300)), 0);
    assert_eq!(h.client.count(Call::RerunFailedJobs(301)), 1);
    assert_eq!(
        h.state.flash_message(),
        Some("Rerun of failed jobs triggered")
    );
}

#[tokio::test(start_paused = true)]
async fn action_failure_shows_error() {
    let client = MockClient::populated();
    *client.action_error.lock().unwrap() = Some("HTTP 403: forbidden".into());
    let mut h = Harness::started(client).await;

    h.press(KeyCode::Tab);
    h.press(KeyCode::Char('r'));
    h.settle().await;

    assert_eq!(h.client.count(Call::RerunWorkflow(100)), 1);
    assert_eq!(
        h.state.error_message(),
        Some("Rerun failed: HTTP 403: forbidden")
    );
}

// ========== Filtering & modes ==========

#[tokio::test(start_paused = true)]
async fn runs_filter_main() {
    let mut h = Harness::started(MockClient::populated()).await;

    h.press(KeyCode::Tab);
    h.press(KeyCode::Char('/'));
    h.type_text("main");
    h.press(KeyCode::Enter);

    let visible: Vec<u64> = h.state.runs().items().map(|r| r.id).collect();
    assert_eq!(visible, vec![100, 103]);
    assert_eq!(h.state.runs().selected_index(), Some(0));
}

#[tokio::test(start_paused = true)]
async fn runs_filter_matches_actor() {
    let mut h = Harness::started(MockClient::populated()).await;

    h.press(KeyCode::Tab);
    h.press(KeyCode::Char('/'));
    h.type_text("user1");
    h.press(KeyCode::Enter);

    let visible: Vec<u64> = h.state.runs().items().map(|r| r.id).collect();
    assert_eq!(visible, vec![100, 102]);
}

#[tokio::test(start_paused = true)]
async fn filter_that_changes_selection_cascades() {
    let mut h = Harness::started(MockClient::populated()).await;
    h.client.clear_calls();

    h.press(KeyCode::Char('/'));
    h.type_text("rel");
    h.press(KeyCode::Enter);
    h.settle().await;

    assert_eq!(h.state.selected_workflow_id(), Some(RELEASE));
    assert_eq!(h.client.calls(), vec![Call::FetchRuns(RELEASE)]);
}

#[tokio::test(start_paused = true)]
async fn filter_hiding_every_job_stops_polling() {
    let mut h = Harness::started(MockClient::populated()).await;
    h.press(KeyCode::BackTab);
    h.press(KeyCode::Char('/'));
    h.type_text("zzz");
    h.press(KeyCode::Enter);
    h.settle().await;
    h.client.clear_calls();

    h.advance(Duration::from_secs(10)).await;

    assert_eq!(h.state.selected_job_id(), None);
    assert_eq!(h.runtime.poll_session(), None);
    assert!(h.client.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn escape_unwinds_help_then_fullscreen_then_error() {
    let mut h = Harness::started(MockClient::populated()).await;
    h.press(KeyCode::BackTab);
    h.press(KeyCode::Char('L'));
    h.press(KeyCode::Char('?'));
    h.dispatch(AppEvent::Error("boom".into()));

    h.press(KeyCode::Esc);
    assert!(!h.state.show_help());
    assert_eq!(*h.state.mode(), Mode::FullscreenLog);

    h.press(KeyCode::Esc);
    assert_eq!(*h.state.mode(), Mode::Normal);
    assert_eq!(h.state.error_message(), Some("boom"));

    h.press(KeyCode::Esc);
    assert_eq!(h.state.error_message(), None);
}

#[tokio::test(start_paused = true)]
async fn quit_from_normal_and_fullscreen() {
    let mut h = Harness::started(MockClient::populated()).await;
    h.press(KeyCode::BackTab);
    h.press(KeyCode::Char('L'));
    h.press(KeyCode::Char('q'));
    assert!(h.state.should_quit);
}

// ========== TUI snapshot tests ==========

#[tokio::test(start_paused = true)]
async fn tui_shows_three_panes() {
    let h = Harness::started(MockClient::populated()).await;
    let text = screen(&h, 100, 24);

    for needle in [
        "Workflows",
        "Runs",
        "Logs",
        "Deploy",
        "#100 main",
        "#101 feature/test",
        "lint",
        "build line 2",
        "1/3",
        "1/4",
    ] {
        assert!(text.contains(needle), "missing {needle:?} in:\n{text}");
    }
}

#[tokio::test(start_paused = true)]
async fn tui_status_bar_hints_follow_focus() {
    let mut h = Harness::started(MockClient::populated()).await;
    assert!(last_row(&screen(&h, 100, 24)).contains("filter"));

    h.press(KeyCode::Tab);
    assert!(last_row(&screen(&h, 100, 24)).contains("rerun-failed"));
}

#[tokio::test(start_paused = true)]
async fn tui_status_bar_shows_error_and_filter_prompt() {
    let mut h = Harness::started(MockClient::populated()).await;
    h.dispatch(AppEvent::Error("boom".into()));
    assert!(last_row(&screen(&h, 100, 24)).contains("Error: boom"));

    h.press(KeyCode::Char('/'));
    h.type_text("ci");
    let text = screen(&h, 100, 24);
    let row = last_row(&text);
    assert!(row.contains("Filter: ci"), "got {row:?}");
}

#[tokio::test(start_paused = true)]
async fn tui_confirm_overlay_shows_prompt() {
    let client = MockClient::populated();
    client.set_runs(CI, vec![run_in_progress(200, "main")]);
    let mut h = Harness::started(client).await;
    h.press(KeyCode::Tab);
    h.press(KeyCode::Char('c'));

    let text = screen(&h, 100, 24);
    assert!(text.contains("Cancel run #200 on main?"), "{text}");
}

#[tokio::test(start_paused = true)]
async fn tui_fullscreen_log_and_help() {
    let mut h = Harness::started(MockClient::populated()).await;
    h.press(KeyCode::BackTab);
    h.press(KeyCode::Char('L'));

    let text = screen(&h, 100, 24);
    assert!(text.contains("build line 1"));
    assert!(!text.contains("Workflows"));
    assert!(last_row(&text).contains("scroll"));

    h.press(KeyCode::Char('?'));
    let text = screen(&h, 100, 24);
    assert!(text.contains("Rerun failed jobs only"));
}

//! Executes the [`Command`]s produced by the state machine.
//!
//! Every one-shot fetch runs in its own monitored task and reports back through the
//! event channel; nothing here touches [`AppState`](crate::app::AppState). The single
//! log poller lives here so its lifetime follows `StartLogPolling`/`StopLogPolling`.

use crate::app::{Command, RunAction};
use crate::events::AppEvent;
use crate::gh::client::{ActionsClient, Repository};
use crate::gh::executor;
use crate::poller::{LogPoller, PollPolicy, PollSession};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct Runtime {
    client: Arc<dyn ActionsClient>,
    repo: Repository,
    tx: mpsc::UnboundedSender<AppEvent>,
    log_poller: LogPoller,
}

impl Runtime {
    pub fn new(
        client: Arc<dyn ActionsClient>,
        repo: Repository,
        tx: mpsc::UnboundedSender<AppEvent>,
        policy: PollPolicy,
    ) -> Self {
        let log_poller = LogPoller::new(client.clone(), repo.clone(), tx.clone(), policy);
        Self {
            client,
            repo,
            tx,
            log_poller,
        }
    }

    pub fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            self.execute_one(command);
        }
    }

    fn execute_one(&mut self, command: Command) {
        match command {
            Command::FetchWorkflows => {
                let (client, repo, tx) = self.parts();
                spawn_monitored(self.tx.clone(), "fetch_workflows", async move {
                    let result = client.fetch_workflows(&repo).await;
                    send(&tx, AppEvent::WorkflowsLoaded(result.map_err(|e| e.to_string())));
                });
            }
            Command::FetchRuns { workflow_id, seq } => {
                let (client, repo, tx) = self.parts();
                spawn_monitored(self.tx.clone(), "fetch_runs", async move {
                    let result = client.fetch_runs(&repo, workflow_id).await;
                    send(
                        &tx,
                        AppEvent::RunsLoaded {
                            workflow_id,
                            seq,
                            result: result.map_err(|e| e.to_string()),
                        },
                    );
                });
            }
            Command::FetchJobs { run_id, seq } => {
                let (client, repo, tx) = self.parts();
                spawn_monitored(self.tx.clone(), "fetch_jobs", async move {
                    let result = client.fetch_jobs(&repo, run_id).await;
                    send(
                        &tx,
                        AppEvent::JobsLoaded {
                            run_id,
                            seq,
                            result: result.map_err(|e| e.to_string()),
                        },
                    );
                });
            }
            Command::FetchLogs { job_id, seq } => {
                let (client, repo, tx) = self.parts();
                spawn_monitored(self.tx.clone(), "fetch_logs", async move {
                    let result = client.fetch_logs(&repo, job_id).await;
                    send(
                        &tx,
                        AppEvent::LogsLoaded {
                            job_id,
                            seq,
                            polled: false,
                            result: result.map_err(|e| e.to_string()),
                        },
                    );
                });
            }
            Command::StartLogPolling { job_id, seq } => self.log_poller.start(job_id, seq),
            Command::StopLogPolling => self.log_poller.stop(),
            Command::RunAction { action, run_id } => {
                let (client, repo, tx) = self.parts();
                tracing::info!(?action, run_id, "running action");
                spawn_monitored(self.tx.clone(), "run_action", async move {
                    let result = match action {
                        RunAction::Cancel => client.cancel_run(&repo, run_id).await,
                        RunAction::Rerun => client.rerun_workflow(&repo, run_id).await,
                        RunAction::RerunFailed => client.rerun_failed_jobs(&repo, run_id).await,
                    };
                    if let Err(e) = &result {
                        tracing::warn!(?action, run_id, "action failed: {e}");
                    }
                    send(
                        &tx,
                        AppEvent::ActionFinished {
                            action,
                            run_id,
                            result: result.map_err(|e| e.to_string()),
                        },
                    );
                });
            }
            Command::CopyToClipboard(text) => {
                let tx = self.tx.clone();
                spawn_monitored(self.tx.clone(), "clipboard", async move {
                    let result = executor::copy_to_clipboard(&text).await;
                    send(&tx, AppEvent::ClipboardResult(result.map_err(|e| e.to_string())));
                });
            }
            Command::ExpireFlash { id, after } => {
                let tx = self.tx.clone();
                spawn_monitored(self.tx.clone(), "expire_flash", async move {
                    tokio::time::sleep(after).await;
                    send(&tx, AppEvent::FlashExpired(id));
                });
            }
        }
    }

    fn parts(
        &self,
    ) -> (
        Arc<dyn ActionsClient>,
        Repository,
        mpsc::UnboundedSender<AppEvent>,
    ) {
        (self.client.clone(), self.repo.clone(), self.tx.clone())
    }

    pub fn poll_session(&self) -> Option<PollSession> {
        self.log_poller.session()
    }

    pub fn is_polling(&self) -> bool {
        self.log_poller.is_running()
    }

    /// Stop background polling. In-flight one-shot fetches are left to finish; their
    /// results go nowhere once the receiver is dropped.
    pub fn shutdown(&mut self) {
        self.log_poller.stop();
    }
}

fn send(tx: &mpsc::UnboundedSender<AppEvent>, event: AppEvent) {
    if tx.send(event).is_err() {
        tracing::warn!("event channel closed, dropping result");
    }
}

/// Spawn a task whose panic is reported to the UI as an error instead of vanishing.
pub fn spawn_monitored(
    tx: mpsc::UnboundedSender<AppEvent>,
    label: &'static str,
    fut: impl Future<Output = ()> + Send + 'static,
) {
    tokio::spawn(async move {
        let handle = tokio::spawn(fut);
        if let Err(join_err) = handle.await {
            let msg = if join_err.is_panic() {
                match join_err.into_panic().downcast::<String>() {
                    Ok(s) => *s,
                    Err(payload) => match payload.downcast::<&str>() {
                        Ok(s) => (*s).to_string(),
                        Err(_) => "unknown panic".to_string(),
                    },
                }
            } else {
                "task cancelled".to_string()
            };
            tracing::error!("{label} panicked: {msg}");
            send(&tx, AppEvent::Error(format!("{label} crashed: {msg}")));
        }
    });
}

//! Terminal input thread and application event channel.
//!
//! [`EventHandler`] spawns an OS thread (not a tokio task) because
//! `crossterm::event::poll()` blocks and would starve the async runtime. Fetch results,
//! poll results and timers all arrive on the same channel, so the state machine sees
//! one ordered stream of events.

use crate::app::{Job, Run, RunAction, Workflow};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize {
        width: u16,
        height: u16,
    },
    /// Animation heartbeat from the input thread.
    Tick,
    WorkflowsLoaded(Result<Vec<Workflow>, String>),
    RunsLoaded {
        workflow_id: u64,
        seq: u64,
        result: Result<Vec<Run>, String>,
    },
    JobsLoaded {
        run_id: u64,
        seq: u64,
        result: Result<Vec<Job>, String>,
    },
    LogsLoaded {
        job_id: u64,
        seq: u64,
        /// `true` for a tail refresh from the log poller, `false` for the initial fetch.
        polled: bool,
        result: Result<String, String>,
    },
    ActionFinished {
        action: RunAction,
        run_id: u64,
        result: Result<(), String>,
    },
    ClipboardResult(Result<(), String>),
    FlashExpired(u64),
    Error(String),
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let eventtx = tx.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = shutdown.clone();

        let thread = std::thread::spawn(move || {
            while !shutdown_flag.load(Ordering::Relaxed) {
                match event::poll(tick_rate) {
                    Err(e) => {
                        let _ = eventtx.send(AppEvent::Error(format!("Terminal poll error: {e}")));
                        break;
                    }
                    Ok(false) => {
                        if eventtx.send(AppEvent::Tick).is_err() {
                            break;
                        }
                        continue;
                    }
                    Ok(true) => {}
                }
                let forwarded = match event::read() {
                    Ok(CrosstermEvent::Key(key)) => Some(AppEvent::Key(key)),
                    Ok(CrosstermEvent::Resize(width, height)) => {
                        Some(AppEvent::Resize { width, height })
                    }
                    Ok(_) => None,
                    // EINTR: retry silently
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => None,
                    Err(e) => {
                        let _ = eventtx.send(AppEvent::Error(format!("Terminal read error: {e}")));
                        break;
                    }
                };
                if let Some(ev) = forwarded {
                    if eventtx.send(ev).is_err() {
                        break;
                    }
                }
            }
        });

        Self {
            rx,
            tx,
            shutdown,
            thread: Some(thread),
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                tracing::error!("event thread panicked");
            }
        }
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        // Signal only: joining here could deadlock while poll() blocks during unwinding.
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

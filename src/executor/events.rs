//! Watchers notified around node evaluation.
//!
//! A watcher is a tracing side channel. Nothing it does feeds back into
//! control flow.

use super::error::ExecuteError;
use super::logiclet::NodeMeta;
use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    Log(String),
    NodeActive {
        id: Uuid,
        tag: String,
        at: DateTime<Local>,
    },
    NodeInactive {
        id: Uuid,
        tag: String,
        failed: Option<String>,
        elapsed: Duration,
        at: DateTime<Local>,
    },
    Finished {
        failed: Option<String>,
    },
}

pub trait ExecuteWatcher: Send + Sync {
    fn on_start(&self, node: &NodeMeta);

    fn on_finish(&self, node: &NodeMeta, outcome: Result<(), &ExecuteError>, elapsed: Duration);

    fn on_log(&self, _message: &str) {}

    /// Called once when the top-level evaluation returns.
    fn on_complete(&self, _outcome: Result<(), &ExecuteError>) {}
}

/// Reports node activity through the `log` facade.
pub struct LogWatcher;

impl ExecuteWatcher for LogWatcher {
    fn on_start(&self, node: &NodeMeta) {
        log::trace!("start <{}> {}", node.tag(), node.id());
    }

    fn on_finish(&self, node: &NodeMeta, outcome: Result<(), &ExecuteError>, elapsed: Duration) {
        match outcome {
            Ok(()) => log::debug!("done <{}> {} in {:?}", node.tag(), node.id(), elapsed),
            Err(e) => log::debug!("failed <{}> {} in {:?}: {}", node.tag(), node.id(), elapsed, e),
        }
    }

    fn on_complete(&self, outcome: Result<(), &ExecuteError>) {
        if let Err(e) = outcome {
            log::warn!("script failed [{}]: {}", e.code(), e);
        }
    }
}

/// Publishes [`ExecutionEvent`]s on a channel.
pub struct ChannelWatcher {
    tx: Sender<ExecutionEvent>,
}

impl ChannelWatcher {
    pub fn new() -> (Self, Receiver<ExecutionEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    fn send(&self, event: ExecutionEvent) {
        // A dropped receiver only means nobody is listening.
        let _ = self.tx.send(event);
    }
}

impl ExecuteWatcher for ChannelWatcher {
    fn on_start(&self, node: &NodeMeta) {
        self.send(ExecutionEvent::NodeActive {
            id: node.id(),
            tag: node.tag().to_string(),
            at: Local::now(),
        });
    }

    fn on_finish(&self, node: &NodeMeta, outcome: Result<(), &ExecuteError>, elapsed: Duration) {
        self.send(ExecutionEvent::NodeInactive {
            id: node.id(),
            tag: node.tag().to_string(),
            failed: outcome.err().map(|e| e.code().to_string()),
            elapsed,
            at: Local::now(),
        });
    }

    fn on_log(&self, message: &str) {
        self.send(ExecutionEvent::Log(message.to_string()));
    }

    fn on_complete(&self, outcome: Result<(), &ExecuteError>) {
        self.send(ExecutionEvent::Finished {
            failed: outcome.err().map(|e| e.code().to_string()),
        });
    }
}

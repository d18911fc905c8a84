//! Per-part and overall upload status.
//!
//! `UploadSnapshot` is a plain value updated only through reducer-style
//! transitions; `StatusBoard` owns the live copy and publishes every change
//! over a `watch` channel, so a presentation layer gets read-only snapshots
//! and never shares the mutable table.

use crate::client::splitter::PartRange;
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::watch;
use tracing::debug;

/// `pending → uploading → completed | error`
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PartStatus {
    Pending,
    Uploading,
    Completed,
    Error,
}

impl PartStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PartStatus::Completed | PartStatus::Error)
    }
}

/// `idle → uploading → success | error`
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Idle,
    Uploading,
    Success,
    Error,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PartRecord {
    pub part_number: u32,
    pub size: u64,
    /// 0–100; non-decreasing while uploading.
    pub progress: f64,
    pub status: PartStatus,
    /// Present only once the part is completed.
    pub e_tag: Option<String>,
}

/// Something that happened to one part.
#[derive(Clone, Debug, PartialEq)]
pub enum PartEvent {
    Started,
    Progress(f64),
    Completed { e_tag: String },
    Failed,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct UploadSnapshot {
    pub file_name: String,
    pub status: OverallStatus,
    pub parts: BTreeMap<u32, PartRecord>,
    pub error: Option<String>,
}

impl Default for UploadSnapshot {
    fn default() -> Self {
        Self {
            file_name: String::new(),
            status: OverallStatus::Idle,
            parts: BTreeMap::new(),
            error: None,
        }
    }
}

impl UploadSnapshot {
    /// A fresh session: overall `uploading`, every part `pending`.
    pub fn begin(file_name: impl Into<String>, ranges: &[PartRange]) -> Self {
        let parts = ranges
            .iter()
            .map(|range| {
                (
                    range.part_number,
                    PartRecord {
                        part_number: range.part_number,
                        size: range.len(),
                        progress: 0.0,
                        status: PartStatus::Pending,
                        e_tag: None,
                    },
                )
            })
            .collect();

        Self {
            file_name: file_name.into(),
            status: OverallStatus::Uploading,
            parts,
            error: None,
        }
    }

    /// Apply one part event. Events for unknown parts, or for parts already
    /// in a terminal state, are ignored. Returns whether anything changed.
    pub fn apply(&mut self, part_number: u32, event: PartEvent) -> bool {
        let Some(record) = self.parts.get_mut(&part_number) else {
            return false;
        };
        if record.status.is_terminal() {
            return false;
        }

        match event {
            PartEvent::Started => {
                if record.status == PartStatus::Uploading {
                    return false;
                }
                record.status = PartStatus::Uploading;
            }
            PartEvent::Progress(percent) => {
                let percent = percent.clamp(0.0, 100.0);
                if record.status == PartStatus::Uploading && percent <= record.progress {
                    return false;
                }
                record.status = PartStatus::Uploading;
                record.progress = record.progress.max(percent);
            }
            PartEvent::Completed { e_tag } => {
                record.status = PartStatus::Completed;
                record.progress = 100.0;
                record.e_tag = Some(e_tag);
            }
            PartEvent::Failed => {
                record.status = PartStatus::Error;
            }
        }
        true
    }

    /// Settle the overall status. Terminal overall states stick.
    pub fn finish(&mut self, outcome: Result<(), String>) {
        if matches!(self.status, OverallStatus::Success | OverallStatus::Error) {
            return;
        }
        match outcome {
            Ok(()) => self.status = OverallStatus::Success,
            Err(message) => {
                self.status = OverallStatus::Error;
                self.error = Some(message);
            }
        }
    }

    pub fn total_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn completed_parts(&self) -> usize {
        self.count(PartStatus::Completed)
    }

    pub fn count(&self, status: PartStatus) -> usize {
        self.parts.values().filter(|p| p.status == status).count()
    }

    /// Completed parts over all parts, 0–100.
    pub fn overall_progress(&self) -> f64 {
        if self.parts.is_empty() {
            return 0.0;
        }
        self.completed_parts() as f64 * 100.0 / self.parts.len() as f64
    }
}

/// Live status owned by one coordinator.
#[derive(Clone)]
pub struct StatusBoard {
    tx: Arc<watch::Sender<UploadSnapshot>>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(UploadSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to snapshots; the receiver always sees the latest state.
    pub fn subscribe(&self) -> watch::Receiver<UploadSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        self.tx.borrow().clone()
    }

    /// Replace whatever was tracked with a new session.
    pub fn begin(&self, file_name: &str, ranges: &[PartRange]) {
        self.tx
            .send_replace(UploadSnapshot::begin(file_name, ranges));
    }

    pub fn apply(&self, part_number: u32, event: PartEvent) {
        self.tx.send_if_modified(|snapshot| {
            let changed = snapshot.apply(part_number, event.clone());
            if changed {
                debug!(part_number, ?event, "part status changed");
            }
            changed
        });
    }

    pub fn finish(&self, outcome: Result<(), String>) {
        self.tx.send_modify(|snapshot| snapshot.finish(outcome));
    }
}

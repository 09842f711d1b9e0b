//! Job output retention.
//!
//! Every line a job prints is kept in a bounded ring buffer so the full
//! output is available after a failure, and is broadcast to live
//! subscribers.

use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use gvd_core::JobId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Maximum number of lines kept per job
pub const MAX_LOG_LINES: usize = 5000;

/// A single retained output line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLogEntry {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub line: String,
    pub job_id: JobId,
}

impl JobLogEntry {
    pub fn new(job_id: JobId, line: String) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            line,
            job_id,
        }
    }
}

#[derive(Debug, Default)]
struct LogBuffer {
    lines: VecDeque<JobLogEntry>,
}

impl LogBuffer {
    fn push(&mut self, entry: JobLogEntry) {
        if self.lines.len() >= MAX_LOG_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(entry);
    }
}

/// Log buffers and a broadcast channel for all jobs of one controller
pub struct JobLogManager {
    buffers: RwLock<HashMap<JobId, LogBuffer>>,
    broadcast_tx: broadcast::Sender<JobLogEntry>,
}

impl JobLogManager {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1000);
        Self {
            buffers: RwLock::new(HashMap::new()),
            broadcast_tx,
        }
    }

    /// Append a line (sync, callable from any thread)
    pub fn add_line(&self, job_id: JobId, line: &str) {
        let entry = JobLogEntry::new(job_id, line.to_string());
        {
            let mut buffers = self.buffers.write().unwrap_or_else(PoisonError::into_inner);
            buffers.entry(job_id).or_default().push(entry.clone());
        }
        // No receivers is fine
        let _ = self.broadcast_tx.send(entry);
    }

    pub fn lines(&self, job_id: JobId) -> Vec<JobLogEntry> {
        let buffers = self.buffers.read().unwrap_or_else(PoisonError::into_inner);
        buffers
            .get(&job_id)
            .map(|b| b.lines.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Retained output joined with newlines
    pub fn text(&self, job_id: JobId) -> String {
        self.lines(job_id)
            .into_iter()
            .map(|e| e.line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobLogEntry> {
        self.broadcast_tx.subscribe()
    }

    pub fn clear(&self, job_id: JobId) {
        let mut buffers = self.buffers.write().unwrap_or_else(PoisonError::into_inner);
        buffers.remove(&job_id);
    }
}

impl Default for JobLogManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let logs = JobLogManager::new();
        let job = JobId::new();
        for i in 0..(MAX_LOG_LINES + 10) {
            logs.add_line(job, &format!("line {i}"));
        }
        let lines = logs.lines(job);
        assert_eq!(lines.len(), MAX_LOG_LINES);
        assert_eq!(lines[0].line, "line 10");
    }

    #[test]
    fn test_jobs_are_isolated() {
        let logs = JobLogManager::new();
        let a = JobId::new();
        let b = JobId::new();
        logs.add_line(a, "from a");
        logs.add_line(b, "from b");
        assert_eq!(logs.text(a), "from a");
        logs.clear(a);
        assert!(logs.lines(a).is_empty());
        assert_eq!(logs.lines(b).len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_receive_lines() {
        let logs = JobLogManager::new();
        let mut rx = logs.subscribe();
        let job = JobId::new();
        logs.add_line(job, "hello");
        let entry = rx.recv().await.unwrap();
        assert_eq!(entry.line, "hello");
        assert_eq!(entry.job_id, job);
    }
}

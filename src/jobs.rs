//! In-memory job tracker for asynchronous processing.
//!
//! Each job moves from `processing` to exactly one of `done` or `error`.
//! Updates to a finished job are ignored. Entries expire a fixed TTL after
//! their last update and are evicted on insert and by a periodic sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::aggregate::Aggregate;
use crate::extraction::Extractor;
use crate::pipeline::{process_pdf, ProgressSink};

pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Done,
    Error,
}

/// Pollable view of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub status: JobStatus,
    pub current_chunk: u32,
    pub total_chunks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Aggregate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    fn new() -> Self {
        Self {
            status: JobStatus::Processing,
            current_chunk: 0,
            total_chunks: 0,
            result: None,
            error: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status != JobStatus::Processing
    }
}

struct Entry {
    job: Job,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Shared job table.
#[derive(Clone)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<JobId, Entry>>>,
    ttl: Duration,
}

impl JobStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Register a new job in the `processing` state.
    pub async fn create(&self) -> JobId {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Instant::now();
        let mut jobs = self.jobs.write().await;
        jobs.retain(|_, entry| !entry.is_expired(now));
        jobs.insert(
            id.clone(),
            Entry {
                job: Job::new(),
                expires_at: now + self.ttl,
            },
        );
        id
    }

    /// Current state, or `None` for unknown or expired ids.
    pub async fn get(&self, id: &str) -> Option<Job> {
        let jobs = self.jobs.read().await;
        jobs.get(id)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.job.clone())
    }

    /// Apply `update` to a job that is still processing. Returns false if the
    /// job is unknown, expired or already finished.
    async fn update<F>(&self, id: &str, update: F) -> bool
    where
        F: FnOnce(&mut Job),
    {
        let now = Instant::now();
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id) {
            Some(entry) if !entry.is_expired(now) && !entry.job.is_finished() => {
                update(&mut entry.job);
                entry.expires_at = now + self.ttl;
                true
            }
            _ => false,
        }
    }

    /// Fix the chunk count once chunking has finished. Later calls are
    /// ignored.
    pub async fn set_total(&self, id: &str, total_chunks: u32) -> bool {
        self.update(id, |job| {
            if job.total_chunks == 0 {
                job.total_chunks = total_chunks;
            }
        })
        .await
    }

    /// Record progress. The counter never moves backwards.
    pub async fn set_progress(&self, id: &str, current_chunk: u32) -> bool {
        self.update(id, |job| {
            job.current_chunk = job.current_chunk.max(current_chunk);
        })
        .await
    }

    pub async fn complete(&self, id: &str, result: Aggregate) -> bool {
        self.update(id, |job| {
            job.status = JobStatus::Done;
            job.current_chunk = job.current_chunk.max(job.total_chunks);
            job.result = Some(result);
        })
        .await
    }

    pub async fn fail(&self, id: &str, message: String) -> bool {
        self.update(id, |job| {
            job.status = JobStatus::Error;
            job.error = Some(message);
        })
        .await
    }

    /// Drop expired entries. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, entry| !entry.is_expired(now));
        before - jobs.len()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Sweep expired entries every `interval` until the runtime shuts down.
    pub fn spawn_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = store.sweep().await;
                if removed > 0 {
                    debug!("Evicted {} expired jobs", removed);
                }
            }
        })
    }

    /// Start processing `pdf` in the background and return the job id.
    pub async fn spawn_job(&self, extractor: Arc<dyn Extractor>, pdf: Vec<u8>) -> JobId {
        let id = self.create().await;
        let store = self.clone();
        let job_id = id.clone();

        tokio::spawn(async move {
            let progress = JobProgress {
                store: store.clone(),
                id: job_id.clone(),
            };
            match process_pdf(extractor.as_ref(), &pdf, &progress).await {
                Ok(result) => {
                    info!(
                        "Job {} done: {}/{} chunks extracted",
                        job_id, result.total_succeeded, result.total_chunks
                    );
                    store.complete(&job_id, result).await;
                }
                Err(e) => {
                    error!("Job {} failed: {}", job_id, e);
                    store.fail(&job_id, e.to_string()).await;
                }
            }
        });

        id
    }
}

/// Forwards pipeline progress into the store.
struct JobProgress {
    store: JobStore,
    id: JobId,
}

#[async_trait]
impl ProgressSink for JobProgress {
    async fn chunked(&self, total_chunks: u32) {
        self.store.set_total(&self.id, total_chunks).await;
    }

    async fn chunk_finished(&self, current_chunk: u32, _total_chunks: u32) {
        self.store.set_progress(&self.id, current_chunk).await;
    }
}

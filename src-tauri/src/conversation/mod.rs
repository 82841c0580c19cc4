//! Conversation state and the query cycle that drives it.
//!
//! One submission runs capture → `/ask` → update stream → overlay. At most
//! one cycle is in flight; submissions made meanwhile are ignored rather
//! than queued, and the in-flight request is never cancelled.

mod pipeline;

pub use pipeline::TauriPipeline;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::backend::{BoundingBox, StreamUpdate, TransportError, UpdateSource};
use crate::capture::CaptureError;
use crate::overlay::OverlayError;

/// One question and its (possibly still streaming) answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QaEntry {
    pub id: u64,
    pub question: String,
    pub answer: String,
    pub streaming: bool,
    pub bbox: Option<BoundingBox>,
}

/// The collaborators one query cycle needs.
#[allow(async_fn_in_trait)]
pub trait QueryPipeline {
    type Updates: UpdateSource;

    /// Screenshot of the primary display as base64 PNG.
    async fn capture(&self) -> Result<String, CaptureError>;

    async fn ask(&self, query: &str, screenshot: Option<String>) -> Result<Self::Updates, TransportError>;

    async fn show_overlay(&self, bbox: BoundingBox, text: &str) -> Result<(), OverlayError>;

    /// Called after every change to an entry.
    fn publish(&self, entry: &QaEntry);
}

/// Clears the in-flight flag when dropped, whatever path the cycle took.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Default)]
pub struct Conversation {
    entries: Mutex<Vec<QaEntry>>,
    next_id: AtomicU64,
    in_flight: AtomicBool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<QaEntry> {
        self.lock_entries().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one query cycle for `question`.
    ///
    /// Returns the new entry's id, or `None` when the question was blank or
    /// another cycle is still in flight. Failures never escape: they end up
    /// as the entry's answer text.
    pub async fn submit<P: QueryPipeline>(&self, question: &str, pipeline: &P) -> Option<u64> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            log::info!("[QUERY] Ignoring submission while a request is in flight");
            return None;
        };

        let entry = QaEntry {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            question: question.to_string(),
            answer: String::new(),
            streaming: true,
            bbox: None,
        };
        let id = entry.id;
        self.lock_entries().push(entry.clone());
        pipeline.publish(&entry);

        let start = std::time::Instant::now();
        match self.run_cycle(id, question, pipeline).await {
            Ok(()) => log::info!("[QUERY] #{} answered in {}ms", id, start.elapsed().as_millis()),
            Err(e) => {
                log::error!("[QUERY] #{} failed: {}", id, e);
                self.update(id, pipeline, |entry| {
                    entry.answer = format!("Error: {}", e);
                    entry.streaming = false;
                });
            }
        }

        Some(id)
    }

    async fn run_cycle<P: QueryPipeline>(
        &self,
        id: u64,
        question: &str,
        pipeline: &P,
    ) -> Result<(), TransportError> {
        let screenshot = match pipeline.capture().await {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!("[QUERY] Proceeding without screenshot: {}", e);
                None
            }
        };

        let mut updates = pipeline.ask(question, screenshot).await?;
        let mut received = 0usize;

        while let Some(update) = updates.next_update().await {
            let update = update?;
            received += 1;
            self.update(id, pipeline, |entry| {
                entry.answer = update.text().to_string();
                entry.streaming = !update.is_terminal();
                entry.bbox = update.bbox();
            });

            if let StreamUpdate::Final { text, bbox } = &update {
                if let Some(bbox) = bbox {
                    if let Err(e) = pipeline.show_overlay(*bbox, text).await {
                        log::error!("[QUERY] Overlay not shown: {}", e);
                    }
                }
                return Ok(());
            }
        }

        if received == 0 {
            return Err(TransportError::EmptyAnswer);
        }

        // Stream ended without a final payload: keep the last text.
        self.update(id, pipeline, |entry| entry.streaming = false);
        Ok(())
    }

    fn update<P: QueryPipeline>(&self, id: u64, pipeline: &P, apply: impl FnOnce(&mut QaEntry)) {
        let snapshot = {
            let mut entries = self.lock_entries();
            entries.iter_mut().find(|e| e.id == id).map(|entry| {
                apply(entry);
                entry.clone()
            })
        };
        if let Some(entry) = snapshot {
            pipeline.publish(&entry);
        }
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, Vec<QaEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Download queue on top of [`VideoJobController`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use gvd_core::{
    AppEventEmitter, JobId, JobOptions, JobOutcome, QueueEvent, QueueItem, QueueItemId,
    QueueStatus, validate_job_options,
};
use tracing::{debug, info, warn};

use super::error::QueueError;
use super::store::QueueStore;
use crate::job::{FAILURE_MESSAGE, JobWatch, VideoJobController};

#[derive(Debug, Default)]
struct QueueState {
    items: Vec<QueueItem>,
    /// Entries with a live job.
    active: HashMap<QueueItemId, JobId>,
    /// Entries started while another was downloading, in start order.
    priority: VecDeque<QueueItemId>,
    /// Stop requested while the entry's job was still launching.
    stop_requested: HashSet<QueueItemId>,
    /// A "start all" run is in progress.
    sequential: bool,
}

impl QueueState {
    fn item_mut(&mut self, id: QueueItemId) -> Result<&mut QueueItem, QueueError> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(QueueError::UnknownItem(id))
    }

    fn is_running(&self) -> bool {
        !self.active.is_empty()
            || self
                .items
                .iter()
                .any(|i| i.status == QueueStatus::Downloading)
    }

    /// Mark `id` as downloading and hand back its options.
    fn reserve(&mut self, id: QueueItemId) -> Result<JobOptions, QueueError> {
        let item = self.item_mut(id)?;
        item.status = QueueStatus::Downloading;
        item.progress = 0.0;
        Ok(item.options.clone())
    }
}

struct Inner {
    controller: Arc<VideoJobController>,
    emitter: Arc<dyn AppEventEmitter>,
    store: QueueStore,
    state: Mutex<QueueState>,
}

/// Ordered, persisted download queue.
///
/// One entry downloads at a time. Starting an entry while another runs
/// parks it as `Waiting` and it runs next. [`start_all`](Self::start_all)
/// works through every `Queued` entry in order and ends with
/// [`QueueEvent::AllFinished`]. The file is rewritten whenever entries are
/// added or removed and whenever one settles.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<Inner>,
}

impl JobQueue {
    /// Queue backed by the file at `path`, restored from it if present.
    pub fn load(
        controller: Arc<VideoJobController>,
        emitter: Arc<dyn AppEventEmitter>,
        path: impl Into<PathBuf>,
    ) -> Self {
        let store = QueueStore::new(path);
        let items = store.load();
        debug!(path = %store.path().display(), count = items.len(), "Queue loaded");

        Self {
            inner: Arc::new(Inner {
                controller,
                emitter,
                store,
                state: Mutex::new(QueueState {
                    items,
                    ..QueueState::default()
                }),
            }),
        }
    }

    pub fn items(&self) -> Vec<QueueItem> {
        self.lock().items.clone()
    }

    pub fn item(&self, id: QueueItemId) -> Option<QueueItem> {
        self.lock().items.iter().find(|i| i.id == id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// An entry is downloading.
    pub fn is_running(&self) -> bool {
        self.lock().is_running()
    }

    /// Append a `Queued` entry. A blank `title` falls back to the URL.
    pub fn add(&self, title: &str, options: JobOptions) -> Result<QueueItemId, QueueError> {
        validate_job_options(&options)?;
        let item = QueueItem::new(title, options);
        let id = item.id;

        {
            let mut state = self.lock();
            state.items.push(item);
            if let Err(e) = self.persist(&state.items) {
                state.items.pop();
                return Err(e);
            }
        }

        info!(%id, "Download queued");
        self.emit(QueueEvent::Updated);
        Ok(id)
    }

    /// Look up the title with the fetch tool, then [`add`](Self::add).
    ///
    /// When the lookup fails the URL stands in for the title.
    pub async fn fetch_and_add(
        &self,
        options: JobOptions,
        auto_start: bool,
    ) -> Result<QueueItemId, QueueError> {
        validate_job_options(&options)?;
        let title = match self.inner.controller.fetch_title(&options.url).await {
            Ok(title) => title,
            Err(e) => {
                debug!(url = %options.url, error = %e, "Title lookup failed, using URL");
                String::new()
            }
        };

        let id = self.add(&title, options)?;
        if auto_start {
            self.start_item(id).await?;
        }
        Ok(id)
    }

    /// Remove an entry, stopping it first if it is active.
    pub fn remove(&self, id: QueueItemId) -> Result<QueueItem, QueueError> {
        self.stop_item(id)?;

        let item = {
            let mut state = self.lock();
            let index = state
                .items
                .iter()
                .position(|i| i.id == id)
                .ok_or(QueueError::UnknownItem(id))?;
            let item = state.items.remove(index);
            state.priority.retain(|p| *p != id);
            self.persist(&state.items)?;
            item
        };

        info!(%id, "Download removed from queue");
        self.emit(QueueEvent::Updated);
        Ok(item)
    }

    /// Stop everything and drop every entry.
    pub fn clear(&self) -> Result<(), QueueError> {
        self.stop_all();
        {
            let mut state = self.lock();
            state.items.clear();
            self.persist(&state.items)?;
        }
        self.emit(QueueEvent::Updated);
        Ok(())
    }

    /// Start one entry now, or right after the running one.
    ///
    /// Starting an entry that is already downloading or waiting does nothing.
    /// A launch failure marks the entry `Failed` and is returned.
    pub async fn start_item(&self, id: QueueItemId) -> Result<(), QueueError> {
        let options = {
            let mut state = self.lock();
            let status = state.item_mut(id)?.status;
            match status {
                QueueStatus::Downloading | QueueStatus::Waiting => return Ok(()),
                _ if state.is_running() => {
                    state.item_mut(id)?.status = QueueStatus::Waiting;
                    state.priority.push_back(id);
                    drop(state);
                    info!(%id, "Download waiting for the running one");
                    self.emit_status(id, QueueStatus::Waiting, None);
                    return Ok(());
                }
                _ => state.reserve(id)?,
            }
        };
        self.launch(id, options).await
    }

    /// Stop one entry: cancel its job, or take it out of the waiting line.
    pub fn stop_item(&self, id: QueueItemId) -> Result<(), QueueError> {
        let mut state = self.lock();
        let status = state.item_mut(id)?.status;
        match status {
            QueueStatus::Downloading => match state.active.get(&id).copied() {
                Some(job_id) => {
                    drop(state);
                    self.stop_job(job_id);
                }
                None => {
                    state.stop_requested.insert(id);
                }
            },
            QueueStatus::Waiting => {
                state.priority.retain(|p| *p != id);
                state.item_mut(id)?.status = QueueStatus::Stopped;
                drop(state);
                self.emit_status(id, QueueStatus::Stopped, None);
            }
            _ => {}
        }
        Ok(())
    }

    /// Run every `Queued` entry in order, one at a time.
    ///
    /// `Stopped` entries are queued again first. Returns once the first
    /// entry is launched; the run continues in the background.
    pub async fn start_all(&self) {
        let requeued: Vec<QueueItemId> = {
            let mut state = self.lock();
            state.sequential = true;
            let requeued = state
                .items
                .iter_mut()
                .filter(|i| i.status == QueueStatus::Stopped)
                .map(|i| {
                    i.status = QueueStatus::Queued;
                    i.id
                })
                .collect();
            self.save_logged(&state.items);
            requeued
        };

        for id in requeued {
            self.emit_status(id, QueueStatus::Queued, None);
        }
        info!("Queue run started");
        self.process_next().await;
    }

    /// End a "start all" run and stop everything waiting or downloading.
    pub fn stop_all(&self) {
        let (jobs, parked) = {
            let mut state = self.lock();
            state.sequential = false;

            let parked: Vec<QueueItemId> = state.priority.drain(..).collect();
            for id in &parked {
                if let Ok(item) = state.item_mut(*id) {
                    item.status = QueueStatus::Stopped;
                }
            }

            let launching: Vec<QueueItemId> = state
                .items
                .iter()
                .filter(|i| i.status == QueueStatus::Downloading && !state.active.contains_key(&i.id))
                .map(|i| i.id)
                .collect();
            state.stop_requested.extend(launching);

            let jobs: Vec<JobId> = state.active.values().copied().collect();
            (jobs, parked)
        };

        info!(running = jobs.len(), waiting = parked.len(), "Stopping queue");
        for id in parked {
            self.emit_status(id, QueueStatus::Stopped, None);
        }
        for job_id in jobs {
            self.stop_job(job_id);
        }
    }

    /// Launch whatever runs next, if nothing is running.
    ///
    /// Waiting entries go first, in the order they were started. During a
    /// "start all" run the first `Queued` entry follows, and a run with
    /// nothing left ends with `AllFinished`.
    fn process_next(&self) -> BoxFuture<'static, ()> {
        let queue = self.clone();
        async move {
            while let Some((id, options)) = queue.reserve_next() {
                if queue.launch(id, options).await.is_ok() {
                    return;
                }
            }
        }
        .boxed()
    }

    fn reserve_next(&self) -> Option<(QueueItemId, JobOptions)> {
        let mut state = self.lock();
        if state.is_running() {
            return None;
        }

        while let Some(id) = state.priority.pop_front() {
            if let Ok(options) = state.reserve(id) {
                return Some((id, options));
            }
        }

        if !state.sequential {
            return None;
        }
        let next = state
            .items
            .iter()
            .find(|i| i.status == QueueStatus::Queued)
            .map(|i| i.id);
        if let Some(id) = next {
            return state.reserve(id).ok().map(|options| (id, options));
        }

        state.sequential = false;
        drop(state);
        info!("Queue run finished");
        self.emit(QueueEvent::AllFinished);
        None
    }

    /// Start the job for a reserved entry.
    async fn launch(&self, id: QueueItemId, options: JobOptions) -> Result<(), QueueError> {
        match self.inner.controller.start_watched(&options).await {
            Ok(watch) => {
                let job_id = watch.job_id;
                let stop_now = {
                    let mut state = self.lock();
                    state.active.insert(id, job_id);
                    state.stop_requested.remove(&id)
                };

                info!(%id, %job_id, "Queued download started");
                self.emit_status(id, QueueStatus::Downloading, Some(job_id));
                if stop_now {
                    self.stop_job(job_id);
                }
                tokio::spawn(self.clone().follow(id, watch));
                Ok(())
            }
            Err(e) => {
                warn!(%id, error = %e, "Queued download failed to start");
                self.settle(
                    id,
                    &JobOutcome::Failed {
                        message: e.to_string(),
                    },
                );
                Err(e.into())
            }
        }
    }

    /// Mirror a job's progress onto its entry until it ends, then move on.
    async fn follow(self, id: QueueItemId, mut watch: JobWatch) {
        let mut progress_open = true;
        let outcome = loop {
            tokio::select! {
                biased;
                outcome = &mut watch.outcome => {
                    break outcome.unwrap_or_else(|_| JobOutcome::Failed {
                        message: FAILURE_MESSAGE.to_string(),
                    });
                }
                changed = watch.progress.changed(), if progress_open => match changed {
                    Ok(()) => {
                        let percent = *watch.progress.borrow_and_update();
                        self.record_progress(id, percent);
                    }
                    Err(_) => progress_open = false,
                },
            }
        };

        self.settle(id, &outcome);
        self.process_next().await;
    }

    fn record_progress(&self, id: QueueItemId, percent: f64) {
        {
            let mut state = self.lock();
            let Some(item) = state.items.iter_mut().find(|i| i.id == id) else {
                return;
            };
            item.progress = percent;
        }
        self.emit(QueueEvent::Progress {
            item_id: id,
            percent,
        });
    }

    /// Record how an entry's job ended.
    fn settle(&self, id: QueueItemId, outcome: &JobOutcome) {
        let (status, success) = match outcome {
            JobOutcome::Succeeded => (QueueStatus::Finished, true),
            JobOutcome::Failed { .. } => (QueueStatus::Failed, false),
            JobOutcome::Cancelled => (QueueStatus::Stopped, false),
        };

        let title = {
            let mut state = self.lock();
            state.active.remove(&id);
            state.stop_requested.remove(&id);
            let Some(item) = state.items.iter_mut().find(|i| i.id == id) else {
                debug!(%id, "Settled entry was already removed");
                return;
            };
            item.status = status;
            if success {
                item.progress = 100.0;
            }
            let title = item.title.clone();
            self.save_logged(&state.items);
            title
        };

        info!(%id, ?status, "Queued download settled");
        self.emit_status(id, status, None);
        self.emit(QueueEvent::ItemFinished {
            item_id: id,
            title,
            success,
        });
    }

    fn stop_job(&self, job_id: JobId) {
        if let Err(e) = self.inner.controller.stop_job(job_id) {
            debug!(%job_id, error = %e, "Job already gone");
        }
    }

    fn persist(&self, items: &[QueueItem]) -> Result<(), QueueError> {
        self.inner.store.save(items).map_err(QueueError::Persist)
    }

    fn save_logged(&self, items: &[QueueItem]) {
        if let Err(e) = self.inner.store.save(items) {
            warn!(path = %self.inner.store.path().display(), error = %e, "Cannot save queue");
        }
    }

    fn emit(&self, event: QueueEvent) {
        self.inner.emitter.emit(event.into());
    }

    fn emit_status(&self, id: QueueItemId, status: QueueStatus, job_id: Option<JobId>) {
        self.emit(QueueEvent::StatusChanged {
            item_id: id,
            status,
            job_id,
        });
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

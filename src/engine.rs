// src/engine.rs
//! Single-owner feed engine.
//!
//! The store, the active filter and the selection live inside one tokio task.
//! Snapshot batches, stream arrivals, filter changes, selections and timer
//! expiries all reach it as messages and are applied one at a time, so no read
//! ever observes a half-applied mutation and nothing needs a lock.

use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::FeedError;
use crate::filter::FilterSpec;
use crate::model::NewsEvent;
use crate::selection::{SelectionCoordinator, SelectionExpired};
use crate::store::{url_fingerprint, BatchReport, IngestOutcome, ReconciliationStore};
use crate::view;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
const NOTICE_CAPACITY: usize = 256;

/// Fired after every accepted ingestion, filter replacement or selection change.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeNotice {
    StoreChanged { inserted: usize, total: usize },
    FilterChanged(FilterSpec),
    SelectionChanged(Option<String>),
    StreamClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectOutcome {
    Selected,
    /// No stored event carries that id; the selection is left as it was.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedStats {
    pub events: usize,
    pub revision: u64,
    pub stream_closed: bool,
    pub selected_id: Option<String>,
    pub filter: FilterSpec,
}

enum Command {
    IngestSnapshot {
        events: Vec<NewsEvent>,
        reply: oneshot::Sender<BatchReport>,
    },
    IngestStream {
        event: NewsEvent,
        reply: oneshot::Sender<IngestOutcome>,
    },
    StreamClosed {
        reply: oneshot::Sender<()>,
    },
    SetFilter {
        spec: FilterSpec,
        reply: oneshot::Sender<()>,
    },
    GetFilter {
        reply: oneshot::Sender<FilterSpec>,
    },
    View {
        spec: Option<FilterSpec>,
        limit: usize,
        reply: oneshot::Sender<Vec<NewsEvent>>,
    },
    Select {
        id: String,
        reply: oneshot::Sender<SelectOutcome>,
    },
    Selection {
        reply: oneshot::Sender<Option<String>>,
    },
    Stats {
        reply: oneshot::Sender<FeedStats>,
    },
}

struct FeedEngine {
    store: ReconciliationStore,
    filter: FilterSpec,
    selection: SelectionCoordinator,
    notices: broadcast::Sender<ChangeNotice>,
    stream_closed: bool,
}

/// Start the engine task. Dropping every [`FeedHandle`] stops it.
pub fn spawn(queue_capacity: usize) -> (FeedHandle, JoinHandle<()>) {
    let (tx, commands) = mpsc::channel(queue_capacity.max(1));
    let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
    let (selection, expiries) = SelectionCoordinator::new();

    let engine = FeedEngine {
        store: ReconciliationStore::new(),
        filter: FilterSpec::all(),
        selection,
        notices: notices.clone(),
        stream_closed: false,
    };
    let task = tokio::spawn(engine.run(commands, expiries));

    (FeedHandle { tx, notices }, task)
}

impl FeedEngine {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut expiries: mpsc::UnboundedReceiver<SelectionExpired>,
    ) {
        info!(target: "engine", "feed engine started");
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                Some(ev) = expiries.recv() => self.on_selection_expired(ev),
            }
        }
        info!(target: "engine", events = self.store.len(), "feed engine stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::IngestSnapshot { events, reply } => {
                let report = self.ingest_snapshot(events);
                let _ = reply.send(report);
            }
            Command::IngestStream { event, reply } => {
                let outcome = self.ingest_stream(event);
                let _ = reply.send(outcome);
            }
            Command::StreamClosed { reply } => {
                if !self.stream_closed {
                    self.stream_closed = true;
                    info!(target: "engine", "stream closed; waiting for snapshot refresh");
                    self.notify(ChangeNotice::StreamClosed);
                }
                let _ = reply.send(());
            }
            Command::SetFilter { spec, reply } => {
                self.filter = spec;
                debug!(target: "engine", filter = ?spec, "filter replaced");
                self.notify(ChangeNotice::FilterChanged(spec));
                let _ = reply.send(());
            }
            Command::GetFilter { reply } => {
                let _ = reply.send(self.filter);
            }
            Command::View { spec, limit, reply } => {
                let spec = spec.unwrap_or(self.filter);
                let _ = reply.send(view::project_limited(&self.store, &spec, limit));
            }
            Command::Select { id, reply } => {
                let _ = reply.send(self.select(id));
            }
            Command::Selection { reply } => {
                let _ = reply.send(self.selection.selected().map(str::to_string));
            }
            Command::Stats { reply } => {
                let _ = reply.send(FeedStats {
                    events: self.store.len(),
                    revision: self.store.revision(),
                    stream_closed: self.stream_closed,
                    selected_id: self.selection.selected().map(str::to_string),
                    filter: self.filter,
                });
            }
        }
    }

    fn ingest_snapshot(&mut self, events: Vec<NewsEvent>) -> BatchReport {
        let report = self.store.ingest_batch(events);
        counter!("feed_ingest_inserted_total", "channel" => "snapshot")
            .increment(report.inserted as u64);
        counter!("feed_ingest_duplicate_total", "channel" => "snapshot")
            .increment(report.duplicates as u64);
        info!(
            target: "engine",
            inserted = report.inserted,
            duplicates = report.duplicates,
            total = self.store.len(),
            "snapshot applied"
        );
        if report.inserted > 0 {
            self.store_changed(report.inserted);
        }
        report
    }

    fn ingest_stream(&mut self, event: NewsEvent) -> IngestOutcome {
        let outcome = self.store.ingest_one(event);
        match outcome {
            IngestOutcome::Inserted => {
                counter!("feed_ingest_inserted_total", "channel" => "stream").increment(1);
                self.store_changed(1);
            }
            IngestOutcome::Duplicate => {
                counter!("feed_ingest_duplicate_total", "channel" => "stream").increment(1);
            }
        }
        outcome
    }

    fn store_changed(&self, inserted: usize) {
        gauge!("feed_store_events").set(self.store.len() as f64);
        self.notify(ChangeNotice::StoreChanged {
            inserted,
            total: self.store.len(),
        });
    }

    fn select(&mut self, id: String) -> SelectOutcome {
        let Some(ev) = self.store.get_by_id(&id) else {
            debug!(target: "engine", %id, "select for unknown id ignored");
            return SelectOutcome::Unknown;
        };
        debug!(target: "engine", %id, url = %url_fingerprint(&ev.url), "event selected");
        self.selection.select(id.clone());
        self.notify(ChangeNotice::SelectionChanged(Some(id)));
        SelectOutcome::Selected
    }

    fn on_selection_expired(&mut self, ev: SelectionExpired) {
        if self.selection.expire(ev) {
            counter!("feed_selection_expired_total").increment(1);
            self.notify(ChangeNotice::SelectionChanged(None));
        }
    }

    fn notify(&self, notice: ChangeNotice) {
        // no subscribers is fine
        let _ = self.notices.send(notice);
    }
}

/// Cheap, cloneable front door to the engine task.
#[derive(Clone)]
pub struct FeedHandle {
    tx: mpsc::Sender<Command>,
    notices: broadcast::Sender<ChangeNotice>,
}

impl FeedHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, FeedError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| FeedError::EngineClosed)?;
        rx.await.map_err(|_| FeedError::EngineClosed)
    }

    /// Apply a whole snapshot as one step.
    pub async fn ingest_snapshot(&self, events: Vec<NewsEvent>) -> Result<BatchReport, FeedError> {
        self.request(|reply| Command::IngestSnapshot { events, reply })
            .await
    }

    pub async fn ingest_stream(&self, event: NewsEvent) -> Result<IngestOutcome, FeedError> {
        self.request(|reply| Command::IngestStream { event, reply })
            .await
    }

    /// Record that the push stream has ended. Idempotent.
    pub async fn stream_closed(&self) -> Result<(), FeedError> {
        self.request(|reply| Command::StreamClosed { reply }).await
    }

    /// Replace the active filter wholesale.
    pub async fn set_filter(&self, spec: FilterSpec) -> Result<(), FeedError> {
        self.request(|reply| Command::SetFilter { spec, reply })
            .await
    }

    pub async fn filter(&self) -> Result<FilterSpec, FeedError> {
        self.request(|reply| Command::GetFilter { reply }).await
    }

    /// Ordered view for an explicit spec.
    pub async fn view(
        &self,
        spec: FilterSpec,
        limit: Option<usize>,
    ) -> Result<Vec<NewsEvent>, FeedError> {
        let limit = limit.unwrap_or(usize::MAX);
        self.request(|reply| Command::View {
            spec: Some(spec),
            limit,
            reply,
        })
        .await
    }

    /// Ordered view for the active filter.
    pub async fn current_view(&self, limit: Option<usize>) -> Result<Vec<NewsEvent>, FeedError> {
        let limit = limit.unwrap_or(usize::MAX);
        self.request(|reply| Command::View {
            spec: None,
            limit,
            reply,
        })
        .await
    }

    pub async fn select(&self, id: impl Into<String>) -> Result<SelectOutcome, FeedError> {
        let id = id.into();
        self.request(|reply| Command::Select { id, reply }).await
    }

    pub async fn selection(&self) -> Result<Option<String>, FeedError> {
        self.request(|reply| Command::Selection { reply }).await
    }

    pub async fn stats(&self) -> Result<FeedStats, FeedError> {
        self.request(|reply| Command::Stats { reply }).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotice> {
        self.notices.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Impact};
    use chrono::{TimeZone, Utc};

    fn ev(id: &str, url: &str, ts: i64) -> NewsEvent {
        NewsEvent {
            id: id.into(),
            url: url.into(),
            title: format!("title {id}"),
            summary: None,
            source: "test".into(),
            category: Category::Political,
            impact: Impact::Medium,
            companies: None,
            location_name: None,
            latitude: -15.78,
            longitude: -47.93,
            published_at: Utc.timestamp_opt(ts, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn notices_only_on_accepted_changes() {
        let (feed, _task) = spawn(DEFAULT_QUEUE_CAPACITY);
        let mut rx = feed.subscribe();

        assert_eq!(
            feed.ingest_stream(ev("1", "u1", 1)).await.unwrap(),
            IngestOutcome::Inserted
        );
        assert_eq!(
            feed.ingest_stream(ev("2", "u1", 2)).await.unwrap(),
            IngestOutcome::Duplicate
        );
        let report = feed
            .ingest_snapshot(vec![ev("1", "u1", 1), ev("3", "u3", 3)])
            .await
            .unwrap();
        assert_eq!(report.inserted, 1);

        assert_eq!(
            rx.try_recv().unwrap(),
            ChangeNotice::StoreChanged {
                inserted: 1,
                total: 1
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ChangeNotice::StoreChanged {
                inserted: 1,
                total: 2
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn select_requires_known_id() {
        let (feed, _task) = spawn(DEFAULT_QUEUE_CAPACITY);
        assert_eq!(feed.select("nope").await.unwrap(), SelectOutcome::Unknown);
        assert_eq!(feed.selection().await.unwrap(), None);

        feed.ingest_stream(ev("9", "u9", 9)).await.unwrap();
        assert_eq!(feed.select("9").await.unwrap(), SelectOutcome::Selected);
        assert_eq!(feed.selection().await.unwrap().as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn filter_change_is_announced_and_applied() {
        let (feed, _task) = spawn(DEFAULT_QUEUE_CAPACITY);
        let mut market = ev("m", "um", 5);
        market.category = Category::Financial;
        feed.ingest_snapshot(vec![ev("p", "up", 4), market]).await.unwrap();

        let mut rx = feed.subscribe();
        let spec = FilterSpec::all().with_category(Category::Financial);
        feed.set_filter(spec).await.unwrap();

        assert_eq!(rx.try_recv().unwrap(), ChangeNotice::FilterChanged(spec));
        assert_eq!(feed.filter().await.unwrap(), spec);
        let ids: Vec<String> = feed
            .current_view(None)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["m".to_string()]);
    }

    #[tokio::test]
    async fn stream_close_is_reported_once() {
        let (feed, _task) = spawn(DEFAULT_QUEUE_CAPACITY);
        let mut rx = feed.subscribe();
        feed.stream_closed().await.unwrap();
        feed.stream_closed().await.unwrap();
        assert_eq!(rx.try_recv().unwrap(), ChangeNotice::StreamClosed);
        assert!(rx.try_recv().is_err());
        assert!(feed.stats().await.unwrap().stream_closed);
    }
}

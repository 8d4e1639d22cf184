use crate::data::{CatalogEntry, Cursor, EntryId, PageReference};
use crate::enrich::{EnrichError, enrich};
use crate::pager::{PageLoad, load_next_page};
use crate::source::{CatalogSource, SourceError};
use crate::store::{CatalogStore, InsertOutcome};
use crate::translate::TranslationLookup;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinError;
use tracing::{debug, info, warn};

/// Message sent by a background fetch back to the owning browser.
#[derive(Debug)]
pub enum Completion {
    Page {
        url: String,
        result: Result<Option<PageLoad>, SourceError>,
    },
    Record {
        reference: PageReference,
        result: Result<CatalogEntry, EnrichError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Started,
    AlreadyLoading,
    Exhausted,
}

/// What applying a completion did to the browser state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    PageLoaded { references: usize, exhausted: bool },
    PageFailed { url: String, reason: String },
    EntryAdded { id: EntryId },
    DuplicateDropped { id: EntryId },
    EnrichFailed { name: String, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BrowserStats {
    pub pages_loaded: u64,
    pub page_failures: u64,
    pub entries_added: u64,
    pub duplicates_dropped: u64,
    pub enrich_failures: u64,
}

/// Owns the catalog store and drives pagination.
///
/// Listing and detail requests run as detached tokio tasks; each reports back
/// through an internal channel and its result is applied by [`apply`], the
/// only place the store is written.
///
/// [`apply`]: CatalogBrowser::apply
pub struct CatalogBrowser<S, L> {
    source: Arc<S>,
    lookup: Arc<L>,
    store: CatalogStore,
    cursor: Cursor,
    loading: bool,
    pending_records: usize,
    total: Option<u64>,
    stats: BrowserStats,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
}

impl<S, L> CatalogBrowser<S, L>
where
    S: CatalogSource,
    L: TranslationLookup + 'static,
{
    pub fn new(source: Arc<S>, lookup: Arc<L>, start_url: impl Into<String>) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            source,
            lookup,
            store: CatalogStore::new(),
            cursor: Cursor::start(start_url),
            loading: false,
            pending_records: 0,
            total: None,
            stats: BrowserStats::default(),
            tx,
            rx,
        }
    }

    /// Starts loading the page under the cursor. Returns immediately; the
    /// listing result arrives later as a [`Completion::Page`].
    pub fn trigger_next_page(&mut self) -> Trigger {
        if self.loading {
            return Trigger::AlreadyLoading;
        }
        let Some(url) = self.cursor.url().map(str::to_string) else {
            return Trigger::Exhausted;
        };
        self.loading = true;
        let source = Arc::clone(&self.source);
        let cursor = self.cursor.clone();
        let aborted_url = url.clone();
        spawn_reported(
            self.tx.clone(),
            async move {
                let result = load_next_page(source.as_ref(), &cursor).await;
                Completion::Page { url, result }
            },
            move |err| Completion::Page {
                result: Err(SourceError::Interrupted {
                    url: aborted_url.clone(),
                    reason: err.to_string(),
                }),
                url: aborted_url,
            },
        );
        Trigger::Started
    }

    /// Applies one completion. Page results clear the loading flag and fan
    /// out one enrichment task per reference; record results go through the
    /// store's deduplicating insert.
    pub fn apply(&mut self, completion: Completion) -> BrowserEvent {
        match completion {
            Completion::Page { url, result } => {
                self.loading = false;
                match result {
                    Ok(Some(page)) => self.accept_page(page),
                    Ok(None) => {
                        self.cursor = Cursor::exhausted();
                        BrowserEvent::PageLoaded {
                            references: 0,
                            exhausted: true,
                        }
                    }
                    Err(err) => {
                        warn!(%url, error = %err, "Listing request failed; cursor unchanged");
                        self.stats.page_failures += 1;
                        BrowserEvent::PageFailed {
                            url,
                            reason: err.to_string(),
                        }
                    }
                }
            }
            Completion::Record { reference, result } => {
                self.pending_records = self.pending_records.saturating_sub(1);
                match result {
                    Ok(entry) => {
                        let id = entry.id;
                        match self.store.insert(entry) {
                            InsertOutcome::Added => {
                                self.stats.entries_added += 1;
                                BrowserEvent::EntryAdded { id }
                            }
                            InsertOutcome::Duplicate => {
                                debug!(id, name = %reference.name, "Dropped duplicate entry");
                                self.stats.duplicates_dropped += 1;
                                BrowserEvent::DuplicateDropped { id }
                            }
                        }
                    }
                    Err(err) => {
                        warn!(name = %reference.name, error = %err, "Enrichment failed");
                        self.stats.enrich_failures += 1;
                        BrowserEvent::EnrichFailed {
                            name: reference.name,
                            reason: err.to_string(),
                        }
                    }
                }
            }
        }
    }

    fn accept_page(&mut self, page: PageLoad) -> BrowserEvent {
        let PageLoad {
            references,
            next,
            total,
        } = page;
        self.cursor = next;
        if total.is_some() {
            self.total = total;
        }
        self.stats.pages_loaded += 1;
        let count = references.len();
        for reference in references {
            self.spawn_enrichment(reference);
        }
        info!(
            references = count,
            exhausted = self.cursor.is_exhausted(),
            "Enrichment fan-out started"
        );
        BrowserEvent::PageLoaded {
            references: count,
            exhausted: self.cursor.is_exhausted(),
        }
    }

    fn spawn_enrichment(&mut self, reference: PageReference) {
        self.pending_records += 1;
        let source = Arc::clone(&self.source);
        let lookup = Arc::clone(&self.lookup);
        let aborted = reference.clone();
        spawn_reported(
            self.tx.clone(),
            async move {
                let result = enrich(source.as_ref(), lookup.as_ref(), &reference).await;
                Completion::Record { reference, result }
            },
            move |err| Completion::Record {
                result: Err(EnrichError::Interrupted {
                    name: aborted.name.clone(),
                    reason: err.to_string(),
                }),
                reference: aborted,
            },
        );
    }

    /// Waits for the next completion from any in-flight task. Pends forever
    /// while nothing is in flight, so callers select on it alongside their
    /// own inputs.
    pub async fn recv_completion(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }

    /// Receives and applies the next completion, or returns `None` once no
    /// request is in flight.
    pub async fn next_event(&mut self) -> Option<BrowserEvent> {
        if self.is_idle() {
            return None;
        }
        let completion = self.rx.recv().await?;
        Some(self.apply(completion))
    }

    /// Applies completions until every in-flight request has reported.
    pub async fn settle(&mut self) -> Vec<BrowserEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        events
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.store.set_query(query);
    }

    pub fn view(&self) -> Vec<&CatalogEntry> {
        self.store.view()
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_exhausted()
    }

    pub fn pending_records(&self) -> usize {
        self.pending_records
    }

    pub fn is_idle(&self) -> bool {
        !self.loading && self.pending_records == 0
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn stats(&self) -> BrowserStats {
        self.stats
    }
}

/// Runs `work` on its own task and forwards its completion. A panicked or
/// cancelled task still reports, through `on_abort`, so every spawn is
/// matched by exactly one completion.
fn spawn_reported<F, A>(tx: UnboundedSender<Completion>, work: F, on_abort: A)
where
    F: Future<Output = Completion> + Send + 'static,
    A: FnOnce(JoinError) -> Completion + Send + 'static,
{
    tokio::spawn(async move {
        let completion = match tokio::spawn(work).await {
            Ok(completion) => completion,
            Err(err) => on_abort(err),
        };
        let _ = tx.send(completion);
    });
}

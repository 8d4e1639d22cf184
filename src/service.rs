use crate::browser::{BrowserStats, CatalogBrowser, Trigger};
use crate::data::CatalogEntry;
use crate::source::CatalogSource;
use crate::translate::TranslationLookup;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

const COMMAND_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("catalog task has stopped")]
    Closed,
}

/// Point-in-time copy of the browser state, safe to hand to other tasks.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub query: String,
    pub loading: bool,
    pub exhausted: bool,
    pub total: Option<u64>,
    pub loaded: usize,
    pub pending: usize,
    pub stats: BrowserStats,
    pub entries: Vec<CatalogEntry>,
}

impl<S, L> From<&CatalogBrowser<S, L>> for Snapshot
where
    S: CatalogSource,
    L: TranslationLookup + 'static,
{
    fn from(browser: &CatalogBrowser<S, L>) -> Self {
        Self {
            query: browser.store().query().as_str().to_string(),
            loading: browser.is_loading(),
            exhausted: browser.is_exhausted(),
            total: browser.total(),
            loaded: browser.store().len(),
            pending: browser.pending_records(),
            stats: browser.stats(),
            entries: browser.view().into_iter().cloned().collect(),
        }
    }
}

enum Command {
    LoadMore(oneshot::Sender<Trigger>),
    SetQuery(String, oneshot::Sender<Snapshot>),
    Snapshot(oneshot::Sender<Snapshot>),
    WaitIdle(oneshot::Sender<Snapshot>),
}

enum Wake {
    Command(Option<Command>),
    Completion(crate::browser::Completion),
}

/// Cheap, cloneable access to a browser running on its own task.
#[derive(Clone)]
pub struct BrowserHandle {
    commands: mpsc::Sender<Command>,
}

impl BrowserHandle {
    pub async fn load_more(&self) -> Result<Trigger, ServiceError> {
        self.request(Command::LoadMore).await
    }

    pub async fn set_query(&self, query: impl Into<String>) -> Result<Snapshot, ServiceError> {
        let query = query.into();
        self.request(|reply| Command::SetQuery(query, reply)).await
    }

    pub async fn snapshot(&self) -> Result<Snapshot, ServiceError> {
        self.request(Command::Snapshot).await
    }

    /// Resolves once no listing or detail request is in flight.
    pub async fn wait_idle(&self) -> Result<Snapshot, ServiceError> {
        self.request(Command::WaitIdle).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| ServiceError::Closed)?;
        response.await.map_err(|_| ServiceError::Closed)
    }
}

/// Moves the browser onto its own task, which becomes the single writer of
/// the store. The first page load starts immediately.
pub fn spawn<S, L>(browser: CatalogBrowser<S, L>) -> BrowserHandle
where
    S: CatalogSource,
    L: TranslationLookup + 'static,
{
    let (commands, inbox) = mpsc::channel(COMMAND_BUFFER);
    tokio::spawn(run(browser, inbox));
    BrowserHandle { commands }
}

async fn run<S, L>(mut browser: CatalogBrowser<S, L>, mut inbox: mpsc::Receiver<Command>)
where
    S: CatalogSource,
    L: TranslationLookup + 'static,
{
    let mut idle_waiters: Vec<oneshot::Sender<Snapshot>> = Vec::new();
    browser.trigger_next_page();
    info!("Catalog task started");
    loop {
        let wake = tokio::select! {
            command = inbox.recv() => Wake::Command(command),
            Some(completion) = browser.recv_completion() => Wake::Completion(completion),
        };
        match wake {
            Wake::Command(None) => break,
            Wake::Command(Some(command)) => match command {
                Command::LoadMore(reply) => {
                    let trigger = browser.trigger_next_page();
                    debug!(?trigger, "Load more requested");
                    let _ = reply.send(trigger);
                }
                Command::SetQuery(query, reply) => {
                    browser.set_query(query);
                    let _ = reply.send(Snapshot::from(&browser));
                }
                Command::Snapshot(reply) => {
                    let _ = reply.send(Snapshot::from(&browser));
                }
                Command::WaitIdle(reply) => idle_waiters.push(reply),
            },
            Wake::Completion(completion) => {
                browser.apply(completion);
            }
        }
        if browser.is_idle() && !idle_waiters.is_empty() {
            let snapshot = Snapshot::from(&browser);
            for waiter in idle_waiters.drain(..) {
                let _ = waiter.send(snapshot.clone());
            }
        }
    }
    info!("Catalog task stopped");
}

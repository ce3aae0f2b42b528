//! Reactive search over the app list.
//!
//! [SearchPipeline] owns two inputs: the search term, updated on every keystroke, and a refresh
//! trigger. Terms reach the filter only after [SEARCH_DEBOUNCE] of silence. Every refresh replaces
//! the build in flight. The output is the filtered list grouped by day, or `None` while nothing
//! was loaded or after a build failed.

pub mod debounce;
pub mod grouping;
pub mod term_store;

use std::{future, sync::Arc, time::Duration};

use debounce::Debouncer;
use grouping::{present, GroupedApps};
use term_store::SearchTermStore;
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        watch,
    },
    task::JoinHandle,
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    listing::{builder::UsageListBuilder, AppInfo, BuildError},
    utils::clock::Clock,
};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(400);

/// Result of the latest build. `None` until a build succeeds.
pub type SharedApps = Option<Arc<Vec<AppInfo>>>;

/// What observers of the pipeline see. `None` means the list isn't available.
pub type SharedGroups = Option<Arc<GroupedApps>>;

type BuildTask = (CancellationToken, JoinHandle<Result<Vec<AppInfo>, BuildError>>);

pub struct SearchPipeline {
    search_term: watch::Sender<String>,
    refresh: mpsc::Sender<()>,
    results: watch::Receiver<SharedGroups>,
    store: Arc<dyn SearchTermStore>,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SearchPipeline {
    /// Starts the pipeline tasks on the current tokio runtime. The initial term is restored from
    /// `store`.
    pub fn start(
        builder: UsageListBuilder,
        store: Arc<dyn SearchTermStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let initial_term = store
            .load()
            .inspect_err(|e| warn!("Failed to restore search term {e:?}"))
            .ok()
            .flatten()
            .unwrap_or_default();
        debug!("Starting search pipeline with term {initial_term:?}");

        let (search_term, terms) = watch::channel(initial_term);
        // A single buffered trigger is enough, a queued refresh already rebuilds everything.
        let (refresh, triggers) = mpsc::channel(1);
        let (apps_sender, apps) = watch::channel::<SharedApps>(None);
        let (results_sender, results) = watch::channel::<SharedGroups>(None);
        let shutdown = CancellationToken::new();

        let tasks = vec![
            tokio::spawn(run_builds(builder, triggers, apps_sender, shutdown.clone())),
            tokio::spawn(run_filter(
                terms,
                apps,
                results_sender,
                clock,
                shutdown.clone(),
            )),
        ];

        Self {
            search_term,
            refresh,
            results,
            store,
            shutdown,
            tasks,
        }
    }

    pub fn search_term(&self) -> watch::Receiver<String> {
        self.search_term.subscribe()
    }

    pub fn current_search_term(&self) -> String {
        self.search_term.borrow().clone()
    }

    pub fn results(&self) -> watch::Receiver<SharedGroups> {
        self.results.clone()
    }

    /// Updates the term right away and saves it. Filtering catches up after the debounce.
    pub fn set_search_term(&self, value: impl Into<String>) {
        let value = value.into();
        self.search_term.send_replace(value.clone());
        if let Err(e) = self.store.save(&value) {
            warn!("Failed to save search term {e:?}");
        }
    }

    /// Requests a new build. A build in flight is cancelled and its result dropped.
    pub fn trigger_refresh(&self) {
        match self.refresh.try_send(()) {
            Ok(()) => debug!("Refresh requested"),
            Err(TrySendError::Full(())) => debug!("Refresh already pending"),
            Err(TrySendError::Closed(())) => warn!("Refresh requested after shutdown"),
        }
    }

    /// Stops the pipeline and waits for its tasks.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Search pipeline task failed {e:?}");
            }
        }
    }
}

/// Executes builds with switch-to-latest semantics. Only the build started by the most recent
/// trigger may publish.
async fn run_builds(
    builder: UsageListBuilder,
    mut triggers: mpsc::Receiver<()>,
    apps: watch::Sender<SharedApps>,
    shutdown: CancellationToken,
) {
    let mut in_flight: Option<BuildTask> = None;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            trigger = triggers.recv() => {
                let Some(()) = trigger else { break };
                if let Some((cancel, handle)) = in_flight.take() {
                    debug!("Superseding build in flight");
                    cancel.cancel();
                    handle.abort();
                }
                let cancel = shutdown.child_token();
                let builder = builder.clone();
                let token = cancel.clone();
                in_flight = Some((cancel, tokio::spawn(async move { builder.build(token).await })));
            }
            result = wait_build(&mut in_flight) => {
                in_flight = None;
                publish_build(&apps, result);
            }
        }
    }

    if let Some((cancel, handle)) = in_flight {
        cancel.cancel();
        handle.abort();
    }
}

async fn wait_build(in_flight: &mut Option<BuildTask>) -> Result<Vec<AppInfo>, BuildError> {
    match in_flight {
        Some((_, handle)) => handle.await?,
        None => future::pending().await,
    }
}

fn publish_build(apps: &watch::Sender<SharedApps>, result: Result<Vec<AppInfo>, BuildError>) {
    match result {
        Ok(list) => {
            info!("Publishing {} apps", list.len());
            apps.send_replace(Some(Arc::new(list)));
        }
        Err(BuildError::Cancelled) => debug!("Build was cancelled"),
        Err(e) => {
            error!("Failed to build app list {e:?}");
            apps.send_replace(None);
        }
    }
}

/// Combines the debounced term with the latest app list.
async fn run_filter(
    mut terms: watch::Receiver<String>,
    mut apps: watch::Receiver<SharedApps>,
    results: watch::Sender<SharedGroups>,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
) {
    let mut debouncer = Debouncer::new(SEARCH_DEBOUNCE);
    debouncer.push(terms.borrow_and_update().clone(), clock.instant());
    let mut settled_term: Option<String> = None;

    loop {
        let deadline = debouncer.deadline();
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = terms.changed() => {
                if changed.is_err() {
                    break;
                }
                let term = terms.borrow_and_update().clone();
                debouncer.push(term, clock.instant());
            }
            _ = sleep_until(clock.as_ref(), deadline) => {
                if let Some(term) = debouncer.release(clock.instant()) {
                    debug!("Search term settled on {term:?}");
                    settled_term = Some(term);
                    let current = apps.borrow_and_update().clone();
                    publish_results(&results, settled_term.as_deref(), &current);
                }
            }
            changed = apps.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = apps.borrow_and_update().clone();
                publish_results(&results, settled_term.as_deref(), &current);
            }
        }
    }
}

async fn sleep_until(clock: &dyn Clock, deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => clock.sleep_until(deadline).await,
        None => future::pending().await,
    }
}

fn publish_results(results: &watch::Sender<SharedGroups>, term: Option<&str>, apps: &SharedApps) {
    let grouped = match (term, apps) {
        (Some(term), Some(apps)) => Some(present(apps, term)),
        _ => None,
    };
    debug!(
        "Publishing {} day groups",
        grouped.as_ref().map_or(0, |v| v.len())
    );
    results.send_replace(grouped);
}

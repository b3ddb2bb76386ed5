//! Independent repeating fetches feeding front ends through a broadcast channel.
//!
//! The status, resource and chart tasks are not coordinated with each other. Subscribers apply
//! events in arrival order.

use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use serde_json::Value;
use shared::{
    domain::{Parameter, RunState, Sample},
    protocol::{ResourceKind, StatusSnapshot},
};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tokio_stream::{wrappers::IntervalStream, StreamExt};
use tracing::{debug, info, warn};

use crate::{collections::CollectionSet, resources::ResourceList, ClientSettings, CometApi};

const EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub enum PollEvent {
    Status(StatusSnapshot),
    Params(Vec<Parameter>),
    /// First failed status poll after a success (or at startup).
    ConnectionLost(String),
    ConnectionRestored,
    Resource {
        kind: ResourceKind,
        payload: Value,
    },
    CollectionChunk {
        collection: String,
        offset: usize,
        samples: Vec<Sample>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub status_interval: Duration,
    /// `None` disables the resource task.
    pub resource_interval: Option<Duration>,
    /// `None` disables the chart task.
    pub chart_interval: Option<Duration>,
}

impl PollerConfig {
    pub fn status_only(status_interval: Duration) -> Self {
        Self {
            status_interval,
            resource_interval: None,
            chart_interval: None,
        }
    }
}

impl From<&ClientSettings> for PollerConfig {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            status_interval: settings.status_interval(),
            resource_interval: Some(settings.resource_interval()),
            chart_interval: Some(settings.chart_interval()),
        }
    }
}

/// Owns the polling tasks; dropping it stops them.
pub struct Poller {
    events: broadcast::Sender<PollEvent>,
    /// Created with the channel so nothing sent before the first `subscribe` is lost.
    first_subscriber: Option<broadcast::Receiver<PollEvent>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Poller {
    /// Spawns the polling tasks on the current tokio runtime.
    pub fn spawn(api: Arc<dyn CometApi>, config: PollerConfig) -> Self {
        let (events, first_subscriber) = broadcast::channel(EVENT_CAPACITY);
        let (names_tx, names_rx) = watch::channel(Vec::<String>::new());

        let mut tasks = vec![tokio::spawn(run_status_loop(
            Arc::clone(&api),
            config.status_interval,
            events.clone(),
        ))];
        if let Some(period) = config.resource_interval {
            tasks.push(tokio::spawn(run_resource_loop(
                Arc::clone(&api),
                period,
                events.clone(),
                names_tx,
            )));
        }
        if let Some(period) = config.chart_interval {
            tasks.push(tokio::spawn(run_chart_loop(
                Arc::clone(&api),
                period,
                events.clone(),
                names_rx,
            )));
        }
        info!(
            status_ms = config.status_interval.as_millis() as u64,
            tasks = tasks.len(),
            "poller started"
        );
        Self {
            events,
            first_subscriber: Some(first_subscriber),
            tasks,
        }
    }

    /// The first subscriber sees every event since [`Self::spawn`]; later ones start from now.
    pub fn subscribe(&mut self) -> broadcast::Receiver<PollEvent> {
        self.first_subscriber
            .take()
            .unwrap_or_else(|| self.events.subscribe())
    }

    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn ticks(period: Duration) -> IntervalStream {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    IntervalStream::new(ticker)
}

async fn run_status_loop(
    api: Arc<dyn CometApi>,
    period: Duration,
    events: broadcast::Sender<PollEvent>,
) {
    let mut connected: Option<bool> = None;
    let mut params_loaded = false;
    let mut ticks = ticks(period);

    while ticks.next().await.is_some() {
        let state = match api.status().await {
            Ok(snapshot) => {
                if connected == Some(false) {
                    info!("backend connection restored");
                    let _ = events.send(PollEvent::ConnectionRestored);
                }
                connected = Some(true);
                let state = snapshot.state.clone();
                let _ = events.send(PollEvent::Status(snapshot));
                state
            }
            Err(err) => {
                if connected != Some(false) {
                    warn!(error = %err, "status poll failed; backend unreachable");
                    let _ = events.send(PollEvent::ConnectionLost(err.to_string()));
                }
                connected = Some(false);
                continue;
            }
        };

        // Parameters are left alone while halted so edits in progress are not overwritten.
        if params_loaded && state == RunState::Halted {
            continue;
        }
        match api.params().await {
            Ok(params) => {
                params_loaded = true;
                let _ = events.send(PollEvent::Params(params));
            }
            Err(err) => debug!(error = %err, "parameter refresh failed"),
        }
    }
}

async fn run_resource_loop(
    api: Arc<dyn CometApi>,
    period: Duration,
    events: broadcast::Sender<PollEvent>,
    collection_names: watch::Sender<Vec<String>>,
) {
    let mut ticks = ticks(period);
    while ticks.next().await.is_some() {
        let results = join_all(ResourceKind::ALL.into_iter().map(|kind| {
            let api = Arc::clone(&api);
            async move { (kind, api.resource(kind).await) }
        }))
        .await;

        for (kind, result) in results {
            match result {
                Ok(payload) => {
                    if kind == ResourceKind::Collections {
                        let names = ResourceList::from_value(&payload).names();
                        collection_names.send_if_modified(|current| {
                            if *current == names {
                                return false;
                            }
                            *current = names;
                            true
                        });
                    }
                    let _ = events.send(PollEvent::Resource { kind, payload });
                }
                Err(err) => debug!(resource = kind.envelope_key(), error = %err, "resource fetch failed"),
            }
        }
    }
}

async fn run_chart_loop(
    api: Arc<dyn CometApi>,
    period: Duration,
    events: broadcast::Sender<PollEvent>,
    collection_names: watch::Receiver<Vec<String>>,
) {
    // Only offsets matter here; keep a single record per series.
    let mut offsets = CollectionSet::new(Some(1));
    let mut ticks = ticks(period);
    while ticks.next().await.is_some() {
        offsets.sync_names(&collection_names.borrow());
        for (collection, offset) in offsets.pending_requests() {
            match api.collection_data(&collection, offset).await {
                Ok(samples) => {
                    if samples.is_empty() {
                        continue;
                    }
                    if let Some(series) = offsets.get_mut(&collection) {
                        series.append_chunk(offset, samples.clone());
                    }
                    let _ = events.send(PollEvent::CollectionChunk {
                        collection,
                        offset,
                        samples,
                    });
                }
                Err(err) => debug!(collection = %collection, error = %err, "collection fetch failed"),
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/poller_tests.rs"]
mod tests;

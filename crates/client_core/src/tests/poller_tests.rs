use super::*;
use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use serde_json::json;
use shared::protocol::ControlCommand;
use tokio::{
    sync::{broadcast::error::RecvError, Mutex},
    time::timeout,
};

use crate::{ClientError, ClientResult};

const TICK: Duration = Duration::from_millis(10);

/// Scripted backend. Status labels are consumed in order and the last one repeats; `None` fails.
struct ScriptedApi {
    statuses: Mutex<VecDeque<Option<&'static str>>>,
    last_status: Mutex<Option<&'static str>>,
    params_calls: AtomicUsize,
    failing_resource: Option<ResourceKind>,
    records_available: usize,
}

impl ScriptedApi {
    fn new(statuses: &[Option<&'static str>]) -> Self {
        Self {
            statuses: Mutex::new(statuses.iter().copied().collect()),
            last_status: Mutex::new(Some("halted")),
            params_calls: AtomicUsize::new(0),
            failing_resource: None,
            records_available: 0,
        }
    }

    fn unavailable(path: &str) -> ClientError {
        ClientError::HttpStatus {
            path: path.to_string(),
            status: 503,
        }
    }
}

#[async_trait]
impl CometApi for ScriptedApi {
    async fn status(&self) -> ClientResult<StatusSnapshot> {
        let next = self.statuses.lock().await.pop_front();
        let mut last = self.last_status.lock().await;
        if let Some(next) = next {
            *last = next;
        }
        match *last {
            Some(label) => Ok(StatusSnapshot {
                state: RunState::from_label(label),
                active_jobs: Vec::new(),
            }),
            None => Err(Self::unavailable("/api/status")),
        }
    }

    async fn params(&self) -> ClientResult<Vec<Parameter>> {
        self.params_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn send_command(&self, _command: &ControlCommand) -> ClientResult<()> {
        Ok(())
    }

    async fn resource(&self, kind: ResourceKind) -> ClientResult<Value> {
        if self.failing_resource == Some(kind) {
            return Err(Self::unavailable(&kind.path()));
        }
        Ok(match kind {
            ResourceKind::Collections => json!(["climate"]),
            ResourceKind::Devices => json!(["smu", "lcr"]),
            _ => json!([]),
        })
    }

    async fn collection_data(&self, collection: &str, offset: usize) -> ClientResult<Vec<Sample>> {
        assert_eq!(collection, "climate");
        Ok((offset..self.records_available.min(offset + 2))
            .map(|i| Sample {
                timestamp: i as f64,
                values: vec![21.5],
            })
            .collect())
    }
}

async fn next_event(rx: &mut broadcast::Receiver<PollEvent>) -> PollEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event before timeout")
        .expect("event")
}

fn is_status(event: &PollEvent) -> bool {
    matches!(event, PollEvent::Status(_))
}

#[tokio::test]
async fn outage_is_reported_once_and_recovery_resumes_status() {
    let api = Arc::new(ScriptedApi::new(&[
        Some("running"),
        None,
        None,
        None,
        Some("paused"),
    ]));
    let mut poller = Poller::spawn(api, PollerConfig::status_only(TICK));
    let mut rx = poller.subscribe();

    let mut lost = 0;
    let mut states = Vec::new();
    loop {
        match next_event(&mut rx).await {
            PollEvent::Status(snapshot) => states.push(snapshot.state),
            PollEvent::ConnectionLost(message) => {
                assert!(message.contains("503"), "{message}");
                lost += 1;
            }
            PollEvent::ConnectionRestored => break,
            _ => {}
        }
    }
    assert_eq!(lost, 1);
    assert_eq!(states, vec![RunState::Running]);
    loop {
        if let PollEvent::Status(snapshot) = next_event(&mut rx).await {
            assert_eq!(snapshot.state, RunState::Paused);
            break;
        }
    }
}

#[tokio::test]
async fn unreachable_at_startup_reports_connection_lost() {
    let api = Arc::new(ScriptedApi::new(&[None]));
    let mut poller = Poller::spawn(api, PollerConfig::status_only(TICK));
    let mut rx = poller.subscribe();
    assert!(matches!(
        next_event(&mut rx).await,
        PollEvent::ConnectionLost(_)
    ));
}

#[tokio::test]
async fn halted_backend_loads_params_only_once() {
    let api = Arc::new(ScriptedApi::new(&[Some("halted")]));
    let mut poller = Poller::spawn(api.clone(), PollerConfig::status_only(TICK));
    let mut rx = poller.subscribe();

    let mut statuses = 0;
    let mut params = 0;
    while statuses < 4 {
        let event = next_event(&mut rx).await;
        if is_status(&event) {
            statuses += 1;
        } else if matches!(event, PollEvent::Params(_)) {
            params += 1;
        }
    }
    assert_eq!(params, 1);
    assert_eq!(api.params_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn late_first_subscriber_still_gets_initial_params() {
    let api = Arc::new(ScriptedApi::new(&[Some("halted")]));
    let mut poller = Poller::spawn(api.clone(), PollerConfig::status_only(TICK));
    while api.params_calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(TICK).await;
    }
    let mut rx = poller.subscribe();

    assert!(is_status(&next_event(&mut rx).await));
    assert!(matches!(next_event(&mut rx).await, PollEvent::Params(_)));
}

#[tokio::test]
async fn running_backend_refreshes_params_every_poll() {
    let api = Arc::new(ScriptedApi::new(&[Some("running")]));
    let mut poller = Poller::spawn(api, PollerConfig::status_only(TICK));
    let mut rx = poller.subscribe();

    let mut statuses = 0;
    let mut params = 0;
    while statuses < 3 {
        let event = next_event(&mut rx).await;
        if is_status(&event) {
            statuses += 1;
        } else if matches!(event, PollEvent::Params(_)) {
            params += 1;
        }
    }
    assert_eq!(params, 2);
}

#[tokio::test]
async fn resource_failures_are_skipped_and_collections_feed_charts() {
    let api = Arc::new(ScriptedApi {
        failing_resource: Some(ResourceKind::Services),
        records_available: 3,
        ..ScriptedApi::new(&[Some("halted")])
    });
    let mut poller = Poller::spawn(
        api,
        PollerConfig {
            status_interval: Duration::from_secs(60),
            resource_interval: Some(TICK),
            chart_interval: Some(TICK),
        },
    );
    let mut rx = poller.subscribe();

    let mut kinds = Vec::new();
    let mut chunks = Vec::new();
    while chunks.len() < 2 {
        match next_event(&mut rx).await {
            PollEvent::Resource { kind, .. } => kinds.push(kind),
            PollEvent::CollectionChunk {
                collection,
                offset,
                samples,
            } => {
                assert_eq!(collection, "climate");
                chunks.push((offset, samples.len()));
            }
            _ => {}
        }
    }
    assert_eq!(chunks, vec![(0, 2), (2, 1)]);
    assert!(kinds.contains(&ResourceKind::Devices));
    assert!(kinds.contains(&ResourceKind::Settings));
    assert!(!kinds.contains(&ResourceKind::Services));
}

#[tokio::test]
async fn dropping_the_poller_closes_the_stream() {
    let api = Arc::new(ScriptedApi::new(&[Some("halted")]));
    let mut poller = Poller::spawn(api, PollerConfig::status_only(TICK));
    let mut rx = poller.subscribe();
    next_event(&mut rx).await;
    drop(poller);

    let closed = timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Err(RecvError::Closed) => break,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok());
}

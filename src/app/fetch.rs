use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use log::{debug, warn};

use crate::topology::{LiveDeviceReport, PathOutcome, PathRequest, RawTopology, TopologyProvider};

/// Identity of one build of a view's model. Replies carry the generation
/// that was current when their request was issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub(in crate::app) struct Generation(u64);

impl Generation {
    pub(in crate::app) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) enum FetchRequest {
    Topology,
    LiveStatus,
    Path(PathRequest),
}

impl FetchRequest {
    pub(in crate::app) fn kind(&self) -> FetchKind {
        match self {
            Self::Topology => FetchKind::Topology,
            Self::LiveStatus => FetchKind::LiveStatus,
            Self::Path(_) => FetchKind::Path,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum FetchKind {
    Topology,
    LiveStatus,
    Path,
}

#[derive(Debug)]
pub(in crate::app) enum FetchPayload {
    Topology(RawTopology),
    LiveStatus(LiveDeviceReport),
    Path {
        request: PathRequest,
        outcome: PathOutcome,
    },
}

#[derive(Debug)]
pub(in crate::app) struct FetchReply {
    pub(in crate::app) generation: Generation,
    pub(in crate::app) kind: FetchKind,
    pub(in crate::app) result: Result<FetchPayload, String>,
}

fn run_request(provider: &dyn TopologyProvider, request: FetchRequest) -> Result<FetchPayload, String> {
    let result = match request {
        FetchRequest::Topology => provider.fetch_topology().map(FetchPayload::Topology),
        FetchRequest::LiveStatus => provider.fetch_live_status().map(FetchPayload::LiveStatus),
        FetchRequest::Path(request) => provider.shortest_path(&request).map(|response| {
            FetchPayload::Path {
                request,
                outcome: response.into_outcome(),
            }
        }),
    };
    result.map_err(|error| format!("{error:#}"))
}

/// Fire-and-forget background requests against a provider.
///
/// Workers report over a channel that the owning view drains once per frame
/// with [`FetchQueue::drain`]; nothing here ever blocks the frame loop.
pub(in crate::app) struct FetchQueue {
    provider: Arc<dyn TopologyProvider>,
    tx: Sender<FetchReply>,
    rx: Receiver<FetchReply>,
    in_flight: Vec<FetchKind>,
}

impl FetchQueue {
    pub(in crate::app) fn new(provider: Arc<dyn TopologyProvider>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            provider,
            tx,
            rx,
            in_flight: Vec::new(),
        }
    }

    pub(in crate::app) fn is_in_flight(&self, kind: FetchKind) -> bool {
        self.in_flight.contains(&kind)
    }

    pub(in crate::app) fn spawn(&mut self, generation: Generation, request: FetchRequest) {
        let kind = request.kind();
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        self.in_flight.push(kind);
        debug!("issuing {kind:?} fetch for generation {generation:?}");

        thread::spawn(move || {
            let result = run_request(provider.as_ref(), request);
            // The receiving view may already be gone; that is fine.
            let _ = tx.send(FetchReply {
                generation,
                kind,
                result,
            });
        });
    }

    pub(in crate::app) fn drain(&mut self) -> Vec<FetchReply> {
        let mut replies = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(reply) => {
                    if let Some(slot) = self.in_flight.iter().position(|kind| *kind == reply.kind) {
                        self.in_flight.swap_remove(slot);
                    }
                    replies.push(reply);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("fetch channel disconnected");
                    break;
                }
            }
        }
        replies
    }

    #[cfg(test)]
    pub(in crate::app) fn sender(&self) -> Sender<FetchReply> {
        self.tx.clone()
    }
}

#[cfg(test)]
pub(in crate::app) mod testing {
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::{Result, anyhow};

    use crate::topology::{
        LiveDeviceReport, PathRequest, PathResponse, RawTopology, TopologyProvider, parse_topology,
    };

    /// In-memory provider with an optional artificial delay.
    pub(in crate::app) struct StaticProvider {
        pub(in crate::app) topology: Mutex<Option<String>>,
        pub(in crate::app) path: Option<Vec<String>>,
        pub(in crate::app) delay: Duration,
    }

    impl StaticProvider {
        pub(in crate::app) fn new(topology: &str) -> Self {
            Self {
                topology: Mutex::new(Some(topology.to_owned())),
                path: None,
                delay: Duration::ZERO,
            }
        }
    }

    impl TopologyProvider for StaticProvider {
        fn fetch_topology(&self) -> Result<RawTopology> {
            std::thread::sleep(self.delay);
            let topology = self.topology.lock().map_err(|_| anyhow!("poisoned"))?;
            match topology.as_deref() {
                Some(raw) => parse_topology(raw),
                None => Err(anyhow!("backend unavailable")),
            }
        }

        fn fetch_live_status(&self) -> Result<LiveDeviceReport> {
            Ok(LiveDeviceReport::offline())
        }

        fn shortest_path(&self, _request: &PathRequest) -> Result<PathResponse> {
            std::thread::sleep(self.delay);
            Ok(PathResponse {
                path: self.path.clone().unwrap_or_default(),
                total_cost: 20.0,
                error: None,
            })
        }

        fn describe(&self) -> String {
            "static".to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::testing::StaticProvider;
    use super::*;

    fn wait_for_replies(queue: &mut FetchQueue, count: usize) -> Vec<FetchReply> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut replies = Vec::new();
        while replies.len() < count {
            assert!(Instant::now() < deadline, "timed out waiting for fetch replies");
            replies.extend(queue.drain());
            thread::sleep(Duration::from_millis(5));
        }
        replies
    }

    #[test]
    fn replies_carry_the_issuing_generation() {
        let provider = Arc::new(StaticProvider::new(r#"{"nodes":[{"id":"PE1"}]}"#));
        let mut queue = FetchQueue::new(provider);
        let generation = Generation::default().next();

        queue.spawn(generation, FetchRequest::Topology);
        assert!(queue.is_in_flight(FetchKind::Topology));

        let replies = wait_for_replies(&mut queue, 1);
        assert_eq!(replies[0].generation, generation);
        assert!(matches!(
            &replies[0].result,
            Ok(FetchPayload::Topology(topology)) if topology.nodes.len() == 1
        ));
        assert!(!queue.is_in_flight(FetchKind::Topology));
    }

    #[test]
    fn provider_errors_travel_as_messages() {
        let provider = StaticProvider::new("{}");
        *provider.topology.lock().unwrap() = None;
        let mut queue = FetchQueue::new(Arc::new(provider));

        queue.spawn(Generation::default(), FetchRequest::Topology);
        let replies = wait_for_replies(&mut queue, 1);

        assert_eq!(replies[0].result.as_ref().unwrap_err(), "backend unavailable");
    }

    #[test]
    fn drain_never_blocks() {
        let mut provider = StaticProvider::new("{}");
        provider.delay = Duration::from_millis(200);
        let mut queue = FetchQueue::new(Arc::new(provider));
        queue.spawn(Generation::default(), FetchRequest::Topology);

        let started = Instant::now();
        assert!(queue.drain().is_empty());
        assert!(started.elapsed() < Duration::from_millis(100));
    }
}

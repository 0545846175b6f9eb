//! Load driver: one request per tick, graceful drain on cancellation
//!
//! The driver moves through three phases:
//!
//! - **Running**: every tick draws a fixture, bumps the call counter and
//!   spawns the request. The tick loop never waits on a response.
//! - **Draining**: entered once the cancellation token fires. No new calls
//!   are issued; the driver waits until every issued call has completed.
//! - **Done**: calls == responses.
//!
//! Counters live in a single `watch` channel and are only mutated through
//! `send_modify`, so observers always see `responses <= calls`.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::stats::{ResponseStats, RunReport};
use super::transport::Transport;
use crate::config::EndpointConfig;
use crate::fixture::FixtureSet;

/// Calls issued and responses (success or error) received
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounters {
    pub calls: u64,
    pub responses: u64,
}

impl CallCounters {
    /// Calls still waiting for a response
    pub fn outstanding(&self) -> u64 {
        self.calls.saturating_sub(self.responses)
    }

    pub fn is_settled(&self) -> bool {
        self.calls == self.responses
    }
}

/// Driver lifecycle phase, ordered by progression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum DriverPhase {
    #[default]
    Running,
    Draining,
    Done,
}

/// Run-scoped state shared between the tick loop and in-flight requests
#[derive(Debug, Clone, Default)]
pub struct DriverState {
    pub phase: DriverPhase,
    pub counters: CallCounters,
    pub stats: ResponseStats,
}

/// Read-only view of a running driver
#[derive(Debug, Clone)]
pub struct DriverObserver {
    rx: watch::Receiver<DriverState>,
}

impl DriverObserver {
    pub fn counters(&self) -> CallCounters {
        self.rx.borrow().counters
    }

    pub fn phase(&self) -> DriverPhase {
        self.rx.borrow().phase
    }

    /// Wait until the driver reaches `phase` (or a later one)
    pub async fn wait_for_phase(&mut self, phase: DriverPhase) {
        let _ = self.rx.wait_for(|s| s.phase >= phase).await;
    }
}

/// Issues one GET per interval against the configured endpoint
pub struct LoadDriver {
    transport: Arc<dyn Transport>,
    hostname: String,
    path: String,
    interval: Duration,
    rng: StdRng,
    state: Arc<watch::Sender<DriverState>>,
}

impl LoadDriver {
    pub fn new(transport: Arc<dyn Transport>, endpoint: &EndpointConfig, interval: Duration) -> Self {
        let (state, _) = watch::channel(DriverState::default());
        Self {
            transport,
            hostname: endpoint.hostname.clone(),
            path: endpoint.path.clone(),
            // tokio intervals panic on a zero period
            interval: interval.max(Duration::from_millis(1)),
            rng: StdRng::from_os_rng(),
            state: Arc::new(state),
        }
    }

    /// Use a fixed seed for fixture draws
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn observer(&self) -> DriverObserver {
        DriverObserver {
            rx: self.state.subscribe(),
        }
    }

    /// Call until `cancel` fires, then wait for every in-flight call
    pub async fn run(mut self, fixtures: &FixtureSet, cancel: CancellationToken) -> RunReport {
        let started = Instant::now();
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if fixtures.is_empty() {
            warn!("No fixtures to call with, skipping straight to drain");
        } else {
            info!(
                "Calling http://{}{} every {:?} with {} fixtures (press 's' to stop)",
                self.hostname,
                self.path,
                self.interval,
                fixtures.len()
            );
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = cancel.cancelled() => {}
                }
                if cancel.is_cancelled() {
                    break;
                }
                self.issue(fixtures);
            }
        }

        self.set_phase(DriverPhase::Draining);
        let counters = self.state.borrow().counters;
        info!(
            "Stopped calling, waiting for {} responses. Calls: {} Responses: {}",
            counters.outstanding(),
            counters.calls,
            counters.responses
        );

        let mut settled = self.state.subscribe();
        loop {
            tokio::select! {
                _ = async { let _ = settled.wait_for(|s| s.counters.is_settled()).await; } => break,
                _ = ticker.tick() => {
                    let counters = self.state.borrow().counters;
                    debug!(
                        "waiting for responses. Calls: {} Responses: {}",
                        counters.calls, counters.responses
                    );
                }
            }
        }

        self.set_phase(DriverPhase::Done);
        let state = self.state.borrow().clone();
        info!("Done with calls after {:?}", started.elapsed());

        RunReport {
            counters: state.counters,
            stats: state.stats,
            elapsed: started.elapsed(),
        }
    }

    fn set_phase(&self, phase: DriverPhase) {
        self.state.send_modify(|s| s.phase = phase);
    }

    /// Draw a fixture and fire one request for it
    fn issue(&mut self, fixtures: &FixtureSet) {
        let Some(fixture) = fixtures.choose(&mut self.rng) else {
            return;
        };
        let path = format!("{}{}", self.path, fixture.encode());

        let mut counters = CallCounters::default();
        self.state.send_modify(|s| {
            s.counters.calls += 1;
            counters = s.counters;
        });
        counter!("tagload_calls_total").increment(1);
        debug!(
            "tags {} Calls: {} Responses: {}",
            fixture, counters.calls, counters.responses
        );

        let call = counters.calls;
        let transport = Arc::clone(&self.transport);
        let state = Arc::clone(&self.state);
        let host = self.hostname.clone();
        tokio::spawn(async move {
            let issued = Instant::now();
            let outcome = transport.get_path(&host, &path).await;
            let latency = issued.elapsed();

            state.send_modify(|s| {
                s.counters.responses += 1;
                s.stats.record(&outcome, latency);
            });
            counter!("tagload_responses_total").increment(1);

            match outcome {
                Ok(status) => debug!(
                    "call {} server responded with {} after {:?}",
                    call, status, latency
                ),
                Err(e) => {
                    counter!("tagload_transport_errors_total").increment(1);
                    debug!("call {} server error: {}", call, e);
                }
            }
        });
    }
}

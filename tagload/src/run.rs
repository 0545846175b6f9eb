//! Run orchestration
//!
//! connect → fetch base tags → sample fixtures → release the database →
//! either print a Blitz command or drive load until stopped.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::blitz;
use crate::config::{Config, EndpointConfig, TagsConfig};
use crate::driver::{HttpTransport, LoadDriver, RunReport, Transport, TransportError};
use crate::fixture::{FixtureSampler, FixtureSet, SampleError};
use crate::hierarchy::{DataSourceError, HierarchyStore, MySqlHierarchyStore};

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error("Failed to build fixtures: {0}")]
    Sample(#[from] SampleError),

    #[error("No tags of type '{0}' found")]
    NoBaseTags(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// What to do with the sampled fixtures
pub enum Mode {
    /// Print a Blitz command
    Command,
    /// Call the endpoint every `interval` until cancelled
    Load {
        interval: Duration,
        transport: Arc<dyn Transport>,
    },
}

impl Mode {
    /// Load mode over a real HTTP client
    pub fn http(interval: Duration, endpoint: &EndpointConfig) -> Result<Self, RunError> {
        let transport = HttpTransport::new(endpoint.request_timeout())?;
        Ok(Mode::Load {
            interval,
            transport: Arc::new(transport),
        })
    }

    pub fn is_load(&self) -> bool {
        matches!(self, Mode::Load { .. })
    }
}

/// Result of a completed run
#[derive(Debug)]
pub enum Outcome {
    Command(String),
    Load(RunReport),
}

/// RNG for a run: fixed when a seed is given, OS-seeded otherwise
pub fn run_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Full run against the configured MySQL database
pub async fn run(
    config: &Config,
    mode: Mode,
    seed: Option<u64>,
    cancel: CancellationToken,
) -> Result<Outcome, RunError> {
    let mut rng = run_rng(seed);

    let store = MySqlHierarchyStore::connect(&config.database).await?;
    let sampled = prepare_fixtures(&store, &config.tags, &mut rng).await;
    // The database is only needed for sampling
    store.close().await;
    let fixtures = sampled?;

    Ok(dispatch(config, &fixtures, mode, rng, cancel).await)
}

/// Fetch base tags of the configured type and sample fixtures from them
pub async fn prepare_fixtures<S>(
    store: &S,
    tags: &TagsConfig,
    rng: &mut StdRng,
) -> Result<FixtureSet, RunError>
where
    S: HierarchyStore + ?Sized,
{
    let base_tags = store.nodes_of_category(&tags.category).await?;
    if base_tags.is_empty() {
        return Err(RunError::NoBaseTags(tags.category.clone()));
    }
    info!(
        "Got {} tags of type '{}', building {} fixtures",
        base_tags.len(),
        tags.category,
        tags.iterations
    );

    let fixtures = FixtureSampler::new(store)
        .sample(&base_tags, tags.iterations, rng)
        .await?;
    Ok(fixtures)
}

/// Hand the fixture set to the formatter or the load driver
pub async fn dispatch(
    config: &Config,
    fixtures: &FixtureSet,
    mode: Mode,
    rng: StdRng,
    cancel: CancellationToken,
) -> Outcome {
    match mode {
        Mode::Command => Outcome::Command(blitz::format_command(
            fixtures,
            &config.blitz,
            &config.endpoint,
        )),
        Mode::Load {
            interval,
            transport,
        } => {
            let driver = LoadDriver::new(transport, &config.endpoint, interval).with_rng(rng);
            Outcome::Load(driver.run(fixtures, cancel).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Fixture;
    use crate::hierarchy::MemoryHierarchyStore;
    use crate::test_utils::{FailingStore, ScriptedTransport, chain_store};

    fn config(iterations: usize) -> Config {
        Config::from_json(&format!(
            r#"{{
                "tags": {{ "iterations": {iterations}, "type": "topic" }},
                "tag_db": {{}},
                "endpoint": {{ "hostname": "h", "path": "/p?tags=" }},
                "blitz": {{ "min": 1, "max": 10, "duration": 5, "timeout": 3 }}
            }}"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_prepare_fixtures_builds_configured_count() {
        let store = chain_store("topic", 1, 4);
        let config = config(7);

        let fixtures = prepare_fixtures(&store, &config.tags, &mut run_rng(Some(1)))
            .await
            .unwrap();
        assert_eq!(fixtures.len(), 7);
        // Every chain ends at the uncategorised root
        assert!(fixtures.iter().all(|f| *f.ids().last().unwrap() == 1));
    }

    #[tokio::test]
    async fn test_prepare_fixtures_without_base_tags() {
        let store = MemoryHierarchyStore::new();
        let err = prepare_fixtures(&store, &config(3).tags, &mut run_rng(Some(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::NoBaseTags(ref c) if c == "topic"));
    }

    #[tokio::test]
    async fn test_prepare_fixtures_propagates_store_failure() {
        let store = FailingStore::after(0);
        let err = prepare_fixtures(&store, &config(3).tags, &mut run_rng(None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RunError::DataSource(DataSourceError::Query(_))
        ));
    }

    #[test]
    fn test_http_mode_is_load() {
        let config = config(1);
        let mode = Mode::http(Duration::from_millis(100), &config.endpoint).unwrap();
        assert!(mode.is_load());
        assert!(!Mode::Command.is_load());
    }

    #[tokio::test]
    async fn test_dispatch_command_mode() {
        let config = config(2);
        let fixtures: FixtureSet = vec![Fixture::from_chain(vec![1, 2]).unwrap()].into();

        let outcome = dispatch(
            &config,
            &fixtures,
            Mode::Command,
            run_rng(Some(1)),
            CancellationToken::new(),
        )
        .await;

        match outcome {
            Outcome::Command(command) => {
                assert!(command.contains("list[1%2C2]"));
                assert!(command.ends_with("'http://h/p?tags=#{tags}'"));
            }
            Outcome::Load(_) => panic!("expected command output"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_load_mode_drains() {
        let config = config(3);
        let store = chain_store("topic", 1, 3);
        let mut rng = run_rng(Some(4));
        let fixtures = prepare_fixtures(&store, &config.tags, &mut rng).await.unwrap();
        let transport = Arc::new(
            ScriptedTransport::ok(200).with_delays(vec![Duration::from_millis(30)]),
        );
        let cancel = CancellationToken::new();

        let stopper = {
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(95)).await;
                cancel.cancel();
            }
        };
        let mode = Mode::Load {
            interval: Duration::from_millis(20),
            transport: transport.clone(),
        };

        let (outcome, ()) = tokio::join!(dispatch(&config, &fixtures, mode, rng, cancel), stopper);

        let Outcome::Load(report) = outcome else {
            panic!("expected load report");
        };
        // Ticks at 0, 20, 40, 60, 80ms
        assert_eq!(report.counters.calls, 5);
        assert!(report.counters.is_settled());
        assert_eq!(transport.paths().len(), 5);
        assert!(transport.paths().iter().all(|p| p.starts_with("/p?tags=")));
    }
}

//! Main Bridge coordination.
//!
//! [`Bridge`] owns the reconciliation engine and the operational counters.
//! [`run`] performs the startup sequence: build the engine, run the boot
//! sweep to completion, and only then bind the push endpoint. No notification
//! can therefore be applied while the sweep is still writing outputs.

use crate::config::Config;
use crate::driver::LogDriver;
use crate::error::{BridgeError, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::http::build_router;
use crate::pull::PullSynchronizer;
use lamp_core::{OutputDriver, PullReport, PushOutcome, Reconciler};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Operational metrics for monitoring bridge activity.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct BridgeMetrics {
    /// Notifications answered with 200.
    pub notifications_accepted: AtomicU64,
    /// Notifications answered with 400.
    pub notifications_rejected: AtomicU64,
    /// Output level changes from either channel.
    pub transitions_total: AtomicU64,
    /// Boot items whose state was applied.
    pub pull_applied: AtomicU64,
    /// Boot items skipped for any reason.
    pub pull_skipped: AtomicU64,
    /// Boot items lost to fetch failures.
    pub fetch_failures: AtomicU64,
}

/// How the boot sweep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootSync {
    /// Sweep ran to completion.
    Complete,
    /// Sweep was skipped on request.
    Skipped,
}

/// The running bridge.
pub struct Bridge {
    config: Config,
    engine: Reconciler,
    metrics: BridgeMetrics,
    boot: OnceLock<(BootSync, PullReport)>,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Create a bridge. All configured outputs are driven low.
    ///
    /// # Errors
    ///
    /// Fails if the actuator table has duplicate identifiers or pins.
    pub fn new(config: Config, driver: Box<dyn OutputDriver>) -> Result<Self> {
        let registry = config
            .registry()
            .map_err(crate::config::ConfigError::from)?;
        Ok(Self {
            config,
            engine: Reconciler::new(registry, driver),
            metrics: BridgeMetrics::default(),
            boot: OnceLock::new(),
        })
    }

    /// Get the bridge configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the reconciliation engine.
    pub fn engine(&self) -> &Reconciler {
        &self.engine
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &BridgeMetrics {
        &self.metrics
    }

    /// Result of the boot sweep, once it has finished or been skipped.
    pub fn boot(&self) -> Option<&(BootSync, PullReport)> {
        self.boot.get()
    }

    /// Run the boot sweep over every configured actuator.
    pub async fn boot_sync(&self, fetcher: Arc<dyn Fetcher>) -> PullReport {
        let platform = &self.config.platform;
        let synchronizer =
            PullSynchronizer::new(fetcher, platform.pace(), platform.identity_policy);
        let report = synchronizer
            .synchronize_all(&self.engine, &self.config.pull_targets())
            .await;

        let m = &self.metrics;
        m.pull_applied
            .fetch_add(report.applied() as u64, Ordering::Relaxed);
        m.pull_skipped
            .fetch_add(report.skipped() as u64, Ordering::Relaxed);
        m.fetch_failures
            .fetch_add(report.transport_failures() as u64, Ordering::Relaxed);
        m.transitions_total
            .fetch_add(report.changed() as u64, Ordering::Relaxed);

        let _ = self.boot.set((BootSync::Complete, report.clone()));
        report
    }

    /// Mark the boot sweep as skipped.
    pub fn skip_boot_sync(&self) {
        tracing::warn!("Boot sync skipped; outputs stay low until notified");
        let _ = self.boot.set((BootSync::Skipped, PullReport::new()));
    }

    /// Handle one pushed notification and count the outcome.
    pub fn handle_notification(&self, body: &[u8]) -> PushOutcome {
        let outcome = self.engine.handle_notification(body);
        let m = &self.metrics;
        if outcome.is_accepted() {
            m.notifications_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            m.notifications_rejected.fetch_add(1, Ordering::Relaxed);
        }
        if outcome.changed_output() {
            m.transitions_total.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }
}

/// Startup options taken from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Bind immediately without fetching initial states.
    pub skip_boot_sync: bool,
}

/// Build the bridge, run the boot sweep, then serve until Ctrl-C.
pub async fn run(config: Config, options: RunOptions) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.platform.origin, config.platform.request_timeout())?;
    let bridge = Arc::new(Bridge::new(config, Box::new(LogDriver::new()))?);
    let fetcher: Option<Arc<dyn Fetcher>> = if options.skip_boot_sync {
        None
    } else {
        Some(Arc::new(fetcher))
    };

    serve(bridge, fetcher, shutdown_signal()).await
}

/// Run the boot sweep with `fetcher`, then bind and serve until `shutdown`
/// resolves. With no fetcher the sweep is skipped.
///
/// The listener is bound only after the sweep has returned.
pub async fn serve<F>(
    bridge: Arc<Bridge>,
    fetcher: Option<Arc<dyn Fetcher>>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    match fetcher {
        Some(fetcher) => {
            bridge.boot_sync(fetcher).await;
        }
        None => bridge.skip_boot_sync(),
    }

    let address = bridge.config().server.bind_address.clone();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|source| BridgeError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::info!(
        "Listening for notifications on http://{}{}",
        listener.local_addr()?,
        bridge.config().server.notify_path
    );

    axum::serve(listener, build_router(bridge))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ActuatorConfig;
    use crate::fetch::MockFetcher;
    use lamp_core::RecordingDriver;
    use lamp_types::{ContentResponse, ExternalId, Notification};
    use std::time::Duration;

    /// Two actuators {"L026" -> 13, "L001" -> 14} with no pacing.
    pub(crate) fn test_config() -> Config {
        let mut config = Config::default();
        config.platform.pace_ms = 0;
        config.actuators = vec![
            ActuatorConfig {
                id: ExternalId::new("L026").unwrap(),
                pin: 13,
                url: "http://cse/L026/la".into(),
            },
            ActuatorConfig {
                id: ExternalId::new("L001").unwrap(),
                pin: 14,
                url: "http://cse/L001/la".into(),
            },
        ];
        config
    }

    /// Bridge over `config` with a cleared recording driver.
    pub(crate) fn test_bridge_from(config: Config) -> (Arc<Bridge>, RecordingDriver) {
        let driver = RecordingDriver::new();
        let bridge = Bridge::new(config, Box::new(driver.clone())).unwrap();
        driver.clear();
        (Arc::new(bridge), driver)
    }

    pub(crate) fn test_bridge() -> (Arc<Bridge>, RecordingDriver) {
        test_bridge_from(test_config())
    }

    #[test]
    fn duplicate_pins_rejected() {
        let mut config = Config::default();
        config.actuators[1].pin = config.actuators[0].pin;
        let err = Bridge::new(config, Box::new(RecordingDriver::new())).unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[tokio::test]
    async fn boot_sync_records_report_and_metrics() {
        let (bridge, _driver) = test_bridge();
        let fetcher = MockFetcher::new();
        fetcher.respond(
            "http://cse/L026/la",
            ContentResponse::new("L026ON").to_bytes().unwrap(),
        );

        let report = bridge.boot_sync(Arc::new(fetcher)).await;

        assert_eq!(report.applied(), 1);
        let m = bridge.metrics();
        assert_eq!(m.pull_applied.load(Ordering::Relaxed), 1);
        assert_eq!(m.pull_skipped.load(Ordering::Relaxed), 1);
        assert_eq!(m.fetch_failures.load(Ordering::Relaxed), 1);
        assert_eq!(m.transitions_total.load(Ordering::Relaxed), 1);
        assert_eq!(bridge.boot().map(|(s, _)| *s), Some(BootSync::Complete));
    }

    #[test]
    fn skip_boot_sync_is_recorded() {
        let (bridge, driver) = test_bridge();
        bridge.skip_boot_sync();
        assert_eq!(bridge.boot().map(|(s, _)| *s), Some(BootSync::Skipped));
        assert!(driver.writes().is_empty());
    }

    #[test]
    fn notifications_are_counted() {
        let (bridge, _driver) = test_bridge();
        bridge.handle_notification(&Notification::new("L001ON").to_bytes().unwrap());
        bridge.handle_notification(&Notification::new("L001ON").to_bytes().unwrap());
        bridge.handle_notification(b"{bad json");

        let m = bridge.metrics();
        assert_eq!(m.notifications_accepted.load(Ordering::Relaxed), 2);
        assert_eq!(m.notifications_rejected.load(Ordering::Relaxed), 1);
        assert_eq!(m.transitions_total.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn pull_then_push_for_same_actuator() {
        let (bridge, driver) = test_bridge();
        let fetcher = MockFetcher::new();
        fetcher.respond(
            "http://cse/L001/la",
            ContentResponse::new("L001ON").to_bytes().unwrap(),
        );
        bridge.boot_sync(Arc::new(fetcher)).await;

        // A later push wins over the boot value
        bridge.handle_notification(&Notification::new("L001 OFF").to_bytes().unwrap());

        let l001 = ExternalId::new("L001").unwrap();
        assert_eq!(bridge.engine().state_of(&l001), Some(false));
        assert_eq!(
            driver.writes_to(lamp_types::ActuatorHandle::new(14)),
            vec![true, false]
        );
    }

    fn free_local_addr() -> std::net::SocketAddr {
        let socket = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        socket.local_addr().unwrap()
    }

    #[tokio::test]
    async fn listener_binds_only_after_boot_sweep() {
        let addr = free_local_addr();
        let mut config = test_config();
        config.server.bind_address = addr.to_string();
        let (bridge, _driver) = test_bridge_from(config);

        let fetcher = MockFetcher::new();
        fetcher.set_latency(Duration::from_millis(300));
        fetcher.respond(
            "http://cse/L026/la",
            ContentResponse::new("L026ON").to_bytes().unwrap(),
        );

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(serve(
            bridge.clone(),
            Some(Arc::new(fetcher.clone())),
            async move {
                let _ = stop_rx.await;
            },
        ));

        // First fetch still in flight
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(bridge.boot().is_none());
        assert!(tokio::net::TcpStream::connect(addr).await.is_err());

        let mut connected = false;
        for _ in 0..200 {
            if tokio::net::TcpStream::connect(addr).await.is_ok() {
                connected = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(connected);
        assert_eq!(fetcher.requested().len(), 2);
        assert_eq!(bridge.boot().map(|(s, _)| *s), Some(BootSync::Complete));

        let response = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap()
            .post(format!("http://{addr}/"))
            .body(Notification::new("L001ON").to_bytes().unwrap())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(
            bridge.engine().state_of(&ExternalId::new("L001").unwrap()),
            Some(true)
        );

        stop_tx.send(()).unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn serve_without_fetcher_skips_sweep() {
        let mut config = test_config();
        config.server.bind_address = "127.0.0.1:0".into();
        let (bridge, driver) = test_bridge_from(config);

        serve(bridge.clone(), None, async {}).await.unwrap();

        assert_eq!(bridge.boot().map(|(s, _)| *s), Some(BootSync::Skipped));
        assert!(driver.writes().is_empty());
    }
}

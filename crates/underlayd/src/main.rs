// # underlayd - Underlying DNS Daemon
//
// Thin host around `underlay-core`. It is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Creating the process-wide monitor state
// 4. Starting the monitor on the platform adapter
// 5. Reporting changes until shutdown
//
// A monitor that fails to start is not fatal: the daemon logs a warning
// and keeps serving the empty state.
//
// ## Configuration
//
// - `UNDERLAY_POLL_INTERVAL_SECS`: Polling fallback interval (default 5)
// - `UNDERLAY_ADDRESS_SCOPE`: Default-route family, `v4` or `v6` (default v4)
// - `UNDERLAY_OVERRIDE_DNS`: DNS server reported instead of the discovered one
// - `UNDERLAY_EVENT_CAPACITY`: Monitor event channel capacity (default 64)
// - `UNDERLAY_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `UNDERLAY_RUN_MODE`: `watch` (default) or `probe`
//
// `probe` runs the initial cycle, prints the state snapshot as JSON and
// exits.
//
// ## Example
//
// ```bash
// export UNDERLAY_POLL_INTERVAL_SECS=10
// export UNDERLAY_LOG_LEVEL=debug
//
// underlayd
// ```

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use underlay_core::traits::AddressScope;
use underlay_core::{MonitorConfig, MonitorEvent, MonitorState, UnderlyingDns, UnderlyingDnsMonitor};

#[cfg(feature = "windows")]
use std::sync::Arc;
#[cfg(feature = "windows")]
use underlay_core::traits::{ChangeSink, InterfaceChange};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Upper bound on how long stopping the monitor may take
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum UnderlayExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<UnderlayExitCode> for ExitCode {
    fn from(code: UnderlayExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// What the daemon does once the monitor is up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    /// Report changes until a shutdown signal arrives
    Watch,
    /// Print one snapshot and exit
    Probe,
}

/// Application configuration
struct Config {
    poll_interval_secs: u64,
    address_scope: AddressScope,
    override_dns: Option<String>,
    event_capacity: usize,
    log_level: String,
    run_mode: RunMode,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let poll_interval_secs = match env::var("UNDERLAY_POLL_INTERVAL_SECS") {
            Ok(s) => s
                .trim()
                .parse()
                .with_context(|| format!("UNDERLAY_POLL_INTERVAL_SECS is not a number: '{s}'"))?,
            Err(_) => 5,
        };

        let address_scope = match env::var("UNDERLAY_ADDRESS_SCOPE") {
            Ok(s) => s.parse().context("UNDERLAY_ADDRESS_SCOPE")?,
            Err(_) => AddressScope::default(),
        };

        let event_capacity = match env::var("UNDERLAY_EVENT_CAPACITY") {
            Ok(s) => s
                .trim()
                .parse()
                .with_context(|| format!("UNDERLAY_EVENT_CAPACITY is not a number: '{s}'"))?,
            Err(_) => 64,
        };

        let run_mode = match env::var("UNDERLAY_RUN_MODE")
            .unwrap_or_else(|_| "watch".to_string())
            .to_lowercase()
            .as_str()
        {
            "watch" => RunMode::Watch,
            "probe" => RunMode::Probe,
            other => anyhow::bail!(
                "UNDERLAY_RUN_MODE '{}' is not supported. Supported modes: watch, probe",
                other
            ),
        };

        Ok(Self {
            poll_interval_secs,
            address_scope,
            override_dns: env::var("UNDERLAY_OVERRIDE_DNS")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            event_capacity,
            log_level: env::var("UNDERLAY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            run_mode,
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !(1..=3600).contains(&self.poll_interval_secs) {
            anyhow::bail!(
                "UNDERLAY_POLL_INTERVAL_SECS must be between 1 and 3600 seconds. Got: {}",
                self.poll_interval_secs
            );
        }

        if self.event_capacity == 0 {
            anyhow::bail!("UNDERLAY_EVENT_CAPACITY must be at least 1");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "UNDERLAY_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.monitor_config()
            .validate()
            .context("UNDERLAY_OVERRIDE_DNS")?;

        Ok(())
    }

    fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval_secs: self.poll_interval_secs,
            address_scope: self.address_scope,
            event_channel_capacity: self.event_capacity,
            override_dns: self.override_dns.clone(),
        }
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return UnderlayExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return UnderlayExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return UnderlayExitCode::ConfigError.into();
    }

    info!("Starting underlayd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return UnderlayExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            UnderlayExitCode::RuntimeError
        } else {
            UnderlayExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let monitor_config = config.monitor_config();
    let state = MonitorState::new();

    let (monitor, events) = match start_monitor(state.clone(), monitor_config.clone()) {
        Ok((monitor, events)) => (Some(monitor), Some(events)),
        Err(e) => {
            warn!("Underlying DNS monitor unavailable, serving empty value: {}", e);
            (None, None)
        }
    };

    let handle = match &monitor {
        Some(monitor) => monitor.handle(),
        None => state.handle(monitor_config.override_dns.clone()),
    };

    let run_result = match config.run_mode {
        RunMode::Probe => print_snapshot(&handle),
        RunMode::Watch => watch(events, &handle).await,
    };

    if let Some(monitor) = monitor {
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, monitor.shutdown()).await {
            Ok(result) => result.context("monitor shutdown")?,
            Err(_) => anyhow::bail!("Monitor shutdown timeout after {:?}", SHUTDOWN_TIMEOUT),
        }
    }

    run_result
}

#[cfg(feature = "windows")]
fn start_monitor(
    state: MonitorState,
    config: MonitorConfig,
) -> underlay_core::Result<(UnderlyingDnsMonitor, mpsc::Receiver<MonitorEvent>)> {
    let (source, resolver, store) = underlay_windows::platform(config.address_scope)?;
    UnderlyingDnsMonitor::start_with_sinks(
        source,
        resolver,
        store,
        state,
        config,
        vec![Arc::new(InterfaceChangeLog) as Arc<dyn ChangeSink>],
    )
}

/// Logs raw default-interface changes, independently of DNS detection
#[cfg(feature = "windows")]
struct InterfaceChangeLog;

#[cfg(feature = "windows")]
impl ChangeSink for InterfaceChangeLog {
    fn on_change(&self, change: &InterfaceChange) {
        match change.index {
            Some(index) => debug!("Default interface is now index {}", index),
            None => debug!("No default interface"),
        }
    }
}

#[cfg(not(feature = "windows"))]
fn start_monitor(
    _state: MonitorState,
    _config: MonitorConfig,
) -> underlay_core::Result<(UnderlyingDnsMonitor, mpsc::Receiver<MonitorEvent>)> {
    Err(underlay_core::Error::initialization(
        "underlayd was built without a platform adapter",
    ))
}

/// Print the current state as JSON on stdout
fn print_snapshot(handle: &UnderlyingDns) -> Result<()> {
    let json = serde_json::to_string_pretty(&handle.snapshot())?;
    println!("{json}");
    Ok(())
}

/// Log monitor events until a shutdown signal arrives
async fn watch(mut events: Option<mpsc::Receiver<MonitorEvent>>, handle: &UnderlyingDns) -> Result<()> {
    info!("Underlying DNS: '{}'", handle.effective());

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                info!("Received shutdown signal: {}", signal?);
                return Ok(());
            }

            event = next_event(&mut events) => match event {
                Some(MonitorEvent::DnsChanged(change)) => {
                    info!(
                        "Underlying DNS now '{}' (was '{}', effective '{}')",
                        change.current,
                        change.previous,
                        handle.effective()
                    );
                }
                Some(other) => debug!("Monitor event: {:?}", other),
                None => {
                    debug!("Monitor event channel closed");
                    events = None;
                }
            }
        }
    }
}

/// Next event, or never if there is no event stream
async fn next_event(events: &mut Option<mpsc::Receiver<MonitorEvent>>) -> Option<MonitorEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("CTRL-C")
}

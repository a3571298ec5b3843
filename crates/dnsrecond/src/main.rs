// # dnsrecond - DNS Reconciliation Daemon
//
// This daemon is a THIN integration layer. Selection, execution and caching
// live in dnsrecon-core; the daemon only wires them together.
//
// The dnsrecond daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing tracing and the runtime
// 3. Registering providers
// 4. Periodically computing the zone and domain selection of the account
//    and inspecting the state of every selected zone
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### DNS Provider
// - `DNSRECON_PROVIDER_TYPE`: Provider type (cloudflare, inmemory)
// - `DNSRECON_PROVIDER_API_TOKEN`: API token (cloudflare)
// - `DNSRECON_PROVIDER_BASE_URL`: API base URL override (cloudflare, optional)
// - `DNSRECON_INMEMORY_ZONES`: Comma-separated zone domains (inmemory)
//
// ### Selection
// - `DNSRECON_ZONES_INCLUDE` / `DNSRECON_ZONES_EXCLUDE`: Comma-separated zone ids
// - `DNSRECON_DOMAINS_INCLUDE` / `DNSRECON_DOMAINS_EXCLUDE`: Comma-separated domains
//
// ### Runtime
// - `DNSRECON_INTERVAL_SECS`: Seconds between reconciliation passes (default 300)
// - `DNSRECON_MODE`: `dry-run` disables mutating provider calls
// - `DNSRECON_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DNSRECON_PROVIDER_TYPE=cloudflare
// export DNSRECON_PROVIDER_API_TOKEN=your_token
// export DNSRECON_DOMAINS_INCLUDE=example.com
// export DNSRECON_MODE=dry-run
//
// dnsrecond
// ```

use anyhow::Result;
use dnsrecon_core::config::{InMemoryZoneConfig, SelectionFilter};
use dnsrecon_core::metrics::{CountingMetrics, Metrics};
use dnsrecon_core::traits::DnsHandler;
use dnsrecon_core::{
    calc_zone_and_domain_selection, HandlerConfig, ProviderConfig, ProviderRegistry, ProviderSpec,
};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    provider_type: String,
    provider_api_token: Option<String>,
    provider_base_url: Option<String>,
    inmemory_zones: Vec<String>,
    zones_include: Vec<String>,
    zones_exclude: Vec<String>,
    domains_include: Vec<String>,
    domains_exclude: Vec<String>,
    interval_secs: u64,
    dry_run: bool,
    log_level: String,
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let interval_secs = match lookup("DNSRECON_INTERVAL_SECS") {
            Some(s) => s
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("DNSRECON_INTERVAL_SECS must be a number of seconds. Got: {}", s))?,
            None => DEFAULT_INTERVAL_SECS,
        };

        Ok(Self {
            provider_type: lookup("DNSRECON_PROVIDER_TYPE").unwrap_or_else(|| "cloudflare".to_string()),
            provider_api_token: lookup("DNSRECON_PROVIDER_API_TOKEN"),
            provider_base_url: lookup("DNSRECON_PROVIDER_BASE_URL").filter(|s| !s.is_empty()),
            inmemory_zones: split_list(lookup("DNSRECON_INMEMORY_ZONES")),
            zones_include: split_list(lookup("DNSRECON_ZONES_INCLUDE")),
            zones_exclude: split_list(lookup("DNSRECON_ZONES_EXCLUDE")),
            domains_include: split_list(lookup("DNSRECON_DOMAINS_INCLUDE")),
            domains_exclude: split_list(lookup("DNSRECON_DOMAINS_EXCLUDE")),
            interval_secs,
            dry_run: lookup("DNSRECON_MODE").is_some_and(|m| m.eq_ignore_ascii_case("dry-run")),
            log_level: lookup("DNSRECON_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Provider specific settings are validated again by the provider
    /// registry when the handler is created.
    fn validate(&self, registry: &ProviderRegistry) -> Result<()> {
        if !registry.has_provider(&self.provider_type) {
            anyhow::bail!(
                "DNSRECON_PROVIDER_TYPE '{}' is not supported. Supported providers: {}",
                self.provider_type,
                registry.list_providers().join(", ")
            );
        }

        if self.provider_type == "cloudflare" && self.provider_api_token.as_deref().is_none_or(str::is_empty) {
            anyhow::bail!(
                "DNSRECON_PROVIDER_API_TOKEN is required. \
                Set it via: export DNSRECON_PROVIDER_API_TOKEN=your_token"
            );
        }

        if let Some(ref url) = self.provider_base_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            anyhow::bail!("DNSRECON_PROVIDER_BASE_URL must use HTTP or HTTPS scheme. Got: {}", url);
        }

        if !(10..=86400).contains(&self.interval_secs) {
            anyhow::bail!(
                "DNSRECON_INTERVAL_SECS must be between 10 and 86400 seconds. Got: {}",
                self.interval_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DNSRECON_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn handler_config(&self) -> Result<HandlerConfig> {
        let provider = match self.provider_type.as_str() {
            "cloudflare" => ProviderConfig::Cloudflare {
                api_token: self.provider_api_token.clone().unwrap_or_default(),
                base_url: self.provider_base_url.clone(),
            },
            "inmemory" => ProviderConfig::InMemory {
                zones: self
                    .inmemory_zones
                    .iter()
                    .map(|domain| InMemoryZoneConfig {
                        id: domain.clone(),
                        domain: domain.clone(),
                        forwarded_domains: Vec::new(),
                    })
                    .collect(),
            },
            other => anyhow::bail!("No configuration mapping for provider type '{}'", other),
        };
        Ok(HandlerConfig::new(provider).with_dry_run(self.dry_run))
    }

    fn provider_spec(&self) -> ProviderSpec {
        let mut spec = ProviderSpec::new(self.provider_type.clone());
        if !self.zones_include.is_empty() || !self.zones_exclude.is_empty() {
            spec = spec.with_zones(SelectionFilter::new(self.zones_include.clone(), self.zones_exclude.clone()));
        }
        if !self.domains_include.is_empty() || !self.domains_exclude.is_empty() {
            spec = spec.with_domains(SelectionFilter::new(
                self.domains_include.clone(),
                self.domains_exclude.clone(),
            ));
        }
        spec
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn build_registry() -> ProviderRegistry {
    let registry = ProviderRegistry::with_builtin();

    #[cfg(feature = "cloudflare")]
    dnsrecon_provider_cloudflare::register(&registry);

    registry
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    let registry = build_registry();

    if let Err(e) = config.validate(&registry) {
        eprintln!("Configuration validation error: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder().with_max_level(config.log_level()).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting dnsrecond daemon");
    info!("Registered providers: {}", registry.list_providers().join(", "));

    let metrics = Arc::new(CountingMetrics::new());
    let handler = match config
        .handler_config()
        .and_then(|hc| Ok(registry.create_handler(&hc, metrics.clone() as Arc<dyn Metrics>)?))
    {
        Ok(handler) => handler,
        Err(e) => {
            error!("Failed to create {} handler: {}", config.provider_type, e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let code = match run_daemon(&config, handler.as_ref(), &metrics).await {
            Ok(()) => DaemonExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {}", e);
                DaemonExitCode::RuntimeError
            }
        };
        handler.release().await;
        code
    });

    result.into()
}

/// Run reconciliation passes until a shutdown signal arrives
async fn run_daemon(config: &Config, handler: &dyn DnsHandler, metrics: &CountingMetrics) -> Result<()> {
    let spec = config.provider_spec();
    let mut ticker = tokio::time::interval(Duration::from_secs(config.interval_secs));

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    info!(
        "Daemon initialized: provider {}, interval {}s{}",
        config.provider_type,
        config.interval_secs,
        if config.dry_run { ", dry-run" } else { "" }
    );

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                let signal = signal?;
                info!("Received shutdown signal: {}", signal);
                info!("Shutting down daemon");
                return Ok(());
            }
            _ = ticker.tick() => {
                reconcile_once(&spec, handler).await;
                debug!("Provider request counters: {:?}", metrics.snapshot());
            }
        }
    }
}

/// One pass: selection plus zone-state inspection
///
/// Failures are logged and retried in the next pass.
async fn reconcile_once(spec: &ProviderSpec, handler: &dyn DnsHandler) -> usize {
    let zones = match handler.get_zones().await {
        Ok(zones) => zones,
        Err(e) => {
            warn!("Listing zones failed: {}", e);
            return 0;
        }
    };

    let selection = calc_zone_and_domain_selection(spec, &zones);
    for warning in &selection.warnings {
        warn!("Selection: {}", warning);
    }
    if let Some(ref err) = selection.error {
        error!("Selection failed: {}", err);
        return 0;
    }

    info!(
        "Selected {} of {} zone(s), domains included: {:?}, excluded: {:?}",
        selection.zones.len(),
        zones.len(),
        selection.domain_sel.include,
        selection.domain_sel.exclude
    );

    let mut inspected = 0;
    for zone in &selection.zones {
        match handler.get_zone_state(zone).await {
            Ok(state) => {
                inspected += 1;
                info!("Zone {} ({}): {} DNS set(s)", zone.domain, zone.id, state.dns_sets.len());
            }
            Err(e) => warn!("Reading zone {} ({}) failed: {}", zone.domain, zone.id, e),
        }
    }
    inspected
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint =
        signal(SignalKind::interrupt()).map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.provider_type, "cloudflare");
        assert_eq!(cfg.interval_secs, DEFAULT_INTERVAL_SECS);
        assert!(!cfg.dry_run);
        assert_eq!(cfg.log_level(), Level::INFO);
    }

    #[test]
    fn test_cloudflare_requires_token() {
        let cfg = config(&[]).unwrap();
        let err = cfg.validate(&build_registry()).unwrap_err();
        assert!(err.to_string().contains("DNSRECON_PROVIDER_API_TOKEN"));
    }

    #[test]
    fn test_unknown_provider() {
        let cfg = config(&[("DNSRECON_PROVIDER_TYPE", "route53")]).unwrap();
        let err = cfg.validate(&build_registry()).unwrap_err();
        assert!(err.to_string().contains("'route53' is not supported"));
    }

    #[test]
    fn test_invalid_interval() {
        assert!(config(&[("DNSRECON_INTERVAL_SECS", "soon")]).is_err());
        let cfg = config(&[("DNSRECON_PROVIDER_TYPE", "inmemory"), ("DNSRECON_INTERVAL_SECS", "1")]).unwrap();
        assert!(cfg.validate(&build_registry()).is_err());
    }

    #[test]
    fn test_selection_filters() {
        let cfg = config(&[
            ("DNSRECON_PROVIDER_TYPE", "inmemory"),
            ("DNSRECON_DOMAINS_INCLUDE", "a.example, b.example "),
            ("DNSRECON_ZONES_EXCLUDE", "z9"),
            ("DNSRECON_MODE", "dry-run"),
        ])
        .unwrap();
        cfg.validate(&build_registry()).unwrap();
        assert!(cfg.dry_run);

        let spec = cfg.provider_spec();
        assert_eq!(spec.provider_type, "inmemory");
        let domains = spec.domains.unwrap();
        assert_eq!(domains.include, vec!["a.example".to_string(), "b.example".to_string()]);
        assert!(domains.exclude.is_empty());
        assert_eq!(spec.zones.unwrap().exclude, vec!["z9".to_string()]);
    }

    #[tokio::test]
    async fn test_reconcile_once_inspects_selected_zones() {
        let cfg = config(&[
            ("DNSRECON_PROVIDER_TYPE", "inmemory"),
            ("DNSRECON_INMEMORY_ZONES", "a.example,b.example"),
            ("DNSRECON_DOMAINS_INCLUDE", "b.example"),
        ])
        .unwrap();
        let registry = build_registry();
        let handler = registry
            .create_handler(&cfg.handler_config().unwrap(), Arc::new(CountingMetrics::new()))
            .unwrap();

        assert_eq!(reconcile_once(&cfg.provider_spec(), handler.as_ref()).await, 1);
    }

    #[tokio::test]
    async fn test_reconcile_once_without_zones() {
        let cfg = config(&[("DNSRECON_PROVIDER_TYPE", "inmemory")]).unwrap();
        let registry = build_registry();
        let handler = registry
            .create_handler(&cfg.handler_config().unwrap(), Arc::new(CountingMetrics::new()))
            .unwrap();

        assert_eq!(reconcile_once(&cfg.provider_spec(), handler.as_ref()).await, 0);
    }
}

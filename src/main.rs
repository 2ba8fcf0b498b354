//! cors-gateway binary.
//!
//! Loads a config file or a built-in preset, applies command-line overrides
//! and serves until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use cors_gateway::config::loader::load_config;
use cors_gateway::config::presets::{default_tls, TLS_PORT};
use cors_gateway::config::{GatewayConfig, LogFormat, Profile};
use cors_gateway::lifecycle::signals::spawn_signal_handler;
use cors_gateway::lifecycle::{startup, Shutdown, StartupError};
use cors_gateway::observability::init_logging;

#[derive(Debug, Parser)]
#[command(name = "cors-gateway", version, about = "CORS reverse proxy with TLS termination")]
struct Cli {
    /// TOML config file. Takes precedence over --profile.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in preset used when no config file is given.
    #[arg(long, value_enum, default_value_t = Profile::Unified)]
    profile: Profile,

    /// Listener port (positional form).
    #[arg(value_name = "PORT")]
    port_arg: Option<u16>,

    /// Listener port.
    #[arg(short, long, conflicts_with = "port_arg")]
    port: Option<u16>,

    /// Serve HTTPS.
    #[arg(long, conflicts_with = "no_tls")]
    tls: bool,

    /// Serve plain HTTP even on 8443 or when the config has TLS.
    #[arg(long)]
    no_tls: bool,

    /// Certificate chain (PEM).
    #[arg(long)]
    cert: Option<String>,

    /// Private key (PEM).
    #[arg(long)]
    key: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn port(&self) -> Option<u16> {
        self.port.or(self.port_arg)
    }
}

fn resolve_config(cli: &Cli) -> Result<GatewayConfig, StartupError> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => cli.profile.config(),
    };
    Ok(apply_overrides(cli, config))
}

fn apply_overrides(cli: &Cli, mut config: GatewayConfig) -> GatewayConfig {
    if let Some(port) = cli.port() {
        config.listener.bind_address = match config.listener.bind_address.parse::<SocketAddr>() {
            Ok(mut addr) => {
                addr.set_port(port);
                addr.to_string()
            }
            Err(_) => format!("0.0.0.0:{}", port),
        };
    }

    let port = config
        .listener
        .bind_address
        .parse::<SocketAddr>()
        .map(|addr| addr.port())
        .ok();
    let wants_tls = cli.tls || config.listener.tls.is_some() || port == Some(TLS_PORT);

    if cli.no_tls || !wants_tls {
        config.listener.tls = None;
    } else {
        let mut tls = config.listener.tls.take().unwrap_or_else(default_tls);
        if let Some(cert) = &cli.cert {
            tls.cert_path = cert.clone();
        }
        if let Some(key) = &cli.key {
            tls.key_path = key.clone();
        }
        config.listener.tls = Some(tls);
    }

    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    if cli.json_logs {
        config.observability.log_format = LogFormat::Json;
    }
    config
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let config = resolve_config(&cli)?;
    init_logging(
        &config.observability.log_level,
        config.observability.log_format,
    )?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        upstreams = config.upstreams.len(),
        routes = config.routes.len(),
        "cors-gateway starting"
    );

    let shutdown = Shutdown::new();
    let signals = spawn_signal_handler(shutdown.clone());
    let result = startup::run(config, shutdown.subscribe()).await;
    signals.abort();

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Gateway failed");
            eprintln!("cors-gateway: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cors-gateway").chain(args.iter().copied())).unwrap()
    }

    fn resolved(args: &[&str]) -> GatewayConfig {
        let cli = cli(args);
        apply_overrides(&cli, cli.profile.config())
    }

    #[test]
    fn default_is_unified_over_tls_on_8443() {
        let config = resolved(&[]);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8443");
        assert_eq!(config.listener.tls, Some(default_tls()));
    }

    #[test]
    fn marketplace_profile_is_plaintext() {
        let config = resolved(&["--profile", "marketplace"]);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8081");
        assert!(config.listener.tls.is_none());
        assert!(config.marketplace.enabled);
    }

    #[test]
    fn port_8443_turns_tls_on() {
        let config = resolved(&["--profile", "marketplace", "8443"]);
        assert!(config.listener.tls.is_some());
    }

    #[test]
    fn tls_flags_and_material() {
        let config = resolved(&[
            "--profile", "marketplace", "--tls", "--cert", "cert.pem", "--key", "key.pem",
        ]);
        let tls = config.listener.tls.unwrap();
        assert_eq!(tls.cert_path, "cert.pem");
        assert_eq!(tls.key_path, "key.pem");

        let config = resolved(&["--no-tls", "--port", "9000"]);
        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert!(config.listener.tls.is_none());
    }

    #[test]
    fn plaintext_config_file_stays_plaintext() {
        let cli = cli(&[]);
        let file = cors_gateway::config::loader::parse_config(
            "[listener]\nbind_address = \"0.0.0.0:8081\"\n[marketplace]\nenabled = true\n",
        )
        .unwrap();
        let config = apply_overrides(&cli, file);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8081");
        assert!(config.listener.tls.is_none());
    }

    #[test]
    fn logging_overrides() {
        let config = resolved(&["--log-level", "debug", "--json-logs"]);
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn tls_and_no_tls_conflict() {
        assert!(Cli::try_parse_from(["cors-gateway", "--tls", "--no-tls"]).is_err());
    }
}

//! Simple tax configuration server.
//!
//! Serves the VATIN and tax country endpoints under
//! `/plugins/killbill-simple-tax`, resolving tenants from a credentials file.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use simpletax_server::{server, ServerConfig, TenantsFile};
use simpletax_telemetry::{log_tenants_loaded, LogFormat, TelemetryConfig};

#[derive(Parser, Debug)]
#[command(
    name = "simpletax-server",
    about = "Account tax configuration endpoints for the simple tax plugin",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve {
        /// Listen address.
        #[arg(long, env = "SIMPLETAX_LISTEN", default_value = "127.0.0.1:8080")]
        listen: SocketAddr,

        /// TOML file declaring tenant API keys and secrets.
        #[arg(long, env = "SIMPLETAX_TENANTS")]
        tenants: PathBuf,

        /// Log level (overridden by RUST_LOG).
        #[arg(long, env = "SIMPLETAX_LOG_LEVEL", default_value = "info")]
        log_level: String,

        /// Log format: json or pretty.
        #[arg(long, env = "SIMPLETAX_LOG_FORMAT", default_value = "json", value_parser = parse_log_format)]
        log_format: LogFormat,

        /// Maximum request body size in bytes.
        #[arg(long, env = "SIMPLETAX_MAX_BODY_SIZE", default_value_t = simpletax_server::api::DEFAULT_MAX_BODY_SIZE)]
        max_body_size: usize,
    },

    /// Validate a tenants file and exit.
    CheckConfig {
        /// TOML file declaring tenant API keys and secrets.
        #[arg(long, env = "SIMPLETAX_TENANTS")]
        tenants: PathBuf,
    },
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::parse(s).ok_or_else(|| format!("unknown log format '{s}' (expected json or pretty)"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::CheckConfig { tenants } => match TenantsFile::load(&tenants) {
            Ok(file) => {
                println!("{}: {} tenant(s)", tenants.display(), file.tenants.len());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::from(2)
            }
        },

        Command::Serve {
            listen,
            tenants,
            log_level,
            log_format,
            max_body_size,
        } => {
            let telemetry = TelemetryConfig::new()
                .with_service_name("simpletax-server")
                .with_log_level(log_level)
                .with_log_format(log_format);
            if let Err(e) = simpletax_telemetry::init(&telemetry) {
                eprintln!("error: {}", e);
                return ExitCode::from(2);
            }

            let file = match TenantsFile::load(&tenants) {
                Ok(file) => file,
                Err(e) => {
                    tracing::error!(path = %tenants.display(), error = %e, "invalid tenants file");
                    eprintln!("error: {}", e);
                    return ExitCode::from(2);
                }
            };
            log_tenants_loaded!(path = %tenants.display(), count = file.tenants.len(), "tenants loaded");

            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("error: failed to create runtime: {}", e);
                    return ExitCode::from(1);
                }
            };
            rt.block_on(async {
                let config = ServerConfig {
                    listen_addr: listen,
                    tenants: file.into_resolver(),
                    max_body_size,
                };
                match server::run(config).await {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(e) => {
                        tracing::error!(error = %e, "server failed");
                        eprintln!("error: {:#}", e);
                        ExitCode::from(1)
                    }
                }
            })
        }
    }
}

//! AI service entry point.

use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use utoipa::openapi::OpenApi;

use ai_service::api::{create_router, docs::openapi_document};
use ai_service::config::{ConfigSource, EnvConfig, Settings};
use ai_service::metrics;
use ai_service::shell::{NoRoutes, ServiceInfo};
use ai_service::utils::shutdown_signal;

/// AI analysis and prediction service.
#[derive(Parser, Debug)]
#[command(name = "ai-service")]
#[command(about = "AI-powered analysis and prediction service")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve HTTP until SIGINT/SIGTERM (default).
    Serve {
        /// Interface to bind, overrides AI_SERVICE_HOST.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, overrides AI_SERVICE_PORT.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Print the OpenAPI document as JSON.
    Openapi,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Configuration is loaded before logging so AI_SERVICE_LOG_JSON can pick
    // the output format; the error itself is reported once logging is up.
    // Validation waits until the CLI overrides are applied.
    let settings = Settings::load();
    let json = settings.as_ref().map(|s| s.log_json).unwrap_or(false);

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("ai_service=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer()))
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(EnvConfig.load()),
        Some(Command::Openapi) => cmd_openapi(),
        Some(Command::Serve { host, port }) => {
            cmd_serve(settings.context("failed to load configuration")?, host, port).await
        }
        None => cmd_serve(settings.context("failed to load configuration")?, None, None).await,
    }
}

/// Check configuration validity.
fn cmd_check_config(settings: ai_service::Result<Settings>) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("AI SERVICE - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let settings = match settings {
        Ok(s) => {
            println!("OK");
            s
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration check failed"));
        }
    };

    print!("Building router... ");
    match create_router(&settings, &NoRoutes, None) {
        Ok(_) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Router construction failed"));
        }
    }

    let info = ServiceInfo::current();
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Service: {} v{}", info.title, info.version);
    println!("  Listen: {}:{}", settings.host, settings.port);
    println!("  CORS Origins: {}", settings.cors_origins.join(", "));
    println!("  CORS Credentials: {}", settings.cors_allow_credentials);
    println!("  CORS Methods: {}", settings.cors_methods.join(", "));
    println!("  CORS Headers: {}", settings.cors_headers.join(", "));
    println!("  Docs: {}", if settings.enable_docs { "Enabled" } else { "Disabled" });
    println!("  Metrics: {}", if settings.expose_metrics { "Enabled" } else { "Disabled" });
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Print the OpenAPI document.
fn cmd_openapi() -> anyhow::Result<()> {
    let doc: OpenApi = openapi_document(&ServiceInfo::current());
    println!("{}", doc.to_pretty_json()?);
    Ok(())
}

/// Serve the HTTP API.
async fn cmd_serve(
    mut settings: Settings,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        settings.host = host;
    }
    if let Some(port) = port {
        settings.port = port;
    }
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    let info = ServiceInfo::current();
    info!(
        title = info.title,
        version = info.version,
        "{}",
        info.description
    );

    let handle = if settings.expose_metrics {
        let handle = metrics::install_recorder().context("failed to install metrics recorder")?;
        metrics::init_metrics();
        Some(handle)
    } else {
        None
    };

    let router = create_router(&settings, &NoRoutes, handle)?;

    let addr: SocketAddr = settings.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(
        %addr,
        origins = ?settings.cors_origins,
        docs = settings.enable_docs,
        metrics = settings.expose_metrics,
        "HTTP server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

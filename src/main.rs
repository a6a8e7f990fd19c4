use std::io;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api_server::config::{find_config_file, load_config, AppConfig, ConfigWatcher};
use api_server::http::middleware::{RequestLogConfig, RequestLogHandle};
use api_server::lifecycle::{wait_for_signal, Shutdown, DRAIN_TIMEOUT};
use api_server::observability::{global, Format, Logger, LoggerConfig, LoggerLayer, Severity};
use api_server::{fields, log_error, log_fatal, log_info, ApiServer};

#[derive(Parser, Debug)]
#[command(name = "api-server", version, about = "API server with structured request logging")]
struct Args {
    /// Path to api.toml. Searched in ., assets/ and config/ when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum severity (debug, info, warn, error, fatal). Overrides the file.
    #[arg(long)]
    log_level: Option<Severity>,

    /// Emit JSON lines instead of text.
    #[arg(long)]
    json: bool,
}

/// Loggers and middleware config touched by a reload.
#[derive(Clone)]
struct Live {
    logger: Logger,
    server_logger: Logger,
    request_log: RequestLogHandle,
}

impl Live {
    fn apply(&self, config: &AppConfig, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
        let level = match args.log_level {
            Some(level) => level,
            None => config.server.severity()?,
        };
        for logger in [&self.logger, &self.server_logger] {
            logger.set_level(level);
            config.logging.apply(logger);
            if args.json {
                logger.set_format(Format::Json);
            }
        }
        self.request_log.store(RequestLogConfig::from_settings(
            self.server_logger.clone(),
            &config.request_logging,
        ));
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let logger = LoggerConfig::builder().into_logger();
    let _ = global::install(logger.clone());

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,api_server=debug".into()),
        )
        .with(LoggerLayer::new(logger.clone()))
        .init();

    let config_path = args.config.clone().or_else(find_config_file);
    let config = match &config_path {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => log_fatal!(
                logger,
                "Failed to load configuration",
                fields! {
                    "path" => path.display().to_string(),
                    "error" => e.to_string(),
                }
            ),
        },
        None => AppConfig::default(),
    };

    let server_logger = logger.child(fields! {
        "service" => "API",
        "component" => "server",
    });
    let live = Live {
        logger: logger.clone(),
        server_logger: server_logger.clone(),
        request_log: RequestLogHandle::new(RequestLogConfig::new(server_logger.clone())),
    };
    live.apply(&config, &args)?;

    log_info!(
        logger,
        "Configuration loaded",
        fields! {
            "path" => config_path.as_ref().map(|p| p.display().to_string()),
            "address" => config.server.address(),
            "level" => logger.level().as_str(),
            "preset" => config.request_logging.preset,
        }
    );

    // Kept alive for the lifetime of the process.
    let _watcher = match &config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(watcher) => {
                    tokio::spawn(reload_loop(updates, live.clone(), args));
                    Some(watcher)
                }
                Err(e) => {
                    log_error!(
                        logger,
                        "Failed to start config watcher",
                        fields! { "error" => e.to_string() }
                    );
                    None
                }
            }
        }
        None => None,
    };

    let shutdown = Shutdown::new();
    let server = ApiServer::new(config.clone(), server_logger, live.request_log.clone());
    let address = server.address();
    let tls = config.server.tls.clone();
    let shutdown_rx = shutdown.subscribe();

    let mut server_task = tokio::spawn(async move {
        match tls {
            Some(tls) => {
                let addr = tokio::net::lookup_host(&address)
                    .await?
                    .next()
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::AddrNotAvailable,
                            format!("could not resolve {}", address),
                        )
                    })?;
                server.run_tls(addr, &tls, shutdown_rx).await
            }
            None => {
                let listener = TcpListener::bind(&address).await?;
                server.run(listener, shutdown_rx).await
            }
        }
    });

    tokio::select! {
        result = &mut server_task => {
            let error = match result {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(e)) => e.to_string(),
                Err(e) => e.to_string(),
            };
            log_fatal!(logger, "Failed to start server", fields! { "error" => error });
        }
        signal = wait_for_signal() => {
            log_info!(logger, "Shutting down server", fields! { "signal" => signal });
            shutdown.trigger();
        }
    }

    match tokio::time::timeout(DRAIN_TIMEOUT, &mut server_task).await {
        Ok(Ok(Ok(()))) => log_info!(logger, "Server exited"),
        Ok(Ok(Err(e))) => log_error!(
            logger,
            "Server stopped with error",
            fields! { "error" => e.to_string() }
        ),
        Ok(Err(e)) => log_error!(
            logger,
            "Server task failed",
            fields! { "error" => e.to_string() }
        ),
        Err(_) => {
            server_task.abort();
            log_error!(
                logger,
                "Server forced to shutdown",
                fields! { "drain_timeout_secs" => DRAIN_TIMEOUT.as_secs() }
            );
        }
    }

    Ok(())
}

/// Apply each validated configuration the watcher sends. Invalid files
/// never reach this loop, so the previous configuration stays in effect.
async fn reload_loop(mut updates: mpsc::UnboundedReceiver<AppConfig>, live: Live, args: Args) {
    while let Some(config) = updates.recv().await {
        match live.apply(&config, &args) {
            Ok(()) => log_info!(
                live.logger,
                "Configuration reloaded",
                fields! {
                    "level" => live.logger.level().as_str(),
                    "preset" => config.request_logging.preset,
                }
            ),
            Err(e) => log_error!(
                live.logger,
                "Failed to apply reloaded configuration",
                fields! { "error" => e.to_string() }
            ),
        }
    }
}

//! echo-server: an HTTP server that echoes request bodies
//!
//! Every request, on any method and path, receives `200 OK` with a body
//! identical to the request body. The response is sent once the request
//! body has been fully received.
//!
//! Features:
//! - HTTP/1.1 with keep-alive and pipelining
//! - `Content-Length` and `chunked` request bodies
//! - Raw byte echo, or UTF-8 text echo with replacement of invalid sequences
//! - Configuration via CLI arguments or TOML file

mod config;
mod echo;
mod protocols;
mod server;

use config::Config;
use server::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        listen = %config.listen,
        workers = ?config.workers,
        body_encoding = ?config.body_encoding,
        "Starting echo-server"
    );

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(workers) = config.workers {
        builder.worker_threads(workers);
    }
    let runtime = builder.build()?;

    runtime.block_on(run(config))
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let server = Server::bind(&config)?;
    println!("{}", startup_line(server.local_addr().port()));

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, no longer accepting connections");
            shutdown.stop();
        }
    });

    server.run().await?;
    Ok(())
}

/// Line printed to stdout once the listener is bound.
fn startup_line(port: u16) -> String {
    format!("Server started, listening on port: {}", port)
}

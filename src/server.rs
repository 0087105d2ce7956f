//! TCP server for handling HTTP echo connections.
//!
//! Accepts incoming connections and hands each one to its own task running
//! the HTTP echo handler. The server is an explicit object: `bind` opens the
//! listening socket, `run` drives the accept loop, and a `ShutdownHandle`
//! stops accepting. Connections already accepted are not awaited.

use crate::config::Config;
use crate::echo::BodyEncoding;
use crate::protocols::http;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Listen backlog
const BACKLOG: i32 = 1024;

/// Server instance
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    encoding: BodyEncoding,
    shutdown: Arc<watch::Sender<bool>>,
}

/// Stops the accept loop of the `Server` it was taken from.
#[derive(Clone)]
pub struct ShutdownHandle {
    shutdown: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Stop accepting new connections. `Server::run` returns afterwards.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }
}

impl Server {
    /// Bind the listening socket described by `config`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: &Config) -> io::Result<Self> {
        let listener = TcpListener::from_std(create_listener(config.listen)?)?;
        let local_addr = listener.local_addr()?;
        let (shutdown, _) = watch::channel(false);

        info!(address = %local_addr, "Server listening");

        Ok(Server {
            listener,
            local_addr,
            encoding: config.body_encoding,
            shutdown: Arc::new(shutdown),
        })
    }

    /// Address the server is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Accept connections until stopped.
    pub async fn run(self) -> io::Result<()> {
        let mut stopped = self.shutdown.subscribe();

        loop {
            if *stopped.borrow_and_update() {
                info!(address = %self.local_addr, "Server stopped");
                return Ok(());
            }

            tokio::select! {
                _ = stopped.changed() => {}

                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        debug!(peer = %addr, "New connection");
                        let encoding = self.encoding;

                        tokio::spawn(async move {
                            if let Err(e) = http::handle_connection(stream, encoding).await {
                                debug!(peer = %addr, error = %e, "Connection error");
                            }
                            debug!(peer = %addr, "Connection closed");
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                    }
                },
            }
        }
    }
}

/// Create a non-blocking TCP listener with SO_REUSEADDR.
fn create_listener(addr: SocketAddr) -> io::Result<std::net::TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;

    Ok(socket.into())
}

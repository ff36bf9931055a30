//! TCP server for the echo exchange.
//!
//! Accepts incoming connections and hands each one to its own task,
//! which performs a single read/echo exchange and closes the stream.

use crate::config::Config;
use crate::protocol;
use bytes::BytesMut;
use std::io;
#[cfg(test)]
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, trace};

/// Read buffer size
const BUFFER_SIZE: usize = 4 * 1024;

/// Server instance
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Bind the listening socket. Bind failure is fatal and is
    /// propagated to the caller.
    pub async fn bind(config: &Config) -> io::Result<Self> {
        let listener = TcpListener::bind(&config.listen).await?;
        info!(address = %listener.local_addr()?, "Server listening");
        Ok(Server { listener })
    }

    /// Address the server is actually listening on, for tests that
    /// bind to an ephemeral port.
    #[cfg(test)]
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever.
    ///
    /// Each accepted stream is moved into a detached task; the loop
    /// never waits for a handler to finish. Connection concurrency is
    /// unbounded. An accept failure ends the loop and propagates to
    /// the caller; handler failures stay inside their task.
    pub async fn run(&self) -> io::Result<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            debug!(peer = %addr, "New connection");

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream).await {
                    error!(peer = %addr, error = %e, "Connection error");
                }
            });
        }
    }
}

/// Handle a single client connection: read one line, echo it back,
/// close.
///
/// The stream is owned by this task and dropped on every exit path,
/// so the connection is always released, including after an I/O
/// error.
async fn handle_connection(mut stream: TcpStream) -> io::Result<()> {
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);

    // Read until a newline arrives. End-of-stream before the
    // delimiter ends the line early, so a peer that half-closes
    // without a newline cannot hang the handler.
    let payload = loop {
        if let Some((payload, _)) = protocol::split_line(&buffer) {
            break BytesMut::from(payload);
        }

        let n = stream.read_buf(&mut buffer).await?;
        if n == 0 {
            if buffer.is_empty() {
                trace!("Connection closed by client without data");
                return Ok(());
            }
            break buffer.split();
        }
    };

    let response = protocol::frame(&payload);
    stream.write_all(&response).await?;
    stream.flush().await?;
    stream.shutdown().await?;

    Ok(())
}

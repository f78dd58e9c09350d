//! One live TCP connection to the device.
//!
//! A [`Connection`] wraps the socket together with the read timeout that
//! applies to every read on it. It knows nothing about endpoints changing
//! or reconnecting; that is the manager's job.
//!
//! # Liveness
//!
//! [`Connection::is_alive`] is the strict check: the socket must still have
//! a peer, neither direction may have been observed shut down, and a
//! non-blocking peek must not report end of stream.
//!
//! A request is in flight from the moment [`Connection::send`] starts until
//! [`Connection::receive`] returns. If the future driving the exchange is
//! dropped in between, the flag stays set and the connection is treated as
//! dead: its late response (or a half-written frame) must never be read by
//! the next exchange.

// ============================================================================
// Imports
// ============================================================================

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::config::Endpoint;
use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;

// ============================================================================
// Constants
// ============================================================================

/// Scratch size used when draining unread bytes.
const DRAIN_CHUNK: usize = 256;

// ============================================================================
// Connection
// ============================================================================

/// TCP connection to a Modbus device.
///
/// Owned exclusively by the connection manager and only reachable through
/// its lock guard, so at most one exchange uses it at a time.
#[derive(Debug)]
pub struct Connection {
    /// Generation id for logs.
    id: ConnectionId,
    /// Underlying socket.
    stream: TcpStream,
    /// Remote address resolved at connect time.
    peer: SocketAddr,
    /// Bound applied to every read and write.
    io_timeout: Duration,
    /// Peer closed its sending side (we read end of stream).
    read_closed: bool,
    /// A write failed; our sending side is unusable.
    write_closed: bool,
    /// A request was sent and its response not yet read.
    in_flight: bool,
}

impl Connection {
    /// Opens a connection to `endpoint`.
    ///
    /// `connect_timeout` covers name resolution and the TCP handshake.
    /// `io_timeout` is installed for all subsequent reads and writes.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the connect does not finish in time
    /// - [`Error::Connection`] if the connect is refused or the host cannot
    ///   be resolved
    pub async fn open(
        endpoint: &Endpoint,
        connect_timeout: Duration,
        io_timeout: Duration,
    ) -> Result<Self> {
        let stream = timeout(
            connect_timeout,
            TcpStream::connect((endpoint.host(), endpoint.port())),
        )
        .await
        .map_err(|_| Error::connection_timeout(connect_timeout.as_millis() as u64))?
        .map_err(|e| Error::connection(format!("{endpoint}: {e}")))?;

        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        let id = ConnectionId::next();

        debug!(%id, %peer, "TCP connection opened");

        Ok(Self {
            id,
            stream,
            peer,
            io_timeout,
            read_closed: false,
            write_closed: false,
            in_flight: false,
        })
    }

    /// Returns the connection id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the remote socket address.
    #[inline]
    #[must_use]
    pub const fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Returns the timeout applied to reads and writes.
    #[inline]
    #[must_use]
    pub const fn io_timeout(&self) -> Duration {
        self.io_timeout
    }

    /// Returns `true` if a request was sent and its response not yet read.
    #[inline]
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Returns `true` if the socket is open in both directions and no
    /// abandoned request is pending on it.
    ///
    /// Does not consume any bytes.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        if self.read_closed || self.write_closed || self.in_flight {
            return false;
        }

        if self.stream.peer_addr().is_err() {
            return false;
        }

        let mut probe = [0u8; 1];
        match self.stream.peek(&mut probe).now_or_never() {
            // Nothing buffered yet: the socket is idle but open.
            None => true,
            Some(Ok(0)) => false,
            Some(Ok(_)) => true,
            Some(Err(e)) => e.kind() == ErrorKind::WouldBlock,
        }
    }

    /// Drops any bytes already waiting on the socket.
    ///
    /// A late answer to an earlier request would otherwise be taken as the
    /// answer to the next one. Returns the number of bytes discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the socket reports an error.
    pub fn discard_unread(&mut self) -> Result<usize> {
        let mut scratch = [0u8; DRAIN_CHUNK];
        let mut discarded = 0;

        loop {
            match self.stream.try_read(&mut scratch) {
                Ok(0) => {
                    self.read_closed = true;
                    break;
                }
                Ok(n) => discarded += n,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }

        if discarded > 0 {
            trace!(id = %self.id, discarded, "Discarded unread bytes");
        }

        Ok(discarded)
    }

    /// Writes the whole frame and flushes it.
    ///
    /// Marks the connection in flight until the next [`receive`](Self::receive)
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the write fails or does not complete within
    /// the I/O timeout. The connection is unusable afterwards.
    pub async fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.in_flight = true;

        let io_timeout = self.io_timeout;
        let stream = &mut self.stream;
        let write = async {
            stream.write_all(frame).await?;
            stream.flush().await
        };

        let result = match timeout(io_timeout, write).await {
            Ok(result) => result,
            Err(_) => Err(std::io::Error::new(ErrorKind::TimedOut, "write timed out")),
        };

        if let Err(e) = result {
            self.write_closed = true;
            return Err(e.into());
        }

        trace!(id = %self.id, len = frame.len(), "Frame written");
        Ok(())
    }

    /// Reads one response chunk into `buf`.
    ///
    /// Returns `Ok(0)` when nothing arrived within the I/O timeout. Clears
    /// the in-flight mark whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the peer closed the stream
    /// - [`Error::Io`] if the socket reports an error
    pub async fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        let read = timeout(self.io_timeout, self.stream.read(buf)).await;
        self.in_flight = false;

        match read {
            Err(_) => {
                debug!(
                    id = %self.id,
                    timeout_ms = self.io_timeout.as_millis() as u64,
                    "Read timed out"
                );
                Ok(0)
            }
            Ok(Ok(0)) => {
                debug!(id = %self.id, "Peer closed the connection");
                self.read_closed = true;
                Err(Error::ConnectionClosed)
            }
            Ok(Ok(n)) => {
                trace!(id = %self.id, len = n, "Response read");
                Ok(n)
            }
            Ok(Err(e)) => {
                self.read_closed = true;
                Err(e.into())
            }
        }
    }

    /// Shuts the socket down and releases it.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            trace!(id = %self.id, error = %e, "Socket shutdown error ignored");
        }
        debug!(id = %self.id, peer = %self.peer, "TCP connection closed");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;

    async fn local_listener() -> (TcpListener, Endpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, Endpoint::new("127.0.0.1", i64::from(port)).unwrap())
    }

    #[tokio::test]
    async fn test_open_and_alive() {
        let (listener, endpoint) = local_listener().await;
        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });

        let conn = Connection::open(&endpoint, Duration::from_secs(1), Duration::from_secs(1))
            .await
            .expect("connect should succeed");
        let _server = accept.await.unwrap();

        assert!(conn.is_alive());
        assert_eq!(conn.peer_addr().port(), endpoint.port());
        assert_eq!(conn.io_timeout(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_open_refused() {
        let (listener, endpoint) = local_listener().await;
        drop(listener);

        let err = Connection::open(&endpoint, Duration::from_secs(1), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.is_transport_error());
    }

    #[tokio::test]
    async fn test_peer_close_detected() {
        let (listener, endpoint) = local_listener().await;
        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });

        let conn = Connection::open(&endpoint, Duration::from_secs(1), Duration::from_secs(1))
            .await
            .unwrap();
        let (server, _) = accept.await.unwrap();
        drop(server);

        // Give the FIN time to arrive and the reactor time to see it.
        let mut alive = true;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            alive = conn.is_alive();
            if !alive {
                break;
            }
        }
        assert!(!alive);
    }

    #[tokio::test]
    async fn test_receive_timeout_is_no_response() {
        let (listener, endpoint) = local_listener().await;
        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });

        let mut conn =
            Connection::open(&endpoint, Duration::from_secs(1), Duration::from_millis(100))
                .await
                .unwrap();
        let _server = accept.await.unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(conn.receive(&mut buf).await.unwrap(), 0);
        // A timeout alone does not mark the socket closed.
        assert!(conn.is_alive());
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let (listener, endpoint) = local_listener().await;
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            socket.read_exact(&mut buf).await.unwrap();
            socket.write_all(&buf).await.unwrap();
            socket
        });

        let mut conn = Connection::open(&endpoint, Duration::from_secs(1), Duration::from_secs(1))
            .await
            .unwrap();
        conn.send(&[1, 2, 3, 4]).await.unwrap();
        assert!(conn.is_in_flight());
        assert!(!conn.is_alive());

        let mut buf = [0u8; 16];
        let n = conn.receive(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[1, 2, 3, 4]);
        assert!(!conn.is_in_flight());

        let _socket = server.await.unwrap();
        assert!(conn.is_alive());
    }

    #[tokio::test]
    async fn test_abandoned_request_marks_dead() {
        let (listener, endpoint) = local_listener().await;
        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });

        let mut conn = Connection::open(&endpoint, Duration::from_secs(1), Duration::from_secs(1))
            .await
            .unwrap();
        let _server = accept.await.unwrap();

        conn.send(&[1, 2, 3, 4]).await.unwrap();

        // Receive started but dropped before the peer answered.
        let mut buf = [0u8; 16];
        let pending = tokio::time::timeout(Duration::from_millis(50), conn.receive(&mut buf)).await;
        assert!(pending.is_err());

        assert!(conn.is_in_flight());
        assert!(!conn.is_alive());
    }

    #[tokio::test]
    async fn test_receive_peer_closed() {
        let (listener, endpoint) = local_listener().await;
        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });

        let mut conn = Connection::open(&endpoint, Duration::from_secs(1), Duration::from_secs(1))
            .await
            .unwrap();
        let (server, _) = accept.await.unwrap();
        drop(server);

        let mut buf = [0u8; 16];
        let err = conn.receive(&mut buf).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
        assert!(!conn.is_alive());
    }

    #[tokio::test]
    async fn test_discard_unread() {
        let (listener, endpoint) = local_listener().await;
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(&[0xAA; 5]).await.unwrap();
            socket
        });

        let mut conn = Connection::open(&endpoint, Duration::from_secs(1), Duration::from_secs(1))
            .await
            .unwrap();
        let _socket = server.await.unwrap();

        let mut total = 0;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            total += conn.discard_unread().unwrap();
            if total == 5 {
                break;
            }
        }
        assert_eq!(total, 5);
        assert!(conn.is_alive());
    }
}

//! Shared fixtures for integration tests.
//!
//! [`FakeDevice`] is a loopback TCP server that answers like a Modbus
//! device and lets tests break connections on demand.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use modbus_link::Endpoint;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

// ============================================================================
// Logging
// ============================================================================

/// Installs a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Frames
// ============================================================================

/// Builds a "read holding registers" request with the given transaction id.
pub fn read_request(transaction_id: u16, address: u16, quantity: u16) -> Vec<u8> {
    let [tid_hi, tid_lo] = transaction_id.to_be_bytes();
    let [addr_hi, addr_lo] = address.to_be_bytes();
    let [qty_hi, qty_lo] = quantity.to_be_bytes();
    vec![
        tid_hi, tid_lo, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, addr_hi, addr_lo, qty_hi, qty_lo,
    ]
}

// ============================================================================
// FakeDevice
// ============================================================================

/// How the device answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Echo the request back unchanged.
    Echo,
    /// Echo with the byte at this offset inverted.
    Corrupt(usize),
    /// Read requests but never answer.
    Silent,
    /// Read the request, then abort the connection with a TCP reset.
    Reset,
}

/// Loopback Modbus device stand-in.
pub struct FakeDevice {
    endpoint: Endpoint,
    accepted: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    reply: Arc<Mutex<Reply>>,
    delay: Arc<Mutex<Duration>>,
    kill_tx: broadcast::Sender<()>,
}

impl FakeDevice {
    /// Starts a device that echoes requests.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (kill_tx, _) = broadcast::channel(4);

        let device = Self {
            endpoint: Endpoint::new("127.0.0.1", i64::from(port)).unwrap(),
            accepted: Arc::new(AtomicUsize::new(0)),
            live: Arc::new(AtomicUsize::new(0)),
            reply: Arc::new(Mutex::new(Reply::Echo)),
            delay: Arc::new(Mutex::new(Duration::ZERO)),
            kill_tx,
        };

        let accepted = Arc::clone(&device.accepted);
        let live = Arc::clone(&device.live);
        let reply = Arc::clone(&device.reply);
        let delay = Arc::clone(&device.delay);
        let kill_tx = device.kill_tx.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                live.fetch_add(1, Ordering::SeqCst);

                let live = Arc::clone(&live);
                let reply = Arc::clone(&reply);
                let delay = Arc::clone(&delay);
                let mut kill_rx = kill_tx.subscribe();

                tokio::spawn(async move {
                    let mut buf = [0u8; 260];
                    loop {
                        tokio::select! {
                            _ = kill_rx.recv() => break,
                            read = socket.read(&mut buf) => {
                                let n = match read {
                                    Ok(0) | Err(_) => break,
                                    Ok(n) => n,
                                };

                                let mode = *reply.lock();
                                let wait = *delay.lock();
                                if !wait.is_zero() {
                                    tokio::time::sleep(wait).await;
                                }

                                let mut response = buf[..n].to_vec();
                                match mode {
                                    Reply::Echo => {}
                                    Reply::Corrupt(offset) => {
                                        if let Some(byte) = response.get_mut(offset) {
                                            *byte ^= 0xFF;
                                        }
                                    }
                                    Reply::Silent => continue,
                                    Reply::Reset => {
                                        // Zero linger turns the close into an RST.
                                        #[allow(deprecated)]
                                        let _ = socket.set_linger(Some(Duration::ZERO));
                                        break;
                                    }
                                }

                                if socket.write_all(&response).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    live.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        device
    }

    /// Returns the device address.
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint.clone()
    }

    /// Returns the port as the wide integer `update_endpoint` takes.
    pub fn port(&self) -> i64 {
        i64::from(self.endpoint.port())
    }

    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Connections currently open on the device side.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Changes how the device answers.
    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock() = reply;
    }

    /// Delays every answer.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Drops every open connection from the device side.
    pub fn kill_connections(&self) {
        let _ = self.kill_tx.send(());
    }

    /// Polls until `accepted()` reaches `expected` or a second passes.
    pub async fn wait_accepted(&self, expected: usize) -> usize {
        for _ in 0..100 {
            if self.accepted() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.accepted()
    }

    /// Polls until `live()` equals `expected` or a second passes.
    pub async fn wait_live(&self, expected: usize) -> usize {
        for _ in 0..100 {
            if self.live() == expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.live()
    }
}

/// Returns a loopback endpoint nothing listens on.
pub async fn closed_endpoint() -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Endpoint::new("127.0.0.1", i64::from(port)).unwrap()
}

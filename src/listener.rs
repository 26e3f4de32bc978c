//! Connection Listener
//!
//! Accepts inbound TCP connections and hands each one to a [`ConnectionHandler`] on
//! its own tokio task, so a slow exchange never delays the next `accept`. Both the
//! bootstrap registry and every peer's admission gate are served this way.
//!
//! Session tasks are owned by the serving task: aborting it closes the socket and
//! cancels every in-flight session along with it.

use anyhow::Result;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Per-connection logic plugged into a [`ConnectionListener`].
///
/// Implementations own the stream for the whole exchange and must contain their own
/// errors: nothing returned here can reach the accept loop.
pub trait ConnectionHandler: Send + Sync + 'static {
    fn handle(&self, stream: TcpStream, peer: SocketAddr) -> impl Future<Output = ()> + Send;
}

pub struct ConnectionListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl ConnectionListener {
    /// Binds `addr`. Port 0 asks the OS for a free port; read it back with
    /// [`ConnectionListener::local_addr`].
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::debug!("Listener bound on {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections until the future is dropped.
    pub async fn serve<H: ConnectionHandler>(self, handler: Arc<H>) {
        tracing::info!("Accepting connections on {}", self.local_addr);

        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!("Accepted connection from {}", peer);

                        let handler = handler.clone();
                        sessions.spawn(async move {
                            handler.handle(stream, peer).await;
                        });
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to accept connection on {}: {}",
                            self.local_addr,
                            e
                        );
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    }
                },
                Some(finished) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = finished
                        && e.is_panic()
                    {
                        tracing::error!("Session task on {} panicked: {}", self.local_addr, e);
                    }
                }
            }
        }
    }

    /// Spawns [`ConnectionListener::serve`] in the background.
    pub fn spawn<H: ConnectionHandler>(self, handler: Arc<H>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.serve(handler).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Signals when a session future is dropped before it completes.
    struct CancelSignal(Option<tokio::sync::oneshot::Sender<()>>);

    impl Drop for CancelSignal {
        fn drop(&mut self) {
            if let Some(tx) = self.0.take() {
                let _ = tx.send(());
            }
        }
    }

    struct Parked {
        cancelled: std::sync::Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
        started: tokio::sync::Notify,
    }

    impl ConnectionHandler for Parked {
        async fn handle(&self, _stream: TcpStream, _peer: SocketAddr) {
            let _signal = CancelSignal(self.cancelled.lock().unwrap().take());
            self.started.notify_one();
            std::future::pending::<()>().await;
        }
    }

    struct Echo {
        served: AtomicUsize,
        stall_first: bool,
    }

    impl ConnectionHandler for Echo {
        async fn handle(&self, mut stream: TcpStream, _peer: SocketAddr) {
            let n = self.served.fetch_add(1, Ordering::SeqCst);
            if self.stall_first && n == 0 {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }

            let mut buf = Vec::new();
            if stream.read_to_end(&mut buf).await.is_ok() {
                let _ = stream.write_all(&buf).await;
            }
        }
    }

    async fn echo_once(addr: SocketAddr, payload: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(payload).await.unwrap();
        stream.shutdown().await.unwrap();

        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn test_bind_port_zero_assigns_port() {
        let listener = ConnectionListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();

        assert_ne!(listener.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn test_stalled_handler_does_not_block_accept() {
        let listener = ConnectionListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = listener.local_addr();
        let handler = Arc::new(Echo {
            served: AtomicUsize::new(0),
            stall_first: true,
        });
        let task = listener.spawn(handler.clone());

        // First connection parks its handler for 30s
        let _stalled = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let reply = tokio::time::timeout(Duration::from_secs(2), echo_once(addr, b"ping"))
            .await
            .expect("second connection was blocked by the first");

        assert_eq!(reply, b"ping");
        assert_eq!(handler.served.load(Ordering::SeqCst), 2);

        task.abort();
    }

    #[tokio::test]
    async fn test_aborting_listener_cancels_sessions_and_closes_socket() {
        let listener = ConnectionListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = listener.local_addr();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let handler = Arc::new(Parked {
            cancelled: std::sync::Mutex::new(Some(tx)),
            started: tokio::sync::Notify::new(),
        });
        let task = listener.spawn(handler.clone());

        let _client = TcpStream::connect(addr).await.unwrap();
        handler.started.notified().await;

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        tokio::time::timeout(Duration::from_secs(2), rx)
            .await
            .expect("in-flight session outlived its listener")
            .unwrap();
        assert!(TcpStream::connect(addr).await.is_err());
    }
}

//! Admission Decisions
//!
//! The admission gate never decides on its own: it asks an injected [`Decision`],
//! which may be slow (a human at a terminal) or instant (a fixed policy). Decisions
//! are asynchronous so a pending one only parks its own connection task.

use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Type alias for a thread-safe, asynchronous decision function.
/// It takes the requester's port and resolves to `true` to admit it.
pub type DecisionFn =
    Arc<dyn Fn(u16) -> Pin<Box<dyn Future<Output = Result<bool>> + Send>> + Send + Sync>;

#[derive(Clone)]
pub struct Decision {
    decide: DecisionFn,
}

impl Decision {
    /// Wraps any async closure as a decision function.
    pub fn from_fn<F, Fut>(decide: F) -> Self
    where
        F: Fn(u16) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        let decide: DecisionFn = Arc::new(move |port: u16| {
            Box::pin(decide(port)) as Pin<Box<dyn Future<Output = Result<bool>> + Send>>
        });

        Self { decide }
    }

    pub fn allow_all() -> Self {
        Self::from_fn(|_port| async { Ok(true) })
    }

    pub fn deny_all() -> Self {
        Self::from_fn(|_port| async { Ok(false) })
    }

    /// Asks on the terminal. Concurrent requests queue behind one another at the
    /// prompt; only `y` (any case) admits.
    pub fn terminal_prompt() -> Self {
        let terminal = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));

        Self::from_fn(move |port| {
            let terminal = terminal.clone();
            async move { ask_terminal(&terminal, port).await }
        })
    }

    pub async fn decide(&self, port: u16) -> Result<bool> {
        (self.decide)(port).await
    }
}

impl std::fmt::Debug for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decision").finish_non_exhaustive()
    }
}

async fn ask_terminal(terminal: &Mutex<Lines<BufReader<Stdin>>>, port: u16) -> Result<bool> {
    let mut lines = terminal.lock().await;

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("Join request from peer {}\nAllow this peer? (y/n): ", port).as_bytes())
        .await?;
    stdout.flush().await?;

    let answer = lines
        .next_line()
        .await?
        .ok_or_else(|| anyhow::anyhow!("stdin closed before an answer was given"))?;

    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

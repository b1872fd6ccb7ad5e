//! Stop serving, drain, persist.
//!
//! Shutdown is driven by a [`CancellationToken`]. OS signals are only one
//! way to cancel it; tests cancel it directly.

use crate::rpc::{DRAIN_TIMEOUT, serve_incoming};
use crate::stores::{AccountStore, snapshot};
use anyhow::{Context, Result};
use log::{error, info, warn};
use std::io::Write;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::service::Routes;

#[derive(Debug)]
pub enum ShutdownReason {
    /// The token was cancelled, by a signal or by the owner.
    Requested,
    /// Accepting connections failed.
    TransportFailure(std::io::Error),
}

#[derive(Debug)]
pub struct ShutdownReport {
    pub reason: ShutdownReason,
    /// Number of accounts written, or why the snapshot could not be written.
    pub persisted: Result<usize>,
}

/// Waits for SIGINT or SIGTERM.
pub async fn wait_for_signal() -> std::io::Result<()> {
    tokio::select! {
        res = signal::ctrl_c() => {
            res?;
            info!("received Ctrl+C");
        },
        res = wait_sigterm() => {
            res?;
            info!("received SIGTERM");
        },
    }
    Ok(())
}

#[cfg(unix)]
async fn wait_sigterm() -> std::io::Result<()> {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    term.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_sigterm() -> std::io::Result<()> {
    std::future::pending().await
}

#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    drain_timeout: Duration,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        ShutdownCoordinator {
            token: CancellationToken::new(),
            drain_timeout: DRAIN_TIMEOUT,
        }
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds how long in-flight calls may hold up shutdown.
    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Cancels the token on the first termination signal.
    pub fn cancel_on_signals(&self) -> JoinHandle<()> {
        let token = self.token.clone();
        tokio::spawn(async move {
            if let Err(e) = wait_for_signal().await {
                warn!("signal handler failed, falling back to ctrl_c(): {}", e);
                if let Err(e) = signal::ctrl_c().await {
                    error!("cannot wait for ctrl_c(): {}", e);
                    return;
                }
            }
            token.cancel();
        })
    }

    /// Serves until cancelled or the transport fails, then drains.
    pub async fn serve(&self, routes: Routes, listener: TcpListener) -> ShutdownReason {
        self.serve_incoming(routes, TcpListenerStream::new(listener))
            .await
    }

    pub async fn serve_incoming<I>(&self, routes: Routes, incoming: I) -> ShutdownReason
    where
        I: Stream<Item = std::io::Result<TcpStream>> + Send + 'static,
    {
        match serve_incoming(routes, incoming, self.token.clone(), self.drain_timeout).await {
            Ok(()) => {
                info!("shutdown requested");
                ShutdownReason::Requested
            }
            Err(e) => {
                error!("failed to serve: {}", e);
                ShutdownReason::TransportFailure(e)
            }
        }
    }

    /// Like [`serve_incoming`](Self::serve_incoming), then writes the final
    /// account snapshot to `sink`. The snapshot is written whatever ended
    /// serving; a write failure is logged and reported but changes nothing else.
    pub async fn serve_and_persist<I, A, W>(
        &self,
        routes: Routes,
        incoming: I,
        store: &A,
        sink: W,
    ) -> ShutdownReport
    where
        I: Stream<Item = std::io::Result<TcpStream>> + Send + 'static,
        A: AccountStore + ?Sized,
        W: Write,
    {
        let reason = self.serve_incoming(routes, incoming).await;
        let persisted = persist(store, sink);
        match &persisted {
            Ok(n) => info!("{} updated account(s) written", n),
            Err(e) => error!("cannot write accounts snapshot: {:#}", e),
        }
        ShutdownReport { reason, persisted }
    }
}

/// Writes a full snapshot of `store`.
pub fn persist<A, W>(store: &A, sink: W) -> Result<usize>
where
    A: AccountStore + ?Sized,
    W: Write,
{
    let accounts = store.snapshot().context("cannot snapshot accounts")?;
    snapshot::write_accounts(sink, &accounts).context("cannot write to output")?;
    Ok(accounts.len())
}

//! "Keep" lifecycle: forward a port for as long as the process runs
//!
//! Forward once, wait for a termination signal with no timeout, clear once,
//! exit. Signal listeners are registered before forwarding. Nothing is
//! persisted: if the process dies without clearing, the mapping stays on the
//! router.

use crate::router::{RouterClient, RouterError};
use std::future::Future;
use tracing::{info, warn};

/// Lifecycle states of a kept mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepState {
    /// Nothing forwarded yet
    Idle,
    /// Both mappings are in place
    Forwarded,
    /// Both mappings were removed after shutdown was requested
    Cleared,
    /// Terminal state
    Exited,
}

/// A port kept forwarded until shutdown
#[derive(Debug)]
pub struct KeepSession {
    router: RouterClient,
    port: u16,
    state: KeepState,
}

impl KeepSession {
    /// Create an idle session for `port`
    pub fn new(router: RouterClient, port: u16) -> Self {
        Self {
            router,
            port,
            state: KeepState::Idle,
        }
    }

    /// Forward the port (Idle → Forwarded)
    ///
    /// On failure the session stays idle and the error is returned as is.
    pub async fn start(router: RouterClient, port: u16, description: &str) -> Result<Self, RouterError> {
        let mut session = Self::new(router, port);
        session.router.forward(port, description).await?;
        session.state = KeepState::Forwarded;
        info!("Keeping port {} forwarded", port);
        Ok(session)
    }

    /// Current state
    pub fn state(&self) -> KeepState {
        self.state
    }

    /// Port being kept
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Block on `shutdown`, then clear the port once
    ///
    /// Clearing is best effort: a failure is returned but not retried. On
    /// success the session is [`KeepState::Cleared`]; after a failed clear it
    /// stays [`KeepState::Forwarded`]. The value the shutdown future resolved
    /// with is handed back alongside.
    pub async fn hold<S>(&mut self, shutdown: S) -> (S::Output, Result<(), RouterError>)
    where
        S: Future,
    {
        let signal = shutdown.await;

        if self.state != KeepState::Forwarded {
            return (signal, Ok(()));
        }

        info!("Shutdown requested, clearing port {}", self.port);
        let cleared = self.router.clear(self.port).await;
        match &cleared {
            Ok(()) => self.state = KeepState::Cleared,
            Err(e) => warn!("Failed to clear port {}: {}", self.port, e),
        }

        (signal, cleared)
    }

    /// End the session (→ Exited), whatever state it reached
    pub fn exit(mut self) -> KeepState {
        if self.state == KeepState::Forwarded {
            warn!("Exiting with port {} still forwarded", self.port);
        }
        self.state = KeepState::Exited;
        self.state
    }
}

/// Termination signal listeners
///
/// Register before forwarding: a signal raised between registration and
/// [`recv`](Self::recv) is delivered on the next `recv` instead of being lost.
/// SIGTERM, SIGINT and SIGQUIT on Unix; Ctrl-C on Windows.
#[derive(Debug)]
pub struct ShutdownSignal {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    quit: tokio::signal::unix::Signal,
    #[cfg(windows)]
    ctrl_c: tokio::signal::windows::CtrlC,
}

impl ShutdownSignal {
    /// Install the listeners
    #[cfg(unix)]
    pub fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    /// Install the listeners
    #[cfg(windows)]
    pub fn register() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    /// Wait for the next termination signal and name it
    #[cfg(unix)]
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.quit.recv() => "SIGQUIT",
        }
    }

    /// Wait for the next termination signal and name it
    #[cfg(windows)]
    pub async fn recv(&mut self) -> &'static str {
        self.ctrl_c.recv().await;
        "Ctrl-C"
    }
}

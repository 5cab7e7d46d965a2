//! Link driver — owns the one connection to the device.
//!
//! The driver is transport-agnostic: it drives any [`LinkTransport`] through
//! `Disconnected → Connecting → Connected`, bounds the handshake, demotes the
//! session on I/O failure and reconnects with a fixed backoff.
//!
//! Reads and writes share one async mutex so they never interleave on the
//! byte stream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, watch};

use roomwatch_domain::command::DeviceCommand;
use roomwatch_domain::error::LinkError;
use roomwatch_domain::link::{LinkSession, LinkStatus};

use crate::ports::{LinkConnection, LinkTransport};

/// Timing knobs for the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSettings {
    /// Upper bound for `open()` including the transport handshake.
    pub handshake_timeout: Duration,
    /// Fixed wait before each reconnect attempt.
    pub reconnect_backoff: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(5),
            reconnect_backoff: Duration::from_secs(5),
        }
    }
}

/// Owns the device connection and its lifecycle.
pub struct LinkDriver<T: LinkTransport> {
    transport: T,
    settings: LinkSettings,
    connection: Mutex<Option<T::Connection>>,
    session: parking_lot::Mutex<LinkSession>,
    status: watch::Sender<LinkStatus>,
    attempts: AtomicU64,
}

impl<T: LinkTransport> LinkDriver<T> {
    /// Create a disconnected driver.
    pub fn new(transport: T, settings: LinkSettings) -> Self {
        let (status, _) = watch::channel(LinkStatus::Disconnected);
        Self {
            transport,
            settings,
            connection: Mutex::new(None),
            session: parking_lot::Mutex::new(LinkSession::initial()),
            status,
            attempts: AtomicU64::new(0),
        }
    }

    /// Open a new session, replacing any current one.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Unavailable`] when the transport cannot be opened
    /// and [`LinkError::Timeout`] when the handshake does not finish in time.
    pub async fn connect(&self) -> Result<LinkSession, LinkError> {
        let mut slot = self.connection.lock().await;
        *slot = None;

        let id = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        self.status.send_replace(LinkStatus::Connecting);
        tracing::debug!(target_device = %self.transport.describe(), attempt = id, "opening device link");

        let opened =
            match tokio::time::timeout(self.settings.handshake_timeout, self.transport.open())
                .await
            {
                Ok(result) => result,
                Err(_) => Err(LinkError::Timeout(self.settings.handshake_timeout)),
            };

        match opened {
            Ok(connection) => {
                *slot = Some(connection);
                let session = LinkSession::established(id);
                *self.session.lock() = session.clone();
                self.status.send_replace(LinkStatus::Connected);
                tracing::info!(target_device = %self.transport.describe(), attempt = id, "device link connected");
                Ok(session)
            }
            Err(err) => {
                *self.session.lock() = LinkSession::failed(id, &err);
                self.status.send_replace(LinkStatus::Disconnected);
                Err(err)
            }
        }
    }

    /// Wait up to `wait` for the next line.
    ///
    /// `Ok(None)` means nothing arrived in time; partial input is kept for
    /// the next call.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotConnected`] without a session, or the
    /// connection's I/O failure (after demoting the session).
    pub async fn read_line(&self, wait: Duration) -> Result<Option<Vec<u8>>, LinkError> {
        let mut slot = self.connection.lock().await;
        let Some(connection) = slot.as_mut() else {
            return Err(LinkError::NotConnected);
        };
        match tokio::time::timeout(wait, connection.read_line()).await {
            Err(_) => Ok(None),
            Ok(Ok(line)) => Ok(Some(line)),
            Ok(Err(err)) => {
                self.demote(&mut slot, &err);
                Err(err)
            }
        }
    }

    /// Write one command.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotConnected`] without a session, or the
    /// connection's I/O failure (after demoting the session).
    pub async fn send(&self, command: &DeviceCommand) -> Result<(), LinkError> {
        let line = command.to_line().map_err(LinkError::io)?;
        let mut slot = self.connection.lock().await;
        let Some(connection) = slot.as_mut() else {
            return Err(LinkError::NotConnected);
        };
        if let Err(err) = connection.write_line(&line).await {
            self.demote(&mut slot, &err);
            return Err(err);
        }
        tracing::debug!(action = ?command.action, "command sent to device");
        Ok(())
    }

    /// Connect, retrying forever with the fixed backoff.
    ///
    /// With `delay_first` the backoff is also waited before the first attempt,
    /// which is what callers want right after a session dropped.
    pub async fn establish(&self, delay_first: bool) -> LinkSession {
        let mut delay = delay_first;
        loop {
            if delay {
                tokio::time::sleep(self.settings.reconnect_backoff).await;
            }
            match self.connect().await {
                Ok(session) => return session,
                Err(err) => {
                    tracing::warn!(
                        target_device = %self.transport.describe(),
                        error = %err,
                        retry_in = ?self.settings.reconnect_backoff,
                        "device link attempt failed"
                    );
                    delay = true;
                }
            }
        }
    }

    #[must_use]
    pub fn status(&self) -> LinkStatus {
        *self.status.borrow()
    }

    /// Receiver notified on every status change.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<LinkStatus> {
        self.status.subscribe()
    }

    /// The latest session record.
    #[must_use]
    pub fn session(&self) -> LinkSession {
        self.session.lock().clone()
    }

    /// Number of connect attempts so far.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn settings(&self) -> LinkSettings {
        self.settings
    }

    fn demote(&self, slot: &mut Option<T::Connection>, err: &LinkError) {
        *slot = None;
        {
            let mut session = self.session.lock();
            *session = LinkSession::failed(session.id, err);
        }
        self.status.send_replace(LinkStatus::Disconnected);
        tracing::warn!(target_device = %self.transport.describe(), error = %err, "device link dropped");
    }
}

//! Fire-and-forget command dispatch against a camera control endpoint.
//!
//! Continuous-motion control is inherently lossy: the n-th move command
//! supersedes the (n-1)-th, so waiting for the device's acknowledgement
//! before accepting the next command would defeat responsiveness. Every
//! outbound command is therefore handed to a background task and forgotten —
//! correctness is "the last-issued velocity eventually wins", not "every
//! command is acknowledged".

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CameraConfig;
use crate::session::{Command, CommandEnvelope, Session};
use crate::transport::ControlTransport;
use crate::types::Direction;
use crate::Result;

/// Default keep-alive probe interval.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Default bound on concurrent in-flight fire-and-forget sends.
///
/// A burst of user input beyond this drops the newest command instead of
/// queueing it; the next frame of input supersedes it anyway. Stop commands
/// bypass the bound entirely.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Tuning knobs for a [`CommandDispatcher`].
#[derive(Debug, Clone, Copy)]
pub struct DispatcherOptions {
    /// Interval between keep-alive probes.
    pub keep_alive: Duration,
    /// Maximum concurrent in-flight move/preset sends.
    pub max_in_flight: usize,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self { keep_alive: DEFAULT_KEEP_ALIVE, max_in_flight: DEFAULT_MAX_IN_FLIGHT }
    }
}

/// Low-latency command dispatcher for one camera.
///
/// Owns the authenticated [`Session`] and its keep-alive timer. All command
/// operations return in constant, I/O-independent time: envelope construction
/// is pure templating on the calling thread, and the network send runs on a
/// spawned task.
///
/// Commands must be issued from within a Tokio runtime.
pub struct CommandDispatcher<T: ControlTransport> {
    session: Arc<Session>,
    transport: Arc<T>,
    in_flight: Arc<Semaphore>,
    dropped: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl<T: ControlTransport> CommandDispatcher<T> {
    /// Establish a session and start the keep-alive schedule.
    ///
    /// This is the one blocking, retryable operation: it performs a single
    /// round trip to authenticate and resolve the active profile token. On
    /// failure no dispatcher exists, so no command can ever be sent without a
    /// session.
    pub async fn connect(transport: T, config: CameraConfig) -> Result<Self> {
        Self::connect_with(transport, config, DispatcherOptions::default()).await
    }

    /// [`connect`](Self::connect) with explicit options.
    pub async fn connect_with(
        transport: T,
        config: CameraConfig,
        options: DispatcherOptions,
    ) -> Result<Self> {
        info!(host = %config.host, "connecting to camera control endpoint");

        let (profile_token, device) = transport.open(&config).await?;
        if let Some(device) = &device {
            info!(
                manufacturer = %device.manufacturer,
                model = %device.model,
                firmware = %device.firmware,
                "connected to device"
            );
        }
        info!(profile = %profile_token, "using media profile");

        let session = Arc::new(Session::new(config, profile_token, device));
        let transport = Arc::new(transport);
        let cancel = CancellationToken::new();

        Self::spawn_keep_alive(Arc::clone(&transport), cancel.clone(), options.keep_alive);

        Ok(Self {
            session,
            transport,
            in_flight: Arc::new(Semaphore::new(options.max_in_flight.max(1))),
            dropped: Arc::new(AtomicU64::new(0)),
            cancel,
        })
    }

    /// Dispatch a continuous move in `direction`, scaled by `magnitude` in
    /// `[0.0, 1.0]`. Returns once the envelope is handed to a send task, not
    /// once it is transmitted.
    pub fn move_instant(&self, direction: Direction, magnitude: f32) {
        if self.cancel.is_cancelled() {
            return;
        }
        let envelope =
            self.session.envelope(Command::ContinuousMove(direction.velocity(magnitude)));
        self.dispatch(envelope, true);
    }

    /// Dispatch a stop on all axes.
    ///
    /// Stops are never queued behind or budget-dropped with pending moves:
    /// they bypass the in-flight bound so the converged final state is always
    /// "stopped" once in-flight sends drain.
    pub fn stop_instant(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        let envelope = self.session.envelope(Command::Stop);
        self.dispatch(envelope, false);
    }

    /// Dispatch a preset recall. Same non-blocking contract as moves.
    pub fn goto_preset(&self, token: impl Into<String>, speed: f32) {
        if self.cancel.is_cancelled() {
            return;
        }
        let envelope =
            self.session.envelope(Command::GotoPreset { token: token.into(), speed });
        self.dispatch(envelope, true);
    }

    /// Run one keep-alive probe against the control endpoint.
    ///
    /// Failures are logged and swallowed; a missed probe is not worth
    /// disturbing the caller over.
    pub async fn keep_alive(&self) {
        if let Err(e) = self.transport.probe().await {
            warn!(error = %e, "keep-alive probe failed");
        }
    }

    /// The session established at connect time.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Number of commands dropped because the in-flight budget was saturated.
    pub fn dropped_commands(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Cancel the keep-alive schedule and stop accepting commands.
    ///
    /// Idempotent and safe to call while dispatches are in flight: those are
    /// abandoned, not awaited, and release their transport reference as they
    /// finish.
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            debug!("shutting down command dispatcher");
            self.cancel.cancel();
        }
    }

    /// Hand an envelope to a background send task and return immediately.
    ///
    /// `budgeted` commands respect the in-flight bound with drop-newest
    /// semantics; stop commands do not.
    fn dispatch(&self, envelope: CommandEnvelope, budgeted: bool) {
        let permit = if budgeted {
            match Arc::clone(&self.in_flight).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(
                        command = ?envelope.command,
                        dropped_total = total,
                        "in-flight budget saturated, dropping command"
                    );
                    return;
                }
            }
        } else {
            None
        };

        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            let outcome = transport.send(&envelope).await;
            if !outcome.is_delivered() {
                debug!(command = ?envelope.command, outcome = ?outcome, "command not delivered");
            }
            drop(permit);
        });
    }

    fn spawn_keep_alive(transport: Arc<T>, cancel: CancellationToken, period: Duration) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it, the connection was
            // just exercised by connect().
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("keep-alive schedule cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = transport.probe().await {
                            warn!(error = %e, "keep-alive probe failed");
                        }
                    }
                }
            }
        });
    }
}

impl<T: ControlTransport> Drop for CommandDispatcher<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

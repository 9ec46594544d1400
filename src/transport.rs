//! Control transport trait.

use crate::config::CameraConfig;
use crate::session::{CommandEnvelope, DeviceInfo};
use crate::types::DispatchOutcome;
use crate::Result;

/// Trait for device control transports.
///
/// Transports abstract the request/response protocol layer between the
/// dispatcher and the device. The dispatcher never sees wire bytes; it needs
/// exactly three operations.
///
/// `send` must support independent, non-serialized invocation: the dispatcher
/// issues concurrent fire-and-forget sends and makes no ordering guarantee
/// between them.
#[async_trait::async_trait]
pub trait ControlTransport: Send + Sync + 'static {
    /// Establish the authenticated session, resolving the active profile
    /// token and (when the device reports it) its identity. One round trip;
    /// the only operation whose failure is surfaced to callers.
    async fn open(&self, config: &CameraConfig) -> Result<(String, Option<DeviceInfo>)>;

    /// Transmit one envelope and report how it went.
    ///
    /// The outcome is informational: the dispatcher logs and discards
    /// non-delivered outcomes rather than retrying, because a retried move
    /// command would land later than the next user-driven command anyway.
    async fn send(&self, envelope: &CommandEnvelope) -> DispatchOutcome;

    /// Lightweight no-op probe keeping the underlying connection warm.
    async fn probe(&self) -> Result<()>;
}

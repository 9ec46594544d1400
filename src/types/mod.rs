//! Core types shared by the command dispatcher and the media ingest loop.

mod direction;
mod frame;
mod velocity;

pub use direction::Direction;
pub use frame::{RawFrame, VideoFrame};
pub use velocity::Velocity;

use serde::{Deserialize, Serialize};

/// Typed result of one fire-and-forget command send.
///
/// Continuous-move commands are superseded by the next frame of user input, so
/// nothing here is retried or propagated. The dispatcher logs non-delivered
/// outcomes and discards them; the variants exist so that the decision to
/// discard is visible and testable rather than a silent catch-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The device acknowledged the request.
    Delivered,
    /// The transport gave up waiting for the device.
    TimedOut,
    /// The device or transport actively rejected the request.
    Refused(String),
}

impl DispatchOutcome {
    /// True when the command reached the device.
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered)
    }
}

/// Externally observable state of a media ingest loop.
///
/// `Reconnecting` is how stream-open failures surface: the loop never
/// propagates them, it keeps retrying until cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    /// Frames are being pulled and delivered.
    Streaming,
    /// The transport was torn down after repeated read failures and is being
    /// reopened with a cooldown between attempts.
    Reconnecting,
    /// The loop was cancelled and all resources released.
    Stopped,
}

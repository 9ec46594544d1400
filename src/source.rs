//! Frame source trait for media transports.

use crate::types::RawFrame;
use crate::Result;

/// Trait for pull-based media sources.
///
/// Sources abstract over different media transports (RTSP pipelines, HTTP
/// snapshot endpoints, scripted test feeds) and handle their own pacing
/// internally. Implementations should keep internal buffering shallow — a few
/// frames at most — so staleness stays bounded.
///
/// The ingest loop owns the source exclusively and drives the full lifecycle:
/// `open`, a run of `read_frame` calls, and `close` on reconnect or shutdown.
/// `open` may be called again after `close`.
#[async_trait::async_trait]
pub trait FrameSource: Send + 'static {
    /// Open (or reopen) the underlying transport.
    async fn open(&mut self) -> Result<()>;

    /// Pull the next frame.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` - a frame was read
    /// - `Ok(None)` - end of stream
    /// - `Err(e)` - transient read failure; the loop applies backoff and
    ///   escalates to a reconnect past its failure threshold
    async fn read_frame(&mut self) -> Result<Option<RawFrame>>;

    /// Release the underlying transport. Must be safe to call repeatedly.
    async fn close(&mut self);
}

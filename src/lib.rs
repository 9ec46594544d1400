//! Low-latency PTZ camera control and resilient media ingest.
//!
//! Ptzlink drives pan-tilt-zoom network cameras over ONVIF and pulls their
//! media feed through a self-healing ingest loop, built for interactive
//! operator consoles where responsiveness matters more than delivery
//! guarantees.
//!
//! # Features
//!
//! - **Fire-and-forget control**: move/stop/preset commands return in
//!   constant time; the network send happens on a background task
//! - **Resilient ingest**: frame reads back off on transient failures and
//!   escalate to a full reconnect, forever, until explicitly stopped
//! - **Latest-wins delivery**: a single-slot hand-off keeps slow consumers
//!   from building up frame backlog
//! - **Recording tee**: toggle an append-only recording of the live feed
//!   without disturbing delivery
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ptzlink::{CameraConfig, Direction, PtzLink};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> ptzlink::Result<()> {
//!     let config = CameraConfig::new("192.168.50.224", "admin", "secret").with_port(2020);
//!     let dispatcher = PtzLink::connect(config).await?;
//!
//!     dispatcher.move_instant(Direction::Left, 0.8);
//!     tokio::time::sleep(std::time::Duration::from_millis(500)).await;
//!     dispatcher.stop_instant();
//!
//!     let ingest = PtzLink::ingest(
//!         ptzlink::HttpSnapshotSource::new("http://192.168.50.224/snapshot", 20.0),
//!     )
//!     .await?;
//!     let mut frames = std::pin::pin!(ingest.subscribe());
//!     while let Some(frame) = frames.next().await {
//!         println!("frame {} ({} bytes)", frame.seq, frame.data.len());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod config;
mod error;
pub mod types;

// Control plane
pub mod dispatcher;
pub mod session;
pub mod transport;
pub mod transports;

// Media plane
pub mod ingest;
pub mod sink;
pub mod sinks;
pub mod source;
pub mod sources;
pub mod stream;

// Core exports
pub use config::CameraConfig;
pub use error::{CameraError, Result};
pub use types::*;

// Control plane exports
pub use dispatcher::{CommandDispatcher, DispatcherOptions};
pub use session::{DeviceInfo, Session};
pub use transport::ControlTransport;
pub use transports::OnvifTransport;

// Media plane exports
pub use ingest::{IngestHandle, IngestOptions, MediaIngestLoop, RecordingStart};
pub use sink::{RecordingSink, SinkOpener, SinkSpec};
pub use sinks::{RawFileOpener, RawFileSink};
pub use source::FrameSource;
pub use sources::HttpSnapshotSource;
pub use stream::PaceExt;

use std::sync::Arc;

/// Unified entry point for camera connections.
///
/// A convenience over the explicit constructors: `connect` wires a
/// [`CommandDispatcher`] to the bundled [`OnvifTransport`], and `ingest`
/// starts a [`MediaIngestLoop`] recording to raw files. Anything beyond that
/// (custom transports, sinks, tuning) goes through the underlying types
/// directly.
///
/// # Examples
///
/// ```rust,no_run
/// use ptzlink::{CameraConfig, PtzLink};
///
/// #[tokio::main]
/// async fn main() -> ptzlink::Result<()> {
///     let config = CameraConfig::new("192.168.50.224", "admin", "secret");
///     let dispatcher = PtzLink::connect(config).await?;
///     dispatcher.goto_preset("1", 1.0);
///     Ok(())
/// }
/// ```
pub struct PtzLink;

impl PtzLink {
    /// Connect a command dispatcher to a camera over ONVIF.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is unreachable, rejects the
    /// credentials, or reports no usable media profile. No dispatcher exists
    /// on failure, so commands can never be sent without a session.
    pub async fn connect(config: CameraConfig) -> Result<CommandDispatcher<OnvifTransport>> {
        CommandDispatcher::connect(OnvifTransport::new(), config).await
    }

    /// Start a media ingest loop over `source`, with default tuning and
    /// raw-file recording.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial open of the media transport fails;
    /// every later failure is absorbed by the loop's reconnect handling.
    pub async fn ingest<S: FrameSource>(source: S) -> Result<IngestHandle> {
        MediaIngestLoop::start(source, Arc::new(RawFileOpener), IngestOptions::default()).await
    }
}

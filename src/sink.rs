//! Recording sink traits.

use std::path::Path;

use crate::types::VideoFrame;
use crate::Result;

/// Fixed parameters a sink needs when it is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkSpec {
    /// Nominal frames per second of the incoming stream.
    pub frame_rate: f64,
    /// Expected frame width in pixels.
    pub width: u32,
    /// Expected frame height in pixels.
    pub height: u32,
}

impl Default for SinkSpec {
    fn default() -> Self {
        // Matches the stream profile the recorder was originally tuned for.
        Self { frame_rate: 20.0, width: 1920, height: 1080 }
    }
}

/// Trait for recording destinations.
///
/// The ingest loop appends frames strictly in arrival order and calls
/// `finalize` exactly once. `finalize` must not return until everything
/// appended before it is durable.
pub trait RecordingSink: Send {
    /// Append one frame. Called at most once per captured frame.
    fn append(&mut self, frame: &VideoFrame) -> Result<()>;

    /// Flush and close the sink, guaranteeing durability of all appended
    /// frames on return.
    fn finalize(&mut self) -> Result<()>;
}

/// Opens recording sinks on demand.
///
/// `start_recording` calls this lazily from the caller's context, so a
/// destination that cannot be opened surfaces synchronously there.
pub trait SinkOpener: Send + Sync + 'static {
    fn open(&self, destination: &Path, spec: &SinkSpec) -> Result<Box<dyn RecordingSink>>;
}

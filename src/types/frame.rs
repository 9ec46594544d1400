//! Frame types for the media ingest loop.

use std::sync::Arc;
use std::time::Instant;

/// One frame as produced by a [`FrameSource`](crate::source::FrameSource).
///
/// The source decodes (or passes through) whatever its transport yields; the
/// ingest loop assigns sequencing and routing on top.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Encoded or decoded image bytes, as delivered by the transport.
    pub data: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self { data, width, height }
    }
}

/// One delivered frame.
///
/// Ownership is handed off per frame: the ingest loop does not retain frames
/// after delivery, and consumers share the payload cheaply via `Arc`.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Frame payload (zero-copy via Arc).
    pub data: Arc<[u8]>,

    /// Monotonically increasing sequence number, starting at 1 for the first
    /// frame delivered by a loop instance. Survives reconnects.
    pub seq: u64,

    /// Image width in pixels.
    pub width: u32,

    /// Image height in pixels.
    pub height: u32,

    /// When the frame was read from the transport.
    pub captured_at: Instant,

    /// Snapshot of the recording flag taken when this frame was routed. A
    /// frame with `recorded == true` was appended to the sink exactly once.
    pub recorded: bool,
}

impl VideoFrame {
    /// Wrap a raw frame with its sequence number and recording snapshot.
    pub fn from_raw(raw: RawFrame, seq: u64, recorded: bool) -> Self {
        Self {
            data: raw.data.into(),
            seq,
            width: raw.width,
            height: raw.height,
            captured_at: Instant::now(),
            recorded,
        }
    }
}

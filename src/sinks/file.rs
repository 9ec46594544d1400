//! Recording sink writing frame payloads verbatim to a file.
//!
//! No container, no transcoding: whatever the source produced (JPEG
//! snapshots, an elementary H.264 stream) lands on disk back to back. That
//! keeps the durability story simple — finalize is a flush plus fsync — and
//! leaves muxing to offline tooling.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::sink::{RecordingSink, SinkOpener, SinkSpec};
use crate::types::VideoFrame;
use crate::{CameraError, Result};

/// Appends raw frame payloads to a buffered file.
pub struct RawFileSink {
    writer: BufWriter<File>,
    path: PathBuf,
    frames_written: u64,
}

impl RawFileSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| CameraError::recording_error(path.clone(), e))?;
        Ok(Self { writer: BufWriter::new(file), path, frames_written: 0 })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl RecordingSink for RawFileSink {
    fn append(&mut self, frame: &VideoFrame) -> Result<()> {
        self.writer
            .write_all(&frame.data)
            .map_err(|e| CameraError::recording_error(self.path.clone(), e))?;
        self.frames_written += 1;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| CameraError::recording_error(self.path.clone(), e))?;
        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| CameraError::recording_error(self.path.clone(), e))?;
        debug!(path = %self.path.display(), frames = self.frames_written, "recording file finalized");
        Ok(())
    }
}

/// Opens [`RawFileSink`]s. The [`SinkSpec`] is accepted for interface parity
/// but a raw byte sink has no use for frame rate or dimensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFileOpener;

impl SinkOpener for RawFileOpener {
    fn open(&self, destination: &Path, _spec: &SinkSpec) -> Result<Box<dyn RecordingSink>> {
        Ok(Box::new(RawFileSink::create(destination)?))
    }
}

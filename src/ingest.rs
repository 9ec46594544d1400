//! Media ingest loop: continuous frame pull with stall recovery and an
//! optional recording tee.
//!
//! The loop owns its [`FrameSource`] exclusively and runs on a dedicated
//! task. Frames are handed off through a single-slot watch channel — bounded
//! by construction, latest-wins under backpressure — so a slow consumer costs
//! freshness, never unbounded latency.
//!
//! Transient read failures are absorbed with a short backoff; past a
//! threshold the transport is torn down and reopened with a cooldown, forever
//! if need be. The loop only ever ends through explicit cancellation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::sink::{RecordingSink, SinkOpener, SinkSpec};
use crate::source::FrameSource;
use crate::types::{StreamState, VideoFrame};
use crate::Result;

/// Default consecutive-failure threshold before a full reconnect.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 30;

/// Default wait between failed reads below the threshold.
pub const DEFAULT_READ_BACKOFF: Duration = Duration::from_millis(100);

/// Default cooldown between reconnect attempts.
pub const DEFAULT_RECONNECT_COOLDOWN: Duration = Duration::from_secs(1);

/// Tuning knobs for a [`MediaIngestLoop`].
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Failed reads tolerated before tearing the transport down.
    pub failure_threshold: u32,
    /// Wait between failed reads below the threshold.
    pub read_backoff: Duration,
    /// Wait between transport reopen attempts.
    pub reconnect_cooldown: Duration,
    /// Parameters handed to the recording sink when one is opened.
    pub sink_spec: SinkSpec,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            read_backoff: DEFAULT_READ_BACKOFF,
            reconnect_cooldown: DEFAULT_RECONNECT_COOLDOWN,
            sink_spec: SinkSpec::default(),
        }
    }
}

/// Result of a [`start_recording`](IngestHandle::start_recording) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingStart {
    /// A sink was opened and frames are now being appended.
    Started,
    /// A recording was already active; the call was a no-op.
    AlreadyActive,
}

struct ActiveRecording {
    sink: Box<dyn RecordingSink>,
    path: PathBuf,
}

/// Recording state shared between the caller and the loop task.
///
/// Single-writer discipline: only `start_recording`/`stop_recording` flip the
/// flag; the loop reads it once per frame and appends under the slot lock, so
/// a frame is either fully routed to the sink or not routed at all.
struct RecordingShared {
    active: AtomicBool,
    slot: Mutex<Option<ActiveRecording>>,
}

impl RecordingShared {
    fn new() -> Self {
        Self { active: AtomicBool::new(false), slot: Mutex::new(None) }
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Option<ActiveRecording>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Spawns and manages media ingest tasks.
pub struct MediaIngestLoop;

impl MediaIngestLoop {
    /// Open the source and start the ingest task.
    ///
    /// The initial open is the one failure surfaced to the caller: with no
    /// transport there is no loop to run, and the caller must restart. Every
    /// later failure is handled inside the task.
    pub async fn start<S>(
        source: S,
        opener: Arc<dyn SinkOpener>,
        options: IngestOptions,
    ) -> Result<IngestHandle>
    where
        S: FrameSource,
    {
        let mut source = source;
        source.open().await?;
        info!("media transport opened");

        let (frame_tx, frame_rx) = watch::channel(None);
        let (state_tx, state_rx) = watch::channel(StreamState::Streaming);
        let cancel = CancellationToken::new();
        let recording = Arc::new(RecordingShared::new());

        let task = tokio::spawn(Self::ingest_task(
            source,
            frame_tx,
            state_tx,
            Arc::clone(&recording),
            cancel.clone(),
            options,
        ));

        Ok(IngestHandle {
            frames: frame_rx,
            state: state_rx,
            recording,
            opener,
            sink_spec: options.sink_spec,
            cancel,
            task: Mutex::new(Some(task)),
        })
    }

    /// Ingest task: pull frames, absorb failures, tee to the recorder.
    async fn ingest_task<S>(
        mut source: S,
        frame_tx: watch::Sender<Option<Arc<VideoFrame>>>,
        state_tx: watch::Sender<StreamState>,
        recording: Arc<RecordingShared>,
        cancel: CancellationToken,
        options: IngestOptions,
    ) where
        S: FrameSource,
    {
        info!("ingest task started");
        let mut seq = 0u64;
        let mut failures = 0u32;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("ingest task cancelled during read");
                    break;
                }
                result = source.read_frame() => result,
            };

            match result {
                Ok(Some(raw)) => {
                    failures = 0;
                    seq += 1;

                    // One flag read per frame; the append (if any) happens
                    // entirely under the slot lock.
                    let flagged = recording.active.load(Ordering::Acquire);
                    let mut frame = VideoFrame::from_raw(raw, seq, flagged);
                    if flagged {
                        Self::append_to_recorder(&recording, &mut frame);
                    }

                    trace!(seq = frame.seq, recorded = frame.recorded, "frame delivered");
                    if frame_tx.send(Some(Arc::new(frame))).is_err() {
                        debug!("frame receiver dropped, shutting down");
                        break;
                    }
                }
                Ok(None) | Err(_) => {
                    failures += 1;
                    match &result {
                        Ok(None) => debug!(failures, "media stream reported end of stream"),
                        Err(e) => debug!(failures, error = %e, "frame read failed"),
                        _ => unreachable!(),
                    }

                    if failures < options.failure_threshold {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(options.read_backoff) => {}
                        }
                    } else {
                        warn!(failures, "failure threshold reached, reconnecting");
                        let _ = state_tx.send(StreamState::Reconnecting);
                        if !Self::reconnect(&mut source, &cancel, &options).await {
                            break;
                        }
                        failures = 0;
                        let _ = state_tx.send(StreamState::Streaming);
                    }
                }
            }
        }

        // Stopping: release everything before reporting the terminal state.
        source.close().await;
        Self::finalize_recorder(&recording);
        let _ = frame_tx.send(None);
        let _ = state_tx.send(StreamState::Stopped);
        info!(frames = seq, "ingest task ended");
    }

    /// Close and reopen the transport until it comes back or we are
    /// cancelled. Returns false on cancellation.
    async fn reconnect<S>(source: &mut S, cancel: &CancellationToken, options: &IngestOptions) -> bool
    where
        S: FrameSource,
    {
        source.close().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("ingest task cancelled while reconnecting");
                    return false;
                }
                _ = tokio::time::sleep(options.reconnect_cooldown) => {}
            }

            match source.open().await {
                Ok(()) => {
                    info!("media transport reopened");
                    return true;
                }
                Err(e) => {
                    warn!(error = %e, "reconnect attempt failed, retrying");
                }
            }
        }
    }

    fn append_to_recorder(recording: &RecordingShared, frame: &mut VideoFrame) {
        let mut slot = recording.lock_slot();
        match slot.as_mut() {
            Some(active) => {
                if let Err(e) = active.sink.append(frame) {
                    // A broken recorder must not take the live stream down:
                    // close what was written and keep delivering.
                    warn!(error = %e, path = %active.path.display(),
                        "recording append failed, stopping recording");
                    recording.active.store(false, Ordering::Release);
                    if let Some(mut failed) = slot.take() {
                        if let Err(e) = failed.sink.finalize() {
                            warn!(error = %e, "failed to finalize broken recording sink");
                        }
                    }
                    frame.recorded = false;
                }
            }
            // stop_recording() won the race between the flag read and here.
            None => frame.recorded = false,
        }
    }

    fn finalize_recorder(recording: &RecordingShared) {
        recording.active.store(false, Ordering::Release);
        if let Some(mut active) = recording.lock_slot().take() {
            if let Err(e) = active.sink.finalize() {
                warn!(error = %e, path = %active.path.display(),
                    "failed to finalize recording sink on shutdown");
            } else {
                info!(path = %active.path.display(), "recording finalized on shutdown");
            }
        }
    }
}

/// Handle to a running ingest loop.
///
/// Frames and stream state are observed through watch channels; recording is
/// controlled synchronously from the caller's context.
pub struct IngestHandle {
    frames: watch::Receiver<Option<Arc<VideoFrame>>>,
    state: watch::Receiver<StreamState>,
    recording: Arc<RecordingShared>,
    opener: Arc<dyn SinkOpener>,
    sink_spec: SinkSpec,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl IngestHandle {
    /// Watch receiver over the latest delivered frame.
    pub fn frames(&self) -> watch::Receiver<Option<Arc<VideoFrame>>> {
        self.frames.clone()
    }

    /// Stream of delivered frames, in capture order, at most one buffered.
    ///
    /// Leading `None` values (no frame delivered yet) are skipped so the
    /// stream stays alive while the transport warms up; after the first
    /// frame, `None` marks the end of the loop and terminates the stream.
    pub fn subscribe(&self) -> impl Stream<Item = Arc<VideoFrame>> + use<> {
        WatchStream::new(self.frames.clone())
            .skip_while(|opt| {
                let is_none = opt.is_none();
                async move { is_none }
            })
            .take_while(|opt| {
                let is_some = opt.is_some();
                async move { is_some }
            })
            .filter_map(|opt| async move { opt })
    }

    /// Current stream state.
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Watch receiver over stream state transitions.
    pub fn state_changes(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    /// True while a recording sink is active.
    pub fn is_recording(&self) -> bool {
        self.recording.active.load(Ordering::Acquire)
    }

    /// Open a recording sink for `destination` and start teeing frames.
    ///
    /// No-op reported as [`RecordingStart::AlreadyActive`] when a recording
    /// is already running. Sink-open failures surface here, synchronously.
    pub fn start_recording(&self, destination: impl AsRef<Path>) -> Result<RecordingStart> {
        let destination = destination.as_ref();
        let mut slot = self.recording.lock_slot();
        if slot.is_some() {
            debug!(path = %destination.display(), "recording already active");
            return Ok(RecordingStart::AlreadyActive);
        }

        let sink = self.opener.open(destination, &self.sink_spec)?;
        *slot = Some(ActiveRecording { sink, path: destination.to_path_buf() });
        self.recording.active.store(true, Ordering::Release);
        info!(path = %destination.display(), "recording started");
        Ok(RecordingStart::Started)
    }

    /// Stop recording and finalize the sink before returning.
    ///
    /// Returns the recorded path, or `None` when no recording was active.
    /// The output file is complete and closed the moment this returns.
    pub fn stop_recording(&self) -> Option<PathBuf> {
        self.recording.active.store(false, Ordering::Release);
        let mut active = self.recording.lock_slot().take()?;

        if let Err(e) = active.sink.finalize() {
            warn!(error = %e, path = %active.path.display(), "recording finalize failed");
        } else {
            info!(path = %active.path.display(), "recording stopped");
        }
        Some(active.path)
    }

    /// Cancel the loop and wait for it to release its resources.
    ///
    /// Idempotent; an in-flight read is abandoned, not awaited. The transport
    /// and any active recording sink are closed before this returns.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl Drop for IngestHandle {
    fn drop(&mut self) {
        // Cancel on drop for clean shutdown; the task finalizes the recorder.
        self.cancel.cancel();
    }
}

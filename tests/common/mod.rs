//! Shared mocks for integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;

use ptzlink::session::{Command, CommandEnvelope, DeviceInfo};
use ptzlink::types::DispatchOutcome;
use ptzlink::{
    CameraConfig, CameraError, ControlTransport, FrameSource, RawFrame, RecordingSink, Result,
    SinkOpener, SinkSpec, VideoFrame,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("ptzlink=debug").try_init();
}

pub fn test_config() -> CameraConfig {
    CameraConfig::new("127.0.0.1", "admin", "secret")
}

// ---------------------------------------------------------------------------
// Control transport mock

/// Records every command it is asked to send, with optional per-send latency
/// and connect-time auth rejection.
pub struct MockTransport {
    pub sent: Arc<Mutex<Vec<Command>>>,
    pub probes: Arc<AtomicU32>,
    pub latency: Duration,
    pub reject_auth: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            probes: Arc::new(AtomicU32::new(0)),
            latency: Duration::ZERO,
            reject_auth: false,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn rejecting_auth(mut self) -> Self {
        self.reject_auth = true;
        self
    }

    pub fn sent_commands(&self) -> Vec<Command> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ControlTransport for MockTransport {
    async fn open(&self, _config: &CameraConfig) -> Result<(String, Option<DeviceInfo>)> {
        if self.reject_auth {
            return Err(CameraError::connection_failed("device rejected credentials"));
        }
        Ok(("Profile_1".to_string(), None))
    }

    async fn send(&self, envelope: &CommandEnvelope) -> DispatchOutcome {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.sent.lock().unwrap().push(envelope.command.clone());
        DispatchOutcome::Delivered
    }

    async fn probe(&self) -> Result<()> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Frame source mock

/// One scripted `read_frame` result.
pub enum ReadStep {
    Frame(Vec<u8>),
    Fail,
    Eof,
}

/// Plays back a script of read results, then pends forever.
///
/// With a gate attached, each successful frame read waits for a consumer
/// permit, so delivery runs in lockstep with the test and the single-slot
/// hand-off never overwrites an unobserved frame.
pub struct ScriptedSource {
    steps: Arc<Mutex<VecDeque<ReadStep>>>,
    gate: Option<Arc<Semaphore>>,
    pub opens: Arc<AtomicU32>,
    pub closes: Arc<AtomicU32>,
    open_failures: Arc<AtomicU32>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = ReadStep>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            gate: None,
            opens: Arc::new(AtomicU32::new(0)),
            closes: Arc::new(AtomicU32::new(0)),
            open_failures: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Sequence of `count` frames whose payload encodes their position.
    pub fn frames(count: u32) -> Vec<ReadStep> {
        (1..=count).map(|n| ReadStep::Frame(n.to_be_bytes().to_vec())).collect()
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Fail the next `count` open attempts.
    pub fn failing_opens(self, count: u32) -> Self {
        self.open_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Handle for scripting open failures after the source has been moved
    /// into a loop.
    pub fn open_failures_handle(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.open_failures)
    }

    pub fn open_count(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl FrameSource for ScriptedSource {
    async fn open(&mut self) -> Result<()> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.open_failures.load(Ordering::SeqCst) > 0 {
            self.open_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(CameraError::stream_open_failed("scripted open failure"));
        }
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        let next_is_frame =
            matches!(self.steps.lock().unwrap().front(), Some(ReadStep::Frame(_)));
        if next_is_frame {
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
        }

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(ReadStep::Frame(data)) => Ok(Some(RawFrame::new(data, 640, 480))),
            Some(ReadStep::Fail) => Err(CameraError::stream_read_failed("scripted read failure")),
            Some(ReadStep::Eof) => Ok(None),
            None => futures::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Recording sink mock

/// In-memory recorder observable from the test after the sink is boxed away.
#[derive(Clone)]
pub struct MemoryRecorder {
    pub appended: Arc<Mutex<Vec<Vec<u8>>>>,
    pub finalized: Arc<AtomicBool>,
    pub opened_paths: Arc<Mutex<Vec<PathBuf>>>,
    fail_appends: Arc<AtomicBool>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self {
            appended: Arc::new(Mutex::new(Vec::new())),
            finalized: Arc::new(AtomicBool::new(false)),
            opened_paths: Arc::new(Mutex::new(Vec::new())),
            fail_appends: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing_appends(self) -> Self {
        self.fail_appends.store(true, Ordering::SeqCst);
        self
    }

    pub fn opener(&self) -> Arc<dyn SinkOpener> {
        Arc::new(self.clone())
    }

    pub fn appended_payloads(&self) -> Vec<Vec<u8>> {
        self.appended.lock().unwrap().clone()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::SeqCst)
    }
}

impl SinkOpener for MemoryRecorder {
    fn open(&self, destination: &Path, _spec: &SinkSpec) -> Result<Box<dyn RecordingSink>> {
        self.opened_paths.lock().unwrap().push(destination.to_path_buf());
        Ok(Box::new(MemorySink { shared: self.clone() }))
    }
}

struct MemorySink {
    shared: MemoryRecorder,
}

impl RecordingSink for MemorySink {
    fn append(&mut self, frame: &VideoFrame) -> Result<()> {
        if self.shared.fail_appends.load(Ordering::SeqCst) {
            return Err(CameraError::recording_error(
                PathBuf::from("memory"),
                std::io::Error::other("scripted append failure"),
            ));
        }
        self.shared.appended.lock().unwrap().push(frame.data.to_vec());
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.shared.finalized.store(true, Ordering::SeqCst);
        Ok(())
    }
}

//! Frame source backed by a camera's HTTP snapshot endpoint.
//!
//! Many cameras expose a plain `GET /snapshot`-style endpoint returning one
//! JPEG per request. Polled at a fixed rate this makes a serviceable low-rate
//! video feed with no streaming stack at all, and it exercises the same
//! ingest path an RTSP source would.

use std::time::Duration;

use reqwest::Client;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::debug;

use crate::source::FrameSource;
use crate::types::RawFrame;
use crate::{CameraError, Result};

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval-paced JPEG snapshot puller.
///
/// Each `read_frame` waits for the next tick, then fetches one snapshot, so
/// frames arrive at the nominal rate regardless of how fast the endpoint
/// answers. Reported dimensions are the advertised stream profile, not read
/// out of the JPEG.
pub struct HttpSnapshotSource {
    client: Client,
    url: String,
    period: Duration,
    width: u32,
    height: u32,
    ticker: Option<Interval>,
}

impl HttpSnapshotSource {
    /// Source pulling `frame_rate` snapshots per second from `url`.
    pub fn new(url: impl Into<String>, frame_rate: f64) -> Self {
        let rate = if frame_rate > 0.0 { frame_rate } else { 1.0 };
        Self {
            client: Client::new(),
            url: url.into(),
            period: Duration::from_secs_f64(1.0 / rate),
            width: 1920,
            height: 1080,
            ticker: None,
        }
    }

    /// Override the advertised frame dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(&self.url)
            .timeout(SNAPSHOT_TIMEOUT)
            .send()
            .await
            .map_err(|e| CameraError::stream_read_failed(format!("snapshot request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CameraError::stream_read_failed(format!(
                "snapshot endpoint answered with status {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CameraError::stream_read_failed(format!("snapshot body read failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl FrameSource for HttpSnapshotSource {
    async fn open(&mut self) -> Result<()> {
        // One fetch up front proves the endpoint is reachable and the
        // credentials (if any, baked into the URL) are accepted.
        self.fetch().await.map_err(|e| {
            CameraError::stream_open_failed_with_source(
                format!("snapshot endpoint {} unreachable", self.url),
                Box::new(e),
            )
        })?;

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        debug!(url = %self.url, period = ?self.period, "snapshot source opened");
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        let Some(ticker) = self.ticker.as_mut() else {
            return Err(CameraError::stream_read_failed("source is not open"));
        };
        ticker.tick().await;

        let data = self.fetch().await?;
        Ok(Some(RawFrame { data, width: self.width, height: self.height }))
    }

    async fn close(&mut self) {
        self.ticker = None;
    }
}

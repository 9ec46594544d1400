//! Normalized continuous-motion velocity.

use serde::{Deserialize, Serialize};

/// A normalized (pan, tilt, zoom) velocity triple, each axis in `[-1.0, 1.0]`.
///
/// Zero on an axis means "no motion on that axis", not "stop": a stop is a
/// distinct command on the wire. Values are clamped at construction so a
/// velocity can always be templated straight into an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub pan: f32,
    pub tilt: f32,
    pub zoom: f32,
}

impl Velocity {
    /// Create a velocity, clamping each axis into `[-1.0, 1.0]`.
    pub fn new(pan: f32, tilt: f32, zoom: f32) -> Self {
        Self {
            pan: pan.clamp(-1.0, 1.0),
            tilt: tilt.clamp(-1.0, 1.0),
            zoom: zoom.clamp(-1.0, 1.0),
        }
    }

    /// This velocity with every axis multiplied by `factor`.
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.pan * factor, self.tilt * factor, self.zoom * factor)
    }

    /// True when no axis carries motion.
    pub fn is_stationary(&self) -> bool {
        self.pan == 0.0 && self.tilt == 0.0 && self.zoom == 0.0
    }
}

//! Camera endpoint configuration.

use serde::{Deserialize, Serialize};

/// Connection parameters for one camera.
///
/// This is an explicit value passed into `connect()`; the library keeps no
/// process-wide camera state. Deserializable so callers can load it from a
/// config file.
#[derive(Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Device host or IP address.
    pub host: String,

    /// ONVIF control port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Authentication username.
    pub username: String,

    /// Authentication password.
    pub password: String,
}

fn default_port() -> u16 {
    80
}

impl CameraConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self { host: host.into(), port: default_port(), username: username.into(), password: password.into() }
    }

    /// Set a non-default control port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Base URL of the device's ONVIF service tree.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

// Manual Debug keeps the password out of logs.
impl std::fmt::Debug for CameraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

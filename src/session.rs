//! Authenticated session state and command envelope templating.
//!
//! A [`Session`] is established once by the dispatcher's `connect()` and is
//! read-only afterwards, so it can be shared across concurrent dispatch calls
//! without locking. Envelope construction is pure templating over session
//! state — no I/O happens here, which is what keeps the per-command cost on
//! the calling thread negligible.

use base64::Engine;
use sha1::{Digest, Sha1};

use crate::config::CameraConfig;
use crate::types::Velocity;

/// Device identity reported at connect time.
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
    pub firmware: String,
}

/// One control-plane command, pre-templating.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start or update continuous motion at the given velocity.
    ContinuousMove(Velocity),
    /// Halt motion on all axes.
    Stop,
    /// Recall a stored position by its opaque preset token.
    GotoPreset { token: String, speed: f32 },
}

/// A fully-formed, immediately-transmittable request.
///
/// `body` is the rendered SOAP envelope; transports that speak ONVIF post it
/// verbatim, while test transports inspect `command` instead.
#[derive(Debug, Clone)]
pub struct CommandEnvelope {
    pub command: Command,
    pub body: String,
}

/// Opaque authenticated handle to a camera's control endpoint.
///
/// Holds the target address, credentials, and the profile token resolved
/// during connect. At most one session exists per dispatcher instance.
#[derive(Debug, Clone)]
pub struct Session {
    config: CameraConfig,
    profile_token: String,
    device: Option<DeviceInfo>,
}

impl Session {
    pub fn new(config: CameraConfig, profile_token: String, device: Option<DeviceInfo>) -> Self {
        Self { config, profile_token, device }
    }

    /// The media/PTZ profile this session acts on.
    pub fn profile_token(&self) -> &str {
        &self.profile_token
    }

    /// Device identity reported during connect, when available.
    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    /// Endpoint configuration this session was established against.
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Build a transmittable envelope for `command`.
    ///
    /// Pure templating: a fresh WS-Security header is computed (nonce,
    /// timestamp, password digest) but nothing touches the network.
    pub fn envelope(&self, command: Command) -> CommandEnvelope {
        let body = match &command {
            Command::ContinuousMove(velocity) => self.continuous_move_body(*velocity),
            Command::Stop => self.stop_body(),
            Command::GotoPreset { token, speed } => self.goto_preset_body(token, *speed),
        };
        CommandEnvelope { command, body }
    }

    fn continuous_move_body(&self, velocity: Velocity) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:tptz="http://www.onvif.org/ver20/ptz/wsdl" xmlns:tt="http://www.onvif.org/ver10/schema">
  {header}
  <s:Body>
    <tptz:ContinuousMove>
      <tptz:ProfileToken>{token}</tptz:ProfileToken>
      <tptz:Velocity>
        <tt:PanTilt x="{pan:.3}" y="{tilt:.3}"/>
        <tt:Zoom x="{zoom:.3}"/>
      </tptz:Velocity>
    </tptz:ContinuousMove>
  </s:Body>
</s:Envelope>"#,
            header = self.security_header(),
            token = self.profile_token,
            pan = velocity.pan,
            tilt = velocity.tilt,
            zoom = velocity.zoom,
        )
    }

    fn stop_body(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:tptz="http://www.onvif.org/ver20/ptz/wsdl">
  {header}
  <s:Body>
    <tptz:Stop>
      <tptz:ProfileToken>{token}</tptz:ProfileToken>
      <tptz:PanTilt>true</tptz:PanTilt>
      <tptz:Zoom>true</tptz:Zoom>
    </tptz:Stop>
  </s:Body>
</s:Envelope>"#,
            header = self.security_header(),
            token = self.profile_token,
        )
    }

    fn goto_preset_body(&self, preset: &str, speed: f32) -> String {
        let speed = speed.clamp(0.0, 1.0);
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:tptz="http://www.onvif.org/ver20/ptz/wsdl" xmlns:tt="http://www.onvif.org/ver10/schema">
  {header}
  <s:Body>
    <tptz:GotoPreset>
      <tptz:ProfileToken>{token}</tptz:ProfileToken>
      <tptz:PresetToken>{preset}</tptz:PresetToken>
      <tptz:Speed>
        <tt:PanTilt x="{speed:.3}" y="{speed:.3}"/>
        <tt:Zoom x="{speed:.3}"/>
      </tptz:Speed>
    </tptz:GotoPreset>
  </s:Body>
</s:Envelope>"#,
            header = self.security_header(),
            token = self.profile_token,
            preset = preset,
            speed = speed,
        )
    }

    pub(crate) fn security_header(&self) -> String {
        security_header(&self.config)
    }
}

/// WS-Security UsernameToken header with a fresh nonce and timestamp.
///
/// Password digest per the ONVIF profile: Base64(SHA1(nonce + created +
/// password)). Free-standing because transports need it for service queries
/// made before any session exists.
pub(crate) fn security_header(config: &CameraConfig) -> String {
    let nonce: [u8; 16] = rand::random();
    let created = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let mut hasher = Sha1::new();
    hasher.update(nonce);
    hasher.update(created.as_bytes());
    hasher.update(config.password.as_bytes());
    let digest = hasher.finalize();

    let encoder = base64::engine::general_purpose::STANDARD;
    format!(
        r#"<s:Header>
    <Security xmlns="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd" s:mustUnderstand="true">
      <UsernameToken>
        <Username>{username}</Username>
        <Password Type="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest">{digest}</Password>
        <Nonce EncodingType="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary">{nonce}</Nonce>
        <Created xmlns="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">{created}</Created>
      </UsernameToken>
    </Security>
  </s:Header>"#,
        username = config.username,
        digest = encoder.encode(digest),
        nonce = encoder.encode(nonce),
        created = created,
    )
}

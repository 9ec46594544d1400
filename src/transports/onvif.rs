//! ONVIF control transport over plain HTTP SOAP.
//!
//! Speaks just enough of the protocol for this library's needs: profile
//! resolution and device identification at open, PTZ command posts, and a
//! HEAD probe for keep-alive. Responses are picked apart with plain string
//! scanning rather than an XML stack; the handful of fields read here are
//! flat text elements and one attribute, and camera firmwares are far less
//! strict about their XML than any real parser would be.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::CameraConfig;
use crate::session::{self, CommandEnvelope, DeviceInfo};
use crate::transport::ControlTransport;
use crate::types::DispatchOutcome;
use crate::{CameraError, Result};

const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// Timeout for the connect-time service queries.
const OPEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for fire-and-forget command posts and probes. Short on purpose: a
/// command this stale is worthless, the next one has already superseded it.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
struct Endpoints {
    device_url: String,
    ptz_url: String,
}

impl Endpoints {
    fn for_config(config: &CameraConfig) -> Self {
        let base = config.base_url();
        Self {
            device_url: format!("{base}/onvif/device_service"),
            ptz_url: format!("{base}/onvif/PTZ"),
        }
    }
}

/// [`ControlTransport`] implementation for ONVIF PTZ cameras.
///
/// One pooled HTTP client with connection keep-alive serves every request, so
/// steady-state commands reuse a warm TCP connection and skip the handshake
/// cost. Endpoints resolve on `open` and are fixed afterwards.
pub struct OnvifTransport {
    client: Client,
    endpoints: OnceLock<Endpoints>,
}

impl OnvifTransport {
    pub fn new() -> Self {
        Self { client: Client::new(), endpoints: OnceLock::new() }
    }

    async fn post_service(&self, url: &str, body: String, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .timeout(timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                CameraError::connection_failed_with_source(
                    format!("request to {url} failed"),
                    Box::new(e),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CameraError::connection_failed(format!(
                "{url} answered with status {status}"
            )));
        }

        response.text().await.map_err(|e| {
            CameraError::connection_failed_with_source(
                format!("reading response from {url} failed"),
                Box::new(e),
            )
        })
    }

    async fn query_device_info(
        &self,
        config: &CameraConfig,
        endpoints: &Endpoints,
    ) -> Result<DeviceInfo> {
        let xml = self
            .post_service(
                &endpoints.device_url,
                get_device_information_body(config),
                OPEN_TIMEOUT,
            )
            .await?;

        Ok(DeviceInfo {
            manufacturer: element_text(&xml, "Manufacturer").unwrap_or_default().to_string(),
            model: element_text(&xml, "Model").unwrap_or_default().to_string(),
            firmware: element_text(&xml, "FirmwareVersion").unwrap_or_default().to_string(),
        })
    }
}

impl Default for OnvifTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ControlTransport for OnvifTransport {
    async fn open(&self, config: &CameraConfig) -> Result<(String, Option<DeviceInfo>)> {
        let endpoints = Endpoints::for_config(config);

        let xml = self
            .post_service(&endpoints.device_url, get_profiles_body(config), OPEN_TIMEOUT)
            .await?;
        let profile_token = first_profile_token(&xml).ok_or_else(|| {
            CameraError::parse_error("GetProfiles response", "no profile token found")
        })?;

        // Identity is nice to have in logs but never worth failing connect
        // over; some firmwares gate GetDeviceInformation behind extra auth.
        let device = match self.query_device_info(config, &endpoints).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(error = %e, "device information query failed, continuing without it");
                None
            }
        };

        let _ = self.endpoints.set(endpoints);
        Ok((profile_token, device))
    }

    async fn send(&self, envelope: &CommandEnvelope) -> DispatchOutcome {
        let Some(endpoints) = self.endpoints.get() else {
            return DispatchOutcome::Refused("transport has not been opened".to_string());
        };

        let result = self
            .client
            .post(&endpoints.ptz_url)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .timeout(COMMAND_TIMEOUT)
            .body(envelope.body.clone())
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => DispatchOutcome::Delivered,
            Ok(response) => {
                DispatchOutcome::Refused(format!("device answered with status {}", response.status()))
            }
            Err(e) if e.is_timeout() => DispatchOutcome::TimedOut,
            Err(e) => DispatchOutcome::Refused(e.to_string()),
        }
    }

    async fn probe(&self) -> Result<()> {
        let Some(endpoints) = self.endpoints.get() else {
            return Err(CameraError::connection_failed("transport has not been opened"));
        };

        debug!(url = %endpoints.device_url, "keep-alive probe");
        self.client
            .head(&endpoints.device_url)
            .timeout(COMMAND_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CameraError::Timeout { duration: COMMAND_TIMEOUT }
                } else {
                    CameraError::connection_failed_with_source("probe failed", Box::new(e))
                }
            })?;
        Ok(())
    }
}

fn get_profiles_body(config: &CameraConfig) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:trt="http://www.onvif.org/ver10/media/wsdl">
  {header}
  <s:Body>
    <trt:GetProfiles/>
  </s:Body>
</s:Envelope>"#,
        header = session::security_header(config),
    )
}

fn get_device_information_body(config: &CameraConfig) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:tds="http://www.onvif.org/ver10/device/wsdl">
  {header}
  <s:Body>
    <tds:GetDeviceInformation/>
  </s:Body>
</s:Envelope>"#,
        header = session::security_header(config),
    )
}

/// First `token="..."` attribute in a GetProfiles response.
///
/// Devices list profiles in preference order; the first one is the camera's
/// main stream and the one motion commands should target.
fn first_profile_token(xml: &str) -> Option<String> {
    let start = xml.find("token=\"")? + "token=\"".len();
    let rest = &xml[start..];
    let end = rest.find('"')?;
    let token = &rest[..end];
    (!token.is_empty()).then(|| token.to_string())
}

/// Text content of the first element whose local name is `local`, ignoring
/// any namespace prefix.
fn element_text<'a>(xml: &'a str, local: &str) -> Option<&'a str> {
    let prefixed = format!(":{local}>");
    let bare = format!("<{local}>");
    let start = xml
        .find(&prefixed)
        .map(|i| i + prefixed.len())
        .or_else(|| xml.find(&bare).map(|i| i + bare.len()))?;
    let rest = &xml[start..];
    let end = rest.find('<')?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_derive_from_config() {
        let config = CameraConfig::new("192.168.50.224", "admin", "pw").with_port(2020);
        let endpoints = Endpoints::for_config(&config);
        assert_eq!(endpoints.device_url, "http://192.168.50.224:2020/onvif/device_service");
        assert_eq!(endpoints.ptz_url, "http://192.168.50.224:2020/onvif/PTZ");
    }

    #[test]
    fn profile_token_extraction_takes_the_first() {
        let xml = r#"<trt:Profiles token="MainStream" fixed="true"><tt:Name>main</tt:Name></trt:Profiles><trt:Profiles token="SubStream"/>"#;
        assert_eq!(first_profile_token(xml).as_deref(), Some("MainStream"));
    }

    #[test]
    fn profile_token_extraction_rejects_garbage() {
        assert_eq!(first_profile_token("<s:Fault>not authorized</s:Fault>"), None);
        assert_eq!(first_profile_token(r#"token="""#), None);
    }

    #[test]
    fn element_text_ignores_namespace_prefixes() {
        let xml = "<tds:Manufacturer>TP-Link</tds:Manufacturer><tds:Model>Tapo C200</tds:Model>";
        assert_eq!(element_text(xml, "Manufacturer"), Some("TP-Link"));
        assert_eq!(element_text(xml, "Model"), Some("Tapo C200"));
        assert_eq!(element_text(xml, "FirmwareVersion"), None);
    }

    #[test]
    fn service_request_bodies_carry_auth() {
        let config = CameraConfig::new("cam.local", "admin", "pw");
        let profiles = get_profiles_body(&config);
        assert!(profiles.contains("<trt:GetProfiles/>"));
        assert!(profiles.contains("<Username>admin</Username>"));

        let info = get_device_information_body(&config);
        assert!(info.contains("<tds:GetDeviceInformation/>"));
        assert!(info.contains("PasswordDigest"));
    }
}

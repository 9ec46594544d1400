//! Error types for camera control and media ingest.
//!
//! Only a narrow set of failures is ever surfaced to callers: session
//! establishment, recording-sink problems, and parse failures during profile
//! resolution. Everything transient — a dropped fire-and-forget send, a failed
//! frame read — is handled inside the dispatcher and ingest loop and shows up
//! as a [`DispatchOutcome`](crate::types::DispatchOutcome) or a
//! [`StreamState`](crate::types::StreamState) transition instead.
//!
//! Errors expose [`CameraError::is_retryable`] so callers can decide whether a
//! failed `connect()` is worth another attempt.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for camera operations.
pub type Result<T, E = CameraError> = std::result::Result<T, E>;

/// Main error type for camera control and ingest operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CameraError {
    #[error("failed to establish camera session: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("media transport could not be opened: {reason}")]
    StreamOpen {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("media frame read failed: {reason}")]
    StreamRead { reason: String },

    #[error("recording sink error: {path}")]
    Recording {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("parse error in {context}: {details}")]
    Parse { context: String, details: String },
}

impl CameraError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            CameraError::Connection { .. } => true,
            CameraError::StreamOpen { .. } => true,
            CameraError::StreamRead { .. } => true,
            CameraError::Timeout { .. } => true,
            CameraError::Recording { .. } => false,
            CameraError::Parse { .. } => false,
        }
    }

    /// Helper constructor for session establishment failures.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        CameraError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for session establishment failures with a source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        CameraError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for media open failures.
    pub fn stream_open_failed(reason: impl Into<String>) -> Self {
        CameraError::StreamOpen { reason: reason.into(), source: None }
    }

    /// Helper constructor for media open failures with a source.
    pub fn stream_open_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        CameraError::StreamOpen { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for transient frame read failures.
    pub fn stream_read_failed(reason: impl Into<String>) -> Self {
        CameraError::StreamRead { reason: reason.into() }
    }

    /// Helper constructor for recording sink errors with path context.
    pub fn recording_error(path: PathBuf, source: std::io::Error) -> Self {
        CameraError::Recording { path, source }
    }

    /// Helper constructor for parse failures during profile resolution.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        CameraError::Parse { context: context.into(), details: details.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[cfg(test)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn error_messages_contain_their_context(
                reason in ".*",
                context in "\\w+",
                details in ".*",
                duration_ms in 1u64..60000u64
            ) {
                let connection = CameraError::connection_failed(reason.clone());
                let parse = CameraError::parse_error(context.clone(), details.clone());
                let timeout =
                    CameraError::Timeout { duration: Duration::from_millis(duration_ms) };

                prop_assert!(connection.to_string().contains(&reason));
                prop_assert!(parse.to_string().contains(&context));
                prop_assert!(parse.to_string().contains(&details));
                prop_assert!(!timeout.to_string().is_empty());
            }

            #[test]
            fn source_chaining_preserves_the_underlying_cause(base_message in ".*") {
                let io_err = std::io::Error::other(base_message.clone());
                let wrapped = CameraError::connection_failed_with_source(
                    "device rejected credentials",
                    Box::new(io_err),
                );

                let source = std::error::Error::source(&wrapped)
                    .expect("wrapped error should expose its source");
                prop_assert_eq!(source.to_string(), base_message);
            }
        }
    }

    #[test]
    fn error_constructors_validation() {
        let conn = CameraError::connection_failed("auth failed");
        assert!(matches!(conn, CameraError::Connection { .. }));

        let rec = CameraError::recording_error(
            PathBuf::from("/tmp/out.h264"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(rec, CameraError::Recording { .. }));

        let parse = CameraError::parse_error("GetProfiles", "no profile token");
        assert!(matches!(parse, CameraError::Parse { .. }));
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<CameraError>();

        let error = CameraError::connection_failed("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retryability_classification() {
        assert!(CameraError::connection_failed("x").is_retryable());
        assert!(CameraError::stream_open_failed("x").is_retryable());
        assert!(CameraError::stream_read_failed("x").is_retryable());
        assert!(
            !CameraError::recording_error(
                PathBuf::from("/tmp/out"),
                std::io::Error::other("disk full"),
            )
            .is_retryable()
        );
        assert!(!CameraError::parse_error("GetProfiles", "bad xml").is_retryable());
    }
}

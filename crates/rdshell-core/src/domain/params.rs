//! Connection parameters handed to the remote manager.
//!
//! [`ConnectionParameters`] is a fixed record: exactly eight recognised
//! fields, no extras.  The shell never rewrites it between the user's
//! settings and the manager's `connect` call.
//!
//! # Serde representation
//!
//! The certificate-trust flag is spelled `ignore-cert` on the wire and in the
//! TOML config, matching what the gateway expects:
//!
//! Missing fields take their [`Default`] values; unknown fields are rejected.
//!
//! ```json
//! {"hostname":"192.168.1.33","port":3389,"ignore-cert":true,"dpi":96,
//!  "width":1920,"height":1080,"image":"image/png","audio":"audio/L16"}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by [`ConnectionParameters::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParameterError {
    /// The hostname is empty or whitespace only.
    #[error("hostname must not be empty")]
    EmptyHostname,

    /// Port 0 cannot be dialled.
    #[error("port must be non-zero")]
    ZeroPort,

    /// A numeric field that must be positive was zero.
    #[error("{0} must be greater than zero")]
    ZeroField(&'static str),

    /// A codec field was not a MIME type of the expected top-level kind.
    #[error("{field} must be an {expected}/* mime type, got {value:?}")]
    InvalidMimeType {
        field: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Parameters for one remote-desktop connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionParameters {
    /// Remote host name or IP address as seen from the gateway.
    pub hostname: String,
    /// Remote desktop port (RDP is usually 3389).
    pub port: u16,
    /// Accept the remote server's certificate without verification.
    #[serde(rename = "ignore-cert")]
    pub ignore_cert: bool,
    /// Requested DPI of the remote session.
    pub dpi: u32,
    /// Requested remote desktop width in pixels.
    pub width: u32,
    /// Requested remote desktop height in pixels.
    pub height: u32,
    /// Image codec MIME type, e.g. `image/png`.
    pub image: String,
    /// Audio codec MIME type, e.g. `audio/L16`.
    pub audio: String,
}

impl Default for ConnectionParameters {
    /// | Field        | Default       |
    /// |--------------|---------------|
    /// | hostname     | `localhost`   |
    /// | port         | `3389`        |
    /// | ignore-cert  | `false`       |
    /// | dpi          | `96`          |
    /// | width        | `1024`        |
    /// | height       | `768`         |
    /// | image        | `image/png`   |
    /// | audio        | `audio/L16`   |
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: 3389,
            ignore_cert: false,
            dpi: 96,
            width: 1024,
            height: 768,
            image: "image/png".to_string(),
            audio: "audio/L16".to_string(),
        }
    }
}

impl ConnectionParameters {
    /// Checks the record before it is sent to the manager.
    ///
    /// Validation never alters the record; a valid record is forwarded as-is.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParameterError`] found, checking fields in
    /// declaration order.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.hostname.trim().is_empty() {
            return Err(ParameterError::EmptyHostname);
        }
        if self.port == 0 {
            return Err(ParameterError::ZeroPort);
        }
        for (name, value) in [("dpi", self.dpi), ("width", self.width), ("height", self.height)] {
            if value == 0 {
                return Err(ParameterError::ZeroField(name));
            }
        }
        check_mime("image", "image", &self.image)?;
        check_mime("audio", "audio", &self.audio)?;
        Ok(())
    }
}

fn check_mime(field: &'static str, expected: &'static str, value: &str) -> Result<(), ParameterError> {
    match value.split_once('/') {
        Some((kind, subtype)) if kind == expected && !subtype.is_empty() => Ok(()),
        _ => Err(ParameterError::InvalidMimeType {
            field,
            expected,
            value: value.to_string(),
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lab_host() -> ConnectionParameters {
        ConnectionParameters {
            hostname: "192.168.1.33".to_string(),
            port: 3389,
            ignore_cert: true,
            dpi: 96,
            width: 1920,
            height: 1080,
            image: "image/png".to_string(),
            audio: "audio/L16".to_string(),
        }
    }

    #[test]
    fn test_default_parameters_are_valid() {
        assert_eq!(ConnectionParameters::default().validate(), Ok(()));
    }

    #[test]
    fn test_ignore_cert_serializes_with_hyphen() {
        // Arrange
        let params = lab_host();

        // Act
        let json = serde_json::to_string(&params).unwrap();

        // Assert
        assert!(json.contains(r#""ignore-cert":true"#), "got {json}");
        assert!(!json.contains("ignore_cert"));
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let json = r#"{"hostname":"h","port":1,"ignore-cert":false,"dpi":96,"width":1,
                       "height":1,"image":"image/png","audio":"audio/L16","color-depth":24}"#;
        let result: Result<ConnectionParameters, _> = serde_json::from_str(json);
        assert!(result.is_err(), "unrecognised fields must be rejected");
    }

    #[test]
    fn test_deserialize_full_record() {
        let json = r#"{"hostname":"192.168.1.33","port":3389,"ignore-cert":true,"dpi":96,
                       "width":1920,"height":1080,"image":"image/png","audio":"audio/L16"}"#;
        let params: ConnectionParameters = serde_json::from_str(json).unwrap();
        assert_eq!(params, lab_host());
    }

    #[test]
    fn test_validate_rejects_blank_hostname() {
        let params = ConnectionParameters {
            hostname: "   ".to_string(),
            ..lab_host()
        };
        assert_eq!(params.validate(), Err(ParameterError::EmptyHostname));
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let params = ConnectionParameters { port: 0, ..lab_host() };
        assert_eq!(params.validate(), Err(ParameterError::ZeroPort));
    }

    #[test]
    fn test_validate_names_the_zero_dimension() {
        let params = ConnectionParameters { height: 0, ..lab_host() };
        assert_eq!(params.validate(), Err(ParameterError::ZeroField("height")));
    }

    #[test]
    fn test_validate_rejects_audio_codec_in_image_slot() {
        let params = ConnectionParameters {
            image: "audio/L16".to_string(),
            ..lab_host()
        };
        assert!(matches!(
            params.validate(),
            Err(ParameterError::InvalidMimeType { field: "image", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_mime_without_subtype() {
        let params = ConnectionParameters {
            audio: "audio/".to_string(),
            ..lab_host()
        };
        assert!(params.validate().is_err());
    }
}

use nom::number::complete::be_u8;
use nom::IResult;

use crate::{AbortReason, ProtocolVersion};

/// Alert levels (RFC 5246 Section 7.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Warning,
    Fatal,
    Unknown(u8),
}

impl AlertLevel {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => AlertLevel::Warning,
            2 => AlertLevel::Fatal,
            _ => AlertLevel::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            AlertLevel::Warning => 1,
            AlertLevel::Fatal => 2,
            AlertLevel::Unknown(value) => *value,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], AlertLevel> {
        let (input, value) = be_u8(input)?;
        Ok((input, AlertLevel::from_u8(value)))
    }
}

/// The alert descriptions this engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDescription {
    HandshakeFailure,
    IllegalParameter,
    DecodeError,
    ProtocolVersion,
    NoRenegotiation,
    Unknown(u8),
}

impl AlertDescription {
    pub fn from_u8(value: u8) -> Self {
        match value {
            40 => AlertDescription::HandshakeFailure,
            47 => AlertDescription::IllegalParameter,
            50 => AlertDescription::DecodeError,
            70 => AlertDescription::ProtocolVersion,
            100 => AlertDescription::NoRenegotiation,
            _ => AlertDescription::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            AlertDescription::HandshakeFailure => 40,
            AlertDescription::IllegalParameter => 47,
            AlertDescription::DecodeError => 50,
            AlertDescription::ProtocolVersion => 70,
            AlertDescription::NoRenegotiation => 100,
            AlertDescription::Unknown(value) => *value,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], AlertDescription> {
        let (input, value) = be_u8(input)?;
        Ok((input, AlertDescription::from_u8(value)))
    }
}

/// An alert for the record layer to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

impl Alert {
    pub fn fatal(description: AlertDescription) -> Self {
        Alert {
            level: AlertLevel::Fatal,
            description,
        }
    }

    pub fn warning(description: AlertDescription) -> Self {
        Alert {
            level: AlertLevel::Warning,
            description,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Alert> {
        let (input, level) = AlertLevel::parse(input)?;
        let (input, description) = AlertDescription::parse(input)?;
        Ok((input, Alert { level, description }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.level.as_u8());
        output.push(self.description.as_u8());
    }
}

/// Category recorded locally for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalErrorCode {
    ProtocolVersion,
    MalformedPeerMessage,
    RenegotiationRefused,
    Configuration,
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub code: LocalErrorCode,
    /// `None` when nothing is sent, i.e. the connection was never attempted.
    pub alert: Option<Alert>,
}

/// Map an abort reason to its local code and alert.
///
/// | reason                         | local code             | alert                     |
/// |--------------------------------|------------------------|---------------------------|
/// | `UnsupportedVersion`           | `ProtocolVersion`      | fatal `protocol_version`  |
/// | `DowngradeDetected`            | `MalformedPeerMessage` | fatal `illegal_parameter` |
/// | `RenegotiationNotAllowed`      | `RenegotiationRefused` | warning `no_renegotiation`|
/// | `MalformedVersionField`        | `MalformedPeerMessage` | fatal `decode_error`      |
/// | `IncompatibleConfiguredRanges` | `Configuration`        | none                      |
pub fn classify(reason: AbortReason) -> Classification {
    use AbortReason::*;
    let (code, alert) = match reason {
        UnsupportedVersion => (
            LocalErrorCode::ProtocolVersion,
            Some(Alert::fatal(AlertDescription::ProtocolVersion)),
        ),
        DowngradeDetected => (
            LocalErrorCode::MalformedPeerMessage,
            Some(Alert::fatal(AlertDescription::IllegalParameter)),
        ),
        RenegotiationNotAllowed => (
            LocalErrorCode::RenegotiationRefused,
            Some(Alert::warning(AlertDescription::NoRenegotiation)),
        ),
        MalformedVersionField => (
            LocalErrorCode::MalformedPeerMessage,
            Some(Alert::fatal(AlertDescription::DecodeError)),
        ),
        IncompatibleConfiguredRanges => (LocalErrorCode::Configuration, None),
    };
    Classification { code, alert }
}

/// Like [`classify`] for a connection at `version`.
///
/// SSL 3.0 has no `protocol_version` alert and gets `handshake_failure`.
pub fn classify_for(reason: AbortReason, version: ProtocolVersion) -> Classification {
    let mut classification = classify(reason);
    if version <= ProtocolVersion::SSL3_0 {
        if let Some(alert) = classification.alert.as_mut() {
            if alert.description == AlertDescription::ProtocolVersion {
                alert.description = AlertDescription::HandshakeFailure;
            }
        }
    }
    classification
}

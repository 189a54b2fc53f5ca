use std::fmt;

use nom::number::complete::be_u16;
use nom::IResult;

use crate::AbortReason;

/// Stream (TLS) or datagram (DTLS) flavour of the protocol.
///
/// Both variants share the same version ordinals. Only the wire encoding differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// TLS over a reliable stream.
    Stream,
    /// DTLS over datagrams.
    Datagram,
}

/// A protocol revision.
///
/// The value is the stream (TLS) ordinal, `0x0300` for SSL 3.0 up to `0x0304`
/// for TLS 1.3. Datagram versions map onto the same ordinals, which gives both
/// variants one total order:
///
/// * DTLS 1.0 is TLS 1.1
/// * DTLS 1.2 is TLS 1.2
/// * DTLS 1.3 is TLS 1.3
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(u16);

impl ProtocolVersion {
    pub const SSL3_0: ProtocolVersion = ProtocolVersion(0x0300);
    pub const TLS1_0: ProtocolVersion = ProtocolVersion(0x0301);
    pub const TLS1_1: ProtocolVersion = ProtocolVersion(0x0302);
    pub const TLS1_2: ProtocolVersion = ProtocolVersion(0x0303);
    pub const TLS1_3: ProtocolVersion = ProtocolVersion(0x0304);

    pub const DTLS1_0: ProtocolVersion = ProtocolVersion::TLS1_1;
    pub const DTLS1_2: ProtocolVersion = ProtocolVersion::TLS1_2;
    pub const DTLS1_3: ProtocolVersion = ProtocolVersion::TLS1_3;

    /// Oldest revision that carries the downgrade sentinel and replaces
    /// renegotiation. Versions from here on also fix the legacy version field.
    pub const SENTINEL_ERA: ProtocolVersion = ProtocolVersion::TLS1_3;

    /// Value the legacy version field is pinned to in sentinel-era revisions.
    pub const LEGACY_FIXED: ProtocolVersion = ProtocolVersion::TLS1_2;

    /// All versions known to the stream variant, oldest first.
    pub const fn stream() -> &'static [ProtocolVersion; 5] {
        &[
            ProtocolVersion::SSL3_0,
            ProtocolVersion::TLS1_0,
            ProtocolVersion::TLS1_1,
            ProtocolVersion::TLS1_2,
            ProtocolVersion::TLS1_3,
        ]
    }

    /// All versions known to the datagram variant, oldest first.
    pub const fn datagram() -> &'static [ProtocolVersion; 3] {
        &[
            ProtocolVersion::DTLS1_0,
            ProtocolVersion::DTLS1_2,
            ProtocolVersion::DTLS1_3,
        ]
    }

    /// The raw ordinal.
    pub const fn ordinal(&self) -> u16 {
        self.0
    }

    /// Whether this revision introduced (or follows) the downgrade sentinel.
    pub fn is_sentinel_era(&self) -> bool {
        *self >= Self::SENTINEL_ERA
    }

    /// Whether `variant` has a wire encoding for this version.
    pub fn is_supported_by(&self, variant: Variant) -> bool {
        match variant {
            Variant::Stream => Self::stream().contains(self),
            Variant::Datagram => Self::datagram().contains(self),
        }
    }

    /// Decode a wire value for the given variant.
    ///
    /// Anything not listed for the variant, including the never published
    /// DTLS 1.1 (`0xFEFE`), fails with [`AbortReason::UnsupportedVersion`].
    pub fn from_wire(value: u16, variant: Variant) -> Result<Self, AbortReason> {
        let version = match (variant, value) {
            (Variant::Stream, 0x0300..=0x0304) => ProtocolVersion(value),
            (Variant::Datagram, 0xFEFF) => Self::DTLS1_0,
            (Variant::Datagram, 0xFEFD) => Self::DTLS1_2,
            (Variant::Datagram, 0xFEFC) => Self::DTLS1_3,
            _ => {
                debug!("Unknown {:?} version on the wire: {:#06x}", variant, value);
                return Err(AbortReason::UnsupportedVersion);
            }
        };
        Ok(version)
    }

    /// Encode for the given variant.
    ///
    /// Returns `None` if the variant has no encoding for this version.
    pub fn to_wire(&self, variant: Variant) -> Option<u16> {
        if !self.is_supported_by(variant) {
            return None;
        }
        match variant {
            Variant::Stream => Some(self.0),
            // DTLS versions are using 1-complement.
            Variant::Datagram => Some(match *self {
                Self::DTLS1_0 => 0xFEFF,
                Self::DTLS1_2 => 0xFEFD,
                _ => 0xFEFC,
            }),
        }
    }

    /// Parse a 2-byte big-endian version field.
    pub fn parse(input: &[u8], variant: Variant) -> IResult<&[u8], Result<Self, AbortReason>> {
        let (input, value) = be_u16(input)?;
        Ok((input, Self::from_wire(value, variant)))
    }

    /// Parse a version field from raw bytes, mapping truncated input to
    /// [`AbortReason::MalformedVersionField`].
    pub fn decode(input: &[u8], variant: Variant) -> Result<Self, AbortReason> {
        match Self::parse(input, variant) {
            Ok((_, version)) => version,
            Err(_) => Err(AbortReason::MalformedVersionField),
        }
    }

    pub fn serialize(&self, variant: Variant, output: &mut Vec<u8>) -> Result<(), AbortReason> {
        let wire = self
            .to_wire(variant)
            .ok_or(AbortReason::UnsupportedVersion)?;
        output.extend_from_slice(&wire.to_be_bytes());
        Ok(())
    }

    /// Human readable name for the given variant.
    pub fn name(&self, variant: Variant) -> &'static str {
        match (variant, *self) {
            (Variant::Datagram, Self::DTLS1_0) => "DTLS 1.0",
            (Variant::Datagram, Self::DTLS1_2) => "DTLS 1.2",
            (Variant::Datagram, Self::DTLS1_3) => "DTLS 1.3",
            (_, Self::SSL3_0) => "SSL 3.0",
            (_, Self::TLS1_0) => "TLS 1.0",
            (_, Self::TLS1_1) => "TLS 1.1",
            (_, Self::TLS1_2) => "TLS 1.2",
            (_, Self::TLS1_3) => "TLS 1.3",
            _ => "unknown",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name(Variant::Stream) {
            "unknown" => write!(f, "{:#06x}", self.0),
            name => f.write_str(name),
        }
    }
}

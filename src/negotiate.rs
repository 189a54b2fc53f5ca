//! Version selection.
//!
//! The client offers its maximum, both in the legacy version field and, when
//! it reaches TLS 1.3, as a descending list in the `supported_versions`
//! extension (RFC 8446 Section 4.2.1). The server picks the greatest version
//! not above the offer that falls in its own range.

use arrayvec::ArrayVec;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

use crate::{AbortReason, ProtocolVersion, Variant, VersionRange};

/// Maximum number of versions we track in a `supported_versions` list.
pub const MAX_VERSIONS: usize = 8;

pub type VersionList = ArrayVec<ProtocolVersion, MAX_VERSIONS>;

/// Which end of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    Server,
}

/// What the peer put on the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerOffer {
    /// Legacy single version offer from a client.
    Version(ProtocolVersion),
    /// `supported_versions` list from a client.
    SupportedVersions(VersionList),
    /// The version a server selected.
    Selected(ProtocolVersion),
}

/// Version a client puts in its hello.
///
/// This is also the value of the legacy version field, it is never capped.
pub fn propose_client_version(range: &VersionRange) -> ProtocolVersion {
    range.max()
}

/// Greatest version `<= client_offered` inside `server_range`.
///
/// Monotonic in `client_offered`: a higher offer never selects a lower version.
pub fn select_server_version(
    client_offered: ProtocolVersion,
    server_range: &VersionRange,
) -> Result<ProtocolVersion, AbortReason> {
    if client_offered < server_range.min() {
        debug!(
            "Client offered {} below server range {}",
            client_offered, server_range
        );
        return Err(AbortReason::UnsupportedVersion);
    }

    let selected = client_offered.min(server_range.max());
    trace!(
        "Selected {} for offer {} in {}",
        selected,
        client_offered,
        server_range
    );

    Ok(selected)
}

/// Server side selection from a `supported_versions` list.
///
/// Order in the list does not matter, the greatest common version wins.
/// Versions the server does not know are ignored.
pub fn select_from_supported_versions(
    offered: &[ProtocolVersion],
    server_range: &VersionRange,
) -> Result<ProtocolVersion, AbortReason> {
    offered
        .iter()
        .copied()
        .filter(|v| v.is_supported_by(server_range.variant()) && server_range.contains(*v))
        .max()
        .ok_or_else(|| {
            debug!("No offered version inside {}", server_range);
            AbortReason::UnsupportedVersion
        })
}

/// Client side check of the version the server picked.
pub fn accept_server_version(
    selected: ProtocolVersion,
    client_range: &VersionRange,
) -> Result<ProtocolVersion, AbortReason> {
    if !client_range.contains(selected) {
        debug!("Server selected {} outside {}", selected, client_range);
        return Err(AbortReason::UnsupportedVersion);
    }
    Ok(selected)
}

/// Check a received version field against the values its position allows.
///
/// * Sentinel-era versions never appear in a legacy position. They are only
///   carried in `supported_versions`.
/// * When every version in `expected_range` is sentinel-era, the field is a
///   compatibility field pinned to [`ProtocolVersion::LEGACY_FIXED`] and must
///   equal it exactly.
/// * Otherwise the field reflects an agreed value and must be in range.
///
/// A mismatch is never treated as a new version offer.
pub fn validate_received_version_field(
    field: ProtocolVersion,
    expected_range: &VersionRange,
) -> Result<(), AbortReason> {
    if expected_range.min().is_sentinel_era() {
        if field != ProtocolVersion::LEGACY_FIXED {
            warn!(
                "Legacy version field {} must be {} for {}",
                field,
                ProtocolVersion::LEGACY_FIXED,
                expected_range
            );
            return Err(AbortReason::MalformedVersionField);
        }
        return Ok(());
    }

    if field.is_sentinel_era() || !expected_range.contains(field) {
        warn!(
            "Version field {} not valid for {}",
            field, expected_range
        );
        return Err(AbortReason::MalformedVersionField);
    }

    Ok(())
}

/// The `supported_versions` list a client sends, newest first.
///
/// Only sent when the range reaches a sentinel-era version.
pub fn supported_versions(range: &VersionRange) -> Option<VersionList> {
    if !range.max().is_sentinel_era() {
        return None;
    }
    Some(range.versions().take(MAX_VERSIONS).collect())
}

/// Host facing negotiation for either role.
///
/// For a server `peer_offer` is what the client offered and the result is the
/// selected version. For a client `peer_offer` is what the server selected and
/// the result is the accepted version.
pub fn negotiate(
    role: Role,
    local_range: &VersionRange,
    peer_offer: &PeerOffer,
) -> Result<ProtocolVersion, AbortReason> {
    let version = match (role, peer_offer) {
        (Role::Server, PeerOffer::Version(v)) => select_server_version(*v, local_range)?,
        (Role::Server, PeerOffer::SupportedVersions(list)) => {
            select_from_supported_versions(list, local_range)?
        }
        (Role::Client, PeerOffer::Selected(v)) => accept_server_version(*v, local_range)?,
        (role, offer) => {
            debug!("{:?} can't negotiate from {:?}", role, offer);
            return Err(AbortReason::MalformedVersionField);
        }
    };

    debug!(
        "{:?} negotiated {}",
        role,
        version.name(local_range.variant())
    );

    Ok(version)
}

/// Decode the wire values of a client's `supported_versions`.
///
/// Unknown values are skipped and repeats collapse, so every distinct version
/// offered is kept no matter how long the list is.
pub fn decode_supported_versions(
    values: &[u16],
    variant: Variant,
) -> Result<VersionList, AbortReason> {
    let mut versions = VersionList::new();
    for value in values {
        if let Ok(version) = ProtocolVersion::from_wire(*value, variant) {
            push_distinct(&mut versions, version)?;
        }
    }
    Ok(versions)
}

/// Parse the client form of `supported_versions`.
///
/// Same rules as [`decode_supported_versions`].
pub fn parse_supported_versions(input: &[u8], variant: Variant) -> IResult<&[u8], VersionList> {
    let (mut input, list_len) = be_u8(input)?;
    let mut versions = VersionList::new();
    let mut remaining = list_len as usize;

    while remaining >= 2 {
        let (rest, value) = be_u16(input)?;
        remaining -= 2;
        if let Ok(version) = ProtocolVersion::from_wire(value, variant) {
            if push_distinct(&mut versions, version).is_err() {
                return Err(nom::Err::Failure(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::LengthValue,
                )));
            }
        }
        input = rest;
    }

    if remaining != 0 {
        // Odd length list
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::LengthValue,
        )));
    }

    Ok((input, versions))
}

// Fails only past MAX_VERSIONS distinct versions, more than any variant has.
fn push_distinct(versions: &mut VersionList, version: ProtocolVersion) -> Result<(), AbortReason> {
    if versions.contains(&version) {
        return Ok(());
    }
    versions
        .try_push(version)
        .map_err(|_| AbortReason::MalformedVersionField)
}

/// Serialize the client form of `supported_versions`.
///
/// Fails before writing anything when the list is longer than its length
/// byte can express.
pub fn serialize_supported_versions(
    versions: &[ProtocolVersion],
    variant: Variant,
    output: &mut Vec<u8>,
) -> Result<(), AbortReason> {
    // Length byte: 2 bytes per version
    let len = u8::try_from(versions.len() * 2).map_err(|_| {
        debug!("{} versions don't fit a supported_versions list", versions.len());
        AbortReason::MalformedVersionField
    })?;
    output.push(len);
    for version in versions {
        version.serialize(variant, output)?;
    }
    Ok(())
}

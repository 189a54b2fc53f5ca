//! Downgrade protection in the server random (RFC 8446 Section 4.1.3).
//!
//! A server negotiating below its own maximum overwrites the last 8 bytes of
//! its random with a fixed pattern. The pattern depends on how far it went
//! down. A client that could have reached the higher version finds the
//! pattern and aborts, even if an attacker rewrote the version fields
//! consistently, because the random is covered by the handshake signature.

use crate::random::SENTINEL_LEN;
use crate::{AbortReason, ProtocolVersion, ServerRandom, VersionRange};

/// "DOWNGRD" followed by the tier byte.
const DOWNGRADE_TLS12: [u8; SENTINEL_LEN] = [0x44, 0x4F, 0x57, 0x4E, 0x47, 0x52, 0x44, 0x01];
const DOWNGRADE_TLS11: [u8; SENTINEL_LEN] = [0x44, 0x4F, 0x57, 0x4E, 0x47, 0x52, 0x44, 0x00];

/// How far a server went below its maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelTier {
    /// Server could do TLS 1.3, negotiated TLS 1.2.
    Tls12,
    /// Server could do TLS 1.2 or above, negotiated TLS 1.1 or below.
    Tls11OrBelow,
}

impl SentinelTier {
    pub const fn all() -> &'static [SentinelTier; 2] {
        &[SentinelTier::Tls12, SentinelTier::Tls11OrBelow]
    }

    /// The fixed pattern written into the random.
    pub fn pattern(&self) -> &'static [u8; SENTINEL_LEN] {
        match self {
            SentinelTier::Tls12 => &DOWNGRADE_TLS12,
            SentinelTier::Tls11OrBelow => &DOWNGRADE_TLS11,
        }
    }

    /// Lowest maximum a server must have to send this tier. Also the lowest
    /// capability a client must have to check for it.
    pub fn capability(&self) -> ProtocolVersion {
        match self {
            SentinelTier::Tls12 => ProtocolVersion::TLS1_3,
            SentinelTier::Tls11OrBelow => ProtocolVersion::TLS1_2,
        }
    }

    /// Tier applying to a server with `server_max` negotiating `negotiated`.
    pub fn for_downgrade(
        server_max: ProtocolVersion,
        negotiated: ProtocolVersion,
    ) -> Option<SentinelTier> {
        if negotiated >= server_max {
            return None;
        }
        if server_max >= ProtocolVersion::TLS1_3 && negotiated == ProtocolVersion::TLS1_2 {
            Some(SentinelTier::Tls12)
        } else if server_max >= ProtocolVersion::TLS1_2 && negotiated <= ProtocolVersion::TLS1_1 {
            Some(SentinelTier::Tls11OrBelow)
        } else {
            None
        }
    }

    /// Tier whose pattern matches the trailing bytes of `random`.
    pub fn detect(random: &ServerRandom) -> Option<SentinelTier> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.pattern() == random.sentinel())
    }
}

/// Write the sentinel for `(server_max, negotiated)` into `random`.
///
/// Leaves `random` untouched when no tier applies, in particular when the
/// server negotiated its own maximum. Calling again with the same inputs
/// changes nothing.
pub fn embed_sentinel(
    server_max: ProtocolVersion,
    negotiated: ProtocolVersion,
    random: &mut ServerRandom,
) -> Option<SentinelTier> {
    let tier = SentinelTier::for_downgrade(server_max, negotiated)?;
    debug!(
        "Embedding {:?} downgrade sentinel ({} below max {})",
        tier, negotiated, server_max
    );
    random.set_sentinel(tier.pattern());
    Some(tier)
}

/// Client side check of a server random.
///
/// Uses the maximum of `client_range` as the client's capability. See
/// [`check_sentinel_with_capability`].
pub fn check_sentinel(
    random: &ServerRandom,
    negotiated: ProtocolVersion,
    client_range: &VersionRange,
) -> Result<(), AbortReason> {
    check_sentinel_with_capability(random, negotiated, client_range.max())
}

/// Client side check of a server random against an explicit capability.
///
/// A client that negotiated its own capability asked for nothing higher and
/// skips the check. Otherwise every tier the client could have reached is
/// compared against the trailing bytes.
pub fn check_sentinel_with_capability(
    random: &ServerRandom,
    negotiated: ProtocolVersion,
    capability: ProtocolVersion,
) -> Result<(), AbortReason> {
    if negotiated >= capability {
        trace!("No downgrade check, negotiated {} is our max", negotiated);
        return Ok(());
    }

    let reachable = SentinelTier::all()
        .iter()
        .filter(|t| t.capability() <= capability);

    for tier in reachable {
        if tier.pattern() == random.sentinel() {
            warn!(
                "Downgrade detected: {:?} sentinel with {} negotiated, capable of {}",
                tier, negotiated, capability
            );
            return Err(AbortReason::DowngradeDetected);
        }
    }

    Ok(())
}

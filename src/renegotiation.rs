//! Renegotiation gate.
//!
//! ```text
//! Initial -> Connected(v) -> RenegotiationInFlight(v, requestor) -> Connected(v')
//!                         \-> Rejected(reason)
//! ```
//!
//! TLS 1.3 (and DTLS 1.3) replaced renegotiation with post-handshake messages,
//! so a connection at a sentinel-era version refuses every request. Older
//! versions re-run version selection over the new ranges and hand the
//! candidate to the driver, even when it differs from the original version.
//! A candidate at a sentinel-era version is refused like the request itself.
//! Rejecting a version change is the peer's job, see
//! [`check_renegotiated_version`].

use crate::negotiate::{propose_client_version, select_server_version};
use crate::{AbortReason, ProtocolVersion, Role, VersionRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenegotiationState {
    Initial,
    Connected(ProtocolVersion),
    RenegotiationInFlight {
        original: ProtocolVersion,
        requestor: Role,
    },
    Rejected(AbortReason),
}

/// An accepted renegotiation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renegotiation {
    /// Version of the handshake being replaced.
    pub original: ProtocolVersion,
    /// Version the new selection arrived at.
    pub candidate: ProtocolVersion,
    pub requestor: Role,
}

impl Renegotiation {
    pub fn changes_version(&self) -> bool {
        self.original != self.candidate
    }
}

#[derive(Debug)]
pub struct RenegotiationGate {
    state: RenegotiationState,
    enabled: bool,
}

impl RenegotiationGate {
    pub fn new(enabled: bool) -> Self {
        RenegotiationGate {
            state: RenegotiationState::Initial,
            enabled,
        }
    }

    pub fn state(&self) -> RenegotiationState {
        self.state
    }

    /// The version of the last completed handshake, if connected.
    pub fn negotiated(&self) -> Option<ProtocolVersion> {
        match self.state {
            RenegotiationState::Connected(v) => Some(v),
            RenegotiationState::RenegotiationInFlight { original, .. } => Some(original),
            _ => None,
        }
    }

    /// Record a completed handshake.
    ///
    /// The initial handshake or an in-flight renegotiation can complete. The
    /// negotiated version is set once per attempt, anything else is refused.
    pub fn handshake_complete(&mut self, version: ProtocolVersion) -> Result<(), AbortReason> {
        match self.state {
            RenegotiationState::Initial | RenegotiationState::RenegotiationInFlight { .. } => {
                self.set_state(RenegotiationState::Connected(version));
                Ok(())
            }
            RenegotiationState::Connected(v) => {
                debug!("Handshake complete at {} while already connected at {}", version, v);
                Err(AbortReason::RenegotiationNotAllowed)
            }
            RenegotiationState::Rejected(reason) => Err(reason),
        }
    }

    /// Start a renegotiation without computing a candidate.
    ///
    /// Used by the side that receives the request (or sends a bare hello
    /// request) and learns the version from the next hello. Returns the
    /// version of the handshake being replaced.
    pub fn begin_renegotiation(&mut self, requestor: Role) -> Result<ProtocolVersion, AbortReason> {
        match self.admit(requestor) {
            Ok(original) => {
                self.set_state(RenegotiationState::RenegotiationInFlight {
                    original,
                    requestor,
                });
                Ok(original)
            }
            Err(reason) => Err(self.refuse(requestor, reason)),
        }
    }

    /// Ask to renegotiate.
    ///
    /// `client_range` and `server_range` are the ranges each side brings to
    /// the new handshake. Any failure leaves the gate in
    /// [`RenegotiationState::Rejected`].
    pub fn request_renegotiation(
        &mut self,
        requestor: Role,
        client_range: &VersionRange,
        server_range: &VersionRange,
    ) -> Result<Renegotiation, AbortReason> {
        let original = self.begin_renegotiation(requestor)?;

        let offered = propose_client_version(client_range);
        let candidate = match select_server_version(offered, server_range) {
            Ok(v) => v,
            Err(reason) => return Err(self.refuse(requestor, reason)),
        };
        self.admit_candidate(candidate)?;

        if candidate != original {
            debug!(
                "Renegotiation moves {} to {}, leaving the verdict to the peer",
                original, candidate
            );
        }

        Ok(Renegotiation {
            original,
            candidate,
            requestor,
        })
    }

    /// Check the version a renegotiation in flight arrived at.
    ///
    /// A renegotiation can't move into a sentinel-era version, those don't
    /// renegotiate. Outside a renegotiation this always passes.
    pub fn admit_candidate(&mut self, candidate: ProtocolVersion) -> Result<(), AbortReason> {
        if let RenegotiationState::RenegotiationInFlight { requestor, .. } = self.state {
            if candidate.is_sentinel_era() {
                return Err(self.refuse(requestor, AbortReason::RenegotiationNotAllowed));
            }
        }
        Ok(())
    }

    /// Abort whatever is going on.
    pub fn reject(&mut self, reason: AbortReason) {
        self.set_state(RenegotiationState::Rejected(reason));
    }

    fn admit(&self, requestor: Role) -> Result<ProtocolVersion, AbortReason> {
        let original = match self.state {
            RenegotiationState::Connected(v) => v,
            RenegotiationState::RenegotiationInFlight { requestor, .. } => {
                debug!("Renegotiation by {:?} already in flight", requestor);
                return Err(AbortReason::RenegotiationNotAllowed);
            }
            RenegotiationState::Initial | RenegotiationState::Rejected(_) => {
                return Err(AbortReason::RenegotiationNotAllowed);
            }
        };

        if original.is_sentinel_era() {
            debug!("No renegotiation on {} ({:?} asked)", original, requestor);
            return Err(AbortReason::RenegotiationNotAllowed);
        }

        if !self.enabled {
            debug!("Renegotiation disabled");
            return Err(AbortReason::RenegotiationNotAllowed);
        }

        Ok(original)
    }

    fn refuse(&mut self, requestor: Role, reason: AbortReason) -> AbortReason {
        warn!("Renegotiation requested by {:?} refused: {}", requestor, reason);
        self.reject(reason);
        reason
    }

    fn set_state(&mut self, state: RenegotiationState) {
        trace!("{:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

/// Peer side rule: a renegotiation must keep the version of the connection.
pub fn check_renegotiated_version(
    original: ProtocolVersion,
    candidate: ProtocolVersion,
) -> Result<(), AbortReason> {
    if original != candidate {
        warn!("Renegotiation tried to change {} to {}", original, candidate);
        return Err(AbortReason::UnsupportedVersion);
    }
    Ok(())
}

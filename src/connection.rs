//! Per-connection negotiation context.
//!
//! A [`Connection`] owns the configuration of one endpoint, its renegotiation
//! gate and the negotiated outcome. The host handshake driver feeds it the
//! version related fields of each hello and sends what comes back. Nothing is
//! shared between connections.
//!
//! Initial handshake:
//!
//! 1. Client builds its hello with [`Connection::client_hello`]
//! 2. Server answers with [`Connection::handle_client_hello`]. It selects the
//!    version, generates the random and embeds the downgrade sentinel.
//! 3. Client validates with [`Connection::handle_server_hello`]. It checks the
//!    selection, the legacy version field and the sentinel.
//!
//! Any `Err` is final for the attempt. The driver passes it to
//! [`Connection::abort`] and sends the resulting alert.

use crate::alert::{classify_for, Classification};
use crate::negotiate::{
    accept_server_version, decode_supported_versions, propose_client_version,
    select_from_supported_versions, select_server_version, supported_versions,
    validate_received_version_field,
};
use crate::renegotiation::{check_renegotiated_version, Renegotiation, RenegotiationGate};
use crate::rng::SeededRng;
use crate::sentinel::{check_sentinel_with_capability, embed_sentinel};
use crate::{AbortReason, Config, ProtocolVersion, RenegotiationState, Role, ServerRandom};
use crate::{Variant, VersionRange};

/// Version fields of a client hello.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    /// Wire value of the legacy version field.
    pub legacy_version: u16,
    /// Wire values of the `supported_versions` extension, if sent.
    pub supported_versions: Option<Vec<u16>>,
}

/// Version fields of a server hello.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    /// Wire value of the legacy version field.
    pub legacy_version: u16,
    /// Wire value of the `supported_versions` extension, if sent.
    pub selected_version: Option<u16>,
    pub random: ServerRandom,
}

pub struct Connection {
    role: Role,
    config: Config,
    gate: RenegotiationGate,
    rng: SeededRng,
}

impl Connection {
    pub fn new(role: Role, config: Config) -> Self {
        debug!("New {:?} connection, versions {}", role, config.version_range());
        Connection {
            role,
            gate: RenegotiationGate::new(config.renegotiation()),
            rng: SeededRng::new(config.rng_seed()),
            config,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn version_range(&self) -> VersionRange {
        self.config.version_range()
    }

    fn variant(&self) -> Variant {
        self.config.variant()
    }

    pub fn renegotiation_state(&self) -> RenegotiationState {
        self.gate.state()
    }

    /// Version of the last completed handshake.
    pub fn negotiated(&self) -> Option<ProtocolVersion> {
        match self.gate.state() {
            RenegotiationState::Connected(v) => Some(v),
            _ => None,
        }
    }

    /// Replace the version range.
    ///
    /// Allowed before the first handshake and between handshakes, typically
    /// to prepare a renegotiation. Only the bounds change, a range of the
    /// other variant is [`AbortReason::IncompatibleConfiguredRanges`]. The new
    /// range is validated like any other.
    pub fn set_version_range(&mut self, range: VersionRange) -> Result<(), AbortReason> {
        if let RenegotiationState::RenegotiationInFlight { .. } = self.gate.state() {
            return Err(AbortReason::RenegotiationNotAllowed);
        }
        if range.variant() != self.variant() {
            debug!(
                "{:?} can't move from {:?} to a {:?} range",
                self.role,
                self.variant(),
                range.variant()
            );
            return Err(AbortReason::IncompatibleConfiguredRanges);
        }
        self.config = self.config.with_version_range(range)?;
        debug!("{:?} version range now {}", self.role, range);
        Ok(())
    }

    /// Version fields for the client hello.
    ///
    /// The legacy field carries the range max verbatim. `supported_versions`
    /// is added when the range reaches a sentinel-era version.
    pub fn client_hello(&self) -> Result<ClientHello, AbortReason> {
        self.expect_role(Role::Client)?;
        self.expect_handshake()?;

        let range = self.version_range();
        let legacy = propose_client_version(&range);
        let legacy_version = wire(legacy, self.variant())?;

        let supported_versions = match supported_versions(&range) {
            Some(list) => Some(
                list.iter()
                    .map(|v| wire(*v, self.variant()))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        trace!(
            "ClientHello legacy {:#06x}, supported_versions {:?}",
            legacy_version,
            supported_versions
        );

        Ok(ClientHello {
            legacy_version,
            supported_versions,
        })
    }

    /// Server side: select a version for a client hello.
    ///
    /// A hello arriving on a connected connection is a renegotiation started
    /// by the client and goes through the gate first.
    pub fn handle_client_hello(&mut self, hello: &ClientHello) -> Result<ServerHello, AbortReason> {
        self.expect_role(Role::Server)?;
        let result = self.do_handle_client_hello(hello);
        self.on_result(result)
    }

    fn do_handle_client_hello(&mut self, hello: &ClientHello) -> Result<ServerHello, AbortReason> {
        if let RenegotiationState::Connected(_) = self.gate.state() {
            self.gate.begin_renegotiation(Role::Client)?;
        }
        self.expect_handshake()?;

        let range = self.version_range();
        let variant = self.variant();

        let negotiated = match &hello.supported_versions {
            Some(offered) => {
                let list = decode_supported_versions(offered, variant)?;
                select_from_supported_versions(&list, &range)?
            }
            None => {
                let offered = ProtocolVersion::from_wire(hello.legacy_version, variant)?;
                select_server_version(offered, &range)?
            }
        };
        self.gate.admit_candidate(negotiated)?;

        let mut random = ServerRandom::new(&mut self.rng);
        embed_sentinel(range.max(), negotiated, &mut random);

        let (legacy, selected) = if negotiated.is_sentinel_era() {
            (ProtocolVersion::LEGACY_FIXED, Some(wire(negotiated, variant)?))
        } else {
            (negotiated, None)
        };

        self.gate.handshake_complete(negotiated)?;
        debug!("Server negotiated {}", negotiated.name(variant));

        Ok(ServerHello {
            legacy_version: wire(legacy, variant)?,
            selected_version: selected,
            random,
        })
    }

    /// Client side: validate the server hello and return the negotiated version.
    pub fn handle_server_hello(&mut self, hello: &ServerHello) -> Result<ProtocolVersion, AbortReason> {
        self.expect_role(Role::Client)?;
        let result = self.do_handle_server_hello(hello);
        self.on_result(result)
    }

    fn do_handle_server_hello(&mut self, hello: &ServerHello) -> Result<ProtocolVersion, AbortReason> {
        let original = match self.gate.state() {
            RenegotiationState::Initial => None,
            RenegotiationState::RenegotiationInFlight { original, .. } => Some(original),
            RenegotiationState::Connected(_) => {
                debug!("ServerHello without a renegotiation in flight");
                return Err(AbortReason::RenegotiationNotAllowed);
            }
            RenegotiationState::Rejected(reason) => return Err(reason),
        };

        let range = self.version_range();
        let variant = self.variant();
        let legacy = ProtocolVersion::from_wire(hello.legacy_version, variant)?;

        let negotiated = match hello.selected_version {
            Some(w) => {
                let selected = ProtocolVersion::from_wire(w, variant)?;
                if !selected.is_sentinel_era() {
                    debug!("supported_versions selected {}", selected);
                    return Err(AbortReason::MalformedVersionField);
                }
                accept_server_version(selected, &range)?
            }
            None => accept_server_version(legacy, &range)?,
        };

        validate_received_version_field(legacy, &VersionRange::exact(variant, negotiated)?)?;

        if let Some(original) = original {
            check_renegotiated_version(original, negotiated)?;
        }
        self.gate.admit_candidate(negotiated)?;

        check_sentinel_with_capability(
            &hello.random,
            negotiated,
            self.config.downgrade_capability(),
        )?;

        self.gate.handshake_complete(negotiated)?;
        debug!("Client negotiated {}", negotiated.name(variant));

        Ok(negotiated)
    }

    /// Client side: the server asked for a renegotiation.
    pub fn handle_hello_request(&mut self) -> Result<(), AbortReason> {
        self.expect_role(Role::Client)?;
        let result = self.gate.begin_renegotiation(Role::Server).map(|_| ());
        self.on_result(result)
    }

    /// Start a renegotiation from this side.
    ///
    /// The new version is only known once the peer answers.
    pub fn begin_renegotiation(&mut self) -> Result<ProtocolVersion, AbortReason> {
        let result = self.gate.begin_renegotiation(self.role);
        self.on_result(result)
    }

    /// Start a renegotiation from this side and compute the candidate
    /// version against `peer_range`.
    pub fn request_renegotiation(
        &mut self,
        peer_range: &VersionRange,
    ) -> Result<Renegotiation, AbortReason> {
        let local = self.version_range();
        let (client_range, server_range) = match self.role {
            Role::Client => (local, *peer_range),
            Role::Server => (*peer_range, local),
        };
        let result = self
            .gate
            .request_renegotiation(self.role, &client_range, &server_range);
        self.on_result(result)
    }

    /// Classify a failure for the driver and log it.
    pub fn abort(&mut self, reason: AbortReason) -> Classification {
        let version = self
            .gate
            .negotiated()
            .unwrap_or(self.version_range().min());
        let classification = classify_for(reason, version);
        warn!(
            "{:?} abort: {} ({:?}, alert {:?})",
            self.role, reason, classification.code, classification.alert
        );
        if !reason.is_configuration() {
            self.gate.reject(reason);
        }
        classification
    }

    fn on_result<T>(&mut self, result: Result<T, AbortReason>) -> Result<T, AbortReason> {
        if let Err(reason) = result {
            if self.gate.state() != RenegotiationState::Rejected(reason) {
                self.gate.reject(reason);
            }
        }
        result
    }

    fn expect_role(&self, role: Role) -> Result<(), AbortReason> {
        if self.role != role {
            debug!("{:?} operation called on {:?}", role, self.role);
            return Err(AbortReason::MalformedVersionField);
        }
        Ok(())
    }

    fn expect_handshake(&self) -> Result<(), AbortReason> {
        match self.gate.state() {
            RenegotiationState::Initial | RenegotiationState::RenegotiationInFlight { .. } => Ok(()),
            RenegotiationState::Connected(_) => Err(AbortReason::RenegotiationNotAllowed),
            RenegotiationState::Rejected(reason) => Err(reason),
        }
    }
}

fn wire(version: ProtocolVersion, variant: Variant) -> Result<u16, AbortReason> {
    version
        .to_wire(variant)
        .ok_or(AbortReason::UnsupportedVersion)
}

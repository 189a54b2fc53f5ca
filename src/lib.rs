//! TLS and DTLS version negotiation with downgrade protection.
//!
//! This crate decides which protocol version two endpoints use. It is a
//! decision layer for a sans-IO handshake driver: it takes the version related
//! fields of the hello messages and the server random, and answers with a
//! version or an [`AbortReason`]. Records, ciphers, certificates and I/O are
//! the driver's business.
//!
//! * [`VersionRange`] validated range of acceptable versions
//! * [`select_server_version`] and friends pick the version
//! * [`embed_sentinel`] / [`check_sentinel`] protect the selection with the
//!   downgrade sentinel in the server random (RFC 8446 Section 4.1.3)
//! * [`RenegotiationGate`] decides whether a renegotiation may go ahead
//! * [`classify`] maps a failure to a local code and the alert to send
//! * [`Connection`] ties it together per connection
//!
//! ```
//! use vneg::{Config, Connection, ProtocolVersion, Role};
//!
//! let client_config = Config::builder()
//!     .version_range(ProtocolVersion::TLS1_2, ProtocolVersion::TLS1_3)
//!     .build()
//!     .unwrap();
//!
//! let mut client = Connection::new(Role::Client, client_config);
//! let mut server = Connection::new(Role::Server, Config::default());
//!
//! let hello = client.client_hello().unwrap();
//! let reply = server.handle_client_hello(&hello).unwrap();
//! let version = client.handle_server_hello(&reply).unwrap();
//!
//! assert_eq!(version, ProtocolVersion::TLS1_3);
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

#[macro_use]
extern crate log;

mod error;
pub use error::AbortReason;

mod version;
pub use version::{ProtocolVersion, Variant};

mod range;
pub use range::VersionRange;

mod config;
pub use config::{Config, ConfigBuilder};

mod negotiate;
pub use negotiate::{accept_server_version, decode_supported_versions, negotiate};
pub use negotiate::propose_client_version;
pub use negotiate::{parse_supported_versions, serialize_supported_versions, supported_versions};
pub use negotiate::{select_from_supported_versions, select_server_version};
pub use negotiate::{validate_received_version_field, PeerOffer, Role, VersionList, MAX_VERSIONS};

mod rng;
pub use rng::SeededRng;

mod random;
pub use random::{ServerRandom, RANDOM_LEN, SENTINEL_LEN};

mod sentinel;
pub use sentinel::{check_sentinel, check_sentinel_with_capability, embed_sentinel};
pub use sentinel::SentinelTier;

mod renegotiation;
pub use renegotiation::{check_renegotiated_version, Renegotiation};
pub use renegotiation::{RenegotiationGate, RenegotiationState};

mod alert;
pub use alert::{classify, classify_for, Classification, LocalErrorCode};
pub use alert::{Alert, AlertDescription, AlertLevel};

mod connection;
pub use connection::{ClientHello, Connection, ServerHello};

/// Embed (server) or check (client) the downgrade sentinel.
///
/// A server embeds relative to the max of `local_range`. A client checks
/// against the max of `local_range`, without touching `random`.
pub fn embed_or_check_sentinel(
    role: Role,
    local_range: &VersionRange,
    negotiated: ProtocolVersion,
    random: &mut ServerRandom,
) -> Result<(), AbortReason> {
    match role {
        Role::Server => {
            embed_sentinel(local_range.max(), negotiated, random);
            Ok(())
        }
        Role::Client => check_sentinel(random, negotiated, local_range),
    }
}

/// Consult the gate before honoring a renegotiation request.
pub fn gate_renegotiation(
    gate: &mut RenegotiationGate,
    requestor: Role,
    client_range: &VersionRange,
    server_range: &VersionRange,
) -> Result<Renegotiation, AbortReason> {
    gate.request_renegotiation(requestor, client_range, server_range)
}

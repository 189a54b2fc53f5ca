//! Shared helpers for version negotiation integration tests.

#![allow(unused)]

use vneg::{
    AbortReason, ClientHello, Config, Connection, ProtocolVersion, Role, ServerHello, Variant,
};

/// Rewrites handshake messages between the endpoints.
///
/// The engine never sees the filter, it only gets what comes out of it.
pub trait Filter {
    fn client_hello(&mut self, hello: ClientHello) -> ClientHello {
        hello
    }

    fn server_hello(&mut self, hello: ServerHello) -> ServerHello {
        hello
    }
}

/// Leaves everything alone.
pub struct NoFilter;

impl Filter for NoFilter {}

/// Sets the version in the ClientHello.
///
/// Overwrites the legacy version field and strips `supported_versions`, like
/// an attacker who wants the server to see a lower offer has to.
pub struct ClientHelloVersionSetter(pub u16);

impl Filter for ClientHelloVersionSetter {
    fn client_hello(&mut self, mut hello: ClientHello) -> ClientHello {
        hello.legacy_version = self.0;
        hello.supported_versions = None;
        hello
    }
}

/// Sets the legacy version field of the ServerHello, keeping everything else.
pub struct ServerHelloLegacySetter(pub u16);

impl Filter for ServerHelloLegacySetter {
    fn server_hello(&mut self, mut hello: ServerHello) -> ServerHello {
        hello.legacy_version = self.0;
        hello
    }
}

/// Rewrites both version fields of the ServerHello.
///
/// Claims `selected` in `supported_versions` while the legacy field says
/// `legacy`.
pub struct ServerHelloVersionRewriter {
    pub legacy: u16,
    pub selected: u16,
}

impl Filter for ServerHelloVersionRewriter {
    fn server_hello(&mut self, mut hello: ServerHello) -> ServerHello {
        hello.legacy_version = self.legacy;
        hello.selected_version = Some(self.selected);
        hello
    }
}

/// Which side failed, with what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Client(AbortReason),
    Server(AbortReason),
}

pub fn stream_config(min: ProtocolVersion, max: ProtocolVersion) -> Config {
    Config::builder()
        .version_range(min, max)
        .rng_seed(1)
        .build()
        .expect("valid stream config")
}

pub fn datagram_config(min: ProtocolVersion, max: ProtocolVersion) -> Config {
    Config::builder()
        .variant(Variant::Datagram)
        .version_range(min, max)
        .rng_seed(1)
        .build()
        .expect("valid datagram config")
}

pub fn pair(client: Config, server: Config) -> (Connection, Connection) {
    (
        Connection::new(Role::Client, client),
        Connection::new(Role::Server, server),
    )
}

/// Run a full hello exchange through `filter`.
///
/// On failure the failing side is aborted, which is what a driver does before
/// sending the alert.
pub fn handshake(
    client: &mut Connection,
    server: &mut Connection,
    filter: &mut dyn Filter,
) -> Result<ProtocolVersion, Failure> {
    let ch = client.client_hello().map_err(|e| fail_client(client, e))?;
    let ch = filter.client_hello(ch);

    let sh = server
        .handle_client_hello(&ch)
        .map_err(|e| fail_server(server, e))?;
    let sh = filter.server_hello(sh);

    client
        .handle_server_hello(&sh)
        .map_err(|e| fail_client(client, e))
}

/// Connect without tampering, panicking on failure.
pub fn connect(client: &mut Connection, server: &mut Connection) -> ProtocolVersion {
    let version = handshake(client, server, &mut NoFilter).expect("handshake");
    assert_eq!(client.negotiated(), Some(version));
    assert_eq!(server.negotiated(), Some(version));
    version
}

fn fail_client(client: &mut Connection, e: AbortReason) -> Failure {
    client.abort(e);
    Failure::Client(e)
}

fn fail_server(server: &mut Connection, e: AbortReason) -> Failure {
    server.abort(e);
    Failure::Server(e)
}

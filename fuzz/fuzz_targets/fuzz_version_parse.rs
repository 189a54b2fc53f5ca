#![no_main]

//! Fuzz target for the version related wire parsers.
//!
//! Every parser must either fail or return a value that survives being
//! fed back into a handshake. Nothing may panic.
//!
//! Input layout:
//! - byte 0: variant selector (even = stream, odd = datagram)
//! - rest: parser input

use libfuzzer_sys::fuzz_target;

use vneg::{
    parse_supported_versions, Alert, ClientHello, Config, Connection, ProtocolVersion, Role,
    ServerHello, ServerRandom, Variant,
};

fuzz_target!(|data: &[u8]| {
    let Some((selector, input)) = data.split_first() else {
        return;
    };
    let variant = if selector & 1 == 0 {
        Variant::Stream
    } else {
        Variant::Datagram
    };

    let _ = ProtocolVersion::parse(input, variant);
    let _ = ProtocolVersion::decode(input, variant);
    let _ = ServerRandom::parse(input);
    let _ = Alert::parse(input);

    let versions = match parse_supported_versions(input, variant) {
        Ok((_, versions)) => versions,
        Err(_) => return,
    };

    // Whatever parsed must be re-encodable and acceptable to a server.
    let wire: Vec<u16> = versions
        .iter()
        .filter_map(|v| v.to_wire(variant))
        .collect();
    assert_eq!(wire.len(), versions.len());

    let config = Config::builder().variant(variant).rng_seed(0).build();
    let Ok(config) = config else {
        return;
    };

    let mut server = Connection::new(Role::Server, config);
    let hello = ClientHello {
        legacy_version: wire.first().copied().unwrap_or(0),
        supported_versions: Some(wire),
    };
    let Ok(sh) = server.handle_client_hello(&hello) else {
        return;
    };

    // A server hello built from random bytes must never panic the client.
    if input.len() >= 36 {
        let mut client = Connection::new(Role::Client, config);
        let tampered = ServerHello {
            legacy_version: u16::from_be_bytes([input[0], input[1]]),
            selected_version: Some(u16::from_be_bytes([input[2], input[3]])),
            random: ServerRandom::from_bytes((*sh.random).map(|b| b ^ input[4])),
        };
        let _ = client.handle_server_hello(&tampered);
    }
});

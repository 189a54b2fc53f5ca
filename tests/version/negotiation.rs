//! Version selection over full hello exchanges.

use vneg::{
    classify, AbortReason, AlertDescription, Config, Connection, LocalErrorCode, ProtocolVersion,
    Role, SentinelTier, Variant, VersionRange,
};

use crate::common::*;

use ProtocolVersion as V;

#[test]
fn server_negotiates_tls10() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::TLS1_0, V::TLS1_3),
        stream_config(V::TLS1_0, V::TLS1_0),
    );

    let ch = client.client_hello().expect("client hello");
    let sh = server.handle_client_hello(&ch).expect("server hello");

    // The server's own max is 1.0, nothing to signal.
    assert_eq!(SentinelTier::detect(&sh.random), None);
    assert_eq!(sh.legacy_version, 0x0301);

    assert_eq!(client.handle_server_hello(&sh), Ok(V::TLS1_0));
}

#[test]
fn server_negotiates_its_single_version() {
    let _ = env_logger::try_init();

    for version in [V::TLS1_1, V::TLS1_2, V::TLS1_3] {
        let (mut client, mut server) = pair(
            stream_config(version, V::TLS1_3),
            stream_config(version, version),
        );
        assert_eq!(connect(&mut client, &mut server), version);
    }
}

#[test]
fn highest_common_version_wins() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::TLS1_0, V::TLS1_2),
        stream_config(V::TLS1_1, V::TLS1_3),
    );
    assert_eq!(connect(&mut client, &mut server), V::TLS1_2);
}

#[test]
fn overlap_not_subset_decides() {
    let _ = env_logger::try_init();

    // Neither range contains the other, they share 1.2.
    let (mut client, mut server) = pair(
        stream_config(V::TLS1_2, V::TLS1_3),
        stream_config(V::TLS1_0, V::TLS1_2),
    );
    assert_eq!(connect(&mut client, &mut server), V::TLS1_2);
}

#[test]
fn disjoint_ranges_fail_on_server() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::TLS1_0, V::TLS1_1),
        stream_config(V::TLS1_2, V::TLS1_3),
    );
    let result = handshake(&mut client, &mut server, &mut NoFilter);
    assert_eq!(result, Err(Failure::Server(AbortReason::UnsupportedVersion)));

    let c = classify(AbortReason::UnsupportedVersion);
    assert_eq!(c.code, LocalErrorCode::ProtocolVersion);
    assert_eq!(
        c.alert.map(|a| a.description),
        Some(AlertDescription::ProtocolVersion)
    );
}

#[test]
fn disjoint_ranges_with_tls13_client_fail() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::TLS1_3, V::TLS1_3),
        stream_config(V::TLS1_0, V::TLS1_2),
    );
    let result = handshake(&mut client, &mut server, &mut NoFilter);
    assert_eq!(result, Err(Failure::Server(AbortReason::UnsupportedVersion)));
}

#[test]
fn server_selection_below_client_min_fails_on_client() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::TLS1_2, V::TLS1_2),
        stream_config(V::TLS1_0, V::TLS1_2),
    );
    // Attacker lowers the offer, server follows, client refuses.
    let mut filter = ClientHelloVersionSetter(0x0301);
    let result = handshake(&mut client, &mut server, &mut filter);
    assert_eq!(result, Err(Failure::Client(AbortReason::UnsupportedVersion)));
}

#[test]
fn disallow_ssl3_with_tls13_enabled() {
    let _ = env_logger::try_init();

    let result = Config::builder()
        .version_range(V::SSL3_0, V::TLS1_3)
        .build();
    assert_eq!(result, Err(AbortReason::IncompatibleConfiguredRanges));

    assert_eq!(
        VersionRange::new(Variant::Stream, V::SSL3_0, V::TLS1_3),
        Err(AbortReason::IncompatibleConfiguredRanges)
    );

    let c = classify(AbortReason::IncompatibleConfiguredRanges);
    assert_eq!(c.code, LocalErrorCode::Configuration);
    assert_eq!(c.alert, None);
}

#[test]
fn ssl3_connects_without_tls13() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::SSL3_0, V::TLS1_2),
        stream_config(V::SSL3_0, V::SSL3_0),
    );
    assert_eq!(connect(&mut client, &mut server), V::SSL3_0);
}

#[test]
fn tampered_legacy_field_on_tls13_server_hello() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::TLS1_0, V::TLS1_3),
        stream_config(V::TLS1_0, V::TLS1_3),
    );
    // Real version 1.3 in supported_versions, legacy field rewritten to 1.1.
    let mut filter = ServerHelloLegacySetter(0x0302);
    let result = handshake(&mut client, &mut server, &mut filter);
    assert_eq!(
        result,
        Err(Failure::Client(AbortReason::MalformedVersionField))
    );

    let c = classify(AbortReason::MalformedVersionField);
    assert_eq!(c.code, LocalErrorCode::MalformedPeerMessage);
    assert_eq!(
        c.alert.map(|a| a.description),
        Some(AlertDescription::DecodeError)
    );
}

#[test]
fn tls13_claimed_over_tls11_legacy_field() {
    let _ = env_logger::try_init();

    // The server really picks 1.2. The attacker reports 1.3 in
    // supported_versions and 1.1 in the legacy field.
    let (mut client, mut server) = pair(
        stream_config(V::TLS1_0, V::TLS1_3),
        stream_config(V::TLS1_1, V::TLS1_2),
    );
    let mut filter = ServerHelloVersionRewriter {
        legacy: 0x0302,
        selected: 0x0304,
    };
    let result = handshake(&mut client, &mut server, &mut filter);
    assert_eq!(
        result,
        Err(Failure::Client(AbortReason::MalformedVersionField))
    );
    assert_eq!(server.negotiated(), Some(V::TLS1_2));
    assert_eq!(client.negotiated(), None);
}

#[test]
fn tampered_legacy_field_on_tls12_server_hello() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::TLS1_0, V::TLS1_3),
        stream_config(V::TLS1_1, V::TLS1_2),
    );
    let ch = client.client_hello().unwrap();
    let mut sh = server.handle_client_hello(&ch).unwrap();

    // A server hello claiming 1.2 in supported_versions is not allowed either.
    let mut claims_12 = sh.clone();
    claims_12.selected_version = Some(0x0303);
    let mut other = Connection::new(Role::Client, stream_config(V::TLS1_0, V::TLS1_3));
    other.client_hello().unwrap();
    assert_eq!(
        other.handle_server_hello(&claims_12),
        Err(AbortReason::MalformedVersionField)
    );

    sh.legacy_version = 0x0304;
    assert_eq!(
        client.handle_server_hello(&sh),
        Err(AbortReason::MalformedVersionField)
    );
}

#[test]
fn unknown_legacy_version_is_unsupported() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::TLS1_0, V::TLS1_2),
        stream_config(V::TLS1_0, V::TLS1_2),
    );
    let mut filter = ClientHelloVersionSetter(0x0200);
    let result = handshake(&mut client, &mut server, &mut filter);
    assert_eq!(result, Err(Failure::Server(AbortReason::UnsupportedVersion)));
}

#[test]
fn reconfigure_after_failed_attempt() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::TLS1_0, V::TLS1_1),
        stream_config(V::TLS1_2, V::TLS1_2),
    );
    assert!(handshake(&mut client, &mut server, &mut NoFilter).is_err());

    // A new attempt is a new connection.
    let (mut client, mut server) = pair(
        stream_config(V::TLS1_0, V::TLS1_2),
        stream_config(V::TLS1_2, V::TLS1_2),
    );
    assert_eq!(connect(&mut client, &mut server), V::TLS1_2);
}

//! Downgrade detection through the server random.
//!
//! The first group tampers with the ClientHello on the wire. The fallback
//! group has no attacker, the client itself fell back to a lower range and
//! uses the downgrade check version to still catch a server that could have
//! done better.

use vneg::{
    check_sentinel, classify, embed_sentinel, AbortReason, AlertDescription, Config,
    LocalErrorCode, ProtocolVersion, SentinelTier, ServerRandom, Variant, VersionRange,
};

use crate::common::*;

use ProtocolVersion as V;

#[test]
fn downgrade_detection_to_tls11() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::TLS1_0, V::TLS1_3),
        stream_config(V::TLS1_0, V::TLS1_3),
    );
    let mut filter = ClientHelloVersionSetter(0x0302);
    let result = handshake(&mut client, &mut server, &mut filter);
    assert_eq!(result, Err(Failure::Client(AbortReason::DowngradeDetected)));

    // The server did not notice anything.
    assert_eq!(server.negotiated(), Some(V::TLS1_1));

    let c = classify(AbortReason::DowngradeDetected);
    assert_eq!(c.code, LocalErrorCode::MalformedPeerMessage);
    assert_eq!(
        c.alert.map(|a| a.description),
        Some(AlertDescription::IllegalParameter)
    );
}

#[test]
fn downgrade_detection_to_tls12() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::TLS1_2, V::TLS1_3),
        stream_config(V::TLS1_2, V::TLS1_3),
    );
    let mut filter = ClientHelloVersionSetter(0x0303);
    let result = handshake(&mut client, &mut server, &mut filter);
    assert_eq!(result, Err(Failure::Client(AbortReason::DowngradeDetected)));
}

#[test]
fn tls11_client_cannot_detect_downgrade_to_tls10() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::TLS1_0, V::TLS1_1),
        stream_config(V::TLS1_0, V::TLS1_2),
    );

    let ch = client.client_hello().unwrap();
    let ch = ClientHelloVersionSetter(0x0301).client_hello(ch);
    let sh = server.handle_client_hello(&ch).unwrap();

    // The server signals, but a 1.1 client has no sentinel for it. Catching
    // this is up to the transcript check of the finished messages.
    assert_eq!(
        SentinelTier::detect(&sh.random),
        Some(SentinelTier::Tls11OrBelow)
    );
    assert_eq!(client.handle_server_hello(&sh), Ok(V::TLS1_0));
}

#[test]
fn fallback_from_tls12() {
    let _ = env_logger::try_init();

    let client_config = Config::builder()
        .version_range(V::TLS1_1, V::TLS1_1)
        .downgrade_check_version(V::TLS1_2)
        .build()
        .unwrap();

    let (mut client, mut server) = pair(client_config, stream_config(V::TLS1_1, V::TLS1_2));
    let result = handshake(&mut client, &mut server, &mut NoFilter);
    assert_eq!(result, Err(Failure::Client(AbortReason::DowngradeDetected)));
}

#[test]
fn fallback_from_tls13() {
    let _ = env_logger::try_init();

    let client_config = Config::builder()
        .version_range(V::TLS1_2, V::TLS1_2)
        .downgrade_check_version(V::TLS1_3)
        .build()
        .unwrap();

    let (mut client, mut server) = pair(client_config, stream_config(V::TLS1_1, V::TLS1_3));
    let result = handshake(&mut client, &mut server, &mut NoFilter);
    assert_eq!(result, Err(Failure::Client(AbortReason::DowngradeDetected)));
}

#[test]
fn fallback_to_a_server_without_more_passes() {
    let _ = env_logger::try_init();

    let client_config = Config::builder()
        .version_range(V::TLS1_2, V::TLS1_2)
        .downgrade_check_version(V::TLS1_3)
        .build()
        .unwrap();

    // The server really can't do 1.3, so the fallback was legitimate.
    let (mut client, mut server) = pair(client_config, stream_config(V::TLS1_1, V::TLS1_2));
    assert_eq!(connect(&mut client, &mut server), V::TLS1_2);
}

#[test]
fn lower_client_max_is_no_false_positive() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        stream_config(V::TLS1_0, V::TLS1_1),
        stream_config(V::TLS1_0, V::TLS1_3),
    );
    assert_eq!(connect(&mut client, &mut server), V::TLS1_1);
}

#[test]
fn two_tiers_down() {
    let _ = env_logger::try_init();

    let client_13 = VersionRange::new(Variant::Stream, V::TLS1_0, V::TLS1_3).unwrap();
    let client_11 = VersionRange::new(Variant::Stream, V::TLS1_0, V::TLS1_1).unwrap();

    let mut random = ServerRandom::from_bytes([0x5A; 32]);
    assert_eq!(
        embed_sentinel(V::TLS1_3, V::TLS1_1, &mut random),
        Some(SentinelTier::Tls11OrBelow)
    );
    assert_eq!(random.sentinel(), SentinelTier::Tls11OrBelow.pattern());

    assert_eq!(
        check_sentinel(&random, V::TLS1_1, &client_13),
        Err(AbortReason::DowngradeDetected)
    );
    assert_eq!(check_sentinel(&random, V::TLS1_1, &client_11), Ok(()));
}

#[test]
fn dtls13_downgrade_detected() {
    let _ = env_logger::try_init();

    let (mut client, mut server) = pair(
        datagram_config(V::DTLS1_2, V::DTLS1_3),
        datagram_config(V::DTLS1_2, V::DTLS1_3),
    );
    let mut filter = ClientHelloVersionSetter(0xFEFD);
    let result = handshake(&mut client, &mut server, &mut filter);
    assert_eq!(result, Err(Failure::Client(AbortReason::DowngradeDetected)));
}

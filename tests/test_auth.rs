//! Integration tests for the handshake and authentication exchange over a
//! mocked socket.

use mariadb_thin_rs::protocol::constants::SERVER_STATUS_NO_BACKSLASH_ESCAPES;
use mariadb_thin_rs::protocol::crypto::{caching_sha2_scramble, native_password_scramble};
use mariadb_thin_rs::protocol::PacketChannel;
use mariadb_thin_rs::{
    negotiate, ConnectParams, EncodeContext, Error, ErrorKind, InitialHandshake, PacketStream,
};
use tokio_test::io::Builder;

const SEED: &[u8] = b"abcdefghijklmnopqrst";

fn frame(seq: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = (payload.len() as u32).to_le_bytes()[..3].to_vec();
    out.push(seq);
    out.extend_from_slice(payload);
    out
}

fn greeting(plugin: &str) -> Vec<u8> {
    let mut p = vec![10];
    p.extend_from_slice(b"10.11.8-MariaDB-log\0");
    p.extend_from_slice(&42u32.to_le_bytes());
    p.extend_from_slice(&SEED[..8]);
    p.push(0);
    p.extend_from_slice(&0xf7feu16.to_le_bytes());
    p.push(8);
    p.extend_from_slice(&(0x0002 | SERVER_STATUS_NO_BACKSLASH_ESCAPES).to_le_bytes());
    p.extend_from_slice(&0x81bfu16.to_le_bytes());
    p.push(21);
    p.extend_from_slice(&[0; 6]);
    p.extend_from_slice(&0x1du32.to_le_bytes());
    p.extend_from_slice(&SEED[8..]);
    p.push(0);
    p.extend_from_slice(plugin.as_bytes());
    p.push(0);
    p
}

const OK: &[u8] = &[0, 0, 0, 2, 0, 0, 0];

#[tokio::test]
async fn test_handshake_then_auth_switch() {
    let new_seed = b"ZYXWVUTSRQPONMLKJIHG";
    let mut switch = vec![0xfe];
    switch.extend_from_slice(b"mysql_native_password\0");
    switch.extend_from_slice(new_seed);
    switch.push(0);

    let mock = Builder::new()
        .read(&frame(0, &greeting("caching_sha2_password")))
        .write(&frame(1, &caching_sha2_scramble(b"pw", SEED)))
        .read(&frame(2, &switch))
        .write(&frame(3, &native_password_scramble(b"pw", new_seed)))
        .read(&frame(4, OK))
        .build();
    let mut stream = PacketStream::new(mock);

    let handshake = InitialHandshake::parse(stream.read_packet().await.unwrap()).unwrap();
    assert_eq!(handshake.connection_id, 42);
    assert_eq!(&handshake.seed[..], SEED);
    assert_eq!(handshake.auth_plugin, "caching_sha2_password");
    assert!(EncodeContext::new(handshake.server_status).no_backslash_escapes());

    let conf = ConnectParams::parse("db:3306/shop")
        .unwrap()
        .with_credentials("app", "pw");
    let ok = negotiate(&mut stream, &handshake.auth_plugin, &handshake.seed, &conf)
        .await
        .unwrap();
    assert_eq!(ok.server_status, 2);
}

#[tokio::test]
async fn test_access_denied() {
    let mut err = vec![0xff];
    err.extend_from_slice(&1045u16.to_le_bytes());
    err.extend_from_slice(b"#28000Access denied for user 'app'@'10.0.0.1' (using password: YES)");

    let mock = Builder::new()
        .write(&frame(0, &native_password_scramble(b"wrong", SEED)))
        .read(&frame(1, &err))
        .build();
    let mut stream = PacketStream::new(mock);
    let conf = ConnectParams::default().with_credentials("app", "wrong");

    let result = negotiate(&mut stream, "mysql_native_password", SEED, &conf).await;
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    match err {
        Error::ServerError { code, sql_state, .. } => {
            assert_eq!(code, 1045);
            assert_eq!(sql_state.as_deref(), Some("28000"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_restricted_plugin_fails_before_io() {
    // a mock with no scripted actions fails on any read or write
    let mock = Builder::new().build();
    let mut stream = PacketStream::new(mock);
    let conf = ConnectParams::default()
        .with_credentials("app", "pw")
        .from_options([("restrictedAuth", "mysql_native_password")])
        .unwrap();

    let err = negotiate(&mut stream, "dialog", SEED, &conf).await.unwrap_err();
    assert!(matches!(err, Error::RestrictedAuthPlugin { ref plugin, .. } if plugin == "dialog"));
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
}

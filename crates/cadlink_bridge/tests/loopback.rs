//! End-to-end tests over a loopback socket.
//!
//! The test plays the client: it listens, the bridge connects, and frames
//! are exchanged on one thread. Socket buffers hold each frame until the
//! other side reads it.

use cadlink_bridge::{Bridge, BridgeConfig, BridgeError};
use cadlink_engine::MemoryDocument;
use cadlink_protocol::{
    decode_result, encode_query, read_frame, write_frame, DbSelectQuery, FramingError, Query,
    QueryResult, Status, TableFlags, PING, PONG, UNHANDLED_PREFIX,
};
use cadlink_testkit::prelude::*;
use proptest::prelude::*;
use std::io::Write;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

const KEY: &str = "drawing-1";

fn connected(config: BridgeConfig) -> (Bridge<MemoryDocument>, TcpStream, TcpListener) {
    let listener = loopback_listener().unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let mut bridge = Bridge::load(config, MemoryDocument::new()).unwrap();
    bridge.connect(KEY, &addr).unwrap();
    let (client, _) = listener.accept().unwrap();
    (bridge, client, listener)
}

fn insert_payload() -> String {
    encode_query(&Query::from(insert_query(sample_database()))).unwrap()
}

fn reply(client: &mut TcpStream) -> QueryResult {
    decode_result(&read_frame(client).unwrap()).unwrap()
}

fn assert_unhandled(result: &QueryResult) {
    assert_eq!(result.props().status(), Status::Failure);
    let message = result.props().message.value().cloned().unwrap_or_default();
    assert!(message.starts_with(UNHANDLED_PREFIX), "message: {message}");
}

#[test]
fn ping_is_answered_with_pong() {
    let (mut bridge, mut client, _listener) = connected(BridgeConfig::default());

    write_frame(&mut client, PING).unwrap();
    bridge.ping(KEY).unwrap();
    assert_eq!(read_frame(&mut client).unwrap(), PONG);
}

#[test]
fn wrong_ping_is_an_error() {
    let (mut bridge, mut client, _listener) = connected(BridgeConfig::default());

    write_frame(&mut client, "hello").unwrap();
    let err = bridge.ping(KEY).unwrap_err();
    assert!(matches!(err, BridgeError::UnexpectedPing { received } if received == "hello"));
}

#[test]
fn insert_round_trip() {
    let (mut bridge, mut client, _listener) = connected(BridgeConfig::default());

    write_frame(&mut client, &insert_payload()).unwrap();
    bridge.db_operation(KEY).unwrap();

    let QueryResult::DbInsertResult(result) = reply(&mut client) else {
        panic!("expected an insert result");
    };
    assert_eq!(result.result.status(), Status::Success);
    assert_eq!(result.num_failure.value(), Some(&0));
    assert!(bridge.host().counters().appended > 0);
}

#[test]
fn select_after_insert_sees_inserted_layers() {
    let (mut bridge, mut client, _listener) = connected(BridgeConfig::default());

    write_frame(&mut client, &insert_payload()).unwrap();
    bridge.db_operation(KEY).unwrap();
    let _ = reply(&mut client);

    let select = Query::from(DbSelectQuery::tables(TableFlags::LAYER));
    write_frame(&mut client, &encode_query(&select).unwrap()).unwrap();
    bridge.db_operation(KEY).unwrap();

    let QueryResult::DbSelectResult(result) = reply(&mut client) else {
        panic!("expected a select result");
    };
    let db = result.db.value().unwrap();
    let names: Vec<&str> = db.0.layers().map(|(k, _)| k).collect();
    assert!(names.contains(&"walls"));
    assert!(names.contains(&"doors"));
}

#[test]
fn malformed_request_gets_failed_result() {
    let (mut bridge, mut client, _listener) = connected(BridgeConfig::default());

    write_frame(&mut client, "{ not a query").unwrap();
    bridge.db_operation(KEY).unwrap();
    assert_unhandled(&reply(&mut client));
}

#[test]
fn framing_failure_is_reported_to_client() {
    let (mut bridge, mut client, _listener) = connected(BridgeConfig::default());

    client.write_all(b"12x\n").unwrap();
    let err = bridge.db_operation(KEY).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Framing(FramingError::InvalidLength { .. })
    ));
    assert_unhandled(&reply(&mut client));
}

#[test]
fn oversized_request_is_rejected() {
    let config = BridgeConfig::default().with_max_frame_len(16);
    let (mut bridge, mut client, _listener) = connected(config);

    write_frame(&mut client, &insert_payload()).unwrap();
    let err = bridge.db_operation(KEY).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Framing(FramingError::TooLarge { max: 16, .. })
    ));
    assert_unhandled(&reply(&mut client));
}

#[test]
fn serve_runs_until_client_closes() {
    let (mut bridge, mut client, _listener) = connected(BridgeConfig::default());

    write_frame(&mut client, PING).unwrap();
    write_frame(&mut client, &insert_payload()).unwrap();
    client.shutdown(Shutdown::Write).unwrap();

    assert_eq!(bridge.serve(KEY).unwrap(), 2);
    assert_eq!(read_frame(&mut client).unwrap(), PONG);
    assert_eq!(reply(&mut client).props().status(), Status::Success);
    assert!(matches!(read_frame(&mut client), Err(e) if e.is_clean_close()));
    assert!(!bridge.sessions().contains(KEY));
}

#[test]
fn idle_timeout_writes_nothing() {
    let config = BridgeConfig::default().with_read_timeout(Some(Duration::from_millis(100)));
    let (mut bridge, mut client, _listener) = connected(config);

    let err = bridge.db_operation(KEY).unwrap_err();
    assert!(err.is_idle(), "error: {err}");

    // the next request must get its own reply, not a stale one
    write_frame(&mut client, &insert_payload()).unwrap();
    bridge.db_operation(KEY).unwrap();
    let QueryResult::DbInsertResult(result) = reply(&mut client) else {
        panic!("expected an insert result");
    };
    assert_eq!(result.result.status(), Status::Success);

    client
        .set_read_timeout(Some(Duration::from_millis(100)))
        .unwrap();
    assert!(matches!(read_frame(&mut client), Err(e) if e.is_idle()));
}

#[test]
fn serve_waits_through_idle_timeouts() {
    let config = BridgeConfig::default().with_read_timeout(Some(Duration::from_millis(50)));
    let (mut bridge, mut client, _listener) = connected(config);

    let late = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        write_frame(&mut client, PING).unwrap();
        client.shutdown(Shutdown::Write).unwrap();
        client
    });

    assert_eq!(bridge.serve(KEY).unwrap(), 1);
    let mut client = late.join().unwrap();
    assert_eq!(read_frame(&mut client).unwrap(), PONG);
    assert!(matches!(read_frame(&mut client), Err(e) if e.is_clean_close()));
}

#[test]
fn missing_session_is_reported() {
    let mut bridge = Bridge::load(BridgeConfig::default(), MemoryDocument::new()).unwrap();
    assert!(matches!(
        bridge.db_operation("nobody"),
        Err(BridgeError::NoSession(key)) if key == "nobody"
    ));
    assert!(matches!(bridge.ping("nobody"), Err(BridgeError::NoSession(_))));
}

#[test]
fn reconnect_replaces_session() {
    let (mut bridge, mut first, listener) = connected(BridgeConfig::default());
    let addr = listener.local_addr().unwrap().to_string();

    bridge.connect(KEY, &addr).unwrap();
    let (mut second, _) = listener.accept().unwrap();
    assert!(matches!(
        read_frame(&mut first),
        Err(e) if e.is_clean_close()
    ));

    write_frame(&mut second, PING).unwrap();
    bridge.ping(KEY).unwrap();
    assert_eq!(read_frame(&mut second).unwrap(), PONG);
    assert_eq!(bridge.sessions().len(), 1);
}

#[test]
fn unload_returns_document() {
    let (mut bridge, mut client, _listener) = connected(BridgeConfig::default());
    write_frame(&mut client, &insert_payload()).unwrap();
    bridge.db_operation(KEY).unwrap();
    let _ = reply(&mut client);

    let before = MemoryDocument::new().object_count();
    let host = bridge.unload();
    assert!(host.object_count() > before);
    assert!(matches!(read_frame(&mut client), Err(e) if e.is_clean_close()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn generated_snapshots_insert_cleanly(db in database_strategy()) {
        let (mut bridge, mut client, _listener) = connected(BridgeConfig::default());
        let payload = encode_query(&Query::from(insert_query(db))).unwrap();

        write_frame(&mut client, &payload).unwrap();
        bridge.db_operation(KEY).unwrap();
        let result = reply(&mut client);
        prop_assert_eq!(result.props().status(), Status::Success);
    }
}

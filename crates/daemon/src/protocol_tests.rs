// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol unit tests

use super::*;
use yare::parameterized;

#[parameterized(
    ping = { Request::Ping },
    append = { Request::Append { list_id: "lista_A".to_string(), value: -7 } },
    remove = { Request::Remove { list_id: "a,b".to_string() } },
    get = { Request::Get { list_id: "A".to_string(), index: -1 } },
    size = { Request::Size { list_id: "A".to_string() } },
    status = { Request::Status },
    snapshot = { Request::Snapshot },
    shutdown = { Request::Shutdown },
)]
fn request_survives_encoding(request: Request) {
    let encoded = encode(&request).expect("encode failed");
    let decoded: Request = decode(&encoded).expect("decode failed");
    assert_eq!(request, decoded);
}

#[test]
fn encode_decode_status_response() {
    let response = Response::Status {
        uptime_secs: 3600,
        lists: 2,
        elements: 3,
        records_since_snapshot: 5,
        snapshots_taken: 1,
        last_snapshot: Some(Utc::now()),
    };

    let encoded = encode(&response).expect("encode failed");
    let decoded: Response = decode(&encoded).expect("decode failed");

    assert_eq!(response, decoded);
}

#[test]
fn list_error_response_carries_kind() {
    let response = Response::ListError {
        error: ListError::out_of_range("A", 99, 2),
    };

    let encoded = encode(&response).expect("encode failed");
    let json: serde_json::Value = serde_json::from_slice(&encoded).expect("valid JSON");
    assert_eq!(json["type"], "ListError");
    assert_eq!(json["error"]["kind"], "out_of_range");
    assert_eq!(json["error"]["size"], 2);

    let decoded: Response = decode(&encoded).expect("decode failed");
    assert_eq!(response, decoded);
}

#[test]
fn encode_returns_json_without_length_prefix() {
    let encoded = encode(&Response::Pong).expect("encode failed");

    // encode() returns raw JSON, no length prefix
    let json_str = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
    assert!(
        json_str.starts_with('{'),
        "should be JSON object: {}",
        json_str
    );
}

#[test]
fn decode_rejects_unknown_request() {
    let result: Result<Request, _> = decode(br#"{"type":"Truncate"}"#);
    assert!(matches!(result, Err(ProtocolError::Json(_))));
}

#[tokio::test]
async fn read_write_message_roundtrip() {
    let original = b"hello world";

    let mut buffer = Vec::new();
    write_message(&mut buffer, original)
        .await
        .expect("write failed");

    // write_message adds 4-byte length prefix
    assert_eq!(buffer.len(), 4 + original.len());

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");

    assert_eq!(read_back, original);
}

#[tokio::test]
async fn write_message_adds_length_prefix() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_message(&mut buffer, data)
        .await
        .expect("write failed");

    // First 4 bytes are the length prefix
    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;

    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);
}

#[tokio::test]
async fn several_messages_on_one_stream() {
    let mut buffer = Vec::new();
    for request in [Request::Ping, Request::Status, Request::Shutdown] {
        write_message(&mut buffer, &encode(&request).unwrap())
            .await
            .unwrap();
    }

    let mut cursor = std::io::Cursor::new(buffer);
    assert_eq!(
        read_request(&mut cursor, DEFAULT_TIMEOUT).await.unwrap(),
        Request::Ping
    );
    assert_eq!(
        read_request(&mut cursor, DEFAULT_TIMEOUT).await.unwrap(),
        Request::Status
    );
    assert_eq!(
        read_request(&mut cursor, DEFAULT_TIMEOUT).await.unwrap(),
        Request::Shutdown
    );
    assert!(matches!(
        read_request(&mut cursor, DEFAULT_TIMEOUT).await,
        Err(ProtocolError::ConnectionClosed)
    ));
}

#[tokio::test]
async fn read_rejects_oversized_length() {
    let mut buffer = ((MAX_MESSAGE_SIZE + 1) as u32).to_be_bytes().to_vec();
    buffer.extend_from_slice(b"{}");

    let mut cursor = std::io::Cursor::new(buffer);
    assert!(matches!(
        read_message(&mut cursor).await,
        Err(ProtocolError::MessageTooLarge { .. })
    ));
}

#[tokio::test]
async fn write_rejects_oversized_message() {
    let data = vec![b'x'; MAX_MESSAGE_SIZE + 1];
    let mut buffer = Vec::new();
    assert!(matches!(
        write_message(&mut buffer, &data).await,
        Err(ProtocolError::MessageTooLarge { .. })
    ));
    assert!(buffer.is_empty());
}

#[tokio::test]
async fn truncated_body_is_io_error() {
    let mut buffer = 10u32.to_be_bytes().to_vec();
    buffer.extend_from_slice(b"abc");

    let mut cursor = std::io::Cursor::new(buffer);
    assert!(matches!(
        read_message(&mut cursor).await,
        Err(ProtocolError::Io(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn read_request_times_out_on_silent_peer() {
    let (_client, mut server) = tokio::io::duplex(64);
    let result = read_request(&mut server, Duration::from_secs(1)).await;
    assert!(matches!(result, Err(ProtocolError::Timeout)));
}

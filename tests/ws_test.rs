//! Integration tests for WebSocket connection lifecycle, presence counting,
//! channel joins, and transport event fan-out.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Start the server on a random port and return its address.
async fn start_test_server() -> SocketAddr {
    let state =
        syncast_server::state::AppState::new(syncast_server::channels::ChannelDirectory::with_defaults());
    let app = syncast_server::routes::build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

async fn connect(addr: SocketAddr) -> WsStream {
    let (ws_stream, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("Failed to connect to WebSocket");
    ws_stream
}

/// Read the next JSON message, skipping ping/pong keepalive frames.
async fn recv_json(ws: &mut WsStream) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("Timed out waiting for a message")
            .expect("Stream ended unexpectedly")
            .expect("WebSocket receive error");

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("Server sent invalid JSON")
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("Expected text message, got: {:?}", other),
        }
    }
}

async fn send_json(ws: &mut WsStream, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("Failed to send message");
}

/// Assert the next message is a user-count broadcast with the given value.
async fn expect_user_count(ws: &mut WsStream, expected: u64) {
    let value = recv_json(ws).await;
    assert_eq!(value["type"], "user-count", "unexpected message: {}", value);
    assert_eq!(value["count"], expected);
}

/// Assert that no data message arrives within the window.
async fn expect_silence(ws: &mut WsStream, window: Duration) {
    let result = tokio::time::timeout(window, ws.next()).await;
    match result {
        Err(_) => {}
        Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {}
        Ok(other) => panic!("Expected no message, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_user_count_sequence_across_connections() {
    let addr = start_test_server().await;

    // Admit A, B, C in order; every connection observes the counter
    // strictly after each mutation.
    let mut a = connect(addr).await;
    expect_user_count(&mut a, 1).await;

    let mut b = connect(addr).await;
    expect_user_count(&mut a, 2).await;
    expect_user_count(&mut b, 2).await;

    let mut c = connect(addr).await;
    expect_user_count(&mut a, 3).await;
    expect_user_count(&mut b, 3).await;
    expect_user_count(&mut c, 3).await;

    // C leaves; the survivors see 2.
    c.close(None).await.expect("Failed to close");
    expect_user_count(&mut a, 2).await;
    expect_user_count(&mut b, 2).await;
}

#[tokio::test]
async fn test_join_known_channel_replies_to_sender_only() {
    let addr = start_test_server().await;

    let mut a = connect(addr).await;
    expect_user_count(&mut a, 1).await;
    let mut b = connect(addr).await;
    expect_user_count(&mut a, 2).await;
    expect_user_count(&mut b, 2).await;

    send_json(&mut a, json!({"type": "join-channel", "channel": "hindi"})).await;

    let reply = recv_json(&mut a).await;
    assert_eq!(reply["type"], "audio-url");
    assert_eq!(reply["channel"], "hindi");
    assert_eq!(reply["url"], "/audio/hindi.mp3");

    // The reply never reaches other connections.
    expect_silence(&mut b, Duration::from_millis(300)).await;
}

#[tokio::test]
async fn test_join_unknown_channel_yields_absent_url() {
    let addr = start_test_server().await;

    let mut a = connect(addr).await;
    expect_user_count(&mut a, 1).await;
    let mut b = connect(addr).await;
    expect_user_count(&mut a, 2).await;
    expect_user_count(&mut b, 2).await;

    send_json(&mut a, json!({"type": "join-channel", "channel": "klingon"})).await;

    let reply = recv_json(&mut a).await;
    assert_eq!(reply["type"], "audio-url");
    assert_eq!(reply["channel"], "klingon");
    assert!(reply["url"].is_null(), "expected absent url: {}", reply);

    // A typo'd join does not disturb presence or other connections.
    expect_silence(&mut b, Duration::from_millis(300)).await;

    // The connection survives and can still join a real channel.
    send_json(&mut a, json!({"type": "join-channel", "channel": "tamil"})).await;
    let reply = recv_json(&mut a).await;
    assert_eq!(reply["url"], "/audio/tamil.mp3");
}

#[tokio::test]
async fn test_video_play_fans_out_to_everyone_but_the_sender() {
    let addr = start_test_server().await;

    let mut a = connect(addr).await;
    expect_user_count(&mut a, 1).await;
    let mut b = connect(addr).await;
    expect_user_count(&mut a, 2).await;
    expect_user_count(&mut b, 2).await;
    let mut c = connect(addr).await;
    expect_user_count(&mut a, 3).await;
    expect_user_count(&mut b, 3).await;
    expect_user_count(&mut c, 3).await;

    send_json(&mut a, json!({"type": "video-play", "timestamp": 42.5})).await;

    for ws in [&mut b, &mut c] {
        let event = recv_json(ws).await;
        assert_eq!(event["type"], "video-play");
        assert_eq!(event["timestamp"], 42.5);
    }

    // The originator never receives its own emission.
    expect_silence(&mut a, Duration::from_millis(300)).await;
}

#[tokio::test]
async fn test_pause_and_seek_relay_identical_payloads() {
    let addr = start_test_server().await;

    let mut a = connect(addr).await;
    expect_user_count(&mut a, 1).await;
    let mut b = connect(addr).await;
    expect_user_count(&mut a, 2).await;
    expect_user_count(&mut b, 2).await;

    send_json(&mut b, json!({"type": "video-pause", "timestamp": 120.0})).await;
    let event = recv_json(&mut a).await;
    assert_eq!(event["type"], "video-pause");
    assert_eq!(event["timestamp"], 120.0);

    send_json(&mut b, json!({"type": "video-seek", "timestamp": 1883.25})).await;
    let event = recv_json(&mut a).await;
    assert_eq!(event["type"], "video-seek");
    assert_eq!(event["timestamp"], 1883.25);
}

#[tokio::test]
async fn test_sync_request_broadcasts_sender_identity() {
    let addr = start_test_server().await;

    let mut a = connect(addr).await;
    expect_user_count(&mut a, 1).await;
    let mut b = connect(addr).await;
    expect_user_count(&mut a, 2).await;
    expect_user_count(&mut b, 2).await;
    let mut c = connect(addr).await;
    expect_user_count(&mut a, 3).await;
    expect_user_count(&mut b, 3).await;
    expect_user_count(&mut c, 3).await;

    send_json(&mut a, json!({"type": "sync-request"})).await;

    let to_b = recv_json(&mut b).await;
    let to_c = recv_json(&mut c).await;
    assert_eq!(to_b["type"], "sync-requested");
    assert_eq!(to_c["type"], "sync-requested");
    assert!(to_b["from"].is_number(), "expected session id: {}", to_b);
    assert_eq!(to_b["from"], to_c["from"], "peers saw different sender ids");

    // The asker receives nothing from its own request.
    expect_silence(&mut a, Duration::from_millis(300)).await;
}

#[tokio::test]
async fn test_malformed_messages_are_ignored() {
    let addr = start_test_server().await;

    let mut a = connect(addr).await;
    expect_user_count(&mut a, 1).await;
    let mut b = connect(addr).await;
    expect_user_count(&mut a, 2).await;
    expect_user_count(&mut b, 2).await;

    // Garbage, an unknown kind, and a missing payload field, in order.
    a.send(Message::Text("this is not json".into()))
        .await
        .expect("Failed to send");
    send_json(&mut a, json!({"type": "blast-off"})).await;
    send_json(&mut a, json!({"type": "video-play"})).await;

    // The connection survives all three and still relays normally.
    send_json(&mut a, json!({"type": "video-play", "timestamp": 7.5})).await;
    let event = recv_json(&mut b).await;
    assert_eq!(event["type"], "video-play");
    assert_eq!(event["timestamp"], 7.5);
}

#[tokio::test]
async fn test_abrupt_disconnect_decrements_presence() {
    let addr = start_test_server().await;

    let mut a = connect(addr).await;
    expect_user_count(&mut a, 1).await;
    let b = connect(addr).await;
    expect_user_count(&mut a, 2).await;

    // Drop without a close frame; the server's reader loop ends and the
    // registry entry is removed all the same.
    drop(b);
    expect_user_count(&mut a, 1).await;

    // Reconnect works and presence picks up from the corrected count.
    let mut b2 = connect(addr).await;
    expect_user_count(&mut a, 2).await;
    expect_user_count(&mut b2, 2).await;
}

#[tokio::test]
async fn test_health_endpoint() {
    let addr = start_test_server().await;

    let body = reqwest::get(format!("http://{}/health", addr))
        .await
        .expect("Failed to reach health endpoint")
        .text()
        .await
        .expect("Failed to read body");

    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_host_ip_endpoint_returns_plain_address() {
    let addr = start_test_server().await;

    let resp = reqwest::get(format!("http://{}/api/host-ip", addr))
        .await
        .expect("Failed to reach host-ip endpoint");

    // 503 is the contract when the host has no non-loopback interface
    // (possible in minimal CI environments); otherwise the body must be a
    // bare IP address.
    if resp.status().is_success() {
        let body = resp.text().await.expect("Failed to read body");
        let ip: std::net::IpAddr = body.trim().parse().expect("Body is not an IP address");
        assert!(!ip.is_loopback(), "host-ip returned a loopback address");
    } else {
        assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    }
}

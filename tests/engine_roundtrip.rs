//! End-to-end exchanges against a scripted mock engine
//!
//! Drives the real TCP client (and the full gateway) against a local
//! listener that mimics the engine's habit of answering one request per
//! connection and then closing its end.

use enginegate::config::{EngineConfig, EngineGateConfig};
use enginegate::gateway::{CommandGateway, CommandRequest, Dispatch};
use enginegate::transport::{EngineClient, Transport};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// How the mock engine treats one accepted connection
enum Behavior {
    /// Write the whole response at once, then close
    Respond(&'static [u8]),
    /// Write the response in delayed pieces, then close
    RespondChunks(Vec<(&'static [u8], u64)>),
    /// Close without writing anything
    CloseSilently,
    /// Write an incomplete response, then close
    PartialThenClose(&'static [u8]),
    /// Write the whole response but never close or send more
    RespondThenHang(&'static [u8]),
}

/// Serve one scripted behavior per accepted connection, in order
async fn spawn_engine(behaviors: Vec<Behavior>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        for behavior in behaviors {
            let (mut stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let mut request = vec![0u8; 8192];
            let _ = stream.read(&mut request).await;

            match behavior {
                Behavior::Respond(bytes) => {
                    let _ = stream.write_all(bytes).await;
                }
                Behavior::RespondChunks(chunks) => {
                    for (bytes, delay_ms) in chunks {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        let _ = stream.write_all(bytes).await;
                        let _ = stream.flush().await;
                    }
                }
                Behavior::CloseSilently => {}
                Behavior::PartialThenClose(bytes) => {
                    let _ = stream.write_all(bytes).await;
                }
                Behavior::RespondThenHang(bytes) => {
                    let _ = stream.write_all(bytes).await;
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
            }
        }
    });

    port
}

fn engine_config(port: u16) -> EngineConfig {
    EngineConfig {
        host: "127.0.0.1".to_string(),
        port,
        connect_timeout_secs: 1,
        read_timeout_secs: 1,
        buffer_size: 65536,
    }
}

fn gate_config(port: u16) -> EngineGateConfig {
    EngineGateConfig {
        engine: engine_config(port),
        ..Default::default()
    }
}

#[tokio::test]
async fn chunked_delivery_matches_single_chunk() {
    let single_port = spawn_engine(vec![Behavior::Respond(
        br#"{"status": "success", "actors": [1, 2, 3]}"#,
    )])
    .await;
    let chunked_port = spawn_engine(vec![Behavior::RespondChunks(vec![
        (br#"{"status": "suc"#, 30),
        (br#"cess", "actors""#, 30),
        (br#": [1, 2, 3]}"#, 30),
    ])])
    .await;

    let single = EngineClient::new(engine_config(single_port))
        .send_command("get_actors", serde_json::json!({}))
        .await;
    let chunked = EngineClient::new(engine_config(chunked_port))
        .send_command("get_actors", serde_json::json!({}))
        .await;

    assert!(single.is_success());
    assert_eq!(single, chunked);
}

#[tokio::test]
async fn both_remote_error_shapes_normalize() {
    let port = spawn_engine(vec![
        Behavior::Respond(br#"{"status": "error", "error": "unknown actor"}"#),
        Behavior::Respond(br#"{"success": false, "message": "level not loaded"}"#),
    ])
    .await;
    let client = EngineClient::new(engine_config(port));

    let first = client
        .send_command("destroy_actor", serde_json::json!({"name": "ghost"}))
        .await;
    assert_eq!(first.error_message(), Some("unknown actor"));

    let second = client
        .send_command("get_level", serde_json::json!({}))
        .await;
    assert_eq!(second.error_message(), Some("level not loaded"));
}

#[tokio::test]
async fn silent_close_reports_no_data() {
    let port = spawn_engine(vec![Behavior::CloseSilently]).await;
    let client = EngineClient::new(engine_config(port));

    let response = client.send_command("ping", serde_json::json!({})).await;
    assert!(response
        .error_message()
        .unwrap()
        .contains("before any data"));
    assert!(!client.is_connected().await);
}

#[tokio::test]
async fn partial_close_reports_incomplete() {
    let port = spawn_engine(vec![Behavior::PartialThenClose(br#"{"status": "succ"#)]).await;
    let client = EngineClient::new(engine_config(port));

    let response = client.send_command("ping", serde_json::json!({})).await;
    assert!(response
        .error_message()
        .unwrap()
        .contains("before complete response"));
    assert!(!client.is_connected().await);
}

#[tokio::test]
async fn complete_response_salvaged_on_read_timeout() {
    let port = spawn_engine(vec![Behavior::RespondThenHang(
        br#"{"status": "success", "salvaged": true}"#,
    )])
    .await;
    let client = EngineClient::new(engine_config(port));

    let response = client.send_command("ping", serde_json::json!({})).await;
    assert!(response.is_success());
    assert_eq!(response.into_value()["salvaged"], true);
    assert!(!client.is_connected().await);
}

#[tokio::test]
async fn gateway_confirm_flow_over_real_transport() {
    let port = spawn_engine(vec![
        Behavior::Respond(br#"{"status": "success", "fps": 60}"#),
        Behavior::Respond(br#"{"status": "success", "destroyed": 7}"#),
    ])
    .await;
    let gateway = CommandGateway::new(&gate_config(port)).unwrap();

    // Safe command: no gate, straight to the engine.
    let stats = gateway.dispatch(CommandRequest::console("stat fps")).await;
    match stats {
        Dispatch::Executed(response) => assert_eq!(response.into_value()["fps"], 60),
        other => panic!("expected execution, got {:?}", other),
    }

    // Medium command: token round-trip, then the engine sees it.
    let prompt = match gateway
        .dispatch(CommandRequest::console("killall enemy"))
        .await
    {
        Dispatch::NeedsConfirmation(prompt) => prompt,
        other => panic!("expected confirmation prompt, got {:?}", other),
    };

    let confirmed = gateway
        .dispatch_confirmed(
            &prompt.confirmation_token,
            CommandRequest::console("killall enemy"),
            false,
        )
        .await;
    match confirmed {
        Dispatch::Executed(response) => assert_eq!(response.into_value()["destroyed"], 7),
        other => panic!("expected execution, got {:?}", other),
    }
}

#[tokio::test]
async fn blocked_command_never_reaches_engine() {
    // No listener at all: a blocked command must be rejected before any
    // connection attempt, so the missing engine is never noticed.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let gateway = CommandGateway::new(&gate_config(port)).unwrap();
    let dispatch = gateway
        .dispatch(CommandRequest::console("shutdown now"))
        .await;
    assert!(matches!(dispatch, Dispatch::Rejected { blocked: true, .. }));
}

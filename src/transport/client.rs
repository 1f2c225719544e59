//! Reconnect-per-call TCP client for the engine command port

use super::protocol::{payload_preview, EngineCommand, EngineResponse};
use super::Transport;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use serde_json::Value;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream};
use tokio::sync::{Mutex, RwLock};
use tokio::time::{timeout, Duration};

/// TCP client for the engine command port.
///
/// The engine is single-threaded and closes its end of the connection
/// after every exchange, so the client dials a fresh socket per command
/// and never pools. At most one exchange is in flight at a time: the
/// socket slot is held under an async mutex for the whole call, so
/// concurrent senders serialize instead of multiplexing.
pub struct EngineClient {
    config: EngineConfig,
    socket: Mutex<Option<TcpStream>>,
    connected: RwLock<bool>,
}

impl EngineClient {
    /// Create a new client for the configured endpoint
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            socket: Mutex::new(None),
            connected: RwLock::new(false),
        }
    }

    /// Whether an exchange currently holds a live socket
    pub async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }

    /// Open a fresh connection with the engine's socket options applied
    async fn connect(&self) -> Result<TcpStream> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| {
                Error::Config(format!(
                    "Invalid engine address {}:{}: {}",
                    self.config.host, self.config.port, e
                ))
            })?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_keepalive(true)?;
        socket.set_send_buffer_size(self.config.buffer_size as u32)?;
        socket.set_recv_buffer_size(self.config.buffer_size as u32)?;

        let connect_timeout = Duration::from_secs(self.config.connect_timeout_secs);
        let stream = timeout(connect_timeout, socket.connect(addr))
            .await
            .map_err(|_| {
                Error::Transport(format!(
                    "Timed out connecting to engine at {} after {}s",
                    addr, self.config.connect_timeout_secs
                ))
            })?
            .map_err(|e| Error::Transport(format!("Could not connect to engine at {}: {}", addr, e)))?;
        stream.set_nodelay(true)?;

        Ok(stream)
    }

    /// Run one command/response exchange over a fresh connection.
    ///
    /// The stream lives in the caller-held socket slot so the cleanup in
    /// [`send_command`] closes it on every exit path.
    async fn exchange(
        &self,
        slot: &mut Option<TcpStream>,
        command_type: &str,
        params: Value,
    ) -> Result<Value> {
        let stream = self.connect().await?;
        *slot = Some(stream);
        *self.connected.write().await = true;

        let stream = slot
            .as_mut()
            .ok_or_else(|| Error::Internal("Connection slot empty after connect".to_string()))?;

        let frame = serde_json::to_vec(&EngineCommand::new(command_type, params))?;
        stream
            .write_all(&frame)
            .await
            .map_err(|e| Error::Transport(format!("Failed to send command: {}", e)))?;

        self.read_response(stream).await
    }

    /// Accumulate response bytes until they parse as JSON.
    ///
    /// The protocol has no end-of-message marker: completeness is inferred
    /// purely by the buffer parsing as a full JSON value. This is fragile
    /// if a prefix of the real message is itself valid JSON, but it is the
    /// framing the engine speaks.
    async fn read_response(&self, stream: &mut TcpStream) -> Result<Value> {
        let read_timeout = Duration::from_secs(self.config.read_timeout_secs);
        let mut buffer = BytesMut::with_capacity(self.config.buffer_size);

        loop {
            buffer.reserve(4096);
            match timeout(read_timeout, stream.read_buf(&mut buffer)).await {
                Err(_) => {
                    // The engine may have sent everything and simply gone
                    // quiet without closing; salvage if it already parses.
                    if !buffer.is_empty() {
                        if let Ok(value) = serde_json::from_slice::<Value>(&buffer) {
                            tracing::warn!(
                                bytes = buffer.len(),
                                "Read timed out but buffered response parsed; salvaging"
                            );
                            return Ok(value);
                        }
                    }
                    return Err(Error::Transport(format!(
                        "Timed out after {}s waiting for engine response",
                        self.config.read_timeout_secs
                    )));
                }
                Ok(Err(e)) => {
                    return Err(Error::Transport(format!("Failed to read response: {}", e)));
                }
                Ok(Ok(0)) => {
                    if buffer.is_empty() {
                        return Err(Error::Transport(
                            "Connection closed before any data received".to_string(),
                        ));
                    }
                    return Err(Error::Transport(
                        "Connection closed before complete response".to_string(),
                    ));
                }
                Ok(Ok(_)) => {
                    if let Ok(value) = serde_json::from_slice::<Value>(&buffer) {
                        tracing::debug!(
                            bytes = buffer.len(),
                            response = %payload_preview(&value, 256),
                            "Engine response complete"
                        );
                        return Ok(value);
                    }
                    // Partial JSON so far; keep reading.
                }
            }
        }
    }
}

#[async_trait]
impl Transport for EngineClient {
    async fn send_command(&self, command_type: &str, params: Value) -> EngineResponse {
        tracing::debug!(
            command = command_type,
            params = %payload_preview(&params, 256),
            "Sending engine command"
        );

        let mut slot = self.socket.lock().await;
        if let Some(stale) = slot.take() {
            // The engine closed its end after the previous exchange; any
            // socket still here is unusable.
            tracing::warn!("Discarding stale engine connection before reconnect");
            drop(stale);
        }
        *self.connected.write().await = false;

        let result = self.exchange(&mut slot, command_type, params).await;

        // Stateless between calls: connection state is cleared on every
        // exit path, success or failure.
        *slot = None;
        *self.connected.write().await = false;

        match result {
            Ok(value) => EngineResponse::normalize(value),
            Err(err) => {
                tracing::warn!(command = command_type, error = %err, "Engine exchange failed");
                EngineResponse::error(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn test_config(port: u16) -> EngineConfig {
        EngineConfig {
            host: "127.0.0.1".to_string(),
            port,
            connect_timeout_secs: 1,
            read_timeout_secs: 1,
            buffer_size: 65536,
        }
    }

    /// One-shot mock engine: accept, read one frame, write `response`, close.
    async fn spawn_mock_engine(response: &'static [u8]) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = stream.read(&mut buf).await.unwrap();
            stream.write_all(response).await.unwrap();
        });
        port
    }

    #[tokio::test]
    async fn test_roundtrip_success() {
        let port = spawn_mock_engine(br#"{"status": "success", "fps": 60}"#).await;
        let client = EngineClient::new(test_config(port));

        let response = client
            .send_command("get_stats", serde_json::json!({}))
            .await;
        assert!(response.is_success());
        assert_eq!(response.into_value()["fps"], 60);
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn test_connect_refused_becomes_error_response() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = EngineClient::new(test_config(port));
        let response = client.send_command("ping", serde_json::json!({})).await;
        assert!(!response.is_success());
        assert!(response
            .error_message()
            .unwrap()
            .contains("Could not connect"));
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn test_closed_before_any_data() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = stream.read(&mut buf).await.unwrap();
            // Close without answering.
        });

        let client = EngineClient::new(test_config(port));
        let response = client.send_command("ping", serde_json::json!({})).await;
        assert!(response
            .error_message()
            .unwrap()
            .contains("before any data"));
        assert!(!client.is_connected().await);
    }
}

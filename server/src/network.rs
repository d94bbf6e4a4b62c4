//! TCP network layer speaking newline-delimited JSON
//!
//! Each accepted connection gets a monotonically increasing connection id, a
//! reader task that parses one `ClientEvent` per line and forwards it to the
//! gateway mailbox, and a writer task that drains the connection's outbound
//! channel. The network layer knows nothing about rooms; connection identity
//! is the only thing it contributes to the game.

use crate::gateway::{Gateway, GatewayCommand};
use crate::questions::Question;
use log::{debug, error, info, warn};
use shared::{ClientEvent, ConnId, ServerEvent};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Accept loop plus the handle to the gateway worker it feeds.
pub struct QuizServer {
    listener: TcpListener,
    gateway_tx: mpsc::UnboundedSender<GatewayCommand>,
}

impl QuizServer {
    /// Binds the listener and spawns the gateway worker for the given
    /// question bank. Bind to port 0 to let the OS pick (used by tests).
    pub async fn bind(
        addr: &str,
        questions: Vec<Question>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (gateway, gateway_tx) = Gateway::new(questions);
        tokio::spawn(gateway.run());

        Ok(Self {
            listener,
            gateway_tx,
        })
    }

    /// The address actually bound, for clients and tests.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever, one pair of reader/writer tasks each.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let mut next_conn_id: ConnId = 1;

        loop {
            let (stream, addr) = self.listener.accept().await?;
            let conn_id = next_conn_id;
            next_conn_id += 1;

            debug!("Connection {} accepted from {}", conn_id, addr);
            tokio::spawn(handle_connection(stream, conn_id, self.gateway_tx.clone()));
        }
    }
}

/// Runs one connection until EOF or error, then reports the disconnect so the
/// gateway can reconcile rosters and tear down hosted rooms.
async fn handle_connection(
    stream: TcpStream,
    conn_id: ConnId,
    gateway_tx: mpsc::UnboundedSender<GatewayCommand>,
) {
    let (reader, mut writer) = stream.into_split();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();

    if gateway_tx
        .send(GatewayCommand::Connected {
            conn_id,
            sender: event_tx,
        })
        .is_err()
    {
        error!("Gateway is gone, dropping connection {}", conn_id);
        return;
    }

    // Writer: serialize outbound events, one JSON object per line
    let writer_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(mut line) => {
                    line.push('\n');
                    if writer.write_all(line.as_bytes()).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize event for connection {}: {}", conn_id, e);
                }
            }
        }
    });

    // Reader: parse inbound lines until the peer goes away
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<ClientEvent>(line) {
                    Ok(event) => {
                        if gateway_tx
                            .send(GatewayCommand::Inbound { conn_id, event })
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Connection {} sent an unparseable event: {}", conn_id, e);
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Read error on connection {}: {}", conn_id, e);
                break;
            }
        }
    }

    let _ = gateway_tx.send(GatewayCommand::Disconnected { conn_id });
    writer_task.abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::default_bank;
    use tokio::io::AsyncReadExt;

    async fn start_server() -> SocketAddr {
        let server = QuizServer::bind("127.0.0.1:0", default_bank())
            .await
            .expect("failed to bind test server");
        let addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        addr
    }

    async fn read_line(stream: &mut TcpStream) -> String {
        let mut line = String::new();
        let mut byte = [0u8; 1];
        loop {
            stream.read_exact(&mut byte).await.expect("read failed");
            if byte[0] == b'\n' {
                return line;
            }
            line.push(byte[0] as char);
        }
    }

    #[tokio::test]
    async fn test_create_room_over_tcp() {
        let addr = start_server().await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        stream
            .write_all(b"{\"type\":\"create_room\"}\n")
            .await
            .unwrap();

        let line = read_line(&mut stream).await;
        let event: ServerEvent = serde_json::from_str(&line).unwrap();
        match event {
            ServerEvent::RoomCreated { room_code } => assert_eq!(room_code.len(), 4),
            other => panic!("expected room_created, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_garbage_input_does_not_kill_the_connection() {
        let addr = start_server().await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        stream.write_all(b"this is not json\n").await.unwrap();
        stream
            .write_all(b"{\"type\":\"create_room\"}\n")
            .await
            .unwrap();

        let line = read_line(&mut stream).await;
        let event: ServerEvent = serde_json::from_str(&line).unwrap();
        assert!(matches!(event, ServerEvent::RoomCreated { .. }));
    }
}

use serde::Serialize;
use tidegate::prelude::*;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Message ids
// ---------------------------------------------------------------------------

/// Body: JSON `PlayerIdentity`. Reply: the same record with `client_id` set
/// to the session id.
const LOGIN: u32 = 1;
/// Unbind the player and close.
const LOGOUT: u32 = 2;
/// Close without touching the binding.
const QUIT: u32 = 3;
/// Reply carrying a UTF-8 error message.
const ERROR: u32 = 0xFFFF;

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

struct EchoDispatcher;

impl Dispatcher for EchoDispatcher {
    async fn dispatch(
        &self,
        session: &mut Session<TcpConnection>,
        frame: Frame,
    ) -> Result<Flow, SessionError> {
        match frame.message_id {
            LOGIN => {
                let mut player: PlayerIdentity =
                    match serde_json::from_slice(&frame.body) {
                        Ok(player) => player,
                        Err(e) => {
                            let msg = format!("invalid login: {e}");
                            session.send(ERROR, msg.as_bytes()).await?;
                            return Ok(Flow::Continue);
                        }
                    };
                player.set_client_id(session.id().0);
                session.bind_identity(player.session_identity());

                let (id, reply) = json_reply(LOGIN, &player);
                session.send(id, &reply).await?;
                Ok(Flow::Continue)
            }
            LOGOUT => Ok(Flow::LogoutAndClose),
            QUIT => Ok(Flow::Close),
            _ => {
                session.send(frame.message_id, &frame.body).await?;
                Ok(Flow::Continue)
            }
        }
    }
}

/// Serializes `value` as the body of a `message_id` reply, falling back to
/// an `ERROR` frame describing the failure.
fn json_reply(message_id: u32, value: &impl Serialize) -> (u32, Vec<u8>) {
    match serde_json::to_vec(value) {
        Ok(body) => (message_id, body),
        Err(e) => {
            tracing::warn!(message_id, error = %e, "failed to encode reply");
            (ERROR, format!("failed to encode reply: {e}").into_bytes())
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    tracing::info!(bind_addr = %config.bind_addr, "starting echo server");

    let server = TidegateServerBuilder::new()
        .config(config)
        .build(EchoDispatcher)
        .await?;

    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn start() -> String {
        let server = TidegateServerBuilder::new()
            .bind("127.0.0.1:0")
            .build(EchoDispatcher)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        addr
    }

    async fn send(ws: &mut TcpStream, id: u32, body: &[u8]) {
        ws.write_all(&encode_frame(id, body).unwrap()).await.unwrap();
    }

    async fn recv(ws: &mut TcpStream) -> (u32, Vec<u8>) {
        let len = ws.read_u32_le().await.unwrap();
        let id = ws.read_u32_le().await.unwrap();
        let mut body = vec![0u8; len as usize - 4];
        ws.read_exact(&mut body).await.unwrap();
        (id, body)
    }

    #[tokio::test]
    async fn test_login_replies_with_client_id_set() {
        let addr = start().await;
        let mut c = TcpStream::connect(&addr).await.unwrap();
        let player = PlayerIdentity::new("p-1", "Ayla", 0, 3, 12, 40, 41);

        send(&mut c, LOGIN, &serde_json::to_vec(&player).unwrap()).await;
        let (id, body) = recv(&mut c).await;

        assert_eq!(id, LOGIN);
        let back: PlayerIdentity = serde_json::from_slice(&body).unwrap();
        assert_eq!(back.id(), "p-1");
        assert!(back.client_id() > 0, "client id should be the session id");
    }

    #[tokio::test]
    async fn test_login_with_bad_json_replies_error_and_stays_open() {
        let addr = start().await;
        let mut c = TcpStream::connect(&addr).await.unwrap();

        send(&mut c, LOGIN, b"not json").await;
        let (id, body) = recv(&mut c).await;
        assert_eq!(id, ERROR);
        assert!(String::from_utf8(body).unwrap().contains("invalid login"));

        send(&mut c, 9, b"echo").await;
        assert_eq!(recv(&mut c).await, (9, b"echo".to_vec()));
    }

    #[tokio::test]
    async fn test_logout_closes_connection() {
        let addr = start().await;
        let mut c = TcpStream::connect(&addr).await.unwrap();

        send(&mut c, LOGOUT, &[]).await;

        let mut buf = [0u8; 8];
        let n = tokio::time::timeout(Duration::from_secs(2), c.read(&mut buf))
            .await
            .expect("server should close")
            .unwrap_or(0);
        assert_eq!(n, 0);
    }

    #[test]
    fn test_json_reply_encodes_value_under_given_id() {
        let (id, body) = json_reply(LOGIN, &vec![1, 2, 3]);

        assert_eq!(id, LOGIN);
        assert_eq!(body, b"[1,2,3]");
    }

    #[test]
    fn test_json_reply_unencodable_value_becomes_error_frame() {
        // JSON object keys must be strings.
        let value = std::collections::HashMap::from([((1, 2), 3)]);

        let (id, body) = json_reply(LOGIN, &value);

        assert_eq!(id, ERROR);
        assert!(
            String::from_utf8(body)
                .unwrap()
                .starts_with("failed to encode reply")
        );
    }

    #[test]
    fn test_bundled_config_parses() {
        let config = ServerConfig::from_json_str(include_str!("../config.json"))
            .expect("bundled config should be valid");
        assert_eq!(config.expiry_secs, 120);
        assert_eq!(config.frame.max_frame_len, Some(65536));
    }
}

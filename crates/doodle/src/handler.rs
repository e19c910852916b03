//! Per-connection handler: join handshake and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `join` → validate version → bind into the room
//!   2. Send `joined`
//!   3. Loop: forward room broadcasts to the socket, and route the
//!      client's guesses, heartbeats and drawing frames to the room

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use doodle_protocol::{
    ClientMessage, Codec, ErrorCode, Player, PlayerId, ProtocolError, ServerMessage,
    PROTOCOL_VERSION,
};
use doodle_room::{RoomError, RoomHandle, RoomOutbound, Telemetry};
use doodle_transport::{Connection, ConnectionId, Frame, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use crate::server::ServerState;
use crate::DoodleError;

/// Drop guard that unbinds the connection from its room when the handler
/// exits, whichever way it exits.
///
/// `Drop` is synchronous, so the async unbind runs on a spawned task. The
/// registry lock is released before the room actor is awaited.
struct ConnectionGuard<T: Telemetry, C: Codec> {
    connection: ConnectionId,
    state: Arc<ServerState<T, C>>,
}

impl<T: Telemetry, C: Codec> Drop for ConnectionGuard<T, C> {
    fn drop(&mut self) {
        let connection = self.connection;
        let rooms = Arc::clone(&self.state.rooms);
        tokio::spawn(async move {
            let room = rooms.lock().await.unbind_connection(connection);
            let Some(room) = room else {
                return;
            };
            if let Err(e) = room.disconnect(connection).await {
                tracing::debug!(%connection, error = %e, "disconnect failed");
            }
        });
    }
}

/// What the client bound to.
struct Joined<T: Telemetry, C: Codec> {
    room: RoomHandle,
    player_id: PlayerId,
    outbound: mpsc::UnboundedReceiver<RoomOutbound>,
    guard: ConnectionGuard<T, C>,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<T, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<T, C>>,
) -> Result<(), DoodleError>
where
    T: Telemetry,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    // --- Step 1: Join ---
    let Joined {
        room,
        player_id,
        mut outbound,
        guard: _guard,
    } = perform_join(&conn, &state).await?;
    tracing::info!(%conn_id, %player_id, room_id = %room.room_id(), "player connected");

    // --- Step 2: Message loop ---
    let idle_timeout = state.config.idle_timeout;
    let idle = time::sleep(idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            msg = outbound.recv() => match msg {
                Some(RoomOutbound::State(view)) => {
                    send_message(&conn, &state.codec, &ServerMessage::State { view }).await?;
                }
                Some(RoomOutbound::Drawing(data)) => {
                    conn.send_binary(&data).await?;
                }
                None => {
                    tracing::info!(%player_id, "room closed the connection");
                    break;
                }
            },

            frame = conn.recv() => {
                let frame = match frame {
                    Ok(Some(frame)) => frame,
                    Ok(None) => {
                        tracing::info!(%player_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "recv error");
                        break;
                    }
                };
                idle.as_mut().reset(Instant::now() + idle_timeout);

                let keep_open = match frame {
                    Frame::Binary(data) => {
                        room.draw(player_id.clone(), data).await.is_ok()
                    }
                    Frame::Text(text) => {
                        handle_text(&conn, &state, &room, &player_id, &text).await?
                    }
                };
                if !keep_open {
                    break;
                }
            }

            _ = &mut idle => {
                tracing::info!(%player_id, "connection idle, closing");
                break;
            }
        }
    }

    let _ = conn.close().await;
    // _guard drops here → room disconnect fires.
    Ok(())
}

/// Receives and validates the `join` frame, then binds into the room.
async fn perform_join<T, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<T, C>>,
) -> Result<Joined<T, C>, DoodleError>
where
    T: Telemetry,
    C: Codec,
{
    let frame = match time::timeout(state.config.handshake_timeout, conn.recv()).await {
        Ok(Ok(Some(frame))) => frame,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage("connection closed before join".into()).into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("join timed out".into()).into());
        }
    };

    let Frame::Text(text) = frame else {
        send_error(conn, &state.codec, ErrorCode::BadRequest, "expected join").await?;
        return Err(ProtocolError::InvalidMessage("first frame was binary".into()).into());
    };

    let (version, room_id, player_id, nick) = match state.codec.decode(&text) {
        Ok(ClientMessage::Join {
            version,
            room_id,
            player_id,
            nick,
        }) => (version, room_id, player_id, nick),
        Ok(_) => {
            send_error(conn, &state.codec, ErrorCode::BadRequest, "expected join").await?;
            return Err(ProtocolError::InvalidMessage("first message must be join".into()).into());
        }
        Err(e) => {
            send_error(conn, &state.codec, ErrorCode::BadRequest, "malformed join").await?;
            return Err(e.into());
        }
    };

    if version != PROTOCOL_VERSION {
        send_error(
            conn,
            &state.codec,
            ErrorCode::BadRequest,
            &format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        )
        .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    let (tx, outbound) = mpsc::unbounded_channel();
    let player = Player::new(player_id.clone(), nick);
    let room = state.rooms.lock().await.room_for_join(&room_id);
    let connected = match room {
        Ok(room) => room.connect(conn.id(), player, tx).await.map(|()| room),
        Err(e) => Err(e),
    };

    let room = match connected {
        Ok(room) => room,
        Err(e) => {
            send_error(conn, &state.codec, e.code(), &e.to_string()).await?;
            return Err(e.into());
        }
    };
    state
        .rooms
        .lock()
        .await
        .bind_connection(conn.id(), room_id, player_id.clone());
    let guard = ConnectionGuard {
        connection: conn.id(),
        state: Arc::clone(state),
    };

    send_message(
        conn,
        &state.codec,
        &ServerMessage::Joined {
            room_id: room.room_id().clone(),
            player_id: player_id.clone(),
        },
    )
    .await?;

    Ok(Joined {
        room,
        player_id,
        outbound,
        guard,
    })
}

/// Handles one text frame after the join. Returns `false` if the
/// connection should close.
async fn handle_text<T, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<T, C>>,
    room: &RoomHandle,
    player_id: &PlayerId,
    text: &str,
) -> Result<bool, DoodleError>
where
    T: Telemetry,
    C: Codec,
{
    let msg: ClientMessage = match state.codec.decode(text) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(%player_id, error = %e, "malformed message, ignoring");
            return Ok(true);
        }
    };

    match msg {
        ClientMessage::Guess { message } => {
            match room.guess(player_id.clone(), message).await {
                Ok(result) => {
                    send_message(conn, &state.codec, &ServerMessage::GuessResult(result)).await?;
                }
                Err(RoomError::Unavailable(_)) => return Ok(false),
                Err(e) => {
                    send_error(conn, &state.codec, e.code(), &e.to_string()).await?;
                }
            }
        }

        ClientMessage::Heartbeat { client_time } => {
            let ack = ServerMessage::HeartbeatAck {
                client_time,
                server_time: unix_millis(),
            };
            send_message(conn, &state.codec, &ack).await?;
        }

        ClientMessage::Leave => {
            tracing::info!(%player_id, "client left");
            return Ok(false);
        }

        ClientMessage::Join { .. } => {
            tracing::debug!(%player_id, "repeated join, ignoring");
        }
    }

    Ok(true)
}

async fn send_message(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    msg: &ServerMessage,
) -> Result<(), DoodleError> {
    let text = codec.encode(msg)?;
    conn.send_text(&text).await?;
    Ok(())
}

/// Sends a `ServerMessage::Error` to the client.
async fn send_error(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    code: ErrorCode,
    message: &str,
) -> Result<(), DoodleError> {
    let msg = ServerMessage::Error {
        code: code.as_u16(),
        message: message.to_string(),
    };
    send_message(conn, codec, &msg).await
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

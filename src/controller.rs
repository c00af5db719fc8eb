// src/controller.rs
//
// Paired controllers. Every text frame is a command for the session; every
// relay broadcast goes out to every connected controller.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::session::SessionInput;
use crate::AppState;

pub async fn controller_socket(ws: WebSocketUpgrade, State(st): State<Arc<AppState>>) -> Response {
    let broadcasts = st.relay.subscribe();
    let inputs = st.inputs.clone();
    ws.on_upgrade(move |socket| handle_controller_socket(socket, broadcasts, inputs))
}

async fn handle_controller_socket(
    socket: WebSocket,
    mut broadcasts: broadcast::Receiver<String>,
    inputs: mpsc::UnboundedSender<SessionInput>,
) {
    let controller = Uuid::new_v4();
    info!(%controller, "controller connected");
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if inputs.send(SessionInput::Controller(text.to_string())).is_err() {
                            error!("session task is gone; closing controller");
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(%controller, "controller socket error: {e}");
                        break;
                    }
                    _ => {}
                }
            }

            message = broadcasts.recv() => {
                match message {
                    Ok(text) => {
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(%controller, "controller lagged by {n} messages");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    info!(%controller, "controller disconnected");
}

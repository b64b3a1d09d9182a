use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use robosched_core::traits::TokenValidator;

use crate::hub::FanoutHub;

/// 首帧认证的宽限时间
const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WsState {
    pub hub: Arc<FanoutHub>,
    pub auth: Arc<dyn TokenValidator>,
}

pub fn router(state: Arc<WsState>) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

/// 客户端控制消息：连接后立即 `authenticate`，主动断开前 `close`
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
enum ControlMessage {
    Authenticate { token: String },
    Close { token: String },
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<WsState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<WsState>) {
    // 未认证的连接收不到任何事件
    let user_id = match wait_for_auth(&mut socket, &state).await {
        Some(user_id) => user_id,
        None => return,
    };

    let (conn_id, mut events) = state.hub.register(user_id);
    info!("用户 {} 的连接 {} 已认证", user_id, conn_id);

    loop {
        tokio::select! {
            outgoing = events.recv() => {
                match outgoing {
                    Some(text) => {
                        if socket.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(ControlMessage::Close { .. }) =
                            serde_json::from_str(text.as_str())
                        {
                            debug!("用户 {} 的连接 {} 主动关闭", user_id, conn_id);
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("连接 {} 传输错误: {}", conn_id, e);
                        break;
                    }
                }
            }
        }
    }

    state.hub.unregister(user_id, conn_id);
}

async fn wait_for_auth(socket: &mut WebSocket, state: &WsState) -> Option<Uuid> {
    let first = tokio::time::timeout(AUTH_TIMEOUT, socket.recv())
        .await
        .ok()??
        .ok()?;
    let Message::Text(text) = first else {
        return None;
    };
    let ControlMessage::Authenticate { token } = serde_json::from_str(text.as_str()).ok()? else {
        return None;
    };

    match state.auth.validate(&token).await {
        Ok(user_id) => Some(user_id),
        Err(e) => {
            warn!("连接认证失败: {}", e);
            None
        }
    }
}

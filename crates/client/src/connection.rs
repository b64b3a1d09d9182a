use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use robosched_core::errors::{EngineError, EngineResult};
use robosched_core::models::WireEvent;

use crate::cache::ClientCache;
use crate::error::{classify, FailureKind};
use crate::resync::DataLoader;

/// 健康检查默认周期
const HEALTH_INTERVAL: Duration = Duration::from_secs(5);

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// 连接生命周期状态
///
/// `Closed` 表示调用方主动断开，健康检查对它不再做任何事；
/// `Disconnected` 是传输层意外断开，会触发带全量重同步的重连。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Authenticated,
    Closed,
}

/// 事件通道的连接管理器
///
/// 负责拨号、首帧认证、把下行事件逐条并入缓存，以及断线后的
/// 自动重连。重连成功后先全量重同步再继续消费事件，掉线期间
/// 丢失的变更由快照覆盖。`connect`/`disconnect` 内部串行化，
/// 不会出现两个并发的重连。
pub struct ConnectionManager {
    url: String,
    token: String,
    cache: Arc<ClientCache>,
    loader: Arc<dyn DataLoader>,
    health_interval: Duration,
    state: watch::Sender<ConnectionState>,
    inner: Mutex<ManagerInner>,
}

#[derive(Default)]
struct ManagerInner {
    socket_task: Option<JoinHandle<()>>,
    health_task: Option<JoinHandle<()>>,
    sink: Option<WsSink>,
}

impl ConnectionManager {
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        cache: Arc<ClientCache>,
        loader: Arc<dyn DataLoader>,
    ) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            cache,
            loader,
            health_interval: HEALTH_INTERVAL,
            state: watch::Sender::new(ConnectionState::Disconnected),
            inner: Mutex::new(ManagerInner::default()),
        }
    }

    pub fn with_health_interval(mut self, interval: Duration) -> Self {
        self.health_interval = interval;
        self
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// 建立（或重建）事件通道
    ///
    /// `is_reconnect` 为真时在认证成功后先做一次全量重同步，
    /// 覆盖掉线期间丢失的事件。失败的拨号把状态退回
    /// `Disconnected`，由健康检查继续重试。
    pub async fn connect(self: &Arc<Self>, is_reconnect: bool) -> EngineResult<()> {
        let mut inner = self.inner.lock().await;
        // 主动关闭是终态，拿到锁后再查一次，关闭后到达的连接请求直接放弃
        if self.state() == ConnectionState::Closed {
            return Ok(());
        }
        self.spawn_health_check(&mut inner);
        self.state.send_replace(ConnectionState::Connecting);

        let (stream, _) = match connect_async(self.url.as_str()).await {
            Ok(pair) => pair,
            Err(e) => {
                self.state.send_replace(ConnectionState::Disconnected);
                return Err(EngineError::connection(e.to_string()));
            }
        };
        let (mut sink, source) = stream.split();

        let auth = json!({"type": "authenticate", "payload": {"token": self.token}});
        if let Err(e) = sink.send(Message::Text(auth.to_string().into())).await {
            self.state.send_replace(ConnectionState::Disconnected);
            return Err(EngineError::connection(e.to_string()));
        }

        // 旧的读循环（若还在）被新连接取代
        if let Some(stale) = inner.socket_task.take() {
            stale.abort();
        }
        inner.sink = Some(sink);
        inner.socket_task = Some(self.spawn_read_loop(source));
        self.state.send_replace(ConnectionState::Authenticated);
        info!("事件通道已建立 (is_reconnect={})", is_reconnect);

        if is_reconnect {
            match self.loader.load_all().await {
                Ok(snapshot) => {
                    self.cache.replace_all(snapshot);
                    debug!("重连后的全量重同步已完成");
                }
                Err(e) => {
                    // 快照没拉回来，镜像仍是陈旧的；退回断开状态，
                    // 下一轮健康检查会连同重同步一起重来
                    self.state.send_replace(ConnectionState::Disconnected);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// 主动断开，之后不再自动重连
    pub async fn disconnect(&self) {
        // 先置 Closed，健康检查据此停手
        self.state.send_replace(ConnectionState::Closed);
        let mut inner = self.inner.lock().await;
        // 等锁期间可能有一个在途的 connect 改写过状态，重申关闭
        self.state.send_replace(ConnectionState::Closed);
        if let Some(health) = inner.health_task.take() {
            health.abort();
        }
        if let Some(mut sink) = inner.sink.take() {
            let close = json!({"type": "close", "payload": {"token": self.token}});
            let _ = sink.send(Message::Text(close.to_string().into())).await;
            let _ = sink.send(Message::Close(None)).await;
        }
        if let Some(task) = inner.socket_task.take() {
            task.abort();
        }
        info!("事件通道已主动关闭");
    }

    fn spawn_read_loop(self: &Arc<Self>, mut source: WsSource) -> JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<WireEvent>(text.as_str()) {
                            Ok(event) => cache.apply(&event),
                            Err(e) => warn!("下行事件解析失败: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!("事件通道传输错误: {}", e);
                        break;
                    }
                }
            }
            // 主动关闭时状态已是 Closed，不要把它改回去
            state.send_if_modified(|s| {
                if *s == ConnectionState::Authenticated {
                    *s = ConnectionState::Disconnected;
                    true
                } else {
                    false
                }
            });
        })
    }

    fn spawn_health_check(self: &Arc<Self>, inner: &mut ManagerInner) {
        if inner.health_task.is_some() {
            return;
        }
        let manager = Arc::clone(self);
        inner.health_task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(manager.health_interval).await;
                match manager.state() {
                    ConnectionState::Closed => break,
                    ConnectionState::Disconnected => {
                        debug!("健康检查发现连接断开，尝试重连");
                        if let Err(e) = manager.connect(true).await {
                            if classify(&e) == FailureKind::SessionExpired {
                                warn!("会话已失效，停止重连: {}", e);
                                manager.state.send_replace(ConnectionState::Closed);
                                break;
                            }
                            warn!("重连失败，等待下一轮: {}", e);
                        }
                    }
                    _ => {}
                }
            }
        }));
    }
}

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use robosched_core::config::AppConfig;
use robosched_engine::{CycleEngine, EmailNotifier, ExecutionInvoker, OutcomeHandler};
use robosched_fanout::{router, FanoutHub, WsState};
use robosched_infrastructure::{
    connect_pool, HttpCodeRunner, HttpTokenValidator, PostgresNotificationRepository,
    PostgresResultRepository, PostgresTaskRepository, PostgresUserRepository, SparkpostMailer,
};

/// 应用运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// 仅运行调度引擎
    Engine,
    /// 仅运行广播服务
    Fanout,
    /// 运行所有组件
    All,
}

impl AppMode {
    pub fn parse(mode: &str) -> Result<Self> {
        match mode {
            "engine" => Ok(AppMode::Engine),
            "fanout" => Ok(AppMode::Fanout),
            "all" => Ok(AppMode::All),
            other => Err(anyhow::anyhow!("不支持的运行模式: {other}")),
        }
    }
}

/// 主应用程序
pub struct Application {
    config: AppConfig,
    mode: AppMode,
    engine: Arc<CycleEngine>,
    ws_state: Arc<WsState>,
}

impl Application {
    /// 组装数据库连接池、仓储、能力实现与调度引擎
    pub async fn new(config: AppConfig, mode: AppMode) -> Result<Self> {
        info!("初始化应用程序，模式: {:?}", mode);

        let pool = connect_pool(&config.database)
            .await
            .context("创建数据库连接池失败")?;

        let task_repo = Arc::new(PostgresTaskRepository::new(pool.clone()));
        let result_repo = Arc::new(PostgresResultRepository::new(pool.clone()));
        let notification_repo = Arc::new(PostgresNotificationRepository::new(pool.clone()));
        let user_repo = Arc::new(PostgresUserRepository::new(pool));

        let hub = Arc::new(FanoutHub::new());
        let mailer = Arc::new(SparkpostMailer::new(&config.mailer));
        let runner = Arc::new(HttpCodeRunner::new(&config.runner));
        let auth = Arc::new(HttpTokenValidator::new(&config.auth));

        let invoker = Arc::new(ExecutionInvoker::new(
            runner,
            Duration::from_secs(config.engine.run_timeout_seconds),
        ));
        let outcomes = Arc::new(OutcomeHandler::new(
            task_repo.clone(),
            result_repo.clone(),
            notification_repo,
            user_repo,
            EmailNotifier::new(mailer),
            hub.clone(),
        ));
        let engine = Arc::new(CycleEngine::new(
            task_repo,
            result_repo,
            invoker,
            outcomes,
            config.engine.max_concurrent_runs,
        ));

        let ws_state = Arc::new(WsState { hub, auth });

        Ok(Self {
            config,
            mode,
            engine,
            ws_state,
        })
    }

    /// 运行应用程序直到收到关闭信号
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动应用程序，模式: {:?}", self.mode);
        match self.mode {
            AppMode::Engine => self.run_engine(shutdown_rx).await,
            AppMode::Fanout => self.run_fanout(shutdown_rx).await,
            AppMode::All => {
                let fanout_rx = shutdown_rx.resubscribe();
                let (engine_result, fanout_result) =
                    tokio::join!(self.run_engine(shutdown_rx), self.run_fanout(fanout_rx));
                engine_result.and(fanout_result)
            }
        }
    }

    /// 调度引擎主循环
    ///
    /// 定时器按固定间隔触发，但周期串行执行：上一周期没结束时
    /// 不会有第二个周期在途，错过的触发合并为一次。
    async fn run_engine(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(self.config.engine.cycle_interval_seconds));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "调度引擎已启动，周期间隔 {} 秒",
            self.config.engine.cycle_interval_seconds
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.engine.run_cycle().await {
                        Ok(summary) => {
                            if summary.due > 0 {
                                info!(
                                    "调度周期完成: 到期 {} / 成功 {} / 失败 {}",
                                    summary.due, summary.succeeded, summary.failed
                                );
                            }
                        }
                        Err(e) => error!("调度周期失败: {e}"),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("调度引擎收到关闭信号");
                    return Ok(());
                }
            }
        }
    }

    /// 广播服务的 HTTP/WebSocket 端
    async fn run_fanout(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .fanout
            .bind_address
            .parse()
            .with_context(|| format!("广播服务地址无效: {}", self.config.fanout.bind_address))?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("广播服务绑定失败: {addr}"))?;
        info!("广播服务监听于 {addr}");

        let app = router(Arc::clone(&self.ws_state));
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("广播服务收到关闭信号");
            })
            .await
            .context("广播服务运行失败")?;
        Ok(())
    }
}

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use robosched_core::models::Task;
use robosched_core::traits::{ResultRepository, TaskRepository};
use robosched_core::EngineResult;

use crate::invoker::ExecutionInvoker;
use crate::outcome::OutcomeHandler;

/// 调度周期的统计结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub due: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// 调度/分发器
///
/// 引擎自身不持有任务行之外的持久状态；每个周期重新查询
/// `active = true AND next_run <= now` 的任务（按 `next_run` 升序），
/// 为每个任务派发一个独立的执行单元。单个任务的失败、缓慢或
/// 崩溃不会影响同周期内的其他任务。周期在所有执行单元结束后
/// 才算完成；周期本身的触发（定时器）由外部负责。
pub struct CycleEngine {
    task_repo: Arc<dyn TaskRepository>,
    result_repo: Arc<dyn ResultRepository>,
    invoker: Arc<ExecutionInvoker>,
    outcomes: Arc<OutcomeHandler>,
    limiter: Option<Arc<Semaphore>>,
}

impl CycleEngine {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        result_repo: Arc<dyn ResultRepository>,
        invoker: Arc<ExecutionInvoker>,
        outcomes: Arc<OutcomeHandler>,
        max_concurrent_runs: Option<usize>,
    ) -> Self {
        Self {
            task_repo,
            result_repo,
            invoker,
            outcomes,
            limiter: max_concurrent_runs.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    /// 执行一个调度周期，所有派发的执行都结束后返回
    pub async fn run_cycle(&self) -> EngineResult<CycleSummary> {
        let now = Utc::now();
        let due_tasks = self.task_repo.find_due(now).await?;
        let due = due_tasks.len();
        info!("开始调度周期，共 {} 个到期任务", due);

        let mut join_set = JoinSet::new();
        for task in due_tasks {
            let result_repo = self.result_repo.clone();
            let invoker = self.invoker.clone();
            let outcomes = self.outcomes.clone();
            let limiter = self.limiter.clone();

            join_set.spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                process_task(task, result_repo, invoker, outcomes).await
            });
        }

        let mut succeeded = 0;
        let mut failed = 0;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(true) => succeeded += 1,
                Ok(false) => failed += 1,
                Err(e) => {
                    error!("执行单元异常终止: {}", e);
                    failed += 1;
                }
            }
        }

        info!(
            "调度周期完成: {} 个到期, {} 个成功, {} 个失败",
            due, succeeded, failed
        );
        Ok(CycleSummary {
            due,
            succeeded,
            failed,
        })
    }
}

/// 处理单个任务：读上次结果 → 调用执行 → 消费结果。
/// 所有错误都收敛在本任务内，返回值仅用于周期统计。
async fn process_task(
    task: Task,
    result_repo: Arc<dyn ResultRepository>,
    invoker: Arc<ExecutionInvoker>,
    outcomes: Arc<OutcomeHandler>,
) -> bool {
    let prev_result = match result_repo.latest_success(task.id).await {
        Ok(Some(result)) => result.parse_value(),
        Ok(None) => None,
        Err(e) => {
            // 找不到上次结果不致命，按首次执行处理
            warn!("读取任务 {} 的上次结果失败: {}", task.name, e);
            None
        }
    };

    let outcome = invoker.invoke(&task, prev_result.as_ref()).await;
    let is_failure = outcome.is_failure();

    match outcomes.handle(&task, outcome, Utc::now()).await {
        Ok(()) => !is_failure,
        Err(e) => {
            // 存储错误：该任务本周期的剩余写入中止，下周期自然重试
            error!("任务 {} 的结果处理失败: {}", task.name, e);
            false
        }
    }
}

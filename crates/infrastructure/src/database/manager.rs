use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use robosched_core::config::DatabaseConfig;
use robosched_core::EngineResult;

/// 按配置建立 PostgreSQL 连接池
pub async fn connect_pool(config: &DatabaseConfig) -> EngineResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;
    info!("数据库连接池已建立 (max_connections={})", config.max_connections);
    Ok(pool)
}

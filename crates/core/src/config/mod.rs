//! 配置模型
//!
//! TOML 文件叠加 `ROBOSCHED_` 前缀的环境变量，加载后统一校验。

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{EngineError, EngineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub engine: EngineConfig,
    pub fanout: FanoutConfig,
    pub runner: RunnerConfig,
    pub mailer: MailerConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 调度周期触发间隔（秒）。周期本身串行执行，
    /// 上一周期未结束时不会触发下一周期。
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_seconds: u64,
    /// 单周期内同时在途的执行数上限；缺省为不限
    #[serde(default)]
    pub max_concurrent_runs: Option<usize>,
    /// 单次代码执行的超时（秒）
    #[serde(default = "default_run_timeout")]
    pub run_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// 代码执行服务的调用端点
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub api_base: String,
    pub api_key: String,
    #[serde(default = "default_sender")]
    pub sender: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// 会话令牌校验端点（认证服务为外部协作者）
    pub verify_url: String,
}

fn default_max_connections() -> u32 {
    10
}
fn default_cycle_interval() -> u64 {
    60
}
fn default_run_timeout() -> u64 {
    300
}
fn default_bind_address() -> String {
    "0.0.0.0:8081".to_string()
}
fn default_sender() -> String {
    "no-reply@robosched.local".to_string()
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> EngineResult<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(EngineError::config_error(format!("配置文件不存在: {path}")));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else {
            for path in ["config/robosched.toml", "robosched.toml"] {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    break;
                }
            }
        }

        let config = builder
            .add_source(Environment::with_prefix("ROBOSCHED").separator("__"))
            .build()
            .map_err(|e| EngineError::config_error(e.to_string()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| EngineError::config_error(e.to_string()))?;

        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.database.url.is_empty() {
            return Err(EngineError::config_error("database.url 不能为空"));
        }
        if self.engine.cycle_interval_seconds == 0 {
            return Err(EngineError::config_error(
                "engine.cycle_interval_seconds 必须大于0",
            ));
        }
        if self.engine.run_timeout_seconds == 0 {
            return Err(EngineError::config_error(
                "engine.run_timeout_seconds 必须大于0",
            ));
        }
        if let Some(limit) = self.engine.max_concurrent_runs {
            if limit == 0 {
                return Err(EngineError::config_error(
                    "engine.max_concurrent_runs 不能为0，留空表示不限",
                ));
            }
        }
        if self.runner.endpoint.is_empty() {
            return Err(EngineError::config_error("runner.endpoint 不能为空"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_config() -> AppConfig {
        AppConfig {
            database: DatabaseConfig {
                url: "postgresql://localhost/robosched".to_string(),
                max_connections: 10,
            },
            engine: EngineConfig {
                cycle_interval_seconds: 60,
                max_concurrent_runs: None,
                run_timeout_seconds: 300,
            },
            fanout: FanoutConfig {
                bind_address: default_bind_address(),
            },
            runner: RunnerConfig {
                endpoint: "http://localhost:9000/execute".to_string(),
            },
            mailer: MailerConfig {
                api_base: "https://api.sparkpost.com/api/v1".to_string(),
                api_key: "key".to_string(),
                sender: default_sender(),
            },
            auth: AuthConfig {
                verify_url: "http://localhost:3000/api/session/verify".to_string(),
            },
        }
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let mut config = base_config();
        config.engine.max_concurrent_runs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = base_config();
        config.engine.cycle_interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[database]
url = "postgresql://localhost/robosched"

[engine]
cycle_interval_seconds = 30
max_concurrent_runs = 8

[fanout]
bind_address = "127.0.0.1:8081"

[runner]
endpoint = "http://localhost:9000/execute"

[mailer]
api_base = "https://api.sparkpost.com/api/v1"
api_key = "test-key"

[auth]
verify_url = "http://localhost:3000/api/session/verify"
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.engine.cycle_interval_seconds, 30);
        assert_eq!(config.engine.max_concurrent_runs, Some(8));
        assert_eq!(config.engine.run_timeout_seconds, 300);
    }
}

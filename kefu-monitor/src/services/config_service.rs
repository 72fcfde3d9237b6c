use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::models::{ConfigError, MonitorConfig};

pub const ENV_API_URL: &str = "KEFU_MONITOR_API_URL";
pub const ENV_FLUSH_INTERVAL_MS: &str = "KEFU_MONITOR_FLUSH_INTERVAL_MS";
pub const ENV_ERROR_THRESHOLD: &str = "KEFU_MONITOR_ERROR_THRESHOLD";
pub const ENV_LOG_THRESHOLD: &str = "KEFU_MONITOR_LOG_THRESHOLD";
pub const ENV_COMPONENT: &str = "KEFU_MONITOR_COMPONENT";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "KEFU_MONITOR_REQUEST_TIMEOUT_MS";
pub const ENV_LOG_DIR: &str = "KEFU_MONITOR_LOG_DIR";

/// 配置服务
///
/// 职责单一: 从 .env 文件与进程环境变量构建 `MonitorConfig`。
/// 未设置的配置项使用默认值,设置了但取值无效的配置项直接报错。
pub struct ConfigService;

impl ConfigService {
    /// 从当前目录的 .env (如存在) 和进程环境加载配置
    ///
    /// 进程环境变量优先于 .env 文件中的同名项。
    pub fn load() -> Result<MonitorConfig, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::info!(path = %path.display(), "已加载 .env 文件"),
            Err(e) if e.not_found() => {
                tracing::debug!("未找到 .env 文件,仅使用进程环境变量")
            }
            Err(e) => tracing::warn!(error = %e, "无法解析 .env 文件,仅使用进程环境变量"),
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 仅从指定的 .env 文件加载,不读取进程环境
    pub fn load_from_file(path: &Path) -> Result<MonitorConfig, ConfigError> {
        let vars = dotenvy::from_path_iter(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?
            .collect::<Result<HashMap<String, String>, _>>()
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// 通过键查找函数构建配置
    pub fn from_lookup<F>(lookup: F) -> Result<MonitorConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(ENV_API_URL) {
            Some(url) if !url.trim().is_empty() => MonitorConfig::new(url.trim()),
            _ => MonitorConfig::default(),
        };

        if let Some(ms) = parse_positive(&lookup, ENV_FLUSH_INTERVAL_MS)? {
            config = config.with_flush_interval(Duration::from_millis(ms));
        }

        let error_threshold = parse_positive(&lookup, ENV_ERROR_THRESHOLD)?
            .map(|v| v as usize)
            .unwrap_or(config.error_flush_threshold);
        let log_threshold = parse_positive(&lookup, ENV_LOG_THRESHOLD)?
            .map(|v| v as usize)
            .unwrap_or(config.log_flush_threshold);
        config = config.with_thresholds(error_threshold, log_threshold);

        if let Some(component) = lookup(ENV_COMPONENT).filter(|c| !c.trim().is_empty()) {
            config = config.with_component(component.trim());
        }

        if let Some(ms) = parse_positive(&lookup, ENV_REQUEST_TIMEOUT_MS)? {
            config = config.with_request_timeout(Duration::from_millis(ms));
        }

        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|d| !d.trim().is_empty()) {
            config = config.with_log_dir(dir.trim());
        }

        tracing::info!(config = %config.summary_for_logging(), "已加载监控配置");

        Ok(config)
    }
}

/// 解析正整数配置项,未设置时返回 `None`
fn parse_positive<F>(lookup: &F, key: &str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

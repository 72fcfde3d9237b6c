//! 前端日志模型
//!
//! 定义上报到 `/api/logs/batch` 的日志结构。
//! `details` 是开放的键值对象,内容随日志来源而定。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error_event::iso_timestamp;

/// 日志级别枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    /// 接受大小写不敏感的级别名, `WARN` 视同 `WARNING`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!("未知日志级别: {}", other)),
        }
    }
}

/// 前端日志数据结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub id: String,
    /// ISO-8601 时间戳
    pub timestamp: String,
    pub level: LogLevel,
    /// 来源标签,如 "api_call" / "performance" / "user_behavior"
    pub component: String,
    pub message: String,
    /// 上下文信息,缺省为空对象
    pub details: Value,
}

impl LogEvent {
    pub fn new(
        id: String,
        level: LogLevel,
        component: &str,
        message: &str,
        details: Option<Value>,
    ) -> Self {
        Self::at(Utc::now(), id, level, component, message, details)
    }

    /// 指定时间戳创建日志
    pub fn at(
        timestamp: DateTime<Utc>,
        id: String,
        level: LogLevel,
        component: &str,
        message: &str,
        details: Option<Value>,
    ) -> Self {
        Self {
            id,
            timestamp: iso_timestamp(timestamp),
            level,
            component: component.to_string(),
            message: message.to_string(),
            details: details.unwrap_or_else(|| Value::Object(Map::new())),
        }
    }
}

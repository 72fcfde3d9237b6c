//! 数据模型模块
//!
//! 包含所有核心数据结构:
//! - error_event: 错误事件 (采集载荷与入队后的不可变事件)
//! - log_event: 日志事件与日志级别
//! - environment_signal: 运行环境推送的原始信号
//! - monitor_config: 上报配置与时间常量
//! - errors: 错误类型定义 (上报、REST调用、配置)

pub mod environment_signal;
pub mod error_event;
pub mod errors;
pub mod log_event;
pub mod monitor_config;

// 重导出常用类型,简化外部引用
pub use environment_signal::{EnvironmentSignal, PageTiming};
pub use error_event::{ErrorEvent, ErrorReport, ErrorType, ERROR_LEVEL};
pub use errors::{ApiError, ConfigError, UploadError};
pub use log_event::{LogEvent, LogLevel};
pub use monitor_config::MonitorConfig;

//! 微信客服管理后台 - 前端监控库
//!
//! 负责收集前端产生的错误与日志,缓存在两个独立队列中,
//! 按定时器、队列阈值或网络恢复批量上报到后端采集接口。
//!
//! - `models`: 事件、配置与错误类型
//! - `services`: 监控器、上报通道、信号监听与各类采集器
//! - `utils`: 日志初始化与ID生成

pub mod models;
pub mod services;
pub mod utils;

pub use models::{
    EnvironmentSignal, ErrorEvent, ErrorReport, ErrorType, LogEvent, LogLevel, MonitorConfig,
};
pub use services::{
    signal_channel, ApiClient, CredentialStore, ErrorBoundary, ErrorMonitor,
    HttpUploadTransport, MemoryCredentialStore, MonitorHandle, PerformanceMonitor,
    SignalEmitter, SignalListener, UploadTransport, UserBehaviorTracker,
};

//! 服务层模块
//!
//! - `error_monitor`: 错误/日志队列与批量上报 (核心)
//! - `upload_transport`: 上报通道抽象与HTTP实现
//! - `credential_store`: 会话令牌存储
//! - `signal_source` / `signal_listener`: 运行环境信号与全局错误捕获
//! - `api_client`: 带调用日志的后台REST客户端
//! - `performance_monitor` / `behavior_tracker`: 性能与用户行为采集
//! - `error_boundary`: 渲染错误边界
//! - `config_service`: 配置加载
//!
//! # 服务架构
//!
//! ```text
//!  SignalEmitter ──► SignalListener ─┐
//!  ApiClient ────────────────────────┤
//!  PerformanceMonitor ───────────────┼──► ErrorMonitor ──► UploadTransport ──► /api/*/batch
//!  UserBehaviorTracker ──────────────┤        │
//!  ErrorBoundary ────────────────────┘        └── CredentialStore (只读)
//! ```

pub mod api_client;
mod batch_queue;
pub mod behavior_tracker;
pub mod config_service;
pub mod credential_store;
pub mod error_boundary;
pub mod error_monitor;
pub mod performance_monitor;
pub mod signal_listener;
pub mod signal_source;
pub mod upload_transport;

// 重导出常用类型,简化外部引用
pub use api_client::{ApiClient, LoginResponse};
pub use behavior_tracker::{ClickTarget, FormTarget, UserBehaviorTracker};
pub use config_service::ConfigService;
pub use credential_store::{CredentialStore, MemoryCredentialStore};
pub use error_boundary::{BoundaryNotice, ErrorBoundary};
pub use error_monitor::{ErrorMonitor, FlushOutcome, FlushSummary, MonitorHandle, QueueStatus};
pub use performance_monitor::PerformanceMonitor;
pub use signal_listener::SignalListener;
pub use signal_source::{signal_channel, SignalEmitter, SignalReceiver};
pub use upload_transport::{HttpUploadTransport, UploadTransport};

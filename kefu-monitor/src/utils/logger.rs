use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::models::MonitorConfig;

/// 日志文件名前缀,文件命名格式: kefu-monitor.2025-10-27.log
const LOG_FILE_PREFIX: &str = "kefu-monitor";

/// 初始化本地诊断日志
///
/// 上报失败、重新入队等内部事件只写入这里,不会回流到上报队列:
/// - JSON格式: 便于机器解析
/// - 按天轮转: 每天一个新文件
/// - 双输出: 标准错误(开发) + 文件(生产)
/// - 环境变量控制: RUST_LOG=debug 可调整日志级别
///
/// # 日志位置
/// `config.log_dir`,未配置时为 `<系统数据目录>/kefu-monitor/logs`,
/// 无法获取系统目录时回退到 `./logs`。
///
/// # 重要提示
/// 返回的guard必须被调用者保存,直到程序退出。
/// 如果guard被drop,文件写入器将被关闭。
pub fn init(config: &MonitorConfig) -> Result<WorkerGuard, io::Error> {
    init_with_dir(&resolve_log_dir(config))
}

/// 在指定目录初始化日志系统
pub fn init_with_dir(log_dir: &Path) -> Result<WorkerGuard, io::Error> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    // 避免日志I/O阻塞上报流程
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // 默认: INFO级别, 可通过 RUST_LOG=debug 覆盖
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false);

    // 标准输出留给二进制程序本身,控制台日志走stderr
    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))?;

    Ok(guard)
}

/// 计算日志目录
pub fn resolve_log_dir(config: &MonitorConfig) -> PathBuf {
    if let Some(dir) = &config.log_dir {
        return dir.clone();
    }
    dirs::data_local_dir()
        .map(|p| p.join("kefu-monitor").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// 日志宏辅助模块
///
/// 提供结构化日志的便捷宏
pub mod macros {
    /// 记录业务事件
    ///
    /// 使用示例:
    /// ```no_run
    /// use kefu_monitor::log_event;
    /// log_event!("BatchDelivered", queue = "errors", count = 10);
    /// ```
    #[macro_export]
    macro_rules! log_event {
        ($event_type:expr, $($field:tt = $value:expr),* $(,)?) => {
            tracing::info!(
                event_type = $event_type,
                $($field = $value),*
            );
        };
    }

    /// 记录错误事件
    ///
    /// 使用示例:
    /// ```no_run
    /// use kefu_monitor::log_error;
    /// log_error!("UploadFailed", queue = "logs", error = "connection reset");
    /// ```
    #[macro_export]
    macro_rules! log_error {
        ($event_type:expr, $($field:tt = $value:expr),* $(,)?) => {
            tracing::error!(
                event_type = $event_type,
                $($field = $value),*
            );
        };
    }
}

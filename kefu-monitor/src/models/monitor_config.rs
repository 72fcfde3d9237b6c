use std::path::PathBuf;
use std::time::Duration;

/// 定时上报周期
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(30_000);
/// 错误队列立即上报阈值
pub const DEFAULT_ERROR_FLUSH_THRESHOLD: usize = 10;
/// 日志队列立即上报阈值
pub const DEFAULT_LOG_FLUSH_THRESHOLD: usize = 50;
/// 长任务判定阈值 (毫秒,严格大于才记录)
pub const DEFAULT_LONG_TASK_THRESHOLD_MS: f64 = 50.0;
/// 后台默认地址
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8002";
/// 错误事件的来源标识
pub const DEFAULT_COMPONENT: &str = "frontend";

pub const ERRORS_BATCH_PATH: &str = "/api/errors/batch";
pub const LOGS_BATCH_PATH: &str = "/api/logs/batch";

/// 监控器配置
///
/// 默认值与后台采集接口的约定一致,一般只需修改 `api_base_url`。
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// 后台地址,不含尾部斜杠
    pub api_base_url: String,

    /// 错误事件的 `component` 字段
    pub component: String,

    /// 上报端标识,填入事件的 `userAgent`
    pub user_agent: String,

    /// 定时上报周期
    pub flush_interval: Duration,

    /// 错误队列长度达到该值时立即上报
    pub error_flush_threshold: usize,

    /// 日志队列长度达到该值时立即上报
    pub log_flush_threshold: usize,

    /// 超过该时长的任务记为长任务
    pub long_task_threshold_ms: f64,

    /// 上报请求超时,`None` 表示使用传输层默认行为
    pub request_timeout: Option<Duration>,

    /// 本地诊断日志目录,`None` 时使用系统数据目录
    pub log_dir: Option<PathBuf>,
}

impl MonitorConfig {
    /// 创建指向指定后台的配置,其余取默认值
    ///
    /// # 示例
    /// ```
    /// use kefu_monitor::models::MonitorConfig;
    ///
    /// let config = MonitorConfig::new("http://127.0.0.1:8002/");
    /// assert_eq!(config.errors_batch_url(), "http://127.0.0.1:8002/api/errors/batch");
    /// ```
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: normalize_base_url(api_base_url.into()),
            component: DEFAULT_COMPONENT.to_string(),
            user_agent: format!("kefu-monitor/{}", env!("CARGO_PKG_VERSION")),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            error_flush_threshold: DEFAULT_ERROR_FLUSH_THRESHOLD,
            log_flush_threshold: DEFAULT_LOG_FLUSH_THRESHOLD,
            long_task_threshold_ms: DEFAULT_LONG_TASK_THRESHOLD_MS,
            request_timeout: None,
            log_dir: None,
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// 设置两个队列的立即上报阈值
    pub fn with_thresholds(mut self, errors: usize, logs: usize) -> Self {
        self.error_flush_threshold = errors;
        self.log_flush_threshold = logs;
        self
    }

    pub fn with_long_task_threshold_ms(mut self, threshold_ms: f64) -> Self {
        self.long_task_threshold_ms = threshold_ms;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// 拼接后台路径
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    pub fn errors_batch_url(&self) -> String {
        self.endpoint(ERRORS_BATCH_PATH)
    }

    pub fn logs_batch_url(&self) -> String {
        self.endpoint(LOGS_BATCH_PATH)
    }

    /// 获取配置摘要 (用于日志)
    pub fn summary_for_logging(&self) -> String {
        format!(
            "{} interval={}ms thresholds={}/{} component={}",
            self.api_base_url,
            self.flush_interval.as_millis(),
            self.error_flush_threshold,
            self.log_flush_threshold,
            self.component
        )
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

impl Default for MonitorConfig {
    /// 默认配置: localhost:8002, 30秒周期, 阈值 10/50
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

//! 错误监控与批量上报
//!
//! 职责: 持有错误队列与日志队列,在以下时机批量上报:
//! - 定时器: 每 `flush_interval` (默认30秒) 一次
//! - 阈值: 错误队列达到10条 / 日志队列达到50条
//! - 网络恢复: 收到在线信号时立即上报
//!
//! 策略: 遥测永远不阻塞、不影响业务调用方
//! - `report_*` 同步返回,上报在后台任务中进行
//! - 上报失败只记录到本地诊断日志,批次放回队首等待下次上报
//! - 离线期间不上报,队列无限累积
//!
//! 投递语义为"至少一次": 上报成功但响应丢失时,下次会重复投递。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::batch_queue::{Batch, BatchQueue};
use super::credential_store::CredentialStore;
use super::upload_transport::UploadTransport;
use crate::models::monitor_config::DEFAULT_FLUSH_INTERVAL;
use crate::models::{
    ErrorEvent, ErrorReport, LogEvent, LogLevel, MonitorConfig, UploadError,
};
use crate::utils::id::generate_id;

/// 事件ID前缀
const EVENT_ID_PREFIX: &str = "frontend";

/// 队列状态快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub errors: usize,
    pub logs: usize,
    pub is_online: bool,
}

/// 单个队列的一次上报结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// 离线或队列为空,未发起请求
    Skipped,
    /// 整批上报成功并已丢弃
    Delivered(usize),
    /// 上报失败,整批已放回队首
    Requeued(usize),
}

/// 两个队列的上报结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushSummary {
    pub errors: FlushOutcome,
    pub logs: FlushOutcome,
}

/// 当前页面上下文,随导航信号更新
#[derive(Debug, Default)]
struct ClientContext {
    url: Option<String>,
}

struct MonitorInner {
    config: MonitorConfig,
    transport: Arc<dyn UploadTransport>,
    credentials: Arc<dyn CredentialStore>,
    error_queue: BatchQueue<ErrorEvent>,
    log_queue: BatchQueue<LogEvent>,
    is_online: AtomicBool,
    context: RwLock<ClientContext>,
    shutdown: CancellationToken,
}

/// 错误监控器
///
/// 进程内显式创建一个实例,克隆后注入到各个采集器。
/// 克隆共享同一组队列。
#[derive(Clone)]
pub struct ErrorMonitor {
    inner: Arc<MonitorInner>,
}

impl ErrorMonitor {
    /// 创建监控器
    ///
    /// 初始状态为在线。创建后需调用 `start()` 启动定时上报。
    pub fn new(
        config: MonitorConfig,
        transport: Arc<dyn UploadTransport>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        tracing::info!(config = %config.summary_for_logging(), "Error monitor initialized");

        Self {
            inner: Arc::new(MonitorInner {
                error_queue: BatchQueue::new(config.error_flush_threshold),
                log_queue: BatchQueue::new(config.log_flush_threshold),
                config,
                transport,
                credentials,
                is_online: AtomicBool::new(true),
                context: RwLock::new(ClientContext::default()),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// 上报错误
    ///
    /// 补齐 `id` / `level="ERROR"` / `component` 后入队。
    /// 队列达到阈值且在线时,同步取走当前整批并在后台上传,
    /// 之后新报告的错误进入新的批次。
    pub fn report_error(&self, report: ErrorReport) {
        let event = ErrorEvent::from_report(
            generate_id(EVENT_ID_PREFIX),
            &self.inner.config.component,
            report,
        );

        tracing::warn!(
            id = %event.id,
            error_type = %event.error_type,
            message = %event.message,
            "错误已记录"
        );

        if let Some(batch) = self.inner.error_queue.push(event, self.is_online()) {
            self.spawn_error_upload(batch);
        }
    }

    /// 上报日志
    ///
    /// `details` 缺省时为空对象。日志队列达到阈值时立即上报。
    pub fn report_log(
        &self,
        level: LogLevel,
        component: &str,
        message: &str,
        details: Option<Value>,
    ) {
        let log = LogEvent::new(
            generate_id(EVENT_ID_PREFIX),
            level,
            component,
            message,
            details,
        );

        tracing::debug!(log_level = %level, component = %component, "日志已记录: {}", message);

        if let Some(batch) = self.inner.log_queue.push(log, self.is_online()) {
            self.spawn_log_upload(batch);
        }
    }

    /// 刷新所有队列
    ///
    /// 离线时不做任何事;在线时并发上报两个队列,互不阻塞。
    pub async fn flush_queues(&self) -> FlushSummary {
        if !self.is_online() {
            tracing::debug!("离线状态,跳过上报");
            return FlushSummary {
                errors: FlushOutcome::Skipped,
                logs: FlushOutcome::Skipped,
            };
        }

        let (errors, logs) =
            futures::future::join(self.flush_error_queue(), self.flush_log_queue()).await;

        FlushSummary { errors, logs }
    }

    /// 上报错误队列
    pub async fn flush_error_queue(&self) -> FlushOutcome {
        if !self.is_online() {
            return FlushOutcome::Skipped;
        }
        match self.inner.error_queue.take_all() {
            Some(batch) => self.upload_errors(batch).await,
            None => FlushOutcome::Skipped,
        }
    }

    /// 上报日志队列
    pub async fn flush_log_queue(&self) -> FlushOutcome {
        if !self.is_online() {
            return FlushOutcome::Skipped;
        }
        match self.inner.log_queue.take_all() {
            Some(batch) => self.upload_logs(batch).await,
            None => FlushOutcome::Skipped,
        }
    }

    /// 网络状态变化
    ///
    /// 离线: 暂停上报,队列继续接收事件。
    /// 在线: 立即在后台刷新所有队列。
    pub fn set_online(&self, online: bool) {
        let was_online = self.inner.is_online.swap(online, Ordering::SeqCst);

        if online {
            tracing::info!(was_online, "网络在线,立即上报队列");
            self.spawn_flush_queues();
        } else if was_online {
            tracing::warn!(
                pending_errors = self.inner.error_queue.len(),
                pending_logs = self.inner.log_queue.len(),
                "网络已断开,暂停上报"
            );
        }
    }

    pub fn is_online(&self) -> bool {
        self.inner.is_online.load(Ordering::SeqCst)
    }

    /// 获取队列状态
    pub fn queue_status(&self) -> QueueStatus {
        QueueStatus {
            errors: self.inner.error_queue.len(),
            logs: self.inner.log_queue.len(),
            is_online: self.is_online(),
        }
    }

    /// 待上报错误的拷贝,按入队顺序
    pub fn pending_errors(&self) -> Vec<ErrorEvent> {
        self.inner.error_queue.snapshot()
    }

    /// 待上报日志的拷贝,按入队顺序
    pub fn pending_logs(&self) -> Vec<LogEvent> {
        self.inner.log_queue.snapshot()
    }

    /// 当前页面地址
    pub fn current_url(&self) -> Option<String> {
        self.inner
            .context
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .url
            .clone()
    }

    pub fn set_current_url(&self, url: impl Into<String>) {
        self.inner
            .context
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .url = Some(url.into());
    }

    /// 上报端标识
    pub fn user_agent(&self) -> &str {
        &self.inner.config.user_agent
    }

    /// 启动定时上报
    ///
    /// 必须在tokio运行时内调用。首次上报发生在一个周期之后,
    /// 每次tick在独立任务中刷新,慢请求不会推迟下一次tick。
    pub fn start(&self) -> MonitorHandle {
        let monitor = self.clone();
        let period = self.flush_period();
        let cancel = self.inner.shutdown.clone();

        let timer = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let monitor = monitor.clone();
                        tokio::spawn(async move {
                            monitor.flush_queues().await;
                        });
                    }
                }
            }

            tracing::debug!("定时上报已停止");
        });

        tracing::info!(interval_ms = period.as_millis() as u64, "定时上报已启动");

        MonitorHandle {
            monitor: self.clone(),
            timer,
        }
    }

    /// 定时上报周期,配置为0时回退到默认周期
    fn flush_period(&self) -> Duration {
        let configured = self.inner.config.flush_interval;
        if configured.is_zero() {
            tracing::warn!(
                default_ms = DEFAULT_FLUSH_INTERVAL.as_millis() as u64,
                "上报周期为0,使用默认周期"
            );
            DEFAULT_FLUSH_INTERVAL
        } else {
            configured
        }
    }

    /// 停止信号,定时器与信号监听共用
    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    async fn upload_errors(&self, batch: Batch<ErrorEvent>) -> FlushOutcome {
        let token = self.auth_token();
        let result = self.inner.transport.upload_errors(&token, batch.items()).await;
        settle(&self.inner.error_queue, batch, result, "errors")
    }

    async fn upload_logs(&self, batch: Batch<LogEvent>) -> FlushOutcome {
        let token = self.auth_token();
        let result = self.inner.transport.upload_logs(&token, batch.items()).await;
        settle(&self.inner.log_queue, batch, result, "logs")
    }

    /// 未登录时发送空令牌
    fn auth_token(&self) -> String {
        self.inner.credentials.auth_token().unwrap_or_default()
    }

    fn spawn_error_upload(&self, batch: Batch<ErrorEvent>) {
        match Handle::try_current() {
            Ok(handle) => {
                let monitor = self.clone();
                handle.spawn(async move {
                    monitor.upload_errors(batch).await;
                });
            }
            Err(_) => {
                tracing::warn!(count = batch.len(), "无可用运行时,错误批次保留到下次上报");
                self.inner.error_queue.restore(batch);
            }
        }
    }

    fn spawn_log_upload(&self, batch: Batch<LogEvent>) {
        match Handle::try_current() {
            Ok(handle) => {
                let monitor = self.clone();
                handle.spawn(async move {
                    monitor.upload_logs(batch).await;
                });
            }
            Err(_) => {
                tracing::warn!(count = batch.len(), "无可用运行时,日志批次保留到下次上报");
                self.inner.log_queue.restore(batch);
            }
        }
    }

    fn spawn_flush_queues(&self) {
        match Handle::try_current() {
            Ok(handle) => {
                let monitor = self.clone();
                handle.spawn(async move {
                    monitor.flush_queues().await;
                });
            }
            Err(_) => {
                tracing::warn!(
                    pending_errors = self.inner.error_queue.len(),
                    pending_logs = self.inner.log_queue.len(),
                    "无可用运行时,网络恢复后的上报推迟到下次刷新"
                );
            }
        }
    }
}

/// 根据上报结果处理批次: 成功丢弃,失败放回队首
fn settle<T>(
    queue: &BatchQueue<T>,
    batch: Batch<T>,
    result: Result<(), UploadError>,
    queue_name: &'static str,
) -> FlushOutcome {
    let count = batch.len();
    match result {
        Ok(()) => {
            crate::log_event!("BatchDelivered", queue = queue_name, count = count);
            FlushOutcome::Delivered(count)
        }
        Err(e) => {
            crate::log_error!(
                "BatchRequeued",
                queue = queue_name,
                count = count,
                error = e.to_string().as_str(),
            );
            queue.restore(batch);
            FlushOutcome::Requeued(count)
        }
    }
}

/// 运行中的监控器句柄
///
/// `shutdown()` 停止定时器与信号监听,再做最后一次上报。
pub struct MonitorHandle {
    monitor: ErrorMonitor,
    timer: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn monitor(&self) -> &ErrorMonitor {
        &self.monitor
    }

    /// 停止并执行最后一次上报
    ///
    /// 最后一次上报同样遵循离线跳过、失败回队的规则。
    pub async fn shutdown(self) -> FlushSummary {
        self.monitor.inner.shutdown.cancel();
        if let Err(e) = self.timer.await {
            tracing::warn!(error = %e, "定时上报任务异常退出");
        }

        let summary = self.monitor.flush_queues().await;
        tracing::info!(
            errors = ?summary.errors,
            logs = ?summary.logs,
            "监控器已停止"
        );
        summary
    }
}

//! 全局错误捕获
//!
//! 消费运行环境信号,翻译为监控器的错误、日志或网络状态变化。
//! 每个错误都附带当前页面地址、上报端标识和时间戳。

use tokio::task::JoinHandle;

use super::error_monitor::ErrorMonitor;
use super::performance_monitor::PerformanceMonitor;
use super::signal_source::SignalReceiver;
use crate::models::{EnvironmentSignal, ErrorReport, ErrorType};

const DEFAULT_REJECTION_MESSAGE: &str = "Unhandled Promise Rejection";

/// 信号监听器
pub struct SignalListener {
    monitor: ErrorMonitor,
    performance: PerformanceMonitor,
}

impl SignalListener {
    pub fn new(monitor: ErrorMonitor) -> Self {
        let performance = PerformanceMonitor::new(monitor.clone());
        Self {
            monitor,
            performance,
        }
    }

    /// 在后台消费信号
    ///
    /// 发送端全部关闭或监控器停止时结束。
    pub fn spawn(self, mut receiver: SignalReceiver) -> JoinHandle<()> {
        let cancel = self.monitor.shutdown_token();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    signal = receiver.recv() => match signal {
                        Some(signal) => self.handle(signal),
                        None => break,
                    },
                }
            }
            tracing::debug!("信号监听已停止");
        })
    }

    /// 处理单个信号
    pub fn handle(&self, signal: EnvironmentSignal) {
        match signal {
            EnvironmentSignal::UncaughtError {
                message,
                filename,
                lineno,
                colno,
                stack,
            } => {
                let report = self
                    .contextual(ErrorType::JavascriptError, message)
                    .with_location(filename, lineno, colno)
                    .with_stack(stack);
                self.monitor.report_error(report);
            }
            EnvironmentSignal::UnhandledRejection { reason, stack } => {
                let message = reason.unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string());
                let report = self
                    .contextual(ErrorType::UnhandledPromiseRejection, message)
                    .with_stack(stack);
                self.monitor.report_error(report);
            }
            EnvironmentSignal::BoundaryCaught {
                message,
                stack,
                component_stack,
            } => {
                let report = self
                    .contextual(ErrorType::ReactError, message.unwrap_or_default())
                    .with_stack(stack)
                    .with_component_stack(component_stack);
                self.monitor.report_error(report);
            }
            EnvironmentSignal::Connectivity { online } => self.monitor.set_online(online),
            EnvironmentSignal::LongTask {
                name,
                start_time_ms,
                duration_ms,
            } => {
                self.performance
                    .record_long_task(&name, start_time_ms, duration_ms);
            }
            EnvironmentSignal::PageLoaded(timing) => self.performance.record_page_load(&timing),
            EnvironmentSignal::Navigated { url } => self.monitor.set_current_url(url),
        }
    }

    /// 附带页面地址和上报端标识的错误载荷
    fn contextual(&self, error_type: ErrorType, message: String) -> ErrorReport {
        ErrorReport::new(error_type, message)
            .with_url(self.monitor.current_url())
            .with_user_agent(Some(self.monitor.user_agent().to_string()))
    }
}

impl ErrorMonitor {
    /// 安装全局错误捕获,在后台消费信号
    pub fn listen(&self, receiver: SignalReceiver) -> JoinHandle<()> {
        SignalListener::new(self.clone()).spawn(receiver)
    }
}

//! 运行环境信号通道
//!
//! 宿主平台持有 `SignalEmitter`,在全局错误、网络变化、长任务等
//! 事件发生时推送信号;监控器一侧通过 `SignalListener` 消费。
//! 通道无界,推送永远不会阻塞宿主。

use tokio::sync::mpsc;

use crate::models::{EnvironmentSignal, PageTiming};

/// 信号接收端
pub type SignalReceiver = mpsc::UnboundedReceiver<EnvironmentSignal>;

/// 创建一对信号发送端/接收端
pub fn signal_channel() -> (SignalEmitter, SignalReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SignalEmitter { tx }, rx)
}

/// 信号发送端
///
/// 可克隆,所有克隆都被drop后监听任务自然结束。
#[derive(Debug, Clone)]
pub struct SignalEmitter {
    tx: mpsc::UnboundedSender<EnvironmentSignal>,
}

impl SignalEmitter {
    /// 推送任意信号
    ///
    /// 监听端已停止时信号被丢弃,返回 `false`。
    pub fn emit(&self, signal: EnvironmentSignal) -> bool {
        match self.tx.send(signal) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(signal = ?e.0, "信号监听已停止,丢弃信号");
                false
            }
        }
    }

    /// 未捕获的脚本错误
    pub fn uncaught_error(
        &self,
        message: impl Into<String>,
        filename: Option<String>,
        lineno: Option<u32>,
        colno: Option<u32>,
        stack: Option<String>,
    ) -> bool {
        self.emit(EnvironmentSignal::UncaughtError {
            message: message.into(),
            filename,
            lineno,
            colno,
            stack,
        })
    }

    /// 未处理的异步拒绝
    pub fn unhandled_rejection(&self, reason: Option<String>, stack: Option<String>) -> bool {
        self.emit(EnvironmentSignal::UnhandledRejection { reason, stack })
    }

    /// 渲染边界捕获到异常
    pub fn boundary_caught(
        &self,
        message: Option<String>,
        stack: Option<String>,
        component_stack: Option<String>,
    ) -> bool {
        self.emit(EnvironmentSignal::BoundaryCaught {
            message,
            stack,
            component_stack,
        })
    }

    /// 网络连接状态变化
    pub fn connectivity_changed(&self, online: bool) -> bool {
        self.emit(EnvironmentSignal::Connectivity { online })
    }

    /// 观察到长任务
    pub fn long_task(&self, name: impl Into<String>, start_time_ms: f64, duration_ms: f64) -> bool {
        self.emit(EnvironmentSignal::LongTask {
            name: name.into(),
            start_time_ms,
            duration_ms,
        })
    }

    /// 页面加载完成
    pub fn page_loaded(&self, timing: PageTiming) -> bool {
        self.emit(EnvironmentSignal::PageLoaded(timing))
    }

    /// 页面地址变化
    pub fn navigated(&self, url: impl Into<String>) -> bool {
        self.emit(EnvironmentSignal::Navigated { url: url.into() })
    }
}

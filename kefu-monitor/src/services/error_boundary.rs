//! 渲染错误边界
//!
//! 包裹一次渲染调用,捕获其中的panic并上报为 `react_error_boundary`。
//! 捕获后进入持久的错误状态,只有 `reset()` (即刷新页面) 才能恢复。

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

use super::error_monitor::ErrorMonitor;
use crate::models::{ErrorReport, ErrorType};

/// 展示给用户的错误提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryNotice {
    pub title: String,
    pub description: String,
    /// 原始异常信息
    pub error_message: String,
}

impl BoundaryNotice {
    fn new(error_message: String) -> Self {
        Self {
            title: "应用错误".to_string(),
            description: "检测到应用错误，已自动上报。请刷新页面重试。".to_string(),
            error_message,
        }
    }
}

/// 错误边界
pub struct ErrorBoundary {
    monitor: ErrorMonitor,
    notice: Mutex<Option<BoundaryNotice>>,
}

impl ErrorBoundary {
    pub fn new(monitor: ErrorMonitor) -> Self {
        Self {
            monitor,
            notice: Mutex::new(None),
        }
    }

    /// 执行渲染
    ///
    /// - 已处于错误状态: 不执行 `render`,直接返回已有提示
    /// - `render` panic: 上报、锁定错误状态并返回提示
    /// - 否则返回渲染结果
    pub fn render<T>(
        &self,
        component_stack: &str,
        render: impl FnOnce() -> T,
    ) -> Result<T, BoundaryNotice> {
        if let Some(notice) = self.notice() {
            return Err(notice);
        }

        match catch_unwind(AssertUnwindSafe(render)) {
            Ok(value) => Ok(value),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    message = %message,
                    component_stack = %component_stack,
                    "错误边界捕获到渲染异常"
                );

                let report = ErrorReport::new(ErrorType::ReactErrorBoundary, message.clone())
                    .with_component_stack(Some(component_stack.to_string()))
                    .with_url(self.monitor.current_url())
                    .with_user_agent(Some(self.monitor.user_agent().to_string()));
                self.monitor.report_error(report);

                let notice = BoundaryNotice::new(message);
                *self.notice.lock().unwrap_or_else(PoisonError::into_inner) = Some(notice.clone());
                Err(notice)
            }
        }
    }

    /// 当前错误提示
    pub fn notice(&self) -> Option<BoundaryNotice> {
        self.notice
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_error(&self) -> bool {
        self.notice().is_some()
    }

    /// 清除错误状态 (刷新页面)
    pub fn reset(&self) {
        *self.notice.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown render error".to_string()
    }
}

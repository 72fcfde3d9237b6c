//! 性能监控
//!
//! 把页面加载耗时和长任务转换为 `performance` 日志。

use serde_json::json;

use super::error_monitor::ErrorMonitor;
use crate::models::{LogLevel, PageTiming};

const PERFORMANCE_COMPONENT: &str = "performance";

/// 性能监控器
#[derive(Clone)]
pub struct PerformanceMonitor {
    monitor: ErrorMonitor,
}

impl PerformanceMonitor {
    pub fn new(monitor: ErrorMonitor) -> Self {
        Self { monitor }
    }

    /// 记录页面加载性能
    ///
    /// 缺失的绘制时间按0记录。
    pub fn record_page_load(&self, timing: &PageTiming) {
        self.monitor.report_log(
            LogLevel::Info,
            PERFORMANCE_COMPONENT,
            "页面加载性能",
            Some(json!({
                "loadTime": timing.load_event_end - timing.load_event_start,
                "domContentLoaded": timing.dom_content_loaded_end - timing.dom_content_loaded_start,
                "firstPaint": timing.first_paint.unwrap_or(0.0),
                "firstContentfulPaint": timing.first_contentful_paint.unwrap_or(0.0),
            })),
        );
    }

    /// 记录长任务
    ///
    /// 只有时长严格大于阈值 (默认50ms) 的任务会被记录,返回是否记录。
    pub fn record_long_task(&self, name: &str, start_time_ms: f64, duration_ms: f64) -> bool {
        if duration_ms <= self.monitor.config().long_task_threshold_ms {
            return false;
        }

        self.monitor.report_log(
            LogLevel::Warning,
            PERFORMANCE_COMPONENT,
            "检测到长任务",
            Some(json!({
                "duration": duration_ms,
                "startTime": start_time_ms,
                "name": name,
            })),
        );
        true
    }
}

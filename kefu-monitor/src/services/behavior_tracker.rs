//! 用户行为跟踪
//!
//! 页面访问、点击和表单提交记录为 `user_behavior` 日志,
//! 同一跟踪器产生的日志共享一个会话ID。

use chrono::Utc;
use serde_json::json;

use super::error_monitor::ErrorMonitor;
use crate::models::error_event::iso_timestamp;
use crate::models::LogLevel;
use crate::utils::id::generate_id;

const BEHAVIOR_COMPONENT: &str = "user_behavior";
/// 点击元素文本的最大记录长度 (字符)
const CLICK_TEXT_LIMIT: usize = 100;

/// 被点击的元素
#[derive(Debug, Clone, Default)]
pub struct ClickTarget {
    pub element: String,
    pub class_name: String,
    pub id: String,
    pub text: Option<String>,
}

/// 被提交的表单
#[derive(Debug, Clone, Default)]
pub struct FormTarget {
    pub id: String,
    pub class_name: String,
    pub action: String,
    pub method: String,
}

/// 用户行为跟踪器
pub struct UserBehaviorTracker {
    monitor: ErrorMonitor,
    session_id: String,
}

impl UserBehaviorTracker {
    /// 创建跟踪器并生成新的会话ID
    pub fn new(monitor: ErrorMonitor) -> Self {
        Self {
            monitor,
            session_id: generate_id("session"),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// 记录页面访问
    pub fn track_page_view(&self, referrer: Option<&str>) {
        self.monitor.report_log(
            LogLevel::Info,
            BEHAVIOR_COMPONENT,
            "页面访问",
            Some(json!({
                "sessionId": self.session_id,
                "url": self.monitor.current_url(),
                "referrer": referrer.unwrap_or_default(),
                "userAgent": self.monitor.user_agent(),
                "timestamp": iso_timestamp(Utc::now()),
            })),
        );
    }

    /// 记录点击,元素文本截断到100个字符
    pub fn track_click(&self, target: &ClickTarget) {
        let text = target
            .text
            .as_deref()
            .map(|t| t.chars().take(CLICK_TEXT_LIMIT).collect::<String>());

        self.monitor.report_log(
            LogLevel::Info,
            BEHAVIOR_COMPONENT,
            "用户点击",
            Some(json!({
                "sessionId": self.session_id,
                "element": target.element,
                "className": target.class_name,
                "id": target.id,
                "text": text,
                "url": self.monitor.current_url(),
                "timestamp": iso_timestamp(Utc::now()),
            })),
        );
    }

    /// 记录表单提交
    pub fn track_form_submit(&self, form: &FormTarget) {
        self.monitor.report_log(
            LogLevel::Info,
            BEHAVIOR_COMPONENT,
            "表单提交",
            Some(json!({
                "sessionId": self.session_id,
                "formId": form.id,
                "formClass": form.class_name,
                "action": form.action,
                "method": form.method,
                "url": self.monitor.current_url(),
                "timestamp": iso_timestamp(Utc::now()),
            })),
        );
    }
}

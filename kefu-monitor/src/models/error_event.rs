//! 错误事件模型
//!
//! `ErrorReport` 是采集端填写的部分载荷,
//! 监控器为其补上 `id` / `level` / `component` 后成为不可变的 `ErrorEvent`。

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 错误事件的固定级别
pub const ERROR_LEVEL: &str = "ERROR";

/// 错误来源分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// 未捕获的脚本错误
    JavascriptError,
    /// 未处理的异步拒绝
    UnhandledPromiseRejection,
    /// 渲染边界发出的自定义信号
    ReactError,
    /// 错误边界组件直接捕获的渲染异常
    ReactErrorBoundary,
    /// 后台接口返回非2xx
    ApiError,
    /// 后台接口网络层失败
    NetworkError,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::JavascriptError => "javascript_error",
            ErrorType::UnhandledPromiseRejection => "unhandled_promise_rejection",
            ErrorType::ReactError => "react_error",
            ErrorType::ReactErrorBoundary => "react_error_boundary",
            ErrorType::ApiError => "api_error",
            ErrorType::NetworkError => "network_error",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 待上报的错误载荷
///
/// 由各采集器构造,交给 `ErrorMonitor::report_error`。
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub error_type: ErrorType,
    pub message: String,
    pub stack: Option<String>,
    pub component_stack: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub url: Option<String>,
    pub filename: Option<String>,
    pub lineno: Option<u32>,
    pub colno: Option<u32>,
    pub status: Option<u16>,
}

impl ErrorReport {
    /// 创建错误载荷,时间戳取当前时间
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
            stack: None,
            component_stack: None,
            timestamp: Utc::now(),
            user_agent: None,
            url: None,
            filename: None,
            lineno: None,
            colno: None,
            status: None,
        }
    }

    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }

    pub fn with_component_stack(mut self, component_stack: Option<String>) -> Self {
        self.component_stack = component_stack;
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// 设置出错位置 (脚本文件、行号、列号)
    pub fn with_location(
        mut self,
        filename: Option<String>,
        lineno: Option<u32>,
        colno: Option<u32>,
    ) -> Self {
        self.filename = filename;
        self.lineno = lineno;
        self.colno = colno;
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// 已入队的错误事件
///
/// 线上格式为 camelCase JSON,缺省字段不输出。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    pub id: String,
    /// 恒为 "ERROR"
    pub level: String,
    /// 上报端标识
    pub component: String,
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_stack: Option<String>,
    /// ISO-8601 时间戳
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colno: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorEvent {
    /// 为载荷补齐 id / level / component
    pub fn from_report(id: String, component: &str, report: ErrorReport) -> Self {
        Self {
            id,
            level: ERROR_LEVEL.to_string(),
            component: component.to_string(),
            error_type: report.error_type,
            message: report.message,
            stack: report.stack,
            component_stack: report.component_stack,
            timestamp: iso_timestamp(report.timestamp),
            user_agent: report.user_agent,
            url: report.url,
            filename: report.filename,
            lineno: report.lineno,
            colno: report.colno,
            status: report.status,
        }
    }
}

/// 毫秒精度、`Z` 结尾的 ISO-8601 字符串
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

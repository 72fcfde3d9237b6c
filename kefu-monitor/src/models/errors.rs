use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 批量上报失败
///
/// 仅在监控器内部流转: 上报失败只会触发重新入队,
/// 不会传播给 `report_error` / `report_log` 的调用方。
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum UploadError {
    /// 网络请求失败
    ///
    /// 可能原因:
    /// - 网络连接中断
    /// - 采集服务不可达
    /// - DNS解析失败
    #[error("上报请求失败: {0}")]
    NetworkFailed(String),

    /// 采集服务返回非2xx状态码
    #[error("上报被拒绝 (HTTP {status})")]
    HttpStatus { status: u16 },

    /// 批次序列化失败
    #[error("上报数据序列化失败: {0}")]
    SerializationFailed(String),
}

/// 后台REST调用错误
///
/// 由 `ApiClient` 返回给业务调用方。网络层失败在返回前
/// 已经作为 `network_error` 记录到监控器。
#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum ApiError {
    /// 网络请求失败
    #[error("网络请求失败: {0}")]
    NetworkFailed(String),

    /// HTTP状态码错误
    ///
    /// 后台返回了非2xx状态码
    #[error("HTTP错误 {status}: {message}")]
    HttpStatusError { status: u16, message: String },

    /// 响应数据解析失败
    #[error("响应数据解析失败: {0}")]
    JsonParseFailed(String),
}

/// 配置加载错误
#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum ConfigError {
    /// 配置项取值无效
    ///
    /// 数字格式错误,或阈值/间隔为0
    #[error("配置项 {key} 取值无效: {value}")]
    InvalidValue { key: String, value: String },

    /// I/O错误
    ///
    /// 读取 .env 文件时的文件系统错误
    #[error("I/O错误: {0}")]
    IoError(String),
}

/// 实现从reqwest::Error到UploadError的转换
impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UploadError::NetworkFailed("请求超时".to_string())
        } else if err.is_connect() {
            UploadError::NetworkFailed("无法连接到采集服务".to_string())
        } else if let Some(status) = err.status() {
            UploadError::HttpStatus {
                status: status.as_u16(),
            }
        } else {
            UploadError::NetworkFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UploadError {
    fn from(err: serde_json::Error) -> Self {
        UploadError::SerializationFailed(err.to_string())
    }
}

/// 实现从reqwest::Error到ApiError的转换
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::NetworkFailed("请求超时".to_string())
        } else if err.is_connect() {
            ApiError::NetworkFailed("无法连接到服务器".to_string())
        } else if err.is_decode() {
            ApiError::JsonParseFailed(err.to_string())
        } else {
            ApiError::NetworkFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::JsonParseFailed(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::PermissionDenied => ConfigError::IoError(format!("权限不足: {}", err)),
            _ => ConfigError::IoError(err.to_string()),
        }
    }
}

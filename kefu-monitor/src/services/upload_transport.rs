//! 批量上报通道
//!
//! 协议:
//! - `POST /api/errors/batch`, body `{ "errors": [...] }`
//! - `POST /api/logs/batch`, body `{ "logs": [...] }`
//! - `Authorization: Bearer <token>`,未登录时令牌为空串
//! - 任意2xx视为成功,不解析响应体

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::models::{ErrorEvent, LogEvent, MonitorConfig, UploadError};

/// 上报通道接口
///
/// 监控器只依赖这个接口,测试中可替换为内存实现。
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// 上传一批错误
    async fn upload_errors(&self, token: &str, errors: &[ErrorEvent]) -> Result<(), UploadError>;

    /// 上传一批日志
    async fn upload_logs(&self, token: &str, logs: &[LogEvent]) -> Result<(), UploadError>;
}

#[derive(Serialize)]
struct ErrorBatch<'a> {
    errors: &'a [ErrorEvent],
}

#[derive(Serialize)]
struct LogBatch<'a> {
    logs: &'a [LogEvent],
}

/// 基于reqwest的HTTP上报通道
pub struct HttpUploadTransport {
    client: reqwest::Client,
    errors_url: String,
    logs_url: String,
}

impl HttpUploadTransport {
    /// 按配置创建通道
    ///
    /// 未配置 `request_timeout` 时不设置超时。
    pub fn new(config: &MonitorConfig) -> Result<Self, UploadError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        tracing::info!(
            errors_url = %config.errors_batch_url(),
            logs_url = %config.logs_batch_url(),
            "HTTP upload transport initialized"
        );

        Ok(Self::with_client(client, config))
    }

    /// 复用已有的 `reqwest::Client`
    pub fn with_client(client: reqwest::Client, config: &MonitorConfig) -> Self {
        Self {
            client,
            errors_url: config.errors_batch_url(),
            logs_url: config.logs_batch_url(),
        }
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        token: &str,
        body: &B,
    ) -> Result<(), UploadError> {
        // 序列化失败不发请求
        let payload = serde_json::to_vec(body)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(UploadError::HttpStatus {
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
    async fn upload_errors(&self, token: &str, errors: &[ErrorEvent]) -> Result<(), UploadError> {
        self.post(&self.errors_url, token, &ErrorBatch { errors }).await
    }

    async fn upload_logs(&self, token: &str, logs: &[LogEvent]) -> Result<(), UploadError> {
        self.post(&self.logs_url, token, &LogBatch { logs }).await
    }
}

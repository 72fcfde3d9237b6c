//! 后台REST客户端
//!
//! 所有请求都经过拦截:
//! - 每个完成的请求记录一条 `api_call` 日志 (方法、状态码、耗时、地址)
//! - 非2xx额外上报 `api_error`,响应照常返回给调用方
//! - 网络层失败上报 `network_error` 后把错误返回给调用方

use std::sync::Arc;
use std::time::Instant;

use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::credential_store::CredentialStore;
use super::error_monitor::ErrorMonitor;
use crate::models::{ApiError, ErrorReport, ErrorType, LogLevel};

const API_CALL_COMPONENT: &str = "api_call";

/// 登录响应
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// 后台REST客户端
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    monitor: ErrorMonitor,
}

impl ApiClient {
    /// 使用监控器配置中的后台地址创建客户端
    pub fn new(monitor: ErrorMonitor, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::with_client(reqwest::Client::new(), monitor, credentials)
    }

    pub fn with_client(
        client: reqwest::Client,
        monitor: ErrorMonitor,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            client,
            base_url: monitor.config().api_base_url.clone(),
            credentials,
            monitor,
        }
    }

    /// 发送请求并记录调用日志
    ///
    /// 只有网络层失败返回 `Err`,非2xx响应原样返回。
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(token) = self.credentials.auth_token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let started = Instant::now();
        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                self.record_call(&method, &url, status, started.elapsed().as_millis() as u64);

                if !response.status().is_success() {
                    self.monitor.report_error(
                        ErrorReport::new(ErrorType::ApiError, format!("API调用失败: {}", status))
                            .with_url(Some(url))
                            .with_status(status),
                    );
                }
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "API请求失败");
                self.monitor.report_error(
                    ErrorReport::new(ErrorType::NetworkError, e.to_string()).with_url(Some(url)),
                );
                Err(e.into())
            }
        }
    }

    /// 发送请求并解析JSON,非2xx转换为 `ApiError::HttpStatusError`
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let response = self.send(method, path, body).await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::HttpStatusError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }

    /// 登录并保存令牌
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = serde_json::to_value(LoginRequest { username, password })?;
        let response: LoginResponse = self
            .request_json(Method::POST, "/api/auth/login", Some(&body))
            .await?;

        self.credentials.store_token(&response.access_token);
        tracing::info!(username = %username, "登录成功,令牌已保存");
        Ok(response)
    }

    /// 退出登录
    pub fn logout(&self) {
        self.credentials.clear();
    }

    pub async fn get_config(&self) -> Result<Value, ApiError> {
        self.request_json(Method::GET, "/api/config", None).await
    }

    pub async fn update_config(&self, config: &Value) -> Result<Value, ApiError> {
        self.request_json(Method::POST, "/api/config", Some(config))
            .await
    }

    pub async fn get_status(&self) -> Result<Value, ApiError> {
        self.request_json(Method::GET, "/api/status", None).await
    }

    pub async fn recent_messages(&self) -> Result<Value, ApiError> {
        self.request_json(Method::GET, "/api/messages/recent", None)
            .await
    }

    pub async fn logs(&self) -> Result<Value, ApiError> {
        self.request_json(Method::GET, "/api/logs", None).await
    }

    pub async fn statistics(&self) -> Result<Value, ApiError> {
        self.request_json(Method::GET, "/api/statistics", None).await
    }

    fn record_call(&self, method: &Method, url: &str, status: u16, duration_ms: u64) {
        self.monitor.report_log(
            LogLevel::Info,
            API_CALL_COMPONENT,
            &format!("API调用: {}", url),
            Some(json!({
                "method": method.as_str(),
                "status": status,
                "duration": duration_ms,
                "url": url,
            })),
        );
    }
}

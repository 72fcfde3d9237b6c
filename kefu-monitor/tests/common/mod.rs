//! 测试公共模块
//!
//! 提供内存上报通道和监控器构建工具,避免依赖真实采集服务。

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kefu_monitor::models::{ErrorEvent, ErrorReport, ErrorType, LogEvent, MonitorConfig, UploadError};
use kefu_monitor::services::{ErrorMonitor, MemoryCredentialStore, UploadTransport};
use tokio::sync::{watch, Mutex};

/// Mock上报通道
///
/// - 记录每一批上报内容和令牌
/// - 失败模式: 返回HTTP 500 (或网络错误)
/// - 闸门: 关闭时上报请求挂起,模拟慢速网络
pub struct MockTransport {
    error_batches: Mutex<Vec<Vec<ErrorEvent>>>,
    log_batches: Mutex<Vec<Vec<LogEvent>>>,
    tokens: Mutex<Vec<String>>,
    should_fail: AtomicBool,
    network_failure: AtomicBool,
    gate: watch::Sender<bool>,
    attempts: watch::Sender<usize>,
}

impl MockTransport {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        let (attempts, _) = watch::channel(0);
        Self {
            error_batches: Mutex::new(Vec::new()),
            log_batches: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
            should_fail: AtomicBool::new(false),
            network_failure: AtomicBool::new(false),
            gate,
            attempts,
        }
    }

    /// 设置失败模式 (HTTP 500)
    pub fn set_fail_mode(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// 设置网络失败模式 (传输层异常)
    pub fn set_network_failure(&self, failing: bool) {
        self.network_failure.store(failing, Ordering::SeqCst);
    }

    /// 关闭闸门,后续上报挂起直到 `release()`
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// 已发起的上报次数 (错误+日志)
    pub fn attempts(&self) -> usize {
        *self.attempts.borrow()
    }

    /// 等待上报次数达到 `n`,超时则panic
    pub async fn wait_for_attempts(&self, n: usize) {
        let mut rx = self.attempts.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|count| *count >= n))
            .await
            .unwrap_or_else(|_| panic!("等待第{}次上报超时", n))
            .expect("attempt counter closed");
    }

    pub async fn error_batches(&self) -> Vec<Vec<ErrorEvent>> {
        self.error_batches.lock().await.clone()
    }

    pub async fn log_batches(&self) -> Vec<Vec<LogEvent>> {
        self.log_batches.lock().await.clone()
    }

    pub async fn tokens(&self) -> Vec<String> {
        self.tokens.lock().await.clone()
    }

    async fn attempt(&self, token: &str) -> Result<(), UploadError> {
        self.tokens.lock().await.push(token.to_string());
        self.attempts.send_modify(|count| *count += 1);

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        if self.network_failure.load(Ordering::SeqCst) {
            Err(UploadError::NetworkFailed("connection reset".to_string()))
        } else if self.should_fail.load(Ordering::SeqCst) {
            Err(UploadError::HttpStatus { status: 500 })
        } else {
            Ok(())
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UploadTransport for MockTransport {
    async fn upload_errors(&self, token: &str, errors: &[ErrorEvent]) -> Result<(), UploadError> {
        self.error_batches.lock().await.push(errors.to_vec());
        self.attempt(token).await
    }

    async fn upload_logs(&self, token: &str, logs: &[LogEvent]) -> Result<(), UploadError> {
        self.log_batches.lock().await.push(logs.to_vec());
        self.attempt(token).await
    }
}

/// 默认配置 + Mock通道 + 已登录令牌
pub fn create_monitor() -> (ErrorMonitor, Arc<MockTransport>) {
    create_monitor_with(MonitorConfig::default())
}

pub fn create_monitor_with(config: MonitorConfig) -> (ErrorMonitor, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::new());
    let monitor = ErrorMonitor::new(
        config,
        transport.clone(),
        Arc::new(MemoryCredentialStore::with_token("test-jwt")),
    );
    (monitor, transport)
}

/// 编号的脚本错误,便于校验顺序
pub fn numbered_error(n: usize) -> ErrorReport {
    ErrorReport::new(ErrorType::JavascriptError, format!("error #{}", n))
}

pub fn messages(errors: &[ErrorEvent]) -> Vec<String> {
    errors.iter().map(|e| e.message.clone()).collect()
}

/// 让出执行权若干次,让已就绪的后台任务跑完
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

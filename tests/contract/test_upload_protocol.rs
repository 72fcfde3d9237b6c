//! 契约测试: 批量上报HTTP协议
//!
//! 使用本地TCP服务器捕获真实请求,验证:
//! - 请求路径 `/api/errors/batch` 与 `/api/logs/batch`
//! - `Authorization: Bearer <token>` 头
//! - 请求体 `{ "errors": [...] }` / `{ "logs": [...] }`
//! - 2xx 视为成功,其他状态码整批回队

use std::collections::HashMap;
use std::sync::Arc;

use kefu_monitor::models::{ErrorReport, ErrorType, LogLevel, MonitorConfig};
use kefu_monitor::services::{
    ErrorMonitor, FlushOutcome, HttpUploadTransport, MemoryCredentialStore,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// 捕获到的HTTP请求
#[derive(Debug)]
struct CapturedRequest {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Value,
}

/// 启动只处理一个请求的采集服务,返回基础地址和请求接收端
async fn spawn_collector(status_line: &'static str) -> (String, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
            status_line
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        let _ = tx.send(request);
    });

    (format!("http://{}", addr), rx)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "连接在请求头结束前关闭");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap().split_whitespace();
    let method = request_line.next().unwrap().to_string();
    let path = request_line.next().unwrap().to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "连接在请求体结束前关闭");
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = serde_json::from_slice(&buf[header_end..header_end + content_length]).unwrap();

    CapturedRequest {
        method,
        path,
        headers,
        body,
    }
}

fn monitor_for(base_url: &str, token: Option<&str>) -> ErrorMonitor {
    let config = MonitorConfig::new(base_url);
    let transport = Arc::new(HttpUploadTransport::new(&config).unwrap());
    let credentials = match token {
        Some(token) => MemoryCredentialStore::with_token(token),
        None => MemoryCredentialStore::new(),
    };
    ErrorMonitor::new(config, transport, Arc::new(credentials))
}

#[tokio::test]
async fn test_error_batch_request_format() {
    let (base_url, captured) = spawn_collector("200 OK").await;
    let monitor = monitor_for(&base_url, Some("test-jwt"));

    monitor.report_error(
        ErrorReport::new(ErrorType::ApiError, "API调用失败: 502")
            .with_status(502)
            .with_url(Some("http://localhost:3000/config".to_string())),
    );

    assert_eq!(monitor.flush_error_queue().await, FlushOutcome::Delivered(1));

    let request = captured.await.unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/api/errors/batch");
    assert_eq!(
        request.headers.get("authorization").map(String::as_str),
        Some("Bearer test-jwt")
    );
    assert!(request
        .headers
        .get("content-type")
        .is_some_and(|v| v.starts_with("application/json")));

    let errors = request.body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    let error = &errors[0];
    assert_eq!(error["type"], "api_error");
    assert_eq!(error["level"], "ERROR");
    assert_eq!(error["component"], "frontend");
    assert_eq!(error["message"], "API调用失败: 502");
    assert_eq!(error["status"], 502);
    assert_eq!(error["url"], "http://localhost:3000/config");
    assert!(error["id"].as_str().unwrap().starts_with("frontend_"));
    assert!(error["timestamp"].as_str().unwrap().ends_with('Z'));
    // 缺省字段不输出
    assert!(error.get("stack").is_none());
    assert!(error.get("componentStack").is_none());
}

#[tokio::test]
async fn test_log_batch_request_format() {
    let (base_url, captured) = spawn_collector("200 OK").await;
    let monitor = monitor_for(&base_url, Some("test-jwt"));

    monitor.report_log(
        LogLevel::Info,
        "api_call",
        "API调用: /api/status",
        Some(json!({ "method": "GET", "status": 200, "duration": 12 })),
    );
    monitor.report_log(LogLevel::Debug, "user_behavior", "页面访问", None);

    assert_eq!(monitor.flush_log_queue().await, FlushOutcome::Delivered(2));

    let request = captured.await.unwrap();
    assert_eq!(request.path, "/api/logs/batch");

    let logs = request.body["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["level"], "INFO");
    assert_eq!(logs[0]["component"], "api_call");
    assert_eq!(logs[0]["details"]["status"], 200);
    assert_eq!(logs[1]["level"], "DEBUG");
    assert_eq!(logs[1]["details"], json!({}));
}

#[tokio::test]
async fn test_missing_token_sends_empty_bearer() {
    let (base_url, captured) = spawn_collector("204 No Content").await;
    let monitor = monitor_for(&base_url, None);

    monitor.report_log(LogLevel::Warning, "performance", "检测到长任务", None);
    assert_eq!(monitor.flush_log_queue().await, FlushOutcome::Delivered(1));

    let request = captured.await.unwrap();
    let auth = request.headers.get("authorization").map(|v| v.trim_end());
    assert_eq!(auth, Some("Bearer"));
}

#[tokio::test]
async fn test_server_error_requeues_batch() {
    let (base_url, captured) = spawn_collector("500 Internal Server Error").await;
    let monitor = monitor_for(&base_url, Some("test-jwt"));

    monitor.report_error(ErrorReport::new(ErrorType::JavascriptError, "boom"));
    monitor.report_error(ErrorReport::new(ErrorType::JavascriptError, "boom again"));

    assert_eq!(monitor.flush_error_queue().await, FlushOutcome::Requeued(2));
    captured.await.unwrap();

    let pending = monitor.pending_errors();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].message, "boom");
    assert_eq!(pending[1].message, "boom again");
}

#[tokio::test]
async fn test_unreachable_collector_requeues_batch() {
    // 绑定后立即释放端口,连接会被拒绝
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let monitor = monitor_for(&format!("http://{}", addr), Some("test-jwt"));
    monitor.report_log(LogLevel::Info, "api_call", "API调用: /api/logs", None);

    assert_eq!(monitor.flush_log_queue().await, FlushOutcome::Requeued(1));
    assert_eq!(monitor.queue_status().logs, 1);
}

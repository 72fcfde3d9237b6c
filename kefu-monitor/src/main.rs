use std::env;
use std::sync::Arc;

use kefu_monitor::models::EnvironmentSignal;
use kefu_monitor::services::{
    signal_channel, ConfigService, CredentialStore, ErrorMonitor, HttpUploadTransport,
    MemoryCredentialStore, SignalEmitter,
};
use kefu_monitor::utils::logger;
use tokio::io::{AsyncBufReadExt, BufReader};

/// 预置令牌的环境变量 (登录流程之外的会话恢复)
const ENV_AUTH_TOKEN: &str = "KEFU_MONITOR_AUTH_TOKEN";

/// 从标准输入逐行读取JSON信号并交给监控器,
/// 输入结束或 Ctrl-C 时停止并做最后一次上报。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigService::load()?;
    let _guard = logger::init(&config)?;

    let credentials = Arc::new(MemoryCredentialStore::new());
    if let Ok(token) = env::var(ENV_AUTH_TOKEN) {
        credentials.store_token(&token);
    }

    let transport = Arc::new(HttpUploadTransport::new(&config)?);
    let monitor = ErrorMonitor::new(config, transport, credentials);
    let handle = monitor.start();

    let (emitter, receiver) = signal_channel();
    let listener = monitor.listen(receiver);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("收到中断信号,准备退出");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => forward_line(&emitter, &line),
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "读取标准输入失败");
                    break;
                }
            },
        }
    }

    // 关闭发送端,等待监听任务处理完剩余信号
    drop(emitter);
    if let Err(e) = listener.await {
        tracing::warn!(error = %e, "信号监听任务异常退出");
    }

    let summary = handle.shutdown().await;
    let status = monitor.queue_status();
    tracing::info!(errors = ?summary.errors, logs = ?summary.logs, "最后一次上报完成");
    println!("{}", serde_json::to_string(&status)?);

    Ok(())
}

fn forward_line(emitter: &SignalEmitter, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    match serde_json::from_str::<EnvironmentSignal>(line) {
        Ok(signal) => {
            emitter.emit(signal);
        }
        Err(e) => tracing::warn!(error = %e, line = %line, "无法解析的信号,已忽略"),
    }
}

//! 契约测试: 队列与批量上报语义
//!
//! 验证:
//! - 错误队列在第10条时立即整批上报,之前不上报
//! - 成功后批次丢弃,失败后整批按原顺序回到队首
//! - 上报进行中新增的事件排在回队批次之后
//! - 同一批事件不会被并发上报两次

#[path = "../../kefu-monitor/tests/common/mod.rs"]
mod common;

use common::{create_monitor, create_monitor_with, messages, numbered_error, settle};
use kefu_monitor::models::{LogLevel, MonitorConfig};
use kefu_monitor::services::FlushOutcome;

#[tokio::test]
async fn test_nine_errors_do_not_trigger_upload() {
    let (monitor, transport) = create_monitor();

    for i in 0..9 {
        monitor.report_error(numbered_error(i));
    }
    settle().await;

    assert_eq!(transport.attempts(), 0);
    assert_eq!(monitor.queue_status().errors, 9);
}

#[tokio::test]
async fn test_tenth_error_uploads_whole_batch() {
    let (monitor, transport) = create_monitor();

    for i in 0..10 {
        monitor.report_error(numbered_error(i));
    }
    // 第10条入队时已同步取走整批
    assert_eq!(monitor.queue_status().errors, 0);

    transport.wait_for_attempts(1).await;
    settle().await;

    let batches = transport.error_batches().await;
    assert_eq!(batches.len(), 1);
    assert_eq!(
        messages(&batches[0]),
        (0..10).map(|i| format!("error #{}", i)).collect::<Vec<_>>()
    );
    assert_eq!(monitor.queue_status().errors, 0);
}

#[tokio::test]
async fn test_failed_threshold_upload_restores_batch_in_order() {
    let (monitor, transport) = create_monitor();
    transport.set_fail_mode(true);

    for i in 0..10 {
        monitor.report_error(numbered_error(i));
    }
    transport.wait_for_attempts(1).await;
    settle().await;

    assert_eq!(
        messages(&monitor.pending_errors()),
        (0..10).map(|i| format!("error #{}", i)).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_events_during_failed_upload_follow_restored_batch() {
    let (monitor, transport) = create_monitor();
    transport.set_network_failure(true);
    transport.hold();

    for i in 0..10 {
        monitor.report_error(numbered_error(i));
    }
    transport.wait_for_attempts(1).await;

    // 上报挂起期间继续产生错误
    for i in 10..13 {
        monitor.report_error(numbered_error(i));
    }
    assert_eq!(monitor.queue_status().errors, 3);

    transport.release();
    settle().await;

    assert_eq!(
        messages(&monitor.pending_errors()),
        (0..13).map(|i| format!("error #{}", i)).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_concurrent_failed_batches_keep_insertion_order() {
    let (monitor, transport) = create_monitor();
    transport.set_fail_mode(true);
    transport.hold();

    // 两个批次同时在途
    for i in 0..20 {
        monitor.report_error(numbered_error(i));
    }
    transport.wait_for_attempts(2).await;
    monitor.report_error(numbered_error(20));

    transport.release();
    settle().await;

    assert_eq!(
        messages(&monitor.pending_errors()),
        (0..21).map(|i| format!("error #{}", i)).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_in_flight_batch_is_not_uploaded_twice() {
    let (monitor, transport) = create_monitor();
    transport.hold();

    monitor.report_error(numbered_error(1));
    let background = {
        let monitor = monitor.clone();
        tokio::spawn(async move { monitor.flush_error_queue().await })
    };
    transport.wait_for_attempts(1).await;

    // 批次在途,队列为空
    assert_eq!(monitor.flush_error_queue().await, FlushOutcome::Skipped);

    transport.release();
    assert_eq!(background.await.unwrap(), FlushOutcome::Delivered(1));
    assert_eq!(transport.error_batches().await.len(), 1);
}

#[tokio::test]
async fn test_repeated_flush_is_idempotent() {
    let (monitor, transport) = create_monitor();

    monitor.report_log(LogLevel::Info, "api_call", "API调用: /api/config", None);

    assert_eq!(monitor.flush_log_queue().await, FlushOutcome::Delivered(1));
    assert_eq!(monitor.flush_log_queue().await, FlushOutcome::Skipped);
    assert_eq!(transport.log_batches().await.len(), 1);
}

#[tokio::test]
async fn test_twenty_errors_make_two_batches() {
    let (monitor, transport) = create_monitor();

    for i in 0..20 {
        monitor.report_error(numbered_error(i));
    }
    transport.wait_for_attempts(2).await;

    let mut batches = transport.error_batches().await;
    batches.sort_by_key(|batch| batch[0].message.clone());
    assert_eq!(batches.len(), 2);
    assert_eq!(messages(&batches[0])[0], "error #0");
    assert_eq!(messages(&batches[1])[0], "error #10");
    assert!(batches.iter().all(|batch| batch.len() == 10));
}

#[tokio::test]
async fn test_queues_are_independent() {
    let (monitor, transport) = create_monitor();

    for i in 0..10 {
        monitor.report_log(LogLevel::Info, "api_call", &format!("call {}", i), None);
    }
    for i in 0..9 {
        monitor.report_error(numbered_error(i));
    }
    settle().await;

    // 10条日志远低于日志阈值,9条错误差一条触发
    assert_eq!(transport.attempts(), 0);
    assert_eq!(monitor.queue_status().logs, 10);
    assert_eq!(monitor.queue_status().errors, 9);
}

#[tokio::test]
async fn test_custom_thresholds() {
    let config = MonitorConfig::default().with_thresholds(2, 3);
    let (monitor, transport) = create_monitor_with(config);

    monitor.report_error(numbered_error(1));
    monitor.report_error(numbered_error(2));
    for i in 0..3 {
        monitor.report_log(LogLevel::Debug, "user_behavior", &format!("click {}", i), None);
    }
    transport.wait_for_attempts(2).await;

    assert_eq!(transport.error_batches().await[0].len(), 2);
    assert_eq!(transport.log_batches().await[0].len(), 3);
}

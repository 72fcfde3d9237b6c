//! 工具模块
//!
//! - `logger`: 本地诊断日志初始化
//! - `id`: 事件与会话ID生成

pub mod id;
pub mod logger;

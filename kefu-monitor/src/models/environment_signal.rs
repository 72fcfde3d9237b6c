use serde::{Deserialize, Serialize};

/// 运行环境推送给监控器的信号
///
/// 宿主平台 (浏览器桥接、桌面壳、测试) 负责产生这些信号,
/// `SignalListener` 把它们翻译成错误或日志。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum EnvironmentSignal {
    /// 未捕获的脚本错误
    UncaughtError {
        message: String,
        #[serde(default)]
        filename: Option<String>,
        #[serde(default)]
        lineno: Option<u32>,
        #[serde(default)]
        colno: Option<u32>,
        #[serde(default)]
        stack: Option<String>,
    },

    /// 未处理的异步拒绝,`reason` 可能缺失
    UnhandledRejection {
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        stack: Option<String>,
    },

    /// 渲染边界捕获到异常
    BoundaryCaught {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        stack: Option<String>,
        #[serde(default)]
        component_stack: Option<String>,
    },

    /// 网络连接状态变化
    Connectivity { online: bool },

    /// 性能观察到的长任务
    LongTask {
        name: String,
        start_time_ms: f64,
        duration_ms: f64,
    },

    /// 页面加载完成
    PageLoaded(PageTiming),

    /// 当前页面地址变化
    Navigated { url: String },
}

/// 页面加载耗时采样 (毫秒)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTiming {
    pub load_event_start: f64,
    pub load_event_end: f64,
    pub dom_content_loaded_start: f64,
    pub dom_content_loaded_end: f64,
    #[serde(default)]
    pub first_paint: Option<f64>,
    #[serde(default)]
    pub first_contentful_paint: Option<f64>,
}

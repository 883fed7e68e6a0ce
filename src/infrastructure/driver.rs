//! 外部协作者接口
//!
//! 流程层只通过这两个 trait 接触浏览器：读快照、发动作。

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::BrowserError;
use crate::models::{DriverAction, PageSnapshot};

/// 返回当前页面的可交互控件快照
#[async_trait]
pub trait PageStateProvider: Send + Sync {
    async fn snapshot(&self) -> Result<PageSnapshot>;
}

/// 执行点击 / 填值等原子动作
///
/// 返回人类可读的结果字符串（含 "success" / "error" 等关键字）；
/// `Err` 表示传输层失败（页面脱离、CDP 断开等）。
#[async_trait]
pub trait Driver: Send + Sync {
    async fn dispatch(&self, action: &DriverAction) -> Result<String>;
}

/// 给一次驱动调用加上最长等待
///
/// 超时只算这一次调用失败，由调用方决定是否重试。
pub async fn with_deadline<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(BrowserError::Timeout {
            operation: operation.to_string(),
            timeout_ms: limit.as_millis() as u64,
        }
        .into()),
    }
}

//! 日志初始化与模型调用记录

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// 初始化tracing日志，`RUST_LOG`优先于verbose开关
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "research_panel=debug,info"
    } else {
        "research_panel=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // 测试中可能重复初始化，忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 一次起草服务调用的记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallRecord {
    pub operation: String,
    pub request: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// 调用记录的接收端
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn record(&self, record: &LlmCallRecord) -> Result<()>;
}

/// 把调用记录写入tracing日志
#[derive(Default)]
pub struct TracingSink;

#[async_trait]
impl TelemetrySink for TracingSink {
    async fn record(&self, record: &LlmCallRecord) -> Result<()> {
        match &record.error {
            None => tracing::debug!(
                operation = %record.operation,
                duration_ms = record.duration_ms,
                "drafting call succeeded"
            ),
            Some(error) => tracing::warn!(
                operation = %record.operation,
                duration_ms = record.duration_ms,
                error = %error,
                "drafting call failed"
            ),
        }
        Ok(())
    }
}

/// 以JSON Lines格式追加到文件
pub struct JsonlSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl TelemetrySink for JsonlSink {
    async fn record(&self, record: &LlmCallRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("无法打开调用记录文件 {:?}", self.path))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

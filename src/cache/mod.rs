use anyhow::{Context, Result};
use chrono::Utc;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

use crate::config::CacheConfig;
use crate::llm::client::types::TokenUsage;

pub mod performance_monitor;
pub use performance_monitor::{CachePerformanceMonitor, CachePerformanceReport};

/// 模型响应的磁盘缓存
pub struct CacheManager {
    config: CacheConfig,
    performance_monitor: CachePerformanceMonitor,
}

/// 缓存条目
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    /// 写入时间（unix秒）
    pub timestamp: i64,
    /// prompt的MD5哈希值
    pub prompt_hash: String,
    /// token使用情况，用于命中时统计节省量
    pub token_usage: Option<TokenUsage>,
    pub model_name: Option<String>,
}

impl CacheManager {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            performance_monitor: CachePerformanceMonitor::new(),
        }
    }

    /// 生成prompt的MD5哈希
    pub fn hash_prompt(&self, prompt: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(prompt.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn cache_path(&self, category: &str, hash: &str) -> PathBuf {
        self.config
            .cache_dir
            .join(category)
            .join(format!("{}.json", hash))
    }

    fn is_expired(&self, timestamp: i64) -> bool {
        let age = Utc::now().timestamp().saturating_sub(timestamp).max(0) as u64;
        age > self.config.expire_hours * 3600
    }

    /// 读取缓存，未命中、过期或损坏时返回None
    pub async fn get<T>(&self, category: &str, prompt: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        if !self.config.enabled {
            return Ok(None);
        }

        let hash = self.hash_prompt(prompt);
        let cache_path = self.cache_path(category, &hash);

        if !cache_path.exists() {
            self.performance_monitor.record_cache_miss(category);
            return Ok(None);
        }

        let content = match fs::read_to_string(&cache_path).await {
            Ok(content) => content,
            Err(e) => {
                self.performance_monitor
                    .record_cache_error(category, &format!("读取文件失败: {}", e));
                return Ok(None);
            }
        };

        match serde_json::from_str::<CacheEntry<T>>(&content) {
            Ok(entry) => {
                if self.is_expired(entry.timestamp) {
                    let _ = fs::remove_file(&cache_path).await;
                    self.performance_monitor.record_cache_miss(category);
                    return Ok(None);
                }

                self.performance_monitor.record_cache_hit(
                    category,
                    estimate_inference_time(&content),
                    entry.token_usage.unwrap_or_default(),
                    entry.model_name.as_deref().unwrap_or_default(),
                );
                Ok(Some(entry.data))
            }
            Err(e) => {
                self.performance_monitor
                    .record_cache_error(category, &format!("反序列化失败: {}", e));
                Ok(None)
            }
        }
    }

    /// 写入缓存并记录token使用情况
    pub async fn set_with_tokens<T>(
        &self,
        category: &str,
        prompt: &str,
        data: T,
        token_usage: TokenUsage,
        model_name: Option<String>,
    ) -> Result<()>
    where
        T: Serialize,
    {
        if !self.config.enabled {
            return Ok(());
        }

        let hash = self.hash_prompt(prompt);
        let cache_path = self.cache_path(category, &hash);

        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("无法创建缓存目录 {:?}", parent))?;
        }

        let entry = CacheEntry {
            data,
            timestamp: Utc::now().timestamp(),
            prompt_hash: hash,
            token_usage: Some(token_usage),
            model_name,
        };

        let content = match serde_json::to_string_pretty(&entry) {
            Ok(content) => content,
            Err(e) => {
                self.performance_monitor
                    .record_cache_error(category, &format!("序列化失败: {}", e));
                return Err(e.into());
            }
        };
        if let Err(e) = fs::write(&cache_path, content).await {
            self.performance_monitor
                .record_cache_error(category, &format!("写入文件失败: {}", e));
            return Err(e.into());
        }
        self.performance_monitor.record_cache_write(category);
        Ok(())
    }

    /// 生成性能报告
    pub fn generate_performance_report(&self) -> CachePerformanceReport {
        self.performance_monitor.generate_report()
    }
}

/// 按缓存内容长度估算节省的推理时间
fn estimate_inference_time(content: &str) -> Duration {
    let complexity_factor = (content.len() as f64 / 1000.0).min(10.0);
    Duration::from_secs_f64(2.0 + complexity_factor)
}

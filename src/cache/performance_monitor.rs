use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::llm::client::types::TokenUsage;

/// 缓存性能监控器
#[derive(Clone, Default)]
pub struct CachePerformanceMonitor {
    metrics: Arc<CacheMetrics>,
}

#[derive(Default)]
struct CacheMetrics {
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    cache_writes: AtomicUsize,
    cache_errors: AtomicUsize,
    /// 节省的推理时间（毫秒）
    inference_time_saved_ms: AtomicU64,
    /// 节省的成本（毫美元）
    cost_saved_millis: AtomicUsize,
    input_tokens_saved: AtomicUsize,
    output_tokens_saved: AtomicUsize,
    category_metrics: std::sync::RwLock<HashMap<String, CategoryCounters>>,
}

#[derive(Default, Clone, Copy)]
struct CategoryCounters {
    hits: u64,
    misses: u64,
}

/// 缓存性能报告
#[derive(Debug, Serialize, Deserialize)]
pub struct CachePerformanceReport {
    pub hit_rate: f64,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_writes: usize,
    pub cache_errors: usize,
    /// 节省的推理时间（秒）
    pub inference_time_saved: f64,
    /// 节省的推理成本（美元，估算）
    pub cost_saved: f64,
    pub input_tokens_saved: usize,
    pub output_tokens_saved: usize,
    /// 各类别的命中率
    pub category_hit_rates: HashMap<String, f64>,
}

impl CachePerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录缓存命中
    pub fn record_cache_hit(
        &self,
        category: &str,
        inference_time_saved: Duration,
        token_usage: TokenUsage,
        model_name: &str,
    ) {
        let m = &self.metrics;
        m.cache_hits.fetch_add(1, Ordering::Relaxed);
        m.inference_time_saved_ms
            .fetch_add(inference_time_saved.as_millis() as u64, Ordering::Relaxed);
        m.input_tokens_saved
            .fetch_add(token_usage.input_tokens, Ordering::Relaxed);
        m.output_tokens_saved
            .fetch_add(token_usage.output_tokens, Ordering::Relaxed);

        let estimated_cost_saved = token_usage.estimate_cost(model_name);
        m.cost_saved_millis
            .fetch_add((estimated_cost_saved * 1000.0) as usize, Ordering::Relaxed);
        self.bump_category(category, true);

        tracing::debug!(
            category,
            input_tokens = token_usage.input_tokens,
            output_tokens = token_usage.output_tokens,
            "cache hit"
        );
        println!(
            "   💰 缓存命中 [{}] - 节省推理时间: {:.2}秒, 节省tokens: {}输入+{}输出",
            category,
            inference_time_saved.as_secs_f64(),
            token_usage.input_tokens,
            token_usage.output_tokens,
        );
    }

    /// 记录缓存未命中
    pub fn record_cache_miss(&self, category: &str) {
        self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
        self.bump_category(category, false);
        tracing::debug!(category, "cache miss");
    }

    /// 记录缓存写入
    pub fn record_cache_write(&self, category: &str) {
        self.metrics.cache_writes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(category, "cache write");
    }

    /// 记录缓存错误
    pub fn record_cache_error(&self, category: &str, error: &str) {
        self.metrics.cache_errors.fetch_add(1, Ordering::Relaxed);
        eprintln!("   ❌ 缓存错误 [{}]: {}", category, error);
    }

    fn bump_category(&self, category: &str, hit: bool) {
        if let Ok(mut map) = self.metrics.category_metrics.write() {
            let counters = map.entry(category.to_string()).or_default();
            if hit {
                counters.hits += 1;
            } else {
                counters.misses += 1;
            }
        }
    }

    /// 生成性能报告
    pub fn generate_report(&self) -> CachePerformanceReport {
        let m = &self.metrics;
        let hits = m.cache_hits.load(Ordering::Relaxed);
        let misses = m.cache_misses.load(Ordering::Relaxed);

        let category_hit_rates = m
            .category_metrics
            .read()
            .map(|map| {
                map.iter()
                    .map(|(category, c)| (category.clone(), ratio(c.hits, c.hits + c.misses)))
                    .collect()
            })
            .unwrap_or_default();

        CachePerformanceReport {
            hit_rate: ratio(hits as u64, (hits + misses) as u64),
            cache_hits: hits,
            cache_misses: misses,
            cache_writes: m.cache_writes.load(Ordering::Relaxed),
            cache_errors: m.cache_errors.load(Ordering::Relaxed),
            inference_time_saved: m.inference_time_saved_ms.load(Ordering::Relaxed) as f64
                / 1000.0,
            cost_saved: m.cost_saved_millis.load(Ordering::Relaxed) as f64 / 1000.0,
            input_tokens_saved: m.input_tokens_saved.load(Ordering::Relaxed),
            output_tokens_saved: m.output_tokens_saved.load(Ordering::Relaxed),
            category_hit_rates,
        }
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 { 0.0 } else { part as f64 / total as f64 }
}

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{RetrievedDocument, Retriever, truncate_chars};
use crate::config::SearchConfig;

/// Tavily网页检索
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_content_chars: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl TavilySearch {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("无法创建HTTP客户端")?;
        Ok(Self {
            client,
            api_key: config.tavily_api_key.clone(),
            base_url: config.tavily_base_url.trim_end_matches('/').to_string(),
            max_content_chars: config.max_content_chars,
        })
    }
}

#[async_trait]
impl Retriever for TavilySearch {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RetrievedDocument>> {
        if self.api_key.is_empty() {
            return Err(anyhow!("未配置TAVILY_API_KEY"));
        }

        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "include_answer": false,
        });

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Tavily请求失败")?;

        let status = response.status();
        if !status.is_success() {
            let err_body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Tavily API错误 ({}): {}", status.as_u16(), err_body));
        }

        let data: TavilyResponse = response.json().await.context("无法解析Tavily响应")?;
        Ok(data
            .results
            .into_iter()
            .take(max_results)
            .map(|r| RetrievedDocument::web(r.url, truncate_chars(&r.content, self.max_content_chars)))
            .collect())
    }
}

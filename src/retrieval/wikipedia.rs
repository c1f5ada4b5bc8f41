use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::{RetrievedDocument, Retriever, truncate_chars};
use crate::config::SearchConfig;

/// 基于MediaWiki API的百科检索
pub struct WikipediaSearch {
    client: reqwest::Client,
    api_url: String,
    max_content_chars: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    query: Option<QueryPages>,
}

#[derive(Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: HashMap<String, WikiPage>,
}

#[derive(Deserialize)]
struct WikiPage {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    fullurl: String,
}

impl WikipediaSearch {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("research-panel/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("无法创建HTTP客户端")?;
        Ok(Self {
            client,
            api_url: config.wikipedia_api_url.clone(),
            max_content_chars: config.max_content_chars,
        })
    }
}

#[async_trait]
impl Retriever for WikipediaSearch {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RetrievedDocument>> {
        let limit = max_results.max(1).to_string();
        // 一次请求完成搜索并取回纯文本摘录
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("generator", "search"),
            ("gsrsearch", query),
            ("gsrlimit", limit.as_str()),
            ("prop", "extracts|info"),
            ("inprop", "url"),
            ("explaintext", "1"),
            ("exlimit", "max"),
        ];

        let response = self
            .client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await
            .context("Wikipedia请求失败")?;

        let status = response.status();
        if !status.is_success() {
            let err_body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Wikipedia API错误 ({}): {}", status.as_u16(), err_body));
        }

        let data: QueryResponse = response.json().await.context("无法解析Wikipedia响应")?;
        let mut pages: Vec<WikiPage> = data
            .query
            .map(|q| q.pages.into_values().collect())
            .unwrap_or_default();
        pages.sort_by_key(|p| p.index);

        Ok(pages
            .into_iter()
            .take(max_results)
            .map(|p| {
                RetrievedDocument::encyclopedia(
                    p.fullurl,
                    truncate_chars(&p.extract, self.max_content_chars),
                )
            })
            .collect())
    }
}

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::CacheManager;
use crate::llm::client::LLMClient;
use crate::llm::client::utils::estimate_token_usage;

/// 一次带缓存的模型调用
pub struct AgentExecuteParams {
    pub prompt_sys: String,
    pub prompt_user: String,
    /// 缓存分类目录
    pub cache_scope: String,
    pub log_tag: String,
}

impl AgentExecuteParams {
    fn cache_key(&self) -> String {
        format!("{}\n\n{}", self.prompt_sys, self.prompt_user)
    }
}

/// 文本生成，优先读取缓存
pub async fn prompt(
    client: &LLMClient,
    cache: &CacheManager,
    params: AgentExecuteParams,
) -> Result<String> {
    let cache_key = params.cache_key();
    if let Some(cached) = cache.get::<String>(&params.cache_scope, &cache_key).await? {
        println!("   ✅ 使用缓存的结果: {}", params.log_tag);
        return Ok(cached);
    }

    println!("   🤖 正在进行AI推理: {}", params.log_tag);
    let reply = client.prompt(&params.prompt_sys, &params.prompt_user).await?;

    let token_usage = estimate_token_usage(&cache_key, &reply);
    // 缓存写入失败不影响结果
    if let Err(e) = cache
        .set_with_tokens(
            &params.cache_scope,
            &cache_key,
            &reply,
            token_usage,
            Some(client.config().model_efficient.clone()),
        )
        .await
    {
        tracing::warn!(tag = %params.log_tag, error = %e, "cache write failed");
    }
    Ok(reply)
}

/// 结构化提取，优先读取缓存
pub async fn extract<T>(
    client: &LLMClient,
    cache: &CacheManager,
    params: AgentExecuteParams,
) -> Result<T>
where
    T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
{
    let cache_key = params.cache_key();
    if let Some(cached) = cache.get::<T>(&params.cache_scope, &cache_key).await? {
        println!("   ✅ 使用缓存的结果: {}", params.log_tag);
        return Ok(cached);
    }

    println!("   🤖 正在进行AI推理: {}", params.log_tag);
    let reply: T = client.extract(&params.prompt_sys, &params.prompt_user).await?;

    let output = serde_json::to_string(&reply)?;
    let token_usage = estimate_token_usage(&cache_key, &output);
    if let Err(e) = cache
        .set_with_tokens(
            &params.cache_scope,
            &cache_key,
            &reply,
            token_usage,
            Some(client.config().model_efficient.clone()),
        )
        .await
    {
        tracing::warn!(tag = %params.log_tag, error = %e, "cache write failed");
    }
    Ok(reply)
}

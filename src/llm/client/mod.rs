//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::{Result, anyhow};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::config::LLMConfig;

mod providers;
pub mod types;
pub mod utils;

use providers::ProviderClient;
use utils::evaluate_befitting_model;

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        println!("🔄 正在检查模型连接...");
        match self
            .prompt("You are a helpful assistant.", "Hello")
            .await
        {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    /// 带超时与固定间隔重试的调用
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_retries = self.config.retry_attempts.max(1);
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let mut retries = 0;

        loop {
            let outcome = match tokio::time::timeout(timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(anyhow!("调用超时 ({}秒)", self.config.timeout_seconds)),
            };
            match outcome {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    eprintln!(
                        "❌ 调用模型服务出错，重试中 (第 {} / {}次尝试): {}",
                        retries, max_retries, err
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
            }
        }
    }

    /// 结构化数据提取
    pub async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config, system_prompt, user_prompt);

        let primary = self
            .extract_with_model::<T>(system_prompt, user_prompt, &befitting_model)
            .await;
        match (primary, fallover_model) {
            (Ok(result), _) => Ok(result),
            (Err(e), Some(model)) => {
                eprintln!(
                    "❌ 调用模型服务出错，尝试 {} 次均失败，尝试使用备选模型{}...{}",
                    self.config.retry_attempts, model, e
                );
                let user_prompt_with_fixer = format!(
                    "{}\n\nNote: a previous attempt failed with the error \"{}\". Avoid repeating it.",
                    user_prompt, e
                );
                self.extract_with_model::<T>(system_prompt, &user_prompt_with_fixer, &model)
                    .await
            }
            (Err(e), None) => Err(e),
        }
    }

    async fn extract_with_model<T>(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let extractor = self
            .client
            .create_extractor::<T>(model, system_prompt, &self.config);
        self.retry_with_backoff(|| extractor.extract(user_prompt))
            .await
    }

    /// 单轮文本生成
    pub async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config, system_prompt, user_prompt);

        let primary = self
            .prompt_with_model(system_prompt, user_prompt, &befitting_model)
            .await;
        match (primary, fallover_model) {
            (Ok(result), _) => Ok(result),
            (Err(e), Some(model)) => {
                eprintln!("❌ 调用模型服务出错，尝试使用备选模型{}...{}", model, e);
                self.prompt_with_model(system_prompt, user_prompt, &model)
                    .await
            }
            (Err(e), None) => Err(e),
        }
    }

    async fn prompt_with_model(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<String> {
        let agent = self
            .client
            .create_agent(model, system_prompt, &self.config);
        self.retry_with_backoff(|| agent.prompt(user_prompt)).await
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }
}

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::{DraftingOperation, ResearchDrafter, prompts};
use crate::cache::CacheManager;
use crate::generator::agent_executor::{AgentExecuteParams, extract, prompt};
use crate::i18n::TargetLanguage;
use crate::llm::client::LLMClient;
use crate::types::{Analyst, Message, Perspectives, SearchQuery};

/// 基于LLM客户端的起草服务
pub struct LlmDrafter {
    client: LLMClient,
    cache: Arc<CacheManager>,
    target_language: TargetLanguage,
}

impl LlmDrafter {
    pub fn new(
        client: LLMClient,
        cache: Arc<CacheManager>,
        target_language: TargetLanguage,
    ) -> Self {
        Self {
            client,
            cache,
            target_language,
        }
    }

    fn params(
        &self,
        operation: DraftingOperation,
        (prompt_sys, prompt_user): (String, String),
        localized: bool,
    ) -> AgentExecuteParams {
        let prompt_sys = match self.target_language.prompt_instruction() {
            Some(instruction) if localized => format!("{}\n\n{}", prompt_sys, instruction),
            _ => prompt_sys,
        };
        AgentExecuteParams {
            prompt_sys,
            prompt_user,
            cache_scope: operation.as_str().to_string(),
            log_tag: operation.as_str().to_string(),
        }
    }

    async fn text(
        &self,
        operation: DraftingOperation,
        prompts: (String, String),
        localized: bool,
    ) -> Result<String> {
        let params = self.params(operation, prompts, localized);
        prompt(&self.client, &self.cache, params).await
    }
}

#[async_trait]
impl ResearchDrafter for LlmDrafter {
    async fn create_analysts(
        &self,
        topic: &str,
        max_analysts: usize,
        human_feedback: Option<&str>,
    ) -> Result<Vec<Analyst>> {
        let params = self.params(
            DraftingOperation::CreateAnalysts,
            prompts::analyst_instructions(topic, max_analysts, human_feedback),
            false,
        );
        let perspectives: Perspectives = extract(&self.client, &self.cache, params).await?;
        Ok(perspectives.analysts)
    }

    async fn generate_question(&self, analyst: &Analyst, messages: &[Message]) -> Result<String> {
        self.text(
            DraftingOperation::GenerateQuestion,
            prompts::question_instructions(analyst, messages),
            false,
        )
        .await
    }

    async fn generate_search_query(&self, messages: &[Message]) -> Result<String> {
        let params = self.params(
            DraftingOperation::GenerateSearchQuery,
            prompts::search_instructions(messages),
            false,
        );
        let query: SearchQuery = extract(&self.client, &self.cache, params).await?;
        Ok(query.search_query)
    }

    async fn generate_answer(
        &self,
        analyst: &Analyst,
        context: &str,
        messages: &[Message],
    ) -> Result<String> {
        self.text(
            DraftingOperation::GenerateAnswer,
            prompts::answer_instructions(analyst, context, messages),
            false,
        )
        .await
    }

    async fn write_section(
        &self,
        analyst: &Analyst,
        context: &str,
        interview: &str,
    ) -> Result<String> {
        self.text(
            DraftingOperation::WriteSection,
            prompts::section_writer_instructions(analyst, context, interview),
            true,
        )
        .await
    }

    async fn write_report(&self, topic: &str, sections: &str) -> Result<String> {
        self.text(
            DraftingOperation::WriteReport,
            prompts::report_writer_instructions(topic, sections),
            true,
        )
        .await
    }

    async fn write_introduction(&self, topic: &str, sections: &str) -> Result<String> {
        self.text(
            DraftingOperation::WriteIntroduction,
            prompts::introduction_instructions(topic, sections),
            true,
        )
        .await
    }

    async fn write_conclusion(&self, topic: &str, sections: &str) -> Result<String> {
        self.text(
            DraftingOperation::WriteConclusion,
            prompts::conclusion_instructions(topic, sections),
            true,
        )
        .await
    }
}

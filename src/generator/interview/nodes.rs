use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use super::state::{InterviewState, InterviewUpdate};
use crate::generator::drafting::ResearchDrafter;
use crate::graph::Node;
use crate::retrieval::{Retriever, format_documents};
use crate::types::{Message, get_buffer_string};

/// 专家回答的发言者标识
pub const EXPERT_NAME: &str = "expert";

/// 分析师根据历史对话提问
pub struct AskQuestion {
    pub drafter: Arc<dyn ResearchDrafter>,
}

#[async_trait]
impl Node<InterviewState> for AskQuestion {
    async fn run(&self, state: &InterviewState) -> Result<InterviewUpdate> {
        let question = self
            .drafter
            .generate_question(&state.analyst, &state.messages)
            .await
            .with_context(|| format!("分析师 {} 提问失败", state.analyst.name))?;
        Ok(InterviewUpdate {
            messages: vec![Message::ai(question)],
            ..Default::default()
        })
    }
}

/// 生成检索查询并把结果作为一个上下文块追加
pub struct SearchContext {
    pub drafter: Arc<dyn ResearchDrafter>,
    pub retriever: Arc<dyn Retriever>,
    pub max_results: usize,
}

#[async_trait]
impl Node<InterviewState> for SearchContext {
    async fn run(&self, state: &InterviewState) -> Result<InterviewUpdate> {
        let query = self
            .drafter
            .generate_search_query(&state.messages)
            .await
            .context("生成检索查询失败")?;
        let documents = self
            .retriever
            .search(&query, self.max_results)
            .await
            .with_context(|| format!("{} 检索失败: {}", self.retriever.name(), query))?;
        tracing::debug!(
            retriever = self.retriever.name(),
            query = %query,
            documents = documents.len(),
            "retrieved context"
        );
        Ok(InterviewUpdate {
            context: vec![format_documents(&documents)],
            ..Default::default()
        })
    }
}

/// 专家根据检索上下文回答
pub struct AnswerQuestion {
    pub drafter: Arc<dyn ResearchDrafter>,
}

#[async_trait]
impl Node<InterviewState> for AnswerQuestion {
    async fn run(&self, state: &InterviewState) -> Result<InterviewUpdate> {
        let answer = self
            .drafter
            .generate_answer(&state.analyst, &state.joined_context(), &state.messages)
            .await
            .with_context(|| format!("专家回答 {} 失败", state.analyst.name))?;
        Ok(InterviewUpdate {
            messages: vec![Message::ai(answer).with_name(EXPERT_NAME)],
            ..Default::default()
        })
    }
}

/// 保存访谈记录
pub struct SaveInterview;

#[async_trait]
impl Node<InterviewState> for SaveInterview {
    async fn run(&self, state: &InterviewState) -> Result<InterviewUpdate> {
        Ok(InterviewUpdate {
            interview: Some(get_buffer_string(&state.messages)),
            ..Default::default()
        })
    }
}

/// 把访谈浓缩为报告章节
pub struct WriteSection {
    pub drafter: Arc<dyn ResearchDrafter>,
}

#[async_trait]
impl Node<InterviewState> for WriteSection {
    async fn run(&self, state: &InterviewState) -> Result<InterviewUpdate> {
        let interview = state.interview.clone().unwrap_or_default();
        let section = self
            .drafter
            .write_section(&state.analyst, &state.joined_context(), &interview)
            .await
            .with_context(|| format!("撰写 {} 的章节失败", state.analyst.name))?;
        Ok(InterviewUpdate {
            section: Some(section),
            ..Default::default()
        })
    }
}

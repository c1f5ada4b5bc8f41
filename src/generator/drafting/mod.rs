//! 起草服务 - 所有需要模型生成内容的操作

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Analyst, Message};

mod llm;
pub mod prompts;
mod traced;

pub use llm::LlmDrafter;
pub use traced::TracedDrafter;

/// 起草服务支持的操作，集合固定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftingOperation {
    CreateAnalysts,
    GenerateQuestion,
    GenerateSearchQuery,
    GenerateAnswer,
    WriteSection,
    WriteReport,
    WriteIntroduction,
    WriteConclusion,
}

impl DraftingOperation {
    pub const ALL: [DraftingOperation; 8] = [
        DraftingOperation::CreateAnalysts,
        DraftingOperation::GenerateQuestion,
        DraftingOperation::GenerateSearchQuery,
        DraftingOperation::GenerateAnswer,
        DraftingOperation::WriteSection,
        DraftingOperation::WriteReport,
        DraftingOperation::WriteIntroduction,
        DraftingOperation::WriteConclusion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftingOperation::CreateAnalysts => "create_analysts",
            DraftingOperation::GenerateQuestion => "generate_question",
            DraftingOperation::GenerateSearchQuery => "generate_search_query",
            DraftingOperation::GenerateAnswer => "generate_answer",
            DraftingOperation::WriteSection => "write_section",
            DraftingOperation::WriteReport => "write_report",
            DraftingOperation::WriteIntroduction => "write_introduction",
            DraftingOperation::WriteConclusion => "write_conclusion",
        }
    }
}

impl std::fmt::Display for DraftingOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 起草服务
#[async_trait]
pub trait ResearchDrafter: Send + Sync {
    /// 生成分析师，`human_feedback`为修订意见
    async fn create_analysts(
        &self,
        topic: &str,
        max_analysts: usize,
        human_feedback: Option<&str>,
    ) -> Result<Vec<Analyst>>;

    /// 以分析师身份提出下一个问题
    async fn generate_question(&self, analyst: &Analyst, messages: &[Message]) -> Result<String>;

    /// 从对话中提炼检索查询
    async fn generate_search_query(&self, messages: &[Message]) -> Result<String>;

    /// 以专家身份根据检索上下文回答
    async fn generate_answer(
        &self,
        analyst: &Analyst,
        context: &str,
        messages: &[Message],
    ) -> Result<String>;

    /// 把一次访谈浓缩为报告章节
    async fn write_section(&self, analyst: &Analyst, context: &str, interview: &str)
    -> Result<String>;

    /// 报告正文
    async fn write_report(&self, topic: &str, sections: &str) -> Result<String>;

    async fn write_introduction(&self, topic: &str, sections: &str) -> Result<String>;

    async fn write_conclusion(&self, topic: &str, sections: &str) -> Result<String>;
}

#[cfg(test)]
mod tests;

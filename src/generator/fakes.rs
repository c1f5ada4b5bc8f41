//! 单元测试使用的脚本化服务

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::generator::context::GeneratorContext;
use crate::generator::drafting::ResearchDrafter;
use crate::generator::drafting::prompts::INTERVIEW_CLOSING_PHRASE;
use crate::graph::MemorySaver;
use crate::retrieval::{RetrievedDocument, Retriever};
use crate::types::{Analyst, Message, MessageRole};

pub fn analyst(name: &str) -> Analyst {
    Analyst {
        name: name.to_string(),
        role: format!("{} role", name),
        affiliation: "Test Lab".to_string(),
        description: format!("{} focuses on testing", name),
    }
}

pub struct ScriptedDrafter {
    pub analysts: Vec<Analyst>,
    /// 收到修订意见时返回的分析师
    pub revised_analysts: Vec<Analyst>,
    /// 第n个问题改为结束语
    pub closing_after: Option<usize>,
    /// 这些分析师提问时失败
    pub failing: Vec<String>,
    pub report_body: String,
    pub calls: Mutex<Vec<String>>,
}

impl Default for ScriptedDrafter {
    fn default() -> Self {
        Self {
            analysts: vec![analyst("Ada"), analyst("Grace")],
            revised_analysts: vec![analyst("Linus")],
            closing_after: None,
            failing: Vec::new(),
            report_body: "## Insights\nBody [1]\n## Sources\n[1] https://example.com".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedDrafter {
    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

fn question_count(messages: &[Message]) -> usize {
    messages
        .iter()
        .filter(|m| m.role == MessageRole::Ai && m.name.is_none())
        .count()
}

#[async_trait]
impl ResearchDrafter for ScriptedDrafter {
    async fn create_analysts(
        &self,
        topic: &str,
        _max_analysts: usize,
        human_feedback: Option<&str>,
    ) -> Result<Vec<Analyst>> {
        self.log(format!("create_analysts:{}:{:?}", topic, human_feedback));
        Ok(match human_feedback {
            Some(_) => self.revised_analysts.clone(),
            None => self.analysts.clone(),
        })
    }

    async fn generate_question(&self, analyst: &Analyst, messages: &[Message]) -> Result<String> {
        self.log(format!("generate_question:{}", analyst.name));
        if self.failing.contains(&analyst.name) {
            return Err(anyhow!("question service down for {}", analyst.name));
        }
        let n = question_count(messages) + 1;
        if self.closing_after == Some(n) {
            return Ok(format!("{}!", INTERVIEW_CLOSING_PHRASE));
        }
        Ok(format!("Q{} from {}", n, analyst.name))
    }

    async fn generate_search_query(&self, messages: &[Message]) -> Result<String> {
        self.log("generate_search_query".to_string());
        Ok(format!("query {}", messages.len()))
    }

    async fn generate_answer(
        &self,
        analyst: &Analyst,
        context: &str,
        messages: &[Message],
    ) -> Result<String> {
        self.log(format!("generate_answer:{}", analyst.name));
        let n = messages.iter().filter(|m| m.is_ai_named("expert")).count() + 1;
        Ok(format!("A{} for {} ({} chars of context)", n, analyst.name, context.len()))
    }

    async fn write_section(
        &self,
        analyst: &Analyst,
        _context: &str,
        interview: &str,
    ) -> Result<String> {
        self.log(format!("write_section:{}", analyst.name));
        Ok(format!(
            "## Section by {}\n{} transcript lines",
            analyst.name,
            interview.lines().count()
        ))
    }

    async fn write_report(&self, _topic: &str, _sections: &str) -> Result<String> {
        self.log("write_report".to_string());
        Ok(self.report_body.clone())
    }

    async fn write_introduction(&self, topic: &str, _sections: &str) -> Result<String> {
        self.log("write_introduction".to_string());
        Ok(format!("# {}\n\n## Introduction\nIntro", topic))
    }

    async fn write_conclusion(&self, _topic: &str, _sections: &str) -> Result<String> {
        self.log("write_conclusion".to_string());
        Ok("## Conclusion\nOutro".to_string())
    }
}

/// 返回固定文档的检索服务
pub struct StaticRetriever {
    pub name: &'static str,
    pub documents: Vec<RetrievedDocument>,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl StaticRetriever {
    pub fn web() -> Self {
        Self {
            name: "web",
            documents: vec![
                RetrievedDocument::web("https://example.com/a", "alpha"),
                RetrievedDocument::web("https://example.com/b", "beta"),
            ],
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn encyclopedia() -> Self {
        Self {
            name: "encyclopedia",
            documents: vec![RetrievedDocument::encyclopedia(
                "https://en.wikipedia.org/wiki/Testing",
                "gamma",
            )],
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RetrievedDocument>> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));
        Ok(self.documents.iter().take(max_results).cloned().collect())
    }
}

/// 使用脚本化服务与内存检查点的上下文
pub fn test_context(drafter: Arc<ScriptedDrafter>, config: Config) -> GeneratorContext {
    GeneratorContext::with_services(
        config,
        drafter,
        Arc::new(StaticRetriever::web()),
        Arc::new(StaticRetriever::encyclopedia()),
        Arc::new(MemorySaver::new()),
    )
}

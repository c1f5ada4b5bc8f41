use serde::{Deserialize, Serialize};

use crate::generator::interview::InterviewState;
use crate::graph::GraphState;
use crate::types::Analyst;

/// 访谈失败标记
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterviewFailure {
    pub analyst: String,
    pub error: String,
}

/// 整个调研运行的状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResearchState {
    pub topic: String,
    pub max_analysts: usize,
    /// 人工审阅意见，"approve"或缺省表示通过
    pub human_analyst_feedback: Option<String>,
    /// 每次生成时整体覆盖
    pub analysts: Vec<Analyst>,
    /// 追加合并
    pub sections: Vec<String>,
    /// 追加合并
    pub failed_interviews: Vec<InterviewFailure>,
    pub introduction: Option<String>,
    /// 报告正文
    pub content: Option<String>,
    pub conclusion: Option<String>,
    pub final_report: Option<String>,
}

impl ResearchState {
    pub fn new(topic: impl Into<String>, max_analysts: usize) -> Self {
        Self {
            topic: topic.into(),
            max_analysts,
            ..Default::default()
        }
    }

    pub fn with_feedback(mut self, feedback: Option<String>) -> Self {
        self.human_analyst_feedback = feedback;
        self
    }

    /// 所有章节以空行连接
    pub fn joined_sections(&self) -> String {
        self.sections.join("\n\n")
    }
}

/// 审阅意见的更新方式
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FeedbackUpdate {
    #[default]
    Keep,
    Set(String),
    /// 意见被采纳后清空，避免重复触发重新生成
    Clear,
}

#[derive(Debug, Default)]
pub struct ResearchUpdate {
    pub feedback: FeedbackUpdate,
    pub analysts: Option<Vec<Analyst>>,
    pub sections: Vec<String>,
    pub failed_interviews: Vec<InterviewFailure>,
    pub introduction: Option<String>,
    pub content: Option<String>,
    pub conclusion: Option<String>,
    pub final_report: Option<String>,
}

impl ResearchUpdate {
    /// 外部提交审阅意见
    pub fn feedback(feedback: impl Into<String>) -> Self {
        Self {
            feedback: FeedbackUpdate::Set(feedback.into()),
            ..Default::default()
        }
    }
}

impl GraphState for ResearchState {
    type Update = ResearchUpdate;
    type Packet = InterviewState;

    fn apply(&mut self, update: ResearchUpdate) {
        match update.feedback {
            FeedbackUpdate::Keep => {}
            FeedbackUpdate::Set(feedback) => self.human_analyst_feedback = Some(feedback),
            FeedbackUpdate::Clear => self.human_analyst_feedback = None,
        }
        if let Some(analysts) = update.analysts {
            self.analysts = analysts;
        }
        self.sections.extend(update.sections);
        self.failed_interviews.extend(update.failed_interviews);
        if update.introduction.is_some() {
            self.introduction = update.introduction;
        }
        if update.content.is_some() {
            self.content = update.content;
        }
        if update.conclusion.is_some() {
            self.conclusion = update.conclusion;
        }
        if update.final_report.is_some() {
            self.final_report = update.final_report;
        }
    }
}

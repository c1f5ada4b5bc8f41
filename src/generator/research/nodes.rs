use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;

use super::report::finalize_report;
use super::state::{FeedbackUpdate, InterviewFailure, ResearchState, ResearchUpdate};
use crate::config::InterviewFailurePolicy;
use crate::generator::drafting::ResearchDrafter;
use crate::generator::interview::InterviewState;
use crate::graph::{BranchNode, CompiledGraph, Node};

/// 生成分析师，存在修订意见时按意见重新生成
pub struct CreateAnalysts {
    pub drafter: Arc<dyn ResearchDrafter>,
}

#[async_trait]
impl Node<ResearchState> for CreateAnalysts {
    async fn run(&self, state: &ResearchState) -> Result<ResearchUpdate> {
        let revision = state
            .human_analyst_feedback
            .as_deref()
            .filter(|feedback| !super::is_approval(feedback));

        println!("👥 正在生成分析师: {}", state.topic);
        let mut analysts = self
            .drafter
            .create_analysts(&state.topic, state.max_analysts, revision)
            .await
            .context("生成分析师失败")?;

        if analysts.len() > state.max_analysts {
            tracing::warn!(
                returned = analysts.len(),
                requested = state.max_analysts,
                "too many analysts returned, truncating"
            );
            analysts.truncate(state.max_analysts);
        }

        Ok(ResearchUpdate {
            analysts: Some(analysts),
            // 修订意见已被采纳
            feedback: if revision.is_some() {
                FeedbackUpdate::Clear
            } else {
                FeedbackUpdate::Keep
            },
            ..Default::default()
        })
    }
}

/// 人工审阅点，本身不做任何事
pub struct HumanFeedback;

#[async_trait]
impl Node<ResearchState> for HumanFeedback {
    async fn run(&self, _state: &ResearchState) -> Result<ResearchUpdate> {
        Ok(ResearchUpdate::default())
    }
}

/// 在访谈子图中完成一场访谈
pub struct ConductInterview {
    pub interview_graph: Arc<CompiledGraph<InterviewState>>,
    pub policy: InterviewFailurePolicy,
}

#[async_trait]
impl BranchNode<ResearchState> for ConductInterview {
    async fn run(&self, packet: InterviewState) -> Result<ResearchUpdate> {
        let analyst = packet.analyst.name.clone();
        println!("🎙️ 开始访谈: {}", analyst);

        let outcome = self
            .interview_graph
            .invoke(packet)
            .await
            .map_err(anyhow::Error::from)
            .and_then(|state| {
                state
                    .section
                    .ok_or_else(|| anyhow!("访谈结束但没有生成章节"))
            });

        match outcome {
            Ok(section) => {
                println!("✅ 访谈完成: {}", analyst);
                Ok(ResearchUpdate {
                    sections: vec![section],
                    ..Default::default()
                })
            }
            Err(e) => match self.policy {
                InterviewFailurePolicy::FailFast => {
                    Err(e.context(format!("访谈 {} 失败", analyst)))
                }
                InterviewFailurePolicy::PartialResults => {
                    eprintln!("⚠️ 访谈 {} 失败，已跳过: {:#}", analyst, e);
                    Ok(ResearchUpdate {
                        failed_interviews: vec![InterviewFailure {
                            analyst,
                            error: format!("{:#}", e),
                        }],
                        ..Default::default()
                    })
                }
            },
        }
    }
}

/// 报告的三个撰写部分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPart {
    Introduction,
    Body,
    Conclusion,
}

/// 基于全部章节撰写报告的一个部分
pub struct WriteReportPart {
    pub drafter: Arc<dyn ResearchDrafter>,
    pub part: ReportPart,
}

#[async_trait]
impl Node<ResearchState> for WriteReportPart {
    async fn run(&self, state: &ResearchState) -> Result<ResearchUpdate> {
        let sections = state.joined_sections();
        let topic = state.topic.as_str();
        let mut update = ResearchUpdate::default();
        match self.part {
            ReportPart::Introduction => {
                println!("✍️ 正在撰写引言");
                update.introduction = Some(
                    self.drafter
                        .write_introduction(topic, &sections)
                        .await
                        .context("撰写引言失败")?,
                );
            }
            ReportPart::Body => {
                println!("✍️ 正在撰写报告正文");
                update.content = Some(
                    self.drafter
                        .write_report(topic, &sections)
                        .await
                        .context("撰写报告正文失败")?,
                );
            }
            ReportPart::Conclusion => {
                println!("✍️ 正在撰写结论");
                update.conclusion = Some(
                    self.drafter
                        .write_conclusion(topic, &sections)
                        .await
                        .context("撰写结论失败")?,
                );
            }
        }
        Ok(update)
    }
}

/// 拼装最终报告
pub struct FinalizeReport;

#[async_trait]
impl Node<ResearchState> for FinalizeReport {
    async fn run(&self, state: &ResearchState) -> Result<ResearchUpdate> {
        let (Some(introduction), Some(content), Some(conclusion)) =
            (&state.introduction, &state.content, &state.conclusion)
        else {
            return Err(anyhow!("引言、正文与结论尚未全部完成"));
        };
        Ok(ResearchUpdate {
            final_report: Some(finalize_report(introduction, content, conclusion)),
            ..Default::default()
        })
    }
}

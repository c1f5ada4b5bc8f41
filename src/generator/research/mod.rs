//! 顶层调研图
//!
//! create_analysts → [human_feedback] → N × conduct_interview → {write_report, write_introduction,
//! write_conclusion} → finalize_report

use anyhow::Result;

use crate::generator::context::GeneratorContext;
use crate::generator::interview::{InterviewState, shared_interview_graph};
use crate::graph::{CompiledGraph, END, Goto, START, StateGraph};

mod nodes;
pub mod report;
mod state;

pub use nodes::ReportPart;
pub use state::{FeedbackUpdate, InterviewFailure, ResearchState, ResearchUpdate};

use nodes::{ConductInterview, CreateAnalysts, FinalizeReport, HumanFeedback, WriteReportPart};

pub const CREATE_ANALYSTS: &str = "create_analysts";
pub const HUMAN_FEEDBACK: &str = "human_feedback";
pub const CONDUCT_INTERVIEW: &str = "conduct_interview";
pub const WRITE_REPORT: &str = "write_report";
pub const WRITE_INTRODUCTION: &str = "write_introduction";
pub const WRITE_CONCLUSION: &str = "write_conclusion";
pub const FINALIZE_REPORT: &str = "finalize_report";

/// 审阅之后的路由结果
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackRoute {
    /// 按修订意见重新生成分析师
    Regenerate,
    /// 为每位分析师派发一场访谈
    Dispatch(Vec<InterviewState>),
    /// 没有分析师，直接结束
    Finish,
}

/// 只有"approve"（忽略大小写与首尾空白）视为通过，其余内容都是修订意见
pub fn is_approval(feedback: &str) -> bool {
    feedback.trim().eq_ignore_ascii_case("approve")
}

pub fn initiate_all_interviews(state: &ResearchState, max_turns: usize) -> FeedbackRoute {
    if let Some(feedback) = state.human_analyst_feedback.as_deref()
        && !is_approval(feedback)
    {
        return FeedbackRoute::Regenerate;
    }

    if state.analysts.is_empty() {
        return FeedbackRoute::Finish;
    }

    FeedbackRoute::Dispatch(
        state
            .analysts
            .iter()
            .map(|analyst| InterviewState::opening(analyst.clone(), &state.topic, max_turns))
            .collect(),
    )
}

/// 构建带检查点的顶层调研图
pub fn build_research_graph(context: &GeneratorContext) -> Result<CompiledGraph<ResearchState>> {
    let config = &context.config;
    let drafter = context.drafter.clone();
    let max_turns = config.max_turns;

    let mut graph = StateGraph::<ResearchState>::new();
    graph
        .add_node(CREATE_ANALYSTS, CreateAnalysts {
            drafter: drafter.clone(),
        })
        .add_node(HUMAN_FEEDBACK, HumanFeedback)
        .add_branch_node(CONDUCT_INTERVIEW, ConductInterview {
            interview_graph: shared_interview_graph(context)?,
            policy: config.interview_failure_policy,
        })
        .add_node(WRITE_REPORT, WriteReportPart {
            drafter: drafter.clone(),
            part: ReportPart::Body,
        })
        .add_node(WRITE_INTRODUCTION, WriteReportPart {
            drafter: drafter.clone(),
            part: ReportPart::Introduction,
        })
        .add_node(WRITE_CONCLUSION, WriteReportPart {
            drafter,
            part: ReportPart::Conclusion,
        })
        .add_node(FINALIZE_REPORT, FinalizeReport)
        .add_edge(START, CREATE_ANALYSTS)
        .add_edge(CREATE_ANALYSTS, HUMAN_FEEDBACK)
        .add_conditional_edges(
            HUMAN_FEEDBACK,
            move |state: &ResearchState| initiate_all_interviews(state, max_turns),
            |route| match route {
                FeedbackRoute::Regenerate => Goto::node(CREATE_ANALYSTS),
                FeedbackRoute::Dispatch(packets) => {
                    Goto::Send(CONDUCT_INTERVIEW.to_string(), packets)
                }
                FeedbackRoute::Finish => Goto::End,
            },
        )
        .add_edge(CONDUCT_INTERVIEW, WRITE_REPORT)
        .add_edge(CONDUCT_INTERVIEW, WRITE_INTRODUCTION)
        .add_edge(CONDUCT_INTERVIEW, WRITE_CONCLUSION)
        .add_join(
            &[WRITE_REPORT, WRITE_INTRODUCTION, WRITE_CONCLUSION],
            FINALIZE_REPORT,
        )
        .add_edge(FINALIZE_REPORT, END);

    let mut compiled = graph
        .compile()?
        .with_checkpointer(context.checkpointer.clone())
        .with_max_parallels(config.llm.max_parallels);
    if config.interrupt_before_dispatch {
        compiled = compiled.interrupt_before(&[HUMAN_FEEDBACK]);
    }
    Ok(compiled)
}

#[cfg(test)]
mod tests;

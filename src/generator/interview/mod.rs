//! 轮数受限的访谈子图
//!
//! ask_question → {search_web, search_wikipedia} → answer_question → (ask_question | save_interview)
//! → write_section

use std::sync::Arc;

use anyhow::Result;

use crate::generator::context::GeneratorContext;
use crate::generator::drafting::prompts::INTERVIEW_CLOSING_PHRASE;
use crate::graph::{CompiledGraph, END, Goto, START, StateGraph};

mod nodes;
mod state;

pub use nodes::EXPERT_NAME;
pub use state::{InterviewState, InterviewUpdate};

use nodes::{AnswerQuestion, AskQuestion, SaveInterview, SearchContext, WriteSection};

pub const ASK_QUESTION: &str = "ask_question";
pub const SEARCH_WEB: &str = "search_web";
pub const SEARCH_WIKIPEDIA: &str = "search_wikipedia";
pub const ANSWER_QUESTION: &str = "answer_question";
pub const SAVE_INTERVIEW: &str = "save_interview";
pub const WRITE_SECTION: &str = "write_section";

/// 回答之后的路由结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewRoute {
    Continue,
    Terminate,
}

/// 专家回答达到轮数上限，或分析师在上一个问题中说了结束语时结束访谈
pub fn route_messages(state: &InterviewState) -> InterviewRoute {
    let messages = &state.messages;
    let responses = messages
        .iter()
        .filter(|m| m.is_ai_named(EXPERT_NAME))
        .count();
    if responses >= state.max_num_turns {
        return InterviewRoute::Terminate;
    }

    if messages.len() < 2 {
        return InterviewRoute::Continue;
    }
    let last_question = &messages[messages.len() - 2];
    if last_question.content.contains(INTERVIEW_CLOSING_PHRASE) {
        return InterviewRoute::Terminate;
    }
    InterviewRoute::Continue
}

/// 单次访谈允许的superstep数，每轮问答占三步
fn recursion_limit(max_turns: usize) -> usize {
    3 * max_turns.max(1) + 8
}

/// 构建访谈子图
pub fn build_interview_graph(context: &GeneratorContext) -> Result<CompiledGraph<InterviewState>> {
    let drafter = context.drafter.clone();
    let search = &context.config.search;

    let mut graph = StateGraph::<InterviewState>::new();
    graph
        .add_node(ASK_QUESTION, AskQuestion {
            drafter: drafter.clone(),
        })
        .add_node(SEARCH_WEB, SearchContext {
            drafter: drafter.clone(),
            retriever: context.web_search.clone(),
            max_results: search.web_max_results,
        })
        .add_node(SEARCH_WIKIPEDIA, SearchContext {
            drafter: drafter.clone(),
            retriever: context.encyclopedia.clone(),
            max_results: search.wikipedia_max_docs,
        })
        .add_node(ANSWER_QUESTION, AnswerQuestion {
            drafter: drafter.clone(),
        })
        .add_node(SAVE_INTERVIEW, SaveInterview)
        .add_node(WRITE_SECTION, WriteSection { drafter })
        .add_edge(START, ASK_QUESTION)
        .add_edge(ASK_QUESTION, SEARCH_WEB)
        .add_edge(ASK_QUESTION, SEARCH_WIKIPEDIA)
        .add_join(&[SEARCH_WEB, SEARCH_WIKIPEDIA], ANSWER_QUESTION)
        .add_conditional_edges(ANSWER_QUESTION, route_messages, |route| match route {
            InterviewRoute::Continue => Goto::node(ASK_QUESTION),
            InterviewRoute::Terminate => Goto::node(SAVE_INTERVIEW),
        })
        .add_edge(SAVE_INTERVIEW, WRITE_SECTION)
        .add_edge(WRITE_SECTION, END);

    Ok(graph
        .compile()?
        .with_max_parallels(context.config.llm.max_parallels)
        .with_recursion_limit(recursion_limit(context.config.max_turns)))
}

/// 把单个访谈图包装为可共享的句柄
pub fn shared_interview_graph(
    context: &GeneratorContext,
) -> Result<Arc<CompiledGraph<InterviewState>>> {
    Ok(Arc::new(build_interview_graph(context)?))
}

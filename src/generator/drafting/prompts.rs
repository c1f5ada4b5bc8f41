//! 各起草操作的提示词
//!
//! 访谈使用英文提示词，结束语"Thank you so much for your help"是访谈终止条件的一部分。

use crate::types::{Analyst, Message, get_buffer_string};

/// 分析师结束访谈时使用的固定结束语
pub const INTERVIEW_CLOSING_PHRASE: &str = "Thank you so much for your help";

pub fn analyst_instructions(
    topic: &str,
    max_analysts: usize,
    human_feedback: Option<&str>,
) -> (String, String) {
    let system = format!(
        "You are tasked with creating a set of AI analyst personas.\n\n\
         1. Review the research topic: {topic}\n\
         2. Examine any editorial feedback that has been optionally provided to guide the \
         creation of the analysts.\n\
         3. Determine the most interesting themes based upon the topic and feedback.\n\
         4. Pick the top {max_analysts} themes.\n\
         5. Assign one analyst to each theme, with a name, role, affiliation and a description \
         of their focus, concerns and motives.",
    );
    let user = format!(
        "Research topic: {}\nMaximum number of analysts: {}\nEditorial feedback: {}",
        topic,
        max_analysts,
        human_feedback.unwrap_or("(none)")
    );
    (system, user)
}

pub fn question_instructions(analyst: &Analyst, messages: &[Message]) -> (String, String) {
    let system = format!(
        "You are an analyst tasked with interviewing an expert to learn about a specific topic.\n\n\
         Your goal is to boil down to interesting and specific insights related to your topic:\n\
         1. Interesting: insights that people will find surprising or non-obvious.\n\
         2. Specific: insights that avoid generalities and include specific examples from the expert.\n\n\
         Here is your topic of focus and set of goals:\n{}\n\
         Begin by introducing yourself using a name that fits your persona, and then ask your question.\n\
         Continue to ask questions to drill down and refine your understanding of the topic.\n\
         When you are satisfied with your understanding, complete the interview with: \"{}!\"\n\
         Remember to stay in character throughout your response.",
        analyst.persona(),
        INTERVIEW_CLOSING_PHRASE
    );
    (system, conversation_block(messages))
}

pub fn search_instructions(messages: &[Message]) -> (String, String) {
    let system = "You will be given a conversation between an analyst and an expert.\n\n\
                  Your goal is to generate a well-structured query for use in retrieval and \
                  web-search related to the conversation.\n\
                  First, analyze the full conversation. Pay particular attention to the final \
                  question posed by the analyst.\n\
                  Convert this final question into a well-structured web search query."
        .to_string();
    (system, conversation_block(messages))
}

pub fn answer_instructions(
    analyst: &Analyst,
    context: &str,
    messages: &[Message],
) -> (String, String) {
    let system = format!(
        "You are an expert being interviewed by an analyst.\n\n\
         Here is the analyst's area of focus:\n{}\n\
         Your goal is to answer a question posed by the interviewer.\n\
         To answer the question, use this context:\n{}\n\n\
         When answering questions, follow these guidelines:\n\
         1. Use only the information provided in the context.\n\
         2. Do not introduce external information or make assumptions beyond what is explicitly \
         stated in the context.\n\
         3. The context contains sources at the top of each individual document.\n\
         4. Include these sources in your answer next to any relevant statements, e.g. [1].\n\
         5. List your sources in order at the bottom of your answer.",
        analyst.persona(),
        context
    );
    (system, conversation_block(messages))
}

pub fn section_writer_instructions(
    analyst: &Analyst,
    context: &str,
    interview: &str,
) -> (String, String) {
    let system = format!(
        "You are an expert technical writer.\n\n\
         Your task is to create a short, easily digestible section of a report based on a set of \
         source documents.\n\n\
         1. Use markdown formatting: ## for the section title, ### for sub-section headers.\n\
         2. Structure the section as: ## Title, ### Summary, ### Sources.\n\
         3. Make the title engaging based upon the focus area of the analyst:\n{}\n\
         4. In the summary, emphasize what is novel, interesting or surprising, use numbered \
         sources, and aim for roughly 400 words.\n\
         5. In the sources section, list each source once using the full link or document name.",
        analyst.description
    );
    let user = format!(
        "Use this source to write your section:\n{}\n\nInterview transcript:\n{}",
        context, interview
    );
    (system, user)
}

pub fn report_writer_instructions(topic: &str, sections: &str) -> (String, String) {
    let system = format!(
        "You are a technical writer creating a report on this overall topic:\n{}\n\n\
         You have a team of analysts. Each analyst has conducted an interview with an expert and \
         written up their findings into a memo.\n\
         Consolidate the memos into a crisp overall summary that ties together the central \
         ideas.\n\n\
         1. Use markdown formatting.\n\
         2. Include no pre-amble for the report.\n\
         3. Use no sub-heading.\n\
         4. Start your report with a single title header: ## Insights\n\
         5. Do not mention any analyst names in your report.\n\
         6. Preserve any citations in the memos, which will be annotated in brackets, e.g. [1].\n\
         7. Create a final, consolidated list of sources and add it to a section titled: ## Sources",
        topic
    );
    (system, format!("Here are the memos from your analysts:\n\n{}", sections))
}

pub fn introduction_instructions(topic: &str, sections: &str) -> (String, String) {
    intro_conclusion(topic, sections, "introduction", "## Introduction")
}

pub fn conclusion_instructions(topic: &str, sections: &str) -> (String, String) {
    intro_conclusion(topic, sections, "conclusion", "## Conclusion")
}

fn intro_conclusion(topic: &str, sections: &str, kind: &str, header: &str) -> (String, String) {
    let system = format!(
        "You are a technical writer finishing a report on {}.\n\n\
         You will be given all of the sections of the report.\n\
         Your job is to write a crisp and compelling {} section.\n\
         Include no pre-amble, target around 100 words, and use markdown formatting.\n\
         Use {} as the section header.",
        topic, kind, header
    );
    (system, format!("Here are the sections to reflect on:\n\n{}", sections))
}

fn conversation_block(messages: &[Message]) -> String {
    format!("Conversation so far:\n\n{}", get_buffer_string(messages))
}

#[cfg(test)]
mod prompt_tests {
    use super::*;

    fn analyst() -> Analyst {
        Analyst {
            name: "Ada".to_string(),
            role: "Reviewer".to_string(),
            affiliation: "Lab".to_string(),
            description: "Cares about latency".to_string(),
        }
    }

    #[test]
    fn test_question_prompt_mentions_closing_phrase_and_persona() {
        let (system, user) = question_instructions(&analyst(), &[Message::human("hi")]);
        assert!(system.contains(INTERVIEW_CLOSING_PHRASE));
        assert!(system.contains("Name: Ada"));
        assert!(user.ends_with("Human: hi"));
    }

    #[test]
    fn test_analyst_prompt_without_feedback() {
        let (_, user) = analyst_instructions("Rust", 2, None);
        assert!(user.contains("(none)"));
        assert!(user.contains("Maximum number of analysts: 2"));
    }

    #[test]
    fn test_section_prompt_uses_description() {
        let (system, user) = section_writer_instructions(&analyst(), "ctx", "Human: q");
        assert!(system.contains("Cares about latency"));
        assert!(user.contains("ctx") && user.contains("Human: q"));
    }
}

use serde::{Deserialize, Serialize};

use crate::graph::GraphState;
use crate::types::{Analyst, Message};

/// 单场访谈的状态，只属于一个访谈实例
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterviewState {
    pub analyst: Analyst,
    /// 只追加
    pub messages: Vec<Message>,
    /// 每次检索追加一个文档块
    pub context: Vec<String>,
    pub max_num_turns: usize,
    /// 访谈记录，保存后不再改变
    pub interview: Option<String>,
    pub section: Option<String>,
}

impl InterviewState {
    /// 以开场白开始一场新的访谈
    pub fn opening(analyst: Analyst, topic: &str, max_num_turns: usize) -> Self {
        Self {
            analyst,
            messages: vec![Message::human(format!(
                "So you said you were writing an article on {}?",
                topic
            ))],
            context: Vec::new(),
            max_num_turns,
            interview: None,
            section: None,
        }
    }

    /// 检索上下文，按块以空行连接
    pub fn joined_context(&self) -> String {
        self.context.join("\n\n")
    }
}

#[derive(Debug, Default)]
pub struct InterviewUpdate {
    pub messages: Vec<Message>,
    pub context: Vec<String>,
    pub interview: Option<String>,
    pub section: Option<String>,
}

impl GraphState for InterviewState {
    type Update = InterviewUpdate;
    type Packet = ();

    fn apply(&mut self, update: InterviewUpdate) {
        self.messages.extend(update.messages);
        self.context.extend(update.context);
        // 写一次的字段不会被覆盖
        if self.interview.is_none() {
            self.interview = update.interview;
        }
        if self.section.is_none() {
            self.section = update.section;
        }
    }
}

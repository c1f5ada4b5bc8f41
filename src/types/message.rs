use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Human,
    Ai,
    System,
}

impl MessageRole {
    fn prefix(&self) -> &'static str {
        match self {
            MessageRole::Human => "Human",
            MessageRole::Ai => "AI",
            MessageRole::System => "System",
        }
    }
}

/// 访谈中的一条消息
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    /// 发言者标识，专家回答为"expert"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Human,
            content: content.into(),
            name: None,
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Ai,
            content: content.into(),
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 是否为指定发言者的AI消息
    pub fn is_ai_named(&self, name: &str) -> bool {
        self.role == MessageRole::Ai && self.name.as_deref() == Some(name)
    }
}

/// 把消息渲染为`角色: 内容`的逐行文本
pub fn get_buffer_string(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.prefix(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

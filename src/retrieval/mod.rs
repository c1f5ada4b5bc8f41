//! 检索服务 - 网页检索与百科检索

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod tavily;
mod wikipedia;

pub use tavily::TavilySearch;
pub use wikipedia::WikipediaSearch;

/// 文档之间的分隔符
pub const DOCUMENT_SEPARATOR: &str = "\n\n---\n\n";

/// 文档来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentSource {
    Web { url: String },
    Encyclopedia { source: String, page: Option<String> },
}

/// 检索到的一篇文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub source: DocumentSource,
    pub content: String,
}

impl RetrievedDocument {
    pub fn web(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: DocumentSource::Web { url: url.into() },
            content: content.into(),
        }
    }

    pub fn encyclopedia(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: DocumentSource::Encyclopedia {
                source: source.into(),
                page: None,
            },
            content: content.into(),
        }
    }

    /// 渲染为带来源标记的文档块
    pub fn render(&self) -> String {
        match &self.source {
            DocumentSource::Web { url } => {
                format!("<Document href=\"{}\"/>\n{}\n</Document>", url, self.content)
            }
            DocumentSource::Encyclopedia { source, page } => format!(
                "<Document source=\"{}\" page=\"{}\"/>\n{}\n</Document>",
                source,
                page.as_deref().unwrap_or_default(),
                self.content
            ),
        }
    }
}

/// 把一组文档合并为一个上下文块
pub fn format_documents(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(RetrievedDocument::render)
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

/// 检索服务
#[async_trait]
pub trait Retriever: Send + Sync {
    /// 服务名，用于日志
    fn name(&self) -> &str;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RetrievedDocument>>;
}

/// 按字符截断，避免切断多字节字符
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_web_document() {
        let doc = RetrievedDocument::web("https://example.com", "body");
        assert_eq!(
            doc.render(),
            "<Document href=\"https://example.com\"/>\nbody\n</Document>"
        );
    }

    #[test]
    fn test_render_encyclopedia_document_without_page() {
        let doc = RetrievedDocument::encyclopedia("https://en.wikipedia.org/wiki/Rust", "text");
        assert_eq!(
            doc.render(),
            "<Document source=\"https://en.wikipedia.org/wiki/Rust\" page=\"\"/>\ntext\n</Document>"
        );
    }

    #[test]
    fn test_format_documents_joins_with_separator() {
        let docs = vec![
            RetrievedDocument::web("a", "1"),
            RetrievedDocument::web("b", "2"),
        ];
        let formatted = format_documents(&docs);
        assert_eq!(formatted.matches(DOCUMENT_SEPARATOR).count(), 1);
        assert!(formatted.starts_with("<Document href=\"a\"/>"));
        assert_eq!(format_documents(&[]), "");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("研究报告", 2), "研究");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}

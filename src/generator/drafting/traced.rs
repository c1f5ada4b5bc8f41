use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use super::{DraftingOperation, ResearchDrafter};
use crate::telemetry::{LlmCallRecord, TelemetrySink};
use crate::types::{Analyst, Message};

/// 为每次起草调用记录请求、响应与耗时，结果原样返回
pub struct TracedDrafter {
    inner: Arc<dyn ResearchDrafter>,
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl TracedDrafter {
    pub fn new(inner: Arc<dyn ResearchDrafter>, sinks: Vec<Arc<dyn TelemetrySink>>) -> Self {
        Self { inner, sinks }
    }

    async fn traced<T, Fut>(&self, operation: DraftingOperation, request: Value, call: Fut) -> Result<T>
    where
        T: Serialize,
        Fut: Future<Output = Result<T>> + Send,
    {
        let started = Instant::now();
        let result = call.await;

        let (response, error) = match &result {
            Ok(value) => (Some(serde_json::to_value(value).unwrap_or(Value::Null)), None),
            Err(e) => (None, Some(format!("{:#}", e))),
        };
        let record = LlmCallRecord {
            operation: operation.as_str().to_string(),
            request,
            response,
            error,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        };

        for sink in &self.sinks {
            if let Err(e) = sink.record(&record).await {
                tracing::warn!(operation = %operation, error = %e, "telemetry sink failed");
            }
        }
        result
    }
}

#[async_trait]
impl ResearchDrafter for TracedDrafter {
    async fn create_analysts(
        &self,
        topic: &str,
        max_analysts: usize,
        human_feedback: Option<&str>,
    ) -> Result<Vec<Analyst>> {
        self.traced(
            DraftingOperation::CreateAnalysts,
            json!({"topic": topic, "max_analysts": max_analysts, "human_feedback": human_feedback}),
            self.inner.create_analysts(topic, max_analysts, human_feedback),
        )
        .await
    }

    async fn generate_question(&self, analyst: &Analyst, messages: &[Message]) -> Result<String> {
        self.traced(
            DraftingOperation::GenerateQuestion,
            json!({"analyst": analyst, "messages": messages}),
            self.inner.generate_question(analyst, messages),
        )
        .await
    }

    async fn generate_search_query(&self, messages: &[Message]) -> Result<String> {
        self.traced(
            DraftingOperation::GenerateSearchQuery,
            json!({"messages": messages}),
            self.inner.generate_search_query(messages),
        )
        .await
    }

    async fn generate_answer(
        &self,
        analyst: &Analyst,
        context: &str,
        messages: &[Message],
    ) -> Result<String> {
        self.traced(
            DraftingOperation::GenerateAnswer,
            json!({"analyst": analyst, "context": context, "messages": messages}),
            self.inner.generate_answer(analyst, context, messages),
        )
        .await
    }

    async fn write_section(
        &self,
        analyst: &Analyst,
        context: &str,
        interview: &str,
    ) -> Result<String> {
        self.traced(
            DraftingOperation::WriteSection,
            json!({"analyst": analyst, "context": context, "interview": interview}),
            self.inner.write_section(analyst, context, interview),
        )
        .await
    }

    async fn write_report(&self, topic: &str, sections: &str) -> Result<String> {
        self.traced(
            DraftingOperation::WriteReport,
            json!({"topic": topic, "sections": sections}),
            self.inner.write_report(topic, sections),
        )
        .await
    }

    async fn write_introduction(&self, topic: &str, sections: &str) -> Result<String> {
        self.traced(
            DraftingOperation::WriteIntroduction,
            json!({"topic": topic, "sections": sections}),
            self.inner.write_introduction(topic, sections),
        )
        .await
    }

    async fn write_conclusion(&self, topic: &str, sections: &str) -> Result<String> {
        self.traced(
            DraftingOperation::WriteConclusion,
            json!({"topic": topic, "sections": sections}),
            self.inner.write_conclusion(topic, sections),
        )
        .await
    }
}

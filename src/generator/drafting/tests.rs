use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use super::*;
use crate::generator::fakes::{ScriptedDrafter, analyst};
use crate::telemetry::{JsonlSink, LlmCallRecord, TelemetrySink};

/// 收集记录的接收端
#[derive(Default)]
struct CollectingSink {
    records: Mutex<Vec<LlmCallRecord>>,
}

#[async_trait]
impl TelemetrySink for CollectingSink {
    async fn record(&self, record: &LlmCallRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

struct BrokenSink;

#[async_trait]
impl TelemetrySink for BrokenSink {
    async fn record(&self, _record: &LlmCallRecord) -> Result<()> {
        Err(anyhow!("disk full"))
    }
}

#[test]
fn test_operation_names_are_unique() {
    let mut names: Vec<&str> = DraftingOperation::ALL.iter().map(|op| op.as_str()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 8);
    assert_eq!(DraftingOperation::WriteSection.to_string(), "write_section");
}

#[tokio::test]
async fn test_traced_drafter_records_success() {
    let sink = Arc::new(CollectingSink::default());
    let sinks: Vec<Arc<dyn TelemetrySink>> = vec![sink.clone()];
    let drafter = TracedDrafter::new(Arc::new(ScriptedDrafter::default()), sinks);

    let analysts = drafter.create_analysts("Rust", 3, None).await.unwrap();
    assert_eq!(analysts, vec![analyst("Ada"), analyst("Grace")]);

    let records = sink.records.lock().unwrap().clone();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].operation, "create_analysts");
    assert_eq!(records[0].request["topic"], "Rust");
    assert_eq!(records[0].request["max_analysts"], 3);
    assert_eq!(records[0].response.as_ref().unwrap()[0]["name"], "Ada");
    assert!(records[0].error.is_none());
}

#[tokio::test]
async fn test_traced_drafter_records_errors_and_propagates() {
    let sink = Arc::new(CollectingSink::default());
    let inner = ScriptedDrafter {
        failing: vec!["Ada".to_string()],
        ..Default::default()
    };
    let sinks: Vec<Arc<dyn TelemetrySink>> = vec![sink.clone()];
    let drafter = TracedDrafter::new(Arc::new(inner), sinks);

    let err = drafter
        .generate_question(&analyst("Ada"), &[])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("question service down"));

    let records = sink.records.lock().unwrap().clone();
    assert_eq!(records[0].operation, "generate_question");
    assert!(records[0].response.is_none());
    assert!(records[0].error.as_deref().unwrap().contains("question service down"));
}

#[tokio::test]
async fn test_sink_failure_does_not_change_result() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("calls.jsonl");
    let sinks: Vec<Arc<dyn TelemetrySink>> =
        vec![Arc::new(BrokenSink), Arc::new(JsonlSink::new(&path))];
    let drafter = TracedDrafter::new(Arc::new(ScriptedDrafter::default()), sinks);

    let conclusion = drafter.write_conclusion("Rust", "sections").await.unwrap();
    assert_eq!(conclusion, "## Conclusion\nOutro");

    // 后续的接收端仍然收到记录
    let content = std::fs::read_to_string(&path).unwrap();
    let record: LlmCallRecord = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(record.operation, "write_conclusion");
    assert_eq!(record.response, Some(serde_json::json!("## Conclusion\nOutro")));
}

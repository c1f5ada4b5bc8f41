use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use research_panel::config::Config;
use research_panel::generator::context::GeneratorContext;
use research_panel::generator::drafting::ResearchDrafter;
use research_panel::generator::drafting::prompts::INTERVIEW_CLOSING_PHRASE;
use research_panel::generator::workflow::{RunRequest, RunSummary, TimingScope, run_research};
use research_panel::graph::{Checkpointer, FileCheckpointer};
use research_panel::retrieval::{RetrievedDocument, Retriever};
use research_panel::types::{Analyst, Message, get_buffer_string};

/// 第二个问题即为结束语的起草服务
#[derive(Default)]
struct PanelDrafter {
    answer_contexts: Mutex<Vec<String>>,
}

fn panelist(name: &str, role: &str) -> Analyst {
    Analyst {
        name: name.to_string(),
        role: role.to_string(),
        affiliation: "Integration Lab".to_string(),
        description: format!("{} cares about {}", name, role),
    }
}

#[async_trait]
impl ResearchDrafter for PanelDrafter {
    async fn create_analysts(
        &self,
        _topic: &str,
        max_analysts: usize,
        human_feedback: Option<&str>,
    ) -> Result<Vec<Analyst>> {
        let mut analysts = vec![
            panelist("Mara", "Security"),
            panelist("Ivo", "Performance"),
            panelist("Noor", "Tooling"),
        ];
        if human_feedback.is_some() {
            analysts.push(panelist("Rui", "Economics"));
        }
        analysts.truncate(max_analysts);
        Ok(analysts)
    }

    async fn generate_question(&self, analyst: &Analyst, messages: &[Message]) -> Result<String> {
        if messages.len() > 1 {
            return Ok(format!("{}, {}.", INTERVIEW_CLOSING_PHRASE, analyst.name));
        }
        Ok(format!("What worries you about {}?", analyst.role))
    }

    async fn generate_search_query(&self, messages: &[Message]) -> Result<String> {
        Ok(messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default())
    }

    async fn generate_answer(
        &self,
        _analyst: &Analyst,
        context: &str,
        _messages: &[Message],
    ) -> Result<String> {
        self.answer_contexts.lock().unwrap().push(context.to_string());
        Ok("It depends on the workload [1].".to_string())
    }

    async fn write_section(
        &self,
        analyst: &Analyst,
        _context: &str,
        interview: &str,
    ) -> Result<String> {
        Ok(format!(
            "## {}\n{}",
            analyst.role,
            interview.lines().next().unwrap_or_default()
        ))
    }

    async fn write_report(&self, _topic: &str, sections: &str) -> Result<String> {
        let count = sections.matches("## ").count();
        Ok(format!(
            "## Insights\nCombined {} memos [1]\n## Sources\n[1] https://docs.example.org",
            count
        ))
    }

    async fn write_introduction(&self, topic: &str, _sections: &str) -> Result<String> {
        Ok(format!("# {}\n\n## Introduction\nWhy it matters.", topic))
    }

    async fn write_conclusion(&self, _topic: &str, _sections: &str) -> Result<String> {
        Ok("## Conclusion\nWhat to do next.".to_string())
    }
}

struct FixedRetriever {
    documents: Vec<RetrievedDocument>,
}

#[async_trait]
impl Retriever for FixedRetriever {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<RetrievedDocument>> {
        Ok(self.documents.iter().take(max_results).cloned().collect())
    }
}

/// 每次调用都新建检查点实例，模拟新的进程
fn fresh_context(config: &Config, drafter: Arc<PanelDrafter>) -> GeneratorContext {
    let checkpointer: Arc<dyn Checkpointer> = Arc::new(FileCheckpointer::new(config.threads_dir()));
    GeneratorContext::with_services(
        config.clone(),
        drafter,
        Arc::new(FixedRetriever {
            documents: vec![RetrievedDocument::web(
                "https://docs.example.org",
                "Workloads vary.",
            )],
        }),
        Arc::new(FixedRetriever {
            documents: vec![RetrievedDocument::encyclopedia(
                "https://en.wikipedia.org/wiki/Concurrency",
                "Concurrency is about structure.",
            )],
        }),
        checkpointer,
    )
}

#[tokio::test]
async fn test_suspend_and_resume_across_instances() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        topic: Some("Async Rust in Production".to_string()),
        max_analysts: 3,
        max_turns: 3,
        output_path: temp_dir.path().join("reports"),
        internal_path: temp_dir.path().join(".research"),
        ..Default::default()
    };
    let drafter = Arc::new(PanelDrafter::default());

    let first = fresh_context(&config, drafter.clone());
    let summary = run_research(&first, &RunRequest::default(), None, &mut TimingScope::new())
        .await
        .unwrap();
    let RunSummary::Suspended { thread_id } = summary else {
        panic!("expected the run to suspend, got {:?}", summary);
    };
    assert!(
        config
            .threads_dir()
            .join(format!("{}.json", thread_id))
            .exists()
    );
    drop(first);

    // 新实例中提交修订意见，重新生成后再次挂起
    let second = fresh_context(&config, drafter.clone());
    let request = RunRequest {
        thread_id: Some(thread_id.clone()),
        feedback: Some("include an economist".to_string()),
        ..Default::default()
    };
    let summary = run_research(&second, &request, None, &mut TimingScope::new())
        .await
        .unwrap();
    assert_eq!(
        summary,
        RunSummary::Suspended {
            thread_id: thread_id.clone()
        }
    );

    let third = fresh_context(&config, drafter.clone());
    let request = RunRequest {
        thread_id: Some(thread_id.clone()),
        feedback: Some("approve".to_string()),
        ..Default::default()
    };
    let summary = run_research(&third, &request, None, &mut TimingScope::new())
        .await
        .unwrap();

    let RunSummary::Finished {
        report_path,
        failed_interviews,
        ..
    } = summary
    else {
        panic!("expected the run to finish, got {:?}", summary);
    };
    assert_eq!(failed_interviews, 0);
    assert_eq!(
        report_path,
        temp_dir
            .path()
            .join("reports")
            .join("research_report_async_rust_in_production.md")
    );

    let report = std::fs::read_to_string(&report_path).unwrap();
    assert_eq!(
        report,
        "# Async Rust in Production\n\n## Introduction\nWhy it matters.\n\n---\n\n\nCombined 3 memos [1]\n\n---\n\n## Conclusion\nWhat to do next.\n\n## Sources\n[1] https://docs.example.org"
    );

    // 结束语也会得到一次回答，之后访谈结束
    let contexts = drafter.answer_contexts.lock().unwrap().clone();
    assert_eq!(contexts.len(), 6);
    assert!(contexts.iter().all(|c| c.contains("Workloads vary.")));
    assert!(
        contexts
            .iter()
            .all(|c| c.contains("Concurrency is about structure."))
    );
}

#[test]
fn test_transcript_rendering_is_public() {
    let transcript = get_buffer_string(&[
        Message::human("So you said you were writing an article on Rust?"),
        Message::ai("Indeed.").with_name("expert"),
    ]);
    assert_eq!(
        transcript,
        "Human: So you said you were writing an article on Rust?\nAI: Indeed."
    );
}

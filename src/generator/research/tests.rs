use std::sync::Arc;

use super::report::{finalize_report, split_sources};
use super::*;
use crate::config::{Config, InterviewFailurePolicy};
use crate::generator::fakes::{ScriptedDrafter, analyst, test_context};
use crate::graph::{GraphError, GraphState, RunOutcome};
use crate::types::Message;

#[test]
fn test_finalize_report_with_sources() {
    let report = finalize_report(
        "Intro",
        "## Insights\nBody [1]\n## Sources\n[1] https://a",
        "Outro",
    );
    assert_eq!(
        report,
        "Intro\n\n---\n\n\nBody [1]\n\n---\n\nOutro\n\n## Sources\n[1] https://a"
    );
}

#[test]
fn test_finalize_report_without_sources() {
    let report = finalize_report("I", "Body only", "C");
    assert_eq!(report, "I\n\n---\n\nBody only\n\n---\n\nC");
    assert!(!report.contains("## Sources"));
}

#[test]
fn test_sources_heading_without_delimiter_stays_in_body() {
    let body = "## Sources appears without newline-delimited form";
    let report = finalize_report("I", body, "C");
    assert_eq!(report, format!("I\n\n---\n\n{}\n\n---\n\nC", body));
    assert!(report.ends_with("\n\n---\n\nC"));
}

#[test]
fn test_insights_prefix_and_sources_are_rearranged() {
    let report = finalize_report("I", "## Insights extra\n## Sources\nSRC", "C");
    assert_eq!(report, "I\n\n---\n\n extra\n\n---\n\nC\n\n## Sources\nSRC");
    assert!(report.ends_with("\n\n## Sources\nSRC"));
}

#[test]
fn test_insights_header_only_stripped_as_prefix() {
    let report = finalize_report("I", "Text\n## Insights\nmore", "C");
    assert!(report.contains("Text\n## Insights\nmore"));
}

#[test]
fn test_finalize_report_is_deterministic() {
    let a = finalize_report("I", "## Insights\nB\n## Sources\nS", "C");
    let b = finalize_report("I", "## Insights\nB\n## Sources\nS", "C");
    assert_eq!(a, b);
}

#[test]
fn test_split_sources_uses_first_delimiter() {
    let (body, sources) = split_sources("a\n## Sources\nb\n## Sources\nc");
    assert_eq!(body, "a");
    assert_eq!(sources, Some("b\n## Sources\nc"));
    assert_eq!(split_sources("no sources"), ("no sources", None));
}

#[test]
fn test_approval_detection() {
    assert!(is_approval("approve"));
    assert!(is_approval("  APPROVE \n"));
    assert!(!is_approval(""));
    assert!(!is_approval("   "));
    assert!(!is_approval("approve but add an economist"));
}

#[test]
fn test_initiate_all_interviews_routes() {
    let mut state = ResearchState::new("Rust", 3);
    state.analysts = vec![analyst("Ada"), analyst("Grace")];

    match initiate_all_interviews(&state, 4) {
        FeedbackRoute::Dispatch(packets) => {
            assert_eq!(packets.len(), 2);
            assert_eq!(packets[1].analyst.name, "Grace");
            assert_eq!(packets[0].max_num_turns, 4);
            assert_eq!(
                packets[0].messages,
                vec![Message::human("So you said you were writing an article on Rust?")]
            );
        }
        other => panic!("unexpected route: {:?}", other),
    }

    state.human_analyst_feedback = Some("Approve".to_string());
    assert!(matches!(initiate_all_interviews(&state, 2), FeedbackRoute::Dispatch(_)));

    state.human_analyst_feedback = Some("add a regulator".to_string());
    assert_eq!(initiate_all_interviews(&state, 2), FeedbackRoute::Regenerate);

    // 空白意见不是通过
    state.human_analyst_feedback = Some(" ".to_string());
    assert_eq!(initiate_all_interviews(&state, 2), FeedbackRoute::Regenerate);

    state.human_analyst_feedback = None;
    state.analysts.clear();
    assert_eq!(initiate_all_interviews(&state, 2), FeedbackRoute::Finish);
}

#[test]
fn test_research_state_reducers() {
    let mut state = ResearchState::new("Rust", 3);
    state.apply(ResearchUpdate {
        analysts: Some(vec![analyst("Ada")]),
        sections: vec!["s1".to_string()],
        ..Default::default()
    });
    state.apply(ResearchUpdate {
        analysts: Some(vec![analyst("Grace"), analyst("Linus")]),
        sections: vec!["s2".to_string()],
        ..Default::default()
    });
    assert_eq!(state.analysts.len(), 2);
    assert_eq!(state.sections, vec!["s1", "s2"]);
    assert_eq!(state.joined_sections(), "s1\n\ns2");

    state.apply(ResearchUpdate::feedback("approve"));
    assert_eq!(state.human_analyst_feedback.as_deref(), Some("approve"));
    state.apply(ResearchUpdate::default());
    assert_eq!(state.human_analyst_feedback.as_deref(), Some("approve"));
    state.apply(ResearchUpdate {
        feedback: FeedbackUpdate::Clear,
        ..Default::default()
    });
    assert!(state.human_analyst_feedback.is_none());
}

#[tokio::test]
async fn test_suspends_before_feedback_then_completes() {
    let drafter = Arc::new(ScriptedDrafter::default());
    let context = test_context(drafter.clone(), Config::default());
    let graph = build_research_graph(&context).unwrap();

    let outcome = graph.start("run", ResearchState::new("Rust", 3)).await.unwrap();
    match outcome {
        RunOutcome::Interrupted { state, next } => {
            assert_eq!(next, vec![HUMAN_FEEDBACK]);
            assert_eq!(state.analysts.len(), 2);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(drafter.count("generate_question"), 0);

    graph
        .update_state("run", ResearchUpdate::feedback("approve"))
        .await
        .unwrap();
    let state = match graph.resume("run").await.unwrap() {
        RunOutcome::Completed(state) => state,
        other => panic!("unexpected outcome: {:?}", other),
    };

    assert_eq!(state.sections.len(), 2);
    assert!(state.failed_interviews.is_empty());
    assert_eq!(drafter.count("write_report"), 1);
    assert_eq!(drafter.count("write_introduction"), 1);
    assert_eq!(drafter.count("write_conclusion"), 1);
    assert_eq!(
        state.final_report.as_deref(),
        Some(
            "# Rust\n\n## Introduction\nIntro\n\n---\n\n\nBody [1]\n\n---\n\n## Conclusion\nOutro\n\n## Sources\n[1] https://example.com"
        )
    );
}

#[tokio::test]
async fn test_revision_feedback_regenerates_and_suspends_again() {
    let drafter = Arc::new(ScriptedDrafter::default());
    let context = test_context(drafter.clone(), Config::default());
    let graph = build_research_graph(&context).unwrap();

    graph.start("rev", ResearchState::new("Rust", 3)).await.unwrap();
    graph
        .update_state("rev", ResearchUpdate::feedback("add a systems programmer"))
        .await
        .unwrap();

    match graph.resume("rev").await.unwrap() {
        RunOutcome::Interrupted { state, next } => {
            assert_eq!(next, vec![HUMAN_FEEDBACK]);
            assert_eq!(state.analysts, vec![analyst("Linus")]);
            assert!(state.human_analyst_feedback.is_none());
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(
        drafter
            .calls()
            .contains(&"create_analysts:Rust:Some(\"add a systems programmer\")".to_string())
    );

    // 不再提交意见直接继续，视为通过
    let state = match graph.resume("rev").await.unwrap() {
        RunOutcome::Completed(state) => state,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(state.sections.len(), 1);
    assert!(state.sections[0].contains("Linus"));
}

#[tokio::test]
async fn test_partial_results_policy_records_failures() {
    let drafter = Arc::new(ScriptedDrafter {
        failing: vec!["Grace".to_string()],
        ..Default::default()
    });
    let config = Config {
        interrupt_before_dispatch: false,
        ..Default::default()
    };
    let context = test_context(drafter, config);
    let graph = build_research_graph(&context).unwrap();

    let state = match graph.start("partial", ResearchState::new("Rust", 3)).await.unwrap() {
        RunOutcome::Completed(state) => state,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(state.sections.len(), 1);
    assert_eq!(state.failed_interviews.len(), 1);
    assert_eq!(state.failed_interviews[0].analyst, "Grace");
    assert!(state.failed_interviews[0].error.contains("question service down"));
    assert_eq!(
        state.sections.len() + state.failed_interviews.len(),
        state.analysts.len()
    );
    assert!(state.final_report.is_some());
}

#[tokio::test]
async fn test_fail_fast_policy_aborts_and_keeps_checkpoint() {
    let drafter = Arc::new(ScriptedDrafter {
        failing: vec!["Grace".to_string()],
        ..Default::default()
    });
    let config = Config {
        interrupt_before_dispatch: false,
        interview_failure_policy: InterviewFailurePolicy::FailFast,
        ..Default::default()
    };
    let context = test_context(drafter, config);
    let graph = build_research_graph(&context).unwrap();

    let err = graph
        .start("fast", ResearchState::new("Rust", 3))
        .await
        .unwrap_err();
    match err {
        GraphError::NodeFailed { node, .. } => assert_eq!(node, CONDUCT_INTERVIEW),
        other => panic!("unexpected error: {:?}", other),
    }

    let snapshot = graph.get_state("fast").await.unwrap().unwrap();
    assert_eq!(snapshot.next, vec![CONDUCT_INTERVIEW]);
    assert!(snapshot.values.sections.is_empty());
    assert!(snapshot.values.final_report.is_none());
}

#[tokio::test]
async fn test_initial_revision_without_interrupt_runs_once() {
    let drafter = Arc::new(ScriptedDrafter::default());
    let config = Config {
        interrupt_before_dispatch: false,
        ..Default::default()
    };
    let context = test_context(drafter.clone(), config);
    let graph = build_research_graph(&context).unwrap();

    let input = ResearchState::new("Rust", 3).with_feedback(Some("more tooling".to_string()));
    let state = match graph.start("direct", input).await.unwrap() {
        RunOutcome::Completed(state) => state,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(drafter.count("create_analysts"), 1);
    assert_eq!(state.analysts, vec![analyst("Linus")]);
    assert!(state.final_report.is_some());
}

#[tokio::test]
async fn test_empty_panel_finishes_without_report() {
    let drafter = Arc::new(ScriptedDrafter {
        analysts: Vec::new(),
        ..Default::default()
    });
    let config = Config {
        interrupt_before_dispatch: false,
        ..Default::default()
    };
    let context = test_context(drafter.clone(), config);
    let graph = build_research_graph(&context).unwrap();

    let state = match graph.start("empty", ResearchState::new("Rust", 3)).await.unwrap() {
        RunOutcome::Completed(state) => state,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert!(state.final_report.is_none());
    assert_eq!(drafter.count("write_report"), 0);
}

#[tokio::test]
async fn test_oversized_panel_is_truncated() {
    let drafter = Arc::new(ScriptedDrafter {
        analysts: vec![analyst("A"), analyst("B"), analyst("C")],
        ..Default::default()
    });
    let context = test_context(drafter.clone(), Config::default());
    let graph = build_research_graph(&context).unwrap();

    match graph.start("trim", ResearchState::new("Rust", 2)).await.unwrap() {
        RunOutcome::Interrupted { state, .. } => {
            assert_eq!(state.analysts, vec![analyst("A"), analyst("B")]);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

use crate::config::Config;
use crate::generator::context::GeneratorContext;
use crate::generator::outlet::{DiskOutlet, Outlet};
use crate::generator::research::{
    HUMAN_FEEDBACK, ResearchState, ResearchUpdate, build_research_graph,
};
use crate::graph::{CompiledGraph, RunOutcome};
use crate::types::Analyst;

use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<String, Instant>,
    /// 按结束顺序记录
    phase_durations: Vec<(String, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .insert(phase_name.to_string(), Instant::now());
    }

    /// 结束一个阶段的计时，同名阶段多次出现时累加
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let duration = self.phase_start_times.remove(phase_name)?.elapsed();
        match self
            .phase_durations
            .iter_mut()
            .find(|(name, _)| name == phase_name)
        {
            Some((_, total)) => *total += duration,
            None => self
                .phase_durations
                .push((phase_name.to_string(), duration)),
        }
        Some(duration)
    }

    pub fn phase_duration(&self, phase_name: &str) -> Option<Duration> {
        self.phase_durations
            .iter()
            .find(|(name, _)| name == phase_name)
            .map(|(_, duration)| *duration)
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.start_time.elapsed().as_secs_f64()
        );

        if !self.phase_durations.is_empty() {
            report.push_str("\n各阶段执行时间:\n");
            for (phase, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}秒\n", phase, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const CONNECTION_CHECK: &'static str = "connection_check";
    pub const RESEARCH: &'static str = "research";
    pub const HUMAN_REVIEW: &'static str = "human_review";
    pub const OUTPUT: &'static str = "output";
}

/// 一次命令行调用要做的事
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// 已有线程ID，存在检查点时继续执行
    pub thread_id: Option<String>,
    /// 审阅意见，"approve"表示通过
    pub feedback: Option<String>,
    /// 只查看线程状态
    pub status: bool,
    /// 挂起时在终端询问审阅意见
    pub interactive: bool,
    pub skip_connection_check: bool,
}

/// 运行结束时的状态
#[derive(Debug, Clone, PartialEq)]
pub enum RunSummary {
    /// 在人工审阅点挂起
    Suspended { thread_id: String },
    /// 报告已写入磁盘
    Finished {
        thread_id: String,
        report_path: PathBuf,
        failed_interviews: usize,
    },
}

/// 交互模式下审阅意见的来源
pub trait FeedbackSource {
    fn next_feedback(&mut self, state: &ResearchState) -> Result<String>;
}

/// 从标准输入读取一行审阅意见
pub struct StdinFeedback;

impl FeedbackSource for StdinFeedback {
    fn next_feedback(&mut self, _state: &ResearchState) -> Result<String> {
        print!("📝 请输入审阅意见（直接回车或输入approve表示通过）: ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("读取审阅意见失败")?;
        // 直接回车视为通过
        let feedback = line.trim();
        if feedback.is_empty() {
            Ok("approve".to_string())
        } else {
            Ok(feedback.to_string())
        }
    }
}

/// 启动调研工作流
pub async fn launch(config: &Config, request: &RunRequest) -> Result<()> {
    let mut timing = TimingScope::new();
    let context = GeneratorContext::new(config.clone())?;

    if request.status {
        return print_status(&context, request).await;
    }

    // 启动时检查模型连接
    if !request.skip_connection_check
        && let Some(llm_client) = &context.llm_client
    {
        timing.start_phase(TimingKeys::CONNECTION_CHECK);
        llm_client.check_connection().await?;
        timing.end_phase(TimingKeys::CONNECTION_CHECK);
    }

    let mut stdin = StdinFeedback;
    let feedback_source: Option<&mut dyn FeedbackSource> = if request.interactive {
        Some(&mut stdin)
    } else {
        None
    };

    println!("🌐 报告语言: {}", config.target_language.display_name());
    run_research(&context, request, feedback_source, &mut timing).await?;

    if config.verbose {
        println!("\n{}", timing.generate_timing_report());
        if let Some(cache_manager) = &context.cache_manager {
            let report = cache_manager.generate_performance_report();
            println!(
                "📦 缓存命中 {} 次，未命中 {} 次，命中率 {:.1}%，节省约 {:.1} 秒",
                report.cache_hits,
                report.cache_misses,
                report.hit_rate * 100.0,
                report.inference_time_saved
            );
        }
    }
    Ok(())
}

/// 按请求开始或继续一个线程，直到完成或挂起
pub async fn run_research(
    context: &GeneratorContext,
    request: &RunRequest,
    mut feedback_source: Option<&mut dyn FeedbackSource>,
    timing: &mut TimingScope,
) -> Result<RunSummary> {
    let graph = build_research_graph(context)?;

    let existing = match &request.thread_id {
        Some(thread_id) => graph
            .get_state(thread_id)
            .await?
            .map(|snapshot| (thread_id.clone(), snapshot)),
        None => None,
    };

    timing.start_phase(TimingKeys::RESEARCH);
    let (thread_id, mut outcome) = match existing {
        Some((thread_id, snapshot)) => {
            println!("🔁 继续执行线程: {}", thread_id);
            let awaiting_review = snapshot.next.iter().any(|node| node == HUMAN_FEEDBACK);
            match &request.feedback {
                // 没有审阅意见时停留在审阅点
                None if awaiting_review => {
                    let outcome = RunOutcome::Interrupted {
                        state: snapshot.values,
                        next: snapshot.next,
                    };
                    (thread_id, outcome)
                }
                Some(feedback) => {
                    let outcome =
                        resume_with_feedback(&graph, &thread_id, feedback.clone()).await?;
                    (thread_id, outcome)
                }
                None => {
                    let outcome = graph.resume(&thread_id).await?;
                    (thread_id, outcome)
                }
            }
        }
        None => {
            let topic = context
                .config
                .topic
                .clone()
                .filter(|topic| !topic.trim().is_empty())
                .ok_or_else(|| anyhow!("缺少调研主题，请通过--topic或配置文件指定"))?;
            let thread_id = request
                .thread_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            println!("🚀 开始调研: {} (线程: {})", topic, thread_id);

            let input = ResearchState::new(topic, context.config.max_analysts)
                .with_feedback(request.feedback.clone());
            let outcome = graph.start(&thread_id, input).await?;
            (thread_id, outcome)
        }
    };

    loop {
        match outcome {
            RunOutcome::Interrupted { state, next } => {
                timing.end_phase(TimingKeys::RESEARCH);
                tracing::debug!(thread = %thread_id, next = ?next, "run suspended");
                print_panel(&state.analysts);

                let Some(source) = feedback_source.as_deref_mut() else {
                    print_resume_hint(&thread_id);
                    return Ok(RunSummary::Suspended { thread_id });
                };

                timing.start_phase(TimingKeys::HUMAN_REVIEW);
                let feedback = source.next_feedback(&state)?;
                timing.end_phase(TimingKeys::HUMAN_REVIEW);

                timing.start_phase(TimingKeys::RESEARCH);
                outcome = resume_with_feedback(&graph, &thread_id, feedback).await?;
            }
            RunOutcome::Completed(state) => {
                timing.end_phase(TimingKeys::RESEARCH);
                return write_report(context, thread_id, state, timing).await;
            }
        }
    }
}

async fn resume_with_feedback(
    graph: &CompiledGraph<ResearchState>,
    thread_id: &str,
    feedback: String,
) -> Result<RunOutcome<ResearchState>> {
    graph
        .update_state(thread_id, ResearchUpdate::feedback(feedback))
        .await?;
    Ok(graph.resume(thread_id).await?)
}

async fn write_report(
    context: &GeneratorContext,
    thread_id: String,
    state: ResearchState,
    timing: &mut TimingScope,
) -> Result<RunSummary> {
    let report = state
        .final_report
        .as_deref()
        .ok_or_else(|| anyhow!("运行已结束但没有生成最终报告（分析师列表为空？）"))?;

    for failure in &state.failed_interviews {
        eprintln!("⚠️ 访谈 {} 未完成: {}", failure.analyst, failure.error);
    }

    timing.start_phase(TimingKeys::OUTPUT);
    let outlet = DiskOutlet::new(&context.config.output_path);
    let report_path = outlet.save(&state.topic, report).await?;
    timing.end_phase(TimingKeys::OUTPUT);

    println!("🎉 调研完成，共 {} 个章节", state.sections.len());
    Ok(RunSummary::Finished {
        thread_id,
        report_path,
        failed_interviews: state.failed_interviews.len(),
    })
}

async fn print_status(context: &GeneratorContext, request: &RunRequest) -> Result<()> {
    let thread_id = request
        .thread_id
        .as_deref()
        .ok_or_else(|| anyhow!("查看状态需要指定--thread-id"))?;
    let graph = build_research_graph(context)?;
    let snapshot = graph
        .get_state(thread_id)
        .await?
        .ok_or_else(|| anyhow!("未找到线程 {}", thread_id))?;

    let values = &snapshot.values;
    println!("📋 线程: {}", thread_id);
    println!("   主题: {}", values.topic);
    println!("   已执行步数: {}", snapshot.step);
    println!("   更新时间: {}", snapshot.created_at.to_rfc3339());
    if snapshot.next.is_empty() {
        println!("   下一步: (已结束)");
    } else {
        println!("   下一步: {}", snapshot.next.join(", "));
    }
    println!("   分析师: {}", values.analysts.len());
    println!("   已完成章节: {}", values.sections.len());
    println!("   失败访谈: {}", values.failed_interviews.len());
    println!(
        "   最终报告: {}",
        if values.final_report.is_some() { "已生成" } else { "未生成" }
    );
    if let Some(feedback) = &values.human_analyst_feedback {
        println!("   审阅意见: {}", feedback);
    }
    Ok(())
}

fn print_panel(analysts: &[Analyst]) {
    println!("\n👥 当前分析师团队:");
    for analyst in analysts {
        println!("  - {} ({}, {})", analyst.name, analyst.role, analyst.affiliation);
        println!("    {}", analyst.description);
    }
}

fn print_resume_hint(thread_id: &str) {
    println!("\n⏸️ 已在人工审阅前挂起，线程ID: {}", thread_id);
    println!(
        "💡 通过审阅: research-panel --thread-id {} --feedback approve",
        thread_id
    );
    println!(
        "💡 修订团队: research-panel --thread-id {} --feedback \"<修订意见>\"",
        thread_id
    );
}

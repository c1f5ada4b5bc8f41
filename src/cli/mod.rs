use crate::config::{Config, InterviewFailurePolicy, LLMProvider};
use crate::generator::workflow::RunRequest;
use crate::i18n::TargetLanguage;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Research Panel - 由Rust与AI驱动的多视角调研报告生成引擎
#[derive(Parser, Debug)]
#[command(name = "research-panel")]
#[command(
    about = "AI-based research engine. It assembles a panel of analysts for a topic, lets you review the panel, runs parallel expert interviews grounded in web and encyclopedia search, and writes a Markdown report."
)]
#[command(version)]
pub struct Args {
    /// 调研主题
    #[arg(short, long)]
    pub topic: Option<String>,

    /// 分析师数量上限
    #[arg(long)]
    pub max_analysts: Option<usize>,

    /// 每场访谈的最大问答轮数
    #[arg(long)]
    pub max_turns: Option<usize>,

    /// 审阅意见，"approve"表示通过，其余内容作为修订意见
    #[arg(short, long)]
    pub feedback: Option<String>,

    /// 线程ID，存在检查点时从挂起处继续
    #[arg(long)]
    pub thread_id: Option<String>,

    /// 只查看线程状态
    #[arg(long, requires = "thread_id")]
    pub status: bool,

    /// 挂起时在终端中输入审阅意见
    #[arg(short, long)]
    pub interactive: bool,

    /// 不在派发访谈前挂起
    #[arg(long)]
    pub no_interrupt: bool,

    /// 访谈失败策略 (partial_results, fail_fast)
    #[arg(long)]
    pub failure_policy: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 输出路径
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// LLM Provider (openai, deepseek, openrouter, anthropic, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 高能效模型，优先用于常规推理任务
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于长上下文任务以及efficient失效情况下的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 最大并发数
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// 报告目标语言 (zh, en, ja, ko, de, fr, ru)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 是否禁用缓存
    #[arg(long)]
    pub no_cache: bool,

    /// 跳过启动时的模型连接检查
    #[arg(long)]
    pub skip_connection_check: bool,
}

impl Args {
    /// 本次调用的运行请求
    pub fn run_request(&self) -> RunRequest {
        RunRequest {
            thread_id: self.thread_id.clone(),
            feedback: self.feedback.clone(),
            status: self.status,
            interactive: self.interactive,
            skip_connection_check: self.skip_connection_check,
        }
    }

    /// 加载配置文件并用命令行参数覆盖
    pub fn into_config(self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(topic) = self.topic {
            config.topic = Some(topic);
        }
        if let Some(max_analysts) = self.max_analysts {
            config.max_analysts = max_analysts;
        }
        if let Some(max_turns) = self.max_turns {
            config.max_turns = max_turns;
        }
        if self.no_interrupt {
            config.interrupt_before_dispatch = false;
        }
        if let Some(policy_str) = self.failure_policy {
            match policy_str.parse::<InterviewFailurePolicy>() {
                Ok(policy) => config.interview_failure_policy = policy,
                Err(_) => eprintln!(
                    "⚠️ 警告: 未知的访谈失败策略: {}，使用 {:?}",
                    policy_str, config.interview_failure_policy
                ),
            }
        }
        if let Some(output_path) = self.output_path {
            config.output_path = output_path;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用 {}",
                    provider_str, config.llm.provider
                );
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.llm.max_parallels = max_parallels;
        }

        // 目标语言配置
        if let Some(target_language_str) = self.target_language {
            if let Ok(target_language) = target_language_str.parse::<TargetLanguage>() {
                config.target_language = target_language;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的目标语言: {}，使用默认语言 (English)",
                    target_language_str
                );
            }
        }

        // 缓存配置
        if self.no_cache {
            config.cache.enabled = false;
        }

        if self.verbose {
            config.verbose = true;
        }

        Ok(config)
    }
}

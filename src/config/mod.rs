use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::i18n::TargetLanguage;

/// 默认配置文件名，位于当前工作目录
pub const DEFAULT_CONFIG_FILE: &str = "research.toml";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 单个访谈失败时的处理策略
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterviewFailurePolicy {
    /// 记录失败并继续，报告只包含成功的章节
    #[default]
    PartialResults,
    /// 任一访谈失败即终止整个运行
    FailFast,
}

impl std::str::FromStr for InterviewFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "partial_results" | "partial" => Ok(InterviewFailurePolicy::PartialResults),
            "fail_fast" => Ok(InterviewFailurePolicy::FailFast),
            _ => Err(format!("Unknown interview failure policy: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 调研主题
    pub topic: Option<String>,

    /// 分析师数量上限
    pub max_analysts: usize,

    /// 每场访谈的最大问答轮数
    pub max_turns: usize,

    /// 派发访谈前是否挂起等待人工审阅
    pub interrupt_before_dispatch: bool,

    pub interview_failure_policy: InterviewFailurePolicy,

    /// 报告输出目录
    pub output_path: PathBuf,

    /// 内部工作目录路径 (.research)，存放检查点与缓存
    pub internal_path: PathBuf,

    /// 目标语言
    pub target_language: TargetLanguage,

    /// 是否启用详细日志
    pub verbose: bool,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 缓存配置
    pub cache: CacheConfig,

    /// 检索配置
    pub search: SearchConfig,

    /// 调用记录配置
    pub telemetry: TelemetryConfig,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 高能效模型，用于常规推理任务
    pub model_efficient: String,

    /// 高质量模型，用于长上下文任务以及efficient失效情况下的兜底
    pub model_powerful: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,

    /// 同一superstep内的最大并发数
    pub max_parallels: usize,
}

/// 缓存配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// 是否启用缓存
    pub enabled: bool,

    /// 缓存目录
    pub cache_dir: PathBuf,

    /// 缓存过期时间（小时）
    pub expire_hours: u64,
}

/// 检索服务配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Tavily API KEY
    pub tavily_api_key: String,

    pub tavily_base_url: String,

    /// 网页检索返回的文档数
    pub web_max_results: usize,

    /// MediaWiki API地址
    pub wikipedia_api_url: String,

    /// 百科检索返回的文档数
    pub wikipedia_max_docs: usize,

    /// 单篇文档内容的最大字符数
    pub max_content_chars: usize,

    /// 超时时间（秒）
    pub timeout_seconds: u64,
}

/// 模型调用记录配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TelemetryConfig {
    /// 是否记录每次模型调用
    pub enabled: bool,

    /// JSON Lines格式的调用记录文件，为空时只输出到日志
    pub trace_file: Option<PathBuf>,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// 显式路径优先，其次当前目录下的research.toml，都没有时使用默认配置
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let default_path = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::from_file(&default_path)
        } else {
            Ok(Config::default())
        }
    }

    /// 检查点目录
    pub fn threads_dir(&self) -> PathBuf {
        self.internal_path.join("threads")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topic: None,
            max_analysts: 3,
            max_turns: 2,
            interrupt_before_dispatch: true,
            interview_failure_policy: InterviewFailurePolicy::default(),
            output_path: PathBuf::from("."),
            internal_path: PathBuf::from("./.research"),
            target_language: TargetLanguage::default(),
            verbose: false,
            llm: LLMConfig::default(),
            cache: CacheConfig::default(),
            search: SearchConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("RESEARCH_LLM_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .unwrap_or_default(),
            api_base_url: String::from("https://api.openai.com/v1"),
            model_efficient: String::from("gpt-4o-mini"),
            model_powerful: String::from("gpt-4o"),
            max_tokens: 4096,
            temperature: 0.0,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            timeout_seconds: 120,
            max_parallels: 4,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_dir: PathBuf::from(".research/cache"),
            expire_hours: 168,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tavily_api_key: std::env::var("TAVILY_API_KEY").unwrap_or_default(),
            tavily_base_url: String::from("https://api.tavily.com"),
            web_max_results: 3,
            wikipedia_api_url: String::from("https://en.wikipedia.org/w/api.php"),
            wikipedia_max_docs: 2,
            max_content_chars: 4000,
            timeout_seconds: 30,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trace_file: None,
        }
    }
}

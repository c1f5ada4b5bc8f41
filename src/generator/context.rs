use std::sync::Arc;

use anyhow::Result;

use crate::{
    cache::CacheManager,
    config::Config,
    generator::drafting::{LlmDrafter, ResearchDrafter, TracedDrafter},
    graph::checkpoint::{Checkpointer, FileCheckpointer},
    llm::client::LLMClient,
    retrieval::{Retriever, TavilySearch, WikipediaSearch},
    telemetry::{JsonlSink, TelemetrySink, TracingSink},
};

/// 工作流运行所需的配置与外部服务句柄
#[derive(Clone)]
pub struct GeneratorContext {
    /// 配置
    pub config: Config,
    /// 起草服务
    pub drafter: Arc<dyn ResearchDrafter>,
    /// 网页检索
    pub web_search: Arc<dyn Retriever>,
    /// 百科检索
    pub encyclopedia: Arc<dyn Retriever>,
    /// 检查点存储
    pub checkpointer: Arc<dyn Checkpointer>,
    /// 用于连接检查的LLM客户端，注入服务时为空
    pub llm_client: Option<LLMClient>,
    /// 模型响应缓存，注入服务时为空
    pub cache_manager: Option<Arc<CacheManager>>,
}

impl GeneratorContext {
    /// 按配置创建生产环境的服务
    pub fn new(config: Config) -> Result<Self> {
        let llm_client = LLMClient::new(config.llm.clone())?;
        let cache_manager = Arc::new(CacheManager::new(config.cache.clone()));
        let llm_drafter: Arc<dyn ResearchDrafter> = Arc::new(LlmDrafter::new(
            llm_client.clone(),
            cache_manager.clone(),
            config.target_language.clone(),
        ));

        let drafter: Arc<dyn ResearchDrafter> = if config.telemetry.enabled {
            let mut sinks: Vec<Arc<dyn TelemetrySink>> = vec![Arc::new(TracingSink)];
            if let Some(trace_file) = &config.telemetry.trace_file {
                sinks.push(Arc::new(JsonlSink::new(trace_file)));
            }
            Arc::new(TracedDrafter::new(llm_drafter, sinks))
        } else {
            llm_drafter
        };

        let web_search = Arc::new(TavilySearch::new(&config.search)?);
        let encyclopedia = Arc::new(WikipediaSearch::new(&config.search)?);
        let checkpointer = Arc::new(FileCheckpointer::new(config.threads_dir()));

        Ok(Self {
            config,
            drafter,
            web_search,
            encyclopedia,
            checkpointer,
            llm_client: Some(llm_client),
            cache_manager: Some(cache_manager),
        })
    }

    /// 使用外部注入的服务
    pub fn with_services(
        config: Config,
        drafter: Arc<dyn ResearchDrafter>,
        web_search: Arc<dyn Retriever>,
        encyclopedia: Arc<dyn Retriever>,
        checkpointer: Arc<dyn Checkpointer>,
    ) -> Self {
        Self {
            config,
            drafter,
            web_search,
            encyclopedia,
            checkpointer,
            llm_client: None,
            cache_manager: None,
        }
    }
}

use thiserror::Error;

/// 图引擎错误
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("图中未定义入口节点")]
    MissingEntry,

    #[error("未知节点: {0}")]
    UnknownNode(String),

    #[error("节点重复定义: {0}")]
    DuplicateNode(String),

    #[error("节点 `{0}` 的类型与任务不匹配")]
    NodeKindMismatch(String),

    #[error("节点 `{node}` 执行失败: {error:#}")]
    NodeFailed { node: String, error: anyhow::Error },

    #[error("单次执行超过最大步数限制 ({0})")]
    RecursionLimit(usize),

    #[error("使用中断点或线程ID时必须配置检查点存储")]
    CheckpointerRequired,

    #[error("未找到线程 `{0}` 的检查点")]
    ThreadNotFound(String),

    #[error("检查点存储失败: {0:#}")]
    Checkpoint(anyhow::Error),

    #[error("检查点序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
}

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// 图状态 - 每个字段的合并策略（reducer）由`apply`决定
pub trait GraphState: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 节点产出的局部更新
    type Update: Default + Send + 'static;

    /// fan-out分支节点的独立输入
    type Packet: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// 将局部更新合并进当前状态
    fn apply(&mut self, update: Self::Update);
}

/// 普通步骤节点，读取整个状态快照，返回局部更新
#[async_trait]
pub trait Node<S: GraphState>: Send + Sync {
    async fn run(&self, state: &S) -> Result<S::Update>;
}

/// fan-out分支节点，只能看到派发给自己的独立输入
#[async_trait]
pub trait BranchNode<S: GraphState>: Send + Sync {
    async fn run(&self, packet: S::Packet) -> Result<S::Update>;
}

/// 待执行任务，作为检查点中的执行游标被持久化
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Task<P> {
    /// 运行一个步骤节点
    Run(String),
    /// 携带独立输入运行一个分支节点
    Send { node: String, packet: P },
}

impl<P> Task<P> {
    pub fn node(&self) -> &str {
        match self {
            Task::Run(node) => node,
            Task::Send { node, .. } => node,
        }
    }
}

/// 条件边的跳转目标
#[derive(Debug, Clone, PartialEq)]
pub enum Goto<P> {
    Node(String),
    /// 为每个packet派发一个分支任务
    Send(String, Vec<P>),
    End,
}

impl<P> Goto<P> {
    pub fn node(name: &str) -> Self {
        Goto::Node(name.to_string())
    }
}

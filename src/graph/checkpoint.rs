//! 检查点 - 图执行状态的持久化

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;

use super::state::{GraphState, Task};

/// 某个线程在两个superstep之间的完整快照
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Checkpoint<S: GraphState> {
    pub thread_id: String,
    /// 累计已完成的superstep数
    pub step: usize,
    pub values: S,
    /// 下一个superstep要执行的任务，为空表示执行结束
    pub next: Vec<Task<S::Packet>>,
    /// 汇合边的到达进度：目标节点 -> 已完成的来源节点
    pub join_progress: BTreeMap<String, BTreeSet<String>>,
    pub created_at: DateTime<Utc>,
}

impl<S: GraphState> Checkpoint<S> {
    pub fn fresh(thread_id: &str, values: S, entry: &str) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            step: 0,
            values,
            next: vec![Task::Run(entry.to_string())],
            join_progress: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn next_nodes(&self) -> Vec<String> {
        let mut nodes: Vec<String> = Vec::new();
        for task in &self.next {
            if !nodes.iter().any(|n| n == task.node()) {
                nodes.push(task.node().to_string());
            }
        }
        nodes
    }
}

/// 检查点存储
#[async_trait]
pub trait Checkpointer: Send + Sync {
    async fn put(&self, thread_id: &str, checkpoint: Value) -> Result<()>;

    async fn get(&self, thread_id: &str) -> Result<Option<Value>>;
}

/// 进程内检查点存储
#[derive(Default)]
pub struct MemorySaver {
    threads: RwLock<HashMap<String, Value>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn put(&self, thread_id: &str, checkpoint: Value) -> Result<()> {
        self.threads
            .write()
            .await
            .insert(thread_id.to_string(), checkpoint);
        Ok(())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<Value>> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }
}

/// 基于文件的检查点存储，每个线程一个JSON文件
pub struct FileCheckpointer {
    dir: PathBuf,
}

impl FileCheckpointer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn thread_path(&self, thread_id: &str) -> Result<PathBuf> {
        let valid = !thread_id.is_empty()
            && thread_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(anyhow!("非法的线程ID: {:?}", thread_id));
        }
        Ok(self.dir.join(format!("{}.json", thread_id)))
    }
}

#[async_trait]
impl Checkpointer for FileCheckpointer {
    async fn put(&self, thread_id: &str, checkpoint: Value) -> Result<()> {
        let path = self.thread_path(thread_id)?;
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("无法创建检查点目录 {:?}", self.dir))?;

        // 先写临时文件再rename，避免中途失败留下半个检查点
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&checkpoint)?;
        fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("写入检查点失败 {:?}", tmp_path))?;
        fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("替换检查点失败 {:?}", path))?;
        Ok(())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<Value>> {
        let path = self.thread_path(thread_id)?;
        if !fs::try_exists(&path)
            .await
            .with_context(|| format!("检查检查点失败 {:?}", path))?
        {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("读取检查点失败 {:?}", path))?;
        let value = serde_json::from_str(&content)
            .with_context(|| format!("检查点内容损坏 {:?}", path))?;
        Ok(Some(value))
    }
}

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use super::builder::{Edge, NodeKind};
use super::checkpoint::{Checkpoint, Checkpointer};
use super::error::GraphError;
use super::state::{GraphState, Goto, Task};
use super::END;
use crate::utils::threads::do_parallel_with_limit;

const DEFAULT_RECURSION_LIMIT: usize = 64;
const DEFAULT_MAX_PARALLELS: usize = 4;
const INLINE_THREAD_ID: &str = "inline";

/// 一次执行的结果
#[derive(Debug, Clone)]
pub enum RunOutcome<S> {
    /// 没有待执行任务，执行结束
    Completed(S),
    /// 在中断点前挂起，等待外部输入后resume
    Interrupted { state: S, next: Vec<String> },
}

/// 线程状态快照，供外部查看
#[derive(Debug, Clone)]
pub struct StateSnapshot<S> {
    pub values: S,
    /// 下一步将执行的节点，为空表示已结束
    pub next: Vec<String>,
    pub step: usize,
    pub created_at: DateTime<Utc>,
}

/// 编译后的状态图
pub struct CompiledGraph<S: GraphState> {
    nodes: HashMap<String, NodeKind<S>>,
    edges: Vec<Edge<S>>,
    entry: String,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    interrupt_before: HashSet<String>,
    max_parallels: usize,
    recursion_limit: usize,
}

impl<S: GraphState> CompiledGraph<S> {
    pub(super) fn new(nodes: HashMap<String, NodeKind<S>>, edges: Vec<Edge<S>>, entry: String) -> Self {
        Self {
            nodes,
            edges,
            entry,
            checkpointer: None,
            interrupt_before: HashSet::new(),
            max_parallels: DEFAULT_MAX_PARALLELS,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    /// 在这些节点执行之前挂起
    pub fn interrupt_before(mut self, nodes: &[&str]) -> Self {
        self.interrupt_before
            .extend(nodes.iter().map(|n| n.to_string()));
        self
    }

    pub fn with_max_parallels(mut self, max_parallels: usize) -> Self {
        self.max_parallels = max_parallels.max(1);
        self
    }

    /// 单次执行（invoke/start/resume）允许的最大superstep数
    pub fn with_recursion_limit(mut self, recursion_limit: usize) -> Self {
        self.recursion_limit = recursion_limit;
        self
    }

    /// 不持久化地执行到结束，用于子图
    pub async fn invoke(&self, input: S) -> Result<S, GraphError> {
        if !self.interrupt_before.is_empty() {
            return Err(GraphError::CheckpointerRequired);
        }
        let checkpoint = Checkpoint::fresh(INLINE_THREAD_ID, input, &self.entry);
        match self.run_loop(checkpoint, false, false).await? {
            RunOutcome::Completed(state) => Ok(state),
            RunOutcome::Interrupted { .. } => Err(GraphError::CheckpointerRequired),
        }
    }

    /// 以新的线程开始执行，覆盖同名线程已有的检查点
    pub async fn start(&self, thread_id: &str, input: S) -> Result<RunOutcome<S>, GraphError> {
        self.require_checkpointer()?;
        let checkpoint = Checkpoint::fresh(thread_id, input, &self.entry);
        self.save(&checkpoint).await?;
        self.run_loop(checkpoint, false, true).await
    }

    /// 从线程最近的检查点继续执行，跳过首个superstep的中断检查
    pub async fn resume(&self, thread_id: &str) -> Result<RunOutcome<S>, GraphError> {
        let checkpoint = self
            .load(thread_id)
            .await?
            .ok_or_else(|| GraphError::ThreadNotFound(thread_id.to_string()))?;
        self.run_loop(checkpoint, true, true).await
    }

    /// 查看线程当前状态以及下一步将执行的节点
    pub async fn get_state(&self, thread_id: &str) -> Result<Option<StateSnapshot<S>>, GraphError> {
        Ok(self.load(thread_id).await?.map(|checkpoint| StateSnapshot {
            next: checkpoint.next_nodes(),
            step: checkpoint.step,
            created_at: checkpoint.created_at,
            values: checkpoint.values,
        }))
    }

    /// 通过状态的reducer合并外部更新，不改变执行游标
    pub async fn update_state(&self, thread_id: &str, update: S::Update) -> Result<(), GraphError> {
        let mut checkpoint = self
            .load(thread_id)
            .await?
            .ok_or_else(|| GraphError::ThreadNotFound(thread_id.to_string()))?;
        checkpoint.values.apply(update);
        checkpoint.created_at = Utc::now();
        self.save(&checkpoint).await
    }

    async fn run_loop(
        &self,
        mut checkpoint: Checkpoint<S>,
        resuming: bool,
        persist: bool,
    ) -> Result<RunOutcome<S>, GraphError> {
        let mut skip_interrupt = resuming;
        let mut steps_taken = 0;

        loop {
            if checkpoint.next.is_empty() {
                tracing::debug!(thread = %checkpoint.thread_id, step = checkpoint.step, "graph finished");
                return Ok(RunOutcome::Completed(checkpoint.values));
            }

            if !skip_interrupt
                && checkpoint
                    .next
                    .iter()
                    .any(|task| self.interrupt_before.contains(task.node()))
            {
                tracing::debug!(thread = %checkpoint.thread_id, next = ?checkpoint.next_nodes(), "graph interrupted");
                if persist {
                    self.save(&checkpoint).await?;
                }
                return Ok(RunOutcome::Interrupted {
                    next: checkpoint.next_nodes(),
                    state: checkpoint.values,
                });
            }
            skip_interrupt = false;

            if steps_taken >= self.recursion_limit {
                return Err(GraphError::RecursionLimit(self.recursion_limit));
            }

            tracing::debug!(
                thread = %checkpoint.thread_id,
                step = checkpoint.step,
                tasks = ?checkpoint.next_nodes(),
                "running superstep"
            );

            let updates = self
                .execute_superstep(&checkpoint.values, &checkpoint.next)
                .await?;
            for update in updates {
                checkpoint.values.apply(update);
            }

            let completed = std::mem::take(&mut checkpoint.next);
            checkpoint.next =
                self.plan_next(&completed, &checkpoint.values, &mut checkpoint.join_progress);
            checkpoint.step += 1;
            checkpoint.created_at = Utc::now();
            steps_taken += 1;

            if persist {
                self.save(&checkpoint).await?;
            }
        }
    }

    /// 以同一份状态快照并发执行本轮所有任务，结果按任务顺序返回
    async fn execute_superstep(
        &self,
        state: &S,
        tasks: &[Task<S::Packet>],
    ) -> Result<Vec<S::Update>, GraphError> {
        let mut futures: Vec<BoxFuture<'_, (String, anyhow::Result<S::Update>)>> =
            Vec::with_capacity(tasks.len());

        for task in tasks {
            let name = task.node().to_string();
            let node = self
                .nodes
                .get(&name)
                .cloned()
                .ok_or_else(|| GraphError::UnknownNode(name.clone()))?;

            let future: BoxFuture<'_, (String, anyhow::Result<S::Update>)> = match (node, task) {
                (NodeKind::Step(node), Task::Run(_)) => {
                    Box::pin(async move { (name, node.run(state).await) })
                }
                (NodeKind::Branch(node), Task::Send { packet, .. }) => {
                    let packet = packet.clone();
                    Box::pin(async move { (name, node.run(packet).await) })
                }
                _ => return Err(GraphError::NodeKindMismatch(name)),
            };
            futures.push(future);
        }

        let results = do_parallel_with_limit(futures, self.max_parallels).await;

        let mut updates = Vec::with_capacity(results.len());
        for (node, result) in results {
            match result {
                Ok(update) => updates.push(update),
                Err(error) => return Err(GraphError::NodeFailed { node, error }),
            }
        }
        Ok(updates)
    }

    /// 根据本轮完成的节点计算下一轮任务
    fn plan_next(
        &self,
        completed: &[Task<S::Packet>],
        state: &S,
        join_progress: &mut BTreeMap<String, BTreeSet<String>>,
    ) -> Vec<Task<S::Packet>> {
        let mut finished: Vec<&str> = Vec::new();
        for task in completed {
            if !finished.contains(&task.node()) {
                finished.push(task.node());
            }
        }

        let mut next: Vec<Task<S::Packet>> = Vec::new();
        let schedule = |next: &mut Vec<Task<S::Packet>>, node: &str| {
            if node == END {
                return;
            }
            let already = next
                .iter()
                .any(|task| matches!(task, Task::Run(name) if name == node));
            if !already {
                next.push(Task::Run(node.to_string()));
            }
        };

        for name in finished {
            for edge in &self.edges {
                match edge {
                    Edge::Direct { from, to } if from == name => schedule(&mut next, to),
                    Edge::Conditional { from, router } if from == name => match router(state) {
                        Goto::Node(to) => schedule(&mut next, &to),
                        Goto::Send(node, packets) => {
                            next.extend(packets.into_iter().map(|packet| Task::Send {
                                node: node.clone(),
                                packet,
                            }));
                        }
                        Goto::End => {}
                    },
                    Edge::Join { sources, to } if sources.iter().any(|s| s == name) => {
                        let arrived = join_progress.entry(to.clone()).or_default();
                        arrived.insert(name.to_string());
                        if sources.iter().all(|s| arrived.contains(s)) {
                            join_progress.remove(to);
                            schedule(&mut next, to);
                        }
                    }
                    _ => {}
                }
            }
        }
        next
    }

    fn require_checkpointer(&self) -> Result<&Arc<dyn Checkpointer>, GraphError> {
        self.checkpointer
            .as_ref()
            .ok_or(GraphError::CheckpointerRequired)
    }

    async fn save(&self, checkpoint: &Checkpoint<S>) -> Result<(), GraphError> {
        let checkpointer = self.require_checkpointer()?;
        let value = serde_json::to_value(checkpoint)?;
        checkpointer
            .put(&checkpoint.thread_id, value)
            .await
            .map_err(GraphError::Checkpoint)
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>, GraphError> {
        let checkpointer = self.require_checkpointer()?;
        match checkpointer
            .get(thread_id)
            .await
            .map_err(GraphError::Checkpoint)?
        {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

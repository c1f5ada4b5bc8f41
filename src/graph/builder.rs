use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::error::GraphError;
use super::executor::CompiledGraph;
use super::state::{BranchNode, GraphState, Goto, Node};
use super::{END, START};

pub(super) type Router<S> =
    Arc<dyn Fn(&S) -> Goto<<S as GraphState>::Packet> + Send + Sync>;

pub(super) enum NodeKind<S: GraphState> {
    Step(Arc<dyn Node<S>>),
    Branch(Arc<dyn BranchNode<S>>),
}

impl<S: GraphState> Clone for NodeKind<S> {
    fn clone(&self) -> Self {
        match self {
            NodeKind::Step(node) => NodeKind::Step(node.clone()),
            NodeKind::Branch(node) => NodeKind::Branch(node.clone()),
        }
    }
}

pub(super) enum Edge<S: GraphState> {
    Direct { from: String, to: String },
    /// 所有来源节点都完成后才触发目标节点
    Join { sources: Vec<String>, to: String },
    Conditional { from: String, router: Router<S> },
}

/// 状态图构建器
pub struct StateGraph<S: GraphState> {
    nodes: HashMap<String, NodeKind<S>>,
    edges: Vec<Edge<S>>,
    entry: Option<String>,
    duplicated: Vec<String>,
}

impl<S: GraphState> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphState> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            entry: None,
            duplicated: Vec::new(),
        }
    }

    pub fn add_node(&mut self, name: &str, node: impl Node<S> + 'static) -> &mut Self {
        self.insert_node(name, NodeKind::Step(Arc::new(node)))
    }

    /// 添加只能通过`Goto::Send`派发的分支节点
    pub fn add_branch_node(
        &mut self,
        name: &str,
        node: impl BranchNode<S> + 'static,
    ) -> &mut Self {
        self.insert_node(name, NodeKind::Branch(Arc::new(node)))
    }

    fn insert_node(&mut self, name: &str, node: NodeKind<S>) -> &mut Self {
        if self.nodes.insert(name.to_string(), node).is_some() {
            self.duplicated.push(name.to_string());
        }
        self
    }

    /// 添加普通边，`from`为START时设置入口节点
    pub fn add_edge(&mut self, from: &str, to: &str) -> &mut Self {
        if from == START {
            self.entry = Some(to.to_string());
        } else {
            self.edges.push(Edge::Direct {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self
    }

    /// 添加汇合边（屏障）
    pub fn add_join(&mut self, sources: &[&str], to: &str) -> &mut Self {
        self.edges.push(Edge::Join {
            sources: sources.iter().map(|s| s.to_string()).collect(),
            to: to.to_string(),
        });
        self
    }

    /// 添加条件边：`router`给出类型化的路由结果，`mapping`把结果映射为跳转目标
    pub fn add_conditional_edges<R, F, M>(&mut self, from: &str, router: F, mapping: M) -> &mut Self
    where
        F: Fn(&S) -> R + Send + Sync + 'static,
        M: Fn(R) -> Goto<S::Packet> + Send + Sync + 'static,
    {
        self.edges.push(Edge::Conditional {
            from: from.to_string(),
            router: Arc::new(move |state: &S| mapping(router(state))),
        });
        self
    }

    /// 校验并编译状态图
    pub fn compile(self) -> Result<CompiledGraph<S>, GraphError> {
        if let Some(name) = self.duplicated.into_iter().next() {
            return Err(GraphError::DuplicateNode(name));
        }

        let entry = self.entry.ok_or(GraphError::MissingEntry)?;

        let known = |name: &str| name == END || self.nodes.contains_key(name);
        let mut referenced: HashSet<&str> = HashSet::new();
        referenced.insert(entry.as_str());
        for edge in &self.edges {
            match edge {
                Edge::Direct { from, to } => {
                    referenced.insert(from);
                    referenced.insert(to);
                }
                Edge::Join { sources, to } => {
                    referenced.extend(sources.iter().map(String::as_str));
                    referenced.insert(to);
                }
                Edge::Conditional { from, .. } => {
                    referenced.insert(from);
                }
            }
        }
        if let Some(unknown) = referenced.into_iter().find(|name| !known(name)) {
            return Err(GraphError::UnknownNode(unknown.to_string()));
        }

        Ok(CompiledGraph::new(self.nodes, self.edges, entry))
    }
}

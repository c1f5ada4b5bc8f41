//! 轻量状态图引擎
//!
//! 节点按superstep执行：同一轮的任务共享同一份状态快照并发运行，
//! 本轮全部完成后才按顺序合并更新并沿边计算下一轮任务。
//! 配置检查点存储后，每轮结束以及中断点都会持久化执行状态，
//! 可以在另一个进程中按线程ID恢复执行。

mod builder;
pub mod checkpoint;
mod error;
mod executor;
mod state;

pub use builder::StateGraph;
pub use checkpoint::{Checkpoint, Checkpointer, FileCheckpointer, MemorySaver};
pub use error::GraphError;
pub use executor::{CompiledGraph, RunOutcome, StateSnapshot};
pub use state::{BranchNode, GraphState, Goto, Node, Task};

pub const START: &str = "__start__";
pub const END: &str = "__end__";

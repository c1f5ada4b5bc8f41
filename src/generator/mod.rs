pub mod agent_executor;
pub mod context;
pub mod drafting;
pub mod interview;
pub mod outlet;
pub mod research;
pub mod workflow;

#[cfg(test)]
pub(crate) mod fakes;

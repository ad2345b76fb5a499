//! Query-time retrieval pipeline

pub mod context;
pub mod orchestrator;
pub mod payload;

pub use context::ContextAssembler;
pub use orchestrator::QueryOrchestrator;

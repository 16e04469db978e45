//! Synchronization workflow: path resolution followed by per-item orchestration

pub mod orchestrator;
pub mod resolver;

pub use orchestrator::{
    FailureStage, ItemOutcome, ItemResult, RepositorySkip, SyncOrchestrator, SyncReport, WorkItem,
};
pub use resolver::{InputPath, PathResolver, Resolution, TagSelector, parse_input_path};

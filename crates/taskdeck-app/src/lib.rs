//! Application layer for taskdeck.
//!
//! This crate provides the key-value store contract, the entity repository,
//! the state slices consumed by front ends, and first-run/bootstrap helpers.

pub mod bootstrap;
pub mod config;
pub mod demo;
pub mod kv;
pub mod repository;
pub mod sidebar;
pub mod task_patch;
pub mod tasks;

// Re-exports for convenience
pub use bootstrap::{ensure_default_data, DEFAULT_FOLDER_NAME, DEFAULT_LIST_NAME};
pub use config::{ProjectConfig, StoreSettings};
pub use demo::{seed_demo_tasks, DemoTask, DEMO_TASKS};
pub use kv::KeyValueStore;
pub use repository::{NewTask, Repository};
pub use sidebar::SidebarSlice;
pub use task_patch::{FieldPatch, TaskPatch};
pub use tasks::TaskSlice;

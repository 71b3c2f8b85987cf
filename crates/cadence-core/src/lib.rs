//! Core library for the Cadence study planner.
//!
//! Cadence turns work items (exams, homework, projects, ...) into plans of
//! dependent steps and packs those steps into time blocks on a calendar.
//!
//! # Architecture
//!
//! ```text
//! WorkItem ──▶ generator ──▶ PlanGraph ──▶ integration ──▶ scheduler ──▶ ScheduleResult
//!                              ▲              (filter)        (pack)
//!                              └──── completion / edge edits ◀────┘
//! ```
//!
//! - [`graph`]: the dependency DAG with validated mutation and deterministic
//!   topological order
//! - [`generator`]: table-driven plan generation per work-item category
//! - [`scheduler`]: the scoring and packing engine plus manual block moves
//! - [`integration`]: dependency filtering, completion with auto-unblock and
//!   re-validation of held blocks
//! - [`store`]: the single owner of plans and the current schedule, with
//!   snapshots, latest-request-wins scheduling and debounced persistence
//! - [`db`]: SQLite persistence
//! - [`display`]: markdown rendering
//!
//! # Quick Start
//!
//! ```rust
//! use cadence_core::{
//!     generate_plan, generate_dependency_aware_schedule,
//!     models::{Category, Priority, WorkItem},
//!     ScheduleRequest,
//! };
//! use jiff::civil::date;
//!
//! let item = WorkItem {
//!     id: "essay".to_string(),
//!     title: "History essay".to_string(),
//!     category: Category::Homework,
//!     due: date(2026, 3, 6).at(17, 0, 0, 0),
//!     priority: Priority::High,
//!     estimated_minutes: 120,
//!     start_date: date(2026, 3, 2),
//!     user_steps: Vec::new(),
//! };
//!
//! let plan = generate_plan(&item)?;
//! let request = ScheduleRequest::new(date(2026, 3, 2).at(8, 0, 0, 0), plan.schedule_tasks());
//! let result = generate_dependency_aware_schedule(&request, &plan)?;
//!
//! assert_eq!(result.scheduled_minutes("essay/chunk-1"), 60);
//! assert!(result.unscheduled.is_empty());
//! # Ok::<(), cadence_core::CadenceError>(())
//! ```

pub mod db;
pub mod display;
pub mod error;
pub mod generator;
pub mod graph;
pub mod integration;
pub mod models;
pub mod params;
pub mod scheduler;
pub mod store;

pub use error::{CadenceError, Result, ValidationError};
pub use generator::{generate_plan, regenerate_plan, GeneratorConfig, PlanGenerator};
pub use graph::PlanGraph;
pub use integration::{
    blocked_reason, complete_task_and_auto_unblock, generate_dependency_aware_schedule,
    get_schedulable_tasks, is_scheduled_block_valid, remove_invalid_blocks, PlanLookup,
};
pub use scheduler::{generate_schedule, BlockRef, ScheduleRequest};
pub use store::{PlanStore, StoreBuilder, StoreSnapshot};

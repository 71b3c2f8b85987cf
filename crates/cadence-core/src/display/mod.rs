//! Markdown display wrappers.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! the wrappers here add context such as step titles for schedule blocks or
//! the outcome of an operation. All output is markdown so the CLI can render
//! it with a terminal skin.
//!
//! ```rust
//! use cadence_core::display::{OperationStatus, ScheduleView};
//! use cadence_core::models::ScheduleResult;
//!
//! let result = ScheduleResult::default();
//! assert_eq!(ScheduleView::new(&result).to_string(), "No blocks scheduled.\n");
//!
//! let status = OperationStatus::success("Dependency added");
//! assert_eq!(status.to_string(), "Success: Dependency added\n");
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::{PlanSummaries, ScheduleView};
pub use datetime::{ClockTime, DayHeading, LocalDateTime, Minutes};
pub use results::{CompletionResult, DeleteResult, GenerateResult, MoveResult};
pub use status::OperationStatus;

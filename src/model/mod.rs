//! Data models for daytrace.
//!
//! This module contains all domain models:
//! - DailyTaskSet / DailyTask
//! - NightSession
//! - TraceEvent
//! - YearPlan / PlanDirection
//! - ReviewSnapshot
//! - MicroNote

pub mod night;
pub mod note;
pub mod plan;
pub mod review;
pub mod task;
pub mod trace;

pub use night::{NightAnswer, NightSession, NightStatus};
pub use note::{MicroNote, RelatedType};
pub use plan::{DirectionUpdate, PlanDirection, PlanStatus, YearPlan};
pub use review::{ReviewContent, ReviewSnapshot};
pub use task::{DailyTask, DailyTaskSet, SetSource, TaskStatus};
pub use trace::{TraceEvent, TraceEventType, year_month};

//! Task lifecycle and moderation workflow
//!
//! Status changes go through [`policy`] and are committed by
//! [`TaskLifecycle`] with a compare-and-set on the source status, so the rules
//! hold no matter which client sends the request.

pub mod analytics;
pub mod lifecycle;
pub mod moderation;
pub mod policy;
pub mod task;

pub use analytics::{Analytics, AnalyticsSnapshot};
pub use lifecycle::TaskLifecycle;
pub use moderation::{Moderation, PurgeSummary, RETENTION_DAYS};
pub use task::{Task, TaskAction, TaskFields, TaskStatus};

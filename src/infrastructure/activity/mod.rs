//! Activity logging

mod hook;
mod logger;

pub use hook::{derive_activity, is_excluded_path, DerivedActivity};
pub use logger::{ActivityLogFilter, ActivityLogger, DEFAULT_QUEUE_CAPACITY};

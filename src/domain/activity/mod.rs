//! Activity (audit) log domain

mod entry;

pub use entry::{ActivityAction, ActivityLogEntry, ActivityLogId, EntityType, RequestContext};

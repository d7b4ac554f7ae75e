//! Team domain module
//!
//! Teams group users; memberships carry a per-team role used by team-level
//! access checks.

mod entity;
mod validation;

pub use entity::{MembershipId, Team, TeamId, TeamMembership, TeamRole};
pub use validation::{validate_team_name, TeamValidationError};

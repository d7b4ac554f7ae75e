//! Access control over owned resources and teams

mod ownership;
mod team;

pub use ownership::{
    evaluate_ownership, evaluate_ownership_or_admin, is_resource_owner, verify_ownership,
    verify_ownership_or_admin,
};
pub use team::{TeamAccess, TeamAccessService, TeamRequirement};

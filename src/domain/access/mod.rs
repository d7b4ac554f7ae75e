//! Access-control domain types

mod decision;
mod principal;

pub use decision::AccessDecision;
pub use principal::Principal;

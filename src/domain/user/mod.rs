//! User domain
//!
//! Users own resources and carry the platform role consulted by access
//! checks.

mod entity;
mod validation;

pub use entity::{User, UserId, UserRole};
pub use validation::{validate_email, validate_username, UserValidationError};

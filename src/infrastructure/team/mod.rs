//! Team management

mod service;

pub use service::TeamService;

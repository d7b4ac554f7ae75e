//! Game content services

mod service;

pub use service::{ContentService, CreateAssetRequest, CreateProjectRequest};

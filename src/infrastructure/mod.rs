//! Infrastructure layer - Storage backends, crypto and services

pub mod access;
pub mod activity;
pub mod api_key;
pub mod content;
pub mod credentials;
pub mod crypto;
pub mod logging;
pub mod observability;
pub mod pagination;
pub mod storage;
pub mod team;

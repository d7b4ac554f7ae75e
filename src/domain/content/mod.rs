//! Owned game content

mod asset;
mod project;

pub use asset::{Asset, AssetId, AssetKind};
pub use project::{Project, ProjectId, ProjectStatus};

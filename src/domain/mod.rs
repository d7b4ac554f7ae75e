//! Domain layer - Core entities, access rules and list semantics

pub mod access;
pub mod activity;
pub mod api_key;
pub mod content;
pub mod credentials;
pub mod error;
pub mod identifier;
pub mod pagination;
pub mod storage;
pub mod team;
pub mod user;

pub use access::{AccessDecision, Principal};
pub use activity::{ActivityAction, ActivityLogEntry, ActivityLogId, EntityType, RequestContext};
pub use api_key::{ApiKey, ApiKeyId, ApiKeyOwner, ApiKeySummary, ApiKeyValidationError};
pub use content::{Asset, AssetId, AssetKind, Project, ProjectId, ProjectStatus};
pub use credentials::{CredentialId, CredentialSummary, StoredCredential};
pub use error::DomainError;
pub use pagination::{ListSpec, PageLimits, PageRequest, Paginated, PaginationMeta, PaginationQuery};
pub use storage::{Filter, OwnedEntity, SortOrder, SortSpec, Storage, StorageEntity, StorageKey, StorageQuery};
pub use team::{MembershipId, Team, TeamId, TeamMembership, TeamRole, TeamValidationError};
pub use user::{User, UserId, UserRole, UserValidationError};

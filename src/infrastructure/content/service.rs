//! Projects and their generated assets

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::access::Principal;
use crate::domain::content::{Asset, AssetId, AssetKind, Project, ProjectId};
use crate::domain::pagination::{ListSpec, PageLimits, Paginated, PaginationQuery};
use crate::domain::storage::{Filter, Storage, StorageQuery};
use crate::domain::DomainError;
use crate::infrastructure::access::verify_ownership_or_admin;
use crate::infrastructure::pagination::paginate;

const PROJECT_SEARCH_FIELDS: &[&str] = &["name", "description", "genre"];
const PROJECT_SORT_FIELDS: &[&str] = &["name", "status", "created_at", "updated_at"];
const ASSET_SEARCH_FIELDS: &[&str] = &["name"];
const ASSET_SORT_FIELDS: &[&str] = &["name", "kind", "created_at"];

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub genre: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssetRequest {
    pub name: String,
    pub kind: AssetKind,
    pub storage_url: String,
}

#[derive(Debug, Clone)]
pub struct ContentService {
    projects: Arc<dyn Storage<Project>>,
    assets: Arc<dyn Storage<Asset>>,
    page_limits: PageLimits,
}

impl ContentService {
    pub fn new(projects: Arc<dyn Storage<Project>>, assets: Arc<dyn Storage<Asset>>) -> Self {
        Self {
            projects,
            assets,
            page_limits: PageLimits::default(),
        }
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.page_limits = limits;
        self
    }

    pub async fn create_project(
        &self,
        principal: &Principal,
        request: CreateProjectRequest,
    ) -> Result<Project, DomainError> {
        let project = Project::new(principal.user_id.clone(), request.name)?
            .with_description(request.description)?
            .with_genre(request.genre);

        let created = self.projects.create(project).await?;
        info!(project_id = %created.id(), owner_id = %principal.user_id, "Project created");

        Ok(created)
    }

    /// Owner-scoped unless the principal's role bypasses ownership
    pub async fn list_projects(
        &self,
        principal: &Principal,
        query: &PaginationQuery,
    ) -> Result<Paginated<Project>, DomainError> {
        let base = if principal.bypasses_ownership() {
            Filter::All
        } else {
            Filter::eq("owner_id", principal.user_id.as_str())
        };

        let spec = ListSpec::new(PROJECT_SEARCH_FIELDS, PROJECT_SORT_FIELDS, "created_at")
            .with_limits(self.page_limits);

        paginate(self.projects.as_ref(), query, &spec, base).await
    }

    pub async fn get_project(
        &self,
        id: &ProjectId,
        principal: &Principal,
    ) -> Result<Project, DomainError> {
        verify_ownership_or_admin(self.projects.as_ref(), id, principal).await
    }

    /// Delete a project and every asset under it
    pub async fn delete_project(
        &self,
        id: &ProjectId,
        principal: &Principal,
    ) -> Result<(), DomainError> {
        verify_ownership_or_admin(self.projects.as_ref(), id, principal).await?;

        let assets = self
            .assets
            .find(&StorageQuery::new(Filter::eq("project_id", id.as_str())))
            .await?;

        // The project goes only once every asset is gone
        for asset in &assets {
            self.assets.delete(asset.id()).await.inspect_err(|e| {
                warn!(asset_id = %asset.id(), error = %e, "Failed to delete project asset");
            })?;
        }

        self.projects.delete(id).await?;

        info!(
            project_id = %id,
            assets = assets.len(),
            user_id = %principal.user_id,
            "Project deleted"
        );
        Ok(())
    }

    /// Register an asset under a project the principal can access
    ///
    /// The asset is owned by the project's owner, not necessarily the caller.
    pub async fn create_asset(
        &self,
        project_id: &ProjectId,
        principal: &Principal,
        request: CreateAssetRequest,
    ) -> Result<Asset, DomainError> {
        let project = verify_ownership_or_admin(self.projects.as_ref(), project_id, principal).await?;

        let asset = Asset::new(
            project.owner().clone(),
            project_id.clone(),
            request.name,
            request.kind,
            request.storage_url,
        )?;

        let created = self.assets.create(asset).await?;
        info!(asset_id = %created.id(), project_id = %project_id, "Asset created");

        Ok(created)
    }

    pub async fn list_assets(
        &self,
        project_id: &ProjectId,
        principal: &Principal,
        query: &PaginationQuery,
    ) -> Result<Paginated<Asset>, DomainError> {
        verify_ownership_or_admin(self.projects.as_ref(), project_id, principal).await?;

        let spec = ListSpec::new(ASSET_SEARCH_FIELDS, ASSET_SORT_FIELDS, "created_at")
            .with_limits(self.page_limits);

        paginate(
            self.assets.as_ref(),
            query,
            &spec,
            Filter::eq("project_id", project_id.as_str()),
        )
        .await
    }

    pub async fn delete_asset(&self, id: &AssetId, principal: &Principal) -> Result<(), DomainError> {
        verify_ownership_or_admin(self.assets.as_ref(), id, principal).await?;
        self.assets.delete(id).await?;

        info!(asset_id = %id, user_id = %principal.user_id, "Asset deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::mock::MockStorage;
    use crate::domain::storage::OwnedEntity;
    use crate::domain::user::{UserId, UserRole};
    use crate::infrastructure::storage::InMemoryStorage;

    struct Fixture {
        service: ContentService,
        assets: Arc<InMemoryStorage<Asset>>,
        alice: Principal,
        bob: Principal,
        owner_role: Principal,
    }

    fn fixture() -> Fixture {
        let projects = Arc::new(InMemoryStorage::<Project>::new());
        let assets = Arc::new(InMemoryStorage::<Asset>::new());

        Fixture {
            service: ContentService::new(projects, assets.clone()),
            assets,
            alice: Principal::new(UserId::generate(), UserRole::Member),
            bob: Principal::new(UserId::generate(), UserRole::Member),
            owner_role: Principal::new(UserId::generate(), UserRole::Owner),
        }
    }

    fn project(name: &str) -> CreateProjectRequest {
        CreateProjectRequest {
            name: name.to_string(),
            description: Some("Open world RPG".to_string()),
            genre: Some("rpg".to_string()),
        }
    }

    fn asset(name: &str) -> CreateAssetRequest {
        CreateAssetRequest {
            name: name.to_string(),
            kind: AssetKind::Audio,
            storage_url: format!("s3://forgekit/{}.ogg", name),
        }
    }

    #[tokio::test]
    async fn test_projects_are_owner_scoped() {
        let f = fixture();
        let created = f.service.create_project(&f.alice, project("Emberfall")).await.unwrap();
        f.service.create_project(&f.bob, project("Tidebreak")).await.unwrap();

        let mine = f.service.list_projects(&f.alice, &PaginationQuery::default()).await.unwrap();
        assert_eq!(mine.pagination.total, 1);
        assert_eq!(mine.data[0].name(), "Emberfall");

        let err = f.service.get_project(created.id(), &f.bob).await.unwrap_err();
        assert!(err.is_forbidden());

        // Platform owners bypass ownership, for listing as well as by id
        assert!(f.service.get_project(created.id(), &f.owner_role).await.is_ok());
        let everything = f
            .service
            .list_projects(&f.owner_role, &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(everything.pagination.total, 2);
    }

    #[tokio::test]
    async fn test_assets_follow_project_access() {
        let f = fixture();
        let created = f.service.create_project(&f.alice, project("Emberfall")).await.unwrap();

        let theme = f
            .service
            .create_asset(created.id(), &f.owner_role, asset("theme"))
            .await
            .unwrap();
        assert_eq!(theme.owner_id(), f.alice.user_id.as_str());

        assert!(f
            .service
            .create_asset(created.id(), &f.bob, asset("stolen"))
            .await
            .unwrap_err()
            .is_forbidden());

        let listed = f
            .service
            .list_assets(created.id(), &f.alice, &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(listed.pagination.total, 1);

        assert!(f.service.delete_asset(theme.id(), &f.bob).await.unwrap_err().is_forbidden());
        f.service.delete_asset(theme.id(), &f.alice).await.unwrap();
        assert!(f.assets.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_project_removes_assets() {
        let f = fixture();
        let created = f.service.create_project(&f.alice, project("Emberfall")).await.unwrap();
        f.service.create_asset(created.id(), &f.alice, asset("a")).await.unwrap();
        f.service.create_asset(created.id(), &f.alice, asset("b")).await.unwrap();

        f.service.delete_project(created.id(), &f.alice).await.unwrap();

        assert!(f.assets.list().await.unwrap().is_empty());
        assert!(f.service.get_project(created.id(), &f.alice).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_project_keeps_project_when_asset_delete_fails() {
        let projects = Arc::new(InMemoryStorage::<Project>::new());
        let assets = Arc::new(MockStorage::<Asset>::new());
        let service = ContentService::new(projects.clone(), assets.clone());
        let alice = Principal::new(UserId::generate(), UserRole::Member);

        let created = service.create_project(&alice, project("Emberfall")).await.unwrap();
        service.create_asset(created.id(), &alice, asset("theme")).await.unwrap();

        assets.set_delete_error(Some("disk full"));
        let err = service.delete_project(created.id(), &alice).await.unwrap_err();
        assert!(matches!(err, DomainError::Storage { .. }));

        assert!(projects.exists(created.id()).await.unwrap());
        assert_eq!(assets.list().await.unwrap().len(), 1);

        assets.set_delete_error(None);
        service.delete_project(created.id(), &alice).await.unwrap();
        assert!(!projects.exists(created.id()).await.unwrap());
        assert!(assets.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_project_validates() {
        let f = fixture();
        assert!(f.service.create_project(&f.alice, project("  ")).await.is_err());
    }
}

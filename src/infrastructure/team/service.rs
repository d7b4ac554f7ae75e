//! Team service for team and membership management

use std::sync::Arc;

use tracing::info;

use crate::domain::access::Principal;
use crate::domain::storage::{Filter, SortOrder, SortSpec, Storage, StorageQuery};
use crate::domain::team::{Team, TeamId, TeamMembership, TeamRole};
use crate::domain::user::{User, UserId};
use crate::domain::DomainError;
use crate::infrastructure::access::TeamAccessService;

/// Team service for managing teams
#[derive(Debug, Clone)]
pub struct TeamService {
    teams: Arc<dyn Storage<Team>>,
    memberships: Arc<dyn Storage<TeamMembership>>,
    users: Arc<dyn Storage<User>>,
    access: TeamAccessService,
}

impl TeamService {
    pub fn new(
        teams: Arc<dyn Storage<Team>>,
        memberships: Arc<dyn Storage<TeamMembership>>,
        users: Arc<dyn Storage<User>>,
    ) -> Self {
        let access = TeamAccessService::new(memberships.clone());
        Self {
            teams,
            memberships,
            users,
            access,
        }
    }

    pub fn access(&self) -> &TeamAccessService {
        &self.access
    }

    /// Create a team; the creator becomes its owner
    pub async fn create(
        &self,
        principal: &Principal,
        name: &str,
        description: Option<String>,
    ) -> Result<Team, DomainError> {
        let mut team = Team::new(name.trim(), principal.user_id.clone())?;
        if let Some(description) = description {
            team = team.with_description(description);
        }

        let team = self.teams.create(team).await?;
        self.memberships
            .create(TeamMembership::new(
                team.id().clone(),
                principal.user_id.clone(),
                TeamRole::Owner,
            ))
            .await?;

        info!(team_id = %team.id(), owner_id = %principal.user_id, "Team created");
        Ok(team)
    }

    pub async fn get(&self, id: &TeamId, principal: &Principal) -> Result<Team, DomainError> {
        self.access.verify_team_membership(id, principal).await?;
        self.find_team(id).await
    }

    pub async fn list_members(
        &self,
        id: &TeamId,
        principal: &Principal,
    ) -> Result<Vec<TeamMembership>, DomainError> {
        self.access.verify_team_membership(id, principal).await?;
        self.find_team(id).await?;

        let query = StorageQuery::new(Filter::eq("team_id", id.as_str()))
            .with_sort(SortSpec::new("joined_at", SortOrder::Asc));

        self.memberships.find(&query).await
    }

    /// Add a user to a team; team owners only
    pub async fn add_member(
        &self,
        id: &TeamId,
        principal: &Principal,
        user_id: &UserId,
        role: TeamRole,
    ) -> Result<TeamMembership, DomainError> {
        self.access.verify_team_owner(id, principal).await?;
        self.find_team(id).await?;

        if !self.users.exists(user_id).await? {
            return Err(DomainError::not_found(format!("User '{}' not found", user_id)));
        }

        if self.access.get_team_role(id, user_id).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "User '{}' is already a member of this team",
                user_id
            )));
        }

        let membership = self
            .memberships
            .create(TeamMembership::new(id.clone(), user_id.clone(), role))
            .await?;

        info!(team_id = %id, user_id = %user_id, role = role.as_str(), "Team member added");
        Ok(membership)
    }

    /// Remove a member; team owners only, and the last owner cannot leave
    pub async fn remove_member(
        &self,
        id: &TeamId,
        principal: &Principal,
        user_id: &UserId,
    ) -> Result<(), DomainError> {
        self.access.verify_team_owner(id, principal).await?;

        let filter = Filter::eq("team_id", id.as_str()).and(Filter::eq("user_id", user_id.as_str()));
        let membership = self.memberships.find_one(&filter).await?.ok_or_else(|| {
            DomainError::not_found(format!("User '{}' is not a member of this team", user_id))
        })?;

        if membership.role() == TeamRole::Owner {
            let owners = Filter::eq("team_id", id.as_str()).and(Filter::eq("role", "owner"));
            if self.memberships.count_where(&owners).await? <= 1 {
                return Err(DomainError::conflict("A team must keep at least one owner"));
            }
        }

        self.memberships.delete(membership.id()).await?;

        info!(team_id = %id, user_id = %user_id, "Team member removed");
        Ok(())
    }

    async fn find_team(&self, id: &TeamId) -> Result<Team, DomainError> {
        self.teams
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::UserRole;
    use crate::infrastructure::storage::InMemoryStorage;

    struct Fixture {
        service: TeamService,
        owner: Principal,
        member: Principal,
    }

    async fn fixture() -> Fixture {
        let users = Arc::new(InMemoryStorage::<User>::new());

        let mut principals = Vec::new();
        for name in ["morgan", "riley"] {
            let user = User::new(name, format!("{}@forgekit.test", name), UserRole::Member).unwrap();
            principals.push(Principal::new(user.id().clone(), UserRole::Member));
            users.create(user).await.unwrap();
        }

        let service = TeamService::new(
            Arc::new(InMemoryStorage::<Team>::new()),
            Arc::new(InMemoryStorage::<TeamMembership>::new()),
            users,
        );

        let member = principals.remove(1);
        let owner = principals.remove(0);
        Fixture {
            service,
            owner,
            member,
        }
    }

    #[tokio::test]
    async fn test_creator_becomes_owner() {
        let f = fixture().await;
        let team = f.service.create(&f.owner, "Level Design", None).await.unwrap();

        assert!(f.service.access().is_team_owner(team.id(), &f.owner).await);
        assert_eq!(f.service.list_members(team.id(), &f.owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_member_management() {
        let f = fixture().await;
        let team = f.service.create(&f.owner, "Level Design", None).await.unwrap();

        // Outsiders cannot see the team
        assert!(f.service.get(team.id(), &f.member).await.unwrap_err().is_forbidden());

        f.service
            .add_member(team.id(), &f.owner, &f.member.user_id, TeamRole::Member)
            .await
            .unwrap();
        assert!(f.service.get(team.id(), &f.member).await.is_ok());

        let duplicate = f
            .service
            .add_member(team.id(), &f.owner, &f.member.user_id, TeamRole::Member)
            .await
            .unwrap_err();
        assert!(matches!(duplicate, DomainError::Conflict { .. }));

        // Plain members cannot manage membership
        let err = f
            .service
            .remove_member(team.id(), &f.member, &f.owner.user_id)
            .await
            .unwrap_err();
        assert!(err.is_forbidden());

        f.service
            .remove_member(team.id(), &f.owner, &f.member.user_id)
            .await
            .unwrap();
        assert!(!f.service.access().is_team_member(team.id(), &f.member).await);
    }

    #[tokio::test]
    async fn test_last_owner_cannot_be_removed() {
        let f = fixture().await;
        let team = f.service.create(&f.owner, "Level Design", None).await.unwrap();

        let err = f
            .service
            .remove_member(team.id(), &f.owner, &f.owner.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_unknown_user_cannot_be_added() {
        let f = fixture().await;
        let team = f.service.create(&f.owner, "Level Design", None).await.unwrap();

        let err = f
            .service
            .add_member(team.id(), &f.owner, &UserId::generate(), TeamRole::Member)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}

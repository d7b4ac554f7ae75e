//! Team-level access checks
//!
//! Platform admins always pass. Everyone else needs a membership row, and
//! owner-only checks additionally need the team `owner` role.

use std::sync::Arc;

use tracing::warn;

use crate::domain::access::{AccessDecision, Principal};
use crate::domain::storage::{Filter, Storage};
use crate::domain::team::{TeamId, TeamMembership, TeamRole};
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::observability::record_access_denied;

/// What a team check requires of the principal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamRequirement {
    Member,
    Owner,
}

/// Team access granted to a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamAccess {
    /// Granted through membership with this role
    Role(TeamRole),
    /// Granted through the platform admin role
    AdminBypass,
}

#[derive(Debug, Clone)]
pub struct TeamAccessService {
    memberships: Arc<dyn Storage<TeamMembership>>,
}

impl TeamAccessService {
    pub fn new(memberships: Arc<dyn Storage<TeamMembership>>) -> Self {
        Self { memberships }
    }

    /// Role of a user in a team, if they are a member
    pub async fn get_team_role(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
    ) -> Result<Option<TeamRole>, DomainError> {
        let filter =
            Filter::eq("team_id", team_id.as_str()).and(Filter::eq("user_id", user_id.as_str()));

        Ok(self
            .memberships
            .find_one(&filter)
            .await?
            .map(|membership| membership.role()))
    }

    /// Core team predicate
    pub async fn evaluate(
        &self,
        team_id: &TeamId,
        principal: &Principal,
        requirement: TeamRequirement,
    ) -> Result<AccessDecision<TeamAccess>, DomainError> {
        if principal.is_admin() {
            return Ok(AccessDecision::Allowed(TeamAccess::AdminBypass));
        }

        let role = self.get_team_role(team_id, &principal.user_id).await?;

        Ok(match (role, requirement) {
            (None, _) => AccessDecision::Denied("You are not a member of this team".to_string()),
            (Some(TeamRole::Owner), TeamRequirement::Owner) => {
                AccessDecision::Allowed(TeamAccess::Role(TeamRole::Owner))
            }
            (Some(_), TeamRequirement::Owner) => {
                AccessDecision::Denied("Only the team owner can perform this action".to_string())
            }
            (Some(role), TeamRequirement::Member) => {
                AccessDecision::Allowed(TeamAccess::Role(role))
            }
        })
    }

    pub async fn is_team_member(&self, team_id: &TeamId, principal: &Principal) -> bool {
        self.probe(team_id, principal, TeamRequirement::Member).await
    }

    pub async fn is_team_owner(&self, team_id: &TeamId, principal: &Principal) -> bool {
        self.probe(team_id, principal, TeamRequirement::Owner).await
    }

    pub async fn verify_team_membership(
        &self,
        team_id: &TeamId,
        principal: &Principal,
    ) -> Result<TeamAccess, DomainError> {
        self.assert(team_id, principal, TeamRequirement::Member).await
    }

    pub async fn verify_team_owner(
        &self,
        team_id: &TeamId,
        principal: &Principal,
    ) -> Result<TeamAccess, DomainError> {
        self.assert(team_id, principal, TeamRequirement::Owner).await
    }

    async fn probe(
        &self,
        team_id: &TeamId,
        principal: &Principal,
        requirement: TeamRequirement,
    ) -> bool {
        match self.evaluate(team_id, principal, requirement).await {
            Ok(decision) => decision.is_allowed(),
            Err(e) => {
                warn!(team_id = %team_id, error = %e, "Team access probe failed");
                false
            }
        }
    }

    async fn assert(
        &self,
        team_id: &TeamId,
        principal: &Principal,
        requirement: TeamRequirement,
    ) -> Result<TeamAccess, DomainError> {
        let decision = self.evaluate(team_id, principal, requirement).await?;

        if !decision.is_allowed() {
            record_access_denied(match requirement {
                TeamRequirement::Member => "team_membership",
                TeamRequirement::Owner => "team_owner",
            });
        }

        decision.into_result("Team", team_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::mock::MockStorage;
    use crate::domain::user::UserRole;
    use crate::infrastructure::storage::InMemoryStorage;

    struct Fixture {
        service: TeamAccessService,
        team_id: TeamId,
        owner: Principal,
        member: Principal,
        outsider: Principal,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStorage::<TeamMembership>::new());
        let team_id = TeamId::generate();

        let owner = Principal::new(UserId::generate(), UserRole::Member);
        let member = Principal::new(UserId::generate(), UserRole::Member);
        let outsider = Principal::new(UserId::generate(), UserRole::Member);

        store
            .create(TeamMembership::new(
                team_id.clone(),
                owner.user_id.clone(),
                TeamRole::Owner,
            ))
            .await
            .unwrap();
        store
            .create(TeamMembership::new(
                team_id.clone(),
                member.user_id.clone(),
                TeamRole::Member,
            ))
            .await
            .unwrap();

        Fixture {
            service: TeamAccessService::new(store),
            team_id,
            owner,
            member,
            outsider,
        }
    }

    #[tokio::test]
    async fn test_get_team_role() {
        let f = fixture().await;

        assert_eq!(
            f.service
                .get_team_role(&f.team_id, &f.owner.user_id)
                .await
                .unwrap(),
            Some(TeamRole::Owner)
        );
        assert_eq!(
            f.service
                .get_team_role(&f.team_id, &f.outsider.user_id)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_membership_checks() {
        let f = fixture().await;

        assert!(f.service.is_team_member(&f.team_id, &f.owner).await);
        assert!(f.service.is_team_member(&f.team_id, &f.member).await);
        assert!(!f.service.is_team_member(&f.team_id, &f.outsider).await);

        let err = f
            .service
            .verify_team_membership(&f.team_id, &f.outsider)
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
    }

    #[tokio::test]
    async fn test_owner_checks() {
        let f = fixture().await;

        assert!(f.service.is_team_owner(&f.team_id, &f.owner).await);
        assert!(!f.service.is_team_owner(&f.team_id, &f.member).await);

        assert_eq!(
            f.service
                .verify_team_owner(&f.team_id, &f.owner)
                .await
                .unwrap(),
            TeamAccess::Role(TeamRole::Owner)
        );
        assert!(f
            .service
            .verify_team_owner(&f.team_id, &f.member)
            .await
            .unwrap_err()
            .is_forbidden());
    }

    #[tokio::test]
    async fn test_admin_short_circuits() {
        let f = fixture().await;
        let admin = Principal::new(UserId::generate(), UserRole::Admin);

        assert!(f.service.is_team_owner(&f.team_id, &admin).await);
        assert_eq!(
            f.service
                .verify_team_membership(&TeamId::generate(), &admin)
                .await
                .unwrap(),
            TeamAccess::AdminBypass
        );
    }

    #[tokio::test]
    async fn test_probe_fails_closed_on_storage_error() {
        let store = Arc::new(MockStorage::<TeamMembership>::new().with_error("down"));
        let service = TeamAccessService::new(store);
        let principal = Principal::new(UserId::generate(), UserRole::Member);

        assert!(!service.is_team_member(&TeamId::generate(), &principal).await);
        assert!(service
            .verify_team_membership(&TeamId::generate(), &principal)
            .await
            .is_err());
    }
}

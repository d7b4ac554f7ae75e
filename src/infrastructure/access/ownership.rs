//! Resource ownership checks
//!
//! Every check is built on one of two tri-state evaluations; the throwing
//! and boolean variants are thin wrappers over them.

use tracing::{debug, warn};

use crate::domain::access::{AccessDecision, Principal};
use crate::domain::storage::{Filter, OwnedEntity, Storage, StorageKey};
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::observability::record_access_denied;

/// Look up a resource by `(id AND owner)` in a single predicate
///
/// Never yields `Denied`: a resource owned by someone else is reported as
/// `NotFound`, exactly like a missing one.
pub async fn evaluate_ownership<E>(
    store: &dyn Storage<E>,
    id: &E::Key,
    user_id: &UserId,
) -> Result<AccessDecision<E>, DomainError>
where
    E: OwnedEntity + 'static,
{
    let filter = Filter::eq(E::KEY_FIELD, id.as_str())
        .and(Filter::eq(E::OWNER_FIELD, user_id.as_str()));

    Ok(match store.find_one(&filter).await? {
        Some(entity) => AccessDecision::Allowed(entity),
        None => AccessDecision::NotFound,
    })
}

/// Look up a resource by id, then apply the role bypass and owner match
pub async fn evaluate_ownership_or_admin<E>(
    store: &dyn Storage<E>,
    id: &E::Key,
    principal: &Principal,
) -> Result<AccessDecision<E>, DomainError>
where
    E: OwnedEntity + 'static,
{
    let Some(entity) = store.get(id).await? else {
        return Ok(AccessDecision::NotFound);
    };

    if principal.bypasses_ownership() {
        debug!(
            resource = E::RESOURCE_NAME,
            id = %id.as_str(),
            role = %principal.role,
            "Ownership bypassed by role"
        );
        return Ok(AccessDecision::Allowed(entity));
    }

    if entity.owner_id() == principal.user_id.as_str() {
        return Ok(AccessDecision::Allowed(entity));
    }

    Ok(AccessDecision::Denied(format!(
        "You do not have access to this {}",
        E::RESOURCE_NAME.to_lowercase()
    )))
}

/// Return the resource if `user_id` owns it, else `NotFound`
pub async fn verify_ownership<E>(
    store: &dyn Storage<E>,
    id: &E::Key,
    user_id: &UserId,
) -> Result<E, DomainError>
where
    E: OwnedEntity + 'static,
{
    let decision = evaluate_ownership(store, id, user_id).await?;

    if !decision.is_allowed() {
        record_access_denied("ownership");
    }

    decision.into_result(E::RESOURCE_NAME, id.as_str())
}

/// Return the resource if the principal owns it or holds a bypass role
///
/// Missing resources are `NotFound`; visible but foreign ones are `Forbidden`.
pub async fn verify_ownership_or_admin<E>(
    store: &dyn Storage<E>,
    id: &E::Key,
    principal: &Principal,
) -> Result<E, DomainError>
where
    E: OwnedEntity + 'static,
{
    let decision = evaluate_ownership_or_admin(store, id, principal).await?;

    if let AccessDecision::Denied(reason) = &decision {
        record_access_denied("ownership_or_admin");
        debug!(
            resource = E::RESOURCE_NAME,
            id = %id.as_str(),
            user_id = %principal.user_id,
            reason = %reason,
            "Access denied"
        );
    }

    decision.into_result(E::RESOURCE_NAME, id.as_str())
}

/// Boolean probe for display logic; storage failures count as "not owner"
pub async fn is_resource_owner<E>(store: &dyn Storage<E>, id: &E::Key, user_id: &UserId) -> bool
where
    E: OwnedEntity + 'static,
{
    match evaluate_ownership(store, id, user_id).await {
        Ok(decision) => decision.is_allowed(),
        Err(e) => {
            warn!(
                resource = E::RESOURCE_NAME,
                id = %id.as_str(),
                error = %e,
                "Ownership probe failed"
            );
            false
        }
    }
}

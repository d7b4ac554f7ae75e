//! Outcome of an access check

use crate::domain::DomainError;

/// Tri-state result of an ownership evaluation
///
/// `NotFound` is also returned when the resource exists but the check hides
/// its existence from the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessDecision<E> {
    Allowed(E),
    Denied(String),
    NotFound,
}

impl<E> AccessDecision<E> {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    /// Convert to a result, naming the resource in the not-found message
    pub fn into_result(self, resource: &str, id: &str) -> Result<E, DomainError> {
        match self {
            Self::Allowed(entity) => Ok(entity),
            Self::Denied(reason) => Err(DomainError::forbidden(reason)),
            Self::NotFound => Err(DomainError::not_found(format!(
                "{} '{}' not found",
                resource, id
            ))),
        }
    }

    pub fn allowed(self) -> Option<E> {
        match self {
            Self::Allowed(entity) => Some(entity),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result_maps_each_state() {
        let allowed: AccessDecision<u32> = AccessDecision::Allowed(7);
        assert_eq!(allowed.into_result("Project", "p").unwrap(), 7);

        let denied: AccessDecision<u32> = AccessDecision::Denied("nope".to_string());
        assert!(denied.into_result("Project", "p").unwrap_err().is_forbidden());

        let missing: AccessDecision<u32> = AccessDecision::NotFound;
        let err = missing.into_result("Project", "p-1").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: Project 'p-1' not found");
    }

    #[test]
    fn test_allowed_accessor() {
        assert_eq!(AccessDecision::Allowed("x").allowed(), Some("x"));
        assert_eq!(AccessDecision::<&str>::NotFound.allowed(), None);
        assert!(!AccessDecision::<()>::Denied(String::new()).is_allowed());
    }
}

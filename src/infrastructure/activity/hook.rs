//! Derive audit entries from HTTP requests

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::activity::{ActivityAction, EntityType};

/// `/api/<entity type>/<uuid>`, optionally followed by more segments
static ENTITY_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^/api/([A-Za-z0-9_-]+)/([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})(?:/|$)",
    )
    .unwrap()
});

const EXCLUDED_PATHS: &[&str] = &["/health", "/ready", "/live", "/metrics"];
const ACTIVITY_LOG_PATH: &str = "/api/activity-logs";

/// What the auto hook records for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedActivity {
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub action: ActivityAction,
}

/// Health probes, metrics scrapes and the activity log itself are never audited
pub fn is_excluded_path(path: &str) -> bool {
    let path = strip_query(path);

    EXCLUDED_PATHS
        .iter()
        .any(|excluded| path == *excluded || path.starts_with(&format!("{}/", excluded)))
        || path.starts_with(ACTIVITY_LOG_PATH)
}

/// Map a request to an activity
///
/// Returns `None` for excluded paths, methods without a CRUD meaning, and
/// reads when `log_reads` is off.
pub fn derive_activity(method: &str, path: &str, log_reads: bool) -> Option<DerivedActivity> {
    if is_excluded_path(path) {
        return None;
    }

    let action = ActivityAction::from_http_method(method)?;
    if action.is_read() && !log_reads {
        return None;
    }

    let path = strip_query(path);

    let (entity_type, entity_id) = match ENTITY_PATH.captures(path) {
        Some(captures) => (
            EntityType::new(&captures[1]),
            Some(captures[2].to_ascii_lowercase()),
        ),
        None => (EntityType::new(EntityType::API), None),
    };

    Some(DerivedActivity {
        entity_type,
        entity_id,
        action,
    })
}

fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(path, _)| path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "6f9619ff-8b86-d011-b42d-00cf4fc964ff";

    #[test]
    fn test_entity_path_is_recognised() {
        let derived = derive_activity("DELETE", &format!("/api/projects/{}", ID), false).unwrap();

        assert_eq!(derived.entity_type.as_str(), "projects");
        assert_eq!(derived.entity_id.as_deref(), Some(ID));
        assert_eq!(derived.action.as_str(), "delete");
    }

    #[test]
    fn test_nested_path_and_query_string() {
        let path = format!("/api/api-keys/{}/rotate?force=true", ID.to_uppercase());
        let derived = derive_activity("POST", &path, false).unwrap();

        assert_eq!(derived.entity_type.as_str(), "api-keys");
        assert_eq!(derived.entity_id.as_deref(), Some(ID));
        assert_eq!(derived.action.as_str(), "create");
    }

    #[test]
    fn test_unmatched_path_falls_back_to_api() {
        let derived = derive_activity("POST", "/api/projects", false).unwrap();
        assert_eq!(derived.entity_type.as_str(), "api");
        assert!(derived.entity_id.is_none());

        // Not a UUID
        let derived = derive_activity("PUT", "/api/projects/42", false).unwrap();
        assert_eq!(derived.entity_type.as_str(), "api");
        assert!(derived.entity_id.is_none());
    }

    #[test]
    fn test_excluded_paths() {
        assert!(is_excluded_path("/health"));
        assert!(is_excluded_path("/ready"));
        assert!(is_excluded_path("/metrics?x=1"));
        assert!(is_excluded_path("/api/activity-logs"));
        assert!(is_excluded_path("/api/activity-logs?page=2"));
        assert!(!is_excluded_path("/healthcheck-report"));
        assert!(!is_excluded_path("/api/projects"));

        assert!(derive_activity("POST", "/api/activity-logs", true).is_none());
    }

    #[test]
    fn test_reads_follow_setting() {
        let path = format!("/api/projects/{}", ID);
        assert!(derive_activity("GET", &path, false).is_none());
        assert!(derive_activity("GET", &path, true).is_some());
    }

    #[test]
    fn test_unknown_method_ignored() {
        assert!(derive_activity("OPTIONS", "/api/projects", true).is_none());
        assert!(derive_activity("HEAD", "/api/projects", true).is_none());
    }
}

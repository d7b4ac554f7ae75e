//! Best-effort audit trail
//!
//! `log` only enqueues. A single background worker appends entries to the
//! store in arrival order; queue overflow and store failures are logged and
//! counted, never returned to the caller.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::access::Principal;
use crate::domain::activity::{ActivityAction, ActivityLogEntry, EntityType, RequestContext};
use crate::domain::pagination::{ListSpec, PageLimits, Paginated, PaginationQuery};
use crate::domain::storage::{Filter, Storage};
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::observability::record_activity_dropped;
use crate::infrastructure::pagination::paginate;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

const ACTIVITY_SEARCH_FIELDS: &[&str] = &["entity_type", "entity_id", "action"];
const ACTIVITY_SORT_FIELDS: &[&str] = &["created_at", "entity_type", "action"];

enum Command {
    Record(Box<ActivityLogEntry>),
    Flush(oneshot::Sender<()>),
}

/// Optional equality filters for activity listings
#[derive(Debug, Clone, Default)]
pub struct ActivityLogFilter {
    pub user_id: Option<UserId>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub action: Option<String>,
}

impl ActivityLogFilter {
    fn to_filter(&self) -> Filter {
        let mut filter = Filter::All;

        if let Some(user_id) = &self.user_id {
            filter = filter.and(Filter::eq("user_id", user_id.as_str()));
        }
        if let Some(entity_type) = &self.entity_type {
            filter = filter.and(Filter::eq("entity_type", entity_type.as_str()));
        }
        if let Some(entity_id) = &self.entity_id {
            filter = filter.and(Filter::eq("entity_id", entity_id.as_str()));
        }
        if let Some(action) = &self.action {
            filter = filter.and(Filter::eq("action", action.as_str()));
        }

        filter
    }
}

#[derive(Debug, Clone)]
pub struct ActivityLogger {
    sender: Option<mpsc::Sender<Command>>,
    store: Arc<dyn Storage<ActivityLogEntry>>,
    page_limits: PageLimits,
}

impl ActivityLogger {
    /// Spawn the background writer; must be called inside a tokio runtime
    pub fn start(
        store: Arc<dyn Storage<ActivityLogEntry>>,
        queue_capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let worker = tokio::spawn(run_worker(store.clone(), receiver));

        let logger = Self {
            sender: Some(sender),
            store,
            page_limits: PageLimits::default(),
        };

        (logger, worker)
    }

    /// A logger that discards every entry; listing still reads the store
    pub fn disabled(store: Arc<dyn Storage<ActivityLogEntry>>) -> Self {
        Self {
            sender: None,
            store,
            page_limits: PageLimits::default(),
        }
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.page_limits = limits;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Enqueue one audit entry and return immediately
    pub fn log(
        &self,
        user_id: Option<UserId>,
        entity_type: EntityType,
        entity_id: Option<String>,
        action: ActivityAction,
        details: Map<String, Value>,
        context: RequestContext,
    ) {
        self.record(ActivityLogEntry::new(
            user_id,
            entity_type,
            entity_id,
            action,
            details,
            context,
        ));
    }

    /// Enqueue a prepared entry
    pub fn record(&self, entry: ActivityLogEntry) {
        let Some(sender) = &self.sender else {
            return;
        };

        match sender.try_send(Command::Record(Box::new(entry))) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(Command::Record(entry))) => {
                warn!(
                    entity_type = %entry.entity_type,
                    action = %entry.action,
                    "Activity queue full, dropping entry"
                );
                record_activity_dropped("queue_full");
            }
            Err(_) => {
                warn!("Activity worker stopped, dropping entry");
                record_activity_dropped("closed");
            }
        }
    }

    /// Wait until every entry enqueued before this call has been handled
    pub async fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };

        let (done, wait) = oneshot::channel();
        if sender.send(Command::Flush(done)).await.is_err() {
            return;
        }
        let _ = wait.await;
    }

    /// Paginated listing; platform admins only
    pub async fn list(
        &self,
        principal: &Principal,
        query: &PaginationQuery,
        filter: &ActivityLogFilter,
    ) -> Result<Paginated<ActivityLogEntry>, DomainError> {
        if !principal.is_admin() {
            return Err(DomainError::forbidden(
                "Only administrators can view activity logs",
            ));
        }

        let spec = ListSpec::new(ACTIVITY_SEARCH_FIELDS, ACTIVITY_SORT_FIELDS, "created_at")
            .with_limits(self.page_limits);

        paginate(self.store.as_ref(), query, &spec, filter.to_filter()).await
    }
}

async fn run_worker(
    store: Arc<dyn Storage<ActivityLogEntry>>,
    mut receiver: mpsc::Receiver<Command>,
) {
    while let Some(command) = receiver.recv().await {
        match command {
            Command::Record(entry) => {
                let entity_type = entry.entity_type.clone();
                let action = entry.action.clone();

                if let Err(e) = store.create(*entry).await {
                    warn!(
                        entity_type = %entity_type,
                        action = %action,
                        error = %e,
                        "Failed to write activity log entry"
                    );
                    record_activity_dropped("store_error");
                }
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!("Activity worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::mock::MockStorage;
    use crate::domain::user::UserRole;
    use crate::infrastructure::storage::InMemoryStorage;

    fn log_create(logger: &ActivityLogger, user_id: &UserId, entity_id: &str) {
        logger.log(
            Some(user_id.clone()),
            EntityType::new(EntityType::PROJECT),
            Some(entity_id.to_string()),
            ActivityAction::new(ActivityAction::CREATE),
            Map::new(),
            RequestContext::default(),
        );
    }

    #[tokio::test]
    async fn test_entries_are_written_in_background() {
        let store = Arc::new(InMemoryStorage::<ActivityLogEntry>::new());
        let (logger, _worker) = ActivityLogger::start(store.clone(), 16);
        let user_id = UserId::generate();

        log_create(&logger, &user_id, "p-1");
        log_create(&logger, &user_id, "p-2");
        logger.flush().await;

        let entries = store.list().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.user_id.as_ref() == Some(&user_id)));
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let store = Arc::new(MockStorage::<ActivityLogEntry>::new().with_error("db down"));
        let (logger, _worker) = ActivityLogger::start(store.clone(), 16);

        log_create(&logger, &UserId::generate(), "p-1");
        logger.flush().await;

        // Worker survives the failure and keeps accepting entries
        store.set_error(None);
        log_create(&logger, &UserId::generate(), "p-2");
        logger.flush().await;

        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let store = Arc::new(InMemoryStorage::<ActivityLogEntry>::new());
        let (sender, _receiver) = mpsc::channel(1);
        let logger = ActivityLogger {
            sender: Some(sender),
            store,
            page_limits: PageLimits::default(),
        };

        // Nothing drains the queue: the second entry is dropped, not awaited
        log_create(&logger, &UserId::generate(), "p-1");
        log_create(&logger, &UserId::generate(), "p-2");
    }

    #[tokio::test]
    async fn test_stopped_worker_drops_silently() {
        let store = Arc::new(InMemoryStorage::<ActivityLogEntry>::new());
        let (logger, worker) = ActivityLogger::start(store.clone(), 4);
        worker.abort();
        let _ = worker.await;

        log_create(&logger, &UserId::generate(), "p-1");
        logger.flush().await;
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_logger_writes_nothing() {
        let store = Arc::new(InMemoryStorage::<ActivityLogEntry>::new());
        let logger = ActivityLogger::disabled(store.clone());
        assert!(!logger.is_enabled());

        log_create(&logger, &UserId::generate(), "p-1");
        logger.flush().await;
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_requires_admin_and_filters() {
        let store = Arc::new(InMemoryStorage::<ActivityLogEntry>::new());
        let (logger, _worker) = ActivityLogger::start(store, 16);
        let alice = UserId::generate();
        let bob = UserId::generate();

        log_create(&logger, &alice, "p-1");
        log_create(&logger, &alice, "p-2");
        log_create(&logger, &bob, "p-3");
        logger.flush().await;

        let member = Principal::new(alice.clone(), UserRole::Member);
        let err = logger
            .list(&member, &PaginationQuery::default(), &ActivityLogFilter::default())
            .await
            .unwrap_err();
        assert!(err.is_forbidden());

        let admin = Principal::new(UserId::generate(), UserRole::Admin);
        let filter = ActivityLogFilter {
            user_id: Some(alice),
            ..Default::default()
        };
        let page = logger
            .list(&admin, &PaginationQuery::default(), &filter)
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 2);
    }
}

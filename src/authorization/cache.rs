//! Request-keyed decision cache
//!
//! Wraps an [`AuthorizationService`] with three caches keyed by the full
//! request value. Concurrent misses for the same key join one computation.
//! Rule mutations invalidate whole caches through the event listener hook
//! rather than expiring entries piecemeal.

use crate::authorization::engine::AuthorizationService;
use crate::authorization::request::{
    AccessInfo, AccessRequest, AccessSummary, AccessSummaryRequest, AdminAccessInfo,
    AdminAccessRequest,
};
use crate::config::CacheConfig;
use crate::error::{AccessError, AccessResult};
use crate::service::{AdminRuleEvent, ListenerError, RuleEvent, RuleEventListener};
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Caching front for the decision engine
pub struct CachingAuthorization {
    inner: Arc<dyn AuthorizationService>,
    data: Cache<AccessRequest, AccessInfo>,
    admin: Cache<AdminAccessRequest, AdminAccessInfo>,
    summaries: Cache<AccessSummaryRequest, AccessSummary>,
}

impl CachingAuthorization {
    pub fn new(inner: Arc<dyn AuthorizationService>, config: &CacheConfig) -> Self {
        fn build<K, V>(config: &CacheConfig) -> Cache<K, V>
        where
            K: std::hash::Hash + Eq + Send + Sync + 'static,
            V: Clone + Send + Sync + 'static,
        {
            Cache::builder()
                .max_capacity(config.capacity)
                .time_to_live(Duration::from_secs(config.ttl_secs))
                .build()
        }
        Self {
            inner,
            data: build(config),
            admin: build(config),
            summaries: build(config),
        }
    }

    fn unwrap_shared(error: Arc<AccessError>) -> AccessError {
        (*error).clone()
    }
}

#[async_trait]
impl AuthorizationService for CachingAuthorization {
    async fn get_access_info(&self, request: &AccessRequest) -> AccessResult<AccessInfo> {
        let inner = Arc::clone(&self.inner);
        let key = request.clone();
        self.data
            .try_get_with(key.clone(), async move { inner.get_access_info(&key).await })
            .await
            .map_err(Self::unwrap_shared)
    }

    async fn get_admin_authorization(
        &self,
        request: &AdminAccessRequest,
    ) -> AccessResult<AdminAccessInfo> {
        let inner = Arc::clone(&self.inner);
        let key = request.clone();
        self.admin
            .try_get_with(key.clone(), async move {
                inner.get_admin_authorization(&key).await
            })
            .await
            .map_err(Self::unwrap_shared)
    }

    async fn get_user_access_summary(
        &self,
        request: &AccessSummaryRequest,
    ) -> AccessResult<AccessSummary> {
        let inner = Arc::clone(&self.inner);
        let key = request.clone();
        self.summaries
            .try_get_with(key.clone(), async move {
                inner.get_user_access_summary(&key).await
            })
            .await
            .map_err(Self::unwrap_shared)
    }
}

#[async_trait]
impl RuleEventListener for CachingAuthorization {
    async fn on_rule_event(&self, event: &RuleEvent) -> Result<(), ListenerError> {
        debug!(kind = ?event.kind, rules = event.ids.len(), "invalidating decision caches");
        self.data.invalidate_all();
        self.summaries.invalidate_all();
        Ok(())
    }

    async fn on_admin_rule_event(&self, event: &AdminRuleEvent) -> Result<(), ListenerError> {
        debug!(kind = ?event.kind, rules = event.ids.len(), "invalidating admin caches");
        self.admin.invalidate_all();
        self.summaries.invalidate_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RuleId;
    use crate::service::RuleEvent;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts engine invocations so tests can observe cache hits
    struct CountingEngine {
        calls: AtomicUsize,
    }

    impl CountingEngine {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthorizationService for CountingEngine {
        async fn get_access_info(&self, _request: &AccessRequest) -> AccessResult<AccessInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AccessInfo::deny_all())
        }

        async fn get_admin_authorization(
            &self,
            _request: &AdminAccessRequest,
        ) -> AccessResult<AdminAccessInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AdminAccessInfo::not_admin())
        }

        async fn get_user_access_summary(
            &self,
            _request: &AccessSummaryRequest,
        ) -> AccessResult<AccessSummary> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AccessSummary::default())
        }
    }

    fn caching() -> (Arc<CountingEngine>, CachingAuthorization) {
        let engine = Arc::new(CountingEngine::new());
        let cache = CachingAuthorization::new(
            Arc::clone(&engine) as Arc<dyn AuthorizationService>,
            &CacheConfig::default(),
        );
        (engine, cache)
    }

    #[tokio::test]
    async fn test_repeated_requests_hit_the_cache() {
        let (engine, cache) = caching();
        let request = AccessRequest::new().with_user("alice").with_workspace("topp");

        cache.get_access_info(&request).await.unwrap();
        cache.get_access_info(&request).await.unwrap();
        cache.get_access_info(&request).await.unwrap();
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_distinct_requests_compute_separately() {
        let (engine, cache) = caching();

        cache
            .get_access_info(&AccessRequest::new().with_user("alice"))
            .await
            .unwrap();
        cache
            .get_access_info(&AccessRequest::new().with_user("bob"))
            .await
            .unwrap();
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn test_rule_event_forces_recomputation() {
        let (engine, cache) = caching();
        let request = AccessRequest::new().with_user("alice");

        cache.get_access_info(&request).await.unwrap();
        cache
            .on_rule_event(&RuleEvent::created(RuleId::new(1)))
            .await
            .unwrap();
        cache.get_access_info(&request).await.unwrap();
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn test_admin_event_leaves_data_cache_alone() {
        let (engine, cache) = caching();
        let request = AccessRequest::new().with_user("alice");
        let admin_request = AdminAccessRequest::new().with_user("alice");

        cache.get_access_info(&request).await.unwrap();
        cache.get_admin_authorization(&admin_request).await.unwrap();
        cache
            .on_admin_rule_event(&AdminRuleEvent::created(RuleId::new(1)))
            .await
            .unwrap();

        // Data decisions survive; admin decisions recompute.
        cache.get_access_info(&request).await.unwrap();
        cache.get_admin_authorization(&admin_request).await.unwrap();
        assert_eq!(engine.calls(), 3);
    }

    #[tokio::test]
    async fn test_summary_invalidated_by_both_event_kinds() {
        let (engine, cache) = caching();
        let request = AccessSummaryRequest::new().with_user("alice");

        cache.get_user_access_summary(&request).await.unwrap();
        cache
            .on_rule_event(&RuleEvent::deleted(RuleId::new(1)))
            .await
            .unwrap();
        cache.get_user_access_summary(&request).await.unwrap();
        cache
            .on_admin_rule_event(&AdminRuleEvent::created(RuleId::new(2)))
            .await
            .unwrap();
        cache.get_user_access_summary(&request).await.unwrap();
        assert_eq!(engine.calls(), 3);
    }
}

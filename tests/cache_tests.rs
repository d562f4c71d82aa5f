//! Decision cache integration tests
//!
//! Wires the full stack together: admin service -> event publisher ->
//! caching authorization front. Mutating a rule through the service must
//! invalidate cached decisions before the mutation call returns.

use geogate::authorization::{
    AccessRequest, AuthorizationService, CachingAuthorization, RuleAuthorizationEngine,
};
use geogate::config::CacheConfig;
use geogate::model::{InsertPosition, Rule, RuleIdentifier};
use geogate::service::{FanoutPublisher, RuleAdminService, RuleEventListener};
use geogate::store::{MemoryAdminRuleStore, MemoryRuleStore};
use std::sync::Arc;

struct Stack {
    service: RuleAdminService,
    cache: Arc<CachingAuthorization>,
}

fn stack() -> Stack {
    let rules = Arc::new(MemoryRuleStore::new());
    let admin_rules = Arc::new(MemoryAdminRuleStore::new());
    let engine = Arc::new(RuleAuthorizationEngine::new(rules.clone(), admin_rules));
    let cache = Arc::new(CachingAuthorization::new(engine, &CacheConfig::default()));
    let publisher = Arc::new(FanoutPublisher::new(vec![
        cache.clone() as Arc<dyn RuleEventListener>,
    ]));
    let service = RuleAdminService::new(rules, publisher);
    Stack { service, cache }
}

#[tokio::test]
async fn test_decisions_reflect_mutations_immediately() {
    let stack = stack();
    let request = AccessRequest::new().with_workspace("topp");

    // No rules yet: denied, and the denial is now cached.
    let before = stack.cache.get_access_info(&request).await.unwrap();
    assert!(!before.is_allowed());

    stack
        .service
        .insert(
            Rule::new(RuleIdentifier::allow().with_workspace("topp")).with_priority(1),
            InsertPosition::Fixed,
        )
        .await
        .unwrap();

    // The insert published its event synchronously, so the stale denial is
    // already gone.
    let after = stack.cache.get_access_info(&request).await.unwrap();
    assert!(after.is_allowed());
}

#[tokio::test]
async fn test_deleting_the_granting_rule_revokes_access() {
    let stack = stack();
    let request = AccessRequest::new().with_workspace("topp");

    let stored = stack
        .service
        .insert(
            Rule::new(RuleIdentifier::allow().with_workspace("topp")).with_priority(1),
            InsertPosition::Fixed,
        )
        .await
        .unwrap();
    assert!(stack.cache.get_access_info(&request).await.unwrap().is_allowed());

    stack.service.delete(stored.id.unwrap()).await.unwrap();
    assert!(!stack.cache.get_access_info(&request).await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_summaries_track_mutations_too() {
    use geogate::authorization::AccessSummaryRequest;

    let stack = stack();
    let request = AccessSummaryRequest::new().with_user("alice");

    let empty = stack.cache.get_user_access_summary(&request).await.unwrap();
    assert!(empty.is_empty());

    stack
        .service
        .insert(
            Rule::new(RuleIdentifier::allow().with_workspace("topp")).with_priority(1),
            InsertPosition::Fixed,
        )
        .await
        .unwrap();

    let refreshed = stack.cache.get_user_access_summary(&request).await.unwrap();
    assert!(refreshed.workspace("topp").is_some());
}

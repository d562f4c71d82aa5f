//! Workspace-administration rule administration

use crate::error::{RuleError, RuleResult, StoreError};
use crate::filter::AdminRuleQuery;
use crate::model::{AdminRule, InsertPosition, RuleId};
use crate::service::events::{AdminRuleEvent, EventPublisher};
use crate::service::priority::PriorityResolver;
use crate::store::AdminRuleRepository;
use std::sync::Arc;
use tracing::{debug, info};

/// CRUD orchestration over the admin rule table
///
/// Mirrors [`crate::service::RuleAdminService`] with the coarser AdminRule
/// model and its own priority sequence and event stream.
pub struct AdminRuleAdminService {
    repo: Arc<dyn AdminRuleRepository>,
    resolver: PriorityResolver<dyn AdminRuleRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl AdminRuleAdminService {
    pub fn new(repo: Arc<dyn AdminRuleRepository>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            resolver: PriorityResolver::new(repo.clone()),
            repo,
            publisher,
        }
    }

    pub async fn insert(&self, rule: AdminRule, position: InsertPosition) -> RuleResult<AdminRule> {
        if let Some(id) = rule.id {
            return Err(RuleError::IdentifierPresent(id));
        }

        let _serial = self.resolver.serialized().await;
        self.check_identifier_unique(&rule, None).await?;
        let priority = self
            .resolver
            .resolve_final_priority(rule.priority, position)
            .await?;
        let stored = self.repo.insert(rule.with_priority(priority)).await?;
        drop(_serial);

        let id = stored_id(&stored)?;
        info!(%id, priority, "admin rule created");
        self.publisher
            .publish_admin_rule_event(AdminRuleEvent::created(id))
            .await;
        Ok(stored)
    }

    pub async fn update(&self, rule: AdminRule) -> RuleResult<AdminRule> {
        let id = rule.id.ok_or(RuleError::IdentifierMissing)?;

        let _serial = self.resolver.serialized().await;
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(RuleError::NotFound(id))?;
        self.check_identifier_unique(&rule, Some(id)).await?;

        let priority = self
            .resolver
            .resolve_priority_update(existing.priority, rule.priority)
            .await?;
        let stored = self.repo.save(rule.with_priority(priority)).await?;
        drop(_serial);

        info!(%id, priority, "admin rule updated");
        self.publisher
            .publish_admin_rule_event(AdminRuleEvent::updated(id))
            .await;
        Ok(stored)
    }

    pub async fn delete(&self, id: RuleId) -> RuleResult<bool> {
        let _serial = self.resolver.serialized().await;
        let removed = self.repo.delete_by_id(id).await?;
        drop(_serial);

        if removed {
            info!(%id, "admin rule deleted");
            self.publisher
                .publish_admin_rule_event(AdminRuleEvent::deleted(id))
                .await;
        } else {
            debug!(%id, "delete of unknown admin rule ignored");
        }
        Ok(removed)
    }

    pub async fn shift(&self, start: i64, offset: i64) -> RuleResult<i64> {
        let _serial = self.resolver.serialized().await;
        let affected = self.repo.ids_with_priority_at_least(start).await?;
        let count = self.resolver.shift(start, offset).await?;
        drop(_serial);

        if count > 0 {
            info!(start, offset, count, "admin rules shifted");
            self.publisher
                .publish_admin_rule_event(AdminRuleEvent::updated_many(affected))
                .await;
        }
        Ok(count.max(0))
    }

    pub async fn swap(&self, first: RuleId, second: RuleId) -> RuleResult<()> {
        let _serial = self.resolver.serialized().await;
        self.resolver.swap(first, second).await?;
        drop(_serial);

        info!(%first, %second, "admin rule priorities swapped");
        self.publisher
            .publish_admin_rule_event(AdminRuleEvent::updated_many([first, second]))
            .await;
        Ok(())
    }

    pub async fn get(&self, id: RuleId) -> RuleResult<AdminRule> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(RuleError::NotFound(id))
    }

    pub async fn get_all(&self, query: &AdminRuleQuery) -> RuleResult<Vec<AdminRule>> {
        Ok(self.repo.find_all(query).await?)
    }

    pub async fn count(&self, query: &AdminRuleQuery) -> RuleResult<usize> {
        Ok(self.repo.count(query).await?)
    }

    pub async fn exists(&self, id: RuleId) -> RuleResult<bool> {
        Ok(self.repo.exists(id).await?)
    }

    async fn check_identifier_unique(
        &self,
        rule: &AdminRule,
        excluding: Option<RuleId>,
    ) -> RuleResult<()> {
        if let Some(existing) = self.repo.find_by_identifier(&rule.identifier).await? {
            let existing_id = stored_id(&existing)?;
            if Some(existing_id) != excluding {
                return Err(RuleError::DuplicateIdentifier {
                    existing: existing_id,
                });
            }
        }
        Ok(())
    }
}

fn stored_id(rule: &AdminRule) -> Result<RuleId, StoreError> {
    rule.id
        .ok_or_else(|| StoreError::Corrupted("stored admin rule without an id".into()))
}

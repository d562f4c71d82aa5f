//! Data-access rule administration

use crate::error::{RuleError, RuleResult, StoreError};
use crate::filter::RuleQuery;
use crate::model::{InsertPosition, Rule, RuleId};
use crate::service::events::{EventPublisher, RuleEvent};
use crate::service::priority::PriorityResolver;
use crate::store::RuleRepository;
use std::sync::Arc;
use tracing::{debug, info};

/// CRUD orchestration over the data-access rule table
///
/// Enforces the identifier-uniqueness and priority invariants and emits
/// exactly one [`RuleEvent`] per successful mutation, after the store commit.
pub struct RuleAdminService {
    repo: Arc<dyn RuleRepository>,
    resolver: PriorityResolver<dyn RuleRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl RuleAdminService {
    pub fn new(repo: Arc<dyn RuleRepository>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            resolver: PriorityResolver::new(repo.clone()),
            repo,
            publisher,
        }
    }

    /// Insert a new rule, resolving its priority per `position`
    ///
    /// The rule must not carry an id. Returns the stored rule with its
    /// assigned id and final priority.
    pub async fn insert(&self, rule: Rule, position: InsertPosition) -> RuleResult<Rule> {
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
        info!(%id, priority, "rule created");
        self.publisher.publish_rule_event(RuleEvent::created(id)).await;
        Ok(stored)
    }

    /// Update an existing rule, relocating its priority if changed
    pub async fn update(&self, rule: Rule) -> RuleResult<Rule> {
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

        info!(%id, priority, "rule updated");
        self.publisher.publish_rule_event(RuleEvent::updated(id)).await;
        Ok(stored)
    }

    /// Delete a rule; `false` when the id was absent
    pub async fn delete(&self, id: RuleId) -> RuleResult<bool> {
        let _serial = self.resolver.serialized().await;
        let removed = self.repo.delete_by_id(id).await?;
        drop(_serial);

        if removed {
            info!(%id, "rule deleted");
            self.publisher.publish_rule_event(RuleEvent::deleted(id)).await;
        } else {
            debug!(%id, "delete of unknown rule ignored");
        }
        Ok(removed)
    }

    /// Shift every rule with priority >= `start` by `offset`
    ///
    /// Returns the number of rules shifted (0 when none matched) and emits a
    /// single UPDATED event carrying all affected ids.
    pub async fn shift(&self, start: i64, offset: i64) -> RuleResult<i64> {
        let _serial = self.resolver.serialized().await;
        let affected = self.repo.ids_with_priority_at_least(start).await?;
        let count = self.resolver.shift(start, offset).await?;
        drop(_serial);

        if count > 0 {
            info!(start, offset, count, "rules shifted");
            self.publisher
                .publish_rule_event(RuleEvent::updated_many(affected))
                .await;
        }
        Ok(count.max(0))
    }

    /// Exchange the priorities of two rules
    pub async fn swap(&self, first: RuleId, second: RuleId) -> RuleResult<()> {
        let _serial = self.resolver.serialized().await;
        self.resolver.swap(first, second).await?;
        drop(_serial);

        info!(%first, %second, "rule priorities swapped");
        self.publisher
            .publish_rule_event(RuleEvent::updated_many([first, second]))
            .await;
        Ok(())
    }

    pub async fn get(&self, id: RuleId) -> RuleResult<Rule> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(RuleError::NotFound(id))
    }

    pub async fn get_all(&self, query: &RuleQuery) -> RuleResult<Vec<Rule>> {
        Ok(self.repo.find_all(query).await?)
    }

    pub async fn count(&self, query: &RuleQuery) -> RuleResult<usize> {
        Ok(self.repo.count(query).await?)
    }

    pub async fn exists(&self, id: RuleId) -> RuleResult<bool> {
        Ok(self.repo.exists(id).await?)
    }

    async fn check_identifier_unique(
        &self,
        rule: &Rule,
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

fn stored_id(rule: &Rule) -> Result<RuleId, StoreError> {
    rule.id
        .ok_or_else(|| StoreError::Corrupted("stored rule without an id".into()))
}

//! Repository traits

use crate::error::StoreResult;
use crate::filter::{AdminRuleQuery, RuleQuery};
use crate::model::{AdminRule, AdminRuleIdentifier, Rule, RuleId, RuleIdentifier};
// async_trait required for dyn-compatibility with Arc<dyn RuleRepository>
use async_trait::async_trait;

/// Priority-index operations shared by both rule tables
///
/// These are the only operations the priority resolver needs; they are split
/// out so one resolver implementation serves both tables.
#[async_trait]
pub trait PriorityRepository: Send + Sync {
    /// Id of the rule currently holding this priority, if any
    async fn find_id_by_priority(&self, priority: i64) -> StoreResult<Option<RuleId>>;

    /// Current priority of a rule
    async fn priority_of(&self, id: RuleId) -> StoreResult<Option<i64>>;

    async fn min_priority(&self) -> StoreResult<Option<i64>>;

    async fn max_priority(&self) -> StoreResult<Option<i64>>;

    /// Shift every rule with priority >= `start` by `offset`
    ///
    /// Returns the number of rules shifted, or `-1` when nothing matched
    /// (the historical no-op sentinel kept at the port; services normalize
    /// it for callers).
    async fn shift_priorities(&self, start: i64, offset: i64) -> StoreResult<i64>;

    /// Ids of rules a `shift_priorities(start, ..)` call would touch,
    /// ascending by priority
    async fn ids_with_priority_at_least(&self, start: i64) -> StoreResult<Vec<RuleId>>;

    /// Relocate a single rule to a new priority
    async fn set_priority(&self, id: RuleId, priority: i64) -> StoreResult<()>;

    /// Exchange the priorities of two rules
    async fn swap(&self, first: RuleId, second: RuleId) -> StoreResult<()>;
}

/// Storage port for data-access rules
#[async_trait]
pub trait RuleRepository: PriorityRepository {
    /// Insert a new rule, assigning its id; the priority slot must be free
    async fn insert(&self, rule: Rule) -> StoreResult<Rule>;

    /// Overwrite an existing rule (matched by id)
    async fn save(&self, rule: Rule) -> StoreResult<Rule>;

    /// Remove a rule; `false` when the id was absent
    async fn delete_by_id(&self, id: RuleId) -> StoreResult<bool>;

    async fn find_by_id(&self, id: RuleId) -> StoreResult<Option<Rule>>;

    async fn find_one_by_priority(&self, priority: i64) -> StoreResult<Option<Rule>>;

    /// Look up a rule by its exact (grant, identifier) pair
    async fn find_by_identifier(&self, identifier: &RuleIdentifier) -> StoreResult<Option<Rule>>;

    /// All rules matching the query, ascending by priority
    async fn find_all(&self, query: &RuleQuery) -> StoreResult<Vec<Rule>>;

    async fn count(&self, query: &RuleQuery) -> StoreResult<usize>;

    async fn exists(&self, id: RuleId) -> StoreResult<bool>;
}

/// Storage port for workspace-administration rules
#[async_trait]
pub trait AdminRuleRepository: PriorityRepository {
    async fn insert(&self, rule: AdminRule) -> StoreResult<AdminRule>;

    async fn save(&self, rule: AdminRule) -> StoreResult<AdminRule>;

    async fn delete_by_id(&self, id: RuleId) -> StoreResult<bool>;

    async fn find_by_id(&self, id: RuleId) -> StoreResult<Option<AdminRule>>;

    async fn find_one_by_priority(&self, priority: i64) -> StoreResult<Option<AdminRule>>;

    async fn find_by_identifier(
        &self,
        identifier: &AdminRuleIdentifier,
    ) -> StoreResult<Option<AdminRule>>;

    async fn find_all(&self, query: &AdminRuleQuery) -> StoreResult<Vec<AdminRule>>;

    async fn count(&self, query: &AdminRuleQuery) -> StoreResult<usize>;

    async fn exists(&self, id: RuleId) -> StoreResult<bool>;
}

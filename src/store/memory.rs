//! In-memory reference stores
//!
//! Dual-indexed tables (id map + priority index) behind a `parking_lot`
//! RwLock. The lock is never held across an await point; every operation is
//! a short critical section over plain maps, so readers always observe a
//! consistent index with unique priorities.

use crate::error::{StoreError, StoreResult};
use crate::filter::{AdminRuleQuery, Pagination, RuleQuery};
use crate::model::{AdminRule, AdminRuleIdentifier, Rule, RuleId, RuleIdentifier};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::repository::{AdminRuleRepository, PriorityRepository, RuleRepository};

/// Record shape shared by both rule tables
trait TableRecord: Clone + Send + Sync + 'static {
    fn id(&self) -> Option<RuleId>;
    fn assign_id(&mut self, id: RuleId);
    fn priority(&self) -> i64;
    fn set_priority(&mut self, priority: i64);
}

impl TableRecord for Rule {
    fn id(&self) -> Option<RuleId> {
        self.id
    }

    fn assign_id(&mut self, id: RuleId) {
        self.id = Some(id);
    }

    fn priority(&self) -> i64 {
        self.priority
    }

    fn set_priority(&mut self, priority: i64) {
        self.priority = priority;
    }
}

impl TableRecord for AdminRule {
    fn id(&self) -> Option<RuleId> {
        self.id
    }

    fn assign_id(&mut self, id: RuleId) {
        self.id = Some(id);
    }

    fn priority(&self) -> i64 {
        self.priority
    }

    fn set_priority(&mut self, priority: i64) {
        self.priority = priority;
    }
}

struct TableState<R> {
    by_id: BTreeMap<RuleId, R>,
    by_priority: BTreeMap<i64, RuleId>,
    next_id: i64,
}

impl<R> TableState<R> {
    fn new() -> Self {
        Self {
            by_id: BTreeMap::new(),
            by_priority: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// Dual-indexed table over one record type
struct MemoryTable<R: TableRecord> {
    state: RwLock<TableState<R>>,
}

impl<R: TableRecord> MemoryTable<R> {
    fn new() -> Self {
        Self {
            state: RwLock::new(TableState::new()),
        }
    }

    fn insert(&self, mut record: R) -> StoreResult<R> {
        let mut state = self.state.write();
        let priority = record.priority();
        if state.by_priority.contains_key(&priority) {
            // The resolver frees the slot before insertion; an occupied slot
            // here means the priority invariant was bypassed.
            return Err(StoreError::Corrupted(format!(
                "priority {priority} already occupied"
            )));
        }
        let id = RuleId::new(state.next_id);
        state.next_id += 1;
        record.assign_id(id);
        state.by_priority.insert(priority, id);
        state.by_id.insert(id, record.clone());
        Ok(record)
    }

    fn save(&self, record: R) -> StoreResult<R> {
        let mut state = self.state.write();
        let id = record
            .id()
            .ok_or_else(|| StoreError::Corrupted("save of a record without an id".into()))?;
        let previous = state.by_id.get(&id).ok_or(StoreError::NotFound(id))?;
        let old_priority = previous.priority();
        let new_priority = record.priority();
        if new_priority != old_priority {
            if let Some(occupant) = state.by_priority.get(&new_priority)
                && *occupant != id
            {
                return Err(StoreError::Corrupted(format!(
                    "priority {new_priority} already occupied"
                )));
            }
            state.by_priority.remove(&old_priority);
            state.by_priority.insert(new_priority, id);
        }
        state.by_id.insert(id, record.clone());
        Ok(record)
    }

    fn delete(&self, id: RuleId) -> bool {
        let mut state = self.state.write();
        match state.by_id.remove(&id) {
            Some(record) => {
                state.by_priority.remove(&record.priority());
                true
            }
            None => false,
        }
    }

    fn find_by_id(&self, id: RuleId) -> Option<R> {
        self.state.read().by_id.get(&id).cloned()
    }

    fn find_by_priority(&self, priority: i64) -> Option<R> {
        let state = self.state.read();
        let id = state.by_priority.get(&priority)?;
        state.by_id.get(id).cloned()
    }

    fn find_id_by_priority(&self, priority: i64) -> Option<RuleId> {
        self.state.read().by_priority.get(&priority).copied()
    }

    fn priority_of(&self, id: RuleId) -> Option<i64> {
        self.state.read().by_id.get(&id).map(|r| r.priority())
    }

    fn min_priority(&self) -> Option<i64> {
        self.state.read().by_priority.keys().next().copied()
    }

    fn max_priority(&self) -> Option<i64> {
        self.state.read().by_priority.keys().next_back().copied()
    }

    /// Records matching `predicate`, ascending by priority
    fn find_where(&self, predicate: impl Fn(&R) -> bool, page: Option<Pagination>) -> Vec<R> {
        let state = self.state.read();
        let matches = state
            .by_priority
            .values()
            .filter_map(|id| state.by_id.get(id))
            .filter(|record| predicate(record))
            .cloned();
        match page {
            Some(page) => matches.skip(page.offset).take(page.limit).collect(),
            None => matches.collect(),
        }
    }

    fn count_where(&self, predicate: impl Fn(&R) -> bool) -> usize {
        let state = self.state.read();
        state
            .by_priority
            .values()
            .filter_map(|id| state.by_id.get(id))
            .filter(|record| predicate(record))
            .count()
    }

    /// Shift every record with priority >= `start` by `offset`
    ///
    /// Positive offsets are applied highest-priority-first so that no target
    /// slot is ever transiently occupied; negative offsets lowest-first. A
    /// collision with an unshifted record (only reachable with a negative
    /// offset) is reported, never silently resolved.
    fn shift(&self, start: i64, offset: i64) -> StoreResult<i64> {
        if offset == 0 {
            return Ok(-1);
        }
        let mut state = self.state.write();
        let mut affected: Vec<i64> = state.by_priority.range(start..).map(|(p, _)| *p).collect();
        if affected.is_empty() {
            return Ok(-1);
        }
        if offset > 0 {
            affected.reverse();
        }
        let count = affected.len() as i64;
        for priority in affected {
            let target = priority + offset;
            if state.by_priority.contains_key(&target) {
                return Err(StoreError::Corrupted(format!(
                    "shift collision at priority {target}"
                )));
            }
            let id = match state.by_priority.remove(&priority) {
                Some(id) => id,
                None => {
                    return Err(StoreError::Corrupted(format!(
                        "priority index lost entry {priority}"
                    )));
                }
            };
            state.by_priority.insert(target, id);
            if let Some(record) = state.by_id.get_mut(&id) {
                record.set_priority(target);
            }
        }
        Ok(count)
    }

    fn ids_with_priority_at_least(&self, start: i64) -> Vec<RuleId> {
        self.state
            .read()
            .by_priority
            .range(start..)
            .map(|(_, id)| *id)
            .collect()
    }

    fn set_priority(&self, id: RuleId, priority: i64) -> StoreResult<()> {
        let mut state = self.state.write();
        let current = match state.by_id.get(&id) {
            Some(record) => record.priority(),
            None => return Err(StoreError::NotFound(id)),
        };
        if current == priority {
            return Ok(());
        }
        if let Some(occupant) = state.by_priority.get(&priority)
            && *occupant != id
        {
            return Err(StoreError::Corrupted(format!(
                "priority {priority} already occupied"
            )));
        }
        state.by_priority.remove(&current);
        state.by_priority.insert(priority, id);
        if let Some(record) = state.by_id.get_mut(&id) {
            record.set_priority(priority);
        }
        Ok(())
    }

    fn swap(&self, first: RuleId, second: RuleId) -> StoreResult<()> {
        let mut state = self.state.write();
        let p1 = state
            .by_id
            .get(&first)
            .map(|r| r.priority())
            .ok_or(StoreError::NotFound(first))?;
        let p2 = state
            .by_id
            .get(&second)
            .map(|r| r.priority())
            .ok_or(StoreError::NotFound(second))?;
        state.by_priority.insert(p1, second);
        state.by_priority.insert(p2, first);
        if let Some(record) = state.by_id.get_mut(&first) {
            record.set_priority(p2);
        }
        if let Some(record) = state.by_id.get_mut(&second) {
            record.set_priority(p1);
        }
        Ok(())
    }
}

/// In-memory data-access rule store
pub struct MemoryRuleStore {
    table: MemoryTable<Rule>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self {
            table: MemoryTable::new(),
        }
    }
}

impl Default for MemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriorityRepository for MemoryRuleStore {
    async fn find_id_by_priority(&self, priority: i64) -> StoreResult<Option<RuleId>> {
        Ok(self.table.find_id_by_priority(priority))
    }

    async fn priority_of(&self, id: RuleId) -> StoreResult<Option<i64>> {
        Ok(self.table.priority_of(id))
    }

    async fn min_priority(&self) -> StoreResult<Option<i64>> {
        Ok(self.table.min_priority())
    }

    async fn max_priority(&self) -> StoreResult<Option<i64>> {
        Ok(self.table.max_priority())
    }

    async fn shift_priorities(&self, start: i64, offset: i64) -> StoreResult<i64> {
        self.table.shift(start, offset)
    }

    async fn ids_with_priority_at_least(&self, start: i64) -> StoreResult<Vec<RuleId>> {
        Ok(self.table.ids_with_priority_at_least(start))
    }

    async fn set_priority(&self, id: RuleId, priority: i64) -> StoreResult<()> {
        self.table.set_priority(id, priority)
    }

    async fn swap(&self, first: RuleId, second: RuleId) -> StoreResult<()> {
        self.table.swap(first, second)
    }
}

#[async_trait]
impl RuleRepository for MemoryRuleStore {
    async fn insert(&self, rule: Rule) -> StoreResult<Rule> {
        self.table.insert(rule)
    }

    async fn save(&self, rule: Rule) -> StoreResult<Rule> {
        self.table.save(rule)
    }

    async fn delete_by_id(&self, id: RuleId) -> StoreResult<bool> {
        Ok(self.table.delete(id))
    }

    async fn find_by_id(&self, id: RuleId) -> StoreResult<Option<Rule>> {
        Ok(self.table.find_by_id(id))
    }

    async fn find_one_by_priority(&self, priority: i64) -> StoreResult<Option<Rule>> {
        Ok(self.table.find_by_priority(priority))
    }

    async fn find_by_identifier(&self, identifier: &RuleIdentifier) -> StoreResult<Option<Rule>> {
        Ok(self
            .table
            .find_where(|rule| rule.identifier == *identifier, None)
            .into_iter()
            .next())
    }

    async fn find_all(&self, query: &RuleQuery) -> StoreResult<Vec<Rule>> {
        Ok(self
            .table
            .find_where(|rule| query.filter.matches(&rule.identifier), query.page))
    }

    async fn count(&self, query: &RuleQuery) -> StoreResult<usize> {
        Ok(self
            .table
            .count_where(|rule| query.filter.matches(&rule.identifier)))
    }

    async fn exists(&self, id: RuleId) -> StoreResult<bool> {
        Ok(self.table.find_by_id(id).is_some())
    }
}

/// In-memory admin rule store
pub struct MemoryAdminRuleStore {
    table: MemoryTable<AdminRule>,
}

impl MemoryAdminRuleStore {
    pub fn new() -> Self {
        Self {
            table: MemoryTable::new(),
        }
    }
}

impl Default for MemoryAdminRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriorityRepository for MemoryAdminRuleStore {
    async fn find_id_by_priority(&self, priority: i64) -> StoreResult<Option<RuleId>> {
        Ok(self.table.find_id_by_priority(priority))
    }

    async fn priority_of(&self, id: RuleId) -> StoreResult<Option<i64>> {
        Ok(self.table.priority_of(id))
    }

    async fn min_priority(&self) -> StoreResult<Option<i64>> {
        Ok(self.table.min_priority())
    }

    async fn max_priority(&self) -> StoreResult<Option<i64>> {
        Ok(self.table.max_priority())
    }

    async fn shift_priorities(&self, start: i64, offset: i64) -> StoreResult<i64> {
        self.table.shift(start, offset)
    }

    async fn ids_with_priority_at_least(&self, start: i64) -> StoreResult<Vec<RuleId>> {
        Ok(self.table.ids_with_priority_at_least(start))
    }

    async fn set_priority(&self, id: RuleId, priority: i64) -> StoreResult<()> {
        self.table.set_priority(id, priority)
    }

    async fn swap(&self, first: RuleId, second: RuleId) -> StoreResult<()> {
        self.table.swap(first, second)
    }
}

#[async_trait]
impl AdminRuleRepository for MemoryAdminRuleStore {
    async fn insert(&self, rule: AdminRule) -> StoreResult<AdminRule> {
        self.table.insert(rule)
    }

    async fn save(&self, rule: AdminRule) -> StoreResult<AdminRule> {
        self.table.save(rule)
    }

    async fn delete_by_id(&self, id: RuleId) -> StoreResult<bool> {
        Ok(self.table.delete(id))
    }

    async fn find_by_id(&self, id: RuleId) -> StoreResult<Option<AdminRule>> {
        Ok(self.table.find_by_id(id))
    }

    async fn find_one_by_priority(&self, priority: i64) -> StoreResult<Option<AdminRule>> {
        Ok(self.table.find_by_priority(priority))
    }

    async fn find_by_identifier(
        &self,
        identifier: &AdminRuleIdentifier,
    ) -> StoreResult<Option<AdminRule>> {
        Ok(self
            .table
            .find_where(|rule| rule.identifier == *identifier, None)
            .into_iter()
            .next())
    }

    async fn find_all(&self, query: &AdminRuleQuery) -> StoreResult<Vec<AdminRule>> {
        Ok(self
            .table
            .find_where(|rule| query.filter.matches(&rule.identifier), query.page))
    }

    async fn count(&self, query: &AdminRuleQuery) -> StoreResult<usize> {
        Ok(self
            .table
            .count_where(|rule| query.filter.matches(&rule.identifier)))
    }

    async fn exists(&self, id: RuleId) -> StoreResult<bool> {
        Ok(self.table.find_by_id(id).is_some())
    }
}

//! Priority resolution
//!
//! Priorities are a dense total order, unique per rule table. This resolver
//! computes final priorities for inserts and updates, cascading occupants
//! out of the way, and owns the per-table critical section that keeps the
//! invariant under concurrent mutation. A read-then-write without this
//! serialization reintroduces duplicate priorities under load.

use crate::error::{RuleError, RuleResult};
use crate::model::{InsertPosition, RuleId};
use crate::store::PriorityRepository;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};

/// Attempts to free a slot before the allocation is declared stuck.
///
/// With a serialized in-memory store one shift always settles the slot; the
/// budget guards against transactional backends that can lose a shift to a
/// concurrent writer and need the occupancy re-checked.
const MAX_ALLOCATION_ATTEMPTS: u32 = 8;

/// Priority allocator over one rule table
pub struct PriorityResolver<R: PriorityRepository + ?Sized> {
    repo: Arc<R>,
    table: Mutex<()>,
}

impl<R: PriorityRepository + ?Sized> PriorityResolver<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            table: Mutex::new(()),
        }
    }

    /// Enter the per-table critical section
    ///
    /// Callers must hold the guard across resolve + store mutation so that
    /// no other writer can take a freed slot in between.
    pub async fn serialized(&self) -> MutexGuard<'_, ()> {
        self.table.lock().await
    }

    /// Compute the final priority for a new rule
    ///
    /// FIXED uses the requested value exactly, shifting the occupant and
    /// everything above it by +1 first. FROM_START treats the request as an
    /// offset from the current minimum, FROM_END as an offset from the
    /// current maximum + 1; an empty table bases both at 0.
    pub async fn resolve_final_priority(
        &self,
        requested: i64,
        position: InsertPosition,
    ) -> RuleResult<i64> {
        let target = match position {
            InsertPosition::Fixed => requested,
            InsertPosition::FromStart => self.repo.min_priority().await?.unwrap_or(0) + requested,
            InsertPosition::FromEnd => {
                self.repo.max_priority().await?.map(|max| max + 1).unwrap_or(0) + requested
            }
        };
        trace!(requested, ?position, target, "resolved insert priority");
        self.free_slot(target).await?;
        Ok(target)
    }

    /// Compute the final priority for an updated rule
    ///
    /// No-op when unchanged; otherwise the occupant of the requested slot
    /// (and the rules above it) cascade up by +1 before the relocation.
    pub async fn resolve_priority_update(&self, current: i64, requested: i64) -> RuleResult<i64> {
        if current == requested {
            return Ok(current);
        }
        self.free_slot(requested).await?;
        Ok(requested)
    }

    /// Shift every rule with priority >= `start` by `offset`
    ///
    /// Returns the number of rules shifted, `-1` when nothing matched.
    pub async fn shift(&self, start: i64, offset: i64) -> RuleResult<i64> {
        Ok(self.repo.shift_priorities(start, offset).await?)
    }

    /// Exchange the priorities of two rules
    pub async fn swap(&self, first: RuleId, second: RuleId) -> RuleResult<()> {
        Ok(self.repo.swap(first, second).await?)
    }

    async fn free_slot(&self, priority: i64) -> RuleResult<()> {
        for attempt in 0..MAX_ALLOCATION_ATTEMPTS {
            match self.repo.find_id_by_priority(priority).await? {
                None => return Ok(()),
                Some(occupant) => {
                    debug!(priority, %occupant, attempt, "cascading occupant to free priority slot");
                    self.repo.shift_priorities(priority, 1).await?;
                }
            }
        }
        Err(RuleError::PriorityRetryExhausted {
            attempts: MAX_ALLOCATION_ATTEMPTS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Rule, RuleIdentifier};
    use crate::store::{MemoryRuleStore, RuleRepository};

    fn resolver(store: &Arc<MemoryRuleStore>) -> PriorityResolver<MemoryRuleStore> {
        PriorityResolver::new(store.clone())
    }

    async fn seed(store: &MemoryRuleStore, priorities: &[i64]) {
        for p in priorities {
            store
                .insert(
                    Rule::new(RuleIdentifier::allow().with_workspace(format!("ws{p}")))
                        .with_priority(*p),
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_fixed_on_free_slot_uses_requested_value() {
        let store = Arc::new(MemoryRuleStore::new());
        seed(&store, &[10]).await;
        let resolver = resolver(&store);
        let p = resolver
            .resolve_final_priority(42, InsertPosition::Fixed)
            .await
            .unwrap();
        assert_eq!(p, 42);
    }

    #[tokio::test]
    async fn test_fixed_on_occupied_slot_cascades_tail() {
        let store = Arc::new(MemoryRuleStore::new());
        seed(&store, &[10, 11, 20]).await;
        let resolver = resolver(&store);

        let p = resolver
            .resolve_final_priority(10, InsertPosition::Fixed)
            .await
            .unwrap();
        assert_eq!(p, 10);
        // Former occupants moved up, slot 10 is free
        assert!(store.find_id_by_priority(10).await.unwrap().is_none());
        assert!(store.find_id_by_priority(11).await.unwrap().is_some());
        assert!(store.find_id_by_priority(12).await.unwrap().is_some());
        assert!(store.find_id_by_priority(21).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_from_start_offsets_from_minimum() {
        let store = Arc::new(MemoryRuleStore::new());
        seed(&store, &[100, 200]).await;
        let resolver = resolver(&store);
        let p = resolver
            .resolve_final_priority(5, InsertPosition::FromStart)
            .await
            .unwrap();
        assert_eq!(p, 105);
    }

    #[tokio::test]
    async fn test_from_end_offsets_from_maximum_plus_one() {
        let store = Arc::new(MemoryRuleStore::new());
        seed(&store, &[100, 200]).await;
        let resolver = resolver(&store);
        let p = resolver
            .resolve_final_priority(3, InsertPosition::FromEnd)
            .await
            .unwrap();
        assert_eq!(p, 204);
    }

    #[tokio::test]
    async fn test_empty_table_bases_at_zero() {
        let store = Arc::new(MemoryRuleStore::new());
        let resolver = resolver(&store);
        assert_eq!(
            resolver
                .resolve_final_priority(7, InsertPosition::FromStart)
                .await
                .unwrap(),
            7
        );
        assert_eq!(
            resolver
                .resolve_final_priority(0, InsertPosition::FromEnd)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_update_to_same_priority_is_noop() {
        let store = Arc::new(MemoryRuleStore::new());
        seed(&store, &[10, 11]).await;
        let resolver = resolver(&store);
        assert_eq!(resolver.resolve_priority_update(10, 10).await.unwrap(), 10);
        // Nothing moved
        assert!(store.find_id_by_priority(10).await.unwrap().is_some());
        assert!(store.find_id_by_priority(11).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_to_occupied_priority_cascades_occupant() {
        let store = Arc::new(MemoryRuleStore::new());
        seed(&store, &[10, 20]).await;
        let resolver = resolver(&store);
        let p = resolver.resolve_priority_update(10, 20).await.unwrap();
        assert_eq!(p, 20);
        assert!(store.find_id_by_priority(20).await.unwrap().is_none());
        assert!(store.find_id_by_priority(21).await.unwrap().is_some());
    }
}

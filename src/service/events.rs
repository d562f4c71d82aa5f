//! Domain events for rule mutations
//!
//! Every successful mutation emits exactly one event carrying the affected
//! ids. The publisher is constructor-injected into the services (no ambient
//! mutable state) and fans out to listeners: the in-process cache
//! invalidation hook, and optionally a cross-instance bus relay owned by the
//! embedding adapter.

use crate::model::RuleId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// What happened to the affected rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleEventKind {
    Created,
    Updated,
    Deleted,
}

/// A data-access rule mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEvent {
    pub kind: RuleEventKind,
    pub ids: BTreeSet<RuleId>,
}

impl RuleEvent {
    pub fn created(id: RuleId) -> Self {
        Self {
            kind: RuleEventKind::Created,
            ids: BTreeSet::from([id]),
        }
    }

    pub fn updated(id: RuleId) -> Self {
        Self {
            kind: RuleEventKind::Updated,
            ids: BTreeSet::from([id]),
        }
    }

    pub fn updated_many(ids: impl IntoIterator<Item = RuleId>) -> Self {
        Self {
            kind: RuleEventKind::Updated,
            ids: ids.into_iter().collect(),
        }
    }

    pub fn deleted(id: RuleId) -> Self {
        Self {
            kind: RuleEventKind::Deleted,
            ids: BTreeSet::from([id]),
        }
    }
}

/// A workspace-administration rule mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRuleEvent {
    pub kind: RuleEventKind,
    pub ids: BTreeSet<RuleId>,
}

impl AdminRuleEvent {
    pub fn created(id: RuleId) -> Self {
        Self {
            kind: RuleEventKind::Created,
            ids: BTreeSet::from([id]),
        }
    }

    pub fn updated(id: RuleId) -> Self {
        Self {
            kind: RuleEventKind::Updated,
            ids: BTreeSet::from([id]),
        }
    }

    pub fn updated_many(ids: impl IntoIterator<Item = RuleId>) -> Self {
        Self {
            kind: RuleEventKind::Updated,
            ids: ids.into_iter().collect(),
        }
    }

    pub fn deleted(id: RuleId) -> Self {
        Self {
            kind: RuleEventKind::Deleted,
            ids: BTreeSet::from([id]),
        }
    }
}

/// Error returned by a misbehaving listener
///
/// Only ever logged; listener failures never fail the mutation.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ListenerError(pub String);

/// Consumer of rule mutation events
///
/// Default implementations ignore the event, so listeners only implement the
/// event types they care about.
#[async_trait]
pub trait RuleEventListener: Send + Sync {
    async fn on_rule_event(&self, _event: &RuleEvent) -> Result<(), ListenerError> {
        Ok(())
    }

    async fn on_admin_rule_event(&self, _event: &AdminRuleEvent) -> Result<(), ListenerError> {
        Ok(())
    }
}

/// Event publication port consumed by the admin services
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Deliver a data-rule event to every listener before returning
    async fn publish_rule_event(&self, event: RuleEvent);

    /// Deliver an admin-rule event to every listener before returning
    async fn publish_admin_rule_event(&self, event: AdminRuleEvent);
}

/// In-process fanout publisher
///
/// Listeners are awaited in registration order before `publish` returns, so
/// a read started after a mutation completes can never observe a
/// pre-mutation cached decision. Listener errors are caught and logged here,
/// at the publisher boundary.
pub struct FanoutPublisher {
    listeners: Vec<Arc<dyn RuleEventListener>>,
}

impl FanoutPublisher {
    pub fn new(listeners: Vec<Arc<dyn RuleEventListener>>) -> Self {
        Self { listeners }
    }
}

#[async_trait]
impl EventPublisher for FanoutPublisher {
    async fn publish_rule_event(&self, event: RuleEvent) {
        for listener in &self.listeners {
            if let Err(error) = listener.on_rule_event(&event).await {
                warn!(?event.kind, %error, "rule event listener failed");
            }
        }
    }

    async fn publish_admin_rule_event(&self, event: AdminRuleEvent) {
        for listener in &self.listeners {
            if let Err(error) = listener.on_admin_rule_event(&event).await {
                warn!(?event.kind, %error, "admin rule event listener failed");
            }
        }
    }
}

/// Publisher that drops every event, for stores used without a cache
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish_rule_event(&self, _event: RuleEvent) {}

    async fn publish_admin_rule_event(&self, _event: AdminRuleEvent) {}
}

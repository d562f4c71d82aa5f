//! Rule administration services
//!
//! CRUD orchestration over the repository ports: identifier uniqueness,
//! priority resolution inside a per-table critical section, and exactly one
//! domain event per successful mutation. Event delivery is fire-and-forget;
//! a failing listener is logged and never rolls back the mutation.

pub mod admin_rules;
pub mod events;
pub mod priority;
pub mod rules;

pub use admin_rules::AdminRuleAdminService;
pub use events::{
    AdminRuleEvent, EventPublisher, FanoutPublisher, ListenerError, NoopPublisher, RuleEvent,
    RuleEventKind, RuleEventListener,
};
pub use priority::PriorityResolver;
pub use rules::RuleAdminService;

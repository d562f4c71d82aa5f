//! Rule matching
//!
//! Evaluates whether a rule identifier matches a request or an admin query.
//! Every criterion is an explicit tagged predicate; there is no string
//! sniffing of `*`/empty markers outside [`predicate::TextFilter::parse`].
//!
//! ## Matching model
//!
//! - `Any` ignores the field entirely (wildcard and specific rules match)
//! - `Default` matches only wildcard rules (identifier value `None`)
//! - `Name` matches a literal, or any of a comma-separated set of literals;
//!   the orthogonal `include_default` flag additionally admits wildcard rules
//!
//! The role dimension is OR'd across a request's role set: a rule matches if
//! its rolename is a wildcard or equals any requested role. Address matching
//! is IPv4 CIDR containment; IPv6 never reaches the matcher (rejected at the
//! request boundary).
//!
//! The matcher returns all matches; consumers order them by ascending
//! priority (lower number = evaluated first).

pub mod predicate;
pub mod query;

pub use predicate::{AddressFilter, TextFilter};
pub use query::{AdminRuleFilter, AdminRuleQuery, Pagination, RuleFilter, RuleQuery};

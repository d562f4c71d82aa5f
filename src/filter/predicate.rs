//! Per-field match predicates

use crate::model::IpAddressRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

/// Predicate over one text criterion of a rule identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TextFilter {
    /// Field is ignored: wildcard and specific rules both match
    #[default]
    Any,
    /// Only wildcard rules match (identifier value is `None`)
    Default,
    /// A specific literal, or any of a set of literals
    Name {
        values: BTreeSet<String>,
        /// Additionally admit wildcard rules alongside the named match
        include_default: bool,
    },
}

impl TextFilter {
    pub fn any() -> Self {
        TextFilter::Any
    }

    /// Match only rules that leave this field as a wildcard
    pub fn wildcard_only() -> Self {
        TextFilter::Default
    }

    pub fn name(value: impl Into<String>) -> Self {
        TextFilter::Name {
            values: BTreeSet::from([value.into()]),
            include_default: false,
        }
    }

    pub fn names<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TextFilter::Name {
            values: values.into_iter().map(Into::into).collect(),
            include_default: false,
        }
    }

    /// Set the `include_default` flag (no-op for `Any`/`Default`)
    pub fn including_default(self, include: bool) -> Self {
        match self {
            TextFilter::Name { values, .. } => TextFilter::Name {
                values,
                include_default: include,
            },
            other => other,
        }
    }

    /// The single parsing point for textual filter expressions
    ///
    /// `*` means `Any`, the empty string means `Default`, anything else is a
    /// comma-separated literal set. `include_default` only applies to the
    /// literal form.
    pub fn parse(expression: &str, include_default: bool) -> Self {
        let trimmed = expression.trim();
        if trimmed == "*" {
            return TextFilter::Any;
        }
        if trimmed.is_empty() {
            return TextFilter::Default;
        }
        TextFilter::Name {
            values: trimmed
                .split(',')
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect(),
            include_default,
        }
    }

    /// Evaluate against an identifier field (`None` = wildcard rule)
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            TextFilter::Any => true,
            TextFilter::Default => value.is_none(),
            TextFilter::Name {
                values,
                include_default,
            } => match value {
                None => *include_default,
                Some(v) => values.contains(v),
            },
        }
    }
}

/// Predicate over a rule's address range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "mode", content = "address", rename_all = "snake_case")]
pub enum AddressFilter {
    /// Field is ignored
    #[default]
    Any,
    /// Only rules without an address range match
    Default,
    /// A concrete source address: range-less rules match, ranged rules match
    /// when the address falls inside the range
    Matches(Ipv4Addr),
}

impl AddressFilter {
    pub fn matches(&self, range: Option<&IpAddressRange>) -> bool {
        match self {
            AddressFilter::Any => true,
            AddressFilter::Default => range.is_none(),
            AddressFilter::Matches(addr) => match range {
                None => true,
                Some(range) => range.contains(*addr),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TextFilter::Any, None, true)]
    #[case(TextFilter::Any, Some("WMS"), true)]
    #[case(TextFilter::Default, None, true)]
    #[case(TextFilter::Default, Some("WMS"), false)]
    #[case(TextFilter::name("WMS"), Some("WMS"), true)]
    #[case(TextFilter::name("WMS"), Some("WFS"), false)]
    #[case(TextFilter::name("WMS"), None, false)]
    #[case(TextFilter::name("WMS").including_default(true), None, true)]
    fn test_text_filter_matches(
        #[case] filter: TextFilter,
        #[case] value: Option<&str>,
        #[case] expected: bool,
    ) {
        assert_eq!(filter.matches(value), expected);
    }

    #[test]
    fn test_name_set_matches_any_member() {
        let filter = TextFilter::names(["EDITOR", "REVIEWER"]);
        assert!(filter.matches(Some("EDITOR")));
        assert!(filter.matches(Some("REVIEWER")));
        assert!(!filter.matches(Some("GUEST")));
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!(TextFilter::parse("*", false), TextFilter::Any);
        assert_eq!(TextFilter::parse("", false), TextFilter::Default);
        assert_eq!(TextFilter::parse("  ", true), TextFilter::Default);
        assert_eq!(
            TextFilter::parse("WMS", true),
            TextFilter::name("WMS").including_default(true)
        );
        assert_eq!(
            TextFilter::parse("a, b,c", false),
            TextFilter::names(["a", "b", "c"])
        );
    }

    #[test]
    fn test_address_filter() {
        let range = IpAddressRange::from_cidr("10.0.0.0/8").unwrap();
        let inside = AddressFilter::Matches("10.1.2.3".parse().unwrap());
        let outside = AddressFilter::Matches("192.168.0.1".parse().unwrap());

        assert!(inside.matches(Some(&range)));
        assert!(!outside.matches(Some(&range)));
        // Range-less rules are wildcards for any concrete address
        assert!(inside.matches(None));
        assert!(AddressFilter::Any.matches(Some(&range)));
        assert!(AddressFilter::Default.matches(None));
        assert!(!AddressFilter::Default.matches(Some(&range)));
    }

    #[test]
    fn test_filter_serde_round_trip() {
        let filter = TextFilter::names(["WMS", "WFS"]).including_default(true);
        let json = serde_json::to_string(&filter).unwrap();
        let back: TextFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(filter, back);
    }
}

//! Engine-parameterized SQL helpers shared by the dialect adapters
//!
//! Identifier quoting, tiered native-type selection and unordered column-set
//! matching live here once; each adapter supplies its own quoting style and
//! tier tables instead of duplicating the algorithms.

use std::collections::BTreeSet;

/// Identifier quoting style of a SQL engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// `"identifier"` — Postgres and most ANSI engines
    DoubleQuote,
    /// `` `identifier` `` — MySQL-family engines
    Backtick,
    /// `[identifier]` — SQL-Server-family engines
    Bracket,
}

impl QuoteStyle {
    /// Quote a single identifier, escaping embedded closing quotes
    pub fn quote(&self, identifier: &str) -> String {
        match self {
            QuoteStyle::DoubleQuote => format!("\"{}\"", identifier.replace('"', "\"\"")),
            QuoteStyle::Backtick => format!("`{}`", identifier.replace('`', "``")),
            QuoteStyle::Bracket => format!("[{}]", identifier.replace(']', "]]")),
        }
    }

    /// Quote a list of identifiers and join with `, `
    pub fn quote_list(&self, identifiers: &[String]) -> String {
        identifiers
            .iter()
            .map(|i| self.quote(i))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One native type tier of a sized vocabulary type
#[derive(Debug, Clone, Copy)]
pub struct SizeTier {
    /// Native type name, e.g. `mediumtext`
    pub name: &'static str,
    /// Maximum capacity of the tier in bytes/characters
    pub capacity: u64,
    /// Display width the engine conventionally attaches, if any
    pub display_limit: Option<u64>,
}

/// Select a native tier for the requested limit.
///
/// Tiers must be ordered from largest capacity to smallest; the first tier
/// whose capacity the limit equals or exceeds wins. Ordering matters because
/// engines expose several overlapping-capacity native types, and scanning
/// smallest-first would always stop at the smallest tier. A limit below every
/// tier yields `None` and the caller falls back to the regular type.
pub fn select_size_tier(tiers: &[SizeTier], limit: u64) -> Option<SizeTier> {
    tiers.iter().copied().find(|tier| limit >= tier.capacity)
}

/// A resolved native type: name plus the limit to render, when any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeType {
    pub name: String,
    pub limit: Option<u64>,
}

impl NativeType {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            limit: None,
        }
    }

    pub fn with_limit(name: &str, limit: u64) -> Self {
        Self {
            name: name.to_string(),
            limit: Some(limit),
        }
    }
}

fn lowered(columns: &[String]) -> BTreeSet<String> {
    columns.iter().map(|c| c.to_lowercase()).collect()
}

/// Order-independent, case-insensitive column-set equality.
///
/// An index on `(a, b)` satisfies a lookup for `["b", "a"]` but not for
/// `["a"]` alone.
pub fn column_sets_equal(left: &[String], right: &[String]) -> bool {
    lowered(left) == lowered(right)
}

/// Whether every requested column appears in the candidate set, ignoring
/// order and case. Used to resolve unnamed index/constraint drops.
pub fn column_set_covers(candidate: &[String], requested: &[String]) -> bool {
    lowered(requested).is_subset(&lowered(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    const TEXT_TIERS: &[SizeTier] = &[
        SizeTier { name: "longtext", capacity: 4_294_967_295, display_limit: None },
        SizeTier { name: "mediumtext", capacity: 16_777_215, display_limit: None },
        SizeTier { name: "text", capacity: 65_535, display_limit: None },
        SizeTier { name: "tinytext", capacity: 255, display_limit: None },
    ];

    #[test]
    fn tier_scan_picks_first_tier_the_limit_reaches() {
        assert_eq!(select_size_tier(TEXT_TIERS, 20_000_000).unwrap().name, "mediumtext");
        assert_eq!(select_size_tier(TEXT_TIERS, 4_294_967_295).unwrap().name, "longtext");
        assert_eq!(select_size_tier(TEXT_TIERS, 300).unwrap().name, "tinytext");
        assert!(select_size_tier(TEXT_TIERS, 100).is_none());
    }

    #[test]
    fn column_set_equality_ignores_order_and_case() {
        assert!(column_sets_equal(&s(&["a", "b"]), &s(&["b", "a"])));
        assert!(column_sets_equal(&s(&["A", "b"]), &s(&["b", "a"])));
        assert!(!column_sets_equal(&s(&["a", "b"]), &s(&["a"])));
        assert!(!column_sets_equal(&s(&["a"]), &s(&["a", "b"])));
    }

    #[test]
    fn column_cover_is_subset_not_equality() {
        assert!(column_set_covers(&s(&["a", "b"]), &s(&["a"])));
        assert!(!column_set_covers(&s(&["a"]), &s(&["a", "b"])));
    }

    #[test]
    fn quoting_styles() {
        assert_eq!(QuoteStyle::DoubleQuote.quote("widgets"), "\"widgets\"");
        assert_eq!(QuoteStyle::Backtick.quote("widgets"), "`widgets`");
        assert_eq!(QuoteStyle::Bracket.quote("widgets"), "[widgets]");
    }
}

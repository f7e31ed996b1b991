//! Composable query predicates.
//!
//! A [`Specification`] is the conjunction of zero or more atomic conditions.
//! With no conditions it is the neutral predicate and matches every record.
//! Each condition knows how to evaluate itself against a loaded record and
//! how to render itself as a parameterised SQL fragment, so the in-memory
//! store and PostgreSQL agree on what a filter means.

pub mod task;
pub mod user;

use sqlx::{Postgres, QueryBuilder};
use std::fmt;

/// One atomic, entity-specific filter test.
pub trait Condition: fmt::Debug + Send + Sync {
    type Record;

    fn matches(&self, record: &Self::Record) -> bool;

    /// Appends this condition as a boolean SQL expression. Values are always bound,
    /// never interpolated.
    fn push_sql(&self, builder: &mut QueryBuilder<'_, Postgres>);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Specification<C> {
    conditions: Vec<C>,
}

impl<C: Condition> Default for Specification<C> {
    fn default() -> Self {
        Self::always()
    }
}

impl<C: Condition> Specification<C> {
    /// The neutral predicate.
    pub fn always() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// ANDs `condition` onto the specification. `None` stands for a neutral
    /// condition and leaves the specification unchanged.
    pub fn and(mut self, condition: Option<C>) -> Self {
        if let Some(condition) = condition {
            self.conditions.push(condition);
        }
        self
    }

    pub fn is_neutral(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[C] {
        &self.conditions
    }

    pub fn matches(&self, record: &C::Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    /// Appends ` WHERE a AND b ...`, or nothing for the neutral predicate.
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        for (i, condition) in self.conditions.iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            condition.push_sql(builder);
        }
    }
}

/// Upper-cases `needle` and escapes `LIKE` metacharacters so it only ever
/// matches literally, wrapped in `%...%`.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_uppercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// In-memory counterpart of `UPPER(column) LIKE like_pattern(needle)`.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_uppercase().contains(&needle.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("abc"), "%ABC%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_OFF%");
        assert_eq!(like_pattern("a\\b"), "%A\\\\B%");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("ABCdef", "abc"));
        assert!(contains_ignore_case("xabcy", "ABC"));
        assert!(!contains_ignore_case("ab-c", "abc"));
    }
}

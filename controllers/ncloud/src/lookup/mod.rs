//! Read-only lookups ("data sources").
//!
//! Every lookup lists candidates from the vendor and narrows them with a
//! [`Criteria`]. All supplied filters must match (AND); the lookup then
//! requires exactly one survivor.

pub mod nks;
pub mod port_forwarding_rule;
pub mod server;

mod lookup_test;

use crate::error::ReconcileError;
use std::fmt::Display;

pub use nks::NksClusterQuery;
pub use port_forwarding_rule::PortForwardingRuleQuery;
pub use server::ServerQuery;

type Predicate<'a, T> = Box<dyn Fn(&T) -> bool + Send + Sync + 'a>;

/// Conjunction of labelled predicates
pub struct Criteria<'a, T> {
    filters: Vec<(String, Predicate<'a, T>)>,
}

impl<T> Default for Criteria<'_, T> {
    fn default() -> Self {
        Self { filters: Vec::new() }
    }
}

impl<'a, T> Criteria<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter when `value` is set; an unset value matches everything
    pub fn with<V, F>(mut self, field: &str, value: Option<V>, matches: F) -> Self
    where
        V: Display + Send + Sync + 'a,
        F: Fn(&T, &V) -> bool + Send + Sync + 'a,
    {
        if let Some(value) = value {
            let label = format!("{}={}", field, value);
            self.filters
                .push((label, Box::new(move |item: &T| matches(item, &value))));
        }
        self
    }

    pub fn matches(&self, item: &T) -> bool {
        self.filters.iter().all(|(_, predicate)| predicate(item))
    }

    /// Human-readable filter list for error messages
    pub fn describe(&self) -> String {
        if self.filters.is_empty() {
            "(no filters)".to_string()
        } else {
            self.filters
                .iter()
                .map(|(label, _)| label.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

/// Keep the items matching `criteria` and require exactly one of them
pub fn exactly_one<T>(
    kind: &'static str,
    items: impl IntoIterator<Item = T>,
    criteria: &Criteria<'_, T>,
) -> Result<T, ReconcileError> {
    let mut matched: Vec<T> = items.into_iter().filter(|item| criteria.matches(item)).collect();
    match matched.len() {
        0 => Err(ReconcileError::not_found(
            kind,
            format!("matching {}", criteria.describe()),
        )),
        1 => Ok(matched.remove(0)),
        count => Err(ReconcileError::AmbiguousResult { kind, count }),
    }
}

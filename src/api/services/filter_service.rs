//! Filter service for the use case listing.

use std::collections::BTreeSet;

use crate::models::{Identity, ListQuery, UseCase};

/// Filter value meaning "no restriction", as sent by listing selects.
const ALL: &str = "all";

/// Service for filtering use cases by search text, status and sector.
pub struct FilterService;

impl FilterService {
    fn restriction(value: &Option<String>) -> Option<&str> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != ALL)
    }

    /// Whether `doc` passes every filter of `query`.
    pub fn matches<I: Identity>(doc: &UseCase<I>, query: &ListQuery) -> bool {
        if let Some(term) = Self::restriction(&query.search) {
            let term = term.to_lowercase();
            let hit = doc.name.to_lowercase().contains(&term)
                || doc.description.to_lowercase().contains(&term)
                || doc.sector.to_lowercase().contains(&term)
                || doc
                    .participants
                    .iter()
                    .any(|p| p.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        if let Some(status) = Self::restriction(&query.status) {
            if doc.status.as_str() != status {
                return false;
            }
        }
        if let Some(sector) = Self::restriction(&query.sector) {
            if doc.sector != sector {
                return false;
            }
        }
        true
    }

    /// Keep the documents passing `query`, in their original order.
    pub fn filter_use_cases<I: Identity>(docs: Vec<UseCase<I>>, query: &ListQuery) -> Vec<UseCase<I>> {
        docs.into_iter()
            .filter(|doc| Self::matches(doc, query))
            .collect()
    }

    /// Distinct sectors, sorted.
    pub fn sectors<I: Identity>(docs: &[UseCase<I>]) -> Vec<String> {
        docs.iter()
            .map(|doc| doc.sector.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

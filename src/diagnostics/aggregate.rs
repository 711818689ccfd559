//! Per-path error state derived from one validation pass.
//!
//! A path can be in error itself (`has_direct_error`) and independently contain erroring
//! descendants (`child_error_count`). Messages stay on the path the validator named; ancestors
//! only learn how many distinct logical fields below them are failing.

use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::trace;

use super::ErrorRecord;
use crate::{
    path::{Segment, normalize, parse},
    schema::SchemaFieldIndex,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorState {
    pub has_direct_error: bool,
    pub child_error_count: usize,
    pub messages: Vec<String>,
}

impl ErrorState {
    /// The field's own label should render as invalid.
    pub fn is_in_error(&self) -> bool {
        self.has_direct_error
    }

    /// Something below this path is invalid.
    pub fn contains_errors(&self) -> bool {
        self.child_error_count > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorStateMap {
    entries: IndexMap<String, ErrorState>,
    #[serde(skip)]
    failing_fields: IndexSet<String>,
}

impl ErrorStateMap {
    /// Rebuild the whole map from one pass. Unresolved records contribute nothing.
    pub fn aggregate(records: &[ErrorRecord]) -> Self {
        let mut entries: IndexMap<String, ErrorState> = IndexMap::new();
        let mut children: IndexMap<String, BTreeSet<String>> = IndexMap::new();
        let mut failing_fields = IndexSet::new();

        for record in records {
            let Some(path) = record.resolved_path.as_deref() else {
                continue;
            };
            let plain = normalize(path);
            trace!(path, normalized = %plain, "aggregating error");
            failing_fields.insert(plain.clone());
            mark_direct(&mut entries, path, &record.message);

            let Ok(parsed) = parse(path) else {
                // not addressable, keep the message on the literal path only
                continue;
            };
            if plain != path && matches!(parsed.last(), Some(Segment::Key(_))) {
                mark_direct(&mut entries, &plain, &record.message);
            }

            for ancestor in parsed.ancestors() {
                let concrete = ancestor.to_string();
                let logical = normalize(&concrete);
                for key in [concrete, logical] {
                    if key.is_empty() {
                        continue;
                    }
                    children.entry(key).or_default().insert(plain.clone());
                }
            }
        }

        for (path, descendants) in children {
            entries.entry(path).or_default().child_error_count = descendants.len();
        }

        Self {
            entries,
            failing_fields,
        }
    }

    /// State for `path`. Template paths fall back to their normalized form.
    pub fn get(&self, path: &str) -> Option<&ErrorState> {
        self.entries.get(path).or_else(|| {
            parse(path)
                .ok()
                .filter(|parsed| !parsed.is_concrete())
                .and_then(|_| self.entries.get(&normalize(path)))
        })
    }

    pub fn has_direct_error(&self, path: &str) -> bool {
        self.get(path).is_some_and(ErrorState::is_in_error)
    }

    pub fn child_error_count(&self, path: &str) -> usize {
        self.get(path).map_or(0, |state| state.child_error_count)
    }

    pub fn messages(&self, path: &str) -> &[String] {
        self.get(path)
            .map(|state| state.messages.as_slice())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ErrorState)> {
        self.entries.iter().map(|(path, state)| (path.as_str(), state))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct failing logical fields per section, every section of `index` listed.
    pub fn section_error_counts(&self, index: &SchemaFieldIndex) -> IndexMap<String, usize> {
        let mut counts: IndexMap<String, usize> = index
            .section_ids()
            .into_iter()
            .map(|id| (id.to_string(), 0))
            .collect();
        for field in &self.failing_fields {
            if let Some(section) = index.find_section(field) {
                *counts.entry(section.to_string()).or_default() += 1;
            }
        }
        counts
    }
}

fn mark_direct(entries: &mut IndexMap<String, ErrorState>, path: &str, message: &str) {
    let state = entries.entry(path.to_string()).or_default();
    state.has_direct_error = true;
    if !state.messages.iter().any(|existing| existing == message) {
        state.messages.push(message.to_string());
    }
}

//! Bringing a path on screen: expand whatever hides it, then hand back the rendered node.
//!
//! Rendering is not ours. The surface that owns the widgets implements [`RevealSurface`]; the
//! resolver only decides what has to be expanded, in which order, and when to look the target up.

use std::{collections::BTreeSet, thread, time::Duration};

use serde::Serialize;
use tracing::debug;

use crate::{
    options::EngineOptions,
    path::{Segment, normalize, parse},
    schema::{FieldNode, SchemaFieldIndex},
};

/// Expanded section ids and container paths, owned by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpansionState {
    expanded: BTreeSet<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expand(&mut self, id: impl Into<String>) {
        self.expanded.insert(id.into());
    }

    pub fn collapse(&mut self, id: &str) {
        self.expanded.remove(id);
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ExpansionState {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            expanded: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealPlan {
    pub target: String,
    pub section: Option<String>,
    /// Collapsed section/containers hiding the target, outermost first.
    pub to_expand: Vec<String>,
}

/// The presentation side of a reveal.
pub trait RevealSurface {
    type Handle;

    /// Ask for `id` (section id or container path) to be expanded.
    fn request_expand(&mut self, id: &str);

    /// Wait for requested expansions to be realized. Called at most once per reveal.
    fn settle(&mut self, duration: Duration) {
        thread::sleep(duration);
    }

    /// Rendered node for `path`, `None` when nothing is realized there.
    fn locate(&self, path: &str) -> Option<Self::Handle>;
}

#[derive(Debug, Clone)]
pub struct Reveal<H> {
    pub plan: RevealPlan,
    /// Expansion state after the requested expansions.
    pub expanded: ExpansionState,
    pub handle: Option<H>,
}

#[derive(Debug, Clone)]
pub struct NavigationResolver<'a> {
    index: &'a SchemaFieldIndex,
    root: &'a FieldNode,
    settle: Duration,
}

impl<'a> NavigationResolver<'a> {
    pub fn new(index: &'a SchemaFieldIndex, root: &'a FieldNode, options: &EngineOptions) -> Self {
        Self {
            index,
            root,
            settle: options.expand_settle,
        }
    }

    pub fn plan(&self, target: &str, state: &ExpansionState) -> RevealPlan {
        let section = self.index.find_section(target).map(str::to_string);
        let mut to_expand = Vec::new();
        if let Some(section) = section.as_deref()
            && !state.is_expanded(section)
        {
            to_expand.push(section.to_string());
        }

        if let Ok(path) = parse(target) {
            let mut ancestors: Vec<_> = path.ancestors().collect();
            ancestors.reverse();
            for ancestor in ancestors {
                let rendered = ancestor.to_string();
                let collapsible = matches!(ancestor.last(), Some(Segment::Index(_)))
                    || self.is_container(&rendered);
                if !collapsible
                    || state.is_expanded(&rendered)
                    || section.as_deref() == Some(rendered.as_str())
                {
                    continue;
                }
                to_expand.push(rendered);
            }
        }

        RevealPlan {
            target: target.to_string(),
            section,
            to_expand,
        }
    }

    /// Expand everything hiding `target`, wait for it to settle, then locate the target.
    ///
    /// Idempotent: a second call with the returned state expands nothing and does not wait.
    pub fn reveal_and_locate<S: RevealSurface>(
        &self,
        target: &str,
        mut state: ExpansionState,
        surface: &mut S,
    ) -> Reveal<S::Handle> {
        let plan = self.plan(target, &state);
        debug!(path = target, expand = ?plan.to_expand, "revealing field");
        for id in &plan.to_expand {
            surface.request_expand(id);
            state.expand(id.clone());
        }
        if !plan.to_expand.is_empty() {
            surface.settle(self.settle);
        }

        let handle = surface.locate(target);
        if handle.is_none() {
            debug!(path = target, "no rendered node for target");
        }
        Reveal {
            plan,
            expanded: state,
            handle,
        }
    }

    fn is_container(&self, path: &str) -> bool {
        let plain = normalize(path);
        self.index.is_container(&plain) || self.root.get(&plain).is_some_and(FieldNode::is_container)
    }
}

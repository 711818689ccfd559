use std::{collections::VecDeque, sync::Arc};

use serde_json::Value;
use tracing::debug;

use super::{actions::FormCommand, reducers::apply_command};
use crate::{
    diagnostics::ErrorStateMap,
    domain::FieldDefinition,
    error::{PathError, SchemaError},
    navigation::{ExpansionState, NavigationResolver, Reveal, RevealSurface},
    options::EngineOptions,
    path::access,
    schema::{FieldNode, SchemaFieldIndex, build_hierarchy, defaults::default_document},
    validation::{Validate, ValidationOutcome, ValidationReport},
};

/// A validation pass in flight, bound to the revision it was started for.
#[derive(Debug, Clone)]
pub struct ValidationTicket {
    pub revision: u64,
    pub document: Arc<Value>,
}

/// Owns the current document of one form and everything derived from it.
///
/// Every edit swaps in a new document; earlier documents stay valid for whoever holds them.
/// Validation results are only accepted for the revision they were computed against.
pub struct FormSession<V> {
    definitions: Vec<FieldDefinition>,
    index: SchemaFieldIndex,
    hierarchy: FieldNode,
    validator: V,
    options: EngineOptions,
    document: Arc<Value>,
    revision: u64,
    undo: VecDeque<Arc<Value>>,
    redo: Vec<Arc<Value>>,
    report: ValidationReport,
}

impl<V: Validate> FormSession<V> {
    pub fn new(
        definitions: Vec<FieldDefinition>,
        validator: V,
        options: EngineOptions,
    ) -> Result<Self, SchemaError> {
        let index = SchemaFieldIndex::with_options(&definitions, &options)?;
        let hierarchy = build_hierarchy(index.iter());
        let document = Arc::new(default_document(&definitions, None));
        let mut session = Self {
            definitions,
            index,
            hierarchy,
            validator,
            options,
            document,
            revision: 0,
            undo: VecDeque::new(),
            redo: Vec::new(),
            report: ValidationReport::default(),
        };
        session.revalidate();
        Ok(session)
    }

    /// Start from `seed` laid over the schema defaults instead of the bare defaults.
    pub fn with_document(mut self, seed: &Value) -> Self {
        self.document = Arc::new(default_document(&self.definitions, Some(seed)));
        self.revalidate();
        self
    }

    pub fn document(&self) -> Arc<Value> {
        Arc::clone(&self.document)
    }

    pub fn value(&self, path: &str) -> &Value {
        access::get(&self.document, path)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn index(&self) -> &SchemaFieldIndex {
        &self.index
    }

    pub fn hierarchy(&self) -> &FieldNode {
        &self.hierarchy
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn error_state(&self) -> &ErrorStateMap {
        &self.report.state
    }

    pub fn set_field(&mut self, path: &str, value: Value) -> Result<(), PathError> {
        self.apply(FormCommand::set(path, value))
    }

    pub fn append_item(&mut self, path: &str, item: Value) -> Result<(), PathError> {
        self.apply(FormCommand::AppendItem {
            path: path.to_string(),
            item,
        })
    }

    pub fn remove_item(&mut self, path: &str, index: usize) -> Result<(), PathError> {
        self.apply(FormCommand::RemoveItem {
            path: path.to_string(),
            index,
        })
    }

    /// A document produced by the presentation layer.
    pub fn on_change(&mut self, document: Value, changed_path: Option<&str>) -> Result<(), PathError> {
        self.apply(FormCommand::Replace {
            document,
            changed_path: changed_path.map(str::to_string),
        })
    }

    /// Apply one edit. A rejected edit leaves the session exactly as it was; an edit that
    /// produces an identical document is not recorded.
    pub fn apply(&mut self, command: FormCommand) -> Result<(), PathError> {
        let path = command.path().map(str::to_string);
        let next = apply_command(&self.document, command)
            .inspect_err(|err| debug!(path = ?path, %err, "edit rejected"))?;
        if next == *self.document {
            return Ok(());
        }
        let previous = std::mem::replace(&mut self.document, Arc::new(next));
        self.undo.push_back(previous);
        while self.undo.len() > self.options.history_limit {
            self.undo.pop_front();
        }
        self.redo.clear();
        self.committed();
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.document, previous);
        self.redo.push(current);
        self.committed();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.document, next);
        self.undo.push_back(current);
        self.committed();
        true
    }

    /// Discard history and start over from the schema defaults.
    pub fn reset(&mut self, seed: Option<&Value>) {
        self.document = Arc::new(default_document(&self.definitions, seed));
        self.undo.clear();
        self.redo.clear();
        self.committed();
    }

    pub fn begin_validation(&self) -> ValidationTicket {
        ValidationTicket {
            revision: self.revision,
            document: self.document(),
        }
    }

    /// Accept `outcome` if `ticket` is still current. Returns whether it was accepted.
    pub fn complete_validation(&mut self, ticket: ValidationTicket, outcome: ValidationOutcome) -> bool {
        if ticket.revision != self.revision {
            debug!(
                stale = ticket.revision,
                current = self.revision,
                "discarding validation of superseded document"
            );
            return false;
        }
        self.report = ValidationReport::build(outcome, &self.index, &self.options);
        true
    }

    pub fn validate_now(&mut self) -> &ValidationReport {
        let ticket = self.begin_validation();
        let outcome = self.validator.validate(&ticket.document);
        self.complete_validation(ticket, outcome);
        &self.report
    }

    /// Reveal `path` on `surface`. Paths that no longer exist simply yield no handle.
    pub fn scroll_to_field<S: RevealSurface>(
        &self,
        path: &str,
        expanded: ExpansionState,
        surface: &mut S,
    ) -> Reveal<S::Handle> {
        NavigationResolver::new(&self.index, &self.hierarchy, &self.options)
            .reveal_and_locate(path, expanded, surface)
    }

    fn committed(&mut self) {
        self.revision += 1;
        self.revalidate();
    }

    fn revalidate(&mut self) {
        if self.options.auto_validate {
            self.validate_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::FieldType;

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("productName", "Product name", FieldType::Text).with_required(true),
            FieldDefinition::array(
                "materialList",
                "Materials",
                vec![FieldDefinition::new("country", "Country", FieldType::Text).with_required(true)],
            ),
        ]
    }

    fn require_country(document: &Value) -> ValidationOutcome {
        let mut errors = Vec::new();
        if access::is_empty_value(access::get(document, "productName")) {
            errors.push("productName is required".to_string());
        }
        let items = document["materialList"].as_array().cloned().unwrap_or_default();
        for (index, item) in items.iter().enumerate() {
            if item.get("country").is_none() {
                errors.push(format!("materialList[{index}].country is required"));
            }
        }
        ValidationOutcome::invalid(errors)
    }

    fn session() -> FormSession<fn(&Value) -> ValidationOutcome> {
        FormSession::new(fields(), require_country as fn(&Value) -> ValidationOutcome, EngineOptions::default())
            .unwrap()
    }

    #[test]
    fn edits_revalidate_and_keep_old_documents() {
        let mut session = session();
        let before = session.document();
        session.set_field("productName", json!("Chair")).unwrap();
        session.append_item("materialList", json!({})).unwrap();

        assert_eq!(before["productName"], json!(""));
        assert_eq!(session.value("productName"), &json!("Chair"));
        assert_eq!(session.revision(), 2);
        let state = session.error_state();
        assert!(state.has_direct_error("materialList[0].country"));
        assert_eq!(state.child_error_count("materialList"), 1);
        assert!(!state.has_direct_error("productName"));
    }

    #[test]
    fn stale_validations_are_discarded() {
        let mut session = FormSession::new(
            fields(),
            require_country as fn(&Value) -> ValidationOutcome,
            EngineOptions::default().with_auto_validate(false),
        )
        .unwrap();
        let stale = session.begin_validation();
        session.set_field("productName", json!("Chair")).unwrap();
        let outcome = require_country(&stale.document);
        assert!(!session.complete_validation(stale, outcome));
        assert!(session.report().records.is_empty());

        let fresh = session.begin_validation();
        let outcome = require_country(&fresh.document);
        assert!(session.complete_validation(fresh, outcome));
        assert!(session.report().is_valid());
    }

    #[test]
    fn rejected_edits_change_nothing() {
        let mut session = session();
        let revision = session.revision();
        assert!(session.set_field("materialList[item].country", json!("DE")).is_err());
        assert!(session.on_change(json!({}), Some("x.y.z")).is_err());
        assert_eq!(session.revision(), revision);
        assert!(!session.can_undo());
    }

    #[test]
    fn undo_and_redo_walk_history() {
        let mut session = session();
        session.set_field("productName", json!("A")).unwrap();
        session.set_field("productName", json!("B")).unwrap();
        assert!(session.undo());
        assert_eq!(session.value("productName"), &json!("A"));
        assert!(session.redo());
        assert_eq!(session.value("productName"), &json!("B"));
        assert!(!session.redo());

        session.undo();
        session.set_field("productName", json!("C")).unwrap();
        assert!(!session.can_redo());
    }

    #[test]
    fn history_is_bounded() {
        let mut session = FormSession::new(
            fields(),
            require_country as fn(&Value) -> ValidationOutcome,
            EngineOptions::default().with_history_limit(2),
        )
        .unwrap();
        for name in ["a", "b", "c", "d"] {
            session.set_field("productName", json!(name)).unwrap();
        }
        assert!(session.undo());
        assert!(session.undo());
        assert!(!session.undo());
        assert_eq!(session.value("productName"), &json!("b"));
    }

    #[test]
    fn starting_document_is_validated() {
        let session = session();
        assert_eq!(session.revision(), 0);
        assert!(session.error_state().has_direct_error("productName"));
        assert!(!session.report().is_valid());

        let seeded = session.with_document(&json!({"productName": "Chair"}));
        assert!(seeded.report().is_valid());

        let manual = FormSession::new(
            fields(),
            require_country as fn(&Value) -> ValidationOutcome,
            EngineOptions::default().with_auto_validate(false),
        )
        .unwrap();
        assert!(manual.report().records.is_empty());
    }

    #[test]
    fn rejected_writes_keep_existing_values() {
        let mut session = session();
        session.set_field("productName", json!("Chair")).unwrap();
        let revision = session.revision();
        assert_eq!(
            session.set_field("productName.x", json!("v")),
            Err(PathError::ShapeMismatch {
                path: "productName".into()
            })
        );
        assert!(session.set_field("materialList[99999]", json!({})).is_err());
        assert_eq!(session.value("productName"), &json!("Chair"));
        assert_eq!(session.revision(), revision);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut session = session().with_document(&json!({"productName": "Seeded"}));
        assert_eq!(session.value("productName"), &json!("Seeded"));
        session.set_field("productName", json!("Edited")).unwrap();
        session.reset(None);
        assert_eq!(session.value("productName"), &json!(""));
        assert!(!session.can_undo());
    }
}

use std::{collections::HashMap, time::Duration};

use schemaform::{
    EngineOptions, ExpansionState, FieldDefinition, FieldType, FormSession, JsonSchemaValidator,
    RevealSurface, schema::json_schema::field_definitions,
};
use serde_json::{Value, json};

/// Stands in for a rendered form: only expanded items are realized.
#[derive(Default)]
struct FakeSurface {
    expanded: Vec<String>,
    settled: Vec<Duration>,
    nodes: HashMap<String, usize>,
}

impl RevealSurface for FakeSurface {
    type Handle = usize;

    fn request_expand(&mut self, id: &str) {
        self.expanded.push(id.to_string());
    }

    fn settle(&mut self, duration: Duration) {
        self.settled.push(duration);
    }

    fn locate(&self, path: &str) -> Option<usize> {
        self.nodes.get(path).copied()
    }
}

fn schema() -> Value {
    json!({
        "type": "object",
        "required": ["productName"],
        "properties": {
            "productName": {"type": "string", "minLength": 1},
            "metadata": {
                "type": "object",
                "required": ["economicOperatorId"],
                "properties": {"economicOperatorId": {"type": "string"}}
            },
            "materialList": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["country"],
                    "properties": {"country": {"type": "string"}}
                }
            }
        }
    })
}

fn session() -> FormSession<JsonSchemaValidator> {
    let fields = field_definitions(&schema()).unwrap();
    let validator = JsonSchemaValidator::new(&schema()).unwrap();
    FormSession::new(
        fields,
        validator,
        EngineOptions::default().with_expand_settle(Duration::from_millis(5)),
    )
    .unwrap()
}

#[test]
fn editing_drives_error_state() {
    let mut session = session();
    let report = session.validate_now();
    assert!(!report.is_valid());
    assert!(report.state.has_direct_error("metadata.economicOperatorId"));
    assert_eq!(report.state.child_error_count("metadata"), 1);

    session.set_field("metadata.economicOperatorId", json!("EO-1")).unwrap();
    session.append_item("materialList", json!({})).unwrap();
    let state = session.error_state();
    assert!(!state.has_direct_error("metadata.economicOperatorId"));
    assert!(state.has_direct_error("materialList[0].country"));
    assert!(!state.has_direct_error("materialList"));

    session.set_field("materialList[0].country", json!("DE")).unwrap();
    session.set_field("productName", json!("Chair")).unwrap();
    assert!(session.report().is_valid());
    assert!(session.error_state().is_empty());
}

#[test]
fn scrolling_expands_then_locates() {
    let mut session = session();
    session.append_item("materialList", json!({})).unwrap();
    session.append_item("materialList", json!({})).unwrap();

    let mut surface = FakeSurface::default();
    surface.nodes.insert("materialList[1].country".into(), 42);

    let reveal = session.scroll_to_field("materialList[1].country", ExpansionState::new(), &mut surface);
    assert_eq!(surface.expanded, vec!["materialList", "materialList[1]"]);
    assert_eq!(surface.settled, vec![Duration::from_millis(5)]);
    assert_eq!(reveal.handle, Some(42));
    assert_eq!(reveal.plan.section.as_deref(), Some("materialList"));

    let again = session.scroll_to_field("materialList[1].country", reveal.expanded, &mut surface);
    assert_eq!(again.handle, Some(42));
    assert_eq!(surface.settled.len(), 1);
}

#[test]
fn removed_items_are_a_silent_miss() {
    let mut session = session();
    session.append_item("materialList", json!({})).unwrap();
    session.remove_item("materialList", 0).unwrap();

    let mut surface = FakeSurface::default();
    let reveal = session.scroll_to_field("materialList[0].country", ExpansionState::new(), &mut surface);
    assert_eq!(reveal.handle, None);
}

#[test]
fn presentation_documents_are_accepted_whole() {
    let mut session = session();
    let before = session.document();
    let mut next = (*before).clone();
    next["productName"] = json!("Desk");
    session.on_change(next, Some("productName")).unwrap();

    assert_eq!(session.value("productName"), &json!("Desk"));
    assert_eq!(before["productName"], json!(""));
    assert!(session.undo());
    assert_eq!(session.value("productName"), &json!(""));
}

#[test]
fn definitions_from_json_deserialize() {
    let fields: Vec<FieldDefinition> = serde_json::from_value(json!([
        {"key": "productName", "label": "Product name", "type": "text", "required": true},
        {"key": "materialList", "label": "Materials", "type": "array", "fieldCategory": "complex",
         "itemType": "object", "itemFields": [
            {"key": "materialList[item].country", "label": "Country", "type": "select",
             "options": ["DE", "FR"]}
         ]},
        {"key": "issued", "label": "Issued", "type": "date-time"}
    ]))
    .unwrap();
    assert_eq!(fields[1].item_fields[0].options, vec!["DE", "FR"]);
    assert_eq!(fields[2].field_type, FieldType::Datetime);
    assert!(fields[1].is_complex());
}

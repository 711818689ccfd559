use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::normalize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Number,
    Integer,
    Date,
    #[serde(alias = "date-time")]
    Datetime,
    Time,
    Email,
    Url,
    Select,
    Checkbox,
    Object,
    Array,
    #[serde(other)]
    Other,
}

impl FieldType {
    pub fn is_complex(self) -> bool {
        matches!(self, FieldType::Object | FieldType::Array)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Time => "time",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Select => "select",
            FieldType::Checkbox => "checkbox",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCategory {
    Simple,
    Complex,
}

/// One entry of a schema's field list.
///
/// `key` is a template path (`materialList[item].country`). Nested definitions may carry either
/// the full template key or a key relative to their parent; the schema index qualifies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_category: Option<FieldCategory>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urn: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_fields: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item_fields: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<FieldType>,
}

impl FieldDefinition {
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            field_category: None,
            required: false,
            description: None,
            urn: None,
            options: Vec::new(),
            default: None,
            object_fields: Vec::new(),
            item_fields: Vec::new(),
            item_type: None,
        }
    }

    pub fn object(
        key: impl Into<String>,
        label: impl Into<String>,
        fields: Vec<FieldDefinition>,
    ) -> Self {
        let mut definition = Self::new(key, label, FieldType::Object);
        definition.object_fields = fields;
        definition
    }

    /// An array of objects described by `item_fields`.
    pub fn array(
        key: impl Into<String>,
        label: impl Into<String>,
        item_fields: Vec<FieldDefinition>,
    ) -> Self {
        let mut definition = Self::new(key, label, FieldType::Array);
        definition.item_fields = item_fields;
        definition.item_type = Some(FieldType::Object);
        definition
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_item_type(mut self, item_type: FieldType) -> Self {
        self.item_type = Some(item_type);
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// Declared category, falling back to what the type implies.
    pub fn category(&self) -> FieldCategory {
        self.field_category.unwrap_or(if self.field_type.is_complex() {
            FieldCategory::Complex
        } else {
            FieldCategory::Simple
        })
    }

    pub fn is_complex(&self) -> bool {
        self.category() == FieldCategory::Complex
    }

    /// Child definitions: `objectFields` for objects, `itemFields` for arrays.
    pub fn nested(&self) -> &[FieldDefinition] {
        match self.field_type {
            FieldType::Object => &self.object_fields,
            FieldType::Array => &self.item_fields,
            _ if !self.object_fields.is_empty() => &self.object_fields,
            _ => &self.item_fields,
        }
    }

    /// Last key segment of the template path.
    pub fn name(&self) -> String {
        normalize(&self.key)
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    pub fn display_label(&self) -> String {
        let name = self.name();
        if self.label.is_empty() || self.label.eq_ignore_ascii_case(&name) {
            name
        } else {
            format!("{} ({})", self.label, name)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_camel_case_definitions() {
        let raw = json!({
            "key": "materialList",
            "label": "Materials",
            "type": "array",
            "fieldCategory": "complex",
            "required": true,
            "itemType": "object",
            "itemFields": [
                {"key": "materialList[item].country", "label": "Country", "type": "select", "options": ["DE", "FR"]},
                {"key": "materialList[item].share", "label": "Share", "type": "number"}
            ]
        });
        let definition: FieldDefinition = serde_json::from_value(raw).unwrap();
        assert_eq!(definition.field_type, FieldType::Array);
        assert!(definition.is_complex());
        assert_eq!(definition.nested().len(), 2);
        assert_eq!(definition.nested()[0].options, vec!["DE", "FR"]);
        assert_eq!(definition.item_type, Some(FieldType::Object));
    }

    #[test]
    fn unknown_types_are_kept_as_other() {
        let definition: FieldDefinition =
            serde_json::from_value(json!({"key": "rating", "type": "stars"})).unwrap();
        assert_eq!(definition.field_type, FieldType::Other);
        assert_eq!(definition.category(), FieldCategory::Simple);
    }

    #[test]
    fn name_ignores_placeholders() {
        let definition = FieldDefinition::new("materialList[item].country", "Country", FieldType::Text);
        assert_eq!(definition.name(), "country");
        assert_eq!(definition.display_label(), "Country");
        let renamed = FieldDefinition::new("a.econId", "Economic operator", FieldType::Text);
        assert_eq!(renamed.display_label(), "Economic operator (econId)");
    }
}

//! Field definitions derived from a JSON Schema document.
//!
//! Objects with properties become `object` fields, arrays of objects become `array` fields with
//! `itemFields`, everything else maps to a simple field type. Keys are emitted fully qualified
//! (`materialList[item].country`).

use std::collections::HashSet;

use anyhow::{Context, Result, anyhow, bail};
use schemars::schema::{
    ArrayValidation, InstanceType, ObjectValidation, RootSchema, SchemaObject, SingleOrVec,
};
use serde_json::Value;

use super::{
    metadata::{extension_string, prettify_label},
    resolver::SchemaResolver,
};
use crate::{
    domain::{FieldDefinition, FieldType},
    path::ITEM_PLACEHOLDER,
};

/// Deserialize a JSON value into a `RootSchema`.
pub fn load_root_schema(value: &Value) -> Result<RootSchema> {
    serde_json::from_value(value.clone()).context("schema is not a valid JSON Schema document")
}

pub fn field_definitions(schema_value: &Value) -> Result<Vec<FieldDefinition>> {
    let root = load_root_schema(schema_value)?;
    let resolver = SchemaResolver::new(schema_value, &root);
    let root_object = resolver
        .root_object()
        .cloned()
        .ok_or_else(|| anyhow!("root schema must be an object"))?;
    ensure_object_schema(&root_object)?;
    let object = root_object
        .object
        .as_ref()
        .context("root schema must define properties")?;
    build_fields(&resolver, object, None)
}

#[derive(Debug, Clone, Copy)]
enum Parent<'a> {
    Object(&'a str),
    ArrayItem(&'a str),
}

fn child_key(parent: Option<Parent<'_>>, name: &str) -> String {
    match parent {
        None => name.to_string(),
        Some(Parent::Object(key)) => format!("{key}.{name}"),
        Some(Parent::ArrayItem(key)) => format!("{key}[{ITEM_PLACEHOLDER}].{name}"),
    }
}

fn build_fields(
    resolver: &SchemaResolver<'_>,
    object: &ObjectValidation,
    parent: Option<Parent<'_>>,
) -> Result<Vec<FieldDefinition>> {
    let required = required_set(object);
    let mut fields = Vec::with_capacity(object.properties.len());
    for (name, property_schema) in &object.properties {
        let resolved = resolver
            .resolve_schema(property_schema)
            .with_context(|| format!("failed to resolve property '{name}'"))?;
        let key = child_key(parent, name);
        let field = build_field(resolver, &resolved, name, key, required.contains(name))
            .with_context(|| format!("unsupported schema for field '{name}'"))?;
        fields.push(field);
    }
    Ok(fields)
}

fn build_field(
    resolver: &SchemaResolver<'_>,
    schema: &SchemaObject,
    name: &str,
    key: String,
    required: bool,
) -> Result<FieldDefinition> {
    let metadata = schema.metadata.as_ref();
    let label = metadata
        .and_then(|m| m.title.clone())
        .unwrap_or_else(|| prettify_label(name));
    let mut definition =
        FieldDefinition::new(key, label, FieldType::Text).with_required(required);
    if let Some(description) = metadata.and_then(|m| m.description.clone()) {
        definition = definition.with_description(description);
    }
    definition.default = metadata.and_then(|m| m.default.clone());
    definition.urn = extension_string(schema, "x-urn");

    if let Some(options) = &schema.enum_values {
        definition.field_type = FieldType::Select;
        definition.options = options
            .iter()
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        return Ok(definition);
    }

    match instance_type(schema) {
        Some(InstanceType::String) | None if !is_object_schema(schema) => {
            definition.field_type = string_type(schema.format.as_deref());
        }
        Some(InstanceType::Integer) => definition.field_type = FieldType::Integer,
        Some(InstanceType::Number) => definition.field_type = FieldType::Number,
        Some(InstanceType::Boolean) => definition.field_type = FieldType::Checkbox,
        Some(InstanceType::Object) | None => {
            definition.field_type = FieldType::Object;
            if let Some(object) = schema.object.as_ref() {
                definition.object_fields =
                    build_fields(resolver, object, Some(Parent::Object(&definition.key)))?;
            }
        }
        Some(InstanceType::Array) => {
            definition.field_type = FieldType::Array;
            let array = schema
                .array
                .as_ref()
                .context("array schema must define items")?;
            let items = resolve_array_items(resolver, array)?;
            if let Some(object) = items.object.as_ref().filter(|_| is_object_schema(&items)) {
                definition.item_type = Some(FieldType::Object);
                definition.item_fields =
                    build_fields(resolver, object, Some(Parent::ArrayItem(&definition.key)))?;
            } else {
                definition = definition.with_item_type(scalar_type(&items));
            }
        }
        Some(other) => bail!("unsupported field type {other:?}"),
    }
    Ok(definition)
}

fn string_type(format: Option<&str>) -> FieldType {
    match format {
        Some("date") => FieldType::Date,
        Some("date-time") => FieldType::Datetime,
        Some("time") => FieldType::Time,
        Some("email") | Some("idn-email") => FieldType::Email,
        Some("uri") | Some("url") | Some("iri") => FieldType::Url,
        _ => FieldType::Text,
    }
}

fn scalar_type(schema: &SchemaObject) -> FieldType {
    if schema.enum_values.is_some() {
        return FieldType::Select;
    }
    match instance_type(schema) {
        Some(InstanceType::Integer) => FieldType::Integer,
        Some(InstanceType::Number) => FieldType::Number,
        Some(InstanceType::Boolean) => FieldType::Checkbox,
        Some(InstanceType::Array) => FieldType::Array,
        Some(InstanceType::String) | None => string_type(schema.format.as_deref()),
        _ => FieldType::Other,
    }
}

fn resolve_array_items(
    resolver: &SchemaResolver<'_>,
    array: &ArrayValidation,
) -> Result<SchemaObject> {
    let items = array
        .items
        .as_ref()
        .context("array schema must define items")?;
    match items {
        SingleOrVec::Single(schema) => resolver.resolve_schema(schema),
        SingleOrVec::Vec(list) => match list.first() {
            Some(first) => resolver.resolve_schema(first),
            None => bail!("tuple arrays without items are not supported"),
        },
    }
}

fn required_set(object: &ObjectValidation) -> HashSet<String> {
    object.required.iter().cloned().collect()
}

fn is_object_schema(schema: &SchemaObject) -> bool {
    match instance_type(schema) {
        Some(InstanceType::Object) => true,
        None => schema.object.is_some(),
        _ => false,
    }
}

fn instance_type(schema: &SchemaObject) -> Option<InstanceType> {
    schema.instance_type.as_ref().and_then(|kind| match kind {
        SingleOrVec::Single(single) => Some(**single),
        SingleOrVec::Vec(items) => items
            .iter()
            .cloned()
            .find(|item| *item != InstanceType::Null),
    })
}

fn ensure_object_schema(schema: &SchemaObject) -> Result<()> {
    if is_object_schema(schema) {
        Ok(())
    } else {
        bail!("schema must describe an object")
    }
}

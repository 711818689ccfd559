use anyhow::{Context, Result, bail};
use percent_encoding::percent_decode_str;
use schemars::schema::{RootSchema, Schema, SchemaObject};
use serde_json::Value;
use tracing::trace;

/// `$ref` chains longer than this are treated as cycles.
const MAX_REF_DEPTH: usize = 32;

/// Resolves local `$ref`s (`#/definitions/...` and JSON pointers) of one schema document.
#[derive(Debug)]
pub struct SchemaResolver<'a> {
    raw: &'a Value,
    root: &'a RootSchema,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(raw: &'a Value, root: &'a RootSchema) -> Self {
        Self { raw, root }
    }

    pub fn root_object(&self) -> Option<&SchemaObject> {
        Some(&self.root.schema)
    }

    pub fn resolve_schema(&self, schema: &Schema) -> Result<SchemaObject> {
        self.resolve_at(schema, 0)
    }

    fn resolve_at(&self, schema: &Schema, depth: usize) -> Result<SchemaObject> {
        match schema {
            Schema::Bool(value) => Ok(Schema::Bool(*value).into_object()),
            Schema::Object(object) => match &object.reference {
                Some(reference) => {
                    if depth >= MAX_REF_DEPTH {
                        bail!("reference '{reference}' nests deeper than {MAX_REF_DEPTH} levels");
                    }
                    trace!(reference = %reference, depth, "following $ref");
                    self.follow_reference(reference, depth + 1)
                }
                None => Ok(object.clone()),
            },
        }
    }

    fn follow_reference(&self, reference: &str, depth: usize) -> Result<SchemaObject> {
        if let Some(key) = reference.strip_prefix("#/definitions/") {
            let target = self
                .root
                .definitions
                .get(key)
                .with_context(|| format!("definition '{key}' not found"))?;
            return self.resolve_at(target, depth);
        }

        if let Some(fragment) = reference.strip_prefix('#') {
            let decoded = percent_decode_str(fragment)
                .decode_utf8()
                .context("invalid percent-encoding in $ref")?;
            let pointer = if decoded.is_empty() || decoded.starts_with('/') {
                decoded.to_string()
            } else {
                format!("/{decoded}")
            };
            let target = self
                .raw
                .pointer(&pointer)
                .with_context(|| format!("reference '{reference}' not found"))?;
            let schema: Schema = serde_json::from_value(target.clone())
                .with_context(|| format!("reference '{reference}' is not a valid schema"))?;
            return self.resolve_at(&schema, depth);
        }

        bail!("unsupported reference {reference}")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn property<'r>(root: &'r RootSchema, name: &str) -> &'r Schema {
        root.schema
            .object
            .as_ref()
            .and_then(|object| object.properties.get(name))
            .expect("property present")
    }

    #[test]
    fn resolves_definition_and_pointer_references() {
        let raw = json!({
            "definitions": {
                "address": {"type": "object", "properties": {"city": {"type": "string"}}}
            },
            "type": "object",
            "properties": {
                "billing": {"$ref": "#/definitions/address"},
                "shipping": {"$ref": "#/properties/billing"}
            }
        });
        let root: RootSchema = serde_json::from_value(raw.clone()).expect("valid root schema");
        let resolver = SchemaResolver::new(&raw, &root);

        let billing = resolver.resolve_schema(property(&root, "billing")).unwrap();
        assert!(billing.object.unwrap().properties.contains_key("city"));
        let shipping = resolver.resolve_schema(property(&root, "shipping")).unwrap();
        assert!(shipping.object.unwrap().properties.contains_key("city"));
    }

    #[test]
    fn self_referencing_definitions_fail_instead_of_recursing() {
        let raw = json!({
            "definitions": {"loop": {"$ref": "#/definitions/loop"}},
            "type": "object",
            "properties": {"x": {"$ref": "#/definitions/loop"}}
        });
        let root: RootSchema = serde_json::from_value(raw.clone()).unwrap();
        let resolver = SchemaResolver::new(&raw, &root);
        let err = resolver.resolve_schema(property(&root, "x")).unwrap_err();
        assert!(err.to_string().contains("nests deeper"));
    }
}

//! Path-keyed view of a schema's field definitions.

pub mod defaults;
pub mod hierarchy;
pub mod json_schema;
mod metadata;
mod resolver;

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::{
    domain::{FieldDefinition, FieldType},
    error::SchemaError,
    options::EngineOptions,
    path::{ITEM_PLACEHOLDER, normalize, parse},
};

pub use hierarchy::{FieldNode, build_hierarchy};

/// Flattened, read-only lookup over a schema's fields, built once per schema.
#[derive(Debug, Clone)]
pub struct SchemaFieldIndex {
    fields: IndexMap<String, FieldDefinition>,
    normalized: IndexMap<String, String>,
    containers: HashSet<String>,
    sections: IndexMap<String, String>,
    general_section: String,
}

impl SchemaFieldIndex {
    pub fn new(definitions: &[FieldDefinition]) -> Result<Self, SchemaError> {
        Self::with_options(definitions, &EngineOptions::default())
    }

    pub fn with_options(
        definitions: &[FieldDefinition],
        options: &EngineOptions,
    ) -> Result<Self, SchemaError> {
        let fields = flatten(definitions)?;

        let mut normalized = IndexMap::new();
        let mut containers = HashSet::new();
        let mut sections = IndexMap::new();
        for (key, definition) in &fields {
            let plain = normalize(key);
            normalized.entry(plain.clone()).or_insert_with(|| key.clone());

            let segments: Vec<&str> = plain.split('.').collect();
            if definition.is_complex() {
                containers.insert(plain.clone());
            }
            for depth in 1..segments.len() {
                containers.insert(segments[..depth].join("."));
            }

            let top = segments[0].to_string();
            let owned_by_container = segments.len() > 1 || definition.is_complex();
            let section = if owned_by_container {
                top.clone()
            } else {
                options.general_section.clone()
            };
            // a grouped key seen later promotes a top-level field to its own section
            let promoted = sections.get(&top).is_some_and(|existing| *existing == top);
            if !promoted {
                sections.insert(top, section);
            }
        }

        Ok(Self {
            fields,
            normalized,
            containers,
            sections,
            general_section: options.general_section.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Definitions in depth-first declaration order, containers before their children.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn get(&self, template: &str) -> Option<&FieldDefinition> {
        self.fields.get(template)
    }

    pub fn by_normalized(&self, normalized: &str) -> Option<&FieldDefinition> {
        self.normalized
            .get(normalized)
            .and_then(|key| self.fields.get(key))
    }

    pub fn by_label(&self, label: &str) -> Option<&FieldDefinition> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        self.fields.values().find(|field| field.label.trim() == label)
    }

    /// Any path flavor (template, concrete, normalized) that names a schema field.
    pub fn resolve(&self, path: &str) -> Option<&FieldDefinition> {
        self.get(path)
            .or_else(|| self.by_normalized(&normalize(path)))
    }

    /// `true` for complex fields and for groups implied by dotted keys.
    pub fn is_container(&self, normalized: &str) -> bool {
        self.containers.contains(normalized)
    }

    /// Section that owns `path` (any flavor), or `None` when no schema field lives there.
    pub fn find_section(&self, path: &str) -> Option<&str> {
        let plain = normalize(path);
        let top = plain.split('.').next().filter(|top| !top.is_empty())?;
        self.sections.get(top).map(String::as_str)
    }

    /// Section ids in declaration order, without duplicates.
    pub fn section_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.sections
            .values()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn general_section(&self) -> &str {
        &self.general_section
    }
}

/// Depth-first flattening: one entry per field, complex fields included, keys fully qualified.
pub fn flatten(
    definitions: &[FieldDefinition],
) -> Result<IndexMap<String, FieldDefinition>, SchemaError> {
    let mut out = IndexMap::new();
    collect(definitions, None, &mut out)?;
    Ok(out)
}

fn collect(
    definitions: &[FieldDefinition],
    parent: Option<(&str, FieldType)>,
    out: &mut IndexMap<String, FieldDefinition>,
) -> Result<(), SchemaError> {
    for definition in definitions {
        let key = qualify(parent, &definition.key)?;
        parse(&key).map_err(|source| SchemaError::InvalidKey {
            key: key.clone(),
            source,
        })?;
        if out.contains_key(&key) {
            return Err(SchemaError::DuplicateKey { key });
        }
        let mut entry = definition.clone();
        entry.key = key.clone();
        out.insert(key.clone(), entry);
        if definition.is_complex() {
            collect(
                definition.nested(),
                Some((key.as_str(), definition.field_type)),
                out,
            )?;
        }
    }
    Ok(())
}

fn qualify(parent: Option<(&str, FieldType)>, key: &str) -> Result<String, SchemaError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(SchemaError::EmptyKey);
    }
    let Some((parent_key, parent_type)) = parent else {
        return Ok(key.to_string());
    };

    let prefix = if parent_type == FieldType::Array {
        format!("{parent_key}[{ITEM_PLACEHOLDER}]")
    } else {
        parent_key.to_string()
    };
    if key
        .strip_prefix(prefix.as_str())
        .is_some_and(|rest| rest.starts_with('.'))
    {
        return Ok(key.to_string());
    }
    if let Some(rest) = key.strip_prefix(parent_key)
        && rest.starts_with('.')
    {
        return Ok(format!("{prefix}{rest}"));
    }
    Ok(format!("{prefix}.{key}"))
}

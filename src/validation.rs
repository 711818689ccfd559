//! The validator seam and what one validation pass produces.

use std::fmt;

use anyhow::{Context, Result};
use jsonschema::{Validator, error::ValidationErrorKind, validator_for};
use serde::Serialize;
use serde_json::Value;

use crate::{
    diagnostics::{ErrorLocator, ErrorRecord, ErrorStateMap},
    options::EngineOptions,
    schema::SchemaFieldIndex,
};

/// Result of validating one document: a flag and human-readable messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Anything that can judge a document. Rules live entirely on the implementor's side.
pub trait Validate {
    fn validate(&self, document: &Value) -> ValidationOutcome;
}

impl<F> Validate for F
where
    F: Fn(&Value) -> ValidationOutcome,
{
    fn validate(&self, document: &Value) -> ValidationOutcome {
        self(document)
    }
}

/// [`Validate`] backed by a compiled JSON Schema.
///
/// Messages name the failing value by dotted path (`materialList[0].country is required`) so
/// they resolve like any other validator's output.
pub struct JsonSchemaValidator {
    inner: Validator,
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator").finish_non_exhaustive()
    }
}

impl JsonSchemaValidator {
    pub fn new(schema: &Value) -> Result<Self> {
        let inner = validator_for(schema).context("failed to compile JSON schema")?;
        Ok(Self { inner })
    }
}

impl Validate for JsonSchemaValidator {
    fn validate(&self, document: &Value) -> ValidationOutcome {
        let errors: Vec<String> = self
            .inner
            .iter_errors(document)
            .map(|error| {
                let path = pointer_to_path(document, &error.instance_path.to_string());
                match &error.kind {
                    ValidationErrorKind::Required { property } => {
                        let property = property
                            .as_str()
                            .map(str::to_string)
                            .unwrap_or_else(|| property.to_string());
                        if path.is_empty() {
                            format!("{property} is required")
                        } else {
                            format!("{path}.{property} is required")
                        }
                    }
                    _ if path.is_empty() => format!("document is invalid: {error}"),
                    _ => format!("{path} is invalid: {error}"),
                }
            })
            .collect();
        ValidationOutcome::invalid(errors)
    }
}

/// Render a JSON pointer as a dotted path, using the document to tell indices from keys.
fn pointer_to_path(document: &Value, pointer: &str) -> String {
    let mut rendered = String::new();
    let mut current = Some(document);
    for token in pointer.split('/').skip(1) {
        let token = token.replace("~1", "/").replace("~0", "~");
        match current {
            Some(Value::Array(items)) => {
                let index = token.parse::<usize>().ok();
                current = index.and_then(|index| items.get(index));
                rendered.push_str(&format!("[{token}]"));
            }
            other => {
                current = other.and_then(|value| value.get(&token));
                if !rendered.is_empty() {
                    rendered.push('.');
                }
                rendered.push_str(&token);
            }
        }
    }
    rendered
}

/// One validation pass mapped onto the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub outcome: ValidationOutcome,
    pub records: Vec<ErrorRecord>,
    pub state: ErrorStateMap,
}

impl ValidationReport {
    pub fn build(
        outcome: ValidationOutcome,
        index: &SchemaFieldIndex,
        options: &EngineOptions,
    ) -> Self {
        let records = ErrorLocator::with_options(index, options).locate_all(&outcome.errors);
        let state = ErrorStateMap::aggregate(&records);
        Self {
            outcome,
            records,
            state,
        }
    }

    /// Records that cannot be navigated to, for the flat error list.
    pub fn unresolved(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter().filter(|record| !record.is_resolved())
    }

    pub fn is_valid(&self) -> bool {
        self.outcome.is_valid
    }
}

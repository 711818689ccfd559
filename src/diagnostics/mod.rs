//! Turning validator output into locations inside the document.

pub mod aggregate;
pub mod locator;

use serde::Serialize;

pub use aggregate::{ErrorState, ErrorStateMap};
pub use locator::{Candidate, ErrorLocator};

/// How much a resolved location can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchConfidence {
    /// The message named a schema key exactly as declared.
    Exact,
    /// The message named a schema key once indices/placeholders are ignored.
    Normalized,
    /// Matched by key suffix or substring.
    Partial,
    /// Matched a field's label, not its key.
    LabelOnly,
    Unresolved,
}

/// Resolution tiers, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MatchTier {
    Key,
    Label,
    Suffix,
    Substring,
}

/// Message shapes understood by the locator, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MessagePattern {
    /// `materialList[0].country is required`
    ArrayIndexedNested,
    /// `materialList[0] is required`
    ArrayIndexed,
    /// `metadata.economicOperatorId is required`
    NestedDotted,
    /// `economicOperatorId is required`
    Simple,
    /// `'economicOperatorId' is required`
    QuotedSubject,
    /// `Field "economicOperatorId" ...`
    QuotedField,
}

/// One validator message and where it points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub message: String,
    /// Concrete path of the erroring value, normalized where no index was available.
    pub resolved_path: Option<String>,
    pub confidence: MatchConfidence,
    /// Template key of the matched field definition.
    pub field_key: Option<String>,
    pub tier: Option<MatchTier>,
    pub pattern: Option<MessagePattern>,
    pub from_token_scan: bool,
}

impl ErrorRecord {
    pub fn unresolved(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resolved_path: None,
            confidence: MatchConfidence::Unresolved,
            field_key: None,
            tier: None,
            pattern: None,
            from_token_scan: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_path.is_some()
    }
}

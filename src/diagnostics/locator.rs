use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{ErrorRecord, MatchConfidence, MatchTier, MessagePattern};
use crate::{
    domain::FieldDefinition,
    options::EngineOptions,
    path::{Path, normalize, parse},
    schema::SchemaFieldIndex,
};

const NAME: &str = r"[A-Za-z_$][\w$-]*";
const VERB: &str = r"\s+(?:is|are|must|should|has|have|cannot|can't|does|contains|exceeds|needs|requires|expected)\b";

static PATTERNS: LazyLock<Vec<(MessagePattern, Regex)>> = LazyLock::new(|| {
    let segment = format!(r"{NAME}(?:\[\d+\])*");
    [
        (
            MessagePattern::ArrayIndexedNested,
            format!(r"^\s*((?:{segment}\.)*{NAME}\[\d+\](?:\.{segment})+){VERB}"),
        ),
        (
            MessagePattern::ArrayIndexed,
            format!(r"^\s*((?:{segment}\.)*{NAME}(?:\[\d+\])+){VERB}"),
        ),
        (
            MessagePattern::NestedDotted,
            format!(r"^\s*({NAME}(?:\.{NAME})+){VERB}"),
        ),
        (MessagePattern::Simple, format!(r"^\s*({NAME}){VERB}")),
        (
            MessagePattern::QuotedSubject,
            format!(r#"^\s*['"`]([^'"`]+)['"`]{VERB}"#),
        ),
        (
            MessagePattern::QuotedField,
            r#"(?i)\b(?:field|property)\s+['"`]([^'"`]+)['"`]"#.to_string(),
        ),
    ]
    .into_iter()
    .map(|(kind, source)| (kind, Regex::new(&source).expect("message pattern compiles")))
    .collect()
});

/// Field reference extracted from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub pattern: MessagePattern,
    pub raw: String,
}

/// First pattern (in precedence order) that matches `message`.
pub fn extract_candidate(message: &str) -> Option<Candidate> {
    PATTERNS.iter().find_map(|(pattern, regex)| {
        let captures = regex.captures(message)?;
        let raw = captures.get(1)?.as_str().trim();
        (!raw.is_empty()).then(|| Candidate {
            pattern: *pattern,
            raw: raw.to_string(),
        })
    })
}

struct Resolution<'s> {
    definition: &'s FieldDefinition,
    tier: MatchTier,
    confidence: MatchConfidence,
}

/// Maps raw validator messages onto schema fields and concrete document paths.
#[derive(Debug, Clone)]
pub struct ErrorLocator<'a> {
    index: &'a SchemaFieldIndex,
    substring_matching: bool,
    min_substring_len: usize,
    token_scan: bool,
}

impl<'a> ErrorLocator<'a> {
    pub fn new(index: &'a SchemaFieldIndex) -> Self {
        Self::with_options(index, &EngineOptions::default())
    }

    pub fn with_options(index: &'a SchemaFieldIndex, options: &EngineOptions) -> Self {
        Self {
            index,
            substring_matching: options.substring_matching,
            min_substring_len: options.min_substring_len,
            token_scan: options.token_scan,
        }
    }

    pub fn locate_all<S: AsRef<str>>(&self, messages: &[S]) -> Vec<ErrorRecord> {
        messages
            .iter()
            .map(|message| self.locate(message.as_ref()))
            .collect()
    }

    pub fn locate(&self, message: &str) -> ErrorRecord {
        if let Some(candidate) = extract_candidate(message)
            && let Some(record) = self.resolve_reference(message, &candidate.raw, true)
        {
            return ErrorRecord {
                pattern: Some(candidate.pattern),
                ..record
            };
        }

        if self.token_scan {
            for token in message.split_whitespace().rev() {
                let token = token.trim_matches(|ch: char| {
                    matches!(ch, '\'' | '"' | '`' | ',' | '.' | ';' | ':' | '(' | ')' | '!' | '?')
                });
                if token.is_empty() {
                    continue;
                }
                if let Some(record) = self.resolve_reference(message, token, false) {
                    debug!(error = message, token, "resolved by trailing token");
                    return ErrorRecord {
                        from_token_scan: true,
                        ..record
                    };
                }
            }
        }

        debug!(error = message, "validation message left unresolved");
        ErrorRecord::unresolved(message)
    }

    /// Resolve one reference, retrying with its last dotted segment when the whole fails.
    fn resolve_reference(
        &self,
        message: &str,
        reference: &str,
        allow_substring: bool,
    ) -> Option<ErrorRecord> {
        let parsed = parse(reference).ok();
        let normalized = normalize(reference);

        let resolution = self
            .resolve_candidate(reference, &normalized, allow_substring)
            .or_else(|| {
                let (_, last) = normalized.rsplit_once('.')?;
                self.resolve_candidate(last, last, allow_substring)
            })?;

        let resolved_path = concrete_path(resolution.definition, parsed.as_ref(), &normalized);
        debug!(
            error = message,
            tier = ?resolution.tier,
            path = %resolved_path,
            "resolved validation message"
        );
        Some(ErrorRecord {
            message: message.to_string(),
            resolved_path: Some(resolved_path),
            confidence: resolution.confidence,
            field_key: Some(resolution.definition.key.clone()),
            tier: Some(resolution.tier),
            pattern: None,
            from_token_scan: false,
        })
    }

    fn resolve_candidate(
        &self,
        literal: &str,
        normalized: &str,
        allow_substring: bool,
    ) -> Option<Resolution<'a>> {
        if normalized.is_empty() {
            return None;
        }
        let index = self.index;

        if let Some(definition) = index.get(literal) {
            return Some(Resolution {
                definition,
                tier: MatchTier::Key,
                confidence: MatchConfidence::Exact,
            });
        }
        if let Some(definition) = index.by_normalized(normalized) {
            let confidence = if definition.key == literal {
                MatchConfidence::Exact
            } else {
                MatchConfidence::Normalized
            };
            return Some(Resolution {
                definition,
                tier: MatchTier::Key,
                confidence,
            });
        }

        if let Some(definition) = index.by_label(literal) {
            return Some(Resolution {
                definition,
                tier: MatchTier::Label,
                confidence: MatchConfidence::LabelOnly,
            });
        }

        let suffix = format!(".{normalized}");
        if let Some(definition) = index
            .iter()
            .find(|definition| normalize(&definition.key).ends_with(&suffix))
        {
            return Some(Resolution {
                definition,
                tier: MatchTier::Suffix,
                confidence: MatchConfidence::Partial,
            });
        }

        if !(allow_substring
            && self.substring_matching
            && literal.chars().count() >= self.min_substring_len)
        {
            return None;
        }
        let needle = literal.to_lowercase();
        index
            .iter()
            .find(|definition| {
                normalize(&definition.key).to_lowercase().contains(&needle)
                    || definition.label.to_lowercase().contains(&needle)
            })
            .map(|definition| Resolution {
                definition,
                tier: MatchTier::Substring,
                confidence: MatchConfidence::Partial,
            })
    }
}

/// The reference itself when it already is a concrete path to the matched field, otherwise
/// the field's template with each index the reference carries placed after the key it followed.
fn concrete_path(definition: &FieldDefinition, reference: Option<&Path>, normalized: &str) -> String {
    let template = match parse(&definition.key) {
        Ok(template) => template,
        Err(_) => return normalize(&definition.key),
    };
    match reference {
        Some(reference) if reference.is_concrete() && normalize(&definition.key) == normalized => {
            reference.to_string()
        }
        Some(reference) => template.with_indices_from(reference).to_string(),
        None => template.with_items(&[]).to_string(),
    }
}

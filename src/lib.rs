#![deny(rust_2018_idioms)]

pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod form;
pub mod io;
pub mod navigation;
pub mod options;
pub mod path;
pub mod schema;
pub mod validation;

pub use diagnostics::{
    ErrorLocator, ErrorRecord, ErrorState, ErrorStateMap, MatchConfidence, MatchTier,
    MessagePattern,
};
pub use domain::{FieldCategory, FieldDefinition, FieldType};
pub use error::{PathError, SchemaError};
pub use form::{FormCommand, FormSession, ValidationTicket};
pub use io::{
    DocumentFormat, OutputOptions, emit, parse_document_any, parse_document_str, render,
};
pub use navigation::{ExpansionState, NavigationResolver, Reveal, RevealPlan, RevealSurface};
pub use options::EngineOptions;
pub use path::{Path, Segment, normalize, parse};
pub use schema::{FieldNode, SchemaFieldIndex, build_hierarchy};
pub use validation::{JsonSchemaValidator, Validate, ValidationOutcome, ValidationReport};

pub mod prelude {
    pub use super::{
        EngineOptions, ErrorLocator, ErrorStateMap, ExpansionState, FieldDefinition, FieldType,
        FormSession, NavigationResolver, SchemaFieldIndex, Validate, ValidationOutcome,
    };
}

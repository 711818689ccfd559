mod schema;

pub use schema::{FieldCategory, FieldDefinition, FieldType};

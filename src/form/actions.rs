use serde_json::Value;

/// Document edits accepted by a [`FormSession`](super::FormSession).
#[derive(Debug, Clone, PartialEq)]
pub enum FormCommand {
    SetField {
        path: String,
        value: Value,
    },
    AppendItem {
        path: String,
        item: Value,
    },
    RemoveItem {
        path: String,
        index: usize,
    },
    /// A whole new document produced elsewhere; `changed_path` names the leaf that changed.
    Replace {
        document: Value,
        changed_path: Option<String>,
    },
}

impl FormCommand {
    pub fn set(path: impl Into<String>, value: Value) -> Self {
        FormCommand::SetField {
            path: path.into(),
            value,
        }
    }

    /// Path the command touches, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            FormCommand::SetField { path, .. }
            | FormCommand::AppendItem { path, .. }
            | FormCommand::RemoveItem { path, .. } => Some(path),
            FormCommand::Replace { changed_path, .. } => changed_path.as_deref(),
        }
    }
}

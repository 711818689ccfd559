use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use super::DocumentFormat;

/// How reports, plans and field lists are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    pub format: DocumentFormat,
    pub pretty: bool,
}

impl OutputOptions {
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            pretty: true,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self::new(DocumentFormat::Json)
    }
}

pub fn render<T: Serialize + ?Sized>(value: &T, options: &OutputOptions) -> Result<String> {
    match options.format {
        DocumentFormat::Json if options.pretty => {
            serde_json::to_string_pretty(value).context("failed to serialize JSON")
        }
        DocumentFormat::Json => serde_json::to_string(value).context("failed to serialize JSON"),
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => serde_yaml::to_string(value).context("failed to serialize YAML"),
        #[cfg(feature = "toml")]
        DocumentFormat::Toml if options.pretty => {
            toml::to_string_pretty(value).context("TOML output needs a table at the top level")
        }
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => {
            toml::to_string(value).context("TOML output needs a table at the top level")
        }
    }
}

/// Render `value` and write it to `out`, newline-terminated.
pub fn emit<T, W>(value: &T, options: &OutputOptions, out: &mut W) -> Result<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    let payload = render(value, options)?;
    let payload = payload.trim_end_matches('\n');
    writeln!(out, "{payload}").context("failed to write output")?;
    out.flush().context("failed to flush output")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::navigation::RevealPlan;

    #[test]
    fn compact_json_is_one_line() {
        let mut out = Vec::new();
        let options = OutputOptions::default().with_pretty(false);
        emit(&json!({"records": [1, 2]}), &options, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"records\":[1,2]}\n");
    }

    #[test]
    fn renders_engine_types_directly() {
        let plan = RevealPlan {
            target: "materialList[0].country".into(),
            section: Some("materialList".into()),
            to_expand: vec!["materialList[0]".into()],
        };
        let rendered = render(&plan, &OutputOptions::default()).unwrap();
        assert!(rendered.contains("\"toExpand\": ["));
        assert!(rendered.contains("\n"));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_output() {
        let options = OutputOptions::new(DocumentFormat::Yaml);
        let rendered = render(&json!({"section": "general"}), &options).unwrap();
        assert_eq!(rendered.trim(), "section: general");
    }

    #[cfg(feature = "toml")]
    #[test]
    fn toml_needs_a_table() {
        let options = OutputOptions::new(DocumentFormat::Toml);
        assert!(render(&json!(["a"]), &options).is_err());
        assert!(render(&json!({"valid": false}), &options).is_ok());
    }
}

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{Report, Result, WrapErr, eyre};
use serde_json::{Value, json};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use schemaform::{
    DocumentFormat, EngineOptions, ExpansionState, FieldDefinition, FieldNode, JsonSchemaValidator,
    NavigationResolver, OutputOptions, SchemaFieldIndex, Validate, ValidationOutcome,
    ValidationReport, build_hierarchy, emit, parse_document_any,
    schema::{defaults::default_document, json_schema::field_definitions},
};

#[derive(Debug, Parser)]
#[command(
    name = "schemaform",
    version,
    about = "Inspect form schemas, map validation errors onto document paths, plan field navigation"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit compact JSON/TOML rather than pretty formatting
    #[arg(long = "no-pretty", global = true)]
    no_pretty: bool,

    /// Write the result to FILE instead of stdout; the extension picks the format
    #[arg(short = 'o', long = "output", value_name = "FILE", global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the field hierarchy of a schema
    Fields {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Print the flattened field list as JSON instead of a tree
        #[arg(long)]
        json: bool,
    },
    /// Validate a document (or take validator output) and map every error onto a path
    Check {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Document spec: file path, inline payload, or "-" for stdin
        #[arg(short = 'd', long = "document", value_name = "SPEC")]
        document: Option<String>,

        /// Validator output spec: a JSON array of error strings
        #[arg(short = 'e', long = "errors", value_name = "SPEC")]
        errors: Option<String>,
    },
    /// Show what has to be expanded to reveal a path
    Locate {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Concrete, template, or normalized path of the target field
        #[arg(short = 'p', long = "path", value_name = "PATH")]
        path: String,

        /// Sections or containers that are already expanded
        #[arg(long = "expanded", value_name = "ID", num_args = 1.., action = ArgAction::Append)]
        expanded: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct SchemaArgs {
    /// Schema spec (JSON Schema or field-definition list): file path, inline payload, or "-" for stdin
    #[arg(short = 's', long = "schema", value_name = "SPEC")]
    schema: String,
}

#[derive(Debug)]
enum InputSource {
    File(PathBuf),
    Stdin,
}

/// A loaded schema: its field definitions and, for JSON Schema input, the raw schema.
struct LoadedSchema {
    fields: Vec<FieldDefinition>,
    json_schema: Option<Value>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = cli
        .output
        .as_deref()
        .and_then(DocumentFormat::from_path)
        .unwrap_or_default();
    let output = OutputOptions::new(format).with_pretty(!cli.no_pretty);
    let mut sink = open_sink(cli.output.as_deref())?;
    let options = EngineOptions::default();

    match cli.command {
        Command::Fields { schema, json } => {
            let loaded = load_schema(&schema.schema)?;
            let index = build_index(&loaded, &options)?;
            if json {
                let fields: Vec<&FieldDefinition> = index.iter().collect();
                emit(&fields, &output, &mut sink).map_err(|err| eyre!("{err:#}"))?;
            } else {
                write!(sink, "{}", render_tree(&build_hierarchy(index.iter())))
                    .wrap_err("failed to write field tree")?;
            }
        }
        Command::Check {
            schema,
            document,
            errors,
        } => {
            ensure_single_stdin(&[Some(schema.schema.as_str()), document.as_deref(), errors.as_deref()])?;
            let loaded = load_schema(&schema.schema)?;
            let index = build_index(&loaded, &options)?;
            let outcome = match errors.as_deref() {
                Some(spec) => outcome_from_errors(load_value(spec, "errors")?)?,
                None => {
                    let raw_schema = loaded.json_schema.as_ref().ok_or_else(|| {
                        eyre!("validating a document needs a JSON Schema; pass --errors for field-definition lists")
                    })?;
                    let document = match document.as_deref() {
                        Some(spec) => load_value(spec, "document")?,
                        None => default_document(&loaded.fields, None),
                    };
                    JsonSchemaValidator::new(raw_schema)
                        .map_err(|err| eyre!("{err:#}"))?
                        .validate(&document)
                }
            };

            let report = ValidationReport::build(outcome, &index, &options);
            info!(
                errors = report.records.len(),
                unresolved = report.unresolved().count(),
                "validation mapped"
            );
            let payload = json!({
                "valid": report.is_valid(),
                "records": report.records,
                "state": report.state,
                "sections": report.state.section_error_counts(&index),
            });
            emit(&payload, &output, &mut sink).map_err(|err| eyre!("{err:#}"))?;
        }
        Command::Locate {
            schema,
            path,
            expanded,
        } => {
            let loaded = load_schema(&schema.schema)?;
            let index = build_index(&loaded, &options)?;
            let hierarchy = build_hierarchy(index.iter());
            let state: ExpansionState = expanded.into_iter().collect();
            let plan = NavigationResolver::new(&index, &hierarchy, &options).plan(&path, &state);
            emit(&plan, &output, &mut sink).map_err(|err| eyre!("{err:#}"))?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn open_sink(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .wrap_err_with(|| format!("failed to create output file {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

fn build_index(loaded: &LoadedSchema, options: &EngineOptions) -> Result<SchemaFieldIndex> {
    SchemaFieldIndex::with_options(&loaded.fields, options).wrap_err("invalid field definitions")
}

fn load_schema(spec: &str) -> Result<LoadedSchema> {
    let value = load_value(spec, "schema")?;
    if looks_like_json_schema(&value) {
        debug!("schema input is a JSON Schema document");
        let fields = field_definitions(&value).map_err(|err| eyre!("{err:#}"))?;
        return Ok(LoadedSchema {
            fields,
            json_schema: Some(value),
        });
    }

    let list = match value {
        Value::Object(mut map) if map.get("fields").is_some_and(Value::is_array) => {
            map.remove("fields").unwrap_or_default()
        }
        other => other,
    };
    let fields: Vec<FieldDefinition> =
        serde_json::from_value(list).wrap_err("schema is neither a JSON Schema nor a field list")?;
    Ok(LoadedSchema {
        fields,
        json_schema: None,
    })
}

fn outcome_from_errors(value: Value) -> Result<ValidationOutcome> {
    let errors: Vec<String> =
        serde_json::from_value(value).wrap_err("--errors must be a JSON array of strings")?;
    Ok(ValidationOutcome::invalid(errors))
}

fn ensure_single_stdin(specs: &[Option<&str>]) -> Result<()> {
    let from_stdin = specs.iter().filter(|spec| **spec == Some("-")).count();
    if from_stdin > 1 {
        return Err(eyre!(
            "only one input can be read from stdin; provide the others inline or as files"
        ));
    }
    Ok(())
}

fn load_value(spec: &str, label: &str) -> Result<Value> {
    if spec == "-" {
        let contents = read_from_source(&InputSource::Stdin)?;
        return parse_contents(&contents, DocumentFormat::default(), label);
    }

    if looks_inline(spec) {
        return parse_contents(spec, DocumentFormat::default(), &format!("inline {label}"));
    }

    let path = PathBuf::from(spec);
    let format = DocumentFormat::from_path(&path).unwrap_or_default();
    match read_from_source(&InputSource::File(path.clone())) {
        Ok(contents) => parse_contents(&contents, format, label),
        Err(err) => {
            if is_not_found(&err) {
                let inline_label = format!("inline {label}");
                return parse_contents(spec, DocumentFormat::default(), &inline_label);
            }
            Err(err.wrap_err(format!("failed to load {label} from {}", path.display())))
        }
    }
}

fn looks_inline(spec: &str) -> bool {
    let trimmed = spec.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

fn read_from_source(source: &InputSource) -> Result<String> {
    match source {
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .wrap_err("failed to read from stdin")?;
            Ok(buffer)
        }
        InputSource::File(path) => {
            fs::read_to_string(path).wrap_err_with(|| format!("failed to read file {}", path.display()))
        }
    }
}

fn is_not_found(err: &Report) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|io_err| io_err.kind() == io::ErrorKind::NotFound)
}

fn parse_contents(contents: &str, format: DocumentFormat, label: &str) -> Result<Value> {
    parse_document_any(contents, format).map_err(|primary| {
        eyre!(
            "failed to parse {label}: tried {} (first error: {primary})",
            format_list()
        )
    })
}

fn format_list() -> String {
    DocumentFormat::available_formats()
        .into_iter()
        .map(|format| format.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn looks_like_json_schema(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    if obj.contains_key("$schema") {
        return true;
    }
    if obj.contains_key("fields") {
        return false;
    }
    matches!(obj.get("type"), Some(Value::String(t)) if t == "object")
        || obj
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|props| !props.is_empty())
}

fn render_tree(root: &FieldNode) -> String {
    let mut out = String::new();
    root.walk(&mut |node, depth| {
        let indent = "  ".repeat(depth);
        match &node.definition {
            Some(definition) => {
                let required = if definition.required { " *" } else { "" };
                out.push_str(&format!(
                    "{indent}{} [{}] {}{required}\n",
                    node.segment,
                    definition.field_type.as_str(),
                    node.path,
                ));
            }
            None => out.push_str(&format!("{indent}{} {}\n", node.segment, node.path)),
        }
    });
    out
}

//! sift command-line surface.
//!
//! Thin file-in, file-out wrapper over the library crates: `filter`
//! applies a query file to an item file, `encode` builds one query
//! term from flags, `decode` renders a query file as display tuples.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use indexmap::IndexMap;
use sift_codec::{
    decode_field_query, encode_field_query, field_query_to_json, filter_query_from_json,
    DecodedFieldQuery, DecodedOperand,
};
use sift_core::{FieldKind, FieldSpec, Fields, Operator, QueryInput};
use sift_eval::{filter_by_query, Items};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Structured field-query engine.
#[derive(Parser)]
#[command(name = "sift", version, about = "Structured field-query engine")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a JSON item set with an encoded filter query
    Filter {
        /// Path to the field specifications JSON file
        fields: PathBuf,
        /// Path to the items JSON file (object keyed by item id)
        #[arg(long)]
        items: PathBuf,
        /// Path to the filter query JSON file (array of field queries)
        #[arg(long)]
        query: PathBuf,
    },

    /// Encode one query term from a field, value, and operators
    Encode {
        /// Path to the field specifications JSON file
        fields: PathBuf,
        /// Field name; omit for a free-text term
        #[arg(long)]
        field: Option<String>,
        /// Raw value: text, a comma-separated selection, or
        /// `start..end` Unix seconds for a datetime range
        #[arg(long)]
        value: String,
        /// Operator symbol, e.g. $in
        #[arg(long)]
        operator: Option<String>,
        /// Sub-operator symbol for array fields, e.g. $nin
        #[arg(long)]
        sub_operator: Option<String>,
        /// Dictionary entry key
        #[arg(long)]
        key: Option<String>,
    },

    /// Decode an encoded filter query into display tuples
    Decode {
        /// Path to the field specifications JSON file
        fields: PathBuf,
        /// Path to the filter query JSON file
        #[arg(long)]
        query: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Filter {
            fields,
            items,
            query,
        } => run_filter(fields, items, query, cli.output),
        Commands::Encode {
            fields,
            field,
            value,
            operator,
            sub_operator,
            key,
        } => run_encode(
            fields,
            field.as_deref(),
            value,
            operator.as_deref(),
            sub_operator.as_deref(),
            key.as_deref(),
        ),
        Commands::Decode { fields, query } => run_decode(fields, query, cli.output),
    };
    match result {
        Ok(()) => {}
        Err(message) => {
            eprintln!("error: {}", message);
            process::exit(1);
        }
    }
}

fn run_filter(
    fields_path: &Path,
    items_path: &Path,
    query_path: &Path,
    output: OutputFormat,
) -> Result<(), String> {
    let fields = load_fields(fields_path)?;
    let items = load_items(items_path)?;
    let query =
        filter_query_from_json(&read_json(query_path)?).map_err(|e| e.to_string())?;

    let kept = filter_by_query(&fields, &items, &query).map_err(|e| e.to_string())?;

    match output {
        OutputFormat::Text => {
            for id in kept.keys() {
                println!("{}", id);
            }
            eprintln!("{} of {} items matched", kept.len(), items.len());
        }
        OutputFormat::Json => {
            let obj: serde_json::Map<String, serde_json::Value> =
                kept.into_iter().collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::Value::Object(obj))
                    .map_err(|e| e.to_string())?
            );
        }
    }
    Ok(())
}

fn run_encode(
    fields_path: &Path,
    field: Option<&str>,
    value: &str,
    operator: Option<&str>,
    sub_operator: Option<&str>,
    key: Option<&str>,
) -> Result<(), String> {
    let fields = load_fields(fields_path)?;
    let operator = operator.map(parse_operator).transpose()?;
    let sub_operator = sub_operator.map(parse_operator).transpose()?;
    let input = input_for(field.and_then(|name| fields.get(name)), value);

    let encoded = encode_field_query(field, &input, operator, sub_operator, &fields, key)
        .ok_or("input did not encode to a query")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&field_query_to_json(&encoded))
            .map_err(|e| e.to_string())?
    );
    Ok(())
}

fn run_decode(fields_path: &Path, query_path: &Path, output: OutputFormat) -> Result<(), String> {
    let fields = load_fields(fields_path)?;
    let query =
        filter_query_from_json(&read_json(query_path)?).map_err(|e| e.to_string())?;

    let decoded: Result<Vec<DecodedFieldQuery>, _> = query
        .iter()
        .map(|term| decode_field_query(term, &fields))
        .collect();
    let decoded = decoded.map_err(|e| e.to_string())?;

    match output {
        OutputFormat::Text => {
            for term in &decoded {
                let label = term
                    .field_name
                    .as_deref()
                    .and_then(|name| fields.get(name))
                    .map(|spec| spec.label.clone())
                    .unwrap_or_else(|| "(any field)".to_string());
                let sub = term
                    .sub_operator_symbol
                    .as_deref()
                    .map(|s| format!(" {}", s))
                    .unwrap_or_default();
                println!(
                    "{} {}{} {}",
                    label,
                    term.operator_symbol,
                    sub,
                    operand_text(&term.operand)
                );
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&decoded).map_err(|e| e.to_string())?
            );
        }
    }
    Ok(())
}

/// Shape the raw CLI value into the candidate buffer the field expects.
fn input_for(spec: Option<&FieldSpec>, value: &str) -> QueryInput {
    match spec.map(|s| &s.kind) {
        Some(FieldKind::Enum { .. }) => QueryInput::Choices(split_selection(value)),
        Some(FieldKind::Array { element }) => match element.kind {
            FieldKind::Number => QueryInput::Text(value.to_string()),
            _ => QueryInput::Choices(split_selection(value)),
        },
        Some(FieldKind::Datetime) => {
            if let Some((start, end)) = value.split_once("..") {
                match (start.trim().parse::<f64>(), end.trim().parse::<f64>()) {
                    (Ok(start), Ok(end)) => QueryInput::Span(start, end),
                    _ => QueryInput::Text(value.to_string()),
                }
            } else {
                match value.trim().parse::<f64>() {
                    Ok(stamp) => QueryInput::Stamp(stamp),
                    Err(_) => QueryInput::Text(value.to_string()),
                }
            }
        }
        _ => QueryInput::Text(value.to_string()),
    }
}

fn split_selection(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_operator(symbol: &str) -> Result<Operator, String> {
    symbol.parse::<Operator>().map_err(|e| e.to_string())
}

fn operand_text(operand: &DecodedOperand) -> String {
    match operand {
        DecodedOperand::Text(s) => s.clone(),
        DecodedOperand::Number(n) => {
            if n.fract() == 0.0 {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        DecodedOperand::List(values) => values.join(", "),
        DecodedOperand::Span([start, end]) => format!("{}..{}", start, end),
        DecodedOperand::Entries(entries) => entries
            .iter()
            .map(|(k, v)| {
                if k.is_empty() {
                    v.clone()
                } else {
                    format!("{}:{}", k, v)
                }
            })
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value, String> {
    let text =
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON in {}: {}", path.display(), e))
}

fn load_fields(path: &Path) -> Result<Fields, String> {
    Fields::from_json(&read_json(path)?).map_err(|e| e.to_string())
}

fn load_items(path: &Path) -> Result<Items, String> {
    let json = read_json(path)?;
    let obj = json
        .as_object()
        .ok_or_else(|| format!("{}: items must be a JSON object keyed by id", path.display()))?;
    let mut items = IndexMap::new();
    for (id, item) in obj {
        items.insert(id.clone(), item.clone());
    }
    Ok(items)
}

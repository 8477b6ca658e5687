//! Docket CLI - evaluate computed-field formulas from the command line

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use docket::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docket")]
#[command(author, version, about = "Formula evaluation for legal document forms")]
struct Cli {
    /// JSON object with form data
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Set a data value; the value is read as JSON when it parses, text otherwise
    #[arg(long = "set", value_name = "NAME=VALUE", global = true)]
    set: Vec<String>,

    /// Pin today's date (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Maximum resolver passes
    #[arg(long, default_value_t = 5, global = true)]
    max_passes: u32,

    /// Fail on the first absorbed problem instead of yielding 0
    #[arg(long, global = true)]
    strict: bool,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single formula
    Eval {
        /// Formula text, e.g. '{d.hours}*{d.rate}'
        formula: String,
    },

    /// Resolve computed fields from a JSON array of field descriptors
    Batch {
        /// Field descriptor file
        fields: PathBuf,

        /// Print passes, convergence and diagnostics alongside the values
        #[arg(short, long)]
        report: bool,
    },

    /// List built-in functions
    Functions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let engine = build_engine(&cli);
    let output = match &cli.command {
        Commands::Eval { formula } => {
            let ctx = load_context(cli.data.as_deref(), &cli.set)?;
            eval(&engine, formula, &ctx, cli.strict)?
        }
        Commands::Batch { fields, report } => {
            let ctx = load_context(cli.data.as_deref(), &cli.set)?;
            let fields = load_fields(fields)?;
            batch(&engine, &fields, &ctx, cli.strict, *report)?
        }
        Commands::Functions => list_functions(&engine),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("docket=debug,docket_formula=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_engine(cli: &Cli) -> Engine {
    let engine = Engine::with_options(EngineOptions {
        max_passes: cli.max_passes,
        ..Default::default()
    });
    match cli.today {
        Some(today) => engine.with_clock(FixedClock(today)),
        None => engine,
    }
}

fn eval(
    engine: &Engine,
    formula: &str,
    ctx: &DataContext,
    strict: bool,
) -> Result<serde_json::Value> {
    let value = if strict {
        engine
            .try_evaluate(formula, ctx)
            .with_context(|| format!("Failed to evaluate '{}'", formula))?
    } else {
        engine.evaluate(formula, ctx)
    };
    Ok(value_to_json(&value))
}

fn batch(
    engine: &Engine,
    fields: &[FieldDescriptor],
    ctx: &DataContext,
    strict: bool,
    report: bool,
) -> Result<serde_json::Value> {
    tracing::debug!(fields = fields.len(), "resolving computed fields");
    let (resolution, diagnostics) = engine.resolve_with_diagnostics(fields, ctx);

    if strict {
        if let Some(error) = diagnostics.first() {
            bail!("Failed to resolve computed fields: {}", error);
        }
    }

    let values: BTreeMap<&str, serde_json::Value> = resolution
        .values
        .iter()
        .map(|(id, value)| (id.as_str(), value_to_json(value)))
        .collect();

    if !report {
        return Ok(json!(values));
    }

    let diagnostics: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
    Ok(json!({
        "values": values,
        "passes": resolution.passes,
        "converged": resolution.converged,
        "circularFields": resolution.circular_fields,
        "diagnostics": diagnostics,
    }))
}

fn list_functions(engine: &Engine) -> serde_json::Value {
    let functions: Vec<_> = engine
        .registry()
        .definitions()
        .into_iter()
        .map(|def| {
            json!({
                "name": def.name,
                "minArgs": def.min_args,
                "maxArgs": def.max_args,
                "volatile": def.volatile,
            })
        })
        .collect();
    json!(functions)
}

/// Build the data context from an optional JSON file plus `--set` overrides
fn load_context(data: Option<&Path>, sets: &[String]) -> Result<DataContext> {
    let mut ctx = DataContext::new();

    if let Some(path) = data {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&text)
            .with_context(|| format!("'{}' is not a JSON object", path.display()))?;
        ctx.extend(object.into_iter().map(|(name, value)| (name, json_to_value(value))));
    }

    for assignment in sets {
        let (name, value) = parse_assignment(assignment)?;
        ctx.insert(name, value);
    }

    Ok(ctx)
}

fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
    let Some((name, raw)) = assignment.split_once('=') else {
        bail!("Expected NAME=VALUE, got '{}'", assignment);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Missing variable name in '{}'", assignment);
    }

    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => json_to_value(json),
        Err(_) => Value::Text(raw.to_string()),
    };
    Ok((name.to_string(), value))
}

fn load_fields(path: &Path) -> Result<Vec<FieldDescriptor>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not a JSON array of field descriptors", path.display()))
}

/// Convert form data JSON into an engine value
fn json_to_value(json: serde_json::Value) -> Value {
    use serde_json::Value as Json;

    match json {
        Json::Null => Value::Empty,
        Json::Bool(b) => Value::Boolean(b),
        Json::Number(n) => n.as_f64().map_or(Value::Empty, Value::Number),
        Json::String(s) => Value::Text(s),
        Json::Array(items) => Value::List(
            items
                .into_iter()
                .map(|item| match item {
                    Json::String(s) => s,
                    Json::Null => String::new(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        object @ Json::Object(_) => Value::Text(object.to_string()),
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Empty => serde_json::Value::Null,
        Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => json!(*n as i64),
        Value::Number(n) => json!(n),
        Value::Text(s) => json!(s),
        Value::Boolean(b) => json!(b),
        Value::List(items) => json!(items),
    }
}

//! qail-array: inspect and build PostgreSQL array literals from a shell.
//!
//! # Usage
//!
//! ```bash
//! # Show dimensions and raw elements
//! qail-array parse '{{1,2},{3,4}}'
//!
//! # Typed decode, printed as JSON
//! qail-array decode '{t,f,NULL}' --kind bool
//!
//! # Typed encode (`null` is NULL)
//! qail-array encode --kind text 'a,b' null plain
//!
//! # bytea text forms
//! qail-array bytea decode '\x0102ff'
//! qail-array bytea encode 0102ff --server-version 80400
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use qail_array::prelude::*;
use qail_array::protocol::bytea::{decode_bytea, encode_bytea, encode_hex};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qail-array")]
#[command(author = "QAIL Contributors")]
#[command(version)]
#[command(about = "PostgreSQL array literal and bytea codec", long_about = None)]
#[command(after_help = "EXAMPLES:
    qail-array parse '{{1,2},{3,4}}'
    qail-array decode '{1.5,NaN,NULL}' --kind float8
    qail-array encode --kind int8 1 2 null
    qail-array bytea encode 68656c6c6f --server-version 80400")]
struct Cli {
    /// Config file (defaults to ./qail-array.toml, then the user config dir)
    #[arg(long, global = true, env = "QAIL_ARRAY_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Bool,
    Float8,
    Float4,
    Int8,
    Int4,
    Text,
    Bytea,
    Timestamp,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the dimensions and raw elements of a literal
    Parse {
        literal: String,

        /// Element delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Decode a one-dimensional literal into typed values
    Decode {
        literal: String,

        #[arg(short, long, value_enum)]
        kind: Kind,
    },
    /// Encode element values into a literal
    Encode {
        #[arg(short, long, value_enum)]
        kind: Kind,

        /// Element values in their text form; `null` for NULL
        values: Vec<String>,
    },
    /// bytea text format helpers
    #[command(subcommand)]
    Bytea(ByteaCommand),
}

#[derive(Subcommand)]
enum ByteaCommand {
    /// Decode hex or escape format text, print the bytes as hex
    Decode { text: String },
    /// Encode hex digits in the format the server version expects
    Encode {
        hex: String,

        /// Override the configured server version
        #[arg(long)]
        server_version: Option<u32>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("qail_array=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<CodecConfig> {
    let config = match path {
        Some(path) => CodecConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CodecConfig::discover()?,
    };
    tracing::debug!(?config, "codec config");
    Ok(config)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let ctx = config.context()?;

    match &cli.command {
        Commands::Parse {
            literal,
            delimiter,
            format,
        } => parse_literal(literal, delimiter, *format),
        Commands::Decode { literal, kind } => {
            let values = decode_literal(literal.as_bytes(), *kind, &ctx)?;
            println!("{}", serde_json::to_string_pretty(&values)?);
            Ok(())
        }
        Commands::Encode { kind, values } => {
            let literal = encode_values(values, *kind, &ctx)?;
            println!("{}", String::from_utf8_lossy(&literal));
            Ok(())
        }
        Commands::Bytea(ByteaCommand::Decode { text }) => {
            let data = decode_bytea(text.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&encode_hex(&data)[2..]));
            Ok(())
        }
        Commands::Bytea(ByteaCommand::Encode {
            hex,
            server_version,
        }) => {
            let data = decode_bytea(format!("\\x{hex}").as_bytes())
                .with_context(|| format!("{hex:?} is not a hex string"))?;
            let version = server_version.unwrap_or(ctx.server_version);
            println!("{}", String::from_utf8_lossy(&encode_bytea(&data, version)));
            Ok(())
        }
    }
}

fn parse_literal(literal: &str, delimiter: &str, format: OutputFormat) -> anyhow::Result<()> {
    let parsed = parse_array(literal.as_bytes(), delimiter.as_bytes())?;

    match format {
        OutputFormat::Json => {
            let elements: Vec<Value> = parsed
                .elements
                .iter()
                .map(|e| match e.as_bytes() {
                    Some(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
                    None => Value::Null,
                })
                .collect();
            let out = json!({ "dims": parsed.dims, "elements": elements });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Table => {
            println!("{} {}", "Shape:".dimmed(), parsed.shape().cyan());
            println!();
            for (i, element) in parsed.elements.iter().enumerate() {
                let shown = match element.as_bytes() {
                    Some(bytes) => String::from_utf8_lossy(bytes).white(),
                    None => "NULL".dimmed(),
                };
                println!("  {:>4} │ {}", i.to_string().yellow(), shown);
            }
            println!();
            println!("{} element(s)", parsed.elements.len().to_string().cyan());
        }
    }
    Ok(())
}

fn decode_literal(input: &[u8], kind: Kind, ctx: &TextContext) -> anyhow::Result<Value> {
    match kind {
        Kind::Bool => decode_json::<bool>(input, ctx, Value::Bool),
        Kind::Float8 => decode_json::<f64>(input, ctx, float_json),
        Kind::Float4 => decode_json::<f32>(input, ctx, |v| float_json(f64::from(v))),
        Kind::Int8 => decode_json::<i64>(input, ctx, Value::from),
        Kind::Int4 => decode_json::<i32>(input, ctx, Value::from),
        Kind::Text => decode_json::<String>(input, ctx, Value::String),
        Kind::Bytea => decode_json::<Bytea>(input, ctx, |v| {
            Value::String(String::from_utf8_lossy(&encode_hex(&v.0)).into_owned())
        }),
        Kind::Timestamp => decode_json::<chrono::DateTime<chrono::FixedOffset>>(input, ctx, |v| {
            Value::String(v.to_rfc3339())
        }),
    }
}

fn decode_json<T: PgElement>(
    input: &[u8],
    ctx: &TextContext,
    to_json: impl Fn(T) -> Value,
) -> anyhow::Result<Value> {
    let values = qail_array::decode::<Option<T>>(input, ctx)?;
    Ok(Value::Array(
        values
            .into_iter()
            .map(|v| v.map_or(Value::Null, &to_json))
            .collect(),
    ))
}

/// JSON has no NaN or infinities; those keep their server spelling.
fn float_json(v: f64) -> Value {
    if v.is_finite() {
        Value::from(v)
    } else if v.is_nan() {
        Value::String("NaN".into())
    } else if v > 0.0 {
        Value::String("Infinity".into())
    } else {
        Value::String("-Infinity".into())
    }
}

fn encode_values(values: &[String], kind: Kind, ctx: &TextContext) -> anyhow::Result<Vec<u8>> {
    match kind {
        Kind::Bool => encode_as::<bool>(values, ctx),
        Kind::Float8 => encode_as::<f64>(values, ctx),
        Kind::Float4 => encode_as::<f32>(values, ctx),
        Kind::Int8 => encode_as::<i64>(values, ctx),
        Kind::Int4 => encode_as::<i32>(values, ctx),
        Kind::Text => encode_as::<String>(values, ctx),
        Kind::Bytea => encode_as::<Bytea>(values, ctx),
        Kind::Timestamp => encode_as::<chrono::DateTime<chrono::FixedOffset>>(values, ctx),
    }
}

/// Values are read with the element's own text decoder, so `bytea` takes
/// `\x..` input and timestamps take the server's printed form.
fn encode_as<T: PgElement>(values: &[String], ctx: &TextContext) -> anyhow::Result<Vec<u8>> {
    let items = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            if value == "null" {
                return Ok(None);
            }
            T::decode_element(Some(value.as_bytes()), ctx)
                .map(Some)
                .with_context(|| format!("value {i} ({value:?})"))
        })
        .collect::<anyhow::Result<Vec<Option<T>>>>()?;

    Ok(qail_array::encode(&items, ctx)?.to_vec())
}

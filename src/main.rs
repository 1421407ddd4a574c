//! Command-line interface for recursive-schema

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::sync::Arc;

#[cfg(feature = "cli")]
use recursive_schema::{Error, Field, Limits, Loader, Registry, Serializer};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "recursive-schema")]
#[command(author, version, about = "Recursive schema validation and serialization tool", long_about = None)]
struct Cli {
    /// Use strict limits on data depth and document size
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// List the serializer classes declared in schema documents
    Inspect {
        /// Declaration documents to load, in order
        #[arg(short, long = "schema", value_name = "SCHEMA", required = true)]
        schemas: Vec<PathBuf>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Validate a JSON document against a serializer class
    Validate {
        /// Declaration documents to load, in order
        #[arg(short, long = "schema", value_name = "SCHEMA", required = true)]
        schemas: Vec<PathBuf>,

        /// Serializer class reference (module.Name)
        #[arg(short = 'S', long)]
        serializer: String,

        /// JSON data file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Produce the output representation of a JSON instance
    Serialize {
        /// Declaration documents to load, in order
        #[arg(short, long = "schema", value_name = "SCHEMA", required = true)]
        schemas: Vec<PathBuf>,

        /// Serializer class reference (module.Name)
        #[arg(short = 'S', long)]
        serializer: String,

        /// JSON instance file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let limits = if cli.strict {
        Limits::strict()
    } else {
        Limits::default()
    };

    let result = match cli.command {
        Commands::Inspect { schemas, json } => cmd_inspect(&schemas, json, &limits),
        Commands::Validate {
            schemas,
            serializer,
            file,
        } => cmd_validate(&schemas, &serializer, file, &limits),
        Commands::Serialize {
            schemas,
            serializer,
            file,
        } => cmd_serialize(&schemas, &serializer, file, &limits),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn load_registry(schemas: &[PathBuf], limits: &Limits) -> Result<Arc<Registry>, Error> {
    let loader = Loader::new().with_limits(limits.clone());
    let mut registry = Registry::new();
    for schema in schemas {
        loader.load_file(&mut registry, schema)?;
    }
    Ok(Arc::new(registry))
}

#[cfg(feature = "cli")]
fn load_serializer(
    schemas: &[PathBuf],
    reference: &str,
    limits: &Limits,
) -> Result<Serializer, Error> {
    let registry = load_registry(schemas, limits)?;
    Ok(registry.serializer(reference)?.with_limits(limits.clone()))
}

#[cfg(feature = "cli")]
fn read_json(file: PathBuf) -> Result<serde_json::Value, Error> {
    let content = fs::read_to_string(&file)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(feature = "cli")]
fn cmd_inspect(
    schemas: &[PathBuf],
    json: bool,
    limits: &Limits,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_registry(schemas, limits)?;

    if json {
        let classes: Vec<_> = registry
            .classes()
            .map(|class| {
                let fields: serde_json::Map<_, _> = class
                    .fields()
                    .map(|(name, field)| (name.to_string(), describe_field(field)))
                    .collect();
                serde_json::json!({
                    "name": class.qualified_name(),
                    "fields": fields,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&classes)?);
        return Ok(());
    }

    println!("recursive-schema v{}", recursive_schema::VERSION);
    println!();
    let count = registry.classes().count();
    println!("Serializer classes: {}", count);
    for class in registry.classes() {
        println!();
        println!("{}", class.qualified_name());
        for (name, field) in class.fields() {
            match describe_field(field).get("to").and_then(|to| to.as_str()) {
                Some(to) => println!("  {}: {} -> {}", name, field.type_name(), to),
                None => println!("  {}: {}", name, field.type_name()),
            }
        }
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn describe_field(field: &dyn Field) -> serde_json::Value {
    let mut description = serde_json::json!({ "type": field.type_name() });
    if let Some(placeholder) = field.as_recursive() {
        let target = placeholder.reference().unwrap_or("self");
        description["to"] = serde_json::Value::from(target);
        if !placeholder.options().is_empty() {
            description["options"] = serde_json::to_value(placeholder.options())
                .unwrap_or(serde_json::Value::Null);
        }
    }
    description
}

#[cfg(feature = "cli")]
fn cmd_validate(
    schemas: &[PathBuf],
    reference: &str,
    file: PathBuf,
    limits: &Limits,
) -> Result<(), Box<dyn std::error::Error>> {
    let serializer = load_serializer(schemas, reference, limits)?;
    let data = read_json(file)?;

    match serializer.validate(&data) {
        Ok(validated) => {
            println!("{}", serde_json::to_string_pretty(&validated)?);
            Ok(())
        }
        Err(Error::Validation(detail)) => {
            println!("Document is invalid");
            println!();
            println!("Errors:");
            for (path, message) in detail.paths() {
                if path.is_empty() {
                    println!("  - {}", message);
                } else {
                    println!("  - {}: {}", path, message);
                }
            }
            std::process::exit(1);
        }
        Err(other) => Err(other.into()),
    }
}

#[cfg(feature = "cli")]
fn cmd_serialize(
    schemas: &[PathBuf],
    reference: &str,
    file: PathBuf,
    limits: &Limits,
) -> Result<(), Box<dyn std::error::Error>> {
    let serializer = load_serializer(schemas, reference, limits)?;
    let instance = read_json(file)?;
    let output = serializer.serialize(&instance)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}

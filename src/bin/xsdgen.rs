//! xsdgen CLI: XSD/WSDL → resolved types and Rust declarations.

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::process;
use xsdgen::codegen;
use xsdgen::config::Config;
use xsdgen::xsd::{self, SchemaSet, Type, TypeDef};

#[derive(Parser)]
#[command(name = "xsdgen", about = "XSD/WSDL schema normalizer and type resolver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List resolved types
    Types {
        #[command(flatten)]
        input: InputArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List import/include hints of a schema document
    Imports {
        /// Schema or WSDL file
        file: String,
    },
    /// Emit Rust declarations
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Schema or WSDL files
    #[arg(required = true)]
    files: Vec<String>,

    /// Follow relative schemaLocation hints of each file
    #[arg(long)]
    follow_imports: bool,

    /// Do not add the embedded xml/soap-encoding/wsdl/xlink schemas
    #[arg(long)]
    no_standard_schemas: bool,

    /// Maximum nesting depth
    #[arg(long, default_value_t = xsdgen::config::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

impl InputArgs {
    fn config(&self) -> Config {
        let config = Config::new().with_max_depth(self.max_depth);
        if self.no_standard_schemas {
            config.without_standard_schemas()
        } else {
            config
        }
    }

    fn load(&self, config: &Config) -> Result<SchemaSet, String> {
        let mut docs = Vec::new();
        for file in &self.files {
            if self.follow_imports {
                let found = xsd::load_with_imports(Path::new(file), config)
                    .map_err(|e| format!("{file}: {e}"))?;
                docs.extend(found);
            } else {
                docs.push(read_file(file)?);
            }
        }
        let docs: Vec<&str> = docs.iter().map(String::as_str).collect();
        xsd::parse(&docs, config).map_err(|e| format!("Schema-Fehler: {e}"))
    }
}

fn read_file(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("Lesefehler '{path}': {e}"))
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Fehler: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Types { input, json } => run_types(&input, json),
        Command::Imports { file } => run_imports(&file),
        Command::Generate { input, output } => run_generate(&input, output.as_deref()),
    }
}

fn kind(set: &SchemaSet, ty: &Type) -> &'static str {
    match set.get(ty) {
        TypeDef::Builtin(_) => "builtin",
        TypeDef::Simple(_) => "simple",
        TypeDef::Complex(_) => "complex",
        TypeDef::Linked(_) => "linked",
    }
}

fn run_types(input: &InputArgs, as_json: bool) -> Result<(), String> {
    let config = input.config();
    let set = input.load(&config)?;

    let mut rows = Vec::new();
    for schema in set.schemas() {
        if schema.target_ns == xsdgen::qname::XS_NS {
            continue;
        }
        for (name, ty) in &schema.types {
            let base = set.base(ty).map(|b| set.type_name(b).to_string());
            let anonymous = match set.get(ty) {
                TypeDef::Simple(s) => s.anonymous,
                TypeDef::Complex(c) => c.anonymous,
                _ => false,
            };
            rows.push((schema.target_ns.as_str(), name, kind(&set, ty), base, anonymous));
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if as_json {
        let value: Vec<_> = rows
            .iter()
            .map(|(ns, name, kind, base, anonymous)| {
                json!({
                    "namespace": ns,
                    "name": &*name.local_name,
                    "kind": kind,
                    "base": base,
                    "anonymous": anonymous,
                })
            })
            .collect();
        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| format!("JSON-Fehler: {e}"))?;
        writeln!(out, "{text}").map_err(|e| format!("Schreibfehler: {e}"))?;
    } else {
        for (ns, name, kind, base, _) in &rows {
            let base = base.as_deref().unwrap_or("-");
            writeln!(out, "{ns}\t{}\t{kind}\t{base}", name.local_name)
                .map_err(|e| format!("Schreibfehler: {e}"))?;
        }
    }
    Ok(())
}

fn run_imports(file: &str) -> Result<(), String> {
    let content = read_file(file)?;
    let found = xsd::imports(&content).map_err(|e| format!("{file}: {e}"))?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for import in found {
        writeln!(
            out,
            "{}\t{}\t{}",
            import.kind,
            import.namespace.as_deref().unwrap_or("-"),
            import.location.as_deref().unwrap_or("-")
        )
        .map_err(|e| format!("Schreibfehler: {e}"))?;
    }
    Ok(())
}

fn run_generate(input: &InputArgs, output: Option<&str>) -> Result<(), String> {
    let config = input.config();
    let set = input.load(&config)?;
    let code = codegen::render(&set);
    match output {
        Some(path) if path != "-" => std::fs::write(path, code)
            .map_err(|e| format!("Schreibfehler '{path}': {e}")),
        _ => std::io::stdout()
            .write_all(code.as_bytes())
            .map_err(|e| format!("Schreibfehler: {e}")),
    }
}

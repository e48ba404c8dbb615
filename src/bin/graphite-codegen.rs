//! Generate Rust types from a GraphQL introspection document.
//!
//! Reads introspection JSON, parses it into a schema model, and renders a
//! module of typed definitions (enums, inputs, object DTOs, unions) through
//! the type mapper. Point `--out` at a directory such as `src/generated`
//! and declare the module from your crate.

use graphite_client::schema::{self, SchemaModel, TypeMapper};
use std::fs;
use std::path::PathBuf;

const HELP: &str = "\
graphite-codegen - generate Rust types from a GraphQL introspection document

USAGE:
    graphite-codegen --schema <introspection.json> --out <dir> [OPTIONS]

OPTIONS:
    --schema <path>        introspection JSON file (required)
    --out <dir>            output directory for the generated module (required)
    --scalar <NAME=TYPE>   custom scalar mapping, repeatable; overrides the
                           built-in defaults
    -h, --help             print this help
";

#[derive(Debug)]
struct Args {
    schema_path: PathBuf,
    out_dir: PathBuf,
    scalar_overrides: Vec<(String, String)>,
}

enum ParseArgsError {
    Help,
    Message(String),
}

fn main() {
    let args = match parse_args(std::env::args().collect()) {
        Ok(args) => args,
        Err(ParseArgsError::Help) => {
            print!("{HELP}");
            return;
        }
        Err(ParseArgsError::Message(err)) => {
            eprintln!("{err}\n\n{HELP}");
            std::process::exit(1);
        }
    };

    let json = match fs::read_to_string(&args.schema_path) {
        Ok(json) => json,
        Err(err) => {
            eprintln!("failed to read {}: {err}", args.schema_path.display());
            std::process::exit(1);
        }
    };

    let model = match schema::parse(&json) {
        Ok(model) => model,
        Err(err) => {
            eprintln!("failed to parse schema: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = generate(&args, &model) {
        eprintln!("codegen failed: {err}");
        std::process::exit(1);
    }
}

fn parse_args(args: Vec<String>) -> Result<Args, ParseArgsError> {
    let mut schema_path = None;
    let mut out_dir = None;
    let mut scalar_overrides = Vec::new();

    let mut iter = args.into_iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--schema" => schema_path = iter.next().map(PathBuf::from),
            "--out" => out_dir = iter.next().map(PathBuf::from),
            "--scalar" => {
                let spec = iter.next().ok_or_else(|| {
                    ParseArgsError::Message("--scalar requires NAME=TYPE".to_string())
                })?;
                let (name, target) = spec.split_once('=').ok_or_else(|| {
                    ParseArgsError::Message(format!("invalid scalar mapping: {spec}"))
                })?;
                scalar_overrides.push((name.to_string(), target.to_string()));
            }
            "--help" | "-h" => return Err(ParseArgsError::Help),
            _ => return Err(ParseArgsError::Message(format!("unknown argument: {arg}"))),
        }
    }

    let schema_path = schema_path
        .ok_or_else(|| ParseArgsError::Message("--schema is required".to_string()))?;
    let out_dir =
        out_dir.ok_or_else(|| ParseArgsError::Message("--out is required".to_string()))?;

    Ok(Args {
        schema_path,
        out_dir,
        scalar_overrides,
    })
}

fn generate(args: &Args, model: &SchemaModel) -> Result<(), String> {
    let mapper = TypeMapper::new(model, args.scalar_overrides.iter().cloned());

    fs::create_dir_all(&args.out_dir).map_err(|err| err.to_string())?;

    let files: [(&str, String); 5] = [
        ("mod.rs", render_mod()),
        ("enums.rs", render_enums(model)),
        ("inputs.rs", render_inputs(model, &mapper)),
        ("types.rs", render_types(model, &mapper)),
        ("unions.rs", render_unions(model)),
    ];

    for (name, content) in files {
        fs::write(args.out_dir.join(name), content).map_err(|err| err.to_string())?;
    }

    Ok(())
}

fn render_mod() -> String {
    let mut out = String::new();
    out.push_str("//! Generated GraphQL types.\n\n");
    out.push_str("pub mod enums;\n");
    out.push_str("pub mod inputs;\n");
    out.push_str("pub mod types;\n");
    out.push_str("pub mod unions;\n");
    out
}

fn render_enums(model: &SchemaModel) -> String {
    let mut out = String::new();
    out.push_str("//! Generated enum types.\n\n");
    out.push_str("use serde::{Deserialize, Serialize};\n\n");

    for enum_type in model.enums().values() {
        out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]\n");
        out.push_str(&format!("pub enum {} {{\n", enum_type.name));
        for value in &enum_type.values {
            if value.is_deprecated {
                let reason = value.deprecation_reason.as_deref().unwrap_or("deprecated");
                out.push_str(&format!(
                    "    #[deprecated(note = \"{}\")]\n",
                    reason.replace('"', "\\\"")
                ));
            }
            out.push_str(&format!("    #[serde(rename = \"{}\")]\n", value.name));
            out.push_str(&format!("    {},\n", to_pascal_case(&value.name)));
        }
        out.push_str("}\n\n");
    }

    out
}

fn render_inputs(model: &SchemaModel, mapper: &TypeMapper) -> String {
    let mut out = String::new();
    out.push_str("//! Generated input types.\n\n");
    out.push_str("#![allow(unused_imports)]\n\n");
    out.push_str("use serde::{Deserialize, Serialize};\n\n");
    out.push_str("use super::enums;\n\n");

    for input in model.inputs().values() {
        out.push_str("#[derive(Debug, Clone, Serialize, Deserialize)]\n");
        out.push_str(&format!(
            "pub struct {} {{\n",
            schema::input_type_name(&input.name)
        ));
        for field in &input.fields {
            let rust_name = to_snake_case(&field.name);
            if rust_name != field.name {
                out.push_str(&format!("    #[serde(rename = \"{}\")]\n", field.name));
            }
            let ty = strip_namespace(&mapper.map_type(&field.ty), "inputs::");
            if field.is_required() {
                out.push_str(&format!("    pub {rust_name}: {ty},\n"));
            } else {
                out.push_str("    #[serde(skip_serializing_if = \"Option::is_none\")]\n");
                out.push_str(&format!("    pub {rust_name}: Option<{ty}>,\n"));
            }
        }
        out.push_str("}\n\n");
    }

    out
}

fn render_types(model: &SchemaModel, mapper: &TypeMapper) -> String {
    let mut out = String::new();
    out.push_str("//! Generated object and interface types.\n\n");
    out.push_str("#![allow(unused_imports)]\n\n");
    out.push_str("use serde::{Deserialize, Serialize};\n\n");
    out.push_str("use super::{enums, unions};\n\n");

    let roots: Vec<&str> = [
        Some(model.query_type().name.as_str()),
        model.mutation_type().map(|t| t.name.as_str()),
        model.subscription_type().map(|t| t.name.as_str()),
    ]
    .into_iter()
    .flatten()
    .collect();

    for object in model.objects().values() {
        if roots.contains(&object.name.as_str()) {
            continue;
        }
        out.push_str("#[derive(Debug, Clone, Serialize, Deserialize)]\n");
        out.push_str(&format!("pub struct {}Dto {{\n", object.name));
        for field in &object.fields {
            let rust_name = to_snake_case(&field.name);
            if rust_name != field.name {
                out.push_str(&format!("    #[serde(rename = \"{}\")]\n", field.name));
            }
            let ty = strip_namespace(&mapper.map_type(&field.ty), "types::");
            if field.ty.is_non_null() {
                out.push_str(&format!("    pub {rust_name}: {ty},\n"));
            } else {
                out.push_str(&format!("    pub {rust_name}: Option<{ty}>,\n"));
            }
        }
        out.push_str("}\n\n");
    }

    // Interface values arrive with heterogeneous concrete shapes; the
    // selection-set is the caller's concern, so keep the payload opaque.
    for interface in model.interfaces().values() {
        out.push_str("#[derive(Debug, Clone, Serialize, Deserialize)]\n");
        out.push_str(&format!(
            "pub struct {}(pub serde_json::Value);\n\n",
            interface.name
        ));
    }

    out
}

fn render_unions(model: &SchemaModel) -> String {
    let mut out = String::new();
    out.push_str("//! Generated union types.\n\n");
    out.push_str("use serde::{Deserialize, Serialize};\n\n");

    for union_type in model.unions().values() {
        out.push_str("#[derive(Debug, Clone, Serialize, Deserialize)]\n");
        out.push_str(&format!(
            "pub struct {}(pub serde_json::Value);\n\n",
            union_type.name
        ));
    }

    out
}

/// Generated files live inside the namespace modules the mapper names, so
/// same-module references drop their prefix.
fn strip_namespace(ty: &str, prefix: &str) -> String {
    ty.replace(prefix, "")
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    if is_rust_keyword(&out) {
        out.push('_');
    }
    out
}

fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect()
}

fn is_rust_keyword(name: &str) -> bool {
    const KEYWORDS: [&str; 14] = [
        "type", "ref", "self", "match", "move", "loop", "impl", "enum", "struct", "trait", "mod",
        "use", "fn", "where",
    ];
    KEYWORDS.contains(&name)
}

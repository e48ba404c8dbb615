//! Introspection JSON parsing into the normalized [`SchemaModel`].
//!
//! Accepts standard introspection output, optionally wrapped in a `data`
//! envelope as some tooling produces. Structural invariants are enforced
//! here so the rest of the crate can treat the model as well-formed:
//! every referenced type name resolves, a name belongs to exactly one
//! category, and the declared root types exist.

use crate::schema::model::{
    is_builtin_scalar, ArgumentDefinition, EnumType, EnumValueDefinition, FieldDefinition,
    InputFieldDefinition, InputObjectType, InterfaceType, ObjectType, ScalarType, SchemaModel,
    UnionType,
};
use crate::schema::TypeRef;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A failure while parsing an introspection document.
///
/// Variants carry a location hint: line/column for malformed JSON, the
/// offending type/field context otherwise.
#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    /// The document is not valid JSON.
    #[error("malformed introspection JSON at line {line}, column {column}: {message}")]
    InvalidJson {
        /// 1-based line of the syntax error.
        line: usize,
        /// 1-based column of the syntax error.
        column: usize,
        /// The underlying parser message.
        message: String,
    },

    /// The document has no `__schema` field (directly or under `data`).
    #[error("Missing '__schema' field in introspection document")]
    MissingSchema,

    /// The `__schema` value does not have the expected structure.
    #[error("malformed '__schema' structure: {detail}")]
    MalformedSchema {
        /// What was wrong.
        detail: String,
    },

    /// The document declares no usable `queryType`.
    #[error("missing or unresolvable 'queryType' in introspection document")]
    MissingQueryType,

    /// A root type names a type that was not parsed.
    #[error("{role} type '{name}' is not present among parsed types")]
    UnknownRootType {
        /// Which root slot referenced it.
        role: &'static str,
        /// The missing type name.
        name: String,
    },

    /// Two type entries share a name.
    #[error("duplicate type name '{name}' in introspection document")]
    DuplicateType {
        /// The repeated name.
        name: String,
    },

    /// A type entry carries a kind that cannot appear at the top level.
    #[error("unexpected type kind '{kind}' for type '{name}'")]
    UnexpectedKind {
        /// The introspection kind.
        kind: String,
        /// The type it appeared on.
        name: String,
    },

    /// A `NON_NULL`/`LIST`/named `ofType` chain was malformed.
    #[error("invalid type reference in {context}: {detail}")]
    InvalidTypeReference {
        /// Where the reference appeared (type and field).
        context: String,
        /// What was wrong.
        detail: String,
    },

    /// A field/argument/input-field references a type that does not exist.
    #[error("unresolved type '{name}' referenced by {context}")]
    UnresolvedReference {
        /// The unknown type name.
        name: String,
        /// Where the reference appeared.
        context: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(rename = "queryType")]
    query_type: Option<RawNamedRef>,
    #[serde(rename = "mutationType")]
    mutation_type: Option<RawNamedRef>,
    #[serde(rename = "subscriptionType")]
    subscription_type: Option<RawNamedRef>,
    #[serde(default)]
    types: Vec<RawType>,
}

#[derive(Debug, Deserialize)]
struct RawNamedRef {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawType {
    kind: String,
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    fields: Option<Vec<RawField>>,
    #[serde(default, rename = "inputFields")]
    input_fields: Option<Vec<RawInputValue>>,
    #[serde(default, rename = "enumValues")]
    enum_values: Option<Vec<RawEnumValue>>,
    #[serde(default)]
    interfaces: Option<Vec<RawTypeRef>>,
    #[serde(default, rename = "possibleTypes")]
    possible_types: Option<Vec<RawTypeRef>>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    description: Option<String>,
    #[serde(default)]
    args: Vec<RawInputValue>,
    #[serde(rename = "type")]
    ty: RawTypeRef,
    #[serde(default, rename = "isDeprecated")]
    is_deprecated: bool,
    #[serde(default, rename = "deprecationReason")]
    deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawInputValue {
    name: String,
    description: Option<String>,
    #[serde(rename = "type")]
    ty: RawTypeRef,
    #[serde(default, rename = "defaultValue")]
    default_value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEnumValue {
    name: String,
    description: Option<String>,
    #[serde(default, rename = "isDeprecated")]
    is_deprecated: bool,
    #[serde(default, rename = "deprecationReason")]
    deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTypeRef {
    kind: String,
    name: Option<String>,
    #[serde(default, rename = "ofType")]
    of_type: Option<Box<RawTypeRef>>,
}

/// Parses an introspection document into a [`SchemaModel`].
///
/// # Errors
///
/// Fails with a located [`SchemaError`] for malformed JSON, a missing
/// `__schema` field, missing/unresolvable root types, duplicate or
/// unexpected type entries, and dangling type references.
pub fn parse(json: &str) -> Result<SchemaModel, SchemaError> {
    let document: Value = serde_json::from_str(json).map_err(|err| SchemaError::InvalidJson {
        line: err.line(),
        column: err.column(),
        message: err.to_string(),
    })?;

    // Some introspection tooling wraps the result in a `data` envelope.
    let schema_value = document
        .get("__schema")
        .or_else(|| document.get("data").and_then(|data| data.get("__schema")))
        .ok_or(SchemaError::MissingSchema)?;

    let raw: RawSchema =
        serde_json::from_value(schema_value.clone()).map_err(|err| SchemaError::MalformedSchema {
            detail: err.to_string(),
        })?;

    let query_root = raw
        .query_type
        .as_ref()
        .and_then(|r| r.name.clone())
        .ok_or(SchemaError::MissingQueryType)?;
    let mutation_root = raw.mutation_type.as_ref().and_then(|r| r.name.clone());
    let subscription_root = raw.subscription_type.as_ref().and_then(|r| r.name.clone());

    let mut model = SchemaModel {
        query_root,
        mutation_root,
        subscription_root,
        objects: BTreeMap::new(),
        inputs: BTreeMap::new(),
        enums: BTreeMap::new(),
        interfaces: BTreeMap::new(),
        unions: BTreeMap::new(),
        scalars: BTreeMap::new(),
    };

    for raw_type in &raw.types {
        classify_type(raw_type, &mut model)?;
    }

    link_interface_implementors(&mut model);
    validate_roots(&model)?;
    validate_references(&model)?;

    Ok(model)
}

/// Sorts one raw type entry into exactly one category map.
fn classify_type(raw: &RawType, model: &mut SchemaModel) -> Result<(), SchemaError> {
    let name = match &raw.name {
        Some(name) => name.clone(),
        // Introspection meta types are unnamed only in ofType chains;
        // a top-level entry without a name has nothing to key on.
        None => {
            return Err(SchemaError::MalformedSchema {
                detail: format!("type entry of kind '{}' has no name", raw.kind),
            })
        }
    };

    // The __Schema/__Type/... meta types describe introspection itself.
    if name.starts_with("__") {
        return Ok(());
    }

    if model.contains(&name) && !is_builtin_scalar(&name) {
        return Err(SchemaError::DuplicateType { name });
    }

    match raw.kind.as_str() {
        "OBJECT" => {
            let fields = parse_fields(&name, raw.fields.as_deref().unwrap_or_default())?;
            let interfaces = raw
                .interfaces
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|r| resolve_type_ref(r, &format!("interfaces of '{name}'")))
                .map(|r| r.map(|ty| ty.base_name().to_string()))
                .collect::<Result<Vec<_>, _>>()?;
            model.objects.insert(
                name.clone(),
                ObjectType {
                    name,
                    description: raw.description.clone(),
                    fields,
                    interfaces,
                },
            );
        }
        "INPUT_OBJECT" => {
            let fields = raw
                .input_fields
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|f| parse_input_field(&name, f))
                .collect::<Result<Vec<_>, _>>()?;
            model.inputs.insert(
                name.clone(),
                InputObjectType {
                    name,
                    description: raw.description.clone(),
                    fields,
                },
            );
        }
        "ENUM" => {
            let values = raw
                .enum_values
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|v| EnumValueDefinition {
                    name: v.name.clone(),
                    description: v.description.clone(),
                    is_deprecated: v.is_deprecated,
                    deprecation_reason: v.deprecation_reason.clone(),
                })
                .collect();
            model.enums.insert(
                name.clone(),
                EnumType {
                    name,
                    description: raw.description.clone(),
                    values,
                },
            );
        }
        "INTERFACE" => {
            let fields = parse_fields(&name, raw.fields.as_deref().unwrap_or_default())?;
            model.interfaces.insert(
                name.clone(),
                InterfaceType {
                    name,
                    description: raw.description.clone(),
                    fields,
                    implementors: Default::default(),
                },
            );
        }
        "UNION" => {
            let members = raw
                .possible_types
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|r| resolve_type_ref(r, &format!("possible types of '{name}'")))
                .map(|r| r.map(|ty| ty.base_name().to_string()))
                .collect::<Result<_, _>>()?;
            model.unions.insert(
                name.clone(),
                UnionType {
                    name,
                    description: raw.description.clone(),
                    members,
                },
            );
        }
        "SCALAR" => {
            if !is_builtin_scalar(&name) {
                model.scalars.insert(
                    name.clone(),
                    ScalarType {
                        name,
                        description: raw.description.clone(),
                    },
                );
            }
        }
        other => {
            return Err(SchemaError::UnexpectedKind {
                kind: other.to_string(),
                name,
            })
        }
    }

    Ok(())
}

fn parse_fields(type_name: &str, raw: &[RawField]) -> Result<Vec<FieldDefinition>, SchemaError> {
    raw.iter()
        .map(|field| {
            let context = format!("'{type_name}.{}'", field.name);
            let args = field
                .args
                .iter()
                .map(|arg| {
                    Ok(ArgumentDefinition {
                        name: arg.name.clone(),
                        description: arg.description.clone(),
                        ty: resolve_type_ref(
                            &arg.ty,
                            &format!("argument '{}' of {context}", arg.name),
                        )?,
                        default_value: arg.default_value.clone(),
                    })
                })
                .collect::<Result<Vec<_>, SchemaError>>()?;
            Ok(FieldDefinition {
                name: field.name.clone(),
                description: field.description.clone(),
                ty: resolve_type_ref(&field.ty, &context)?,
                args,
                is_deprecated: field.is_deprecated,
                deprecation_reason: field.deprecation_reason.clone(),
            })
        })
        .collect()
}

fn parse_input_field(
    type_name: &str,
    raw: &RawInputValue,
) -> Result<InputFieldDefinition, SchemaError> {
    Ok(InputFieldDefinition {
        name: raw.name.clone(),
        description: raw.description.clone(),
        ty: resolve_type_ref(&raw.ty, &format!("'{type_name}.{}'", raw.name))?,
        default_value: raw.default_value.clone(),
    })
}

/// Recursively unwraps a `NON_NULL`/`LIST`/named `ofType` chain.
fn resolve_type_ref(raw: &RawTypeRef, context: &str) -> Result<TypeRef, SchemaError> {
    match raw.kind.as_str() {
        "NON_NULL" => {
            let inner = raw
                .of_type
                .as_deref()
                .ok_or_else(|| SchemaError::InvalidTypeReference {
                    context: context.to_string(),
                    detail: "NON_NULL wrapper without 'ofType'".to_string(),
                })?;
            Ok(TypeRef::non_null(resolve_type_ref(inner, context)?))
        }
        "LIST" => {
            let inner = raw
                .of_type
                .as_deref()
                .ok_or_else(|| SchemaError::InvalidTypeReference {
                    context: context.to_string(),
                    detail: "LIST wrapper without 'ofType'".to_string(),
                })?;
            Ok(TypeRef::list(resolve_type_ref(inner, context)?))
        }
        _ => raw
            .name
            .as_ref()
            .map(|name| TypeRef::named(name.clone()))
            .ok_or_else(|| SchemaError::InvalidTypeReference {
                context: context.to_string(),
                detail: format!("named reference of kind '{}' without a name", raw.kind),
            }),
    }
}

/// Fills each interface's implementor set from object declarations.
fn link_interface_implementors(model: &mut SchemaModel) {
    let object_interfaces: Vec<(String, Vec<String>)> = model
        .objects
        .values()
        .map(|obj| (obj.name.clone(), obj.interfaces.clone()))
        .collect();

    for (object_name, interfaces) in object_interfaces {
        for interface_name in interfaces {
            if let Some(interface) = model.interfaces.get_mut(&interface_name) {
                interface.implementors.insert(object_name.clone());
            }
        }
    }
}

fn validate_roots(model: &SchemaModel) -> Result<(), SchemaError> {
    if !model.objects.contains_key(&model.query_root) {
        return Err(SchemaError::UnknownRootType {
            role: "query",
            name: model.query_root.clone(),
        });
    }
    if let Some(name) = &model.mutation_root {
        if !model.objects.contains_key(name) {
            return Err(SchemaError::UnknownRootType {
                role: "mutation",
                name: name.clone(),
            });
        }
    }
    if let Some(name) = &model.subscription_root {
        if !model.objects.contains_key(name) {
            return Err(SchemaError::UnknownRootType {
                role: "subscription",
                name: name.clone(),
            });
        }
    }
    Ok(())
}

/// Checks every field/argument/input-field reference resolves to a parsed
/// type or a built-in scalar.
fn validate_references(model: &SchemaModel) -> Result<(), SchemaError> {
    let check = |ty: &TypeRef, context: String| -> Result<(), SchemaError> {
        let base = ty.base_name();
        if model.contains(base) {
            Ok(())
        } else {
            Err(SchemaError::UnresolvedReference {
                name: base.to_string(),
                context,
            })
        }
    };

    for object in model.objects.values() {
        for field in &object.fields {
            check(&field.ty, format!("'{}.{}'", object.name, field.name))?;
            for arg in &field.args {
                check(
                    &arg.ty,
                    format!("argument '{}' of '{}.{}'", arg.name, object.name, field.name),
                )?;
            }
        }
    }
    for interface in model.interfaces.values() {
        for field in &interface.fields {
            check(&field.ty, format!("'{}.{}'", interface.name, field.name))?;
        }
    }
    for input in model.inputs.values() {
        for field in &input.fields {
            check(&field.ty, format!("'{}.{}'", input.name, field.name))?;
        }
    }
    Ok(())
}

//! Normalized in-memory representation of a GraphQL schema.
//!
//! Built once from an introspection document by [`parse`](crate::schema::parse),
//! immutable afterwards, and safe to share read-only across any number of
//! generator invocations. Category maps use BTree ordering so consumers
//! iterate deterministically.

use crate::schema::TypeRef;
use std::collections::{BTreeMap, BTreeSet};

/// The built-in GraphQL scalars, excluded from the custom-scalar map.
pub const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// Returns `true` if `name` is one of the five built-in scalars.
pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

/// A field on an object or interface type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    /// The field name.
    pub name: String,
    /// Optional description from the schema.
    pub description: Option<String>,
    /// The field's type reference.
    pub ty: TypeRef,
    /// Arguments the field accepts.
    pub args: Vec<ArgumentDefinition>,
    /// Whether the field is deprecated.
    pub is_deprecated: bool,
    /// The deprecation reason, when deprecated.
    pub deprecation_reason: Option<String>,
}

/// An argument on a field.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDefinition {
    /// The argument name.
    pub name: String,
    /// Optional description from the schema.
    pub description: Option<String>,
    /// The argument's type reference.
    pub ty: TypeRef,
    /// The default value as a GraphQL literal string, if declared.
    pub default_value: Option<String>,
}

impl ArgumentDefinition {
    /// An argument is required when it is non-null and has no default.
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }
}

/// A field on an input object type.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFieldDefinition {
    /// The input field name.
    pub name: String,
    /// Optional description from the schema.
    pub description: Option<String>,
    /// The input field's type reference.
    pub ty: TypeRef,
    /// The default value as a GraphQL literal string, if declared.
    pub default_value: Option<String>,
}

impl InputFieldDefinition {
    /// An input field is required when it is non-null and has no default.
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }
}

/// One value of an enum type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDefinition {
    /// The value name.
    pub name: String,
    /// Optional description from the schema.
    pub description: Option<String>,
    /// Whether the value is deprecated.
    pub is_deprecated: bool,
    /// The deprecation reason, when deprecated.
    pub deprecation_reason: Option<String>,
}

/// An object type with its fields and implemented interfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    /// The type name.
    pub name: String,
    /// Optional description from the schema.
    pub description: Option<String>,
    /// The object's fields, in declaration order.
    pub fields: Vec<FieldDefinition>,
    /// Names of interfaces this object implements.
    pub interfaces: Vec<String>,
}

/// An input object type.
#[derive(Debug, Clone, PartialEq)]
pub struct InputObjectType {
    /// The type name.
    pub name: String,
    /// Optional description from the schema.
    pub description: Option<String>,
    /// The input fields, in declaration order.
    pub fields: Vec<InputFieldDefinition>,
}

/// An enum type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    /// The type name.
    pub name: String,
    /// Optional description from the schema.
    pub description: Option<String>,
    /// The enum values, in declaration order.
    pub values: Vec<EnumValueDefinition>,
}

/// An interface type with its fields and known implementors.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceType {
    /// The type name.
    pub name: String,
    /// Optional description from the schema.
    pub description: Option<String>,
    /// The interface's fields, in declaration order.
    pub fields: Vec<FieldDefinition>,
    /// Object types implementing this interface, gathered by
    /// cross-referencing object declarations.
    pub implementors: BTreeSet<String>,
}

/// A union type and its member types.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    /// The type name.
    pub name: String,
    /// Optional description from the schema.
    pub description: Option<String>,
    /// The possible member type names.
    pub members: BTreeSet<String>,
}

/// A custom scalar declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarType {
    /// The type name.
    pub name: String,
    /// Optional description from the schema.
    pub description: Option<String>,
}

/// The normalized result of parsing an introspection document.
///
/// Every type name referenced anywhere in the schema resolves to exactly
/// one category map (or is a built-in scalar); the parser enforces this at
/// construction.
#[derive(Debug, Clone)]
pub struct SchemaModel {
    pub(crate) query_root: String,
    pub(crate) mutation_root: Option<String>,
    pub(crate) subscription_root: Option<String>,
    pub(crate) objects: BTreeMap<String, ObjectType>,
    pub(crate) inputs: BTreeMap<String, InputObjectType>,
    pub(crate) enums: BTreeMap<String, EnumType>,
    pub(crate) interfaces: BTreeMap<String, InterfaceType>,
    pub(crate) unions: BTreeMap<String, UnionType>,
    pub(crate) scalars: BTreeMap<String, ScalarType>,
}

impl SchemaModel {
    /// The query root type.
    pub fn query_type(&self) -> &ObjectType {
        self.objects
            .get(&self.query_root)
            .expect("query root resolves to an object type; enforced at parse time")
    }

    /// The mutation root type, when the schema declares one.
    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.mutation_root.as_ref().and_then(|n| self.objects.get(n))
    }

    /// The subscription root type, when the schema declares one.
    pub fn subscription_type(&self) -> Option<&ObjectType> {
        self.subscription_root
            .as_ref()
            .and_then(|n| self.objects.get(n))
    }

    /// Object types by name.
    pub fn objects(&self) -> &BTreeMap<String, ObjectType> {
        &self.objects
    }

    /// Input object types by name.
    pub fn inputs(&self) -> &BTreeMap<String, InputObjectType> {
        &self.inputs
    }

    /// Enum types by name.
    pub fn enums(&self) -> &BTreeMap<String, EnumType> {
        &self.enums
    }

    /// Interface types by name.
    pub fn interfaces(&self) -> &BTreeMap<String, InterfaceType> {
        &self.interfaces
    }

    /// Union types by name.
    pub fn unions(&self) -> &BTreeMap<String, UnionType> {
        &self.unions
    }

    /// Custom scalar types by name (built-ins excluded).
    pub fn scalars(&self) -> &BTreeMap<String, ScalarType> {
        &self.scalars
    }

    /// Returns `true` if `name` is an object type.
    pub fn is_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Returns `true` if `name` is an input object type.
    pub fn is_input_type(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    /// Returns `true` if `name` is an enum type.
    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    /// Returns `true` if `name` is an interface type.
    pub fn is_interface(&self, name: &str) -> bool {
        self.interfaces.contains_key(name)
    }

    /// Returns `true` if `name` is a union type.
    pub fn is_union(&self, name: &str) -> bool {
        self.unions.contains_key(name)
    }

    /// Returns `true` if `name` is a custom scalar declared by the schema.
    pub fn is_custom_scalar(&self, name: &str) -> bool {
        self.scalars.contains_key(name)
    }

    /// Returns `true` if `name` resolves to any category or is a built-in
    /// scalar.
    pub fn contains(&self, name: &str) -> bool {
        is_builtin_scalar(name)
            || self.is_object(name)
            || self.is_input_type(name)
            || self.is_enum(name)
            || self.is_interface(name)
            || self.is_union(name)
            || self.is_custom_scalar(name)
    }
}

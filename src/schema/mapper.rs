//! Resolution of GraphQL type references into Rust type names.
//!
//! The mapper decides *what a name maps to*; how the generator wraps
//! nullability around it is not its concern, so `NonNull` unwraps
//! transparently. Named types resolve in priority order: scalar mapping
//! table, enum, input type, interface, union, then plain object.

use crate::schema::{SchemaModel, TypeRef};
use std::collections::BTreeMap;

/// Returns a freshly-constructed table of default scalar mappings.
///
/// Covers the built-in scalars and the common extensions. Long,
/// BigInteger, and BigDecimal map to string-typed targets where an `f64`
/// or `i64` would lose precision, matching their wire representation.
pub fn default_scalar_mappings() -> BTreeMap<String, String> {
    [
        ("String", "String"),
        ("Int", "i32"),
        ("Float", "f64"),
        ("Boolean", "bool"),
        ("ID", "String"),
        ("DateTime", "chrono::DateTime<chrono::Utc>"),
        ("Date", "chrono::NaiveDate"),
        ("Time", "chrono::NaiveTime"),
        ("UUID", "uuid::Uuid"),
        ("Long", "i64"),
        ("BigInteger", "String"),
        ("BigDecimal", "String"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Maps type references to Rust type names for one schema.
///
/// # Examples
///
/// ```
/// use graphite_client::schema::{self, TypeMapper, TypeRef};
///
/// let doc = r#"{
///     "__schema": {
///         "queryType": {"name": "Query"},
///         "types": [
///             {"kind": "OBJECT", "name": "Query", "fields": [
///                 {"name": "user", "type": {"kind": "OBJECT", "name": "User"}}
///             ]},
///             {"kind": "OBJECT", "name": "User", "fields": [
///                 {"name": "name", "type": {"kind": "SCALAR", "name": "String"}}
///             ]}
///         ]
///     }
/// }"#;
/// let model = schema::parse(doc).unwrap();
/// let mapper = TypeMapper::new(&model, []);
///
/// assert_eq!(mapper.map_type(&TypeRef::named("User")), "UserDto");
/// assert_eq!(
///     mapper.map_type(&TypeRef::list(TypeRef::named("String"))),
///     "Vec<String>"
/// );
/// ```
pub struct TypeMapper<'a> {
    model: &'a SchemaModel,
    scalar_mappings: BTreeMap<String, String>,
}

impl<'a> TypeMapper<'a> {
    /// Creates a mapper over `model`, merging `overrides` over the default
    /// scalar table. Later entries win, and overrides beat defaults.
    pub fn new(
        model: &'a SchemaModel,
        overrides: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut scalar_mappings = default_scalar_mappings();
        scalar_mappings.extend(overrides);
        Self {
            model,
            scalar_mappings,
        }
    }

    /// The merged scalar mapping table.
    pub fn scalar_mappings(&self) -> &BTreeMap<String, String> {
        &self.scalar_mappings
    }

    /// Resolves a type reference to a Rust type name.
    ///
    /// Nullability wrapping is the generator's decision, so `NonNull`
    /// resolves to its inner mapping; lists resolve to `Vec<_>`.
    pub fn map_type(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::NonNull(inner) => self.map_type(inner),
            TypeRef::List(inner) => format!("Vec<{}>", self.map_type(inner)),
            TypeRef::Named(name) => self.map_named(name),
        }
    }

    fn map_named(&self, name: &str) -> String {
        if let Some(target) = self.scalar_mappings.get(name) {
            return target.clone();
        }
        if self.model.is_enum(name) {
            return format!("enums::{name}");
        }
        if self.model.is_input_type(name) {
            return format!("inputs::{}", input_type_name(name));
        }
        if self.model.is_interface(name) {
            return name.to_string();
        }
        if self.model.is_union(name) {
            return format!("unions::{name}");
        }
        // Anything else is treated as an object type. The suffix keeps
        // generated data holders distinct from interfaces and unions
        // sharing the schema name.
        format!("{name}Dto")
    }
}

/// Appends the `Input` suffix unless the schema name already carries it.
pub fn input_type_name(name: &str) -> String {
    if name.ends_with("Input") {
        name.to_string()
    } else {
        format!("{name}Input")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn model() -> SchemaModel {
        schema::parse(
            r#"{
                "__schema": {
                    "queryType": {"name": "Query"},
                    "types": [
                        {"kind": "OBJECT", "name": "Query", "fields": [
                            {"name": "user", "type": {"kind": "OBJECT", "name": "User"}},
                            {"name": "search", "type": {"kind": "UNION", "name": "SearchResult"}}
                        ]},
                        {"kind": "OBJECT", "name": "User", "fields": [
                            {"name": "name", "type": {"kind": "SCALAR", "name": "String"}},
                            {"name": "state", "type": {"kind": "ENUM", "name": "State"}}
                        ]},
                        {"kind": "ENUM", "name": "State", "enumValues": [{"name": "ACTIVE"}]},
                        {"kind": "INPUT_OBJECT", "name": "UserFilter", "inputFields": [
                            {"name": "name", "type": {"kind": "SCALAR", "name": "String"}}
                        ]},
                        {"kind": "INPUT_OBJECT", "name": "PageInput", "inputFields": [
                            {"name": "size", "type": {"kind": "SCALAR", "name": "Int"}}
                        ]},
                        {"kind": "INTERFACE", "name": "Node", "fields": [
                            {"name": "id", "type": {"kind": "SCALAR", "name": "ID"}}
                        ]},
                        {"kind": "UNION", "name": "SearchResult", "possibleTypes": [
                            {"kind": "OBJECT", "name": "User"}
                        ]},
                        {"kind": "SCALAR", "name": "DateTime"}
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_builtin_scalar_defaults() {
        let model = model();
        let mapper = TypeMapper::new(&model, []);
        assert_eq!(mapper.map_type(&TypeRef::named("String")), "String");
        assert_eq!(mapper.map_type(&TypeRef::named("Int")), "i32");
        assert_eq!(mapper.map_type(&TypeRef::named("Float")), "f64");
        assert_eq!(mapper.map_type(&TypeRef::named("Boolean")), "bool");
        assert_eq!(mapper.map_type(&TypeRef::named("ID")), "String");
        assert_eq!(
            mapper.map_type(&TypeRef::named("DateTime")),
            "chrono::DateTime<chrono::Utc>"
        );
    }

    #[test]
    fn test_custom_override_beats_default() {
        let model = model();
        let mapper = TypeMapper::new(
            &model,
            [("DateTime".to_string(), "CustomInstant".to_string())],
        );
        assert_eq!(mapper.map_type(&TypeRef::named("DateTime")), "CustomInstant");
        // Untouched defaults survive the merge.
        assert_eq!(mapper.map_type(&TypeRef::named("Int")), "i32");
    }

    #[test]
    fn test_category_namespaces() {
        let model = model();
        let mapper = TypeMapper::new(&model, []);
        assert_eq!(mapper.map_type(&TypeRef::named("State")), "enums::State");
        assert_eq!(mapper.map_type(&TypeRef::named("Node")), "Node");
        assert_eq!(
            mapper.map_type(&TypeRef::named("SearchResult")),
            "unions::SearchResult"
        );
        assert_eq!(mapper.map_type(&TypeRef::named("User")), "UserDto");
    }

    #[test]
    fn test_input_suffix_not_doubled() {
        let model = model();
        let mapper = TypeMapper::new(&model, []);
        assert_eq!(
            mapper.map_type(&TypeRef::named("UserFilter")),
            "inputs::UserFilterInput"
        );
        assert_eq!(
            mapper.map_type(&TypeRef::named("PageInput")),
            "inputs::PageInput"
        );
    }

    #[test]
    fn test_non_null_unwraps_and_lists_nest() {
        let model = model();
        let mapper = TypeMapper::new(&model, []);
        let ty = TypeRef::non_null(TypeRef::list(TypeRef::non_null(TypeRef::named("User"))));
        assert_eq!(mapper.map_type(&ty), "Vec<UserDto>");
    }
}

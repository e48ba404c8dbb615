//! Schema model, introspection parsing, and type mapping.
//!
//! This is the build-time half of the crate: feed it a GraphQL
//! introspection document and it produces a normalized [`SchemaModel`];
//! the [`TypeMapper`] then resolves schema type references into Rust type
//! names for code generation. Both steps are single-shot, side-effect-free
//! transformations, and the model is immutable once built.
//!
//! # Examples
//!
//! ```no_run
//! use graphite_client::schema::{self, TypeMapper};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let json = std::fs::read_to_string("introspection.json")?;
//! let model = schema::parse(&json)?;
//! let mapper = TypeMapper::new(&model, []);
//!
//! for field in &model.query_type().fields {
//!     println!("{}: {}", field.name, mapper.map_type(&field.ty));
//! }
//! # Ok(())
//! # }
//! ```

mod mapper;
mod model;
mod parser;
mod type_ref;

pub use mapper::{default_scalar_mappings, input_type_name, TypeMapper};
pub use model::{
    is_builtin_scalar, ArgumentDefinition, EnumType, EnumValueDefinition, FieldDefinition,
    InputFieldDefinition, InputObjectType, InterfaceType, ObjectType, ScalarType, SchemaModel,
    UnionType, BUILTIN_SCALARS,
};
pub use parser::{parse, SchemaError};
pub use type_ref::TypeRef;

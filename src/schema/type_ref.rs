//! Recursive GraphQL type references.

use std::fmt;

/// A GraphQL type usage site: a named type, optionally wrapped in non-null
/// and/or list modifiers.
///
/// The wrapping nests arbitrarily (`[User!]!` is
/// `NonNull(List(NonNull(Named("User"))))`), with one restriction: non-null
/// never directly wraps non-null, since GraphQL has no `T!!`. The
/// [`non_null`](TypeRef::non_null) constructor maintains that invariant.
///
/// # Examples
///
/// ```
/// use graphite_client::schema::TypeRef;
///
/// let ty = TypeRef::non_null(TypeRef::list(TypeRef::non_null(TypeRef::named("User"))));
/// assert_eq!(ty.to_graphql(), "[User!]!");
/// assert_eq!(ty.base_name(), "User");
/// assert!(ty.is_list());
/// assert!(ty.is_non_null());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A reference to a type by name.
    Named(String),
    /// The inner type, required to be non-null.
    NonNull(Box<TypeRef>),
    /// A list of the inner type.
    List(Box<TypeRef>),
}

impl TypeRef {
    /// A named type reference.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// Wraps `inner` as non-null. A no-op when `inner` is already
    /// non-null.
    pub fn non_null(inner: TypeRef) -> Self {
        match inner {
            already @ TypeRef::NonNull(_) => already,
            other => TypeRef::NonNull(Box::new(other)),
        }
    }

    /// Wraps `inner` as a list.
    pub fn list(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    /// The innermost named type, unwrapping all modifiers.
    pub fn base_name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::NonNull(inner) | TypeRef::List(inner) => inner.base_name(),
        }
    }

    /// Returns `true` if any layer of the reference is a list.
    pub fn is_list(&self) -> bool {
        match self {
            TypeRef::Named(_) => false,
            TypeRef::List(_) => true,
            TypeRef::NonNull(inner) => inner.is_list(),
        }
    }

    /// Returns `true` if the outermost usable layer is non-null.
    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// Renders the reference in GraphQL syntax, e.g. `[User!]!`.
    pub fn to_graphql(&self) -> String {
        match self {
            TypeRef::Named(name) => name.clone(),
            TypeRef::NonNull(inner) => format!("{}!", inner.to_graphql()),
            TypeRef::List(inner) => format!("[{}]", inner.to_graphql()),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_graphql())
    }
}

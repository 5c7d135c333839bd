//! The C++ header backend.
//!
//! Generation runs in two steps: [`compile`] lowers a validated schema into
//! the small target AST in this module (hoisting anonymous compound types and
//! inferring the include set along the way), and [`emit`] renders that AST as
//! header text. The result is a pure function of the schema and options.

use std::borrow::Cow;

pub mod compile;
pub mod emit;

pub use self::compile::compile_schema;

use crate::ast::Schema;

/// Options controlling header generation.
///
/// `generate_serialization` and `generate_reflection` are reserved: they are
/// accepted and carried through, but no backend consumes them yet.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Namespace wrapped around all emitted declarations.
    pub namespace_name: String,
    /// Stem used to derive the header guard macro.
    pub output_basename: String,
    /// Reserved.
    pub generate_serialization: bool,
    /// Reserved.
    pub generate_reflection: bool,
    /// Emit `EntityID` as a wrapper struct rather than a bare alias.
    pub use_strong_entity_id: bool,
    /// The underlying integer type for entity identifiers.
    pub entity_id_typedef: String,
    /// Spaces per indentation level.
    pub indentation_size: usize,
}

impl Default for GenerationOptions {
    fn default() -> GenerationOptions {
        GenerationOptions {
            namespace_name: "game".to_owned(),
            output_basename: "generated".to_owned(),
            generate_serialization: false,
            generate_reflection: false,
            use_strong_entity_id: true,
            entity_id_typedef: "uint64_t".to_owned(),
            indentation_size: 4,
        }
    }
}

/// A compiled header.
#[derive(Debug, Clone)]
pub struct Header {
    /// The header guard macro name.
    pub guard: String,
    /// Standard library includes, already deduplicated and ordered.
    pub includes: Vec<&'static str>,
    /// The namespace wrapping all items.
    pub namespace: String,
    /// The entity identifier definition, present when any `ref` occurs.
    pub entity_id: Option<EntityId>,
    /// The items, in declaration order with hoisted helpers first.
    pub items: Vec<Item>,
}

/// The entity identifier definition.
#[derive(Debug, Clone)]
pub struct EntityId {
    pub strong: bool,
    pub underlying: String,
}

/// Compiled items.
#[derive(Debug, Clone)]
pub enum Item {
    Struct(StructType),
    Variant(VariantType),
    Enum(EnumType),
    Alias(TypeAlias),
}

/// Compiled record types.
#[derive(Debug, Clone)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<TypeField>,
}

/// Compiled record fields.
#[derive(Debug, Clone)]
pub struct TypeField {
    pub name: String,
    pub ty: Type,
}

/// Compiled tagged unions, emitted as `std::variant` aliases.
#[derive(Debug, Clone)]
pub struct VariantType {
    pub name: String,
    pub payloads: Vec<Type>,
}

/// Compiled scoped enumerations.
#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

/// Compiled type aliases.
#[derive(Debug, Clone)]
pub struct TypeAlias {
    pub name: String,
    pub ty: Type,
}

/// Compiled types.
#[derive(Debug, Clone, PartialEq)]
pub struct Type(pub Cow<'static, str>);

impl Type {
    pub fn name(name: impl Into<Cow<'static, str>>) -> Type {
        Type(name.into())
    }
}

/// Generate the header text for a validated schema.
pub fn generate_header(schema: &Schema, options: &GenerationOptions) -> String {
    emit::emit_header(&compile_schema(schema, options), options)
}

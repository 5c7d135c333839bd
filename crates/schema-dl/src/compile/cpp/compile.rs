//! Lowering of validated schemas to the C++ target AST.

use codespan::Span;
use std::collections::HashSet;

use crate::ast::{Alternative, ContainerKind, Field, Primitive, Schema, TypeDefinition, TypeExpr};

use super::{
    EntityId, EnumType, GenerationOptions, Header, Item, StructType, Type, TypeAlias, TypeField,
    VariantType,
};

/// Lower a validated schema to a [`Header`].
pub fn compile_schema(schema: &Schema, options: &GenerationOptions) -> Header {
    let mut context = Context {
        items: Vec::new(),
        taken_names: HashSet::new(),
        hoist_counter: 0,
        uses_map: false,
        uses_optional: false,
        uses_variant: false,
        uses_ref: false,
    };

    // Reserve every top-level name up front so hoisted helpers can never
    // shadow a later definition.
    for definition in &schema.definitions {
        context.taken_names.insert(pascal_case(&definition.name.1));
    }

    for definition in &schema.definitions {
        compile_definition(&mut context, definition);
    }

    Header {
        guard: guard_name(&options.output_basename),
        includes: includes(&context),
        namespace: options.namespace_name.clone(),
        entity_id: if context.uses_ref {
            Some(EntityId {
                strong: options.use_strong_entity_id,
                underlying: options.entity_id_typedef.clone(),
            })
        } else {
            None
        },
        items: context.items,
    }
}

struct Context {
    /// Output items; helpers for anonymous types land here before the item
    /// that references them.
    items: Vec<Item>,
    /// Every emitted type name, used to keep hoisted helper names unique.
    taken_names: HashSet<String>,
    hoist_counter: usize,
    uses_map: bool,
    uses_optional: bool,
    uses_variant: bool,
    uses_ref: bool,
}

fn compile_definition(context: &mut Context, definition: &TypeDefinition) {
    let name = pascal_case(&definition.name.1);

    match &definition.body {
        TypeExpr::Struct(_, fields) => {
            let item = compile_struct(context, &name, fields);
            context.items.push(Item::Struct(item));
        }
        TypeExpr::Variant(_, alternatives) => {
            let item = compile_variant(context, &name, alternatives);
            context.items.push(Item::Variant(item));
        }
        TypeExpr::Enum(_, values) => {
            let item = compile_enum(&name, values);
            context.items.push(Item::Enum(item));
        }
        body => {
            let ty = compile_type(context, body, &name);
            context.items.push(Item::Alias(TypeAlias { name, ty }));
        }
    }
}

fn compile_struct(context: &mut Context, name: &str, fields: &[Field]) -> StructType {
    StructType {
        name: name.to_owned(),
        fields: fields
            .iter()
            .map(|field| TypeField {
                name: field.name.1.clone(),
                ty: compile_type(
                    context,
                    &field.ty,
                    &format!("{}_{}", name, field.name.1),
                ),
            })
            .collect(),
    }
}

fn compile_variant(context: &mut Context, name: &str, alternatives: &[Alternative]) -> VariantType {
    context.uses_variant = true;

    VariantType {
        name: name.to_owned(),
        payloads: alternatives
            .iter()
            .map(|alternative| match &alternative.ty {
                // Bare alternatives and explicit `unit` payloads carry no
                // data.
                None | Some(TypeExpr::Primitive(_, Primitive::Unit)) => {
                    Type::name("std::monostate")
                }
                Some(ty) => compile_type(
                    context,
                    ty,
                    &format!("{}_{}", name, alternative.name.1),
                ),
            })
            .collect(),
    }
}

fn compile_enum(name: &str, values: &[(Span, String)]) -> EnumType {
    EnumType {
        name: name.to_owned(),
        values: values.iter().map(|(_, value)| value.clone()).collect(),
    }
}

/// Map a type expression to C++ type text. Anonymous compound types are
/// hoisted into `context.items` under a name derived from `breadcrumb` and
/// referenced by that name.
fn compile_type(context: &mut Context, expr: &TypeExpr, breadcrumb: &str) -> Type {
    match expr {
        TypeExpr::Primitive(_, primitive) => compile_primitive(context, *primitive),
        TypeExpr::Container(_, kind) => match kind {
            ContainerKind::Array(element) => {
                let element = compile_type(context, element, breadcrumb);
                Type(format!("std::vector<{}>", element.0).into())
            }
            ContainerKind::Optional(element) => {
                context.uses_optional = true;
                let element = compile_type(context, element, breadcrumb);
                Type(format!("std::optional<{}>", element.0).into())
            }
            ContainerKind::Map(key, value) => {
                context.uses_map = true;
                let key = compile_type(context, key, &format!("{}_key", breadcrumb));
                let value = compile_type(context, value, &format!("{}_value", breadcrumb));
                Type(format!("std::unordered_map<{}, {}>", key.0, value.0).into())
            }
        },
        TypeExpr::Ref(_) => {
            context.uses_ref = true;
            Type::name("EntityID")
        }
        TypeExpr::Name(_, name) => Type(pascal_case(name).into()),
        TypeExpr::Struct(_, fields) => {
            let helper = unique_name(context, breadcrumb);
            let item = compile_struct(context, &helper, fields);
            context.items.push(Item::Struct(item));
            Type(helper.into())
        }
        TypeExpr::Variant(_, alternatives) => {
            let helper = unique_name(context, breadcrumb);
            let item = compile_variant(context, &helper, alternatives);
            context.items.push(Item::Variant(item));
            Type(helper.into())
        }
        TypeExpr::Enum(_, values) => {
            let helper = unique_name(context, breadcrumb);
            let item = compile_enum(&helper, values);
            context.items.push(Item::Enum(item));
            Type(helper.into())
        }
    }
}

fn compile_primitive(context: &mut Context, primitive: Primitive) -> Type {
    match primitive {
        Primitive::Str => Type::name("std::string"),
        Primitive::Int => Type::name("int32_t"),
        Primitive::Bool => Type::name("bool"),
        Primitive::Unit => {
            // `std::monostate` lives in <variant>.
            context.uses_variant = true;
            Type::name("std::monostate")
        }
        Primitive::U8 => Type::name("uint8_t"),
        Primitive::U16 => Type::name("uint16_t"),
        Primitive::U32 => Type::name("uint32_t"),
        Primitive::U64 => Type::name("uint64_t"),
        Primitive::I8 => Type::name("int8_t"),
        Primitive::I16 => Type::name("int16_t"),
        Primitive::I32 => Type::name("int32_t"),
        Primitive::I64 => Type::name("int64_t"),
        Primitive::F32 => Type::name("float"),
        Primitive::F64 => Type::name("double"),
    }
}

/// Claim a unique item name based on `candidate`, suffixing a counter on
/// collision.
fn unique_name(context: &mut Context, candidate: &str) -> String {
    if context.taken_names.insert(candidate.to_owned()) {
        return candidate.to_owned();
    }

    loop {
        context.hoist_counter += 1;
        let name = format!("{}_{}", candidate, context.hoist_counter);
        if context.taken_names.insert(name.clone()) {
            return name;
        }
    }
}

fn includes(context: &Context) -> Vec<&'static str> {
    let mut includes = vec!["cstdint", "string", "vector"];
    if context.uses_map {
        includes.push("unordered_map");
    }
    if context.uses_optional {
        includes.push("optional");
    }
    if context.uses_variant {
        includes.push("variant");
    }
    includes
}

/// Convert a schema identifier to PascalCase: underscores separate words and
/// are dropped, including leading ones.
pub fn pascal_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut at_word_start = true;

    for ch in name.chars() {
        if ch == '_' {
            at_word_start = true;
        } else if at_word_start {
            result.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            result.push(ch);
        }
    }

    result
}

/// Derive the header guard macro name from the output basename.
fn guard_name(basename: &str) -> String {
    let mut guard: String = basename
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    guard.push_str("_H");
    guard
}

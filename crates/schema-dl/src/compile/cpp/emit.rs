//! Rendering of the C++ target AST to header text.

use pretty::{DocAllocator, DocBuilder};

use super::{
    EntityId, EnumType, GenerationOptions, Header, Item, StructType, TypeAlias, VariantType,
};

/// Render a compiled header as text. Output is deterministic: the same
/// header and options always produce byte-identical text.
pub fn emit_header(header: &Header, options: &GenerationOptions) -> String {
    let arena = pretty::Arena::new();
    let pretty::DocBuilder(_, doc) = pretty_header(&arena, header, options.indentation_size);
    format!("{}", doc.pretty(100))
}

fn pretty_header<'a, D>(alloc: &'a D, header: &'a Header, indent: usize) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    let includes = alloc.intersperse(
        (header.includes.iter()).map(|include| alloc.text(format!("#include <{}>", include))),
        alloc.hardline(),
    );

    let mut blocks: Vec<DocBuilder<'a, D>> = Vec::new();
    if let Some(entity_id) = &header.entity_id {
        blocks.push(pretty_entity_id(alloc, entity_id, indent));
    }
    blocks.extend(header.items.iter().map(|item| pretty_item(alloc, item, indent)));

    let body = if blocks.is_empty() {
        alloc.nil()
    } else {
        (alloc.nil())
            .append(alloc.intersperse(blocks, alloc.hardline().append(alloc.hardline())))
            .append(alloc.hardline())
            .append(alloc.hardline())
    };

    (alloc.nil())
        .append("#pragma once")
        .append(alloc.hardline())
        .append(format!("#ifndef {}", header.guard))
        .append(alloc.hardline())
        .append(format!("#define {}", header.guard))
        .append(alloc.hardline())
        .append(alloc.hardline())
        .append(includes)
        .append(alloc.hardline())
        .append(alloc.hardline())
        .append(format!("namespace {} {{", header.namespace))
        .append(alloc.hardline())
        .append(alloc.hardline())
        .append(body)
        .append(format!("}} // namespace {}", header.namespace))
        .append(alloc.hardline())
        .append(alloc.hardline())
        .append(format!("#endif // {}", header.guard))
        .append(alloc.hardline())
}

fn pretty_item<'a, D>(alloc: &'a D, item: &'a Item, indent: usize) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    match item {
        Item::Struct(struct_ty) => pretty_struct(alloc, struct_ty, indent),
        Item::Variant(variant_ty) => pretty_variant(alloc, variant_ty),
        Item::Enum(enum_ty) => pretty_enum(alloc, enum_ty, indent),
        Item::Alias(alias) => pretty_alias(alloc, alias),
    }
}

fn pretty_entity_id<'a, D>(alloc: &'a D, entity_id: &'a EntityId, indent: usize) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    if entity_id.strong {
        (alloc.nil())
            .append("struct EntityID {")
            .append(
                (alloc.nil())
                    .append(alloc.hardline())
                    .append(format!("{} value;", entity_id.underlying))
                    .nest(indent as isize),
            )
            .append(alloc.hardline())
            .append("};")
    } else {
        alloc.text(format!("using EntityID = {};", entity_id.underlying))
    }
}

fn pretty_struct<'a, D>(alloc: &'a D, struct_ty: &'a StructType, indent: usize) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    (alloc.nil())
        .append(format!("struct {} {{", struct_ty.name))
        .append(alloc.concat(struct_ty.fields.iter().map(|field| {
            (alloc.nil())
                .append(alloc.hardline())
                .append(format!("{} {};", field.ty.0, field.name))
                .nest(indent as isize)
        })))
        .append(alloc.hardline())
        .append("};")
}

fn pretty_variant<'a, D>(alloc: &'a D, variant_ty: &'a VariantType) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    (alloc.nil())
        .append(format!("using {} = std::variant<", variant_ty.name))
        .append(alloc.intersperse(
            (variant_ty.payloads.iter()).map(|payload| alloc.text(payload.0.clone())),
            alloc.text(", "),
        ))
        .append(">;")
}

fn pretty_enum<'a, D>(alloc: &'a D, enum_ty: &'a EnumType, indent: usize) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    (alloc.nil())
        .append(format!("enum class {} {{", enum_ty.name))
        .append(alloc.intersperse(
            (enum_ty.values.iter()).map(|value| {
                (alloc.nil())
                    .append(alloc.hardline())
                    .append(alloc.text(value.as_str()))
                    .nest(indent as isize)
            }),
            alloc.text(","),
        ))
        .append(alloc.hardline())
        .append("};")
}

fn pretty_alias<'a, D>(alloc: &'a D, alias: &'a TypeAlias) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    alloc.text(format!("using {} = {};", alias.name, alias.ty.0))
}

//! Diagnostics.
//!
//! Every stage reports through constructor functions in this module and never
//! panics on malformed input. Diagnostics accumulate in whatever sink the
//! caller provides; the CLI renders them with `codespan_reporting::term`,
//! while [`format_short`] produces the compact `Line L, Column C: msg` form.

use codespan::{FileId, Files, Span};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::fmt;

use crate::lexer::Token;

// Lexical errors

pub fn unexpected_character(file_id: FileId, span: Span, found: char) -> Diagnostic {
    Diagnostic::new_error(
        format!("Unexpected character: '{}'", found),
        Label::new(file_id, span, "unexpected character"),
    )
}

pub fn unterminated_string(file_id: FileId, span: Span) -> Diagnostic {
    Diagnostic::new_error(
        "Unterminated string literal",
        Label::new(file_id, span, "string literal is never closed"),
    )
}

pub fn invalid_hex_escape(file_id: FileId, span: Span) -> Diagnostic {
    Diagnostic::new_error(
        "Invalid hex escape sequence",
        Label::new(file_id, span, "invalid hex escape"),
    )
    .with_notes(vec![
        "expected exactly two hexadecimal digits after `\\x`".to_owned()
    ])
}

pub fn unterminated_block_comment(file_id: FileId, span: Span) -> Diagnostic {
    Diagnostic::new_error(
        "Unterminated block comment",
        Label::new(file_id, span, "comment is never closed"),
    )
    .with_notes(vec!["expected a closing `*/`".to_owned()])
}

// Syntax errors

pub fn expected(file_id: FileId, span: Span, description: impl fmt::Display) -> Diagnostic {
    Diagnostic::new_error(
        format!("Expected {}", description),
        Label::new(file_id, span, format!("expected {}", description)),
    )
}

pub fn expected_type_expression(file_id: FileId, span: Span, found: Option<&Token>) -> Diagnostic {
    let expected = &[
        "`struct`",
        "`variant`",
        "`enum`",
        "`array`",
        "`map`",
        "`optional`",
        "`ref`",
        "a primitive type",
        "a type name",
    ];

    Diagnostic::new_error(
        "Expected type expression",
        Label::new(file_id, span, "expected a type expression here"),
    )
    .with_notes(vec![match found {
        Some(token) => format!(
            "found \"{}\", expected one of {}",
            token,
            format_expected(expected),
        ),
        None => format!(
            "found the end of the file, expected one of {}",
            format_expected(expected),
        ),
    }])
}

// Semantic errors

pub fn duplicate_type_definition(
    file_id: FileId,
    name: &str,
    found: Span,
    original: Span,
) -> Diagnostic {
    Diagnostic::new_error(
        format!("Duplicate type definition: '{}'", name),
        Label::new(file_id, found, "redefined here"),
    )
    .with_secondary_labels(vec![Label::new(
        file_id,
        original,
        "previous definition here",
    )])
}

pub fn empty_struct(file_id: FileId, span: Span, context: &str) -> Diagnostic {
    Diagnostic::new_error(
        format!("Struct must have at least one field in type '{}'", context),
        Label::new(file_id, span, "empty struct"),
    )
}

pub fn empty_variant(file_id: FileId, span: Span, context: &str) -> Diagnostic {
    Diagnostic::new_error(
        format!(
            "Variant must have at least one alternative in type '{}'",
            context,
        ),
        Label::new(file_id, span, "empty variant"),
    )
}

pub fn empty_enum(file_id: FileId, span: Span, context: &str) -> Diagnostic {
    Diagnostic::new_error(
        format!("Enum must have at least one value in type '{}'", context),
        Label::new(file_id, span, "empty enum"),
    )
}

pub fn duplicate_field_name(
    file_id: FileId,
    name: &str,
    context: &str,
    found: Span,
    original: Span,
) -> Diagnostic {
    Diagnostic::new_error(
        format!(
            "Duplicate field name '{}' in struct in type '{}'",
            name, context,
        ),
        Label::new(file_id, found, "field already declared"),
    )
    .with_secondary_labels(vec![Label::new(
        file_id,
        original,
        "previous field declaration here",
    )])
}

pub fn duplicate_alternative_name(
    file_id: FileId,
    name: &str,
    context: &str,
    found: Span,
    original: Span,
) -> Diagnostic {
    Diagnostic::new_error(
        format!(
            "Duplicate alternative name '{}' in variant in type '{}'",
            name, context,
        ),
        Label::new(file_id, found, "alternative already declared"),
    )
    .with_secondary_labels(vec![Label::new(
        file_id,
        original,
        "previous alternative declaration here",
    )])
}

pub fn duplicate_enum_value(
    file_id: FileId,
    name: &str,
    context: &str,
    found: Span,
    original: Span,
) -> Diagnostic {
    Diagnostic::new_error(
        format!("Duplicate enum value '{}' in type '{}'", name, context),
        Label::new(file_id, found, "value already declared"),
    )
    .with_secondary_labels(vec![Label::new(
        file_id,
        original,
        "previous value declaration here",
    )])
}

pub fn nested_optional(file_id: FileId, span: Span, context: &str) -> Diagnostic {
    Diagnostic::new_error(
        format!(
            "Nested optional types (optional<optional<T>>) are not allowed in '{}'",
            context,
        ),
        Label::new(file_id, span, "nested optional"),
    )
}

pub fn undefined_type(file_id: FileId, span: Span, name: &str, context: &str) -> Diagnostic {
    Diagnostic::new_error(
        format!("Undefined type '{}' referenced in '{}'", name, context),
        Label::new(file_id, span, "not defined in this schema"),
    )
}

pub fn forward_reference(file_id: FileId, span: Span, name: &str, context: &str) -> Diagnostic {
    Diagnostic::new_error(
        format!(
            "Forward reference to type '{}' (defined later) in '{}'",
            name, context,
        ),
        Label::new(file_id, span, "referenced before its definition"),
    )
    .with_notes(vec![format!(
        "move the definition of '{}' above this reference, or use ref<entity>",
        name,
    )])
}

pub fn circular_dependency(file_id: FileId, span: Span, name: &str) -> Diagnostic {
    Diagnostic::new_error(
        format!("Circular type dependency detected for: '{}'", name),
        Label::new(file_id, span, "part of a dependency cycle"),
    )
    .with_notes(vec![
        "break the cycle with ref<entity> at one of the references".to_owned(),
    ])
}

pub fn non_terminating_path(file_id: FileId, span: Span, context: &str) -> Diagnostic {
    Diagnostic::new_error(
        format!(
            "Type path in '{}' does not terminate at a primitive or ref type",
            context,
        ),
        Label::new(file_id, span, "path never reaches a leaf type"),
    )
}

/// Render a diagnostic in the compact `Line L, Column C: msg` form, with the
/// position taken from the start of the primary label.
pub fn format_short(files: &Files, diagnostic: &Diagnostic) -> String {
    let label = &diagnostic.primary_label;
    match files.location(label.file_id, label.span.start()) {
        Ok(location) => format!(
            "Line {}, Column {}: {}",
            location.line.number(),
            location.column.number(),
            diagnostic.message,
        ),
        Err(_) => diagnostic.message.clone(),
    }
}

fn format_expected<'a>(items: &'a [impl fmt::Display]) -> impl 'a + fmt::Display {
    use itertools::Itertools;

    struct DisplayExpected<'a, Item>(&'a [Item]);

    impl<'a, Item: fmt::Display> fmt::Display for DisplayExpected<'a, Item> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.0.split_last().map_or(Ok(()), |items| match items {
                (last, []) => write!(f, "{}", last),
                (last, items) => write!(f, "{}, or {}", items.iter().format(", "), last),
            })
        }
    }

    DisplayExpected(items)
}

use codespan::Files;
use codespan_reporting::diagnostic::Diagnostic;

use schema_dl::lexer::Lexer;
use schema_dl::{check, diagnostics, parse};

fn validate(source: &str) -> (bool, Vec<String>) {
    let mut files = Files::new();
    let file_id = files.add("test", source.to_owned());

    let mut parse_diagnostics = Vec::new();
    let lexer = Lexer::new(&files, file_id);
    let schema = parse::parse_schema(file_id, lexer, &mut |diagnostic| {
        parse_diagnostics.push(diagnostic)
    });
    let parse_messages: Vec<_> = parse_diagnostics.iter().map(|d| &d.message).collect();
    assert!(
        parse_messages.is_empty(),
        "unexpected parse diagnostics: {:?}",
        parse_messages,
    );

    let mut messages = Vec::new();
    let valid = check::validate_schema(file_id, &schema, &mut |diagnostic| {
        messages.push(diagnostic.message.clone())
    });

    (valid, messages)
}

fn assert_valid(source: &str) {
    let (valid, messages) = validate(source);
    assert!(valid, "unexpected semantic diagnostics: {:?}", messages);
}

fn assert_invalid(source: &str, expected_fragment: &str) {
    let (valid, messages) = validate(source);
    assert!(!valid, "expected semantic diagnostics for {:?}", source);
    assert!(
        messages.iter().any(|message| message.contains(expected_fragment)),
        "no message containing {:?} in {:?}",
        expected_fragment,
        messages,
    );
}

#[test]
fn accepts_simple_definitions() {
    assert_valid("Position : struct { x: f32, y: f32, z: f32 }");
    assert_valid("Team : enum { red, blue, green }");
    assert_valid(
        "Container : struct { items: array<u32>, lookup: map<str, u32>, maybe: optional<str> }",
    );
    assert_valid("State : variant { idle, running: struct { speed: f32 } }");
}

#[test]
fn accepts_an_empty_schema() {
    assert_valid("");
}

#[test]
fn rejects_duplicate_type_definitions() {
    assert_invalid(
        "Point : struct { x: u32 }\nPoint : struct { y: u32 }",
        "Duplicate type definition: 'Point'",
    );
}

#[test]
fn rejects_duplicate_field_names() {
    assert_invalid(
        "Point : struct { x: u32, x: u32 }",
        "Duplicate field name 'x' in struct in type 'Point'",
    );
}

#[test]
fn rejects_duplicate_alternative_names() {
    assert_invalid(
        "Color : variant { red: unit, red: unit }",
        "Duplicate alternative name 'red' in variant in type 'Color'",
    );
}

#[test]
fn rejects_duplicate_enum_values() {
    assert_invalid(
        "Status : enum { active, active }",
        "Duplicate enum value 'active' in type 'Status'",
    );
}

#[test]
fn rejects_empty_compound_types() {
    assert_invalid("Empty : struct { }", "Struct must have at least one field");
    assert_invalid(
        "Empty : variant { }",
        "Variant must have at least one alternative",
    );
    assert_invalid("Empty : enum { }", "Enum must have at least one value");
}

#[test]
fn rejects_undefined_type_references() {
    assert_invalid(
        "Player : struct { pos: UndefinedType }",
        "Undefined type 'UndefinedType' referenced in 'Player.pos'",
    );
}

#[test]
fn rejects_forward_references() {
    assert_invalid(
        "First : struct { second: Second }\nSecond : struct { value: u32 }",
        "Forward reference to type 'Second' (defined later) in 'First.second'",
    );

    // Swapping the definitions makes the schema well formed.
    assert_valid("Second : struct { value: u32 }\nFirst : struct { second: Second }");
}

#[test]
fn rejects_direct_self_reference() {
    assert_invalid(
        "Node : struct { child: Node }",
        "Circular type dependency detected for: 'Node'",
    );

    // Breaking the cycle with an entity ref is the supported idiom.
    assert_valid("Node : struct { child: ref<entity> }");
}

#[test]
fn rejects_mutual_cycles() {
    let (valid, messages) = validate("A : struct { b: B }\nB : struct { a: A }");
    assert!(!valid);
    assert!(messages
        .iter()
        .any(|m| m.contains("Circular type dependency detected for: 'A'")));
    assert!(messages
        .iter()
        .any(|m| m.contains("Circular type dependency detected for: 'B'")));
}

#[test]
fn rejects_three_way_cycles() {
    assert_invalid(
        "A : struct { b: B }\nB : struct { c: C }\nC : struct { a: A }",
        "Circular type dependency detected",
    );
}

#[test]
fn refs_break_cycles() {
    assert_valid(
        "Node : struct { next: ref<entity> }\n\
         A : struct { b: ref<entity> }\n\
         B : struct { a: ref<entity> }",
    );
}

#[test]
fn rejects_nested_optionals() {
    assert_invalid(
        "Bad : struct { field: optional<optional<u32>> }",
        "Nested optional types (optional<optional<T>>) are not allowed in 'Bad.field'",
    );

    // Nesting through another container level is fine.
    assert_valid("Fine : struct { field: optional<array<optional<u32>>> }");
    assert_valid("Fine : struct { a: array<optional<u32>>, b: optional<array<u32>> }");
}

#[test]
fn rejects_nested_optionals_inside_containers() {
    assert_invalid(
        "Bad : struct { field: array<optional<optional<str>>> }",
        "Nested optional types",
    );
}

#[test]
fn map_contexts_appear_in_messages() {
    assert_invalid(
        "M : struct { lookup: map<str, Missing> }",
        "Undefined type 'Missing' referenced in 'M.lookup (map value)'",
    );
    assert_invalid(
        "M : struct { lookup: map<Missing, u32> }",
        "Undefined type 'Missing' referenced in 'M.lookup (map key)'",
    );
}

#[test]
fn multiple_errors_accumulate() {
    let (valid, messages) = validate(
        "Point : struct { x: u32, x: u32 }\n\
         Player : struct { pos: UndefinedType }\n\
         Empty : enum { }",
    );

    assert!(!valid);
    assert!(messages.len() >= 3);
}

#[test]
fn duplicate_definitions_stop_later_phases() {
    // With an ambiguous symbol table the analyzer reports the duplicates and
    // nothing else.
    let (valid, messages) = validate(
        "Point : struct { x: u32 }\n\
         Point : struct { y: UndefinedType }",
    );

    assert!(!valid);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Duplicate type definition"));
}

#[test]
fn short_format_prefixes_line_and_column() {
    let mut files = Files::new();
    let file_id = files.add("test", "Point : struct { }\n".to_owned());

    let mut parse_diagnostics = Vec::new();
    let lexer = Lexer::new(&files, file_id);
    let schema = parse::parse_schema(file_id, lexer, &mut |diagnostic| {
        parse_diagnostics.push(diagnostic)
    });
    assert!(parse_diagnostics.is_empty());

    let mut collected: Vec<Diagnostic> = Vec::new();
    let valid = check::validate_schema(file_id, &schema, &mut |diagnostic| {
        collected.push(diagnostic)
    });
    assert!(!valid);

    assert_eq!(
        diagnostics::format_short(&files, &collected[0]),
        "Line 1, Column 9: Struct must have at least one field in type 'Point'",
    );
}

use codespan::Files;
use pretty_assertions::assert_eq;

use schema_dl::compile::cpp::{self, GenerationOptions};
use schema_dl::lexer::Lexer;
use schema_dl::{check, parse};

fn compile_with(source: &str, options: &GenerationOptions) -> String {
    let mut files = Files::new();
    let file_id = files.add("test", source.to_owned());

    let mut diagnostics = Vec::new();
    let lexer = Lexer::new(&files, file_id);
    let schema = parse::parse_schema(file_id, lexer, &mut |diagnostic| {
        diagnostics.push(diagnostic)
    });
    let messages: Vec<_> = diagnostics.iter().map(|d| &d.message).collect();
    assert!(messages.is_empty(), "unexpected parse diagnostics: {:?}", messages);

    let mut messages = Vec::new();
    let valid = check::validate_schema(file_id, &schema, &mut |diagnostic| {
        messages.push(diagnostic.message)
    });
    assert!(valid, "unexpected semantic diagnostics: {:?}", messages);

    cpp::generate_header(&schema, options)
}

fn compile(source: &str) -> String {
    compile_with(source, &GenerationOptions::default())
}

#[test]
fn struct_generation() {
    let header = compile("Position : struct { x: f32, y: f32, z: f32 }");

    assert!(header.contains("struct Position {"));
    assert!(header.contains("float x;"));
    assert!(header.contains("float y;"));
    assert!(header.contains("float z;"));
    assert!(header.contains("namespace game {"));
}

#[test]
fn enum_generation() {
    let header = compile("Team : enum { red, blue, green }");

    // Values keep their order and spelling.
    assert!(header.contains("enum class Team {\n    red,\n    blue,\n    green\n};"));
}

#[test]
fn variant_generation() {
    let header = compile("State : variant { idle, running: struct { speed: f32 } }");

    assert!(header.contains("struct State_running {"));
    assert!(header.contains("float speed;"));
    assert!(header.contains("using State = std::variant<std::monostate, State_running>;"));

    // Hoisted helpers are declared before their first use.
    let helper = header.find("struct State_running").unwrap();
    let alias = header.find("using State =").unwrap();
    assert!(helper < alias);
}

#[test]
fn primitive_type_mapping() {
    let header = compile(
        "AllTypes : struct {\n\
             s: str,\n\
             i: int,\n\
             u: u32,\n\
             f: f32,\n\
             b: bool\n\
         }",
    );

    assert!(header.contains("std::string s;"));
    assert!(header.contains("int32_t i;"));
    assert!(header.contains("uint32_t u;"));
    assert!(header.contains("float f;"));
    assert!(header.contains("bool b;"));
}

#[test]
fn sized_integer_mapping() {
    let header = compile(
        "Sized : struct { a: u8, b: u16, c: u64, d: i8, e: i16, f: i32, g: i64, h: f64 }",
    );

    assert!(header.contains("uint8_t a;"));
    assert!(header.contains("uint16_t b;"));
    assert!(header.contains("uint64_t c;"));
    assert!(header.contains("int8_t d;"));
    assert!(header.contains("int16_t e;"));
    assert!(header.contains("int32_t f;"));
    assert!(header.contains("int64_t g;"));
    assert!(header.contains("double h;"));
}

#[test]
fn container_generation() {
    let header = compile(
        "Container : struct {\n\
             items: array<u32>,\n\
             lookup: map<str, u32>,\n\
             maybe: optional<str>\n\
         }",
    );

    assert!(header.contains("std::vector<uint32_t> items;"));
    assert!(header.contains("std::unordered_map<std::string, uint32_t> lookup;"));
    assert!(header.contains("std::optional<std::string> maybe;"));
}

#[test]
fn nested_container_generation() {
    let header = compile("Deep : struct { grid: map<str, array<optional<u32>>> }");

    assert!(header
        .contains("std::unordered_map<std::string, std::vector<std::optional<uint32_t>>> grid;"));
}

#[test]
fn base_includes_are_always_present() {
    let header = compile("Simple : struct { value: u32 }");

    assert!(header.contains("#include <cstdint>"));
    assert!(header.contains("#include <string>"));
    assert!(header.contains("#include <vector>"));
    assert!(!header.contains("#include <unordered_map>"));
    assert!(!header.contains("#include <optional>"));
    assert!(!header.contains("#include <variant>"));
}

#[test]
fn conditional_includes_follow_usage() {
    let header = compile("C : struct { lookup: map<str, u32>, maybe: optional<str> }");
    assert!(header.contains("#include <unordered_map>"));
    assert!(header.contains("#include <optional>"));
    assert!(!header.contains("#include <variant>"));

    let header = compile("State : variant { idle, busy }");
    assert!(header.contains("#include <variant>"));

    // `unit` fields need std::monostate too.
    let header = compile("U : struct { tag: unit }");
    assert!(header.contains("#include <variant>"));
    assert!(header.contains("std::monostate tag;"));
}

#[test]
fn header_guard() {
    let header = compile("Test : struct { a: u32 }");

    assert!(header.starts_with("#pragma once\n"));
    assert!(header.contains("#ifndef GENERATED_H"));
    assert!(header.contains("#define GENERATED_H"));
    assert!(header.ends_with("#endif // GENERATED_H\n"));
}

#[test]
fn header_guard_from_basename() {
    let options = GenerationOptions {
        output_basename: "player_data".to_owned(),
        ..GenerationOptions::default()
    };
    let header = compile_with("Test : struct { a: u32 }", &options);
    assert!(header.contains("#ifndef PLAYER_DATA_H"));

    let options = GenerationOptions {
        output_basename: "my-schema.v2".to_owned(),
        ..GenerationOptions::default()
    };
    let header = compile_with("Test : struct { a: u32 }", &options);
    assert!(header.contains("#ifndef MY_SCHEMA_V2_H"));
}

#[test]
fn namespace_wrapping() {
    let options = GenerationOptions {
        namespace_name: "mygame".to_owned(),
        ..GenerationOptions::default()
    };
    let header = compile_with("Test : struct { a: u32 }", &options);

    assert!(header.contains("namespace mygame {"));
    assert!(header.contains("} // namespace mygame"));
}

#[test]
fn pascal_case_type_names() {
    let header = compile("player_health : struct { current: u32, max_value: u32 }");

    // The type name is mangled; field names are emitted verbatim.
    assert!(header.contains("struct PlayerHealth {"));
    assert!(header.contains("uint32_t current;"));
    assert!(header.contains("uint32_t max_value;"));
}

#[test]
fn pascal_case_edge_cases() {
    let header = compile(
        "_private : struct { _field: u32 }\n\
         player_health_2 : struct { value: u32 }\n\
         multiple___underscores : struct { value: u32 }\n\
         a_b_c_d_e : struct { value: u32 }",
    );

    assert!(header.contains("struct Private {"));
    assert!(header.contains("uint32_t _field;"));
    assert!(header.contains("struct PlayerHealth2 {"));
    assert!(header.contains("struct MultipleUnderscores {"));
    assert!(header.contains("struct ABCDE {"));
}

#[test]
fn named_references_use_mangled_names() {
    let header = compile(
        "point : struct { x: f32 }\n\
         line : struct { start: point, finish: point }",
    );

    assert!(header.contains("struct Point {"));
    assert!(header.contains("Point start;"));
    assert!(header.contains("Point finish;"));
}

#[test]
fn declaration_order_is_preserved() {
    let header = compile(
        "Alpha : struct { x: u32 }\n\
         Beta : struct { a: Alpha }\n\
         Gamma : enum { one, two }",
    );

    let alpha = header.find("struct Alpha").unwrap();
    let beta = header.find("struct Beta").unwrap();
    let gamma = header.find("enum class Gamma").unwrap();
    assert!(alpha < beta);
    assert!(beta < gamma);
}

#[test]
fn strong_entity_id() {
    let header = compile("Node : struct { next: ref<entity> }");

    assert!(header.contains("struct EntityID {"));
    assert!(header.contains("uint64_t value;"));
    assert!(header.contains("EntityID next;"));

    // The definition precedes every item that mentions it.
    let definition = header.find("struct EntityID").unwrap();
    let usage = header.find("EntityID next;").unwrap();
    assert!(definition < usage);
}

#[test]
fn entity_id_alias() {
    let options = GenerationOptions {
        use_strong_entity_id: false,
        ..GenerationOptions::default()
    };
    let header = compile_with("Node : struct { next: ref<entity> }", &options);

    assert!(header.contains("using EntityID = uint64_t;"));
    assert!(header.contains("EntityID next;"));
}

#[test]
fn entity_id_typedef_option() {
    let options = GenerationOptions {
        entity_id_typedef: "uint32_t".to_owned(),
        ..GenerationOptions::default()
    };
    let header = compile_with("Node : struct { next: ref<entity> }", &options);

    assert!(header.contains("uint32_t value;"));
}

#[test]
fn no_entity_id_without_refs() {
    let header = compile("Simple : struct { value: u32 }");
    assert!(!header.contains("EntityID"));
}

#[test]
fn refs_inside_containers() {
    let header = compile("Container : struct { refs: array<ref<entity>>, maybe: optional<ref<entity>> }");

    assert!(header.contains("std::vector<EntityID> refs;"));
    assert!(header.contains("std::optional<EntityID> maybe;"));
}

#[test]
fn top_level_aliases() {
    let header = compile("Ids : array<u64>\nSpeed : f32\nHandle : ref<entity>");

    assert!(header.contains("using Ids = std::vector<uint64_t>;"));
    assert!(header.contains("using Speed = float;"));
    assert!(header.contains("using Handle = EntityID;"));
}

#[test]
fn deep_anonymous_hoisting() {
    let header = compile(
        "Root : struct {\n\
             nested: struct {\n\
                 deep: struct {\n\
                     deeper: struct {\n\
                         deepest: variant {\n\
                             a: struct { x: u32 },\n\
                             b: enum { val1, val2 }\n\
                         }\n\
                     }\n\
                 }\n\
             }\n\
         }",
    );

    assert!(header.contains("struct Root {"));
    assert!(header.contains("struct Root_nested {"));
    assert!(header.contains("struct Root_nested_deep {"));
    assert!(header.contains("struct Root_nested_deep_deeper {"));
    assert!(header.contains("struct Root_nested_deep_deeper_deepest_a {"));
    assert!(header.contains("enum class Root_nested_deep_deeper_deepest_b {"));
    assert!(header.contains(
        "using Root_nested_deep_deeper_deepest = \
         std::variant<Root_nested_deep_deeper_deepest_a, Root_nested_deep_deeper_deepest_b>;",
    ));
}

#[test]
fn anonymous_enum_in_container() {
    let header = compile("Board : struct { cells: array<enum { empty, full }> }");

    assert!(header.contains("enum class Board_cells {"));
    assert!(header.contains("std::vector<Board_cells> cells;"));
}

#[test]
fn hoisted_name_collisions_get_a_counter() {
    let header = compile(
        "T : struct { a: struct { b: enum { x } }, a_b: enum { y } }",
    );

    assert!(header.contains("enum class T_a_b {"));
    assert!(header.contains("enum class T_a_b_1 {"));
}

#[test]
fn indentation_size_option() {
    let options = GenerationOptions {
        indentation_size: 2,
        ..GenerationOptions::default()
    };
    let header = compile_with("Position : struct { x: f32 }", &options);

    assert!(header.contains("struct Position {\n  float x;\n};"));
}

#[test]
fn output_is_deterministic() {
    let source = "Point : struct { x: f32 }\nTeam : enum { red, blue }\nState : variant { idle, moving: Point }";
    assert_eq!(compile(source), compile(source));
}

#[test]
fn whitespace_does_not_change_the_output() {
    let compact = compile("Point:struct{x:u32,y:u32}");
    let spaced = compile("Point : struct {\n    x: u32,\n    y: u32\n}");
    assert_eq!(compact, spaced);
}

#[test]
fn trailing_commas_do_not_change_the_output() {
    let with = compile("Point : struct { x: u32, y: u32, }");
    let without = compile("Point : struct { x: u32, y: u32 }");
    assert_eq!(with, without);
}

#[test]
fn empty_schema_still_produces_a_header() {
    let header = compile("");

    assert!(header.starts_with("#pragma once\n"));
    assert!(header.contains("namespace game {"));
    assert!(header.contains("} // namespace game"));
    assert!(header.ends_with("#endif // GENERATED_H\n"));
}

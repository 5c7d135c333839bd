//! Semantic analysis of parsed schemas.
//!
//! Validation runs in phases: symbol-table construction, per-definition
//! checks (empty compounds, duplicate members, nested optionals, undefined
//! and forward references), leaf termination, and finally cycle detection.
//! `ref<entity>` is a terminal leaf for the cycle walk, which is what makes
//! recursive and cross-referential data expressible.

use codespan::{FileId, Span};
use codespan_reporting::diagnostic::Diagnostic;
use std::collections::{HashMap, HashSet};

use crate::ast::{ContainerKind, Schema, TypeDefinition, TypeExpr};
use crate::diagnostics;

/// Validate a schema, reporting diagnostics through `report`.
///
/// Returns true iff nothing was reported. The schema itself is never
/// mutated.
pub fn validate_schema(
    file_id: FileId,
    schema: &Schema,
    report: &mut dyn FnMut(Diagnostic),
) -> bool {
    let mut context = Context {
        file_id,
        schema,
        symbols: HashMap::new(),
        error_count: 0,
    };

    context.build_symbol_table(report);
    if context.error_count > 0 {
        // Later phases assume unambiguous names.
        return false;
    }

    context.check_definitions(report);
    context.check_cycles(report);

    context.error_count == 0
}

/// Contextual information shared by the validation phases.
struct Context<'schema> {
    file_id: FileId,
    schema: &'schema Schema,
    /// Name of each definition, mapped to its index and name span.
    symbols: HashMap<&'schema str, (usize, Span)>,
    error_count: usize,
}

impl<'schema> Context<'schema> {
    fn emit(&mut self, report: &mut dyn FnMut(Diagnostic), diagnostic: Diagnostic) {
        self.error_count += 1;
        report(diagnostic);
    }

    fn build_symbol_table(&mut self, report: &mut dyn FnMut(Diagnostic)) {
        for (index, definition) in self.schema.definitions.iter().enumerate() {
            let name = definition.name.1.as_str();
            match self.symbols.get(name) {
                Some(&(_, original)) => {
                    let diagnostic = diagnostics::duplicate_type_definition(
                        self.file_id,
                        name,
                        definition.name.0,
                        original,
                    );
                    self.emit(report, diagnostic);
                }
                None => {
                    self.symbols.insert(name, (index, definition.name.0));
                }
            }
        }
    }

    fn check_definitions(&mut self, report: &mut dyn FnMut(Diagnostic)) {
        for (index, definition) in self.schema.definitions.iter().enumerate() {
            self.check_type_expr(report, &definition.body, &definition.name.1, index);

            let mut followed = HashSet::new();
            self.check_leaf(report, &definition.body, &definition.name.1, false, &mut followed);
        }
    }

    /// Walk a type expression, checking everything that does not require
    /// whole-graph knowledge. `context` is the breadcrumb used in messages
    /// (e.g. `Player.inventory (map key)`); `index` is the index of the
    /// enclosing definition, used for forward-reference detection.
    fn check_type_expr(
        &mut self,
        report: &mut dyn FnMut(Diagnostic),
        expr: &'schema TypeExpr,
        context: &str,
        index: usize,
    ) {
        match expr {
            TypeExpr::Struct(span, fields) => {
                if fields.is_empty() {
                    let diagnostic = diagnostics::empty_struct(self.file_id, *span, context);
                    self.emit(report, diagnostic);
                }

                let mut seen: HashMap<&str, Span> = HashMap::new();
                for field in fields {
                    match seen.get(field.name.1.as_str()) {
                        Some(&original) => {
                            let diagnostic = diagnostics::duplicate_field_name(
                                self.file_id,
                                &field.name.1,
                                context,
                                field.name.0,
                                original,
                            );
                            self.emit(report, diagnostic);
                        }
                        None => {
                            seen.insert(&field.name.1, field.name.0);
                        }
                    }

                    let field_context = format!("{}.{}", context, field.name.1);
                    self.check_type_expr(report, &field.ty, &field_context, index);
                }
            }
            TypeExpr::Variant(span, alternatives) => {
                if alternatives.is_empty() {
                    let diagnostic = diagnostics::empty_variant(self.file_id, *span, context);
                    self.emit(report, diagnostic);
                }

                let mut seen: HashMap<&str, Span> = HashMap::new();
                for alternative in alternatives {
                    match seen.get(alternative.name.1.as_str()) {
                        Some(&original) => {
                            let diagnostic = diagnostics::duplicate_alternative_name(
                                self.file_id,
                                &alternative.name.1,
                                context,
                                alternative.name.0,
                                original,
                            );
                            self.emit(report, diagnostic);
                        }
                        None => {
                            seen.insert(&alternative.name.1, alternative.name.0);
                        }
                    }

                    if let Some(ty) = &alternative.ty {
                        let alternative_context =
                            format!("{}.{}", context, alternative.name.1);
                        self.check_type_expr(report, ty, &alternative_context, index);
                    }
                }
            }
            TypeExpr::Enum(span, values) => {
                if values.is_empty() {
                    let diagnostic = diagnostics::empty_enum(self.file_id, *span, context);
                    self.emit(report, diagnostic);
                }

                let mut seen: HashMap<&str, Span> = HashMap::new();
                for (value_span, value) in values {
                    match seen.get(value.as_str()) {
                        Some(&original) => {
                            let diagnostic = diagnostics::duplicate_enum_value(
                                self.file_id,
                                value,
                                context,
                                *value_span,
                                original,
                            );
                            self.emit(report, diagnostic);
                        }
                        None => {
                            seen.insert(value, *value_span);
                        }
                    }
                }
            }
            TypeExpr::Container(span, kind) => match kind {
                ContainerKind::Array(element) => {
                    self.check_type_expr(report, element, context, index);
                }
                ContainerKind::Optional(element) => {
                    self.check_type_expr(report, element, context, index);

                    if let TypeExpr::Container(_, ContainerKind::Optional(_)) = element.as_ref() {
                        let diagnostic =
                            diagnostics::nested_optional(self.file_id, *span, context);
                        self.emit(report, diagnostic);
                    }
                }
                ContainerKind::Map(key, value) => {
                    let key_context = format!("{} (map key)", context);
                    self.check_type_expr(report, key, &key_context, index);

                    let value_context = format!("{} (map value)", context);
                    self.check_type_expr(report, value, &value_context, index);
                }
            },
            TypeExpr::Name(span, name) => match self.symbols.get(name.as_str()) {
                None => {
                    let diagnostic =
                        diagnostics::undefined_type(self.file_id, *span, name, context);
                    self.emit(report, diagnostic);
                }
                Some(&(definition_index, _)) => {
                    if definition_index > index {
                        let diagnostic =
                            diagnostics::forward_reference(self.file_id, *span, name, context);
                        self.emit(report, diagnostic);
                    }
                }
            },
            TypeExpr::Primitive(_, _) | TypeExpr::Ref(_) => {}
        }
    }

    /// Check that every path through the definition ends at a primitive,
    /// enum, or ref leaf, following named references through the symbol
    /// table. `followed` prunes repeated visits so cyclic schemas (reported
    /// by the cycle phase) cannot recurse forever.
    fn check_leaf(
        &mut self,
        report: &mut dyn FnMut(Diagnostic),
        expr: &'schema TypeExpr,
        context: &str,
        must_terminate: bool,
        followed: &mut HashSet<&'schema str>,
    ) {
        match expr {
            TypeExpr::Struct(_, fields) => {
                for field in fields {
                    let field_context = format!("{}.{}", context, field.name.1);
                    self.check_leaf(report, &field.ty, &field_context, true, followed);
                }
            }
            TypeExpr::Variant(_, alternatives) => {
                for alternative in alternatives {
                    if let Some(ty) = &alternative.ty {
                        let alternative_context =
                            format!("{}.{}", context, alternative.name.1);
                        self.check_leaf(report, ty, &alternative_context, true, followed);
                    }
                }
            }
            TypeExpr::Container(_, kind) => match kind {
                ContainerKind::Array(element) | ContainerKind::Optional(element) => {
                    self.check_leaf(report, element, context, must_terminate, followed);
                }
                ContainerKind::Map(key, value) => {
                    let key_context = format!("{} (key)", context);
                    self.check_leaf(report, key, &key_context, must_terminate, followed);

                    let value_context = format!("{} (value)", context);
                    self.check_leaf(report, value, &value_context, must_terminate, followed);
                }
            },
            TypeExpr::Name(span, name) => match self.symbols.get(name.as_str()) {
                Some(&(index, _)) => {
                    if followed.insert(name) {
                        let schema = self.schema;
                        let target = &schema.definitions[index];
                        self.check_leaf(report, &target.body, name, must_terminate, followed);
                    }
                }
                // An unresolved name can never reach a leaf; the undefined
                // reference itself is reported by the reference check.
                None if must_terminate => {
                    let diagnostic =
                        diagnostics::non_terminating_path(self.file_id, *span, context);
                    self.emit(report, diagnostic);
                }
                None => {}
            },
            TypeExpr::Primitive(_, _) | TypeExpr::Enum(_, _) | TypeExpr::Ref(_) => {}
        }
    }

    fn check_cycles(&mut self, report: &mut dyn FnMut(Diagnostic)) {
        for definition in &self.schema.definitions {
            if self.has_cycle(definition) {
                let diagnostic = diagnostics::circular_dependency(
                    self.file_id,
                    definition.name.0,
                    &definition.name.1,
                );
                self.emit(report, diagnostic);
            }
        }
    }

    /// Depth-first search for a dependency cycle starting at `definition`,
    /// over `Name` edges only. `ref<entity>` contributes no edge.
    fn has_cycle(&self, definition: &'schema TypeDefinition) -> bool {
        let mut visiting = HashSet::new();
        let mut visited = HashSet::new();

        visiting.insert(definition.name.1.as_str());
        self.cycle_in_expr(&definition.body, &definition.name.1, &mut visiting, &mut visited)
    }

    fn cycle_in_expr(
        &self,
        expr: &'schema TypeExpr,
        root: &str,
        visiting: &mut HashSet<&'schema str>,
        visited: &mut HashSet<&'schema str>,
    ) -> bool {
        match expr {
            TypeExpr::Struct(_, fields) => {
                for field in fields {
                    if self.cycle_in_expr(&field.ty, root, visiting, visited) {
                        return true;
                    }
                }
                false
            }
            TypeExpr::Variant(_, alternatives) => {
                for alternative in alternatives {
                    if let Some(ty) = &alternative.ty {
                        if self.cycle_in_expr(ty, root, visiting, visited) {
                            return true;
                        }
                    }
                }
                false
            }
            TypeExpr::Container(_, kind) => match kind {
                ContainerKind::Array(element) | ContainerKind::Optional(element) => {
                    self.cycle_in_expr(element, root, visiting, visited)
                }
                ContainerKind::Map(key, value) => {
                    self.cycle_in_expr(key, root, visiting, visited)
                        || self.cycle_in_expr(value, root, visiting, visited)
                }
            },
            TypeExpr::Name(_, name) => {
                if name == root || visiting.contains(name.as_str()) {
                    return true;
                }
                if visited.contains(name.as_str()) {
                    return false;
                }

                match self.symbols.get(name.as_str()) {
                    Some(&(index, _)) => {
                        let schema = self.schema;
                        let target = &schema.definitions[index];

                        visiting.insert(name);
                        let found = self.cycle_in_expr(&target.body, root, visiting, visited);
                        visiting.remove(name.as_str());
                        visited.insert(name);

                        found
                    }
                    None => false,
                }
            }
            TypeExpr::Primitive(_, _) | TypeExpr::Enum(_, _) | TypeExpr::Ref(_) => false,
        }
    }
}

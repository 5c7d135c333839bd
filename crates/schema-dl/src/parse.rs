//! The recursive-descent parser for Schema-DL.
//!
//! The parser drives the lexer on demand with a single token of lookahead,
//! skipping comment and newline trivia between significant tokens, so compact
//! one-line schemas parse identically to multi-line ones. Errors never abort
//! the parse: a diagnostic is reported and [`Parser::synchronize`] skips
//! ahead to what looks like the next definition.

use codespan::{ByteIndex, FileId, Span};
use codespan_reporting::diagnostic::Diagnostic;

use crate::ast::{Alternative, ContainerKind, Field, Schema, TypeDefinition, TypeExpr};
use crate::diagnostics;
use crate::lexer::{Lexer, SpannedToken, Token};

/// Parse a schema from the given lexer, reporting lexical and syntax
/// diagnostics through `report`. Always returns a schema; callers must gate
/// downstream stages on the absence of reported diagnostics.
pub fn parse_schema(
    file_id: FileId,
    lexer: Lexer<'_>,
    report: &mut dyn FnMut(Diagnostic),
) -> Schema {
    Parser::new(file_id, lexer, report).schema()
}

struct Parser<'input, 'report> {
    file_id: FileId,
    lexer: Lexer<'input>,
    /// The current significant token (`None` at end of input).
    current: Option<SpannedToken>,
    /// Span of the most recently consumed significant token.
    prev_span: Span,
    report: &'report mut dyn FnMut(Diagnostic),
}

impl<'input, 'report> Parser<'input, 'report> {
    fn new(
        file_id: FileId,
        lexer: Lexer<'input>,
        report: &'report mut dyn FnMut(Diagnostic),
    ) -> Parser<'input, 'report> {
        let mut parser = Parser {
            file_id,
            lexer,
            current: None,
            prev_span: Span::new(ByteIndex::from(0), ByteIndex::from(0)),
            report,
        };
        parser.advance();
        parser
    }

    /// Advance to the next significant token, forwarding lexical diagnostics
    /// and discarding newline and comment trivia.
    fn advance(&mut self) {
        if let Some((start, _, end)) = &self.current {
            self.prev_span = Span::new(*start, *end);
        }
        self.current = loop {
            match self.lexer.next() {
                None => break None,
                Some(Err(diagnostic)) => (self.report)(diagnostic),
                Some(Ok((_, Token::Newline, _))) | Some(Ok((_, Token::Comment(_), _))) => {}
                Some(Ok(token)) => break Some(token),
            }
        };
    }

    fn current_span(&self) -> Span {
        match &self.current {
            Some((start, _, end)) => Span::new(*start, *end),
            None => Span::new(self.prev_span.end(), self.prev_span.end()),
        }
    }

    fn check(&self, token: &Token) -> bool {
        match &self.current {
            Some((_, current, _)) => current == token,
            None => false,
        }
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the expected token, or report and leave the stream untouched.
    fn expect(&mut self, token: &Token, description: &str) -> bool {
        if self.match_token(token) {
            true
        } else {
            let span = self.current_span();
            (self.report)(diagnostics::expected(self.file_id, span, description));
            false
        }
    }

    /// Consume an identifier, or report using `description`.
    fn identifier(&mut self, description: &str) -> Option<(Span, String)> {
        match &self.current {
            Some((start, Token::Identifier(name), end)) => {
                let name = (Span::new(*start, *end), name.clone());
                self.advance();
                Some(name)
            }
            _ => {
                let span = self.current_span();
                (self.report)(diagnostics::expected(self.file_id, span, description));
                None
            }
        }
    }

    /// Skip past the offending token, then resume just after a newline or at
    /// an identifier (the likely start of the next definition).
    fn synchronize(&mut self) {
        loop {
            match self.lexer.next() {
                None => {
                    self.current = None;
                    return;
                }
                Some(Err(diagnostic)) => (self.report)(diagnostic),
                Some(Ok((_, Token::Newline, _))) => {
                    self.advance();
                    return;
                }
                Some(Ok((start, Token::Identifier(name), end))) => {
                    self.current = Some((start, Token::Identifier(name), end));
                    return;
                }
                Some(Ok(_)) => {}
            }
        }
    }

    fn schema(&mut self) -> Schema {
        let mut definitions = Vec::new();

        while self.current.is_some() {
            match self.type_definition() {
                Some(definition) => definitions.push(definition),
                None => self.synchronize(),
            }
        }

        Schema { definitions }
    }

    fn type_definition(&mut self) -> Option<TypeDefinition> {
        let name = self.identifier("a type name")?;
        self.expect(&Token::Colon, "':' after type name");
        let body = self.type_expr()?;

        Some(TypeDefinition {
            span: Span::merge(name.0, body.span()),
            name,
            body,
        })
    }

    fn type_expr(&mut self) -> Option<TypeExpr> {
        let (span, token) = match &self.current {
            Some((start, token, end)) => (Span::new(*start, *end), token.clone()),
            None => {
                let span = self.current_span();
                (self.report)(diagnostics::expected_type_expression(
                    self.file_id,
                    span,
                    None,
                ));
                return None;
            }
        };

        match token {
            Token::Struct => self.struct_type(),
            Token::Variant => self.variant_type(),
            Token::Enum => self.enum_type(),
            Token::Array | Token::Map | Token::Optional => self.container_type(token),
            Token::Ref => self.ref_type(),
            Token::Identifier(name) => {
                self.advance();
                Some(TypeExpr::Name(span, name))
            }
            token => match token.primitive() {
                Some(primitive) => {
                    self.advance();
                    Some(TypeExpr::Primitive(span, primitive))
                }
                None => {
                    (self.report)(diagnostics::expected_type_expression(
                        self.file_id,
                        span,
                        Some(&token),
                    ));
                    None
                }
            },
        }
    }

    fn struct_type(&mut self) -> Option<TypeExpr> {
        let start = self.current_span();
        self.advance(); // `struct`
        self.expect(&Token::OpenBrace, "'{' after 'struct'");

        let mut fields = Vec::new();
        loop {
            if self.check(&Token::CloseBrace) || self.current.is_none() {
                break;
            }
            match self.field() {
                Some(field) => fields.push(field),
                None => break,
            }
            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        self.expect(&Token::CloseBrace, "'}' after struct fields");
        Some(TypeExpr::Struct(Span::merge(start, self.prev_span), fields))
    }

    fn variant_type(&mut self) -> Option<TypeExpr> {
        let start = self.current_span();
        self.advance(); // `variant`
        self.expect(&Token::OpenBrace, "'{' after 'variant'");

        let mut alternatives = Vec::new();
        loop {
            if self.check(&Token::CloseBrace) || self.current.is_none() {
                break;
            }
            match self.alternative() {
                Some(alternative) => alternatives.push(alternative),
                None => break,
            }
            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        self.expect(&Token::CloseBrace, "'}' after variant alternatives");
        Some(TypeExpr::Variant(
            Span::merge(start, self.prev_span),
            alternatives,
        ))
    }

    fn enum_type(&mut self) -> Option<TypeExpr> {
        let start = self.current_span();
        self.advance(); // `enum`
        self.expect(&Token::OpenBrace, "'{' after 'enum'");

        let mut values = Vec::new();
        loop {
            if self.check(&Token::CloseBrace) || self.current.is_none() {
                break;
            }
            match self.identifier("an enum value") {
                Some(value) => values.push(value),
                None => break,
            }
            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        self.expect(&Token::CloseBrace, "'}' after enum values");
        Some(TypeExpr::Enum(Span::merge(start, self.prev_span), values))
    }

    fn field(&mut self) -> Option<Field> {
        let name = self.identifier("a field name")?;
        self.expect(&Token::Colon, "':' after field name");
        let ty = self.type_expr()?;

        Some(Field { name, ty })
    }

    fn alternative(&mut self) -> Option<Alternative> {
        let name = self.identifier("an alternative name")?;

        // A bare alternative name means an implicit `unit` payload.
        let ty = if self.match_token(&Token::Colon) {
            Some(self.type_expr()?)
        } else {
            None
        };

        Some(Alternative { name, ty })
    }

    fn container_type(&mut self, keyword: Token) -> Option<TypeExpr> {
        let start = self.current_span();
        self.advance(); // `array`, `map`, or `optional`
        self.expect(&Token::OpenAngle, "'<' after container type");

        let kind = match keyword {
            Token::Map => {
                let key = self.type_expr()?;
                self.expect(&Token::Comma, "',' between map key and value types");
                let value = self.type_expr()?;
                ContainerKind::Map(Box::new(key), Box::new(value))
            }
            Token::Optional => ContainerKind::Optional(Box::new(self.type_expr()?)),
            _ => ContainerKind::Array(Box::new(self.type_expr()?)),
        };

        self.expect(&Token::CloseAngle, "'>' after container type parameter");
        Some(TypeExpr::Container(
            Span::merge(start, self.prev_span),
            kind,
        ))
    }

    fn ref_type(&mut self) -> Option<TypeExpr> {
        let start = self.current_span();
        self.advance(); // `ref`
        self.expect(&Token::OpenAngle, "'<' after 'ref'");
        self.expect(&Token::Entity, "'entity' in ref type");
        self.expect(&Token::CloseAngle, "'>' after 'entity'");

        Some(TypeExpr::Ref(Span::merge(start, self.prev_span)))
    }
}

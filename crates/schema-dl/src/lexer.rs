//! The lexer for Schema-DL source files.

use codespan::{ByteIndex, ByteOffset, FileId, Files, Span};
use codespan_reporting::diagnostic::Diagnostic;
use maplit::hashmap;
use std::collections::HashMap;
use std::fmt;

use crate::diagnostics;

type Keywords = HashMap<&'static str, Token>;

lazy_static::lazy_static! {
    static ref KEYWORDS: Keywords = hashmap! {
        "struct" => Token::Struct,
        "variant" => Token::Variant,
        "enum" => Token::Enum,
        "unit" => Token::Unit,
        "array" => Token::Array,
        "map" => Token::Map,
        "optional" => Token::Optional,
        "ref" => Token::Ref,
        "entity" => Token::Entity,
        "str" => Token::Str,
        "int" => Token::Int,
        "bool" => Token::Bool,
        "u8" => Token::U8,
        "u16" => Token::U16,
        "u32" => Token::U32,
        "u64" => Token::U64,
        "i8" => Token::I8,
        "i16" => Token::I16,
        "i32" => Token::I32,
        "i64" => Token::I64,
        "f32" => Token::F32,
        "f64" => Token::F64,
        "true" => Token::True,
        "false" => Token::False,
    };
}

/// Tokens that will be produced during lexing.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers
    Identifier(String),
    /// String literals, with escape sequences already interpreted
    StringLiteral(String),
    /// Numeric literals of any base, with the source lexeme preserved
    NumberLiteral(String),
    /// Line or block comments (discarded by the parser)
    Comment(String),

    /// Keyword `struct`
    Struct,
    /// Keyword `variant`
    Variant,
    /// Keyword `enum`
    Enum,
    /// Keyword `unit`
    Unit,
    /// Keyword `array`
    Array,
    /// Keyword `map`
    Map,
    /// Keyword `optional`
    Optional,
    /// Keyword `ref`
    Ref,
    /// Keyword `entity`
    Entity,

    /// Primitive type `str`
    Str,
    /// Primitive type `int`
    Int,
    /// Primitive type `bool`
    Bool,
    /// Primitive type `u8`
    U8,
    /// Primitive type `u16`
    U16,
    /// Primitive type `u32`
    U32,
    /// Primitive type `u64`
    U64,
    /// Primitive type `i8`
    I8,
    /// Primitive type `i16`
    I16,
    /// Primitive type `i32`
    I32,
    /// Primitive type `i64`
    I64,
    /// Primitive type `f32`
    F32,
    /// Primitive type `f64`
    F64,

    /// Boolean literal `true`
    True,
    /// Boolean literal `false`
    False,

    /// Colon: `:`
    Colon,
    /// Comma: `,`
    Comma,
    /// Open curly brace: `{`
    OpenBrace,
    /// Close curly brace: `}`
    CloseBrace,
    /// Open angle bracket: `<`
    OpenAngle,
    /// Close angle bracket: `>`
    CloseAngle,
    /// Open parenthesis: `(`
    OpenParen,
    /// Close parenthesis: `)`
    CloseParen,

    /// Line feed (the parser treats these as soft separators)
    Newline,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "{}", name),
            Token::StringLiteral(contents) => write!(f, "\"{}\"", contents),
            Token::NumberLiteral(lexeme) => write!(f, "{}", lexeme),
            Token::Comment(contents) => write!(f, "//{}", contents),

            Token::Struct => write!(f, "struct"),
            Token::Variant => write!(f, "variant"),
            Token::Enum => write!(f, "enum"),
            Token::Unit => write!(f, "unit"),
            Token::Array => write!(f, "array"),
            Token::Map => write!(f, "map"),
            Token::Optional => write!(f, "optional"),
            Token::Ref => write!(f, "ref"),
            Token::Entity => write!(f, "entity"),

            Token::Str => write!(f, "str"),
            Token::Int => write!(f, "int"),
            Token::Bool => write!(f, "bool"),
            Token::U8 => write!(f, "u8"),
            Token::U16 => write!(f, "u16"),
            Token::U32 => write!(f, "u32"),
            Token::U64 => write!(f, "u64"),
            Token::I8 => write!(f, "i8"),
            Token::I16 => write!(f, "i16"),
            Token::I32 => write!(f, "i32"),
            Token::I64 => write!(f, "i64"),
            Token::F32 => write!(f, "f32"),
            Token::F64 => write!(f, "f64"),

            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),

            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::OpenBrace => write!(f, "{{"),
            Token::CloseBrace => write!(f, "}}"),
            Token::OpenAngle => write!(f, "<"),
            Token::CloseAngle => write!(f, ">"),
            Token::OpenParen => write!(f, "("),
            Token::CloseParen => write!(f, ")"),

            Token::Newline => write!(f, "\\n"),
        }
    }
}

impl Token {
    /// The primitive type named by this token, if it names one.
    pub fn primitive(&self) -> Option<crate::ast::Primitive> {
        use crate::ast::Primitive;

        match self {
            Token::Str => Some(Primitive::Str),
            Token::Int => Some(Primitive::Int),
            Token::Bool => Some(Primitive::Bool),
            Token::Unit => Some(Primitive::Unit),
            Token::U8 => Some(Primitive::U8),
            Token::U16 => Some(Primitive::U16),
            Token::U32 => Some(Primitive::U32),
            Token::U64 => Some(Primitive::U64),
            Token::I8 => Some(Primitive::I8),
            Token::I16 => Some(Primitive::I16),
            Token::I32 => Some(Primitive::I32),
            Token::I64 => Some(Primitive::I64),
            Token::F32 => Some(Primitive::F32),
            Token::F64 => Some(Primitive::F64),
            _ => None,
        }
    }
}

pub type SpannedToken = (ByteIndex, Token, ByteIndex);

/// A lexer for Schema-DL.
///
/// End of input is the iterator returning `None`; malformed input is reported
/// as in-band `Err` items, after which the lexer keeps producing tokens.
pub struct Lexer<'input> {
    file_id: FileId,
    /// An iterator of unicode characters to consume.
    chars: std::str::Chars<'input>,
    /// First character of lookahead.
    peeked: Option<char>,
    /// Second character of lookahead (needed to tell `1.5` from `1 . x`).
    peeked2: Option<char>,
    /// The start of the next token to be emitted.
    token_start: ByteIndex,
    /// The end of the next token to be emitted.
    token_end: ByteIndex,
}

impl<'input> Lexer<'input> {
    /// Create a new lexer with the given file.
    pub fn new(files: &'input Files, file_id: FileId) -> Lexer<'input> {
        let mut chars = files.source(file_id).chars();
        let peeked = chars.next();
        let peeked2 = chars.next();

        Lexer {
            file_id,
            chars,
            peeked,
            peeked2,
            token_start: ByteIndex::from(0),
            token_end: ByteIndex::from(0),
        }
    }

    /// Emit a token and reset the start position, ready for the next token.
    fn emit(&mut self, token: Token) -> SpannedToken {
        let start = self.token_start;
        let end = self.token_end;
        self.token_start = self.token_end;
        (start, token, end)
    }

    /// Peek at the current lookahead character.
    fn peek(&self) -> Option<char> {
        self.peeked
    }

    /// Peek one character past the current lookahead.
    fn peek_second(&self) -> Option<char> {
        self.peeked2
    }

    /// Consume the current character and load the next one. Return the old character.
    fn advance(&mut self) -> Option<char> {
        let current = std::mem::replace(
            &mut self.peeked,
            std::mem::replace(&mut self.peeked2, self.chars.next()),
        );
        self.token_end += current.map_or(ByteOffset::from(0), ByteOffset::from_char_len);
        current
    }

    fn reset_start(&mut self) {
        self.token_start = self.token_end;
    }

    fn token_span(&self) -> Span {
        Span::new(self.token_start, self.token_end)
    }

    /// Report a lexical error in-band and reset for the next token.
    fn error(&mut self, diagnostic: Diagnostic) -> Option<Result<SpannedToken, Diagnostic>> {
        self.reset_start();
        Some(Err(diagnostic))
    }

    fn identifier(&mut self, first: char) -> SpannedToken {
        let mut ident = String::new();
        ident.push(first);
        loop {
            match self.peek() {
                Some(ch) if is_identifier_continue(ch) => {
                    ident.push(ch);
                    self.advance();
                }
                None | Some(_) => {
                    return self.emit(match KEYWORDS.get(ident.as_str()) {
                        Some(token) => token.clone(),
                        None => Token::Identifier(ident),
                    });
                }
            }
        }
    }

    /// Scan a numeric literal. The lexeme is preserved verbatim, whatever the
    /// base; nothing downstream evaluates it.
    fn number(&mut self, first: char) -> SpannedToken {
        let mut lexeme = String::new();
        lexeme.push(first);

        if first == '-' {
            // `first` was the sign, so pull the leading digit.
            match self.advance() {
                Some(ch) => lexeme.push(ch),
                None => return self.emit(Token::NumberLiteral(lexeme)),
            }
        }

        if lexeme.ends_with('0') {
            match self.peek() {
                Some(prefix @ 'x') | Some(prefix @ 'X') => {
                    lexeme.push(prefix);
                    self.advance();
                    self.digits(&mut lexeme, |ch| ch.is_ascii_hexdigit());
                    return self.emit(Token::NumberLiteral(lexeme));
                }
                Some(prefix @ 'b') | Some(prefix @ 'B') => {
                    lexeme.push(prefix);
                    self.advance();
                    self.digits(&mut lexeme, |ch| ch == '0' || ch == '1');
                    return self.emit(Token::NumberLiteral(lexeme));
                }
                Some(prefix @ 'o') | Some(prefix @ 'O') => {
                    lexeme.push(prefix);
                    self.advance();
                    self.digits(&mut lexeme, |ch| ('0'..='7').contains(&ch));
                    return self.emit(Token::NumberLiteral(lexeme));
                }
                _ => {}
            }
        }

        self.digits(&mut lexeme, |ch| ch.is_ascii_digit());

        // Fractional part, only when `.` is followed by a digit.
        if self.peek() == Some('.') && self.peek_second().map_or(false, |ch| ch.is_ascii_digit()) {
            lexeme.push('.');
            self.advance();
            self.digits(&mut lexeme, |ch| ch.is_ascii_digit());
        }

        // Exponent.
        if let Some(exponent @ 'e') | Some(exponent @ 'E') = self.peek() {
            lexeme.push(exponent);
            self.advance();
            if let Some(sign @ '+') | Some(sign @ '-') = self.peek() {
                lexeme.push(sign);
                self.advance();
            }
            self.digits(&mut lexeme, |ch| ch.is_ascii_digit());
        }

        self.emit(Token::NumberLiteral(lexeme))
    }

    fn digits(&mut self, lexeme: &mut String, accept: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !accept(ch) {
                break;
            }
            lexeme.push(ch);
            self.advance();
        }
    }

    fn string_literal(&mut self) -> Option<Result<SpannedToken, Diagnostic>> {
        let mut contents = String::new();

        loop {
            match self.advance() {
                None => {
                    return self.error(diagnostics::unterminated_string(
                        self.file_id,
                        self.token_span(),
                    ));
                }
                Some('"') => return Some(Ok(self.emit(Token::StringLiteral(contents)))),
                Some('\\') => {
                    let escape_start = self.token_end;
                    match self.advance() {
                        None => {
                            return self.error(diagnostics::unterminated_string(
                                self.file_id,
                                self.token_span(),
                            ));
                        }
                        Some('n') => contents.push('\n'),
                        Some('t') => contents.push('\t'),
                        Some('r') => contents.push('\r'),
                        Some('\\') => contents.push('\\'),
                        Some('"') => contents.push('"'),
                        Some('\'') => contents.push('\''),
                        Some('0') => contents.push('\0'),
                        Some('x') => {
                            let mut value = 0u8;
                            for _ in 0..2 {
                                match self.advance().and_then(|ch| ch.to_digit(16)) {
                                    Some(digit) => value = value * 16 + digit as u8,
                                    None => {
                                        return self.error(diagnostics::invalid_hex_escape(
                                            self.file_id,
                                            Span::new(escape_start, self.token_end),
                                        ));
                                    }
                                }
                            }
                            contents.push(char::from(value));
                        }
                        // Unknown escapes stand for the escaped character itself.
                        Some(ch) => contents.push(ch),
                    }
                }
                Some(ch) => contents.push(ch),
            }
        }
    }

    fn line_comment(&mut self) -> SpannedToken {
        let mut contents = String::new();
        // The terminating newline stays in the stream as its own token.
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            contents.push(ch);
            self.advance();
        }
        self.emit(Token::Comment(contents))
    }

    fn block_comment(&mut self) -> Option<Result<SpannedToken, Diagnostic>> {
        let mut contents = String::new();
        loop {
            match self.advance() {
                None => {
                    return self.error(diagnostics::unterminated_block_comment(
                        self.file_id,
                        self.token_span(),
                    ));
                }
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return Some(Ok(self.emit(Token::Comment(contents))));
                }
                Some(ch) => contents.push(ch),
            }
        }
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Result<SpannedToken, Diagnostic>;

    fn next(&mut self) -> Option<Result<SpannedToken, Diagnostic>> {
        'top: loop {
            match self.advance()? {
                '\n' => return Some(Ok(self.emit(Token::Newline))),
                ch if is_whitespace(ch) => {
                    self.reset_start();
                    continue 'top;
                }
                '/' => match self.peek() {
                    Some('/') => {
                        self.advance();
                        return Some(Ok(self.line_comment()));
                    }
                    Some('*') => {
                        self.advance();
                        return self.block_comment();
                    }
                    _ => {
                        let span = self.token_span();
                        return self.error(diagnostics::unexpected_character(
                            self.file_id,
                            span,
                            '/',
                        ));
                    }
                },
                ':' => return Some(Ok(self.emit(Token::Colon))),
                ',' => return Some(Ok(self.emit(Token::Comma))),
                '{' => return Some(Ok(self.emit(Token::OpenBrace))),
                '}' => return Some(Ok(self.emit(Token::CloseBrace))),
                '<' => return Some(Ok(self.emit(Token::OpenAngle))),
                '>' => return Some(Ok(self.emit(Token::CloseAngle))),
                '(' => return Some(Ok(self.emit(Token::OpenParen))),
                ')' => return Some(Ok(self.emit(Token::CloseParen))),
                '"' => return self.string_literal(),
                ch if ch.is_ascii_digit() => return Some(Ok(self.number(ch))),
                '-' if self.peek().map_or(false, |ch| ch.is_ascii_digit()) => {
                    return Some(Ok(self.number('-')));
                }
                ch if is_identifier_start(ch) => return Some(Ok(self.identifier(ch))),
                ch => {
                    let span = self.token_span();
                    return self.error(diagnostics::unexpected_character(self.file_id, span, ch));
                }
            }
        }
    }
}

fn is_whitespace(ch: char) -> bool {
    match ch {
        ' ' | '\t' | '\r' => true,
        _ => false,
    }
}

fn is_identifier_start(ch: char) -> bool {
    match ch {
        'a'..='z' | 'A'..='Z' | '_' => true,
        _ => false,
    }
}

fn is_identifier_continue(ch: char) -> bool {
    match ch {
        '0'..='9' | 'a'..='z' | 'A'..='Z' | '_' => true,
        _ => false,
    }
}

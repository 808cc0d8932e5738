//! Type-string canonicalizer.
//!
//! This parser handles the spellings found in declaration manifests and in
//! demangled symbol names:
//! - Primitive specifier sequences (`unsigned int`, `unsigned __int64`)
//! - Qualifiers (`const`, `volatile`, `struct`, `__ptr64`, ...)
//! - Trailing pointers, references and array sizes
//! - Function-pointer declarators
//! - Whitelisted container templates
//! - Its own canonical output (`*u8`, `[4]u32`, `(x: s32) -> bool`)
//!
//! It does NOT handle:
//! - Member pointers, references to arrays, nested declarators
//! - Arbitrary template instantiation

use crate::argument::parse_argument;
use crate::config::TypeConfig;
use crate::expr;
use crate::fnptr::{match_function_pointer, CALLING_CONVENTIONS};
use crate::split::split_args;
use crate::types::*;
use thiserror::Error;
use tracing::trace;

/// Errors that can occur during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, got {got}")]
    UnexpectedToken { expected: String, got: String },

    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Syntax error at position {pos}: {message}")]
    SyntaxError { pos: usize, message: String },

    #[error("Malformed declaration '{text}': {reason}")]
    MalformedDeclaration { text: String, reason: String },

    #[error("Unresolvable array size '{expr}': {reason}")]
    UnresolvableArithmetic { expr: String, reason: String },
}

impl ParseError {
    /// Whether this error breaches a structural contract and must abort
    /// the run rather than skip the declaration.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ParseError::UnresolvableArithmetic { .. })
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Words dropped wherever they appear in a type spelling.
const QUALIFIERS: &[&str] = &[
    "const",
    "volatile",
    "struct",
    "class",
    "union",
    "enum",
    "typename",
    "__ptr64",
    "__restrict",
];

fn is_qualifier(word: &str) -> bool {
    QUALIFIERS.contains(&word) || CALLING_CONVENTIONS.contains(&word)
}

/// Token types for the lexer.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Star,
    Amp,
    OpenParen,
    CloseParen,
    Comma,
    Less,
    Greater,
    Colon,
    Scope,
    Arrow,
    Ellipsis,
    DotDot,
    /// Bracketed array size, contents verbatim and trimmed.
    ArraySize(String),
    Eof,
}

/// A simple lexer for type spellings.
struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_whitespace();

        let ch = match self.peek_char() {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        let token = match ch {
            '*' => {
                self.next_char();
                Token::Star
            }
            '&' => {
                self.next_char();
                Token::Amp
            }
            '(' => {
                self.next_char();
                Token::OpenParen
            }
            ')' => {
                self.next_char();
                Token::CloseParen
            }
            ',' => {
                self.next_char();
                Token::Comma
            }
            '<' => {
                self.next_char();
                Token::Less
            }
            '>' => {
                self.next_char();
                Token::Greater
            }
            ':' => {
                if self.rest().starts_with("::") {
                    self.pos += 2;
                    Token::Scope
                } else {
                    self.next_char();
                    Token::Colon
                }
            }
            '-' if self.rest().starts_with("->") => {
                self.pos += 2;
                Token::Arrow
            }
            '.' => {
                if self.rest().starts_with("...") {
                    self.pos += 3;
                    Token::Ellipsis
                } else if self.rest().starts_with("..") {
                    self.pos += 2;
                    Token::DotDot
                } else {
                    return Err(ParseError::SyntaxError {
                        pos: self.pos,
                        message: "Unexpected '.'".to_string(),
                    });
                }
            }
            '[' => self.parse_array_size()?,
            _ if ch.is_ascii_alphanumeric() || ch == '_' => self.parse_ident(),
            _ => {
                return Err(ParseError::SyntaxError {
                    pos: self.pos,
                    message: format!("Unexpected character: '{}'", ch),
                });
            }
        };

        Ok(token)
    }

    fn parse_array_size(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(ch) = self.next_char() {
            match ch {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = &self.input[start + 1..self.pos - 1];
                        return Ok(Token::ArraySize(inner.trim().to_string()));
                    }
                }
                _ => {}
            }
        }
        Err(ParseError::SyntaxError {
            pos: start,
            message: "Unterminated array size".to_string(),
        })
    }

    fn parse_ident(&mut self) -> Token {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.next_char();
            } else {
                break;
            }
        }
        Token::Ident(self.input[start..self.pos].to_string())
    }
}

/// Normalizes raw type spellings into [`CanonicalType`]s.
#[derive(Debug, Clone, Copy)]
pub struct Canonicalizer<'c> {
    config: &'c TypeConfig,
}

impl<'c> Canonicalizer<'c> {
    pub fn new(config: &'c TypeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'c TypeConfig {
        self.config
    }

    /// Canonicalize a raw type spelling.
    pub fn canonicalize(&self, spelling: &str) -> ParseResult<CanonicalType> {
        let spelling = spelling.trim();
        if spelling.is_empty() {
            return Err(ParseError::InvalidType("empty type".to_string()));
        }

        if let Some(decl) = match_function_pointer(spelling) {
            return self.function_pointer(decl.return_type, decl.args);
        }

        let mut parser = TypeParser::new(spelling, self)?;
        let ty = parser.parse_type()?;
        if parser.current != Token::Eof {
            return Err(ParseError::UnexpectedToken {
                expected: "end of type".to_string(),
                got: format!("{:?}", parser.current),
            });
        }
        Ok(ty)
    }

    /// Canonicalize and check every array dimension against `size_hint`.
    ///
    /// The product of all dimensions must equal the hint. Identifiers in the
    /// size expressions are resolved through `constants`. The returned type
    /// keeps the original expression text.
    pub fn canonicalize_with_size_hint<F>(
        &self,
        spelling: &str,
        size_hint: i64,
        constants: F,
    ) -> ParseResult<CanonicalType>
    where
        F: Fn(&str) -> Option<i64>,
    {
        let ty = self.canonicalize(spelling)?;
        let sizes = ty.array_sizes();
        if sizes.is_empty() {
            return Ok(ty);
        }

        let mut total: i64 = 1;
        for size in &sizes {
            let value = expr::evaluate(size, &constants)?;
            total = total
                .checked_mul(value)
                .ok_or_else(|| ParseError::UnresolvableArithmetic {
                    expr: sizes.join("]["),
                    reason: "arithmetic overflow".to_string(),
                })?;
        }
        if total != size_hint {
            return Err(ParseError::UnresolvableArithmetic {
                expr: sizes.join("]["),
                reason: format!("evaluates to {}, expected {}", total, size_hint),
            });
        }
        trace!(spelling, total, "array size verified");
        Ok(ty)
    }

    fn function_pointer(&self, return_type: &str, args: &str) -> ParseResult<CanonicalType> {
        let return_type = self.canonicalize(return_type)?;
        let pieces = split_args(args);
        let mut params = Vec::with_capacity(pieces.len());
        if !(pieces.len() == 1 && matches!(pieces[0].trim(), "" | "void")) {
            for (index, piece) in pieces.iter().enumerate() {
                let arg = parse_argument(piece, index, self)?;
                params.push(FunctionParam::new(arg.name, arg.ty));
            }
        }
        Ok(CanonicalType::function_pointer(return_type, params))
    }
}

/// Canonicalize with a one-off [`Canonicalizer`].
pub fn canonicalize(spelling: &str, config: &TypeConfig) -> ParseResult<CanonicalType> {
    Canonicalizer::new(config).canonicalize(spelling)
}

/// Recursive-descent parser over one spelling.
struct TypeParser<'a, 'c> {
    lexer: Lexer<'a>,
    current: Token,
    canon: &'a Canonicalizer<'c>,
}

impl<'a, 'c> TypeParser<'a, 'c> {
    fn new(input: &'a str, canon: &'a Canonicalizer<'c>) -> ParseResult<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            canon,
        })
    }

    fn config(&self) -> &'c TypeConfig {
        self.canon.config
    }

    fn advance(&mut self) -> ParseResult<Token> {
        let prev = std::mem::replace(&mut self.current, Token::Eof);
        self.current = self.lexer.next_token()?;
        Ok(prev)
    }

    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if self.current == expected {
            self.advance()?;
            Ok(())
        } else if self.current == Token::Eof {
            Err(ParseError::UnexpectedEof)
        } else {
            Err(ParseError::UnexpectedToken {
                expected: format!("{:?}", expected),
                got: format!("{:?}", self.current),
            })
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.advance()? {
            Token::Ident(name) => Ok(name),
            Token::Eof => Err(ParseError::UnexpectedEof),
            other => Err(ParseError::UnexpectedToken {
                expected: "identifier".to_string(),
                got: format!("{:?}", other),
            }),
        }
    }

    /// type := ('*' | '[' size ']') type | '..' | '...' | canonical-fn | declaration
    fn parse_type(&mut self) -> ParseResult<CanonicalType> {
        match &self.current {
            Token::Star => {
                self.advance()?;
                Ok(CanonicalType::pointer_to(self.parse_type()?))
            }
            Token::ArraySize(size) => {
                let size = size.clone();
                self.advance()?;
                let element = self.parse_type()?;
                Ok(make_array(element, size))
            }
            Token::Ellipsis | Token::DotDot => {
                self.advance()?;
                Ok(CanonicalType::Variadic)
            }
            Token::OpenParen => self.parse_canonical_function(),
            _ => self.parse_declaration(),
        }
    }

    /// `(name: T, ...) -> R`
    fn parse_canonical_function(&mut self) -> ParseResult<CanonicalType> {
        self.expect(Token::OpenParen)?;

        let mut params = Vec::new();
        while self.current != Token::CloseParen {
            let name = self.expect_ident()?;
            self.expect(Token::Colon)?;
            let ty = self.parse_type()?;
            params.push(FunctionParam::new(name, ty));

            if self.current == Token::Comma {
                self.advance()?;
            } else {
                break;
            }
        }
        self.expect(Token::CloseParen)?;

        let return_type = if self.current == Token::Arrow {
            self.advance()?;
            self.parse_type()?
        } else {
            CanonicalType::void()
        };

        Ok(CanonicalType::function_pointer(return_type, params))
    }

    /// A C-style declaration: specifiers, then `*`/`&`/`[n]` suffixes.
    fn parse_declaration(&mut self) -> ParseResult<CanonicalType> {
        let mut words: Vec<String> = Vec::new();
        let mut template: Option<CanonicalType> = None;
        let mut is_const = false;

        while let Token::Ident(word) = &self.current {
            if is_qualifier(word) {
                is_const |= word == "const";
                self.advance()?;
                continue;
            }
            if template.is_some() {
                break;
            }

            let mut word = word.clone();
            self.advance()?;
            while self.current == Token::Scope {
                self.advance()?;
                let next = self.expect_ident()?;
                word = format!("{}::{}", word, next);
            }

            match self.current {
                Token::Less => template = Some(self.parse_template(&word, Token::Less)?),
                Token::OpenParen if self.config().is_container(&word) => {
                    template = Some(self.parse_template(&word, Token::OpenParen)?)
                }
                _ => words.push(word),
            }
        }

        let mut plain_char = false;
        let base = match template {
            Some(ty) if words.is_empty() => ty,
            Some(_) => {
                return Err(ParseError::InvalidType(format!(
                    "unexpected specifiers before template: {}",
                    words.join(" ")
                )))
            }
            None => {
                if words.is_empty() {
                    return Err(match &self.current {
                        Token::Eof => ParseError::UnexpectedEof,
                        other => ParseError::InvalidType(format!("{:?}", other)),
                    });
                }
                plain_char = words.len() == 1 && words[0] == "char";
                self.resolve_words(&words)?
            }
        };

        let mut ty = base;
        let mut pointer_depth = 0usize;
        loop {
            match &self.current {
                Token::Star | Token::Amp => {
                    ty = CanonicalType::pointer_to(ty);
                    pointer_depth += 1;
                    self.advance()?;
                }
                Token::Ident(word) if is_qualifier(word) => {
                    if pointer_depth == 0 && word == "const" {
                        is_const = true;
                    }
                    self.advance()?;
                }
                _ => break,
            }
        }

        let mut dims = Vec::new();
        while let Token::ArraySize(size) = &self.current {
            dims.push(size.clone());
            self.advance()?;
        }
        // T[a][b] is an array of a arrays of b.
        for size in dims.into_iter().rev() {
            ty = make_array(ty, size);
        }

        // Character data: `const char`, `char*`, `char const* *`.
        if plain_char && (is_const || pointer_depth > 0) {
            ty = replace_base(ty, CanonicalType::primitive(Primitive::U8));
        }

        Ok(ty)
    }

    fn parse_template(&mut self, name: &str, open: Token) -> ParseResult<CanonicalType> {
        let close = if open == Token::Less {
            Token::Greater
        } else {
            Token::CloseParen
        };
        self.expect(open)?;

        let mut args = Vec::new();
        loop {
            args.push(self.parse_type()?);
            if self.current == Token::Comma {
                self.advance()?;
            } else {
                break;
            }
        }
        self.expect(close)?;

        let stripped = self.config().strip_identifier(name).to_string();
        if args.len() == 1 && self.config().is_container(name) {
            let element = args.remove(0);
            return Ok(CanonicalType::Container(ContainerType {
                name: stripped,
                element: Box::new(element),
            }));
        }

        // Other templates stay opaque.
        let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        Ok(CanonicalType::Named(format!(
            "{}<{}>",
            stripped,
            rendered.join(",")
        )))
    }

    fn resolve_words(&self, words: &[String]) -> ParseResult<CanonicalType> {
        if let Some((primitive, consumed)) = self.config().primitives.lookup(words) {
            if consumed == words.len() {
                return Ok(CanonicalType::primitive(primitive));
            }
            return Err(ParseError::InvalidType(words.join(" ")));
        }
        match words {
            [single] => Ok(CanonicalType::Named(
                self.config().strip_identifier(single).to_string(),
            )),
            _ => Err(ParseError::InvalidType(words.join(" "))),
        }
    }
}

/// An empty size (`T[]`) decays to a pointer.
fn make_array(element: CanonicalType, size: String) -> CanonicalType {
    if size.is_empty() {
        CanonicalType::pointer_to(element)
    } else {
        CanonicalType::array_of(element, size)
    }
}

fn replace_base(ty: CanonicalType, base: CanonicalType) -> CanonicalType {
    match ty {
        CanonicalType::Pointer(inner) => CanonicalType::pointer_to(replace_base(*inner, base)),
        CanonicalType::FixedArray(a) => CanonicalType::array_of(replace_base(*a.element, base), a.size),
        _ => base,
    }
}

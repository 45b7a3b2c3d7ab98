// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ODVD Message Specification Parser
//!
//! Parses message specifications into [`MetaMessage`] descriptors:
//!
//! ```text
//! package example.sensors;
//!
//! message Temperature [id = 1001] {
//!     float value [default = 0.0, id = 1];
//!     string unit [default = "C"];
//! }
//! ```

use super::{DataType, MetaField, MetaMessage};
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Matches `// line` and `/* block */` comments.
const COMMENTS_PATTERN: &str = r"(//.*)|/\*([^*]|[\r\n]|(\*+([^*/]|[\r\n])))*\*+/";

/// Outcome of a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageParserErrorCode {
    NoError,
    /// The text does not follow the grammar.
    SyntaxError,
    /// Message or field identifiers/names collide.
    DuplicateIdentifiers,
}

impl fmt::Display for MessageParserErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoError => write!(f, "NO_ERROR"),
            Self::SyntaxError => write!(f, "SYNTAX_ERROR"),
            Self::DuplicateIdentifiers => write!(f, "DUPLICATE_IDENTIFIERS"),
        }
    }
}

/// Parse failure with a human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub code: MessageParserErrorCode,
    pub detail: String,
}

impl ParseError {
    fn syntax(input: &str, pos: usize, detail: impl fmt::Display) -> Self {
        let (line, column) = line_column(input, pos);
        Self {
            code: MessageParserErrorCode::SyntaxError,
            detail: format!("line {}, column {}: {}", line, column, detail),
        }
    }

    fn duplicate(detail: impl Into<String>) -> Self {
        Self {
            code: MessageParserErrorCode::DuplicateIdentifiers,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.detail)
    }
}

impl std::error::Error for ParseError {}

fn line_column(input: &str, pos: usize) -> (usize, usize) {
    let before = &input[..pos.min(input.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

/// Parser for ODVD message specifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageParser;

impl MessageParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `input` into message descriptors.
    ///
    /// Never fails hard: on error the list is empty and the code says why.
    /// An input without any message is a successful parse.
    pub fn parse(&self, input: &str) -> (Vec<MetaMessage>, MessageParserErrorCode) {
        match self.parse_result(input) {
            Ok(messages) => (messages, MessageParserErrorCode::NoError),
            Err(e) => (Vec::new(), e.code),
        }
    }

    /// Same as [`MessageParser::parse`], with the failure detail.
    pub fn parse_result(&self, input: &str) -> Result<Vec<MetaMessage>, ParseError> {
        let source = strip_comments(input);
        let result = Parser::new(&source)
            .and_then(|mut p| p.parse_specification())
            .and_then(|messages| validate(&messages).map(|()| messages));

        match &result {
            Ok(messages) => log::debug!("[odvd] parsed {} message(s)", messages.len()),
            Err(e) => log::debug!("[odvd] parse failed: {}", e),
        }
        result
    }
}

fn strip_comments(input: &str) -> Cow<'_, str> {
    static COMMENTS: OnceLock<Option<Regex>> = OnceLock::new();
    match COMMENTS.get_or_init(|| Regex::new(COMMENTS_PATTERN).ok()) {
        Some(re) => re.replace_all(input, ""),
        None => Cow::Borrowed(input),
    }
}

/// Reject colliding message ids/names and, per message, colliding field ids/names.
fn validate(messages: &[MetaMessage]) -> Result<(), ParseError> {
    let mut message_ids = HashSet::new();
    let mut message_names = HashSet::new();

    for msg in messages {
        // Unnumbered messages (id 0) are not part of the numbering.
        if msg.message_identifier != 0 && !message_ids.insert(msg.message_identifier) {
            return Err(ParseError::duplicate(format!(
                "message identifier {} used more than once",
                msg.message_identifier
            )));
        }
        let long_name = msg.long_name();
        if !message_names.insert(long_name.clone()) {
            return Err(ParseError::duplicate(format!(
                "message name '{}' declared more than once",
                long_name
            )));
        }

        let mut field_ids = HashSet::new();
        let mut field_names = HashSet::new();
        for field in msg.fields() {
            if !field_ids.insert(field.identifier) {
                return Err(ParseError::duplicate(format!(
                    "field identifier {} used more than once in '{}'",
                    field.identifier, long_name
                )));
            }
            if !field_names.insert(field.name.as_str()) {
                return Err(ParseError::duplicate(format!(
                    "field name '{}' used more than once in '{}'",
                    field.name, long_name
                )));
            }
        }
    }
    Ok(())
}

/// Token types for the lexer.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Identifier(String),
    /// Numeric literal kept verbatim (sign and fraction included).
    Number(String),
    String(String),
    Char(char),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Equals,
    Dot,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(s) => write!(f, "identifier '{}'", s),
            Self::Number(s) => write!(f, "number '{}'", s),
            Self::String(s) => write!(f, "string \"{}\"", s),
            Self::Char(c) => write!(f, "character '{}'", c),
            Self::LBrace => write!(f, "'{{'"),
            Self::RBrace => write!(f, "'}}'"),
            Self::LBracket => write!(f, "'['"),
            Self::RBracket => write!(f, "']'"),
            Self::Semicolon => write!(f, "';'"),
            Self::Comma => write!(f, "','"),
            Self::Equals => write!(f, "'='"),
            Self::Dot => write!(f, "'.'"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

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

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// `[a-zA-Z][a-zA-Z0-9_]*`; `_` after the first letter keeps snake_case
    /// Rust field names valid.
    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.next_char();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        let mut has_dot = false;

        if matches!(self.peek_char(), Some('-' | '+')) {
            self.next_char();
        }

        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                self.next_char();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.next_char();
            } else {
                break;
            }
        }

        Token::Number(self.input[start..self.pos].to_string())
    }

    fn read_string(&mut self) -> Result<String, ParseError> {
        let start_quote = self.pos;
        self.next_char(); // opening quote
        let start = self.pos;

        while let Some(ch) = self.peek_char() {
            if ch == '"' {
                let s = self.input[start..self.pos].to_string();
                self.next_char();
                return Ok(s);
            }
            self.next_char();
        }

        Err(ParseError::syntax(self.input, start_quote, "unterminated string"))
    }

    fn read_char(&mut self) -> Result<char, ParseError> {
        let start = self.pos;
        self.next_char(); // opening quote
        match (self.next_char(), self.next_char()) {
            (Some(ch), Some('\'')) if ch != '\'' => Ok(ch),
            _ => Err(ParseError::syntax(
                self.input,
                start,
                "character literal must hold exactly one character",
            )),
        }
    }

    /// Returns the next token and its byte offset.
    fn next_token(&mut self) -> Result<(Token, usize), ParseError> {
        self.skip_whitespace();
        let pos = self.pos;

        let ch = match self.peek_char() {
            Some(c) => c,
            None => return Ok((Token::Eof, pos)),
        };

        let single = match ch {
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            ';' => Some(Token::Semicolon),
            ',' => Some(Token::Comma),
            '=' => Some(Token::Equals),
            '.' => Some(Token::Dot),
            _ => None,
        };
        if let Some(token) = single {
            self.next_char();
            return Ok((token, pos));
        }

        if ch == '"' {
            return Ok((Token::String(self.read_string()?), pos));
        }
        if ch == '\'' {
            return Ok((Token::Char(self.read_char()?), pos));
        }

        let signed_digit = (ch == '-' || ch == '+')
            && self.input[self.pos + 1..].starts_with(|c: char| c.is_ascii_digit());
        if ch.is_ascii_digit() || signed_digit {
            return Ok((self.read_number(), pos));
        }

        if ch.is_ascii_alphabetic() {
            return Ok((Token::Identifier(self.read_identifier()), pos));
        }

        Err(ParseError::syntax(
            self.input,
            pos,
            format!("unexpected character '{}'", ch),
        ))
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    current_pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let (current, current_pos) = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            current_pos,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        let (token, pos) = self.lexer.next_token()?;
        self.current = token;
        self.current_pos = pos;
        Ok(())
    }

    fn error(&self, expected: &str) -> ParseError {
        ParseError::syntax(
            self.lexer.input,
            self.current_pos,
            format!("expected {}, found {}", expected, self.current),
        )
    }

    fn expect(&mut self, token: &Token) -> Result<(), ParseError> {
        if &self.current == token {
            self.advance()
        } else {
            Err(self.error(&token.to_string()))
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.current, Token::Identifier(s) if s == keyword)
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.is_keyword(keyword) {
            self.advance()
        } else {
            Err(self.error(&format!("'{}'", keyword)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current {
            Token::Identifier(s) => {
                let s = s.clone();
                self.advance()?;
                Ok(s)
            }
            _ => Err(self.error("identifier")),
        }
    }

    /// `IDENTIFIER ('.' IDENTIFIER)*`
    fn parse_dotted_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_identifier()?;
        while self.current == Token::Dot {
            self.advance()?;
            name.push('.');
            name.push_str(&self.expect_identifier()?);
        }
        Ok(name)
    }

    /// `[1-9][0-9]*`
    fn parse_natural<T: std::str::FromStr>(&mut self) -> Result<T, ParseError> {
        let value = match &self.current {
            Token::Number(text)
                if !text.starts_with('0') && text.chars().all(|c| c.is_ascii_digit()) =>
            {
                text.parse::<T>().ok()
            }
            _ => None,
        };
        match value {
            Some(v) => {
                self.advance()?;
                Ok(v)
            }
            None => Err(self.error("positive integer")),
        }
    }

    fn parse_specification(&mut self) -> Result<Vec<MetaMessage>, ParseError> {
        let mut package_name = String::new();
        if self.is_keyword("package") {
            self.advance()?;
            package_name = self.parse_dotted_name()?;
            self.expect(&Token::Semicolon)?;
        }

        let mut messages = Vec::new();
        while self.current != Token::Eof {
            messages.push(self.parse_message(&package_name)?);
        }
        Ok(messages)
    }

    fn parse_message(&mut self, package_name: &str) -> Result<MetaMessage, ParseError> {
        self.expect_keyword("message")?;
        let message_name = self.parse_dotted_name()?;

        let mut message_identifier = 0;
        if self.current == Token::LBracket {
            self.advance()?;
            self.expect_keyword("id")?;
            self.expect(&Token::Equals)?;
            message_identifier = self.parse_natural::<i32>()?;
            if self.current == Token::Comma {
                self.advance()?;
            }
            self.expect(&Token::RBracket)?;
        }

        let mut msg = MetaMessage::new(package_name, message_name, message_identifier);
        self.expect(&Token::LBrace)?;

        // Only fields without an explicit id consume the counter.
        let mut counter = 0u32;
        while self.current != Token::RBrace {
            let field = self.parse_field(&mut counter)?;
            msg.add(field);
        }
        self.advance()?;

        Ok(msg)
    }

    fn parse_field(&mut self, counter: &mut u32) -> Result<MetaField, ParseError> {
        let type_name = self.parse_dotted_name()?;
        let name = self.expect_identifier()?;

        let mut default_value = None;
        let mut identifier = None;
        if self.current == Token::LBracket {
            self.advance()?;
            if self.is_keyword("default") {
                self.advance()?;
                self.expect(&Token::Equals)?;
                default_value = Some(self.parse_literal()?);
            }
            if self.current == Token::Comma {
                self.advance()?;
            }
            if self.is_keyword("id") {
                self.advance()?;
                self.expect(&Token::Equals)?;
                identifier = Some(self.parse_natural::<u32>()?);
            }
            self.expect(&Token::RBracket)?;
        }
        self.expect(&Token::Semicolon)?;

        let identifier = match identifier {
            Some(id) => id,
            None => {
                *counter += 1;
                *counter
            }
        };

        let field = match DataType::from_type_token(&type_name) {
            Some(data_type) => MetaField::new(data_type, name, identifier),
            None => MetaField::message(type_name, name, identifier),
        };
        Ok(MetaField {
            default_value,
            ..field
        })
    }

    /// Default literal, kept verbatim; strings and chars keep their quotes.
    fn parse_literal(&mut self) -> Result<String, ParseError> {
        let literal = match &self.current {
            Token::Number(text) => text.clone(),
            Token::Identifier(word) if word == "true" || word == "false" => word.clone(),
            Token::String(s) => format!("\"{}\"", s),
            Token::Char(c) => format!("'{}'", c),
            _ => return Err(self.error("default value")),
        };
        self.advance()?;
        Ok(literal)
    }
}

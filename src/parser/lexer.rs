//! Lexer (tokenizer) for mini-Pascal source code
//!
//! Converts raw source text into a flat [`Token`] stream and wraps it in a
//! [`TokenStream`], the one-token-lookahead source consumed by the parser.
//! `{ ... }` comments are skipped. Keywords are case-insensitive, identifiers
//! are not.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// Every kind of token the grammar distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Program,
    Var,
    Array,
    Of,
    Integer,
    Real,
    Function,
    Procedure,
    Begin,
    End,
    If,
    Then,
    Else,
    While,
    Do,
    Not,
    And,
    Or,
    Div,
    Mod,
    Read,
    Write,

    // Identifiers and literals
    Identifier,
    Number,

    // Symbols
    Semicolon,    // ;
    Comma,        // ,
    Period,       // .
    Colon,        // :
    LBracket,     // [
    RBracket,     // ]
    LParen,       // (
    RParen,       // )
    Plus,         // +
    Minus,        // -
    Equal,        // =
    NotEqual,     // <>
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
    Star,         // *
    Slash,        // /
    Assign,       // :=

    /// Sentinel returned once the input is exhausted
    Eof,
}

impl TokenKind {
    /// Keyword lookup for an already-scanned word.
    fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word.to_ascii_lowercase().as_str() {
            "program" => TokenKind::Program,
            "var" => TokenKind::Var,
            "array" => TokenKind::Array,
            "of" => TokenKind::Of,
            "integer" => TokenKind::Integer,
            "real" => TokenKind::Real,
            "function" => TokenKind::Function,
            "procedure" => TokenKind::Procedure,
            "begin" => TokenKind::Begin,
            "end" => TokenKind::End,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "not" => TokenKind::Not,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "div" => TokenKind::Div,
            "mod" => TokenKind::Mod,
            "read" => TokenKind::Read,
            "write" => TokenKind::Write,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Program => "'program'",
            TokenKind::Var => "'var'",
            TokenKind::Array => "'array'",
            TokenKind::Of => "'of'",
            TokenKind::Integer => "'integer'",
            TokenKind::Real => "'real'",
            TokenKind::Function => "'function'",
            TokenKind::Procedure => "'procedure'",
            TokenKind::Begin => "'begin'",
            TokenKind::End => "'end'",
            TokenKind::If => "'if'",
            TokenKind::Then => "'then'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::Do => "'do'",
            TokenKind::Not => "'not'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Div => "'div'",
            TokenKind::Mod => "'mod'",
            TokenKind::Read => "'read'",
            TokenKind::Write => "'write'",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Period => "'.'",
            TokenKind::Colon => "':'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Equal => "'='",
            TokenKind::NotEqual => "'<>'",
            TokenKind::Less => "'<'",
            TokenKind::LessEqual => "'<='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Assign => "':='",
            TokenKind::Eof => "end of input",
        };
        f.write_str(text)
    }
}

/// A single scanned token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub lexeme: String,
    pub kind: TokenKind,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(lexeme: impl Into<String>, kind: TokenKind, location: SourceLocation) -> Self {
        Token {
            lexeme: lexeme.into(),
            kind,
            location,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier => write!(f, "identifier '{}'", self.lexeme),
            TokenKind::Number => write!(f, "number {}", self.lexeme),
            kind => write!(f, "{}", kind),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, Error)]
#[error("Lexer error at line {}, column {}: {message}", .location.line, .location.column)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Lexer for mini-Pascal source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input, ending with a single [`TokenKind::Eof`].
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                tokens.push(Token::new("", TokenKind::Eof, self.current_location()));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        let symbol =
            |kind: TokenKind, text: &str| -> Result<Token, LexError> { Ok(Token::new(text, kind, loc)) };

        match ch {
            '0'..='9' => self.number_literal(ch, loc),
            'a'..='z' | 'A'..='Z' => Ok(self.identifier_or_keyword(ch, loc)),

            ':' => {
                if self.peek() == Some('=') {
                    self.advance();
                    symbol(TokenKind::Assign, ":=")
                } else {
                    symbol(TokenKind::Colon, ":")
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    symbol(TokenKind::LessEqual, "<=")
                } else if self.peek() == Some('>') {
                    self.advance();
                    symbol(TokenKind::NotEqual, "<>")
                } else {
                    symbol(TokenKind::Less, "<")
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    symbol(TokenKind::GreaterEqual, ">=")
                } else {
                    symbol(TokenKind::Greater, ">")
                }
            }
            ';' => symbol(TokenKind::Semicolon, ";"),
            ',' => symbol(TokenKind::Comma, ","),
            '.' => symbol(TokenKind::Period, "."),
            '[' => symbol(TokenKind::LBracket, "["),
            ']' => symbol(TokenKind::RBracket, "]"),
            '(' => symbol(TokenKind::LParen, "("),
            ')' => symbol(TokenKind::RParen, ")"),
            '+' => symbol(TokenKind::Plus, "+"),
            '-' => symbol(TokenKind::Minus, "-"),
            '=' => symbol(TokenKind::Equal, "="),
            '*' => symbol(TokenKind::Star, "*"),
            '/' => symbol(TokenKind::Slash, "/"),

            _ => Err(LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Scan `digits [ '.' digits ] [ ('e'|'E') ['+'|'-'] digits ]`.
    fn number_literal(&mut self, first_digit: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut text = String::new();
        text.push(first_digit);
        self.take_digits(&mut text);

        // A '.' not followed by a digit is the program terminator, not a fraction.
        if self.peek() == Some('.') && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.advance();
            self.take_digits(&mut text);
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let signed = matches!(self.peek_ahead(1), Some('+') | Some('-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_ahead(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.advance() {
                        text.push(c);
                    }
                }
                self.take_digits(&mut text);
            } else {
                return Err(LexError {
                    message: format!("Malformed exponent in number '{}'", text),
                    location: loc,
                });
            }
        }

        Ok(Token::new(text, TokenKind::Number, loc))
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match TokenKind::keyword(&ident) {
            Some(kind) => Token::new(ident, kind, loc),
            None => Token::new(ident, TokenKind::Identifier, loc),
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('{') => self.skip_comment()?,
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip `{ ... }`, which may span lines.
    fn skip_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '{'

        while let Some(ch) = self.advance() {
            if ch == '}' {
                return Ok(());
            }
        }

        Err(LexError {
            message: "Unterminated comment".to_string(),
            location: start_loc,
        })
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// One-token-lookahead view over a scanned token list.
///
/// The last token is always [`TokenKind::Eof`]; `advance` never moves past it.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenStream {
    /// Wrap a token list, appending an `Eof` sentinel if it is missing.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let location = tokens
                .last()
                .map(|t| t.location)
                .unwrap_or_else(|| SourceLocation::new(1, 1));
            tokens.push(Token::new("", TokenKind::Eof, location));
        }
        TokenStream { tokens, position: 0 }
    }

    /// Scan `source` into a stream.
    pub fn from_source(source: &str) -> Result<Self, LexError> {
        Ok(TokenStream::new(Lexer::new(source).tokenize()?))
    }

    pub fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    /// Consume the current token and return it.
    pub fn advance(&mut self) -> Token {
        let token = self.tokens[self.position].clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }
}

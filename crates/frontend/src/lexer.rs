//! Tokenizer for Slate source text.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::SyntaxError;

/// Kinds of token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Int(i32),
    Str(String),
    Ident(String),

    // Keywords
    KwInt,
    KwBool,
    KwString,
    True,
    False,
    If,
    Else,
    While,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Assign,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Int(n) => return write!(f, "{n}"),
            TokenKind::Str(s) => return write!(f, "{s:?}"),
            TokenKind::Ident(name) => return f.write_str(name),
            TokenKind::KwInt => "int",
            TokenKind::KwBool => "bool",
            TokenKind::KwString => "string",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Bang => "!",
            TokenKind::Assign => "=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
        };
        f.write_str(text)
    }
}

/// A token and the line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "int" => TokenKind::KwInt,
        "bool" => TokenKind::KwBool,
        "string" => TokenKind::KwString,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        _ => return None,
    };
    Some(kind)
}

/// Tokenize a whole source file.
///
/// Whitespace and `//` comments are skipped. Stops at the first error.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        line: 1,
    };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl Lexer<'_> {
    fn next_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        self.skip_trivia();

        let line = self.line;
        let Some(c) = self.chars.next() else {
            return Ok(None);
        };

        let kind = match c {
            '0'..='9' => self.number(c)?,
            'a'..='z' | 'A'..='Z' | '_' => {
                let word = self.word(c);
                keyword(&word).unwrap_or(TokenKind::Ident(word))
            }
            '"' => self.string()?,
            '+' => self.with_eq(TokenKind::Plus, TokenKind::PlusAssign),
            '-' => self.with_eq(TokenKind::Minus, TokenKind::MinusAssign),
            '*' => self.with_eq(TokenKind::Star, TokenKind::StarAssign),
            '/' => self.with_eq(TokenKind::Slash, TokenKind::SlashAssign),
            '%' => TokenKind::Percent,
            '!' => self.with_eq(TokenKind::Bang, TokenKind::NotEq),
            '=' => self.with_eq(TokenKind::Assign, TokenKind::EqEq),
            '<' => self.with_eq(TokenKind::Lt, TokenKind::LtEq),
            '>' => self.with_eq(TokenKind::Gt, TokenKind::GtEq),
            '&' => self.doubled('&', TokenKind::AndAnd, line)?,
            '|' => self.doubled('|', TokenKind::OrOr, line)?,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            other => return Err(SyntaxError::UnexpectedChar { line, ch: other }),
        };

        Ok(Some(Token { kind, line }))
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            match c {
                '\n' => {
                    self.line += 1;
                    self.chars.next();
                }
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '/' => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if lookahead.peek() != Some(&'/') {
                        return;
                    }
                    // Leave the newline for the branch above.
                    while self.chars.peek().is_some_and(|&c| c != '\n') {
                        self.chars.next();
                    }
                }
                _ => return,
            }
        }
    }

    fn with_eq(&mut self, single: TokenKind, with_eq: TokenKind) -> TokenKind {
        if self.chars.peek() == Some(&'=') {
            self.chars.next();
            with_eq
        } else {
            single
        }
    }

    fn doubled(&mut self, c: char, kind: TokenKind, line: usize) -> Result<TokenKind, SyntaxError> {
        if self.chars.peek() == Some(&c) {
            self.chars.next();
            Ok(kind)
        } else {
            Err(SyntaxError::UnexpectedChar { line, ch: c })
        }
    }

    fn number(&mut self, first: char) -> Result<TokenKind, SyntaxError> {
        let mut text = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if !c.is_ascii_alphanumeric() {
                break;
            }
            text.push(c);
            self.chars.next();
        }
        text.parse::<i32>()
            .map(TokenKind::Int)
            .map_err(|_| SyntaxError::InvalidNumber {
                line: self.line,
                token: text,
            })
    }

    fn word(&mut self, first: char) -> String {
        let mut text = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            text.push(c);
            self.chars.next();
        }
        text
    }

    fn string(&mut self) -> Result<TokenKind, SyntaxError> {
        let start = self.line;
        let mut text = String::new();
        loop {
            let c = self
                .chars
                .next()
                .ok_or(SyntaxError::UnterminatedString { line: start })?;
            match c {
                '"' => return Ok(TokenKind::Str(text)),
                '\\' => {
                    let escaped = self
                        .chars
                        .next()
                        .ok_or(SyntaxError::UnterminatedString { line: start })?;
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '"' => '"',
                        '\\' => '\\',
                        '0' => '\0',
                        other => {
                            return Err(SyntaxError::InvalidEscape {
                                line: self.line,
                                ch: other,
                            })
                        }
                    });
                }
                '\n' => {
                    self.line += 1;
                    text.push(c);
                }
                _ => text.push(c),
            }
        }
    }
}

//! Lexer for PostgreSQL DDL.

use std::iter::Peekable;
use std::str::Chars;

/// SQL token types.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Create,
    Alter,
    Add,
    Table,
    Only,
    Primary,
    Key,
    Foreign,
    References,
    Not,
    Null,
    Unique,
    Default,
    On,
    Delete,
    Update,
    Cascade,
    Restrict,
    Constraint,
    Index,
    If,
    Exists,
    Check,

    // Identifiers and literals
    Ident(String),
    Str(String),
    Num(String),

    // Symbols
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    /// `::` type cast
    Cast,

    // End of input
    Eof,
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Unterminated quoted identifier")]
    UnterminatedIdent,
}

/// SQL lexer.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    current_char: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars().peekable();
        let current_char = chars.next();
        Self { chars, current_char }
    }

    fn advance(&mut self) {
        self.current_char = self.chars.next();
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    /// Consumes characters while `pred` holds.
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.current_char.filter(|c| pred(*c)) {
            out.push(c);
            self.advance();
        }
        out
    }

    /// Skips `-- ...` up to and including the newline.
    fn skip_line_comment(&mut self) {
        self.take_while(|c| c != '\n');
        self.advance();
    }

    /// Skips `/* ... */`; the opening `/` is already consumed.
    fn skip_block_comment(&mut self) {
        self.advance(); // *
        let mut prev = '\0';
        while let Some(c) = self.current_char {
            self.advance();
            if prev == '*' && c == '/' {
                break;
            }
            prev = c;
        }
    }

    fn read_quoted_identifier(&mut self, quote: char) -> Result<String, LexError> {
        self.advance(); // skip opening quote
        let mut ident = String::new();
        loop {
            match self.current_char {
                Some(c) if c == quote => {
                    // Doubled quote is an escaped quote
                    if self.peek() == Some(&quote) {
                        ident.push(c);
                        self.advance();
                        self.advance();
                    } else {
                        self.advance();
                        return Ok(ident);
                    }
                }
                Some(c) => {
                    ident.push(c);
                    self.advance();
                }
                None => return Err(LexError::UnterminatedIdent),
            }
        }
    }

    fn read_string(&mut self) -> Result<String, LexError> {
        self.advance(); // skip opening quote
        let mut s = String::new();
        loop {
            match self.current_char {
                Some('\'') => {
                    if self.peek() == Some(&'\'') {
                        s.push('\'');
                        self.advance();
                        self.advance();
                    } else {
                        self.advance();
                        return Ok(s);
                    }
                }
                Some('\\') => {
                    self.advance();
                    match self.current_char {
                        Some('n') => s.push('\n'),
                        Some('t') => s.push('\t'),
                        Some('r') => s.push('\r'),
                        Some(escaped) => s.push(escaped),
                        None => return Err(LexError::UnterminatedString),
                    }
                    self.advance();
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => return Err(LexError::UnterminatedString),
            }
        }
    }

    /// `$tag$ ... $tag$` bodies, as emitted for functions by pg_dump.
    fn read_dollar_quoted(&mut self) -> Result<String, LexError> {
        let mut tag = String::from("$");
        self.advance();
        while let Some(c) = self.current_char {
            tag.push(c);
            self.advance();
            if c == '$' {
                break;
            }
        }

        let mut body = String::new();
        while let Some(c) = self.current_char {
            body.push(c);
            self.advance();
            if body.ends_with(&tag) {
                body.truncate(body.len() - tag.len());
                return Ok(body);
            }
        }
        Err(LexError::UnterminatedString)
    }

    fn is_dollar_quote_start(&self) -> bool {
        let mut lookahead = self.chars.clone();
        loop {
            match lookahead.next() {
                Some('$') => return true,
                Some(c) if c.is_alphanumeric() || c == '_' => {}
                _ => return false,
            }
        }
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        if self.current_char == Some('-') {
            num.push('-');
            self.advance();
        }
        num.push_str(&self.take_while(|c| c.is_ascii_digit()));
        if self.current_char == Some('.') {
            num.push('.');
            self.advance();
            num.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }
        num
    }

    fn keyword_or_ident(&self, s: &str) -> Token {
        match s.to_uppercase().as_str() {
            "CREATE" => Token::Create,
            "ALTER" => Token::Alter,
            "ADD" => Token::Add,
            "TABLE" => Token::Table,
            "ONLY" => Token::Only,
            "PRIMARY" => Token::Primary,
            "KEY" => Token::Key,
            "FOREIGN" => Token::Foreign,
            "REFERENCES" => Token::References,
            "NOT" => Token::Not,
            "NULL" => Token::Null,
            "UNIQUE" => Token::Unique,
            "DEFAULT" => Token::Default,
            "ON" => Token::On,
            "DELETE" => Token::Delete,
            "UPDATE" => Token::Update,
            "CASCADE" => Token::Cascade,
            "RESTRICT" => Token::Restrict,
            "CONSTRAINT" => Token::Constraint,
            "INDEX" => Token::Index,
            "IF" => Token::If,
            "EXISTS" => Token::Exists,
            "CHECK" => Token::Check,
            _ => Token::Ident(s.to_string()),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            self.take_while(char::is_whitespace);

            match self.current_char {
                None => return Ok(Token::Eof),

                Some('-') => {
                    if self.peek() == Some(&'-') {
                        self.skip_line_comment();
                        continue;
                    } else if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        return Ok(Token::Num(self.read_number()));
                    } else {
                        self.advance();
                        continue;
                    }
                }

                Some('/') => {
                    self.advance();
                    if self.current_char == Some('*') {
                        self.skip_block_comment();
                    }
                    continue;
                }

                Some(':') => {
                    self.advance();
                    if self.current_char == Some(':') {
                        self.advance();
                        return Ok(Token::Cast);
                    }
                    continue;
                }

                Some('(') => {
                    self.advance();
                    return Ok(Token::LParen);
                }
                Some(')') => {
                    self.advance();
                    return Ok(Token::RParen);
                }
                Some('[') => {
                    self.advance();
                    return Ok(Token::LBracket);
                }
                Some(']') => {
                    self.advance();
                    return Ok(Token::RBracket);
                }
                Some(',') => {
                    self.advance();
                    return Ok(Token::Comma);
                }
                Some(';') => {
                    self.advance();
                    return Ok(Token::Semicolon);
                }
                Some('.') => {
                    self.advance();
                    return Ok(Token::Dot);
                }

                Some('"') => return self.read_quoted_identifier('"').map(Token::Ident),
                Some('`') => return self.read_quoted_identifier('`').map(Token::Ident),
                Some('\'') => return self.read_string().map(Token::Str),

                Some('$') => {
                    if self.is_dollar_quote_start() {
                        return self.read_dollar_quoted().map(Token::Str);
                    }
                    // Positional parameter such as $1
                    self.advance();
                    continue;
                }

                Some(c) if c.is_ascii_digit() => {
                    return Ok(Token::Num(self.read_number()));
                }

                Some(c) if c.is_alphabetic() || c == '_' => {
                    let ident = self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '$');
                    // E'...' escape string
                    if ident.eq_ignore_ascii_case("e") && self.current_char == Some('\'') {
                        return self.read_string().map(Token::Str);
                    }
                    return Ok(self.keyword_or_ident(&ident));
                }

                Some(_) => {
                    // Operators and other punctuation carry no DDL structure
                    self.advance();
                    continue;
                }
            }
        }
    }

    /// Collect all tokens.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }
}

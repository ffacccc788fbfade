//! Hand-written PostgreSQL DDL grammar.

use super::ast::{AlterAction, ColumnSpec, CreateTable, ForeignKeySpec, Statement};
use super::lexer::{Lexer, Token};
use super::{Dialect, DialectParser, SqlParseError};

/// Words that end a column's type and start its options.
const TYPE_STOP_WORDS: &[&str] = &["COLLATE", "GENERATED", "AS", "COMPRESSION", "STORAGE"];

/// Table elements that declare no column: `LIKE other INCLUDING ALL`,
/// `EXCLUDE USING gist (...)`.
const NON_COLUMN_ELEMENTS: &[&str] = &["LIKE", "EXCLUDE"];

/// Table prefixes accepted between `CREATE` and `TABLE`.
const TABLE_PREFIXES: &[&str] = &["TEMP", "TEMPORARY", "UNLOGGED", "GLOBAL", "LOCAL"];

/// PostgreSQL engine: pg_dump output and hand-written migrations.
#[derive(Debug, Default)]
pub struct PostgresParser;

impl DialectParser for PostgresParser {
    fn handles(&self, dialect: Dialect) -> bool {
        dialect == Dialect::Postgres
    }

    fn parse(&self, sql: &str, _dialect: Dialect) -> Result<Vec<Statement>, SqlParseError> {
        let tokens = Lexer::new(sql).tokenize()?;
        Parser::new(tokens).parse()
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check_word(&self, words: &[&str]) -> bool {
        matches!(self.current(), Token::Ident(s) if words.iter().any(|w| s.eq_ignore_ascii_case(w)))
    }

    /// Identifier, or a non-reserved keyword used as a column name.
    fn column_name(&self) -> Option<String> {
        let name = match self.current() {
            Token::Ident(name) => return Some(name.clone()),
            Token::Key => "key",
            Token::Index => "index",
            Token::Add => "add",
            Token::Only => "only",
            Token::Update => "update",
            Token::Delete => "delete",
            Token::Cascade => "cascade",
            Token::Restrict => "restrict",
            Token::If => "if",
            Token::Exists => "exists",
            _ => return None,
        };
        Some(name.to_string())
    }

    /// A keyword only names a column when a type follows it.
    fn starts_column(&self) -> bool {
        match self.current() {
            Token::Ident(_) => true,
            _ => {
                self.column_name().is_some()
                    && matches!(self.tokens.get(self.pos + 1), Some(Token::Ident(_)))
            }
        }
    }

    fn expected(&self, expected: &'static str) -> SqlParseError {
        match self.current() {
            Token::Eof => SqlParseError::UnexpectedEof,
            found => SqlParseError::Expected {
                expected,
                found: found.clone(),
            },
        }
    }

    fn parse(&mut self) -> Result<Vec<Statement>, SqlParseError> {
        let mut statements = Vec::new();

        while self.current() != &Token::Eof {
            match self.current() {
                Token::Create => {
                    self.advance();
                    while self.check_word(TABLE_PREFIXES) {
                        self.advance();
                    }

                    if self.current() == &Token::Table {
                        self.advance();
                        self.skip_if_exists();

                        if let Some(table) = self.parse_create_table()? {
                            statements.push(Statement::CreateTable(table));
                        }
                    } else {
                        // INDEX, VIEW, FUNCTION, SEQUENCE, ...
                        self.skip_statement();
                    }
                }
                Token::Alter => {
                    statements.extend(self.parse_alter_table()?);
                }
                _ => {
                    self.advance();
                }
            }
        }

        Ok(statements)
    }

    /// `IF [NOT] EXISTS`
    fn skip_if_exists(&mut self) {
        if self.current() == &Token::If {
            self.advance();
            if self.current() == &Token::Not {
                self.advance();
            }
            if self.current() == &Token::Exists {
                self.advance();
            }
        }
    }

    /// `name` or `schema.name`; only the last segment is kept.
    fn parse_qualified_name(&mut self) -> Option<String> {
        let mut name = match self.current() {
            Token::Ident(name) => name.clone(),
            _ => return None,
        };
        self.advance();

        while self.current() == &Token::Dot {
            self.advance();
            if let Token::Ident(part) = self.current() {
                name = part.clone();
                self.advance();
            }
        }
        Some(name)
    }

    fn parse_create_table(&mut self) -> Result<Option<CreateTable>, SqlParseError> {
        let Some(name) = self.parse_qualified_name() else {
            self.skip_statement();
            return Ok(None);
        };

        // CREATE TABLE ... AS SELECT / PARTITION OF
        if self.current() != &Token::LParen {
            self.skip_statement();
            return Ok(None);
        }
        self.advance();

        let mut table = CreateTable::new(name);

        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Comma => {
                    self.advance();
                }
                Token::Primary => {
                    // PRIMARY KEY (col1, col2, ...)
                    self.advance();
                    if self.current() == &Token::Key {
                        self.advance();
                        let cols = self.parse_column_list();
                        table.primary_key.extend(cols);
                    }
                }
                Token::Foreign => {
                    // Parsed for position only; foreign keys on this path
                    // come from ALTER TABLE.
                    self.parse_foreign_key_constraint()?;
                }
                Token::Unique => {
                    self.advance();
                    if self.current() == &Token::LParen {
                        let cols = self.parse_column_list();
                        if let [col] = cols.as_slice() {
                            table.unique.push(col.clone());
                        }
                    }
                }
                Token::Constraint => {
                    self.advance();
                    if let Token::Ident(_) = self.current() {
                        self.advance();
                    }
                }
                Token::Check => {
                    self.advance();
                    self.skip_parenthesized();
                }
                Token::Eof => return Err(SqlParseError::UnexpectedEof),
                _ if self.check_word(NON_COLUMN_ELEMENTS) => {
                    self.skip_until(&[Token::Comma, Token::RParen]);
                }
                _ if self.starts_column() => {
                    let column = self.parse_column()?;
                    table.columns.push(column);
                }
                _ => {
                    self.advance();
                }
            }
        }

        // INHERITS (...), WITH (...), TABLESPACE ...
        self.skip_statement();

        Ok(Some(table))
    }

    fn parse_column(&mut self) -> Result<ColumnSpec, SqlParseError> {
        let name = self
            .column_name()
            .ok_or_else(|| self.expected("column name"))?;
        self.advance();

        let data_type = self.parse_type();
        if data_type.is_empty() {
            return Err(self.expected("column type"));
        }

        let mut column = ColumnSpec::new(name, data_type);

        loop {
            match self.current() {
                Token::Primary => {
                    self.advance();
                    if self.current() == &Token::Key {
                        self.advance();
                    }
                    column.primary = true;
                }
                Token::Not => {
                    self.advance();
                    if self.current() == &Token::Null {
                        self.advance();
                    }
                }
                Token::Unique => {
                    self.advance();
                    column.unique = true;
                }
                Token::Default => {
                    self.advance();
                    self.skip_default_value();
                }
                Token::References => {
                    self.advance();
                    let (target, target_columns) = self.parse_reference()?;
                    let target_column = target_columns
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| "id".to_string());
                    column.references = Some((target, target_column));
                    self.skip_on_actions();
                }
                Token::Check => {
                    self.advance();
                    self.skip_parenthesized();
                }
                Token::Constraint => {
                    self.advance();
                    if let Token::Ident(_) = self.current() {
                        self.advance();
                    }
                }
                Token::On => self.skip_on_actions(),
                Token::LParen => self.skip_parenthesized(),
                Token::Comma | Token::RParen | Token::Eof => break,
                _ => {
                    self.advance();
                }
            }
        }

        Ok(column)
    }

    /// Collects a type such as `character varying(255)` or `integer[]`.
    fn parse_type(&mut self) -> String {
        let mut typ = String::new();
        let mut paren_depth = 0;

        loop {
            let part = match self.current() {
                Token::Ident(t) if paren_depth > 0 || !self.check_word(TYPE_STOP_WORDS) => {
                    t.clone()
                }
                Token::Num(n) => n.clone(),
                Token::LParen => {
                    paren_depth += 1;
                    "(".to_string()
                }
                Token::RParen if paren_depth > 0 => {
                    paren_depth -= 1;
                    ")".to_string()
                }
                Token::Comma if paren_depth > 0 => ",".to_string(),
                Token::LBracket => "[".to_string(),
                Token::RBracket => "]".to_string(),
                _ => break,
            };
            self.advance();

            let is_word = part.starts_with(|c: char| c.is_alphanumeric() || c == '_');
            if is_word && !typ.is_empty() && !typ.ends_with(['(', ',']) {
                typ.push(' ');
            }
            typ.push_str(&part);
        }

        typ
    }

    fn skip_default_value(&mut self) {
        match self.current() {
            Token::LParen => self.skip_parenthesized(),
            Token::Ident(_) => {
                self.advance();
                // Function call such as now() or nextval('seq'::regclass)
                if self.current() == &Token::LParen {
                    self.skip_parenthesized();
                }
            }
            Token::Str(_) | Token::Num(_) | Token::Null => self.advance(),
            _ => {}
        }
    }

    /// `table[(col, ...)]` after `REFERENCES`.
    fn parse_reference(&mut self) -> Result<(String, Vec<String>), SqlParseError> {
        let target = self
            .parse_qualified_name()
            .ok_or_else(|| self.expected("referenced table"))?;
        let columns = self.parse_column_list();
        Ok((target, columns))
    }

    fn parse_foreign_key_constraint(&mut self) -> Result<Option<ForeignKeySpec>, SqlParseError> {
        self.advance(); // FOREIGN
        if self.current() != &Token::Key {
            return Ok(None);
        }
        self.advance(); // KEY

        let columns = self.parse_column_list();

        if self.current() != &Token::References {
            return Ok(None);
        }
        self.advance();

        let (target, mut target_columns) = self.parse_reference()?;
        if target_columns.is_empty() {
            target_columns.push("id".to_string());
        }
        self.skip_on_actions();

        Ok(Some(ForeignKeySpec {
            columns,
            target,
            target_columns,
        }))
    }

    fn parse_column_list(&mut self) -> Vec<String> {
        let mut cols = Vec::new();

        if self.current() != &Token::LParen {
            return cols;
        }
        self.advance();

        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => break,
                _ => {
                    if let Some(name) = self.column_name() {
                        cols.push(name);
                    }
                    self.advance();
                }
            }
        }

        cols
    }

    /// `ALTER TABLE [IF EXISTS] [ONLY] name ADD [CONSTRAINT c] ... [, ADD ...]`
    fn parse_alter_table(&mut self) -> Result<Vec<Statement>, SqlParseError> {
        self.advance(); // ALTER

        if self.current() != &Token::Table {
            self.skip_statement();
            return Ok(Vec::new());
        }
        self.advance(); // TABLE
        self.skip_if_exists();
        if self.current() == &Token::Only {
            self.advance();
        }

        let Some(table) = self.parse_qualified_name() else {
            self.skip_statement();
            return Ok(Vec::new());
        };

        let mut statements = Vec::new();
        loop {
            if self.current() != &Token::Add {
                break;
            }
            self.advance(); // ADD

            if self.current() == &Token::Constraint {
                self.advance();
                if let Token::Ident(_) = self.current() {
                    self.advance();
                }
            }

            let action = match self.current() {
                Token::Foreign => self.parse_foreign_key_constraint()?.map(AlterAction::ForeignKey),
                Token::Primary => {
                    self.advance();
                    if self.current() == &Token::Key {
                        self.advance();
                    }
                    Some(AlterAction::PrimaryKey(self.parse_column_list()))
                }
                Token::Unique => {
                    self.advance();
                    Some(AlterAction::Unique(self.parse_column_list()))
                }
                _ => None,
            };

            if let Some(action) = action {
                statements.push(Statement::AlterTable {
                    table: table.clone(),
                    action,
                });
            }

            // Skip the rest of this action up to the next `, ADD` or `;`
            self.skip_until(&[Token::Comma, Token::Semicolon]);
            if self.current() == &Token::Comma {
                self.advance();
            } else {
                break;
            }
        }

        self.skip_statement();
        Ok(statements)
    }

    fn skip_on_actions(&mut self) {
        while self.current() == &Token::On {
            self.advance();
            if matches!(self.current(), Token::Delete | Token::Update) {
                self.advance();
            }
            // CASCADE, RESTRICT, SET NULL, SET DEFAULT, NO ACTION
            match self.current() {
                Token::Cascade | Token::Restrict => {
                    self.advance();
                }
                Token::Ident(s) if s.eq_ignore_ascii_case("SET") => {
                    self.advance();
                    if matches!(self.current(), Token::Null | Token::Default) {
                        self.advance();
                    }
                }
                Token::Ident(s) if s.eq_ignore_ascii_case("NO") => {
                    self.advance();
                    if self.check_word(&["ACTION"]) {
                        self.advance();
                    }
                }
                _ => {}
            }
        }
    }

    fn skip_parenthesized(&mut self) {
        if self.current() != &Token::LParen {
            return;
        }
        self.advance();
        let mut depth = 1;
        while depth > 0 {
            match self.current() {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                Token::Eof => break,
                _ => {}
            }
            self.advance();
        }
    }

    fn skip_statement(&mut self) {
        while !matches!(self.current(), Token::Semicolon | Token::Eof) {
            self.advance();
        }
        if self.current() == &Token::Semicolon {
            self.advance();
        }
    }

    fn skip_until(&mut self, tokens: &[Token]) {
        while !tokens.contains(self.current()) && self.current() != &Token::Eof {
            if self.current() == &Token::LParen {
                self.skip_parenthesized();
            } else {
                self.advance();
            }
        }
    }
}

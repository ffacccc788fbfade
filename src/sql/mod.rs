//! SQL migrations to table model.

pub mod ast;
mod dialect;
mod fk_pass;
mod lexer;
mod mysql;
mod normalize;
mod postgres;

use thiserror::Error;

pub use dialect::Dialect;
pub use lexer::{LexError, Token};
pub use mysql::SqlparserEngine;
pub use normalize::SchemaBuilder;
pub use postgres::PostgresParser;

use crate::schema::Table;

#[derive(Debug, Error)]
pub enum SqlParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Expected {expected}, found {found:?}")]
    Expected { expected: &'static str, found: Token },
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("{0}")]
    Sqlparser(#[from] sqlparser::parser::ParserError),
}

/// One raw SQL file. The name is only used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub sql: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// A grammar able to turn one file of DDL into statements.
pub trait DialectParser {
    fn handles(&self, dialect: Dialect) -> bool;

    fn parse(&self, sql: &str, dialect: Dialect) -> Result<Vec<ast::Statement>, SqlParseError>;

    /// Whether the raw text should be rescanned for ALTER TABLE foreign keys
    /// after `parse`.
    fn rescans_foreign_keys(&self) -> bool {
        false
    }
}

/// Registered engines in priority order.
static ENGINES: &[&(dyn DialectParser + Sync)] = &[&PostgresParser, &SqlparserEngine];

/// First registered engine that handles `dialect`.
pub fn engine_for(dialect: Dialect) -> Option<&'static (dyn DialectParser + Sync)> {
    ENGINES.iter().copied().find(|engine| engine.handles(dialect))
}

/// Parse every file in order into one flat table list.
pub fn extract_schema(files: &[SourceFile], dialect: Option<Dialect>) -> Vec<Table> {
    let mut builder = SchemaBuilder::with_dialect(dialect);
    for file in files {
        builder.add_file(file);
    }
    builder.finish()
}

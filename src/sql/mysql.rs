//! MySQL / SQLite engine backed by `sqlparser`.

use sqlparser::ast::{
    AlterTableOperation, ColumnDef, ColumnOption, Ident, ObjectName, Statement as SqlStatement,
    TableConstraint,
};
use sqlparser::dialect::{MySqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use super::ast::{AlterAction, ColumnSpec, CreateTable, ForeignKeySpec, Statement};
use super::{Dialect, DialectParser, SqlParseError};

#[derive(Debug, Default)]
pub struct SqlparserEngine;

impl DialectParser for SqlparserEngine {
    fn handles(&self, dialect: Dialect) -> bool {
        matches!(dialect, Dialect::MySql | Dialect::Sqlite)
    }

    fn parse(&self, sql: &str, dialect: Dialect) -> Result<Vec<Statement>, SqlParseError> {
        let parsed = if dialect == Dialect::Sqlite {
            Parser::parse_sql(&SQLiteDialect {}, sql)?
        } else {
            Parser::parse_sql(&MySqlDialect {}, sql)?
        };

        let mut statements = Vec::new();
        for stmt in parsed {
            match stmt {
                SqlStatement::CreateTable {
                    name,
                    columns,
                    constraints,
                    ..
                } => {
                    statements.push(Statement::CreateTable(lower_create_table(
                        &name,
                        &columns,
                        &constraints,
                    )));
                }
                SqlStatement::AlterTable {
                    name, operations, ..
                } => {
                    let table = object_name(&name);
                    for operation in operations {
                        if let AlterTableOperation::AddConstraint(constraint) = operation {
                            if let Some(action) = lower_alter_constraint(&constraint) {
                                statements.push(Statement::AlterTable {
                                    table: table.clone(),
                                    action,
                                });
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(statements)
    }

    /// The sqlparser grammar misses some `ADD CONSTRAINT ... FOREIGN KEY`
    /// spellings found in real dumps.
    fn rescans_foreign_keys(&self) -> bool {
        true
    }
}

/// Last segment of a possibly schema-qualified name, unquoted.
fn object_name(name: &ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_default()
}

fn idents(list: &[Ident]) -> Vec<String> {
    list.iter().map(|ident| ident.value.clone()).collect()
}

/// `REFERENCES t` without a column list points at `t.id`.
fn referred(list: &[Ident]) -> Vec<String> {
    if list.is_empty() {
        vec!["id".to_string()]
    } else {
        idents(list)
    }
}

fn lower_create_table(
    name: &ObjectName,
    columns: &[ColumnDef],
    constraints: &[TableConstraint],
) -> CreateTable {
    let mut table = CreateTable::new(object_name(name));

    for col in columns {
        let mut column = ColumnSpec::new(col.name.value.clone(), col.data_type.to_string());

        for opt in &col.options {
            match &opt.option {
                ColumnOption::Unique { is_primary, .. } => {
                    if *is_primary {
                        column.primary = true;
                    } else {
                        column.unique = true;
                    }
                }
                ColumnOption::ForeignKey {
                    foreign_table,
                    referred_columns,
                    ..
                } => {
                    let target_column = referred(referred_columns).swap_remove(0);
                    column.references = Some((object_name(foreign_table), target_column));
                }
                _ => {}
            }
        }

        table.columns.push(column);
    }

    for constraint in constraints {
        match constraint {
            TableConstraint::Unique {
                columns,
                is_primary,
                ..
            } => {
                if *is_primary {
                    table.primary_key.extend(idents(columns));
                } else if let [col] = columns.as_slice() {
                    table.unique.push(col.value.clone());
                }
            }
            TableConstraint::ForeignKey {
                columns,
                foreign_table,
                referred_columns,
                ..
            } => {
                table.foreign_keys.push(ForeignKeySpec {
                    columns: idents(columns),
                    target: object_name(foreign_table),
                    target_columns: referred(referred_columns),
                });
            }
            _ => {}
        }
    }

    table
}

fn lower_alter_constraint(constraint: &TableConstraint) -> Option<AlterAction> {
    match constraint {
        TableConstraint::ForeignKey {
            columns,
            foreign_table,
            referred_columns,
            ..
        } => Some(AlterAction::ForeignKey(ForeignKeySpec {
            columns: idents(columns),
            target: object_name(foreign_table),
            target_columns: referred(referred_columns),
        })),
        TableConstraint::Unique {
            columns,
            is_primary,
            ..
        } => {
            let columns = idents(columns);
            Some(if *is_primary {
                AlterAction::PrimaryKey(columns)
            } else {
                AlterAction::Unique(columns)
            })
        }
        _ => None,
    }
}

//! Folds engine statements into the shared table list.

use tracing::{debug, trace, warn};

use super::ast::{AlterAction, CreateTable, ForeignKeySpec, Statement};
use super::{Dialect, SourceFile, engine_for, fk_pass};
use crate::schema::{Column, Table};

/// Accumulates tables across files for one pipeline run.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tables: Vec<Table>,
    dialect_override: Option<Dialect>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip detection and parse every file as `dialect`.
    pub fn with_dialect(dialect: Option<Dialect>) -> Self {
        Self {
            tables: Vec::new(),
            dialect_override: dialect,
        }
    }

    /// Parse one file and append its tables. A file that fails to parse
    /// contributes nothing.
    pub fn add_file(&mut self, file: &SourceFile) {
        let dialect = self
            .dialect_override
            .unwrap_or_else(|| Dialect::detect(&file.sql));
        debug!(file = %file.name, dialect = dialect.name(), "parsing SQL file");

        let Some(engine) = engine_for(dialect) else {
            warn!(file = %file.name, dialect = dialect.name(), "no parser registered for dialect");
            return;
        };

        let statements = match engine.parse(&file.sql, dialect) {
            Ok(statements) => statements,
            Err(err) => {
                warn!(file = %file.name, error = %err, "failed to parse SQL file, skipping");
                return;
            }
        };

        let before = self.tables.len();
        self.apply(statements);

        if engine.rescans_foreign_keys() {
            let recovered = fk_pass::apply(&file.sql, &mut self.tables);
            debug!(file = %file.name, recovered, "foreign key rescan");
        }

        debug!(file = %file.name, tables = self.tables.len() - before, "parsed SQL file");
    }

    pub fn apply(&mut self, statements: Vec<Statement>) {
        for stmt in statements {
            match stmt {
                Statement::CreateTable(create) => {
                    let table = build_table(create);
                    self.tables.push(table);
                }
                Statement::AlterTable { table, action } => {
                    let Some(target) = find_table_mut(&mut self.tables, &table) else {
                        trace!(table = %table, "ALTER TABLE on unknown table dropped");
                        continue;
                    };
                    match action {
                        AlterAction::ForeignKey(fk) => apply_foreign_key(target, &fk),
                        AlterAction::PrimaryKey(cols) => mark_primary(target, &cols),
                        AlterAction::Unique(cols) => mark_unique(target, &cols),
                    }
                }
            }
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn finish(self) -> Vec<Table> {
        self.tables
    }
}

/// Exact name match first, then case-insensitive.
pub fn find_table_mut<'a>(tables: &'a mut [Table], name: &str) -> Option<&'a mut Table> {
    let idx = tables
        .iter()
        .position(|t| t.name == name)
        .or_else(|| tables.iter().position(|t| t.name.eq_ignore_ascii_case(name)))?;
    tables.get_mut(idx)
}

fn build_table(create: CreateTable) -> Table {
    let mut table = Table::new(create.name);

    for spec in create.columns {
        if table
            .columns
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(&spec.name))
        {
            continue;
        }

        let mut column = Column::new(spec.name, spec.data_type);
        column.is_primary = spec.primary;
        column.is_unique = spec.unique;
        if let Some((target, target_column)) = spec.references {
            column.set_reference(target, target_column);
        }
        table.columns.push(column);
    }

    mark_primary(&mut table, &create.primary_key);
    for col in &create.unique {
        mark_unique(&mut table, std::slice::from_ref(col));
    }
    for fk in &create.foreign_keys {
        apply_foreign_key(&mut table, fk);
    }

    table
}

fn mark_primary(table: &mut Table, columns: &[String]) {
    for name in columns {
        if let Some(column) = table.column_mut(name) {
            column.is_primary = true;
        }
    }
}

/// Only single-column unique constraints make a column unique.
fn mark_unique(table: &mut Table, columns: &[String]) {
    if let [name] = columns {
        if let Some(column) = table.column_mut(name) {
            column.is_unique = true;
        }
    }
}

/// Pairs child and parent columns by position. Child columns without a
/// parent counterpart are left alone.
fn apply_foreign_key(table: &mut Table, fk: &ForeignKeySpec) {
    for (child, parent) in fk.columns.iter().zip(&fk.target_columns) {
        if let Some(column) = table.column_mut(child) {
            column.set_reference(fk.target.clone(), parent.clone());
        }
    }
}

//! Dialect-agnostic table model shared by the SQL engines and the renderer.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Declared type, spelled the way the source dialect spelled it.
    pub typ: String,
    pub is_primary: bool,
    pub is_foreign: bool,
    pub is_unique: bool,
    pub references: Option<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub table: String,
    pub column: String,
}

/// Relation declared in an annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    /// Free-text cardinality descriptor, e.g. `many-to-one`.
    pub kind: String,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Exact match first, then case-insensitive.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(name))
            })?;
        self.columns.get_mut(idx)
    }

    /// True when `column` is the only primary-key column of this table.
    pub fn is_sole_primary(&self, column: &Column) -> bool {
        column.is_primary && self.columns.iter().filter(|c| c.is_primary).count() == 1
    }
}

impl Column {
    pub fn new(name: impl Into<String>, typ: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
            is_primary: false,
            is_foreign: false,
            is_unique: false,
            references: None,
        }
    }

    /// Sets `references` and `is_foreign` together so the pair never drifts.
    pub fn set_reference(&mut self, table: impl Into<String>, column: impl Into<String>) {
        self.is_foreign = true;
        self.references = Some(Reference {
            table: table.into(),
            column: column.into(),
        });
    }
}

//! Statement model produced by every dialect engine.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateTable(CreateTable),
    /// `ALTER TABLE <table> ADD [CONSTRAINT name] ...`
    AlterTable { table: String, action: AlterAction },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterAction {
    ForeignKey(ForeignKeySpec),
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    /// Table-level `PRIMARY KEY (...)` column list.
    pub primary_key: Vec<String>,
    /// Table-level single-column `UNIQUE (...)` clauses.
    pub unique: Vec<String>,
    /// Table-level `FOREIGN KEY` clauses.
    pub foreign_keys: Vec<ForeignKeySpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: String,
    pub primary: bool,
    pub unique: bool,
    /// Inline `REFERENCES parent(col)`.
    pub references: Option<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeySpec {
    pub columns: Vec<String>,
    pub target: String,
    pub target_columns: Vec<String>,
}

impl CreateTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            unique: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            primary: false,
            unique: false,
            references: None,
        }
    }
}

//! SQL dialect detection.

/// SQL dialect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// PostgreSQL
    #[default]
    Postgres,
    /// MySQL / MariaDB
    MySql,
    /// SQLite
    Sqlite,
}

/// Signature tokens, checked in order. First hit wins.
const SIGNATURES: &[(Dialect, &[&str])] = &[
    (Dialect::Postgres, &["serial", "bytea", "::"]),
    (Dialect::MySql, &["auto_increment", "engine=", "unsigned"]),
    (Dialect::Sqlite, &["autoincrement", "without rowid"]),
];

impl Dialect {
    /// Parse dialect from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Detect dialect from SQL content. Falls back to Postgres.
    pub fn detect(content: &str) -> Self {
        let lower = content.to_lowercase();

        SIGNATURES
            .iter()
            .find(|(_, tokens)| tokens.iter().any(|t| lower.contains(t)))
            .map(|(dialect, _)| *dialect)
            .unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }
}

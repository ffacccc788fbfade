//! Regex rescan for `ALTER TABLE ... ADD [CONSTRAINT c] FOREIGN KEY` forms.
//!
//! Runs after the primary parse of a MySQL/SQLite file and is authoritative:
//! every match overwrites whatever reference the column already had. It only
//! annotates existing columns and never creates tables or columns.

use std::sync::LazyLock;

use regex::Regex;

use super::normalize::find_table_mut;
use crate::schema::Table;

/// `"x"`, `` `x` ``, `[x]` or a bare word.
const IDENT: &str = r#"(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+)"#;

static ALTER_FOREIGN_KEY: LazyLock<Regex> = LazyLock::new(|| {
    let name = format!(r"{IDENT}(?:\s*\.\s*{IDENT})*");
    let pattern = format!(
        r"(?i)ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?({name})\s+ADD\s+(?:CONSTRAINT\s+{IDENT}\s+)?FOREIGN\s+KEY\s*\(([^)]*)\)\s*REFERENCES\s+({name})\s*\(([^)]*)\)"
    );
    Regex::new(&pattern).expect("foreign key pattern compiles")
});

/// Applies every matched foreign key to `tables`; returns how many column
/// references were written.
pub fn apply(sql: &str, tables: &mut [Table]) -> usize {
    let mut written = 0;

    for caps in ALTER_FOREIGN_KEY.captures_iter(sql) {
        let child_table = unquote(&caps[1]);
        let parent_table = unquote(&caps[3]);
        let child_columns = split_columns(&caps[2]);
        let parent_columns = split_columns(&caps[4]);

        let Some(table) = find_table_mut(tables, &child_table) else {
            continue;
        };

        for (i, child) in child_columns.iter().enumerate() {
            // A short parent list reuses its first column.
            let Some(parent) = parent_columns.get(i).or(parent_columns.first()) else {
                continue;
            };
            if let Some(column) = table.column_mut(child) {
                column.set_reference(parent_table.clone(), parent.clone());
                written += 1;
            }
        }
    }

    written
}

/// Strips identifier quoting and any schema qualifier.
fn unquote(name: &str) -> String {
    let last = name.rsplit('.').next().unwrap_or(name);
    last.trim()
        .trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'))
        .to_string()
}

fn split_columns(list: &str) -> Vec<String> {
    list.split(',')
        .map(unquote)
        .filter(|c| !c.is_empty())
        .collect()
}

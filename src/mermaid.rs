//! Renders tables and relations as a Mermaid `erDiagram`.

use std::collections::HashSet;

use crate::schema::{Column, Relation, Table};

pub const HEADER: &str = "erDiagram";

/// Emitted instead of an empty diagram body.
pub const PLACEHOLDER: &str = "erDiagram\n    NO_TABLES {\n        string note \"no tables found\"\n    }\n";

/// Appended when a diagram is written to a file.
pub const WATERMARK: &str = "%% generated by schemerd";

const ONE_TO_ONE: &str = "||--||";
const ONE_TO_MANY: &str = "||--o{";

/// Render a diagram. Output depends only on the inputs and their order.
pub fn render(tables: &[Table], relations: &[Relation]) -> String {
    if tables.is_empty() {
        return PLACEHOLDER.to_string();
    }

    let mut output = String::new();
    output.push_str(HEADER);
    output.push('\n');

    let mut seen = HashSet::new();
    for table in tables {
        if seen.insert(table.name.to_uppercase()) {
            render_entity(&mut output, table);
        }
    }

    for relation in relations {
        render_relation(&mut output, relation);
    }

    // Foreign keys of every table, including duplicates dropped above
    for table in tables {
        for column in &table.columns {
            render_foreign_key(&mut output, table, column);
        }
    }

    output
}

fn render_entity(output: &mut String, table: &Table) {
    output.push_str(&format!("    {} {{\n", entity_name(&table.name)));

    for column in &table.columns {
        output.push_str(&format!(
            "        {} {}",
            type_token(&column.typ),
            word(&column.name)
        ));
        if column.is_primary {
            output.push_str(" PK");
        } else if column.is_foreign {
            output.push_str(" FK");
        }
        output.push('\n');
    }

    output.push_str("    }\n");
}

fn render_relation(output: &mut String, relation: &Relation) {
    let arrow = if relation.kind.to_lowercase().contains("many") {
        ONE_TO_MANY
    } else {
        ONE_TO_ONE
    };

    let label = [relation.name.as_str(), relation.kind.as_str()]
        .into_iter()
        .map(sanitize_label)
        .find(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "rel".to_string());

    output.push_str(&format!(
        "    {} {} {} : {}\n",
        entity_name(&relation.target_table),
        arrow,
        entity_name(&relation.source_table),
        label
    ));
}

fn render_foreign_key(output: &mut String, table: &Table, column: &Column) {
    let Some(reference) = column.references.as_ref().filter(|_| column.is_foreign) else {
        return;
    };

    let arrow = if column.is_unique || table.is_sole_primary(column) {
        ONE_TO_ONE
    } else {
        ONE_TO_MANY
    };

    let label = sanitize_label(&format!("{}→{}", column.name, reference.column));
    output.push_str(&format!(
        "    {} {} {} : {}\n",
        entity_name(&reference.table),
        arrow,
        entity_name(&table.name),
        label
    ));
}

fn entity_name(name: &str) -> String {
    word(&name.to_uppercase())
}

/// Uppercased type as one token: `DOUBLE PRECISION` -> `DOUBLE_PRECISION`.
fn type_token(typ: &str) -> String {
    typ.to_uppercase()
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn word(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Replaces characters Mermaid would read as diagram syntax.
pub fn sanitize_label(label: &str) -> String {
    label
        .replace("--", "—")
        .replace(['{', '}', '[', ']', '|'], "")
        .replace("->", "→")
        .replace('<', "‹")
        .replace('>', "›")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn column(name: &str, typ: &str) -> Column {
        Column::new(name, typ)
    }

    fn primary(name: &str, typ: &str) -> Column {
        let mut col = Column::new(name, typ);
        col.is_primary = true;
        col
    }

    fn foreign(name: &str, typ: &str, table: &str, target: &str) -> Column {
        let mut col = Column::new(name, typ);
        col.set_reference(table, target);
        col
    }

    fn table(name: &str, columns: Vec<Column>) -> Table {
        Table {
            name: name.to_string(),
            columns,
        }
    }

    fn relation(name: &str, kind: &str) -> Relation {
        Relation {
            name: name.to_string(),
            source_table: "orders".to_string(),
            source_column: "user_id".to_string(),
            target_table: "users".to_string(),
            target_column: "id".to_string(),
            kind: kind.to_string(),
        }
    }

    #[test]
    fn test_render_entities_and_foreign_keys() {
        let tables = vec![
            table("users", vec![primary("id", "int"), column("email", "varchar(255)")]),
            table(
                "orders",
                vec![primary("id", "int"), foreign("user_id", "int", "users", "id")],
            ),
        ];

        let expected = "\
erDiagram
    USERS {
        INT id PK
        VARCHAR(255) email
    }
    ORDERS {
        INT id PK
        INT user_id FK
    }
    USERS ||--o{ ORDERS : user_id→id
";
        assert_eq!(render(&tables, &[]), expected);
    }

    #[test]
    fn test_primary_badge_wins_over_foreign() {
        let mut col = foreign("user_id", "int", "users", "id");
        col.is_primary = true;
        let tables = vec![table("profiles", vec![col])];

        let output = render(&tables, &[]);
        assert!(output.contains("        INT user_id PK\n"));
        assert!(!output.contains("FK"));
    }

    #[test]
    fn test_sole_primary_foreign_key_is_one_to_one() {
        let mut col = foreign("user_id", "int", "users", "id");
        col.is_primary = true;
        let tables = vec![table("profiles", vec![col])];

        assert!(render(&tables, &[]).contains("USERS ||--|| PROFILES : user_id→id"));
    }

    #[test]
    fn test_unique_foreign_key_is_one_to_one() {
        let mut col = foreign("passport_id", "int", "passports", "id");
        col.is_unique = true;
        let tables = vec![table("people", vec![primary("id", "int"), col])];

        assert!(render(&tables, &[]).contains("PASSPORTS ||--|| PEOPLE : passport_id→id"));
    }

    #[test]
    fn test_composite_primary_foreign_key_is_one_to_many() {
        let mut user_id = foreign("user_id", "int", "users", "id");
        user_id.is_primary = true;
        let mut role_id = foreign("role_id", "int", "roles", "id");
        role_id.is_primary = true;
        let tables = vec![table("user_roles", vec![user_id, role_id])];

        let output = render(&tables, &[]);
        assert!(output.contains("USERS ||--o{ USER_ROLES : user_id→id"));
        assert!(output.contains("ROLES ||--o{ USER_ROLES : role_id→id"));
    }

    #[test]
    fn test_dedup_keeps_first_table() {
        let tables = vec![
            table("users", vec![primary("id", "int")]),
            table("Users", vec![column("name", "text")]),
        ];

        let output = render(&tables, &[]);
        assert_eq!(output.matches(" {\n").count(), 1);
        assert!(output.contains("INT id PK"));
        assert!(!output.contains("TEXT name"));
    }

    #[test]
    fn test_dropped_duplicate_still_contributes_foreign_keys() {
        let tables = vec![
            table("orders", vec![primary("id", "int")]),
            table("ORDERS", vec![foreign("user_id", "int", "users", "id")]),
        ];

        let output = render(&tables, &[]);
        assert!(!output.contains("user_id FK"));
        assert!(output.contains("USERS ||--o{ ORDERS : user_id→id"));
    }

    #[test]
    fn test_explicit_relation_arrows() {
        let tables = vec![table("users", vec![primary("id", "int")])];
        let relations = vec![relation("owns", "Many-to-One"), relation("has", "one-to-one")];

        let output = render(&tables, &relations);
        assert!(output.contains("    USERS ||--o{ ORDERS : owns\n"));
        assert!(output.contains("    USERS ||--|| ORDERS : has\n"));
    }

    #[test]
    fn test_relation_label_fallbacks() {
        let tables = vec![table("users", vec![primary("id", "int")])];

        let output = render(&tables, &[relation("", "one-to-one")]);
        assert!(output.contains("USERS ||--|| ORDERS : one-to-one"));

        let output = render(&tables, &[relation("{}", "[]")]);
        assert!(output.contains("USERS ||--|| ORDERS : rel"));
    }

    #[test]
    fn test_empty_tables_render_placeholder() {
        assert_eq!(render(&[], &[]), PLACEHOLDER);
        assert_eq!(render(&[], &[relation("owns", "many")]), PLACEHOLDER);
    }

    #[test]
    fn test_multi_word_types_stay_one_token() {
        let tables = vec![table(
            "metrics",
            vec![
                column("value", "double precision"),
                column("amount", "DECIMAL(10,2)"),
            ],
        )];

        let output = render(&tables, &[]);
        assert!(output.contains("        DOUBLE_PRECISION value\n"));
        assert!(output.contains("        DECIMAL(10_2) amount\n"));
    }

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("a--b"), "a—b");
        assert_eq!(sanitize_label("{x}|[y]"), "xy");
        assert_eq!(sanitize_label("a->b"), "a→b");
        assert_eq!(sanitize_label("<tag>"), "‹tag›");
    }

    #[test]
    fn test_render_is_deterministic() {
        let tables = vec![
            table("b", vec![foreign("a_id", "int", "a", "id")]),
            table("a", vec![primary("id", "int")]),
        ];
        let relations = vec![relation("owns", "many")];
        assert_eq!(render(&tables, &relations), render(&tables, &relations));
    }
}

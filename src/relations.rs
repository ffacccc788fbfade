//! Relationship annotation files.
//!
//! One relation per line:
//!
//! ```text
//! Ref user_orders: orders.user_id > users.id // many-to-one
//! ```
//!
//! Lines that do not match are skipped.

use std::sync::LazyLock;

use regex::Regex;

use crate::schema::Relation;

/// ASCII word characters only; names with other letters do not match.
const WORD: &str = r"((?-u:\w)+)";

static REF_LINE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern =
        format!(r"^Ref\s+{WORD}:\s+{WORD}\.{WORD}\s*>\s*{WORD}\.{WORD}\s*//\s*(.+)$");
    Regex::new(&pattern).expect("ref line pattern compiles")
});

/// Parse every `Ref` line of an annotation file, in order.
pub fn parse_relations(input: &str) -> Vec<Relation> {
    input.lines().filter_map(|line| parse_line(line.trim())).collect()
}

fn parse_line(line: &str) -> Option<Relation> {
    let caps = REF_LINE.captures(line)?;
    Some(Relation {
        name: caps[1].to_string(),
        source_table: caps[2].to_string(),
        source_column: caps[3].to_string(),
        target_table: caps[4].to_string(),
        target_column: caps[5].to_string(),
        kind: caps[6].trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ref_line() {
        let relations =
            parse_relations("Ref user_orders: orders.user_id > users.id // many-to-one");

        assert_eq!(
            relations,
            vec![Relation {
                name: "user_orders".to_string(),
                source_table: "orders".to_string(),
                source_column: "user_id".to_string(),
                target_table: "users".to_string(),
                target_column: "id".to_string(),
                kind: "many-to-one".to_string(),
            }]
        );
    }

    #[test]
    fn test_tight_spacing_and_indentation() {
        let relations = parse_relations("    Ref r1: a.b>c.d//one-to-one   \n");
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].target_table, "c");
        assert_eq!(relations[0].kind, "one-to-one");
    }

    #[test]
    fn test_non_matching_lines_are_skipped() {
        let input = r#"
            Table users {
              id int
            }
            Ref: orders.user_id > users.id
            Ref broken orders.user_id > users.id // missing colon
            Ref profile: profiles.user_id > users.id // one-to-one

            // comment
        "#;
        let relations = parse_relations(input);
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].name, "profile");
    }

    #[test]
    fn test_non_ascii_names_do_not_match() {
        let input = "\
Ref café: orders.user_id > users.id // many-to-one
Ref owner: commandes.utilisateur_id > utilisateurs.id // many-to-one
Ref owner: bestellungen.kunde_id > kunden.größe // many-to-one";
        let relations = parse_relations(input);
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].source_table, "commandes");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_relations("").is_empty());
    }
}
